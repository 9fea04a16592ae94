use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use paux_raster::{
    ByteOrder, ColorEntry, ColorInterpretation, CrsImporter, Error, OpenOptions, PauxDataset,
    PauxDriver, Result, PROJ_PARAM_COUNT,
};
use tempfile::TempDir;

/// Accepts every descriptor and echoes it back
struct EchoImporter;

impl CrsImporter for EchoImporter {
    fn import(&self, descriptor: &str, params: &[f64; PROJ_PARAM_COUNT]) -> Result<String> {
        Ok(format!("{} {}", descriptor, params[0]))
    }
}

fn write_pair(dir: &Path, name: &str, raw: &[u8], sidecar: &str) -> PathBuf {
    let raw_path = dir.join(format!("{}.raw", name));
    fs::write(&raw_path, raw).unwrap();
    fs::write(dir.join(format!("{}.aux", name)), sidecar).unwrap();
    raw_path
}

#[test]
fn test_zero_pixel_stride_drops_only_that_band() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "partial",
        &[0; 12],
        "AuxilaryTarget: partial.raw\n\
         RawDefinition: 2 2 3\n\
         ChanDefinition-1: 8U 0 1 2\n\
         ChanDefinition-2: 8U 4 0 2\n\
         ChanDefinition-3: 8U 8 1 2\n",
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
    assert_eq!(ds.raster_count(), 2);
    assert_eq!(ds.band(2).unwrap().layout().byte_offset, 8);
}

#[test]
fn test_missing_raw_definition_fails_open() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "nodef",
        &[0; 4],
        "AuxilaryTarget: nodef.raw\nChanDefinition-1: 8U 0 1 2\n",
    );

    let result = PauxDataset::open(&raw, &OpenOptions::new());
    assert!(matches!(result, Err(Error::MissingMetadata(_))));
}

#[test]
fn test_foreign_sidecar_is_not_this_format() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(dir.path(), "hfa", &[0; 4], "EHFA_HEADER_TAG\nRawDefinition: 2 2 1\n");

    let result = PauxDataset::open(&raw, &OpenOptions::new());
    assert!(matches!(result, Err(Error::FormatMismatch(_))));
    assert!(!PauxDriver::new().identify(&raw, None));
}

#[test]
fn test_corrected_spelling_and_sidecar_as_input() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "spelled",
        &[7; 4],
        "AuxiliaryTarget: spelled.raw\nRawDefinition: 2 2 1\nChanDefinition-1: 8U 0 1 2\n",
    );

    let ds = PauxDataset::open(dir.path().join("spelled.aux"), &OpenOptions::new()).unwrap();
    assert_eq!(ds.target_path(), raw.as_path());
    assert_eq!(ds.band(1).unwrap().read_line(1).unwrap(), vec![7, 7]);
}

#[test]
fn test_sidecar_missing_from_siblings() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "siblings",
        &[0; 4],
        "AuxilaryTarget: siblings.raw\nRawDefinition: 2 2 1\nChanDefinition-1: 8U 0 1 2\n",
    );

    let options = OpenOptions::new().sibling_files(vec!["siblings.raw".to_string()]);
    assert!(matches!(
        PauxDataset::open(&raw, &options),
        Err(Error::FormatMismatch(_))
    ));

    let options = OpenOptions::new()
        .sibling_files(vec!["siblings.raw".to_string(), "siblings.aux".to_string()]);
    assert!(PauxDataset::open(&raw, &options).is_ok());
}

#[test]
fn test_foreign_byte_order_is_swapped_on_read() {
    let dir = TempDir::new().unwrap();
    let foreign = ByteOrder::native().opposite();
    let raw_bytes: Vec<u8> = [0x0102u16, 0x0304]
        .iter()
        .flat_map(|v| match foreign {
            ByteOrder::BigEndian => v.to_be_bytes(),
            ByteOrder::LittleEndian => v.to_le_bytes(),
        })
        .collect();

    let raw = write_pair(
        dir.path(),
        "swapped",
        &raw_bytes,
        &format!(
            "AuxilaryTarget: swapped.raw\nRawDefinition: 2 1 1\nChanDefinition-1: 16U 0 2 4 {}\n",
            foreign.swap_tag()
        ),
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
    let band = ds.band(1).unwrap();
    assert_eq!(band.layout().byte_order, foreign);
    assert!(!band.layout().is_native_order());
    assert_eq!(band.read_line_f64(0).unwrap(), vec![258.0, 772.0]);
}

#[test]
fn test_foreign_byte_order_is_swapped_on_write() {
    let dir = TempDir::new().unwrap();
    let foreign = ByteOrder::native().opposite();
    let raw = write_pair(
        dir.path(),
        "swapwrite",
        &[0; 4],
        &format!(
            "AuxilaryTarget: swapwrite.raw\nRawDefinition: 2 1 1\nChanDefinition-1: 16U 0 2 4 {}\n",
            foreign.swap_tag()
        ),
    );

    let mut ds = PauxDataset::open(&raw, &OpenOptions::new().update()).unwrap();
    let samples: Vec<u8> = [0x0A0Bu16, 0x0C0D].iter().flat_map(|v| v.to_ne_bytes()).collect();
    ds.band_mut(1).unwrap().write_line(0, &samples).unwrap();
    ds.close().unwrap();

    let expected: Vec<u8> = match foreign {
        ByteOrder::BigEndian => vec![0x0A, 0x0B, 0x0C, 0x0D],
        ByteOrder::LittleEndian => vec![0x0B, 0x0A, 0x0D, 0x0C],
    };
    assert_eq!(fs::read(&raw).unwrap(), expected);
}

#[test]
fn test_gcp_scan_from_sidecar() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "gcps",
        &[0; 4],
        "AuxilaryTarget: gcps.raw\n\
         RawDefinition: 2 2 1\n\
         ChanDefinition-1: 8U 0 1 2\n\
         GCP_1_MapUnits:    UTM 11 E012\n\
         GCP_1_ProjParams: 6378137 6356752.314\n\
         GCP_1_1: 10 20 100.5 200.5\n\
         GCP_1_2: 30 40 300 400 5 \"id2\"\n\
         GCP_1_4: 50 60 500 600\n",
    );

    let options = OpenOptions::new().importer(Arc::new(EchoImporter));
    let ds = PauxDataset::open(&raw, &options).unwrap();

    let gcps = ds.gcps();
    assert_eq!(gcps.len(), 2);
    assert_eq!(gcps[0].id, "GCP_1");
    assert_eq!((gcps[0].pixel, gcps[0].line), (10.0, 20.0));
    assert_eq!(gcps[1].z, 5.0);
    assert_eq!(gcps[1].id, "id2");

    let crs = ds.gcp_spatial_ref().unwrap();
    assert_eq!(crs.proj_definition(), Some("UTM 11 E012 6378137"));
    assert!(ds.spatial_ref().is_none());
}

#[test]
fn test_dataset_coordinate_reference_with_proj() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "geo",
        &[0; 4],
        "AuxilaryTarget: geo.raw\n\
         RawDefinition: 2 2 1\n\
         ChanDefinition-1: 8U 0 1 2\n\
         MapUnits:   LONG/LAT    D000\n\
         UpLeftX: -120\nUpLeftY: 40\nLoRightX: -118\nLoRightY: 38\n",
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
    let crs = ds.spatial_ref().unwrap();
    assert_eq!(crs.descriptor(), "LONG/LAT    D000");
    assert_eq!(crs.proj_definition(), Some("+proj=longlat +datum=WGS84 +no_defs"));
    assert_eq!(ds.geo_transform().unwrap().0, [-120.0, 1.0, 0.0, 40.0, 0.0, -1.0]);
}

#[test]
fn test_unsupported_descriptor_gives_empty_reference() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "pixel",
        &[0; 4],
        "AuxilaryTarget: pixel.raw\nRawDefinition: 2 2 1\nChanDefinition-1: 8U 0 1 2\nMapUnits: PIXEL\n",
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
    assert!(ds.spatial_ref().is_none());
}

#[test]
fn test_color_table_from_sidecar() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "palette",
        &[0; 8],
        "AuxilaryTarget: palette.raw\n\
         RawDefinition: 2 2 2\n\
         ChanDefinition-1: 8U 0 1 2\n\
         ChanDefinition-2: 8U 4 1 2\n\
         METADATA_IMG_1_Class_0_Color: (RGB: 0 0 0)\n\
         METADATA_IMG_1_Class_2_Color: (RGB: 10 20 30)\n\
         METADATA_IMG_2_Class_1_Color: (RGB: 1 1 1)\n",
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();

    let first = ds.band(1).unwrap();
    assert_eq!(first.color_interpretation(), ColorInterpretation::PaletteIndex);
    let table = first.color_table().unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.entry(1), None);
    assert_eq!(
        table.entry(2),
        Some(ColorEntry { red: 10, green: 20, blue: 30, alpha: 255 })
    );

    let second = ds.band(2).unwrap();
    assert!(second.color_table().is_none());
    assert_eq!(second.color_interpretation(), ColorInterpretation::Undefined);
}

#[test]
fn test_lookup_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "case",
        &[0; 4],
        "auxilarytarget: case.raw\nrawdefinition: 2 2 1\nCHANDEFINITION-1: 8u 0 1 2\n\
         metadata_img_1_no_data_value: 3\n",
    );

    let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
    assert_eq!(ds.raster_count(), 1);
    assert_eq!(ds.band(1).unwrap().no_data_value(), Some(3.0));
}

#[test]
fn test_delete_removes_both_files() {
    let dir = TempDir::new().unwrap();
    let raw = write_pair(
        dir.path(),
        "doomed",
        &[0; 4],
        "AuxilaryTarget: doomed.raw\nRawDefinition: 2 2 1\n",
    );

    PauxDataset::delete(&raw).unwrap();
    assert!(!raw.exists());
    assert!(!dir.path().join("doomed.aux").exists());
}

#[test]
fn test_delete_refuses_unrecognised_files() {
    let dir = TempDir::new().unwrap();

    let lonely = dir.path().join("lonely.raw");
    fs::write(&lonely, [0u8; 4]).unwrap();
    assert!(PauxDataset::delete(&lonely).is_err());
    assert!(lonely.exists());

    let raw = write_pair(dir.path(), "other", &[0; 4], "Something else\n");
    assert!(matches!(
        PauxDriver::new().delete(&raw),
        Err(Error::FormatMismatch(_))
    ));
    assert!(raw.exists());
    assert!(dir.path().join("other.aux").exists());
}
