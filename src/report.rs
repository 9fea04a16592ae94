//! Serializable summary of an open dataset

use std::fmt;

use serde::Serialize;

use crate::formats::paux::{BandLayout, GroundControlPoint, PauxDataset, RasterBand};
use crate::types::Dimensions;

#[derive(Debug, Serialize)]
pub struct BandReport {
    pub number: usize,
    pub data_type: String,
    pub layout: BandLayout,
    pub description: String,
    pub no_data_value: Option<f64>,
    pub color_table_size: Option<usize>,
}

impl BandReport {
    pub fn from_band(band: &RasterBand<'_>) -> Self {
        Self {
            number: band.number(),
            data_type: band.data_type().name().to_string(),
            layout: *band.layout(),
            description: band.description().to_string(),
            no_data_value: band.no_data_value(),
            color_table_size: band.color_table().map(|table| table.len()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetReport {
    pub description: String,
    pub size: Dimensions,
    pub files: Vec<String>,
    pub geo_transform: Option<[f64; 6]>,
    pub coordinate_system: Option<String>,
    pub gcp_coordinate_system: Option<String>,
    pub gcps: Vec<GroundControlPoint>,
    pub bands: Vec<BandReport>,
}

impl DatasetReport {
    pub fn from_dataset(dataset: &PauxDataset) -> Self {
        let definition = |crs: Option<&crate::projection::CoordinateReference>| {
            crs.and_then(|crs| crs.proj_definition()).map(str::to_string)
        };

        Self {
            description: dataset.description(),
            size: dataset.dimensions(),
            files: dataset
                .file_list()
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
            geo_transform: dataset.geo_transform().ok().map(|gt| gt.0),
            coordinate_system: definition(dataset.spatial_ref()),
            gcp_coordinate_system: definition(dataset.gcp_spatial_ref()),
            gcps: dataset.gcps().to_vec(),
            bands: dataset.bands().map(|band| BandReport::from_band(&band)).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Driver: PAux/PCI .aux Labelled")?;
        writeln!(f, "Files:")?;
        for file in &self.files {
            writeln!(f, "  {}", file)?;
        }
        writeln!(f, "Size is {}, {}", self.size.width, self.size.height)?;

        if let Some(crs) = &self.coordinate_system {
            writeln!(f, "Coordinate System: {}", crs)?;
        }
        if let Some(gt) = &self.geo_transform {
            writeln!(f, "Origin = ({}, {})", gt[0], gt[3])?;
            writeln!(f, "Pixel Size = ({}, {})", gt[1], gt[5])?;
        }

        if !self.gcps.is_empty() {
            writeln!(f, "GCP Projection: {}", self.gcp_coordinate_system.as_deref().unwrap_or(""))?;
            for (i, gcp) in self.gcps.iter().enumerate() {
                writeln!(
                    f,
                    "GCP[{:3}]: Id={}, Info={}",
                    i,
                    gcp.id,
                    gcp.info.as_deref().unwrap_or("")
                )?;
                writeln!(
                    f,
                    "          ({},{}) -> ({},{},{})",
                    gcp.pixel, gcp.line, gcp.x, gcp.y, gcp.z
                )?;
            }
        }

        for band in &self.bands {
            writeln!(
                f,
                "Band {} Type={} Offset={} PixelStride={} LineStride={} ByteOrder={:?}",
                band.number,
                band.data_type,
                band.layout.byte_offset,
                band.layout.pixel_stride,
                band.layout.line_stride,
                band.layout.byte_order
            )?;
            if !band.description.is_empty() {
                writeln!(f, "  Description = {}", band.description)?;
            }
            if let Some(no_data) = band.no_data_value {
                writeln!(f, "  NoData Value={}", no_data)?;
            }
            if let Some(size) = band.color_table_size {
                writeln!(f, "  Color Table with {} entries", size)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::paux::OpenOptions;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_report_from_dataset() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("r.raw");
        fs::write(&raw, [0u8; 8]).unwrap();
        fs::write(
            dir.path().join("r.aux"),
            "AuxilaryTarget: r.raw\n\
             RawDefinition: 2 2 2\n\
             ChanDefinition-1: 8U 0 1 2\n\
             ChanDefinition-2: 8U 4 1 2\n\
             METADATA_IMG_2_NO_DATA_VALUE:          -9999.000000000000\n\
             METADATA_IMG_1_Class_0_Color: (RGB: 0 0 0)\n\
             UpLeftX: 100\nUpLeftY: 200\nLoRightX: 110\nLoRightY: 190\n\
             GCP_1_1: 0 0 100 200\n",
        )
        .unwrap();

        let ds = PauxDataset::open(&raw, &OpenOptions::new()).unwrap();
        let report = DatasetReport::from_dataset(&ds);

        assert_eq!(report.size, Dimensions::new(2, 2));
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.geo_transform, Some([100.0, 5.0, 0.0, 200.0, 0.0, -5.0]));
        assert_eq!(report.bands.len(), 2);
        assert_eq!(report.bands[0].color_table_size, Some(1));
        assert_eq!(report.bands[1].no_data_value, Some(-9999.0));
        assert_eq!(report.gcps.len(), 1);

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bands"][1]["layout"]["byte_offset"], 4);
        assert_eq!(value["gcps"][0]["id"], "GCP_1");

        let text = report.to_string();
        assert!(text.contains("Size is 2, 2"));
        assert!(text.contains("NoData Value=-9999"));
    }
}
