//! Raster bands of a PCI .aux dataset
//!
//! A [`BandView`] is owned by its dataset and refers back to it only through
//! its band number, which keys its sidecar entries. [`RasterBand`] and
//! [`RasterBandMut`] pair a view with a borrow of the dataset for access.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::RawStorage;
use crate::types::{DataType, Dimensions};
use super::dataset::{Access, PauxDataset};
use super::layout::{BandLayout, MAX_LINE_SPAN};
use super::metadata::MetadataStore;
use super::text::{parse_f64, parse_i64, starts_with_ci};

/// Value reported when a band has no stored nodata value
pub const DEFAULT_NO_DATA: f64 = -1.0e8;

/// Number of palette classes scanned per band
pub const COLOR_TABLE_SIZE: usize = 256;

pub(crate) fn no_data_key(band: usize) -> String {
    format!("METADATA_IMG_{}_NO_DATA_VALUE", band)
}

pub(crate) fn description_key(band: usize) -> String {
    format!("ChanDesc-{}", band)
}

pub(crate) fn class_color_key(band: usize, class: usize) -> String {
    format!("METADATA_IMG_{}_Class_{}_Color", band, class)
}

/// One palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorEntry {
    pub red: i16,
    pub green: i16,
    pub blue: i16,
    pub alpha: i16,
}

impl ColorEntry {
    /// Parses `(RGB: r g b)`; alpha is always opaque
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim_start_matches(' ');
        if !starts_with_ci(value, "(RGB:") {
            return None;
        }

        let mut components = value[5..].split_whitespace().map(parse_i64);
        let mut next = || -> Option<i16> { components.next()?.map(|c| c as i16) };
        let (red, green, blue) = (next()?, next()?, next()?);

        Some(Self {
            red,
            green,
            blue,
            alpha: 255,
        })
    }
}

/// A sparse palette: classes missing from the sidecar stay unset
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ColorTable {
    entries: Vec<Option<ColorEntry>>,
}

impl ColorTable {
    /// Builds the palette of `band`, provided class 0 has a color key.
    ///
    /// The table exists even when class 0's value fails to parse.
    pub fn from_store(store: &MetadataStore, band: usize) -> Option<Self> {
        store.get(&class_color_key(band, 0))?;

        let mut table = ColorTable::default();
        for class in 0..COLOR_TABLE_SIZE {
            if let Some(entry) = store.get(&class_color_key(band, class)).and_then(ColorEntry::parse) {
                table.set_entry(class, entry);
            }
        }
        Some(table)
    }

    pub fn set_entry(&mut self, index: usize, entry: ColorEntry) {
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(entry);
    }

    pub fn entry(&self, index: usize) -> Option<ColorEntry> {
        self.entries.get(index).copied().flatten()
    }

    /// One past the highest set index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How sample values should be interpreted for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorInterpretation {
    Undefined,
    PaletteIndex,
}

/// Per-band state held by the dataset
#[derive(Debug, Clone)]
pub struct BandView {
    number: usize,
    layout: BandLayout,
    description: String,
    color_table: Option<ColorTable>,
}

impl BandView {
    pub(crate) fn new(number: usize, layout: BandLayout, store: &MetadataStore) -> Self {
        Self {
            number,
            layout,
            description: store.get(&description_key(number)).unwrap_or_default().to_string(),
            color_table: ColorTable::from_store(store, number),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }
}

/// Shared access to one band
pub struct RasterBand<'a> {
    dataset: &'a PauxDataset,
    view: &'a BandView,
}

impl<'a> RasterBand<'a> {
    pub(crate) fn new(dataset: &'a PauxDataset, view: &'a BandView) -> Self {
        Self { dataset, view }
    }

    /// 1-based band number
    pub fn number(&self) -> usize {
        self.view.number
    }

    pub fn layout(&self) -> &BandLayout {
        &self.view.layout
    }

    pub fn data_type(&self) -> DataType {
        self.view.layout.data_type
    }

    pub fn size(&self) -> Dimensions {
        self.dataset.dimensions()
    }

    /// The stored nodata value, if any
    pub fn no_data_value(&self) -> Option<f64> {
        self.dataset
            .metadata()
            .get(&no_data_key(self.view.number))
            .map(parse_f64)
    }

    /// The stored nodata value, or [`DEFAULT_NO_DATA`] when unset
    pub fn no_data_value_or_default(&self) -> f64 {
        self.no_data_value().unwrap_or(DEFAULT_NO_DATA)
    }

    pub fn color_table(&self) -> Option<&'a ColorTable> {
        self.view.color_table.as_ref()
    }

    pub fn color_interpretation(&self) -> ColorInterpretation {
        match self.view.color_table {
            Some(_) => ColorInterpretation::PaletteIndex,
            None => ColorInterpretation::Undefined,
        }
    }

    pub fn description(&self) -> &'a str {
        &self.view.description
    }

    /// Reads one line of samples, packed and in host byte order.
    ///
    /// Bytes beyond the end of the raw file read as zero.
    pub fn read_line(&self, line: usize) -> Result<Vec<u8>> {
        let dims = self.dataset.dimensions();
        check_line(line, dims)?;

        let layout = &self.view.layout;
        let sample_size = layout.data_type.size();
        let pixel_stride = layout.pixel_stride as usize;

        let (offset, span_len) = line_window(layout, line, dims.width)?;
        let mut span = vec![0u8; span_len];
        self.dataset.storage()?.read_at(offset, &mut span)?;

        let mut samples = if pixel_stride == sample_size {
            span
        } else {
            let mut packed = Vec::with_capacity(dims.width * sample_size);
            for pixel in 0..dims.width {
                let start = pixel * pixel_stride;
                packed.extend_from_slice(&span[start..start + sample_size]);
            }
            packed
        };

        layout.byte_order.to_native_in_place(&mut samples, sample_size);
        Ok(samples)
    }

    /// Reads one line and widens every sample to f64
    pub fn read_line_f64(&self, line: usize) -> Result<Vec<f64>> {
        let data_type = self.data_type();
        let bytes = self.read_line(line)?;
        bytes
            .chunks_exact(data_type.size())
            .map(|sample| {
                data_type
                    .decode_sample(sample)
                    .ok_or_else(|| Error::OutOfBounds("Truncated sample".to_string()))
            })
            .collect()
    }
}

/// Mutable access to one band
pub struct RasterBandMut<'a> {
    dataset: &'a mut PauxDataset,
    index: usize,
}

impl<'a> RasterBandMut<'a> {
    pub(crate) fn new(dataset: &'a mut PauxDataset, index: usize) -> Self {
        Self { dataset, index }
    }

    /// Shared view of the same band
    pub fn as_band(&self) -> RasterBand<'_> {
        RasterBand::new(&*self.dataset, &self.dataset.band_views()[self.index])
    }

    fn number(&self) -> usize {
        self.dataset.band_views()[self.index].number
    }

    /// Stores a nodata value under `METADATA_IMG_<n>_NO_DATA_VALUE`
    pub fn set_no_data_value(&mut self, value: f64) -> Result<()> {
        if self.dataset.access() == Access::ReadOnly {
            return Err(Error::ReadOnly("Can't update readonly dataset.".to_string()));
        }

        let key = no_data_key(self.number());
        self.dataset.metadata_mut().set(&key, format!("{:24.12}", value));
        Ok(())
    }

    /// Sets the band description, mirroring it into `ChanDesc-<n>` when the
    /// dataset is open for update
    pub fn set_description(&mut self, description: &str) {
        if self.dataset.access() == Access::Update {
            let key = description_key(self.number());
            self.dataset.metadata_mut().set(&key, description);
        }
        self.dataset.band_views_mut()[self.index].description = description.to_string();
    }

    /// Writes one line of packed host-order samples
    pub fn write_line(&mut self, line: usize, samples: &[u8]) -> Result<()> {
        if self.dataset.access() == Access::ReadOnly {
            return Err(Error::ReadOnly("Can't write to a readonly dataset.".to_string()));
        }

        let dims = self.dataset.dimensions();
        check_line(line, dims)?;

        let layout = self.dataset.band_views()[self.index].layout;
        let sample_size = layout.data_type.size();
        let pixel_stride = layout.pixel_stride as usize;

        if samples.len() != dims.width * sample_size {
            return Err(Error::Validation(format!(
                "Line buffer holds {} bytes, expected {}",
                samples.len(),
                dims.width * sample_size
            )));
        }

        let mut encoded = samples.to_vec();
        layout.byte_order.to_native_in_place(&mut encoded, sample_size);

        let (offset, span_len) = line_window(&layout, line, dims.width)?;
        let storage = self.dataset.storage()?;

        if pixel_stride == sample_size {
            storage.write_at(offset, &encoded)?;
        } else {
            let mut span = vec![0u8; span_len];
            storage.read_at(offset, &mut span)?;
            for (pixel, sample) in encoded.chunks_exact(sample_size).enumerate() {
                let start = pixel * pixel_stride;
                span[start..start + sample_size].copy_from_slice(sample);
            }
            storage.write_at(offset, &span)?;
        }

        Ok(())
    }
}

/// File offset and byte length of one line of samples
fn line_window(layout: &BandLayout, line: usize, width: usize) -> Result<(u64, usize)> {
    let offset = layout.sample_offset(0, line);
    let span = layout
        .line_span(width)
        .filter(|&span| span <= MAX_LINE_SPAN)
        .and_then(|span| usize::try_from(span).ok());

    match (offset, span) {
        (Some(offset), Some(span)) => Ok((offset, span)),
        _ => Err(Error::OutOfBounds(format!(
            "Line {} of a band at offset {} is not addressable",
            line, layout.byte_offset
        ))),
    }
}

fn check_line(line: usize, dims: Dimensions) -> Result<()> {
    if line >= dims.height {
        return Err(Error::OutOfBounds(format!(
            "Line {} outside raster height {}",
            line, dims.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_entry_parse() {
        assert_eq!(
            ColorEntry::parse("  (RGB: 10 20 30)"),
            Some(ColorEntry { red: 10, green: 20, blue: 30, alpha: 255 })
        );
        assert_eq!(
            ColorEntry::parse("(rgb:1 2 3)"),
            Some(ColorEntry { red: 1, green: 2, blue: 3, alpha: 255 })
        );
        assert_eq!(ColorEntry::parse("(RGB: 1 2)"), None);
        assert_eq!(ColorEntry::parse("(HSV: 1 2 3)"), None);
    }

    #[test]
    fn test_color_table_requires_class_zero() {
        let store = MetadataStore::parse("METADATA_IMG_1_Class_1_Color: (RGB: 1 2 3)\n");
        assert!(ColorTable::from_store(&store, 1).is_none());
    }

    #[test]
    fn test_color_table_is_sparse() {
        let store = MetadataStore::parse(
            "METADATA_IMG_2_Class_0_Color: (RGB: 0 0 0)\n\
             METADATA_IMG_2_Class_5_Color:    (RGB: 255 128 64)\n",
        );
        let table = ColorTable::from_store(&store, 2).unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.entry(5), Some(ColorEntry { red: 255, green: 128, blue: 64, alpha: 255 }));
        assert_eq!(table.entry(3), None);
        assert_eq!(table.entry(200), None);
        assert!(ColorTable::from_store(&store, 1).is_none());
    }

    #[test]
    fn test_color_table_with_broken_class_zero() {
        let store = MetadataStore::parse("METADATA_IMG_1_Class_0_Color: garbage\n");
        let table = ColorTable::from_store(&store, 1).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_band_view_reads_description() {
        let store = MetadataStore::parse("ChanDesc-3: Near infrared\n");
        let layout = BandLayout::parse("8U 0 1 10").unwrap();
        let view = BandView::new(3, layout, &store);
        assert_eq!(view.description, "Near infrared");
        assert!(view.color_table.is_none());
    }

    #[test]
    fn test_line_window() {
        let layout = BandLayout::parse("16U 100 6 60").unwrap();
        assert_eq!(line_window(&layout, 2, 10).unwrap(), (220, 9 * 6 + 2));
    }

    #[test]
    fn test_line_window_overflow_is_an_error() {
        let layout = BandLayout::parse("8U 18446744073709551615 1 2").unwrap();
        assert!(line_window(&layout, 0, 1).is_ok());
        assert!(matches!(line_window(&layout, 1, 1), Err(Error::OutOfBounds(_))));

        let long_line = BandLayout::parse("8U 0 2147483647 2147483647").unwrap();
        assert!(matches!(line_window(&long_line, 0, 3), Err(Error::OutOfBounds(_))));
    }
}
