//! Driver entry point for PCI .aux labelled rasters

use std::path::Path;

use crate::error::Result;
use crate::types::DataType;
use super::dataset::{CreateOptions, OpenOptions, PauxDataset};
use super::sidecar;

/// Creation options accepted by [`PauxDriver::create`]
pub const CREATION_OPTION_LIST: &str = "<CreationOptionList>\
   <Option name='INTERLEAVE' type='string-select' default='BAND'>\
       <Value>BAND</Value>\
       <Value>LINE</Value>\
       <Value>PIXEL</Value>\
   </Option>\
</CreationOptionList>";

/// Describes the format and opens, creates or deletes its datasets.
///
/// Construct one where it is needed; there is no global registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PauxDriver;

impl PauxDriver {
    pub fn new() -> Self {
        PauxDriver
    }

    pub fn short_name(&self) -> &'static str {
        "PAux"
    }

    pub fn long_name(&self) -> &'static str {
        "PCI .aux Labelled"
    }

    pub fn creation_data_types(&self) -> &'static [DataType] {
        &[DataType::Byte, DataType::Int16, DataType::UInt16, DataType::Float32]
    }

    pub fn creation_option_list(&self) -> &'static str {
        CREATION_OPTION_LIST
    }

    /// Whether `path` (a raw file or its sidecar) has a tagged `.aux` sidecar
    pub fn identify<P: AsRef<Path>>(&self, path: P, siblings: Option<&[String]>) -> bool {
        let target = sidecar::resolve_target(path.as_ref());
        sidecar::locate_sidecar(&target, siblings)
            .and_then(|aux| sidecar::sniff(&aux))
            .is_ok()
    }

    pub fn open<P: AsRef<Path>>(&self, path: P, options: &OpenOptions) -> Result<PauxDataset> {
        PauxDataset::open(path, options)
    }

    /// Creates a dataset from a data type name and `NAME=VALUE` options
    pub fn create<P: AsRef<Path>>(
        &self,
        path: P,
        width: usize,
        height: usize,
        band_count: usize,
        data_type: &str,
        options: &[&str],
    ) -> Result<PauxDataset> {
        let data_type = data_type.parse::<DataType>()?;
        PauxDataset::create(
            path,
            width,
            height,
            band_count,
            data_type,
            &CreateOptions::from_strings(options),
        )
    }

    pub fn delete<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PauxDataset::delete(path)
    }
}
