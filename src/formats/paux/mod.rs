//! PCI .aux labelled raw raster support
//!
//! A dataset is a headerless binary file plus a `.aux` text sidecar whose
//! first line is `AuxilaryTarget: <raw file name>`. The sidecar describes
//! the raster size, the byte layout of every channel, georeferencing and
//! per-band metadata.

pub mod band;
pub mod dataset;
pub mod driver;
pub mod georef;
pub mod layout;
pub mod metadata;
pub mod sidecar;
pub mod text;

pub use band::{
    ColorEntry, ColorInterpretation, ColorTable, RasterBand, RasterBandMut, DEFAULT_NO_DATA,
};
pub use dataset::{Access, CreateOptions, OpenOptions, PauxDataset, MAX_BAND_COUNT};
pub use driver::PauxDriver;
pub use georef::{GeoTransform, GroundControlPoint, MAX_GCP_COUNT};
pub use layout::{BandLayout, Interleave};
pub use metadata::{MetadataEntry, MetadataStore, SIDECAR_SEPARATOR};
pub use sidecar::SIDECAR_LINE_LIMIT;
