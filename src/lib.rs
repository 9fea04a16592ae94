//! paux-raster - PCI .aux labelled raw rasters for Rust
//!
//! A PCI .aux dataset is a headerless binary image plus a `.aux` text
//! sidecar describing its size, the byte layout of every channel,
//! georeferencing and per-band metadata. This crate reads and writes both
//! halves.
//!
//! # Examples
//!
//! ## Reading
//!
//! ```no_run
//! use paux_raster::{OpenOptions, PauxDataset};
//!
//! let dataset = PauxDataset::open("scene.raw", &OpenOptions::new())?;
//! println!("Size: {} x {}", dataset.width(), dataset.height());
//!
//! for band in dataset.bands() {
//!     let first_line = band.read_line_f64(0)?;
//!     println!("Band {} ({}): {:?}", band.number(), band.data_type(), &first_line[..4]);
//! }
//!
//! if let Ok(gt) = dataset.geo_transform() {
//!     println!("Origin: ({}, {})", gt.origin_x(), gt.origin_y());
//! }
//! # Ok::<(), paux_raster::Error>(())
//! ```
//!
//! ## Creating
//!
//! ```no_run
//! use paux_raster::{CreateOptions, DataType, GeoTransform, Interleave, PauxDataset};
//!
//! let options = CreateOptions::new().interleave(Interleave::Pixel);
//! let mut dataset = PauxDataset::create("out.raw", 512, 512, 3, DataType::UInt16, &options)?;
//!
//! dataset.set_geo_transform(GeoTransform::new(440720.0, 60.0, 3751320.0, -60.0));
//! dataset.band_mut(1)?.set_no_data_value(0.0)?;
//! dataset.close()?;
//! # Ok::<(), paux_raster::Error>(())
//! ```

pub mod error;
pub mod formats;
pub mod io;
pub mod projection;
pub mod report;
pub mod types;

pub use error::{Error, Result};
pub use formats::paux::{
    Access, BandLayout, ColorEntry, ColorInterpretation, ColorTable, CreateOptions, GeoTransform,
    GroundControlPoint, Interleave, MetadataStore, OpenOptions, PauxDataset, PauxDriver,
    RasterBand, RasterBandMut, DEFAULT_NO_DATA, MAX_BAND_COUNT, MAX_GCP_COUNT,
};
pub use io::ByteOrder;
pub use projection::{CoordinateReference, CrsImporter, PciImporter, PROJ_PARAM_COUNT};
pub use report::DatasetReport;
pub use types::{DataType, Dimensions};
