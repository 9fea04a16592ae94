//! Coordinate reference handling
//!
//! PCI coordinate-system descriptors are translated into PROJ definitions
//! and validated with the `proj` crate.

pub mod coordinate;
pub mod crs;
pub mod pci;

pub use coordinate::Coordinate;
pub use crs::{CoordinateReference, CrsImporter, PciImporter};
pub use pci::{pci_to_proj4, PROJ_PARAM_COUNT};
