//! Raster format support

pub mod paux;
