//! I/O utilities for paux-raster
//!
//! Provides byte order handling and positioned access to raw image files.

pub mod traits;
pub mod byte_order;

pub use traits::RawStorage;
pub use byte_order::ByteOrder;
