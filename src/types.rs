//! Core data types for paux-raster

use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// Sample types a PCI .aux channel can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// Unsigned 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// 32-bit floating point
    Float32,
}

impl DataType {
    /// Returns the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::Byte => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Float32 => 4,
        }
    }

    /// Returns the name of this data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Byte => "Byte",
            DataType::Int16 => "Int16",
            DataType::UInt16 => "UInt16",
            DataType::Float32 => "Float32",
        }
    }

    /// Maps a channel type code to a data type.
    ///
    /// Codes are matched case-insensitively; anything unrecognised
    /// (including `8U`) reads as `Byte`.
    pub fn from_type_code(code: &str) -> Self {
        if code.eq_ignore_ascii_case("16U") {
            DataType::UInt16
        } else if code.eq_ignore_ascii_case("16S") {
            DataType::Int16
        } else if code.eq_ignore_ascii_case("32R") {
            DataType::Float32
        } else {
            DataType::Byte
        }
    }

    /// Returns the channel type code written to `ChanDefinition` lines
    pub fn type_code(&self) -> &'static str {
        match self {
            DataType::Byte => "8U",
            DataType::Int16 => "16S",
            DataType::UInt16 => "16U",
            DataType::Float32 => "32R",
        }
    }

    /// Decodes one host-order sample as f64
    pub fn decode_sample(&self, bytes: &[u8]) -> Option<f64> {
        let value = match self {
            DataType::Byte => *bytes.first()? as f64,
            DataType::Int16 => i16::from_ne_bytes(bytes.get(..2)?.try_into().ok()?) as f64,
            DataType::UInt16 => u16::from_ne_bytes(bytes.get(..2)?.try_into().ok()?) as f64,
            DataType::Float32 => f32::from_ne_bytes(bytes.get(..4)?.try_into().ok()?) as f64,
        };
        Some(value)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses a data type name such as `UInt16`; types a channel cannot hold
    /// are rejected
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [DataType::Byte, DataType::Int16, DataType::UInt16, DataType::Float32]
            .into_iter()
            .find(|dt| dt.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                Error::Unsupported(format!(
                    "Attempt to create PCI .aux labelled dataset with an illegal data type ({})",
                    name
                ))
            })
    }
}

/// Represents raster dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: usize,
    /// Height in lines
    pub height: usize,
}

impl Dimensions {
    /// Creates new dimensions
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}
