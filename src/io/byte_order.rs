//! Byte order (endianness) handling
//!
//! Channel definitions record byte order with the legacy `Swapped` /
//! `Unswapped` tags. The tags are relative to big-endian storage:
//! `Unswapped` data is big-endian and `Swapped` data is little-endian.

use serde::Serialize;

/// Tag for little-endian channel data
pub const SWAPPED_TAG: &str = "Swapped";

/// Tag for big-endian channel data
pub const UNSWAPPED_TAG: &str = "Unswapped";

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the running host
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Interprets the optional fifth `ChanDefinition` token.
    ///
    /// The host's own tag (`Swapped` on little-endian hosts, `Unswapped` on
    /// big-endian hosts) selects native order; any other token selects the
    /// opposite order. A missing token means native order.
    pub fn from_swap_tag(tag: Option<&str>) -> Self {
        let native = Self::native();
        match tag {
            None => native,
            Some(tag) if tag.eq_ignore_ascii_case(native.swap_tag()) => native,
            Some(_) => native.opposite(),
        }
    }

    /// Returns the legacy tag describing this byte order
    pub fn swap_tag(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => SWAPPED_TAG,
            ByteOrder::BigEndian => UNSWAPPED_TAG,
        }
    }

    /// Returns the other byte order
    pub fn opposite(&self) -> Self {
        match self {
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
        }
    }

    /// Whether data in this order can be used without swapping
    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }

    /// Converts packed samples between this order and host order in place.
    ///
    /// The conversion is its own inverse, so the same call serves reads and
    /// writes.
    pub fn to_native_in_place(&self, buf: &mut [u8], sample_size: usize) {
        if self.is_native() || sample_size < 2 {
            return;
        }
        for sample in buf.chunks_exact_mut(sample_size) {
            sample.reverse();
        }
    }
}
