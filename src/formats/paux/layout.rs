//! Per-band byte layout: parsing `ChanDefinition` lines and computing
//! layouts for new datasets

use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::{DataType, Dimensions};
use super::text::{parse_i64, parse_u64, tokenize};

/// Most bytes one line of a band may span, first sample to last
pub const MAX_LINE_SPAN: u64 = i32::MAX as u64;

/// Largest file offset a band may reach
pub const MAX_FILE_OFFSET: u64 = i64::MAX as u64;

/// Where one band's samples live in the raw file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandLayout {
    pub data_type: DataType,
    /// Offset of the first sample of the first line
    pub byte_offset: u64,
    /// Distance in bytes between horizontally adjacent samples
    pub pixel_stride: i32,
    /// Distance in bytes between vertically adjacent samples
    pub line_stride: i32,
    pub byte_order: ByteOrder,
}

impl BandLayout {
    /// Parses the value of a `ChanDefinition-<n>` line.
    ///
    /// Returns `None` for fewer than four tokens, unparseable strides or a
    /// non-positive stride.
    pub fn parse(text: &str) -> Option<Self> {
        let tokens = tokenize(text);
        if tokens.len() < 4 {
            return None;
        }

        let data_type = DataType::from_type_code(&tokens[0]);
        let byte_offset = parse_u64(&tokens[1]).unwrap_or(0);
        let pixel_stride = i32::try_from(parse_i64(&tokens[2])?).ok()?;
        let line_stride = i32::try_from(parse_i64(&tokens[3])?).ok()?;
        let byte_order = ByteOrder::from_swap_tag(tokens.get(4).map(String::as_str));

        if pixel_stride <= 0 || line_stride <= 0 {
            return None;
        }

        Some(Self {
            data_type,
            byte_offset,
            pixel_stride,
            line_stride,
            byte_order,
        })
    }

    /// Formats the layout as a `ChanDefinition` value
    pub fn to_definition(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.data_type.type_code(),
            self.byte_offset,
            self.pixel_stride,
            self.line_stride,
            self.byte_order.swap_tag()
        )
    }

    /// Whether samples are stored in host byte order
    pub fn is_native_order(&self) -> bool {
        self.byte_order.is_native()
    }

    /// File offset of the sample at (`pixel`, `line`), `None` on overflow
    pub fn sample_offset(&self, pixel: usize, line: usize) -> Option<u64> {
        let line_part = (line as u64).checked_mul(self.line_stride as u64)?;
        let pixel_part = (pixel as u64).checked_mul(self.pixel_stride as u64)?;
        self.byte_offset
            .checked_add(line_part)?
            .checked_add(pixel_part)
    }

    /// Bytes spanned by one line of `width` samples, `None` on overflow
    pub fn line_span(&self, width: usize) -> Option<u64> {
        if width == 0 {
            return Some(0);
        }
        (width as u64 - 1)
            .checked_mul(self.pixel_stride as u64)?
            .checked_add(self.data_type.size() as u64)
    }

    /// Checks that every sample of a `dims` raster is addressable: one line
    /// spans at most [`MAX_LINE_SPAN`] bytes and the last byte lies below
    /// [`MAX_FILE_OFFSET`].
    pub fn validate_extent(&self, dims: Dimensions) -> Result<()> {
        let span = self
            .line_span(dims.width)
            .filter(|&span| span <= MAX_LINE_SPAN)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Line of {} samples with pixel stride {} is too long",
                    dims.width, self.pixel_stride
                ))
            })?;

        self.sample_offset(0, dims.height.saturating_sub(1))
            .and_then(|last_line| last_line.checked_add(span))
            .filter(|&end| end <= MAX_FILE_OFFSET)
            .map(|_| ())
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Band at offset {} with line stride {} ends past the largest file offset",
                    self.byte_offset, self.line_stride
                ))
            })
    }
}

/// Physical ordering of multi-band samples chosen at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Interleave {
    /// All of band 1, then all of band 2, ...
    #[default]
    Band,
    /// One line of each band in turn
    Line,
    /// All bands of one pixel together
    Pixel,
}

impl Interleave {
    /// Reads an `INTERLEAVE` option value; unknown values fall back to `Band`
    pub fn from_option(value: &str) -> Self {
        if value.eq_ignore_ascii_case("LINE") {
            Interleave::Line
        } else if value.eq_ignore_ascii_case("PIXEL") {
            Interleave::Pixel
        } else {
            Interleave::Band
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Interleave::Band => "BAND",
            Interleave::Line => "LINE",
            Interleave::Pixel => "PIXEL",
        }
    }
}

/// Computes the layouts of every band of a new dataset.
///
/// Offsets feed forward across bands from an accumulator seeded at zero.
/// All bands share one data type and are written in host byte order.
pub fn compute_layouts(
    interleave: Interleave,
    width: usize,
    height: usize,
    band_count: usize,
    data_type: DataType,
) -> Result<Vec<BandLayout>> {
    let mut layouts = Vec::with_capacity(band_count);
    let mut offset: u64 = 0;

    for band_index in 0..band_count {
        let (layout, next_offset) = compute_layout(
            interleave,
            band_index,
            width,
            height,
            band_count,
            data_type,
            offset,
        )?;
        layout.validate_extent(Dimensions::new(width, height))?;
        layouts.push(layout);
        offset = next_offset;
    }

    Ok(layouts)
}

/// Computes one band's layout and the offset of the band that follows it
pub fn compute_layout(
    interleave: Interleave,
    band_index: usize,
    width: usize,
    height: usize,
    band_count: usize,
    data_type: DataType,
    running_offset: u64,
) -> Result<(BandLayout, u64)> {
    let sample_size = data_type.size() as u64;
    let pixel_size_sum = sample_size * band_count as u64;
    let width = width as u64;
    let height = height as u64;

    let overflow = || {
        Error::Validation(format!(
            "Band {} of a {}x{}x{} {} raster does not fit in a file",
            band_index + 1,
            width,
            height,
            band_count,
            data_type
        ))
    };

    let (pixel_stride, line_stride, band_bytes) = match interleave {
        Interleave::Band => {
            let line_stride = width.checked_mul(sample_size).ok_or_else(overflow)?;
            let band_bytes = height.checked_mul(line_stride).ok_or_else(overflow)?;
            (sample_size, line_stride, band_bytes)
        }
        Interleave::Line => (
            sample_size,
            width.checked_mul(pixel_size_sum).ok_or_else(overflow)?,
            sample_size.checked_mul(width).ok_or_else(overflow)?,
        ),
        Interleave::Pixel => (
            pixel_size_sum,
            width.checked_mul(pixel_size_sum).ok_or_else(overflow)?,
            sample_size,
        ),
    };
    let next_offset = running_offset.checked_add(band_bytes).ok_or_else(overflow)?;

    let to_stride = |value: u64, what: &str| {
        i32::try_from(value).map_err(|_| {
            Error::Validation(format!(
                "{} of band {} ({} bytes) does not fit a channel definition",
                what,
                band_index + 1,
                value
            ))
        })
    };

    let layout = BandLayout {
        data_type,
        byte_offset: running_offset,
        pixel_stride: to_stride(pixel_stride, "pixel stride")?,
        line_stride: to_stride(line_stride, "line stride")?,
        byte_order: ByteOrder::native(),
    };

    Ok((layout, next_offset))
}
