//! Georeferencing stored in the sidecar: corner-point geotransform, ground
//! control points and PCI coordinate-system descriptors

use serde::Serialize;

use crate::error::{Error, Result};
use crate::projection::{Coordinate, CoordinateReference, CrsImporter, PROJ_PARAM_COUNT};
use crate::types::Dimensions;
use super::metadata::MetadataStore;
use super::text::{parse_f64, tokenize};

/// Most ground control points collected from one sidecar
pub const MAX_GCP_COUNT: usize = 256;

pub mod keys {
    pub const UP_LEFT_X: &str = "UpLeftX";
    pub const UP_LEFT_Y: &str = "UpLeftY";
    pub const LO_RIGHT_X: &str = "LoRightX";
    pub const LO_RIGHT_Y: &str = "LoRightY";
    pub const MAP_UNITS: &str = "MapUnits";
    pub const PROJ_PARAMS: &str = "ProjParams";
    pub const GCP_MAP_UNITS: &str = "GCP_1_MapUnits";
    pub const GCP_PROJ_PARAMS: &str = "GCP_1_ProjParams";
    /// Spelling written by older producers
    pub const GCP_PROJ_PARAMS_LEGACY: &str = "GCP_1_ProjParms";
}

/// An axis-aligned affine transform.
///
/// Coefficients are `[origin_x, pixel_width, 0, origin_y, 0, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoTransform(pub [f64; 6]);

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

impl GeoTransform {
    /// Builds a north-up transform from the upper-left corner and pixel size
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        GeoTransform([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    /// Maps a pixel/line position to world coordinates
    pub fn apply(&self, pixel: f64, line: f64) -> Coordinate {
        let t = &self.0;
        Coordinate::new(
            t[0] + t[1] * pixel + t[2] * line,
            t[3] + t[4] * pixel + t[5] * line,
        )
    }

    /// Reads the transform from the four corner keys
    pub fn from_store(store: &MetadataStore, dims: Dimensions) -> Result<Self> {
        let corner = |key: &str| {
            store
                .get(key)
                .map(parse_f64)
                .ok_or_else(|| Error::MissingMetadata(format!("{} is not set", key)))
        };

        let up_left_x = corner(keys::UP_LEFT_X)?;
        let up_left_y = corner(keys::UP_LEFT_Y)?;
        let lo_right_x = corner(keys::LO_RIGHT_X)?;
        let lo_right_y = corner(keys::LO_RIGHT_Y)?;

        Ok(GeoTransform::new(
            up_left_x,
            (lo_right_x - up_left_x) / dims.width as f64,
            up_left_y,
            (lo_right_y - up_left_y) / dims.height as f64,
        ))
    }

    /// Writes the four corner keys.
    ///
    /// Values that look geographic (|origin x| < 181 and |pixel width| < 1)
    /// keep 12 decimals, everything else keeps 3.
    pub fn write_to_store(&self, store: &mut MetadataStore, dims: Dimensions) {
        let lo_right_x = self.origin_x() + self.pixel_width() * dims.width as f64;
        let lo_right_y = self.origin_y() + self.pixel_height() * dims.height as f64;

        let precision = if self.origin_x().abs() < 181.0 && self.pixel_width().abs() < 1.0 {
            12
        } else {
            3
        };

        store.set(keys::UP_LEFT_X, format!("{:.*}", precision, self.origin_x()));
        store.set(keys::UP_LEFT_Y, format!("{:.*}", precision, self.origin_y()));
        store.set(keys::LO_RIGHT_X, format!("{:.*}", precision, lo_right_x));
        store.set(keys::LO_RIGHT_Y, format!("{:.*}", precision, lo_right_y));
    }
}

/// A pixel/line to world correspondence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundControlPoint {
    pub id: String,
    pub info: Option<String>,
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GroundControlPoint {
    /// Parses one `GCP_1_<n>` value: `pixel line x y [z ["id" ["info"]]]`.
    ///
    /// Returns `None` for fewer than four tokens. A missing id becomes
    /// `GCP_<n>`.
    pub fn parse(value: &str, index: usize) -> Option<Self> {
        let tokens = tokenize(value);
        if tokens.len() < 4 {
            return None;
        }

        Some(Self {
            pixel: parse_f64(&tokens[0]),
            line: parse_f64(&tokens[1]),
            x: parse_f64(&tokens[2]),
            y: parse_f64(&tokens[3]),
            z: tokens.get(4).map_or(0.0, |t| parse_f64(t)),
            id: tokens
                .get(5)
                .cloned()
                .unwrap_or_else(|| format!("GCP_{}", index)),
            info: tokens.get(6).cloned(),
        })
    }
}

/// Parses a `ProjParams` value into the fixed parameter array.
///
/// Missing trailing values are zero; values past the sixteenth are ignored.
pub fn parse_proj_params(text: Option<&str>) -> [f64; PROJ_PARAM_COUNT] {
    let mut params = [0.0; PROJ_PARAM_COUNT];
    if let Some(text) = text {
        for (slot, token) in params.iter_mut().zip(tokenize(text).iter()) {
            *slot = parse_f64(token);
        }
    }
    params
}

/// Decodes a descriptor plus parameters, yielding an empty reference when
/// the importer rejects it
pub fn import_coordinate_reference(
    importer: &dyn CrsImporter,
    descriptor: &str,
    params_text: Option<&str>,
) -> CoordinateReference {
    let descriptor = descriptor.trim_start_matches(' ');
    let params = parse_proj_params(params_text);

    match importer.import(descriptor, &params) {
        Ok(definition) => CoordinateReference::new(descriptor, &params, definition),
        Err(e) => {
            log::debug!("Coordinate system '{}' not imported: {}", descriptor, e);
            CoordinateReference::empty()
        }
    }
}

/// Collects `GCP_1_1`, `GCP_1_2`, ... until the first missing index or
/// [`MAX_GCP_COUNT`] points, together with their coordinate reference.
///
/// Lines with fewer than four tokens are skipped without ending the scan.
pub fn scan_ground_control_points(
    store: &MetadataStore,
    importer: &dyn CrsImporter,
) -> (Vec<GroundControlPoint>, CoordinateReference) {
    let crs = match store.get(keys::GCP_MAP_UNITS) {
        Some(map_units) => {
            let params = store
                .get(keys::GCP_PROJ_PARAMS)
                .or_else(|| store.get(keys::GCP_PROJ_PARAMS_LEGACY));
            import_coordinate_reference(importer, map_units, params)
        }
        None => CoordinateReference::empty(),
    };

    let mut gcps = Vec::new();
    let mut index = 1;

    while gcps.len() < MAX_GCP_COUNT {
        let Some(value) = store.get(&format!("GCP_1_{}", index)) else {
            break;
        };

        match GroundControlPoint::parse(value, index) {
            Some(gcp) => gcps.push(gcp),
            None => log::debug!("Skipping malformed GCP_1_{}: '{}'", index, value),
        }
        index += 1;
    }

    (gcps, crs)
}
