//! Translation of PCI coordinate-system descriptors into PROJ definitions
//!
//! A PCI descriptor is a projection code followed by optional zone and
//! earth-model tokens, e.g. `UTM    11 S E012` or `LONG/LAT    D000`. The
//! numeric parameter array follows PCI's ordering:
//!
//! | index | meaning |
//! |---|---|
//! | 0, 1 | semi-major / semi-minor axis |
//! | 2, 3 | reference longitude / latitude |
//! | 4, 5 | first / second standard parallel |
//! | 6, 7 | false easting / northing |
//! | 8 | scale factor |

use crate::error::{Error, Result};

/// Number of numeric projection parameters carried by a descriptor
pub const PROJ_PARAM_COUNT: usize = 16;

/// Builds a PROJ definition string from a PCI descriptor
pub fn pci_to_proj4(descriptor: &str, params: &[f64; PROJ_PARAM_COUNT]) -> Result<String> {
    let descriptor = descriptor.trim_start_matches(' ');
    let mut tokens = descriptor.split_whitespace();
    let code = tokens
        .next()
        .ok_or_else(|| Error::Projection("Empty coordinate system descriptor".to_string()))?
        .to_ascii_uppercase();
    let rest: Vec<&str> = tokens.collect();

    let builder = match code.as_str() {
        "LONG/LAT" => ProjectionBuilder::new().projection_type("longlat"),
        "UTM" => {
            let (zone, south) = utm_zone(&rest)
                .ok_or_else(|| Error::Projection(format!("Invalid UTM zone in '{}'", descriptor)))?;
            let builder = ProjectionBuilder::new()
                .projection_type("utm")
                .parameter("zone", &zone.to_string());
            if south {
                builder.flag("south")
            } else {
                builder
            }
        }
        "TM" => ProjectionBuilder::new()
            .projection_type("tmerc")
            .latitude_of_origin(params[3])
            .central_meridian(params[2])
            .scale_factor(params[8])
            .false_easting(params[6])
            .false_northing(params[7]),
        "MER" => ProjectionBuilder::new()
            .projection_type("merc")
            .central_meridian(params[2])
            .parameter("lat_ts", &params[3].to_string())
            .false_easting(params[6])
            .false_northing(params[7]),
        "LCC" => ProjectionBuilder::new()
            .projection_type("lcc")
            .parameter("lat_1", &params[4].to_string())
            .parameter("lat_2", &params[5].to_string())
            .latitude_of_origin(params[3])
            .central_meridian(params[2])
            .false_easting(params[6])
            .false_northing(params[7]),
        "ACEA" => ProjectionBuilder::new()
            .projection_type("aea")
            .parameter("lat_1", &params[4].to_string())
            .parameter("lat_2", &params[5].to_string())
            .latitude_of_origin(params[3])
            .central_meridian(params[2])
            .false_easting(params[6])
            .false_northing(params[7]),
        "LAEA" => ProjectionBuilder::new()
            .projection_type("laea")
            .latitude_of_origin(params[3])
            .central_meridian(params[2])
            .false_easting(params[6])
            .false_northing(params[7]),
        "PS" => {
            let pole = if params[3] < 0.0 { -90.0 } else { 90.0 };
            ProjectionBuilder::new()
                .projection_type("stere")
                .latitude_of_origin(pole)
                .parameter("lat_ts", &params[3].to_string())
                .central_meridian(params[2])
                .scale_factor(if params[8] == 0.0 { 1.0 } else { params[8] })
                .false_easting(params[6])
                .false_northing(params[7])
        }
        other => {
            return Err(Error::Projection(format!(
                "Unsupported PCI projection code '{}'",
                other
            )))
        }
    };

    apply_earth_model(builder, &rest, params).build()
}

/// Reads `<zone> [<row>]` after a UTM code.
///
/// A negative zone, or an MGRS latitude-band row letter below `N`, places
/// the zone in the southern hemisphere.
fn utm_zone(tokens: &[&str]) -> Option<(u8, bool)> {
    let position = tokens.iter().position(|t| t.parse::<i32>().is_ok())?;
    let zone = tokens[position].parse::<i32>().ok()?;
    let number = u8::try_from(zone.unsigned_abs()).ok().filter(|z| (1..=60).contains(z))?;

    let row_south = tokens
        .get(position + 1)
        .filter(|t| t.len() == 1)
        .and_then(|t| t.chars().next())
        .filter(char::is_ascii_alphabetic)
        .is_some_and(|row| row.to_ascii_uppercase() < 'N');

    Some((number, zone < 0 || row_south))
}

/// Applies the trailing earth-model token (`Dnnn` datum or `Ennn` ellipsoid)
fn apply_earth_model(
    builder: ProjectionBuilder,
    tokens: &[&str],
    params: &[f64; PROJ_PARAM_COUNT],
) -> ProjectionBuilder {
    let model = tokens.iter().rev().find(|t| {
        let upper = t.to_ascii_uppercase();
        (upper.starts_with('D') || upper.starts_with('E'))
            && upper.len() == 4
            && upper[1..]
                .bytes()
                .enumerate()
                .all(|(i, b)| b.is_ascii_digit() || (i == 0 && b == b'-'))
    });

    match model.map(|m| m.to_ascii_uppercase()).as_deref() {
        Some("D000") => builder.datum("WGS84"),
        Some("D-01") => builder.datum("NAD27"),
        Some("D-02") => builder.datum("NAD83"),
        Some("E000") => builder.ellipsoid("clrk66"),
        Some("E008") => builder.ellipsoid("GRS80"),
        Some("E012") => builder.ellipsoid("WGS84"),
        _ if params[0] > 0.0 && params[1] > 0.0 => builder
            .parameter("a", &params[0].to_string())
            .parameter("b", &params[1].to_string()),
        _ => builder.ellipsoid("WGS84"),
    }
}

/// Builder for PROJ definition strings
pub struct ProjectionBuilder {
    proj_type: Option<String>,
    ellipsoid: Option<String>,
    datum: Option<String>,
    parameters: Vec<(String, Option<String>)>,
}

impl ProjectionBuilder {
    /// Creates a new projection builder
    pub fn new() -> Self {
        Self {
            proj_type: None,
            ellipsoid: None,
            datum: None,
            parameters: Vec::new(),
        }
    }

    /// Sets the projection type (e.g., "utm", "tmerc", "lcc")
    pub fn projection_type(mut self, proj_type: &str) -> Self {
        self.proj_type = Some(proj_type.to_string());
        self
    }

    /// Sets the ellipsoid (e.g., "WGS84", "GRS80")
    pub fn ellipsoid(mut self, ellipsoid: &str) -> Self {
        self.ellipsoid = Some(ellipsoid.to_string());
        self
    }

    /// Sets the datum (e.g., "WGS84", "NAD83")
    pub fn datum(mut self, datum: &str) -> Self {
        self.datum = Some(datum.to_string());
        self
    }

    /// Adds a `+key=value` parameter
    pub fn parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.push((key.to_string(), Some(value.to_string())));
        self
    }

    /// Adds a bare `+key` flag
    pub fn flag(mut self, key: &str) -> Self {
        self.parameters.push((key.to_string(), None));
        self
    }

    pub fn latitude_of_origin(self, lat: f64) -> Self {
        self.parameter("lat_0", &lat.to_string())
    }

    pub fn central_meridian(self, lon: f64) -> Self {
        self.parameter("lon_0", &lon.to_string())
    }

    pub fn scale_factor(self, k: f64) -> Self {
        self.parameter("k", &k.to_string())
    }

    pub fn false_easting(self, x: f64) -> Self {
        self.parameter("x_0", &x.to_string())
    }

    pub fn false_northing(self, y: f64) -> Self {
        self.parameter("y_0", &y.to_string())
    }

    /// Builds the PROJ definition string
    pub fn build(self) -> Result<String> {
        let proj_type = self
            .proj_type
            .ok_or_else(|| Error::Projection("Projection type is required".to_string()))?;

        let mut parts = vec![format!("+proj={}", proj_type)];

        for (key, value) in self.parameters {
            match value {
                Some(value) => parts.push(format!("+{}={}", key, value)),
                None => parts.push(format!("+{}", key)),
            }
        }

        if let Some(datum) = self.datum {
            parts.push(format!("+datum={}", datum));
        } else if let Some(ellipsoid) = self.ellipsoid {
            parts.push(format!("+ellps={}", ellipsoid));
        }

        parts.push("+no_defs".to_string());
        Ok(parts.join(" "))
    }
}

impl Default for ProjectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
