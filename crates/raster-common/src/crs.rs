//! Coordinate reference system identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GridError;

/// A CRS identified by its EPSG code.
///
/// No reprojection happens anywhere in the pipeline; the CRS only travels
/// with grids so that written rasters carry the right geo-keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic (lat/lon in degrees)
    pub const WGS84: Crs = Crs { epsg: 4326 };

    pub fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// Check if this is a geographic (lat/lon) CRS.
    ///
    /// Only the common geographic datums are recognised; anything else is
    /// treated as projected.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4269 | 4258 | 4283 | 4979)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = GridError;

    /// Accepts "EPSG:4326", "epsg:4326" or a bare code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Err(GridError::InvalidCrs(s.to_string())),
            None => trimmed,
        };
        code.parse::<u16>()
            .map(Crs::from_epsg)
            .map_err(|_| GridError::InvalidCrs(s.to_string()))
    }
}
