//! Coordinate reference systems: handles, datums and code resolution.
//!
//! A [`Crs`] is a cheap handle describing a coordinate space: its
//! authority code, projection kind, datum and axis order. Handles are
//! resolved from authority:code strings against a built-in registry of
//! well-known systems rather than an external EPSG database.

pub mod projection;
pub mod transform;

use crate::{LocationError, Result};
use projection::ProjectionKind;

/// Axis order of a coordinate reference system.
///
/// Geographic systems registered by EPSG are natively latitude-first;
/// resolving with `force_lon_lat` flips them so that the first axis is
/// always east/longitude across the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// First axis east/longitude, second north/latitude
    EastNorth,
    /// First axis north/latitude, second east/longitude
    NorthEast,
}

/// Reference ellipsoid (semi-major axis in meters, inverse flattening).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub a: f64,
    pub inv_f: f64,
}

impl Ellipsoid {
    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        let f = 1.0 / self.inv_f;
        2.0 * f - f * f
    }
}

pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_222_101,
};

pub const WGS84_ELLIPSOID: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_223_563,
};

pub const INTERNATIONAL_1924: Ellipsoid = Ellipsoid {
    a: 6_378_388.0,
    inv_f: 297.0,
};

/// Seven-parameter Helmert shift to WGS84 (position vector convention).
///
/// Translations in meters, rotations in arc seconds, scale in ppm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelmertShift {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx_sec: f64,
    pub ry_sec: f64,
    pub rz_sec: f64,
    pub scale_ppm: f64,
}

impl HelmertShift {
    pub const NULL: HelmertShift = HelmertShift {
        dx: 0.0,
        dy: 0.0,
        dz: 0.0,
        rx_sec: 0.0,
        ry_sec: 0.0,
        rz_sec: 0.0,
        scale_ppm: 0.0,
    };
}

/// Geodetic datum: ellipsoid plus an optional shift to WGS84.
///
/// `to_wgs84 == None` means no published shift parameters; transforms
/// across such a datum boundary only succeed in lenient mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    pub name: &'static str,
    pub ellipsoid: Ellipsoid,
    pub to_wgs84: Option<HelmertShift>,
}

pub const DATUM_WGS84: Datum = Datum {
    name: "WGS84",
    ellipsoid: WGS84_ELLIPSOID,
    to_wgs84: Some(HelmertShift::NULL),
};

/// ETRS89 differs from WGS84 by well under a meter; treated as a null shift.
pub const DATUM_ETRS89: Datum = Datum {
    name: "ETRS89",
    ellipsoid: GRS80,
    to_wgs84: Some(HelmertShift::NULL),
};

/// KKJ (Kartastokoordinaattijärjestelmä), JHS 154 parameters.
pub const DATUM_KKJ: Datum = Datum {
    name: "KKJ",
    ellipsoid: INTERNATIONAL_1924,
    to_wgs84: Some(HelmertShift {
        dx: -96.062,
        dy: -82.428,
        dz: -121.753,
        rx_sec: 4.801,
        ry_sec: 0.345,
        rz_sec: -1.376,
        scale_ppm: 1.496,
    }),
};

/// Handle to a resolved coordinate reference system.
///
/// Cheap to clone. Equality considers the authority code and axis order
/// only; two handles for the same code resolved with different axis
/// conventions are distinct coordinate spaces.
#[derive(Debug, Clone)]
pub struct Crs {
    code: String,
    kind: ProjectionKind,
    datum: Datum,
    axis: AxisOrder,
}

impl Crs {
    pub(crate) fn new(code: String, kind: ProjectionKind, datum: Datum, axis: AxisOrder) -> Self {
        Self {
            code,
            kind,
            datum,
            axis,
        }
    }

    /// Normalized authority code, e.g. `EPSG:3067`
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> &ProjectionKind {
        &self.kind
    }

    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn axis(&self) -> AxisOrder {
        self.axis
    }

    /// True for unprojected (degree-valued) systems
    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, ProjectionKind::Geographic)
    }

    /// Key for the process-wide transform cache
    pub(crate) fn cache_key(&self) -> String {
        match self.axis {
            AxisOrder::EastNorth => format!("{}:en", self.code),
            AxisOrder::NorthEast => format!("{}:ne", self.code),
        }
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.axis == other.axis
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Registry entry: projection, datum and the authority's native axis order.
fn lookup(authority: &str, code: u32) -> Option<(ProjectionKind, Datum, AxisOrder)> {
    if authority != "EPSG" {
        return None;
    }
    match code {
        // WGS84 geographic, latitude-first by the authority
        4326 => Some((ProjectionKind::Geographic, DATUM_WGS84, AxisOrder::NorthEast)),
        // ETRS89 geographic
        4258 => Some((ProjectionKind::Geographic, DATUM_ETRS89, AxisOrder::NorthEast)),
        // Web Mercator
        3857 => Some((ProjectionKind::WebMercator, DATUM_WGS84, AxisOrder::EastNorth)),
        // ETRS-TM35FIN
        3067 => Some((
            ProjectionKind::TransverseMercator {
                central_meridian: 27.0,
                scale: 0.9996,
                false_easting: 500_000.0,
                false_northing: 0.0,
            },
            DATUM_ETRS89,
            AxisOrder::EastNorth,
        )),
        // KKJ / Finland Uniform Coordinate System (zone 3 Gauss-Krüger)
        2393 => Some((
            ProjectionKind::TransverseMercator {
                central_meridian: 27.0,
                scale: 1.0,
                false_easting: 3_500_000.0,
                false_northing: 0.0,
            },
            DATUM_KKJ,
            AxisOrder::EastNorth,
        )),
        _ => None,
    }
}

/// Resolves an authority:code string to a [`Crs`] handle.
///
/// With `force_lon_lat` the handle uses longitude-first axis order even
/// when the authority registers the system latitude-first. Unknown or
/// malformed codes yield [`LocationError::Resolution`].
pub fn resolve(srs: &str, force_lon_lat: bool) -> Result<Crs> {
    let srs = srs.trim();
    let (authority, code) = srs
        .split_once(':')
        .ok_or_else(|| LocationError::Resolution(format!("malformed SRS code '{srs}'")))?;
    let authority = authority.to_ascii_uppercase();
    let code: u32 = code
        .parse()
        .map_err(|_| LocationError::Resolution(format!("malformed SRS code '{srs}'")))?;

    let (kind, datum, native_axis) = lookup(&authority, code)
        .ok_or_else(|| LocationError::Resolution(format!("unknown SRS code '{srs}'")))?;

    let axis = if force_lon_lat {
        AxisOrder::EastNorth
    } else {
        native_axis
    };

    Ok(Crs::new(format!("{authority}:{code}"), kind, datum, axis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_codes() {
        for code in ["EPSG:4326", "EPSG:4258", "EPSG:3857", "EPSG:3067", "EPSG:2393"] {
            let crs = resolve(code, true).unwrap();
            assert_eq!(crs.code(), code);
            assert_eq!(crs.axis(), AxisOrder::EastNorth);
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let crs = resolve("epsg:3067", true).unwrap();
        assert_eq!(crs.code(), "EPSG:3067");
    }

    #[test]
    fn test_native_axis_order_is_latitude_first_for_geographic() {
        let crs = resolve("EPSG:4326", false).unwrap();
        assert_eq!(crs.axis(), AxisOrder::NorthEast);

        // Projected systems are east-first either way
        let crs = resolve("EPSG:3857", false).unwrap();
        assert_eq!(crs.axis(), AxisOrder::EastNorth);
    }

    #[test]
    fn test_forced_axis_order_makes_distinct_handles() {
        let lon_lat = resolve("EPSG:4326", true).unwrap();
        let lat_lon = resolve("EPSG:4326", false).unwrap();
        assert_ne!(lon_lat, lat_lon);
    }

    #[test]
    fn test_resolve_unknown_code() {
        let err = resolve("EPSG:99999", true).unwrap_err();
        assert!(matches!(err, LocationError::Resolution(_)));
    }

    #[test]
    fn test_resolve_malformed_code() {
        assert!(matches!(
            resolve("not-a-code", true),
            Err(LocationError::Resolution(_))
        ));
        assert!(matches!(
            resolve("EPSG:abc", true),
            Err(LocationError::Resolution(_))
        ));
    }

    #[test]
    fn test_ellipsoid_eccentricity() {
        // GRS80: e^2 ~= 0.00669438
        assert!((GRS80.e2() - 0.006_694_38).abs() < 1e-7);
    }
}
