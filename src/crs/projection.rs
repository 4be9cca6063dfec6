//! Projection math: forward/inverse between geographic degrees and
//! projected coordinates.
//!
//! Forward maps (longitude, latitude) in degrees to projected (east,
//! north) in meters; inverse goes back. Geographic "projection" is the
//! identity on degrees.

use crate::crs::Ellipsoid;
use crate::{LocationError, Result};
use std::f64::consts::PI;

/// Spherical radius used by Web Mercator regardless of datum ellipsoid
const MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Projection family of a CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Unprojected degrees
    Geographic,
    /// Spherical mercator (EPSG:3857 and friends)
    WebMercator,
    /// Ellipsoidal transverse mercator (UTM, Gauss-Krüger, TM35FIN)
    TransverseMercator {
        central_meridian: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    },
}

/// Projects geographic degrees to the projected space of `kind`.
///
/// In lenient mode latitudes outside the Web Mercator domain are clamped
/// to [`MAX_LATITUDE`]; in strict mode they are a transform error.
pub fn forward(
    kind: &ProjectionKind,
    ellipsoid: &Ellipsoid,
    lon: f64,
    lat: f64,
    lenient: bool,
) -> Result<(f64, f64)> {
    match kind {
        ProjectionKind::Geographic => Ok((lon, lat)),
        ProjectionKind::WebMercator => {
            let lat = if lat.abs() > MAX_LATITUDE {
                if lenient {
                    lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
                } else {
                    return Err(LocationError::Transform(format!(
                        "latitude {lat} outside Web Mercator domain"
                    )));
                }
            } else {
                lat
            };
            let x = lon.to_radians() * MERCATOR_RADIUS;
            let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * MERCATOR_RADIUS;
            Ok((x, y))
        }
        ProjectionKind::TransverseMercator {
            central_meridian,
            scale,
            false_easting,
            false_northing,
        } => Ok(tm_forward(
            ellipsoid,
            *central_meridian,
            *scale,
            *false_easting,
            *false_northing,
            lon,
            lat,
        )),
    }
}

/// Unprojects coordinates of `kind` back to geographic degrees.
pub fn inverse(kind: &ProjectionKind, ellipsoid: &Ellipsoid, x: f64, y: f64) -> Result<(f64, f64)> {
    match kind {
        ProjectionKind::Geographic => Ok((x, y)),
        ProjectionKind::WebMercator => {
            let lon = (x / MERCATOR_RADIUS).to_degrees();
            let lat = (2.0 * (y / MERCATOR_RADIUS).exp().atan() - PI / 2.0).to_degrees();
            Ok((lon, lat))
        }
        ProjectionKind::TransverseMercator {
            central_meridian,
            scale,
            false_easting,
            false_northing,
        } => Ok(tm_inverse(
            ellipsoid,
            *central_meridian,
            *scale,
            *false_easting,
            *false_northing,
            x,
            y,
        )),
    }
}

fn tm_forward(
    ellipsoid: &Ellipsoid,
    central_meridian: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
    lon: f64,
    lat: f64,
) -> (f64, f64) {
    let a = ellipsoid.a;
    let e2 = ellipsoid.e2();
    let e_prime2 = e2 / (1.0 - e2);

    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let lon0_rad = central_meridian.to_radians();

    let n = a / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt();
    let t = lat_rad.tan().powi(2);
    let c = e_prime2 * lat_rad.cos().powi(2);
    let a_coef = (lon_rad - lon0_rad) * lat_rad.cos();

    // Meridian arc length
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat_rad
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat_rad).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat_rad).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat_rad).sin());

    let x = scale * n
        * (a_coef
            + (1.0 - t + c) * a_coef.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * e_prime2) * a_coef.powi(5) / 120.0)
        + false_easting;

    let y = scale
        * (m + n * lat_rad.tan()
            * (a_coef.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a_coef.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * e_prime2) * a_coef.powi(6)
                    / 720.0))
        + false_northing;

    (x, y)
}

fn tm_inverse(
    ellipsoid: &Ellipsoid,
    central_meridian: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
    x: f64,
    y: f64,
) -> (f64, f64) {
    let a = ellipsoid.a;
    let e2 = ellipsoid.e2();
    let e_prime2 = e2 / (1.0 - e2);
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let x = x - false_easting;
    let y = y - false_northing;

    let m = y / scale;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let n1 = a / (1.0 - e2 * phi1.sin().powi(2)).sqrt();
    let t1 = phi1.tan().powi(2);
    let c1 = e_prime2 * phi1.cos().powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * phi1.sin().powi(2)).powf(1.5);
    let d = x / (n1 * scale);

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * e_prime2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * e_prime2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = central_meridian.to_radians()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * e_prime2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / phi1.cos();

    (lon.to_degrees(), lat.to_degrees())
}
