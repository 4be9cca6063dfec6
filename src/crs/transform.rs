//! Coordinate transforms between resolved CRS handles.
//!
//! A [`Transform`] reprojects point-wise: inverse-project to geographic
//! degrees on the source datum, shift datums through geocentric
//! coordinates when they differ, forward-project into the target.
//! Constructed transforms are cached process-wide keyed by CRS pair and
//! leniency, since repeated construction for the same pair is the common
//! case (every feature request reprojects against the session CRS).

use crate::core::envelope::Envelope;
use crate::crs::{projection, Crs, Datum, Ellipsoid, HelmertShift};
use crate::{LocationError, Result};
use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use std::sync::Mutex;

/// Sample points per envelope edge when reprojecting; projected edges
/// curve, so corners alone under-cover the true extent.
const EDGE_SAMPLES: usize = 5;

static TRANSFORM_CACHE: Lazy<Mutex<FxHashMap<(String, String, bool), Transform>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// A reusable transform from one CRS to another.
///
/// Lenient transforms tolerate geodetic imprecision: a missing datum
/// shift is taken as null, and latitudes outside the Web Mercator domain
/// are clamped instead of failing. Strict transforms error in both cases.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    source: Crs,
    target: Crs,
    lenient: bool,
}

impl Transform {
    pub fn source(&self) -> &Crs {
        &self.source
    }

    pub fn target(&self) -> &Crs {
        &self.target
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Transforms a single coordinate pair, given and returned in the
    /// axis order of the respective CRS.
    pub fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.source == self.target {
            return Ok((x, y));
        }

        let (east, north) = match self.source.axis() {
            crate::crs::AxisOrder::EastNorth => (x, y),
            crate::crs::AxisOrder::NorthEast => (y, x),
        };

        let (lon, lat) = projection::inverse(
            self.source.kind(),
            &self.source.datum().ellipsoid,
            east,
            north,
        )?;
        let (lon, lat) = datum_shift(self.source.datum(), self.target.datum(), self.lenient, lon, lat)?;
        let (tx, ty) = projection::forward(
            self.target.kind(),
            &self.target.datum().ellipsoid,
            lon,
            lat,
            self.lenient,
        )?;

        if !tx.is_finite() || !ty.is_finite() {
            return Err(LocationError::Transform(format!(
                "non-finite result transforming ({x}, {y}) from {} to {}",
                self.source, self.target
            )));
        }

        match self.target.axis() {
            crate::crs::AxisOrder::EastNorth => Ok((tx, ty)),
            crate::crs::AxisOrder::NorthEast => Ok((ty, tx)),
        }
    }

    /// Reprojects an envelope into the target CRS.
    ///
    /// Edges are densified and the min/max hull of the transformed
    /// samples taken, so the result covers the curved image of the box.
    pub fn apply_envelope(&self, env: &Envelope) -> Result<Envelope> {
        if self.source == self.target {
            return Ok(env.clone());
        }

        let (w, h) = (env.width(), env.height());
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for i in 0..=EDGE_SAMPLES {
            let t = i as f64 / EDGE_SAMPLES as f64;
            let samples = [
                (env.min_x + t * w, env.min_y),
                (env.min_x + t * w, env.max_y),
                (env.min_x, env.min_y + t * h),
                (env.max_x, env.min_y + t * h),
            ];
            for (x, y) in samples {
                let (tx, ty) = self.apply(x, y)?;
                min_x = min_x.min(tx);
                min_y = min_y.min(ty);
                max_x = max_x.max(tx);
                max_y = max_y.max(ty);
            }
        }

        Ok(Envelope::new(min_x, min_y, max_x, max_y, self.target.clone()))
    }
}

/// Finds a transform between two CRSs, consulting the process-wide cache.
///
/// Fails with [`LocationError::Transform`] when no path exists: in strict
/// mode a datum pair without published shift parameters has no path.
pub fn find_transform(source: &Crs, target: &Crs, lenient: bool) -> Result<Transform> {
    let key = (source.cache_key(), target.cache_key(), lenient);
    {
        let cache = TRANSFORM_CACHE.lock().expect("transform cache poisoned");
        if let Some(t) = cache.get(&key) {
            return Ok(t.clone());
        }
    }

    if !lenient && source.datum() != target.datum() {
        let missing = [source, target]
            .into_iter()
            .find(|c| c.datum().to_wgs84.is_none());
        if let Some(crs) = missing {
            return Err(LocationError::Transform(format!(
                "no datum shift parameters for {} ({}); strict transform unavailable",
                crs,
                crs.datum().name
            )));
        }
    }

    let transform = Transform {
        source: source.clone(),
        target: target.clone(),
        lenient,
    };

    let mut cache = TRANSFORM_CACHE.lock().expect("transform cache poisoned");
    cache.entry(key).or_insert_with(|| transform.clone());
    Ok(transform)
}

/// Shifts geographic degrees from one datum to another through
/// geocentric coordinates (7-parameter Helmert, position vector).
fn datum_shift(
    source: &Datum,
    target: &Datum,
    lenient: bool,
    lon: f64,
    lat: f64,
) -> Result<(f64, f64)> {
    if source.name == target.name {
        return Ok((lon, lat));
    }

    let resolve_shift = |datum: &Datum| -> Result<HelmertShift> {
        match datum.to_wgs84 {
            Some(shift) => Ok(shift),
            None if lenient => Ok(HelmertShift::NULL),
            None => Err(LocationError::Transform(format!(
                "no datum shift parameters for datum {}",
                datum.name
            ))),
        }
    };
    let source_shift = resolve_shift(source)?;
    let target_shift = resolve_shift(target)?;

    if source_shift == HelmertShift::NULL
        && target_shift == HelmertShift::NULL
        && source.ellipsoid == target.ellipsoid
    {
        return Ok((lon, lat));
    }

    let p = geodetic_to_ecef(&source.ellipsoid, lon, lat);
    let p = helmert(&source_shift, p, false);
    let p = helmert(&target_shift, p, true);
    Ok(ecef_to_geodetic(&target.ellipsoid, p))
}

fn geodetic_to_ecef(ellipsoid: &Ellipsoid, lon: f64, lat: f64) -> (f64, f64, f64) {
    let e2 = ellipsoid.e2();
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let n = ellipsoid.a / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt();

    (
        n * lat_rad.cos() * lon_rad.cos(),
        n * lat_rad.cos() * lon_rad.sin(),
        n * (1.0 - e2) * lat_rad.sin(),
    )
}

fn ecef_to_geodetic(ellipsoid: &Ellipsoid, (x, y, z): (f64, f64, f64)) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..5 {
        let n = ellipsoid.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        lat = (z + e2 * n * lat.sin()).atan2(p);
    }

    (lon.to_degrees(), lat.to_degrees())
}

/// Applies a Helmert shift to geocentric coordinates. The inverse
/// direction negates the parameters, exact to well under a millimeter
/// for shifts of this magnitude.
fn helmert(shift: &HelmertShift, (x, y, z): (f64, f64, f64), inverse: bool) -> (f64, f64, f64) {
    let sign = if inverse { -1.0 } else { 1.0 };
    let sec_to_rad = std::f64::consts::PI / (180.0 * 3600.0);

    let rx = sign * shift.rx_sec * sec_to_rad;
    let ry = sign * shift.ry_sec * sec_to_rad;
    let rz = sign * shift.rz_sec * sec_to_rad;
    let s = 1.0 + sign * shift.scale_ppm * 1e-6;

    (
        sign * shift.dx + s * (x - rz * y + ry * z),
        sign * shift.dy + s * (rz * x + y - rx * z),
        sign * shift.dz + s * (-ry * x + rx * y + z),
    )
}
