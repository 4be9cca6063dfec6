//! The client's current location on the map.
//!
//! A [`Location`] is constructed once per request from raw client input
//! (SRS code, bbox, zoom), optionally mutated by setters, then read many
//! times: envelope derivation, buffered fetching, key generation.
//! Derived geometry is cached lazily; every mutator drops all cached
//! derived state, so a cache can never go stale relative to the fields
//! it was derived from. Changing the SRS after geometry has been derived
//! re-homes the location and re-resolves on the next access.

use crate::core::envelope::Envelope;
use crate::crs::transform::{self, Transform};
use crate::crs::{self, Crs};
use crate::{LocationError, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// A viewport: bounding box in a named CRS plus a zoom level.
///
/// The bbox is an ordered 4-element sequence `[west, south, east, north]`
/// (`x1, y1, x2, y2`). Ordering `west <= east` / `south <= north` is not
/// enforced; degenerate boxes derive degenerate envelopes without
/// panicking. Serialization covers `srs`, `bbox` and `zoom` only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    srs: String,
    bbox: Vec<f64>,
    zoom: u32,

    #[serde(skip)]
    crs: OnceCell<Result<Crs>>,
    #[serde(skip)]
    envelope: OnceCell<Envelope>,
    #[serde(skip)]
    bbox_array: OnceCell<[f64; 4]>,
    #[serde(skip)]
    enlarged_envelope: Option<Envelope>,
}

impl Location {
    /// Creates an empty location; SRS and bbox are set later
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty location with the SRS already known
    pub fn with_srs(srs: impl Into<String>) -> Self {
        Self {
            srs: srs.into(),
            ..Self::default()
        }
    }

    /// Gets the SRS code
    pub fn srs(&self) -> &str {
        &self.srs
    }

    /// Sets the SRS code, dropping all cached derived state
    pub fn set_srs(&mut self, srs: impl Into<String>) {
        self.srs = srs.into();
        self.invalidate();
    }

    /// Gets the bbox
    pub fn bbox(&self) -> &[f64] {
        &self.bbox
    }

    /// Sets the bbox, dropping all cached derived state
    pub fn set_bbox(&mut self, bbox: Vec<f64>) {
        self.bbox = bbox;
        self.invalidate();
    }

    /// Gets the zoom level
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Sets the zoom level, dropping all cached derived state
    pub fn set_zoom(&mut self, zoom: u32) {
        self.zoom = zoom;
        self.invalidate();
    }

    /// Gets left (x1)
    pub fn left(&self) -> Result<f64> {
        Ok(self.require_bbox()?[0])
    }

    /// Gets bottom (y1)
    pub fn bottom(&self) -> Result<f64> {
        Ok(self.require_bbox()?[1])
    }

    /// Gets right (x2)
    pub fn right(&self) -> Result<f64> {
        Ok(self.require_bbox()?[2])
    }

    /// Gets top (y2)
    pub fn top(&self) -> Result<f64> {
        Ok(self.require_bbox()?[3])
    }

    /// The bbox as a fixed array, for serialization frameworks
    pub fn bbox_array(&self) -> Result<[f64; 4]> {
        self.bbox_array
            .get_or_try_init(|| {
                let b = self.require_bbox()?;
                Ok([b[0], b[1], b[2], b[3]])
            })
            .copied()
    }

    /// Key for storing location specific data, stable for equal inputs.
    ///
    /// Built from the SRS, the four bbox components and the zoom in fixed
    /// order; unaffected by any cached geometry.
    pub fn key(&self) -> Result<String> {
        let b = self.require_bbox()?;
        Ok(format!(
            "{}_{}_{}_{}_{}_{}",
            self.srs, b[0], b[1], b[2], b[3], self.zoom
        ))
    }

    /// Resolves and caches the CRS of this location.
    ///
    /// Longitude-first axis order is always requested so that bbox
    /// indices 0/2 mean east regardless of the authority convention. A
    /// failed resolution is cached too and handed back to every caller
    /// until the SRS changes.
    pub fn crs(&self) -> Result<Crs> {
        self.crs
            .get_or_init(|| {
                crs::resolve(&self.srs, true).map_err(|e| {
                    log::error!("CRS resolution failed for '{}': {e}", self.srs);
                    e
                })
            })
            .clone()
    }

    /// The envelope of this location, cached on first success
    pub fn envelope(&self) -> Result<Envelope> {
        self.envelope.get_or_try_init(|| self.build_envelope()).cloned()
    }

    /// Builds the envelope fresh from the current bbox and CRS
    fn build_envelope(&self) -> Result<Envelope> {
        let crs = self.crs()?;
        let b = self.require_bbox()?;
        Ok(Envelope::new(b[0], b[1], b[2], b[3], crs))
    }

    /// Creates a scaled envelope.
    ///
    /// The factor must be greater than 0. A value greater than 1 grows
    /// the bounds about the center, a value less than 1 shrinks them.
    /// Always computed from the plain (un-enlarged) envelope.
    pub fn scaled_envelope(&self, factor: f64) -> Result<Envelope> {
        if !(factor > 0.0) {
            let err = LocationError::Precondition(format!(
                "scale factor must be greater than 0, got {factor}"
            ));
            log::error!("scaling failed: {err}");
            return Err(err);
        }
        Ok(self.build_envelope()?.scaled_about_center(factor))
    }

    /// Sets the enlarged envelope from an already-buffered bbox.
    ///
    /// The buffered bbox's full width and height are added on every side
    /// of the plain envelope, giving one tile-sized margin in each
    /// direction so boundary features are not missed.
    pub fn set_enlarged_envelope(&mut self, buffered_bbox: &[f64]) -> Result<()> {
        if buffered_bbox.len() != 4 {
            let err = LocationError::Precondition(format!(
                "buffered bbox must have 4 elements, has {}",
                buffered_bbox.len()
            ));
            log::error!("failed to create enlarged envelope: {err}");
            return Err(err);
        }

        let width = buffered_bbox[2] - buffered_bbox[0];
        let height = buffered_bbox[3] - buffered_bbox[1];
        self.enlarged_envelope = Some(self.create_enlarged_envelope(width, height)?);
        Ok(())
    }

    /// Creates an enlarged envelope without touching cached state.
    ///
    /// Adds the full `width`/`height` on each respective side; both must
    /// be non-negative.
    pub fn create_enlarged_envelope(&self, width: f64, height: f64) -> Result<Envelope> {
        if !(width >= 0.0) || !(height >= 0.0) {
            let err = LocationError::Precondition(format!(
                "enlargement must be non-negative, got width {width}, height {height}"
            ));
            log::error!("failed to create enlarged envelope: {err}");
            return Err(err);
        }
        Ok(self.build_envelope()?.expanded_by(width, height))
    }

    /// Gets the enlarged envelope, falling back to the plain envelope
    /// when none was set.
    pub fn enlarged_envelope(&self) -> Result<Envelope> {
        match &self.enlarged_envelope {
            Some(env) => Ok(env.clone()),
            None => {
                log::warn!("enlarged envelope not created; falling back to the plain envelope");
                self.envelope()
            }
        }
    }

    /// Transforms an envelope to the target CRS.
    ///
    /// With `env == None` the location's own envelope is used, and if the
    /// target equals this location's SRS it is returned untransformed so
    /// no floating-point round-trip error is introduced.
    pub fn transform_envelope(
        &self,
        env: Option<&Envelope>,
        target: &str,
        lenient: bool,
    ) -> Result<Envelope> {
        let own;
        let env = match env {
            Some(e) => e,
            None => {
                own = self.envelope()?;
                if self.srs.trim().eq_ignore_ascii_case(target.trim()) {
                    return Ok(own);
                }
                &own
            }
        };

        let target_crs = crs::resolve(target, true).map_err(|e| {
            log::error!("CRS resolution failed for transform target '{target}': {e}");
            e
        })?;
        let t = transform::find_transform(env.crs(), &target_crs, lenient).map_err(|e| {
            log::error!("no transform from {} to {target}: {e}", env.crs());
            e
        })?;
        t.apply_envelope(env).map_err(|e| {
            log::error!("envelope transform to {target} failed: {e}");
            e
        })
    }

    /// Creates a transform into this location's (the client's) CRS
    pub fn transform_for_client(&self, source: &Crs, lenient: bool) -> Result<Transform> {
        transform::find_transform(source, &self.crs()?, lenient)
    }

    /// Creates a transform out of this location's CRS into a service CRS
    pub fn transform_for_service(&self, target: &Crs, lenient: bool) -> Result<Transform> {
        transform::find_transform(&self.crs()?, target, lenient)
    }

    fn require_bbox(&self) -> Result<&[f64]> {
        if self.bbox.len() == 4 {
            Ok(&self.bbox)
        } else {
            let err = LocationError::Precondition(format!(
                "bbox must have 4 elements, has {}",
                self.bbox.len()
            ));
            log::error!("{err}");
            Err(err)
        }
    }

    fn invalidate(&mut self) {
        self.crs = OnceCell::new();
        self.envelope = OnceCell::new();
        self.bbox_array = OnceCell::new();
        self.enlarged_envelope = None;
    }
}

/// Equality covers the stored fields only, never cached geometry
impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.srs == other.srs && self.bbox == other.bbox && self.zoom == other.zoom
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bbox.len() == 4 {
            write!(
                f,
                "srs: {}, left: {}, bottom: {}, right: {}, top: {}, zoom: {}",
                self.srs, self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3], self.zoom
            )
        } else {
            write!(f, "srs: {}, bbox: {:?}, zoom: {}", self.srs, self.bbox, self.zoom)
        }
    }
}
