//! # maploc
//!
//! Viewport location handling for map clients.
//!
//! The central type is [`Location`]: a client's current map viewport as a
//! bounding box in a named CRS plus a zoom level. From it callers derive
//! envelopes (plain, enlarged, scaled, reprojected), reusable coordinate
//! transforms and deterministic session keys.
//!
//! CRS resolution and projection math are built in for a registry of
//! well-known codes; see the [`crs`] module.

pub mod core;
pub mod crs;
pub mod prelude;

// Re-export public API
pub use crate::core::{envelope::Envelope, location::Location};
pub use crate::crs::{resolve, transform::find_transform, transform::Transform, Crs};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, LocationError>;

/// Common error types
///
/// Every fallible operation reports one of these kinds so callers can tell
/// a bad argument from a failed resolution or transform. Values are `Clone`
/// because a failed CRS resolution is cached on the owning [`Location`] and
/// handed back until the SRS changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("CRS resolution failed: {0}")]
    Resolution(String),

    #[error("coordinate transform failed: {0}")]
    Transform(String),

    #[error("invalid argument: {0}")]
    Precondition(String),
}
