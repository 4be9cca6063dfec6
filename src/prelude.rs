//! Prelude module for common maploc types
//!
//! Re-exports the most commonly used types and functions for easy
//! importing with `use maploc::prelude::*;`

pub use crate::core::{envelope::Envelope, location::Location};
pub use crate::crs::{
    projection::ProjectionKind,
    resolve,
    transform::{find_transform, Transform},
    AxisOrder, Crs,
};
pub use crate::{LocationError, Result};
