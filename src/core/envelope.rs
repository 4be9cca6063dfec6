use crate::crs::Crs;

/// An axis-aligned rectangle tagged with the CRS it is expressed in.
///
/// Coordinates follow the CRS's axis order: `min_x`/`max_x` span the
/// first axis, `min_y`/`max_y` the second. Degenerate boxes (min above
/// max) are representable and never panic; they just report negative
/// width or height.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    crs: Crs,
}

impl Envelope {
    /// Creates a new envelope from min/max corners
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64, crs: Crs) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs,
        }
    }

    /// The CRS this envelope is expressed in
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Gets the width (first axis extent)
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Gets the height (second axis extent)
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Gets the center point
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Checks if the envelope contains a point
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if the envelope intersects another
    pub fn intersects(&self, other: &Envelope) -> bool {
        !(other.max_x < self.min_x
            || other.min_x > self.max_x
            || other.max_y < self.min_y
            || other.min_y > self.max_y)
    }

    /// Checks that min does not exceed max on either axis
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Returns a new envelope grown by the full `width`/`height` on each
    /// respective side (total growth 2x width, 2x height).
    pub fn expanded_by(&self, width: f64, height: f64) -> Envelope {
        Envelope::new(
            self.min_x - width,
            self.min_y - height,
            self.max_x + width,
            self.max_y + height,
            self.crs.clone(),
        )
    }

    /// Returns a new envelope grown or shrunk about its center by a
    /// multiplicative factor: the margin added per side is
    /// `extent * (factor - 1) / 2`.
    pub fn scaled_about_center(&self, factor: f64) -> Envelope {
        let w = self.width() * (factor - 1.0) / 2.0;
        let h = self.height() * (factor - 1.0) / 2.0;
        self.expanded_by(w, h)
    }
}
