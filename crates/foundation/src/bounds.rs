/// Axis-aligned rectangle in image-pixel space.
///
/// This is the transient viewport-bounds value: recomputed from the live
/// transform every render cycle and never persisted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ImageRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn is_empty(&self) -> bool {
        self.x_max <= self.x_min || self.y_max <= self.y_min
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.x_min && p[0] <= self.x_max && p[1] >= self.y_min && p[1] <= self.y_max
    }

    pub fn intersects(&self, other: &ImageRect) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Intersection with another rectangle, or `None` if disjoint.
    pub fn intersection(&self, other: &ImageRect) -> Option<ImageRect> {
        let r = ImageRect::new(
            self.x_min.max(other.x_min),
            self.x_max.min(other.x_max),
            self.y_min.max(other.y_min),
            self.y_max.min(other.y_max),
        );
        if r.is_empty() {
            return None;
        }
        Some(r)
    }
}
