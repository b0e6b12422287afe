use foundation::bounds::ImageRect;

/// Live pan/zoom state reported by the deep-zoom viewer.
///
/// `open` stays false until the viewer has loaded image metadata; before
/// that, bounds and transforms are undefined and `frame_transform` returns
/// `None` (not-ready is a no-op for callers, never an error).
///
/// Zoom convention follows the host viewer: zoom 1 fits the image width to
/// the container, doubling zoom halves the visible width.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewerState {
    pub open: bool,
    /// Full image size in image pixels.
    pub image_width: f64,
    pub image_height: f64,
    /// Drawing container size in screen pixels.
    pub container_width: f64,
    pub container_height: f64,
    pub zoom: f64,
    /// Center of the view in image pixels.
    pub center_x: f64,
    pub center_y: f64,
}

impl ViewerState {
    /// Snapshot the current image→screen mapping.
    ///
    /// The snapshot is valid for the current frame only; it must be
    /// recomputed after any pan/zoom/animation tick.
    pub fn frame_transform(&self) -> Option<FrameTransform> {
        if !self.open {
            return None;
        }
        if self.image_width <= 0.0
            || self.image_height <= 0.0
            || self.container_width <= 0.0
            || self.container_height <= 0.0
            || self.zoom <= 0.0
        {
            return None;
        }

        let scale = self.container_width * self.zoom / self.image_width;
        let origin = [
            self.center_x - self.container_width / (2.0 * scale),
            self.center_y - self.container_height / (2.0 * scale),
        ];
        Some(FrameTransform { scale, origin })
    }

    /// Visible rectangle in image-pixel coordinates, or `None` when the
    /// viewer is not ready.
    pub fn visible_bounds(&self) -> Option<ImageRect> {
        let t = self.frame_transform()?;
        let min = t.screen_to_image([0.0, 0.0]);
        let max = t.screen_to_image([self.container_width, self.container_height]);
        Some(ImageRect::new(min[0], max[0], min[1], max[1]))
    }
}

/// Affine image→screen mapping for a single frame.
///
/// `screen = (image - origin) * scale`. Not safe to cache across frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTransform {
    scale: f64,
    origin: [f64; 2],
}

impl FrameTransform {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn image_to_screen(&self, p: [f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.origin[0]) * self.scale,
            (p[1] - self.origin[1]) * self.scale,
        ]
    }

    pub fn screen_to_image(&self, p: [f64; 2]) -> [f64; 2] {
        [
            p[0] / self.scale + self.origin[0],
            p[1] / self.scale + self.origin[1],
        ]
    }
}
