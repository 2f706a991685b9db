use serde::{Deserialize, Serialize};

use crate::geometry::{Dimension, Point, is_inverted, to_square_angle};

/// Zoom envelope around the natural fit: `fit / 4 ..= fit * 4`.
pub const ZOOM_ENVELOPE: f64 = 4.0;

/// Affine mapping of a bitmap onto the canvas.
///
/// `width`/`height` are the scaled bitmap size (native size times `scale`),
/// not the canvas size. `x`/`y` locate the scaled bitmap's top-left corner in
/// canvas space, before rotation about its centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub rotation: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: 1.0,
            rotation: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: ZOOM_ENVELOPE,
        }
    }
}

impl ScaleBounds {
    pub fn around(scale: f64) -> Self {
        Self {
            min: scale / ZOOM_ENVELOPE,
            max: scale * ZOOM_ENVELOPE,
        }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        if scale > self.max {
            self.max
        } else if scale < self.min {
            self.min
        } else {
            scale
        }
    }
}

/// Result of a contain fit: the fitted viewport plus its zoom envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub viewport: Viewport,
    pub bounds: ScaleBounds,
}

impl Viewport {
    /// Contain-fit `bitmap` into `canvas` under `rotation`, centred.
    ///
    /// Sideways rotations fit against swapped canvas axes. An exact fit on
    /// both axes takes the height-constrained branch. Returns `None` when
    /// either size is empty.
    pub fn fit(bitmap: Dimension, canvas: Dimension, rotation: f64) -> Option<Fit> {
        if bitmap.is_empty() || canvas.is_empty() {
            return None;
        }

        let target = if is_inverted(rotation) {
            canvas.swapped()
        } else {
            canvas
        };

        let height_scale = target.height / bitmap.height;
        let scale = if bitmap.width * height_scale <= target.width {
            height_scale
        } else {
            target.width / bitmap.width
        };

        let width = bitmap.width * scale;
        let height = bitmap.height * scale;
        let viewport = Viewport {
            width,
            height,
            scale,
            rotation,
            x: (canvas.width - width) / 2.0,
            y: (canvas.height - height) / 2.0,
        };

        Some(Fit {
            viewport,
            bounds: ScaleBounds::around(scale),
        })
    }

    /// Centre of the scaled bitmap in canvas space.
    ///
    /// Zooming changes `scale` but not `width`/`height`, so the centre stays
    /// put while the bitmap grows around it.
    pub fn centroid(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }

    /// Multiply the scale by `factor`, clamped into `bounds`.
    pub fn zoom_by(&mut self, factor: f64, bounds: ScaleBounds) {
        self.scale = bounds.clamp(self.scale * factor);
    }

    /// Quarter turn counter-clockwise on the snapped angle (0 wraps to 270).
    pub fn rotate_left(&mut self) {
        self.rotation = (to_square_angle(self.rotation) + 270.0) % 360.0;
    }

    /// Quarter turn clockwise on the snapped angle (270 wraps to 0).
    pub fn rotate_right(&mut self) {
        self.rotation = (to_square_angle(self.rotation) + 90.0) % 360.0;
    }
}
