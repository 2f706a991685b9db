use crate::geometry::to_square_angle;
use crate::viewport::{ScaleBounds, Viewport};

/// Cumulative gesture reading since the gesture started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureInput {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Pinch factor relative to the starting finger spread.
    pub scale: f64,
    /// Absolute rotation reading in degrees; 0 means "no rotation this event".
    pub rotation: f64,
}

impl Default for GestureInput {
    fn default() -> Self {
        Self {
            delta_x: 0.0,
            delta_y: 0.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl GestureInput {
    pub fn pan(delta_x: f64, delta_y: f64) -> Self {
        Self {
            delta_x,
            delta_y,
            ..Self::default()
        }
    }
}

/// Viewport snapshot taken on the first move of a gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureBaseline {
    pub viewport: Viewport,
    pub start_rotation: f64,
}

impl GestureBaseline {
    pub fn capture(viewport: Viewport, input: &GestureInput) -> Self {
        Self {
            viewport,
            start_rotation: input.rotation,
        }
    }

    /// Apply a cumulative reading on top of the snapshot.
    pub fn apply(
        &self,
        viewport: &mut Viewport,
        input: &GestureInput,
        bounds: ScaleBounds,
        rotate_stepper: bool,
    ) {
        viewport.x = self.viewport.x + input.delta_x;
        viewport.y = self.viewport.y + input.delta_y;
        viewport.scale = bounds.clamp(self.viewport.scale * input.scale);

        if input.rotation != 0.0 {
            let angle = self.viewport.rotation + input.rotation - self.start_rotation;
            viewport.rotation = if rotate_stepper {
                to_square_angle(angle)
            } else {
                angle
            };
        }
    }
}

/// Discrete zoom direction of one wheel notch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    /// Legacy `DOMMouseScroll`/`mousewheel` fields: negative `detail` or
    /// positive `wheelDelta` scrolls up.
    pub fn from_legacy(detail: f64, wheel_delta: f64) -> Self {
        if detail < 0.0 || wheel_delta > 0.0 {
            WheelDirection::Up
        } else {
            WheelDirection::Down
        }
    }

    /// Standard `wheel` event: negative `deltaY` scrolls up.
    pub fn from_delta_y(delta_y: f64) -> Self {
        Self::from_legacy(delta_y, 0.0)
    }
}
