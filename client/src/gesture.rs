use imageviewer_shared::{GestureInput, Point};

/// Pointer travel (per axis) below which a press still counts as a click.
const CLICK_SLOP_PX: f64 = 5.0;

/// What lifting a pointer meant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// Press and release without travelling: a click at this point.
    Tap(Point),
    /// The last pointer of a pan/pinch/rotate lifted.
    GestureEnd,
    /// A finger lifted but others remain; the gesture continues from a new
    /// anchor.
    Regrip,
    /// The pointer was not being tracked.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    centre: Point,
    spread: f64,
    angle: f64,
}

/// Folds raw pointer events into cumulative gesture readings: one pointer
/// pans, two pointers pan by their midpoint, pinch and rotate.
#[derive(Debug, Default)]
pub struct PointerTracker {
    pointers: Vec<(i32, Point)>,
    anchor: Option<Anchor>,
    dragging: bool,
    multi_touch: bool,
}

impl PointerTracker {
    pub fn is_pressed(&self) -> bool {
        !self.pointers.is_empty()
    }

    fn measure(&self) -> Option<Anchor> {
        match self.pointers.as_slice() {
            [] => None,
            [(_, only)] => Some(Anchor {
                centre: *only,
                spread: 0.0,
                angle: 0.0,
            }),
            [(_, a), (_, b), ..] => {
                let dx = b.x - a.x;
                let dy = b.y - a.y;
                Some(Anchor {
                    centre: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
                    spread: (dx * dx + dy * dy).sqrt(),
                    angle: dy.atan2(dx).to_degrees(),
                })
            }
        }
    }

    pub fn down(&mut self, id: i32, at: Point) {
        self.pointers.retain(|(pointer, _)| *pointer != id);
        self.pointers.push((id, at));
        if self.pointers.len() == 1 {
            self.dragging = false;
            self.multi_touch = false;
        } else {
            self.multi_touch = true;
        }
        self.anchor = self.measure();
    }

    /// Cumulative reading since the current anchor, or `None` for untracked
    /// pointers and presses still inside the click slop.
    pub fn moved(&mut self, id: i32, at: Point) -> Option<GestureInput> {
        let slot = self.pointers.iter_mut().find(|(pointer, _)| *pointer == id)?;
        slot.1 = at;
        let anchor = self.anchor?;
        let now = self.measure()?;

        let delta_x = now.centre.x - anchor.centre.x;
        let delta_y = now.centre.y - anchor.centre.y;
        if !self.dragging && !self.multi_touch {
            if delta_x.abs() < CLICK_SLOP_PX && delta_y.abs() < CLICK_SLOP_PX {
                return None;
            }
            self.dragging = true;
        }

        let (scale, rotation) = if self.pointers.len() >= 2 && anchor.spread > 0.0 {
            (now.spread / anchor.spread, wrap_degrees(now.angle - anchor.angle))
        } else {
            (1.0, 0.0)
        };
        Some(GestureInput {
            delta_x,
            delta_y,
            scale,
            rotation,
        })
    }

    pub fn up(&mut self, id: i32, at: Point) -> Release {
        let before = self.pointers.len();
        self.pointers.retain(|(pointer, _)| *pointer != id);
        if self.pointers.len() == before {
            return Release::Ignored;
        }

        if self.pointers.is_empty() {
            self.anchor = None;
            let gesture = self.dragging || self.multi_touch;
            self.dragging = false;
            self.multi_touch = false;
            return if gesture {
                Release::GestureEnd
            } else {
                Release::Tap(at)
            };
        }

        self.dragging = true;
        self.anchor = self.measure();
        Release::Regrip
    }

    /// Forget every pointer, e.g. on `pointercancel`.
    pub fn cancel(&mut self) -> Release {
        let gesture = self.dragging || self.multi_touch;
        *self = Self::default();
        if gesture {
            Release::GestureEnd
        } else {
            Release::Ignored
        }
    }
}

/// Wrap a degree difference into `(-180, 180]`.
fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
