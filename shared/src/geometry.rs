use serde::{Deserialize, Serialize};

/// Width/height pair in canvas pixels (or native bitmap pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative, or not a number.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Round an angle in degrees to the nearest cardinal orientation.
///
/// The result is always one of 0, 90, 180 or 270. The angle is wrapped into
/// `[0, 360)` first, so `a` and `a + 360` always land on the same quadrant and
/// negative angles round to their nearest cardinal (`-46` becomes `270`).
/// Remainders are truncated before the `> 45` test, so exactly 45° past a
/// cardinal still rounds down.
pub fn to_square_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    let quarter_turns = (wrapped / 90.0).trunc() as i64;
    let remainder = (wrapped % 90.0).trunc();
    let rounded = if remainder > 45.0 {
        quarter_turns + 1
    } else {
        quarter_turns
    };
    (90 * rounded.rem_euclid(4)) as f64
}

/// Whether the bitmap lies on its side (90° or 270°) once snapped.
pub fn is_inverted(rotation: f64) -> bool {
    (to_square_angle(rotation) / 90.0) as i64 % 2 != 0
}

/// Circular hit region test: squared distance against squared radius.
pub fn within_circle(center: Point, radius: f64, x: f64, y: f64) -> bool {
    let dx = center.x - x;
    let dy = center.y - y;
    dx * dx + dy * dy <= radius * radius
}

/// Convert a client-space pointer position into canvas space, given the
/// top-left corner of the canvas bounding rectangle.
pub fn to_canvas_point(client: Point, canvas_origin: Point) -> Point {
    Point::new(client.x - canvas_origin.x, client.y - canvas_origin.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn square_angle_rounds_to_nearest_cardinal() {
        assert_eq!(to_square_angle(0.0), 0.0);
        assert_eq!(to_square_angle(44.0), 0.0);
        assert_eq!(to_square_angle(45.0), 0.0);
        assert_eq!(to_square_angle(46.0), 90.0);
        assert_eq!(to_square_angle(134.0), 90.0);
        assert_eq!(to_square_angle(136.0), 180.0);
        assert_eq!(to_square_angle(315.0), 270.0);
        assert_eq!(to_square_angle(316.0), 0.0);
        assert_eq!(to_square_angle(360.0), 0.0);
    }

    #[test]
    fn square_angle_handles_negative_angles() {
        assert_eq!(to_square_angle(-46.0), 270.0);
        assert_eq!(to_square_angle(-44.0), 0.0);
        assert_eq!(to_square_angle(-90.0), 270.0);
        assert_eq!(to_square_angle(-180.0), 180.0);
        assert_eq!(to_square_angle(-400.0), 0.0);
        assert_eq!(to_square_angle(-410.0), 270.0);
    }

    #[test]
    fn square_angle_truncates_fractional_remainders() {
        assert_eq!(to_square_angle(45.9), 0.0);
        assert_eq!(to_square_angle(46.2), 90.0);
    }

    #[test]
    fn inverted_only_for_sideways_orientations() {
        assert!(!is_inverted(0.0));
        assert!(is_inverted(90.0));
        assert!(!is_inverted(180.0));
        assert!(is_inverted(270.0));
        assert!(is_inverted(-80.0));
    }

    #[test]
    fn circle_hit_uses_euclidean_distance() {
        let center = Point::new(100.0, 100.0);
        assert!(within_circle(center, 10.0, 105.0, 100.0));
        assert!(within_circle(center, 10.0, 110.0, 100.0));
        assert!(!within_circle(center, 10.0, 115.0, 100.0));
        // Inside the bounding box but outside the circle.
        assert!(!within_circle(center, 10.0, 108.0, 108.0));
    }

    #[test]
    fn canvas_point_subtracts_rect_origin() {
        let p = to_canvas_point(Point::new(150.0, 90.0), Point::new(50.0, 40.0));
        assert_eq!(p, Point::new(100.0, 50.0));
    }

    #[test]
    fn empty_dimension_detection() {
        assert!(Dimension::new(0.0, 10.0).is_empty());
        assert!(Dimension::new(10.0, f64::NAN).is_empty());
        assert!(!Dimension::new(1.0, 1.0).is_empty());
    }

    proptest! {
        #[test]
        fn square_angle_is_cardinal(a in -100_000i64..100_000) {
            let s = to_square_angle(a as f64);
            prop_assert!(s == 0.0 || s == 90.0 || s == 180.0 || s == 270.0);
        }

        #[test]
        fn square_angle_is_periodic(a in -100_000i64..100_000) {
            prop_assert_eq!(to_square_angle(a as f64), to_square_angle((a + 360) as f64));
        }

        #[test]
        fn square_angle_is_within_45_degrees(a in -100_000i64..100_000) {
            let s = to_square_angle(a as f64);
            let wrapped = (a as f64).rem_euclid(360.0);
            let diff = (wrapped - s).abs();
            let diff = diff.min(360.0 - diff);
            prop_assert!(diff <= 46.0);
        }
    }
}
