//! Pointer offset to normalized stick axes
//!
//! Converts the raw offset between a stick's center and the current pointer
//! position into an `(x, y)` pair on the unit disk. The offset is scaled by a
//! fixed sensitivity, then saturated through polar coordinates: magnitude is
//! hard-clamped to 1 while the direction is kept, so dragging far past the
//! stick's visual radius deflects it fully without ever leaving `[-1, 1]`.

use crate::layout::ControlPosition;

/// Display units of pointer travel per unit of axis deflection
pub const STICK_TRAVEL_UNITS: f32 = 30.0;

/// Maps a pointer position against a stick center to normalized axes
///
/// Sign convention: the offset is `center - pointer`, so dragging left of
/// center yields positive x and dragging above center yields positive y.
pub fn stick_axes(center: ControlPosition, pointer: ControlPosition) -> (f32, f32) {
    let dx = (center.x - pointer.x) / STICK_TRAVEL_UNITS;
    let dy = (center.y - pointer.y) / STICK_TRAVEL_UNITS;

    let magnitude = (dx * dx + dy * dy).sqrt().min(1.0);
    let angle = dy.atan2(dx);

    (magnitude * angle.cos(), magnitude * angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn center() -> ControlPosition {
        ControlPosition::new(100.0, 100.0)
    }

    #[test]
    fn dead_center_yields_zero() {
        let (x, y) = stick_axes(center(), ControlPosition::new(100.0, 100.0));
        assert!(x.abs() < EPSILON);
        assert!(y.abs() < EPSILON);
    }

    #[test]
    fn one_travel_unit_left_is_full_positive_x() {
        let (x, y) = stick_axes(center(), ControlPosition::new(70.0, 100.0));
        assert!((x - 1.0).abs() < EPSILON);
        assert!(y.abs() < EPSILON);
    }

    #[test]
    fn inside_travel_radius_scales_linearly() {
        let (x, y) = stick_axes(center(), ControlPosition::new(100.0, 115.0));
        assert!(x.abs() < EPSILON);
        assert!((y + 0.5).abs() < EPSILON);
    }

    #[test]
    fn beyond_travel_radius_saturates_to_unit_magnitude() {
        // 3-4-5 triangle scaled to 90/120 display units, well past the clamp.
        let (x, y) = stick_axes(center(), ControlPosition::new(10.0, -20.0));
        let magnitude = (x * x + y * y).sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
        // Direction survives the clamp.
        assert!((x - 0.6).abs() < 1e-5);
        assert!((y - 0.8).abs() < 1e-5);
    }

    #[test]
    fn exactly_at_travel_radius_is_unit_magnitude() {
        let (x, y) = stick_axes(center(), ControlPosition::new(130.0, 100.0));
        assert!((x + 1.0).abs() < EPSILON);
        assert!(y.abs() < EPSILON);
    }
}
