use std::f32::consts::PI;

use crate::landmarks::Point;

/// Interior angle in degrees at vertex `b` formed by the rays `b -> a` and
/// `b -> c`, always within `[0, 180]`.
///
/// Callers must pass three distinct points; coincident points yield an
/// arbitrary angle.
pub fn joint_angle(a: Point, b: Point, c: Point) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = (radians * 180.0 / PI).abs();

    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
