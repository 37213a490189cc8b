//! Conversions from quaternions to axis-angle and Euler representations
//!
//! These helpers sit at the reporting boundary: engines work in quaternions,
//! downstream consumers usually want an axis-angle pair or roll/pitch/yaw in
//! degrees.

use nalgebra::Quaternion;

use crate::math::RAD_TO_DEG;

/// Convert a quaternion given as scalar-last components to axis-angle form
///
/// Returns `(angle, x, y, z)` with the angle in degrees and `(x, y, z)` the
/// unit rotation axis. Rotations close enough to identity, `w` in
/// `[0.999, 1.001]`, collapse to the sentinel `(0.0, 0.0, 0.0, 0.0)` since
/// the axis is numerically meaningless there. A `w` outside `[-1, 1]` and
/// outside the sentinel band yields NaN per IEEE-754.
///
/// # Example
/// ```
/// use marg_ahrs::quaternion_to_axis_angle;
///
/// // 90 degree turn about -z
/// let (angle, x, y, z) = quaternion_to_axis_angle(0.0, 0.0, -0.7071068, 0.7071068);
/// assert!((angle - 90.0).abs() < 1e-3);
/// assert!((z + 1.0).abs() < 1e-3);
/// # let _ = (x, y);
/// ```
pub fn quaternion_to_axis_angle(x: f32, y: f32, z: f32, w: f32) -> (f32, f32, f32, f32) {
    if (0.999..=1.001).contains(&w) {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let angle = 2.0 * w.acos() * RAD_TO_DEG;
    let scale = (1.0 - w * w).sqrt();

    (angle, x / scale, y / scale, z / scale)
}

/// Convert a scalar-first quaternion to roll, pitch, and yaw in degrees
///
/// The quaternion is read as `(w, x, y, z)`. Roll is rotation about x,
/// pitch about y, yaw about z. Pitch near ±90 degrees is the usual Euler
/// singularity and is not specially guarded.
pub fn roll_pitch_yaw(q: Quaternion<f32>) -> (f32, f32, f32) {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let roll = (2.0 * (w * x + y * z)).atan2(w * w - x * x - y * y + z * z);
    let pitch = -(2.0 * (x * z - w * y)).asin();
    let yaw = (2.0 * (x * y + w * z)).atan2(w * w + x * x - y * y - z * z);

    (roll * RAD_TO_DEG, pitch * RAD_TO_DEG, yaw * RAD_TO_DEG)
}
