//! Mathematical utilities and nalgebra extensions for the MARG AHRS library

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Build the quaternion equivalent to the rotation matrix whose rows are
/// the given orthonormal basis vectors (east, north, up).
///
/// Trace-based extraction with a non-negative scalar part: component
/// magnitudes come from the matrix diagonal, vector signs from the
/// off-diagonal differences. Radicands pushed slightly negative by
/// rounding clamp to zero; non-finite basis components reach every
/// radicand through the diagonal and produce an all-NaN quaternion.
pub fn quaternion_from_basis(
    east: Vector3<f32>,
    north: Vector3<f32>,
    up: Vector3<f32>,
) -> Quaternion<f32> {
    let w = clamped_sqrt(1.0 + east.x + north.y + up.z) * 0.5;
    let x = clamped_sqrt(1.0 + east.x - north.y - up.z) * 0.5;
    let y = clamped_sqrt(1.0 - east.x + north.y - up.z) * 0.5;
    let z = clamped_sqrt(1.0 - east.x - north.y + up.z) * 0.5;

    Quaternion::new(
        w,
        x.copysign(up.y - north.z),
        y.copysign(east.z - up.x),
        z.copysign(north.x - east.y),
    )
}

/// Square root with negative inputs clamped to zero. NaN stays NaN.
fn clamped_sqrt(value: f32) -> f32 {
    if value < 0.0 { 0.0 } else { value.sqrt() }
}

/// Extension trait for UnitQuaternion operations
pub trait QuaternionExt {
    /// Advance the orientation by a body-frame angular rate over a time step
    ///
    /// First-order integration of `dq/dt = 0.5 · q ⊗ (0, rate)` followed by
    /// renormalization. `rate` is in rad/s, `delta_time` in seconds.
    fn integrated(&self, rate: Vector3<f32>, delta_time: f32) -> UnitQuaternion<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn integrated(&self, rate: Vector3<f32>, delta_time: f32) -> UnitQuaternion<f32> {
        let q = self.as_ref();
        let derivative = q * Quaternion::from_parts(0.0, rate) * 0.5;
        UnitQuaternion::from_quaternion(q + derivative * delta_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_identity() {
        let q = quaternion_from_basis(Vector3::x(), Vector3::y(), Vector3::z());

        assert!((q.w - 1.0).abs() < 1e-6);
        assert!(q.i.abs() < 1e-6);
        assert!(q.j.abs() < 1e-6);
        assert!(q.k.abs() < 1e-6);
    }

    #[test]
    fn test_basis_quarter_turn_about_z() {
        // Device yawed -90 degrees: east along device y, north along -x
        let q = quaternion_from_basis(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );

        let half = core::f32::consts::FRAC_1_SQRT_2;
        assert!((q.w - half).abs() < 1e-6);
        assert!((q.k + half).abs() < 1e-6);
        assert!(q.i.abs() < 1e-6);
        assert!(q.j.abs() < 1e-6);
    }

    #[test]
    fn test_basis_half_turns() {
        // 180 degrees about each axis: the scalar part vanishes and the
        // sign source for the surviving component is exactly zero
        let q = quaternion_from_basis(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        );
        assert!((q.i - 1.0).abs() < 1e-6 && q.w.abs() < 1e-6);

        let q = quaternion_from_basis(
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        );
        assert!((q.j - 1.0).abs() < 1e-6 && q.w.abs() < 1e-6);

        let q = quaternion_from_basis(
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!((q.k - 1.0).abs() < 1e-6 && q.w.abs() < 1e-6);
    }

    #[test]
    fn test_basis_matches_nalgebra_rotation() {
        let reference = UnitQuaternion::from_euler_angles(0.3, -0.5, 1.1);
        let matrix = reference.to_rotation_matrix();

        let q = quaternion_from_basis(
            matrix.matrix().row(0).transpose(),
            matrix.matrix().row(1).transpose(),
            matrix.matrix().row(2).transpose(),
        );

        assert!((q.w - reference.w).abs() < 1e-5);
        assert!((q.i - reference.i).abs() < 1e-5);
        assert!((q.j - reference.j).abs() < 1e-5);
        assert!((q.k - reference.k).abs() < 1e-5);
    }

    #[test]
    fn test_basis_takes_non_negative_scalar_representative() {
        // Rotations past a half turn flip the sign onto the vector part,
        // never onto w
        let reference = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 4.0);
        let matrix = reference.to_rotation_matrix();

        let q = quaternion_from_basis(
            matrix.matrix().row(0).transpose(),
            matrix.matrix().row(1).transpose(),
            matrix.matrix().row(2).transpose(),
        );

        assert!(q.w >= 0.0);
        assert!(UnitQuaternion::new_unchecked(q).angle_to(&reference) < 1e-5);
    }

    #[test]
    fn test_basis_propagates_nan() {
        let q = quaternion_from_basis(
            Vector3::new(f32::NAN, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        );

        assert!(q.w.is_nan());
        assert!(q.i.is_nan());
        assert!(q.j.is_nan());
        assert!(q.k.is_nan());
    }

    #[test]
    fn test_integration_accumulates_rotation() {
        // 0.1 rad/s about z for 10 seconds in 10 ms steps
        let mut q = UnitQuaternion::identity();
        for _ in 0..1000 {
            q = q.integrated(Vector3::new(0.0, 0.0, 0.1), 0.01);
        }

        let (roll, pitch, yaw) = q.euler_angles();
        assert!((yaw - 1.0).abs() < 1e-3, "yaw was {yaw}");
        assert!(roll.abs() < 1e-4);
        assert!(pitch.abs() < 1e-4);
    }

    #[test]
    fn test_integration_renormalizes() {
        let q = UnitQuaternion::identity().integrated(Vector3::new(50.0, 0.0, 0.0), 0.1);

        assert!((q.as_ref().norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rate_is_identity_step() {
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let stepped = q.integrated(Vector3::zeros(), 0.01);

        assert!((q.as_ref() - stepped.as_ref()).norm() < 1e-7);
    }
}
