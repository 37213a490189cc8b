//! Madgwick gradient-descent orientation filter

use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3, Vector4};

use crate::math::QuaternionExt;
use crate::traits::Ahrs;
use crate::types::MadgwickSettings;

/// Madgwick MARG orientation filter
///
/// Single-gain gradient-descent filter: each step integrates the gyroscope
/// rate and descends the gradient of an objective function measuring the
/// disagreement between the predicted and the measured gravity and magnetic
/// field directions. The gradient step is normalized and weighted by beta.
///
/// Unlike [`Fusion`](crate::Fusion), degenerate inputs are guarded rather
/// than propagated: a zero-magnitude magnetometer reading drops the step to
/// the IMU-only form and a zero-magnitude accelerometer reading drops it to
/// pure gyroscope integration, so the quaternion stays finite.
///
/// The quaternion accessors are scalar first, `(q0, q1, q2, q3)` reading as
/// `(w, x, y, z)`; note this is the reverse of the field order used by
/// [`Fusion::attitude`](crate::Fusion::attitude).
pub struct Madgwick {
    /// Filter settings
    settings: MadgwickSettings,
    /// Current orientation, device frame to earth frame
    quaternion: UnitQuaternion<f32>,
}

impl Madgwick {
    /// Create a new filter with the published default gain
    pub fn new() -> Self {
        Self::with_settings(MadgwickSettings::default())
    }

    /// Create a new filter with the given settings
    pub fn with_settings(settings: MadgwickSettings) -> Self {
        Madgwick {
            settings,
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Current filter settings
    pub fn settings(&self) -> MadgwickSettings {
        self.settings
    }

    /// Current orientation estimate
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Scalar (w) component of the orientation
    pub fn q0(&self) -> f32 {
        self.quaternion.w
    }

    /// First vector (x) component of the orientation
    pub fn q1(&self) -> f32 {
        self.quaternion.i
    }

    /// Second vector (y) component of the orientation
    pub fn q2(&self) -> f32 {
        self.quaternion.j
    }

    /// Third vector (z) component of the orientation
    pub fn q3(&self) -> f32 {
        self.quaternion.k
    }

    /// Advance the filter by one synchronized MARG sample
    ///
    /// # Arguments
    /// * `accelerometer` - Specific force in m/s² (any consistent scale)
    /// * `gyroscope` - Angular rate in rad/s
    /// * `magnetometer` - Magnetic field in any linear unit
    /// * `delta_time` - Time step in seconds
    pub fn update(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) {
        let Some(mag) = magnetometer.try_normalize(f32::EPSILON) else {
            self.update_no_magnetometer(accelerometer, gyroscope, delta_time);
            return;
        };
        let Some(acc) = accelerometer.try_normalize(f32::EPSILON) else {
            self.integrate_gyro(gyroscope, delta_time);
            return;
        };

        let q = *self.quaternion.as_ref();
        let (qw, qx, qy, qz) = (q.w, q.i, q.j, q.k);

        // Earth-frame field from the current estimate, collapsed onto the
        // x-z half plane so only the inclination is tracked
        let h = q * Quaternion::from_parts(0.0, mag) * q.conjugate();
        let bx = Vector2::new(h.i, h.j).norm();
        let bz = h.k;

        // Objective function: predicted gravity and field minus measurements
        let f1 = 2.0 * (qx * qz - qw * qy) - acc.x;
        let f2 = 2.0 * (qw * qx + qy * qz) - acc.y;
        let f3 = 2.0 * (0.5 - qx * qx - qy * qy) - acc.z;
        let f4 = 2.0 * bx * (0.5 - qy * qy - qz * qz) + 2.0 * bz * (qx * qz - qw * qy) - mag.x;
        let f5 = 2.0 * bx * (qx * qy - qw * qz) + 2.0 * bz * (qw * qx + qy * qz) - mag.y;
        let f6 = 2.0 * bx * (qw * qy + qx * qz) + 2.0 * bz * (0.5 - qx * qx - qy * qy) - mag.z;

        // Gradient: Jacobian transpose times the objective
        let sw = -2.0 * qy * f1 + 2.0 * qx * f2 - 2.0 * bz * qy * f4
            + (-2.0 * bx * qz + 2.0 * bz * qx) * f5
            + 2.0 * bx * qy * f6;
        let sx = 2.0 * qz * f1 + 2.0 * qw * f2 - 4.0 * qx * f3 + 2.0 * bz * qz * f4
            + (2.0 * bx * qy + 2.0 * bz * qw) * f5
            + (2.0 * bx * qz - 4.0 * bz * qx) * f6;
        let sy = -2.0 * qw * f1 + 2.0 * qz * f2 - 4.0 * qy * f3
            + (-4.0 * bx * qy - 2.0 * bz * qw) * f4
            + (2.0 * bx * qx + 2.0 * bz * qz) * f5
            + (2.0 * bx * qw - 4.0 * bz * qy) * f6;
        let sz = 2.0 * qx * f1 + 2.0 * qy * f2 + (-4.0 * bx * qz + 2.0 * bz * qx) * f4
            + (-2.0 * bx * qw + 2.0 * bz * qy) * f5
            + 2.0 * bx * qx * f6;

        self.descend(q, Vector4::new(sw, sx, sy, sz), gyroscope, delta_time);
    }

    /// Advance the filter without a magnetometer reading
    ///
    /// Gravity-only objective function; yaw is carried by the gyroscope
    /// alone.
    pub fn update_no_magnetometer(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        delta_time: f32,
    ) {
        let Some(acc) = accelerometer.try_normalize(f32::EPSILON) else {
            self.integrate_gyro(gyroscope, delta_time);
            return;
        };

        let q = *self.quaternion.as_ref();
        let (qw, qx, qy, qz) = (q.w, q.i, q.j, q.k);

        let f1 = 2.0 * (qx * qz - qw * qy) - acc.x;
        let f2 = 2.0 * (qw * qx + qy * qz) - acc.y;
        let f3 = 2.0 * (0.5 - qx * qx - qy * qy) - acc.z;

        let sw = -2.0 * qy * f1 + 2.0 * qx * f2;
        let sx = 2.0 * qz * f1 + 2.0 * qw * f2 - 4.0 * qx * f3;
        let sy = -2.0 * qw * f1 + 2.0 * qz * f2 - 4.0 * qy * f3;
        let sz = 2.0 * qx * f1 + 2.0 * qy * f2;

        self.descend(q, Vector4::new(sw, sx, sy, sz), gyroscope, delta_time);
    }

    /// Apply the normalized gradient step alongside gyroscope integration.
    /// A vanishing gradient (already at the objective minimum) leaves pure
    /// integration.
    fn descend(
        &mut self,
        q: Quaternion<f32>,
        gradient: Vector4<f32>,
        gyroscope: Vector3<f32>,
        delta_time: f32,
    ) {
        let Some(step) = gradient.try_normalize(f32::EPSILON) else {
            self.integrate_gyro(gyroscope, delta_time);
            return;
        };

        let derivative = q * Quaternion::from_parts(0.0, gyroscope) * 0.5
            - Quaternion::new(step.x, step.y, step.z, step.w) * self.settings.beta;
        self.quaternion = UnitQuaternion::from_quaternion(q + derivative * delta_time);
    }

    fn integrate_gyro(&mut self, gyroscope: Vector3<f32>, delta_time: f32) {
        self.quaternion = self.quaternion.integrated(gyroscope, delta_time);
    }
}

impl Default for Madgwick {
    fn default() -> Self {
        Self::new()
    }
}

impl Ahrs for Madgwick {
    fn update(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) -> Quaternion<f32> {
        Madgwick::update(self, accelerometer, gyroscope, magnetometer, delta_time);
        *self.quaternion.as_ref()
    }

    fn attitude(&self) -> Quaternion<f32> {
        *self.quaternion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GRAVITY_EARTH;

    const SAMPLE_PERIOD: f32 = 0.01;

    #[test]
    fn test_starts_at_identity() {
        let madgwick = Madgwick::new();

        assert_eq!(madgwick.q0(), 1.0);
        assert_eq!(madgwick.q1(), 0.0);
        assert_eq!(madgwick.q2(), 0.0);
        assert_eq!(madgwick.q3(), 0.0);
    }

    #[test]
    fn test_aligned_references_are_a_fixed_point() {
        // Level device with the field's horizontal component along earth x:
        // the objective is already at its minimum
        let mut madgwick = Madgwick::new();
        for _ in 0..100 {
            madgwick.update(
                Vector3::new(0.0, 0.0, GRAVITY_EARTH),
                Vector3::zeros(),
                Vector3::new(40.0, 0.0, 40.0),
                SAMPLE_PERIOD,
            );
        }

        assert!(madgwick.quaternion().angle_to(&UnitQuaternion::identity()) < 1e-4);
    }

    #[test]
    fn test_zero_magnetometer_matches_imu_update() {
        let acc = Vector3::new(0.3, -0.1, GRAVITY_EARTH);
        let gyro = Vector3::new(0.02, -0.01, 0.05);

        let mut guarded = Madgwick::new();
        let mut imu = Madgwick::new();
        for _ in 0..50 {
            guarded.update(acc, gyro, Vector3::zeros(), SAMPLE_PERIOD);
            imu.update_no_magnetometer(acc, gyro, SAMPLE_PERIOD);
        }

        assert_eq!(guarded.quaternion(), imu.quaternion());
    }

    #[test]
    fn test_zero_accelerometer_falls_back_to_gyro() {
        let gyro = Vector3::new(0.0, 0.0, 0.5);

        let mut guarded = Madgwick::new();
        let mut reference = UnitQuaternion::identity();
        for _ in 0..50 {
            guarded.update(Vector3::zeros(), gyro, Vector3::new(40.0, 0.0, 40.0), SAMPLE_PERIOD);
            reference = reference.integrated(gyro, SAMPLE_PERIOD);
        }

        assert!(guarded.quaternion().angle_to(&reference) < 1e-6);
    }

    #[test]
    fn test_collinear_field_stays_finite() {
        // The guarded engine tolerates a field collinear with gravity; yaw
        // is simply unobservable
        let mut madgwick = Madgwick::new();
        for _ in 0..200 {
            madgwick.update(
                Vector3::new(0.0, 0.0, GRAVITY_EARTH),
                Vector3::new(0.0, 0.0, 0.1),
                Vector3::new(0.0, 0.0, 50.0),
                SAMPLE_PERIOD,
            );
        }

        let q = madgwick.quaternion();
        assert!(q.w.is_finite() && q.i.is_finite() && q.j.is_finite() && q.k.is_finite());
        assert!((q.as_ref().norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_update_keeps_unit_norm() {
        let mut madgwick = Madgwick::new();
        for i in 0..500 {
            let phase = i as f32 * 0.05;
            madgwick.update(
                Vector3::new(phase.sin(), phase.cos(), GRAVITY_EARTH),
                Vector3::new(0.3 * phase.cos(), -0.2, 0.4 * phase.sin()),
                Vector3::new(30.0 * phase.cos(), 10.0, 35.0),
                SAMPLE_PERIOD,
            );

            let norm = (madgwick.q0() * madgwick.q0()
                + madgwick.q1() * madgwick.q1()
                + madgwick.q2() * madgwick.q2()
                + madgwick.q3() * madgwick.q3())
            .sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "norm drifted at step {i}");
        }
    }

    #[test]
    fn test_default_beta_is_published_value() {
        let madgwick = Madgwick::default();

        assert_eq!(madgwick.settings().beta, 0.1);
    }
}
