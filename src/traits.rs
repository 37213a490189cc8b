//! Shared capability trait over the fusion engines

use nalgebra::{Quaternion, Vector3};

/// Common interface for attitude estimators
///
/// Both engines turn calibrated tri-axial samples into an orientation
/// estimate but keep their own state shapes: the [`Fusion`](crate::Fusion)
/// engine takes the three sensor streams separately and tracks a gyroscope
/// bias, the [`Madgwick`](crate::Madgwick) filter consumes synchronized
/// samples in a single step. This trait covers the shared capability so
/// callers can drive either behind `dyn Ahrs`.
///
/// The attitude is returned as a raw [`Quaternion`] rather than a unit
/// quaternion: the Fusion engine reports NaN components for degenerate
/// reference geometry and that value must pass through unchanged.
pub trait Ahrs {
    /// Feed one synchronized sample and return the updated attitude
    ///
    /// Units: `accelerometer` in m/s², `gyroscope` in rad/s, `magnetometer`
    /// in any linear unit, `delta_time` in seconds.
    fn update(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) -> Quaternion<f32>;

    /// Current attitude estimate
    fn attitude(&self) -> Quaternion<f32>;
}
