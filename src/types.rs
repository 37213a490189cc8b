//! Core types and constants for the MARG AHRS library

/// Standard gravity in metres per second squared
///
/// Accelerometer samples fed to the fusion engines are expected in m/s²,
/// so a device resting flat reads approximately `(0, 0, GRAVITY_EARTH)`.
pub const GRAVITY_EARTH: f32 = 9.8066;

/// Gyroscope samples required before an attitude estimate is reported
///
/// The [`Fusion`](crate::Fusion) engine spends this many samples estimating
/// the gyroscope bias before `has_estimate()` turns true. At a typical
/// 100 Hz sample rate the window is 640 ms.
pub const MIN_GYRO_SAMPLES: u32 = 64;

/// Fusion engine settings
///
/// Gains for the complementary filter's converged phase. Both act on the
/// frame residual (the cross-product error between the measured and the
/// integrated reference directions).
///
/// # Example
/// ```
/// use marg_ahrs::{Fusion, FusionSettings};
///
/// let settings = FusionSettings {
///     gain: 0.5, // slower frame correction, smoother output
///     ..Default::default()
/// };
/// let fusion = Fusion::with_settings(settings);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FusionSettings {
    /// Frame correction gain in 1/s (typically 1.0)
    ///
    /// Rate at which the integrated attitude is pulled toward the
    /// accelerometer/magnetometer reference frame. Higher values track the
    /// references faster but pass more of their noise through.
    pub gain: f32,
    /// Bias feedback gain in 1/s² (typically 0.3)
    ///
    /// Rate at which a persistent frame residual is attributed to
    /// gyroscope bias. Lower values give a steadier bias estimate but a
    /// slower response to drift.
    pub bias_gain: f32,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            gain: 1.0,
            bias_gain: 0.3,
        }
    }
}

/// Madgwick filter settings
///
/// # Example
/// ```
/// use marg_ahrs::{Madgwick, MadgwickSettings};
///
/// let settings = MadgwickSettings { beta: 0.033 };
/// let madgwick = Madgwick::with_settings(settings);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MadgwickSettings {
    /// Filter gain beta (published default 0.1)
    ///
    /// Represents the magnitude of gyroscope measurement error expressed
    /// as the gradient-step weight. Higher values converge faster but
    /// amplify accelerometer and magnetometer noise.
    pub beta: f32,
}

impl Default for MadgwickSettings {
    fn default() -> Self {
        Self { beta: 0.1 }
    }
}
