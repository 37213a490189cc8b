//! Complementary-filter fusion engine with gyroscope bias estimation

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

use crate::math::{QuaternionExt, quaternion_from_basis};
use crate::traits::Ahrs;
use crate::types::{FusionSettings, MIN_GYRO_SAMPLES};

/// Complementary-filter attitude estimator
///
/// Consumes accelerometer, magnetometer, and gyroscope samples as separate
/// streams. The accelerometer and magnetometer define a reference frame
/// (down and magnetic north); the gyroscope drives an internal quaternion
/// whose disagreement with that frame feeds the bias estimate.
///
/// The engine runs in two phases split by [`MIN_GYRO_SAMPLES`]:
///
/// - **Converging**: the bias estimate is the running mean of the observed
///   gyroscope rate, so a stationary window captures the static offset
///   (and exactly-zero input yields an exactly-zero bias). No attitude is
///   reported yet.
/// - **Converged**: each gyroscope sample integrates the bias-corrected
///   rate, then a small-gain correction pulls the integrated frame toward
///   the measured references and attributes persistent disagreement to
///   bias drift.
///
/// Degenerate reference geometry (zero vectors, or a magnetic field
/// collinear with gravity) is reported as NaN attitude components; see
/// [`attitude`](Fusion::attitude).
pub struct Fusion {
    /// Engine settings
    settings: FusionSettings,
    /// Internally integrated orientation, device frame to east-north-up
    quaternion: UnitQuaternion<f32>,
    /// Gyroscope bias estimate in rad/s
    bias: Vector3<f32>,
    /// Gyroscope samples handled so far
    gyro_samples: u32,
    /// Accumulated angular travel during the convergence window
    rate_sum: Vector3<f32>,
    /// Accumulated time during the convergence window in seconds
    elapsed: f32,
    /// Most recent accelerometer reading, the down reference
    accelerometer: Vector3<f32>,
    /// Most recent magnetometer reading, the field reference
    magnetometer: Vector3<f32>,
}

impl Fusion {
    /// Create a new engine with default settings
    pub fn new() -> Self {
        Self::with_settings(FusionSettings::default())
    }

    /// Create a new engine with the given settings
    pub fn with_settings(settings: FusionSettings) -> Self {
        Fusion {
            settings,
            quaternion: UnitQuaternion::identity(),
            bias: Vector3::zeros(),
            gyro_samples: 0,
            rate_sum: Vector3::zeros(),
            elapsed: 0.0,
            accelerometer: Vector3::zeros(),
            magnetometer: Vector3::zeros(),
        }
    }

    /// Current engine settings
    pub fn settings(&self) -> FusionSettings {
        self.settings
    }

    /// Record an accelerometer reading in m/s²
    ///
    /// The latest reading becomes the down reference of the attitude
    /// frame. Calibration is the caller's responsibility.
    pub fn handle_acc(&mut self, accelerometer: Vector3<f32>) {
        self.accelerometer = accelerometer;
    }

    /// Record a magnetometer reading
    ///
    /// Any linear unit works; only the direction enters the attitude
    /// frame. Calibration is the caller's responsibility.
    pub fn handle_mag(&mut self, magnetometer: Vector3<f32>) {
        self.magnetometer = magnetometer;
    }

    /// Advance the filter by one gyroscope sample
    ///
    /// # Arguments
    /// * `gyroscope` - Angular rate in rad/s, device frame
    /// * `delta_time` - Time since the previous gyroscope sample in seconds
    pub fn handle_gyro(&mut self, gyroscope: Vector3<f32>, delta_time: f32) {
        if self.has_estimate() {
            self.fuse(gyroscope, delta_time);
        } else {
            self.converge(gyroscope, delta_time);
            if self.gyro_samples + 1 >= MIN_GYRO_SAMPLES {
                self.seed_from_references();
            }
        }

        self.gyro_samples = self.gyro_samples.saturating_add(1);
    }

    /// Whether enough gyroscope samples have been handled to report an
    /// estimate
    ///
    /// False until [`MIN_GYRO_SAMPLES`] samples have been seen, true from
    /// then on; never reverts.
    pub fn has_estimate(&self) -> bool {
        self.gyro_samples >= MIN_GYRO_SAMPLES
    }

    /// Attitude quaternion built from the latest references
    ///
    /// Vector part first: read the components as `(x, y, z, w)`, the order
    /// the surrounding sensor stack uses. Unit norm whenever the
    /// references span a frame. When either reference is zero, or the
    /// magnetic field is collinear with gravity, the frame construction
    /// divides by a zero norm and every component comes back NaN; that NaN
    /// is the error channel and must not be masked.
    pub fn attitude(&self) -> Quaternion<f32> {
        let (east, north, up) = self.reference_frame();
        quaternion_from_basis(east, north, up)
    }

    /// Current gyroscope bias estimate in rad/s
    pub fn bias(&self) -> Vector3<f32> {
        self.bias
    }

    /// Rotation matrix form of the attitude
    ///
    /// Rows are the east, north, and up directions of the reference frame;
    /// always the same rotation as [`attitude`](Fusion::attitude),
    /// including the NaN cases.
    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        let (east, north, up) = self.reference_frame();
        Matrix3::from_rows(&[east.transpose(), north.transpose(), up.transpose()])
    }

    /// Reference frame spanned by the latest accelerometer and
    /// magnetometer readings, as device-frame rows (east, north, up).
    ///
    /// Plain `normalize` is used here: a zero-magnitude reference or a
    /// collinear field/gravity pair divides to NaN and the NaN propagates
    /// to the caller.
    fn reference_frame(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let up = self.accelerometer.normalize();
        let east = self.magnetometer.cross(&up).normalize();
        let north = up.cross(&east);
        (east, north, up)
    }

    /// Convergence-window step: accumulate the rate mean and coast on the
    /// bias-corrected gyroscope.
    fn converge(&mut self, gyroscope: Vector3<f32>, delta_time: f32) {
        self.rate_sum += gyroscope * delta_time;
        self.elapsed += delta_time;
        if self.elapsed > 0.0 {
            self.bias = self.rate_sum / self.elapsed;
        }

        self.quaternion = self.quaternion.integrated(gyroscope - self.bias, delta_time);
    }

    /// Align the integrated quaternion with the reference frame at the end
    /// of the convergence window. Skipped when the frame is degenerate.
    fn seed_from_references(&mut self) {
        let attitude = self.attitude();
        if attitude.coords.iter().all(|c| c.is_finite()) {
            self.quaternion = UnitQuaternion::new_unchecked(attitude);
        }
    }

    /// Converged step: integrate the bias-corrected rate, then correct
    /// toward the references and adapt the bias.
    fn fuse(&mut self, gyroscope: Vector3<f32>, delta_time: f32) {
        self.quaternion = self.quaternion.integrated(gyroscope - self.bias, delta_time);

        let Some(residual) = self.frame_residual() else {
            return;
        };

        self.quaternion = self
            .quaternion
            .integrated(residual * self.settings.gain, delta_time);
        self.bias -= residual * (self.settings.bias_gain * delta_time);
    }

    /// Cross-product error between the measured and the integrated
    /// reference directions, summed over the down and north pairs.
    ///
    /// None when the measured frame is degenerate; a non-finite residual
    /// must never reach the bias state.
    fn frame_residual(&self) -> Option<Vector3<f32>> {
        let (_, north, up) = self.reference_frame();

        let predicted_up = self.quaternion.inverse_transform_vector(&Vector3::z());
        let predicted_north = self.quaternion.inverse_transform_vector(&Vector3::y());

        let residual = up.cross(&predicted_up) + north.cross(&predicted_north);
        residual.iter().all(|c| c.is_finite()).then_some(residual)
    }
}

impl Default for Fusion {
    fn default() -> Self {
        Self::new()
    }
}

impl Ahrs for Fusion {
    fn update(
        &mut self,
        accelerometer: Vector3<f32>,
        gyroscope: Vector3<f32>,
        magnetometer: Vector3<f32>,
        delta_time: f32,
    ) -> Quaternion<f32> {
        self.handle_acc(accelerometer);
        self.handle_mag(magnetometer);
        self.handle_gyro(gyroscope, delta_time);
        self.attitude()
    }

    fn attitude(&self) -> Quaternion<f32> {
        Fusion::attitude(self)
    }
}
