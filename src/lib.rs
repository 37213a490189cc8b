#![no_std]

//! MARG AHRS - attitude and heading estimation from MARG sensor arrays
//!
//! This library fuses calibrated magnetometer, angular-rate, and gravity
//! (MARG) samples into an orientation estimate. Two independent estimators
//! are provided behind a common trait:
//!
//! - [`Fusion`]: a complementary filter that integrates the gyroscope,
//!   corrects toward an accelerometer/magnetometer reference frame, and
//!   estimates the gyroscope bias in place. Degenerate sensor geometry is
//!   reported as NaN attitude components rather than being masked.
//! - [`Madgwick`]: the gradient-descent MARG filter with a single beta
//!   gain. Degenerate inputs are guarded by dropping to IMU-only or pure
//!   gyroscope updates.
//!
//! Conversion helpers ([`quaternion_to_axis_angle`], [`roll_pitch_yaw`])
//! turn quaternions into reporting-friendly forms in degrees.
//!
//! # Features
//!
//! - Complementary filter with in-place gyroscope bias estimation
//! - Fixed convergence window with bitwise-exact zero bias for zero input
//! - Madgwick gradient-descent filter with the published default gain
//! - Axis-angle and roll/pitch/yaw conversions
//! - `#![no_std]` compatible for embedded systems
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use marg_ahrs::{Fusion, GRAVITY_EARTH, MIN_GYRO_SAMPLES};
//!
//! let mut fusion = Fusion::new();
//!
//! // Feed a convergence window of samples (normally from the sensor bus)
//! for _ in 0..MIN_GYRO_SAMPLES {
//!     fusion.handle_acc(Vector3::new(0.0, 0.0, GRAVITY_EARTH)); // m/s²
//!     fusion.handle_mag(Vector3::new(0.0, 22.0, 41.0));         // µT
//!     fusion.handle_gyro(Vector3::zeros(), 0.01);               // rad/s, 10 ms
//! }
//!
//! assert!(fusion.has_estimate());
//!
//! // Attitude components read as (x, y, z, w)
//! let attitude = fusion.attitude();
//! let bias = fusion.bias();
//! ```

mod fusion;
mod madgwick;
mod math;
pub mod orientation;
mod traits;
mod types;

// Re-export all public types and functions
pub use fusion::Fusion;
pub use madgwick::Madgwick;
pub use math::{DEG_TO_RAD, QuaternionExt, RAD_TO_DEG, quaternion_from_basis};
pub use orientation::{quaternion_to_axis_angle, roll_pitch_yaw};
pub use traits::Ahrs;
pub use types::*;
