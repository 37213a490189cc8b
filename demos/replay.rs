//! Sensor log replay
//!
//! Replays the bundled recording through both engines: the Fusion engine via
//! its per-sensor handlers, the Madgwick filter via synchronized updates. The
//! recording holds the device still for two seconds, then turns it 120
//! degrees about the vertical axis against a constant gyroscope bias.
//!
//! Run with: `cargo run --example replay`

use marg_ahrs::{Ahrs, Fusion, Madgwick, roll_pitch_yaw};
use nalgebra::Vector3;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
struct SensorRecord {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Gyroscope X (rad/s)")]
    gyro_x: f32,
    #[serde(rename = "Gyroscope Y (rad/s)")]
    gyro_y: f32,
    #[serde(rename = "Gyroscope Z (rad/s)")]
    gyro_z: f32,
    #[serde(rename = "Accelerometer X (m/s^2)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (m/s^2)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (m/s^2)")]
    accel_z: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut reader = csv::Reader::from_path("testdata/sensor_replay.csv")?;
    let mut records = Vec::new();

    for result in reader.deserialize() {
        let record: SensorRecord = result?;
        records.push(record);
    }

    println!("Replaying {} samples through both engines", records.len());

    let mut fusion = Fusion::new();
    let mut madgwick = Madgwick::new();

    let mut previous_time = 0.0;
    for (i, record) in records.iter().enumerate() {
        let delta_time = if i == 0 {
            record.time
        } else {
            record.time - previous_time
        };
        previous_time = record.time;

        let accelerometer = Vector3::new(record.accel_x, record.accel_y, record.accel_z);
        let gyroscope = Vector3::new(record.gyro_x, record.gyro_y, record.gyro_z);
        let magnetometer = Vector3::new(record.mag_x, record.mag_y, record.mag_z);

        fusion.handle_acc(accelerometer);
        fusion.handle_mag(magnetometer);
        fusion.handle_gyro(gyroscope, delta_time);

        madgwick.update(accelerometer, gyroscope, magnetometer, delta_time);

        if (i + 1) % 100 == 0 {
            let (roll, pitch, yaw) = roll_pitch_yaw(fusion.attitude());
            println!(
                "t={:>5.2}s orientation=({:6.1}°, {:6.1}°, {:6.1}°) estimate={}",
                record.time,
                roll,
                pitch,
                yaw,
                fusion.has_estimate()
            );
        }
    }

    let (roll, pitch, yaw) = roll_pitch_yaw(fusion.attitude());
    let bias = fusion.bias();
    println!("Fusion: roll={:.2}° pitch={:.2}° yaw={:.2}°", roll, pitch, yaw);
    println!(
        "Fusion gyro bias: [{:.5}, {:.5}, {:.5}] rad/s",
        bias.x, bias.y, bias.z
    );

    let (roll, pitch, yaw) = roll_pitch_yaw(madgwick.attitude());
    println!(
        "Madgwick: roll={:.2}° pitch={:.2}° yaw={:.2}°",
        roll, pitch, yaw
    );

    Ok(())
}
