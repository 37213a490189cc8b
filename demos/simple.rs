use marg_ahrs::{Fusion, GRAVITY_EARTH, MIN_GYRO_SAMPLES, roll_pitch_yaw};
use nalgebra::Vector3;

const SAMPLE_PERIOD: f32 = 0.01; // 10 ms sample period

fn main() {
    let mut fusion = Fusion::new();

    // this loop should repeat each time new sensor data is available; the
    // engine holds back its estimate until a full gyroscope window has passed
    for _ in 0..MIN_GYRO_SAMPLES {
        let accelerometer = Vector3::new(0.0, 0.0, GRAVITY_EARTH); // replace this with actual accelerometer data in m/s^2
        let magnetometer = Vector3::new(0.0, 40.0, 40.0); // replace this with actual magnetometer data in uT
        let gyroscope = Vector3::new(0.0, 0.0, 0.0); // replace this with actual gyroscope data in rad/s

        fusion.handle_acc(accelerometer);
        fusion.handle_mag(magnetometer);
        fusion.handle_gyro(gyroscope, SAMPLE_PERIOD);
    }

    let (roll, pitch, yaw) = roll_pitch_yaw(fusion.attitude());
    let bias = fusion.bias();

    println!("Roll: {:.2}, Pitch: {:.2}, Yaw: {:.2}", roll, pitch, yaw);
    println!(
        "Gyro bias: [{:.4}, {:.4}, {:.4}] rad/s",
        bias.x, bias.y, bias.z
    );
}
