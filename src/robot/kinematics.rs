//! Dead-reckoning for the simulated robot.
//!
//! A unicycle model integrated with the midpoint heading over each step, plus
//! optional Gaussian noise on the translation to mimic wheel slip. The
//! odometer also accumulates the path length, which is what the distance
//! service reports.

use chrono::{DateTime, TimeZone};
use rand_distr::{Distribution, Normal};
use std::fmt::Display;

use crate::bus::{Odometry, Point3, Quaternion, STATUS_FIELD_COUNT};
use crate::config::RobotConfig;
use crate::console::VelocityCommand;

pub struct Odometer {
    x: f64,
    y: f64,
    yaw: f64,
    distance_travelled: f64,
    noise: Option<Normal<f64>>,
}

impl Odometer {
    /// `noise_std` is in metres per step; 0 gives exact integration.
    pub fn new(noise_std: f64) -> Self {
        let noise = if noise_std > 0.0 { Normal::new(0.0, noise_std).ok() } else { None };
        Self {
            x: 0.0,
            y: 0.0,
            yaw: 0.0,
            distance_travelled: 0.0,
            noise,
        }
    }

    /// Advance by `dt` seconds under `command`.
    pub fn step(&mut self, command: &VelocityCommand, dt: f64) {
        let delta_yaw = command.angular_z * dt;
        let heading = self.yaw + delta_yaw / 2.0;
        let travel = command.linear_x * dt;

        let mut dx = travel * heading.cos();
        let mut dy = travel * heading.sin();
        if travel != 0.0 {
            if let Some(noise) = &self.noise {
                let mut rng = rand::thread_rng();
                dx += noise.sample(&mut rng);
                dy += noise.sample(&mut rng);
            }
        }

        self.x += dx;
        self.y += dy;
        self.yaw += delta_yaw;
        self.distance_travelled += dx.hypot(dy);
    }

    pub fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    pub fn odometry(&self) -> Odometry {
        let variance = self.noise.as_ref().map(|n| n.std_dev().powi(2)).unwrap_or(0.0);
        let mut pose_covariance = [0.0; 36];
        pose_covariance[0] = variance;
        pose_covariance[7] = variance;
        Odometry {
            orientation: Quaternion::from_yaw(self.yaw),
            pose_covariance,
            ..Odometry::at(Point3 { x: self.x, y: self.y, z: 0.0 })
        }
    }
}

/// Status record published by the simulated robot: the static identity from
/// config and the robot's wall-clock time.
pub fn status_fields<Tz>(config: &RobotConfig, now: DateTime<Tz>) -> [String; STATUS_FIELD_COUNT]
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    [
        format!("robot_description: {}", config.description),
        format!("serial_number: {}", config.serial_number),
        format!("ip_address: {}", config.ip_address),
        format!("firmware_version: {}", config.firmware_version),
        format!("maximum_payload: {}", config.maximum_payload),
        format!("robot_time: {}", now.format("%H:%M:%S")),
    ]
}
