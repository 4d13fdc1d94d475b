//! Message types exchanged with the robot.
//!
//! Field layout follows the robot-side topics: a status record made of free-form
//! text fields, an odometry record whose position is the only part the console
//! reads, and a no-argument trigger service answering `{ success, message }`.

use serde::Deserialize;

/// Number of status text fields shown by the console.
pub const STATUS_FIELD_COUNT: usize = 6;

/// Six-field robot status record.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotStatus {
    pub fields: [String; STATUS_FIELD_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    /// Rotation of `yaw` radians about the z axis.
    pub fn from_yaw(yaw: f64) -> Self {
        let half = yaw / 2.0;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::from_yaw(0.0)
    }
}

/// Odometry record. Orientation and covariance travel with the message but
/// the console only consumes `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Odometry {
    pub position: Point3,
    pub orientation: Quaternion,
    /// Pose covariance matrix (6x6 row-major)
    pub pose_covariance: [f64; 36],
}

impl Odometry {
    pub fn at(position: Point3) -> Self {
        Self {
            position,
            orientation: Quaternion::default(),
            pose_covariance: [0.0; 36],
        }
    }
}

/// Messages delivered asynchronously to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Status(RobotStatus),
    Odometry(Odometry),
}

/// Response of the distance trigger service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DistanceResponse {
    pub success: bool,
    pub message: String,
}

/// Distance request sent over the robot link. The id pairs it with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceRequest {
    pub request_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceReply {
    pub request_id: u32,
    pub response: DistanceResponse,
}
