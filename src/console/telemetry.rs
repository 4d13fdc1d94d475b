//! Latest robot status and pose as last delivered by the bus.

use crate::bus::{Inbound, Odometry, RobotStatus, STATUS_FIELD_COUNT};

/// Shown in every status field until the first status message arrives.
pub const STATUS_PLACEHOLDER: &str = "Waiting for data...";

/// Position part of the most recent odometry message.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseEstimate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<&Odometry> for PoseEstimate {
    fn from(odometry: &Odometry) -> Self {
        Self {
            x: odometry.position.x,
            y: odometry.position.y,
            z: odometry.position.z,
        }
    }
}

/// Telemetry as displayed. Every update overwrites; nothing is merged or smoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryStore {
    status: [String; STATUS_FIELD_COUNT],
    pose: PoseEstimate,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self {
            status: std::array::from_fn(|_| STATUS_PLACEHOLDER.to_string()),
            pose: PoseEstimate::default(),
        }
    }
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_status(&mut self, fields: [String; STATUS_FIELD_COUNT]) {
        self.status = fields;
    }

    pub fn update_pose(&mut self, pose: PoseEstimate) {
        self.pose = pose;
    }

    /// Route one inbound message to the matching update.
    pub fn apply(&mut self, message: Inbound) {
        match message {
            Inbound::Status(RobotStatus { fields }) => self.update_status(fields),
            Inbound::Odometry(odometry) => self.update_pose(PoseEstimate::from(&odometry)),
        }
    }

    pub fn status(&self) -> &[String; STATUS_FIELD_COUNT] {
        &self.status
    }

    pub fn pose(&self) -> PoseEstimate {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Point3, Quaternion};

    fn status(prefix: &str) -> RobotStatus {
        RobotStatus {
            fields: std::array::from_fn(|i| format!("{prefix}{i}")),
        }
    }

    #[test]
    fn starts_with_placeholders_and_origin_pose() {
        let store = TelemetryStore::new();
        assert!(store.status().iter().all(|f| f == STATUS_PLACEHOLDER));
        assert_eq!(store.pose(), PoseEstimate::default());
    }

    #[test]
    fn status_is_overwritten_not_merged() {
        let mut store = TelemetryStore::new();
        store.apply(Inbound::Status(status("a")));
        store.apply(Inbound::Status(RobotStatus {
            fields: ["x".into(), String::new(), String::new(), String::new(), String::new(), String::new()],
        }));
        assert_eq!(store.status()[0], "x");
        assert_eq!(store.status()[1], "");
    }

    #[test]
    fn pose_reflects_last_message_only() {
        let mut store = TelemetryStore::new();
        let mut first = Odometry::at(Point3 { x: 1.0, y: 2.0, z: 3.0 });
        first.orientation = Quaternion::from_yaw(1.0);
        store.apply(Inbound::Odometry(first));
        store.apply(Inbound::Odometry(Odometry::at(Point3 { x: -4.0, y: 0.5, z: 0.0 })));
        assert_eq!(store.pose(), PoseEstimate { x: -4.0, y: 0.5, z: 0.0 });
    }

    #[test]
    fn pose_update_leaves_status_alone() {
        let mut store = TelemetryStore::new();
        store.apply(Inbound::Status(status("s")));
        let before = store.status().clone();
        store.apply(Inbound::Odometry(Odometry::at(Point3 { x: 1.0, y: 1.0, z: 1.0 })));
        assert_eq!(store.status(), &before);
    }
}
