//! Bus adapter between the console and the robot.
//!
//! The console only sees the [`Bus`] trait: a non-blocking inbound stream of
//! telemetry, an outbound velocity publish, and one blocking request/response
//! call. Two backends exist:
//!
//! - `link`: embassy channels to the robot link running on the executor thread
//! - `http_distance`: a remote distance tracker reached over HTTP, used in place
//!   of the link's distance service when configured

pub mod http_distance;
pub mod link;
pub mod messages;

use std::fmt;
use std::time::Duration;

use crate::console::VelocityCommand;

pub use http_distance::HttpDistanceService;
pub use link::{LinkBus, RobotLinkEnds, RobotLinkQueues};
pub use messages::{DistanceReply, DistanceRequest, DistanceResponse, Inbound, Odometry, Point3, Quaternion, RobotStatus, STATUS_FIELD_COUNT};

/// Failures reported by a bus backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The other end is gone or not serving requests.
    Disconnected,
    /// An outbound queue is full.
    Backpressure,
    /// No reply arrived within the allowed time.
    Timeout,
    /// Backend-specific failure (HTTP status, decoding error, ...).
    Transport(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Disconnected => write!(f, "bus peer disconnected"),
            BusError::Backpressure => write!(f, "outbound queue full"),
            BusError::Timeout => write!(f, "request timed out"),
            BusError::Transport(detail) => write!(f, "transport error: {}", detail),
        }
    }
}

impl std::error::Error for BusError {}

/// Transport seen by the control loop.
pub trait Bus {
    /// Next buffered inbound message, without blocking.
    fn try_recv(&mut self) -> Option<Inbound>;

    /// Publish the current velocity command.
    fn publish(&mut self, command: &VelocityCommand) -> Result<(), BusError>;

    /// Blocking call to the distance service. `None` waits as long as the backend allows.
    fn call_distance(&mut self, timeout: Option<Duration>) -> Result<DistanceResponse, BusError>;
}
