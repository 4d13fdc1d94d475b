// Simulated robot on the far end of the link.
//
// - `kinematics`: odometer and status record
// - `task`: embassy task serving telemetry, commands and distance requests

pub mod kinematics;
pub mod task;

pub use task::robot_task;
