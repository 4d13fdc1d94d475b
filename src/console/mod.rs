// Console core: the state the operator sees and edits, and the loop that ties it to the bus.
//
// - `command`: velocity command and the drive-button transitions
// - `telemetry`: latest status fields and pose
// - `distance`: distance-travelled readout and its query
// - `surface`: drawing seam implemented by the window toolkit
// - `control_loop`: per-tick orchestration

pub mod command;
pub mod control_loop;
pub mod distance;
pub mod surface;
pub mod telemetry;

pub use command::VelocityCommand;
pub use control_loop::{ControlLoop, FramePacer, LoopState, ShutdownSignal};
pub use surface::{CANVAS_HEIGHT, CANVAS_WIDTH, RenderSurface, Rgb};
