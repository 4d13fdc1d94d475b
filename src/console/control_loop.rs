//! # Control Loop
//!
//! The single loop that drives the console. Each call to [`ControlLoop::tick`]
//! runs one iteration in a fixed order:
//!
//! 1. Drain every inbound message the bus has buffered (non-blocking)
//! 2. Clear the canvas
//! 3. Draw the panels with the current telemetry, command and distance readout
//! 4. Poll the buttons, apply drive transitions, run the distance query on "Call"
//! 5. Publish the velocity command, whether or not it changed
//! 6. Present the frame and schedule the next one at the frame-rate cap
//!
//! All state is owned by the loop and only touched from the thread calling
//! `tick`. The distance query blocks that thread: while it runs nothing is
//! drawn, drained or published.
//!
//! The loop ends when the window reports a close request or the process-wide
//! [`ShutdownSignal`] is raised.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::command::{Control, ControlEdges, VelocityCommand};
use super::distance::DistanceReadout;
use super::surface::{RenderSurface, Rgb};
use super::telemetry::TelemetryStore;
use crate::bus::Bus;

pub const BACKGROUND: Rgb = Rgb::new(49, 52, 49);
pub const PANEL: Rgb = Rgb::from_hex(0x333333);
const VELOCITY_TEXT: Rgb = Rgb::from_hex(0xff0000);

/// Label of the button that triggers the distance query.
pub const CALL_LABEL: &str = "Call";

/// Drive buttons and their top-left corners, arranged as a cross around Stop.
const DRIVE_BUTTONS: [(Control, f32, f32); 5] = [
    (Control::Forward, 150.0, 190.0),
    (Control::Left, 80.0, 250.0),
    (Control::Stop, 150.0, 250.0),
    (Control::Right, 220.0, 250.0),
    (Control::Backward, 150.0, 310.0),
];
const CALL_BUTTON: (f32, f32) = (40.0, 570.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Shutdown request shared between the loop and whoever hosts it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frame-rate cap. Also the only brake on how fast inbound telemetry is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePacer {
    interval: Duration,
}

impl FramePacer {
    pub fn from_rate(frame_rate_hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / frame_rate_hz.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Console state plus the bus it talks through.
pub struct ControlLoop<B: Bus> {
    bus: B,
    telemetry: TelemetryStore,
    command: VelocityCommand,
    distance: DistanceReadout,
    state: LoopState,
    shutdown: ShutdownSignal,
    pacer: FramePacer,
    distance_timeout: Option<Duration>,
    /// Set while publishing keeps failing, so the failure is logged once per streak.
    publish_failing: bool,
    ticks: u64,
}

impl<B: Bus> ControlLoop<B> {
    pub fn new(bus: B, pacer: FramePacer, distance_timeout: Option<Duration>, shutdown: ShutdownSignal) -> Self {
        Self {
            bus,
            telemetry: TelemetryStore::new(),
            command: VelocityCommand::default(),
            distance: DistanceReadout::default(),
            state: LoopState::Running,
            shutdown,
            pacer,
            distance_timeout,
            publish_failing: false,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    #[cfg(test)]
    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    #[cfg(test)]
    pub fn command(&self) -> VelocityCommand {
        self.command
    }

    #[cfg(test)]
    pub fn distance(&self) -> &DistanceReadout {
        &self.distance
    }

    #[cfg(test)]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Number of completed iterations.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one iteration. Does nothing once the loop has terminated.
    pub fn tick(&mut self, surface: &mut impl RenderSurface) -> LoopState {
        if self.state == LoopState::Terminated {
            return self.state;
        }
        if self.check_termination(&*surface) {
            return self.state;
        }

        self.drain_inbound();

        surface.clear(BACKGROUND);
        self.draw(surface);

        let edges = poll_controls(surface);
        self.command.apply_edges(&edges);
        if edges.call {
            self.distance.query(&mut self.bus, self.distance_timeout);
        }

        self.publish();

        surface.present(self.pacer.interval());
        self.ticks += 1;

        self.check_termination(&*surface);
        self.state
    }

    fn check_termination(&mut self, surface: &impl RenderSurface) -> bool {
        let reason = if self.shutdown.is_requested() {
            "shutdown requested"
        } else if surface.close_requested() {
            "window closed"
        } else {
            return false;
        };
        log::info!("Control loop terminated after {} ticks: {}", self.ticks, reason);
        self.state = LoopState::Terminated;
        true
    }

    fn drain_inbound(&mut self) {
        while let Some(message) = self.bus.try_recv() {
            self.telemetry.apply(message);
        }
    }

    fn publish(&mut self) {
        match self.bus.publish(&self.command) {
            Ok(()) => {
                if self.publish_failing {
                    log::info!("Velocity command publishing recovered");
                    self.publish_failing = false;
                }
            }
            Err(e) => {
                if !self.publish_failing {
                    log::warn!("Failed to publish velocity command: {}", e);
                    self.publish_failing = true;
                }
            }
        }
    }

    fn draw(&self, surface: &mut impl RenderSurface) {
        // Info
        surface.text(30.0, 20.0, "Info");
        surface.rect(30.0, 40.0, 340.0, 130.0, PANEL);
        for (i, field) in self.telemetry.status().iter().enumerate() {
            surface.formatted(40.0, 60.0 + i as f32 * 20.0, 0.4, Rgb::WHITE, field);
        }

        // Velocity
        surface.rect(30.0, 350.0, 340.0, 60.0, PANEL);
        surface.text(40.0, 360.0, "Linear velocity:");
        surface.text(200.0, 360.0, "Angular velocity:");
        surface.formatted(40.0, 380.0, 0.5, VELOCITY_TEXT, &format!("{:.2} m/sec", self.command.linear_x));
        surface.formatted(200.0, 380.0, 0.5, VELOCITY_TEXT, &format!("{:.2} rad/sec", self.command.angular_z));

        // Odometry
        let pose = self.telemetry.pose();
        surface.text(30.0, 420.0, "Estimated robot position based off odometry");
        surface.rect(30.0, 440.0, 340.0, 60.0, PANEL);
        for (x, axis, value) in [(50.0, "X", pose.x), (150.0, "Y", pose.y), (250.0, "Z", pose.z)] {
            surface.text(x, 460.0, axis);
            surface.formatted(x, 480.0, 0.6, Rgb::WHITE, &format!("{:.2}", value));
        }

        // Distance
        surface.text(30.0, 520.0, "Distance Travelled");
        surface.rect(30.0, 540.0, 340.0, 80.0, PANEL);
        surface.formatted(200.0, 570.0, 0.7, Rgb::WHITE, self.distance.text());
    }
}

/// Draw every button and collect this frame's edges. All buttons are drawn even when one fires.
fn poll_controls(surface: &mut impl RenderSurface) -> ControlEdges {
    let mut edges = ControlEdges::default();
    for (control, x, y) in DRIVE_BUTTONS {
        let fired = surface.button(x, y, control.label());
        edges.set(control, fired);
    }
    edges.call = surface.button(CALL_BUTTON.0, CALL_BUTTON.1, CALL_LABEL);
    edges
}
