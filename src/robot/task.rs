//! Robot-side end of the link, run on the embassy executor.
//!
//! Velocity commands are taken as they arrive, so the command queue never backs
//! up however long the odometry period is. Each odometry period the task
//! advances the odometer under the newest command and publishes odometry; every
//! status period it also publishes the status record. Distance requests are
//! answered between ticks.
//!
//! Telemetry is sent with `try_send`: while the console is blocked in a
//! distance call it drains nothing, and the robot must keep serving that very
//! call instead of waiting for queue space.

use embassy_futures::select::{Either3, select3};
use embassy_time::{Duration, Instant, Ticker};

use super::kinematics::{Odometer, status_fields};
use crate::bus::{DistanceReply, DistanceRequest, DistanceResponse, Inbound, RobotLinkEnds, RobotStatus, link::TelemetryQueueSender};
use crate::config::RobotConfig;
use crate::console::VelocityCommand;

/// Simulated robot state, independent of the channels that feed it.
pub struct SimulatedRobot {
    config: RobotConfig,
    odometer: Odometer,
    command: VelocityCommand,
}

impl SimulatedRobot {
    pub fn new(config: RobotConfig) -> Self {
        let odometer = Odometer::new(config.odometry_noise_std);
        Self {
            config,
            odometer,
            command: VelocityCommand::default(),
        }
    }

    /// The newest command replaces the previous one; it holds until the next arrives.
    pub fn receive_command(&mut self, command: VelocityCommand) {
        self.command = command;
    }

    /// Advance by `dt` seconds under the current command.
    pub fn step(&mut self, dt: f64) -> Inbound {
        self.odometer.step(&self.command, dt);
        Inbound::Odometry(self.odometer.odometry())
    }

    pub fn status(&self) -> Inbound {
        Inbound::Status(RobotStatus {
            fields: status_fields(&self.config, chrono::Local::now()),
        })
    }

    /// Reply to a distance request, or `None` when the service is configured not to answer.
    pub fn answer(&self, request: DistanceRequest) -> Option<DistanceReply> {
        if !self.config.respond_to_distance {
            return None;
        }
        Some(DistanceReply {
            request_id: request.request_id,
            response: DistanceResponse {
                success: true,
                message: format!("{:.2}", self.odometer.distance_travelled()),
            },
        })
    }

    #[cfg(test)]
    fn command(&self) -> VelocityCommand {
        self.command
    }
}

fn publish(telemetry_tx: TelemetryQueueSender, message: Inbound) {
    if telemetry_tx.try_send(message).is_err() {
        log::trace!("Telemetry queue full, dropping message");
    }
}

#[embassy_executor::task]
pub async fn robot_task(link: RobotLinkEnds, config: RobotConfig) {
    let odometry_period = Duration::from_millis(config.odometry_period_ms);
    let status_period = Duration::from_millis(config.status_period_ms);
    let dt = odometry_period.as_micros() as f64 / 1_000_000.0;

    log::info!(
        "Simulated robot started (odometry every {} ms, status every {} ms)",
        config.odometry_period_ms,
        config.status_period_ms
    );

    let mut robot = SimulatedRobot::new(config);
    let mut ticker = Ticker::every(odometry_period);
    let mut next_status = Instant::now();

    loop {
        match select3(ticker.next(), link.distance_request_rx.receive(), link.command_rx.receive()).await {
            Either3::First(()) => {
                publish(link.telemetry_tx, robot.step(dt));

                if Instant::now() >= next_status {
                    publish(link.telemetry_tx, robot.status());
                    next_status += status_period;
                }
            }
            Either3::Second(request) => match robot.answer(request) {
                Some(reply) => {
                    log::debug!("Answering distance request #{}: {}", request.request_id, reply.response.message);
                    if link.distance_reply_tx.try_send(reply).is_err() {
                        log::warn!("Distance reply queue full, dropping reply #{}", request.request_id);
                    }
                }
                None => log::debug!("Ignoring distance request #{}", request.request_id),
            },
            Either3::Third(command) => robot.receive_command(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(linear_x: f64, angular_z: f64) -> VelocityCommand {
        VelocityCommand { linear_x, angular_z }
    }

    #[test]
    fn newest_command_drives_the_robot() {
        let mut robot = SimulatedRobot::new(RobotConfig::default());
        for received in [command(0.1, 0.0), command(0.3, 0.0), command(1.0, 0.0)] {
            robot.receive_command(received);
        }
        assert_eq!(robot.command(), command(1.0, 0.0));

        match robot.step(0.5) {
            Inbound::Odometry(odometry) => assert!((odometry.position.x - 0.5).abs() < 1e-9),
            other => panic!("expected odometry, got {:?}", other),
        }
    }

    #[test]
    fn last_command_is_held_when_none_arrive() {
        let mut robot = SimulatedRobot::new(RobotConfig::default());
        robot.receive_command(command(0.2, 0.0));
        robot.step(1.0);
        robot.step(1.0);
        let reply = robot.answer(DistanceRequest { request_id: 7 }).unwrap();
        assert_eq!(reply.request_id, 7);
        assert!(reply.response.success);
        assert_eq!(reply.response.message, "0.40");
    }

    #[test]
    fn distance_service_can_be_silenced() {
        let config = RobotConfig {
            respond_to_distance: false,
            ..RobotConfig::default()
        };
        let robot = SimulatedRobot::new(config);
        assert!(robot.answer(DistanceRequest { request_id: 1 }).is_none());
    }

    #[test]
    fn status_has_six_fields() {
        let robot = SimulatedRobot::new(RobotConfig::default());
        match robot.status() {
            Inbound::Status(status) => {
                assert_eq!(status.fields.len(), 6);
                assert!(status.fields[1].starts_with("serial_number: "));
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn robot_keeps_up_with_commands_between_slow_ticks() {
        use crate::bus::link::COMMAND_QUEUE_SIZE;
        use crate::bus::{Bus, LinkBus, RobotLinkQueues};
        use embassy_executor::Executor;
        use std::thread;

        let queues = RobotLinkQueues::leak();
        let link = queues.robot_ends();
        let config = RobotConfig {
            odometry_period_ms: 60_000,
            ..RobotConfig::default()
        };
        thread::spawn(move || {
            let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
            executor.run(|spawner| {
                let _ = spawner.spawn(robot_task(link, config));
            });
        });

        let mut bus = LinkBus::new(queues);
        for i in 0..COMMAND_QUEUE_SIZE * 3 {
            let command = command(i as f64 * 0.001, 0.0);
            assert_eq!(bus.publish(&command), Ok(()), "command {} rejected", i);
            thread::sleep(std::time::Duration::from_millis(1));
        }

        let response = bus.call_distance(Some(std::time::Duration::from_secs(5))).unwrap();
        assert_eq!(response.message, "0.00");
    }
}
