//! Robot link over embassy channels.
//!
//! The robot side runs as an embassy task on the executor thread; the console
//! side is [`LinkBus`], used from the UI thread. All four queues are bounded.
//! Telemetry that does not fit is dropped by the producer, velocity commands
//! that do not fit are reported as backpressure, and the distance call blocks
//! the caller on the reply queue until a matching reply arrives or the timeout
//! expires. The timeout is measured on the std clock.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use futures::executor::block_on;
use std::thread;
use std::time::{Duration, Instant};

use super::{Bus, BusError, DistanceReply, DistanceRequest, DistanceResponse, HttpDistanceService, Inbound};
use crate::console::VelocityCommand;

/// Robot -> console telemetry. Sized for a few seconds of odometry at 50 Hz.
pub const TELEMETRY_QUEUE_SIZE: usize = 128;
pub type TelemetryQueue = Channel<CriticalSectionRawMutex, Inbound, TELEMETRY_QUEUE_SIZE>;
pub type TelemetryQueueReceiver = Receiver<'static, CriticalSectionRawMutex, Inbound, TELEMETRY_QUEUE_SIZE>;
pub type TelemetryQueueSender = Sender<'static, CriticalSectionRawMutex, Inbound, TELEMETRY_QUEUE_SIZE>;

/// Console -> robot velocity commands.
pub const COMMAND_QUEUE_SIZE: usize = 100;
pub type CommandQueue = Channel<CriticalSectionRawMutex, VelocityCommand, COMMAND_QUEUE_SIZE>;
pub type CommandQueueReceiver = Receiver<'static, CriticalSectionRawMutex, VelocityCommand, COMMAND_QUEUE_SIZE>;
pub type CommandQueueSender = Sender<'static, CriticalSectionRawMutex, VelocityCommand, COMMAND_QUEUE_SIZE>;

/// Distance requests and replies. Only one request is outstanding at a time,
/// the extra slots absorb requests left behind by timed-out calls.
pub const DISTANCE_QUEUE_SIZE: usize = 4;
/// How often a bounded distance call checks the reply queue.
const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub type DistanceRequestQueue = Channel<CriticalSectionRawMutex, DistanceRequest, DISTANCE_QUEUE_SIZE>;
pub type DistanceRequestQueueReceiver = Receiver<'static, CriticalSectionRawMutex, DistanceRequest, DISTANCE_QUEUE_SIZE>;
pub type DistanceRequestQueueSender = Sender<'static, CriticalSectionRawMutex, DistanceRequest, DISTANCE_QUEUE_SIZE>;
pub type DistanceReplyQueue = Channel<CriticalSectionRawMutex, DistanceReply, DISTANCE_QUEUE_SIZE>;
pub type DistanceReplyQueueReceiver = Receiver<'static, CriticalSectionRawMutex, DistanceReply, DISTANCE_QUEUE_SIZE>;
pub type DistanceReplyQueueSender = Sender<'static, CriticalSectionRawMutex, DistanceReply, DISTANCE_QUEUE_SIZE>;

/// The channels shared by both ends of the link.
pub struct RobotLinkQueues {
    telemetry: TelemetryQueue,
    commands: CommandQueue,
    distance_requests: DistanceRequestQueue,
    distance_replies: DistanceReplyQueue,
}

impl RobotLinkQueues {
    /// Allocate the queues for the lifetime of the process.
    pub fn leak() -> &'static Self {
        // The link lives as long as the process; embassy endpoints need 'static channels.
        Box::leak(Box::new(Self {
            telemetry: TelemetryQueue::new(),
            commands: CommandQueue::new(),
            distance_requests: DistanceRequestQueue::new(),
            distance_replies: DistanceReplyQueue::new(),
        }))
    }

    /// Endpoints used by the robot side.
    pub fn robot_ends(&'static self) -> RobotLinkEnds {
        RobotLinkEnds {
            telemetry_tx: self.telemetry.sender(),
            command_rx: self.commands.receiver(),
            distance_request_rx: self.distance_requests.receiver(),
            distance_reply_tx: self.distance_replies.sender(),
        }
    }
}

/// Robot-side endpoints of the link.
#[derive(Clone, Copy)]
pub struct RobotLinkEnds {
    pub telemetry_tx: TelemetryQueueSender,
    pub command_rx: CommandQueueReceiver,
    pub distance_request_rx: DistanceRequestQueueReceiver,
    pub distance_reply_tx: DistanceReplyQueueSender,
}

/// Where the distance query goes.
pub enum DistanceBackend {
    /// The robot link's own distance service.
    Link {
        request_tx: DistanceRequestQueueSender,
        reply_rx: DistanceReplyQueueReceiver,
        next_request_id: u32,
    },
    /// A remote distance tracker over HTTP.
    Http(HttpDistanceService),
}

/// Console-side [`Bus`] over the robot link.
pub struct LinkBus {
    telemetry_rx: TelemetryQueueReceiver,
    command_tx: CommandQueueSender,
    distance: DistanceBackend,
}

impl LinkBus {
    /// Bus whose distance query is answered by the robot link.
    pub fn new(queues: &'static RobotLinkQueues) -> Self {
        let distance = DistanceBackend::Link {
            request_tx: queues.distance_requests.sender(),
            reply_rx: queues.distance_replies.receiver(),
            next_request_id: 1,
        };
        Self::with_distance_backend(queues, distance)
    }

    pub fn with_distance_backend(queues: &'static RobotLinkQueues, distance: DistanceBackend) -> Self {
        Self {
            telemetry_rx: queues.telemetry.receiver(),
            command_tx: queues.commands.sender(),
            distance,
        }
    }
}

impl Bus for LinkBus {
    fn try_recv(&mut self) -> Option<Inbound> {
        self.telemetry_rx.try_receive().ok()
    }

    fn publish(&mut self, command: &VelocityCommand) -> Result<(), BusError> {
        self.command_tx.try_send(*command).map_err(|_| BusError::Backpressure)
    }

    fn call_distance(&mut self, timeout: Option<Duration>) -> Result<DistanceResponse, BusError> {
        match &mut self.distance {
            DistanceBackend::Http(service) => service.call(timeout),
            DistanceBackend::Link {
                request_tx,
                reply_rx,
                next_request_id,
            } => {
                let request_id = *next_request_id;
                *next_request_id = next_request_id.wrapping_add(1);
                call_over_link(*request_tx, *reply_rx, request_id, timeout)
            }
        }
    }
}

fn call_over_link(
    request_tx: DistanceRequestQueueSender,
    reply_rx: DistanceReplyQueueReceiver,
    request_id: u32,
    timeout: Option<Duration>,
) -> Result<DistanceResponse, BusError> {
    // Replies to earlier calls that timed out are of no use any more
    while let Ok(stale) = reply_rx.try_receive() {
        log::debug!("Discarding late distance reply #{}", stale.request_id);
    }

    request_tx.try_send(DistanceRequest { request_id }).map_err(|_| BusError::Backpressure)?;

    match timeout.and_then(|timeout| Instant::now().checked_add(timeout)) {
        Some(deadline) => wait_until(reply_rx, request_id, deadline),
        None => Ok(block_on(async {
            loop {
                let reply = reply_rx.receive().await;
                if reply.request_id == request_id {
                    return reply.response;
                }
                discard(&reply, request_id);
            }
        })),
    }
}

/// Poll the reply queue against a wall-clock deadline. embassy-time timers only
/// fire for wakers of the embassy executor, so they cannot bound a wait on this thread.
fn wait_until(reply_rx: DistanceReplyQueueReceiver, request_id: u32, deadline: Instant) -> Result<DistanceResponse, BusError> {
    loop {
        match reply_rx.try_receive() {
            Ok(reply) if reply.request_id == request_id => return Ok(reply.response),
            Ok(reply) => discard(&reply, request_id),
            Err(_) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(BusError::Timeout);
                }
                thread::sleep(REPLY_POLL_INTERVAL.min(deadline - now));
            }
        }
    }
}

fn discard(reply: &DistanceReply, request_id: u32) {
    log::debug!("Discarding distance reply #{} while waiting for #{}", reply.request_id, request_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Odometry, Point3};
    use std::thread;

    fn answer_next_request(ends: RobotLinkEnds, message: &'static str) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            block_on(async {
                let request = ends.distance_request_rx.receive().await;
                ends.distance_reply_tx
                    .send(DistanceReply {
                        request_id: request.request_id,
                        response: DistanceResponse {
                            success: true,
                            message: message.to_string(),
                        },
                    })
                    .await;
            });
        })
    }

    #[test]
    fn published_commands_reach_the_robot_in_order() {
        let queues = RobotLinkQueues::leak();
        let ends = queues.robot_ends();
        let mut bus = LinkBus::new(queues);

        bus.publish(&VelocityCommand { linear_x: 0.1, angular_z: 0.0 }).unwrap();
        bus.publish(&VelocityCommand { linear_x: 0.2, angular_z: -0.1 }).unwrap();

        assert_eq!(ends.command_rx.try_receive().unwrap().linear_x, 0.1);
        let second = ends.command_rx.try_receive().unwrap();
        assert_eq!(second, VelocityCommand { linear_x: 0.2, angular_z: -0.1 });
        assert!(ends.command_rx.try_receive().is_err());
    }

    #[test]
    fn publish_reports_backpressure_when_robot_stops_draining() {
        let queues = RobotLinkQueues::leak();
        let mut bus = LinkBus::new(queues);
        for _ in 0..COMMAND_QUEUE_SIZE {
            bus.publish(&VelocityCommand::default()).unwrap();
        }
        assert_eq!(bus.publish(&VelocityCommand::default()), Err(BusError::Backpressure));
    }

    #[test]
    fn telemetry_is_received_fifo_without_blocking() {
        let queues = RobotLinkQueues::leak();
        let ends = queues.robot_ends();
        let mut bus = LinkBus::new(queues);

        assert!(bus.try_recv().is_none());

        let first = Inbound::Odometry(Odometry::at(Point3 { x: 1.0, y: 0.0, z: 0.0 }));
        let second = Inbound::Odometry(Odometry::at(Point3 { x: 2.0, y: 0.0, z: 0.0 }));
        ends.telemetry_tx.try_send(first.clone()).unwrap();
        ends.telemetry_tx.try_send(second.clone()).unwrap();

        assert_eq!(bus.try_recv(), Some(first));
        assert_eq!(bus.try_recv(), Some(second));
        assert_eq!(bus.try_recv(), None);
    }

    #[test]
    fn distance_call_returns_the_reply_text() {
        let queues = RobotLinkQueues::leak();
        let responder = answer_next_request(queues.robot_ends(), "12.34");
        let mut bus = LinkBus::new(queues);

        let response = bus.call_distance(Some(Duration::from_secs(5))).unwrap();
        responder.join().unwrap();
        assert!(response.success);
        assert_eq!(response.message, "12.34");
    }

    #[test]
    fn stale_replies_are_not_mistaken_for_the_current_one() {
        let queues = RobotLinkQueues::leak();
        let ends = queues.robot_ends();
        ends.distance_reply_tx
            .try_send(DistanceReply {
                request_id: 999,
                response: DistanceResponse {
                    success: true,
                    message: "stale".to_string(),
                },
            })
            .unwrap();
        let responder = answer_next_request(ends, "fresh");
        let mut bus = LinkBus::new(queues);

        let response = bus.call_distance(Some(Duration::from_secs(5))).unwrap();
        responder.join().unwrap();
        assert_eq!(response.message, "fresh");
    }

    #[test]
    fn distance_call_times_out_when_nobody_answers() {
        let queues = RobotLinkQueues::leak();
        let mut bus = LinkBus::new(queues);

        let result = bus.call_distance(Some(Duration::from_millis(50)));
        assert_eq!(result, Err(BusError::Timeout));
    }

    #[test]
    fn mismatched_reply_during_the_wait_is_skipped() {
        let queues = RobotLinkQueues::leak();
        let ends = queues.robot_ends();
        let responder = thread::spawn(move || {
            block_on(async {
                let request = ends.distance_request_rx.receive().await;
                for (request_id, message) in [(request.request_id.wrapping_add(7), "wrong"), (request.request_id, "right")] {
                    ends.distance_reply_tx
                        .send(DistanceReply {
                            request_id,
                            response: DistanceResponse {
                                success: true,
                                message: message.to_string(),
                            },
                        })
                        .await;
                }
            });
        });
        let mut bus = LinkBus::new(queues);

        let response = bus.call_distance(Some(Duration::from_secs(5))).unwrap();
        responder.join().unwrap();
        assert_eq!(response.message, "right");
    }

    #[test]
    fn timed_out_call_leaves_the_link_usable() {
        let queues = RobotLinkQueues::leak();
        let ends = queues.robot_ends();
        let mut bus = LinkBus::new(queues);

        let started = Instant::now();
        assert_eq!(bus.call_distance(Some(Duration::from_millis(200))), Err(BusError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(200));

        // The unanswered request is still queued; answer the next one only.
        let missed = ends.distance_request_rx.try_receive().unwrap();
        let responder = answer_next_request(ends, "0.50");
        let response = bus.call_distance(Some(Duration::from_secs(5))).unwrap();
        responder.join().unwrap();
        assert_eq!(missed.request_id, 1);
        assert_eq!(response.message, "0.50");
    }
}
