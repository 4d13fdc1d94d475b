use eframe::egui;
use embassy_executor::{Executor, Spawner};
use env_logger::Builder;
use log::{LevelFilter, error, info, warn};
use std::thread;

use crate::bus::link::DistanceBackend;
use crate::bus::{HttpDistanceService, LinkBus, RobotLinkEnds, RobotLinkQueues};
use crate::config::{ConsoleConfig, RobotConfig};
use crate::console::{CANVAS_HEIGHT, CANVAS_WIDTH, ControlLoop, FramePacer, ShutdownSignal};
use crate::ui::ConsoleApp;

mod bus;
mod config;
mod console;
mod robot;
mod ui;

fn embassy_init(spawner: Spawner, link: RobotLinkEnds, config: RobotConfig) {
    let _ = spawner.spawn(robot::robot_task(link, config));
}

fn load_config() -> ConsoleConfig {
    let Some(path) = ConsoleConfig::locate() else {
        info!("No config file found, using defaults");
        return ConsoleConfig::default();
    };
    match ConsoleConfig::load(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            error!("{:#}; using defaults", e);
            ConsoleConfig::default()
        }
    }
}

fn build_bus(queues: &'static RobotLinkQueues, config: &ConsoleConfig) -> LinkBus {
    let Some(remote) = config.remote_distance.clone() else {
        return LinkBus::new(queues);
    };
    let url = remote.url.clone();
    match HttpDistanceService::new(remote) {
        Ok(service) => {
            info!("Distance queries go to {}", url);
            LinkBus::with_distance_backend(queues, DistanceBackend::Http(service))
        }
        Err(e) => {
            warn!("Remote distance service unavailable ({}), using the robot link", e);
            LinkBus::new(queues)
        }
    }
}

fn main() {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("robot_teleop_console"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Starting up");

    let config = load_config();
    let queues = RobotLinkQueues::leak();
    let robot_link = queues.robot_ends();
    let robot_config = config.robot.clone();

    // Simulated robot runs on its own executor thread
    let embassy_handle = thread::Builder::new().name("robot-link".to_string()).spawn(move || {
        let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
        executor.run(|spawner| embassy_init(spawner, robot_link, robot_config));
    });
    if let Err(e) = embassy_handle {
        error!("Failed to start the robot link thread: {}", e);
        return;
    }

    let shutdown = ShutdownSignal::new();
    let control_loop = ControlLoop::new(
        build_bus(queues, &config),
        FramePacer::from_rate(config.console.frame_rate_hz),
        config.console.distance_timeout(),
        shutdown.clone(),
    );

    // The GUI owns the main thread (required on macOS)
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([CANVAS_WIDTH, CANVAS_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };
    let result = eframe::run_native(
        &config.console.window_title,
        native_options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let handler_shutdown = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || {
                info!("Interrupt received, shutting down");
                handler_shutdown.request();
                ctx.request_repaint();
            }) {
                warn!("Could not install Ctrl+C handler: {}", e);
            }
            Ok(Box::new(ConsoleApp::new(control_loop)))
        }),
    );

    match result {
        Ok(()) => info!("Console closed"),
        Err(e) => error!("Console window failed: {}", e),
    }
}
