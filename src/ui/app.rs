//! # Console Application
//!
//! `eframe::App` hosting the [`ControlLoop`]. Every egui pass is one loop tick:
//! the whole canvas is rebuilt (immediate mode) inside a frameless central
//! panel, and the tick itself schedules the next repaint at the frame-rate cap.
//!
//! When the loop reports [`LoopState::Terminated`] the viewport is closed. A
//! close request coming from the window itself is seen by the loop first, so
//! both paths end the same way.

use eframe::egui;

use super::egui_surface::EguiSurface;
use crate::bus::Bus;
use crate::console::{ControlLoop, LoopState};

pub struct ConsoleApp<B: Bus> {
    control_loop: ControlLoop<B>,
    close_sent: bool,
}

impl<B: Bus> ConsoleApp<B> {
    pub fn new(control_loop: ControlLoop<B>) -> Self {
        Self {
            control_loop,
            close_sent: false,
        }
    }
}

impl<B: Bus> eframe::App for ConsoleApp<B> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut state = self.control_loop.state();
        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let mut surface = EguiSurface::new(ui);
            state = self.control_loop.tick(&mut surface);
        });

        if state == LoopState::Terminated && !self.close_sent {
            log::info!("Console stopped after {} ticks", self.control_loop.ticks());
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            self.close_sent = true;
        }
    }
}
