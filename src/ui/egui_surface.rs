//! # egui Render Surface
//!
//! [`RenderSurface`] on top of an egui `Ui`. Canvas coordinates are offset by
//! the top-left corner of the panel the surface was created in, so the fixed
//! 400x800 layout lands where it should regardless of window decorations.
//!
//! Shapes go straight to the `Ui` painter. Buttons are real egui widgets placed
//! with `Ui::put`, which gives hover/press feedback and reports `clicked()` only
//! in the frame the pointer is released over them.

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Vec2};
use std::time::Duration;

use crate::console::{CANVAS_HEIGHT, CANVAS_WIDTH, RenderSurface, Rgb};

const LABEL_FONT_SIZE: f32 = 14.0;
const LABEL_COLOR: Color32 = Color32::from_rgb(0xCE, 0xCE, 0xCE);
/// Font size of formatted text at scale 1.0.
const FORMATTED_BASE_SIZE: f32 = 32.0;
const BUTTON_SIZE: Vec2 = Vec2::new(64.0, 30.0);

fn color(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

pub struct EguiSurface<'a> {
    ui: &'a mut egui::Ui,
    origin: Pos2,
}

impl<'a> EguiSurface<'a> {
    pub fn new(ui: &'a mut egui::Ui) -> Self {
        let origin = ui.max_rect().min;
        Self { ui, origin }
    }

    fn at(&self, x: f32, y: f32) -> Pos2 {
        self.origin + Vec2::new(x, y)
    }
}

impl RenderSurface for EguiSurface<'_> {
    fn clear(&mut self, fill: Rgb) {
        let canvas = Rect::from_min_size(self.origin, Vec2::new(CANVAS_WIDTH, CANVAS_HEIGHT));
        self.ui.painter().rect_filled(canvas, 0.0, color(fill));
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
        let rect = Rect::from_min_size(self.at(x, y), Vec2::new(width, height));
        self.ui.painter().rect_filled(rect, 0.0, color(fill));
    }

    fn text(&mut self, x: f32, y: f32, text: &str) {
        let pos = self.at(x, y);
        self.ui
            .painter()
            .text(pos, Align2::LEFT_TOP, text, FontId::proportional(LABEL_FONT_SIZE), LABEL_COLOR);
    }

    fn formatted(&mut self, x: f32, y: f32, scale: f32, fill: Rgb, text: &str) {
        let pos = self.at(x, y);
        self.ui
            .painter()
            .text(pos, Align2::LEFT_TOP, text, FontId::proportional(FORMATTED_BASE_SIZE * scale), color(fill));
    }

    fn button(&mut self, x: f32, y: f32, label: &str) -> bool {
        let rect = Rect::from_min_size(self.at(x, y), BUTTON_SIZE);
        self.ui.put(rect, egui::Button::new(label)).clicked()
    }

    fn present(&mut self, interval: Duration) {
        // egui presents at the end of the pass; all that is left is pacing the next one.
        self.ui.ctx().request_repaint_after(interval);
    }

    fn close_requested(&self) -> bool {
        self.ui.ctx().input(|i| i.viewport().close_requested())
    }
}
