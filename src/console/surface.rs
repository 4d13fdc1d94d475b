//! Drawing seam between the control loop and the window toolkit.

use std::time::Duration;

/// Canvas size in logical pixels.
pub const CANVAS_WIDTH: f32 = 400.0;
pub const CANVAS_HEIGHT: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

/// Immediate-mode canvas. Coordinates are canvas-relative, origin top-left.
pub trait RenderSurface {
    /// Fill the whole canvas.
    fn clear(&mut self, fill: Rgb);

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb);

    /// Static label in the default style.
    fn text(&mut self, x: f32, y: f32, text: &str);

    /// Value text with an explicit scale and color.
    fn formatted(&mut self, x: f32, y: f32, scale: f32, color: Rgb, text: &str);

    /// Draw a button; true only in the frame in which it was activated.
    fn button(&mut self, x: f32, y: f32, label: &str) -> bool;

    /// Hand the frame to the display and schedule the next one no sooner than `interval`.
    fn present(&mut self, interval: Duration);

    /// Whether the window has been asked to close.
    fn close_requested(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_unpack_as_rgb() {
        assert_eq!(Rgb::from_hex(0x333333), Rgb::new(0x33, 0x33, 0x33));
        assert_eq!(Rgb::from_hex(0xff0000), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hex(0xffffff), Rgb::WHITE);
    }
}
