// egui front end of the console
//
// - `egui_surface`: `RenderSurface` drawn with the egui painter and widgets
// - `app`: `eframe::App` that ticks the control loop once per frame

pub mod app;
pub mod egui_surface;

pub use app::ConsoleApp;
