//! Frame Buffer Console Library
//!
//! Renders a text-mode virtual console onto a pixel display. Character grid
//! operations come in through [`console::ConsoleSwitch`] and leave as
//! rectangle fills, area copies, bitmap blits and color map updates on a
//! [`display::DisplayBackend`].
//!
//! - `core`: Geometry, fonts, screen words, color maps
//! - `display`: Backend contract plus in-memory and recording backends
//! - `render`: Color resolution, glyph drawing, region operations
//! - `console`: The console adapter, cursor controller and blink ticker
//! - `app`: Configuration

pub mod app;
pub mod console;
pub mod core;
pub mod display;
pub mod render;

pub use app::Config;
pub use console::{ConsoleSwitch, FbConsole, StartupError, VirtualConsole};
pub use display::{DisplayBackend, DisplayRegistry};
