pub mod image_viewer;
pub mod info_panel;
pub mod overlay;
pub mod toolbar;

pub use image_viewer::viewport_panel;
pub use info_panel::info_panel;
pub use toolbar::{header, status_bar, toolbar};

use iced::Size;

pub const HEADER_HEIGHT: f32 = 56.0;
pub const TOOLBAR_HEIGHT: f32 = 48.0;
pub const STATUS_BAR_HEIGHT: f32 = 30.0;
pub const SIDEBAR_WIDTH: f32 = 260.0;
pub const SPACING: f32 = 16.0;

/// Size left for the viewport element once the fixed chrome around it is
/// laid out in a window of `window` logical pixels.
pub fn viewport_element_size(window: Size) -> Size {
    let width = window.width - SIDEBAR_WIDTH - 3.0 * SPACING;
    let height = window.height - HEADER_HEIGHT - TOOLBAR_HEIGHT - STATUS_BAR_HEIGHT - 2.0 * SPACING;
    Size::new(width.floor().max(1.0), height.floor().max(1.0))
}
