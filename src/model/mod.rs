pub mod display_info;
pub mod tool_selection;

pub use display_info::DisplayInfo;
pub use tool_selection::ActiveTool;
