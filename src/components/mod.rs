pub mod segmented_toggle;

pub use segmented_toggle::{action_button, segmented_toggle};
