pub mod formatting;

pub use formatting::{attribute_text, format_measurement, format_person_name, plural, PLACEHOLDER};
