use crate::engine::voi::format_window_level;
use crate::engine::ViewportObserver;
use crate::utils::{format_person_name, PLACEHOLDER};

pub const WINDOW_LEVEL_HINT: &str = "— drag to adjust —";

/// What the info sidebar shows. Derived from viewport events and loads only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    /// 1-based.
    pub slice: Option<usize>,
    pub total: Option<usize>,
    pub window_level: Option<(i64, i64)>,
    pub patient_name: Option<String>,
}

impl DisplayInfo {
    /// A new stack opened on `initial_index` (0-based).
    pub fn stack_loaded(&mut self, initial_index: usize, total: usize, patient_name: Option<&str>) {
        self.slice = Some(initial_index + 1);
        self.total = Some(total);
        self.window_level = None;
        self.patient_name = patient_name
            .map(format_person_name)
            .filter(|name| !name.is_empty());
    }

    pub fn slice_label(&self) -> String {
        format!("{} / {}", label_or_placeholder(self.slice), label_or_placeholder(self.total))
    }

    pub fn window_level_label(&self) -> String {
        match self.window_level {
            Some((width, level)) => format_window_level(width, level),
            None => WINDOW_LEVEL_HINT.to_string(),
        }
    }

    pub fn patient_label(&self) -> &str {
        self.patient_name.as_deref().unwrap_or(PLACEHOLDER)
    }
}

impl ViewportObserver for DisplayInfo {
    fn on_slice_changed(&mut self, index: usize, total: usize) {
        self.slice = Some(index + 1);
        self.total = Some(total);
    }

    fn on_window_level_changed(&mut self, width: i64, level: i64) {
        self.window_level = Some((width, level));
    }
}

fn label_or_placeholder(value: Option<usize>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |value| value.to_string())
}
