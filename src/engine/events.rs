use super::voi::VoiRange;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    SliceScrolled { viewport_id: String, index: usize },
    VoiModified { viewport_id: String, range: VoiRange },
}

/// One-way binding from viewport state to whatever presents it.
pub trait ViewportObserver {
    fn on_slice_changed(&mut self, index: usize, total: usize);

    fn on_window_level_changed(&mut self, width: i64, level: i64);
}
