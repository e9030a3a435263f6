use crate::tools::{AnnotationTool, NavigationTool};

/// The tool highlighted in the toolbar: the one picked last, from either family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTool {
    Navigation(NavigationTool),
    Annotation(AnnotationTool),
}

impl Default for ActiveTool {
    fn default() -> Self {
        ActiveTool::Navigation(NavigationTool::WindowLevel)
    }
}
