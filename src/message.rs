use std::path::PathBuf;

use iced::Size;

use crate::loader::LoadedStack;
use crate::tools::interaction::PointerEvent;
use crate::tools::{AnnotationTool, NavigationTool};

#[derive(Debug, Clone)]
pub enum Message {
    Initialise,
    PickFiles,
    FilesPicked(Option<Vec<PathBuf>>),
    FilesLoaded(LoadedStack),
    SampleLoaded(Option<LoadedStack>),
    SelectNavigation(NavigationTool),
    SelectDrawing(AnnotationTool),
    ResetView,
    Pointer(PointerEvent),
    ScrollSlices(i32),
    WindowResized(Size),
    FrameTick,
}
