use iced::{Point, Vector};

use super::annotation::{Annotation, AnnotationStore, Shape};
use super::{AnnotationTool, MouseBinding, ToolGroup, ToolKind};
use crate::engine::StackViewport;

/// Zoom factor per dragged pixel, as an exponent so that up and down cancel.
const ZOOM_PER_PIXEL: f32 = 0.01;

/// Pointer input in viewport element coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed {
        binding: MouseBinding,
        position: Point,
    },
    Moved {
        position: Point,
    },
    Released {
        position: Point,
    },
    /// Positive lines scroll up, towards the previous slice.
    Wheel {
        lines: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    tool: ToolKind,
    binding: MouseBinding,
    start: Point,
    last: Point,
}

/// Routes pointer input to tools. The tool is resolved once, when the button
/// goes down, and keeps the drag until release.
#[derive(Debug, Default)]
pub struct Interaction {
    drag: Option<Drag>,
}

impl Interaction {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_tool(&self) -> Option<ToolKind> {
        self.drag.map(|drag| drag.tool)
    }

    /// Rubber band of the annotation being drawn, in element coordinates.
    pub fn preview(&self) -> Option<(AnnotationTool, Point, Point)> {
        let drag = self.drag?;
        AnnotationTool::from_kind(drag.tool).map(|tool| (tool, drag.start, drag.last))
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }

    /// Returns whether anything visible changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        group: &ToolGroup,
        viewport: &mut StackViewport,
        annotations: &mut AnnotationStore,
    ) -> bool {
        match event {
            PointerEvent::Pressed { binding, position } => {
                if self.drag.is_some() {
                    return false;
                }
                let Some(tool) = group.active_tool_for(binding) else {
                    return false;
                };
                log::debug!("{tool} drag started on {binding:?}");
                self.drag = Some(Drag {
                    tool,
                    binding,
                    start: position,
                    last: position,
                });
                false
            }
            PointerEvent::Moved { position } => {
                let Some(drag) = self.drag.as_mut() else {
                    return false;
                };
                let delta = position - drag.last;
                drag.last = position;
                match drag.tool {
                    ToolKind::WindowLevel => viewport.adjust_window_level(delta),
                    ToolKind::Pan => viewport.pan(delta),
                    ToolKind::Zoom => viewport.zoom_by((-delta.y * ZOOM_PER_PIXEL).exp()),
                    _ => {}
                }
                delta != Vector::ZERO
            }
            PointerEvent::Released { position } => {
                let Some(drag) = self.drag.take() else {
                    return false;
                };
                log::debug!("{} drag released on {:?}", drag.tool, drag.binding);
                match AnnotationTool::from_kind(drag.tool) {
                    Some(tool) => commit(tool, drag.start, position, viewport, annotations),
                    None => false,
                }
            }
            PointerEvent::Wheel { lines } => {
                let scrolls = group.active_tool_for(MouseBinding::Wheel) == Some(ToolKind::StackScroll);
                if lines == 0.0 || !scrolls {
                    return false;
                }
                let before = viewport.current_image_index();
                viewport.scroll(if lines > 0.0 { -1 } else { 1 });
                viewport.current_image_index() != before
            }
        }
    }
}

fn commit(
    tool: AnnotationTool,
    start: Point,
    end: Point,
    viewport: &StackViewport,
    annotations: &mut AnnotationStore,
) -> bool {
    let (Some(image), Some(image_id)) = (viewport.current_image(), viewport.current_image_id())
    else {
        return false;
    };
    let camera = viewport.camera();
    let element = viewport.element_size();
    let start = camera.screen_to_image(start, image.size(), element);
    let end = camera.screen_to_image(end, image.size(), element);

    match Shape::from_drag(tool, start, end) {
        Some(shape) => {
            annotations.add(image_id.clone(), Annotation::new(shape, image));
            true
        }
        None => {
            log::debug!("Discarding {} without extent", tool.label());
            true
        }
    }
}
