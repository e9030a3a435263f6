use std::sync::Arc;

use iced::widget::image::Handle;
use iced::{Size, Vector};

use super::camera::Camera;
use super::events::ViewportEvent;
use super::voi::VoiRange;
use crate::image_pipeline::{FrameImagePipeline, StackImage};
use crate::loader::ImageId;

/// Window/level change per dragged screen pixel.
pub const DEFAULT_WINDOW_LEVEL_SENSITIVITY: f64 = 4.0;

/// A decoded slice, or the reason it could not be decoded.
pub type Slice = Result<Arc<StackImage>, String>;

#[derive(Debug, Clone)]
pub struct StackEntry {
    pub image_id: ImageId,
    pub slice: Slice,
}

#[derive(Debug)]
pub struct StackViewport {
    id: String,
    element: Size,
    stack: Vec<StackEntry>,
    current: usize,
    camera: Camera,
    voi: Option<VoiRange>,
    frame: Option<Handle>,
    events: Vec<ViewportEvent>,
    window_level_sensitivity: f64,
}

impl StackViewport {
    pub fn new(id: impl Into<String>, element: Size) -> Self {
        Self {
            id: id.into(),
            element,
            stack: Vec::new(),
            current: 0,
            camera: Camera::default(),
            voi: None,
            frame: None,
            events: Vec::new(),
            window_level_sensitivity: DEFAULT_WINDOW_LEVEL_SENSITIVITY,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_window_level_sensitivity(&mut self, sensitivity: f64) {
        if sensitivity.is_finite() && sensitivity > 0.0 {
            self.window_level_sensitivity = sensitivity;
        }
    }

    /// Replaces the whole stack and shows `initial_index` first.
    pub fn set_stack(&mut self, stack: Vec<StackEntry>, initial_index: usize) {
        self.current = initial_index.min(stack.len().saturating_sub(1));
        self.stack = stack;
        self.voi = None;
        self.camera = Camera::default();

        if let Some(image) = self.current_image().cloned() {
            self.camera = Camera::fitted(image.size());
            self.set_voi(image.default_voi);
        }
        self.render();
    }

    pub fn image_ids(&self) -> impl Iterator<Item = &ImageId> {
        self.stack.iter().map(|entry| &entry.image_id)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn current_image_index(&self) -> usize {
        self.current
    }

    pub fn current_image_id(&self) -> Option<&ImageId> {
        self.stack.get(self.current).map(|entry| &entry.image_id)
    }

    pub fn current_slice(&self) -> Option<&Slice> {
        self.stack.get(self.current).map(|entry| &entry.slice)
    }

    pub fn current_image(&self) -> Option<&Arc<StackImage>> {
        self.current_slice().and_then(|slice| slice.as_ref().ok())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn voi(&self) -> Option<VoiRange> {
        self.voi
    }

    pub fn element_size(&self) -> Size {
        self.element
    }

    pub fn frame(&self) -> Option<&Handle> {
        self.frame.as_ref()
    }

    /// Moves through the stack without wrapping around either end.
    pub fn scroll(&mut self, delta: i32) {
        if self.stack.is_empty() || delta == 0 {
            return;
        }
        let last = self.stack.len() as i64 - 1;
        let target = (self.current as i64 + i64::from(delta)).clamp(0, last) as usize;
        self.set_image_index(target);
    }

    pub fn set_image_index(&mut self, index: usize) {
        if index >= self.stack.len() || index == self.current {
            return;
        }
        self.current = index;
        if self.voi.is_none() {
            if let Some(image) = self.current_image().cloned() {
                self.camera = Camera::fitted(image.size());
                self.set_voi(image.default_voi);
            }
        }
        self.events.push(ViewportEvent::SliceScrolled {
            viewport_id: self.id.clone(),
            index,
        });
        self.render();
    }

    /// Horizontal drag widens the window, vertical drag moves its centre.
    pub fn adjust_window_level(&mut self, delta: Vector) {
        let Some(voi) = self.voi else {
            return;
        };
        let width = (voi.width() + f64::from(delta.x) * self.window_level_sensitivity).max(1.0);
        let center = voi.center() + f64::from(delta.y) * self.window_level_sensitivity;
        self.set_voi(VoiRange::from_window(width, center));
        self.render();
    }

    pub fn set_voi(&mut self, range: VoiRange) {
        self.voi = Some(range);
        self.events.push(ViewportEvent::VoiModified {
            viewport_id: self.id.clone(),
            range,
        });
    }

    pub fn pan(&mut self, screen_delta: Vector) {
        let Some(image) = self.current_image().map(|image| image.size()) else {
            return;
        };
        self.camera.pan(screen_delta, image, self.element);
        self.render();
    }

    pub fn zoom_by(&mut self, factor: f32) {
        if self.current_image().is_none() {
            return;
        }
        self.camera.zoom_by(factor);
        self.render();
    }

    pub fn reset_camera(&mut self) {
        if let Some(image) = self.current_image().map(|image| image.size()) {
            self.camera = Camera::fitted(image);
        }
        self.render();
    }

    /// Re-lays the rendering surface out for a new element size; camera and
    /// VOI are kept and no pixel data is fetched again.
    pub fn resize(&mut self, element: Size) {
        if element == self.element {
            return;
        }
        self.element = element;
        self.render();
    }

    pub fn render(&mut self) {
        self.frame = match (self.current_image(), self.voi) {
            (Some(image), Some(voi)) => {
                FrameImagePipeline::render(image, voi, &self.camera, self.element)
            }
            _ => None,
        };
    }

    pub fn drain_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_stack(count: usize) -> Vec<StackEntry> {
        (0..count)
            .map(|index| StackEntry {
                image_id: ImageId::new(format!("dicomfile:{index}")),
                slice: Ok(Arc::new(StackImage::gray(
                    2,
                    2,
                    vec![0.0, 100.0, 200.0, index as f32],
                ))),
            })
            .collect()
    }

    fn viewport() -> StackViewport {
        StackViewport::new("main", Size::new(64.0, 64.0))
    }

    #[test]
    fn set_stack_opens_on_requested_slice_and_reports_voi() {
        let mut viewport = viewport();

        viewport.set_stack(gray_stack(5), 2);

        assert_eq!(viewport.current_image_index(), 2);
        assert!(viewport.frame().is_some());
        assert_eq!(
            viewport.drain_events(),
            vec![ViewportEvent::VoiModified {
                viewport_id: "main".to_string(),
                range: VoiRange::new(0.0, 200.0),
            }]
        );
    }

    #[test]
    fn set_stack_clamps_out_of_range_index() {
        let mut viewport = viewport();

        viewport.set_stack(gray_stack(3), 10);

        assert_eq!(viewport.current_image_index(), 2);
    }

    #[test]
    fn scroll_stops_at_stack_ends() {
        let mut viewport = viewport();
        viewport.set_stack(gray_stack(3), 1);
        viewport.drain_events();

        viewport.scroll(5);
        viewport.scroll(1);
        viewport.scroll(-1);
        viewport.scroll(-9);

        let indices: Vec<usize> = viewport
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                ViewportEvent::SliceScrolled { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![2, 1, 0]);
    }

    #[test]
    fn scroll_keeps_the_user_window() {
        let mut viewport = viewport();
        viewport.set_stack(gray_stack(3), 0);
        viewport.adjust_window_level(Vector::new(10.0, -5.0));
        let adjusted = viewport.voi();

        viewport.scroll(1);

        assert_eq!(viewport.voi(), adjusted);
    }

    #[test]
    fn window_level_drag_scales_by_sensitivity() {
        let mut viewport = viewport();
        viewport.set_stack(gray_stack(1), 0);
        viewport.drain_events();

        viewport.adjust_window_level(Vector::new(10.0, -5.0));

        let voi = viewport.voi().expect("voi is set");
        assert_eq!(voi.window_level(), (240, 80));
        assert_eq!(viewport.drain_events().len(), 1);
    }

    #[test]
    fn window_never_collapses() {
        let mut viewport = viewport();
        viewport.set_stack(gray_stack(1), 0);

        viewport.adjust_window_level(Vector::new(-10_000.0, 0.0));

        assert_eq!(viewport.voi().expect("voi is set").window_level().0, 1);
    }

    #[test]
    fn resize_keeps_camera_and_voi() {
        let mut viewport = viewport();
        viewport.set_stack(gray_stack(2), 0);
        viewport.zoom_by(2.0);
        let camera = *viewport.camera();
        let voi = viewport.voi();

        viewport.resize(Size::new(128.0, 32.0));

        assert_eq!(viewport.element_size(), Size::new(128.0, 32.0));
        assert_eq!(*viewport.camera(), camera);
        assert_eq!(viewport.voi(), voi);
        assert!(viewport.frame().is_some());
    }

    #[test]
    fn failed_slices_render_nothing() {
        let mut viewport = viewport();
        viewport.set_stack(
            vec![StackEntry {
                image_id: ImageId::new("dicomfile:0"),
                slice: Err("broken".to_string()),
            }],
            0,
        );

        assert!(viewport.frame().is_none());
        assert!(viewport.voi().is_none());
        assert!(viewport.drain_events().is_empty());
    }
}
