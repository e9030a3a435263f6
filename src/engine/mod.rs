//! The rendering engine: named viewports bound to elements of the window,
//! their camera and VOI state, and the events they publish.

pub mod camera;
pub mod events;
pub mod viewport;
pub mod voi;

use std::collections::BTreeMap;

use iced::Size;

pub use events::{ViewportEvent, ViewportObserver};
pub use viewport::{Slice, StackEntry, StackViewport};
pub use voi::VoiRange;

pub const ENGINE_ID: &str = "stackviewEngine";
pub const VIEWPORT_ID: &str = "mainViewport";

/// The area of the window a viewport draws into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportElement {
    pub size: Size,
}

impl ViewportElement {
    pub fn new(size: Size) -> Self {
        Self { size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportType {
    Stack,
}

#[derive(Debug, Clone)]
pub struct ViewportInput {
    pub viewport_id: String,
    pub element: ViewportElement,
    pub kind: ViewportType,
}

#[derive(Debug)]
pub struct RenderingEngine {
    id: String,
    viewports: BTreeMap<String, StackViewport>,
}

impl RenderingEngine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            viewports: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Binds a viewport to an element, replacing any viewport with the same id.
    pub fn enable_element(&mut self, input: ViewportInput) -> &mut StackViewport {
        let ViewportInput {
            viewport_id,
            element,
            kind: ViewportType::Stack,
        } = input;
        if self.viewports.remove(&viewport_id).is_some() {
            log::debug!("Replacing viewport `{viewport_id}`");
        }
        self.viewports
            .entry(viewport_id.clone())
            .or_insert_with(|| StackViewport::new(viewport_id, element.size))
    }

    pub fn disable_element(&mut self, viewport_id: &str) -> bool {
        self.viewports.remove(viewport_id).is_some()
    }

    pub fn viewport(&self, viewport_id: &str) -> Option<&StackViewport> {
        self.viewports.get(viewport_id)
    }

    pub fn viewport_mut(&mut self, viewport_id: &str) -> Option<&mut StackViewport> {
        self.viewports.get_mut(viewport_id)
    }

    pub fn viewports_mut(&mut self) -> impl Iterator<Item = &mut StackViewport> {
        self.viewports.values_mut()
    }

    /// Re-lays out every viewport for the new element size.
    pub fn resize(&mut self, element: Size) {
        for viewport in self.viewports_mut() {
            viewport.resize(element);
        }
    }
}

/// Collects size notifications for the viewport element. Only the newest
/// pending size is applied; intermediate ones are dropped.
#[derive(Debug, Default)]
pub struct ResizeObserver {
    pending: Option<Size>,
    layouts: u64,
}

impl ResizeObserver {
    pub fn notify(&mut self, size: Size) {
        self.pending = Some(size);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn layouts(&self) -> u64 {
        self.layouts
    }

    pub fn flush(&mut self, engine: &mut RenderingEngine) -> bool {
        let Some(size) = self.pending.take() else {
            return false;
        };
        engine.resize(size);
        self.layouts += 1;
        log::debug!("Viewport laid out at {}x{}", size.width, size.height);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_viewport() -> RenderingEngine {
        let mut engine = RenderingEngine::new(ENGINE_ID);
        engine.enable_element(ViewportInput {
            viewport_id: VIEWPORT_ID.to_string(),
            element: ViewportElement::new(Size::new(100.0, 100.0)),
            kind: ViewportType::Stack,
        });
        engine
    }

    #[test]
    fn enabling_the_same_viewport_twice_keeps_one() {
        let mut engine = engine_with_viewport();
        engine.enable_element(ViewportInput {
            viewport_id: VIEWPORT_ID.to_string(),
            element: ViewportElement::new(Size::new(50.0, 50.0)),
            kind: ViewportType::Stack,
        });

        assert_eq!(engine.viewports_mut().count(), 1);
        assert_eq!(
            engine.viewport(VIEWPORT_ID).map(StackViewport::element_size),
            Some(Size::new(50.0, 50.0))
        );
        assert!(engine.disable_element(VIEWPORT_ID));
        assert!(!engine.disable_element(VIEWPORT_ID));
    }

    #[test]
    fn resize_notifications_are_coalesced() {
        let mut engine = engine_with_viewport();
        let mut observer = ResizeObserver::default();

        observer.notify(Size::new(200.0, 100.0));
        observer.notify(Size::new(300.0, 150.0));
        observer.notify(Size::new(320.0, 240.0));

        assert!(observer.flush(&mut engine));
        assert!(!observer.flush(&mut engine));
        assert_eq!(observer.layouts(), 1);
        assert_eq!(
            engine.viewport(VIEWPORT_ID).map(StackViewport::element_size),
            Some(Size::new(320.0, 240.0))
        );
    }
}
