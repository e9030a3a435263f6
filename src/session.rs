//! The state of the one study on screen: the initialised library, the engine
//! and its viewport, the tool group, the loaded image identifiers and the
//! annotations drawn on them.

use std::path::PathBuf;

use iced::Size;

use crate::bootstrap::{Bootstrap, Subsystems};
use crate::engine::viewport::DEFAULT_WINDOW_LEVEL_SENSITIVITY;
use crate::engine::{
    RenderingEngine, ResizeObserver, StackViewport, ViewportElement, ViewportEvent,
    ViewportInput, ViewportObserver, ViewportType, ENGINE_ID, VIEWPORT_ID,
};
use crate::error::{BootstrapError, LoadError, ToolError};
use crate::loader::{ImageId, ImageSourceLoader, LoadedStack, StackRequest};
use crate::tools::annotation::{Annotation, AnnotationStore};
use crate::tools::interaction::{Interaction, PointerEvent};
use crate::tools::{self, AnnotationTool, NavigationTool, ToolGroup, ToolRegistry};

#[derive(Debug)]
pub struct Session {
    bootstrap: Bootstrap,
    registry: ToolRegistry,
    engine: Option<RenderingEngine>,
    tool_group: Option<ToolGroup>,
    loader: ImageSourceLoader,
    annotations: AnnotationStore,
    interaction: Interaction,
    resize: Option<ResizeObserver>,
    window_level_sensitivity: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_LEVEL_SENSITIVITY)
    }
}

impl Session {
    pub fn new(window_level_sensitivity: f64) -> Self {
        Self {
            bootstrap: Bootstrap::default(),
            registry: ToolRegistry::default(),
            engine: None,
            tool_group: None,
            loader: ImageSourceLoader::default(),
            annotations: AnnotationStore::default(),
            interaction: Interaction::default(),
            resize: None,
            window_level_sensitivity,
        }
    }

    pub fn initialize<S: Subsystems>(&mut self, subsystems: &mut S) -> Result<(), BootstrapError> {
        self.bootstrap.initialize(subsystems)
    }

    /// Destroys any previous engine, then binds a fresh stack viewport to `element`.
    pub fn create_viewport(&mut self, element: ViewportElement) -> Result<(), BootstrapError> {
        if !self.bootstrap.is_initialized() {
            return Err(BootstrapError::Viewport(
                "the library has not been initialised".to_string(),
            ));
        }
        if let Some(mut previous) = self.engine.take() {
            previous.disable_element(VIEWPORT_ID);
            log::debug!("Destroyed previous rendering engine `{}`", previous.id());
        }

        let mut engine = RenderingEngine::new(ENGINE_ID);
        let viewport = engine.enable_element(ViewportInput {
            viewport_id: VIEWPORT_ID.to_string(),
            element,
            kind: ViewportType::Stack,
        });
        viewport.set_window_level_sensitivity(self.window_level_sensitivity);
        log::info!(
            "Viewport `{VIEWPORT_ID}` created at {}x{}",
            element.size.width,
            element.size.height
        );
        self.engine = Some(engine);
        Ok(())
    }

    /// Destroys any previous tool group, then wires every tool to the viewport.
    pub fn register_tools(&mut self) -> Result<(), BootstrapError> {
        if self.viewport().is_none() {
            return Err(BootstrapError::Tools(
                "there is no viewport to bind tools to".to_string(),
            ));
        }
        if let Some(previous) = self.tool_group.take() {
            log::debug!("Destroyed previous tool group `{}`", previous.id());
        }
        self.tool_group = Some(tools::register_tools(
            &mut self.registry,
            VIEWPORT_ID,
            ENGINE_ID,
        )?);
        Ok(())
    }

    /// Bootstrap, viewport, tools and resize observation, in that order. Any
    /// failure leaves the session torn down and not ready.
    pub fn start<S: Subsystems>(
        &mut self,
        subsystems: &mut S,
        element: ViewportElement,
    ) -> Result<(), BootstrapError> {
        let started = self
            .initialize(subsystems)
            .and_then(|()| self.create_viewport(element))
            .and_then(|()| self.register_tools());
        match started {
            Ok(()) => {
                self.observe_resize();
                Ok(())
            }
            Err(err) => {
                self.teardown();
                Err(err)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.bootstrap.is_initialized() && self.viewport().is_some() && self.tool_group.is_some()
    }

    pub fn viewport(&self) -> Option<&StackViewport> {
        self.engine.as_ref()?.viewport(VIEWPORT_ID)
    }

    fn viewport_mut(&mut self) -> Option<&mut StackViewport> {
        self.engine.as_mut()?.viewport_mut(VIEWPORT_ID)
    }

    pub fn tool_group(&self) -> Option<&ToolGroup> {
        self.tool_group.as_ref()
    }

    pub fn image_ids(&self) -> &[ImageId] {
        self.loader.image_ids()
    }

    pub fn select_navigation_tool(&mut self, tool: NavigationTool) -> Result<(), ToolError> {
        let group = self.tool_group.as_mut().ok_or(ToolError::NoToolGroup)?;
        tools::select_navigation_tool(group, tool)
    }

    pub fn select_drawing_tool(&mut self, tool: AnnotationTool) -> Result<(), ToolError> {
        let group = self.tool_group.as_mut().ok_or(ToolError::NoToolGroup)?;
        tools::select_drawing_tool(group, tool)
    }

    pub fn load_from_files(&mut self, paths: &[PathBuf]) -> Option<StackRequest> {
        self.loader.load_from_files(paths)
    }

    /// Replaces the image identifiers and the viewport stack wholesale. A stack
    /// without a single decodable image replaces nothing.
    pub fn apply_stack(&mut self, loaded: LoadedStack) -> Result<usize, LoadError> {
        if self.viewport().is_none() {
            return Err(LoadError::NoViewport);
        }
        if !loaded.entries.iter().any(|entry| entry.slice.is_ok()) {
            let first = loaded
                .entries
                .iter()
                .find_map(|entry| entry.slice.as_ref().err().cloned())
                .unwrap_or_else(|| "no images".to_string());
            return Err(LoadError::Undecodable {
                count: loaded.len(),
                first,
            });
        }

        let count = loaded.len();
        let failed = loaded.entries.iter().filter(|entry| entry.slice.is_err()).count();
        if failed > 0 {
            log::warn!("{failed} of {count} image(s) could not be decoded");
        }

        let LoadedStack {
            entries,
            initial_index,
        } = loaded;
        self.loader
            .replace_image_ids(entries.iter().map(|entry| entry.image_id.clone()).collect());
        self.annotations.clear();
        self.interaction.cancel();
        if let Some(viewport) = self.viewport_mut() {
            viewport.set_stack(entries, initial_index);
        }
        log::info!("Stack of {count} image(s) opened at slice {}", initial_index + 1);
        Ok(count)
    }

    /// Delivers pending viewport events to `observer` while the session is
    /// ready. Events raised while not ready are dropped.
    pub fn dispatch_events<O: ViewportObserver>(&mut self, observer: &mut O) -> usize {
        let ready = self.is_ready();
        let Some(viewport) = self.viewport_mut() else {
            return 0;
        };
        let events = viewport.drain_events();
        if !ready {
            log::debug!("Dropping {} event(s) while not ready", events.len());
            return 0;
        }

        let total = viewport.len();
        let delivered = events.len();
        for event in events {
            match event {
                ViewportEvent::SliceScrolled { index, .. } => observer.on_slice_changed(index, total),
                ViewportEvent::VoiModified { range, .. } => {
                    let (width, level) = range.window_level();
                    observer.on_window_level_changed(width, level);
                }
            }
        }
        delivered
    }

    /// Returns whether the view changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let (Some(engine), Some(group)) = (self.engine.as_mut(), self.tool_group.as_ref()) else {
            return false;
        };
        let Some(viewport) = engine.viewport_mut(VIEWPORT_ID) else {
            return false;
        };
        self.interaction
            .handle(event, group, viewport, &mut self.annotations)
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn current_annotations(&self) -> &[Annotation] {
        self.viewport()
            .and_then(StackViewport::current_image_id)
            .map(|image_id| self.annotations.for_image(image_id))
            .unwrap_or(&[])
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn scroll(&mut self, delta: i32) {
        if let Some(viewport) = self.viewport_mut() {
            viewport.scroll(delta);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(viewport) = self.viewport_mut() {
            viewport.reset_camera();
        }
    }

    pub fn observe_resize(&mut self) {
        if self.engine.is_some() && self.resize.is_none() {
            self.resize = Some(ResizeObserver::default());
        }
    }

    pub fn stop_observing_resize(&mut self) {
        self.resize = None;
    }

    pub fn is_observing_resize(&self) -> bool {
        self.resize.is_some()
    }

    /// Queues a new element size; returns `false` when nobody observes resizes.
    pub fn notify_resize(&mut self, element: Size) -> bool {
        match self.resize.as_mut() {
            Some(observer) => {
                observer.notify(element);
                true
            }
            None => false,
        }
    }

    pub fn layout_pending(&self) -> bool {
        self.resize.as_ref().is_some_and(ResizeObserver::has_pending)
    }

    pub fn layouts(&self) -> u64 {
        self.resize.as_ref().map_or(0, ResizeObserver::layouts)
    }

    /// Applies the newest queued size, if any.
    pub fn flush_layout(&mut self) -> bool {
        match (self.resize.as_mut(), self.engine.as_mut()) {
            (Some(observer), Some(engine)) => observer.flush(engine),
            _ => false,
        }
    }

    pub fn teardown(&mut self) {
        self.stop_observing_resize();
        self.interaction.cancel();
        self.tool_group = None;
        if let Some(mut engine) = self.engine.take() {
            engine.disable_element(VIEWPORT_ID);
            log::debug!("Rendering engine `{}` destroyed", engine.id());
        }
    }
}
