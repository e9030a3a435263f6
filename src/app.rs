use std::path::PathBuf;

use iced::keyboard::key::Named;
use iced::keyboard::{self, Key, Modifiers};
use iced::widget::{column, container, row, text};
use iced::{application, window, Alignment, Element, Length, Size, Subscription, Task, Theme};
use rfd::AsyncFileDialog;

use crate::bootstrap::DicomSubsystems;
use crate::config::Config;
use crate::engine::ViewportElement;
use crate::loader::{load_sample_stack, LoadedStack, ReqwestFetch, RECOGNIZED_EXTENSIONS};
use crate::message::Message;
use crate::model::{ActiveTool, DisplayInfo};
use crate::session::Session;
use crate::utils::plural;
use crate::views::{
    header, info_panel, status_bar, toolbar, viewport_element_size, viewport_panel, SPACING,
};

const APP_TITLE: &str = "Stackview";

pub const INITIALISING_STATUS: &str = "Initialising…";
pub const READY_STATUS: &str = "Ready — load DICOM files to begin";
pub const NO_FILES_STATUS: &str = "No DICOM files found";
pub const RESET_STATUS: &str = "View reset";

pub fn run(config: Config, files: Vec<PathBuf>) -> iced::Result {
    let window = Size::new(config.window_width, config.window_height);

    application(APP_TITLE, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window_size(window)
        .run_with(move || App::new(config, files))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOrigin {
    Files,
    Sample,
}

pub struct App {
    session: Session,
    info: DisplayInfo,
    active_tool: ActiveTool,
    status: String,
    busy: bool,
    window: Size,
    sample_data_url: String,
    startup_files: Vec<PathBuf>,
    http: ReqwestFetch,
}

impl App {
    /// The session is started by the first message, once the window exists.
    pub fn new(config: Config, files: Vec<PathBuf>) -> (Self, Task<Message>) {
        let app = Self {
            session: Session::new(config.window_level_sensitivity),
            info: DisplayInfo::default(),
            active_tool: ActiveTool::default(),
            status: INITIALISING_STATUS.to_string(),
            busy: false,
            window: Size::new(config.window_width, config.window_height),
            sample_data_url: config.sample_data_url,
            startup_files: files,
            http: ReqwestFetch::default(),
        };
        (app, Task::done(Message::Initialise))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn info(&self) -> &DisplayInfo {
        &self.info
    }

    pub fn active_tool(&self) -> ActiveTool {
        self.active_tool
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn controls_enabled(&self) -> bool {
        self.session.is_ready() && !self.busy
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Initialise => self.initialise(),
            Message::PickFiles => {
                if !self.controls_enabled() {
                    return Task::none();
                }
                Task::perform(
                    async {
                        AsyncFileDialog::new()
                            .add_filter("DICOM", &RECOGNIZED_EXTENSIONS)
                            .add_filter("All files", &["*"])
                            .pick_files()
                            .await
                            .map(|handles| {
                                handles
                                    .into_iter()
                                    .map(|handle| handle.path().to_path_buf())
                                    .collect()
                            })
                    },
                    Message::FilesPicked,
                )
            }
            Message::FilesPicked(paths) => match paths {
                Some(paths) if !paths.is_empty() => self.begin_file_load(paths),
                _ => {
                    log::debug!("File selection cancelled");
                    Task::none()
                }
            },
            Message::FilesLoaded(loaded) => {
                self.finish_load(loaded, LoadOrigin::Files);
                Task::none()
            }
            Message::SampleLoaded(loaded) => {
                match loaded {
                    Some(loaded) => self.finish_load(loaded, LoadOrigin::Sample),
                    None => {
                        self.busy = false;
                        self.status = READY_STATUS.to_string();
                    }
                }
                Task::none()
            }
            Message::SelectNavigation(tool) => {
                match self.session.select_navigation_tool(tool) {
                    Ok(()) => self.active_tool = ActiveTool::Navigation(tool),
                    Err(err) => log::warn!("Cannot select {}: {err}", tool.label()),
                }
                Task::none()
            }
            Message::SelectDrawing(tool) => {
                match self.session.select_drawing_tool(tool) {
                    Ok(()) => self.active_tool = ActiveTool::Annotation(tool),
                    Err(err) => log::warn!("Cannot select {}: {err}", tool.label()),
                }
                Task::none()
            }
            Message::ResetView => {
                if self.controls_enabled() {
                    self.session.reset_view();
                    self.status = RESET_STATUS.to_string();
                }
                Task::none()
            }
            Message::Pointer(event) => {
                if self.controls_enabled() && self.session.handle_pointer(event) {
                    self.session.dispatch_events(&mut self.info);
                }
                Task::none()
            }
            Message::ScrollSlices(delta) => {
                if self.controls_enabled() {
                    self.session.scroll(delta);
                    self.session.dispatch_events(&mut self.info);
                }
                Task::none()
            }
            Message::WindowResized(size) => {
                self.window = size;
                self.session.notify_resize(viewport_element_size(size));
                Task::none()
            }
            Message::FrameTick => {
                self.session.flush_layout();
                Task::none()
            }
        }
    }

    fn initialise(&mut self) -> Task<Message> {
        let element = ViewportElement::new(viewport_element_size(self.window));
        if let Err(err) = self.session.start(&mut DicomSubsystems, element) {
            log::error!("Viewer failed to start: {err}");
            self.status = format!("Error: {err}");
            return Task::none();
        }

        let files = std::mem::take(&mut self.startup_files);
        if !files.is_empty() {
            return self.begin_file_load(files);
        }

        self.busy = true;
        self.status = "Loading sample data…".to_string();
        Task::perform(
            load_sample_stack(self.http.clone(), self.sample_data_url.clone()),
            Message::SampleLoaded,
        )
    }

    fn begin_file_load(&mut self, paths: Vec<PathBuf>) -> Task<Message> {
        log::info!("Opening {}", plural(paths.len(), "file", "files"));
        let Some(request) = self.session.load_from_files(&paths) else {
            self.status = NO_FILES_STATUS.to_string();
            return Task::none();
        };

        self.busy = true;
        self.status = request.started().status();
        let http = self.http.clone();
        Task::perform(
            async move { request.fetch(&http).await },
            Message::FilesLoaded,
        )
    }

    fn finish_load(&mut self, loaded: LoadedStack, origin: LoadOrigin) {
        self.busy = false;
        log::debug!("{}", loaded.finished().status());

        let initial_index = loaded.initial_index;
        match self.session.apply_stack(loaded) {
            Ok(count) => {
                let patient_name = self
                    .session
                    .viewport()
                    .and_then(|viewport| viewport.current_image())
                    .and_then(|image| image.patient_name.clone());
                self.info
                    .stack_loaded(initial_index, count, patient_name.as_deref());
                self.status = match origin {
                    LoadOrigin::Files => {
                        format!("Loaded {} — scroll to navigate", plural(count, "image", "images"))
                    }
                    LoadOrigin::Sample => {
                        format!("Loaded {count} sample images — scroll to navigate")
                    }
                };
            }
            Err(err) => {
                log::warn!("Stack not opened: {err}");
                self.status = match origin {
                    LoadOrigin::Files => NO_FILES_STATUS.to_string(),
                    LoadOrigin::Sample => READY_STATUS.to_string(),
                };
            }
        }
        self.session.dispatch_events(&mut self.info);
    }

    pub fn view(&self) -> Element<'_, Message> {
        let viewport = container(viewport_panel(&self.session, &self.info))
            .width(Length::Fill)
            .height(Length::Fill);
        let sidebar = container(info_panel(&self.info)).height(Length::Fill);

        let body = row![viewport, sidebar]
            .spacing(SPACING)
            .padding(SPACING)
            .width(Length::Fill)
            .height(Length::Fill);

        let content: Element<'_, Message> = if self.session.is_ready() {
            body.into()
        } else {
            container(text(&self.status).size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Alignment::Center)
                .align_y(Alignment::Center)
                .into()
        };

        column![
            header(),
            toolbar(self.active_tool, self.controls_enabled()),
            content,
            status_bar(&self.status),
        ]
        .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![keyboard::on_key_press(slice_key)];
        if self.session.is_observing_resize() {
            subscriptions.push(window::resize_events().map(|(_id, size)| Message::WindowResized(size)));
        }
        if self.session.layout_pending() {
            subscriptions.push(window::frames().map(|_| Message::FrameTick));
        }
        Subscription::batch(subscriptions)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn slice_key(key: Key, _modifiers: Modifiers) -> Option<Message> {
    match key {
        Key::Named(Named::ArrowUp | Named::PageUp) => Some(Message::ScrollSlices(-1)),
        Key::Named(Named::ArrowDown | Named::PageDown) => Some(Message::ScrollSlices(1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::StackEntry;
    use crate::image_pipeline::StackImage;
    use crate::loader::ImageId;
    use crate::model::display_info::WINDOW_LEVEL_HINT;
    use crate::tools::{AnnotationTool, NavigationTool};

    fn started_app() -> App {
        let (mut app, _) = App::new(Config::default(), Vec::new());
        let _ = app.update(Message::Initialise);
        app
    }

    fn stack(count: usize) -> LoadedStack {
        let entries = (0..count)
            .map(|index| StackEntry {
                image_id: ImageId::new(format!("dicomfile:{index}")),
                slice: Ok(Arc::new(StackImage {
                    patient_name: Some("DOE^JOHN".to_string()),
                    ..StackImage::gray(4, 4, vec![index as f32; 16])
                })),
            })
            .collect();
        LoadedStack {
            entries,
            initial_index: count / 2,
        }
    }

    #[test]
    fn starts_busy_loading_sample_data() {
        let app = started_app();

        assert!(app.session().is_ready());
        assert!(app.is_busy());
        assert!(!app.controls_enabled());
        assert_eq!(app.status(), "Loading sample data…");
    }

    #[test]
    fn missing_sample_data_leaves_viewer_ready() {
        let mut app = started_app();

        let _ = app.update(Message::SampleLoaded(None));

        assert!(!app.is_busy());
        assert_eq!(app.status(), READY_STATUS);
        assert_eq!(app.info().slice_label(), "-- / --");
    }

    #[test]
    fn loaded_files_update_info_and_status() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(None));

        let _ = app.update(Message::FilesLoaded(stack(3)));

        assert_eq!(app.status(), "Loaded 3 images — scroll to navigate");
        assert_eq!(app.info().slice_label(), "2 / 3");
        assert_eq!(app.info().patient_label(), "DOE JOHN");

        let _ = app.update(Message::FilesLoaded(stack(1)));
        assert_eq!(app.status(), "Loaded 1 image — scroll to navigate");
    }

    #[test]
    fn sample_status_mentions_sample_images() {
        let mut app = started_app();

        let _ = app.update(Message::SampleLoaded(Some(stack(4))));

        assert_eq!(app.status(), "Loaded 4 sample images — scroll to navigate");
        assert_eq!(app.info().slice_label(), "3 / 4");
    }

    #[test]
    fn undecodable_initial_slice_clears_the_previous_window_level() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(Some(stack(3))));
        assert_ne!(app.info().window_level_label(), WINDOW_LEVEL_HINT);

        let mut next = stack(3);
        next.entries[1].slice = Err("unsupported transfer syntax".to_string());
        let _ = app.update(Message::FilesLoaded(next));

        assert_eq!(app.info().slice_label(), "2 / 3");
        assert_eq!(app.info().window_level_label(), WINDOW_LEVEL_HINT);
    }

    #[test]
    fn keyboard_scrolling_moves_between_slices() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(Some(stack(3))));

        let _ = app.update(Message::ScrollSlices(1));
        assert_eq!(app.info().slice_label(), "3 / 3");

        let _ = app.update(Message::ScrollSlices(1));
        assert_eq!(app.info().slice_label(), "3 / 3");
    }

    #[test]
    fn arrow_keys_map_to_slice_steps() {
        let up = slice_key(Key::Named(Named::ArrowUp), Modifiers::empty());
        let down = slice_key(Key::Named(Named::PageDown), Modifiers::empty());

        assert!(matches!(up, Some(Message::ScrollSlices(-1))));
        assert!(matches!(down, Some(Message::ScrollSlices(1))));
        assert!(slice_key(Key::Named(Named::Enter), Modifiers::empty()).is_none());
    }

    #[test]
    fn scrolling_is_ignored_while_loading() {
        let mut app = started_app();

        let _ = app.update(Message::ScrollSlices(1));

        assert_eq!(app.info().slice_label(), "-- / --");
    }

    #[test]
    fn tool_selection_tracks_the_last_pick() {
        let mut app = started_app();

        let _ = app.update(Message::SelectDrawing(AnnotationTool::Ellipse));
        assert_eq!(app.active_tool(), ActiveTool::Annotation(AnnotationTool::Ellipse));

        let _ = app.update(Message::SelectNavigation(NavigationTool::Zoom));
        assert_eq!(app.active_tool(), ActiveTool::Navigation(NavigationTool::Zoom));
    }

    #[test]
    fn cancelled_file_dialog_changes_nothing() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(None));

        let _ = app.update(Message::FilesPicked(None));
        let _ = app.update(Message::FilesPicked(Some(Vec::new())));

        assert_eq!(app.status(), READY_STATUS);
        assert!(!app.is_busy());
    }

    #[test]
    fn selections_without_dicom_candidates_report_it() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(None));

        let _ = app.update(Message::FilesPicked(Some(vec![PathBuf::from("notes.txt")])));

        assert_eq!(app.status(), NO_FILES_STATUS);
        assert!(!app.is_busy());
    }

    #[test]
    fn reset_reports_status() {
        let mut app = started_app();
        let _ = app.update(Message::SampleLoaded(Some(stack(2))));

        let _ = app.update(Message::ResetView);

        assert_eq!(app.status(), RESET_STATUS);
    }
}
