use std::f32::consts::TAU;

use iced::mouse::{self, ScrollDelta};
use iced::widget::canvas::{self, event, Frame, Geometry, Path, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};

use crate::engine::camera::Camera;
use crate::message::Message;
use crate::model::DisplayInfo;
use crate::session::Session;
use crate::tools::annotation::{Annotation, Shape};
use crate::tools::interaction::PointerEvent;
use crate::tools::{AnnotationTool, MouseBinding, ToolKind};
use crate::utils::format_measurement;

const ANNOTATION_COLOR: Color = Color::from_rgb(1.0, 0.82, 0.3);
const PREVIEW_COLOR: Color = Color::from_rgba(1.0, 0.82, 0.3, 0.6);
const LABEL_COLOR: Color = Color::from_rgb(0.85, 0.9, 1.0);
const ELLIPSE_SEGMENTS: usize = 64;

/// Annotation layer over the viewport. Also turns mouse input into
/// [`PointerEvent`]s in element coordinates.
pub struct ViewportOverlay<'a> {
    session: &'a Session,
    info: &'a DisplayInfo,
}

impl<'a> ViewportOverlay<'a> {
    pub fn new(session: &'a Session, info: &'a DisplayInfo) -> Self {
        Self { session, info }
    }
}

impl canvas::Program<Message> for ViewportOverlay<'_> {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        let canvas::Event::Mouse(event) = event else {
            return (event::Status::Ignored, None);
        };
        let dragging = self.session.interaction().is_dragging();

        let pointer = match event {
            mouse::Event::ButtonPressed(button) => {
                match (binding_for(button), cursor.position_in(bounds)) {
                    (Some(binding), Some(position)) => PointerEvent::Pressed { binding, position },
                    _ => return (event::Status::Ignored, None),
                }
            }
            mouse::Event::CursorMoved { .. } if dragging => {
                match cursor.position_from(bounds.position()) {
                    Some(position) => PointerEvent::Moved { position },
                    None => return (event::Status::Ignored, None),
                }
            }
            mouse::Event::ButtonReleased(_) if dragging => {
                match cursor.position_from(bounds.position()) {
                    Some(position) => PointerEvent::Released { position },
                    None => return (event::Status::Ignored, None),
                }
            }
            mouse::Event::WheelScrolled { delta } if cursor.is_over(bounds) => {
                PointerEvent::Wheel {
                    lines: wheel_lines(delta),
                }
            }
            _ => return (event::Status::Ignored, None),
        };

        (event::Status::Captured, Some(Message::Pointer(pointer)))
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        let Some(viewport) = self.session.viewport() else {
            return vec![frame.into_geometry()];
        };

        match (viewport.current_image(), viewport.current_slice()) {
            (Some(image), _) => {
                let to_screen = ScreenMapping {
                    camera: viewport.camera(),
                    image: image.size(),
                    element: viewport.element_size(),
                };
                for annotation in self.session.current_annotations() {
                    draw_annotation(&mut frame, annotation, &to_screen);
                }
            }
            (None, Some(Err(err))) => {
                draw_label(
                    &mut frame,
                    format!("Cannot display this slice:\n{err}"),
                    Point::new(12.0, bounds.height / 2.0),
                    LABEL_COLOR,
                );
            }
            _ => {}
        }

        if let Some((tool, start, end)) = self.session.interaction().preview() {
            draw_shape(&mut frame, tool, start, end, PREVIEW_COLOR);
        }

        if !viewport.is_empty() {
            draw_label(
                &mut frame,
                format!("Slice {}", self.info.slice_label()),
                Point::new(10.0, 8.0),
                LABEL_COLOR,
            );
            draw_label(
                &mut frame,
                self.info.window_level_label(),
                Point::new(10.0, bounds.height - 24.0),
                LABEL_COLOR,
            );
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if !cursor.is_over(bounds) && !self.session.interaction().is_dragging() {
            return mouse::Interaction::default();
        }
        let primary = self
            .session
            .tool_group()
            .and_then(|group| group.active_tool_for(MouseBinding::Primary));

        if self.session.interaction().dragged_tool() == Some(ToolKind::Pan) {
            return mouse::Interaction::Grabbing;
        }
        match primary {
            Some(ToolKind::Pan) => mouse::Interaction::Grab,
            Some(ToolKind::Zoom) => mouse::Interaction::ResizingVertically,
            Some(ToolKind::Length | ToolKind::RectangleRoi | ToolKind::EllipticalRoi) => {
                mouse::Interaction::Crosshair
            }
            _ => mouse::Interaction::default(),
        }
    }
}

/// Vertical wheel steps. Pixel deltas count as one step in their direction;
/// a purely horizontal scroll is no step at all.
fn wheel_lines(delta: ScrollDelta) -> f32 {
    match delta {
        ScrollDelta::Lines { y, .. } => y,
        ScrollDelta::Pixels { y, .. } if y == 0.0 => 0.0,
        ScrollDelta::Pixels { y, .. } => y.signum(),
    }
}

fn binding_for(button: mouse::Button) -> Option<MouseBinding> {
    match button {
        mouse::Button::Left => Some(MouseBinding::Primary),
        mouse::Button::Right => Some(MouseBinding::Secondary),
        mouse::Button::Middle => Some(MouseBinding::Auxiliary),
        _ => None,
    }
}

struct ScreenMapping<'a> {
    camera: &'a Camera,
    image: Size,
    element: Size,
}

impl ScreenMapping<'_> {
    fn point(&self, point: Point) -> Point {
        self.camera.image_to_screen(point, self.image, self.element)
    }
}

fn draw_annotation(frame: &mut Frame, annotation: &Annotation, to_screen: &ScreenMapping<'_>) {
    let (tool, start, end) = match annotation.shape {
        Shape::Length { start, end } => (AnnotationTool::Length, start, end),
        Shape::Rectangle(bounds) => (
            AnnotationTool::Rectangle,
            bounds.position(),
            bounds.position() + Vector::new(bounds.width, bounds.height),
        ),
        Shape::Ellipse(bounds) => (
            AnnotationTool::Ellipse,
            bounds.position(),
            bounds.position() + Vector::new(bounds.width, bounds.height),
        ),
    };
    let (start, end) = (to_screen.point(start), to_screen.point(end));

    draw_shape(frame, tool, start, end, ANNOTATION_COLOR);
    draw_label(
        frame,
        format_measurement(&annotation.measurement),
        Point::new(start.x.max(end.x) + 6.0, start.y.max(end.y) + 4.0),
        ANNOTATION_COLOR,
    );
}

/// Draws `tool`'s shape spanned by two element points.
fn draw_shape(frame: &mut Frame, tool: AnnotationTool, start: Point, end: Point, color: Color) {
    let top_left = Point::new(start.x.min(end.x), start.y.min(end.y));
    let size = Size::new((start.x - end.x).abs(), (start.y - end.y).abs());

    let path = match tool {
        AnnotationTool::Length => Path::line(start, end),
        AnnotationTool::Rectangle => Path::rectangle(top_left, size),
        AnnotationTool::Ellipse => ellipse(Rectangle::new(top_left, size)),
    };
    frame.stroke(&path, Stroke::default().with_color(color).with_width(2.0));

    if tool == AnnotationTool::Length {
        for handle in [start, end] {
            frame.fill(&Path::circle(handle, 3.0), color);
        }
    }
}

fn ellipse(bounds: Rectangle) -> Path {
    let center = bounds.center();
    let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);

    Path::new(|builder| {
        builder.move_to(Point::new(center.x + rx, center.y));
        for step in 1..ELLIPSE_SEGMENTS {
            let angle = TAU * step as f32 / ELLIPSE_SEGMENTS as f32;
            builder.line_to(Point::new(
                center.x + rx * angle.cos(),
                center.y + ry * angle.sin(),
            ));
        }
        builder.close();
    })
}

fn draw_label(frame: &mut Frame, content: String, position: Point, color: Color) {
    frame.fill_text(canvas::Text {
        content,
        position,
        color,
        size: Pixels(13.0),
        ..canvas::Text::default()
    });
}
