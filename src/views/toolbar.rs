use iced::widget::text::Wrapping;
use iced::widget::{column, container, row, text, vertical_rule};
use iced::{Alignment, Element, Length};

use super::{HEADER_HEIGHT, STATUS_BAR_HEIGHT, TOOLBAR_HEIGHT};
use crate::components::{action_button, segmented_toggle};
use crate::message::Message;
use crate::model::ActiveTool;
use crate::tools::{AnnotationTool, NavigationTool};

pub fn header() -> Element<'static, Message> {
    container(
        column![
            text("Stackview").size(22),
            text("DICOM stack viewer").size(13),
        ]
        .spacing(2),
    )
    .padding([8, 16])
    .height(Length::Fixed(HEADER_HEIGHT))
    .width(Length::Fill)
    .into()
}

/// Load | navigation tools | drawing tools | reset.
pub fn toolbar(active: ActiveTool, enabled: bool) -> Element<'static, Message> {
    let navigation = NavigationTool::ALL.map(|tool| (tool.label(), tool));
    let drawing = AnnotationTool::ALL.map(|tool| (tool.label(), tool));
    let (current_navigation, current_drawing) = match active {
        ActiveTool::Navigation(tool) => (Some(tool), None),
        ActiveTool::Annotation(tool) => (None, Some(tool)),
    };

    let controls = row![
        action_button("Load DICOM", enabled.then_some(Message::PickFiles)),
        vertical_rule(1.0),
        segmented_toggle(&navigation, current_navigation, enabled, Message::SelectNavigation),
        vertical_rule(1.0),
        segmented_toggle(&drawing, current_drawing, enabled, Message::SelectDrawing),
        vertical_rule(1.0),
        action_button("Reset", enabled.then_some(Message::ResetView)),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    container(controls)
        .padding([6, 16])
        .height(Length::Fixed(TOOLBAR_HEIGHT))
        .width(Length::Fill)
        .align_y(Alignment::Center)
        .into()
}

pub fn status_bar(status: &str) -> Element<'_, Message> {
    container(text(status).size(13).wrapping(Wrapping::None))
        .padding([6, 16])
        .height(Length::Fixed(STATUS_BAR_HEIGHT))
        .width(Length::Fill)
        .align_y(Alignment::Center)
        .into()
}
