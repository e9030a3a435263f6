use iced::widget::image::FilterMethod;
use iced::widget::{canvas, container, stack, text, Image, Space};
use iced::{Alignment, Background, Color, ContentFit, Element, Length};

use super::overlay::ViewportOverlay;
use crate::message::Message;
use crate::model::DisplayInfo;
use crate::session::Session;

/// The rendered slice with the annotation canvas stacked on top. Both layers
/// take exactly the viewport element size so that element coordinates match.
pub fn viewport_panel<'a>(session: &'a Session, info: &'a DisplayInfo) -> Element<'a, Message> {
    let content: Element<'a, Message> = match session.viewport() {
        Some(viewport) => {
            let element = viewport.element_size();
            let (width, height) = (Length::Fixed(element.width), Length::Fixed(element.height));

            let image: Element<'a, Message> = match viewport.frame() {
                Some(handle) => Image::new(handle.clone())
                    .content_fit(ContentFit::Fill)
                    .filter_method(FilterMethod::Nearest)
                    .width(width)
                    .height(height)
                    .into(),
                None => Space::new(width, height).into(),
            };
            let overlay = canvas(ViewportOverlay::new(session, info))
                .width(width)
                .height(height);

            stack![image, overlay].into()
        }
        None => text("Viewport unavailable").size(14).into(),
    };

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(Alignment::Center)
        .align_y(Alignment::Center)
        .style(|_theme| iced::widget::container::Style {
            background: Some(Background::Color(Color::BLACK)),
            ..Default::default()
        })
        .into()
}
