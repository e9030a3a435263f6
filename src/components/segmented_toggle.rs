use iced::widget::text::Wrapping;
use iced::widget::{button, container, text, Container, Row};
use iced::{Alignment, Background, Color, Length, Shadow, Theme};

use crate::message::Message;

/// Joined buttons of which at most one is highlighted. Every button is
/// disabled when `enabled` is false.
pub fn segmented_toggle<T>(
    options: &[(&'static str, T)],
    current: Option<T>,
    enabled: bool,
    on_select: fn(T) -> Message,
) -> Container<'static, Message>
where
    T: Copy + PartialEq,
{
    let last = options.len().saturating_sub(1);
    let segments = options.iter().enumerate().map(|(index, &(label, value))| {
        let position = match (index, last) {
            (_, 0) => SegmentPosition::Only,
            (0, _) => SegmentPosition::Left,
            (index, last) if index == last => SegmentPosition::Right,
            _ => SegmentPosition::Middle,
        };
        let is_active = current == Some(value);
        segment(label, is_active, position, enabled.then(|| on_select(value))).into()
    });

    container(Row::with_children(segments).spacing(2))
        .padding(3)
        .style(segmented_container_style)
}

/// A standalone action button styled like a one-segment toggle.
pub fn action_button(label: &'static str, on_press: Option<Message>) -> Container<'static, Message> {
    container(segment(label, false, SegmentPosition::Only, on_press))
        .padding(3)
        .style(segmented_container_style)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentPosition {
    Only,
    Left,
    Middle,
    Right,
}

fn segment(
    label: &'static str,
    is_active: bool,
    position: SegmentPosition,
    on_press: Option<Message>,
) -> iced::widget::Button<'static, Message> {
    let content = container(text(label).size(14).wrapping(Wrapping::None))
        .height(Length::Fixed(30.0))
        .align_x(Alignment::Center)
        .align_y(Alignment::Center)
        .padding([6, 14]);

    button(content)
        .padding(0)
        .on_press_maybe(on_press)
        .style(move |theme, status| segmented_button_style(theme, status, is_active, position))
}

fn segmented_container_style(theme: &Theme) -> iced::widget::container::Style {
    let palette = theme.extended_palette();

    iced::widget::container::Style {
        background: Some(Background::Color(palette.background.strong.color)),
        border: iced::border::Border {
            color: palette.background.strong.color.scale_alpha(0.6),
            width: 1.0,
            radius: iced::border::Radius::new(999.0),
        },
        ..Default::default()
    }
}

fn segmented_button_style(
    theme: &Theme,
    status: iced::widget::button::Status,
    is_active: bool,
    position: SegmentPosition,
) -> iced::widget::button::Style {
    let palette = theme.extended_palette();

    let mut background_color = if is_active {
        palette.primary.strong.color
    } else {
        palette.background.strong.color.scale_alpha(0.4)
    };

    match status {
        iced::widget::button::Status::Hovered => {
            background_color = if is_active {
                palette.primary.base.color
            } else {
                palette.background.base.color.scale_alpha(0.8)
            };
        }
        iced::widget::button::Status::Pressed => {
            background_color = if is_active {
                palette.primary.base.color.scale_alpha(0.9)
            } else {
                palette.background.base.color.scale_alpha(0.9)
            };
        }
        iced::widget::button::Status::Disabled => {
            background_color = background_color.scale_alpha(0.5);
        }
        iced::widget::button::Status::Active => {}
    }

    let mut text_color = if is_active {
        palette.primary.strong.text
    } else {
        palette.background.base.text
    };
    if status == iced::widget::button::Status::Disabled {
        text_color = text_color.scale_alpha(0.5);
    }

    let (outer, inner) = (999.0, 6.0);
    let radius = match position {
        SegmentPosition::Only => iced::border::Radius::new(outer),
        SegmentPosition::Left => iced::border::Radius {
            top_left: outer,
            top_right: inner,
            bottom_right: inner,
            bottom_left: outer,
        },
        SegmentPosition::Middle => iced::border::Radius::new(inner),
        SegmentPosition::Right => iced::border::Radius {
            top_left: inner,
            top_right: outer,
            bottom_right: outer,
            bottom_left: inner,
        },
    };

    iced::widget::button::Style {
        background: Some(Background::Color(background_color)),
        text_color,
        border: iced::border::Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius,
        },
        shadow: Shadow::default(),
    }
}
