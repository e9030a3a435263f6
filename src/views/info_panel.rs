use iced::widget::text::Wrapping;
use iced::widget::{column, row, text, Column};
use iced::{Element, Length};

use super::SIDEBAR_WIDTH;
use crate::message::Message;
use crate::model::DisplayInfo;

const INSTRUCTIONS: &str = "\
1. Click Load DICOM (or sample data loads automatically)
2. Scroll or use the arrow keys to navigate slices
3. Draw annotations with Length / Rectangle / Ellipse
4. Drag with W/L active to adjust brightness";

pub fn info_panel(info: &DisplayInfo) -> Element<'static, Message> {
    let rows = [
        ("Slice", info.slice_label()),
        ("Window / Level", info.window_level_label()),
        ("Patient", info.patient_label().to_string()),
    ];

    let table = rows.into_iter().fold(Column::new().spacing(8), |table, (label, value)| {
        table.push(
            row![
                text(label).size(14).width(Length::FillPortion(2)),
                text(value)
                    .size(14)
                    .width(Length::FillPortion(3))
                    .wrapping(Wrapping::Word),
            ]
            .spacing(12),
        )
    });

    column![
        text("Image Info").size(18),
        table,
        text("How to use").size(14),
        text(INSTRUCTIONS).size(13).wrapping(Wrapping::Word),
    ]
    .spacing(16)
    .width(Length::Fixed(SIDEBAR_WIDTH))
    .into()
}
