use dicom::object::DefaultDicomObject;

use crate::tools::annotation::{Measurement, RegionStats, Unit};

const MAX_VALUE_LEN: usize = 64;

pub const PLACEHOLDER: &str = "--";

/// Trimmed text of the attribute called `name`, if present and non-empty.
pub fn attribute_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `DOE^JOHN^^DR` becomes `DOE JOHN DR`.
pub fn format_person_name(raw: &str) -> String {
    let rendered = raw
        .split('^')
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    truncate(rendered)
}

pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

pub fn format_measurement(measurement: &Measurement) -> String {
    match measurement {
        Measurement::Length { value, unit } => format!("{value:.2} {}", unit.suffix()),
        Measurement::Region { area, unit, stats } => {
            let mut rendered = format!("Area {area:.2} {}²", unit.suffix());
            if let Some(RegionStats { mean, std_dev, .. }) = stats {
                rendered.push_str(&format!("\nMean {mean:.1}  SD {std_dev:.1}"));
            }
            rendered
        }
    }
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Millimetre => "mm",
            Unit::Pixel => "px",
        }
    }
}

fn truncate(rendered: String) -> String {
    if rendered.chars().count() > MAX_VALUE_LEN {
        let mut truncated = rendered.chars().take(MAX_VALUE_LEN).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_name_components_are_spaced() {
        assert_eq!(format_person_name("DOE^JOHN^^DR"), "DOE JOHN DR");
        assert_eq!(format_person_name("Anonymous"), "Anonymous");
        assert_eq!(format_person_name("^^"), "");
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "X".repeat(100);

        let rendered = format_person_name(&name);

        assert_eq!(rendered.chars().count(), MAX_VALUE_LEN + 1);
        assert!(rendered.ends_with('…'));
    }

    #[test]
    fn plural_picks_the_right_noun() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(3, "image", "images"), "3 images");
    }

    #[test]
    fn measurements_carry_their_unit() {
        let length = Measurement::Length {
            value: 12.5,
            unit: Unit::Millimetre,
        };
        let region = Measurement::Region {
            area: 16.0,
            unit: Unit::Pixel,
            stats: Some(RegionStats {
                mean: 40.0,
                std_dev: 2.0,
                count: 16,
            }),
        };

        assert_eq!(format_measurement(&length), "12.50 mm");
        assert_eq!(format_measurement(&region), "Area 16.00 px²\nMean 40.0  SD 2.0");
    }
}
