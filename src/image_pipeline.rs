use std::fmt;

use dicom::core::Tag;
use dicom::dictionary_std::tags;
use dicom::object::DefaultDicomObject;
use dicom::pixeldata::{
    DecodedPixelData, PhotometricInterpretation, PixelDecoder, PlanarConfiguration,
};
use iced::widget::image::Handle;
use iced::{Point, Size};

use crate::engine::camera::Camera;
use crate::engine::voi::VoiRange;
use crate::utils::attribute_text;

/// Stored samples of one decoded slice.
#[derive(Clone)]
pub enum Pixels {
    /// Modality values, one per pixel.
    Gray { values: Vec<f32>, invert: bool },
    /// Interleaved 8-bit RGB.
    Rgb(Vec<u8>),
}

impl fmt::Debug for Pixels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pixels::Gray { values, invert } => f
                .debug_struct("Gray")
                .field("len", &values.len())
                .field("invert", invert)
                .finish(),
            Pixels::Rgb(samples) => f.debug_tuple("Rgb").field(&samples.len()).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StackImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
    pub default_voi: VoiRange,
    /// Row spacing, column spacing in millimetres.
    pub pixel_spacing: Option<(f32, f32)>,
    pub patient_name: Option<String>,
}

impl StackImage {
    pub fn gray(width: u32, height: u32, values: Vec<f32>) -> Self {
        let default_voi = value_range(&values);
        Self {
            width,
            height,
            pixels: Pixels::Gray {
                values,
                invert: false,
            },
            default_voi,
            pixel_spacing: None,
            patient_name: None,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn is_grayscale(&self) -> bool {
        matches!(self.pixels, Pixels::Gray { .. })
    }

    pub fn value_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        match &self.pixels {
            Pixels::Gray { values, .. } => values
                .get(y as usize * self.width as usize + x as usize)
                .copied(),
            Pixels::Rgb(_) => None,
        }
    }
}

pub struct FrameImagePipeline;

impl FrameImagePipeline {
    pub fn decode_first_frame(object: &DefaultDicomObject) -> Result<StackImage, String> {
        let decoded = object
            .decode_pixel_data()
            .map_err(|err| format!("Failed to decode pixel data: {err}"))?;

        if decoded.number_of_frames() == 0 {
            return Err(String::from("Pixel data does not contain any frame"));
        }

        let width = decoded.columns();
        let height = decoded.rows();
        let pixels = match decoded.photometric_interpretation() {
            photometric if photometric.is_monochrome() => Self::monochrome(&decoded, 0)?,
            PhotometricInterpretation::Rgb => Self::rgb(&decoded, 0)?,
            other => Self::fallback_to_dynamic(&decoded, 0, other.as_str())?,
        };

        let expected = width as usize * height as usize;
        let actual = match &pixels {
            Pixels::Gray { values, .. } => values.len(),
            Pixels::Rgb(samples) => samples.len() / 3,
        };
        if actual < expected {
            return Err(format!(
                "Frame holds {actual} pixels, expected {width}x{height}"
            ));
        }

        let default_voi = match &pixels {
            Pixels::Gray { values, .. } => {
                window_from_attributes(object).unwrap_or_else(|| value_range(values))
            }
            Pixels::Rgb(_) => VoiRange::new(0.0, 255.0),
        };

        Ok(StackImage {
            width,
            height,
            pixels,
            default_voi,
            pixel_spacing: pixel_spacing(object),
            patient_name: attribute_text(object, "PatientName"),
        })
    }

    /// Windows the part of `image` visible through `camera` into an RGBA frame.
    /// The frame never has more pixels than the element it is shown in.
    pub fn render(
        image: &StackImage,
        voi: VoiRange,
        camera: &Camera,
        element: Size,
    ) -> Option<Handle> {
        if element.width < 1.0 || element.height < 1.0 || image.width == 0 || image.height == 0 {
            return None;
        }

        let (origin, region) = camera.visible_region(image.size(), element);
        let out_width = region.width.min(element.width).ceil().max(1.0) as u32;
        let out_height = region.height.min(element.height).ceil().max(1.0) as u32;
        let step_x = region.width / out_width as f32;
        let step_y = region.height / out_height as f32;

        let mut rgba = Vec::with_capacity(out_width as usize * out_height as usize * 4);
        for row in 0..out_height {
            let y = origin.y + (row as f32 + 0.5) * step_y;
            for column in 0..out_width {
                let x = origin.x + (column as f32 + 0.5) * step_x;
                rgba.extend_from_slice(&sample(image, voi, Point::new(x, y)));
            }
        }

        Some(Handle::from_rgba(out_width, out_height, rgba))
    }

    fn monochrome(decoded: &DecodedPixelData<'_>, frame_idx: u32) -> Result<Pixels, String> {
        let invert = matches!(
            decoded.photometric_interpretation(),
            PhotometricInterpretation::Monochrome1
        );
        let values = decoded
            .to_vec_frame::<f32>(frame_idx)
            .map_err(|err| format!("Failed to materialize frame data: {err}"))?;
        Ok(Pixels::Gray { values, invert })
    }

    fn rgb(decoded: &DecodedPixelData<'_>, frame_idx: u32) -> Result<Pixels, String> {
        if decoded.bits_allocated() > 8 {
            return Self::fallback_to_dynamic(decoded, frame_idx, "RGB");
        }

        let pixel_count = decoded.columns() as usize * decoded.rows() as usize;
        let samples = decoded
            .to_vec_frame::<u8>(frame_idx)
            .map_err(|err| format!("Failed to materialize RGB frame: {err}"))?;
        let rgb = match decoded.planar_configuration() {
            PlanarConfiguration::Standard => {
                if !samples.len().is_multiple_of(3) {
                    return Err(format!(
                        "RGB buffer length {} is not divisible by 3",
                        samples.len()
                    ));
                }
                samples
            }
            PlanarConfiguration::PixelFirst => rgb_planar_to_interleaved(&samples, pixel_count)?,
        };
        Ok(Pixels::Rgb(rgb))
    }

    fn fallback_to_dynamic(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        interpretation: &str,
    ) -> Result<Pixels, String> {
        decoded
            .to_dynamic_image(frame_idx)
            .map_err(|err| {
                format!("Unsupported photometric interpretation `{interpretation}`: {err}")
            })
            .map(|image| Pixels::Rgb(image.into_rgb8().into_raw()))
    }
}

fn sample(image: &StackImage, voi: VoiRange, point: Point) -> [u8; 4] {
    if point.x < 0.0 || point.y < 0.0 {
        return [0, 0, 0, 255];
    }
    let (x, y) = (point.x as usize, point.y as usize);
    let width = image.width as usize;
    if x >= width || y >= image.height as usize {
        return [0, 0, 0, 255];
    }
    let index = y * width + x;

    match &image.pixels {
        Pixels::Gray { values, invert } => {
            let gray = values.get(index).map_or(0, |value| voi.apply(*value));
            let gray = if *invert { 255 - gray } else { gray };
            [gray, gray, gray, 255]
        }
        Pixels::Rgb(samples) => match samples.get(index * 3..index * 3 + 3) {
            Some([r, g, b]) => [
                voi.apply(f32::from(*r)),
                voi.apply(f32::from(*g)),
                voi.apply(f32::from(*b)),
                255,
            ],
            _ => [0, 0, 0, 255],
        },
    }
}

fn window_from_attributes(object: &DefaultDicomObject) -> Option<VoiRange> {
    let first = |tag: Tag| {
        object
            .element(tag)
            .ok()?
            .to_multi_float32()
            .ok()?
            .first()
            .copied()
    };
    let center = first(tags::WINDOW_CENTER)?;
    let width = first(tags::WINDOW_WIDTH)?;
    (width > 0.0).then(|| VoiRange::from_window(f64::from(width), f64::from(center)))
}

fn pixel_spacing(object: &DefaultDicomObject) -> Option<(f32, f32)> {
    let spacing = object
        .element(tags::PIXEL_SPACING)
        .ok()?
        .to_multi_float32()
        .ok()?;
    match spacing.as_slice() {
        [row, column, ..] if *row > 0.0 && *column > 0.0 => Some((*row, *column)),
        _ => None,
    }
}

fn rgb_planar_to_interleaved(samples: &[u8], pixel_count: usize) -> Result<Vec<u8>, String> {
    if samples.len() < pixel_count * 3 {
        return Err(format!(
            "RGB buffer length {} is too small for {pixel_count} pixels",
            samples.len()
        ));
    }
    let (r_plane, rest) = samples.split_at(pixel_count);
    let (g_plane, b_plane) = rest.split_at(pixel_count);

    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for idx in 0..pixel_count {
        rgb.extend_from_slice(&[r_plane[idx], g_plane[idx], b_plane[idx]]);
    }
    Ok(rgb)
}

fn value_range(values: &[f32]) -> VoiRange {
    match min_max(values) {
        Some((min, max)) if max > min => VoiRange::new(f64::from(min), f64::from(max)),
        Some((min, _)) => VoiRange::new(f64::from(min), f64::from(min) + 1.0),
        None => VoiRange::new(0.0, 1.0),
    }
}

fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> StackImage {
        StackImage::gray(4, 2, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0])
    }

    #[test]
    fn gray_image_defaults_to_its_value_range() {
        let image = ramp();

        assert_eq!(image.default_voi, VoiRange::new(0.0, 70.0));
        assert_eq!(image.value_at(1, 1), Some(50.0));
        assert_eq!(image.value_at(4, 0), None);
    }

    #[test]
    fn flat_image_gets_a_non_empty_window() {
        let image = StackImage::gray(2, 1, vec![7.0, 7.0]);

        assert_eq!(image.default_voi, VoiRange::new(7.0, 8.0));
    }

    #[test]
    fn render_never_exceeds_the_element() {
        let image = ramp();
        let camera = Camera::fitted(image.size());

        let handle = FrameImagePipeline::render(
            &image,
            image.default_voi,
            &camera,
            Size::new(2.0, 2.0),
        );

        assert!(handle.is_some());
        assert!(FrameImagePipeline::render(&image, image.default_voi, &camera, Size::ZERO).is_none());
    }

    #[test]
    fn samples_outside_the_image_are_black() {
        let image = ramp();

        assert_eq!(sample(&image, image.default_voi, Point::new(-1.0, 0.0)), [0, 0, 0, 255]);
        assert_eq!(sample(&image, image.default_voi, Point::new(3.5, 1.5)), [255, 255, 255, 255]);
    }

    #[test]
    fn planar_rgb_is_interleaved() {
        let planar = [1, 2, 10, 20, 100, 200];

        assert_eq!(
            rgb_planar_to_interleaved(&planar, 2).expect("two pixels"),
            vec![1, 10, 100, 2, 20, 200]
        );
        assert!(rgb_planar_to_interleaved(&planar, 3).is_err());
    }
}
