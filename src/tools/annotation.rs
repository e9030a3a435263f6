//! Measurement annotations drawn on a slice.
//!
//! Shapes live in image coordinates so they follow the slice through pan and
//! zoom. Each annotation is measured once when it is committed.

use std::collections::HashMap;
use std::f32::consts::PI;

use iced::{Point, Rectangle, Size};

use super::AnnotationTool;
use crate::image_pipeline::StackImage;
use crate::loader::ImageId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Length { start: Point, end: Point },
    Rectangle(Rectangle),
    /// Ellipse inscribed in the rectangle.
    Ellipse(Rectangle),
}

impl Shape {
    /// The shape spanned by a drag from `start` to `end`, or `None` when the
    /// drag has no extent.
    pub fn from_drag(tool: AnnotationTool, start: Point, end: Point) -> Option<Self> {
        match tool {
            AnnotationTool::Length => {
                (start.distance(end) > f32::EPSILON).then_some(Shape::Length { start, end })
            }
            AnnotationTool::Rectangle => bounds_of(start, end).map(Shape::Rectangle),
            AnnotationTool::Ellipse => bounds_of(start, end).map(Shape::Ellipse),
        }
    }

    pub fn tool(&self) -> AnnotationTool {
        match self {
            Shape::Length { .. } => AnnotationTool::Length,
            Shape::Rectangle(_) => AnnotationTool::Rectangle,
            Shape::Ellipse(_) => AnnotationTool::Ellipse,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        match self {
            Shape::Length { .. } => false,
            Shape::Rectangle(bounds) => {
                point.x >= bounds.x
                    && point.x <= bounds.x + bounds.width
                    && point.y >= bounds.y
                    && point.y <= bounds.y + bounds.height
            }
            Shape::Ellipse(bounds) => {
                let center = bounds.center();
                let (rx, ry) = (bounds.width / 2.0, bounds.height / 2.0);
                let dx = (point.x - center.x) / rx;
                let dy = (point.y - center.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

fn bounds_of(a: Point, b: Point) -> Option<Rectangle> {
    let top_left = Point::new(a.x.min(b.x), a.y.min(b.y));
    let size = Size::new((a.x - b.x).abs(), (a.y - b.y).abs());
    (size.width > f32::EPSILON && size.height > f32::EPSILON)
        .then(|| Rectangle::new(top_left, size))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Millimetre,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Length {
        value: f32,
        unit: Unit,
    },
    Region {
        area: f32,
        unit: Unit,
        stats: Option<RegionStats>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub shape: Shape,
    pub measurement: Measurement,
}

impl Annotation {
    pub fn new(shape: Shape, image: &StackImage) -> Self {
        Self {
            measurement: measure(&shape, image),
            shape,
        }
    }
}

/// Physical size when the slice carries PixelSpacing, pixels otherwise.
pub fn measure(shape: &Shape, image: &StackImage) -> Measurement {
    let (unit, row_spacing, column_spacing) = match image.pixel_spacing {
        Some((row, column)) => (Unit::Millimetre, row, column),
        None => (Unit::Pixel, 1.0, 1.0),
    };

    match shape {
        Shape::Length { start, end } => {
            let dx = (end.x - start.x) * column_spacing;
            let dy = (end.y - start.y) * row_spacing;
            Measurement::Length {
                value: dx.hypot(dy),
                unit,
            }
        }
        Shape::Rectangle(bounds) | Shape::Ellipse(bounds) => {
            let width = bounds.width * column_spacing;
            let height = bounds.height * row_spacing;
            let area = if matches!(shape, Shape::Ellipse(_)) {
                PI * width * height / 4.0
            } else {
                width * height
            };
            Measurement::Region {
                area,
                unit,
                stats: region_stats(shape, *bounds, image),
            }
        }
    }
}

/// Mean and population standard deviation of the modality values whose
/// pixel centres fall inside `shape`.
fn region_stats(shape: &Shape, bounds: Rectangle, image: &StackImage) -> Option<RegionStats> {
    if !image.is_grayscale() {
        return None;
    }

    let first_column = bounds.x.floor().max(0.0) as u32;
    let first_row = bounds.y.floor().max(0.0) as u32;
    let last_column = ((bounds.x + bounds.width).ceil().max(0.0) as u32).min(image.width);
    let last_row = ((bounds.y + bounds.height).ceil().max(0.0) as u32).min(image.height);

    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut sum_squares = 0.0f64;
    for y in first_row..last_row {
        for x in first_column..last_column {
            let centre = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            if !shape.contains(centre) {
                continue;
            }
            if let Some(value) = image.value_at(x, y) {
                let value = f64::from(value);
                count += 1;
                sum += value;
                sum_squares += value * value;
            }
        }
    }

    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    let variance = (sum_squares / count as f64 - mean * mean).max(0.0);
    Some(RegionStats {
        mean,
        std_dev: variance.sqrt(),
        count,
    })
}

/// Annotations of every slice, keyed by the image they were drawn on.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    by_image: HashMap<ImageId, Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn add(&mut self, image_id: ImageId, annotation: Annotation) {
        log::debug!("{image_id}: {:?} annotation added", annotation.shape.tool());
        self.by_image.entry(image_id).or_default().push(annotation);
    }

    pub fn for_image(&self, image_id: &ImageId) -> &[Annotation] {
        self.by_image
            .get(image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_image.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.by_image.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, value: f32) -> StackImage {
        StackImage::gray(width, height, vec![value; (width * height) as usize])
    }

    #[test]
    fn zero_extent_drags_are_discarded() {
        let point = Point::new(3.0, 3.0);

        assert!(Shape::from_drag(AnnotationTool::Length, point, point).is_none());
        assert!(
            Shape::from_drag(AnnotationTool::Rectangle, point, Point::new(8.0, 3.0)).is_none()
        );
        assert!(Shape::from_drag(AnnotationTool::Ellipse, point, Point::new(3.0, 9.0)).is_none());
    }

    #[test]
    fn rectangle_is_normalised_whatever_the_drag_direction() {
        let shape = Shape::from_drag(
            AnnotationTool::Rectangle,
            Point::new(6.0, 5.0),
            Point::new(2.0, 1.0),
        );

        assert_eq!(
            shape,
            Some(Shape::Rectangle(Rectangle::new(
                Point::new(2.0, 1.0),
                Size::new(4.0, 4.0)
            )))
        );
    }

    #[test]
    fn length_uses_pixel_spacing_when_present() {
        let mut image = flat(10, 10, 0.0);
        let shape = Shape::Length {
            start: Point::new(0.0, 0.0),
            end: Point::new(3.0, 4.0),
        };

        assert_eq!(
            measure(&shape, &image),
            Measurement::Length {
                value: 5.0,
                unit: Unit::Pixel
            }
        );

        image.pixel_spacing = Some((2.0, 2.0));
        assert_eq!(
            measure(&shape, &image),
            Measurement::Length {
                value: 10.0,
                unit: Unit::Millimetre
            }
        );
    }

    #[test]
    fn rectangle_reports_area_and_statistics() {
        let mut values = vec![0.0; 16];
        for (index, value) in values.iter_mut().enumerate() {
            *value = if index % 2 == 0 { 10.0 } else { 30.0 };
        }
        let image = StackImage::gray(4, 4, values);
        let shape = Shape::Rectangle(Rectangle::new(Point::ORIGIN, Size::new(4.0, 4.0)));

        let Measurement::Region { area, unit, stats } = measure(&shape, &image) else {
            panic!("rectangle measures a region");
        };

        assert_eq!(area, 16.0);
        assert_eq!(unit, Unit::Pixel);
        let stats = stats.expect("grayscale slice has statistics");
        assert_eq!(stats.count, 16);
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.std_dev, 10.0);
    }

    #[test]
    fn ellipse_only_counts_pixels_inside_it() {
        let image = flat(10, 10, 7.0);
        let shape = Shape::Ellipse(Rectangle::new(Point::ORIGIN, Size::new(10.0, 10.0)));

        let Measurement::Region { area, stats, .. } = measure(&shape, &image) else {
            panic!("ellipse measures a region");
        };

        assert!((area - 25.0 * PI).abs() < 1e-3);
        let stats = stats.expect("grayscale slice has statistics");
        assert!(stats.count < 100);
        assert!(stats.count > 60);
        assert_eq!(stats.mean, 7.0);
    }

    #[test]
    fn store_keeps_annotations_per_image() {
        let image = flat(4, 4, 1.0);
        let mut store = AnnotationStore::default();
        let shape = Shape::Length {
            start: Point::ORIGIN,
            end: Point::new(1.0, 0.0),
        };

        store.add(ImageId::new("dicomfile:0"), Annotation::new(shape, &image));
        store.add(ImageId::new("dicomfile:0"), Annotation::new(shape, &image));

        assert_eq!(store.for_image(&ImageId::new("dicomfile:0")).len(), 2);
        assert!(store.for_image(&ImageId::new("dicomfile:1")).is_empty());
        store.clear();
        assert!(store.is_empty());
    }
}
