use iced::{Point, Size, Vector};

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 20.0;

/// `zoom` is relative to fitting the whole image inside the element;
/// `focal` is the image point drawn at the element centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f32,
    pub focal: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            focal: Point::ORIGIN,
        }
    }
}

impl Camera {
    pub fn fitted(image: Size) -> Self {
        Self {
            zoom: 1.0,
            focal: Point::new(image.width / 2.0, image.height / 2.0),
        }
    }

    /// Screen pixels per image pixel.
    pub fn scale(&self, image: Size, element: Size) -> f32 {
        if image.width <= 0.0 || image.height <= 0.0 {
            return self.zoom;
        }
        let fit = (element.width / image.width).min(element.height / image.height);
        fit.max(f32::EPSILON) * self.zoom
    }

    pub fn image_to_screen(&self, point: Point, image: Size, element: Size) -> Point {
        let scale = self.scale(image, element);
        Point::new(
            element.width / 2.0 + (point.x - self.focal.x) * scale,
            element.height / 2.0 + (point.y - self.focal.y) * scale,
        )
    }

    pub fn screen_to_image(&self, point: Point, image: Size, element: Size) -> Point {
        let scale = self.scale(image, element);
        Point::new(
            self.focal.x + (point.x - element.width / 2.0) / scale,
            self.focal.y + (point.y - element.height / 2.0) / scale,
        )
    }

    pub fn pan(&mut self, screen_delta: Vector, image: Size, element: Size) {
        let scale = self.scale(image, element);
        self.focal = Point::new(
            self.focal.x - screen_delta.x / scale,
            self.focal.y - screen_delta.y / scale,
        );
    }

    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Top-left corner and size, in image pixels, of the area the element shows.
    pub fn visible_region(&self, image: Size, element: Size) -> (Point, Size) {
        let scale = self.scale(image, element);
        let size = Size::new(element.width / scale, element.height / scale);
        let origin = Point::new(
            self.focal.x - size.width / 2.0,
            self.focal.y - size.height / 2.0,
        );
        (origin, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: Size = Size {
        width: 100.0,
        height: 50.0,
    };
    const ELEMENT: Size = Size {
        width: 400.0,
        height: 400.0,
    };

    #[test]
    fn fitted_camera_maps_image_centre_to_element_centre() {
        let camera = Camera::fitted(IMAGE);

        assert_eq!(camera.scale(IMAGE, ELEMENT), 4.0);
        assert_eq!(
            camera.image_to_screen(Point::new(50.0, 25.0), IMAGE, ELEMENT),
            Point::new(200.0, 200.0)
        );
        assert_eq!(
            camera.screen_to_image(Point::new(0.0, 200.0), IMAGE, ELEMENT),
            Point::new(0.0, 25.0)
        );
    }

    #[test]
    fn pan_moves_the_focal_point_against_the_drag() {
        let mut camera = Camera::fitted(IMAGE);

        camera.pan(Vector::new(40.0, -20.0), IMAGE, ELEMENT);

        assert_eq!(camera.focal, Point::new(40.0, 30.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::fitted(IMAGE);

        camera.zoom_by(1000.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.zoom_by(0.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.zoom_by(0.0001);
        assert_eq!(camera.zoom, MIN_ZOOM);
    }

    #[test]
    fn visible_region_shrinks_when_zooming_in() {
        let mut camera = Camera::fitted(IMAGE);
        camera.zoom_by(2.0);

        let (origin, size) = camera.visible_region(IMAGE, ELEMENT);

        assert_eq!(size, Size::new(50.0, 50.0));
        assert_eq!(origin, Point::new(25.0, 0.0));
    }
}
