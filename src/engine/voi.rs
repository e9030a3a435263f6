/// Value-of-interest range mapped onto the display's grey ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiRange {
    pub lower: f64,
    pub upper: f64,
}

impl VoiRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn from_window(width: f64, center: f64) -> Self {
        let half = width.max(1.0) / 2.0;
        Self::new(center - half, center + half)
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn center(&self) -> f64 {
        (self.upper + self.lower) / 2.0
    }

    pub fn window_level(&self) -> (i64, i64) {
        (round_half_up(self.width()), round_half_up(self.center()))
    }

    pub fn display(&self) -> String {
        let (width, level) = self.window_level();
        format_window_level(width, level)
    }

    /// Maps a stored value onto 0..=255.
    pub fn apply(&self, value: f32) -> u8 {
        let width = self.width();
        if width <= 0.0 {
            return if f64::from(value) >= self.upper { 255 } else { 0 };
        }
        let normalized = (f64::from(value) - self.lower) / width;
        (normalized * 255.0).clamp(0.0, 255.0).round() as u8
    }
}

pub fn format_window_level(width: i64, level: i64) -> String {
    format!("W {width} / L {level}")
}

/// Half-way cases round toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
