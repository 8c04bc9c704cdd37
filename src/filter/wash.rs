use std::fmt;

/// A `colorchannelmixer` wash that keeps each channel feeding only itself
///
/// Scaling red, green and blue independently tints the picture: dimming green
/// and blue leaves a red cast, dimming red leaves cyan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorWash {
    pub rr: f32,
    pub gg: f32,
    pub bb: f32,
}

/// Full red, half green and blue
pub const RED_WASH: ColorWash = ColorWash { rr: 1.0, gg: 0.5, bb: 0.5 };

/// Half red, full green and blue
pub const CYAN_WASH: ColorWash = ColorWash { rr: 0.5, gg: 1.0, bb: 1.0 };

impl ColorWash {
    pub const fn new(rr: f32, gg: f32, bb: f32) -> Self {
        Self { rr, gg, bb }
    }
}

fn coefficient(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for ColorWash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "colorchannelmixer=rr={}:gg={}:bb={}",
            coefficient(self.rr),
            coefficient(self.gg),
            coefficient(self.bb)
        )
    }
}
