use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Mixes toward white; `amount` 0 keeps the colour, 1 yields white.
    pub fn lighten(self, amount: f64) -> Rgb {
        let t = amount.clamp(0.0, 1.0);
        let mix = |c: u8| -> u8 { (c as f64 + (255.0 - c as f64) * t).round() as u8 };
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }

    pub fn parse_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Rgb(r, g, b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Ten-colour categorical palette.
pub const TAB10: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashPattern {
    #[default]
    Solid,
    /// On/off 1:1.
    Dotted,
    /// On/off 2:1.
    Dashed,
}

impl DashPattern {
    /// SVG `stroke-dasharray` value scaled to the stroke width, `None` for solid lines.
    pub fn dasharray(self, stroke_width: f64) -> Option<String> {
        let unit = stroke_width.max(0.5) * 2.0;
        match self {
            Self::Solid => None,
            Self::Dotted => Some(format!("{unit} {unit}")),
            Self::Dashed => Some(format!("{} {unit}", unit * 2.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    #[default]
    None,
    Circle,
    Square,
    Diamond,
    TriangleUp,
    TriangleDown,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SeriesStyle {
    pub color: Rgb,
    pub dash: DashPattern,
    pub marker: Marker,
    /// Palette index the colour came from; `None` for the reserved reference style.
    pub palette_slot: Option<usize>,
}

impl SeriesStyle {
    pub fn reference(color: Rgb) -> Self {
        Self {
            color,
            dash: DashPattern::Solid,
            marker: Marker::None,
            palette_slot: None,
        }
    }
}

/// Everything style assignment depends on besides the data itself. Built once and passed by
/// reference to each figure; it is never mutated, so figures cannot influence each other.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleContext {
    pub palette: Vec<Rgb>,
    pub reference_color: Rgb,
    pub prefetch_dash: DashPattern,
    pub markers: Vec<Marker>,
    /// Lightening applied per batch-size rank inside a colour group.
    pub lighten_step: f64,
    pub max_lighten: f64,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self {
            palette: TAB10.to_vec(),
            reference_color: Rgb::BLACK,
            prefetch_dash: DashPattern::Dashed,
            markers: vec![
                Marker::Circle,
                Marker::Square,
                Marker::Diamond,
                Marker::TriangleUp,
                Marker::TriangleDown,
                Marker::Cross,
            ],
            lighten_step: 0.12,
            max_lighten: 0.6,
        }
    }
}

impl StyleContext {
    /// Palette slot for the `index`-th colour group after rotating by `skip`.
    pub fn slot(&self, index: usize, skip: i64) -> usize {
        let len = self.palette.len().max(1) as i64;
        (index as i64 + skip).rem_euclid(len) as usize
    }
}
