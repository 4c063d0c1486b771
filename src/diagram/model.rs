use crate::error::UnknownViewError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STROKE_WIDTH: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewId {
    Anterior,
    Posterior,
    LeftLateral,
    RightLateral,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [
        ViewId::Anterior,
        ViewId::Posterior,
        ViewId::LeftLateral,
        ViewId::RightLateral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewId::Anterior => "anterior",
            ViewId::Posterior => "posterior",
            ViewId::LeftLateral => "left-lateral",
            ViewId::RightLateral => "right-lateral",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewId::Anterior => "Anterior",
            ViewId::Posterior => "Posterior",
            ViewId::LeftLateral => "Left lateral",
            ViewId::RightLateral => "Right lateral",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewId {
    type Err = UnknownViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ViewId::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownViewError::new(name))
    }
}

/// Opaque RGB stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Self = Self::rgb(220, 38, 38);
    pub const BLUE: Self = Self::rgb(37, 99, 235);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            anyhow::bail!("expected a #rrggbb color, got {s:?}");
        }
        let channel = |range: std::ops::Range<usize>| -> anyhow::Result<u8> {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|err| anyhow::anyhow!("invalid color {s:?}: {err}"))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    #[default]
    FreehandPain,
    FreehandRestriction,
    Point,
    TriggerPoint,
}

impl DrawMode {
    pub const ALL: [DrawMode; 4] = [
        DrawMode::FreehandPain,
        DrawMode::FreehandRestriction,
        DrawMode::Point,
        DrawMode::TriggerPoint,
    ];

    pub fn is_freehand(self) -> bool {
        matches!(self, DrawMode::FreehandPain | DrawMode::FreehandRestriction)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrawMode::FreehandPain => "freehand-pain",
            DrawMode::FreehandRestriction => "freehand-restriction",
            DrawMode::Point => "point",
            DrawMode::TriggerPoint => "trigger-point",
        }
    }

    pub fn legend(self) -> LegendEntry {
        let (label, dashed) = match self {
            DrawMode::FreehandPain => ("Pain region", false),
            DrawMode::FreehandRestriction => ("Movement restriction", true),
            DrawMode::Point => ("Point of pain", false),
            DrawMode::TriggerPoint => ("Trigger point", false),
        };
        LegendEntry {
            mode: self,
            label,
            dashed,
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        DrawMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("unknown drawing mode: {name}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub mode: DrawMode,
    pub label: &'static str,
    pub dashed: bool,
}

/// Legend rows in the order they are shown next to the diagram.
pub fn legend() -> Vec<LegendEntry> {
    DrawMode::ALL.into_iter().map(DrawMode::legend).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub mode: DrawMode,
    pub color: Color,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(mode: DrawMode, color: Color, width: f32) -> Self {
        Self { mode, color, width }.sanitized()
    }

    /// Non-finite or non-positive widths fall back to the default width.
    pub fn sanitized(mut self) -> Self {
        if !self.width.is_finite() || self.width <= 0.0 {
            self.width = DEFAULT_STROKE_WIDTH;
        }
        self
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            mode: DrawMode::default(),
            color: Color::default(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }
}

/// Canvas-local sample position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// One pointer-down-to-pointer-up gesture. Freehand strokes carry every
/// sample; point and trigger-point strokes carry exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub style: StrokeStyle,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(style: StrokeStyle, origin: Point) -> Self {
        Self {
            style: style.sanitized(),
            points: vec![origin],
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.style.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_ids_parse_from_wire_names() {
        for view in ViewId::ALL {
            assert_eq!(view.as_str().parse::<ViewId>(), Ok(view));
        }
        assert_eq!("Left-Lateral".parse::<ViewId>(), Ok(ViewId::LeftLateral));
    }

    #[test]
    fn unknown_view_name_is_rejected() {
        let err = "dorsal".parse::<ViewId>().unwrap_err();
        assert_eq!(err.name, "dorsal");
    }

    #[test]
    fn view_ids_serialize_kebab_case() {
        let json = serde_json::to_string(&ViewId::RightLateral).unwrap();
        assert_eq!(json, "\"right-lateral\"");
    }

    #[test]
    fn color_hex_round_trip() {
        let color: Color = "#1a2B3c".parse().unwrap();
        assert_eq!(color, Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_hex(), "#1a2b3c");
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zz0000".parse::<Color>().is_err());
    }

    #[test]
    fn style_sanitizes_invalid_widths() {
        assert_eq!(
            StrokeStyle::new(DrawMode::Point, Color::BLACK, 0.0).width,
            DEFAULT_STROKE_WIDTH
        );
        assert_eq!(
            StrokeStyle::new(DrawMode::Point, Color::BLACK, f32::NAN).width,
            DEFAULT_STROKE_WIDTH
        );
        assert_eq!(StrokeStyle::new(DrawMode::Point, Color::BLACK, 7.5).width, 7.5);
    }

    #[test]
    fn only_restriction_legend_is_dashed() {
        let dashed: Vec<_> = legend()
            .into_iter()
            .filter(|entry| entry.dashed)
            .map(|entry| entry.mode)
            .collect();
        assert_eq!(dashed, vec![DrawMode::FreehandRestriction]);
    }
}
