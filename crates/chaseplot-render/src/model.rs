use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RectData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: Option<f64>,
    #[serde(rename = "strokeFill")]
    pub stroke_fill: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalPos {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPos {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextData {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub fill: String,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    pub rotation: f64,
    #[serde(rename = "verticalPos")]
    pub vertical_pos: VerticalPos,
    #[serde(rename = "horizontalPos")]
    pub horizontal_pos: HorizontalPos,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathData {
    pub path: String,
    pub fill: Option<String>,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: Option<f64>,
    #[serde(rename = "strokeFill")]
    pub stroke_fill: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(rename = "strokeDasharray")]
    pub stroke_dasharray: Option<String>,
    #[serde(rename = "strokeOpacity")]
    pub stroke_opacity: Option<f64>,
}

impl PathData {
    pub fn stroke(path: String, stroke_fill: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            path,
            fill: None,
            fill_opacity: None,
            stroke_fill: stroke_fill.into(),
            stroke_width,
            stroke_dasharray: None,
            stroke_opacity: None,
        }
    }
}

/// One batch of primitives. `group_texts` is the nesting path of `<g class=..>` groups the batch
/// is emitted into; batches sharing a prefix share the groups. `clipped` batches are confined to
/// the plot area.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DrawableElem {
    #[serde(rename = "rect")]
    Rect {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        clipped: bool,
        data: Vec<RectData>,
    },
    #[serde(rename = "text")]
    Text {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        clipped: bool,
        data: Vec<TextData>,
    },
    #[serde(rename = "path")]
    Path {
        #[serde(rename = "groupTexts")]
        group_texts: Vec<String>,
        clipped: bool,
        data: Vec<PathData>,
    },
}

impl DrawableElem {
    pub fn group_texts(&self) -> &[String] {
        match self {
            Self::Rect { group_texts, .. }
            | Self::Text { group_texts, .. }
            | Self::Path { group_texts, .. } => group_texts,
        }
    }

    pub fn is_clipped(&self) -> bool {
        match self {
            Self::Rect { clipped, .. } | Self::Text { clipped, .. } | Self::Path { clipped, .. } => {
                *clipped
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub dasharray: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartLayout {
    /// Figure name, also used as the SVG root id.
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
    #[serde(rename = "plotArea")]
    pub plot_area: BoundingRect,
    /// Size range on the log2 axis, in bytes.
    #[serde(rename = "xDomain")]
    pub x_domain: (f64, f64),
    #[serde(rename = "yDomain")]
    pub y_domain: (f64, f64),
    #[serde(rename = "xTicks")]
    pub x_ticks: Vec<u64>,
    #[serde(rename = "yTicks")]
    pub y_ticks: Vec<f64>,
    pub legend: Vec<LegendEntry>,
    pub drawables: Vec<DrawableElem>,
}
