#![forbid(unsafe_code)]

pub mod chart;
pub mod model;
pub mod svg;
pub mod text;

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use chaseplot_core::PercentileInterval;
use std::sync::Arc;

pub use chart::layout_chart;
pub use model::ChartLayout;
pub use svg::{SvgRenderOptions, render_chart_svg};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("figure `{figure}` has no data to draw")]
    EmptyFigure { figure: String },
    #[error("invalid figure `{figure}`: {message}")]
    InvalidFigure { figure: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    /// Spread drawn around each median.
    pub interval: PercentileInterval,
    pub background_color: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            width: 800.0,
            height: 600.0,
            font_size: 12.0,
            interval: PercentileInterval::FULL,
            background_color: "white".to_string(),
        }
    }
}

impl std::fmt::Debug for LayoutOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutOptions")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("font_size", &self.font_size)
            .field("interval", &self.interval)
            .field("background_color", &self.background_color)
            .finish_non_exhaustive()
    }
}
