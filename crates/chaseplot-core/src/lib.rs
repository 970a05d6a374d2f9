#![forbid(unsafe_code)]

//! Pointer-chasing benchmark records to styled figure inputs (headless).
//!
//! Design goals:
//! - records are validated once, at load time, and never mutated afterwards
//! - style assignment is a pure function of the figure request and an explicit [`StyleContext`]
//! - deterministic, ordered outputs (no hash-order iteration leaks into results)

pub mod cache;
pub mod error;
pub mod figure;
pub mod loader;
pub mod naming;
pub mod record;
pub mod select;
pub mod stats;
pub mod style;
pub mod summary;

pub use cache::{CacheBoundaries, CacheLevel, classify};
pub use error::{Error, Result};
pub use figure::{DEFAULT_YMAX, FigurePlan, FigureSpec, SeriesRef, YAxis};
pub use loader::{
    LoadOptions, Loaded, NameMode, ReferenceAlias, load_path, load_paths, load_reader, load_str,
};
pub use naming::{SeriesKey, StyleTag, display_name};
pub use record::{BenchmarkRecord, Dataset, NormalizedRecord};
pub use select::{Selection, StyledSeries, select};
pub use stats::{Metric, PercentileInterval};
pub use style::{DashPattern, Marker, Rgb, SeriesStyle, StyleContext};
pub use summary::{SummaryTable, summarize};
