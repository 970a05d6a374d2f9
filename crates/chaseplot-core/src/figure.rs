//! Figure requests and figure plans.
//!
//! A [`FigureSpec`] is everything one chart needs besides the data. A [`FigurePlan`] is an
//! ordered list of them, loaded from JSON or YAML or taken from [`FigurePlan::default_plan`].

use crate::record::Dataset;
use crate::stats::Metric;
use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shared y-axis ceiling (ns) of the built-in figures.
pub const DEFAULT_YMAX: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxis {
    Latency,
    #[default]
    InverseThroughput,
}

/// One entry of a figure's series list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesRef {
    Name(String),
    /// Every dataset series whose name contains the substring.
    Contains { contains: String },
    /// Every dataset series whose name matches the regular expression.
    Matches { matches: String },
}

impl From<&str> for SeriesRef {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureSpec {
    /// File stem of the written artifacts.
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub series: Vec<SeriesRef>,
    /// Palette rotation, see [`crate::select::select`].
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub ymax: Option<f64>,
    #[serde(default)]
    pub xmax: Option<u64>,
    #[serde(default)]
    pub y_axis: YAxis,
    #[serde(default)]
    pub metric: Metric,
    /// Also produce a `<name>-zoom` figure limited to sizes <= this cutoff.
    #[serde(default)]
    pub zoom: Option<u64>,
    /// Only sizes <= this value are considered when auto-scaling the y axis.
    #[serde(default)]
    pub autoscale_cutoff: Option<u64>,
}

impl FigureSpec {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            series: Vec::new(),
            skip: 0,
            ymax: None,
            xmax: None,
            y_axis: YAxis::default(),
            metric: Metric::default(),
            zoom: None,
            autoscale_cutoff: None,
        }
    }

    pub fn with_series<I, S>(mut self, series: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SeriesRef>,
    {
        self.series = series.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_ymax(mut self, ymax: f64) -> Self {
        self.ymax = Some(ymax);
        self
    }

    pub fn with_y_axis(mut self, y_axis: YAxis) -> Self {
        self.y_axis = y_axis;
        self
    }

    pub fn y_label(&self) -> &'static str {
        match (self.metric, self.y_axis) {
            (Metric::Cycles, _) => "Cycles",
            (Metric::Latency, YAxis::Latency) => "Latency (ns)",
            (Metric::Latency, YAxis::InverseThroughput) => "Inverse throughput (ns)",
        }
    }

    /// The zoomed companion figure: x axis ends at the cutoff and y autoscale ignores larger
    /// sizes.
    pub fn zoomed(&self, cutoff: u64) -> Self {
        Self {
            name: format!("{}-zoom", self.name),
            xmax: Some(cutoff),
            zoom: None,
            autoscale_cutoff: Some(cutoff),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("figure name is empty"));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(Error::config(format!(
                "figure name `{}` must be a plain file stem",
                self.name
            )));
        }
        if self.series.is_empty() {
            return Err(Error::config(format!(
                "figure `{}` must reference at least one series",
                self.name
            )));
        }
        if let Some(ymax) = self.ymax {
            if !(ymax.is_finite() && ymax > 0.0) {
                return Err(Error::config(format!(
                    "figure `{}`: ymax must be a positive number",
                    self.name
                )));
            }
        }
        if self.xmax == Some(0) || self.zoom == Some(0) {
            return Err(Error::config(format!(
                "figure `{}`: size limits must be positive",
                self.name
            )));
        }
        Ok(())
    }

    /// Expands pattern references against the dataset's series names (first-seen order) and
    /// removes duplicates.
    pub fn resolve_series(&self, dataset: &Dataset) -> Result<Vec<String>> {
        let names = dataset.names();
        let mut out: IndexSet<String> = IndexSet::new();
        for r in &self.series {
            match r {
                SeriesRef::Name(name) => {
                    out.insert(name.clone());
                }
                SeriesRef::Contains { contains } => {
                    out.extend(
                        names
                            .iter()
                            .filter(|n| n.contains(contains.as_str()))
                            .map(|n| n.to_string()),
                    );
                }
                SeriesRef::Matches { matches } => {
                    let re = regex::Regex::new(matches).map_err(|e| {
                        Error::config(format!(
                            "figure `{}`: invalid series pattern `{matches}`: {e}",
                            self.name
                        ))
                    })?;
                    out.extend(
                        names
                            .iter()
                            .filter(|n| re.is_match(n))
                            .map(|n| n.to_string()),
                    );
                }
            }
        }
        Ok(out.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigurePlan {
    pub figures: Vec<FigureSpec>,
}

impl FigurePlan {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::config(format!("invalid plan: {e}")))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::config(format!("invalid plan: {e}")))
    }

    /// Reads a plan file; `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    /// Figures in plan order, each followed by its zoomed companion when `zoom` is set.
    pub fn expand(&self) -> Vec<FigureSpec> {
        let mut out = Vec::with_capacity(self.figures.len());
        for fig in &self.figures {
            match fig.zoom {
                Some(cutoff) => {
                    let zoomed = fig.zoomed(cutoff);
                    out.push(FigureSpec {
                        zoom: None,
                        ..fig.clone()
                    });
                    out.push(zoomed);
                }
                None => out.push(fig.clone()),
            }
        }
        out
    }

    /// The standard sequence: five latency figures that progressively optimise the pointer
    /// chase, then four batching figures compared against the `latency` baseline.
    ///
    /// Every figure except the saturation close-up shares a fixed y range of
    /// [`DEFAULT_YMAX`] ns so the sequence can be compared side by side. The batching figures all
    /// list `latency` then `batch<N>` first, so with `skip` 0 the `batch` group keeps slot 1
    /// throughout.
    pub fn default_plan() -> Self {
        let mut figures = Vec::new();

        let latency = |name: &str, title: &str, series: &[&str], skip: i64| {
            FigureSpec::new(name, title)
                .with_series(series.iter().copied())
                .with_skip(skip)
                .with_y_axis(YAxis::Latency)
                .with_ymax(DEFAULT_YMAX)
        };
        figures.push(latency(
            "latency-1",
            "Pointer chasing latency",
            &["pointer_chasing_checked"],
            0,
        ));
        figures.push(latency(
            "latency-2",
            "Unchecked indexing",
            &["pointer_chasing_checked", "pointer_chasing"],
            0,
        ));
        figures.push(latency(
            "latency-3",
            "Padding to 64 bytes cachelines",
            &["pointer_chasing", "pointer_chasing_padded"],
            1,
        ));
        figures.push(latency(
            "latency-4",
            "Using raw pointers",
            &["pointer_chasing_padded", "raw_pointer_chasing_padded"],
            2,
        ));
        figures.push(latency(
            "latency-5",
            "2MB aligned hugepages",
            &[
                "pointer_chasing_padded",
                "raw_pointer_chasing_padded",
                "pointer_chasing_padded_aligned",
                "raw_pointer_chasing_padded_aligned",
            ],
            2,
        ));

        figures.push(
            FigureSpec::new("batch-1", "Batch")
                .with_series([
                    "latency",
                    "batch<1>",
                    "batch<2>",
                    "batch<4>",
                    "batch<8>",
                    "batch<16>",
                    "batch<32>",
                ])
                .with_ymax(DEFAULT_YMAX),
        );
        figures.push(
            FigureSpec::new("batch-2", "Saturating batch size")
                .with_series([
                    "latency",
                    "batch<10>",
                    "batch<11>",
                    "batch<12>",
                    "batch<13>",
                    "batch<16>",
                ])
                .with_ymax(9.0),
        );

        let mut with_work = FigureSpec::new("batch-3", "Batching with work")
            .with_series(["latency", "batch<16>"])
            .with_ymax(DEFAULT_YMAX);
        with_work.series.push(SeriesRef::Contains {
            contains: "batch_work".to_string(),
        });
        figures.push(with_work);

        let mut prefetching = FigureSpec::new("batch-4", "Prefetching")
            .with_series(["latency", "batch<16>", "batch_prefetch<16>"])
            .with_ymax(DEFAULT_YMAX);
        prefetching.series.push(SeriesRef::Contains {
            contains: "work".to_string(),
        });
        figures.push(prefetching);

        Self { figures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadOptions, load_str};

    fn dataset() -> Dataset {
        let text = r#"[
            {"name": "batch<16>", "size": 64, "latency": 1.0},
            {"name": "batch_work3<16>", "size": 64, "latency": 1.0},
            {"name": "batch_prefetch_work3<16>", "size": 64, "latency": 1.0},
            {"name": "batch_work6<16>", "size": 64, "latency": 1.0}
        ]"#;
        load_str(text, &LoadOptions::default()).unwrap().dataset
    }

    #[test]
    fn contains_and_matches_expand_in_dataset_order() {
        let ds = dataset();
        let fig = FigureSpec::new("f", "F").with_series([
            SeriesRef::from("latency"),
            SeriesRef::Contains {
                contains: "batch_work".to_string(),
            },
            SeriesRef::Matches {
                matches: r"^batch(_work\d+)?<16>$".to_string(),
            },
        ]);
        assert_eq!(
            fig.resolve_series(&ds).unwrap(),
            ["latency", "batch_work3<16>", "batch_work6<16>", "batch<16>"]
        );
    }

    #[test]
    fn invalid_regex_is_a_config_error() {
        let fig = FigureSpec::new("f", "F").with_series([SeriesRef::Matches {
            matches: "(".to_string(),
        }]);
        assert!(matches!(
            fig.resolve_series(&dataset()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn zoom_expands_into_two_figures() {
        let mut fig = FigureSpec::new("batch-1", "Batch").with_series(["batch<16>"]);
        fig.zoom = Some(1 << 20);
        let plan = FigurePlan {
            figures: vec![fig],
        };
        let expanded = plan.expand();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].name, "batch-1");
        assert_eq!(expanded[0].xmax, None);
        assert_eq!(expanded[1].name, "batch-1-zoom");
        assert_eq!(expanded[1].xmax, Some(1 << 20));
        assert_eq!(expanded[1].autoscale_cutoff, Some(1 << 20));
    }

    #[test]
    fn plans_parse_from_yaml_and_json() {
        let yaml = r#"
figures:
  - name: batch-3
    title: Batching with work
    series:
      - latency
      - contains: batch_work
    skip: 2
    ymax: 12.5
    y_axis: latency
"#;
        let plan = FigurePlan::from_yaml(yaml).unwrap();
        let fig = &plan.figures[0];
        assert_eq!(fig.skip, 2);
        assert_eq!(fig.ymax, Some(12.5));
        assert_eq!(fig.y_label(), "Latency (ns)");
        assert_eq!(
            fig.series[1],
            SeriesRef::Contains {
                contains: "batch_work".to_string()
            }
        );

        let json = r#"{"figures": [{"name": "a", "series": ["x"], "metric": "cycles"}]}"#;
        let plan = FigurePlan::from_json(json).unwrap();
        assert_eq!(plan.figures[0].y_label(), "Cycles");
        assert_eq!(plan.figures[0].y_axis, YAxis::InverseThroughput);
    }

    #[test]
    fn unknown_plan_fields_are_rejected() {
        let json = r#"{"figures": [{"name": "a", "series": ["x"], "colour": "red"}]}"#;
        assert!(FigurePlan::from_json(json).is_err());
    }

    #[test]
    fn validation_rejects_bad_figures() {
        let empty = FigureSpec::new("a", "A");
        assert!(empty.validate().is_err());
        let path = FigureSpec::new("../a", "A").with_series(["x"]);
        assert!(path.validate().is_err());
        let ymax = FigureSpec::new("a", "A").with_series(["x"]).with_ymax(f64::NAN);
        assert!(ymax.validate().is_err());
        assert!(FigureSpec::new("a", "A").with_series(["x"]).validate().is_ok());
    }

    #[test]
    fn default_plan_is_valid() {
        let plan = FigurePlan::default_plan();
        assert_eq!(plan.figures.len(), 9);
        for fig in plan.expand() {
            fig.validate().unwrap();
        }
        assert_eq!(plan.figures[1].series.len(), 2);
        assert_eq!(plan.figures[6].ymax, Some(9.0));
        for (i, fig) in plan.figures.iter().enumerate().filter(|(i, _)| *i != 6) {
            assert_eq!(fig.ymax, Some(DEFAULT_YMAX), "figure {i}");
        }
    }
}
