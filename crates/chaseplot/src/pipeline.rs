//! Runs a whole [`FigurePlan`] against one dataset.
//!
//! Each figure is independent: a failure is recorded in its [`FigureOutcome`] and logged, and
//! the remaining figures are still rendered and written.

use crate::render::{Artifact, ChartError, RenderOptions, render_figure_svg, write_figure};
use chaseplot_core::{Dataset, FigurePlan, StyleContext};
use std::path::Path;

#[derive(Debug)]
pub struct FigureOutcome {
    pub name: String,
    pub result: Result<Vec<Artifact>, ChartError>,
}

impl FigureOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct PlanReport {
    pub outcomes: Vec<FigureOutcome>,
}

impl PlanReport {
    pub fn failures(&self) -> impl Iterator<Item = &FigureOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub fn run_plan(
    dataset: &Dataset,
    plan: &FigurePlan,
    ctx: &StyleContext,
    out_dir: &Path,
    options: &RenderOptions,
) -> PlanReport {
    let mut report = PlanReport::default();
    for spec in plan.expand() {
        let _span = tracing::info_span!("figure", name = %spec.name).entered();
        let result = render_figure_svg(dataset, &spec, ctx, options)
            .and_then(|svg| write_figure(out_dir, &spec.name, &svg, options));
        if let Err(err) = &result {
            tracing::error!(figure = %spec.name, "figure failed: {err}");
        }
        report.outcomes.push(FigureOutcome {
            name: spec.name,
            result,
        });
    }
    report
}
