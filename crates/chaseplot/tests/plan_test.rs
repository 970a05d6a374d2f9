use chaseplot::pipeline::run_plan;
use chaseplot::render::{ArtifactFormat, ChartError, RenderOptions, write_figure};
use chaseplot::{FigurePlan, FigureSpec, LoadOptions, StyleContext, load_paths};
use std::path::PathBuf;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn svg_only() -> RenderOptions {
    RenderOptions {
        formats: vec![ArtifactFormat::Svg],
        ..RenderOptions::default()
    }
}

#[test]
fn failing_figures_do_not_stop_the_plan() {
    let root = repo_root();
    let ds = load_paths(
        &[root.join("fixtures").join("latency-release.json")],
        &LoadOptions::default(),
    )
    .expect("load ok")
    .dataset;

    let plan = FigurePlan {
        figures: vec![
            FigureSpec::new("missing", "Nothing here").with_series(["no_such_series"]),
            FigureSpec::new("latency-2", "Unchecked indexing")
                .with_series(["pointer_chasing_checked", "pointer_chasing"]),
        ],
    };
    let out = tempfile::tempdir().expect("tempdir");
    let report = run_plan(
        &ds,
        &plan,
        &StyleContext::default(),
        out.path(),
        &svg_only(),
    );

    assert_eq!(report.outcomes.len(), 2);
    let failures: Vec<&str> = report.failures().map(|o| o.name.as_str()).collect();
    assert_eq!(failures, ["missing"]);
    assert!(!report.is_success());

    let written = out.path().join("latency-2.svg");
    let svg = std::fs::read_to_string(&written).expect("svg written");
    roxmltree::Document::parse(&svg).expect("valid svg");
    assert_eq!(report.artifacts().count(), 1);
    assert!(!out.path().join("missing.svg").exists());
}

#[test]
fn zoom_figures_are_written_alongside_the_full_figure() {
    let root = repo_root();
    let ds = load_paths(
        &[root.join("fixtures").join("latency-release.json")],
        &LoadOptions::default(),
    )
    .expect("load ok")
    .dataset;

    let mut fig = FigureSpec::new("latency-5", "Aligned").with_series([
        "pointer_chasing_padded_aligned",
        "raw_pointer_chasing_padded_aligned",
    ]);
    fig.zoom = Some(1 << 20);
    let out = tempfile::tempdir().expect("tempdir");
    let report = run_plan(
        &ds,
        &FigurePlan { figures: vec![fig] },
        &StyleContext::default(),
        out.path(),
        &svg_only(),
    );

    assert!(report.is_success());
    assert!(out.path().join("latency-5.svg").is_file());
    assert!(out.path().join("latency-5-zoom.svg").is_file());
}

#[test]
fn write_errors_name_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").expect("write");

    let err = write_figure(&blocker, "f", "<svg/>", &svg_only()).unwrap_err();
    match err {
        ChartError::Io { path, .. } => assert_eq!(path, blocker),
        other => panic!("unexpected error: {other}"),
    }
}
