use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("chaseplot-cli"));
    cmd.current_dir(repo_root());
    cmd
}

#[test]
fn cli_plots_plan_to_svg_and_png() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("plots");

    cli()
        .args([
            "plot",
            "--plan",
            fixture("plan.yaml").to_string_lossy().as_ref(),
            "--out-dir",
            out_dir.to_string_lossy().as_ref(),
            fixture("latency-release.json").to_string_lossy().as_ref(),
            fixture("batch-release.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    for name in ["latency-overview", "batching", "batching-zoom"] {
        let svg = fs::read_to_string(out_dir.join(format!("{name}.svg"))).expect("read svg");
        assert!(svg.starts_with("<svg"), "{name}.svg is not an SVG");

        let file = fs::File::open(out_dir.join(format!("{name}.png"))).expect("open png");
        let reader = png::Decoder::new(file).read_info().expect("decode png");
        assert_eq!((reader.info().width, reader.info().height), (800, 600));
    }
}

#[test]
fn cli_reports_failed_figures_but_writes_the_rest() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let plan = tmp.path().join("plan.json");
    fs::write(
        &plan,
        r#"{"figures": [
            {"name": "empty", "title": "Nothing", "series": ["no_such_series"]},
            {"name": "checked", "title": "Checked", "series": ["pointer_chasing_checked"]}
        ]}"#,
    )
    .expect("write plan");

    let output = cli()
        .args([
            "plot",
            "--format",
            "svg",
            "--plan",
            plan.to_string_lossy().as_ref(),
            "--out-dir",
            tmp.path().to_string_lossy().as_ref(),
            fixture("latency-release.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 2 figures failed"), "stderr: {stderr}");
    assert!(tmp.path().join("checked.svg").is_file());
    assert!(!tmp.path().join("checked.png").exists());
    assert!(!tmp.path().join("empty.svg").exists());
}

#[test]
fn cli_prints_summary_table() {
    let output = cli()
        .args([
            "summary",
            fixture("latency-release.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let mut lines = stdout.lines();
    let header = lines.next().expect("header");
    for col in ["L1 latency", "L2 cycles", "L3 latency", "RAM cycles"] {
        assert!(header.contains(col), "missing {col} in {header}");
    }
    assert!(lines.next().expect("separator").starts_with("|-"));
    assert!(stdout.lines().any(|l| l.starts_with("| Latency ")));
}

#[test]
fn cli_normalize_emits_derived_fields() {
    let output = cli()
        .args([
            "normalize",
            "--no-reference",
            fixture("batch-release.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let records = value.as_array().expect("array");
    assert!(!records.is_empty());
    let prefetch = records
        .iter()
        .find(|r| r["name"] == "batch_prefetch<16>")
        .expect("prefetch record");
    assert_eq!(prefetch["batch_size"], 16);
    assert_eq!(prefetch["color_group"], "batch");
    assert!(records.iter().all(|r| r["name"] != "latency"));
}

#[test]
fn cli_layout_emits_chart_json() {
    let output = cli()
        .args([
            "layout",
            "--figure",
            "batch-4",
            fixture("latency-release.json").to_string_lossy().as_ref(),
            fixture("batch-release.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let layouts = value.as_array().expect("array");
    assert_eq!(layouts.len(), 1);
    let layout = &layouts[0];
    assert_eq!(layout["name"], "batch-4");
    assert_eq!(layout["yDomain"][1], 85.0);
    assert!(layout["plotArea"]["width"].as_f64().expect("width") > 0.0);
    assert!(!layout["xTicks"].as_array().expect("ticks").is_empty());

    let drawables = layout["drawables"].as_array().expect("drawables");
    assert!(drawables.iter().any(|d| {
        d["type"] == "path" && d["groupTexts"] == serde_json::json!(["series", "line"])
    }));
    assert_eq!(layout["legend"][0]["label"], "Latency");
}

#[test]
fn cli_layout_rejects_unknown_figure() {
    cli()
        .args([
            "layout",
            "--figure",
            "nope",
            fixture("latency-release.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn cli_classifies_sizes() {
    let output = cli()
        .args(["classify", "4096", "1048576", "1073741824"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).expect("utf8"),
        "4096\tL1\n1048576\tL3\n1073741824\tRAM\n"
    );
}

#[test]
fn cli_rejects_bad_usage() {
    cli().assert().failure().code(2);
    cli().args(["plot"]).assert().failure().code(2);
    cli()
        .args(["plot", "--format", "gif", "in.json"])
        .assert()
        .failure()
        .code(2);
    cli()
        .args(["summary", "--reference", "x", "--no-reference", "in.json"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn cli_fails_on_missing_input() {
    let output = cli()
        .args(["summary", "does-not-exist.json"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist.json"));
}
