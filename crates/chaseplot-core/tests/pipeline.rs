use chaseplot_core::{
    CacheBoundaries, CacheLevel, DashPattern, FigurePlan, LoadOptions, Metric, SeriesStyle,
    StyleContext, StyleTag, classify, load_paths, load_str, select, summarize,
};
use std::collections::HashMap;
use std::path::PathBuf;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .expect("repo root")
}

#[test]
fn prefetch_variant_shares_group_and_gets_prefetch_dash() {
    let text = r#"[
        {"name": "pointer_chasing", "size": 1048576, "latency": 12.3, "cycles": 30},
        {"name": "pointer_chasing_prefetch", "size": 1048576, "latency": 8.1, "cycles": 20}
    ]"#;
    assert_eq!(classify(1048576.0), CacheLevel::L3);

    let loaded = load_str(text, &LoadOptions::default()).unwrap();
    let ds = loaded.dataset;
    assert_eq!(ds.len(), 2);
    assert!(ds.iter().all(|r| r.cache_level == CacheLevel::L3));

    let ctx = StyleContext::default();
    let sel = select(
        &ds,
        &["pointer_chasing", "pointer_chasing_prefetch"],
        0,
        &ctx,
    )
    .unwrap();
    let plain = sel.get("pointer_chasing").unwrap();
    let prefetch = sel.get("pointer_chasing_prefetch").unwrap();

    assert_eq!(plain.color_group, "pointer_chasing");
    assert_eq!(prefetch.color_group, "pointer_chasing");
    assert!(plain.style.palette_slot.is_some());
    assert_ne!(plain.style.color, ctx.reference_color);
    assert_eq!(prefetch.style_tag, StyleTag::Prefetch);
    assert_eq!(prefetch.style.dash, DashPattern::Dashed);
    assert_eq!(sel.max_value(Metric::Latency, None), Some(12.3));
}

#[test]
fn fixture_files_load_and_summarize() {
    let root = repo_root();
    let paths = [
        root.join("fixtures/latency-release.json"),
        root.join("fixtures/batch-release.json"),
    ];
    let loaded = load_paths(&paths, &LoadOptions::default()).unwrap();
    assert!(loaded.rejected.is_empty());

    let ds = &loaded.dataset;
    assert_eq!(ds.records()[0].name(), "latency");
    assert!(ds.names().contains(&"batch_prefetch<16>"));

    let table = summarize(ds, &CacheBoundaries::DEFAULT).unwrap();
    assert_eq!(table.rows[0].label, "Latency");
    assert!(table.cell("Pointer Chasing", CacheLevel::L1).is_some());
}

#[test]
fn default_plan_resolves_against_fixtures() {
    let root = repo_root();
    let paths = [
        root.join("fixtures/latency-release.json"),
        root.join("fixtures/batch-release.json"),
    ];
    let ds = load_paths(&paths, &LoadOptions::default()).unwrap().dataset;
    let ctx = StyleContext::default();

    for fig in FigurePlan::default_plan().expand() {
        let names = fig.resolve_series(&ds).unwrap();
        let sel = select(&ds, &names, fig.skip, &ctx).unwrap();
        assert!(!sel.is_empty(), "{} selected nothing", fig.name);
        if let Some(reference) = sel.get("latency") {
            assert_eq!(reference.style.color, ctx.reference_color);
        }
    }
}

#[test]
fn default_plan_keeps_series_styles_stable_across_figures() {
    let root = repo_root();
    let paths = [
        root.join("fixtures/latency-release.json"),
        root.join("fixtures/batch-release.json"),
    ];
    let ds = load_paths(&paths, &LoadOptions::default()).unwrap().dataset;
    let ctx = StyleContext::default();

    let mut seen: HashMap<String, (String, SeriesStyle)> = HashMap::new();
    let mut shared = 0;
    for fig in FigurePlan::default_plan().expand() {
        let names = fig.resolve_series(&ds).unwrap();
        let sel = select(&ds, &names, fig.skip, &ctx).unwrap();
        for s in sel.series() {
            match seen.get(s.name) {
                Some((first, style)) => {
                    shared += 1;
                    assert_eq!(
                        *style, s.style,
                        "{} styled differently in {first} and {}",
                        s.name, fig.name
                    );
                }
                None => {
                    seen.insert(s.name.to_string(), (fig.name.clone(), s.style));
                }
            }
        }
    }
    assert!(shared > 0);
    assert_eq!(seen["batch<16>"].1.palette_slot, Some(1));
}
