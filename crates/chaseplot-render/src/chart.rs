//! Layout of one latency-vs-size figure.
//!
//! The x axis is logarithmic (base 2) over working-set size, the y axis linear from zero. Every
//! coordinate is computed here; the SVG writer only serializes the resulting drawables.

use crate::model::{
    BoundingRect, ChartLayout, DrawableElem, HorizontalPos, LegendEntry, PathData, RectData,
    TextData, VerticalPos,
};
use crate::svg::{fmt, fmt_path};
use crate::text::TextStyle;
use crate::{Error, LayoutOptions, Result};
use chaseplot_core::cache::CacheBoundaries;
use chaseplot_core::figure::FigureSpec;
use chaseplot_core::select::{Selection, StyledSeries};
use chaseplot_core::stats::{SizeStats, aggregate_by_size};
use chaseplot_core::style::{DashPattern, Marker};

const PAD: f64 = 10.0;
const TICK_LEN: f64 = 4.0;
const LINE_WIDTH: f64 = 1.5;
const MARKER_RADIUS: f64 = 3.0;
const BAND_OPACITY: f64 = 0.2;
const GRID_COLOR: &str = "#b0b0b0";
const GRID_OPACITY: f64 = 0.4;
const BOUNDARY_COLOR: &str = "red";
const TEXT_COLOR: &str = "#222222";
const PREFETCH_LEGEND_COLOR: &str = "#555555";
const Y_TICK_COUNT: usize = 6;
const MAX_LABELLED_X_TICKS: usize = 12;
const X_AXIS_TITLE: &str = "Array Size (bytes)";

/// d3-array `ticks`: round values covering `[start, stop]`, roughly `count` of them.
pub(crate) fn d3_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
        let step = (stop - start) / count;
        if !step.is_finite() || step == 0.0 {
            return None;
        }
        let power = step.log10().floor();
        let error = step / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        let (i1, i2, inc) = if power < 0.0 {
            let inc = 10f64.powf(-power) / factor;
            let mut i1 = (start * inc).round() as i64;
            let mut i2 = (stop * inc).round() as i64;
            if (i1 as f64) / inc < start {
                i1 += 1;
            }
            if (i2 as f64) / inc > stop {
                i2 -= 1;
            }
            (i1, i2, -inc)
        } else {
            let inc = 10f64.powf(power) * factor;
            let mut i1 = (start / inc).round() as i64;
            let mut i2 = (stop / inc).round() as i64;
            if (i1 as f64) * inc < start {
                i1 += 1;
            }
            if (i2 as f64) * inc > stop {
                i2 -= 1;
            }
            (i1, i2, inc)
        };

        if i2 < i1 && (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        (inc.is_finite() && inc != 0.0).then_some((i1, i2, inc))
    }

    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (a, b) = (start.min(stop), start.max(stop));
    let Some((i1, i2, inc)) = tick_spec(a, b, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }

    let mut out: Vec<f64> = (i1..=i2)
        .map(|i| {
            if inc < 0.0 {
                i as f64 / -inc
            } else {
                i as f64 * inc
            }
        })
        .collect();
    if stop < start {
        out.reverse();
    }
    out
}

/// `1024` -> `1K`, `3 << 20` -> `3M`; sizes that are not a whole unit print in bytes.
pub fn binary_size_label(size: u64) -> String {
    const UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];
    let mut value = size;
    let mut unit = 0;
    while unit + 1 < UNITS.len() && value >= 1024 && value % 1024 == 0 {
        value /= 1024;
        unit += 1;
    }
    format!("{value}{}", UNITS[unit])
}

fn tick_label(v: f64) -> String {
    fmt((v * 1e6).round() / 1e6)
}

fn line_path(points: &[(f64, f64)]) -> Option<String> {
    let (first, rest) = points.split_first()?;
    let mut out = format!("M{},{}", fmt_path(first.0), fmt_path(first.1));
    if rest.is_empty() {
        out.push('Z');
        return Some(out);
    }
    for p in rest {
        out.push_str(&format!("L{},{}", fmt_path(p.0), fmt_path(p.1)));
    }
    Some(out)
}

fn marker_path(marker: Marker, x: f64, y: f64, r: f64) -> Option<String> {
    let (x0, x1, y0, y1) = (
        fmt_path(x - r),
        fmt_path(x + r),
        fmt_path(y - r),
        fmt_path(y + r),
    );
    let (cx, cy) = (fmt_path(x), fmt_path(y));
    let d = match marker {
        Marker::None => return None,
        Marker::Circle => {
            let rr = fmt_path(r);
            let dd = fmt_path(2.0 * r);
            format!("M{x0},{cy}a{rr},{rr} 0 1,0 {dd},0a{rr},{rr} 0 1,0 -{dd},0Z")
        }
        Marker::Square => format!("M{x0},{y0}L{x1},{y0}L{x1},{y1}L{x0},{y1}Z"),
        Marker::Diamond => format!("M{cx},{y0}L{x1},{cy}L{cx},{y1}L{x0},{cy}Z"),
        Marker::TriangleUp => format!("M{cx},{y0}L{x1},{y1}L{x0},{y1}Z"),
        Marker::TriangleDown => format!("M{cx},{y1}L{x1},{y0}L{x0},{y0}Z"),
        Marker::Cross => format!("M{x0},{y0}L{x1},{y1}M{x0},{y1}L{x1},{y0}"),
    };
    Some(d)
}

fn text(
    text: impl Into<String>,
    (x, y): (f64, f64),
    font_size: f64,
    horizontal_pos: HorizontalPos,
    vertical_pos: VerticalPos,
) -> TextData {
    TextData {
        text: text.into(),
        x,
        y,
        fill: TEXT_COLOR.to_string(),
        font_size,
        rotation: 0.0,
        vertical_pos,
        horizontal_pos,
    }
}

fn group(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

struct Plotted<'s, 'a> {
    series: &'s StyledSeries<'a>,
    stats: Vec<SizeStats>,
}

pub fn layout_chart(
    spec: &FigureSpec,
    selection: &Selection<'_>,
    boundaries: &CacheBoundaries,
    options: &LayoutOptions,
) -> Result<ChartLayout> {
    let invalid = |message: String| Error::InvalidFigure {
        figure: spec.name.clone(),
        message,
    };
    if let Some(ymax) = spec.ymax {
        if !(ymax.is_finite() && ymax > 0.0) {
            return Err(invalid(format!("ymax must be a positive number, got {ymax}")));
        }
    }
    if spec.xmax == Some(0) {
        return Err(invalid("xmax must be positive".to_string()));
    }
    if selection.is_empty() {
        return Err(Error::EmptyFigure {
            figure: spec.name.clone(),
        });
    }

    let xmax = spec.xmax;
    let mut plotted: Vec<Plotted<'_, '_>> = Vec::new();
    for s in selection.series() {
        let records = s
            .records
            .iter()
            .copied()
            .filter(|r| xmax.is_none_or(|m| r.size() <= m));
        let stats = aggregate_by_size(records, spec.metric, options.interval);
        if stats.is_empty() {
            tracing::debug!(figure = %spec.name, series = s.name, "series has no points to draw");
            continue;
        }
        plotted.push(Plotted { series: s, stats });
    }

    let sizes = || plotted.iter().flat_map(|p| p.stats.iter().map(|s| s.size));
    let (Some(min_size), Some(max_size)) = (sizes().min(), sizes().max()) else {
        return Err(Error::EmptyFigure {
            figure: spec.name.clone(),
        });
    };

    let x_lo = (min_size as f64).min(boundaries.l1);
    let x_hi = match xmax {
        Some(m) => m as f64,
        None => (max_size as f64).max(boundaries.l3),
    }
    .max(x_lo * 2.0);
    let (lx0, lx1) = (x_lo.log2(), x_hi.log2());

    let y_max = match spec.ymax {
        Some(y) => y,
        None => {
            let cutoff = spec.autoscale_cutoff.or(xmax);
            match selection.max_value(spec.metric, cutoff) {
                Some(m) if m > 0.0 => m * 1.1,
                _ => 1.0,
            }
        }
    };

    let x_ticks: Vec<u64> = (lx0.ceil() as i64..=lx1.floor() as i64)
        .filter(|k| (0..63).contains(k))
        .map(|k| 1u64 << k)
        .collect();
    let label_every = if x_ticks.len() > MAX_LABELLED_X_TICKS {
        2
    } else {
        1
    };
    let y_ticks = d3_ticks(0.0, y_max, Y_TICK_COUNT);
    let y_tick_labels: Vec<String> = y_ticks.iter().map(|v| tick_label(*v)).collect();

    let measurer = options.text_measurer.as_ref();
    let tick_style = TextStyle::sized(options.font_size);
    let label_style = TextStyle::sized(options.font_size * 1.1);
    let title_style = TextStyle::sized(options.font_size * 1.3);
    let y_label = spec.y_label();

    let y_tick_w = y_tick_labels
        .iter()
        .map(|t| measurer.measure(t, &tick_style).width)
        .fold(0.0, f64::max);
    let tick_h = measurer.measure("0", &tick_style).height;
    let label_h = measurer.measure(y_label, &label_style).height;
    let title_h = if spec.title.is_empty() {
        0.0
    } else {
        measurer.measure(&spec.title, &title_style).height
    };

    let left = PAD + label_h + PAD + y_tick_w + TICK_LEN + 4.0;
    let bottom = TICK_LEN + 4.0 + tick_h + 6.0 + label_h + PAD;
    let top = PAD + title_h + PAD;
    let right = PAD * 2.0;
    let plot = BoundingRect {
        x: left,
        y: top,
        width: (options.width - left - right).max(1.0),
        height: (options.height - top - bottom).max(1.0),
    };

    let sx = |size: f64| plot.x + (size.log2() - lx0) / (lx1 - lx0) * plot.width;
    let sy = |v: f64| plot.bottom() - v / y_max * plot.height;

    let mut drawables = Vec::new();

    // Grid.
    let mut grid = Vec::new();
    for t in &x_ticks {
        let x = sx(*t as f64);
        grid.push(format!(
            "M{},{}L{},{}",
            fmt_path(x),
            fmt_path(plot.y),
            fmt_path(x),
            fmt_path(plot.bottom())
        ));
    }
    for v in &y_ticks {
        let y = sy(*v);
        grid.push(format!(
            "M{},{}L{},{}",
            fmt_path(plot.x),
            fmt_path(y),
            fmt_path(plot.right()),
            fmt_path(y)
        ));
    }
    if !grid.is_empty() {
        let mut data = PathData::stroke(grid.concat(), GRID_COLOR, 0.8);
        data.stroke_opacity = Some(GRID_OPACITY);
        drawables.push(DrawableElem::Path {
            group_texts: group(&["grid"]),
            clipped: false,
            data: vec![data],
        });
    }

    // Spread bands sit behind every median line.
    let mut bands = Vec::new();
    for p in &plotted {
        if p.stats.iter().all(|s| s.lo == s.hi) {
            continue;
        }
        let upper: Vec<(f64, f64)> = p
            .stats
            .iter()
            .map(|s| (sx(s.size as f64), sy(s.hi)))
            .collect();
        let lower = p
            .stats
            .iter()
            .rev()
            .map(|s| (sx(s.size as f64), sy(s.lo)));
        let outline: Vec<(f64, f64)> = upper.into_iter().chain(lower).collect();
        let Some(mut path) = line_path(&outline) else {
            continue;
        };
        if !path.ends_with('Z') {
            path.push('Z');
        }
        bands.push(PathData {
            path,
            fill: Some(p.series.style.color.to_string()),
            fill_opacity: Some(BAND_OPACITY),
            stroke_fill: "none".to_string(),
            stroke_width: 0.0,
            stroke_dasharray: None,
            stroke_opacity: None,
        });
    }
    drawables.push(DrawableElem::Path {
        group_texts: group(&["series", "band"]),
        clipped: true,
        data: bands,
    });

    let mut lines = Vec::new();
    let mut markers = Vec::new();
    for p in &plotted {
        let style = p.series.style;
        let color = style.color.to_string();
        let points: Vec<(f64, f64)> = p
            .stats
            .iter()
            .map(|s| (sx(s.size as f64), sy(s.median)))
            .collect();
        if let Some(path) = line_path(&points) {
            let mut data = PathData::stroke(path, color.clone(), LINE_WIDTH);
            data.stroke_dasharray = style.dash.dasharray(LINE_WIDTH);
            lines.push(data);
        }
        let shapes: String = points
            .iter()
            .filter_map(|(x, y)| marker_path(style.marker, *x, *y, MARKER_RADIUS))
            .collect();
        if !shapes.is_empty() {
            let mut data = PathData::stroke(shapes, color.clone(), 1.0);
            if style.marker != Marker::Cross {
                data.fill = Some(color);
            }
            markers.push(data);
        }
    }
    drawables.push(DrawableElem::Path {
        group_texts: group(&["series", "line"]),
        clipped: true,
        data: lines,
    });
    drawables.push(DrawableElem::Path {
        group_texts: group(&["series", "marker"]),
        clipped: true,
        data: markers,
    });

    // Cache boundaries.
    let mut boundary_lines = Vec::new();
    let mut boundary_labels = Vec::new();
    let label_y = plot.bottom() - 4.0;
    for (size, level) in boundaries.markers() {
        let l = size.log2();
        if l < lx0 || l > lx1 {
            continue;
        }
        let x = sx(size);
        let mut data = PathData::stroke(
            format!(
                "M{},{}L{},{}",
                fmt_path(x),
                fmt_path(plot.y),
                fmt_path(x),
                fmt_path(plot.bottom())
            ),
            BOUNDARY_COLOR,
            1.0,
        );
        data.stroke_dasharray = DashPattern::Dashed.dasharray(1.0);
        boundary_lines.push(data);
        boundary_labels.push(text(
            format!("{} ", level.label()),
            (x, label_y),
            options.font_size,
            HorizontalPos::Right,
            VerticalPos::Bottom,
        ));
    }
    if max_size as f64 > boundaries.l3 {
        boundary_labels.push(text(
            "RAM",
            (sx(max_size as f64), label_y),
            options.font_size,
            HorizontalPos::Right,
            VerticalPos::Bottom,
        ));
    }
    drawables.push(DrawableElem::Path {
        group_texts: group(&["cache-boundary"]),
        clipped: false,
        data: boundary_lines,
    });
    drawables.push(DrawableElem::Text {
        group_texts: group(&["cache-boundary"]),
        clipped: false,
        data: boundary_labels,
    });

    // Frame and axes.
    drawables.push(DrawableElem::Rect {
        group_texts: group(&["axis", "frame"]),
        clipped: false,
        data: vec![RectData {
            x: plot.x,
            y: plot.y,
            width: plot.width,
            height: plot.height,
            fill: "none".to_string(),
            fill_opacity: None,
            stroke_fill: TEXT_COLOR.to_string(),
            stroke_width: 1.0,
        }],
    });

    let x_tick_marks: String = x_ticks
        .iter()
        .map(|t| {
            let x = fmt_path(sx(*t as f64));
            format!(
                "M{x},{}L{x},{}",
                fmt_path(plot.bottom()),
                fmt_path(plot.bottom() + TICK_LEN)
            )
        })
        .collect();
    let x_tick_labels: Vec<TextData> = x_ticks
        .iter()
        .enumerate()
        .filter(|(i, _)| i % label_every == 0)
        .map(|(_, t)| {
            text(
                binary_size_label(*t),
                (sx(*t as f64), plot.bottom() + TICK_LEN + 4.0),
                options.font_size,
                HorizontalPos::Center,
                VerticalPos::Top,
            )
        })
        .collect();
    drawables.push(DrawableElem::Path {
        group_texts: group(&["axis", "x-axis", "ticks"]),
        clipped: false,
        data: vec![PathData::stroke(x_tick_marks, TEXT_COLOR, 1.0)],
    });
    drawables.push(DrawableElem::Text {
        group_texts: group(&["axis", "x-axis", "labels"]),
        clipped: false,
        data: x_tick_labels,
    });
    drawables.push(DrawableElem::Text {
        group_texts: group(&["axis", "x-axis", "title"]),
        clipped: false,
        data: vec![text(
            X_AXIS_TITLE,
            (
                plot.x + plot.width / 2.0,
                plot.bottom() + TICK_LEN + 4.0 + tick_h + 6.0,
            ),
            label_style.font_size,
            HorizontalPos::Center,
            VerticalPos::Top,
        )],
    });

    let y_tick_marks: String = y_ticks
        .iter()
        .map(|v| {
            let y = fmt_path(sy(*v));
            format!(
                "M{},{y}L{},{y}",
                fmt_path(plot.x - TICK_LEN),
                fmt_path(plot.x)
            )
        })
        .collect();
    let y_tick_text: Vec<TextData> = y_ticks
        .iter()
        .zip(y_tick_labels)
        .map(|(v, label)| {
            text(
                label,
                (plot.x - TICK_LEN - 4.0, sy(*v)),
                options.font_size,
                HorizontalPos::Right,
                VerticalPos::Middle,
            )
        })
        .collect();
    drawables.push(DrawableElem::Path {
        group_texts: group(&["axis", "y-axis", "ticks"]),
        clipped: false,
        data: vec![PathData::stroke(y_tick_marks, TEXT_COLOR, 1.0)],
    });
    drawables.push(DrawableElem::Text {
        group_texts: group(&["axis", "y-axis", "labels"]),
        clipped: false,
        data: y_tick_text,
    });
    let mut y_title = text(
        y_label,
        (PAD + label_h / 2.0, plot.y + plot.height / 2.0),
        label_style.font_size,
        HorizontalPos::Center,
        VerticalPos::Middle,
    );
    y_title.rotation = -90.0;
    drawables.push(DrawableElem::Text {
        group_texts: group(&["axis", "y-axis", "title"]),
        clipped: false,
        data: vec![y_title],
    });

    if !spec.title.is_empty() {
        drawables.push(DrawableElem::Text {
            group_texts: group(&["title"]),
            clipped: false,
            data: vec![text(
                spec.title.clone(),
                (options.width / 2.0, PAD),
                title_style.font_size,
                HorizontalPos::Center,
                VerticalPos::Top,
            )],
        });
    }

    // Legend, upper left inside the plot.
    let mut legend: Vec<(LegendEntry, Marker)> = Vec::new();
    for p in &plotted {
        let style = p.series.style;
        let entry = LegendEntry {
            label: p.series.display_name.to_string(),
            color: style.color.to_string(),
            dasharray: style.dash.dasharray(LINE_WIDTH),
        };
        let duplicate = legend
            .iter()
            .any(|(e, m)| e.label == entry.label && e.color == entry.color && *m == style.marker);
        if !duplicate {
            legend.push((entry, style.marker));
        }
    }
    if let Some(prefetch) = plotted
        .iter()
        .find(|p| p.series.style_tag == chaseplot_core::StyleTag::Prefetch)
    {
        legend.push((
            LegendEntry {
                label: "Prefetch".to_string(),
                color: PREFETCH_LEGEND_COLOR.to_string(),
                dasharray: prefetch.series.style.dash.dasharray(LINE_WIDTH),
            },
            Marker::None,
        ));
    }

    let sample_len = 24.0;
    let row_h = tick_h * 1.3;
    let label_w = legend
        .iter()
        .map(|(e, _)| measurer.measure(&e.label, &tick_style).width)
        .fold(0.0, f64::max);
    let box_x = plot.x + 8.0;
    let box_y = plot.y + 8.0;
    drawables.push(DrawableElem::Rect {
        group_texts: group(&["legend", "frame"]),
        clipped: false,
        data: vec![RectData {
            x: box_x,
            y: box_y,
            width: 8.0 + sample_len + 6.0 + label_w + 8.0,
            height: legend.len() as f64 * row_h + 8.0,
            fill: "white".to_string(),
            fill_opacity: Some(0.8),
            stroke_fill: "#cccccc".to_string(),
            stroke_width: 1.0,
        }],
    });
    let mut samples = Vec::new();
    let mut labels = Vec::new();
    for (i, (entry, marker)) in legend.iter().enumerate() {
        let yc = box_y + 4.0 + row_h * (i as f64 + 0.5);
        let x0 = box_x + 8.0;
        let x1 = x0 + sample_len;
        let mut data = PathData::stroke(
            format!(
                "M{},{}L{},{}",
                fmt_path(x0),
                fmt_path(yc),
                fmt_path(x1),
                fmt_path(yc)
            ),
            entry.color.clone(),
            LINE_WIDTH,
        );
        data.stroke_dasharray = entry.dasharray.clone();
        samples.push(data);
        if let Some(shape) = marker_path(*marker, (x0 + x1) / 2.0, yc, MARKER_RADIUS) {
            let mut data = PathData::stroke(shape, entry.color.clone(), 1.0);
            if *marker != Marker::Cross {
                data.fill = Some(entry.color.clone());
            }
            samples.push(data);
        }
        labels.push(text(
            entry.label.clone(),
            (x1 + 6.0, yc),
            options.font_size,
            HorizontalPos::Left,
            VerticalPos::Middle,
        ));
    }
    drawables.push(DrawableElem::Path {
        group_texts: group(&["legend", "samples"]),
        clipped: false,
        data: samples,
    });
    drawables.push(DrawableElem::Text {
        group_texts: group(&["legend", "labels"]),
        clipped: false,
        data: labels,
    });

    Ok(ChartLayout {
        name: spec.name.clone(),
        width: options.width,
        height: options.height,
        background_color: options.background_color.clone(),
        plot_area: plot,
        x_domain: (x_lo, x_hi),
        y_domain: (0.0, y_max),
        x_ticks,
        y_ticks,
        legend: legend.into_iter().map(|(e, _)| e).collect(),
        drawables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn d3_ticks_are_nice() {
        assert_eq!(d3_ticks(0.0, 10.0, 5), [0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(d3_ticks(0.0, 1.0, 5), [0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(d3_ticks(0.0, 93.5, 6), [0.0, 20.0, 40.0, 60.0, 80.0]);
        assert_eq!(d3_ticks(3.0, 3.0, 6), [3.0]);
        assert!(d3_ticks(0.0, f64::NAN, 6).is_empty());
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(binary_size_label(512), "512");
        assert_eq!(binary_size_label(1024), "1K");
        assert_eq!(binary_size_label(32 * 1024), "32K");
        assert_eq!(binary_size_label(1 << 20), "1M");
        assert_eq!(binary_size_label(1 << 30), "1G");
        assert_eq!(binary_size_label(1536), "1536");
    }

    #[test]
    fn every_marker_except_none_has_a_shape() {
        for m in [
            Marker::Circle,
            Marker::Square,
            Marker::Diamond,
            Marker::TriangleUp,
            Marker::TriangleDown,
            Marker::Cross,
        ] {
            let d = marker_path(m, 10.0, 10.0, 3.0).unwrap();
            assert!(d.starts_with('M'), "{m:?}: {d}");
        }
        assert_eq!(marker_path(Marker::None, 0.0, 0.0, 3.0), None);
    }

    #[test]
    fn single_point_lines_are_closed() {
        assert_eq!(line_path(&[(1.0, 2.0)]).unwrap(), "M1,2Z");
        assert_eq!(line_path(&[(1.0, 2.0), (3.5, 4.0)]).unwrap(), "M1,2L3.5,4");
        assert_eq!(line_path(&[]), None);
    }
}
