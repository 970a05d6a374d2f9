//! Standalone SVG writer for [`ChartLayout`].

use crate::model::{ChartLayout, DrawableElem, HorizontalPos, VerticalPos};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Root element id; defaults to the figure name.
    pub diagram_id: Option<String>,
    pub font_family: String,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            font_family: "DejaVu Sans, Arial, Helvetica, sans-serif".to_string(),
        }
    }
}

/// Number formatting for attributes: integral values print without a fraction, tiny float
/// noise and `-0` collapse to `0`.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    if v == -0.0 {
        v = 0.0;
    }
    format!("{v}")
}

/// Path coordinates: at most three fractional digits, trailing zeros trimmed.
pub(crate) fn fmt_path(v: f64) -> String {
    if !v.is_finite() || v.abs() < 0.0005 {
        return "0".to_string();
    }
    let k = (v * 1000.0 + 0.5).floor() as i64;
    if k == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    if k < 0 {
        out.push('-');
    }
    let abs = k.unsigned_abs();
    let _ = write!(out, "{}", abs / 1000);
    let frac = abs % 1000;
    if frac != 0 {
        let digits = format!("{frac:03}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
struct Node {
    tag: &'static str,
    attrs: BTreeMap<&'static str, String>,
    text: Option<String>,
    children: Vec<usize>,
}

fn node(tag: &'static str) -> Node {
    Node {
        tag,
        attrs: BTreeMap::new(),
        text: None,
        children: Vec::new(),
    }
}

fn push_child(arena: &mut Vec<Node>, parent: usize, child: Node) -> usize {
    let id = arena.len();
    arena.push(child);
    arena[parent].children.push(id);
    id
}

fn render_node(out: &mut String, arena: &[Node], id: usize) {
    let n = &arena[id];
    out.push('<');
    out.push_str(n.tag);
    for (k, v) in &n.attrs {
        let _ = write!(out, r#" {k}="{v}""#);
    }
    if n.children.is_empty() && n.text.as_deref().unwrap_or("").is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(t) = n.text.as_deref() {
        out.push_str(t);
    }
    for c in &n.children {
        render_node(out, arena, *c);
    }
    let _ = write!(out, "</{}>", n.tag);
}

fn text_anchor(pos: HorizontalPos) -> &'static str {
    match pos {
        HorizontalPos::Left => "start",
        HorizontalPos::Center => "middle",
        HorizontalPos::Right => "end",
    }
}

fn dominant_baseline(pos: VerticalPos) -> &'static str {
    match pos {
        VerticalPos::Top => "text-before-edge",
        VerticalPos::Middle => "middle",
        VerticalPos::Bottom => "text-after-edge",
    }
}

/// Returns the arena id of the innermost group for `group_texts`, creating missing groups.
fn group_for(
    arena: &mut Vec<Node>,
    groups_by_prefix: &mut FxHashMap<String, usize>,
    group_texts: &[String],
    clip: Option<&str>,
) -> usize {
    let mut prefix = String::new();
    let mut parent = 0usize;
    for (i, seg) in group_texts.iter().enumerate() {
        prefix.push('/');
        prefix.push_str(seg);
        parent = match groups_by_prefix.get(&prefix).copied() {
            Some(existing) => existing,
            None => {
                let mut g = node("g");
                g.attrs.insert("class", escape_xml(seg));
                if i + 1 == group_texts.len() {
                    if let Some(clip) = clip {
                        g.attrs.insert("clip-path", format!("url(#{clip})"));
                    }
                }
                let id = push_child(arena, parent, g);
                groups_by_prefix.insert(prefix.clone(), id);
                id
            }
        };
    }
    parent
}

pub fn render_chart_svg(layout: &ChartLayout, options: &SvgRenderOptions) -> Result<String> {
    if !(layout.width.is_finite() && layout.height.is_finite())
        || layout.width <= 0.0
        || layout.height <= 0.0
    {
        return Err(Error::InvalidFigure {
            figure: layout.name.clone(),
            message: format!("canvas size {}x{} is not drawable", layout.width, layout.height),
        });
    }

    let diagram_id = options.diagram_id.as_deref().unwrap_or(&layout.name);
    let diagram_id_esc = escape_xml(diagram_id);
    let clip_id = format!("{diagram_id_esc}-plot");

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg id="{diagram_id_esc}" xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="graphics-document document" aria-roledescription="chart">"#,
        w = fmt(layout.width),
        h = fmt(layout.height),
    );

    let plot = layout.plot_area;
    let _ = write!(
        &mut out,
        r#"<defs><clipPath id="{clip_id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
        fmt(plot.x),
        fmt(plot.y),
        fmt(plot.width),
        fmt(plot.height),
    );

    let mut arena: Vec<Node> = Vec::new();
    arena.push(node("g"));
    arena[0].attrs.insert("class", "main".to_string());
    arena[0]
        .attrs
        .insert("font-family", escape_xml(&options.font_family));

    let mut bg = node("rect");
    bg.attrs.insert("class", "background".to_string());
    bg.attrs.insert("width", fmt(layout.width));
    bg.attrs.insert("height", fmt(layout.height));
    bg.attrs.insert("fill", escape_xml(&layout.background_color));
    push_child(&mut arena, 0, bg);

    let mut groups_by_prefix: FxHashMap<String, usize> = FxHashMap::default();

    for shape in &layout.drawables {
        let clip = shape.is_clipped().then_some(clip_id.as_str());
        match shape {
            DrawableElem::Rect {
                group_texts, data, ..
            } => {
                if data.is_empty() {
                    continue;
                }
                let parent = group_for(&mut arena, &mut groups_by_prefix, group_texts, clip);
                for r in data {
                    let mut n = node("rect");
                    n.attrs.insert("x", fmt(r.x));
                    n.attrs.insert("y", fmt(r.y));
                    n.attrs.insert("width", fmt(r.width));
                    n.attrs.insert("height", fmt(r.height));
                    n.attrs.insert("fill", escape_xml(&r.fill));
                    if let Some(o) = r.fill_opacity {
                        n.attrs.insert("fill-opacity", fmt(o));
                    }
                    n.attrs.insert("stroke", escape_xml(&r.stroke_fill));
                    n.attrs.insert("stroke-width", fmt(r.stroke_width));
                    push_child(&mut arena, parent, n);
                }
            }
            DrawableElem::Text {
                group_texts, data, ..
            } => {
                if data.is_empty() {
                    continue;
                }
                let parent = group_for(&mut arena, &mut groups_by_prefix, group_texts, clip);
                for t in data {
                    let mut n = node("text");
                    n.attrs.insert("x", "0".to_string());
                    n.attrs.insert("y", "0".to_string());
                    n.attrs.insert("fill", escape_xml(&t.fill));
                    n.attrs.insert("font-size", fmt(t.font_size));
                    n.attrs
                        .insert("dominant-baseline", dominant_baseline(t.vertical_pos).into());
                    n.attrs
                        .insert("text-anchor", text_anchor(t.horizontal_pos).into());
                    let mut transform = format!("translate({}, {})", fmt(t.x), fmt(t.y));
                    if t.rotation != 0.0 {
                        let _ = write!(transform, " rotate({})", fmt(t.rotation));
                    }
                    n.attrs.insert("transform", transform);
                    n.text = Some(escape_xml(&t.text));
                    push_child(&mut arena, parent, n);
                }
            }
            DrawableElem::Path {
                group_texts, data, ..
            } => {
                if data.is_empty() {
                    continue;
                }
                let parent = group_for(&mut arena, &mut groups_by_prefix, group_texts, clip);
                for p in data {
                    let mut n = node("path");
                    n.attrs.insert("d", escape_xml(&p.path));
                    n.attrs
                        .insert("fill", escape_xml(p.fill.as_deref().unwrap_or("none")));
                    if let Some(o) = p.fill_opacity {
                        n.attrs.insert("fill-opacity", fmt(o));
                    }
                    n.attrs.insert("stroke", escape_xml(&p.stroke_fill));
                    n.attrs.insert("stroke-width", fmt(p.stroke_width));
                    if let Some(d) = p.stroke_dasharray.as_deref() {
                        n.attrs.insert("stroke-dasharray", escape_xml(d));
                    }
                    if let Some(o) = p.stroke_opacity {
                        n.attrs.insert("stroke-opacity", fmt(o));
                    }
                    push_child(&mut arena, parent, n);
                }
            }
        }
    }

    render_node(&mut out, &arena, 0);
    out.push_str("</svg>\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(fmt(3.0), "3");
        assert_eq!(fmt(-0.0), "0");
        assert_eq!(fmt(1e-12), "0");
        assert_eq!(fmt(2.5), "2.5");
        assert_eq!(fmt(f64::NAN), "0");

        assert_eq!(fmt_path(1.23456), "1.235");
        assert_eq!(fmt_path(10.5), "10.5");
        assert_eq!(fmt_path(-2.0), "-2");
        assert_eq!(fmt_path(0.0001), "0");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(
            escape_xml(r#"batch<16> & "x""#),
            "batch&lt;16&gt; &amp; &quot;x&quot;"
        );
    }
}
