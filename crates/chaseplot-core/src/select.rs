//! Picks the series shown in one figure and assigns each a deterministic style.
//!
//! Colours are assigned per colour group (batch-size and prefetch variants of one experiment),
//! not per series, and the palette is rotated by a caller-chosen `skip`. A sequence of figures
//! that adds or drops groups at the front can therefore pick `skip` so that the groups it keeps
//! retain the colours they had in the previous figure. The reference series takes part in the
//! numbering and is then drawn black. Within a group, shade and marker depend only on the batch
//! size, so `batch<16>` looks the same in every figure that puts its group in the same slot.

use crate::naming::StyleTag;
use crate::record::{Dataset, NormalizedRecord};
use crate::stats::Metric;
use crate::style::{DashPattern, Marker, SeriesStyle, StyleContext};
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone)]
pub struct StyledSeries<'a> {
    pub name: &'a str,
    pub display_name: &'a str,
    pub style_tag: StyleTag,
    pub color_group: &'a str,
    pub batch_size: u32,
    pub style: SeriesStyle,
    /// Records of this series in dataset order.
    pub records: Vec<&'a NormalizedRecord>,
}

impl StyledSeries<'_> {
    pub fn is_reference(&self) -> bool {
        self.style_tag == StyleTag::Latency
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    series: Vec<StyledSeries<'a>>,
    missing: Vec<String>,
}

impl<'a> Selection<'a> {
    /// Series in request order.
    pub fn series(&self) -> &[StyledSeries<'a>] {
        &self.series
    }

    /// Every selected record paired with its series style.
    pub fn records(&self) -> impl Iterator<Item = (&'a NormalizedRecord, &SeriesStyle)> + '_ {
        self.series
            .iter()
            .flat_map(|s| s.records.iter().map(move |r| (*r, &s.style)))
    }

    /// Requested names that matched no record.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StyledSeries<'a>> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Largest observed `metric` value among records with size <= `cutoff` (all sizes when
    /// `cutoff` is `None`).
    pub fn max_value(&self, metric: Metric, cutoff: Option<u64>) -> Option<f64> {
        self.records()
            .filter(|(r, _)| cutoff.is_none_or(|c| r.size() <= c))
            .filter_map(|(r, _)| metric.value(r))
            .reduce(f64::max)
    }

    pub fn has_prefetch(&self) -> bool {
        self.series
            .iter()
            .any(|s| s.style_tag == StyleTag::Prefetch)
    }
}

/// Selects the records named in `names` and styles them.
///
/// Unknown names are not an error (figures routinely list series that only some datasets
/// contain); they are reported through [`Selection::missing`].
pub fn select<'a, S: AsRef<str>>(
    dataset: &'a Dataset,
    names: &[S],
    skip: i64,
    ctx: &StyleContext,
) -> Result<Selection<'a>> {
    if names.is_empty() {
        return Err(Error::config("a figure must reference at least one series"));
    }
    if ctx.palette.is_empty() {
        return Err(Error::config("style palette is empty"));
    }

    let requested: IndexSet<&str> = names.iter().map(|n| n.as_ref()).collect();

    let mut by_name: IndexMap<&'a str, Vec<&'a NormalizedRecord>> = IndexMap::new();
    for r in dataset {
        if requested.contains(r.name()) {
            by_name.entry(r.name()).or_default().push(r);
        }
    }

    let mut ordered: Vec<(&'a str, Vec<&'a NormalizedRecord>)> = Vec::new();
    let mut missing = Vec::new();
    for name in &requested {
        match by_name.swap_remove(*name) {
            Some(records) if !records.is_empty() => {
                let key = records[0].name();
                ordered.push((key, records));
            }
            _ => missing.push((*name).to_string()),
        }
    }
    if !missing.is_empty() {
        tracing::debug!(?missing, "requested series have no records");
    }

    let mut groups: IndexMap<&'a str, usize> = IndexMap::new();
    for (_, records) in &ordered {
        let next = groups.len();
        groups
            .entry(records[0].color_group.as_str())
            .or_insert_with(|| ctx.slot(next, skip));
    }

    let series = ordered
        .into_iter()
        .map(|(name, records)| {
            let first = records[0];
            let style = style_for(first, &groups, ctx);
            StyledSeries {
                name,
                display_name: first.display_name.as_str(),
                style_tag: first.style_tag,
                color_group: first.color_group.as_str(),
                batch_size: first.batch_size,
                style,
                records,
            }
        })
        .collect();

    Ok(Selection { series, missing })
}

fn style_for(
    record: &NormalizedRecord,
    groups: &IndexMap<&str, usize>,
    ctx: &StyleContext,
) -> SeriesStyle {
    if record.style_tag == StyleTag::Latency {
        return SeriesStyle::reference(ctx.reference_color);
    }
    let Some(&slot) = groups.get(record.color_group.as_str()) else {
        return SeriesStyle::reference(ctx.reference_color);
    };

    let base = ctx.palette[slot % ctx.palette.len()];
    let (color, marker) = match record.batch_size {
        0 => (base, Marker::None),
        batch => {
            let octave = f64::from(batch).log2();
            let amount = (octave * ctx.lighten_step).min(ctx.max_lighten);
            let marker = if ctx.markers.is_empty() {
                Marker::None
            } else {
                ctx.markers[octave.round() as usize % ctx.markers.len()]
            };
            (base.lighten(amount), marker)
        }
    };

    let dash = if record.style_tag == StyleTag::Prefetch {
        ctx.prefetch_dash
    } else {
        DashPattern::Solid
    };

    SeriesStyle {
        color,
        dash,
        marker,
        palette_slot: Some(slot),
    }
}
