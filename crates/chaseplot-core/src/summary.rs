//! Pivoted latency/cycles table at one representative size per cache level.

use crate::cache::{CacheBoundaries, CacheLevel};
use crate::naming::StyleTag;
use crate::record::{Dataset, NormalizedRecord};
use crate::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanonicalSize {
    pub level: CacheLevel,
    pub size: u64,
}

/// Half of the L1 and L2 boundaries, a third of the L3 boundary, and the largest observed size.
pub fn canonical_sizes(boundaries: &CacheBoundaries, max_size: u64) -> [CanonicalSize; 4] {
    [
        CanonicalSize {
            level: CacheLevel::L1,
            size: (boundaries.l1 / 2.0) as u64,
        },
        CanonicalSize {
            level: CacheLevel::L2,
            size: (boundaries.l2 / 2.0) as u64,
        },
        CanonicalSize {
            level: CacheLevel::L3,
            size: (boundaries.l3 / 3.0) as u64,
        },
        CanonicalSize {
            level: CacheLevel::Ram,
            size: max_size,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    pub latency: f64,
    /// `None` when none of the matching trials reported cycles.
    pub cycles: Option<f64>,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub name: String,
    /// One entry per canonical size, `None` when no record has exactly that size.
    pub cells: Vec<Option<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub sizes: Vec<CanonicalSize>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn row(&self, label: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn cell(&self, label: &str, level: CacheLevel) -> Option<Cell> {
        let column = self.sizes.iter().position(|s| s.level == level)?;
        self.row(label)?.cells.get(column).copied().flatten()
    }
}

pub fn summarize(dataset: &Dataset, boundaries: &CacheBoundaries) -> Result<SummaryTable> {
    let Some(max_size) = dataset.max_size() else {
        return Err(Error::config("cannot summarize an empty dataset"));
    };
    let sizes = canonical_sizes(boundaries, max_size).to_vec();

    // The maximum can coincide with a canonical size, so one size may feed several columns.
    let mut columns: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    for (i, c) in sizes.iter().enumerate() {
        columns.entry(c.size).or_default().push(i);
    }

    let mut series: IndexMap<&str, Vec<&NormalizedRecord>> = IndexMap::new();
    for r in dataset {
        series.entry(r.name()).or_default().push(r);
    }

    let mut rows: Vec<SummaryRow> = Vec::with_capacity(series.len());
    for (name, records) in series {
        let first = records[0];
        let mut label = first.display_name.clone();
        if rows.iter().any(|r| r.label == label) {
            label = match first.style_tag {
                StyleTag::None => format!("{label} ({name})"),
                tag => format!("{label} ({tag})"),
            };
        }
        let mut acc = vec![Accumulator::default(); sizes.len()];
        for r in &records {
            for &column in columns.get(&r.size()).into_iter().flatten() {
                acc[column].push(r);
            }
        }
        let cells = acc.iter().map(Accumulator::mean).collect();
        rows.push(SummaryRow {
            label,
            name: name.to_string(),
            cells,
        });
    }

    Ok(SummaryTable { sizes, rows })
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    trials: usize,
    latency: f64,
    cycles: f64,
    with_cycles: usize,
}

impl Accumulator {
    fn push(&mut self, r: &NormalizedRecord) {
        self.trials += 1;
        self.latency += r.latency();
        if let Some(c) = r.cycles() {
            self.cycles += c;
            self.with_cycles += 1;
        }
    }

    fn mean(&self) -> Option<Cell> {
        if self.trials == 0 {
            return None;
        }
        Some(Cell {
            latency: self.latency / self.trials as f64,
            cycles: (self.with_cycles > 0).then(|| self.cycles / self.with_cycles as f64),
            trials: self.trials,
        })
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = vec![String::new()];
        for s in &self.sizes {
            header.push(format!("{} latency", s.level));
            header.push(format!("{} cycles", s.level));
        }

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut line = vec![row.label.clone()];
                for cell in &row.cells {
                    match cell {
                        Some(c) => {
                            line.push(format!("{:.1}", c.latency));
                            line.push(c.cycles.map(|v| format!("{v:.1}")).unwrap_or_default());
                        }
                        None => {
                            line.push(String::new());
                            line.push(String::new());
                        }
                    }
                }
                line
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
        for line in &body {
            for (w, v) in widths.iter_mut().zip(line) {
                *w = (*w).max(v.width());
            }
        }

        // Labels align left, numbers right.
        let write_line = |f: &mut fmt::Formatter<'_>, line: &[String]| -> fmt::Result {
            f.write_str("|")?;
            for (i, (v, w)) in line.iter().zip(&widths).enumerate() {
                let pad = " ".repeat(w - v.width());
                if i == 0 {
                    write!(f, " {v}{pad} |")?;
                } else {
                    write!(f, " {pad}{v} |")?;
                }
            }
            writeln!(f)
        };

        write_line(f, &header)?;
        f.write_str("|")?;
        for (i, w) in widths.iter().enumerate() {
            let sep = if i + 1 == widths.len() { "|" } else { "+" };
            write!(f, "{}{sep}", "-".repeat(w + 2))?;
        }
        writeln!(f)?;
        for line in &body {
            write_line(f, line)?;
        }
        Ok(())
    }
}
