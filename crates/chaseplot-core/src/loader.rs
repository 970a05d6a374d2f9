//! Reads benchmark records and normalizes them into a [`Dataset`].
//!
//! The input is a JSON array of objects. Loading is all-or-nothing for schema violations: a
//! truncated dataset would silently skew every median and summary cell derived from it. Series
//! names with malformed batch suffixes either abort the load ([`NameMode::Strict`], the default)
//! or drop just that record and report it in [`Loaded::rejected`] ([`NameMode::Lenient`]).

use crate::cache::CacheBoundaries;
use crate::record::{BenchmarkRecord, Dataset, NormalizedRecord};
use crate::{Error, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMode {
    #[default]
    Strict,
    Lenient,
}

/// Duplicates one series under a canonical name so every figure can show the same baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAlias {
    pub source: String,
    pub alias: String,
}

impl Default for ReferenceAlias {
    fn default() -> Self {
        Self {
            source: "raw_pointer_chasing_padded_aligned".to_string(),
            alias: "latency".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub boundaries: CacheBoundaries,
    pub reference: Option<ReferenceAlias>,
    pub names: NameMode,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            boundaries: CacheBoundaries::DEFAULT,
            reference: Some(ReferenceAlias::default()),
            names: NameMode::Strict,
        }
    }
}

#[derive(Debug, Default)]
pub struct Loaded {
    pub dataset: Dataset,
    /// Records dropped in lenient mode, as [`Error::Parse`] values.
    pub rejected: Vec<Error>,
}

pub fn load_str(text: &str, options: &LoadOptions) -> Result<Loaded> {
    let records = parse_records(text)?;
    let mut loaded = normalize(records, options)?;
    apply_reference(&mut loaded.dataset, options)?;
    Ok(loaded)
}

pub fn load_reader<R: Read>(mut reader: R, options: &LoadOptions) -> Result<Loaded> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::io("<reader>", e))?;
    load_str(&text, options)
}

pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Loaded> {
    load_paths(&[path], options)
}

/// Loads several sources in order and concatenates them. The reference alias is applied once,
/// after concatenation.
pub fn load_paths<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<Loaded> {
    let mut out = Loaded::default();
    for path in paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let records = parse_records(&text).map_err(|e| with_source(e, path))?;
        let loaded = normalize(records, options).map_err(|e| with_source(e, path))?;
        tracing::debug!(
            path = %path.display(),
            records = loaded.dataset.len(),
            rejected = loaded.rejected.len(),
            "loaded benchmark records"
        );
        out.dataset.extend(loaded.dataset);
        out.rejected.extend(loaded.rejected);
    }
    apply_reference(&mut out.dataset, options)?;
    Ok(out)
}

fn with_source(err: Error, path: &Path) -> Error {
    match err {
        Error::Schema { index, message } => Error::Schema {
            index,
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    }
}

fn parse_records(text: &str) -> Result<Vec<BenchmarkRecord>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::schema(None, format!("invalid JSON: {e}")))?;
    let Value::Array(items) = value else {
        return Err(Error::schema(None, "expected a JSON array of records"));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| BenchmarkRecord::from_value(i, v))
        .collect()
}

fn normalize(records: Vec<BenchmarkRecord>, options: &LoadOptions) -> Result<Loaded> {
    let mut out = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        let name = record.name.clone();
        match NormalizedRecord::new(record, &options.boundaries) {
            Ok(r) => out.push(r),
            Err(e) => {
                let err = Error::Parse {
                    index,
                    name,
                    message: e.to_string(),
                };
                match options.names {
                    NameMode::Strict => return Err(err),
                    NameMode::Lenient => {
                        tracing::warn!("dropping record: {err}");
                        rejected.push(err);
                    }
                }
            }
        }
    }
    Ok(Loaded {
        dataset: Dataset::new(out),
        rejected,
    })
}

/// Prepends alias copies of the reference series, preserving every field except the name.
fn apply_reference(dataset: &mut Dataset, options: &LoadOptions) -> Result<()> {
    let Some(reference) = &options.reference else {
        return Ok(());
    };
    let mut copies = Vec::new();
    for r in dataset.series(&reference.source) {
        let copy = r.renamed(&reference.alias).map_err(|e| {
            Error::config(format!(
                "reference alias `{}` is not a valid series name: {e}",
                reference.alias
            ))
        })?;
        copies.push(copy);
    }
    if copies.is_empty() {
        tracing::debug!(
            source = %reference.source,
            "reference series not present; no baseline added"
        );
        return Ok(());
    }
    let mut records = copies;
    records.extend(std::mem::take(dataset).into_records());
    *dataset = Dataset::new(records);
    Ok(())
}
