use crate::cache::{CacheBoundaries, CacheLevel};
use crate::naming::{NameError, SeriesKey, StyleTag, display_name};
use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timing measurement as written by the benchmark harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub name: String,
    /// Working-set size in bytes, always > 0.
    pub size: u64,
    /// Nanoseconds per operation.
    pub latency: f64,
    /// CPU cycles per operation, when the harness could read the clock frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles: Option<f64>,
}

impl BenchmarkRecord {
    /// Validates one entry of the record array. Unknown fields are ignored.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(Error::schema(Some(index), "record is not an object"));
        };

        let name = match obj.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(Error::schema(Some(index), "`name` is not a string")),
            None => return Err(Error::schema(Some(index), "missing required field `name`")),
        };

        let size = match obj.get("size") {
            Some(v) => parse_size(v).ok_or_else(|| {
                Error::schema(
                    Some(index),
                    format!("`size` must be a positive integer, got {v}"),
                )
            })?,
            None => return Err(Error::schema(Some(index), "missing required field `size`")),
        };

        let latency = match obj.get("latency") {
            Some(v) => non_negative(v).ok_or_else(|| {
                Error::schema(
                    Some(index),
                    format!("`latency` must be a non-negative number, got {v}"),
                )
            })?,
            None => {
                return Err(Error::schema(
                    Some(index),
                    "missing required field `latency`",
                ));
            }
        };

        let cycles = match obj.get("cycles") {
            None | Some(Value::Null) => None,
            Some(v) => Some(non_negative(v).ok_or_else(|| {
                Error::schema(
                    Some(index),
                    format!("`cycles` must be a non-negative number, got {v}"),
                )
            })?),
        };

        Ok(Self {
            name,
            size,
            latency,
            cycles,
        })
    }
}

fn parse_size(v: &Value) -> Option<u64> {
    let Value::Number(n) = v else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return (u > 0).then_some(u);
    }
    if n.is_i64() {
        return None;
    }
    let f = n.as_f64()?;
    if f.is_finite() && f > 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn non_negative(v: &Value) -> Option<f64> {
    let f = v.as_f64()?;
    (f.is_finite() && f >= 0.0).then_some(f)
}

/// A record plus everything derived from its name and size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub record: BenchmarkRecord,
    pub display_name: String,
    pub cache_level: CacheLevel,
    pub style_tag: StyleTag,
    pub batch_size: u32,
    pub color_group: String,
}

impl NormalizedRecord {
    pub fn new(
        record: BenchmarkRecord,
        boundaries: &CacheBoundaries,
    ) -> std::result::Result<Self, NameError> {
        let key = SeriesKey::parse(&record.name)?;
        Ok(Self {
            display_name: display_name(&record.name),
            cache_level: boundaries.classify(record.size as f64),
            style_tag: key.style_tag(),
            batch_size: key.batch_size,
            color_group: key.base_name,
            record,
        })
    }

    /// Copy of this record under another name, with the name-derived fields recomputed.
    pub fn renamed(&self, name: &str) -> std::result::Result<Self, NameError> {
        let key = SeriesKey::parse(name)?;
        Ok(Self {
            record: BenchmarkRecord {
                name: name.to_string(),
                ..self.record.clone()
            },
            display_name: display_name(name),
            cache_level: self.cache_level,
            style_tag: key.style_tag(),
            batch_size: key.batch_size,
            color_group: key.base_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn size(&self) -> u64 {
        self.record.size
    }

    pub fn latency(&self) -> f64 {
        self.record.latency
    }

    pub fn cycles(&self) -> Option<f64> {
        self.record.cycles
    }
}

/// Normalized records in load order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<NormalizedRecord>,
}

impl Dataset {
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct series names in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        let set: IndexSet<&str> = self.records.iter().map(|r| r.name()).collect();
        set.into_iter().collect()
    }

    pub fn max_size(&self) -> Option<u64> {
        self.records.iter().map(|r| r.size()).max()
    }

    pub fn series<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a NormalizedRecord> {
        self.records.iter().filter(move |r| r.name() == name)
    }

    pub fn extend(&mut self, other: Dataset) {
        self.records.extend(other.records);
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_fields_are_ignored() {
        let v = json!({
            "name": "pointer_chasing",
            "size": 8192,
            "run": 2,
            "duration": {"secs": 0, "nanos": 12},
            "latency": 1.5,
            "cycles": 4.0,
            "freq": 3.0e9
        });
        let r = BenchmarkRecord::from_value(0, &v).unwrap();
        assert_eq!(r.name, "pointer_chasing");
        assert_eq!(r.size, 8192);
        assert_eq!(r.cycles, Some(4.0));
    }

    #[test]
    fn integral_float_sizes_are_accepted() {
        let v = json!({"name": "a", "size": 1048576.0, "latency": 1.0});
        assert_eq!(BenchmarkRecord::from_value(0, &v).unwrap().size, 1048576);
    }

    #[test]
    fn invalid_sizes_are_schema_errors() {
        for size in [json!(0), json!(-4), json!(1.5), json!("64"), json!(null)] {
            let v = json!({"name": "a", "size": size, "latency": 1.0});
            let err = BenchmarkRecord::from_value(3, &v).unwrap_err();
            assert!(
                matches!(err, Error::Schema { index: Some(3), .. }),
                "{size}: {err}"
            );
        }
    }

    #[test]
    fn missing_required_fields_are_schema_errors() {
        for v in [
            json!({"size": 1, "latency": 1.0}),
            json!({"name": "a", "latency": 1.0}),
            json!({"name": "a", "size": 1}),
        ] {
            assert!(matches!(
                BenchmarkRecord::from_value(0, &v),
                Err(Error::Schema { .. })
            ));
        }
    }

    #[test]
    fn missing_cycles_is_allowed() {
        let v = json!({"name": "a", "size": 1, "latency": 0.0});
        assert_eq!(BenchmarkRecord::from_value(0, &v).unwrap().cycles, None);
    }

    #[test]
    fn normalization_derives_all_fields() {
        let r = BenchmarkRecord {
            name: "batch_prefetch<16>".to_string(),
            size: 1 << 20,
            latency: 2.0,
            cycles: Some(5.0),
        };
        let n = NormalizedRecord::new(r, &CacheBoundaries::DEFAULT).unwrap();
        assert_eq!(n.display_name, "Batch<16>");
        assert_eq!(n.cache_level, CacheLevel::L3);
        assert_eq!(n.style_tag, StyleTag::Prefetch);
        assert_eq!(n.batch_size, 16);
        assert_eq!(n.color_group, "batch");

        let alias = n.renamed("latency").unwrap();
        assert_eq!(alias.name(), "latency");
        assert_eq!(alias.style_tag, StyleTag::Latency);
        assert_eq!(alias.batch_size, 0);
        assert_eq!(alias.latency(), 2.0);
        assert_eq!(alias.cycles(), Some(5.0));
        assert_eq!(alias.size(), 1 << 20);
    }
}
