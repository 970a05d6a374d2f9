//! Series-name conventions.
//!
//! The benchmark harness names each experiment after the function that ran it, e.g.
//! `raw_pointer_chasing_padded_aligned`, `batch<16>` or `batch_prefetch_work3<16>`. All of the
//! structure recovered from those names (batch size, prefetch variant, colour grouping, display
//! label) is parsed here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

const PREFETCH: &str = "prefetch";
const LATENCY: &str = "latency";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StyleTag {
    #[default]
    None,
    Latency,
    Prefetch,
}

impl StyleTag {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Latency => "Latency",
            Self::Prefetch => "Prefetch",
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("unterminated `<` in batch-size suffix")]
    Unterminated,
    #[error("batch-size suffix must end the name")]
    NotSuffix,
    #[error("batch size `{payload}` is not an integer")]
    NotInteger { payload: String },
}

/// Structured view of a series name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Name without the `<N>` suffix and without the `prefetch` marker; batch-size and prefetch
    /// variants of one experiment share it.
    pub base_name: String,
    pub batch_size: u32,
    pub is_prefetch: bool,
    pub is_latency_reference: bool,
}

impl SeriesKey {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let (stem, batch_size) = split_batch_suffix(name)?;
        let base_name = strip_prefetch(stem, "_");
        Ok(Self {
            base_name: if base_name.is_empty() {
                stem.to_string()
            } else {
                base_name
            },
            batch_size,
            is_prefetch: name.contains(PREFETCH),
            is_latency_reference: name.contains(LATENCY),
        })
    }

    pub fn style_tag(&self) -> StyleTag {
        if self.is_prefetch {
            StyleTag::Prefetch
        } else if self.is_latency_reference {
            StyleTag::Latency
        } else {
            StyleTag::None
        }
    }

    pub fn color_group(&self) -> &str {
        &self.base_name
    }
}

fn split_batch_suffix(name: &str) -> Result<(&str, u32), NameError> {
    let Some(open) = name.find('<') else {
        return Ok((name, 0));
    };
    let rest = &name[open + 1..];
    let Some(close) = rest.find('>') else {
        return Err(NameError::Unterminated);
    };
    if close + 1 != rest.len() {
        return Err(NameError::NotSuffix);
    }
    let payload = rest[..close].trim();
    let batch_size = payload.parse::<u32>().map_err(|_| NameError::NotInteger {
        payload: payload.to_string(),
    })?;
    Ok((&name[..open], batch_size))
}

fn strip_prefetch(s: &str, sep: &str) -> String {
    s.replace(&format!("{sep}{PREFETCH}"), "")
}

/// Human-readable label: underscores become spaces, the prefetch marker is dropped and the
/// result is title-cased. Prefetch variants therefore share a label with their plain
/// counterpart; styling keeps them apart.
pub fn display_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    title_case(&strip_prefetch(&spaced, " "))
}

/// Uppercases every letter that follows a non-letter and lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_cased {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(ch);
            prev_cased = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_is_parsed_from_suffix() {
        assert_eq!(SeriesKey::parse("batch<16>").unwrap().batch_size, 16);
        assert_eq!(SeriesKey::parse("pointer_chasing").unwrap().batch_size, 0);
        assert_eq!(
            SeriesKey::parse("batch_prefetch_work3<16>").unwrap().batch_size,
            16
        );
    }

    #[test]
    fn malformed_suffixes_are_rejected() {
        assert_eq!(
            SeriesKey::parse("batch<x>"),
            Err(NameError::NotInteger {
                payload: "x".to_string()
            })
        );
        assert_eq!(SeriesKey::parse("batch<16"), Err(NameError::Unterminated));
        assert_eq!(SeriesKey::parse("batch<16>_x"), Err(NameError::NotSuffix));
        assert!(SeriesKey::parse("batch<-1>").is_err());
    }

    #[test]
    fn stray_closing_bracket_is_plain_name() {
        let key = SeriesKey::parse("batch16>").unwrap();
        assert_eq!(key.batch_size, 0);
        assert_eq!(key.color_group(), "batch16>");
    }

    #[test]
    fn prefetch_variants_share_color_group() {
        let plain = SeriesKey::parse("batch<16>").unwrap();
        let prefetch = SeriesKey::parse("batch_prefetch<16>").unwrap();
        assert_eq!(plain.color_group(), prefetch.color_group());
        assert_eq!(plain.color_group(), "batch");
        assert_eq!(plain.style_tag(), StyleTag::None);
        assert_eq!(prefetch.style_tag(), StyleTag::Prefetch);

        let chasing = SeriesKey::parse("pointer_chasing_prefetch").unwrap();
        assert_eq!(chasing.color_group(), "pointer_chasing");
        let work = SeriesKey::parse("batch_prefetch_work3<16>").unwrap();
        assert_eq!(work.color_group(), "batch_work3");
    }

    #[test]
    fn prefetch_takes_priority_over_latency() {
        assert_eq!(
            SeriesKey::parse("latency_prefetch").unwrap().style_tag(),
            StyleTag::Prefetch
        );
        assert_eq!(
            SeriesKey::parse("latency").unwrap().style_tag(),
            StyleTag::Latency
        );
    }

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(
            display_name("raw_pointer_chasing_padded_aligned"),
            "Raw Pointer Chasing Padded Aligned"
        );
        assert_eq!(display_name("pointer_chasing_prefetch"), "Pointer Chasing");
        assert_eq!(display_name("batch_prefetch<16>"), "Batch<16>");
        assert_eq!(display_name("batch_work3<16>"), "Batch Work3<16>");
        assert_eq!(display_name("latency"), "Latency");
    }

    #[test]
    fn derivation_is_deterministic() {
        for name in ["batch<4>", "pointer_chasing_checked", "batch_prefetch_work12<16>"] {
            assert_eq!(SeriesKey::parse(name), SeriesKey::parse(name));
            assert_eq!(display_name(name), display_name(name));
        }
    }
}
