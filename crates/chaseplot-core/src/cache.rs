//! Cache-level geometry.
//!
//! Working-set sizes are bucketed by comparing against three byte thresholds. The L1 and L2
//! thresholds are the per-core capacity divided by the 6 ways the model assumes; L3 is the full
//! shared capacity.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CacheLevel {
    L1,
    L2,
    L3,
    #[serde(rename = "RAM")]
    Ram,
}

impl CacheLevel {
    pub const ALL: [CacheLevel; 4] = [Self::L1, Self::L2, Self::L3, Self::Ram];

    pub fn label(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::Ram => "RAM",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CacheLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Byte thresholds separating L1 | L2 | L3 | RAM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheBoundaries {
    pub l1: f64,
    pub l2: f64,
    pub l3: f64,
}

impl CacheBoundaries {
    pub const WAYS: f64 = 6.0;

    pub const DEFAULT: CacheBoundaries = CacheBoundaries {
        l1: 192.0 * 1024.0 / Self::WAYS,
        l2: 1.5 * 1024.0 * 1024.0 / Self::WAYS,
        l3: 12.0 * 1024.0 * 1024.0,
    };

    /// Total step function over sizes; a size equal to a boundary belongs to the lower level.
    pub fn classify(&self, size: f64) -> CacheLevel {
        if size <= self.l1 {
            CacheLevel::L1
        } else if size <= self.l2 {
            CacheLevel::L2
        } else if size <= self.l3 {
            CacheLevel::L3
        } else {
            CacheLevel::Ram
        }
    }

    /// Boundary positions in ascending order, for annotation placement.
    pub fn markers(&self) -> [(f64, CacheLevel); 3] {
        [
            (self.l1, CacheLevel::L1),
            (self.l2, CacheLevel::L2),
            (self.l3, CacheLevel::L3),
        ]
    }

    pub fn boundary(&self, level: CacheLevel) -> Option<f64> {
        match level {
            CacheLevel::L1 => Some(self.l1),
            CacheLevel::L2 => Some(self.l2),
            CacheLevel::L3 => Some(self.l3),
            CacheLevel::Ram => None,
        }
    }
}

impl Default for CacheBoundaries {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Classifies against [`CacheBoundaries::DEFAULT`].
pub fn classify(size: f64) -> CacheLevel {
    CacheBoundaries::DEFAULT.classify(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_boundaries_match_cache_geometry() {
        let b = CacheBoundaries::DEFAULT;
        assert_eq!(b.l1, 32768.0);
        assert_eq!(b.l2, 262144.0);
        assert_eq!(b.l3, 12582912.0);
    }

    #[test]
    fn boundary_values_fall_into_lower_level() {
        let b = CacheBoundaries::DEFAULT;
        assert_eq!(b.classify(b.l1), CacheLevel::L1);
        assert_eq!(b.classify(b.l1 + 1.0), CacheLevel::L2);
        assert_eq!(b.classify(b.l2), CacheLevel::L2);
        assert_eq!(b.classify(b.l3), CacheLevel::L3);
        assert_eq!(b.classify(b.l3 + 1.0), CacheLevel::Ram);
    }

    #[test]
    fn classification_is_monotonic() {
        let mut prev = CacheLevel::L1;
        let mut size = 1.0f64;
        while size < 4.0 * 1024.0 * 1024.0 * 1024.0 {
            let level = classify(size);
            assert!(level >= prev, "{size} classified {level} after {prev}");
            prev = level;
            size *= 1.25;
        }
        assert_eq!(prev, CacheLevel::Ram);
    }

    #[test]
    fn one_mebibyte_is_l3() {
        assert_eq!(classify(1048576.0), CacheLevel::L3);
    }

    #[test]
    fn labels_are_stable() {
        let labels: Vec<_> = CacheLevel::ALL.iter().map(|l| l.to_string()).collect();
        assert_eq!(labels, ["L1", "L2", "L3", "RAM"]);
    }
}
