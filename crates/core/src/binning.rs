//! Level-based binning
//!
//! A binning scheme quantizes coordinate ordinals into buckets, one bucket
//! grid per level. Both schemes nest: two ordinals sharing a bucket at a fine
//! grid share a bucket at every coarser grid, so a read at a coarser grid is
//! a superset aggregation of reads at finer ones.
//!
//! - `Pyramid`: a tile pyramid. Level 0 is the coarsest; each level halves
//!   the bucket width of the one above it.
//! - `Widths`: an explicit width per level. Sorted by width, each width must
//!   divide the next.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::annotation::BinKey;
use crate::error::{AnnotationError, Result};

/// Default depth of the pyramid scheme
pub const DEFAULT_MAX_LEVEL: u32 = 20;

/// Deepest pyramid the `u64` ordinal axis can hold
pub const MAX_PYRAMID_LEVEL: u32 = 63;

/// Quantization of ordinals into per-level buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum BinningScheme {
    /// Power-of-two pyramid; level 0 is the coarsest
    Pyramid {
        /// Finest level; at this level every ordinal is its own bucket
        #[serde(default = "default_max_level")]
        max_level: u32,
    },
    /// Explicit bucket width per level
    ///
    /// Levels are labels only. Unlike `Pyramid`, a higher level is not
    /// necessarily finer: `{1: 5, 2: 10}` makes level 2 the coarser one.
    /// The divisibility rule applies to the widths in sorted order.
    Widths {
        /// Level -> bucket width
        #[serde(with = "level_keys")]
        widths: BTreeMap<u32, u64>,
    },
}

fn default_max_level() -> u32 {
    DEFAULT_MAX_LEVEL
}

impl Default for BinningScheme {
    fn default() -> Self {
        BinningScheme::Pyramid {
            max_level: DEFAULT_MAX_LEVEL,
        }
    }
}

impl BinningScheme {
    /// Pyramid scheme of the given depth
    pub fn pyramid(max_level: u32) -> Result<Self> {
        let scheme = BinningScheme::Pyramid { max_level };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Width-table scheme from `(level, width)` pairs
    pub fn widths(widths: impl IntoIterator<Item = (u32, u64)>) -> Result<Self> {
        let scheme = BinningScheme::Widths {
            widths: widths.into_iter().collect(),
        };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Check the scheme's structural invariants
    ///
    /// # Errors
    ///
    /// Returns `InvalidBinning` if the pyramid is deeper than the ordinal axis,
    /// the width table is empty, a width is zero, or the widths do not nest.
    pub fn validate(&self) -> Result<()> {
        match self {
            BinningScheme::Pyramid { max_level } => {
                if *max_level > MAX_PYRAMID_LEVEL {
                    return Err(AnnotationError::InvalidBinning(format!(
                        "pyramid max_level {} exceeds {}",
                        max_level, MAX_PYRAMID_LEVEL
                    )));
                }
            }
            BinningScheme::Widths { widths } => {
                if widths.is_empty() {
                    return Err(AnnotationError::InvalidBinning(
                        "width table is empty".to_string(),
                    ));
                }
                if let Some((level, _)) = widths.iter().find(|(_, w)| **w == 0) {
                    return Err(AnnotationError::InvalidBinning(format!(
                        "width 0 at level {}",
                        level
                    )));
                }
                let mut sorted: Vec<u64> = widths.values().copied().collect();
                sorted.sort_unstable();
                for pair in sorted.windows(2) {
                    if pair[1] % pair[0] != 0 {
                        return Err(AnnotationError::InvalidBinning(format!(
                            "width {} does not nest inside width {}",
                            pair[0], pair[1]
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// True if reads at `level` are defined
    pub fn supports_level(&self, level: u32) -> bool {
        match self {
            BinningScheme::Pyramid { max_level } => level <= *max_level,
            BinningScheme::Widths { widths } => widths.contains_key(&level),
        }
    }

    /// Bucket containing `ordinal` at `level`
    ///
    /// # Errors
    ///
    /// Returns `InvalidRange` if the level is not defined by the scheme.
    pub fn bucket(&self, ordinal: u64, level: u32) -> Result<BinKey> {
        match self {
            BinningScheme::Pyramid { max_level } => {
                let shift = pyramid_shift(*max_level, level)?;
                Ok(ordinal >> shift)
            }
            BinningScheme::Widths { widths } => {
                let width = table_width(widths, level)?;
                Ok(ordinal / width)
            }
        }
    }

    /// Inclusive ordinal bounds covered by bucket `key` at `level`
    ///
    /// Bounds saturate at `u64::MAX` for the last bucket of the axis.
    pub fn bucket_bounds(&self, key: BinKey, level: u32) -> Result<(u64, u64)> {
        match self {
            BinningScheme::Pyramid { max_level } => {
                let shift = pyramid_shift(*max_level, level)?;
                let low = key.checked_shl(shift).unwrap_or(u64::MAX);
                let span = if shift == 0 { 0 } else { (1u64 << shift) - 1 };
                Ok((low, low.saturating_add(span)))
            }
            BinningScheme::Widths { widths } => {
                let width = table_width(widths, level)?;
                let low = key.saturating_mul(width);
                Ok((low, low.saturating_add(width - 1)))
            }
        }
    }
}

fn pyramid_shift(max_level: u32, level: u32) -> Result<u32> {
    if level > max_level {
        return Err(AnnotationError::invalid_range(format!(
            "level {} is deeper than max level {}",
            level, max_level
        )));
    }
    Ok(max_level - level)
}

fn table_width(widths: &BTreeMap<u32, u64>, level: u32) -> Result<u64> {
    widths
        .get(&level)
        .copied()
        .ok_or_else(|| AnnotationError::invalid_range(format!("level {} has no bucket width", level)))
}

/// Width tables keyed by level as strings
///
/// Levels are map keys, and both TOML and tagged-enum buffering hand map keys
/// over as strings.
mod level_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(widths: &BTreeMap<u32, u64>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, u64> = widths.iter().map(|(l, w)| (l.to_string(), *w)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<BTreeMap<u32, u64>, D::Error> {
        let keyed = BTreeMap::<String, u64>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(level, width)| {
                level
                    .parse::<u32>()
                    .map(|level| (level, width))
                    .map_err(|_| D::Error::custom(format!("level '{}' is not a non-negative integer", level)))
            })
            .collect()
    }
}
