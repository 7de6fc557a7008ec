//! Sort keys for storage-bin identifiers.
//!
//! Two decompositions coexist and are intentionally different:
//!
//! | strategy | pattern | case | non-match |
//! |---|---|---|---|
//! | [`StrictBinKey`] (report sort) | letters, digits, optional letters | prefix upper, suffix lower | `(VALUE, -1, "")` |
//! | [`TolerantBinKey`] (bin template) | optional letters, optional digits, optional letters | all lower | `(value, 0, "")` |

use regex::Regex;
use serde::Serialize;

/// Decomposed bin identifier. Orders by prefix, then number, then suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BinKey {
    pub prefix: String,
    pub number: i64,
    pub suffix: String,
}

impl BinKey {
    pub fn new(prefix: impl Into<String>, number: i64, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            number,
            suffix: suffix.into(),
        }
    }
}

pub trait BinKeyStrategy {
    fn key(&self, bin: &str) -> BinKey;

    /// Stable in-place sort of bin identifiers by this strategy.
    fn sort(&self, bins: &mut [String]) {
        bins.sort_by_cached_key(|b| self.key(b));
    }
}

fn parse_number(digits: &str) -> i64 {
    digits.parse().unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Strict
// ---------------------------------------------------------------------------

/// `G61b` → `("G", 61, "b")`. Anything else → `(UPPER, -1, "")`, which puts
/// unparseable bins ahead of numbered bins sharing the same prefix text.
#[derive(Debug, Clone)]
pub struct StrictBinKey {
    pattern: Regex,
}

impl StrictBinKey {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^([A-Za-z]+)([0-9]+)([A-Za-z]*)$").expect("strict bin pattern"),
        }
    }
}

impl Default for StrictBinKey {
    fn default() -> Self {
        Self::new()
    }
}

impl BinKeyStrategy for StrictBinKey {
    fn key(&self, bin: &str) -> BinKey {
        let bin = bin.trim();
        match self.pattern.captures(bin) {
            Some(caps) => BinKey::new(
                caps[1].to_uppercase(),
                parse_number(&caps[2]),
                caps[3].to_lowercase(),
            ),
            None => BinKey::new(bin.to_uppercase(), -1, ""),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerant
// ---------------------------------------------------------------------------

/// Every group optional: `"12"` → `("", 12, "")`, `"ABC"` → `("abc", 0, "")`.
/// Values with other characters fall back to `(lower, 0, "")`.
#[derive(Debug, Clone)]
pub struct TolerantBinKey {
    pattern: Regex,
}

impl TolerantBinKey {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^([A-Za-z]*)([0-9]*)([A-Za-z]*)$").expect("tolerant bin pattern"),
        }
    }
}

impl Default for TolerantBinKey {
    fn default() -> Self {
        Self::new()
    }
}

impl BinKeyStrategy for TolerantBinKey {
    fn key(&self, bin: &str) -> BinKey {
        let bin = bin.trim();
        match self.pattern.captures(bin) {
            Some(caps) => {
                let number = if caps[2].is_empty() { 0 } else { parse_number(&caps[2]) };
                BinKey::new(caps[1].to_lowercase(), number, caps[3].to_lowercase())
            }
            None => BinKey::new(bin.to_lowercase(), 0, ""),
        }
    }
}
