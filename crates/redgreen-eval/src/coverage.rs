//! Heuristic coverage estimate.
//!
//! Branches are counted with regexes over the raw source and scaled by the
//! pass rate. This is an approximation, not instrumentation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static IF_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bif\s*\(").expect("valid if regex"));
static ELSE_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\belse\b").expect("valid else regex"));
static TERNARY_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?.*:").expect("valid ternary regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub covered_branches: usize,
    /// Never zero.
    pub total_branches: usize,
    /// In `0..=100`.
    pub percentage: u32,
}

/// Number of `if (`, `else` and `? :` occurrences in `source`.
pub fn count_branches(source: &str) -> usize {
    IF_BRANCH.find_iter(source).count()
        + ELSE_BRANCH.find_iter(source).count()
        + TERNARY_BRANCH.find_iter(source).count()
}

/// Estimate coverage from the branch count and the pass rate.
pub fn estimate(source: &str, passed: usize, total: usize) -> CoverageReport {
    let branches = count_branches(source);
    let pass_rate = if total > 0 {
        passed as f64 / total as f64
    } else {
        0.0
    };
    let covered = (branches as f64 * pass_rate).floor() as usize;
    let percentage = if branches > 0 {
        (covered as f64 / branches as f64 * 100.0 + 0.5).floor()
    } else if passed > 0 {
        100.0
    } else {
        0.0
    };
    CoverageReport {
        covered_branches: covered,
        total_branches: branches.max(1),
        percentage: percentage.clamp(0.0, 100.0) as u32,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageTier {
    High,
    Medium,
    Low,
}

impl CoverageTier {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => Self::High,
            50.. => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::High => "#4ade80",
            Self::Medium => "#fbbf24",
            Self::Low => "#f87171",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "Excellent Coverage",
            Self::Medium => "Partial Coverage",
            Self::Low => "Low Coverage",
        }
    }
}

impl CoverageReport {
    pub fn tier(&self) -> CoverageTier {
        CoverageTier::from_percentage(self.percentage)
    }
}
