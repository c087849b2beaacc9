//! Authorization levels and accuracy tiers.

use serde::{Deserialize, Serialize};

/// Minimum authorization level a caller requires.
///
/// One enum covers both platform vocabularies: `Coarse`/`Fine` on
/// platforms with a fused provider, `WhenInUse`/`Always` on platforms
/// with per-usage authorization. The permission gate interprets the
/// value for its platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    Coarse,
    Fine,
    WhenInUse,
    Always,
}

/// Requested power-vs-precision tier.
///
/// The derive order matters: variants are declared from least to most
/// accurate so that `Ord` picks the most accurate tier when merging
/// concurrent requests. Ties are total, so the comparison stays
/// deterministic without a secondary rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    NoPower,
    Low,
    Balanced,
    High,
}
