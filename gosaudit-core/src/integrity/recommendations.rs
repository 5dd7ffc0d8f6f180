//! Advisory recommendations derived from scan metrics.

use serde::{Deserialize, Serialize};

/// Advisory items appended to every recommendation list, in order.
pub const STANDARD_ADVISORIES: [&str; 3] = [
    "Validate findings in non-production system before cleanup",
    "Backup relevant tables before executing cleanup operations",
    "Review relationship mappings to confirm orphans are truly unused",
];

/// Thresholds that map scan metrics to recommendations.
///
/// # Example
/// ```rust
/// use gosaudit_core::integrity::RecommendationPolicy;
///
/// let items = RecommendationPolicy::default().evaluate(97.0, 50.0, 10);
/// assert_eq!(items.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPolicy {
    /// Scores below this are critical
    pub critical_score: f64,
    /// Scores below this (and not critical) are warnings
    pub warning_score: f64,
    /// Reclaimable storage above this many MB is called out
    pub storage_threshold_mb: f64,
    /// Orphan counts above this are called out
    pub orphan_count_threshold: u64,
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            critical_score: 90.0,
            warning_score: 95.0,
            storage_threshold_mb: 100.0,
            orphan_count_threshold: 1000,
        }
    }
}

impl RecommendationPolicy {
    /// Builds the ordered recommendation list.
    ///
    /// The order is fixed: severity tier, storage, orphan count, then the
    /// three [`STANDARD_ADVISORIES`].
    pub fn evaluate(&self, score: f64, storage_mb: f64, orphan_count: u64) -> Vec<String> {
        let mut recommendations = Vec::with_capacity(6);

        if score < self.critical_score {
            recommendations.push(format!(
                "CRITICAL: Integrity score below {}%. Immediate cleanup recommended.",
                self.critical_score
            ));
        } else if score < self.warning_score {
            recommendations.push(format!(
                "WARNING: Integrity score below {}%. Cleanup recommended.",
                self.warning_score
            ));
        }

        if storage_mb > self.storage_threshold_mb {
            recommendations.push(format!(
                "HIGH STORAGE: {:.2}MB available for cleanup. Consider Content Server migration.",
                storage_mb
            ));
        }

        if orphan_count > self.orphan_count_threshold {
            recommendations.push(format!(
                "LARGE ORPHAN COUNT: {} orphaned records found. Run archiving utilities to reclaim space.",
                orphan_count
            ));
        }

        recommendations.extend(STANDARD_ADVISORIES.iter().map(|item| (*item).to_string()));
        recommendations
    }
}
