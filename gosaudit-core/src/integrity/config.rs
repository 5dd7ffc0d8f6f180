//! Scan configuration: audited tables, cost model and batching limits.

use super::RecommendationPolicy;
use crate::error::GosAuditError;
use serde::{Deserialize, Serialize};

/// Default rows per RFC_READ_TABLE call.
pub const DEFAULT_BATCH_SIZE: u32 = 5000;

/// Default row cap per collection when sampling is enabled.
pub const DEFAULT_MAX_ROWS: u64 = 50_000;

/// Tables and fields examined by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    /// Relation table holding the active references
    pub relation_table: String,
    /// Field of the relation table holding the referenced object id
    pub relation_id_field: String,
    /// Filter restricting the relation table to content references
    pub relation_predicate: Option<String>,
    /// Table enumerating physical content objects
    pub object_table: String,
    pub object_id_field: String,
    /// Table holding the content payload rows
    pub content_table: String,
    pub content_id_field: String,
}

impl Default for ScanTarget {
    fn default() -> Self {
        Self {
            relation_table: "SRGBTBREL".to_string(),
            relation_id_field: "INSTID_B".to_string(),
            relation_predicate: Some("OBJTYPE_B = 'PHIO'".to_string()),
            object_table: "SOFFPHIO".to_string(),
            object_id_field: "PHIO_ID".to_string(),
            content_table: "SOFFCONT1".to_string(),
            content_id_field: "PHIO_ID".to_string(),
        }
    }
}

impl ScanTarget {
    /// Lists `(table, field, role)` for every table the scan touches.
    pub fn audited_tables(&self) -> [(&str, &str, &str); 3] {
        [
            (
                self.relation_table.as_str(),
                self.relation_id_field.as_str(),
                "relationships",
            ),
            (
                self.object_table.as_str(),
                self.object_id_field.as_str(),
                "physical objects",
            ),
            (
                self.content_table.as_str(),
                self.content_id_field.as_str(),
                "content (count only)",
            ),
        ]
    }

    /// Validates table and field names.
    ///
    /// Names are interpolated into option lines, so only dictionary
    /// identifiers (letters, digits, `_` and namespace `/`) are accepted.
    ///
    /// # Errors
    /// Returns a configuration error for any malformed name.
    pub fn validate(&self) -> crate::Result<()> {
        let pattern = regex::Regex::new(r"^[A-Z/][A-Z0-9_/]{0,29}$").map_err(|e| {
            GosAuditError::configuration(format!("Invalid identifier pattern: {}", e))
        })?;

        for (table, field, _) in self.audited_tables() {
            for name in [table, field] {
                if !pattern.is_match(name) {
                    return Err(GosAuditError::configuration(format!(
                        "'{}' is not a valid dictionary name",
                        name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Storage and price assumptions for orphaned content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Average payload per content row in MB
    pub per_record_mb: f64,
    /// Storage price in USD per MB
    pub price_per_mb: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            per_record_mb: 0.002,
            price_per_mb: 0.05,
        }
    }
}

impl CostModel {
    /// Estimated storage held by `content_rows` rows, in MB.
    pub fn storage_mb(&self, content_rows: u64) -> f64 {
        content_rows as f64 * self.per_record_mb
    }

    /// Estimated cost of `storage_mb` in USD.
    pub fn cost_usd(&self, storage_mb: f64) -> f64 {
        storage_mb * self.price_per_mb
    }

    fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("per_record_mb", self.per_record_mb),
            ("price_per_mb", self.price_per_mb),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GosAuditError::configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Options for one integrity scan.
///
/// # Example
/// ```rust
/// use gosaudit_core::integrity::ScanOptions;
///
/// let options = ScanOptions::new("PRD").with_sampling(true).with_max_rows(1000);
/// assert!(options.validate().is_ok());
/// assert_eq!(options.row_cap(), Some(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// SAP system id recorded in the result
    pub system_name: String,
    pub batch_size: u32,
    /// Row cap per collection; only applied when sampling is enabled
    pub max_rows: u64,
    pub sampling_enabled: bool,
    pub target: ScanTarget,
    pub cost_model: CostModel,
    pub policy: RecommendationPolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            system_name: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_rows: DEFAULT_MAX_ROWS,
            sampling_enabled: false,
            target: ScanTarget::default(),
            cost_model: CostModel::default(),
            policy: RecommendationPolicy::default(),
        }
    }
}

impl ScanOptions {
    /// Creates options with defaults for `system_name`.
    pub fn new(system_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_sampling(mut self, enabled: bool) -> Self {
        self.sampling_enabled = enabled;
        self
    }

    pub fn with_target(mut self, target: ScanTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_policy(mut self, policy: RecommendationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Row cap applied to both identifier collections.
    pub fn row_cap(&self) -> Option<u64> {
        self.sampling_enabled.then_some(self.max_rows)
    }

    /// Validates the options.
    ///
    /// # Errors
    /// Returns a configuration error for an empty system name, a zero batch
    /// size, a zero sampling cap, or an invalid target or cost model.
    pub fn validate(&self) -> crate::Result<()> {
        if self.system_name.trim().is_empty() {
            return Err(GosAuditError::configuration("system name cannot be empty"));
        }

        if self.batch_size == 0 {
            return Err(GosAuditError::configuration(
                "batch_size must be greater than 0",
            ));
        }

        if self.sampling_enabled && self.max_rows == 0 {
            return Err(GosAuditError::configuration(
                "max_rows must be greater than 0 when sampling is enabled",
            ));
        }

        self.target.validate()?;
        self.cost_model.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_default() {
        let options = ScanOptions::new("PRD");
        assert_eq!(options.batch_size, 5000);
        assert_eq!(options.max_rows, 50_000);
        assert!(!options.sampling_enabled);
        assert_eq!(options.row_cap(), None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_scan_options_validation() {
        assert!(ScanOptions::new("").validate().is_err());
        assert!(ScanOptions::new("PRD").with_batch_size(0).validate().is_err());
        assert!(
            ScanOptions::new("PRD")
                .with_sampling(true)
                .with_max_rows(0)
                .validate()
                .is_err()
        );
        // Cap is ignored without sampling
        assert!(ScanOptions::new("PRD").with_max_rows(0).validate().is_ok());
    }

    #[test]
    fn test_target_rejects_injection() {
        let target = ScanTarget {
            object_table: "SOFFPHIO WHERE 1 = 1".to_string(),
            ..ScanTarget::default()
        };
        assert!(target.validate().is_err());

        let namespaced = ScanTarget {
            content_table: "/ABC/CONT".to_string(),
            ..ScanTarget::default()
        };
        assert!(namespaced.validate().is_ok());
    }

    #[test]
    fn test_cost_model() {
        let model = CostModel::default();
        let storage = model.storage_mb(1000);
        assert!((storage - 2.0).abs() < f64::EPSILON);
        assert!((model.cost_usd(storage) - 0.1).abs() < 1e-12);

        let invalid = CostModel {
            per_record_mb: f64::NAN,
            ..CostModel::default()
        };
        assert!(ScanOptions::new("PRD").with_cost_model(invalid).validate().is_err());
    }
}
