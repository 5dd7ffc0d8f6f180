//! Core data models for remote table access and scan results.
//!
//! Field metadata and rows are transient: they exist only while a scan is
//! running. `ScanResult` is the one value that outlives a scan and is the
//! only model designed for serialization to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// ABAP dictionary data type of a table field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Fixed-length character
    Char,
    /// Numeric text
    Numc,
    /// Date (YYYYMMDD)
    Dats,
    /// Time (HHMMSS)
    Tims,
    /// 4-byte integer
    Int4,
    /// Packed decimal
    Dec,
    /// Variable-length binary
    RawString,
    /// Any dictionary type without a dedicated width rule
    Other(String),
}

impl DataType {
    /// Parses the `DATATYPE` value returned by `DDIF_FIELDINFO_GET`.
    pub fn from_dictionary(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CHAR" => DataType::Char,
            "NUMC" => DataType::Numc,
            "DATS" => DataType::Dats,
            "TIMS" => DataType::Tims,
            "INT4" => DataType::Int4,
            "DEC" => DataType::Dec,
            "RSTR" | "RAWSTRING" => DataType::RawString,
            other => DataType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Char => write!(f, "CHAR"),
            DataType::Numc => write!(f, "NUMC"),
            DataType::Dats => write!(f, "DATS"),
            DataType::Tims => write!(f, "TIMS"),
            DataType::Int4 => write!(f, "INT4"),
            DataType::Dec => write!(f, "DEC"),
            DataType::RawString => write!(f, "RAWSTRING"),
            DataType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Dictionary metadata for one field, used only to compute row width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    pub length: u32,
}

impl FieldSpec {
    /// Creates a new field spec.
    pub fn new(name: impl Into<String>, data_type: DataType, length: u32) -> Self {
        Self {
            name: name.into(),
            data_type,
            length,
        }
    }
}

/// One parsed row of a paginated read.
///
/// Field names are shared across every row of a pager, so a row only owns
/// its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    /// Pairs values positionally with field names.
    ///
    /// Callers guarantee `values.len() == fields.len()`.
    pub(crate) fn new(fields: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert_eq!(fields.len(), values.len());
        Self { fields, values }
    }

    /// Returns the trimmed value of `field`, if it was requested.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|name| name == field)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// Iterates `(field, value)` pairs in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One page of rows returned by a single paginated read.
pub type Batch = Vec<Row>;

/// Result of a GOS integrity scan.
///
/// Constructed once by the orphan detector and never mutated afterwards.
/// Score, storage and cost are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scan_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub system_name: String,
    pub client: String,
    pub total_content_rows: u64,
    pub orphaned_object_count: u64,
    pub orphaned_content_count: u64,
    /// 0-100, higher is better
    pub integrity_score: f64,
    pub estimated_storage_mb: f64,
    pub estimated_cost_usd: f64,
    pub recommendations: Vec<String>,
    pub sampling_enabled: bool,
    pub object_id_count: u64,
    pub active_id_count: u64,
    pub duration_ms: u64,
}

impl ScanResult {
    /// Returns true when no orphaned objects were found.
    pub fn is_clean(&self) -> bool {
        self.orphaned_object_count == 0
    }
}

/// Formats a count with `,` thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Rounds to two decimals, the precision reported in scan results.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_from_dictionary() {
        assert_eq!(DataType::from_dictionary("CHAR"), DataType::Char);
        assert_eq!(DataType::from_dictionary(" numc "), DataType::Numc);
        assert_eq!(DataType::from_dictionary("RSTR"), DataType::RawString);
        assert_eq!(DataType::from_dictionary("RAWSTRING"), DataType::RawString);
        assert_eq!(
            DataType::from_dictionary("LRAW"),
            DataType::Other("LRAW".to_string())
        );
    }

    #[test]
    fn test_row_lookup() {
        let fields: Arc<[String]> = vec!["PHIO_ID".to_string(), "LOIO_ID".to_string()].into();
        let row = Row::new(fields, vec!["P1".to_string(), "L1".to_string()]);

        assert_eq!(row.get("PHIO_ID"), Some("P1"));
        assert_eq!(row.get("LOIO_ID"), Some("L1"));
        assert_eq!(row.get("CLUSTD"), None);
        assert_eq!(row.len(), 2);
        assert_eq!(
            row.iter().collect::<Vec<_>>(),
            vec![("PHIO_ID", "P1"), ("LOIO_ID", "L1")]
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_scan_result_serialization_roundtrip() {
        let result = ScanResult {
            scan_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system_name: "PRD".to_string(),
            client: "100".to_string(),
            total_content_rows: 10,
            orphaned_object_count: 0,
            orphaned_content_count: 0,
            integrity_score: 100.0,
            estimated_storage_mb: 0.0,
            estimated_cost_usd: 0.0,
            recommendations: vec!["Backup".to_string()],
            sampling_enabled: false,
            object_id_count: 3,
            active_id_count: 3,
            duration_ms: 12,
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
        assert!(parsed.is_clean());
    }
}
