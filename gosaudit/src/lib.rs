//! Report rendering for saved GOS integrity scan results.
//!
//! Reads the JSON (optionally zstd-compressed) file written by
//! `gosaudit-collect` and renders it as Markdown or normalized JSON.

use anyhow::Context;
use askama::Template;
use clap::ValueEnum;
use gosaudit_core::{RecommendationPolicy, ScanResult, models::group_thousands};
use std::path::Path;

/// Available output formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown audit report
    Markdown,
    /// JSON structured output
    Json,
}

/// Loads a scan result file.
///
/// Files ending in `.zst` are decompressed first, which requires the
/// `compression` feature.
pub fn load_result(path: &Path) -> anyhow::Result<ScanResult> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let data = if path.extension().is_some_and(|ext| ext == "zst") {
        decompress(&data)?
    } else {
        data
    };

    serde_json::from_slice(&data)
        .with_context(|| format!("{} is not a valid scan result", path.display()))
}

#[cfg(feature = "compression")]
fn decompress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    zstd::decode_all(data).context("Decompression failed")
}

#[cfg(not(feature = "compression"))]
fn decompress(_data: &[u8]) -> anyhow::Result<Vec<u8>> {
    anyhow::bail!("Compressed input not supported. Compile with --features compression")
}

/// Score label using the default recommendation thresholds.
pub fn rating(score: f64) -> &'static str {
    let policy = RecommendationPolicy::default();
    if score < policy.critical_score {
        "critical"
    } else if score < policy.warning_score {
        "degraded"
    } else {
        "healthy"
    }
}

#[derive(Template)]
#[template(path = "report.md", escape = "none")]
struct ReportTemplate<'a> {
    system_name: &'a str,
    client: &'a str,
    scan_id: String,
    timestamp: String,
    duration: String,
    sampling_enabled: bool,
    score: String,
    rating: &'static str,
    object_ids: String,
    active_ids: String,
    orphaned_objects: String,
    total_content: String,
    orphaned_content: String,
    storage: String,
    cost: String,
    recommendations: &'a [String],
}

impl<'a> From<&'a ScanResult> for ReportTemplate<'a> {
    fn from(result: &'a ScanResult) -> Self {
        Self {
            system_name: &result.system_name,
            client: &result.client,
            scan_id: result.scan_id.to_string(),
            timestamp: result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            duration: format!("{:.1}s", result.duration_ms as f64 / 1000.0),
            sampling_enabled: result.sampling_enabled,
            score: format!("{:.2}", result.integrity_score),
            rating: rating(result.integrity_score),
            object_ids: group_thousands(result.object_id_count),
            active_ids: group_thousands(result.active_id_count),
            orphaned_objects: group_thousands(result.orphaned_object_count),
            total_content: group_thousands(result.total_content_rows),
            orphaned_content: group_thousands(result.orphaned_content_count),
            storage: format!("{:.2}", result.estimated_storage_mb),
            cost: format!("{:.2}", result.estimated_cost_usd),
            recommendations: &result.recommendations,
        }
    }
}

/// Renders a scan result in the requested format.
pub fn render(result: &ScanResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => ReportTemplate::from(result)
            .render()
            .context("Failed to render Markdown report"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize scan result")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_result() -> ScanResult {
        ScanResult {
            scan_id: uuid::Uuid::nil(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap(),
            system_name: "PRD".to_string(),
            client: "100".to_string(),
            total_content_rows: 1_250_000,
            orphaned_object_count: 1200,
            orphaned_content_count: 60_000,
            integrity_score: 88.0,
            estimated_storage_mb: 120.0,
            estimated_cost_usd: 6.0,
            recommendations: vec![
                "CRITICAL: Integrity score below 90%. Immediate cleanup required.".to_string(),
                "HIGH STORAGE: 120.00MB of orphaned content found.".to_string(),
            ],
            sampling_enabled: false,
            object_id_count: 10_000,
            active_id_count: 8800,
            duration_ms: 4300,
        }
    }

    #[test]
    fn test_rating() {
        assert_eq!(rating(100.0), "healthy");
        assert_eq!(rating(95.0), "healthy");
        assert_eq!(rating(94.99), "degraded");
        assert_eq!(rating(90.0), "degraded");
        assert_eq!(rating(89.99), "critical");
    }

    #[test]
    fn test_markdown_template_fields() {
        let report = render(&sample_result(), OutputFormat::Markdown).unwrap();

        assert!(report.starts_with("# GOS Integrity Audit: PRD"));
        assert!(report.contains("| Client | 100 |"));
        assert!(report.contains("| Scan Time | 2024-03-05 14:07:09 UTC |"));
        assert!(report.contains("| Duration | 4.3s |"));
        assert!(report.contains("**88.00%** (critical)"));
        assert!(report.contains("| Total content rows | 1,250,000 |"));
        assert!(report.contains("| Orphaned objects | 1,200 |"));
        assert!(report.contains("| Estimated storage | 120.00 MB |"));
        assert!(report.contains("| Estimated savings | $6.00 |"));
        assert!(report.contains("| Sampling | disabled |"));
    }

    #[test]
    fn test_markdown_template_recommendations_numbered() {
        let report = render(&sample_result(), OutputFormat::Markdown).unwrap();

        assert!(report.contains(
            "1. CRITICAL: Integrity score below 90%. Immediate cleanup required.\n"
        ));
        assert!(report.contains("2. HIGH STORAGE: 120.00MB of orphaned content found.\n"));
    }

    #[test]
    fn test_markdown_template_without_recommendations() {
        let mut result = sample_result();
        result.recommendations.clear();
        result.sampling_enabled = true;

        let report = render(&result, OutputFormat::Markdown).unwrap();
        assert!(report.contains("None."));
        assert!(report.contains("| Sampling | enabled, results are partial |"));
    }

    #[test]
    fn test_markdown_output_is_not_escaped() {
        let mut result = sample_result();
        result.system_name = "P<1>&".to_string();

        let report = render(&result, OutputFormat::Markdown).unwrap();
        assert!(report.contains("# GOS Integrity Audit: P<1>&"));
    }

    #[test]
    fn test_json_output_roundtrips() {
        let result = sample_result();
        let json = render(&result, OutputFormat::Json).unwrap();
        let parsed: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
