//! File-based tests for loading and rendering saved scan results.

use chrono::Utc;
use gosaudit::{OutputFormat, load_result, render};
use gosaudit_core::ScanResult;

fn saved_result() -> ScanResult {
    ScanResult {
        scan_id: uuid::Uuid::new_v4(),
        timestamp: Utc::now(),
        system_name: "QAS".to_string(),
        client: "200".to_string(),
        total_content_rows: 3000,
        orphaned_object_count: 0,
        orphaned_content_count: 0,
        integrity_score: 100.0,
        estimated_storage_mb: 0.0,
        estimated_cost_usd: 0.0,
        recommendations: vec!["Review relationship mappings".to_string()],
        sampling_enabled: false,
        object_id_count: 1000,
        active_id_count: 1000,
        duration_ms: 120,
    }
}

#[test]
fn test_integration_load_and_render_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GOS_Integrity_Audit_QAS.json");
    let result = saved_result();
    std::fs::write(&path, serde_json::to_string_pretty(&result).unwrap()).unwrap();

    let loaded = load_result(&path).unwrap();
    assert_eq!(loaded, result);

    let report = render(&loaded, OutputFormat::Markdown).unwrap();
    assert!(report.contains("# GOS Integrity Audit: QAS"));
    assert!(report.contains("**100.00%** (healthy)"));
    assert!(report.contains("1. Review relationship mappings"));
}

#[test]
fn test_file_missing_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_result(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_file_with_invalid_json_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"system_name\": \"PRD\"}").unwrap();

    let err = load_result(&path).unwrap_err();
    assert!(err.to_string().contains("is not a valid scan result"));
}

#[cfg(feature = "compression")]
#[test]
fn test_file_compressed_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.json.zst");
    let result = saved_result();
    let json = serde_json::to_vec(&result).unwrap();
    std::fs::write(&path, zstd::encode_all(json.as_slice(), 3).unwrap()).unwrap();

    assert_eq!(load_result(&path).unwrap(), result);
}

#[cfg(not(feature = "compression"))]
#[test]
fn test_file_compressed_input_requires_feature() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.json.zst");
    std::fs::write(&path, b"\x28\xb5\x2f\xfd").unwrap();

    assert!(load_result(&path).is_err());
}
