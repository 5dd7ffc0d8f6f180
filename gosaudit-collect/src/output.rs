//! File output operations for scan results.
//!
//! Handles writing the scan result to the output directory with optional
//! compression.

use gosaudit_core::{GosAuditError, Result, ScanResult};
use std::path::{Path, PathBuf};

/// Builds `GOS_Integrity_Audit_{system}_{YYYYmmdd_HHMMSS}.json[.zst]`.
///
/// Characters outside `[A-Za-z0-9_-]` in the system id are replaced so the
/// name can never leave the output directory.
pub fn output_file_name(result: &ScanResult, compressed: bool) -> String {
    let system: String = result
        .system_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "GOS_Integrity_Audit_{}_{}.json{}",
        system,
        result.timestamp.format("%Y%m%d_%H%M%S"),
        if compressed { ".zst" } else { "" }
    )
}

/// Saves the scan result into `output_dir` and returns the file path.
///
/// # Errors
/// Returns an error if the directory cannot be created, serialization
/// fails, or compression is requested without the `compression` feature.
pub async fn save_result(result: &ScanResult, output_dir: &Path, compress: bool) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| GosAuditError::Io {
            context: format!("Failed to create {}", output_dir.display()),
            source: e,
        })?;

    let json_data = serde_json::to_string_pretty(result).map_err(|e| {
        GosAuditError::Serialization {
            context: "scan result".to_string(),
            source: e,
        }
    })?;

    let output_path = output_dir.join(output_file_name(result, compress));

    if compress {
        #[cfg(feature = "compression")]
        {
            save_compressed(&json_data, &output_path).await?;
        }
        #[cfg(not(feature = "compression"))]
        {
            return Err(GosAuditError::configuration(
                "Compression not available. Compile with --features compression",
            ));
        }
    } else {
        save_json(&json_data, &output_path).await?;
    }

    tracing::info!("Scan result saved to {}", output_path.display());
    Ok(output_path)
}

/// Saves JSON data to file.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| GosAuditError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })
}

/// Saves compressed JSON data.
#[cfg(feature = "compression")]
async fn save_compressed(json_data: &str, output_path: &Path) -> Result<()> {
    let compressed_data = zstd::encode_all(json_data.as_bytes(), 3).map_err(|e| {
        GosAuditError::Io {
            context: "Compression failed".to_string(),
            source: e,
        }
    })?;

    tokio::fs::write(output_path, compressed_data)
        .await
        .map_err(|e| GosAuditError::Io {
            context: format!(
                "Failed to write compressed file to {}",
                output_path.display()
            ),
            source: e,
        })
}
