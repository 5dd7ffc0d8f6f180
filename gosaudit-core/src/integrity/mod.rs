//! GOS attachment integrity analysis.
//!
//! An object identifier is orphaned when it is present in the object table
//! but no longer referenced from the relation table. The analysis reads
//! both identifier sets through the paginated table client, counts the
//! content rows held by the orphans, and scores the system.
//!
//! # Module Structure
//! - `config`: Scan options, audited tables and the cost model
//! - `collector`: Batch-to-set identifier collection
//! - `detector`: The orphan detection algorithm
//! - `recommendations`: Metric-to-advice policy

mod collector;
mod config;
mod detector;
mod recommendations;

pub use collector::collect_identifiers;
pub use config::{CostModel, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ROWS, ScanOptions, ScanTarget};
pub use detector::{ORPHAN_CHUNK_SIZE, OrphanDetector, integrity_score};
pub use recommendations::{RecommendationPolicy, STANDARD_ADVISORIES};

use crate::Result;
use crate::models::ScanResult;
use crate::rfc::RemoteTableClient;
use tracing::{error, info};

/// Runs a complete scan: validate, connect, detect, disconnect.
///
/// The session is released on every exit path, including failures.
///
/// # Example
/// ```rust
/// use gosaudit_core::integrity::{ScanOptions, run_scan};
/// use gosaudit_core::rfc::{RemoteTableClient, memory::MemoryConnector};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let connector = MemoryConnector::new("100");
/// connector.add_table("SRGBTBREL", &[("INSTID_B", "CHAR", 70), ("OBJTYPE_B", "CHAR", 10)],
///     vec![vec!["P1", "PHIO"]]);
/// connector.add_table("SOFFPHIO", &[("PHIO_ID", "CHAR", 32)], vec![vec!["P1"], vec!["P2"]]);
/// connector.add_table("SOFFCONT1", &[("PHIO_ID", "CHAR", 32)], vec![vec!["P2"]]);
///
/// let mut client = RemoteTableClient::new(Box::new(connector));
/// let result = run_scan(&mut client, &ScanOptions::new("PRD")).await?;
///
/// assert_eq!(result.orphaned_object_count, 1);
/// assert_eq!(result.integrity_score, 50.0);
/// assert!(!client.is_connected());
/// # Ok::<(), gosaudit_core::GosAuditError>(())
/// # }).unwrap();
/// ```
///
/// # Errors
/// Returns a configuration error for invalid options, a connection error if
/// logon fails, or the first failure raised by the detector.
pub async fn run_scan(client: &mut RemoteTableClient, options: &ScanOptions) -> Result<ScanResult> {
    options.validate()?;
    client.connect().await?;

    let outcome = OrphanDetector::new(client, options).detect().await;
    client.disconnect().await;

    match &outcome {
        Ok(result) => info!(
            "Scan {} finished for {} (client {}) in {} ms",
            result.scan_id, result.system_name, result.client, result.duration_ms
        ),
        Err(e) => error!("Scan aborted: {}", e),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GosAuditError;
    use crate::rfc::RfcError;
    use crate::rfc::memory::{Call, MemoryConnector};

    fn connector() -> MemoryConnector {
        let connector = MemoryConnector::new("200");
        connector.add_table(
            "SRGBTBREL",
            &[("INSTID_B", "CHAR", 70), ("OBJTYPE_B", "CHAR", 10)],
            vec![vec!["P1", "PHIO"], vec!["M1", "MESSAGE"]],
        );
        connector.add_table(
            "SOFFPHIO",
            &[("PHIO_ID", "CHAR", 32)],
            vec![vec!["P1"], vec!["M1"]],
        );
        connector.add_table("SOFFCONT1", &[("PHIO_ID", "CHAR", 32)], vec![vec!["M1"]]);
        connector
    }

    #[tokio::test]
    async fn test_run_scan_disconnects_after_success() {
        let connector = connector();
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));

        let result = run_scan(&mut client, &ScanOptions::new("QAS")).await.unwrap();

        // M1 is only referenced by a non-PHIO relation
        assert_eq!(result.orphaned_object_count, 1);
        assert_eq!(result.orphaned_content_count, 1);
        assert_eq!(result.client, "200");
        assert_eq!(result.system_name, "QAS");
        assert!(!client.is_connected());
        assert_eq!(connector.calls().last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn test_run_scan_disconnects_after_failure() {
        let connector = connector();
        connector.fail_read_table(RfcError::Communication("connection reset".to_string()));
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));

        let err = run_scan(&mut client, &ScanOptions::new("QAS")).await.unwrap_err();
        assert!(matches!(err, GosAuditError::RemoteCall { .. }));
        assert!(!client.is_connected());
        assert_eq!(connector.opened_sessions(), 1);
        assert_eq!(connector.closed_sessions(), 1);
    }

    #[tokio::test]
    async fn test_run_scan_rejects_invalid_options_before_connecting() {
        let connector = connector();
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));

        let err = run_scan(&mut client, &ScanOptions::new("QAS").with_batch_size(0))
            .await
            .unwrap_err();
        assert!(matches!(err, GosAuditError::Configuration { .. }));
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_scan_logon_failure() {
        let connector = connector();
        connector.fail_logon(RfcError::Communication("no route to host".to_string()));
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));

        let err = run_scan(&mut client, &ScanOptions::new("QAS")).await.unwrap_err();
        assert!(err.to_string().contains("Cannot reach SAP server"));
        assert_eq!(connector.closed_sessions(), 0);
    }
}
