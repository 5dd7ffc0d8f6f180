//! Orphan detection over the GOS relation, object and content tables.

use super::{ScanOptions, collect_identifiers};
use crate::Result;
use crate::models::{ScanResult, round2};
use crate::rfc::RemoteTableClient;
use crate::rfc::options::in_list_predicate;
use chrono::Utc;
use std::collections::HashSet;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Maximum identifiers per content count predicate.
pub const ORPHAN_CHUNK_SIZE: usize = 1000;

/// Percentage of object identifiers that are still referenced.
///
/// An empty object table scores exactly 100.
pub fn integrity_score(object_ids: usize, orphan_ids: usize) -> f64 {
    if object_ids == 0 {
        return 100.0;
    }
    let referenced = object_ids.saturating_sub(orphan_ids);
    100.0 * referenced as f64 / object_ids as f64
}

/// Runs the orphan analysis against a connected client.
///
/// The detector borrows the client, so it cannot open or close the session
/// itself. Use [`super::run_scan`] for the full connect/scan/disconnect
/// cycle.
pub struct OrphanDetector<'a> {
    client: &'a RemoteTableClient,
    options: &'a ScanOptions,
}

impl<'a> OrphanDetector<'a> {
    pub fn new(client: &'a RemoteTableClient, options: &'a ScanOptions) -> Self {
        Self { client, options }
    }

    async fn identifiers(
        &self,
        table: &str,
        field: &str,
        predicate: Option<&str>,
    ) -> Result<HashSet<String>> {
        let mut pager = self
            .client
            .fetch_batches(
                table,
                &[field],
                predicate,
                self.options.batch_size,
                self.options.row_cap(),
            )
            .await?;
        collect_identifiers(&mut pager, field).await
    }

    /// Sums the content rows of `orphans`, one filtered count per chunk.
    async fn orphan_content_count(&self, orphans: &[&String]) -> Result<u64> {
        if orphans.is_empty() {
            return Ok(0);
        }

        let target = &self.options.target;
        let chunks = orphans.len().div_ceil(ORPHAN_CHUNK_SIZE);
        let mut total: u64 = 0;

        for (index, chunk) in orphans.chunks(ORPHAN_CHUNK_SIZE).enumerate() {
            let predicate = in_list_predicate(&target.content_id_field, chunk);
            let count = self
                .client
                .count_rows(
                    &target.content_table,
                    &target.content_id_field,
                    &predicate,
                    self.options.batch_size,
                )
                .await?;
            debug!(
                "Content chunk {}/{}: {} ids, {} rows",
                index.saturating_add(1),
                chunks,
                chunk.len(),
                count
            );
            total = total.saturating_add(count);
        }

        Ok(total)
    }

    /// Runs the analysis and builds the scan result.
    ///
    /// # Errors
    /// Any failure while collecting identifiers or counting content aborts
    /// the scan. No partial result is produced.
    pub async fn detect(&self) -> Result<ScanResult> {
        let started = Instant::now();
        let options = self.options;
        let target = &options.target;

        info!("Starting GOS integrity scan for {}", options.system_name);
        if let Some(cap) = options.row_cap() {
            info!("Sampling enabled: at most {} rows per table", cap);
        }

        let total_content_rows = self.client.row_count(&target.content_table).await;

        info!("Collecting active references from {}", target.relation_table);
        let active_ids = self
            .identifiers(
                &target.relation_table,
                &target.relation_id_field,
                target.relation_predicate.as_deref(),
            )
            .await?;
        info!("Found {} active references", active_ids.len());

        info!("Collecting physical objects from {}", target.object_table);
        let object_ids = self
            .identifiers(&target.object_table, &target.object_id_field, None)
            .await?;
        info!("Found {} physical objects", object_ids.len());

        let mut orphans: Vec<&String> = object_ids.difference(&active_ids).collect();
        orphans.sort_unstable();
        info!("Identified {} orphaned objects", orphans.len());

        let orphaned_content_count = self.orphan_content_count(&orphans).await?;

        let orphan_count = orphans.len() as u64;
        let score = integrity_score(object_ids.len(), orphans.len());
        let storage_mb = options.cost_model.storage_mb(orphaned_content_count);
        let cost_usd = options.cost_model.cost_usd(storage_mb);
        let recommendations = options.policy.evaluate(score, storage_mb, orphan_count);

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Scan complete in {} ms: score {:.2}%, {} orphans",
            duration_ms, score, orphan_count
        );

        Ok(ScanResult {
            scan_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system_name: options.system_name.clone(),
            client: self.client.logon_client().to_string(),
            total_content_rows,
            orphaned_object_count: orphan_count,
            orphaned_content_count,
            integrity_score: round2(score),
            estimated_storage_mb: round2(storage_mb),
            estimated_cost_usd: round2(cost_usd),
            recommendations,
            sampling_enabled: options.sampling_enabled,
            object_id_count: object_ids.len() as u64,
            active_id_count: active_ids.len() as u64,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GosAuditError;
    use crate::rfc::RfcError;
    use crate::rfc::memory::MemoryConnector;

    fn gos_tables(relations: &[&str], objects: &[&str], contents: &[&str]) -> MemoryConnector {
        let connector = MemoryConnector::new("100");
        connector.add_table(
            "SRGBTBREL",
            &[("INSTID_B", "CHAR", 70), ("OBJTYPE_B", "CHAR", 10)],
            relations.iter().map(|id| vec![*id, "PHIO"]).collect(),
        );
        connector.add_table(
            "SOFFPHIO",
            &[("PHIO_ID", "CHAR", 32)],
            objects.iter().map(|id| vec![*id]).collect(),
        );
        connector.add_table(
            "SOFFCONT1",
            &[("PHIO_ID", "CHAR", 32), ("CLUSTD", "RSTR", 0)],
            contents.iter().map(|id| vec![*id, "payload"]).collect(),
        );
        connector
    }

    async fn detect(connector: &MemoryConnector, options: &ScanOptions) -> Result<ScanResult> {
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));
        client.connect().await?;
        OrphanDetector::new(&client, options).detect().await
    }

    #[test]
    fn test_integrity_score() {
        assert_eq!(integrity_score(0, 0), 100.0);
        assert_eq!(integrity_score(4, 0), 100.0);
        assert_eq!(integrity_score(4, 1), 75.0);
        assert_eq!(integrity_score(4, 4), 0.0);
    }

    #[tokio::test]
    async fn test_set_difference_and_score() {
        let connector = gos_tables(&["B"], &["A", "B", "C"], &["A", "A", "C", "B"]);
        let result = detect(&connector, &ScanOptions::new("PRD")).await.unwrap();

        assert_eq!(result.orphaned_object_count, 2);
        assert_eq!(result.orphaned_content_count, 3);
        assert_eq!(result.integrity_score, 33.33);
        assert_eq!(result.total_content_rows, 4);
        assert_eq!(result.object_id_count, 3);
        assert_eq!(result.active_id_count, 1);
        assert_eq!(result.client, "100");
        assert_eq!(result.estimated_storage_mb, 0.01);
        assert!(result.recommendations[0].starts_with("CRITICAL"));
    }

    #[tokio::test]
    async fn test_empty_object_table_scores_100() {
        let connector = gos_tables(&["X"], &[], &[]);
        let result = detect(&connector, &ScanOptions::new("PRD")).await.unwrap();

        assert_eq!(result.integrity_score, 100.0);
        assert_eq!(result.orphaned_object_count, 0);
        assert_eq!(result.orphaned_content_count, 0);
        assert!(result.is_clean());
        assert_eq!(result.recommendations.len(), 3);

        // No content count is issued without orphans
        assert!(
            connector
                .read_requests()
                .iter()
                .all(|request| request.table != "SOFFCONT1")
        );
    }

    #[tokio::test]
    async fn test_relation_predicate_is_sent() {
        let connector = gos_tables(&["A"], &["A"], &[]);
        detect(&connector, &ScanOptions::new("PRD")).await.unwrap();

        let relation_reads: Vec<_> = connector
            .read_requests()
            .into_iter()
            .filter(|request| request.table == "SRGBTBREL")
            .collect();
        assert_eq!(relation_reads[0].options.concat(), "OBJTYPE_B = 'PHIO'");
        assert_eq!(relation_reads[0].fields, vec!["INSTID_B".to_string()]);
    }

    #[tokio::test]
    async fn test_orphans_counted_in_chunks_of_1000() {
        let objects: Vec<String> = (0..2500).map(|i| format!("P{:05}", i)).collect();
        let object_refs: Vec<&str> = objects.iter().map(String::as_str).collect();
        let connector = gos_tables(&[], &object_refs, &object_refs[..10]);

        let result = detect(&connector, &ScanOptions::new("PRD")).await.unwrap();
        assert_eq!(result.orphaned_object_count, 2500);
        assert_eq!(result.orphaned_content_count, 10);

        let chunk_sizes: Vec<usize> = connector
            .read_requests()
            .iter()
            .filter(|request| request.table == "SOFFCONT1")
            .map(|request| request.options.concat().matches(',').count() + 1)
            .collect();
        assert_eq!(chunk_sizes, vec![1000, 1000, 500]);

        // The payload column is never requested
        assert!(
            connector
                .read_requests()
                .iter()
                .all(|request| !request.fields.iter().any(|f| f == "CLUSTD"))
        );
    }

    #[tokio::test]
    async fn test_sampling_cap_applies_to_both_collections() {
        let ids: Vec<String> = (0..30).map(|i| format!("P{:03}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let connector = gos_tables(&refs, &refs, &[]);

        let options = ScanOptions::new("PRD")
            .with_batch_size(10)
            .with_max_rows(10)
            .with_sampling(true);
        let result = detect(&connector, &options).await.unwrap();

        assert_eq!(result.active_id_count, 10);
        assert_eq!(result.object_id_count, 10);
        assert!(result.sampling_enabled);
        assert_eq!(result.orphaned_object_count, 0);
    }

    #[tokio::test]
    async fn test_collection_failure_aborts_scan() {
        let connector = gos_tables(&["A"], &["A", "B"], &["B"]);
        connector.fail_read_table_of(
            "SOFFPHIO",
            RfcError::Abap {
                key: "TABLE_NOT_AVAILABLE".to_string(),
                message: "locked".to_string(),
            },
        );

        let err = detect(&connector, &ScanOptions::new("PRD")).await.unwrap_err();
        assert!(matches!(err, GosAuditError::RemoteCall { ref table, .. } if table == "SOFFPHIO"));
        assert!(
            connector
                .read_requests()
                .iter()
                .all(|request| request.table != "SOFFCONT1")
        );
    }
}
