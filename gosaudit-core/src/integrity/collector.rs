//! Drains a batch pager into a set of identifiers.

use crate::Result;
use crate::rfc::BatchPager;
use std::collections::HashSet;
use tracing::debug;

/// Collects the trimmed, non-empty values of `field` from every batch.
///
/// Rows without the field or with a blank value are skipped. Duplicates
/// collapse into one entry.
///
/// # Errors
/// Any batch failure aborts collection; the partial set is discarded.
pub async fn collect_identifiers(
    pager: &mut BatchPager<'_>,
    field: &str,
) -> Result<HashSet<String>> {
    let mut identifiers = HashSet::new();
    let mut batches: u64 = 0;

    while let Some(batch) = pager.next_batch().await? {
        batches = batches.saturating_add(1);
        identifiers.extend(
            batch
                .iter()
                .filter_map(|row| row.get(field))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        );
        debug!(
            "Processed batch {} of {}: {} unique ids so far",
            batches,
            pager.table(),
            identifiers.len()
        );
    }

    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::memory::MemoryConnector;
    use crate::rfc::{RemoteTableClient, RfcError};

    async fn connected(connector: &MemoryConnector) -> RemoteTableClient {
        let mut client = RemoteTableClient::new(Box::new(connector.clone()));
        client.connect().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_collects_unique_non_empty_ids() {
        let connector = MemoryConnector::new("100");
        connector.add_table(
            "SRGBTBREL",
            &[("INSTID_B", "CHAR", 70)],
            vec![vec!["P1"], vec!["P2"], vec!["P1"], vec!["   "], vec![" P3 "]],
        );
        let client = connected(&connector).await;

        let mut pager = client
            .fetch_batches("SRGBTBREL", &["INSTID_B"], None, 2, None)
            .await
            .unwrap();
        let ids = collect_identifiers(&mut pager, "INSTID_B").await.unwrap();

        let expected: HashSet<String> = ["P1", "P2", "P3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ids, expected);
        assert_eq!(connector.read_table_calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_discards_partial_set() {
        let connector = MemoryConnector::new("100");
        connector.add_table("SOFFPHIO", &[("PHIO_ID", "CHAR", 32)], vec![vec!["P1"]]);
        connector.fail_read_table(RfcError::Communication("reset".to_string()));
        let client = connected(&connector).await;

        let mut pager = client
            .fetch_batches("SOFFPHIO", &["PHIO_ID"], None, 10, None)
            .await
            .unwrap();
        assert!(collect_identifiers(&mut pager, "PHIO_ID").await.is_err());
    }
}
