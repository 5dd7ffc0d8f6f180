//! Lazy pagination over RFC_READ_TABLE.

use super::{DELIMITER, RfcSession, ReadTableRequest, functions};
use crate::error::GosAuditError;
use crate::models::{Batch, Row};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// A finite, forward-only sequence of row batches.
///
/// Each call to [`BatchPager::next_batch`] issues at most one
/// `RFC_READ_TABLE` request with `skip = step * batch_size`. The pager stops
/// when a page comes back empty, when a page is shorter than `batch_size`,
/// or when the rows yielded so far reach `max_rows`. The cap is checked
/// between pages, so the last batch may overshoot it by up to
/// `batch_size - 1` rows.
///
/// Once exhausted (or after an error) the pager returns `Ok(None)` forever
/// without issuing further calls. It cannot be restarted.
pub struct BatchPager<'a> {
    session: &'a dyn RfcSession,
    table: String,
    fields: Arc<[String]>,
    options: Vec<String>,
    batch_size: u32,
    max_rows: Option<u64>,
    step: u64,
    fetched: u64,
    done: bool,
}

impl std::fmt::Debug for BatchPager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPager")
            .field("table", &self.table)
            .field("fields", &self.fields)
            .field("batch_size", &self.batch_size)
            .field("max_rows", &self.max_rows)
            .field("step", &self.step)
            .field("fetched", &self.fetched)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<'a> BatchPager<'a> {
    pub(crate) fn new(
        session: &'a dyn RfcSession,
        table: &str,
        fields: Arc<[String]>,
        options: Vec<String>,
        batch_size: u32,
        max_rows: Option<u64>,
    ) -> Self {
        Self {
            session,
            table: table.to_string(),
            fields,
            options,
            batch_size,
            max_rows,
            step: 0,
            fetched: 0,
            done: false,
        }
    }

    /// Fetches the next page.
    ///
    /// # Errors
    /// Returns [`GosAuditError::RemoteCall`] if the read fails and
    /// [`GosAuditError::RowParse`] if a row does not split into the
    /// requested number of columns. Either error exhausts the pager.
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.done {
            return Ok(None);
        }

        let skip = self.step.saturating_mul(u64::from(self.batch_size));
        debug!(
            "Fetching {} rows {} to {}",
            self.table,
            skip,
            skip.saturating_add(u64::from(self.batch_size))
        );

        let request = ReadTableRequest {
            table: self.table.clone(),
            fields: self.fields.to_vec(),
            options: self.options.clone(),
            skip,
            count: self.batch_size,
            delimiter: DELIMITER,
        };

        let raw_rows = match self.session.read_table(&request).await {
            Ok(rows) => rows,
            Err(source) => {
                self.done = true;
                return Err(GosAuditError::remote_call(
                    functions::READ_TABLE,
                    &self.table,
                    source,
                ));
            }
        };

        if raw_rows.is_empty() {
            self.done = true;
            info!(
                "No more data in {} (fetched {} total rows)",
                self.table, self.fetched
            );
            return Ok(None);
        }

        let batch = match self.parse_rows(&raw_rows) {
            Ok(batch) => batch,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        self.step = self.step.saturating_add(1);
        self.fetched = self.fetched.saturating_add(batch.len() as u64);

        if let Some(max_rows) = self.max_rows
            && self.fetched >= max_rows
        {
            info!("Reached max_rows limit for {}: {}", self.table, max_rows);
            self.done = true;
        }

        if batch.len() < self.batch_size as usize {
            self.done = true;
        }

        Ok(Some(batch))
    }

    fn parse_rows(&self, raw_rows: &[String]) -> Result<Batch> {
        raw_rows
            .iter()
            .map(|raw| {
                let values: Vec<String> = raw
                    .split(DELIMITER)
                    .map(|value| value.trim().to_string())
                    .collect();

                if values.len() != self.fields.len() {
                    return Err(GosAuditError::RowParse {
                        table: self.table.clone(),
                        expected: self.fields.len(),
                        actual: values.len(),
                    });
                }

                Ok(Row::new(Arc::clone(&self.fields), values))
            })
            .collect()
    }

    /// Table this pager reads.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Total rows yielded so far.
    pub fn rows_fetched(&self) -> u64 {
        self.fetched
    }

    /// Returns true once no further batches will be produced.
    pub fn is_exhausted(&self) -> bool {
        self.done
    }
}
