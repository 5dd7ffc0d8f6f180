//! Table client enforcing the RFC_READ_TABLE safety rules.

use super::options::wrap_predicate;
use super::pager::BatchPager;
use super::width::total_width;
use super::{MAX_LINE_WIDTH, RfcConnector, RfcError, RfcSession};
use crate::Result;
use crate::error::GosAuditError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Client for paginated, width-checked access to SAP tables.
///
/// The client exclusively owns at most one logon session. `connect` and
/// `disconnect` take `&mut self`, so a session can never be shared between
/// concurrently running scans.
///
/// # Example
/// ```rust
/// use gosaudit_core::rfc::{RemoteTableClient, memory::MemoryConnector};
///
/// # tokio_test_block_on(async {
/// let connector = MemoryConnector::new("100");
/// connector.add_table("SOFFPHIO", &[("PHIO_ID", "CHAR", 32)], vec![vec!["P1"], vec!["P2"]]);
///
/// let mut client = RemoteTableClient::new(Box::new(connector.clone()));
/// client.connect().await?;
///
/// let mut pager = client.fetch_batches("SOFFPHIO", &["PHIO_ID"], None, 5000, None).await?;
/// while let Some(batch) = pager.next_batch().await? {
///     assert_eq!(batch.len(), 2);
/// }
///
/// client.disconnect().await;
/// # Ok::<(), gosaudit_core::GosAuditError>(())
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct RemoteTableClient {
    connector: Box<dyn RfcConnector>,
    session: Option<Box<dyn RfcSession>>,
}

impl std::fmt::Debug for RemoteTableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTableClient")
            .field("target", &self.connector.describe())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RemoteTableClient {
    /// Creates a disconnected client for `connector`.
    pub fn new(connector: Box<dyn RfcConnector>) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// Logon client of the target system.
    pub fn logon_client(&self) -> &str {
        self.connector.logon_client()
    }

    /// Returns true while a session is open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Opens the logon session. Reuses an already open session.
    ///
    /// # Errors
    /// Returns [`GosAuditError::Connection`] on rejected credentials or an
    /// unreachable host. There is no automatic retry.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        match self.connector.open().await {
            Ok(session) => {
                info!(
                    "Connected to SAP: {} (Client {})",
                    self.connector.describe(),
                    self.connector.logon_client()
                );
                self.session = Some(session);
                Ok(())
            }
            Err(source @ RfcError::Logon(_)) => {
                tracing::error!("SAP logon failed: {}", source);
                Err(GosAuditError::connection_failed(
                    "Invalid credentials or locked user account",
                    source,
                ))
            }
            Err(source @ RfcError::Communication(_)) => {
                tracing::error!("SAP communication error: {}", source);
                Err(GosAuditError::connection_failed(
                    "Cannot reach SAP server. Check VPN and network.",
                    source,
                ))
            }
            Err(source) => {
                tracing::error!("SAP connection error: {}", source);
                Err(GosAuditError::connection_failed(
                    "Logon was not completed",
                    source,
                ))
            }
        }
    }

    /// Closes the session. Does nothing when no session is open.
    ///
    /// Logoff failures are logged; the session is released either way.
    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Error while closing SAP session: {}", e);
            }
            info!("SAP connection closed");
        }
    }

    fn session(&self) -> Result<&dyn RfcSession> {
        self.session.as_deref().ok_or(GosAuditError::NotConnected)
    }

    /// Sums the output widths of `fields` and checks the 512-byte limit.
    ///
    /// If the dictionary lookup fails, the check is skipped with a warning
    /// and a width of 0 is returned. Only an explicit overflow is an error.
    ///
    /// # Errors
    /// Returns [`GosAuditError::TableWidthExceeded`] if the fields total more
    /// than [`MAX_LINE_WIDTH`] bytes, or [`GosAuditError::NotConnected`].
    pub async fn validate_field_width<S: AsRef<str>>(
        &self,
        table: &str,
        fields: &[S],
    ) -> Result<usize> {
        let session = self.session()?;
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();

        let specs = match session.field_info(table).await {
            Ok(specs) => specs,
            Err(source) => {
                let soft = GosAuditError::MetadataUnavailable {
                    table: table.to_string(),
                    source: source.clone(),
                };
                warn!(
                    "Could not validate field width: {} ({}). Proceeding with caution.",
                    soft, source
                );
                return Ok(0);
            }
        };

        let width = total_width(table, &fields, &specs);
        debug!("Calculated width for {}: {} bytes", table, width);

        if width > MAX_LINE_WIDTH {
            return Err(GosAuditError::TableWidthExceeded {
                table: table.to_string(),
                width,
                limit: MAX_LINE_WIDTH,
            });
        }

        Ok(width)
    }

    /// Starts a paginated read of `fields` from `table`.
    ///
    /// The field width is validated before the pager is returned, so no
    /// data request is ever issued for an oversized field list.
    ///
    /// # Arguments
    /// * `table` - Table name (e.g. `SOFFPHIO`)
    /// * `fields` - Field names to read, in output order
    /// * `predicate` - WHERE clause without the `WHERE` keyword
    /// * `batch_size` - Rows per RFC_READ_TABLE call
    /// * `max_rows` - Stop once this many rows were yielded (`None` = unlimited)
    ///
    /// # Errors
    /// Returns a configuration error for an empty field list or a zero batch
    /// size, and propagates width validation failures.
    pub async fn fetch_batches<S: AsRef<str>>(
        &self,
        table: &str,
        fields: &[S],
        predicate: Option<&str>,
        batch_size: u32,
        max_rows: Option<u64>,
    ) -> Result<BatchPager<'_>> {
        if batch_size == 0 {
            return Err(GosAuditError::configuration(
                "batch_size must be greater than 0",
            ));
        }
        if fields.is_empty() {
            return Err(GosAuditError::configuration(format!(
                "No fields requested from {}",
                table
            )));
        }

        let session = self.session()?;
        self.validate_field_width(table, fields).await?;

        let fields: Arc<[String]> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        let options = predicate
            .filter(|p| !p.trim().is_empty())
            .map(wrap_predicate)
            .unwrap_or_default();

        debug!(
            "Reading {} fields {:?} with {} option lines",
            table,
            fields,
            options.len()
        );

        Ok(BatchPager::new(
            session, table, fields, options, batch_size, max_rows,
        ))
    }

    /// Returns the table statistics row count.
    ///
    /// This is a soft probe for reporting: any failure is logged and
    /// reported as 0.
    pub async fn row_count(&self, table: &str) -> u64 {
        let session = match self.session() {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not get row count for {}: {}", table, e);
                return 0;
            }
        };

        match session.row_count(table).await {
            Ok(count) => {
                info!("{} has {} rows", table, count);
                count
            }
            Err(source) => {
                let soft = GosAuditError::RowCountUnavailable {
                    table: table.to_string(),
                    source: source.clone(),
                };
                warn!("{}: {}", soft, source);
                0
            }
        }
    }

    /// Counts the rows of `table` matching `predicate` by draining a
    /// single-field read.
    ///
    /// # Errors
    /// Propagates any read or parse failure.
    pub async fn count_rows(
        &self,
        table: &str,
        field: &str,
        predicate: &str,
        batch_size: u32,
    ) -> Result<u64> {
        let mut pager = self
            .fetch_batches(table, &[field], Some(predicate), batch_size, None)
            .await?;

        let mut count: u64 = 0;
        while let Some(batch) = pager.next_batch().await? {
            count = count.saturating_add(batch.len() as u64);
        }
        Ok(count)
    }
}
