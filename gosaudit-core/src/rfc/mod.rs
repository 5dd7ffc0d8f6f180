//! Remote function call access to SAP tables.
//!
//! This module defines the transport seam between the table client and the
//! wire. A transport implements two object-safe traits:
//! - [`RfcConnector`] opens a logon session
//! - [`RfcSession`] issues the read-only function module calls
//!
//! [`RemoteTableClient`] sits on top of a connector and adds the
//! `RFC_READ_TABLE` safety rules: field width validation against the
//! 512-byte row limit, 72-byte option line wrapping and pagination.
//!
//! # Module Structure
//! - `config`: Connection settings (`ConnectionConfig`)
//! - `width`: Dictionary type width rules
//! - `options`: Predicate line wrapping and literal quoting
//! - `pager`: Lazy batch pagination (`BatchPager`)
//! - `client`: The table client itself
//! - `http`: JSON RFC gateway transport (feature `http`)
//! - `memory`: In-memory transport that records every call

use crate::models::FieldSpec;
use async_trait::async_trait;
use thiserror::Error;

mod client;
mod config;
pub mod memory;
pub mod options;
mod pager;
pub mod width;

#[cfg(feature = "http")]
pub mod http;

pub use client::RemoteTableClient;
pub use config::ConnectionConfig;
pub use options::{quote_literal, wrap_predicate};
pub use pager::BatchPager;
pub use width::{field_width, total_width};

/// RFC_READ_TABLE output line limit in bytes.
pub const MAX_LINE_WIDTH: usize = 512;

/// RFC_READ_TABLE `OPTIONS` line limit in bytes.
pub const MAX_OPTION_LENGTH: usize = 72;

/// Column delimiter requested from RFC_READ_TABLE.
pub const DELIMITER: char = '|';

/// Function module names used by the client.
pub mod functions {
    /// Paginated table read
    pub const READ_TABLE: &str = "RFC_READ_TABLE";
    /// Dictionary field metadata
    pub const FIELD_INFO: &str = "DDIF_FIELDINFO_GET";
    /// Fast row count from table statistics
    pub const ROW_COUNT: &str = "EM_GET_NUMBER_OF_ENTRIES";
    /// Logon probe
    pub const PING: &str = "RFC_PING";
}

/// Failures reported by an RFC transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RfcError {
    /// Credentials rejected or user locked
    #[error("logon failed: {0}")]
    Logon(String),

    /// Host unreachable, connection dropped or timed out
    #[error("communication failure: {0}")]
    Communication(String),

    /// Function module raised an exception
    #[error("{key}: {message}")]
    Abap { key: String, message: String },

    /// Response could not be understood
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// One `RFC_READ_TABLE` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTableRequest {
    pub table: String,
    pub fields: Vec<String>,
    /// Predicate lines, each at most [`MAX_OPTION_LENGTH`] bytes
    pub options: Vec<String>,
    pub skip: u64,
    pub count: u32,
    pub delimiter: char,
}

/// Opens logon sessions against one SAP system.
///
/// # Object Safety
/// This trait is object-safe so the client can hold a
/// `Box<dyn RfcConnector>` regardless of the transport.
#[async_trait]
pub trait RfcConnector: Send + Sync {
    /// Logs on and returns an exclusively owned session.
    ///
    /// # Errors
    /// Returns [`RfcError::Logon`] for rejected credentials and
    /// [`RfcError::Communication`] when the host cannot be reached.
    /// Implementations must not retry.
    async fn open(&self) -> Result<Box<dyn RfcSession>, RfcError>;

    /// Describes the target for logs (never includes credentials).
    fn describe(&self) -> String;

    /// Logon client the sessions are opened in.
    fn logon_client(&self) -> &str;
}

/// An open logon session. All calls are read-only.
#[async_trait]
pub trait RfcSession: Send + Sync {
    /// Reads one page of a table. Each returned string is one
    /// delimiter-joined row.
    async fn read_table(&self, request: &ReadTableRequest) -> Result<Vec<String>, RfcError>;

    /// Returns dictionary metadata for every field of `table`.
    async fn field_info(&self, table: &str) -> Result<Vec<FieldSpec>, RfcError>;

    /// Returns the row count recorded in table statistics.
    async fn row_count(&self, table: &str) -> Result<u64, RfcError>;

    /// Logs off. Called exactly once by the client.
    async fn close(&mut self) -> Result<(), RfcError>;
}

/// Creates the transport for a connection configuration.
///
/// # Errors
/// Returns a configuration error if the gateway URL scheme is not supported
/// or the required transport feature is not compiled in.
pub fn create_connector(
    config: &ConnectionConfig,
    credentials: crate::security::Credentials,
) -> crate::Result<Box<dyn RfcConnector>> {
    config.validate()?;
    let url = config.gateway_url()?;

    match url.scheme() {
        #[cfg(feature = "http")]
        "http" | "https" => Ok(Box::new(http::HttpConnector::new(
            config.clone(),
            credentials,
        )?)),
        #[cfg(not(feature = "http"))]
        "http" | "https" => {
            drop(credentials);
            Err(crate::error::GosAuditError::configuration(
                "HTTP gateway support not compiled in. Use --features http",
            ))
        }
        other => {
            drop(credentials);
            Err(crate::error::GosAuditError::configuration(format!(
                "Unsupported gateway scheme '{}'",
                other
            )))
        }
    }
}
