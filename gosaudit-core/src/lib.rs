//! Core data structures and algorithms for GOS Audit.
//!
//! This crate provides the RFC table client, the orphan detection algorithm
//! and the shared types used by the collector and report binaries.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - All remote operations are read-only
//! - The binary content column (`CLUSTD`) is never requested
//!
//! # Architecture
//! - `rfc`: transport traits, the width-checked table client and pagination
//! - `integrity`: identifier collection, orphan detection and recommendations
//! - `models`: rows, field metadata and the serializable `ScanResult`

pub mod error;
pub mod integrity;
pub mod logging;
pub mod models;
pub mod rfc;
pub mod security;

// Re-export commonly used types
pub use error::{GosAuditError, Result};
pub use integrity::{
    CostModel, OrphanDetector, RecommendationPolicy, ScanOptions, ScanTarget,
    collect_identifiers, run_scan,
};
pub use logging::init_logging;
pub use models::{Batch, DataType, FieldSpec, Row, ScanResult};
pub use rfc::{ConnectionConfig, RemoteTableClient, RfcConnector, RfcError, RfcSession};
pub use security::Credentials;
