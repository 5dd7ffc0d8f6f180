//! Library module for gosaudit-collect
//!
//! This module exposes the command surface and scan execution for testing
//! purposes. The main binary functionality is in main.rs.

pub mod output;

use clap::{Args, Parser, Subcommand};
use gosaudit_core::{
    ConnectionConfig, Credentials, GosAuditError, RemoteTableClient, Result, RfcConnector,
    ScanOptions, ScanResult, ScanTarget,
    integrity::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ROWS},
    models::group_thousands,
    run_scan,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI argument structure
#[derive(Parser)]
#[command(name = "gosaudit-collect")]
#[command(about = "SAP GOS attachment integrity scan")]
#[command(version)]
#[command(long_about = "
GOS Audit Collector - Read-only SAP GOS integrity scan

Finds physical attachment objects (SOFFPHIO) that are no longer referenced
by any business document (SRGBTBREL) and estimates the storage their
content rows (SOFFCONT1) occupy.

SECURITY FEATURES:
- Read-only function modules only (RFC_READ_TABLE and friends)
- Binary attachment content is never transferred
- Passwords are never logged and are cleared from memory after use

EXAMPLES:
  gosaudit-collect scan --system PRD --host sap.example.com --sysnr 00 --client 100 --user RFC_AUDIT
  gosaudit-collect scan --system QAS --enable-sampling --max-rows 20000 ...
  gosaudit-collect validate-connection --host sap.example.com --client 100 --user RFC_AUDIT
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Run a GOS integrity scan and save the result
    Scan(ScanArgs),
    /// Log on and off without scanning
    ValidateConnection(ConnectionArgs),
    /// List the tables and fields a scan reads
    ListTables,
}

/// Global logging flags
#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// SAP logon parameters.
///
/// Deliberately not `Debug`: the password must never reach a log line.
#[derive(Args)]
pub struct ConnectionArgs {
    /// Application server host
    #[arg(long, env = "SAP_ASHOST")]
    pub host: String,

    /// System number
    #[arg(long, env = "SAP_SYSNR", default_value = "00")]
    pub sysnr: String,

    /// Logon client
    #[arg(long, env = "SAP_CLIENT")]
    pub client: String,

    /// Logon user
    #[arg(short, long, env = "SAP_USER")]
    pub user: String,

    /// Logon password (prompted when omitted)
    #[arg(long, env = "SAP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Logon language
    #[arg(long, default_value = "EN")]
    pub language: String,

    /// Override the JSON RFC gateway URL
    #[arg(
        long,
        help = "Gateway URL (default: https://<host>:443<sysnr>/sap/bc/rfc/json)"
    )]
    pub gateway_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,
}

impl ConnectionArgs {
    /// Builds and validates the connection configuration.
    ///
    /// # Errors
    /// Returns a configuration error for an empty user or host, a malformed
    /// system number or client, or an invalid gateway URL.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        if self.user.trim().is_empty() {
            return Err(GosAuditError::configuration("user cannot be empty"));
        }

        let mut config = ConnectionConfig::new(self.host.trim())
            .with_sysnr(self.sysnr.trim())
            .with_client(self.client.trim())
            .with_language(self.language.trim())
            .with_request_timeout(Duration::from_secs(self.timeout));

        if let Some(url) = &self.gateway_url {
            config = config.with_gateway_url(url)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolves credentials, prompting for the password if none was given.
    ///
    /// # Errors
    /// Returns an error if the prompt fails or the password is empty.
    pub fn credentials(&self) -> Result<Credentials> {
        let password = match &self.password {
            Some(password) => password.clone(),
            None => rpassword::prompt_password(format!("SAP password for {}: ", self.user))
                .map_err(|e| GosAuditError::Io {
                    context: "Failed to read password".to_string(),
                    source: e,
                })?,
        };

        let credentials = Credentials::new(self.user.trim(), password);
        if !credentials.has_password() {
            return Err(GosAuditError::configuration("Password cannot be empty"));
        }
        Ok(credentials)
    }
}

/// Arguments of the `scan` command
#[derive(Args)]
pub struct ScanArgs {
    /// SAP system id (e.g. PRD, QAS)
    #[arg(short, long)]
    pub system: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output directory for the scan result
    #[arg(short, long, default_value = "./reports")]
    pub output: PathBuf,

    /// Rows per RFC_READ_TABLE call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u32,

    /// Row cap per table when sampling
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: u64,

    /// Stop each table read at --max-rows
    #[arg(long)]
    pub enable_sampling: bool,

    /// Compress output using Zstandard (.json.zst)
    #[arg(long)]
    pub compress: bool,
}

impl ScanArgs {
    /// Scan options for the default GOS tables.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.system.trim())
            .with_batch_size(self.batch_size)
            .with_max_rows(self.max_rows)
            .with_sampling(self.enable_sampling)
    }
}

/// Runs a scan through `connector` and saves the result.
///
/// # Errors
/// Returns the first scan failure or any error writing the output file.
pub async fn execute_scan(
    connector: Box<dyn RfcConnector>,
    args: &ScanArgs,
) -> Result<(ScanResult, PathBuf)> {
    let options = args.scan_options();
    options.validate()?;

    let mut client = RemoteTableClient::new(connector);
    let result = run_scan(&mut client, &options).await?;
    let path = output::save_result(&result, &args.output, args.compress).await?;

    Ok((result, path))
}

/// Human-readable scan summary with numbered recommendations.
pub fn format_summary(result: &ScanResult, saved_to: &Path) -> String {
    let mut summary = String::new();
    let _ = writeln!(summary, "Scan completed successfully!");
    let _ = writeln!(summary, "System: {}", result.system_name);
    let _ = writeln!(summary, "Client: {}", result.client);
    let _ = writeln!(
        summary,
        "Total SOFFCONT1 Rows: {}",
        group_thousands(result.total_content_rows)
    );
    let _ = writeln!(
        summary,
        "Orphaned Objects: {}",
        group_thousands(result.orphaned_object_count)
    );
    let _ = writeln!(
        summary,
        "Orphaned Entries: {}",
        group_thousands(result.orphaned_content_count)
    );
    let _ = writeln!(summary, "Integrity Score: {}%", result.integrity_score);
    let _ = writeln!(
        summary,
        "Estimated Storage: {:.2} MB",
        result.estimated_storage_mb
    );
    let _ = writeln!(summary, "Estimated Savings: ${:.2}", result.estimated_cost_usd);
    if result.sampling_enabled {
        let _ = writeln!(summary, "Sampling: enabled (results are partial)");
    }
    let _ = writeln!(summary, "Result saved to: {}", saved_to.display());

    let _ = writeln!(summary);
    let _ = writeln!(summary, "Recommendations:");
    for (index, recommendation) in result.recommendations.iter().enumerate() {
        let _ = writeln!(summary, "  {}. {}", index + 1, recommendation);
    }
    summary
}

/// Lists the audited tables.
pub fn format_audited_tables(target: &ScanTarget) -> String {
    let mut listing = String::from("Tables read by a GOS integrity scan:\n");
    for (table, field, role) in target.audited_tables() {
        let _ = writeln!(listing, "  {:<10} {:<10} {}", table, field, role);
    }
    if let Some(predicate) = &target.relation_predicate {
        let _ = writeln!(
            listing,
            "\nReferences are filtered by: {}",
            predicate
        );
    }
    listing
}
