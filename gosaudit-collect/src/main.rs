//! SAP GOS integrity scan tool.
//!
//! This binary logs on to an SAP system, reads the GOS relation, object and
//! content tables through RFC_READ_TABLE, and saves a scan result that the
//! `gosaudit` report tool renders.
//!
//! # Security Guarantees
//! - Read-only function module calls only
//! - No credentials stored or logged
//! - Attachment content is never transferred

use anyhow::Context;
use clap::Parser;
use gosaudit_collect::{
    Cli, Command, ConnectionArgs, ScanArgs, execute_scan, format_audited_tables, format_summary,
};
use gosaudit_core::{RemoteTableClient, ScanTarget, init_logging, rfc::create_connector};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Command::Scan(args) => scan(args).await,
        Command::ValidateConnection(args) => validate_connection(args).await,
        Command::ListTables => {
            print!("{}", format_audited_tables(&ScanTarget::default()));
            Ok(())
        }
    }
}

/// Runs the integrity scan and prints the summary
async fn scan(args: &ScanArgs) -> anyhow::Result<()> {
    let config = args.connection.connection_config()?;
    let credentials = args.connection.credentials()?;
    let connector = create_connector(&config, credentials)?;

    info!("Starting GOS integrity scan for system: {}", args.system);
    info!("Target: {}", config);

    let (result, path) = execute_scan(connector, args).await.map_err(|e| {
        error!("Error during scan: {}", e);
        e
    })?;

    println!();
    print!("{}", format_summary(&result, &path));
    Ok(())
}

/// Logs on and off without reading any table
async fn validate_connection(args: &ConnectionArgs) -> anyhow::Result<()> {
    let config = args.connection_config()?;
    let credentials = args.credentials()?;
    let connector = create_connector(&config, credentials)?;

    info!("Validating SAP connection to {}", config);

    let mut client = RemoteTableClient::new(connector);
    client
        .connect()
        .await
        .map_err(|e| {
            error!("Connection test failed: {}", e);
            e
        })
        .context("Connection failed")?;
    client.disconnect().await;

    println!("✓ Connection to {} successful", config);
    Ok(())
}
