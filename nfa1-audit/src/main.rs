//! `nfa1-audit` entry point.

use alloy_primitives::Address;
use clap::Parser;
use nfa1_audit::{AuditConfig, OffchainAuditor};
use nfa1_rpc::RpcClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Audit a deployed contract for NFA-1 compliance and print a JSON report.
#[derive(Debug, Parser)]
#[command(name = "nfa1-audit", version)]
struct Cli {
    /// Address of the contract to audit
    address: Address,

    /// TOML configuration file (falls back to NFA1_AUDIT_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint, overriding the configuration file
    #[arg(long, value_name = "URL", env = "NFA1_RPC_URL")]
    rpc_url: Option<String>,

    /// Only run the single-signal quick check
    #[arg(long)]
    quick: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = AuditConfig::load(cli.config.as_deref(), cli.rpc_url)?;
    let client = RpcClient::with_timeout(config.rpc_url.clone(), config.request_timeout())?;
    tracing::info!(endpoint = %client.endpoint(), target = %cli.address, "Starting audit");

    let auditor = OffchainAuditor::new(client, config.verifier_config(), config.log_window_blocks)?;
    let document = if cli.quick {
        serde_json::to_string_pretty(&auditor.quick(cli.address).await?)?
    } else {
        serde_json::to_string_pretty(&auditor.run(cli.address).await?)?
    };
    println!("{}", document);
    Ok(())
}
