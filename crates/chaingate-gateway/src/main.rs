//! ChainGate Gateway
//!
//! HTTP gateway that authorizes every request against an on-chain permission
//! registry before proxying it to the protected backend.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use chaingate_core::config::load_config;
use chaingate_core::tracing_init::init_tracing;
use chaingate_core::{AccessPolicy, GatewayConfig};
use chaingate_gateway::{AccessDecider, RegistryClient, Upstream, build_router};

#[derive(Parser, Debug)]
#[command(name = "chaingate-gateway")]
#[command(
    version,
    about = "ChainGate gateway - on-chain permission gate for a protected backend"
)]
struct Args {
    /// JSON config file.
    #[arg(long, env = "CHAINGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Base URL of the protected backend.
    #[arg(long)]
    upstream: Option<String>,

    /// JSON-RPC endpoint of the chain node.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Permission registry contract address.
    #[arg(long)]
    contract: Option<String>,

    /// Registry function deciding access: `identity` or `path_scoped`.
    #[arg(long)]
    policy: Option<AccessPolicy>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "CHAINGATE_LOG_JSON")]
    log_json: bool,
}

impl Args {
    /// CLI arguments take precedence over file and environment.
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(addr) = self.addr {
            config.listen_addr = addr;
        }
        if let Some(upstream) = self.upstream {
            config.upstream_url = upstream;
        }
        if let Some(rpc_url) = self.rpc_url {
            config.registry.rpc_url = rpc_url;
        }
        if let Some(contract) = self.contract {
            config.registry.contract_address = contract;
        }
        if let Some(policy) = self.policy {
            config.registry.policy = policy;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(
        "chaingate_gateway=info,chaingate_core=info,tower_http=info",
        args.log_json,
    );

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        upstream = %config.upstream_url,
        rpc_url = %config.registry.rpc_url,
        contract = %config.registry.contract_address,
        policy = %config.registry.policy,
        "Starting chaingate-gateway"
    );

    // One registry session for the whole process.
    let registry: Arc<dyn AccessDecider> = Arc::new(RegistryClient::new(&config.registry)?);
    let upstream = Upstream::new(&config.upstream_url)?;
    let app = build_router(registry, upstream);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
