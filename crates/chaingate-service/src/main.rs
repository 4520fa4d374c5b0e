use std::net::SocketAddr;

use clap::Parser;
use tracing::info;

use chaingate_core::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "chaingate-service", version, about = "ChainGate protected backend")]
struct Args {
    /// Listen address
    #[arg(long, default_value = "0.0.0.0:8081", env = "LISTEN_ADDR")]
    addr: SocketAddr,

    /// Output logs as JSON
    #[arg(long, env = "CHAINGATE_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("chaingate_service=info,tower_http=info", args.log_json);

    info!(addr = %args.addr, "starting chaingate-service");

    let app = chaingate_service::routes::build_router();
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
