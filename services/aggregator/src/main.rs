use std::path::PathBuf;

use aggregator::{load_endpoints, Aggregator};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Subscribes to many PUB endpoints and republishes onto one")]
struct Args {
    /// Path to a newline-separated list of upstream PUB endpoints.
    #[arg(long)]
    upstreams: PathBuf,
    #[arg(long, default_value = "0.0.0.0:0")]
    pub_bind: String,
    #[arg(long, default_value_t = 20_000)]
    hwm: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let upstreams = match load_endpoints(&args.upstreams) {
        Ok(list) if !list.is_empty() => list,
        Ok(_) => {
            tracing::error!(path = ?args.upstreams, "upstream list is empty");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to read upstream list");
            std::process::exit(1);
        }
    };

    let aggregator = match Aggregator::bind(&args.pub_bind, args.hwm).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind pub endpoint");
            std::process::exit(1);
        }
    };
    tracing::info!(
        publish = ?aggregator.pub_local_addr(),
        upstream_count = upstreams.len(),
        "aggregator listening"
    );

    aggregator.run(upstreams).await;
}
