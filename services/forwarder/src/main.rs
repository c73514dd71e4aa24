use std::path::PathBuf;

use clap::Parser;
use forwarder::config::load_config_from_path;
use forwarder::Forwarder;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Accepts pushed log events and republishes them under one topic")]
struct Args {
    #[arg(long, default_value = "/etc/old-log-inn/forwarder.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match load_config_from_path(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let forwarder = match Forwarder::bind(&config).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind sockets");
            std::process::exit(1);
        }
    };

    tracing::info!(
        pull = ?forwarder.pull_local_addr(),
        publish = ?forwarder.pub_local_addr(),
        topic = %config.topic,
        "forwarder listening"
    );

    forwarder.run().await;
}
