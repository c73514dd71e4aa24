use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use stream_writer::{load_config_from_path, LogStreamWriter, SystemClock};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Subscribes to a published log stream and writes rotating compressed archives")]
struct Args {
    #[arg(long, default_value = "/etc/old-log-inn/stream-writer.toml")]
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

    let mut sub = match inn_net::SubClient::connect(&config.sub_endpoint).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to publisher");
            std::process::exit(1);
        }
    };

    let mut writer = LogStreamWriter::new(config.writer, Arc::new(SystemClock));
    let mut ticker = tokio::time::interval(Duration::from_secs(config.rollover_check_interval_secs));

    loop {
        tokio::select! {
            msg = sub.recv() => {
                match msg {
                    Ok((_topic, header, body)) => {
                        if let Err(e) = writer.write_compressed(&header, &body) {
                            tracing::error!(error = %e, "failed to write record");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "publisher connection lost, shutting down");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = writer.check_for_rollover() {
                    tracing::error!(error = %e, "failed to roll over archive");
                }
            }
        }
    }
}
