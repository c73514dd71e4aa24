//! Drop-in substitute for a stdin-to-file logger: reads lines from stdin and
//! pushes each one under a fixed `--log-path`.

use clap::Parser;
use pusher::LogLinePusher;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Push stdin lines onto the configured PULL endpoints")]
struct Args {
    #[arg(short = 'l', long = "log-path")]
    log_path: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut pusher = match LogLinePusher::from_env().await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "failed to start pusher");
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown = Box::pin(tokio::signal::ctrl_c());
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let Err(e) = pusher.push(&args.log_path, line.as_bytes()).await {
                            tracing::warn!(error = %e, "failed to push line");
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "error reading stdin");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("received shutdown signal");
                break;
            }
        }
    }

    pusher.shutdown().await;
}
