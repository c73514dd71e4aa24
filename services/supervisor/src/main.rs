use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use supervisor::{load_config, Supervisor};

#[derive(Parser)]
struct Args {
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load supervisor config");
            std::process::exit(1);
        }
    };

    let duration = config.global.duration_secs.map(Duration::from_secs);

    let supervisor = match Supervisor::start(&config).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to start pipeline");
            std::process::exit(1);
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let results = supervisor.run(shutdown, duration).await;

    let mut exit_code = 0;
    for (program, status) in results {
        match status {
            Some(0) => tracing::info!(program = %program, "clean exit"),
            Some(code) => {
                tracing::warn!(program = %program, code, "non-zero exit");
                exit_code = 1;
            }
            None => {
                tracing::warn!(program = %program, "terminated by signal");
                exit_code = 1;
            }
        }
    }
    std::process::exit(exit_code);
}
