use std::path::PathBuf;

use clap::Parser;
use file_logger::{FileLogger, FileLoggerConfig, HeaderFilters};
use inn_net::SubClient;
use regex::Regex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Writes a filtered subset of the published stream to local rotating log files")]
struct Args {
    #[arg(long = "sub")]
    sub_endpoint: String,
    #[arg(long = "output")]
    output_dir: PathBuf,
    #[arg(long = "host-regexp")]
    host_regexp: Option<String>,
    #[arg(long = "node-regexp")]
    node_regexp: Option<String>,
    #[arg(long = "log-path-regexp")]
    log_path_regexp: Option<String>,
    #[arg(long = "content-regexp")]
    content_regexp: Option<String>,
    #[arg(long = "add-hostname-to-path", default_value_t = false)]
    add_hostname_to_path: bool,
    #[arg(long = "logfile-max-size", default_value_t = 1024 * 1024)]
    logfile_max_size: u64,
    #[arg(long = "logfile-keep", default_value_t = 0)]
    logfile_keep: u32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let compile = |pat: &Option<String>| -> Option<Regex> {
        pat.as_ref().map(|p| {
            Regex::new(p).unwrap_or_else(|e| {
                tracing::error!(pattern = %p, error = %e, "invalid regular expression");
                std::process::exit(1);
            })
        })
    };

    let config = FileLoggerConfig {
        sub_endpoint: args.sub_endpoint.clone(),
        output_dir: args.output_dir,
        add_hostname_to_path: args.add_hostname_to_path,
        max_bytes: args.logfile_max_size,
        backup_count: args.logfile_keep,
        header_filters: HeaderFilters {
            hostname: compile(&args.host_regexp),
            nodename: compile(&args.node_regexp),
            log_path: compile(&args.log_path_regexp),
        },
        body_filter: compile(&args.content_regexp),
    };
    let mut logger = FileLogger::new(config);

    let mut sub = match SubClient::connect(&args.sub_endpoint).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to subscribe");
            std::process::exit(1);
        }
    };

    loop {
        let (_topic, header, body) = match sub.recv().await {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "publisher connection lost, shutting down");
                break;
            }
        };
        if let Err(e) = logger.handle_message(&header, &body) {
            tracing::warn!(error = %e, "dropping malformed message");
        }
    }
}
