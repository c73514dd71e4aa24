use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use inn_wire::LogHeader;
use regex::Regex;
use retriever::{enumerate_buckets, process_bucket, HttpRemoteStore};

/// Retrieve, deduplicate, and filter archived logs from a remote store over
/// a timestamp range.
#[derive(Parser)]
#[command(name = "log_archive_search_and_retrieve")]
struct Args {
    /// base URL of the archive store's list/get HTTP API
    #[arg(long)]
    base_url: String,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, default_value_t = false)]
    add_hostname_to_path: bool,

    #[arg(long)]
    host_regexp: Option<String>,

    #[arg(long)]
    node_regexp: Option<String>,

    #[arg(long)]
    log_filename_regexp: Option<String>,

    #[arg(long)]
    content_regexp: Option<String>,

    /// prefix of the archived key name, in the form `<prefix>YYYYMMDDHHMMSS<suffix>`
    #[arg(long, default_value = "logs.")]
    archive_name_prefix: String,

    #[arg(long, default_value = "")]
    archive_name_suffix: String,

    /// YYYYMMDDHHMMSS, inclusive
    #[arg(long)]
    start: String,

    /// YYYYMMDDHHMMSS, inclusive
    #[arg(long)]
    stop: String,
}

fn compile(pattern: &str, flag: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        eprintln!("invalid regexp for {flag}: {e}");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let host_re = args.host_regexp.as_deref().map(|p| compile(p, "--host-regexp"));
    let node_re = args.node_regexp.as_deref().map(|p| compile(p, "--node-regexp"));
    let log_path_re = args.log_filename_regexp.as_deref().map(|p| compile(p, "--log-filename-regexp"));
    let content_re = args.content_regexp.as_deref().map(|p| compile(p, "--content-regexp"));

    let header_filter = move |header: &LogHeader| -> bool {
        if let Some(re) = &host_re {
            if !re.is_match(&header.hostname) {
                return false;
            }
        }
        if let Some(re) = &node_re {
            match &header.nodename {
                Some(n) if re.is_match(n) => {}
                _ => return false,
            }
        }
        if let Some(re) = &log_path_re {
            if !re.is_match(&header.log_path) {
                return false;
            }
        }
        true
    };

    let store = HttpRemoteStore::new(args.base_url);
    let buckets = match enumerate_buckets(
        &store,
        &args.archive_name_prefix,
        &args.archive_name_suffix,
        &args.start,
        &args.stop,
    )
    .await
    {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to enumerate archive keys");
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&args.output).expect("output directory must be writable");
    let work_dir = args.output.join(".retriever-work");

    for (bucket_ts, keys) in buckets {
        tracing::info!(bucket = %bucket_ts, archives = keys.len(), "processing bucket");
        let records = match process_bucket(&store, &keys, &work_dir, &header_filter, content_re.as_ref()).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(bucket = %bucket_ts, error = %e, "skipping bucket");
                continue;
            }
        };
        for record in records {
            if let Err(e) = write_record(&args.output, &record.header, &record.body, args.add_hostname_to_path) {
                tracing::warn!(error = %e, "failed to write retrieved record");
            }
        }
    }

    std::fs::remove_dir_all(&work_dir).ok();
}

fn write_record(output_dir: &Path, header: &LogHeader, body: &[u8], add_hostname_to_path: bool) -> std::io::Result<()> {
    let basename = Path::new(&header.log_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown.log".to_owned());
    let filename = if add_hostname_to_path {
        format!("{}_{}", header.hostname, basename)
    } else {
        basename
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join(filename))?;
    file.write_all(body)?;
    Ok(())
}
