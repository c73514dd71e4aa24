pub mod config;
pub mod error;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

pub use config::{load_config, GlobalConfig, NodeConfig, ProgramSpec, SupervisorConfig};
pub use error::SupervisorError;

const STDERR_TAIL_LINES: usize = 50;
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A running child process plus enough bookkeeping to report on it and stop
/// it cleanly.
pub struct ChildDescriptor {
    pub node_name: Option<String>,
    pub program_name: String,
    handle: Child,
    active: bool,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
}

impl ChildDescriptor {
    fn spawn(spec: &ProgramSpec, node_name: Option<String>) -> Result<Self, SupervisorError> {
        let mut handle = Command::new(&spec.program)
            .args(&spec.args)
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr_tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        if let Some(stderr) = handle.stderr.take() {
            let tail = stderr_tail.clone();
            let program_name = spec.program.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(program = %program_name, "{}", line);
                    let mut tail = tail.lock().unwrap();
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            });
        }

        Ok(ChildDescriptor {
            node_name,
            program_name: spec.program.clone(),
            handle,
            active: true,
            stderr_tail,
        })
    }

    fn pid(&self) -> Option<i32> {
        self.handle.id().map(|id| id as i32)
    }

    fn tail(&self) -> Vec<String> {
        self.stderr_tail.lock().unwrap().iter().cloned().collect()
    }
}

/// Runs and supervises one pipeline's worth of child processes: the
/// global stream writer and aggregator, plus a forwarder (and optional file
/// logger) per configured node, and an optional data-source child.
pub struct Supervisor {
    children: Vec<ChildDescriptor>,
}

impl Supervisor {
    /// Starts every configured child, downstream consumers first: the
    /// stream writer, then each node's file logger, then the aggregator,
    /// then each node's forwarder, then the data source last.
    pub async fn start(config: &SupervisorConfig) -> Result<Self, SupervisorError> {
        let mut children = Vec::new();

        children.push(ChildDescriptor::spawn(&config.global.stream_writer, None)?);
        for (node_name, node) in &config.nodes {
            if let Some(file_logger) = &node.file_logger {
                children.push(ChildDescriptor::spawn(file_logger, Some(node_name.clone()))?);
            }
        }
        children.push(ChildDescriptor::spawn(&config.global.aggregator, None)?);
        for (node_name, node) in &config.nodes {
            children.push(ChildDescriptor::spawn(&node.forwarder, Some(node_name.clone()))?);
        }
        if let Some(data_source) = &config.global.data_source {
            children.push(ChildDescriptor::spawn(data_source, None)?);
        }

        Ok(Supervisor { children })
    }

    /// Polls every child every five seconds until the duration expires, the
    /// shutdown flag is set, ctrl-c is received, or the data-source child
    /// (if any) exits. Returns each child's exit status once every active
    /// child has been asked to stop.
    pub async fn run(mut self, shutdown: Arc<AtomicBool>, duration: Option<Duration>) -> Vec<(String, Option<i32>)> {
        let deadline = duration.map(|d| tokio::time::Instant::now() + d);
        let mut poll = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    if self.poll_children() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("received interrupt, shutting down");
                    break;
                }
                _ = wait_for_deadline(deadline) => {
                    tracing::info!("configured duration expired, shutting down");
                    break;
                }
            }
            if shutdown.load(Ordering::SeqCst) {
                tracing::info!("shutdown flag set, shutting down");
                break;
            }
        }

        self.stop_all().await
    }

    /// Returns `true` once any child has exited, including, notably, the
    /// data-source child, which ends the pipeline since there is nothing
    /// left upstream to feed it.
    fn poll_children(&mut self) -> bool {
        let mut any_exited = false;
        for child in &mut self.children {
            if !child.active {
                continue;
            }
            match child.handle.try_wait() {
                Ok(Some(status)) => {
                    child.active = false;
                    if status.success() {
                        tracing::warn!(program = %child.program_name, node = ?child.node_name, "child exited");
                    } else {
                        tracing::error!(
                            program = %child.program_name,
                            node = ?child.node_name,
                            status = ?status.code(),
                            stderr_tail = ?child.tail(),
                            "child exited with failure"
                        );
                    }
                    any_exited = true;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(program = %child.program_name, error = %e, "failed to poll child status");
                }
            }
        }
        any_exited
    }

    async fn stop_all(mut self) -> Vec<(String, Option<i32>)> {
        for child in &mut self.children {
            if !child.active {
                continue;
            }
            if let Some(pid) = child.pid() {
                if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
                    tracing::warn!(program = %child.program_name, error = %e, "failed to signal child");
                }
            }
        }

        let mut results = Vec::with_capacity(self.children.len());
        for mut child in self.children {
            let status = child.handle.wait().await.ok().and_then(|s| s.code());
            results.push((child.program_name, status));
        }
        results
    }
}

async fn wait_for_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
