//! The producer-side pusher: assembles a header for every log line and
//! pushes it, two-frame, to every configured PULL endpoint.

mod error;

pub use error::PusherError;

use inn_net::PushSocket;
use inn_wire::LogHeader;

/// Name of the environment variable carrying a whitespace-separated list of
/// `host:port` PULL endpoints. The name is preserved from the pipeline this
/// replaces for operational compatibility with existing deployment scripts.
pub const ENDPOINTS_ENV_VAR: &str = "PYTHON_ZMQ_LOG_HANDLER";
/// Optional node name, read once at construction.
pub const NODE_NAME_ENV_VAR: &str = "ZMQ_LOG_NODE_NAME";
/// Optional hostname override; falls back to the OS hostname when unset.
pub const HOSTNAME_ENV_VAR: &str = "HOSTNAME";

pub struct LogLinePusher {
    hostname: String,
    nodename: Option<String>,
    pid: u32,
    uuid: String,
    sequence: u64,
    socket: PushSocket,
}

impl LogLinePusher {
    /// Build a pusher from the environment: `PYTHON_ZMQ_LOG_HANDLER` must
    /// list one or more `host:port` endpoints separated by whitespace.
    pub async fn from_env() -> Result<Self, PusherError> {
        let endpoints_raw = std::env::var(ENDPOINTS_ENV_VAR).map_err(|_| {
            PusherError::Config(format!("{ENDPOINTS_ENV_VAR} is not set"))
        })?;
        let endpoints: Vec<String> = endpoints_raw.split_whitespace().map(str::to_owned).collect();
        if endpoints.is_empty() {
            return Err(PusherError::Config(format!(
                "{ENDPOINTS_ENV_VAR} is set but names no endpoints"
            )));
        }

        let hostname = std::env::var(HOSTNAME_ENV_VAR).ok().unwrap_or_else(|| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_owned())
        });
        let nodename = std::env::var(NODE_NAME_ENV_VAR).ok();

        let socket = PushSocket::connect(&endpoints).await?;

        Ok(LogLinePusher {
            hostname,
            nodename,
            pid: std::process::id(),
            uuid: uuid::Uuid::new_v4().simple().to_string(),
            sequence: 0,
            socket,
        })
    }

    /// Send one log line under `log_path`. The sequence number is
    /// incremented for every call, including ones that fail to send.
    pub async fn push(&mut self, log_path: &str, body: &[u8]) -> Result<(), PusherError> {
        self.sequence += 1;
        let header = LogHeader {
            hostname: self.hostname.clone(),
            uuid: self.uuid.clone(),
            sequence: self.sequence,
            pid: self.pid,
            timestamp: now_secs(),
            log_path: log_path.to_owned(),
            nodename: self.nodename.clone(),
        };
        let compressed_header = inn_wire::encode_header(&header)?;
        let compressed_body = inn_wire::encode_body(body)?;
        for (endpoint, result) in self
            .socket
            .endpoints()
            .to_vec()
            .iter()
            .zip(self.socket.send_all(&compressed_header, &compressed_body).await)
        {
            if let Err(e) = result {
                tracing::warn!(endpoint = %endpoint, error = %e, "failed to push log line");
            }
        }
        Ok(())
    }

    /// Close the underlying connections, waiting up to the default linger
    /// for any final writes to drain.
    pub async fn shutdown(self) {
        self.socket.close(inn_net::DEFAULT_LINGER).await;
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_secs_f64()
}
