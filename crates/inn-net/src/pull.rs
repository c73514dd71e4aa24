//! PULL-side listener: accepts many PUSH producer connections and hands
//! their `(header, body)` messages to a single channel, preserving each
//! connection's own order.

use tokio::sync::mpsc;

use crate::error::NetError;
use crate::ipc::{Endpoint, Listener};
use crate::multipart::read_multipart;

pub type PulledMessage = (Vec<u8>, Vec<u8>);

pub struct PullListener {
    listener: Listener,
}

impl PullListener {
    /// Bind `addr` (`tcp://host:port`, `ipc://path`, or a bare `host:port`
    /// treated as `tcp://`).
    pub async fn bind(addr: &str) -> Result<Self, NetError> {
        Ok(PullListener {
            listener: Listener::bind(&Endpoint::parse(addr)).await?,
        })
    }

    /// The bound address: `host:port` for TCP, the socket path for `ipc://`.
    pub fn local_addr(&self) -> std::io::Result<String> {
        self.listener.local_addr()
    }

    /// Accept connections until the listener is closed, forwarding every
    /// received two-part message to `tx`. Per-connection order is preserved
    /// because each connection is drained by its own task into the shared
    /// channel, never interleaved mid-message.
    pub async fn run(self, tx: mpsc::Sender<PulledMessage>) {
        loop {
            let stream = match self.listener.accept().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "pull listener accept failed, stopping");
                    break;
                }
            };
            let tx = tx.clone();
            tokio::spawn(serve_producer(stream, tx));
        }
    }
}

async fn serve_producer(mut stream: crate::ipc::Stream, tx: mpsc::Sender<PulledMessage>) {
    loop {
        let parts = match read_multipart(&mut stream).await {
            Ok(parts) => parts,
            Err(NetError::Closed) => break,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed push message");
                continue;
            }
        };
        if parts.len() != 2 {
            tracing::warn!(count = parts.len(), "expected 2-part push message, dropping");
            continue;
        }
        let mut iter = parts.into_iter();
        let header = iter.next().unwrap();
        let body = iter.next().unwrap();
        if tx.send((header, body)).await.is_err() {
            break;
        }
    }
}
