//! PUSH-side socket: connects to one or more PULL endpoints and sends
//! two-part `(header, body)` messages to every one of them.

use std::time::Duration;

use tokio::time::timeout;

use crate::error::NetError;
use crate::ipc::{Endpoint, Stream};
use crate::multipart::write_multipart;

/// Default time to wait for a final write to drain on shutdown, mirroring
/// the original pipeline's socket linger.
pub const DEFAULT_LINGER: Duration = Duration::from_secs(5);

pub struct PushSocket {
    endpoints: Vec<String>,
    streams: Vec<Stream>,
}

impl PushSocket {
    /// Dial every endpoint in `endpoints` (each `tcp://host:port` or
    /// `ipc://path`; a bare `host:port` is treated as `tcp://`). A
    /// connection failure for any one endpoint fails the whole call;
    /// callers that want best-effort fan-out should retry per endpoint
    /// themselves.
    pub async fn connect(endpoints: &[String]) -> Result<Self, NetError> {
        let mut streams = Vec::with_capacity(endpoints.len());
        for ep in endpoints {
            streams.push(Stream::connect(&Endpoint::parse(ep)).await?);
        }
        Ok(PushSocket {
            endpoints: endpoints.to_vec(),
            streams,
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Send `(header, body)` to every connected endpoint. Each send is one
    /// atomic multipart write; a failure on one endpoint does not stop the
    /// others but is reported via the returned vector.
    pub async fn send_all(&mut self, header: &[u8], body: &[u8]) -> Vec<Result<(), NetError>> {
        let mut results = Vec::with_capacity(self.streams.len());
        for stream in &mut self.streams {
            results.push(write_multipart(stream, &[header, body]).await);
        }
        results
    }

    /// Send to a single endpoint by index.
    pub async fn send_to(&mut self, index: usize, header: &[u8], body: &[u8]) -> Result<(), NetError> {
        let stream = self
            .streams
            .get_mut(index)
            .ok_or_else(|| NetError::Malformed(format!("no endpoint at index {index}")))?;
        write_multipart(stream, &[header, body]).await
    }

    /// Flush and close all connections, waiting up to `linger` for each
    /// shutdown to complete.
    pub async fn close(mut self, linger: Duration) {
        for stream in &mut self.streams {
            let _ = timeout(linger, tokio::io::AsyncWriteExt::shutdown(stream)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::read_multipart;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn sends_two_part_message_to_each_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let accept = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_multipart(&mut stream).await.unwrap()
        });

        let mut push = PushSocket::connect(&[addr]).await.unwrap();
        let results = push.send_all(b"header-bytes", b"body-bytes").await;
        assert!(results[0].is_ok());

        let parts = accept.await.unwrap();
        assert_eq!(parts, vec![b"header-bytes".to_vec(), b"body-bytes".to_vec()]);
    }
}
