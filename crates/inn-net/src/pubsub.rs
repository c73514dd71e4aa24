//! PUB/SUB transport: a `PubHub` broadcasts three-part `(topic, header,
//! body)` messages to every connected `SubClient`, bounded by a fixed
//! channel capacity standing in for the original pipeline's high-water mark.

use tokio::sync::broadcast;

use crate::error::NetError;
use crate::ipc::{Endpoint, Listener, Stream};
use crate::multipart::{read_multipart, write_multipart};

pub type PubMessage = (Vec<u8>, Vec<u8>, Vec<u8>);

/// A PUB-side broadcaster. Slow subscribers drop messages (`Lagged`) rather
/// than stalling the publisher, exactly the high-water-mark behaviour this
/// replaces.
pub struct PubHub {
    listener: Listener,
    tx: broadcast::Sender<PubMessage>,
}

impl PubHub {
    /// Bind `addr` (`tcp://host:port`, `ipc://path`, or a bare `host:port`
    /// treated as `tcp://`). `hwm` is the broadcast channel capacity: the
    /// number of undelivered messages a lagging subscriber may accumulate
    /// before messages are dropped for it.
    pub async fn bind(addr: &str, hwm: usize) -> Result<Self, NetError> {
        let listener = Listener::bind(&Endpoint::parse(addr)).await?;
        let (tx, _rx) = broadcast::channel(hwm.max(1));
        Ok(PubHub { listener, tx })
    }

    pub fn local_addr(&self) -> std::io::Result<String> {
        self.listener.local_addr()
    }

    /// Publish one `(topic, header, body)` message to all current
    /// subscribers. Returns `Ok(())` even with zero subscribers.
    pub fn publish(&self, topic: &[u8], header: &[u8], body: &[u8]) {
        let _ = self
            .tx
            .send((topic.to_vec(), header.to_vec(), body.to_vec()));
    }

    /// Accept subscriber connections until the listener errors out.
    pub async fn run(&self) {
        loop {
            let stream = match self.listener.accept().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "pub hub accept failed, stopping");
                    break;
                }
            };
            let rx = self.tx.subscribe();
            tokio::spawn(serve_subscriber(stream, rx));
        }
    }
}

async fn serve_subscriber(mut stream: Stream, mut rx: broadcast::Receiver<PubMessage>) {
    loop {
        match rx.recv().await {
            Ok((topic, header, body)) => {
                if write_multipart(&mut stream, &[&topic, &header, &body])
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "subscriber too slow, messages dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// A SUB-side client: dials a `PubHub` and yields every published message.
/// There is no prefix filtering; subscribers always subscribe to the
/// empty prefix, matching the single-topic-stream design of this pipeline.
pub struct SubClient {
    stream: Stream,
}

impl SubClient {
    /// Dial `addr` (`tcp://host:port`, `ipc://path`, or a bare `host:port`
    /// treated as `tcp://`).
    pub async fn connect(addr: &str) -> Result<Self, NetError> {
        Ok(SubClient {
            stream: Stream::connect(&Endpoint::parse(addr)).await?,
        })
    }

    pub async fn recv(&mut self) -> Result<PubMessage, NetError> {
        let mut parts = read_multipart(&mut self.stream).await?;
        if parts.len() != 3 {
            return Err(NetError::Malformed(format!(
                "expected 3-part pub message, got {}",
                parts.len()
            )));
        }
        let body = parts.pop().unwrap();
        let header = parts.pop().unwrap();
        let topic = parts.pop().unwrap();
        Ok((topic, header, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let hub = std::sync::Arc::new(PubHub::bind("127.0.0.1:0", 16).await.unwrap());
        let addr = hub.local_addr().unwrap().to_string();
        let runner = std::sync::Arc::clone(&hub);
        tokio::spawn(async move { runner.run().await });

        let mut sub = SubClient::connect(&addr).await.unwrap();
        // give the subscriber a moment to register before publishing
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        hub.publish(b"web-01", b"h", b"b");

        let (topic, header, body) = sub.recv().await.unwrap();
        assert_eq!(topic, b"web-01");
        assert_eq!(header, b"h");
        assert_eq!(body, b"b");
    }
}
