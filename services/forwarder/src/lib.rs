//! Push→Pub forwarder: accepts pushed log events from many local producers
//! and republishes them, still compressed, onto a PUB endpoint under a
//! fixed topic. The forwarder never decompresses a message; it has no
//! reason to, and doing so would cost every message a decompress/recompress
//! round trip for no benefit.

pub mod config;

use std::sync::Arc;

use config::ForwarderConfig;
use inn_net::{PubHub, PullListener};
use tokio::sync::mpsc;

pub struct Forwarder {
    pull: PullListener,
    pub_hub: Arc<PubHub>,
    topic: Vec<u8>,
}

impl Forwarder {
    pub async fn bind(config: &ForwarderConfig) -> std::io::Result<Self> {
        let pull = PullListener::bind(&config.pull_bind).await?;
        let pub_hub = PubHub::bind(&config.pub_bind, config.hwm)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(Forwarder {
            pull,
            pub_hub: Arc::new(pub_hub),
            topic: config.topic.clone().into_bytes(),
        })
    }

    pub fn pull_local_addr(&self) -> std::io::Result<String> {
        self.pull.local_addr()
    }

    pub fn pub_local_addr(&self) -> std::io::Result<String> {
        self.pub_hub.local_addr()
    }

    /// Run the forwarder until the pull listener stops accepting
    /// connections (the process-wide shutdown path closes the listener).
    pub async fn run(self) {
        let (tx, mut rx) = mpsc::channel(1024);
        let topic = self.topic;

        let hub_for_accept = Arc::clone(&self.pub_hub);
        let accept_task = tokio::spawn(async move { hub_for_accept.run().await });

        let hub_for_publish = self.pub_hub;
        let publish_task = tokio::spawn(async move {
            while let Some((header, body)) = rx.recv().await {
                hub_for_publish.publish(&topic, &header, &body);
            }
        });

        self.pull.run(tx).await;
        let _ = publish_task.await;
        accept_task.abort();
    }
}
