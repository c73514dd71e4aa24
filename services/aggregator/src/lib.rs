//! Subscription aggregator: subscribes to many PUB endpoints and republishes
//! everything it receives, unchanged, onto a single PUB endpoint of its own.

use std::path::Path;
use std::sync::Arc;

use inn_net::{PubHub, SubClient};
use tokio::sync::mpsc;

/// Load a newline-separated list of PUB endpoints (`host:port`). Blank
/// lines and lines starting with `#` are ignored.
pub fn load_endpoints(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

pub struct Aggregator {
    pub_hub: Arc<PubHub>,
}

impl Aggregator {
    pub async fn bind(pub_bind: &str, hwm: usize) -> std::io::Result<Self> {
        let pub_hub = PubHub::bind(pub_bind, hwm)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(Aggregator {
            pub_hub: Arc::new(pub_hub),
        })
    }

    pub fn pub_local_addr(&self) -> std::io::Result<String> {
        self.pub_hub.local_addr()
    }

    /// Subscribe to every endpoint in `upstreams` and republish everything
    /// received. Runs until every upstream connection has closed.
    pub async fn run(self, upstreams: Vec<String>) {
        let (tx, mut rx) = mpsc::channel(1024);

        let accept_hub = Arc::clone(&self.pub_hub);
        let accept_task = tokio::spawn(async move { accept_hub.run().await });

        for upstream in upstreams {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut sub = match SubClient::connect(&upstream).await {
                    Ok(sub) => sub,
                    Err(e) => {
                        tracing::warn!(upstream = %upstream, error = %e, "failed to subscribe");
                        return;
                    }
                };
                loop {
                    match sub.recv().await {
                        Ok(msg) => {
                            if tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(upstream = %upstream, error = %e, "upstream subscription closed");
                            break;
                        }
                    }
                }
            });
        }
        drop(tx);

        let pub_hub = self.pub_hub;
        while let Some((topic, header, body)) = rx.recv().await {
            pub_hub.publish(&topic, &header, &body);
        }
        accept_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_endpoints_skipping_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10.0.0.1:6000").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "10.0.0.2:6000").unwrap();
        let endpoints = load_endpoints(file.path()).unwrap();
        assert_eq!(endpoints, vec!["10.0.0.1:6000", "10.0.0.2:6000"]);
    }
}
