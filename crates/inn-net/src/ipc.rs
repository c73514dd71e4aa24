//! Endpoint scheme handling: `tcp://host:port` dials a TCP socket and
//! `ipc://path` dials a UNIX-domain socket, per the addressing convention
//! used throughout the pipeline. A bare `host:port` with no scheme is
//! treated as `tcp://` for backward compatibility with configs written
//! before the scheme prefix existed.

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};

pub const IPC_PREFIX: &str = "ipc://";
pub const TCP_PREFIX: &str = "tcp://";

pub fn is_ipc_endpoint(endpoint: &str) -> bool {
    endpoint.starts_with(IPC_PREFIX)
}

/// Strip the `ipc://` prefix and return the filesystem path.
pub fn ipc_path(endpoint: &str) -> Option<&str> {
    endpoint.strip_prefix(IPC_PREFIX)
}

/// Create the parent directory of an `ipc://` endpoint's path, if missing.
/// No-op for non-ipc endpoints.
pub fn prepare_ipc_path(endpoint: &str) -> std::io::Result<()> {
    let Some(path) = ipc_path(endpoint) else {
        return Ok(());
    };
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// A parsed endpoint address, ready to dial or bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Ipc(String),
}

impl Endpoint {
    pub fn parse(addr: &str) -> Endpoint {
        if let Some(path) = addr.strip_prefix(IPC_PREFIX) {
            Endpoint::Ipc(path.to_owned())
        } else if let Some(host_port) = addr.strip_prefix(TCP_PREFIX) {
            Endpoint::Tcp(host_port.to_owned())
        } else {
            Endpoint::Tcp(addr.to_owned())
        }
    }
}

/// Either side of a dialed or accepted connection, TCP or UNIX-domain.
pub enum Stream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Stream {
    pub async fn connect(endpoint: &Endpoint) -> std::io::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => Ok(Stream::Tcp(TcpStream::connect(addr).await?)),
            Endpoint::Ipc(path) => Ok(Stream::Unix(UnixStream::connect(path).await?)),
        }
    }

    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;
        match self {
            Stream::Tcp(s) => s.shutdown().await,
            Stream::Unix(s) => s.shutdown().await,
        }
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Either side of a bound listener, TCP or UNIX-domain.
pub enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl Listener {
    /// Bind `endpoint`. For `ipc://` paths, the parent directory is created
    /// and a stale socket file left over from a previous run is removed
    /// first, since `UnixListener::bind` fails if the path already exists.
    pub async fn bind(endpoint: &Endpoint) -> std::io::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => Ok(Listener::Tcp(TcpListener::bind(addr).await?)),
            Endpoint::Ipc(path) => {
                prepare_ipc_path(&format!("{IPC_PREFIX}{path}"))?;
                let _ = std::fs::remove_file(path);
                Ok(Listener::Unix(UnixListener::bind(path)?))
            }
        }
    }

    pub async fn accept(&self) -> std::io::Result<Stream> {
        match self {
            Listener::Tcp(l) => Ok(Stream::Tcp(l.accept().await?.0)),
            Listener::Unix(l) => Ok(Stream::Unix(l.accept().await?.0)),
        }
    }

    /// The bound address as a string: `host:port` for TCP, the socket path
    /// for a UNIX-domain listener.
    pub fn local_addr(&self) -> std::io::Result<String> {
        match self {
            Listener::Tcp(l) => Ok(l.local_addr()?.to_string()),
            Listener::Unix(l) => Ok(l
                .local_addr()?
                .as_pathname()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unnamed unix socket)".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recognizes_ipc_endpoints() {
        assert!(is_ipc_endpoint("ipc:///tmp/foo.sock"));
        assert!(!is_ipc_endpoint("tcp://127.0.0.1:5000"));
    }

    #[test]
    fn creates_missing_parent_dir() {
        let dir = tempdir().unwrap();
        let sock = dir.path().join("nested").join("deep").join("sock");
        let endpoint = format!("ipc://{}", sock.display());
        prepare_ipc_path(&endpoint).unwrap();
        assert!(sock.parent().unwrap().is_dir());
    }

    #[test]
    fn non_ipc_endpoint_is_a_no_op() {
        prepare_ipc_path("tcp://127.0.0.1:5000").unwrap();
    }

    #[test]
    fn parses_scheme_prefixes() {
        assert_eq!(Endpoint::parse("tcp://127.0.0.1:5000"), Endpoint::Tcp("127.0.0.1:5000".to_owned()));
        assert_eq!(Endpoint::parse("ipc:///tmp/foo.sock"), Endpoint::Ipc("/tmp/foo.sock".to_owned()));
        assert_eq!(Endpoint::parse("127.0.0.1:5000"), Endpoint::Tcp("127.0.0.1:5000".to_owned()));
    }

    #[tokio::test]
    async fn binds_and_connects_over_a_unix_socket() {
        let dir = tempdir().unwrap();
        let sock = dir.path().join("ipc.sock");
        let endpoint = Endpoint::Ipc(sock.to_str().unwrap().to_owned());

        let listener = Listener::bind(&endpoint).await.unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap() });

        let mut client = Stream::connect(&endpoint).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut client, b"hi").await.unwrap();

        let mut server = accept.await.unwrap();
        let mut buf = [0u8; 2];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
    }

    #[tokio::test]
    async fn rebinding_a_stale_socket_path_succeeds() {
        let dir = tempdir().unwrap();
        let sock = dir.path().join("ipc.sock");
        let endpoint = Endpoint::Ipc(sock.to_str().unwrap().to_owned());

        let first = Listener::bind(&endpoint).await.unwrap();
        drop(first);
        Listener::bind(&endpoint).await.unwrap();
    }
}
