use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame: {0}")]
    Frame(#[from] inn_wire::FrameError),
    #[error("connection closed")]
    Closed,
    #[error("malformed multipart message: {0}")]
    Malformed(String),
}
