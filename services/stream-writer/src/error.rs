use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamWriterError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec: {0}")]
    Codec(#[from] inn_wire::CodecError),
    #[error("frame: {0}")]
    Frame(#[from] inn_wire::FrameError),
    #[error("config: {0}")]
    Config(String),
}
