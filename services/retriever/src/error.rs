use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("remote store: {0}")]
    RemoteStore(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec: {0}")]
    Codec(#[from] inn_wire::CodecError),
}
