use thiserror::Error;

#[derive(Debug, Error)]
pub enum PusherError {
    #[error("config: {0}")]
    Config(String),
    #[error("codec: {0}")]
    Codec(#[from] inn_wire::CodecError),
    #[error("net: {0}")]
    Net(#[from] inn_net::NetError),
}
