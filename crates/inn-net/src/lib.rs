//! Transport standing in for the PUSH/PULL and PUB/SUB sockets used
//! throughout Old Log Inn, over TCP for `tcp://` endpoints and UNIX-domain
//! sockets for `ipc://` endpoints.

mod error;
mod ipc;
mod multipart;
mod pubsub;
mod pull;
mod push;

pub use error::NetError;
pub use ipc::{ipc_path, is_ipc_endpoint, prepare_ipc_path, Endpoint};
pub use multipart::{read_multipart, write_multipart};
pub use pubsub::{PubHub, PubMessage, SubClient};
pub use pull::{PullListener, PulledMessage};
pub use push::{PushSocket, DEFAULT_LINGER};
