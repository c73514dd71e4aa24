//! Wire format shared by every Old Log Inn component: the log header type,
//! independent compression of header/body, and the on-disk record framing.
//!
//! This crate performs no I/O of its own; callers own the socket or file.

mod codec;
mod error;
mod frame;
mod header;

pub use codec::{decode_body, decode_header, encode_body, encode_header};
pub use error::{CodecError, FrameError};
pub use frame::{frame, unframe, FRAME_VERSION};
pub use header::LogHeader;
