//! Wire protocol: length-prefixed Postcard frames
//!
//! Every message on the wire is `[4 bytes length (big endian)] [payload]`.
//! A client writes one [`Envelope`](crate::Envelope) frame and reads one
//! [`Response`](crate::Response) frame per call.

pub mod codec;
pub mod frame;

pub use codec::{MessageCodec, MAX_MESSAGE_SIZE};
pub use frame::{read_frame, try_read_frame, write_frame};
