//! Wire protocol for Ducktris.
//!
//! - **Types** ([`RoomId`], [`Piece`], [`RoomView`], [`PlayerView`]) hold the
//!   identifiers and snapshots every layer shares.
//! - **Messages** ([`Envelope`], [`Request`], [`Reply`], [`Body`],
//!   [`Status`]): one request per client frame, one reply per request.
//! - **Codec** ([`Codec`], [`JsonCodec`]): frames to messages and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (Envelope/Reply) → Room registry
//! ```

mod codec;
mod error;
mod loose;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use loose::Dimensions;
pub use message::{Body, Envelope, Reply, Request, Status};
pub use types::{Piece, PlayerView, RoomId, RoomView};
