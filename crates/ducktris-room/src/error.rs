//! Error types for the room layer.

use ducktris_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Colliding screen names are renamed, never rejected, so there is no
/// "name taken" variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist, or was deleted while the request was in
    /// flight.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// No player with this id is seated in the room.
    #[error("player {0:?} not in room {1}")]
    PlayerNotFound(String, RoomId),

    /// Every seat is taken.
    #[error("room {0} is full")]
    Full(RoomId),
}
