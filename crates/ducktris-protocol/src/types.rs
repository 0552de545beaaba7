//! Identity, piece, and view types shared by every layer.
//!
//! Views ([`RoomView`], [`PlayerView`]) are point-in-time copies of room
//! state. The room layer builds them; the server serializes them after
//! every lock has been released.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Identifier of a live room.
///
/// Allocated as the smallest non-negative integer not held by another live
/// room, so ids are reused once a room has been reaped. Serializes as a
/// plain number (`7`, not `{"0":7}`), and as a string key inside maps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// One falling-block piece type.
///
/// `0` is the wildcard "duck" piece; `1..=7` are the seven tetromino
/// shapes. Serializes as a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Piece(pub u8);

impl Piece {
    /// The wildcard piece.
    pub const DUCK: Piece = Piece(0);

    /// Number of standard tetromino shapes (`1..=SHAPES`).
    pub const SHAPES: u8 = 7;

    /// Returns `true` for the wildcard piece.
    pub fn is_duck(self) -> bool {
        self == Self::DUCK
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Snapshot of one seated player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Final (possibly `_`-suffixed) id handed out at registration.
    pub player_id: String,
    /// `false` once the player unregistered. Dead players stay listed.
    pub alive: bool,
    /// Last opaque board snapshot the client reported.
    pub snapshot: String,
    /// Cursor into the room's shared piece sequence.
    pub part_index: usize,
    /// Pending garbage-line counts, oldest first.
    pub penalties: Vec<u32>,
}

/// Snapshot of a room, in the shape clients expect on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub game_id: RoomId,
    /// `true` once every seat was taken.
    pub started: bool,
    pub width: u32,
    pub height: u32,
    /// Seat capacity.
    pub size: u32,
    pub duck_prob: f64,
    /// Seated players in registration order.
    pub screen_names: Vec<PlayerView>,
}

impl RoomView {
    /// Looks up a player in the snapshot by id.
    pub fn player(&self, player_id: &str) -> Option<&PlayerView> {
        self.screen_names.iter().find(|p| p.player_id == player_id)
    }
}
