//! Request and reply envelopes.
//!
//! Every client frame carries one [`Envelope`]; the server answers each
//! with exactly one [`Reply`] echoing the envelope's `seq`.
//!
//! ```text
//! → {"seq": 4, "request": {"op": "register", "game_id": 0, "screen_name": "peter"}}
//! ← {"seq": 4, "status": 200, "body": {"player_id": "peter"}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::loose::{self, Dimensions};
use crate::{Piece, PlayerView, RoomId, RoomView};

/// One operation a client can ask for. The `op` tag names it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    /// Create a room and return it.
    #[serde(rename = "new")]
    CreateRoom {
        #[serde(default)]
        dimensions: Dimensions,
        /// Seat capacity.
        #[serde(default, deserialize_with = "loose::count")]
        size: u32,
        #[serde(default, deserialize_with = "loose::probability")]
        duck_prob: f64,
    },

    /// Take a seat; the reply carries the final player id.
    #[serde(rename = "register")]
    Register {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        screen_name: String,
    },

    /// Mark a player as dead. The record stays in the roster.
    #[serde(rename = "unregister")]
    Unregister {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        player_id: String,
    },

    /// Snapshot every live room.
    #[serde(rename = "list")]
    ListRooms,

    /// Next window of the shared piece sequence for this player.
    #[serde(rename = "getparts")]
    GetParts {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        player_id: String,
    },

    /// Heartbeat: store the snapshot and pop the oldest pending penalty.
    #[serde(rename = "receive")]
    ReceivePenalty {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        player_id: String,
        #[serde(default)]
        game_snapshot: String,
    },

    /// Report cleared lines; every other player gets them as garbage.
    #[serde(rename = "sendlines")]
    SendLines {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        player_id: String,
        #[serde(default, deserialize_with = "loose::count")]
        num_lines: u32,
    },

    /// Snapshot one player, dead or alive.
    #[serde(rename = "player")]
    GetPlayer {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
        #[serde(default)]
        player_id: String,
    },

    /// Snapshot one room, or a `null` body if it doesn't exist.
    #[serde(rename = "status")]
    Status {
        #[serde(deserialize_with = "loose::room_id")]
        game_id: RoomId,
    },
}

impl Request {
    /// The wire name of this operation, for log fields.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "new",
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::ListRooms => "list",
            Self::GetParts { .. } => "getparts",
            Self::ReceivePenalty { .. } => "receive",
            Self::SendLines { .. } => "sendlines",
            Self::GetPlayer { .. } => "player",
            Self::Status { .. } => "status",
        }
    }
}

/// A client frame: a request plus an optional correlation number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Echoed back in the reply. Defaults to 0.
    #[serde(default)]
    pub seq: u64,
    pub request: Request,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Reply status, using HTTP status numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub u16);

impl Status {
    pub const OK: Status = Status(200);
    pub const CREATED: Status = Status(201);
    pub const BAD_REQUEST: Status = Status(400);
    pub const NOT_FOUND: Status = Status(404);
    pub const NOT_ACCEPTABLE: Status = Status(406);
    pub const INTERNAL_ERROR: Status = Status(500);
}

/// Reply payloads. Serialized without a tag: the client knows which shape
/// to expect from the op it sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Room(RoomView),
    Player(PlayerView),
    Rooms(BTreeMap<RoomId, RoomView>),
    Registered { player_id: String },
    Penalty { penalty: u32 },
    Pieces(Vec<Piece>),
}

/// A server frame answering one [`Envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub seq: u64,
    pub status: Status,
    /// `null` for acknowledgements, errors, and unknown-room status queries.
    pub body: Option<Body>,
}

impl Reply {
    pub fn new(seq: u64, status: Status, body: Body) -> Self {
        Self {
            seq,
            status,
            body: Some(body),
        }
    }

    /// A reply with no body.
    pub fn empty(seq: u64, status: Status) -> Self {
        Self {
            seq,
            status,
            body: None,
        }
    }
}
