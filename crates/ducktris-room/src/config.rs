//! Room configuration and state machine.

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Per-room settings, fixed at creation.
///
/// Nothing here is validated: board dimensions are opaque to the server,
/// and a capacity of 0 simply yields a room that is always full.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomConfig {
    /// Board width in cells.
    pub width: u32,

    /// Board height in cells.
    pub height: u32,

    /// Seats. The room starts the moment the last one is taken.
    pub capacity: u32,

    /// Chance that any single generated piece is the wildcard.
    pub duck_probability: f64,
}

impl RoomConfig {
    pub fn new(width: u32, height: u32, capacity: u32, duck_probability: f64) -> Self {
        Self {
            width,
            height,
            capacity,
            duck_probability,
        }
    }
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Pieces generated per batch, which is also the window size handed
    /// to a player per request.
    pub piece_batch_size: usize,

    /// Command channel capacity of each room actor.
    pub channel_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            piece_batch_size: 100,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──(last seat taken)──→ Running
/// ```
///
/// There is no finished state: a room stops mattering when the reaper
/// evicts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Waiting,
    Running,
}

impl RoomState {
    /// Returns `true` once the room has started.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The only transition the state machine allows from here, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Running),
            Self::Running => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
        }
    }
}
