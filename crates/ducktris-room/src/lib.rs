//! Room lifecycle management for Ducktris.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, its shared piece sequence, and its players' penalty queues.
//! The [`RoomRegistry`] maps ids to actor handles.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: allocates ids, creates/lists/deletes rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`]: the synchronous room state the actor owns
//! - [`RoomState`]: Waiting → Running
//! - [`RoomConfig`] / [`RegistryConfig`]: per-room and registry settings

mod actor;
mod config;
mod error;
mod pieces;
mod player;
mod registry;
mod room;

pub use actor::RoomHandle;
pub use config::{RegistryConfig, RoomConfig, RoomState};
pub use error::RoomError;
pub use player::{INITIAL_PENALTY_SLOTS, Player};
pub use registry::RoomRegistry;
pub use room::{PLAYER_ID_SEPARATOR, Room, RoomActivity};
