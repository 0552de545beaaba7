//! # Ducktris
//!
//! Server for a multiplayer falling-block game. Players in a room draw
//! from one shared piece sequence, and every line a player clears lands
//! on everyone else's board as garbage.
//!
//! Clients speak JSON over WebSocket: one request per frame, one reply per
//! request. Rooms live in a shared registry, each as its own actor task,
//! and a background reaper evicts rooms that were abandoned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ducktris::prelude::*;
//!
//! # async fn start() -> Result<(), DucktrisError> {
//! let server = DucktrisServer::builder()
//!     .bind("127.0.0.1:8888")
//!     .reaper_config(ReaperConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::DucktrisError;
pub use server::{DEFAULT_BIND_ADDR, DucktrisServer, DucktrisServerBuilder};

/// The types needed to configure and run a server.
pub mod prelude {
    pub use crate::{DucktrisError, DucktrisServer, DucktrisServerBuilder};
    pub use ducktris_protocol::{Body, Envelope, Reply, Request, Status};
    pub use ducktris_reaper::ReaperConfig;
    pub use ducktris_room::{RegistryConfig, RoomConfig, RoomRegistry};
}
