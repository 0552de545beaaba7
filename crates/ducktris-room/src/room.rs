//! The room itself: roster, shared piece sequence, and penalty relay.
//!
//! `Room` is plain synchronous state. It is owned by exactly one actor
//! task (see [`crate::RoomHandle`]), which is what makes each
//! check-then-mutate sequence below atomic with respect to every other
//! request against the same room.

use ducktris_protocol::{Piece, RoomId, RoomView};
use rand::Rng;
use tokio::time::Instant;

use crate::pieces::PieceQueue;
use crate::player::Player;
use crate::{RoomConfig, RoomError, RoomState};

/// Appended to a screen name until it no longer collides.
pub const PLAYER_ID_SEPARATOR: char = '_';

/// What the reaper needs to know about a room, captured in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomActivity {
    pub room_id: RoomId,
    pub state: RoomState,
    pub created_at: Instant,
    pub player_count: usize,
    /// Most recent penalty poll by any player, dead or alive. `None` if
    /// nobody has polled yet.
    pub last_request: Option<Instant>,
}

/// One game room.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    state: RoomState,
    created_at: Instant,
    players: Vec<Player>,
    pieces: PieceQueue,
}

impl Room {
    pub fn new(id: RoomId, config: RoomConfig, created_at: Instant) -> Self {
        Self {
            id,
            config,
            state: RoomState::Waiting,
            created_at,
            players: Vec::new(),
            pieces: PieceQueue::new(config.duck_probability),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Players in registration order, dead ones included.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn is_full(&self) -> bool {
        self.players.len() >= self.config.capacity as usize
    }

    /// Seats a player and returns the id they were given.
    ///
    /// A name already taken by a living or dead player gets
    /// [`PLAYER_ID_SEPARATOR`] appended until it is unique. Taking the last
    /// seat starts the room.
    pub fn add_player(&mut self, name: &str) -> Result<String, RoomError> {
        if self.is_full() {
            return Err(RoomError::Full(self.id));
        }

        let mut player_id = name.to_string();
        while self.players.iter().any(|p| p.id() == player_id) {
            player_id.push(PLAYER_ID_SEPARATOR);
        }

        self.players.push(Player::new(player_id.clone()));
        tracing::info!(
            room_id = %self.id,
            %player_id,
            players = self.players.len(),
            capacity = self.config.capacity,
            "player registered"
        );

        if self.is_full() && self.state.can_transition_to(RoomState::Running) {
            self.state = RoomState::Running;
            tracing::info!(room_id = %self.id, "room started");
        }

        Ok(player_id)
    }

    pub fn player(&self, player_id: &str) -> Result<&Player, RoomError> {
        self.players
            .iter()
            .find(|p| p.id() == player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string(), self.id))
    }

    /// Mutable access to the stored record, for in-place updates.
    pub fn player_mut(&mut self, player_id: &str) -> Result<&mut Player, RoomError> {
        let room_id = self.id;
        self.players
            .iter_mut()
            .find(|p| p.id() == player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string(), room_id))
    }

    /// Marks a player dead. The record stays in the roster.
    pub fn unregister(&mut self, player_id: &str) -> Result<(), RoomError> {
        self.player_mut(player_id)?.kill();
        tracing::info!(room_id = %self.id, %player_id, "player unregistered");
        Ok(())
    }

    /// Hands the player the next `window` pieces of the shared sequence
    /// and moves their cursor past them.
    pub fn next_pieces<R: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        window: usize,
        rng: &mut R,
    ) -> Result<Vec<Piece>, RoomError> {
        let room_id = self.id;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id() == player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string(), room_id))?;

        let pieces = self.pieces.window(player.part_index(), window, rng).to_vec();
        player.advance(window);
        Ok(pieces)
    }

    /// Queues `lines` on every player except the sender, dead ones
    /// included. Returns how many players received them.
    pub fn send_lines(&mut self, sender: &str, lines: u32) -> usize {
        let mut recipients = 0;
        for player in self.players.iter_mut().filter(|p| p.id() != sender) {
            player.push_penalty(lines);
            recipients += 1;
        }
        tracing::debug!(room_id = %self.id, %sender, lines, recipients, "lines relayed");
        recipients
    }

    /// Stores the player's snapshot, stamps the heartbeat, and pops their
    /// oldest pending penalty.
    pub fn poll_penalty(
        &mut self,
        player_id: &str,
        snapshot: String,
        now: Instant,
    ) -> Result<u32, RoomError> {
        Ok(self.player_mut(player_id)?.poll(snapshot, now))
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            game_id: self.id,
            started: self.state.is_running(),
            width: self.config.width,
            height: self.config.height,
            size: self.config.capacity,
            duck_prob: self.config.duck_probability,
            screen_names: self.players.iter().map(Player::view).collect(),
        }
    }

    pub fn activity(&self) -> RoomActivity {
        RoomActivity {
            room_id: self.id,
            state: self.state,
            created_at: self.created_at,
            player_count: self.players.len(),
            last_request: self.players.iter().filter_map(Player::last_request).max(),
        }
    }
}
