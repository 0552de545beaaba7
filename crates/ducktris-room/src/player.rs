//! A seated player's record.

use std::collections::VecDeque;

use ducktris_protocol::PlayerView;
use tokio::time::Instant;

/// Number of zero entries a fresh penalty queue starts with.
pub const INITIAL_PENALTY_SLOTS: usize = 10;

/// One player in a room's roster.
///
/// Players are never removed from a roster. Unregistering only clears
/// `alive`, so the record stays around for status queries.
#[derive(Debug, Clone)]
pub struct Player {
    id: String,
    alive: bool,
    /// Pending garbage-line counts, oldest at the front.
    penalties: VecDeque<u32>,
    snapshot: String,
    /// Time of the last penalty poll. `None` until the first one.
    last_request: Option<Instant>,
    part_index: usize,
}

impl Player {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            alive: true,
            penalties: VecDeque::from(vec![0; INITIAL_PENALTY_SLOTS]),
            snapshot: String::new(),
            last_request: None,
            part_index: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }

    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Pending penalties, oldest first.
    pub fn penalties(&self) -> impl Iterator<Item = u32> + '_ {
        self.penalties.iter().copied()
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    pub(crate) fn advance(&mut self, by: usize) {
        self.part_index += by;
    }

    pub(crate) fn push_penalty(&mut self, lines: u32) {
        self.penalties.push_back(lines);
    }

    /// Records a heartbeat and pops the oldest pending penalty (0 if none).
    pub(crate) fn poll(&mut self, snapshot: String, now: Instant) -> u32 {
        self.snapshot = snapshot;
        self.last_request = Some(now);
        self.penalties.pop_front().unwrap_or(0)
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            player_id: self.id.clone(),
            alive: self.alive,
            snapshot: self.snapshot.clone(),
            part_index: self.part_index,
            penalties: self.penalties.iter().copied().collect(),
        }
    }
}
