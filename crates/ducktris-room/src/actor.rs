//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and is only reachable through its
//! command channel, so every operation on a room runs to completion
//! before the next one starts. Once the actor stops, every handle to it
//! reports [`RoomError::NotFound`].

use ducktris_protocol::{Piece, PlayerView, RoomId, RoomView};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{Room, RoomActivity, RoomError};

/// Decides, inside the actor, whether a room should be retired.
pub(crate) type RetireCheck = Box<dyn FnOnce(&RoomActivity) -> bool + Send>;

/// Commands sent to a room actor through its channel.
///
/// Each variant that expects an answer carries a `oneshot` reply channel.
pub(crate) enum RoomCommand {
    AddPlayer {
        name: String,
        reply: oneshot::Sender<Result<String, RoomError>>,
    },
    Unregister {
        player_id: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    NextPieces {
        player_id: String,
        reply: oneshot::Sender<Result<Vec<Piece>, RoomError>>,
    },
    SendLines {
        sender: String,
        lines: u32,
        reply: oneshot::Sender<usize>,
    },
    PollPenalty {
        player_id: String,
        snapshot: String,
        reply: oneshot::Sender<Result<u32, RoomError>>,
    },
    Player {
        player_id: String,
        reply: oneshot::Sender<Result<PlayerView, RoomError>>,
    },
    View {
        reply: oneshot::Sender<RoomView>,
    },
    /// Stop the actor if `check` approves. Replies with the activity the
    /// decision was made on, or `None` if the room lives on.
    RetireIf {
        check: RetireCheck,
        reply: oneshot::Sender<Option<RoomActivity>>,
    },
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` and the room id. The registry
/// holds one per room and hands out clones to request handlers.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer. A stopped actor reads as a missing room.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))?;
        reply_rx.await.map_err(|_| RoomError::NotFound(self.room_id))
    }

    /// Seats a player. Returns the (possibly suffixed) player id.
    pub async fn add_player(&self, name: &str) -> Result<String, RoomError> {
        let name = name.to_string();
        self.request(|reply| RoomCommand::AddPlayer { name, reply })
            .await?
    }

    /// Marks a player dead.
    pub async fn unregister(&self, player_id: &str) -> Result<(), RoomError> {
        let player_id = player_id.to_string();
        self.request(|reply| RoomCommand::Unregister { player_id, reply })
            .await?
    }

    /// Next window of the shared piece sequence for this player.
    pub async fn next_pieces(&self, player_id: &str) -> Result<Vec<Piece>, RoomError> {
        let player_id = player_id.to_string();
        self.request(|reply| RoomCommand::NextPieces { player_id, reply })
            .await?
    }

    /// Relays cleared lines to everyone but the sender. Returns how many
    /// players received them.
    pub async fn send_lines(&self, sender: &str, lines: u32) -> Result<usize, RoomError> {
        let sender = sender.to_string();
        self.request(|reply| RoomCommand::SendLines {
            sender,
            lines,
            reply,
        })
        .await
    }

    /// Heartbeat: stores the snapshot and pops the oldest pending penalty.
    pub async fn poll_penalty(
        &self,
        player_id: &str,
        snapshot: String,
    ) -> Result<u32, RoomError> {
        let player_id = player_id.to_string();
        self.request(|reply| RoomCommand::PollPenalty {
            player_id,
            snapshot,
            reply,
        })
        .await?
    }

    /// Snapshot of one player, dead or alive.
    pub async fn player(&self, player_id: &str) -> Result<PlayerView, RoomError> {
        let player_id = player_id.to_string();
        self.request(|reply| RoomCommand::Player { player_id, reply })
            .await?
    }

    /// Snapshot of the whole room.
    pub async fn view(&self) -> Result<RoomView, RoomError> {
        self.request(|reply| RoomCommand::View { reply }).await
    }

    /// Stops the room if `check` returns `true` for its current activity.
    ///
    /// The check runs inside the actor, so no other command can land
    /// between the decision and the stop.
    pub async fn retire_if(
        &self,
        check: impl FnOnce(&RoomActivity) -> bool + Send + 'static,
    ) -> Result<Option<RoomActivity>, RoomError> {
        let check: RetireCheck = Box::new(check);
        self.request(|reply| RoomCommand::RetireIf { check, reply })
            .await
    }

    /// Tells the room to stop. Commands already queued are served first.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))
    }

    /// Returns `true` if both handles address the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    window: usize,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until shutdown, retirement, or every handle is
    /// dropped.
    async fn run(mut self) {
        let room_id = self.room.id();
        tracing::debug!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::AddPlayer { name, reply } => {
                    let _ = reply.send(self.room.add_player(&name));
                }
                RoomCommand::Unregister { player_id, reply } => {
                    let _ = reply.send(self.room.unregister(&player_id));
                }
                RoomCommand::NextPieces { player_id, reply } => {
                    let result =
                        self.room
                            .next_pieces(&player_id, self.window, &mut self.rng);
                    let _ = reply.send(result);
                }
                RoomCommand::SendLines {
                    sender,
                    lines,
                    reply,
                } => {
                    let _ = reply.send(self.room.send_lines(&sender, lines));
                }
                RoomCommand::PollPenalty {
                    player_id,
                    snapshot,
                    reply,
                } => {
                    let result =
                        self.room
                            .poll_penalty(&player_id, snapshot, Instant::now());
                    let _ = reply.send(result);
                }
                RoomCommand::Player { player_id, reply } => {
                    let _ = reply.send(self.room.player(&player_id).map(|p| p.view()));
                }
                RoomCommand::View { reply } => {
                    let _ = reply.send(self.room.view());
                }
                RoomCommand::RetireIf { check, reply } => {
                    let activity = self.room.activity();
                    if check(&activity) {
                        let _ = reply.send(Some(activity));
                        tracing::debug!(%room_id, "room retired");
                        break;
                    }
                    let _ = reply.send(None);
                }
                RoomCommand::Shutdown => {
                    tracing::debug!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::debug!(%room_id, "room actor stopped");
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it's full.
pub(crate) fn spawn_room(room: Room, window: usize, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room_id = room.id();

    let actor = RoomActor {
        room,
        window,
        rng: StdRng::from_rng(&mut rand::rng()),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
