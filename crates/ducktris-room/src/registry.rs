//! Room registry: allocates ids, creates, finds, lists, and deletes rooms.

use std::collections::{BTreeMap, HashMap};

use ducktris_protocol::{RoomId, RoomView};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::actor::spawn_room;
use crate::{RegistryConfig, Room, RoomActivity, RoomConfig, RoomError, RoomHandle};

/// The set of live rooms.
///
/// Built once at startup and shared as `Arc<RoomRegistry>` by every
/// connection task and the reaper. The id map sits behind an async
/// `RwLock`; room state itself lives in each room's actor, so the map lock
/// is only ever held for map lookups and edits, never across a room
/// operation.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    config: RegistryConfig,
}

impl RoomRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Creates a Waiting room under the lowest free id and returns its
    /// initial snapshot.
    pub async fn create(&self, config: RoomConfig) -> RoomView {
        let mut rooms = self.rooms.write().await;
        let room_id = lowest_free_id(&rooms);

        let room = Room::new(room_id, config, Instant::now());
        let view = room.view();
        let handle = spawn_room(room, self.config.piece_batch_size, self.config.channel_size);
        rooms.insert(room_id, handle);

        tracing::info!(
            %room_id,
            width = config.width,
            height = config.height,
            capacity = config.capacity,
            duck_probability = config.duck_probability,
            "room created"
        );
        view
    }

    /// Looks up a room.
    pub async fn get(&self, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Removes a room and stops its actor.
    ///
    /// Requests already queued on the room finish first; anything after
    /// sees [`RoomError::NotFound`].
    pub async fn delete(&self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .write()
            .await
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        // The actor may already be gone; the room is deleted either way.
        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room deleted");
        Ok(())
    }

    /// Deletes a room only if `check` approves its current activity.
    ///
    /// Returns the activity the decision was based on when the room was
    /// deleted, `None` when it was kept.
    pub async fn retire_if(
        &self,
        room_id: RoomId,
        check: impl FnOnce(&RoomActivity) -> bool + Send + 'static,
    ) -> Result<Option<RoomActivity>, RoomError> {
        let handle = self.get(room_id).await?;
        self.retire_handle(&handle, check).await
    }

    async fn retire_handle(
        &self,
        handle: &RoomHandle,
        check: impl FnOnce(&RoomActivity) -> bool + Send + 'static,
    ) -> Result<Option<RoomActivity>, RoomError> {
        let retired = handle.retire_if(check).await?;

        if retired.is_some() {
            let room_id = handle.room_id();
            let mut rooms = self.rooms.write().await;
            // A concurrent delete may have freed the id and a new room
            // taken it since; only drop the entry if it is still ours.
            if rooms.get(&room_id).is_some_and(|h| h.same_room(handle)) {
                rooms.remove(&room_id);
            }
        }
        Ok(retired)
    }

    /// Point-in-time snapshot of every live room.
    ///
    /// Rooms deleted while the snapshot is being taken are left out.
    pub async fn list(&self) -> BTreeMap<RoomId, RoomView> {
        let mut views = BTreeMap::new();
        for handle in self.handles().await {
            if let Ok(view) = handle.view().await {
                views.insert(view.game_id, view);
            }
        }
        views
    }

    /// Clones of every room handle, taken without holding the map lock
    /// afterwards.
    pub async fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

fn lowest_free_id(rooms: &HashMap<RoomId, RoomHandle>) -> RoomId {
    let mut candidate = 0;
    while rooms.contains_key(&RoomId(candidate)) {
        candidate += 1;
    }
    RoomId(candidate)
}
