//! Integration tests for the room registry and room actors.

use std::sync::Arc;

use ducktris_protocol::{Piece, RoomId};
use ducktris_room::{RegistryConfig, RoomConfig, RoomError, RoomRegistry, RoomState};

// =========================================================================
// Helpers
// =========================================================================

fn registry() -> RoomRegistry {
    RoomRegistry::new(RegistryConfig {
        piece_batch_size: 10,
        channel_size: 16,
    })
}

fn config(capacity: u32) -> RoomConfig {
    RoomConfig::new(20, 30, capacity, 0.1)
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_create_allocates_lowest_free_id() {
    let reg = registry();
    let a = reg.create(config(3)).await;
    let b = reg.create(config(3)).await;
    let c = reg.create(config(3)).await;
    assert_eq!((a.game_id, b.game_id, c.game_id), (RoomId(0), RoomId(1), RoomId(2)));

    reg.delete(RoomId(1)).await.unwrap();
    let d = reg.create(config(3)).await;
    assert_eq!(d.game_id, RoomId(1));
    assert_eq!(reg.room_ids().await, vec![RoomId(0), RoomId(1), RoomId(2)]);
}

#[tokio::test]
async fn test_new_room_is_waiting_and_empty() {
    let reg = registry();
    let view = reg.create(config(3)).await;
    assert!(!view.started);
    assert_eq!((view.width, view.height, view.size), (20, 30, 3));
    assert_eq!(view.duck_prob, 0.1);
    assert!(view.screen_names.is_empty());
}

#[tokio::test]
async fn test_get_unknown_room() {
    let reg = registry();
    assert!(matches!(
        reg.get(RoomId(7)).await,
        Err(RoomError::NotFound(RoomId(7)))
    ));
    assert_eq!(reg.delete(RoomId(7)).await, Err(RoomError::NotFound(RoomId(7))));
}

#[tokio::test]
async fn test_list_snapshot() {
    let reg = registry();
    assert!(reg.list().await.is_empty());
    assert!(reg.is_empty().await);

    reg.create(config(2)).await;
    reg.create(config(4)).await;
    reg.get(RoomId(1)).await.unwrap().add_player("ann").await.unwrap();

    let rooms = reg.list().await;
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[&RoomId(0)].size, 2);
    assert_eq!(rooms[&RoomId(1)].screen_names[0].player_id, "ann");
    assert_eq!(reg.len().await, 2);
}

#[tokio::test]
async fn test_held_handle_sees_not_found_after_delete() {
    let reg = registry();
    reg.create(config(3)).await;
    let handle = reg.get(RoomId(0)).await.unwrap();

    reg.delete(RoomId(0)).await.unwrap();

    assert_eq!(
        handle.add_player("late").await,
        Err(RoomError::NotFound(RoomId(0)))
    );
    assert!(reg.list().await.is_empty());
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_register_dedups_and_starts_at_capacity() {
    let reg = registry();
    reg.create(config(3)).await;
    let room = reg.get(RoomId(0)).await.unwrap();

    assert_eq!(room.add_player("peter").await.unwrap(), "peter");
    assert_eq!(room.add_player("peter").await.unwrap(), "peter_");
    assert!(!room.view().await.unwrap().started);

    assert_eq!(room.add_player("peter").await.unwrap(), "peter__");
    assert!(room.view().await.unwrap().started);

    assert_eq!(room.add_player("paul").await, Err(RoomError::Full(RoomId(0))));
    assert_eq!(room.view().await.unwrap().screen_names.len(), 3);
}

#[tokio::test]
async fn test_concurrent_registrations_never_exceed_capacity() {
    let reg = Arc::new(registry());
    reg.create(config(4)).await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let reg = Arc::clone(&reg);
        tasks.push(tokio::spawn(async move {
            let room = reg.get(RoomId(0)).await?;
            room.add_player(&format!("p{}", i % 3)).await
        }));
    }

    let mut seated = Vec::new();
    let mut full = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(id) => seated.push(id),
            Err(RoomError::Full(_)) => full += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(seated.len(), 4);
    assert_eq!(full, 12);
    seated.sort();
    seated.dedup();
    assert_eq!(seated.len(), 4, "player ids must be unique");
    assert!(reg.get(RoomId(0)).await.unwrap().view().await.unwrap().started);
}

#[tokio::test]
async fn test_unregister_keeps_record() {
    let reg = registry();
    reg.create(config(3)).await;
    let room = reg.get(RoomId(0)).await.unwrap();
    room.add_player("peter").await.unwrap();

    room.unregister("peter").await.unwrap();

    let player = room.player("peter").await.unwrap();
    assert!(!player.alive);
    assert_eq!(room.view().await.unwrap().screen_names.len(), 1);
    assert!(matches!(
        room.unregister("ghost").await,
        Err(RoomError::PlayerNotFound(..))
    ));
}

// =========================================================================
// Pieces and penalties
// =========================================================================

#[tokio::test]
async fn test_players_receive_the_same_sequence() {
    let reg = registry();
    reg.create(config(2)).await;
    let room = reg.get(RoomId(0)).await.unwrap();
    room.add_player("a").await.unwrap();
    room.add_player("b").await.unwrap();

    let a1 = room.next_pieces("a").await.unwrap();
    let a2 = room.next_pieces("a").await.unwrap();
    let a3 = room.next_pieces("a").await.unwrap();
    let b1 = room.next_pieces("b").await.unwrap();
    let b2 = room.next_pieces("b").await.unwrap();

    assert_eq!(a1.len(), 10);
    assert_eq!(a1, b1);
    assert_eq!(a2, b2);
    assert!(a1.iter().chain(&a2).chain(&a3).all(|p| p.0 <= Piece::SHAPES));
    assert_eq!(room.player("a").await.unwrap().part_index, 30);
    assert_eq!(room.player("b").await.unwrap().part_index, 20);
}

#[tokio::test]
async fn test_penalties_relay_in_order() {
    let reg = registry();
    reg.create(config(3)).await;
    let room = reg.get(RoomId(0)).await.unwrap();
    for name in ["a", "b", "c"] {
        room.add_player(name).await.unwrap();
    }

    assert_eq!(room.send_lines("a", 2).await.unwrap(), 2);
    assert_eq!(room.send_lines("c", 3).await.unwrap(), 2);

    let mut polled = Vec::new();
    for _ in 0..13 {
        polled.push(room.poll_penalty("b", "board".into()).await.unwrap());
    }
    assert_eq!(&polled[..10], &[0; 10]);
    assert_eq!(&polled[10..], &[2, 3, 0]);

    let a = room.player("a").await.unwrap();
    assert_eq!(a.penalties.last(), Some(&3));
    assert_eq!(room.player("b").await.unwrap().snapshot, "board");
}

// =========================================================================
// Conditional retirement
// =========================================================================

#[tokio::test]
async fn test_retire_if_respects_check() {
    let reg = registry();
    reg.create(config(3)).await;

    let kept = reg.retire_if(RoomId(0), |_| false).await.unwrap();
    assert!(kept.is_none());
    assert_eq!(reg.len().await, 1);

    let retired = reg
        .retire_if(RoomId(0), |a| a.state == RoomState::Waiting)
        .await
        .unwrap();
    assert_eq!(retired.map(|a| a.room_id), Some(RoomId(0)));
    assert!(reg.is_empty().await);
    assert!(matches!(
        reg.retire_if(RoomId(0), |_| true).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_deleted_id_goes_to_a_fresh_room() {
    let reg = registry();
    reg.create(config(3)).await;
    let old = reg.get(RoomId(0)).await.unwrap();

    reg.delete(RoomId(0)).await.unwrap();
    reg.create(config(5)).await;

    assert!(old.is_closed() || old.view().await.is_err());
    let new = reg.get(RoomId(0)).await.unwrap();
    assert!(!new.same_room(&old));
    assert_eq!(new.view().await.unwrap().size, 5);
}
