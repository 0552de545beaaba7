//! Per-connection handler and request dispatch.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Receive a frame → decode an [`Envelope`]
//!   2. Dispatch the request against the shared [`RoomRegistry`]
//!   3. Encode and send exactly one [`Reply`], echoing `seq`
//!
//! A frame that fails to decode gets a 400 reply and the connection stays
//! open.

use std::sync::Arc;

use ducktris_protocol::{Body, Codec, Envelope, Reply, Request, Status};
use ducktris_room::{RoomConfig, RoomError, RoomRegistry};
use ducktris_transport::{Connection, WebSocketConnection};

use crate::DucktrisError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) codec: C,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DucktrisError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let reply = match state.codec.decode::<Envelope>(&data) {
            Ok(Envelope { seq, request }) => {
                tracing::debug!(%conn_id, seq, op = request.op(), "request");
                let (status, body) = handle_request(&state.registry, request).await;
                Reply { seq, status, body }
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "malformed request");
                Reply::empty(0, Status::BAD_REQUEST)
            }
        };

        send_reply(&conn, &state.codec, &reply).await?;
    }

    Ok(())
}

/// Encodes and sends a reply. If the reply can't be encoded, an empty 500
/// with the same `seq` goes out instead.
async fn send_reply<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    reply: &Reply,
) -> Result<(), DucktrisError> {
    let bytes = match codec.encode(reply) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(
                conn_id = %conn.id(),
                seq = reply.seq,
                error = %e,
                "failed to encode reply"
            );
            codec.encode(&Reply::empty(reply.seq, Status::INTERNAL_ERROR))?
        }
    };
    conn.send(&bytes).await?;
    Ok(())
}

/// Runs one request against the registry and returns the reply status and
/// body.
pub(crate) async fn handle_request(
    registry: &RoomRegistry,
    request: Request,
) -> (Status, Option<Body>) {
    match request {
        Request::CreateRoom {
            dimensions,
            size,
            duck_prob,
        } => {
            let config = RoomConfig::new(dimensions.width, dimensions.height, size, duck_prob);
            let view = registry.create(config).await;
            (Status::CREATED, Some(Body::Room(view)))
        }

        Request::Register {
            game_id,
            screen_name,
        } => {
            let result = async {
                let player_id = registry.get(game_id).await?.add_player(&screen_name).await?;
                Ok::<_, RoomError>(Some(Body::Registered { player_id }))
            };
            outcome(result.await)
        }

        Request::Unregister { game_id, player_id } => {
            let result = async {
                registry.get(game_id).await?.unregister(&player_id).await?;
                Ok::<_, RoomError>(None)
            };
            outcome(result.await)
        }

        Request::ListRooms => (Status::OK, Some(Body::Rooms(registry.list().await))),

        Request::GetParts { game_id, player_id } => {
            let result = async {
                let pieces = registry.get(game_id).await?.next_pieces(&player_id).await?;
                Ok::<_, RoomError>(Some(Body::Pieces(pieces)))
            };
            outcome(result.await)
        }

        Request::ReceivePenalty {
            game_id,
            player_id,
            game_snapshot,
        } => {
            let result = async {
                let room = registry.get(game_id).await?;
                let penalty = room.poll_penalty(&player_id, game_snapshot).await?;
                Ok::<_, RoomError>(Some(Body::Penalty { penalty }))
            };
            outcome(result.await)
        }

        Request::SendLines {
            game_id,
            player_id,
            num_lines,
        } => {
            let result = async {
                registry.get(game_id).await?.send_lines(&player_id, num_lines).await?;
                Ok::<_, RoomError>(None)
            };
            outcome(result.await)
        }

        Request::GetPlayer { game_id, player_id } => {
            let result = async {
                let player = registry.get(game_id).await?.player(&player_id).await?;
                Ok::<_, RoomError>(Some(Body::Player(player)))
            };
            outcome(result.await)
        }

        // An unknown room is not an error here, just an empty answer.
        Request::Status { game_id } => {
            let view = match registry.get(game_id).await {
                Ok(room) => room.view().await.ok(),
                Err(_) => None,
            };
            (Status::OK, view.map(Body::Room))
        }
    }
}

fn outcome(result: Result<Option<Body>, RoomError>) -> (Status, Option<Body>) {
    match result {
        Ok(body) => (Status::OK, body),
        Err(e) => {
            tracing::debug!(error = %e, "request rejected");
            (status_for(&e), None)
        }
    }
}

/// Reply status for a room-layer failure.
pub(crate) fn status_for(err: &RoomError) -> Status {
    match err {
        RoomError::NotFound(_) | RoomError::PlayerNotFound(..) => Status::NOT_FOUND,
        RoomError::Full(_) => Status::NOT_ACCEPTABLE,
    }
}

#[cfg(test)]
mod tests {
    use ducktris_protocol::{Dimensions, RoomId};

    use super::*;

    fn create(size: u32) -> Request {
        Request::CreateRoom {
            dimensions: Dimensions::new(20, 30),
            size,
            duck_prob: 0.1,
        }
    }

    fn register(game_id: u64, name: &str) -> Request {
        Request::Register {
            game_id: RoomId(game_id),
            screen_name: name.into(),
        }
    }

    fn player_id(body: Option<Body>) -> String {
        match body {
            Some(Body::Registered { player_id }) => player_id,
            other => panic!("expected registration body, got {other:?}"),
        }
    }

    #[test]
    fn test_status_for_room_errors() {
        assert_eq!(status_for(&RoomError::NotFound(RoomId(0))), Status::NOT_FOUND);
        assert_eq!(
            status_for(&RoomError::PlayerNotFound("x".into(), RoomId(0))),
            Status::NOT_FOUND
        );
        assert_eq!(status_for(&RoomError::Full(RoomId(0))), Status::NOT_ACCEPTABLE);
    }

    #[tokio::test]
    async fn test_create_returns_201_with_room() {
        let registry = RoomRegistry::default();
        let (status, body) = handle_request(&registry, create(3)).await;
        assert_eq!(status, Status::CREATED);
        match body {
            Some(Body::Room(view)) => {
                assert_eq!(view.game_id, RoomId(0));
                assert_eq!((view.width, view.height, view.size), (20, 30, 3));
                assert!(!view.started);
            }
            other => panic!("expected room body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_dedups_and_rejects_when_full() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;

        let (status, body) = handle_request(&registry, register(0, "peter")).await;
        assert_eq!(status, Status::OK);
        assert_eq!(player_id(body), "peter");

        let (_, body) = handle_request(&registry, register(0, "peter")).await;
        assert_eq!(player_id(body), "peter_");

        let (status, body) = handle_request(&registry, register(0, "peter")).await;
        assert_eq!(status, Status::NOT_ACCEPTABLE);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_unknown_room_is_404() {
        let registry = RoomRegistry::default();
        let requests = [
            register(9, "a"),
            Request::Unregister {
                game_id: RoomId(9),
                player_id: "a".into(),
            },
            Request::GetParts {
                game_id: RoomId(9),
                player_id: "a".into(),
            },
            Request::ReceivePenalty {
                game_id: RoomId(9),
                player_id: "a".into(),
                game_snapshot: String::new(),
            },
            Request::SendLines {
                game_id: RoomId(9),
                player_id: "a".into(),
                num_lines: 1,
            },
        ];
        for request in requests {
            let op = request.op();
            let (status, body) = handle_request(&registry, request).await;
            assert_eq!(status, Status::NOT_FOUND, "op {op}");
            assert!(body.is_none());
        }
    }

    #[tokio::test]
    async fn test_unknown_player_is_404() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;

        let (status, _) = handle_request(
            &registry,
            Request::GetParts {
                game_id: RoomId(0),
                player_id: "ghost".into(),
            },
        )
        .await;
        assert_eq!(status, Status::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sendlines_from_unknown_sender_reaches_everyone() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;
        handle_request(&registry, register(0, "a")).await;

        let (status, body) = handle_request(
            &registry,
            Request::SendLines {
                game_id: RoomId(0),
                player_id: "nobody".into(),
                num_lines: 4,
            },
        )
        .await;
        assert_eq!(status, Status::OK);
        assert!(body.is_none());

        let player = registry
            .get(RoomId(0))
            .await
            .unwrap()
            .player("a")
            .await
            .unwrap();
        assert_eq!(player.penalties.last(), Some(&4));
    }

    #[tokio::test]
    async fn test_receive_returns_penalty() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;
        handle_request(&registry, register(0, "a")).await;

        let (status, body) = handle_request(
            &registry,
            Request::ReceivePenalty {
                game_id: RoomId(0),
                player_id: "a".into(),
                game_snapshot: "board".into(),
            },
        )
        .await;
        assert_eq!(status, Status::OK);
        assert_eq!(body, Some(Body::Penalty { penalty: 0 }));
    }

    #[tokio::test]
    async fn test_getparts_returns_batch() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(1)).await;
        handle_request(&registry, register(0, "solo")).await;

        let (status, body) = handle_request(
            &registry,
            Request::GetParts {
                game_id: RoomId(0),
                player_id: "solo".into(),
            },
        )
        .await;
        assert_eq!(status, Status::OK);
        match body {
            Some(Body::Pieces(pieces)) => {
                assert_eq!(pieces.len(), registry.config().piece_batch_size);
            }
            other => panic!("expected pieces, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_player_query_sees_dead_players() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;
        handle_request(&registry, register(0, "a")).await;
        handle_request(
            &registry,
            Request::Unregister {
                game_id: RoomId(0),
                player_id: "a".into(),
            },
        )
        .await;

        let query = |player_id: &str| Request::GetPlayer {
            game_id: RoomId(0),
            player_id: player_id.into(),
        };
        let (status, body) = handle_request(&registry, query("a")).await;
        assert_eq!(status, Status::OK);
        match body {
            Some(Body::Player(player)) => {
                assert_eq!(player.player_id, "a");
                assert!(!player.alive);
            }
            other => panic!("expected player, got {other:?}"),
        }

        let (status, body) = handle_request(&registry, query("ghost")).await;
        assert_eq!(status, Status::NOT_FOUND);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_status_unknown_room_is_null_body() {
        let registry = RoomRegistry::default();
        let (status, body) =
            handle_request(&registry, Request::Status { game_id: RoomId(4) }).await;
        assert_eq!(status, Status::OK);
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_list_includes_every_room() {
        let registry = RoomRegistry::default();
        handle_request(&registry, create(2)).await;
        handle_request(&registry, create(3)).await;

        let (status, body) = handle_request(&registry, Request::ListRooms).await;
        assert_eq!(status, Status::OK);
        match body {
            Some(Body::Rooms(rooms)) => {
                assert_eq!(rooms.keys().copied().collect::<Vec<_>>(), vec![RoomId(0), RoomId(1)]);
            }
            other => panic!("expected rooms, got {other:?}"),
        }
    }
}
