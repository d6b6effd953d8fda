//! Integration tests for the room system: manager, actors, and delivery.

use std::time::Duration;

use gridsync_core::{GameView, Mark, Notification, Outcome, Phase, Request, Seat};
use gridsync_protocol::{PlayerId, RoomId, RoomListEntry};
use gridsync_room::{PlayerSender, RoomConfig, RoomError, RoomManager, RoomOutbound};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

/// A sender whose receiver is dropped immediately.
fn dummy_sender() -> PlayerSender {
    mpsc::unbounded_channel().0
}

fn drain(rx: &mut mpsc::UnboundedReceiver<RoomOutbound>) -> Vec<RoomOutbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Gives room actors time to work through queued fire-and-forget requests.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Feeds everything a participant received into its replica.
fn apply_all(view: &mut GameView, received: Vec<RoomOutbound>) {
    for msg in received {
        match msg {
            RoomOutbound::Snapshot(snapshot) => view.apply_snapshot(snapshot),
            RoomOutbound::Notification(n) => view.apply(&n).unwrap(),
            RoomOutbound::Abandoned { .. } => view.abandon(),
            RoomOutbound::Rejected(_) => {}
        }
    }
}

/// Seats two players in a fresh room and returns their receivers.
async fn paired_room(
    mgr: &mut RoomManager,
) -> (
    RoomId,
    mpsc::UnboundedReceiver<RoomOutbound>,
    mpsc::UnboundedReceiver<RoomOutbound>,
) {
    let room = mgr.create_room();
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    mgr.join_room(pid(1), room, a_tx).await.unwrap();
    mgr.join_room(pid(2), room, b_tx).await.unwrap();
    (room, a_rx, b_rx)
}

async fn play(mgr: &RoomManager, moves: &[(u64, usize, usize)]) {
    for &(player, x, y) in moves {
        mgr.route_request(pid(player), Request::SubmitMove { x, y })
            .await
            .unwrap();
    }
    settle().await;
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_unique_ids() {
    let mut mgr = RoomManager::default();
    let r1 = mgr.create_room();
    let r2 = mgr.create_room();
    assert_ne!(r1, r2);
    assert_eq!(mgr.room_count(), 2);

    let ids = mgr.room_ids();
    assert!(ids.contains(&r1) && ids.contains(&r2));
}

#[tokio::test]
async fn test_join_room_assigns_seats_in_join_order() {
    let mut mgr = RoomManager::default();
    let room = mgr.create_room();

    let first = mgr.join_room(pid(9), room, dummy_sender()).await.unwrap();
    let second = mgr.join_room(pid(4), room, dummy_sender()).await.unwrap();

    assert_eq!(first, Seat::Player(Mark::A));
    assert_eq!(second, Seat::Player(Mark::B));
    assert_eq!(mgr.player_room(pid(9)), Some(room));
}

#[tokio::test]
async fn test_join_room_not_found() {
    let mut mgr = RoomManager::default();
    let result = mgr.join_room(pid(1), RoomId(999_999), dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_join_room_one_room_at_a_time() {
    let mut mgr = RoomManager::default();
    let r1 = mgr.create_room();
    let r2 = mgr.create_room();

    mgr.join_room(pid(1), r1, dummy_sender()).await.unwrap();
    let again = mgr.join_room(pid(1), r1, dummy_sender()).await;
    let other = mgr.join_room(pid(1), r2, dummy_sender()).await;

    assert!(matches!(again, Err(RoomError::AlreadyInRoom(_, _))));
    assert!(matches!(other, Err(RoomError::InvalidState(_))));
}

#[tokio::test]
async fn test_game_starts_when_second_player_joins() {
    let mut mgr = RoomManager::default();
    let room = mgr.create_room();

    mgr.join_room(pid(1), room, dummy_sender()).await.unwrap();
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.phase, Phase::WaitingForPlayers);
    assert!(info.joinable);

    mgr.join_room(pid(2), room, dummy_sender()).await.unwrap();
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.phase, Phase::InProgress);
    assert_eq!(info.player_count, 2);
    assert!(!info.joinable);
}

#[tokio::test]
async fn test_join_or_create_pairs_players() {
    let mut mgr = RoomManager::default();

    let (r1, s1) = mgr.join_or_create(pid(1), dummy_sender()).await.unwrap();
    let (r2, s2) = mgr.join_or_create(pid(2), dummy_sender()).await.unwrap();
    let (r3, s3) = mgr.join_or_create(pid(3), dummy_sender()).await.unwrap();

    assert_eq!(r1, r2);
    assert_ne!(r1, r3);
    assert_eq!(s1, Seat::Player(Mark::A));
    assert_eq!(s2, Seat::Player(Mark::B));
    assert_eq!(s3, Seat::Player(Mark::A));
    assert_eq!(mgr.room_count(), 2);
}

#[tokio::test]
async fn test_join_or_create_twice_is_refused() {
    let mut mgr = RoomManager::default();
    mgr.join_or_create(pid(1), dummy_sender()).await.unwrap();
    let result = mgr.join_or_create(pid(1), dummy_sender()).await;
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(_, _))));
}

#[tokio::test]
async fn test_leave_last_player_destroys_room() {
    let mut mgr = RoomManager::default();
    let room = mgr.create_room();
    mgr.join_room(pid(1), room, dummy_sender()).await.unwrap();

    assert_eq!(mgr.leave_room(pid(1)).await.unwrap(), room);

    assert_eq!(mgr.player_room(pid(1)), None);
    assert_eq!(mgr.room_count(), 0);
}

#[tokio::test]
async fn test_leave_room_not_in_any_room() {
    let mut mgr = RoomManager::default();
    let result = mgr.leave_room(pid(1)).await;
    assert!(matches!(result, Err(RoomError::NoRoom(_))));
}

#[tokio::test]
async fn test_destroy_room_forgets_players() {
    let mut mgr = RoomManager::default();
    let room = mgr.create_room();
    mgr.join_room(pid(1), room, dummy_sender()).await.unwrap();

    mgr.destroy_room(room).await.unwrap();

    assert_eq!(mgr.room_count(), 0);
    assert_eq!(mgr.player_room(pid(1)), None);
    assert!(mgr.destroy_room(room).await.is_err());
}

#[tokio::test]
async fn test_list_rooms_reports_phase_and_seats() {
    let mut mgr = RoomManager::default();
    let waiting = mgr.create_room();
    mgr.join_room(pid(1), waiting, dummy_sender()).await.unwrap();
    let (running, _a, _b) = {
        let room = mgr.create_room();
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        mgr.join_room(pid(2), room, a_tx).await.unwrap();
        mgr.join_room(pid(3), room, b_tx).await.unwrap();
        (room, a_rx, b_rx)
    };

    let entries: Vec<RoomListEntry> =
        mgr.list_rooms().await.into_iter().map(Into::into).collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].room_id, waiting);
    assert!(entries[0].joinable);
    assert_eq!(entries[0].player_count, 1);
    assert_eq!(entries[1].room_id, running);
    assert_eq!(entries[1].phase, Phase::InProgress);
    assert!(!entries[1].joinable);
}

// =========================================================================
// Session play through the room
// =========================================================================

#[tokio::test]
async fn test_column_win_reaches_every_participant_in_order() {
    let mut mgr = RoomManager::default();
    let (room, mut a_rx, mut b_rx) = paired_room(&mut mgr).await;
    let mut listener = mgr.subscribe(room).await.unwrap();

    play(&mgr, &[(1, 0, 0), (2, 1, 1), (1, 0, 1), (2, 2, 2), (1, 0, 2)]).await;

    let a = drain(&mut a_rx);
    let b = drain(&mut b_rx);
    let l = drain(&mut listener);

    // Snapshot + GameStarted + 5 moves + GameWon + ScoreChanged.
    assert_eq!(a.len(), 9);
    assert_eq!(a[1..], b[1..]);
    assert_eq!(
        a[a.len() - 2..],
        [
            RoomOutbound::Notification(Notification::GameWon {
                line_index: 3,
                winner: Mark::A
            }),
            RoomOutbound::Notification(Notification::ScoreChanged {
                score_a: 1,
                score_b: 0
            }),
        ]
    );
    // The listener subscribed after the start, so it begins with a snapshot
    // and then sees the same moves.
    assert!(matches!(l[0], RoomOutbound::Snapshot(_)));
    assert_eq!(l[1..], a[2..]);
}

#[tokio::test]
async fn test_replicas_match_after_tie() {
    let mut mgr = RoomManager::default();
    let (room, mut a_rx, mut b_rx) = paired_room(&mut mgr).await;

    play(
        &mgr,
        &[
            (1, 0, 0),
            (2, 1, 0),
            (1, 2, 0),
            (2, 1, 1),
            (1, 0, 1),
            (2, 2, 1),
            (1, 1, 2),
            (2, 0, 2),
            (1, 2, 2),
        ],
    )
    .await;

    let mut view_a = GameView::new(Seat::Player(Mark::A));
    let mut view_b = GameView::new(Seat::Player(Mark::B));
    apply_all(&mut view_a, drain(&mut a_rx));
    apply_all(&mut view_b, drain(&mut b_rx));

    assert_eq!(view_a.phase(), Phase::Terminal(Outcome::Tied));
    assert_eq!(view_a.board(), view_b.board());
    assert_eq!(view_a.current_player(), None);
    assert_eq!(view_b.scores(), (0, 0));

    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.phase, Phase::Terminal(Outcome::Tied));
}

#[tokio::test]
async fn test_wrong_turn_is_rejected_privately() {
    let mut mgr = RoomManager::default();
    let (_room, mut a_rx, mut b_rx) = paired_room(&mut mgr).await;
    drain(&mut a_rx);
    drain(&mut b_rx);

    play(&mgr, &[(2, 0, 0)]).await;

    assert!(drain(&mut a_rx).is_empty());
    assert!(matches!(drain(&mut b_rx)[..], [RoomOutbound::Rejected(_)]));
}

#[tokio::test]
async fn test_rematch_after_win_keeps_scores() {
    let mut mgr = RoomManager::default();
    let (_room, mut a_rx, _b_rx) = paired_room(&mut mgr).await;

    // B wins row 2.
    play(&mgr, &[(1, 0, 0), (2, 0, 2), (1, 1, 0), (2, 1, 2), (1, 2, 1), (2, 2, 2)]).await;
    mgr.route_request(pid(2), Request::RequestRematch).await.unwrap();
    play(&mgr, &[(1, 1, 1)]).await;

    let mut view = GameView::new(Seat::Player(Mark::A));
    apply_all(&mut view, drain(&mut a_rx));

    assert_eq!(view.scores(), (0, 1));
    assert_eq!(view.phase(), Phase::InProgress);
    assert_eq!(view.current_player(), Some(Mark::B));
    assert_eq!(view.board().marked_count(), 1);
}

#[tokio::test]
async fn test_player_leaving_mid_game_abandons_session() {
    let mut mgr = RoomManager::default();
    let (room, _a_rx, mut b_rx) = paired_room(&mut mgr).await;
    play(&mgr, &[(1, 1, 1)]).await;
    drain(&mut b_rx);

    mgr.leave_room(pid(1)).await.unwrap();

    assert_eq!(
        drain(&mut b_rx),
        vec![RoomOutbound::Abandoned { player_id: pid(1) }]
    );
    let info = mgr.get_room_info(room).await.unwrap();
    assert_eq!(info.phase, Phase::Abandoned);
    assert!(!info.joinable);

    // Once the other player leaves too, the room is gone.
    mgr.leave_room(pid(2)).await.unwrap();
    assert_eq!(mgr.room_count(), 0);
}

#[tokio::test]
async fn test_spectators_receive_broadcasts() {
    let mut mgr = RoomManager::new(RoomConfig {
        allow_spectators: true,
        max_spectators: 1,
        ..RoomConfig::default()
    });
    let (room, _a_rx, _b_rx) = paired_room(&mut mgr).await;
    play(&mgr, &[(1, 2, 2)]).await;

    let (s_tx, mut s_rx) = mpsc::unbounded_channel();
    let seat = mgr.join_room(pid(3), room, s_tx).await.unwrap();
    assert_eq!(seat, Seat::Spectator);

    let extra = mgr.join_room(pid(4), room, dummy_sender()).await;
    assert!(matches!(extra, Err(RoomError::RoomFull(_))));

    play(&mgr, &[(2, 0, 0)]).await;

    let mut view = GameView::new(seat);
    apply_all(&mut view, drain(&mut s_rx));
    assert_eq!(view.board().marked_count(), 2);
    assert_eq!(view.current_player(), Some(Mark::A));
    assert_eq!(view.local_player(), None);
}

#[tokio::test]
async fn test_route_request_not_in_room() {
    let mgr = RoomManager::default();
    let result = mgr.route_request(pid(1), Request::RequestRematch).await;
    assert!(matches!(result, Err(RoomError::NoRoom(_))));
}

#[tokio::test]
async fn test_rooms_are_independent() {
    let mut mgr = RoomManager::default();
    let (r1, _a1, _b1) = paired_room(&mut mgr).await;
    let r2 = mgr.create_room();
    mgr.join_room(pid(3), r2, dummy_sender()).await.unwrap();
    mgr.join_room(pid(4), r2, dummy_sender()).await.unwrap();

    play(&mgr, &[(1, 0, 0), (3, 2, 2)]).await;

    let i1 = mgr.get_room_info(r1).await.unwrap();
    let i2 = mgr.get_room_info(r2).await.unwrap();
    assert_eq!(i1.phase, Phase::InProgress);
    assert_eq!(i2.phase, Phase::InProgress);
    let mut l1 = mgr.subscribe(r1).await.unwrap();
    let mut l2 = mgr.subscribe(r2).await.unwrap();
    let RoomOutbound::Snapshot(s1) = l1.recv().await.unwrap() else {
        panic!("expected snapshot");
    };
    let RoomOutbound::Snapshot(s2) = l2.recv().await.unwrap() else {
        panic!("expected snapshot");
    };
    assert_eq!(s1.board().marked_count(), 1);
    assert_eq!(s2.board().marked_count(), 1);
    assert_eq!(s1.current_player(), Some(Mark::B));
    assert_ne!(s1.board(), s2.board());
}
