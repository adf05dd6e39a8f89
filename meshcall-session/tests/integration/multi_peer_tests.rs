use crate::utils::{TestRelay, init_tracing, join_room, join_room_with_grace, settle, wait_for_event};
use meshcall_session::events::SessionEvent;
use meshcall_session::peer::LinkState;
use meshcall_session::transport::ConnectivityState;
use std::time::Duration;

#[tokio::test]
async fn three_peers_form_a_full_mesh() {
    init_tracing();

    let relay = TestRelay::new();
    let mut a = join_room(&relay, "r1").await;
    let mut b = join_room(&relay, "r1").await;
    let mut c = join_room(&relay, "r1").await;

    // Everyone already present offers to each newcomer, so a connects
    // twice, b once plus one inbound, c only inbound.
    for _ in 0..2 {
        wait_for_event(&mut a.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    for _ in 0..2 {
        wait_for_event(&mut b.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    for _ in 0..2 {
        wait_for_event(&mut c.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    settle().await;

    for peer in [&a, &b, &c] {
        assert_eq!(peer.handle.roster().len(), 3);
    }
    for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
        assert_eq!(x.handle.link_state(&y.id), Some(LinkState::Connected));
        assert_eq!(y.handle.link_state(&x.id), Some(LinkState::Connected));
    }
}

#[tokio::test]
async fn lost_connectivity_drops_the_peer_after_the_grace_window() {
    init_tracing();

    let relay = TestRelay::new();
    let mut a = join_room_with_grace(&relay, "r1", Duration::from_millis(50)).await;
    let mut b = join_room(&relay, "r1").await;
    let mut c = join_room(&relay, "r1").await;
    for peer in [&mut a, &mut b, &mut c] {
        wait_for_event(&mut peer.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    settle().await;

    a.transports
        .state_for(&b.id)
        .unwrap()
        .emit_connectivity(ConnectivityState::Failed)
        .await;

    let dropped = wait_for_event(&mut a.events, |e| {
        matches!(e, SessionEvent::PeerDropped { .. })
    })
    .await;
    if let SessionEvent::PeerDropped { peer } = dropped {
        assert_eq!(peer, b.id);
    }
    settle().await;

    assert!(a.handle.link_state(&b.id).is_none());
    assert_eq!(a.handle.roster().len(), 2);
    assert!(a.transports.state_for(&b.id).unwrap().is_closed());

    // The healthy link is untouched.
    assert_eq!(a.handle.link_state(&c.id), Some(LinkState::Connected));
    assert!(!a.transports.state_for(&c.id).unwrap().is_closed());
}

#[tokio::test]
async fn connectivity_flap_gets_a_fresh_grace_window() {
    init_tracing();

    let relay = TestRelay::new();
    let mut a = join_room_with_grace(&relay, "r1", Duration::from_millis(200)).await;
    let mut b = join_room(&relay, "r1").await;
    for peer in [&mut a, &mut b] {
        wait_for_event(&mut peer.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    settle().await;

    // Lose, recover, lose again before the first window expires.
    let link = a.transports.state_for(&b.id).unwrap();
    link.emit_connectivity(ConnectivityState::Disconnected).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    link.emit_connectivity(ConnectivityState::Connected).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    link.emit_connectivity(ConnectivityState::Disconnected).await;

    // The first loss's timer expires around now; it must not count
    // against the second loss.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(a.handle.link_state(&b.id), Some(LinkState::Connected));

    // The second loss still runs its own full window to completion.
    let dropped = wait_for_event(&mut a.events, |e| {
        matches!(e, SessionEvent::PeerDropped { .. })
    })
    .await;
    if let SessionEvent::PeerDropped { peer } = dropped {
        assert_eq!(peer, b.id);
    }
}

#[tokio::test]
async fn recovered_connectivity_cancels_the_pending_drop() {
    init_tracing();

    let relay = TestRelay::new();
    let mut a = join_room_with_grace(&relay, "r1", Duration::from_millis(50)).await;
    let mut b = join_room(&relay, "r1").await;
    for peer in [&mut a, &mut b] {
        wait_for_event(&mut peer.events, |e| {
            matches!(
                e,
                SessionEvent::LinkStateChanged {
                    state: LinkState::Connected,
                    ..
                }
            )
        })
        .await;
    }
    settle().await;

    let link = a.transports.state_for(&b.id).unwrap();
    link.emit_connectivity(ConnectivityState::Disconnected).await;
    settle().await;
    link.emit_connectivity(ConnectivityState::Connected).await;

    // Outlive the grace window; the drop must not fire.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(a.handle.link_state(&b.id), Some(LinkState::Connected));
    assert!(!link.is_closed());
}
