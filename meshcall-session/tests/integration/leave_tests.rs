use crate::utils::{
    TestRelay, init_tracing, join_room, join_solo, settle, wait_for_event,
};
use meshcall_core::ParticipantId;
use meshcall_session::events::SessionEvent;
use meshcall_session::peer::LinkState;
use meshcall_session::signaling::SignalingEvent;

#[tokio::test]
async fn leaving_tears_down_every_link_and_notifies_peers() {
    init_tracing();

    let relay = TestRelay::new();
    let mut a = join_room(&relay, "r1").await;
    let mut b = join_room(&relay, "r1").await;
    let mut c = join_room(&relay, "r1").await;

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
    assert_eq!(a.handle.roster().len(), 3);

    a.handle.leave().await.unwrap();
    wait_for_event(&mut a.events, |e| matches!(e, SessionEvent::Left)).await;

    assert!(a.handle.roster().is_empty());
    assert!(a.transports.state_for(&b.id).unwrap().is_closed());
    assert!(a.transports.state_for(&c.id).unwrap().is_closed());

    // Camera tracks went back to the source.
    let released = a.media.released_ids();
    assert!(released.contains(&"mic".to_string()));
    assert!(released.contains(&"cam".to_string()));

    // The others saw the departure and dropped their side of the link.
    let left = wait_for_event(&mut b.events, |e| {
        matches!(e, SessionEvent::ParticipantLeft(_))
    })
    .await;
    if let SessionEvent::ParticipantLeft(id) = left {
        assert_eq!(id, a.id);
    }
    settle().await;
    assert!(b.handle.link_state(&a.id).is_none());
    assert!(b.transports.state_for(&a.id).unwrap().is_closed());
    assert_eq!(b.handle.roster().len(), 2);
}

#[tokio::test]
async fn leave_is_idempotent() {
    init_tracing();

    let solo = join_solo("r1").await;
    solo.handle.leave().await.unwrap();
    solo.handle.leave().await.unwrap();
    settle().await;

    assert_eq!(solo.signaling.leave_count(), 1);
    assert!(solo.signaling.is_closed());
}

#[tokio::test]
async fn signaling_failure_tears_down_the_session() {
    init_tracing();

    let mut solo = join_solo("r1").await;
    let peer = ParticipantId::new();

    solo.inbound
        .send(SignalingEvent::PeerJoined {
            peer: peer.clone(),
            display_name: None,
        })
        .await
        .unwrap();
    settle().await;

    solo.inbound
        .send(SignalingEvent::Closed {
            reason: "relay shut down".into(),
        })
        .await
        .unwrap();
    wait_for_event(&mut solo.events, |e| {
        matches!(e, SessionEvent::RoomError(_))
    })
    .await;

    assert!(solo.transports.state_for(&peer).unwrap().is_closed());
    assert!(solo.signaling.is_closed());
    assert!(solo.handle.roster().is_empty());
}
