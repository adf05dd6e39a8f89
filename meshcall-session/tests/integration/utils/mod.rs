mod mock_signaling;

pub use mock_media::{MockMediaSource, TestTrack};
pub use mock_signaling::MockSignalingChannel;
pub use mock_transport::{MockTransportFactory, MockTransportState};
pub use relay::TestRelay;

use meshcall_core::ParticipantId;
use meshcall_session::events::SessionEvent;
use meshcall_session::signaling::SignalingEvent;
use meshcall_session::{CallHandle, Orchestrator, SessionConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One simulated participant: a real session wired to mock collaborators
/// through the shared test relay.
pub struct TestPeer {
    pub id: ParticipantId,
    pub handle: CallHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub transports: MockTransportFactory,
    pub media: Arc<MockMediaSource>,
}

pub async fn join_room(relay: &TestRelay, room: &str) -> TestPeer {
    join_room_with_grace(relay, room, Duration::from_secs(10)).await
}

pub async fn join_room_with_grace(relay: &TestRelay, room: &str, grace: Duration) -> TestPeer {
    let id = ParticipantId::new();
    let transports = MockTransportFactory::new();
    let media = Arc::new(MockMediaSource::new());

    let (channel, signaling_rx) = relay.endpoint(&id);
    let orchestrator = Orchestrator::new(Arc::new(transports.clone()), media.clone());

    let mut config = SessionConfig::new(room, "mock://relay");
    config.disconnect_grace = grace;

    let mut handle = orchestrator
        .join(config, id.clone(), channel, signaling_rx)
        .await
        .expect("join failed");
    let events = handle.take_events().expect("events already taken");

    TestPeer {
        id,
        handle,
        events,
        transports,
        media,
    }
}

/// A session with a capture-only signaling mock and a raw inbound event
/// sender, for tests that script the signaling side by hand.
pub struct SoloPeer {
    pub id: ParticipantId,
    pub handle: CallHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub transports: MockTransportFactory,
    pub media: Arc<MockMediaSource>,
    pub signaling: MockSignalingChannel,
    pub inbound: mpsc::Sender<SignalingEvent>,
}

pub async fn join_solo(room: &str) -> SoloPeer {
    join_solo_opts(room, false).await
}

pub async fn join_solo_opts(room: &str, fail_media: bool) -> SoloPeer {
    let id = ParticipantId::new();
    let transports = MockTransportFactory::new();
    let media = Arc::new(MockMediaSource::new());
    if fail_media {
        media.fail_next_acquire();
    }
    let signaling = MockSignalingChannel::new();
    let (inbound, signaling_rx) = mpsc::channel(64);

    let orchestrator = Orchestrator::new(Arc::new(transports.clone()), media.clone());
    let mut handle = orchestrator
        .join(
            SessionConfig::new(room, "mock://solo"),
            id.clone(),
            Arc::new(signaling.clone()),
            signaling_rx,
        )
        .await
        .expect("join failed");
    let events = handle.take_events().expect("events already taken");

    SoloPeer {
        id,
        handle,
        events,
        transports,
        media,
        signaling,
        inbound,
    }
}

/// Pump the event stream until `pred` matches or the timeout hits.
pub async fn wait_for_event<F>(
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    pred: F,
) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = rx.recv().await.expect("event stream ended");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

/// Let in-flight loop iterations land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
