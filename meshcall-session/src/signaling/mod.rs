use crate::error::TransportError;
use async_trait::async_trait;
use meshcall_core::{ParticipantId, RoomId, SignalPayload};

/// Outbound half of the signaling relay. The transport itself (WebSocket,
/// message bus, in-process test relay) lives outside this crate; the room
/// session only ever talks through this trait.
///
/// Delivery between any two fixed participants is assumed reliable and
/// ordered by the implementation.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Announce presence to the room.
    async fn announce_join(
        &self,
        room: &RoomId,
        display_name: Option<String>,
    ) -> Result<(), TransportError>;

    /// Tell the room this participant is leaving.
    async fn announce_leave(&self, room: &RoomId) -> Result<(), TransportError>;

    /// Relay a negotiation payload to one peer.
    async fn send(&self, to: ParticipantId, payload: SignalPayload) -> Result<(), TransportError>;

    /// Tear down the underlying connection. Called last during leave.
    async fn close(&self);
}

/// Inbound signaling events, fed into the session loop by the channel
/// implementation.
#[derive(Debug, Clone)]
pub enum SignalingEvent {
    PeerJoined {
        peer: ParticipantId,
        display_name: Option<String>,
    },
    PeerLeft {
        peer: ParticipantId,
    },
    Payload {
        from: ParticipantId,
        payload: SignalPayload,
    },
    /// The channel died. Fatal to the room session.
    Closed {
        reason: String,
    },
}
