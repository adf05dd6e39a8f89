use crate::error::{LocalMediaError, NegotiationError, TransportError};
use crate::peer::LinkState;
use crate::transport::RemoteTrack;
use meshcall_core::{Participant, ParticipantId};

/// Observable notifications emitted by a room session. State changes and
/// errors share this one channel, tagged with a peer id where applicable.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ParticipantJoined(Participant),
    ParticipantLeft(ParticipantId),
    LinkStateChanged {
        peer: ParticipantId,
        state: LinkState,
    },
    RemoteTrackAdded {
        peer: ParticipantId,
        track: RemoteTrack,
    },
    /// Connectivity was lost for longer than the grace timeout. Non-fatal;
    /// the room continues for the other peers.
    PeerDropped {
        peer: ParticipantId,
    },
    /// Negotiation or a track rebind failed for this peer. Negotiation
    /// failures close the link; rebind failures leave it up.
    PeerError {
        peer: ParticipantId,
        error: NegotiationError,
    },
    /// Local capture failed; the session continues receive-only.
    MediaError(LocalMediaError),
    ScreenShareStarted,
    ScreenShareStopped,
    /// The signaling channel died. The whole session has been torn down and
    /// the caller must rejoin.
    RoomError(TransportError),
    Left,
}
