//! Peer connection orchestration for full-mesh audio/video rooms.
//!
//! For each remote participant the session drives an offer/answer/ICE
//! negotiation to a connected state, buffers early candidates, resolves
//! simultaneous-offer glare, swaps the outgoing video source mid-call, and
//! tears links down on departure or failure. Everything is serialized
//! through one event loop per room. Signaling transport, media capture and
//! the connection primitive stay behind traits supplied by the caller.

pub mod config;
pub mod error;
pub mod events;
pub mod media;
pub mod orchestrator;
pub mod peer;
pub mod room;
pub mod signaling;
pub mod transport;

pub use config::SessionConfig;
pub use error::{LocalMediaError, NegotiationError, SessionError, TransportError};
pub use events::SessionEvent;
pub use media::{
    LocalTracks, MediaConstraints, MediaSource, OutgoingTrack, ScreenCapture, TrackKind,
};
pub use orchestrator::{CallHandle, Orchestrator};
pub use peer::{LinkState, NegotiationRole};
pub use room::RoomView;
pub use signaling::{SignalingChannel, SignalingEvent};
pub use transport::{
    ConnectivityState, PeerTransport, RemoteTrack, ReplaceOutcome, SdpKind, TransportConfig,
    TransportEvent, TransportFactory, WebrtcTransportFactory,
};
