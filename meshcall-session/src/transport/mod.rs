mod config;
mod event;
mod peer_transport;
mod webrtc;

pub use config::TransportConfig;
pub use event::{ConnectivityState, RemoteTrack, TransportEvent};
pub use peer_transport::{PeerTransport, ReplaceOutcome, SdpKind, TransportFactory};
pub use webrtc::{WebrtcOutgoingTrack, WebrtcTransport, WebrtcTransportFactory};
