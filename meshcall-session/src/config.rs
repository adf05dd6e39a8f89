use crate::media::MediaConstraints;
use meshcall_core::{IceServerConfig, RoomId};
use std::time::Duration;

pub const DEFAULT_DISCONNECT_GRACE: Duration = Duration::from_secs(10);

/// Caller-supplied inputs for one room session. No CLI or environment
/// parsing happens here; the embedding application decides where these come
/// from.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room_id: RoomId,
    pub signaling_endpoint: String,
    pub ice_servers: Vec<IceServerConfig>,
    pub display_name: Option<String>,
    /// How long lost connectivity may persist before the peer is dropped.
    pub disconnect_grace: Duration,
    pub media: MediaConstraints,
}

impl SessionConfig {
    pub fn new(room_id: impl Into<RoomId>, signaling_endpoint: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            signaling_endpoint: signaling_endpoint.into(),
            ice_servers: vec![IceServerConfig::stun("stun:stun.l.google.com:19302")],
            display_name: None,
            disconnect_grace: DEFAULT_DISCONNECT_GRACE,
            media: MediaConstraints {
                audio: true,
                video: true,
            },
        }
    }
}
