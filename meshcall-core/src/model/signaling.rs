use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// A single trickled reachability candidate, in the shape the platform
/// connection primitive consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidateInit {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

/// Peer-to-peer negotiation payload relayed through the room.
///
/// Offers, answers and candidates carry the sender's generation tag so a
/// receiver can discard leftovers from an earlier negotiation round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalPayload {
    Offer {
        sdp: String,
        generation: u32,
    },
    Answer {
        sdp: String,
        generation: u32,
    },
    /// `None` means end-of-candidates for this round.
    IceCandidate {
        candidate: Option<IceCandidateInit>,
        generation: u32,
    },
}

/// Room-scoped signaling message as carried by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum SignalMessage {
    Join {
        participant: ParticipantId,
        display_name: Option<String>,
    },
    Leave {
        participant: ParticipantId,
    },
    Relay {
        from: ParticipantId,
        to: ParticipantId,
        payload: SignalPayload,
    },
}
