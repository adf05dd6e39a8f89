use crate::error::NegotiationError;
use crate::media::OutgoingTrack;
use crate::transport::event::TransportEvent;
use async_trait::async_trait;
use meshcall_core::{IceCandidateInit, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Result of an in-place video sender swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The sender payload was swapped; no SDP exchange needed.
    Replaced,
    /// The track-count or topology changed; a new offer/answer round is
    /// required.
    RenegotiationRequired,
}

/// The platform connection primitive (WebRTC-equivalent) behind one peer
/// link. `create_offer`/`create_answer` also apply the local description.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<String, NegotiationError>;

    async fn create_answer(&self) -> Result<String, NegotiationError>;

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: &str,
    ) -> Result<(), NegotiationError>;

    /// Discard a pending local offer (polite side of glare).
    async fn rollback_local_offer(&self) -> Result<(), NegotiationError>;

    /// `None` is the end-of-candidates marker.
    async fn add_ice_candidate(
        &self,
        candidate: Option<IceCandidateInit>,
    ) -> Result<(), NegotiationError>;

    async fn add_track(&self, track: Arc<dyn OutgoingTrack>) -> Result<(), NegotiationError>;

    async fn replace_video_track(
        &self,
        track: Arc<dyn OutgoingTrack>,
    ) -> Result<ReplaceOutcome, NegotiationError>;

    async fn close(&self);
}

/// Builds one transport per remote peer, wired to push its events into the
/// session loop.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        peer: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, NegotiationError>;
}
