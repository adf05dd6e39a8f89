use crate::error::NegotiationError;
use crate::media::OutgoingTrack;
use crate::peer::candidate_buffer::{BufferDecision, CandidateBuffer};
use crate::transport::{ConnectivityState, PeerTransport, ReplaceOutcome, SdpKind};
use meshcall_core::{IceCandidateInit, ParticipantId, SignalPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Who started the current offer/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Negotiating(NegotiationRole),
    Connected,
    Renegotiating(NegotiationRole),
    Closed,
}

impl LinkState {
    /// States in which the link participates in media and signaling.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Negotiating(_) | Self::Connected | Self::Renegotiating(_)
        )
    }

    fn pending_local_offer(self) -> bool {
        matches!(
            self,
            Self::Negotiating(NegotiationRole::Initiator)
                | Self::Renegotiating(NegotiationRole::Initiator)
        )
    }
}

/// The state machine and resource holder for one remote participant.
///
/// Every mutation happens on the session event loop; the link itself holds
/// no locks. Outbound signaling payloads are returned to the caller rather
/// than sent here, which keeps the machine independent of the relay.
pub struct PeerLink {
    local_id: ParticipantId,
    peer_id: ParticipantId,
    state: LinkState,
    /// Bumped whenever negotiation restarts; messages tagged with an older
    /// round are discarded.
    generation: u32,
    transport: Box<dyn PeerTransport>,
    candidates: CandidateBuffer,
    connectivity: ConnectivityState,
    /// Bumped on every fresh transition into a lost connectivity state, so
    /// a grace timer left over from an earlier loss cannot fire against a
    /// later one.
    loss_epoch: u32,
}

impl PeerLink {
    pub fn new(
        local_id: ParticipantId,
        peer_id: ParticipantId,
        transport: Box<dyn PeerTransport>,
    ) -> Self {
        Self {
            local_id,
            peer_id,
            state: LinkState::Idle,
            generation: 0,
            transport,
            candidates: CandidateBuffer::new(),
            connectivity: ConnectivityState::New,
            loss_epoch: 0,
        }
    }

    pub fn peer_id(&self) -> &ParticipantId {
        &self.peer_id
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.connectivity
    }

    pub fn set_connectivity(&mut self, state: ConnectivityState) {
        self.connectivity = state;
    }

    pub fn loss_epoch(&self) -> u32 {
        self.loss_epoch
    }

    /// Record a transition into a lost connectivity state. Returns the new
    /// loss epoch when a fresh grace window should open, or `None` while a
    /// window for the current loss is already running.
    pub fn note_connectivity_lost(&mut self, state: ConnectivityState) -> Option<u32> {
        let was_lost = self.connectivity.is_lost();
        self.connectivity = state;
        if was_lost {
            return None;
        }
        self.loss_epoch += 1;
        Some(self.loss_epoch)
    }

    /// The polite side yields during glare; decided once per pair by id
    /// order.
    fn is_polite(&self) -> bool {
        self.local_id.is_polite_toward(&self.peer_id)
    }

    pub async fn attach_tracks(
        &self,
        tracks: &[Arc<dyn OutgoingTrack>],
    ) -> Result<(), NegotiationError> {
        for track in tracks {
            self.transport.add_track(track.clone()).await?;
        }
        Ok(())
    }

    /// Initiator path for a newly joined participant.
    pub async fn start_offer(&mut self) -> Result<SignalPayload, NegotiationError> {
        let sdp = self.transport.create_offer().await?;
        self.state = LinkState::Negotiating(NegotiationRole::Initiator);
        Ok(SignalPayload::Offer {
            sdp,
            generation: self.generation,
        })
    }

    /// Handle a remote offer. Returns the answer to send, or `None` when
    /// the offer was discarded (stale, closed, or lost the glare toss).
    pub async fn handle_offer(
        &mut self,
        sdp: &str,
        generation: u32,
    ) -> Result<Option<SignalPayload>, NegotiationError> {
        if self.state == LinkState::Closed {
            debug!("offer for closed link {} dropped", self.peer_id);
            return Ok(None);
        }
        if generation < self.generation {
            debug!(
                "stale offer from {} (gen {generation} < {})",
                self.peer_id, self.generation
            );
            return Ok(None);
        }

        match self.state {
            LinkState::Idle => {
                let answer = self.respond(sdp, generation, false).await?;
                Ok(Some(answer))
            }
            s if s.pending_local_offer() => {
                if self.is_polite() {
                    // Glare: yield our pending offer and take the remote
                    // round instead. Buffered candidates belong to the
                    // round we are adopting, so they survive.
                    info!("glare with {}: polite side rolling back", self.peer_id);
                    self.transport.rollback_local_offer().await?;
                    let renegotiating = matches!(self.state, LinkState::Renegotiating(_));
                    let answer = self.respond(sdp, generation, renegotiating).await?;
                    Ok(Some(answer))
                } else {
                    debug!(
                        "glare with {}: impolite side ignoring incoming offer",
                        self.peer_id
                    );
                    Ok(None)
                }
            }
            LinkState::Connected => {
                // Remote-initiated renegotiation must open a new round.
                if generation == self.generation {
                    debug!("repeat offer from {} for current round", self.peer_id);
                    return Ok(None);
                }
                self.candidates.reset();
                let answer = self.respond(sdp, generation, true).await?;
                Ok(Some(answer))
            }
            _ => {
                debug!(
                    "offer from {} ignored in state {:?}",
                    self.peer_id, self.state
                );
                Ok(None)
            }
        }
    }

    async fn respond(
        &mut self,
        sdp: &str,
        generation: u32,
        renegotiating: bool,
    ) -> Result<SignalPayload, NegotiationError> {
        self.generation = generation;
        self.state = if renegotiating {
            LinkState::Renegotiating(NegotiationRole::Responder)
        } else {
            LinkState::Negotiating(NegotiationRole::Responder)
        };

        self.transport
            .set_remote_description(SdpKind::Offer, sdp)
            .await?;
        let queued = self.candidates.mark_remote_description_set();
        self.apply_candidates(queued).await;

        let answer = self.transport.create_answer().await?;
        self.state = LinkState::Connected;
        Ok(SignalPayload::Answer {
            sdp: answer,
            generation: self.generation,
        })
    }

    /// Handle a remote answer to our pending offer. Returns true if the
    /// link reached `Connected`.
    pub async fn handle_answer(
        &mut self,
        sdp: &str,
        generation: u32,
    ) -> Result<bool, NegotiationError> {
        if !self.state.pending_local_offer() || generation != self.generation {
            debug!(
                "stale answer from {} (gen {generation}, state {:?})",
                self.peer_id, self.state
            );
            return Ok(false);
        }

        self.transport
            .set_remote_description(SdpKind::Answer, sdp)
            .await?;
        let queued = self.candidates.mark_remote_description_set();
        self.apply_candidates(queued).await;

        self.state = LinkState::Connected;
        Ok(true)
    }

    pub async fn handle_candidate(&mut self, candidate: Option<IceCandidateInit>, generation: u32) {
        if self.state == LinkState::Closed {
            return;
        }
        if generation != self.generation {
            debug!(
                "stale candidate from {} (gen {generation} != {})",
                self.peer_id, self.generation
            );
            return;
        }

        match self.candidates.accept(candidate) {
            BufferDecision::Buffered => {}
            BufferDecision::ApplyNow(c) => {
                if let Err(e) = self.transport.add_ice_candidate(c).await {
                    warn!("dropping bad candidate from {}: {e}", self.peer_id);
                }
            }
        }
    }

    /// Apply a drained batch in arrival order. One bad candidate must not
    /// block the rest.
    async fn apply_candidates(&self, batch: Vec<Option<IceCandidateInit>>) {
        for candidate in batch {
            if let Err(e) = self.transport.add_ice_candidate(candidate).await {
                warn!("dropping bad candidate from {}: {e}", self.peer_id);
            }
        }
    }

    /// Swap the outgoing video sender payload in place. No state change;
    /// the caller starts a renegotiation round if the transport asks for
    /// one.
    pub async fn swap_video(
        &self,
        track: Arc<dyn OutgoingTrack>,
    ) -> Result<ReplaceOutcome, NegotiationError> {
        if !self.state.is_active() {
            return Err(NegotiationError::TransportClosed);
        }
        self.transport.replace_video_track(track).await
    }

    /// Open a fresh round after a topology change: bump the generation so
    /// leftovers from the previous round are discarded, and offer again.
    pub async fn begin_renegotiation(&mut self) -> Result<SignalPayload, NegotiationError> {
        self.generation += 1;
        self.candidates.reset();
        let sdp = self.transport.create_offer().await?;
        self.state = LinkState::Renegotiating(NegotiationRole::Initiator);
        Ok(SignalPayload::Offer {
            sdp,
            generation: self.generation,
        })
    }

    /// ICE reports media flowing; make sure the machine agrees.
    pub fn confirm_connected(&mut self) -> bool {
        self.connectivity = ConnectivityState::Connected;
        if matches!(
            self.state,
            LinkState::Negotiating(_) | LinkState::Renegotiating(_)
        ) {
            self.state = LinkState::Connected;
            return true;
        }
        false
    }

    /// Terminal. Releases the connection and clears the candidate buffer.
    pub async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.transport.close().await;
        self.candidates.reset();
        self.state = LinkState::Closed;
    }
}
