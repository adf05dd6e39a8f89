use crate::config::SessionConfig;
use crate::error::{NegotiationError, TransportError};
use crate::events::SessionEvent;
use crate::media::{LocalMediaState, MediaSource, OutgoingTrack};
use crate::peer::PeerLink;
use crate::room::command::SessionCommand;
use crate::room::roster::Roster;
use crate::room::view::RoomView;
use crate::signaling::{SignalingChannel, SignalingEvent};
use crate::transport::{ConnectivityState, ReplaceOutcome, TransportEvent, TransportFactory};
use futures::future::join_all;
use meshcall_core::{ParticipantId, SignalPayload};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// One room's single-writer event loop. Every state transition for every
/// peer link runs here, so the link map, roster and local media never see
/// interleaved mutation. Transport callbacks and grace timers re-enter
/// through the transport event channel.
pub struct RoomSession {
    config: SessionConfig,
    local_id: ParticipantId,
    signaling: Arc<dyn SignalingChannel>,
    media_source: Arc<dyn MediaSource>,
    transports: Arc<dyn TransportFactory>,
    links: HashMap<ParticipantId, PeerLink>,
    /// Peers whose link was created from an early offer; their trailing
    /// join notification is a duplicate, not a rejoin.
    offer_first: HashSet<ParticipantId>,
    roster: Roster,
    media: LocalMediaState,
    view: Arc<RoomView>,
    events: mpsc::UnboundedSender<SessionEvent>,
    command_rx: mpsc::Receiver<SessionCommand>,
    signaling_rx: mpsc::Receiver<SignalingEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    left: bool,
}

impl RoomSession {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: SessionConfig,
        local_id: ParticipantId,
        signaling: Arc<dyn SignalingChannel>,
        media_source: Arc<dyn MediaSource>,
        transports: Arc<dyn TransportFactory>,
        media: LocalMediaState,
        view: Arc<RoomView>,
        events: mpsc::UnboundedSender<SessionEvent>,
        command_rx: mpsc::Receiver<SessionCommand>,
        signaling_rx: mpsc::Receiver<SignalingEvent>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let roster = Roster::new(local_id.clone(), config.display_name.clone());
        view.set_roster(roster.snapshot());

        Self {
            config,
            local_id,
            signaling,
            media_source,
            transports,
            links: HashMap::new(),
            offer_first: HashSet::new(),
            roster,
            media,
            view,
            events,
            command_rx,
            signaling_rx,
            transport_rx,
            transport_tx,
            left: false,
        }
    }

    pub async fn run(mut self) {
        info!("session loop started for room {}", self.config.room_id);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd).await {
                                break;
                            }
                        }
                        None => {
                            info!("call handle dropped; leaving room");
                            self.leave_room().await;
                            break;
                        }
                    }
                }

                sig = self.signaling_rx.recv() => {
                    match sig {
                        Some(ev) => {
                            if self.handle_signaling(ev).await {
                                break;
                            }
                        }
                        None => {
                            warn!("signaling event stream ended unexpectedly");
                            self.fatal(TransportError::Disconnected(
                                "event stream ended".into(),
                            ))
                            .await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    let Some(ev) = evt else { break };
                    self.handle_transport(ev).await;
                }
            }
        }

        info!("session loop finished for room {}", self.config.room_id);
    }

    // ---- local commands ------------------------------------------------

    /// Returns true when the loop should shut down.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::SetAudioEnabled(enabled) => {
                self.media.set_audio_enabled(enabled);
            }

            SessionCommand::SetVideoEnabled(enabled) => {
                self.media.set_video_enabled(enabled);
            }

            SessionCommand::StartScreenShare { done } => {
                if self.media.is_screen_sharing() {
                    let _ = done.send(Ok(()));
                    return false;
                }
                match self.media_source.acquire_screen().await {
                    Ok(capture) => {
                        self.media.begin_screen_share(capture.track.clone());
                        self.watch_screen_capture(capture.track.id().to_string(), capture.ended);
                        self.swap_video_everywhere(capture.track).await;
                        self.emit(SessionEvent::ScreenShareStarted);
                        let _ = done.send(Ok(()));
                    }
                    Err(e) => {
                        warn!("screen capture failed: {e}");
                        self.emit(SessionEvent::MediaError(e.clone()));
                        let _ = done.send(Err(e.into()));
                    }
                }
            }

            SessionCommand::StopScreenShare { done } => {
                if !self.media.is_screen_sharing() {
                    let _ = done.send(Ok(()));
                    return false;
                }
                self.stop_screen_share().await;
                let _ = done.send(Ok(()));
            }

            SessionCommand::Leave { done } => {
                self.leave_room().await;
                let _ = done.send(());
                return true;
            }
        }
        false
    }

    /// Swap the outgoing video sender on every active link concurrently,
    /// then open renegotiation rounds where the transport asked for one.
    /// Per-peer failures are reported and do not abort the rest.
    async fn swap_video_everywhere(&mut self, track: Arc<dyn OutgoingTrack>) {
        let results = join_all(
            self.links
                .iter()
                .filter(|(_, link)| link.state().is_active())
                .map(|(peer, link)| {
                    let track = track.clone();
                    async move { (peer.clone(), link.swap_video(track).await) }
                }),
        )
        .await;

        for (peer, result) in results {
            match result {
                Ok(ReplaceOutcome::Replaced) => {}
                Ok(ReplaceOutcome::RenegotiationRequired) => {
                    self.renegotiate(&peer).await;
                }
                Err(e) => {
                    warn!("video rebind failed for {peer}: {e}");
                    self.emit(SessionEvent::PeerError { peer, error: e });
                }
            }
        }
    }

    /// Restore the camera feed: same path whether the user stopped the
    /// share or the capture ended on its own.
    async fn stop_screen_share(&mut self) {
        let screen = self.media.end_screen_share();
        // Restore the exact camera track that was sending before the share
        // started.
        if let Some(camera) = self.media.current_video() {
            self.swap_video_everywhere(camera).await;
        }
        if let Some(screen) = screen {
            self.media_source.release_track(screen).await;
        }
        self.emit(SessionEvent::ScreenShareStopped);
    }

    /// The capture ending outside the session re-enters the loop as a
    /// transport event. A dropped sender (normal release) fires nothing.
    fn watch_screen_capture(&self, track_id: String, ended: oneshot::Receiver<()>) {
        let tx = self.transport_tx.clone();
        tokio::spawn(async move {
            if ended.await.is_ok() {
                let _ = tx.send(TransportEvent::ScreenShareEnded { track_id }).await;
            }
        });
    }

    async fn renegotiate(&mut self, peer: &ParticipantId) {
        let Some(link) = self.links.get_mut(peer) else {
            return;
        };
        match link.begin_renegotiation().await {
            Ok(offer) => {
                self.send_to(peer, offer).await;
                self.publish_link_state(peer);
            }
            Err(e) => self.fail_link(peer, e).await,
        }
    }

    // ---- inbound signaling ---------------------------------------------

    /// Returns true when the loop should shut down.
    async fn handle_signaling(&mut self, event: SignalingEvent) -> bool {
        match event {
            SignalingEvent::PeerJoined { peer, display_name } => {
                if peer != self.local_id {
                    self.on_peer_joined(peer, display_name).await;
                }
            }

            SignalingEvent::PeerLeft { peer } => {
                info!("peer {peer} left the room");
                self.close_and_remove(&peer).await;
            }

            SignalingEvent::Payload { from, payload } => {
                self.on_payload(from, payload).await;
            }

            SignalingEvent::Closed { reason } => {
                error!("signaling channel closed: {reason}");
                self.fatal(TransportError::Disconnected(reason)).await;
                return true;
            }
        }
        false
    }

    async fn on_peer_joined(&mut self, peer: ParticipantId, display_name: Option<String>) {
        if self.offer_first.remove(&peer) {
            debug!("join notification for {peer} after its offer; already linked");
            return;
        }
        // A reused id replaces the prior link, never merges with it.
        if self.links.contains_key(&peer) {
            info!("peer {peer} rejoined; replacing existing link");
            self.close_and_remove(&peer).await;
        }

        let participant = self.roster.add(peer.clone(), display_name);
        self.view.set_roster(self.roster.snapshot());
        self.emit(SessionEvent::ParticipantJoined(participant));

        if let Err(e) = self.create_link(peer.clone()).await {
            self.fail_link(&peer, e).await;
            return;
        }

        let offered = match self.links.get_mut(&peer) {
            Some(link) => link.start_offer().await,
            None => return,
        };
        match offered {
            Ok(offer) => {
                self.send_to(&peer, offer).await;
                self.publish_link_state(&peer);
            }
            Err(e) => self.fail_link(&peer, e).await,
        }
    }

    async fn on_payload(&mut self, from: ParticipantId, payload: SignalPayload) {
        match payload {
            SignalPayload::Offer { sdp, generation } => {
                if !self.links.contains_key(&from) {
                    // Join-notification/offer race: the offer can beat the
                    // join broadcast, so create the link lazily.
                    debug!("offer from unknown peer {from}; creating link");
                    if !self.roster.contains(&from) {
                        let participant = self.roster.add(from.clone(), None);
                        self.view.set_roster(self.roster.snapshot());
                        self.emit(SessionEvent::ParticipantJoined(participant));
                    }
                    if let Err(e) = self.create_link(from.clone()).await {
                        self.fail_link(&from, e).await;
                        return;
                    }
                    self.offer_first.insert(from.clone());
                }

                let handled = match self.links.get_mut(&from) {
                    Some(link) => link.handle_offer(&sdp, generation).await,
                    None => return,
                };
                match handled {
                    Ok(Some(answer)) => {
                        self.send_to(&from, answer).await;
                        self.publish_link_state(&from);
                    }
                    Ok(None) => {}
                    Err(e) => self.fail_link(&from, e).await,
                }
            }

            SignalPayload::Answer { sdp, generation } => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("answer from unknown peer {from} dropped");
                    return;
                };
                match link.handle_answer(&sdp, generation).await {
                    Ok(true) => self.publish_link_state(&from),
                    Ok(false) => {}
                    Err(e) => self.fail_link(&from, e).await,
                }
            }

            SignalPayload::IceCandidate {
                candidate,
                generation,
            } => {
                let Some(link) = self.links.get_mut(&from) else {
                    debug!("candidate from unknown peer {from} dropped");
                    return;
                };
                link.handle_candidate(candidate, generation).await;
            }
        }
    }

    // ---- transport events ----------------------------------------------

    async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(peer, candidate) => {
                let Some(link) = self.links.get(&peer) else {
                    return;
                };
                let generation = link.generation();
                self.send_to(
                    &peer,
                    SignalPayload::IceCandidate {
                        candidate,
                        generation,
                    },
                )
                .await;
            }

            TransportEvent::ConnectivityChanged(peer, state) => {
                let Some(link) = self.links.get_mut(&peer) else {
                    return;
                };
                if state == ConnectivityState::Connected {
                    if link.confirm_connected() {
                        self.publish_link_state(&peer);
                    }
                } else if state.is_lost() {
                    // A fresh loss opens one grace window; repeats while
                    // already lost leave the running timer in charge.
                    if let Some(epoch) = link.note_connectivity_lost(state) {
                        let grace = self.config.disconnect_grace;
                        let tx = self.transport_tx.clone();
                        let timed_peer = peer.clone();
                        info!("connectivity lost for {peer}; grace timer {grace:?} started");
                        tokio::spawn(async move {
                            tokio::time::sleep(grace).await;
                            let _ = tx
                                .send(TransportEvent::GraceElapsed {
                                    peer: timed_peer,
                                    epoch,
                                })
                                .await;
                        });
                    }
                } else {
                    link.set_connectivity(state);
                }
            }

            TransportEvent::GraceElapsed { peer, epoch } => {
                let Some(link) = self.links.get(&peer) else {
                    return;
                };
                // Only the timer for the current loss is authoritative, and
                // only if connectivity never came back.
                if link.loss_epoch() != epoch || !link.connectivity().is_lost() {
                    debug!("grace timer for {peer} superseded");
                    return;
                }
                warn!("peer {peer} dropped after connectivity grace timeout");
                self.close_and_remove(&peer).await;
                self.emit(SessionEvent::PeerDropped { peer });
            }

            TransportEvent::TrackReceived(peer, track) => {
                self.emit(SessionEvent::RemoteTrackAdded { peer, track });
            }

            TransportEvent::ScreenShareEnded { track_id } => {
                let active = self.media.is_screen_sharing()
                    && self
                        .media
                        .current_video()
                        .is_some_and(|t| t.id() == track_id);
                if !active {
                    debug!("ended signal for a screen capture that is no longer active");
                    return;
                }
                info!("screen capture ended externally; restoring camera feed");
                self.stop_screen_share().await;
            }
        }
    }

    // ---- link lifecycle ------------------------------------------------

    async fn create_link(&mut self, peer: ParticipantId) -> Result<(), NegotiationError> {
        let transport = self
            .transports
            .create(peer.clone(), self.transport_tx.clone())
            .await?;
        let link = PeerLink::new(self.local_id.clone(), peer.clone(), transport);
        link.attach_tracks(&self.media.outgoing_tracks()).await?;
        self.view.set_link(peer.clone(), link.state());
        self.links.insert(peer, link);
        Ok(())
    }

    /// Close one link and forget the participant. Other links are never
    /// touched.
    async fn close_and_remove(&mut self, peer: &ParticipantId) {
        if let Some(mut link) = self.links.remove(peer) {
            link.close().await;
        }
        self.offer_first.remove(peer);
        self.view.remove_link(peer);
        if self.roster.remove(peer).is_some() {
            self.view.set_roster(self.roster.snapshot());
            self.emit(SessionEvent::ParticipantLeft(peer.clone()));
        }
    }

    async fn fail_link(&mut self, peer: &ParticipantId, error: NegotiationError) {
        error!("negotiation with {peer} failed: {error}");
        self.close_and_remove(peer).await;
        self.emit(SessionEvent::PeerError {
            peer: peer.clone(),
            error,
        });
    }

    fn publish_link_state(&self, peer: &ParticipantId) {
        let Some(link) = self.links.get(peer) else {
            return;
        };
        let state = link.state();
        if self.view.link_state(peer) != Some(state) {
            self.view.set_link(peer.clone(), state);
            self.emit(SessionEvent::LinkStateChanged {
                peer: peer.clone(),
                state,
            });
        }
    }

    // ---- teardown ------------------------------------------------------

    /// Leave order: notify peers, close every link, release local media,
    /// disconnect signaling. Safe to call more than once.
    async fn leave_room(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        info!("leaving room {}", self.config.room_id);

        if let Err(e) = self.signaling.announce_leave(&self.config.room_id).await {
            warn!("leave announcement failed: {e}");
        }
        self.teardown().await;
        self.signaling.close().await;
        self.emit(SessionEvent::Left);
    }

    /// Signaling died: tear everything down and surface one room-level
    /// error. The caller must rejoin.
    async fn fatal(&mut self, error: TransportError) {
        if self.left {
            return;
        }
        self.left = true;
        self.teardown().await;
        self.signaling.close().await;
        self.emit(SessionEvent::RoomError(error));
    }

    async fn teardown(&mut self) {
        let peers: Vec<ParticipantId> = self.links.keys().cloned().collect();
        for peer in peers {
            if let Some(mut link) = self.links.remove(&peer) {
                link.close().await;
            }
        }

        let (tracks, screen) = self.media.take_all();
        if let Some(screen) = screen {
            self.media_source.release_track(screen).await;
        }
        if !tracks.is_empty() {
            self.media_source.release(tracks).await;
        }

        self.roster.clear_remote();
        self.view.clear();
    }

    async fn send_to(&self, peer: &ParticipantId, payload: SignalPayload) {
        if let Err(e) = self.signaling.send(peer.clone(), payload).await {
            warn!("signaling send to {peer} failed: {e}");
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
