use crate::error::NegotiationError;
use crate::media::{OutgoingTrack, TrackKind};
use crate::transport::config::TransportConfig;
use crate::transport::event::{ConnectivityState, RemoteTrack, TransportEvent};
use crate::transport::peer_transport::{PeerTransport, ReplaceOutcome, SdpKind, TransportFactory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use meshcall_core::{IceCandidateInit, ParticipantId};
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// An outgoing track backed by the `webrtc` crate. The enabled flag gates
/// the application's sample writer; the sender itself stays attached.
pub struct WebrtcOutgoingTrack {
    inner: Arc<dyn TrackLocal + Send + Sync>,
    kind: TrackKind,
    enabled: AtomicBool,
}

impl WebrtcOutgoingTrack {
    pub fn new(inner: Arc<dyn TrackLocal + Send + Sync>, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            inner,
            kind,
            enabled: AtomicBool::new(true),
        })
    }

    pub fn inner(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.inner.clone()
    }
}

impl OutgoingTrack for WebrtcOutgoingTrack {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn native_track(
    track: &Arc<dyn OutgoingTrack>,
) -> Result<Arc<dyn TrackLocal + Send + Sync>, NegotiationError> {
    track
        .as_any()
        .downcast_ref::<WebrtcOutgoingTrack>()
        .map(|t| t.inner())
        .ok_or_else(|| {
            NegotiationError::Track("track was not produced by the webrtc media source".into())
        })
}

fn map_connectivity(state: RTCPeerConnectionState) -> ConnectivityState {
    match state {
        RTCPeerConnectionState::Connecting => ConnectivityState::Connecting,
        RTCPeerConnectionState::Connected => ConnectivityState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectivityState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectivityState::Failed,
        RTCPeerConnectionState::Closed => ConnectivityState::Closed,
        _ => ConnectivityState::New,
    }
}

/// One peer link's connection, adapted over the platform engine. Callbacks
/// feed the session loop through the shared transport event channel.
pub struct WebrtcTransport {
    peer_id: ParticipantId,
    pc: Arc<RTCPeerConnection>,
}

impl WebrtcTransport {
    pub async fn connect(
        peer_id: ParticipantId,
        config: TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media)?;

        let api = APIBuilder::new()
            .with_media_engine(media)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = config
            .ice_servers
            .into_iter()
            .map(|s| RTCIceServer {
                urls: s.urls,
                username: s.username.unwrap_or_default(),
                credential: s.credential.unwrap_or_default(),
            })
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("failed to create peer connection")?,
        );

        // Connectivity changes drive the grace-timeout logic in the session.
        let state_tx = event_tx.clone();
        let state_peer = peer_id.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            let peer = state_peer.clone();

            Box::pin(async move {
                info!("connection state for {peer}: {s}");
                let _ = tx
                    .send(TransportEvent::ConnectivityChanged(peer, map_connectivity(s)))
                    .await;
            })
        }));

        // Trickle ICE: locally gathered candidates go out through signaling.
        let ice_tx = event_tx.clone();
        let ice_peer = peer_id.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let peer = ice_peer.clone();

            Box::pin(async move {
                let init = match c {
                    Some(candidate) => {
                        let Ok(json) = candidate.to_json() else {
                            return;
                        };
                        Some(IceCandidateInit {
                            candidate: json.candidate,
                            sdp_mid: json.sdp_mid,
                            sdp_mline_index: json.sdp_mline_index,
                        })
                    }
                    None => None,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(peer, init))
                    .await;
            })
        }));

        let track_tx = event_tx.clone();
        let track_peer = peer_id.clone();
        pc.on_track(Box::new(move |track: Arc<TrackRemote>, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let peer = track_peer.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                debug!("remote {kind:?} track from {peer}");
                let _ = tx
                    .send(TransportEvent::TrackReceived(
                        peer,
                        RemoteTrack {
                            id: track.id(),
                            kind,
                        },
                    ))
                    .await;
            })
        }));

        Ok(Self { peer_id, pc })
    }
}

#[async_trait]
impl PeerTransport for WebrtcTransport {
    async fn create_offer(&self) -> Result<String, NegotiationError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::OfferCreation(e.to_string()))?;
        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::OfferCreation(e.to_string()))?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, NegotiationError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::AnswerCreation(e.to_string()))?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(|e| NegotiationError::AnswerCreation(e.to_string()))?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: &str,
    ) -> Result<(), NegotiationError> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp.to_string()),
            SdpKind::Answer => RTCSessionDescription::answer(sdp.to_string()),
        }
        .map_err(|e| NegotiationError::RemoteDescription(e.to_string()))?;

        self.pc
            .set_remote_description(desc)
            .await
            .map_err(|e| NegotiationError::RemoteDescription(e.to_string()))
    }

    async fn rollback_local_offer(&self) -> Result<(), NegotiationError> {
        let mut desc = RTCSessionDescription::default();
        desc.sdp_type = RTCSdpType::Rollback;
        self.pc
            .set_local_description(desc)
            .await
            .map_err(|e| NegotiationError::Rollback(e.to_string()))
    }

    async fn add_ice_candidate(
        &self,
        candidate: Option<IceCandidateInit>,
    ) -> Result<(), NegotiationError> {
        // The engine needs no explicit end-of-candidates marker.
        let Some(c) = candidate else {
            debug!("end of candidates from {}", self.peer_id);
            return Ok(());
        };

        let init = RTCIceCandidateInit {
            candidate: c.candidate,
            sdp_mid: c.sdp_mid,
            sdp_mline_index: c.sdp_mline_index,
            username_fragment: None,
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| NegotiationError::Candidate(e.to_string()))
    }

    async fn add_track(&self, track: Arc<dyn OutgoingTrack>) -> Result<(), NegotiationError> {
        let native = native_track(&track)?;
        self.pc
            .add_track(native)
            .await
            .map_err(|e| NegotiationError::Track(e.to_string()))?;
        Ok(())
    }

    async fn replace_video_track(
        &self,
        track: Arc<dyn OutgoingTrack>,
    ) -> Result<ReplaceOutcome, NegotiationError> {
        let native = native_track(&track)?;

        for sender in self.pc.get_senders().await {
            let Some(current) = sender.track().await else {
                continue;
            };
            if current.kind() == RTPCodecType::Video {
                sender
                    .replace_track(Some(native))
                    .await
                    .map_err(|e| NegotiationError::Track(e.to_string()))?;
                return Ok(ReplaceOutcome::Replaced);
            }
        }

        // No live video sender to swap; a new m-line has to be negotiated.
        Ok(ReplaceOutcome::RenegotiationRequired)
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            debug!("closing connection for {}: {e}", self.peer_id);
        }
    }
}

/// Production factory handed to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct WebrtcTransportFactory {
    config: TransportConfig,
}

impl WebrtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for WebrtcTransportFactory {
    async fn create(
        &self,
        peer: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, NegotiationError> {
        let transport = WebrtcTransport::connect(peer, self.config.clone(), events)
            .await
            .map_err(|e| NegotiationError::Setup(e.to_string()))?;
        Ok(Box::new(transport))
    }
}
