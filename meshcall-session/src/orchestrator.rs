use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::media::{LocalMediaState, LocalTracks, MediaSource};
use crate::peer::LinkState;
use crate::room::{RoomSession, RoomView, SessionCommand};
use crate::signaling::{SignalingChannel, SignalingEvent};
use crate::transport::TransportFactory;
use meshcall_core::{Participant, ParticipantId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Entry point used by the surrounding application. Holds the collaborator
/// factories; `join` wires them into a spawned room session.
pub struct Orchestrator {
    transports: Arc<dyn TransportFactory>,
    media: Arc<dyn MediaSource>,
}

impl Orchestrator {
    pub fn new(transports: Arc<dyn TransportFactory>, media: Arc<dyn MediaSource>) -> Self {
        Self { transports, media }
    }

    /// Join a room: request local media, announce presence, start the
    /// session loop. Local capture failure is not fatal; the call proceeds
    /// receive-only and a `MediaError` event reports why.
    pub async fn join(
        &self,
        config: SessionConfig,
        local_id: ParticipantId,
        signaling: Arc<dyn SignalingChannel>,
        signaling_rx: mpsc::Receiver<SignalingEvent>,
    ) -> Result<CallHandle, SessionError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let tracks = match self.media.acquire(config.media).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("local capture failed, continuing receive-only: {e}");
                let _ = events_tx.send(SessionEvent::MediaError(e));
                LocalTracks::default()
            }
        };

        if let Err(e) = signaling
            .announce_join(&config.room_id, config.display_name.clone())
            .await
        {
            // The capture has no other owner yet; hand it back before
            // surfacing the error.
            if !tracks.is_empty() {
                self.media.release(tracks).await;
            }
            return Err(e.into());
        }
        info!("joined room {} as {local_id}", config.room_id);

        let view = Arc::new(RoomView::new());
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let session = RoomSession::new(
            config,
            local_id.clone(),
            signaling,
            self.media.clone(),
            self.transports.clone(),
            LocalMediaState::new(tracks),
            view.clone(),
            events_tx,
            cmd_rx,
            signaling_rx,
        );
        tokio::spawn(session.run());

        Ok(CallHandle {
            local_id,
            cmd_tx,
            events_rx: Some(events_rx),
            view,
        })
    }
}

/// Handle to one active call. Dropping it leaves the room.
pub struct CallHandle {
    local_id: ParticipantId,
    cmd_tx: mpsc::Sender<SessionCommand>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    view: Arc<RoomView>,
}

impl CallHandle {
    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    /// Take the session event stream. Yields `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events_rx.take()
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetAudioEnabled(enabled)).await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetVideoEnabled(enabled)).await
    }

    pub async fn start_screen_share(&self) -> Result<(), SessionError> {
        let (done, ack) = oneshot::channel();
        self.send(SessionCommand::StartScreenShare { done }).await?;
        ack.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn stop_screen_share(&self) -> Result<(), SessionError> {
        let (done, ack) = oneshot::channel();
        self.send(SessionCommand::StopScreenShare { done }).await?;
        ack.await.map_err(|_| SessionError::Closed)?
    }

    /// Leave the room. Idempotent: once the session is gone, further calls
    /// are no-ops.
    pub async fn leave(&self) -> Result<(), SessionError> {
        let (done, ack) = oneshot::channel();
        if self
            .cmd_tx
            .send(SessionCommand::Leave { done })
            .await
            .is_err()
        {
            return Ok(());
        }
        let _ = ack.await;
        Ok(())
    }

    pub fn roster(&self) -> Vec<Participant> {
        self.view.roster()
    }

    pub fn link_state(&self, peer: &ParticipantId) -> Option<LinkState> {
        self.view.link_state(peer)
    }

    pub fn link_states(&self) -> Vec<(ParticipantId, LinkState)> {
        self.view.link_states()
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
