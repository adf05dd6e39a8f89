use async_trait::async_trait;
use meshcall_core::{ParticipantId, RoomId, SignalPayload};
use meshcall_session::error::TransportError;
use meshcall_session::signaling::SignalingChannel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Standalone signaling mock for single-session tests: captures everything
/// the session sends without delivering it anywhere.
#[derive(Clone, Default)]
pub struct MockSignalingChannel {
    sent: Arc<Mutex<Vec<(ParticipantId, SignalPayload)>>>,
    joins: Arc<Mutex<Vec<RoomId>>>,
    leaves: Arc<Mutex<Vec<RoomId>>>,
    closed: Arc<AtomicBool>,
    fail_join: Arc<AtomicBool>,
}

impl MockSignalingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offers_to(&self, peer: &ParticipantId) -> Vec<SignalPayload> {
        self.payloads_to(peer, |p| matches!(p, SignalPayload::Offer { .. }))
    }

    pub fn answers_to(&self, peer: &ParticipantId) -> Vec<SignalPayload> {
        self.payloads_to(peer, |p| matches!(p, SignalPayload::Answer { .. }))
    }

    pub fn candidates_to(&self, peer: &ParticipantId) -> Vec<SignalPayload> {
        self.payloads_to(peer, |p| matches!(p, SignalPayload::IceCandidate { .. }))
    }

    fn payloads_to<F>(&self, peer: &ParticipantId, pred: F) -> Vec<SignalPayload>
    where
        F: Fn(&SignalPayload) -> bool,
    {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, p)| to == peer && pred(p))
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn leave_count(&self) -> usize {
        self.leaves.lock().unwrap().len()
    }

    /// Make the next join announcement fail.
    pub fn fail_next_join(&self) {
        self.fail_join.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalingChannel for MockSignalingChannel {
    async fn announce_join(
        &self,
        room: &RoomId,
        _display_name: Option<String>,
    ) -> Result<(), TransportError> {
        if self.fail_join.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Disconnected("join rejected".into()));
        }
        self.joins.lock().unwrap().push(room.clone());
        Ok(())
    }

    async fn announce_leave(&self, room: &RoomId) -> Result<(), TransportError> {
        self.leaves.lock().unwrap().push(room.clone());
        Ok(())
    }

    async fn send(&self, to: ParticipantId, payload: SignalPayload) -> Result<(), TransportError> {
        tracing::debug!("[mock signaling] send to {to}");
        self.sent.lock().unwrap().push((to, payload));
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
