use crate::peer::LinkState;
use dashmap::DashMap;
use meshcall_core::{Participant, ParticipantId};
use std::sync::Mutex;

/// Read-only snapshot of room state, shared with observers outside the
/// session loop. The loop is the only writer.
#[derive(Debug, Default)]
pub struct RoomView {
    roster: Mutex<Vec<Participant>>,
    links: DashMap<ParticipantId, LinkState>,
}

impl RoomView {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_roster(&self, roster: Vec<Participant>) {
        *self.roster.lock().unwrap() = roster;
    }

    pub(crate) fn set_link(&self, peer: ParticipantId, state: LinkState) {
        self.links.insert(peer, state);
    }

    pub(crate) fn remove_link(&self, peer: &ParticipantId) {
        self.links.remove(peer);
    }

    pub(crate) fn clear(&self) {
        self.roster.lock().unwrap().clear();
        self.links.clear();
    }

    pub fn roster(&self) -> Vec<Participant> {
        self.roster.lock().unwrap().clone()
    }

    pub fn link_state(&self, peer: &ParticipantId) -> Option<LinkState> {
        self.links.get(peer).map(|s| *s)
    }

    pub fn link_states(&self) -> Vec<(ParticipantId, LinkState)> {
        self.links
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}
