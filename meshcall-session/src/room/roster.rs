use meshcall_core::{Participant, ParticipantId};

/// Ordered participant list for display. The local participant is always
/// first; remote peers are labeled by join order when the signaling layer
/// carries no display name.
#[derive(Debug)]
pub struct Roster {
    entries: Vec<Participant>,
    joined_total: usize,
}

impl Roster {
    pub fn new(local: ParticipantId, display_name: Option<String>) -> Self {
        let me = Participant::new(local, display_name.unwrap_or_else(|| "You".into()), 0);
        Self {
            entries: vec![me],
            joined_total: 0,
        }
    }

    pub fn add(&mut self, id: ParticipantId, display_name: Option<String>) -> Participant {
        self.joined_total += 1;
        let name = display_name.unwrap_or_else(|| format!("User {}", self.joined_total));
        let participant = Participant::new(id, name, self.joined_total);
        self.entries.push(participant.clone());
        participant
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let idx = self.entries.iter().position(|p| &p.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.iter().any(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Participant> {
        self.entries.clone()
    }

    /// Drop everyone but the local participant.
    pub fn clear_remote(&mut self) {
        self.entries.truncate(1);
    }
}
