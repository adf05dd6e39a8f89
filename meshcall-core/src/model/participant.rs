use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque participant identity assigned by the signaling layer.
///
/// The `Ord` impl compares the canonical string form; the lexicographically
/// smaller id takes the polite role when two peers offer simultaneously.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// True if this side must yield during offer glare against `other`.
    pub fn is_polite_toward(&self, other: &ParticipantId) -> bool {
        self.0.to_string() < other.0.to_string()
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One member of a room, as tracked by the roster.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    /// Position in join order, used for deterministic labeling.
    pub join_order: usize,
}

impl Participant {
    pub fn new(id: ParticipantId, display_name: impl Into<String>, join_order: usize) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            join_order,
        }
    }
}
