mod participant;
mod room;
mod signaling;

pub use participant::{Participant, ParticipantId};
pub use room::RoomId;
pub use signaling::{IceCandidateInit, IceServerConfig, SignalMessage, SignalPayload};
