pub mod model;

pub use model::{
    IceCandidateInit, IceServerConfig, Participant, ParticipantId, RoomId, SignalMessage,
    SignalPayload,
};
