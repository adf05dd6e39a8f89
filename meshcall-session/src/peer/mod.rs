mod candidate_buffer;
mod link;

pub use candidate_buffer::{BufferDecision, CandidateBuffer};
pub use link::{LinkState, NegotiationRole, PeerLink};
