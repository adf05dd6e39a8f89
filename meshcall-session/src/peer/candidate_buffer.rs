use meshcall_core::IceCandidateInit;
use std::collections::VecDeque;

/// What to do with a candidate handed to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferDecision {
    /// Remote description not set yet; the candidate was queued.
    Buffered,
    /// Buffering is closed; apply this candidate right away.
    ApplyNow(Option<IceCandidateInit>),
}

/// Holds reachability candidates that arrive before the peer's remote
/// description is set. Once the description lands, the queue drains in FIFO
/// order and the buffer stays closed until the next negotiation round.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: VecDeque<Option<IceCandidateInit>>,
    remote_set: bool,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, candidate: Option<IceCandidateInit>) -> BufferDecision {
        if self.remote_set {
            BufferDecision::ApplyNow(candidate)
        } else {
            self.pending.push_back(candidate);
            BufferDecision::Buffered
        }
    }

    /// Flip the flag and hand back everything queued, oldest first. The
    /// buffer is closed afterwards; later candidates apply immediately.
    pub fn mark_remote_description_set(&mut self) -> Vec<Option<IceCandidateInit>> {
        self.remote_set = true;
        self.pending.drain(..).collect()
    }

    /// Clear and reopen for a new negotiation round.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.remote_set = false;
    }

    pub fn is_open(&self) -> bool {
        !self.remote_set
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
