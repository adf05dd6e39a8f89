use thiserror::Error;

/// Local capture/permission failure. Recoverable: the room continues in
/// receive-only mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocalMediaError {
    #[error("media capture permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    NoDevice,

    #[error("media capture failed: {0}")]
    Capture(String),
}

/// Negotiation failure scoped to a single peer link. Closes that link only;
/// the rest of the room is unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("transport setup failed: {0}")]
    Setup(String),

    #[error("failed to create offer: {0}")]
    OfferCreation(String),

    #[error("failed to create answer: {0}")]
    AnswerCreation(String),

    #[error("failed to apply remote description: {0}")]
    RemoteDescription(String),

    #[error("failed to roll back local description: {0}")]
    Rollback(String),

    #[error("failed to add ICE candidate: {0}")]
    Candidate(String),

    #[error("track operation failed: {0}")]
    Track(String),

    #[error("peer transport is closed")]
    TransportClosed,
}

/// Signaling channel failure. Fatal to the whole room session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("signaling channel disconnected: {0}")]
    Disconnected(String),

    #[error("signaling send failed: {0}")]
    SendFailed(String),
}

/// Umbrella error returned by the façade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] LocalMediaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("room session is no longer running")]
    Closed,
}
