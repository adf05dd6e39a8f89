use crate::error::SessionError;
use tokio::sync::oneshot;

/// Local actions entering the session loop from the façade. Everything that
/// mutates room state goes through here, so the loop stays the single
/// writer.
#[derive(Debug)]
pub enum SessionCommand {
    SetAudioEnabled(bool),
    SetVideoEnabled(bool),
    StartScreenShare {
        done: oneshot::Sender<Result<(), SessionError>>,
    },
    StopScreenShare {
        done: oneshot::Sender<Result<(), SessionError>>,
    },
    Leave {
        done: oneshot::Sender<()>,
    },
}
