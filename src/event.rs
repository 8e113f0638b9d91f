use crate::executor::{ExecuteError, ExecutionOutput};
use crate::lab::LabKind;

/// Events flowing from async workers back to the UI thread. Each execution
/// outcome arrives as a single event, so its log lines land in the session
/// as one batch.
#[derive(Debug, Clone)]
pub enum AppEvent {
    AuthStatus {
        authenticated: bool,
    },
    AuthProbeFailed(String),
    ExecutionFinished {
        kind: LabKind,
        outcome: Result<ExecutionOutput, ExecuteError>,
    },
}
