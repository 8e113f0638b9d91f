use crate::artifact;
use crate::executor::{ExecuteError, ExecutionOutput};
use crate::lab::LabKind;
use std::collections::BTreeMap;

pub const CRITICAL_ERROR_LINE: &str =
    "!!! CRITICAL_ERROR: Failed to establish handshake with remote execution kernel.";

fn init_line(kind: LabKind) -> String {
    format!(
        ">>> [INIT] Initializing target environment: {}...",
        kind.language_id().to_uppercase()
    )
}

fn detail_line(error: &ExecuteError) -> String {
    let status = error
        .status()
        .map(|code| format!(" [Status: {code}]"))
        .unwrap_or_default();
    format!("!!! DETAIL: {}{status}", error.detail_message())
}

/// Per-workspace execution session: the single-flight guard, the ordered
/// console log, the decoded artifact, and the two panel toggles. All
/// transitions are synchronous functions on this struct; the UI only routes
/// events into them.
#[derive(Debug, Clone)]
pub struct LabSession {
    pub in_flight: bool,
    pub logs: Vec<String>,
    pub artifact: Option<Vec<u8>>,
    pub console_open: bool,
    pub artifact_panel_open: bool,
}

impl Default for LabSession {
    fn default() -> Self {
        Self {
            in_flight: false,
            logs: Vec::new(),
            artifact: None,
            console_open: true,
            artifact_panel_open: false,
        }
    }
}

impl LabSession {
    /// Accepts or rejects a submission trigger. Returns false without any
    /// state change while a request is already outstanding; overlapping
    /// triggers collapse into this guard instead of queueing. On acceptance
    /// the in-flight flag is raised and the submission marker is appended.
    pub fn begin_submission(&mut self, kind: LabKind) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.logs.push(init_line(kind));
        true
    }

    /// Applies the outcome of the outstanding request as one atomic batch.
    ///
    /// Success appends the response's log lines in order (prior output is
    /// retained) and, when a decodable artifact is present, stores its
    /// bytes and forces the artifact panel open. A payload that fails
    /// base64 decoding keeps the textual logs, appends one warning line,
    /// and leaves the panel alone. Failure appends exactly the critical
    /// marker plus one detail line. Every path lowers the in-flight flag.
    pub fn apply_outcome(&mut self, outcome: Result<ExecutionOutput, ExecuteError>) {
        match outcome {
            Ok(output) => {
                self.logs
                    .extend(output.logs.split('\n').map(str::to_string));
                if let Some(encoded) = output.vcd_base64 {
                    match artifact::decode(&encoded) {
                        Ok(bytes) => {
                            self.artifact = Some(bytes);
                            self.artifact_panel_open = true;
                        }
                        Err(err) => {
                            self.logs
                                .push(format!("!!! ARTIFACT: waveform payload discarded ({err})"));
                        }
                    }
                }
            }
            Err(err) => {
                self.logs.push(CRITICAL_ERROR_LINE.to_string());
                self.logs.push(detail_line(&err));
            }
        }
        self.in_flight = false;
    }

    pub fn toggle_console(&mut self) {
        self.console_open = !self.console_open;
    }

    pub fn toggle_artifact_panel(&mut self) {
        self.artifact_panel_open = !self.artifact_panel_open;
    }
}

/// Sessions keyed by workspace identity. Each open workspace holds its own
/// session and in-flight guard; sessions never share mutable state, so
/// executions for different kinds may overlap freely.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<LabKind, LabSession>,
}

impl SessionRegistry {
    /// Opens the session for `kind`, resetting it to defaults. Logs,
    /// artifact, and panel state from a previous visit to the kind do not
    /// carry over.
    pub fn open(&mut self, kind: LabKind) -> &mut LabSession {
        let slot = self.sessions.entry(kind).or_default();
        *slot = LabSession::default();
        slot
    }

    pub fn get(&self, kind: LabKind) -> Option<&LabSession> {
        self.sessions.get(&kind)
    }

    pub fn get_mut(&mut self, kind: LabKind) -> Option<&mut LabSession> {
        self.sessions.get_mut(&kind)
    }
}
