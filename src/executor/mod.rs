use crate::event::AppEvent;
use crate::lab::LabKind;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use thiserror::Error;
use tokio::runtime::Handle;

/// Failure of one submit-and-wait round against the execution boundary.
/// Both variants surface to the user as the two-line critical-error block
/// in the session console; neither is retried.
#[derive(Debug, Clone, Error)]
pub enum ExecuteError {
    #[error("transport failure: {message}")]
    Transport { message: String, status: Option<u16> },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ExecuteError {
    /// Best-available description for the console detail line.
    pub fn detail_message(&self) -> &str {
        match self {
            Self::Transport { message, .. } => message,
            Self::MalformedResponse(message) => message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::MalformedResponse(_) => None,
        }
    }
}

/// Request body for the execution boundary. `testbench_code` is `None`
/// exactly when the submitting kind has no testbench slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub language: &'static str,
    pub design_code: String,
    pub testbench_code: Option<String>,
}

impl ExecutionRequest {
    pub fn from_workspace(workspace: &crate::workspace::Workspace) -> Self {
        let kind = workspace.kind;
        Self {
            language: kind.language_id(),
            design_code: workspace.design_text.clone(),
            testbench_code: kind
                .has_testbench()
                .then(|| workspace.testbench_text.clone()),
        }
    }
}

/// Parsed success body: the newline-delimited log block and the optional
/// base64-encoded waveform payload.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub logs: String,
    pub vcd_base64: Option<String>,
}

#[derive(Deserialize)]
struct SuccessBody {
    logs: Option<String>,
    #[serde(rename = "vcdBase64")]
    vcd_base64: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct AuthStatusBody {
    authenticated: bool,
}

const UNKNOWN_TRANSPORT_ERROR: &str = "Unknown Transport Error";

/// Maps a completed HTTP exchange to an execution outcome. Non-2xx statuses
/// are transport failures carrying the remote `message` field when the body
/// has one; 2xx bodies missing the expected shape are malformed responses.
pub fn parse_execution_response(status: u16, body: &str) -> Result<ExecutionOutput, ExecuteError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| UNKNOWN_TRANSPORT_ERROR.to_string());
        return Err(ExecuteError::Transport {
            message,
            status: Some(status),
        });
    }

    let parsed: SuccessBody = serde_json::from_str(body)
        .map_err(|err| ExecuteError::MalformedResponse(format!("unparseable body: {err}")))?;
    let logs = parsed
        .logs
        .ok_or_else(|| ExecuteError::MalformedResponse("missing logs field".to_string()))?;

    Ok(ExecutionOutput {
        logs,
        vcd_base64: parsed.vcd_base64,
    })
}

/// Client for the remote execution kernel. Requests run on the tokio
/// runtime; outcomes come back to the UI thread over the app event channel.
/// The client itself holds no session state, so concurrent submissions from
/// different sessions share nothing but the HTTP connection pool.
#[derive(Clone)]
pub struct ExecutionClient {
    base_url: String,
    http: reqwest::Client,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl ExecutionClient {
    pub fn new(base_url: String, runtime_handle: Handle, tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
            tx,
            runtime_handle,
        }
    }

    /// Probes the auth collaborator once at startup. A probe that cannot
    /// complete reports as a failure event; the app treats that the same as
    /// an unauthenticated state.
    pub fn start(&self) {
        let url = format!("{}/auth/status", self.base_url);
        let http = self.http.clone();
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let result = async {
                let response = http.get(&url).send().await?;
                response.json::<AuthStatusBody>().await
            }
            .await;

            match result {
                Ok(body) => {
                    let _ = tx.send(AppEvent::AuthStatus {
                        authenticated: body.authenticated,
                    });
                }
                Err(err) => {
                    let _ = tx.send(AppEvent::AuthProbeFailed(err.to_string()));
                }
            }
        });
    }

    /// Dispatches one execution request. There is no cancellation or
    /// timeout path: once dispatched the session stays in flight until the
    /// remote call completes or fails at the transport level.
    pub fn submit(&self, kind: LabKind, request: ExecutionRequest) {
        let url = format!("{}/execute", self.base_url);
        let http = self.http.clone();
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let outcome = perform(&http, &url, &request).await;
            if let Err(err) = &outcome {
                log::warn!("execution request for {} failed: {err}", kind.language_id());
            }
            let _ = tx.send(AppEvent::ExecutionFinished { kind, outcome });
        });
    }
}

async fn perform(
    http: &reqwest::Client,
    url: &str,
    request: &ExecutionRequest,
) -> Result<ExecutionOutput, ExecuteError> {
    let response = http
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|err| ExecuteError::Transport {
            message: err.to_string(),
            status: None,
        })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|err| ExecuteError::Transport {
        message: err.to_string(),
        status: Some(status),
    })?;

    parse_execution_response(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;

    #[test]
    fn success_body_parses_logs_and_artifact() {
        let output = parse_execution_response(200, r#"{"logs":"a\nb","vcdBase64":"VkNE"}"#)
            .expect("well-formed body should parse");
        assert_eq!(output.logs, "a\nb");
        assert_eq!(output.vcd_base64.as_deref(), Some("VkNE"));
    }

    #[test]
    fn success_body_without_artifact_parses() {
        let output = parse_execution_response(200, r#"{"logs":"done"}"#)
            .expect("artifact-free body should parse");
        assert_eq!(output.logs, "done");
        assert!(output.vcd_base64.is_none());
    }

    #[test]
    fn success_body_missing_logs_is_malformed() {
        let err = parse_execution_response(200, r#"{"vcdBase64":"VkNE"}"#)
            .expect_err("missing logs should fail");
        assert!(matches!(err, ExecuteError::MalformedResponse(_)));
    }

    #[test]
    fn success_body_that_is_not_json_is_malformed() {
        let err = parse_execution_response(200, "<html>oops</html>")
            .expect_err("non-JSON body should fail");
        assert!(matches!(err, ExecuteError::MalformedResponse(_)));
    }

    #[test]
    fn rejection_carries_the_remote_message_and_status() {
        let err = parse_execution_response(422, r#"{"message":"synthesis failed"}"#)
            .expect_err("non-2xx should fail");
        assert_eq!(err.detail_message(), "synthesis failed");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn rejection_without_a_message_falls_back_to_the_generic_text() {
        let err = parse_execution_response(500, "").expect_err("non-2xx should fail");
        assert_eq!(err.detail_message(), UNKNOWN_TRANSPORT_ERROR);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn request_omits_the_testbench_for_kinds_without_the_slot() {
        let workspace = Workspace {
            kind: LabKind::Qnx,
            design_text: "int main() {}".to_string(),
            testbench_text: "stale text".to_string(),
        };
        let request = ExecutionRequest::from_workspace(&workspace);
        assert_eq!(request.language, "qnx");
        assert!(request.testbench_code.is_none());

        let encoded = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(encoded["designCode"], "int main() {}");
        assert!(encoded["testbenchCode"].is_null());
    }

    #[test]
    fn request_carries_the_testbench_for_hdl_kinds() {
        let workspace = Workspace {
            kind: LabKind::Verilog,
            design_text: "module m();".to_string(),
            testbench_text: "module tb();".to_string(),
        };
        let request = ExecutionRequest::from_workspace(&workspace);
        assert_eq!(request.testbench_code.as_deref(), Some("module tb();"));
    }
}
