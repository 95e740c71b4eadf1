//! Behavioral compliance via an out-of-process JS checker.
//!
//! The bridge owns the transport contract only: confirm the runtime starts,
//! run `<runtime> <harness> --spec <path> --html <path>`, and turn whatever comes
//! back into a [`CheckResult`]. It never interprets what the checker does.
//!
//! Contract with the checker:
//! - exit code 2 means the checker itself broke; stdout is ignored and the
//!   diagnostic stream is surfaced instead
//! - otherwise stdout must hold one JSON object `{ok, errors?, details?}`,
//!   and `ok` alone decides pass/fail (a missing `ok` is a failure)
//! - every transport-level failure message starts with "JS harness" or
//!   "Node.js" so it reads differently from a failure the checker reported

use crate::core::config::HarnessConfig;
use crate::core::output;
use crate::core::report::CheckResult;
use serde_json::{Map, Value, json};
use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Exit code reserved for "internal error in the external checker".
pub const INTERNAL_ERROR_EXIT_CODE: i32 = 2;
/// Cap on raw stdout echoed back when the payload is not valid JSON.
pub const MAX_RAW_OUTPUT_CHARS: usize = 4000;
pub const GENERIC_FAILURE: &str = "behavioral compliance failed";

/// How long to wait for pipe readers after a timed-out child was killed.
const PIPE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct BehaviorRequest<'a> {
    pub spec_path: &'a Path,
    pub html_path: &'a Path,
}

/// A behavioral checker. Implementations report every failure through the
/// returned result; nothing here is allowed to abort the run.
pub trait BehaviorCheck {
    fn check(&self, request: &BehaviorRequest<'_>) -> CheckResult;
}

/// Captured outcome of one finished checker process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
enum RunOutcome {
    Finished(Invocation),
    TimedOut { stderr: String },
}

#[derive(Debug, Clone)]
pub struct NodeBridge {
    pub runtime: String,
    pub harness: PathBuf,
    pub timeout: Option<Duration>,
}

impl NodeBridge {
    pub fn new(runtime: impl Into<String>, harness: impl Into<PathBuf>) -> Self {
        NodeBridge {
            runtime: runtime.into(),
            harness: harness.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        NodeBridge::new(config.node_bin.clone(), config.js_harness.clone())
            .with_timeout(config.js_timeout)
    }

    /// `<runtime> --version`. Any spawn error or non-zero exit means the
    /// runtime is unusable.
    fn runtime_version(&self) -> Result<String, String> {
        let output = Command::new(&self.runtime)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| e.to_string())?;
        if !output.status.success() {
            return Err(format!(
                "--version exited with {}: {}",
                describe_exit(output.status.code()),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_harness(&self, request: &BehaviorRequest<'_>) -> std::io::Result<RunOutcome> {
        let mut command = Command::new(&self.runtime);
        command
            .arg(&self.harness)
            .arg("--spec")
            .arg(request.spec_path)
            .arg("--html")
            .arg(request.html_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Lead a fresh process group so a timeout also reaches anything the
        // checker forked.
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let mut child = command.spawn()?;

        // Drain both pipes while waiting so a chatty checker cannot fill a
        // pipe buffer and block forever.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let Some(timeout) = self.timeout else {
            let status = child.wait()?;
            return Ok(RunOutcome::Finished(Invocation {
                exit_code: status.code(),
                stdout: stdout_rx.recv().unwrap_or_default(),
                stderr: stderr_rx.recv().unwrap_or_default(),
            }));
        };
        let deadline = started + timeout;

        let Some(status) = child.wait_timeout(timeout)? else {
            kill_and_reap(&mut child);
            return Ok(RunOutcome::TimedOut {
                stderr: stderr_rx.recv_timeout(PIPE_GRACE).unwrap_or_default(),
            });
        };

        // The checker exited, but a background process it left behind can
        // keep the pipes open. Collecting output shares the same deadline.
        let remaining = || deadline.saturating_duration_since(Instant::now());
        match (
            stdout_rx.recv_timeout(remaining()),
            stderr_rx.recv_timeout(remaining()),
        ) {
            (Ok(stdout), Ok(stderr)) => Ok(RunOutcome::Finished(Invocation {
                exit_code: status.code(),
                stdout,
                stderr,
            })),
            (_, stderr) => {
                debug!("JS harness exited but its pipes stayed open past the deadline");
                kill_process_group(child.id());
                Ok(RunOutcome::TimedOut {
                    stderr: stderr
                        .or_else(|_| stderr_rx.recv_timeout(PIPE_GRACE))
                        .unwrap_or_default(),
                })
            }
        }
    }
}

impl BehaviorCheck for NodeBridge {
    fn check(&self, request: &BehaviorRequest<'_>) -> CheckResult {
        match self.runtime_version() {
            Ok(version) => debug!(runtime = %self.runtime, %version, "runtime available"),
            Err(reason) => {
                warn!(runtime = %self.runtime, %reason, "runtime unavailable");
                return CheckResult::failed(format!(
                    "Node.js not available ({}): {}",
                    self.runtime, reason
                ));
            }
        }

        info!(
            harness = %self.harness.display(),
            spec = %request.spec_path.display(),
            html = %request.html_path.display(),
            "running JS harness"
        );
        match self.run_harness(request) {
            Ok(RunOutcome::Finished(invocation)) => {
                debug!(exit_code = ?invocation.exit_code, "JS harness finished");
                classify(&invocation)
            }
            Ok(RunOutcome::TimedOut { stderr }) => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!(timeout_secs = secs, "JS harness timed out");
                timed_out(secs, &stderr)
            }
            Err(e) => {
                warn!(error = %e, "JS harness could not be executed");
                CheckResult::failed(format!("Failed to execute JS harness: {}", e))
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

fn kill_and_reap(child: &mut Child) {
    kill_process_group(child.id());
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(leader_pid: u32) {
    let _ = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{}", leader_pid))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_process_group(_leader_pid: u32) {}

fn describe_exit(code: Option<i32>) -> String {
    code.map(|c| format!("code {}", c))
        .unwrap_or_else(|| "a signal".to_string())
}

fn timed_out(secs: u64, stderr: &str) -> CheckResult {
    let mut result = CheckResult::failed(format!("JS harness timed out after {}s", secs))
        .with_detail("timeoutSecs", secs);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        result.errors.push(stderr.to_string());
    }
    result
}

/// Map a finished checker process onto a [`CheckResult`].
pub fn classify(invocation: &Invocation) -> CheckResult {
    let stderr = invocation.stderr.trim();

    if invocation.exit_code == Some(INTERNAL_ERROR_EXIT_CODE) {
        let diagnostic = if !stderr.is_empty() {
            stderr
        } else if !invocation.stdout.trim().is_empty() {
            invocation.stdout.trim()
        } else {
            "(no diagnostic output)"
        };
        return CheckResult::failed(format!("JS harness internal error:\n{}", diagnostic));
    }

    if invocation.stdout.trim().is_empty() {
        let mut result = CheckResult::failed(format!(
            "JS harness produced no output (exit {}).",
            describe_exit(invocation.exit_code)
        ));
        if !stderr.is_empty() {
            result.errors.push(stderr.to_string());
        }
        return result;
    }

    let payload = match parse_payload(&invocation.stdout) {
        Ok(payload) => payload,
        Err(reason) => {
            return CheckResult {
                ok: false,
                errors: vec![
                    format!("JS harness output was not valid JSON: {}", reason),
                    output::char_prefix(&invocation.stdout, MAX_RAW_OUTPUT_CHARS).to_string(),
                ],
                details: Map::from_iter([("stderr".to_string(), json!(stderr))]),
            };
        }
    };

    let ok = payload.get("ok").is_some_and(truthy);
    let errors = match payload.get("errors") {
        Some(Value::Array(items)) if !items.is_empty() => {
            items.iter().map(error_text).collect::<Vec<_>>()
        }
        Some(other) if !other.is_array() && truthy(other) => vec![error_text(other)],
        _ if ok => Vec::new(),
        _ => vec![GENERIC_FAILURE.to_string()],
    };
    let mut details = match payload.get("details") {
        Some(Value::Object(map)) => map.clone(),
        Some(other) if truthy(other) => Map::from_iter([("value".to_string(), other.clone())]),
        _ => Map::new(),
    };
    if !stderr.is_empty() {
        details.insert("stderr".to_string(), json!(stderr));
    }

    CheckResult {
        ok,
        errors,
        details,
    }
}

fn parse_payload(stdout: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(stdout).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, got {}", json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// JSON truthiness: null, false, zero and empty containers are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn error_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
