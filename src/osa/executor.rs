//! Process Executor
//!
//! Information Hiding:
//! - Process spawning, output capture and timeout handling hidden behind `ScriptRunner`
//! - Stderr policy applied here so adapters only see output or a classified error
//! - Per-application serialization hidden in `SerializedRunner`

use super::error::BridgeError;
use super::script::{Application, Script};
use crate::config::{ExecutorConfig, StderrPolicy};
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

/// Captured output of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: String,
    /// Stderr text of a successful run, kept under `StderrPolicy::Warn`
    pub warning: Option<String>,
}

impl ScriptOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            warning: None,
        }
    }
}

/// Runs rendered scripts
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Script) -> Result<ScriptOutput, BridgeError>;
}

/// Runs each script in a fresh interpreter process
pub struct OsaScriptExecutor {
    interpreter: String,
    script_flag: String,
    timeout: Duration,
    stderr_policy: StderrPolicy,
}

impl OsaScriptExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            script_flag: config.script_flag.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            stderr_policy: config.stderr_policy,
        }
    }
}

#[async_trait]
impl ScriptRunner for OsaScriptExecutor {
    async fn run(&self, script: &Script) -> Result<ScriptOutput, BridgeError> {
        let started = Instant::now();
        tracing::debug!(
            operation = script.operation,
            application = %script.application,
            args = script.args.len(),
            "Running script"
        );

        let mut command = Command::new(&self.interpreter);
        command
            .arg(&self.script_flag)
            .arg(&script.body)
            .args(&script.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(BridgeError::Spawn {
                    program: self.interpreter.clone(),
                    source,
                })
            }
            Err(_) => {
                tracing::warn!(
                    operation = script.operation,
                    "Script timed out after {}ms",
                    self.timeout.as_millis()
                );
                return Err(BridgeError::Timeout {
                    operation: script.operation.to_string(),
                    after: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            tracing::warn!(
                operation = script.operation,
                code = ?output.status.code(),
                "Script failed: {}",
                stderr
            );
            return Err(BridgeError::ExitFailure {
                operation: script.operation.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        let warning = if stderr.is_empty() {
            None
        } else {
            match self.stderr_policy {
                StderrPolicy::Fail => {
                    return Err(BridgeError::InterpreterWarning {
                        operation: script.operation.to_string(),
                        stderr,
                    })
                }
                StderrPolicy::Warn => {
                    tracing::warn!(operation = script.operation, "Interpreter warning: {}", stderr);
                    Some(stderr)
                }
            }
        };

        tracing::debug!(
            operation = script.operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = stdout.len(),
            "Script completed"
        );

        Ok(ScriptOutput { stdout, warning })
    }
}

/// Serializes runs per target application.
///
/// Scripts for the same application wait for each other; scripts for different
/// applications may overlap.
pub struct SerializedRunner<R> {
    inner: R,
    locks: HashMap<Application, Arc<Mutex<()>>>,
}

impl<R: ScriptRunner> SerializedRunner<R> {
    pub fn new(inner: R) -> Self {
        let locks = [
            Application::Notes,
            Application::Calendar,
            Application::Contacts,
        ]
        .into_iter()
        .map(|app| (app, Arc::new(Mutex::new(()))))
        .collect();

        Self { inner, locks }
    }
}

#[async_trait]
impl<R: ScriptRunner> ScriptRunner for SerializedRunner<R> {
    async fn run(&self, script: &Script) -> Result<ScriptOutput, BridgeError> {
        let _guard = match self.locks.get(&script.application) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };
        self.inner.run(script).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osa::error::FailureKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shell(timeout_ms: u64, stderr_policy: StderrPolicy) -> OsaScriptExecutor {
        OsaScriptExecutor::new(&ExecutorConfig {
            interpreter: "sh".to_string(),
            script_flag: "-c".to_string(),
            timeout_ms,
            stderr_policy,
        })
    }

    fn script(body: &str, args: &[&str]) -> Script {
        Script {
            application: Application::Notes,
            operation: "test_op",
            body: body.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout_without_trailing_newline() {
        let output = shell(5000, StderrPolicy::Warn)
            .run(&script("printf '  a|||b  \\n'", &[]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "  a|||b  ");
        assert_eq!(output.warning, None);
    }

    #[tokio::test]
    async fn test_arguments_passed_verbatim() {
        let output = shell(5000, StderrPolicy::Warn)
            .run(&script("printf '%s' \"$1\"", &["=zero", "=\"quoted\" $HOME"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "=\"quoted\" $HOME");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = shell(5000, StderrPolicy::Warn)
            .run(&script("echo boom >&2; exit 3", &[]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Process);
        match err {
            BridgeError::ExitFailure { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stderr_warning_kept_under_warn_policy() {
        let output = shell(5000, StderrPolicy::Warn)
            .run(&script("echo careful >&2; echo ok", &[]))
            .await
            .unwrap();
        assert_eq!(output.stdout, "ok");
        assert_eq!(output.warning.as_deref(), Some("careful"));
    }

    #[tokio::test]
    async fn test_stderr_fails_under_fail_policy() {
        let err = shell(5000, StderrPolicy::Fail)
            .run(&script("echo careful >&2; echo ok", &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Warning);
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = shell(100, StderrPolicy::Warn)
            .run(&script("sleep 5", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let executor = OsaScriptExecutor::new(&ExecutorConfig {
            interpreter: "/nonexistent/osascript".to_string(),
            ..ExecutorConfig::default()
        });
        let err = executor.run(&script("return 1", &[])).await.unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }));
    }

    struct CountingRunner {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ScriptRunner for CountingRunner {
        async fn run(&self, _script: &Script) -> Result<ScriptOutput, BridgeError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ScriptOutput::default())
        }
    }

    fn counting() -> SerializedRunner<CountingRunner> {
        SerializedRunner::new(CountingRunner {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_same_application_is_serialized() {
        let runner = counting();
        let a = script("a", &[]);
        let b = script("b", &[]);

        let (ra, rb) = tokio::join!(runner.run(&a), runner.run(&b));
        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(runner.inner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_applications_overlap() {
        let runner = counting();
        let a = script("a", &[]);
        let mut b = script("b", &[]);
        b.application = Application::Calendar;

        let _ = tokio::join!(runner.run(&a), runner.run(&b));
        assert_eq!(runner.inner.peak.load(Ordering::SeqCst), 2);
    }
}
