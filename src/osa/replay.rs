//! Replay runner
//!
//! A `ScriptRunner` that never spawns a process: it records every script it
//! receives and answers with queued responses. Used by the test suites and for
//! exercising the tool surface on machines without the scripting interpreter.

use super::error::BridgeError;
use super::executor::{ScriptOutput, ScriptRunner};
use super::script::Script;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&Script) -> Result<ScriptOutput, BridgeError> + Send + Sync>;

enum Reply {
    Output(ScriptOutput),
    Fail(Responder),
}

#[derive(Default)]
pub struct ReplayRunner {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<Script>>,
}

impl ReplayRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful run printing `stdout`
    pub fn reply(self, stdout: impl Into<String>) -> Self {
        self.push(Reply::Output(ScriptOutput::new(stdout)));
        self
    }

    /// Queue a successful run that also wrote `warning` to stderr
    pub fn reply_with_warning(self, stdout: impl Into<String>, warning: impl Into<String>) -> Self {
        self.push(Reply::Output(ScriptOutput {
            stdout: stdout.into(),
            warning: Some(warning.into()),
        }));
        self
    }

    /// Queue a failed run; the error is built from the script that triggered it
    pub fn fail_with<F>(self, make_error: F) -> Self
    where
        F: Fn(&Script) -> Result<ScriptOutput, BridgeError> + Send + Sync + 'static,
    {
        self.push(Reply::Fail(Box::new(make_error)));
        self
    }

    /// Queue a non-zero exit
    pub fn fail_exit(self, code: i32, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        self.fail_with(move |script| {
            Err(BridgeError::ExitFailure {
                operation: script.operation.to_string(),
                code: Some(code),
                stderr: stderr.clone(),
            })
        })
    }

    /// Scripts received so far, oldest first
    pub fn scripts(&self) -> Vec<Script> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn last_script(&self) -> Option<Script> {
        self.scripts().pop()
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl ScriptRunner for ReplayRunner {
    async fn run(&self, script: &Script) -> Result<ScriptOutput, BridgeError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(script.clone());
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Fail(make_error)) => make_error(script),
            // Nothing queued: behave like a script that matched nothing
            None => Ok(ScriptOutput::default()),
        }
    }
}
