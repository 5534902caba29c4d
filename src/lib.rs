//! osabridge - Typed access to Notes, Calendar and Contacts
//!
//! Each operation renders a parameterized OSA script, runs it through the
//! system interpreter and decodes the delimited output into typed records.
//! The same operations are exposed as tools, served over MCP or the CLI.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod osa;
pub mod tools;
pub mod utils;

pub use adapters::{CalendarAdapter, ContactsAdapter, NotesAdapter};
pub use crate::config::Settings;
pub use osa::{BridgeError, BridgeResult, Outcome};
pub use tools::ToolRegistry;

#[doc(hidden)]
pub use serde_json;

use adapters::Clock;
use osa::{OsaScriptExecutor, ScriptRunner, SerializedRunner};
use std::sync::Arc;

/// Handle to the three adapters, sharing one script runner
#[derive(Clone)]
pub struct Bridge {
    notes: Arc<NotesAdapter>,
    calendar: Arc<CalendarAdapter>,
    contacts: Arc<ContactsAdapter>,
}

impl Bridge {
    /// Bridge over the system interpreter, one script at a time per application
    pub fn new(settings: &Settings) -> Self {
        let executor = OsaScriptExecutor::new(&settings.executor);
        let runner: Arc<dyn ScriptRunner> = Arc::new(SerializedRunner::new(executor));
        tracing::info!(
            interpreter = %settings.executor.interpreter,
            calendar = %settings.calendar.default_calendar,
            "Bridge initialized"
        );
        Self::with_runner(runner, settings.calendar.default_calendar.clone())
    }

    pub fn with_runner(runner: Arc<dyn ScriptRunner>, default_calendar: impl Into<String>) -> Self {
        Self {
            notes: Arc::new(NotesAdapter::new(runner.clone())),
            calendar: Arc::new(CalendarAdapter::new(runner.clone(), default_calendar)),
            contacts: Arc::new(ContactsAdapter::new(runner)),
        }
    }

    /// Same bridge with the calendar reading time from `clock`
    pub fn with_clock(
        runner: Arc<dyn ScriptRunner>,
        default_calendar: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notes: Arc::new(NotesAdapter::new(runner.clone())),
            calendar: Arc::new(
                CalendarAdapter::new(runner.clone(), default_calendar).with_clock(clock),
            ),
            contacts: Arc::new(ContactsAdapter::new(runner)),
        }
    }

    pub fn notes(&self) -> Arc<NotesAdapter> {
        self.notes.clone()
    }

    pub fn calendar(&self) -> Arc<CalendarAdapter> {
        self.calendar.clone()
    }

    pub fn contacts(&self) -> Arc<ContactsAdapter> {
        self.contacts.clone()
    }
}
