//! Calendar tools
//!
//! Date arguments are local wall-clock times such as `2026-10-20T14:30:00`
//! or a bare `2026-10-20` for midnight.

use super::{days_arg, render_outcome, Tool, ToolMetadata, ToolResult};
use crate::adapters::calendar::{DEFAULT_LIST_DAYS, DEFAULT_SEARCH_DAYS};
use crate::adapters::{CalendarAdapter, NewEvent};
use crate::{tool_metadata, validate_optional_string, validate_required_string};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

fn calendar_label(calendar: Option<&str>, adapter: &CalendarAdapter) -> String {
    calendar.unwrap_or(adapter.default_calendar()).to_string()
}

/// List upcoming events
pub struct ListEventsTool {
    calendar: Arc<CalendarAdapter>,
}

impl ListEventsTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_list_events",
            description: "List events starting between now and the given number of days ahead.",
            parameters: [
                {
                    name: "days",
                    type: "integer",
                    description: "How many days ahead to look",
                    required: false,
                    default: DEFAULT_LIST_DAYS
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name; the configured default when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        days_arg(args, DEFAULT_LIST_DAYS)?;
        validate_optional_string!(args, "calendar");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let days = days_arg(&args, DEFAULT_LIST_DAYS)?;
        let calendar = validate_optional_string!(args, "calendar");

        let outcome = self.calendar.list_events(days, calendar).await?;
        let label = calendar_label(calendar, &self.calendar);
        render_outcome(
            outcome,
            |events| format!("{} events in \"{}\" over the next {} days.", events.len(), label, days),
            || format!("No events in \"{}\" over the next {} days.", label, days),
        )
    }
}

pub struct SearchEventsTool {
    calendar: Arc<CalendarAdapter>,
}

impl SearchEventsTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for SearchEventsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_search_events",
            description: "Find upcoming events whose summary or description contains the query (case-insensitive).",
            parameters: [
                {
                    name: "query",
                    type: "string",
                    description: "Text to look for",
                    required: true
                },
                {
                    name: "days",
                    type: "integer",
                    description: "How many days ahead to look",
                    required: false,
                    default: DEFAULT_SEARCH_DAYS
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name; the configured default when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "query");
        days_arg(args, DEFAULT_SEARCH_DAYS)?;
        validate_optional_string!(args, "calendar");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let query = validate_required_string!(args, "query");
        let days = days_arg(&args, DEFAULT_SEARCH_DAYS)?;
        let calendar = validate_optional_string!(args, "calendar");

        let outcome = self.calendar.search_events(query, days, calendar).await?;
        let label = calendar_label(calendar, &self.calendar);
        render_outcome(
            outcome,
            |events| format!("{} events in \"{}\" match \"{}\".", events.len(), label, query),
            || format!("No events in \"{}\" match \"{}\" over the next {} days.", label, query, days),
        )
    }
}

pub struct GetEventTool {
    calendar: Arc<CalendarAdapter>,
}

impl GetEventTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for GetEventTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_get_event",
            description: "Fetch the first event whose summary matches exactly.",
            parameters: [
                {
                    name: "summary",
                    type: "string",
                    description: "Exact summary of the event",
                    required: true
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name; the configured default when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "summary");
        validate_optional_string!(args, "calendar");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let summary = validate_required_string!(args, "summary");
        let calendar = validate_optional_string!(args, "calendar");

        let outcome = self.calendar.get_event(summary, calendar).await?;
        let label = calendar_label(calendar, &self.calendar);
        render_outcome(
            outcome,
            |event| format!("Event \"{}\":", event.summary),
            || format!("No event \"{}\" in \"{}\".", summary, label),
        )
    }
}

pub struct CreateEventTool {
    calendar: Arc<CalendarAdapter>,
}

impl CreateEventTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_create_event",
            description: "Create an event. Times are local, e.g. 2026-10-20T14:30:00.",
            parameters: [
                {
                    name: "summary",
                    type: "string",
                    description: "Event title",
                    required: true
                },
                {
                    name: "start",
                    type: "string",
                    description: "Start time (YYYY-MM-DDTHH:MM:SS)",
                    required: true
                },
                {
                    name: "end",
                    type: "string",
                    description: "End time (YYYY-MM-DDTHH:MM:SS), not before start",
                    required: true
                },
                {
                    name: "description",
                    type: "string",
                    description: "Notes attached to the event",
                    required: false
                },
                {
                    name: "location",
                    type: "string",
                    description: "Where the event takes place",
                    required: false
                },
                {
                    name: "url",
                    type: "string",
                    description: "Link attached to the event",
                    required: false
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name; the configured default when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "summary");
        validate_required_string!(args, "start");
        validate_required_string!(args, "end");
        for optional in ["description", "location", "url", "calendar"] {
            validate_optional_string!(args, optional);
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let owned = |name: &str| -> Result<Option<String>> {
            Ok(validate_optional_string!(args, name).map(str::to_string))
        };
        let event = NewEvent {
            summary: validate_required_string!(args, "summary").to_string(),
            start: validate_required_string!(args, "start").to_string(),
            end: validate_required_string!(args, "end").to_string(),
            description: owned("description")?,
            location: owned("location")?,
            url: owned("url")?,
            calendar: owned("calendar")?,
        };
        let summary = event.summary.clone();

        let outcome = self.calendar.create_event(event).await?;
        render_outcome(
            outcome,
            |event| format!("Created event \"{}\" in \"{}\".", event.summary, event.calendar),
            || format!("Event \"{}\" was not created.", summary),
        )
    }
}

pub struct DeleteEventTool {
    calendar: Arc<CalendarAdapter>,
}

impl DeleteEventTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_delete_event",
            description: "Delete the first event whose summary matches exactly.",
            parameters: [
                {
                    name: "summary",
                    type: "string",
                    description: "Exact summary of the event to delete",
                    required: true
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name; the configured default when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "summary");
        validate_optional_string!(args, "calendar");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let summary = validate_required_string!(args, "summary");
        let calendar = validate_optional_string!(args, "calendar");

        let outcome = self.calendar.delete_event(summary, calendar).await?;
        let label = calendar_label(calendar, &self.calendar);
        render_outcome(
            outcome,
            |event| format!("Deleted event \"{}\" from \"{}\".", event.summary, event.calendar),
            || format!("No event \"{}\" in \"{}\".", summary, label),
        )
    }
}

pub struct ListCalendarsTool {
    calendar: Arc<CalendarAdapter>,
}

impl ListCalendarsTool {
    pub fn new(calendar: Arc<CalendarAdapter>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListCalendarsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "calendar_list_calendars",
            description: "List the names of all calendars.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let outcome = self.calendar.list_calendars().await?;
        render_outcome(
            outcome,
            |names| format!("Found {} calendars.", names.len()),
            || "No calendars found.".to_string(),
        )
    }
}
