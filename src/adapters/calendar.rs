//! Calendar adapter
//!
//! The host owns "now": every time-bounded operation computes its window here
//! and hands both bounds to the script, then re-checks decoded events against
//! the same inclusive window.

use super::time::{format_datetime, parse_datetime, Clock, SystemClock, TimeWindow, ISO_FORMAT};
use super::{contains_ci, decode_all, decode_one, invoke, non_blank, require_text, FromRecord};
use crate::osa::codec::{self, RawRecord};
use crate::osa::{
    Application, BridgeError, BridgeResult, Operation, Outcome, ParamSpec, Params, ScriptRunner,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LIST_DAYS: u32 = 7;
pub const DEFAULT_SEARCH_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub calendar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn event_time(record: &RawRecord, index: usize, field: &'static str) -> Result<NaiveDateTime, BridgeError> {
    let raw = record.text(index).unwrap_or_default();
    NaiveDateTime::parse_from_str(&raw, ISO_FORMAT).map_err(|_| BridgeError::InvalidField {
        kind: Event::KIND,
        field,
        reason: format!("is not a date-time: '{}'", raw),
    })
}

impl FromRecord for Event {
    const KIND: &'static str = "event";
    const FIELDS: usize = 7;

    fn from_fields(record: &RawRecord) -> Result<Self, BridgeError> {
        Ok(Event {
            summary: record.text(0).unwrap_or_default(),
            start: event_time(record, 1, "start")?,
            end: event_time(record, 2, "end")?,
            calendar: record.text(3).unwrap_or_default(),
            description: record.optional_text(4),
            location: record.optional_text(5),
            url: record.optional_text(6),
        })
    }
}

/// Input for [`CalendarAdapter::create_event`]. Dates accept
/// `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]` or a bare `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub summary: String,
    pub start: String,
    pub end: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub calendar: Option<String>,
}

const EVENT_HANDLERS: &str = r#"
on eventRow(ev, calName)
	tell application "Calendar"
		set evSummary to summary of ev
		set evStart to start date of ev
		set evEnd to end date of ev
		set evDescription to description of ev
		set evLocation to location of ev
		set evUrl to url of ev
	end tell
	return my joinText({my esc(evSummary), my esc(my isoDateTime(evStart)), my esc(my isoDateTime(evEnd)), my esc(calName), my esc(evDescription), my esc(evLocation), my esc(evUrl)}, fieldSep)
end eventRow

on eventRows(theEvents, calName)
	set rows to {}
	repeat with ev in theEvents
		set end of rows to my eventRow(contents of ev, calName)
	end repeat
	return my joinText(rows, recordSep)
end eventRows

on findEvent(theSummary, calName)
	tell application "Calendar" to set candidates to (every event of calendar calName whose summary is theSummary)
	repeat with ev in candidates
		tell application "Calendar" to set evSummary to summary of ev
		considering case
			if evSummary is theSummary then return contents of ev
		end considering
	end repeat
	return missing value
end findEvent
"#;

pub(crate) const LIST_EVENTS: Operation = Operation {
    name: "calendar_list_events",
    application: Application::Calendar,
    params: &[
        ParamSpec::required("calendar"),
        ParamSpec::required("from"),
        ParamSpec::required("to"),
    ],
    handlers: EVENT_HANDLERS,
    body: r#"	set fromDate to my parseIso(p_from)
	set toDate to my parseIso(p_to)
	tell application "Calendar" to set found to (every event of calendar p_calendar whose start date ≥ fromDate and start date ≤ toDate)
	return my eventRows(found, p_calendar)"#,
};

pub(crate) const SEARCH_EVENTS: Operation = Operation {
    name: "calendar_search_events",
    application: Application::Calendar,
    params: &[
        ParamSpec::required("calendar"),
        ParamSpec::required("query"),
        ParamSpec::required("from"),
        ParamSpec::required("to"),
    ],
    handlers: EVENT_HANDLERS,
    body: r#"	set fromDate to my parseIso(p_from)
	set toDate to my parseIso(p_to)
	tell application "Calendar" to set found to (every event of calendar p_calendar whose start date ≥ fromDate and start date ≤ toDate and (summary contains p_query or description contains p_query))
	return my eventRows(found, p_calendar)"#,
};

pub(crate) const GET_EVENT: Operation = Operation {
    name: "calendar_get_event",
    application: Application::Calendar,
    params: &[ParamSpec::required("calendar"), ParamSpec::required("summary")],
    handlers: EVENT_HANDLERS,
    body: r#"	set ev to my findEvent(p_summary, p_calendar)
	if ev is missing value then return ""
	return my eventRow(ev, p_calendar)"#,
};

pub(crate) const CREATE_EVENT: Operation = Operation {
    name: "calendar_create_event",
    application: Application::Calendar,
    params: &[
        ParamSpec::required("calendar"),
        ParamSpec::required("summary"),
        ParamSpec::required("start"),
        ParamSpec::required("end"),
        ParamSpec::optional("description"),
        ParamSpec::optional("location"),
        ParamSpec::optional("url"),
    ],
    handlers: EVENT_HANDLERS,
    body: r#"	set startDate to my parseIso(p_start)
	set endDate to my parseIso(p_end)
	tell application "Calendar"
		tell calendar p_calendar
			set newEvent to make new event with properties {summary:p_summary, start date:startDate, end date:endDate}
			if p_description is not "" then set description of newEvent to p_description
			if p_location is not "" then set location of newEvent to p_location
			if p_url is not "" then set url of newEvent to p_url
		end tell
	end tell
	return my eventRow(newEvent, p_calendar)"#,
};

pub(crate) const DELETE_EVENT: Operation = Operation {
    name: "calendar_delete_event",
    application: Application::Calendar,
    params: &[ParamSpec::required("calendar"), ParamSpec::required("summary")],
    handlers: EVENT_HANDLERS,
    body: r#"	set ev to my findEvent(p_summary, p_calendar)
	if ev is missing value then return ""
	set deletedRow to my eventRow(ev, p_calendar)
	tell application "Calendar" to delete ev
	return deletedRow"#,
};

pub(crate) const LIST_CALENDARS: Operation = Operation {
    name: "calendar_list_calendars",
    application: Application::Calendar,
    params: &[],
    handlers: "",
    body: r#"	tell application "Calendar" to set calendarNames to name of every calendar
	set rows to {}
	repeat with calendarName in calendarNames
		set end of rows to my esc(contents of calendarName)
	end repeat
	return my joinText(rows, recordSep)"#,
};

pub struct CalendarAdapter {
    runner: Arc<dyn ScriptRunner>,
    default_calendar: String,
    clock: Arc<dyn Clock>,
}

impl CalendarAdapter {
    pub fn new(runner: Arc<dyn ScriptRunner>, default_calendar: impl Into<String>) -> Self {
        Self {
            runner,
            default_calendar: default_calendar.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_calendar(&self) -> &str {
        &self.default_calendar
    }

    fn calendar<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        non_blank(requested).unwrap_or(self.default_calendar.as_str())
    }

    fn window(&self, days: u32) -> Result<TimeWindow, BridgeError> {
        TimeWindow::lookahead(self.clock.now(), days)
    }

    /// Events starting within `[now, now + days]`
    pub async fn list_events(&self, days: u32, calendar: Option<&str>) -> BridgeResult<Vec<Event>> {
        let window = self.window(days)?;
        let params = Params::new()
            .with("calendar", self.calendar(calendar))
            .with("from", format_datetime(window.start))
            .with("to", format_datetime(window.end));

        let output = invoke(self.runner.as_ref(), &LIST_EVENTS, &params).await?;
        let events: Vec<Event> = decode_all(&output)?;
        Ok(Outcome::from_batch(
            events.into_iter().filter(|e| window.contains(e.start)).collect(),
        ))
    }

    /// Events within `[now, now + days]` whose summary or description contains `query`
    pub async fn search_events(
        &self,
        query: &str,
        days: u32,
        calendar: Option<&str>,
    ) -> BridgeResult<Vec<Event>> {
        require_text("query", query)?;
        let window = self.window(days)?;
        let params = Params::new()
            .with("calendar", self.calendar(calendar))
            .with("query", query)
            .with("from", format_datetime(window.start))
            .with("to", format_datetime(window.end));

        let output = invoke(self.runner.as_ref(), &SEARCH_EVENTS, &params).await?;
        let events: Vec<Event> = decode_all(&output)?;
        Ok(Outcome::from_batch(
            events
                .into_iter()
                .filter(|e| window.contains(e.start))
                .filter(|e| {
                    contains_ci(&e.summary, query)
                        || e.description.as_deref().is_some_and(|d| contains_ci(d, query))
                })
                .collect(),
        ))
    }

    /// First event whose summary equals `summary` exactly
    pub async fn get_event(&self, summary: &str, calendar: Option<&str>) -> BridgeResult<Event> {
        require_text("summary", summary)?;
        let params = Params::new()
            .with("calendar", self.calendar(calendar))
            .with("summary", summary);

        let output = invoke(self.runner.as_ref(), &GET_EVENT, &params).await?;
        Ok(first_with_summary(decode_all(&output)?, summary))
    }

    pub async fn create_event(&self, event: NewEvent) -> BridgeResult<Event> {
        require_text("summary", &event.summary)?;
        let start = parse_datetime("start", &event.start)?;
        let end = parse_datetime("end", &event.end)?;
        if end < start {
            return Err(BridgeError::invalid_parameter("end", "must not be before start"));
        }

        let params = Params::new()
            .with("calendar", self.calendar(event.calendar.as_deref()))
            .with("summary", event.summary.as_str())
            .with("start", format_datetime(start))
            .with("end", format_datetime(end))
            .with_opt("description", non_blank(event.description.as_deref()))
            .with_opt("location", non_blank(event.location.as_deref()))
            .with_opt("url", non_blank(event.url.as_deref()));

        let output = invoke(self.runner.as_ref(), &CREATE_EVENT, &params).await?;
        let created: Event = decode_one(&output)?;
        tracing::info!(calendar = %created.calendar, "Created event '{}'", created.summary);
        Ok(Outcome::Found(created))
    }

    /// Delete the first event whose summary equals `summary` exactly
    pub async fn delete_event(&self, summary: &str, calendar: Option<&str>) -> BridgeResult<Event> {
        require_text("summary", summary)?;
        let params = Params::new()
            .with("calendar", self.calendar(calendar))
            .with("summary", summary);

        let output = invoke(self.runner.as_ref(), &DELETE_EVENT, &params).await?;
        let outcome = first_with_summary(decode_all(&output)?, summary);
        if let Outcome::Found(event) = &outcome {
            tracing::info!(calendar = %event.calendar, "Deleted event '{}'", event.summary);
        }
        Ok(outcome)
    }

    pub async fn list_calendars(&self) -> BridgeResult<Vec<String>> {
        let output = invoke(self.runner.as_ref(), &LIST_CALENDARS, &Params::new()).await?;
        let names = codec::decode_batch(&output.stdout)
            .iter()
            .filter_map(|record| record.optional_text(0))
            .collect();
        Ok(Outcome::from_batch(names))
    }
}

fn first_with_summary(events: Vec<Event>, summary: &str) -> Outcome<Event> {
    events.into_iter().find(|e| e.summary == summary).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::time::FixedClock;
    use crate::osa::codec::{encode, encode_batch, WireField};
    use crate::osa::{FailureKind, ReplayRunner};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, ISO_FORMAT).unwrap()
    }

    fn row(summary: &str, start: &str, end: &str, description: &str) -> Vec<WireField> {
        vec![
            summary.into(),
            start.into(),
            end.into(),
            "Work".into(),
            description.into(),
            "".into(),
            "".into(),
        ]
    }

    fn adapter(runner: ReplayRunner) -> (CalendarAdapter, Arc<ReplayRunner>) {
        let runner = Arc::new(runner);
        let calendar = CalendarAdapter::new(runner.clone(), "Work")
            .with_clock(Arc::new(FixedClock(at("2026-10-19T09:00:00"))));
        (calendar, runner)
    }

    #[tokio::test]
    async fn test_list_events_passes_default_window() {
        let output = encode(&row("Standup", "2026-10-20T09:30:00", "2026-10-20T09:45:00", ""));
        let (calendar, runner) = adapter(ReplayRunner::new().reply(output));

        let events = calendar
            .list_events(DEFAULT_LIST_DAYS, None)
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Standup");
        assert_eq!(events[0].description, None);

        let script = runner.last_script().unwrap();
        assert_eq!(
            script.values(),
            vec!["Work", "2026-10-19T09:00:00", "2026-10-26T09:00:00"]
        );
    }

    #[tokio::test]
    async fn test_oversized_lookahead_is_invalid_input() {
        let (calendar, runner) = adapter(ReplayRunner::new());

        let err = calendar.list_events(u32::MAX, None).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        let err = calendar.search_events("stand", u32::MAX, None).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert!(runner.scripts().is_empty());
    }

    #[tokio::test]
    async fn test_process_failure_is_process_kind() {
        let (calendar, _) = adapter(
            ReplayRunner::new()
                .fail_exit(1, "Calendar got an error: not authorized")
                .fail_exit(1, "Calendar got an error: not authorized"),
        );

        let err = calendar.list_events(7, None).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Process);
        let err = calendar.list_calendars().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Process);
    }

    #[tokio::test]
    async fn test_interpreter_warning_leaves_result_unchanged() {
        let output = encode(&row("Standup", "2026-10-20T09:30:00", "2026-10-20T09:45:00", ""));
        let warning = "osascript: deprecated scripting addition";
        let (calendar, _) = adapter(ReplayRunner::new().reply_with_warning(output, warning));

        let events = calendar.list_events(7, None).await.unwrap().found().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Standup");
        assert_eq!(events[0].start, at("2026-10-20T09:30:00"));
    }

    #[tokio::test]
    async fn test_window_upper_bound_is_inclusive() {
        let output = encode_batch(&[
            row("Edge", "2026-10-26T09:00:00", "2026-10-26T10:00:00", ""),
            row("Past edge", "2026-10-26T09:00:01", "2026-10-26T10:00:00", ""),
        ]);
        let (calendar, _) = adapter(ReplayRunner::new().reply(output));

        let events = calendar.list_events(7, None).await.unwrap().found().unwrap();
        let summaries: Vec<_> = events.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Edge"]);
    }

    #[tokio::test]
    async fn test_search_matches_lowercase_query() {
        let output = encode_batch(&[
            row("Standup", "2026-10-20T09:30:00", "2026-10-20T09:45:00", ""),
            row("Planning", "2026-10-21T09:30:00", "2026-10-21T10:30:00", "after the stand-up"),
        ]);
        let (calendar, runner) = adapter(ReplayRunner::new().reply(output));

        let events = calendar
            .search_events("stand", DEFAULT_SEARCH_DAYS, None)
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(events.len(), 2);

        let script = runner.last_script().unwrap();
        assert_eq!(script.value_of(&SEARCH_EVENTS, "to"), Some("2027-01-17T09:00:00"));
    }

    #[tokio::test]
    async fn test_explicit_calendar_overrides_default() {
        let (calendar, runner) = adapter(ReplayRunner::new().reply(""));
        let outcome = calendar.list_events(1, Some("Home")).await.unwrap();

        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(runner.last_script().unwrap().values()[0], "Home");
    }

    #[tokio::test]
    async fn test_get_event_exact_match_only() {
        let output = encode(&row("standup", "2026-10-20T09:30:00", "2026-10-20T09:45:00", ""));
        let (calendar, _) = adapter(ReplayRunner::new().reply(output));

        assert_eq!(
            calendar.get_event("Standup", None).await.unwrap(),
            Outcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_create_event_normalizes_dates_and_omits_blanks() {
        let output = encode(&row("Dentist", "2026-10-22T14:00:00", "2026-10-22T15:00:00", ""));
        let (calendar, runner) = adapter(ReplayRunner::new().reply(output));

        let created = calendar
            .create_event(NewEvent {
                summary: "Dentist".to_string(),
                start: "2026-10-22 14:00".to_string(),
                end: "2026-10-22T15:00".to_string(),
                location: Some(String::new()),
                ..NewEvent::default()
            })
            .await
            .unwrap()
            .found()
            .unwrap();
        assert_eq!(created.start, at("2026-10-22T14:00:00"));

        let script = runner.last_script().unwrap();
        assert_eq!(
            script.values(),
            vec!["Work", "Dentist", "2026-10-22T14:00:00", "2026-10-22T15:00:00", "", "", ""]
        );
    }

    #[tokio::test]
    async fn test_create_event_rejects_inverted_range() {
        let (calendar, runner) = adapter(ReplayRunner::new());
        let err = calendar
            .create_event(NewEvent {
                summary: "Backwards".to_string(),
                start: "2026-10-22T15:00".to_string(),
                end: "2026-10-22T14:00".to_string(),
                ..NewEvent::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert!(runner.scripts().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_date_is_malformed() {
        let output = encode(&row("Standup", "Tuesday", "2026-10-20T09:45:00", ""));
        let (calendar, _) = adapter(ReplayRunner::new().reply(output));

        let err = calendar.list_events(7, None).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidField { field: "start", .. }));
    }

    #[tokio::test]
    async fn test_delete_event_not_found() {
        let (calendar, _) = adapter(ReplayRunner::new().reply(""));
        assert_eq!(
            calendar.delete_event("Standup", None).await.unwrap(),
            Outcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_calendars() {
        let (calendar, _) = adapter(ReplayRunner::new().reply("Home:::Work"));
        assert_eq!(
            calendar.list_calendars().await.unwrap().found().unwrap(),
            vec!["Home", "Work"]
        );
    }
}
