//! Domain Adapters
//!
//! Information Hiding:
//! - Script templates and their parameter order hidden per domain
//! - Wire records mapped to typed values before leaving the adapter
//! - Every operation answers `Found`, `NotFound` or a classified `BridgeError`

pub mod calendar;
pub mod contacts;
pub mod notes;
pub mod time;

pub use calendar::{CalendarAdapter, Event, NewEvent};
pub use contacts::{Contact, ContactChanges, ContactsAdapter, NewContact};
pub use notes::{Note, NoteChanges, NotesAdapter};
pub use time::{Clock, FixedClock, SystemClock, TimeWindow};

use crate::osa::codec::{self, RawRecord};
use crate::osa::{script, BridgeError, Operation, Params, ScriptOutput, ScriptRunner};

/// Typed view of one wire record
pub(crate) trait FromRecord: Sized {
    /// Name used in malformed-record errors
    const KIND: &'static str;
    /// Number of fields the scripts emit for this record
    const FIELDS: usize;

    fn from_fields(record: &RawRecord) -> Result<Self, BridgeError>;

    fn from_record(record: &RawRecord) -> Result<Self, BridgeError> {
        if record.len() < Self::FIELDS {
            return Err(BridgeError::MalformedRecord {
                kind: Self::KIND,
                expected: Self::FIELDS,
                found: record.len(),
            });
        }
        Self::from_fields(record)
    }
}

/// Render and run one operation
pub(crate) async fn invoke(
    runner: &dyn ScriptRunner,
    operation: &Operation,
    params: &Params,
) -> Result<ScriptOutput, BridgeError> {
    let script = script::render(operation, params)?;
    runner.run(&script).await
}

/// Decode every record of a run's output
pub(crate) fn decode_all<T: FromRecord>(output: &ScriptOutput) -> Result<Vec<T>, BridgeError> {
    codec::decode_batch(&output.stdout)
        .iter()
        .map(T::from_record)
        .collect()
}

/// Decode the record of an operation that must return exactly one item
pub(crate) fn decode_one<T: FromRecord>(output: &ScriptOutput) -> Result<T, BridgeError> {
    decode_all::<T>(output)?
        .into_iter()
        .next()
        .ok_or(BridgeError::MalformedRecord {
            kind: T::KIND,
            expected: T::FIELDS,
            found: 0,
        })
}

/// Identifier arguments (titles, names, queries) must carry text
pub(crate) fn require_text(name: &str, value: &str) -> Result<(), BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::invalid_parameter(name, "must not be empty"));
    }
    Ok(())
}

/// Blank optional values are treated as absent so scripts never set them
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Case-insensitive containment, the scripting applications' default
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Standup", "stand"));
        assert!(contains_ci("weekly STANDUP", "Standup"));
        assert!(!contains_ci("Retro", "stand"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some("Acme")), Some("Acme"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "").is_err());
        assert!(require_text("title", " \t").is_err());
        assert!(require_text("title", "Groceries").is_ok());
    }
}
