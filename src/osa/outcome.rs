use serde::Serialize;

/// Result of an operation that ran successfully.
///
/// Failures travel separately as `Err(BridgeError)`; `NotFound` is the one
/// representation of "nothing matched" across every adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Found(T),
    NotFound,
}

impl<T> Outcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            Outcome::NotFound => None,
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// An empty batch collapses to `NotFound`
    pub fn from_batch(items: Vec<T>) -> Self {
        if items.is_empty() {
            Outcome::NotFound
        } else {
            Outcome::Found(items)
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Found(value),
            None => Outcome::NotFound,
        }
    }
}
