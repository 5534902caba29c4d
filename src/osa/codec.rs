//! Record Codec
//!
//! Wire format shared with the generated scripts:
//! - fields of one record are joined by `|||`
//! - records of one batch are joined by `:::`
//! - items of a multi-valued field are joined by `,`
//!
//! Inside a field every `\`, `|`, `:` and `,` is written with a leading `\`,
//! so delimiters never appear unescaped in content. Decoding never fails;
//! shape checks belong to the adapters.

pub const FIELD_DELIMITER: &str = "|||";
pub const RECORD_DELIMITER: &str = ":::";
pub const LIST_DELIMITER: &str = ",";
pub const ESCAPE: char = '\\';

const RESERVED: [char; 4] = [ESCAPE, '|', ':', ','];

/// One field value on the encoding side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireField {
    Text(String),
    List(Vec<String>),
}

impl WireField {
    pub fn text(value: impl Into<String>) -> Self {
        WireField::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WireField::List(items.into_iter().map(Into::into).collect())
    }

    fn encoded(&self) -> String {
        match self {
            WireField::Text(value) => escape(value),
            WireField::List(items) => encode_list(items),
        }
    }
}

impl From<&str> for WireField {
    fn from(value: &str) -> Self {
        WireField::Text(value.to_string())
    }
}

impl From<String> for WireField {
    fn from(value: String) -> Self {
        WireField::Text(value)
    }
}

/// Escape reserved characters so the value can sit inside a field
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if RESERVED.contains(&ch) {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Reverse of [`escape`]. A trailing lone escape is kept literally.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push(ESCAPE),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Encode one record
pub fn encode(fields: &[WireField]) -> String {
    fields
        .iter()
        .map(WireField::encoded)
        .collect::<Vec<_>>()
        .join(FIELD_DELIMITER)
}

/// Encode a batch of records
pub fn encode_batch(records: &[Vec<WireField>]) -> String {
    records
        .iter()
        .map(|fields| encode(fields))
        .collect::<Vec<_>>()
        .join(RECORD_DELIMITER)
}

/// Encode the items of a multi-valued field
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| escape(item.as_ref()))
        .collect::<Vec<_>>()
        .join(LIST_DELIMITER)
}

/// Decode a script's output into records.
///
/// Empty input yields no records. Callers report that as "not found", not as
/// an empty batch.
pub fn decode_batch(text: &str) -> Vec<RawRecord> {
    if text.is_empty() {
        return Vec::new();
    }

    split_unescaped(text, RECORD_DELIMITER)
        .into_iter()
        .map(|chunk| RawRecord {
            fields: split_unescaped(chunk, FIELD_DELIMITER)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect()
}

/// Split a raw (still escaped) multi-valued field into its items.
/// Empty items are dropped.
pub fn decode_list(raw_field: &str) -> Vec<String> {
    split_unescaped(raw_field, LIST_DELIMITER)
        .into_iter()
        .filter(|item| !item.is_empty())
        .map(unescape)
        .collect()
}

fn split_unescaped<'a>(text: &'a str, delimiter: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices();

    while let Some((idx, ch)) = chars.next() {
        if ch == ESCAPE {
            chars.next();
            continue;
        }
        if text[idx..].starts_with(delimiter) {
            parts.push(&text[start..idx]);
            start = idx + delimiter.len();
            for _ in 1..delimiter.chars().count() {
                chars.next();
            }
        }
    }
    parts.push(&text[start..]);
    parts
}

/// A decoded record whose fields are still in wire form.
///
/// Accessors unescape on demand so multi-valued fields can still be split on
/// their unescaped list delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<String>,
}

impl RawRecord {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field text, or `None` when the record is too short
    pub fn text(&self, index: usize) -> Option<String> {
        self.fields.get(index).map(|raw| unescape(raw))
    }

    /// Field text, treating an empty field the same as an absent one
    pub fn optional_text(&self, index: usize) -> Option<String> {
        self.text(index).filter(|value| !value.is_empty())
    }

    pub fn list(&self, index: usize) -> Vec<String> {
        self.fields
            .get(index)
            .map(|raw| decode_list(raw))
            .unwrap_or_default()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.fields.iter().map(|raw| unescape(raw)).collect()
    }
}
