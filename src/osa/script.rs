//! Script Builder
//!
//! Renders an `on run argv` script for one operation. Parameter values never
//! enter the script text: each declared parameter is bound positionally from
//! the argument vector handed to the interpreter. Every argument carries a
//! leading [`ARG_MARKER`] so the interpreter never mistakes a value for one of
//! its own options; the generated `arg` handler strips it again.

use super::codec::{FIELD_DELIMITER, LIST_DELIMITER, RECORD_DELIMITER};
use super::error::BridgeError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const ARG_MARKER: char = '=';

/// Scriptable application targeted by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Application {
    Notes,
    Calendar,
    Contacts,
}

impl Application {
    /// Name used in `tell application "..."`
    pub fn script_name(&self) -> &'static str {
        match self {
            Application::Notes => "Notes",
            Application::Calendar => "Calendar",
            Application::Contacts => "Contacts",
        }
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
    pub default: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            default: "",
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            default: "",
        }
    }
}

/// Static description of one scripted operation
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub application: Application,
    pub params: &'static [ParamSpec],
    /// Domain handlers placed beside the run handler
    pub handlers: &'static str,
    /// Statements of the run handler, after parameter binding
    pub body: &'static str,
}

/// Parameter values for one invocation
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Set the parameter only when a value is present
    pub fn with_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A rendered script ready for the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub application: Application,
    pub operation: &'static str,
    pub body: String,
    pub args: Vec<String>,
}

impl Script {
    /// Argument values with the marker removed, in binding order
    pub fn values(&self) -> Vec<&str> {
        self.args
            .iter()
            .map(|arg| arg.strip_prefix(ARG_MARKER).unwrap_or(arg))
            .collect()
    }

    /// Value bound to `name`, looked up through the operation's parameter order
    pub fn value_of(&self, operation: &Operation, name: &str) -> Option<&str> {
        let index = operation.params.iter().position(|p| p.name == name)?;
        self.values().get(index).copied()
    }
}

const HELPERS: &str = r#"
on arg(argv, i)
	set raw to item i of argv
	if length of raw is 1 then return ""
	return text 2 thru -1 of raw
end arg

on esc(theValue)
	if theValue is missing value then return ""
	set theText to theValue as text
	set savedDelims to AppleScript's text item delimiters
	repeat with pair in {{"\\", "\\\\"}, {"|", "\\|"}, {":", "\\:"}, {",", "\\,"}}
		set AppleScript's text item delimiters to item 1 of pair
		set parts to text items of theText
		set AppleScript's text item delimiters to item 2 of pair
		set theText to parts as text
	end repeat
	set AppleScript's text item delimiters to savedDelims
	return theText
end esc

on joinText(theItems, separator)
	set savedDelims to AppleScript's text item delimiters
	set AppleScript's text item delimiters to separator
	set joined to theItems as text
	set AppleScript's text item delimiters to savedDelims
	return joined
end joinText

on escList(theValues)
	set escaped to {}
	repeat with v in theValues
		set end of escaped to my esc(contents of v)
	end repeat
	return my joinText(escaped, listSep)
end escList

on pad2(n)
	return text -2 thru -1 of ("0" & (n as integer))
end pad2

on isoDateTime(d)
	if d is missing value then return ""
	set t to time of d
	return ((year of d) as integer as text) & "-" & my pad2(month of d as integer) & "-" & my pad2(day of d) & "T" & my pad2(t div hours) & ":" & my pad2((t mod hours) div minutes) & ":" & my pad2(t mod minutes)
end isoDateTime

on isoDay(d)
	if d is missing value then return ""
	return text 1 thru 10 of my isoDateTime(d)
end isoDay

on parseIso(s)
	set d to current date
	set day of d to 1
	set year of d to (text 1 thru 4 of s) as integer
	set month of d to (text 6 thru 7 of s) as integer
	set day of d to (text 9 thru 10 of s) as integer
	set time of d to 0
	if length of s ≥ 19 then
		set time of d to ((text 12 thru 13 of s) as integer) * hours + ((text 15 thru 16 of s) as integer) * minutes + ((text 18 thru 19 of s) as integer)
	end if
	return d
end parseIso
"#;

fn delimiter_properties() -> String {
    format!(
        "property fieldSep : \"{}\"\nproperty recordSep : \"{}\"\nproperty listSep : \"{}\"\n",
        FIELD_DELIMITER, RECORD_DELIMITER, LIST_DELIMITER
    )
}

/// Render `operation` with `params` into an executable script.
///
/// Fails only on caller errors: unknown or missing required parameters and
/// values that cannot be passed as a process argument.
pub fn render(operation: &Operation, params: &Params) -> Result<Script, BridgeError> {
    for name in params.values.keys() {
        if !operation.params.iter().any(|spec| spec.name == name) {
            return Err(BridgeError::invalid_parameter(
                name,
                format!("not accepted by operation '{}'", operation.name),
            ));
        }
    }

    let mut args = Vec::with_capacity(operation.params.len());
    let mut bindings = String::new();

    for (index, spec) in operation.params.iter().enumerate() {
        let value = match params.get(spec.name) {
            Some(value) => value,
            None if spec.required => {
                return Err(BridgeError::invalid_parameter(spec.name, "is required"));
            }
            None => spec.default,
        };

        if value.contains('\0') {
            return Err(BridgeError::invalid_parameter(
                spec.name,
                "must not contain NUL characters",
            ));
        }

        args.push(format!("{}{}", ARG_MARKER, value));
        bindings.push_str(&format!(
            "\tset p_{} to my arg(argv, {})\n",
            spec.name,
            index + 1
        ));
    }

    let mut body = delimiter_properties();
    body.push_str(HELPERS);
    body.push_str(operation.handlers);
    body.push_str("\non run argv\n");
    body.push_str(&bindings);
    body.push_str(operation.body);
    body.push_str("\nend run\n");

    Ok(Script {
        application: operation.application,
        operation: operation.name,
        body,
        args,
    })
}
