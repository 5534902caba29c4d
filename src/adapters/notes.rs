//! Notes adapter (document store)

use super::{contains_ci, decode_all, decode_one, invoke, non_blank, require_text, FromRecord};
use crate::osa::codec::RawRecord;
use crate::osa::{
    Application, BridgeError, BridgeResult, Operation, Outcome, ParamSpec, Params, ScriptRunner,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
}

impl FromRecord for Note {
    const KIND: &'static str = "note";
    const FIELDS: usize = 3;

    fn from_fields(record: &RawRecord) -> Result<Self, BridgeError> {
        Ok(Note {
            id: record.text(0).unwrap_or_default(),
            title: record.text(1).unwrap_or_default(),
            body: record.text(2).unwrap_or_default(),
        })
    }
}

/// Changes applied by [`NotesAdapter::edit`]; at least one must be set
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub body: Option<String>,
    pub new_title: Option<String>,
}

const NOTE_HANDLERS: &str = r#"
on noteRow(n)
	tell application "Notes"
		set noteId to id of n
		set noteTitle to name of n
		set noteBody to plaintext of n
	end tell
	return my joinText({my esc(noteId), my esc(noteTitle), my esc(noteBody)}, fieldSep)
end noteRow

on noteRows(theNotes)
	set rows to {}
	repeat with n in theNotes
		set end of rows to my noteRow(contents of n)
	end repeat
	return my joinText(rows, recordSep)
end noteRows

on findNote(theTitle)
	tell application "Notes" to set candidates to (every note whose name is theTitle)
	repeat with n in candidates
		tell application "Notes" to set noteTitle to name of n
		considering case
			if noteTitle is theTitle then return contents of n
		end considering
	end repeat
	return missing value
end findNote
"#;

pub(crate) const LIST: Operation = Operation {
    name: "notes_list",
    application: Application::Notes,
    params: &[],
    handlers: NOTE_HANDLERS,
    body: r#"	tell application "Notes" to set allNotes to every note
	return my noteRows(allNotes)"#,
};

pub(crate) const SEARCH: Operation = Operation {
    name: "notes_search",
    application: Application::Notes,
    params: &[ParamSpec::required("query")],
    handlers: NOTE_HANDLERS,
    body: r#"	tell application "Notes" to set found to (every note whose name contains p_query or plaintext contains p_query)
	return my noteRows(found)"#,
};

pub(crate) const GET: Operation = Operation {
    name: "notes_get",
    application: Application::Notes,
    params: &[ParamSpec::required("title")],
    handlers: NOTE_HANDLERS,
    body: r#"	set n to my findNote(p_title)
	if n is missing value then return ""
	return my noteRow(n)"#,
};

pub(crate) const CREATE: Operation = Operation {
    name: "notes_create",
    application: Application::Notes,
    params: &[
        ParamSpec::required("title"),
        ParamSpec::required("body"),
        ParamSpec::optional("folder"),
    ],
    handlers: NOTE_HANDLERS,
    body: r#"	tell application "Notes"
		if p_folder is "" then
			set newNote to make new note with properties {name:p_title, body:p_body}
		else
			set newNote to make new note at folder p_folder with properties {name:p_title, body:p_body}
		end if
	end tell
	return my noteRow(newNote)"#,
};

pub(crate) const EDIT: Operation = Operation {
    name: "notes_edit",
    application: Application::Notes,
    params: &[
        ParamSpec::required("title"),
        ParamSpec::optional("body"),
        ParamSpec::optional("new_title"),
    ],
    handlers: NOTE_HANDLERS,
    body: r#"	set n to my findNote(p_title)
	if n is missing value then return ""
	tell application "Notes"
		if p_body is not "" then set body of n to p_body
		if p_new_title is not "" then set name of n to p_new_title
	end tell
	return my noteRow(n)"#,
};

pub(crate) const DELETE: Operation = Operation {
    name: "notes_delete",
    application: Application::Notes,
    params: &[ParamSpec::required("title")],
    handlers: NOTE_HANDLERS,
    body: r#"	set n to my findNote(p_title)
	if n is missing value then return ""
	set deletedRow to my noteRow(n)
	tell application "Notes" to delete n
	return deletedRow"#,
};

pub(crate) const LIST_FOLDERS: Operation = Operation {
    name: "notes_list_folders",
    application: Application::Notes,
    params: &[],
    handlers: "",
    body: r#"	tell application "Notes" to set folderNames to name of every folder
	set rows to {}
	repeat with folderName in folderNames
		set end of rows to my esc(contents of folderName)
	end repeat
	return my joinText(rows, recordSep)"#,
};

pub struct NotesAdapter {
    runner: Arc<dyn ScriptRunner>,
}

impl NotesAdapter {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    pub async fn create(&self, title: &str, body: &str, folder: Option<&str>) -> BridgeResult<Note> {
        require_text("title", title)?;
        let params = Params::new()
            .with("title", title)
            .with("body", body)
            .with_opt("folder", non_blank(folder));

        let output = invoke(self.runner.as_ref(), &CREATE, &params).await?;
        let note: Note = decode_one(&output)?;
        tracing::info!(id = %note.id, "Created note '{}'", note.title);
        Ok(Outcome::Found(note))
    }

    pub async fn list(&self) -> BridgeResult<Vec<Note>> {
        let output = invoke(self.runner.as_ref(), &LIST, &Params::new()).await?;
        Ok(Outcome::from_batch(decode_all(&output)?))
    }

    /// Notes whose title or body contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> BridgeResult<Vec<Note>> {
        require_text("query", query)?;
        let params = Params::new().with("query", query);
        let output = invoke(self.runner.as_ref(), &SEARCH, &params).await?;

        let notes: Vec<Note> = decode_all(&output)?;
        Ok(Outcome::from_batch(
            notes
                .into_iter()
                .filter(|n| contains_ci(&n.title, query) || contains_ci(&n.body, query))
                .collect(),
        ))
    }

    /// First note whose title equals `title` exactly
    pub async fn get(&self, title: &str) -> BridgeResult<Note> {
        require_text("title", title)?;
        let params = Params::new().with("title", title);
        let output = invoke(self.runner.as_ref(), &GET, &params).await?;
        Ok(first_titled(decode_all(&output)?, title))
    }

    pub async fn edit(&self, title: &str, changes: NoteChanges) -> BridgeResult<Note> {
        require_text("title", title)?;
        let body = non_blank(changes.body.as_deref());
        let new_title = non_blank(changes.new_title.as_deref());
        if body.is_none() && new_title.is_none() {
            return Err(BridgeError::invalid_parameter(
                "changes",
                "provide a new body or a new title",
            ));
        }

        let params = Params::new()
            .with("title", title)
            .with_opt("body", body)
            .with_opt("new_title", new_title);
        let output = invoke(self.runner.as_ref(), &EDIT, &params).await?;

        // The script only emits a row after it has changed the matched note
        let edited: Vec<Note> = decode_all(&output)?;
        let outcome = Outcome::from(edited.into_iter().next());
        if let Outcome::Found(note) = &outcome {
            tracing::info!(id = %note.id, "Edited note '{}'", note.title);
        }
        Ok(outcome)
    }

    /// Delete the first note titled exactly `title`, returning it
    pub async fn delete(&self, title: &str) -> BridgeResult<Note> {
        require_text("title", title)?;
        let params = Params::new().with("title", title);
        let output = invoke(self.runner.as_ref(), &DELETE, &params).await?;

        let outcome = first_titled(decode_all(&output)?, title);
        if let Outcome::Found(note) = &outcome {
            tracing::info!(id = %note.id, "Deleted note '{}'", note.title);
        }
        Ok(outcome)
    }

    pub async fn list_folders(&self) -> BridgeResult<Vec<String>> {
        let output = invoke(self.runner.as_ref(), &LIST_FOLDERS, &Params::new()).await?;
        let folders = crate::osa::codec::decode_batch(&output.stdout)
            .iter()
            .filter_map(|record| record.optional_text(0))
            .collect();
        Ok(Outcome::from_batch(folders))
    }
}

fn first_titled(notes: Vec<Note>, title: &str) -> Outcome<Note> {
    notes.into_iter().find(|n| n.title == title).into()
}
