//! Notes tools

use super::{render_outcome, Tool, ToolMetadata, ToolResult};
use crate::adapters::{NoteChanges, NotesAdapter};
use crate::{tool_metadata, validate_optional_string, validate_required_string};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

macro_rules! notes_tool {
    ($name:ident) => {
        pub struct $name {
            notes: Arc<NotesAdapter>,
        }

        impl $name {
            pub fn new(notes: Arc<NotesAdapter>) -> Self {
                Self { notes }
            }
        }
    };
}

notes_tool!(CreateNoteTool);
notes_tool!(ListNotesTool);
notes_tool!(SearchNotesTool);
notes_tool!(GetNoteTool);
notes_tool!(EditNoteTool);
notes_tool!(DeleteNoteTool);
notes_tool!(ListFoldersTool);

#[async_trait]
impl Tool for CreateNoteTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_create",
            description: "Create a note with a title and body, optionally inside a named folder.",
            parameters: [
                {
                    name: "title",
                    type: "string",
                    description: "Title of the new note",
                    required: true
                },
                {
                    name: "body",
                    type: "string",
                    description: "Text content of the note",
                    required: true
                },
                {
                    name: "folder",
                    type: "string",
                    description: "Folder to create the note in; the default folder when omitted",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        let title = validate_required_string!(args, "title");
        validate_required_string!(args, "body");
        validate_optional_string!(args, "folder");
        if title.trim().is_empty() {
            return Err(anyhow::anyhow!("'title' cannot be empty"));
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let title = validate_required_string!(args, "title");
        let body = validate_required_string!(args, "body");
        let folder = validate_optional_string!(args, "folder");

        let outcome = self.notes.create(title, body, folder).await?;
        render_outcome(
            outcome,
            |note| format!("Created note \"{}\".", note.title),
            || format!("Note \"{}\" was not created.", title),
        )
    }
}

#[async_trait]
impl Tool for ListNotesTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_list",
            description: "List every note with its id, title and body.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let outcome = self.notes.list().await?;
        render_outcome(
            outcome,
            |notes| format!("Found {} notes.", notes.len()),
            || "No notes found.".to_string(),
        )
    }
}

#[async_trait]
impl Tool for SearchNotesTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_search",
            description: "Find notes whose title or body contains the query (case-insensitive).",
            parameters: [
                {
                    name: "query",
                    type: "string",
                    description: "Text to look for",
                    required: true
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "query");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let query = validate_required_string!(args, "query");
        let outcome = self.notes.search(query).await?;
        render_outcome(
            outcome,
            |notes| format!("Found {} notes matching \"{}\".", notes.len(), query),
            || format!("No notes match \"{}\".", query),
        )
    }
}

#[async_trait]
impl Tool for GetNoteTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_get",
            description: "Fetch the first note whose title matches exactly.",
            parameters: [
                {
                    name: "title",
                    type: "string",
                    description: "Exact title of the note",
                    required: true
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "title");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let title = validate_required_string!(args, "title");
        let outcome = self.notes.get(title).await?;
        render_outcome(
            outcome,
            |note| format!("Note \"{}\":", note.title),
            || format!("No note titled \"{}\" was found.", title),
        )
    }
}

#[async_trait]
impl Tool for EditNoteTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_edit",
            description: "Replace the body and/or the title of the note whose title matches exactly.",
            parameters: [
                {
                    name: "title",
                    type: "string",
                    description: "Exact title of the note to edit",
                    required: true
                },
                {
                    name: "body",
                    type: "string",
                    description: "New body text",
                    required: false
                },
                {
                    name: "new_title",
                    type: "string",
                    description: "New title",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "title");
        let body = validate_optional_string!(args, "body");
        let new_title = validate_optional_string!(args, "new_title");
        if body.is_none() && new_title.is_none() {
            return Err(anyhow::anyhow!("Provide 'body' or 'new_title'"));
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let title = validate_required_string!(args, "title");
        let changes = NoteChanges {
            body: validate_optional_string!(args, "body").map(str::to_string),
            new_title: validate_optional_string!(args, "new_title").map(str::to_string),
        };

        let outcome = self.notes.edit(title, changes).await?;
        render_outcome(
            outcome,
            |note| format!("Updated note \"{}\".", note.title),
            || format!("No note titled \"{}\" was found.", title),
        )
    }
}

#[async_trait]
impl Tool for DeleteNoteTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_delete",
            description: "Delete the first note whose title matches exactly.",
            parameters: [
                {
                    name: "title",
                    type: "string",
                    description: "Exact title of the note to delete",
                    required: true
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "title");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let title = validate_required_string!(args, "title");
        let outcome = self.notes.delete(title).await?;
        render_outcome(
            outcome,
            |note| format!("Deleted note \"{}\".", note.title),
            || format!("No note titled \"{}\" was found.", title),
        )
    }
}

#[async_trait]
impl Tool for ListFoldersTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "notes_list_folders",
            description: "List the names of all note folders.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let outcome = self.notes.list_folders().await?;
        render_outcome(
            outcome,
            |folders| format!("Found {} folders.", folders.len()),
            || "No folders found.".to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osa::codec::{encode, WireField};
    use crate::osa::ReplayRunner;
    use serde_json::json;

    fn tool<T>(make: fn(Arc<NotesAdapter>) -> T, runner: ReplayRunner) -> T {
        make(Arc::new(NotesAdapter::new(Arc::new(runner))))
    }

    #[tokio::test]
    async fn test_get_note_renders_json() {
        let row: Vec<WireField> = vec!["x-1".into(), "Groceries".into(), "milk".into()];
        let get = tool(GetNoteTool::new, ReplayRunner::new().reply(encode(&row)));

        let result = get.execute(json!({"title": "Groceries"})).await.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("Note \"Groceries\":"));
        assert!(result.output.contains("\"body\": \"milk\""));
    }

    #[tokio::test]
    async fn test_get_note_not_found_message() {
        let get = tool(GetNoteTool::new, ReplayRunner::new().reply(""));
        let result = get.execute(json!({"title": "Nope"})).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "No note titled \"Nope\" was found.");
    }

    #[test]
    fn test_edit_requires_change() {
        let edit = tool(EditNoteTool::new, ReplayRunner::new());
        assert!(edit.validate(&json!({"title": "Trip"})).is_err());
        assert!(edit.validate(&json!({"title": "Trip", "body": "pack"})).is_ok());
    }

    #[test]
    fn test_create_requires_title_and_body() {
        let create = tool(CreateNoteTool::new, ReplayRunner::new());
        assert!(create.validate(&json!({"title": "Trip"})).is_err());
        assert!(create.validate(&json!({"title": " ", "body": "x"})).is_err());
        assert!(create.validate(&json!({"title": "Trip", "body": ""})).is_ok());
    }
}
