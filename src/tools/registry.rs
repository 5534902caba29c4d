//! Tool Registry
//!
//! Information Hiding:
//! - Tool storage and lookup implementation hidden
//! - Registration of the bridge's operations hidden in `for_bridge`
//! - `call` is the error boundary: nothing escapes it as an `Err`

use super::{calendar, contacts, notes, Tool, ToolMetadata, ToolResult};
use crate::Bridge;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a new tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        tracing::debug!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get all tool metadata, sorted by name
    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.values().map(|tool| tool.metadata()).collect()
    }

    /// Get tool metadata as formatted text
    pub fn tools_description(&self) -> String {
        let mut descriptions = Vec::new();
        for tool in self.tools.values() {
            let metadata = tool.metadata();
            let params = metadata
                .parameters
                .iter()
                .map(|p| {
                    let required = if p.required { "required" } else { "optional" };
                    match &p.default {
                        Some(default) => format!(
                            "  - {} ({}): {} [{}, default {}]",
                            p.name, p.param_type, p.description, required, default
                        ),
                        None => format!(
                            "  - {} ({}): {} [{}]",
                            p.name, p.param_type, p.description, required
                        ),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            descriptions.push(format!(
                "Tool: {}\nDescription: {}\nParameters:\n{}",
                metadata.name, metadata.description, params
            ));
        }
        descriptions.join("\n\n")
    }

    /// Validate and run a tool. Every failure comes back as a failed result.
    pub async fn call(&self, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::failure(format!("Unknown tool '{}'", name));
        };

        if let Err(e) = tool.validate(&args) {
            tracing::debug!(tool = name, "Rejected arguments: {}", e);
            return ToolResult::failure(e.to_string());
        }

        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, "Tool failed: {:#}", e);
                ToolResult::failure(format!("{:#}", e))
            }
        }
    }

    /// Registry with one tool per bridge operation
    pub fn for_bridge(bridge: &Bridge) -> Self {
        let mut registry = Self::new();

        let notes = bridge.notes();
        registry.register(Arc::new(notes::CreateNoteTool::new(notes.clone())));
        registry.register(Arc::new(notes::ListNotesTool::new(notes.clone())));
        registry.register(Arc::new(notes::SearchNotesTool::new(notes.clone())));
        registry.register(Arc::new(notes::GetNoteTool::new(notes.clone())));
        registry.register(Arc::new(notes::EditNoteTool::new(notes.clone())));
        registry.register(Arc::new(notes::DeleteNoteTool::new(notes.clone())));
        registry.register(Arc::new(notes::ListFoldersTool::new(notes)));

        let calendar = bridge.calendar();
        registry.register(Arc::new(calendar::ListEventsTool::new(calendar.clone())));
        registry.register(Arc::new(calendar::SearchEventsTool::new(calendar.clone())));
        registry.register(Arc::new(calendar::GetEventTool::new(calendar.clone())));
        registry.register(Arc::new(calendar::CreateEventTool::new(calendar.clone())));
        registry.register(Arc::new(calendar::DeleteEventTool::new(calendar.clone())));
        registry.register(Arc::new(calendar::ListCalendarsTool::new(calendar)));

        let contacts = bridge.contacts();
        registry.register(Arc::new(contacts::ListContactsTool::new(contacts.clone())));
        registry.register(Arc::new(contacts::SearchContactsTool::new(contacts.clone())));
        registry.register(Arc::new(contacts::GetContactTool::new(contacts.clone())));
        registry.register(Arc::new(contacts::CreateContactTool::new(contacts.clone())));
        registry.register(Arc::new(contacts::EditContactTool::new(contacts.clone())));
        registry.register(Arc::new(contacts::DeleteContactTool::new(contacts)));

        tracing::info!("Registered {} tools", registry.tools.len());
        registry
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osa::ReplayRunner;
    use serde_json::json;

    fn registry(runner: ReplayRunner) -> ToolRegistry {
        ToolRegistry::for_bridge(&Bridge::with_runner(Arc::new(runner), "Work"))
    }

    #[test]
    fn test_registry_lists_every_operation() {
        let registry = registry(ReplayRunner::new());

        assert_eq!(registry.list_tools().len(), 19);
        for name in [
            "notes_create",
            "notes_list",
            "notes_search",
            "notes_get",
            "notes_edit",
            "notes_delete",
            "notes_list_folders",
            "calendar_list_events",
            "calendar_search_events",
            "calendar_get_event",
            "calendar_create_event",
            "calendar_delete_event",
            "calendar_list_calendars",
            "contacts_list",
            "contacts_search",
            "contacts_get",
            "contacts_create",
            "contacts_edit",
            "contacts_delete",
        ] {
            assert!(registry.has_tool(name), "missing tool {}", name);
        }
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_tools_description() {
        let description = registry(ReplayRunner::new()).tools_description();

        assert!(description.contains("Tool: calendar_list_events"));
        assert!(description.contains("default 7"));
        assert!(description.contains("Parameters:"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_text() {
        let result = registry(ReplayRunner::new()).call("bogus", json!({})).await;
        assert!(!result.success);
        assert_eq!(result.text(), "Error: Unknown tool 'bogus'");
    }

    #[tokio::test]
    async fn test_validation_failure_is_error_text() {
        let result = registry(ReplayRunner::new())
            .call("notes_get", json!({"title": 42}))
            .await;
        assert!(result.text().starts_with("Error: 'title' parameter"));
    }

    #[tokio::test]
    async fn test_bridge_failure_is_error_text() {
        let runner = ReplayRunner::new().fail_exit(1, "Notes got an error: not authorized");
        let result = registry(runner).call("notes_list", json!({})).await;

        assert!(!result.success);
        assert!(result.text().starts_with("Error: script 'notes_list' exited with exit code 1"));
    }
}
