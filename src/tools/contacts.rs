//! Contacts tools

use super::{render_outcome, Tool, ToolMetadata, ToolResult};
use crate::adapters::time::parse_day;
use crate::adapters::{ContactChanges, ContactsAdapter, NewContact};
use crate::{tool_metadata, validate_optional_string, validate_required_string};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const NAME_PARAM_DESCRIPTION: &str = "Full display name, e.g. \"Jane Doe\"";

fn optional_owned(args: &Value, name: &str) -> Result<Option<String>> {
    Ok(validate_optional_string!(args, name).map(str::to_string))
}

fn not_found(name: &str) -> String {
    format!("No contact named \"{}\" was found.", name)
}

pub struct ListContactsTool {
    contacts: Arc<ContactsAdapter>,
}

impl ListContactsTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for ListContactsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_list",
            description: "List every contact with emails, phones, organization and birthday.",
            parameters: []
        }
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let outcome = self.contacts.list().await?;
        render_outcome(
            outcome,
            |people| format!("Found {} contacts.", people.len()),
            || "No contacts found.".to_string(),
        )
    }
}

pub struct SearchContactsTool {
    contacts: Arc<ContactsAdapter>,
}

impl SearchContactsTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for SearchContactsTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_search",
            description: "Find contacts whose name or organization contains the query (case-insensitive).",
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
        let outcome = self.contacts.search(query).await?;
        render_outcome(
            outcome,
            |people| format!("Found {} contacts matching \"{}\".", people.len(), query),
            || format!("No contacts match \"{}\".", query),
        )
    }
}

pub struct GetContactTool {
    contacts: Arc<ContactsAdapter>,
}

impl GetContactTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for GetContactTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_get",
            description: "Fetch the first contact whose name matches exactly.",
            parameters: [
                {
                    name: "name",
                    type: "string",
                    description: NAME_PARAM_DESCRIPTION,
                    required: true
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "name");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let name = validate_required_string!(args, "name");
        let outcome = self.contacts.get(name).await?;
        render_outcome(
            outcome,
            |person| format!("Contact \"{}\":", person.name),
            || not_found(name),
        )
    }
}

pub struct CreateContactTool {
    contacts: Arc<ContactsAdapter>,
}

impl CreateContactTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for CreateContactTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_create",
            description: "Create a contact. The name is split into first and last name at the first space.",
            parameters: [
                {
                    name: "name",
                    type: "string",
                    description: NAME_PARAM_DESCRIPTION,
                    required: true
                },
                {
                    name: "email",
                    type: "string",
                    description: "Work email address",
                    required: false
                },
                {
                    name: "phone",
                    type: "string",
                    description: "Mobile phone number",
                    required: false
                },
                {
                    name: "organization",
                    type: "string",
                    description: "Company or organization",
                    required: false
                },
                {
                    name: "birthday",
                    type: "string",
                    description: "Birthday as YYYY-MM-DD",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        let name = validate_required_string!(args, "name");
        if name.trim().is_empty() {
            return Err(anyhow::anyhow!("'name' cannot be empty"));
        }
        if let Some(birthday) = validate_optional_string!(args, "birthday") {
            parse_day("birthday", birthday)?;
        }
        for optional in ["email", "phone", "organization"] {
            validate_optional_string!(args, optional);
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let birthday = match validate_optional_string!(args, "birthday") {
            Some(raw) => Some(parse_day("birthday", raw)?),
            None => None,
        };
        let contact = NewContact {
            name: validate_required_string!(args, "name").to_string(),
            email: optional_owned(&args, "email")?,
            phone: optional_owned(&args, "phone")?,
            organization: optional_owned(&args, "organization")?,
            birthday,
        };
        let name = contact.name.clone();

        let outcome = self.contacts.create(contact).await?;
        render_outcome(
            outcome,
            |person| format!("Created contact \"{}\".", person.name),
            || format!("Contact \"{}\" was not created.", name),
        )
    }
}

pub struct EditContactTool {
    contacts: Arc<ContactsAdapter>,
}

impl EditContactTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for EditContactTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_edit",
            description: "Set the organization, or add an email or phone, on the contact whose name matches exactly.",
            parameters: [
                {
                    name: "name",
                    type: "string",
                    description: NAME_PARAM_DESCRIPTION,
                    required: true
                },
                {
                    name: "organization",
                    type: "string",
                    description: "New organization",
                    required: false
                },
                {
                    name: "email",
                    type: "string",
                    description: "Email address to add",
                    required: false
                },
                {
                    name: "phone",
                    type: "string",
                    description: "Phone number to add",
                    required: false
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "name");
        let changes = [
            validate_optional_string!(args, "organization"),
            validate_optional_string!(args, "email"),
            validate_optional_string!(args, "phone"),
        ];
        if changes.iter().all(Option::is_none) {
            return Err(anyhow::anyhow!(
                "Provide at least one of 'organization', 'email' or 'phone'"
            ));
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let name = validate_required_string!(args, "name");
        let changes = ContactChanges {
            organization: optional_owned(&args, "organization")?,
            email: optional_owned(&args, "email")?,
            phone: optional_owned(&args, "phone")?,
        };

        let outcome = self.contacts.edit(name, changes).await?;
        render_outcome(
            outcome,
            |person| format!("Updated contact \"{}\".", person.name),
            || not_found(name),
        )
    }
}

pub struct DeleteContactTool {
    contacts: Arc<ContactsAdapter>,
}

impl DeleteContactTool {
    pub fn new(contacts: Arc<ContactsAdapter>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl Tool for DeleteContactTool {
    fn metadata(&self) -> ToolMetadata {
        tool_metadata! {
            name: "contacts_delete",
            description: "Delete the first contact whose name matches exactly.",
            parameters: [
                {
                    name: "name",
                    type: "string",
                    description: NAME_PARAM_DESCRIPTION,
                    required: true
                }
            ]
        }
    }

    fn validate(&self, args: &Value) -> Result<()> {
        validate_required_string!(args, "name");
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let name = validate_required_string!(args, "name");
        let outcome = self.contacts.delete(name).await?;
        render_outcome(
            outcome,
            |person| format!("Deleted contact \"{}\".", person.name),
            || not_found(name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osa::codec::{encode, WireField};
    use crate::osa::ReplayRunner;
    use serde_json::json;

    fn adapter(runner: ReplayRunner) -> Arc<ContactsAdapter> {
        Arc::new(ContactsAdapter::new(Arc::new(runner)))
    }

    #[tokio::test]
    async fn test_get_contact_omits_missing_organization() {
        let row: Vec<WireField> = vec![
            "p-1".into(),
            "Jane Doe".into(),
            WireField::list(["jane@example.com"]),
            WireField::list(Vec::<String>::new()),
            "".into(),
            "".into(),
        ];
        let get = GetContactTool::new(adapter(ReplayRunner::new().reply(encode(&row))));

        let result = get.execute(json!({"name": "Jane Doe"})).await.unwrap();
        assert!(result.output.starts_with("Contact \"Jane Doe\":"));
        assert!(result.output.contains("jane@example.com"));
        assert!(!result.output.contains("organization"));
    }

    #[tokio::test]
    async fn test_search_matches_organization_not_email() {
        let row: Vec<WireField> = vec![
            "p-1".into(),
            "Jane Doe".into(),
            WireField::list(["jane@acme.example"]),
            WireField::list(Vec::<String>::new()),
            "Initech".into(),
            "".into(),
        ];
        let search = SearchContactsTool::new(adapter(ReplayRunner::new().reply(encode(&row))));
        assert!(search.metadata().description.contains("name or organization"));

        let result = search.execute(json!({"query": "acme"})).await.unwrap();
        assert_eq!(result.output, "No contacts match \"acme\".");
    }

    #[tokio::test]
    async fn test_delete_missing_contact() {
        let delete = DeleteContactTool::new(adapter(ReplayRunner::new()));
        let result = delete.execute(json!({"name": "Nobody"})).await.unwrap();
        assert_eq!(result.output, "No contact named \"Nobody\" was found.");
    }

    #[test]
    fn test_create_validates_birthday() {
        let create = CreateContactTool::new(adapter(ReplayRunner::new()));
        assert!(create
            .validate(&json!({"name": "Jane Doe", "birthday": "April 1st"}))
            .is_err());
        assert!(create
            .validate(&json!({"name": "Jane Doe", "birthday": "1990-04-01"}))
            .is_ok());
    }

    #[test]
    fn test_edit_requires_a_change() {
        let edit = EditContactTool::new(adapter(ReplayRunner::new()));
        assert!(edit.validate(&json!({"name": "Jane Doe"})).is_err());
        assert!(edit
            .validate(&json!({"name": "Jane Doe", "phone": "555-0100"}))
            .is_ok());
    }
}
