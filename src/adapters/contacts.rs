//! Contacts adapter (address book)

use super::time::{format_day, DAY_FORMAT};
use super::{contains_ci, decode_all, decode_one, invoke, non_blank, require_text, FromRecord};
use crate::osa::codec::RawRecord;
use crate::osa::{
    Application, BridgeError, BridgeResult, Operation, Outcome, ParamSpec, Params, ScriptRunner,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
}

impl FromRecord for Contact {
    const KIND: &'static str = "contact";
    const FIELDS: usize = 6;

    fn from_fields(record: &RawRecord) -> Result<Self, BridgeError> {
        let birthday = match record.optional_text(5) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, DAY_FORMAT).map_err(|_| {
                BridgeError::InvalidField {
                    kind: Self::KIND,
                    field: "birthday",
                    reason: format!("is not a date: '{}'", raw),
                }
            })?),
            None => None,
        };

        Ok(Contact {
            id: record.text(0).unwrap_or_default(),
            name: record.text(1).unwrap_or_default(),
            emails: record.list(2),
            phones: record.list(3),
            organization: record.optional_text(4),
            birthday,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Changes applied by [`ContactsAdapter::edit`]; at least one must be set.
/// Emails and phones are added alongside the existing ones.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

const PERSON_HANDLERS: &str = r#"
on personRow(p)
	tell application "Contacts"
		set personId to id of p
		set personName to name of p
		set personEmails to value of every email of p
		set personPhones to value of every phone of p
		set personOrg to organization of p
		set personBirthday to birth date of p
	end tell
	return my joinText({my esc(personId), my esc(personName), my escList(personEmails), my escList(personPhones), my esc(personOrg), my esc(my isoDay(personBirthday))}, fieldSep)
end personRow

on personRows(thePeople)
	set rows to {}
	repeat with p in thePeople
		set end of rows to my personRow(contents of p)
	end repeat
	return my joinText(rows, recordSep)
end personRows

on findPerson(theName)
	tell application "Contacts" to set candidates to (every person whose name is theName)
	repeat with p in candidates
		tell application "Contacts" to set personName to name of p
		considering case
			if personName is theName then return contents of p
		end considering
	end repeat
	return missing value
end findPerson
"#;

pub(crate) const LIST: Operation = Operation {
    name: "contacts_list",
    application: Application::Contacts,
    params: &[],
    handlers: PERSON_HANDLERS,
    body: r#"	tell application "Contacts" to set everyone to every person
	return my personRows(everyone)"#,
};

pub(crate) const SEARCH: Operation = Operation {
    name: "contacts_search",
    application: Application::Contacts,
    params: &[ParamSpec::required("query")],
    handlers: PERSON_HANDLERS,
    body: r#"	tell application "Contacts" to set found to (every person whose name contains p_query or organization contains p_query)
	return my personRows(found)"#,
};

pub(crate) const GET: Operation = Operation {
    name: "contacts_get",
    application: Application::Contacts,
    params: &[ParamSpec::required("name")],
    handlers: PERSON_HANDLERS,
    body: r#"	set p to my findPerson(p_name)
	if p is missing value then return ""
	return my personRow(p)"#,
};

pub(crate) const CREATE: Operation = Operation {
    name: "contacts_create",
    application: Application::Contacts,
    params: &[
        ParamSpec::required("first_name"),
        ParamSpec::optional("last_name"),
        ParamSpec::optional("email"),
        ParamSpec::optional("phone"),
        ParamSpec::optional("organization"),
        ParamSpec::optional("birthday"),
    ],
    handlers: PERSON_HANDLERS,
    body: r#"	tell application "Contacts"
		set newPerson to make new person with properties {first name:p_first_name}
		if p_last_name is not "" then set last name of newPerson to p_last_name
		if p_organization is not "" then set organization of newPerson to p_organization
		if p_email is not "" then make new email at end of emails of newPerson with properties {label:"work", value:p_email}
		if p_phone is not "" then make new phone at end of phones of newPerson with properties {label:"mobile", value:p_phone}
		save
	end tell
	if p_birthday is not "" then
		set birthDate to my parseIso(p_birthday)
		tell application "Contacts"
			set birth date of newPerson to birthDate
			save
		end tell
	end if
	return my personRow(newPerson)"#,
};

pub(crate) const EDIT: Operation = Operation {
    name: "contacts_edit",
    application: Application::Contacts,
    params: &[
        ParamSpec::required("name"),
        ParamSpec::optional("organization"),
        ParamSpec::optional("email"),
        ParamSpec::optional("phone"),
    ],
    handlers: PERSON_HANDLERS,
    body: r#"	set p to my findPerson(p_name)
	if p is missing value then return ""
	tell application "Contacts"
		if p_organization is not "" then set organization of p to p_organization
		if p_email is not "" then make new email at end of emails of p with properties {label:"work", value:p_email}
		if p_phone is not "" then make new phone at end of phones of p with properties {label:"mobile", value:p_phone}
		save
	end tell
	return my personRow(p)"#,
};

pub(crate) const DELETE: Operation = Operation {
    name: "contacts_delete",
    application: Application::Contacts,
    params: &[ParamSpec::required("name")],
    handlers: PERSON_HANDLERS,
    body: r#"	set p to my findPerson(p_name)
	if p is missing value then return ""
	set deletedRow to my personRow(p)
	tell application "Contacts"
		delete p
		save
	end tell
	return deletedRow"#,
};

/// Split a display name into first name and the remainder
fn split_name(name: &str) -> (&str, Option<&str>) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, non_blank(Some(rest.trim()))),
        None => (name, None),
    }
}

pub struct ContactsAdapter {
    runner: Arc<dyn ScriptRunner>,
}

impl ContactsAdapter {
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    pub async fn list(&self) -> BridgeResult<Vec<Contact>> {
        let output = invoke(self.runner.as_ref(), &LIST, &Params::new()).await?;
        Ok(Outcome::from_batch(decode_all(&output)?))
    }

    /// Contacts whose name or organization contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> BridgeResult<Vec<Contact>> {
        require_text("query", query)?;
        let params = Params::new().with("query", query);
        let output = invoke(self.runner.as_ref(), &SEARCH, &params).await?;

        let contacts: Vec<Contact> = decode_all(&output)?;
        Ok(Outcome::from_batch(
            contacts
                .into_iter()
                .filter(|c| {
                    contains_ci(&c.name, query)
                        || c.organization.as_deref().is_some_and(|o| contains_ci(o, query))
                })
                .collect(),
        ))
    }

    /// First contact whose name equals `name` exactly
    pub async fn get(&self, name: &str) -> BridgeResult<Contact> {
        require_text("name", name)?;
        let params = Params::new().with("name", name);
        let output = invoke(self.runner.as_ref(), &GET, &params).await?;
        Ok(first_named(decode_all(&output)?, name))
    }

    pub async fn create(&self, contact: NewContact) -> BridgeResult<Contact> {
        require_text("name", &contact.name)?;
        let (first, last) = split_name(&contact.name);

        let params = Params::new()
            .with("first_name", first)
            .with_opt("last_name", last)
            .with_opt("email", non_blank(contact.email.as_deref()))
            .with_opt("phone", non_blank(contact.phone.as_deref()))
            .with_opt("organization", non_blank(contact.organization.as_deref()))
            .with_opt("birthday", contact.birthday.map(format_day));

        let output = invoke(self.runner.as_ref(), &CREATE, &params).await?;
        let created: Contact = decode_one(&output)?;
        tracing::info!(id = %created.id, "Created contact '{}'", created.name);
        Ok(Outcome::Found(created))
    }

    pub async fn edit(&self, name: &str, changes: ContactChanges) -> BridgeResult<Contact> {
        require_text("name", name)?;
        let organization = non_blank(changes.organization.as_deref());
        let email = non_blank(changes.email.as_deref());
        let phone = non_blank(changes.phone.as_deref());
        if organization.is_none() && email.is_none() && phone.is_none() {
            return Err(BridgeError::invalid_parameter(
                "changes",
                "provide an organization, email or phone",
            ));
        }

        let params = Params::new()
            .with("name", name)
            .with_opt("organization", organization)
            .with_opt("email", email)
            .with_opt("phone", phone);
        let output = invoke(self.runner.as_ref(), &EDIT, &params).await?;

        // A row is only emitted after the matched contact was saved
        let edited: Vec<Contact> = decode_all(&output)?;
        Ok(edited.into_iter().next().into())
    }

    /// Delete the first contact named exactly `name`, returning it
    pub async fn delete(&self, name: &str) -> BridgeResult<Contact> {
        require_text("name", name)?;
        let params = Params::new().with("name", name);
        let output = invoke(self.runner.as_ref(), &DELETE, &params).await?;

        let outcome = first_named(decode_all(&output)?, name);
        if let Outcome::Found(contact) = &outcome {
            tracing::info!(id = %contact.id, "Deleted contact '{}'", contact.name);
        }
        Ok(outcome)
    }
}

fn first_named(contacts: Vec<Contact>, name: &str) -> Outcome<Contact> {
    contacts.into_iter().find(|c| c.name == name).into()
}
