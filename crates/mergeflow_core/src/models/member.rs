//! Team members and groups.

use super::document::{GroupRef, MemberRef};
use crate::query::{FieldValue, Filterable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Team member row as returned by the members API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: String,
    /// Identity-provider uid, used to remove the login profile on delete.
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "type", default)]
    pub member_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

impl Member {
    /// Build a member row with just the identifying fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uid: None,
            name: name.into(),
            email: email.into(),
            role: None,
            member_type: None,
            status: None,
            avatar_url: None,
            groups: Vec::new(),
            date_created: None,
        }
    }

    /// Reference form used inside groups and share entries.
    pub fn as_ref_entry(&self) -> MemberRef {
        MemberRef {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// Whether the member currently belongs to `group_id`.
    pub fn in_group(&self, group_id: &str) -> bool {
        self.groups.iter().any(|group| group.id == group_id)
    }
}

impl Filterable for Member {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_name(&self) -> &str {
        &self.name
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date_created
    }

    fn role_tag(&self) -> Option<&str> {
        self.role.as_deref().or(self.member_type.as_deref())
    }

    fn field(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Text(&self.name),
            "email" => FieldValue::Text(&self.email),
            "role" => self.role_tag().into(),
            "status" => self.status.as_deref().into(),
            "dateCreated" => self.date_created.into(),
            _ => FieldValue::Missing,
        }
    }
}

/// Group of team members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

impl Group {
    /// Build an empty group.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group_type: None,
            members: Vec::new(),
            team_id: None,
            date_created: None,
        }
    }

    /// Short "Alice and 2 others" label listing the group's members.
    pub fn member_summary(&self) -> String {
        let Some(first) = self.members.first() else {
            return "0 others".to_string();
        };
        let first_name = first.name.as_deref().unwrap_or(first.email.as_str());
        format!("{} and {} others", first_name, self.members.len() - 1)
    }
}

impl Filterable for Group {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_name(&self) -> &str {
        &self.name
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date_created
    }

    fn role_tag(&self) -> Option<&str> {
        self.group_type.as_deref()
    }

    fn field(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Text(&self.name),
            "members" => FieldValue::from(self.members.len() as u64),
            "type" => self.group_type.as_deref().into(),
            "dateCreated" => self.date_created.into(),
            _ => FieldValue::Missing,
        }
    }
}
