//! Document (file or folder) records and share entries.

use crate::file_type::file_format;
use crate::query::{FieldValue, Filterable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level granted by a share entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    /// Wire representation (`"view"` / `"edit"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "edit" => Ok(Self::Edit),
            other => Err(format!("unknown permission '{}'", other)),
        }
    }
}

/// Member reference embedded in share entries and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Group reference stored on documents shared with a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One `{member, permission}` pair in a document's `sharedWith` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub member: MemberRef,
    pub permission: Permission,
}

/// File or folder as returned by the documents API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Raw type: a file extension, or `"folder"`.
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_favorited: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub shared_with: Vec<ShareEntry>,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    /// Children of a folder; empty for plain files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl Document {
    /// Build a plain file record with the given extension.
    pub fn file(id: impl Into<String>, name: impl Into<String>, extension: &str) -> Self {
        Self::with_type(id, name, extension)
    }

    /// Build an empty folder record.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_type(id, name, "folder")
    }

    fn with_type(id: impl Into<String>, name: impl Into<String>, doc_type: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            doc_type: doc_type.to_string(),
            size: None,
            url: None,
            date_created: None,
            date_modified: None,
            is_favorited: false,
            tags: Vec::new(),
            shared_with: Vec::new(),
            groups: Vec::new(),
            files: Vec::new(),
            team_id: None,
        }
    }

    /// Whether this record is a folder.
    pub fn is_folder(&self) -> bool {
        self.doc_type.eq_ignore_ascii_case("folder")
    }

    /// Share entry for `email`, if the document is shared with that member.
    pub fn share_entry_for(&self, email: &str) -> Option<&ShareEntry> {
        self.shared_with
            .iter()
            .find(|entry| entry.member.email.eq_ignore_ascii_case(email))
    }

    /// Whether the document is already shared with the group `group_id`.
    pub fn is_shared_with_group(&self, group_id: &str) -> bool {
        self.groups.iter().any(|group| group.id == group_id)
    }
}

impl Filterable for Document {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> Option<String> {
        Some(file_format(&self.doc_type))
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date_created
    }

    fn field(&self, field: &str) -> FieldValue<'_> {
        match field {
            "name" => FieldValue::Text(&self.name),
            "type" => FieldValue::Text(&self.doc_type),
            "size" => self.size.map(FieldValue::from).unwrap_or(FieldValue::Missing),
            "dateCreated" => self.date_created.into(),
            "dateModified" => self.date_modified.into(),
            "isFavorited" => FieldValue::Bool(self.is_favorited),
            "shared" => FieldValue::from(self.shared_with.len() as u64),
            _ => FieldValue::Missing,
        }
    }
}
