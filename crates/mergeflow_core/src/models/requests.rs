//! Request and response payloads for the team documents REST API.
//!
//! Every multi-tenant payload carries `teamId`; field names follow the API's
//! camelCase wire format.

use super::document::{GroupRef, Permission};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Body for `PUT documents/{id}/favorite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub is_favorited: bool,
}

/// Body for `DELETE documents/{id}` issued from inside a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFromFolderRequest {
    pub folder_id: String,
}

/// Body for the batched `DELETE documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentsRequest {
    pub document_ids: Vec<String>,
    pub team_id: String,
}

/// Body for `PUT documents/{id}/share`.
///
/// Exactly one of `group_id` / `user_email` is normally set; with a group the
/// server fans the share out to every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub invitation_link: String,
}

/// Response of `PUT documents/{id}/share`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResponse {
    #[serde(default)]
    pub groups: Vec<GroupRef>,
}

/// Body for `DELETE documents/{id}/revoke`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Body for `PUT documents/{id}/revoke` removing one invited member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeMemberRequest {
    pub member_id: String,
}

/// Body for `PUT documents/{id}/permission`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionChangeRequest {
    pub team_id: String,
    pub new_permission: Permission,
    pub member_id: String,
}

/// Body for `PUT documents/{id}/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

/// File descriptor sent with uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl NewFile {
    /// Describe a local file; the type is derived from the name's extension.
    pub fn from_name(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let file_type = crate::file_type::file_extension(&name).to_string();
        Self {
            name,
            path: None,
            url: None,
            size,
            file_type,
        }
    }
}

/// Body for `POST documents/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub team_id: String,
    pub files: Vec<NewFile>,
    /// `true` when the files are listed on their own, `false` when they will be
    /// attached to a folder by a follow-up create/edit call.
    pub show_file: bool,
}

impl UploadRequest {
    /// Reject an upload without files.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when `files` is empty.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.files.is_empty() {
            return Err(AppError::validation("No files uploaded."));
        }
        Ok(())
    }
}

/// Response of `POST documents/upload`, and the folder contents payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFiles {
    #[serde(default)]
    pub document_ids: Vec<String>,
    #[serde(default)]
    pub total_size: u64,
}

/// Body for `POST documents/create` (new folder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub team_id: String,
    pub files: FolderFiles,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body for `PUT documents/{id}/edit` (rename / replace folder contents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFolderRequest {
    pub team_id: String,
    pub files: FolderFiles,
    pub name: String,
}

/// Body for batched `DELETE members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMembersRequest {
    pub team_id: String,
    pub member_ids: Vec<String>,
}

/// Response of member deletion: identity uids whose profiles must be removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMembersResponse {
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Body for batched `DELETE groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupsRequest {
    pub team_id: String,
    pub group_ids: Vec<String>,
}

/// Body for `PUT members/{id}/moveToGroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToGroupRequest {
    pub team_id: String,
    pub group_id: String,
}

/// Body for `DELETE groups/{id}/removeFromGroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromGroupRequest {
    pub team_id: String,
    pub member_id: String,
}

/// Body for `POST groups/create` and `PUT groups/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Member ids.
    pub members: Vec<String>,
}

impl GroupRequest {
    /// Reject a blank group name.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when the name is blank.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Group name is required!"));
        }
        Ok(())
    }
}

/// Body for `POST teams/send` (invite by e-mail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub team_id: String,
    pub email: String,
    pub invitation_link: String,
}

/// Body for `POST teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub company_name: String,
    pub owner_role: String,
    pub owner_id: String,
    pub owner_email: String,
    /// E-mails invited while creating the team.
    pub shared: Vec<String>,
    pub invitation_link: String,
}

/// Role value that switches team creation to a free-text custom role.
pub const CUSTOM_ROLE_OPTION: &str = "other";

impl CreateTeamRequest {
    /// Resolve the owner role, substituting `custom_role` for the `"other"` option.
    pub fn resolve_role(role: &str, custom_role: Option<&str>) -> String {
        if role == CUSTOM_ROLE_OPTION {
            custom_role.unwrap_or_default().trim().to_string()
        } else {
            role.trim().to_string()
        }
    }

    /// Validate company name, role and invited e-mails.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::validation("Company name is required!"));
        }
        if self.owner_role.trim().is_empty() {
            return Err(AppError::validation("Role is required!"));
        }
        for email in &self.shared {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Team created by `POST teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub owner_type: Option<String>,
}

/// Response of `POST teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamResponse {
    pub team: Team,
    #[serde(default)]
    pub invite_send: bool,
}

/// Server message for a duplicate company name on team creation.
pub const COMPANY_EXISTS_ERROR: &str = "Company Name already exists";

/// Check that `email` looks like `local@domain.tld`.
///
/// # Errors
/// Returns [`AppError::Validation`] for malformed addresses.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let invalid = || AppError::validation(format!("Invalid email address '{}'", email));
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Check that a folder name is not blank.
///
/// # Errors
/// Returns [`AppError::Validation`] for blank names.
pub fn validate_folder_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Folder name is required!"));
    }
    Ok(())
}
