//! Typed path builders for every endpoint, plus the matching cache keys.

use super::ApiRequest;
use crate::cache::CacheKey;
use crate::error::ApiError;
use mergeflow_core::constants::NO_TEAM_ID;
use mergeflow_core::models::requests::{
    CreateFolderRequest, CreateTeamRequest, DeleteDocumentsRequest, DeleteFromFolderRequest,
    DeleteGroupsRequest, DeleteMembersRequest, EditFolderRequest, FavoriteRequest, GroupRequest,
    InviteRequest, MoveToGroupRequest, PermissionChangeRequest, RemoveFromGroupRequest,
    RevokeMemberRequest, RevokeRequest, ShareRequest, TagsRequest, UploadRequest,
};

const DOCUMENTS: &str = "documents";
const MEMBERS: &str = "members";
const GROUPS: &str = "groups";
const TEAMS: &str = "teams";

fn team_scope(team_id: &str) -> Option<&str> {
    let team_id = team_id.trim();
    (!team_id.is_empty() && team_id != NO_TEAM_ID).then_some(team_id)
}

/// `documents?teamId=X&userEmail=Y`; `None` without a usable team.
pub fn documents_key(team_id: &str, user_email: &str) -> Option<CacheKey> {
    let team_id = team_scope(team_id)?;
    Some(CacheKey::new(format!(
        "{DOCUMENTS}?teamId={team_id}&userEmail={user_email}"
    )))
}

/// `documents/{folderId}`; `None` for a blank id.
pub fn folder_key(folder_id: &str) -> Option<CacheKey> {
    let folder_id = folder_id.trim();
    (!folder_id.is_empty()).then(|| CacheKey::new(format!("{DOCUMENTS}/{folder_id}")))
}

/// `members?teamId=X`; `None` without a usable team.
pub fn members_key(team_id: &str) -> Option<CacheKey> {
    team_scope(team_id).map(|team_id| CacheKey::new(format!("{MEMBERS}?teamId={team_id}")))
}

/// `groups?teamId=X`; `None` without a usable team.
pub fn groups_key(team_id: &str) -> Option<CacheKey> {
    team_scope(team_id).map(|team_id| CacheKey::new(format!("{GROUPS}?teamId={team_id}")))
}

pub fn list_documents(team_id: &str, user_email: &str) -> ApiRequest {
    ApiRequest::get([DOCUMENTS])
        .with_query("teamId", team_id)
        .with_query("userEmail", user_email)
}

pub fn get_folder(folder_id: &str) -> ApiRequest {
    ApiRequest::get([DOCUMENTS, folder_id])
}

pub fn list_members(team_id: &str) -> ApiRequest {
    ApiRequest::get([MEMBERS]).with_query("teamId", team_id)
}

pub fn list_groups(team_id: &str) -> ApiRequest {
    ApiRequest::get([GROUPS]).with_query("teamId", team_id)
}

/// `DELETE documents/{id}?teamId`, with a `folderId` body when deleting inside a folder.
pub fn delete_document(
    id: &str,
    team_id: &str,
    folder_id: Option<&str>,
) -> Result<ApiRequest, ApiError> {
    let request = ApiRequest::delete([DOCUMENTS, id]).with_query("teamId", team_id);
    match folder_id {
        Some(folder_id) => request.with_json(&DeleteFromFolderRequest {
            folder_id: folder_id.to_string(),
        }),
        None => Ok(request),
    }
}

pub fn delete_documents(body: &DeleteDocumentsRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::delete([DOCUMENTS]).with_json(body)
}

pub fn favorite(id: &str, body: &FavoriteRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "favorite"]).with_json(body)
}

pub fn share(id: &str, body: &ShareRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "share"]).with_json(body)
}

pub fn revoke(id: &str, body: &RevokeRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::delete([DOCUMENTS, id, "revoke"]).with_json(body)
}

pub fn revoke_member(id: &str, body: &RevokeMemberRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "revoke"]).with_json(body)
}

pub fn change_permission(id: &str, body: &PermissionChangeRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "permission"]).with_json(body)
}

pub fn update_tags(id: &str, body: &TagsRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "tags"]).with_json(body)
}

pub fn create_folder(body: &CreateFolderRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::post([DOCUMENTS, "create"]).with_json(body)
}

pub fn edit_folder(id: &str, body: &EditFolderRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([DOCUMENTS, id, "edit"]).with_json(body)
}

pub fn upload(body: &UploadRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::post([DOCUMENTS, "upload"]).with_json(body)
}

pub fn delete_member(id: &str, team_id: &str) -> ApiRequest {
    ApiRequest::delete([MEMBERS, id]).with_query("teamId", team_id)
}

pub fn delete_members(body: &DeleteMembersRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::delete([MEMBERS]).with_json(body)
}

pub fn delete_group(id: &str, team_id: &str) -> ApiRequest {
    ApiRequest::delete([GROUPS, id]).with_query("teamId", team_id)
}

pub fn delete_groups(body: &DeleteGroupsRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::delete([GROUPS]).with_json(body)
}

pub fn move_to_group(member_id: &str, body: &MoveToGroupRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([MEMBERS, member_id, "moveToGroup"]).with_json(body)
}

pub fn remove_from_group(
    group_id: &str,
    body: &RemoveFromGroupRequest,
) -> Result<ApiRequest, ApiError> {
    ApiRequest::delete([GROUPS, group_id, "removeFromGroup"]).with_json(body)
}

pub fn create_group(body: &GroupRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::post([GROUPS, "create"]).with_json(body)
}

pub fn update_group(id: &str, team_id: &str, body: &GroupRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::put([GROUPS, id])
        .with_query("teamId", team_id)
        .with_json(body)
}

pub fn invite(body: &InviteRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::post([TEAMS, "send"]).with_json(body)
}

pub fn create_team(body: &CreateTeamRequest) -> Result<ApiRequest, ApiError> {
    ApiRequest::post([TEAMS]).with_json(body)
}
