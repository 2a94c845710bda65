//! Document and folder actions.

use super::{
    retain_unremoved, settle_removal, trace_phase, ActionResult, MutationOutcome, Orchestrator,
    Phase, TableView, Touched,
};
use crate::api::endpoints;
use crate::cache::CacheKey;
use mergeflow_core::models::requests::{
    validate_email, validate_folder_name, CreateFolderRequest, DeleteDocumentsRequest,
    EditFolderRequest, FavoriteRequest, FolderFiles, NewFile, PermissionChangeRequest,
    RevokeMemberRequest, RevokeRequest, ShareRequest, ShareResponse, TagsRequest, UploadRequest,
};
use mergeflow_core::{AppError, Document, Gate, Permission};
use tracing::info;

/// Who a document is shared with or revoked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareTarget {
    /// One member, by e-mail.
    Email(String),
    /// Every member of a group; the server fans out.
    Group(String),
}

impl ShareTarget {
    fn split(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::Email(email) => (None, Some(email.trim().to_string())),
            Self::Group(group_id) => (Some(group_id.clone()), None),
        }
    }
}

const GROUP_INVITED: &str = "Members of this group have been invited!";
const EMAIL_INVITED: &str = "Invitation email sent successfully!";

impl Orchestrator {
    /// Team id and document key for a document action.
    fn documents_context(&self, action: &'static str) -> Result<(String, CacheKey), MutationOutcome> {
        let team_id = self.require_team(action)?;
        let key = self
            .documents_key()
            .ok_or_else(|| self.invalid(action, AppError::MissingTeam))?;
        Ok((team_id, key))
    }

    fn cached_documents(&self, key: &CacheKey) -> Vec<Document> {
        self.documents.data(key).unwrap_or_default()
    }

    fn cached_document(&self, key: &CacheKey, id: &str) -> Option<Document> {
        self.cached_documents(key).into_iter().find(|doc| doc.id == id)
    }

    /// Gate on the record's share entries; unknown records need an admin.
    fn check_document_gate(&self, action: &'static str, doc: Option<&Document>) -> bool {
        match doc {
            Some(doc) => self.check_gate(action, Gate::Record(&doc.shared_with)),
            None => self.check_gate(action, Gate::AdminOnly),
        }
    }

    /// Delete one document from the listing in scope.
    pub async fn delete_document(&self, id: &str, view: Option<TableView<'_>>) -> MutationOutcome {
        const ACTION: &str = "delete document";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        let before = self.cached_documents(&key);
        if !self.check_document_gate(ACTION, before.iter().find(|doc| doc.id == id)) {
            return MutationOutcome::Denied;
        }

        trace_phase(ACTION, Phase::Optimistic);
        let removed = vec![id.to_string()];
        self.documents.update(&key, |rows| retain_unremoved(rows, &removed));
        settle_removal(view, &before, &removed);

        let result = self
            .request(
                ACTION,
                endpoints::delete_document(id, &team_id, self.folder_id()),
                200,
            )
            .await;
        self.finish(
            ACTION,
            result,
            "Document deleted!",
            "Failed to delete the document",
            &touched,
        )
        .await
    }

    /// Delete several documents in one batched call.
    pub async fn delete_documents(
        &self,
        ids: &[String],
        view: Option<TableView<'_>>,
    ) -> MutationOutcome {
        const ACTION: &str = "delete documents";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if !self.check_gate(ACTION, Gate::AdminOnly) {
            return MutationOutcome::Denied;
        }
        if ids.is_empty() {
            return self.invalid(ACTION, AppError::validation("No documents selected."));
        }

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        let before = self.cached_documents(&key);
        self.documents.update(&key, |rows| retain_unremoved(rows, ids));
        settle_removal(view, &before, ids);

        let body = DeleteDocumentsRequest {
            document_ids: ids.to_vec(),
            team_id,
        };
        let result = self
            .request(ACTION, endpoints::delete_documents(&body), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Documents deleted!",
            "Failed to delete the documents",
            &touched,
        )
        .await
    }

    /// Flip the favorite flag of a document.
    pub async fn toggle_favorite(&self, id: &str) -> MutationOutcome {
        const ACTION: &str = "toggle favorite";
        let (_, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        let Some(doc) = self.cached_document(&key, id) else {
            return self.invalid(ACTION, AppError::NotFound);
        };
        if !self.check_document_gate(ACTION, Some(&doc)) {
            return MutationOutcome::Denied;
        }
        let is_favorited = !doc.is_favorited;

        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
                row.is_favorited = is_favorited;
            }
        });

        let result = self
            .request(
                ACTION,
                endpoints::favorite(id, &FavoriteRequest { is_favorited }),
                200,
            )
            .await;
        let success = if is_favorited {
            "Document favorited!"
        } else {
            "Document unfavorited!"
        };
        self.finish(
            ACTION,
            result,
            success,
            "Failed to update the favorite",
            &touched,
        )
        .await
    }

    /// Share a document with a member (by e-mail) or a whole group.
    pub async fn share_document(&self, id: &str, target: &ShareTarget) -> MutationOutcome {
        const ACTION: &str = "share document";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }
        if let ShareTarget::Email(email) = target {
            if let Err(err) = validate_email(email) {
                return self.invalid(ACTION, err);
            }
        }

        let touched = [Touched::Documents(key)];
        let _guard = self.lock(&touched).await;
        let (group_id, user_email) = target.split();
        let body = ShareRequest {
            group_id,
            team_id,
            user_email,
            invitation_link: self.settings.invitation_link.clone(),
        };
        let result = self.request(ACTION, endpoints::share(id, &body), 200).await;
        let success = match &result {
            Ok(response) => {
                let shared: ShareResponse = response.json().unwrap_or_default();
                if shared.groups.is_empty() {
                    EMAIL_INVITED
                } else {
                    GROUP_INVITED
                }
            }
            Err(_) => EMAIL_INVITED,
        };
        self.finish(
            ACTION,
            result,
            success,
            "Error sharing the document",
            &touched,
        )
        .await
    }

    /// Revoke a member's (by e-mail) or a group's access.
    pub async fn revoke_share(&self, id: &str, target: &ShareTarget) -> MutationOutcome {
        const ACTION: &str = "revoke share";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
                return;
            };
            match target {
                ShareTarget::Email(email) => row
                    .shared_with
                    .retain(|entry| !entry.member.email.eq_ignore_ascii_case(email.trim())),
                ShareTarget::Group(group_id) => row.groups.retain(|group| &group.id != group_id),
            }
        });

        let (group_id, user_email) = target.split();
        let body = RevokeRequest {
            group_id,
            team_id,
            user_email,
        };
        let result = self.request(ACTION, endpoints::revoke(id, &body), 200).await;
        self.finish(
            ACTION,
            result,
            "Document access revoked!",
            "Failed to unshare the document",
            &touched,
        )
        .await
    }

    /// Remove one invited member from a document's share list.
    pub async fn revoke_member(&self, id: &str, member_id: &str) -> MutationOutcome {
        const ACTION: &str = "revoke member";
        let (_, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
                row.shared_with.retain(|entry| entry.member.id != member_id);
            }
        });

        let body = RevokeMemberRequest {
            member_id: member_id.to_string(),
        };
        let result = self
            .request(ACTION, endpoints::revoke_member(id, &body), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Unshared document successfully!",
            "Failed to unshare the document",
            &touched,
        )
        .await
    }

    /// Change an invited member's permission.
    pub async fn change_permission(
        &self,
        id: &str,
        member_id: &str,
        new_permission: Permission,
    ) -> MutationOutcome {
        const ACTION: &str = "change permission";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }
        let current = doc.as_ref().and_then(|doc| {
            doc.shared_with
                .iter()
                .find(|entry| entry.member.id == member_id)
                .map(|entry| entry.permission)
        });
        if current == Some(new_permission) {
            info!(action = ACTION, member_id, "permission already set");
            return MutationOutcome::Unchanged;
        }

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            let entry = rows
                .iter_mut()
                .find(|row| row.id == id)
                .and_then(|row| row.shared_with.iter_mut().find(|entry| entry.member.id == member_id));
            if let Some(entry) = entry {
                entry.permission = new_permission;
            }
        });

        let body = PermissionChangeRequest {
            team_id,
            new_permission,
            member_id: member_id.to_string(),
        };
        let result = self
            .request(ACTION, endpoints::change_permission(id, &body), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Permission updated successfully!",
            "Failed to update the permission",
            &touched,
        )
        .await
    }

    /// Replace a document's tags.
    pub async fn update_tags(&self, id: &str, tags: Vec<String>) -> MutationOutcome {
        const ACTION: &str = "update tags";
        let (_, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }
        let tags: Vec<String> = tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
                row.tags = tags.clone();
            }
        });

        let result = self
            .request(ACTION, endpoints::update_tags(id, &TagsRequest { tags }), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Tags Added",
            "Failed to update the tags",
            &touched,
        )
        .await
    }

    /// Create a folder holding already-uploaded `files`.
    pub async fn create_folder(&self, name: &str, files: FolderFiles) -> MutationOutcome {
        const ACTION: &str = "create folder";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if !self.check_gate(ACTION, Gate::AdminOnly) {
            return MutationOutcome::Denied;
        }
        if let Err(err) = validate_folder_name(name) {
            return self.invalid(ACTION, err);
        }

        let touched = [Touched::Documents(key)];
        let _guard = self.lock(&touched).await;
        let body = CreateFolderRequest {
            team_id,
            files,
            name: name.trim().to_string(),
            url: None,
        };
        let result = self
            .request(ACTION, endpoints::create_folder(&body), 201)
            .await;
        self.finish(
            ACTION,
            result,
            "Document Created!",
            "Failed to create the document",
            &touched,
        )
        .await
    }

    /// Upload `files`, then create a folder named `name` around them.
    pub async fn create_folder_with_files(&self, name: &str, files: Vec<NewFile>) -> MutationOutcome {
        const ACTION: &str = "create folder";
        if let Err(err) = validate_folder_name(name) {
            return self.invalid(ACTION, err);
        }
        let uploaded = if files.is_empty() {
            FolderFiles::default()
        } else {
            let upload = self.upload_files(files, false).await;
            match upload.value {
                Some(uploaded) => uploaded,
                None => return upload.outcome,
            }
        };
        self.create_folder(name, uploaded).await
    }

    /// Rename a folder and replace its contents.
    pub async fn edit_folder(&self, id: &str, name: &str, files: FolderFiles) -> MutationOutcome {
        const ACTION: &str = "edit folder";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let doc = self.cached_document(&key, id);
        if !self.check_document_gate(ACTION, doc.as_ref()) {
            return MutationOutcome::Denied;
        }
        if let Err(err) = validate_folder_name(name) {
            return self.invalid(ACTION, err);
        }
        let name = name.trim().to_string();

        let touched = [Touched::Documents(key.clone())];
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.documents.update(&key, |rows| {
            if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
                row.name = name.clone();
            }
        });

        let body = EditFolderRequest {
            team_id,
            files,
            name,
        };
        let result = self
            .request(ACTION, endpoints::edit_folder(id, &body), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Document Updated!",
            "Failed to update the document",
            &touched,
        )
        .await
    }

    /// Upload files. With `show_file` they are listed on their own; otherwise
    /// the returned ids are meant for a follow-up folder create or edit.
    pub async fn upload_files(&self, files: Vec<NewFile>, show_file: bool) -> ActionResult<FolderFiles> {
        const ACTION: &str = "upload files";
        let (team_id, key) = match self.documents_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome.into(),
        };
        if !self.check_gate(ACTION, Gate::AdminOnly) {
            return MutationOutcome::Denied.into();
        }
        let body = UploadRequest {
            team_id,
            files,
            show_file,
        };
        if let Err(err) = body.validate() {
            return self.invalid(ACTION, err).into();
        }

        let touched = [Touched::Documents(key)];
        let _guard = self.lock(&touched).await;
        let result = self.request(ACTION, endpoints::upload(&body), 201).await;
        let uploaded = match &result {
            Ok(response) => response.json::<FolderFiles>().ok(),
            Err(_) => None,
        };
        let outcome = self
            .finish(
                ACTION,
                result,
                "Files uploaded!",
                "Failed to upload the files",
                &touched,
            )
            .await;
        match (outcome, uploaded) {
            (MutationOutcome::Succeeded, uploaded) => ActionResult::done(uploaded.unwrap_or_default()),
            (outcome, _) => outcome.into(),
        }
    }
}
