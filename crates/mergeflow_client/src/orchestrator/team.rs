//! Member, group, invitation and team actions.

use super::{
    retain_unremoved, settle_removal, trace_phase, ActionResult, MutationOutcome, Orchestrator,
    Phase, TableView, Touched,
};
use crate::api::{endpoints, ApiResponse};
use crate::cache::CacheKey;
use crate::error::ApiError;
use crate::notify::Variant;
use mergeflow_core::models::requests::{
    validate_email, CreateTeamRequest, CreateTeamResponse, DeleteGroupsRequest,
    DeleteMembersRequest, DeleteMembersResponse, GroupRequest, InviteRequest, MoveToGroupRequest,
    RemoveFromGroupRequest, Team, COMPANY_EXISTS_ERROR,
};
use mergeflow_core::{AppError, Gate, Member};
use tracing::{error, info, warn};

const DELETE_SUCCESS: &str = "Delete success!";
const MOVE_SUCCESS: &str = "Member moved to group!";
const MOVE_FAILURE: &str = "Failed to move member to group!";
const REMOVE_SUCCESS: &str = "Member remove from group!";
const REMOVE_FAILURE: &str = "Failed to remove member from group!";

struct TeamContext {
    team_id: String,
    members_key: CacheKey,
    groups_key: CacheKey,
}

impl TeamContext {
    fn touched(&self) -> [Touched; 2] {
        [
            Touched::Members(self.members_key.clone()),
            Touched::Groups(self.groups_key.clone()),
        ]
    }
}

impl Orchestrator {
    /// Team id and member/group keys for an admin-only team action.
    fn team_context(&self, action: &'static str) -> Result<TeamContext, MutationOutcome> {
        let team_id = self.require_team(action)?;
        let (Some(members_key), Some(groups_key)) = (self.members_key(), self.groups_key()) else {
            return Err(self.invalid(action, AppError::MissingTeam));
        };
        if !self.check_gate(action, Gate::AdminOnly) {
            return Err(MutationOutcome::Denied);
        }
        Ok(TeamContext {
            team_id,
            members_key,
            groups_key,
        })
    }

    /// Drop deleted members from the members cache and from every cached group.
    fn remove_members_locally(&self, context: &TeamContext, removed: &[String]) {
        trace_phase("remove members", Phase::Optimistic);
        self.members
            .update(&context.members_key, |rows| retain_unremoved(rows, removed));
        self.groups.update(&context.groups_key, |groups| {
            for group in groups.iter_mut() {
                group
                    .members
                    .retain(|member| !removed.iter().any(|id| id == &member.id));
            }
        });
    }

    /// Remove the login profiles of deleted members. Uids come from the
    /// response, falling back to the cached rows.
    async fn remove_profiles(&self, response: &ApiResponse, deleted: &[Member], bulk: bool) {
        let returned = response
            .json::<DeleteMembersResponse>()
            .map(|body| body.member_ids)
            .unwrap_or_default();
        let uids = if returned.is_empty() {
            deleted
                .iter()
                .filter_map(|member| member.uid.clone())
                .collect()
        } else {
            returned
        };
        if uids.is_empty() {
            warn!(count = deleted.len(), "deleted members carry no profile uid");
            return;
        }
        let result = match (bulk, uids.as_slice()) {
            (false, [uid]) => self.profiles.delete_user_profile(uid).await,
            _ => self.profiles.delete_multiple_users(&uids).await,
        };
        if let Err(err) = result {
            warn!(count = uids.len(), error = %err, "profile removal failed");
        }
    }

    async fn delete_member_rows(
        &self,
        action: &'static str,
        ids: &[String],
        view: Option<TableView<'_>>,
        failure: &str,
    ) -> MutationOutcome {
        let context = match self.team_context(action) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if ids.is_empty() {
            return self.invalid(action, AppError::validation("No members selected."));
        }
        let bulk = ids.len() > 1;

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        let before = self.members.data(&context.members_key).unwrap_or_default();
        let deleted: Vec<Member> = before
            .iter()
            .filter(|member| ids.contains(&member.id))
            .cloned()
            .collect();
        self.remove_members_locally(&context, ids);
        settle_removal(view, &before, ids);

        let request = if bulk {
            endpoints::delete_members(&DeleteMembersRequest {
                team_id: context.team_id.clone(),
                member_ids: ids.to_vec(),
            })
        } else {
            Ok(endpoints::delete_member(&ids[0], &context.team_id))
        };
        let result = self.request(action, request, 200).await;
        if let Ok(response) = &result {
            self.remove_profiles(response, &deleted, bulk).await;
        }
        self.finish(action, result, DELETE_SUCCESS, failure, &touched)
            .await
    }

    /// Delete one member and remove their login profile.
    pub async fn delete_member(&self, id: &str, view: Option<TableView<'_>>) -> MutationOutcome {
        self.delete_member_rows(
            "delete member",
            &[id.to_string()],
            view,
            "Failed to delete member",
        )
        .await
    }

    /// Delete several members in one batched call.
    pub async fn delete_members(&self, ids: &[String], view: Option<TableView<'_>>) -> MutationOutcome {
        if ids.len() == 1 {
            return self.delete_member(&ids[0], view).await;
        }
        self.delete_member_rows("delete members", ids, view, "Failed to delete members")
            .await
    }

    async fn delete_group_rows(
        &self,
        action: &'static str,
        ids: &[String],
        view: Option<TableView<'_>>,
        failure: &str,
    ) -> MutationOutcome {
        let context = match self.team_context(action) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if ids.is_empty() {
            return self.invalid(action, AppError::validation("No groups selected."));
        }

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        trace_phase(action, Phase::Optimistic);
        let before = self.groups.data(&context.groups_key).unwrap_or_default();
        self.groups
            .update(&context.groups_key, |rows| retain_unremoved(rows, ids));
        self.members.update(&context.members_key, |members| {
            for member in members.iter_mut() {
                member.groups.retain(|group| !ids.contains(&group.id));
            }
        });
        settle_removal(view, &before, ids);

        let request = if ids.len() > 1 {
            endpoints::delete_groups(&DeleteGroupsRequest {
                team_id: context.team_id.clone(),
                group_ids: ids.to_vec(),
            })
        } else {
            Ok(endpoints::delete_group(&ids[0], &context.team_id))
        };
        let result = self.request(action, request, 200).await;
        self.finish(action, result, DELETE_SUCCESS, failure, &touched)
            .await
    }

    pub async fn delete_group(&self, id: &str, view: Option<TableView<'_>>) -> MutationOutcome {
        self.delete_group_rows("delete group", &[id.to_string()], view, "Failed to delete group")
            .await
    }

    pub async fn delete_groups(&self, ids: &[String], view: Option<TableView<'_>>) -> MutationOutcome {
        if ids.len() == 1 {
            return self.delete_group(&ids[0], view).await;
        }
        self.delete_group_rows("delete groups", ids, view, "Failed to delete groups")
            .await
    }

    fn cached_member(&self, context: &TeamContext, member_id: &str) -> Option<Member> {
        self.members
            .data(&context.members_key)
            .and_then(|rows| rows.into_iter().find(|member| member.id == member_id))
    }

    /// Add a member to a group.
    pub async fn move_to_group(&self, member_id: &str, group_id: &str) -> MutationOutcome {
        const ACTION: &str = "move to group";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if self
            .cached_member(&context, member_id)
            .is_some_and(|member| member.in_group(group_id))
        {
            info!(action = ACTION, member_id, group_id, "member already in group");
            return MutationOutcome::Unchanged;
        }

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        let body = MoveToGroupRequest {
            team_id: context.team_id.clone(),
            group_id: group_id.to_string(),
        };
        let result = self
            .request(ACTION, endpoints::move_to_group(member_id, &body), 200)
            .await;
        self.finish(ACTION, result, MOVE_SUCCESS, MOVE_FAILURE, &touched)
            .await
    }

    /// Take a member out of a group.
    pub async fn remove_from_group(&self, member_id: &str, group_id: &str) -> MutationOutcome {
        const ACTION: &str = "remove from group";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        let body = RemoveFromGroupRequest {
            team_id: context.team_id.clone(),
            member_id: member_id.to_string(),
        };
        let result = self
            .request(ACTION, endpoints::remove_from_group(group_id, &body), 200)
            .await;
        self.finish(ACTION, result, REMOVE_SUCCESS, REMOVE_FAILURE, &touched)
            .await
    }

    /// Move a member from one group to another: remove leg, then add leg.
    ///
    /// A failed add leg leaves the member in neither group; the outcome is
    /// [`MutationOutcome::PartiallyApplied`] and both lists are refetched.
    pub async fn move_between_groups(
        &self,
        member_id: &str,
        from_group: &str,
        to_group: &str,
    ) -> MutationOutcome {
        const ACTION: &str = "move between groups";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if from_group == to_group {
            info!(action = ACTION, member_id, group_id = from_group, "source and target group match");
            return MutationOutcome::Unchanged;
        }

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        let remove = RemoveFromGroupRequest {
            team_id: context.team_id.clone(),
            member_id: member_id.to_string(),
        };
        let removed = self
            .request(ACTION, endpoints::remove_from_group(from_group, &remove), 200)
            .await;
        if let Err(err) = removed {
            return self.fail(ACTION, MOVE_FAILURE, &err, &touched).await;
        }

        let add = MoveToGroupRequest {
            team_id: context.team_id.clone(),
            group_id: to_group.to_string(),
        };
        let added = self
            .request(ACTION, endpoints::move_to_group(member_id, &add), 200)
            .await;
        match added {
            Ok(_) => self.succeed(ACTION, MOVE_SUCCESS, &touched).await,
            Err(err) => {
                trace_phase(ACTION, Phase::Failed);
                error!(
                    action = ACTION,
                    member_id,
                    from_group,
                    to_group,
                    error = %err,
                    "add leg failed after remove leg"
                );
                self.notify(MOVE_FAILURE, Variant::Error);
                self.refresh(&touched).await;
                MutationOutcome::PartiallyApplied {
                    completed: vec![format!("remove from group {}", from_group)],
                    failed: format!("move to group {}: {}", to_group, err),
                }
            }
        }
    }

    /// Create a group holding `members` (member ids).
    pub async fn create_group(&self, name: &str, members: Vec<String>) -> MutationOutcome {
        const ACTION: &str = "create group";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let body = GroupRequest {
            name: name.trim().to_string(),
            team_id: Some(context.team_id.clone()),
            members,
        };
        if let Err(err) = body.validate() {
            return self.invalid(ACTION, err);
        }

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        let result = self.request(ACTION, endpoints::create_group(&body), 201).await;
        self.finish(
            ACTION,
            result,
            "Group created successfully!",
            "Failed to create group",
            &touched,
        )
        .await
    }

    /// Rename a group and replace its member list.
    pub async fn update_group(&self, id: &str, name: &str, members: Vec<String>) -> MutationOutcome {
        const ACTION: &str = "update group";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        let body = GroupRequest {
            name: name.trim().to_string(),
            team_id: None,
            members,
        };
        if let Err(err) = body.validate() {
            return self.invalid(ACTION, err);
        }

        let touched = context.touched();
        let _guard = self.lock(&touched).await;
        trace_phase(ACTION, Phase::Optimistic);
        self.groups.update(&context.groups_key, |groups| {
            if let Some(group) = groups.iter_mut().find(|group| group.id == id) {
                group.name = body.name.clone();
            }
        });
        let result = self
            .request(ACTION, endpoints::update_group(id, &context.team_id, &body), 200)
            .await;
        self.finish(
            ACTION,
            result,
            "Group updated successfully!",
            "Failed to update group",
            &touched,
        )
        .await
    }

    /// Send a team invitation to `email`.
    pub async fn invite_member(&self, email: &str) -> MutationOutcome {
        const ACTION: &str = "invite member";
        let context = match self.team_context(ACTION) {
            Ok(context) => context,
            Err(outcome) => return outcome,
        };
        if let Err(err) = validate_email(email) {
            return self.invalid(ACTION, err);
        }

        let touched = [Touched::Members(context.members_key.clone())];
        let _guard = self.lock(&touched).await;
        let body = InviteRequest {
            team_id: context.team_id,
            email: email.trim().to_string(),
            invitation_link: self.settings.invitation_link.clone(),
        };
        let result = self.request(ACTION, endpoints::invite(&body), 200).await;
        self.finish(
            ACTION,
            result,
            "Invitation email sent successfully!",
            "Failed to send the invitation",
            &touched,
        )
        .await
    }

    /// Create a team owned by the current user and invite `emails`.
    ///
    /// `role` of `"other"` takes `custom_role` instead. On success the owner's
    /// profile is moved to the new team.
    pub async fn create_team(
        &self,
        company_name: &str,
        role: &str,
        custom_role: Option<&str>,
        emails: Vec<String>,
    ) -> ActionResult<Team> {
        const ACTION: &str = "create team";
        if !self.check_gate(ACTION, Gate::Open) {
            return MutationOutcome::Denied.into();
        }
        let body = CreateTeamRequest {
            company_name: company_name.trim().to_string(),
            owner_role: CreateTeamRequest::resolve_role(role, custom_role),
            owner_id: self.user.uid.clone(),
            owner_email: self.user.email.clone(),
            shared: emails
                .into_iter()
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty())
                .collect(),
            invitation_link: self.settings.invitation_link.clone(),
        };
        if let Err(err) = body.validate() {
            return self.invalid(ACTION, err).into();
        }

        let created = self
            .request(ACTION, endpoints::create_team(&body), 201)
            .await
            .and_then(|response| response.json::<CreateTeamResponse>());
        let created = match created {
            Ok(created) => created,
            Err(err) => {
                let message = match &err {
                    ApiError::UnexpectedStatus { status: 400, message }
                        if message == COMPANY_EXISTS_ERROR =>
                    {
                        COMPANY_EXISTS_ERROR
                    }
                    _ => "Failed to create team. Please try again!",
                };
                return self.fail(ACTION, message, &err, &[]).await.into();
            }
        };

        if let Err(err) = self
            .profiles
            .set_team_and_role(&self.user.uid, &created.team.id, &body.owner_role)
            .await
        {
            warn!(team_id = %created.team.id, error = %err, "profile team update failed");
        }
        let message = if created.invite_send {
            "Team created and invites sent!"
        } else {
            "Team Created!"
        };
        self.succeed(ACTION, message, &[]).await;
        ActionResult::done(created.team)
    }
}
