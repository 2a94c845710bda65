//! Identity-provider profile operations the orchestrator triggers.

use crate::error::ApiError;
use async_trait::async_trait;
use tracing::debug;

/// Login-profile store kept in sync with team membership.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Remove the profile of one deleted member.
    async fn delete_user_profile(&self, uid: &str) -> Result<(), ApiError>;

    /// Remove the profiles of several deleted members.
    async fn delete_multiple_users(&self, uids: &[String]) -> Result<(), ApiError>;

    /// Record the team and role chosen when a team is created.
    async fn set_team_and_role(&self, uid: &str, team_id: &str, role: &str) -> Result<(), ApiError>;
}

/// Directory that accepts every call without doing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProfiles;

#[async_trait]
impl ProfileDirectory for NoopProfiles {
    async fn delete_user_profile(&self, uid: &str) -> Result<(), ApiError> {
        debug!(uid, "profile removal skipped");
        Ok(())
    }

    async fn delete_multiple_users(&self, uids: &[String]) -> Result<(), ApiError> {
        debug!(count = uids.len(), "bulk profile removal skipped");
        Ok(())
    }

    async fn set_team_and_role(&self, uid: &str, team_id: &str, role: &str) -> Result<(), ApiError> {
        debug!(uid, team_id, role, "profile team update skipped");
        Ok(())
    }
}
