//! Signed-in user state supplied by the identity collaborator.

use crate::constants::NO_TEAM_ID;
use serde::{Deserialize, Serialize};

/// User type granting full team permissions.
pub const ADMIN_USER_TYPE: &str = "admin";

/// The acting user, injected into the permission gate and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Job role inside the team (free text).
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Permission class; `"admin"` passes every gate.
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
}

impl CurrentUser {
    /// Build a user with the fields the permission gate reads.
    pub fn new(email: impl Into<String>, user_type: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_type: Some(user_type.into()),
            ..Self::default()
        }
    }

    /// Attach a team scope.
    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    /// Whether the user is a team admin.
    pub fn is_admin(&self) -> bool {
        self.user_type.as_deref() == Some(ADMIN_USER_TYPE)
    }

    /// Team id usable for scoped requests, or `None` when the user has no team yet.
    pub fn team_scope(&self) -> Option<&str> {
        self.team_id
            .as_deref()
            .filter(|team| !team.is_empty() && *team != NO_TEAM_ID)
    }

    /// First word of the display name, for greetings.
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or_default()
    }
}
