//! Admin-or-edit permission gate for mutating actions.

use crate::models::{CurrentUser, Permission, ShareEntry};

/// Return `true` when `user` may mutate a record shared via `shared_with`.
///
/// Admins always pass. Other users pass only with an `edit` entry matching
/// their e-mail (case-insensitive).
pub fn has_permission(user: &CurrentUser, shared_with: &[ShareEntry]) -> bool {
    if user.is_admin() {
        return true;
    }
    if user.email.is_empty() {
        return false;
    }
    shared_with.iter().any(|entry| {
        entry.permission == Permission::Edit && entry.member.email.eq_ignore_ascii_case(&user.email)
    })
}

/// Which rule guards an action.
#[derive(Debug, Clone, Copy)]
pub enum Gate<'a> {
    /// Any signed-in user may run the action (team creation).
    Open,
    /// Only admins (bulk deletes, uploads, new folders, membership management).
    AdminOnly,
    /// Admins, or users holding an `edit` entry on the record.
    Record(&'a [ShareEntry]),
}

impl Gate<'_> {
    /// Evaluate the gate for `user`.
    pub fn allows(&self, user: &CurrentUser) -> bool {
        match self {
            Self::Open => true,
            Self::AdminOnly => user.is_admin(),
            Self::Record(shared_with) => has_permission(user, shared_with),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberRef;

    fn entry(email: &str, permission: Permission) -> ShareEntry {
        ShareEntry {
            member: MemberRef {
                id: format!("id-{email}"),
                name: None,
                email: email.to_string(),
                avatar_url: None,
            },
            permission,
        }
    }

    #[test]
    fn admin_passes_without_entries() {
        let admin = CurrentUser::new("boss@team.io", "admin");
        assert!(has_permission(&admin, &[]));
        assert!(Gate::AdminOnly.allows(&admin));
    }

    #[test]
    fn member_needs_matching_edit_entry() {
        let user = CurrentUser::new("ana@team.io", "member");
        let shared = vec![
            entry("ANA@team.io", Permission::View),
            entry("bo@team.io", Permission::Edit),
        ];
        assert!(!has_permission(&user, &shared));
        assert!(!Gate::Record(&shared).allows(&user));
        assert!(!Gate::AdminOnly.allows(&user));
        assert!(Gate::Open.allows(&user));

        let shared = vec![entry("Ana@Team.io", Permission::Edit)];
        assert!(has_permission(&user, &shared));
    }

    #[test]
    fn blank_email_never_matches() {
        let user = CurrentUser::new("", "member");
        assert!(!has_permission(&user, &[entry("", Permission::Edit)]));
    }
}
