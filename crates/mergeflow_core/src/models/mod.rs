//! Data models for team records, the signed-in user and API payloads.

/// Documents (files and folders) and their share entries.
pub mod document;
/// Team members and groups.
pub mod member;
/// Request/response bodies for mutating endpoints.
pub mod requests;
/// Signed-in user.
pub mod user;


pub use document::{Document, GroupRef, MemberRef, Permission, ShareEntry};
pub use member::{Group, Member};
pub use user::CurrentUser;
