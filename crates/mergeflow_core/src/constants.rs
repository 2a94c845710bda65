//! Shared constants used across Mergeflow crates.

/// Default REST base URL for CLI/API clients.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default base URL used to build invitation links.
pub const DEFAULT_INVITE_BASE_URL: &str = "http://localhost:3000";

/// Path appended to the invite base URL for registration links.
pub const REGISTER_PATH: &str = "/auth/register";

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Rows per page used by table views that do not override it.
pub const DEFAULT_ROWS_PER_PAGE: usize = 5;

/// Rows per page used by the document views.
pub const DOCUMENTS_ROWS_PER_PAGE: usize = 10;

/// Row heights for dense and regular table layouts.
pub const DENSE_ROW_HEIGHT: u32 = 52;
/// Regular (non-dense) row height.
pub const REGULAR_ROW_HEIGHT: u32 = 72;

/// Sentinel role filter value that disables role filtering.
pub const ROLE_FILTER_ALL: &str = "all";

/// Team id placeholder meaning "no team yet"; suppresses team-scoped fetches.
pub const NO_TEAM_ID: &str = "-1";

/// Type tags offered by the document type filter.
pub const FILE_TYPE_OPTIONS: &[&str] = &[
    "folder",
    "txt",
    "zip",
    "audio",
    "image",
    "video",
    "word",
    "excel",
    "powerpoint",
    "pdf",
    "photoshop",
    "illustrator",
];

/// Role filter options for the members table.
pub const ROLE_OPTIONS_MEMBERS: &[&str] = &[
    ROLE_FILTER_ALL,
    "backend developer",
    "frontend developer",
    "full stack developer",
    "leader",
    "project manager",
    "ui/ux designer",
];

/// Role filter options for the groups table.
pub const ROLE_OPTIONS_GROUPS: &[&str] = &[
    ROLE_FILTER_ALL,
    "content",
    "development",
    "hr",
    "management",
    "marketing",
];

/// Message shown when the permission gate rejects an action.
pub const PERMISSION_DENIED_MESSAGE: &str =
    "You do not have the sufficient permission to perform this task.";
