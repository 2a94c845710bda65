//! Core domain library for Mergeflow (records, query engine, table state, config).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants (filter options, defaults).
pub mod constants;
/// Application error types (validation/domain).
pub mod error;
/// File type classification used by the type filter.
pub mod file_type;
/// Data models for records, users and request payloads.
pub mod models;
/// Admin-or-edit permission gate.
pub mod permission;
/// Stable sort and filter engine shared by every list view.
pub mod query;
/// Pagination, selection and sort state for table views.
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::{DEFAULT_API_URL, DEFAULT_ROWS_PER_PAGE, ROLE_FILTER_ALL};
pub use error::AppError;
pub use models::{CurrentUser, Document, Group, Member, Permission, ShareEntry};
pub use permission::{has_permission, Gate};
pub use query::{
    apply_filter, get_comparator, FieldValue, FilterCriteria, FilteredView, Filterable, Order,
};
pub use table::TableState;
