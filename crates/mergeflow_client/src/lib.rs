//! Client runtime for Mergeflow: REST transport, query cache, mutation locks
//! and the mutation orchestrator.

/// Request/response values, the transport trait and its HTTP implementation.
pub mod api;
/// Keyed stale-while-revalidate cache.
pub mod cache;
pub mod error;
/// Per-key async locks serializing overlapping mutations.
pub mod locks;
/// User notification sinks.
pub mod notify;
pub mod orchestrator;
/// Identity-provider profile operations.
pub mod profiles;

pub use api::{ApiRequest, ApiResponse, HttpApi, Method, RestApi};
pub use cache::{CacheKey, FetchState, QueryCache};
pub use error::ApiError;
pub use locks::{MutationGuard, MutationLocks};
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier, Variant};
pub use orchestrator::{
    ActionResult, DocumentScope, MutationOutcome, Orchestrator, OrchestratorSettings, ShareTarget,
    TableView,
};
pub use profiles::{NoopProfiles, ProfileDirectory};
