//! Root crate facade for the Mergeflow client core and runtime.

pub use mergeflow_client::{
    api, cache, locks, notify, orchestrator, profiles, ActionResult, ApiError, HttpApi,
    MutationOutcome, Orchestrator, OrchestratorSettings, QueryCache, RestApi,
};
pub use mergeflow_core::{
    config, constants, models, permission, query, table, AppError, Config, CurrentUser, Document,
    FilterCriteria, Group, Member, TableState,
};
