//! Mutation orchestrator: permission gate, optimistic update, remote call and
//! reconciliation for every state-changing action.
//!
//! Each action walks `Idle -> PermissionChecked -> {Denied | Optimistic ->
//! Requesting -> {Succeeded | Failed}}`. Failures refetch every key the action
//! touched optimistically instead of rolling back by hand.

mod documents;
mod team;


pub use documents::ShareTarget;

use crate::api::{endpoints, ApiRequest, ApiResponse, RestApi};
use crate::cache::{CacheKey, FetchFuture, FetchState, Fetcher, QueryCache};
use crate::error::ApiError;
use crate::locks::{MutationGuard, MutationLocks};
use crate::notify::{Notifier, TracingNotifier, Variant};
use crate::profiles::{NoopProfiles, ProfileDirectory};
use mergeflow_core::constants::{PERMISSION_DENIED_MESSAGE, REGISTER_PATH};
use mergeflow_core::{
    apply_filter, get_comparator, AppError, Config, CurrentUser, Document, FilterCriteria,
    Filterable, Gate, Group, Member, TableState,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of one orchestrated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Succeeded,
    /// Nothing to do (e.g. the permission is already the requested one).
    Unchanged,
    /// The permission gate rejected the action; no request was sent.
    Denied,
    /// Input validation failed; no request was sent.
    Invalid(String),
    /// The remote call failed; affected keys were refetched.
    Failed(String),
    /// A compound action stopped midway.
    PartiallyApplied {
        completed: Vec<String>,
        failed: String,
    },
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Unchanged)
    }
}

/// Outcome plus the value the server returned on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult<T> {
    pub outcome: MutationOutcome,
    pub value: Option<T>,
}

impl<T> ActionResult<T> {
    fn done(value: T) -> Self {
        Self {
            outcome: MutationOutcome::Succeeded,
            value: Some(value),
        }
    }
}

impl<T> From<MutationOutcome> for ActionResult<T> {
    fn from(outcome: MutationOutcome) -> Self {
        Self {
            outcome,
            value: None,
        }
    }
}

/// Which document listing this orchestrator works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentScope {
    /// Team root listing (`documents?teamId&userEmail`).
    Root,
    /// Files of one folder (`documents/{folderId}`).
    Folder(String),
}

/// Table state to settle after rows are removed, with the filters it shows.
pub struct TableView<'a> {
    pub table: &'a mut TableState,
    pub criteria: &'a FilterCriteria,
}

impl<'a> TableView<'a> {
    pub fn new(table: &'a mut TableState, criteria: &'a FilterCriteria) -> Self {
        Self { table, criteria }
    }
}

/// Tunables taken from [`Config`].
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub request_timeout: Duration,
    /// Registration link embedded in invitation e-mails.
    pub invitation_link: String,
    pub revalidate_on_failure: bool,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            invitation_link: format!(
                "{}{}",
                config.invite_base_url.trim_end_matches('/'),
                REGISTER_PATH
            ),
            revalidate_on_failure: config.revalidate_on_failure,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A cache key touched by an action, tagged with the cache that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Touched {
    Documents(CacheKey),
    Members(CacheKey),
    Groups(CacheKey),
}

impl Touched {
    fn key(&self) -> &CacheKey {
        match self {
            Self::Documents(key) | Self::Members(key) | Self::Groups(key) => key,
        }
    }
}

/// Phases an action moves through; logged at `debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PermissionChecked,
    Denied,
    Optimistic,
    Requesting,
    Succeeded,
    Failed,
}

fn trace_phase(action: &str, phase: Phase) {
    debug!(action, phase = ?phase, "mutation phase");
}

/// Drives every mutating action against the shared caches.
///
/// Cloning is cheap; clones share caches, locks and collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    api: Arc<dyn RestApi>,
    user: CurrentUser,
    notifier: Arc<dyn Notifier>,
    profiles: Arc<dyn ProfileDirectory>,
    documents: Arc<QueryCache<Vec<Document>>>,
    members: Arc<QueryCache<Vec<Member>>>,
    groups: Arc<QueryCache<Vec<Group>>>,
    locks: Arc<MutationLocks>,
    settings: OrchestratorSettings,
    scope: DocumentScope,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn RestApi>, user: CurrentUser, settings: OrchestratorSettings) -> Self {
        Self {
            api,
            user,
            notifier: Arc::new(TracingNotifier),
            profiles: Arc::new(NoopProfiles),
            documents: Arc::new(QueryCache::new()),
            members: Arc::new(QueryCache::new()),
            groups: Arc::new(QueryCache::new()),
            locks: Arc::new(MutationLocks::new()),
            settings,
            scope: DocumentScope::Root,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileDirectory>) -> Self {
        self.profiles = profiles;
        self
    }

    /// Same caches and collaborators, scoped to the files of `folder_id`.
    pub fn in_folder(&self, folder_id: impl Into<String>) -> Self {
        let mut scoped = self.clone();
        scoped.scope = DocumentScope::Folder(folder_id.into());
        scoped
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn scope(&self) -> &DocumentScope {
        &self.scope
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn documents_cache(&self) -> &Arc<QueryCache<Vec<Document>>> {
        &self.documents
    }

    pub fn members_cache(&self) -> &Arc<QueryCache<Vec<Member>>> {
        &self.members
    }

    pub fn groups_cache(&self) -> &Arc<QueryCache<Vec<Group>>> {
        &self.groups
    }

    pub fn locks(&self) -> &MutationLocks {
        &self.locks
    }

    fn team_id(&self) -> Option<&str> {
        self.user.team_scope()
    }

    /// Key of the document listing in scope; `None` without a usable team.
    pub fn documents_key(&self) -> Option<CacheKey> {
        match &self.scope {
            DocumentScope::Root => endpoints::documents_key(self.team_id()?, &self.user.email),
            DocumentScope::Folder(folder_id) => {
                self.team_id()?;
                endpoints::folder_key(folder_id)
            }
        }
    }

    pub fn members_key(&self) -> Option<CacheKey> {
        endpoints::members_key(self.team_id()?)
    }

    pub fn groups_key(&self) -> Option<CacheKey> {
        endpoints::groups_key(self.team_id()?)
    }

    fn folder_id(&self) -> Option<&str> {
        match &self.scope {
            DocumentScope::Root => None,
            DocumentScope::Folder(folder_id) => Some(folder_id),
        }
    }

    fn json_fetcher<D, T, F>(&self, request: ApiRequest, map: F) -> Fetcher<T>
    where
        D: DeserializeOwned + Send + 'static,
        T: Send + 'static,
        F: Fn(D) -> T + Copy + Send + Sync + 'static,
    {
        let api = Arc::clone(&self.api);
        let timeout = self.settings.request_timeout;
        Arc::new(move || -> FetchFuture<T> {
            let api = Arc::clone(&api);
            let request = request.clone();
            Box::pin(async move {
                let response = send_with_timeout(api.as_ref(), request, timeout).await?;
                let decoded: D = response.expect_status(200)?.json()?;
                Ok(map(decoded))
            })
        })
    }

    /// Fetch (and register) the document listing in scope.
    pub async fn load_documents(&self) -> FetchState<Vec<Document>> {
        let key = self.documents_key();
        let fetcher = match (&self.scope, self.team_id()) {
            (DocumentScope::Folder(folder_id), _) => self.json_fetcher(
                endpoints::get_folder(folder_id),
                |folder: Document| folder.files,
            ),
            (DocumentScope::Root, team_id) => self.json_fetcher(
                endpoints::list_documents(team_id.unwrap_or_default(), &self.user.email),
                |rows: Vec<Document>| rows,
            ),
        };
        self.documents.fetch(key.as_ref(), fetcher).await
    }

    pub async fn load_members(&self) -> FetchState<Vec<Member>> {
        let key = self.members_key();
        let fetcher = self.json_fetcher(
            endpoints::list_members(self.team_id().unwrap_or_default()),
            |rows: Vec<Member>| rows,
        );
        self.members.fetch(key.as_ref(), fetcher).await
    }

    pub async fn load_groups(&self) -> FetchState<Vec<Group>> {
        let key = self.groups_key();
        let fetcher = self.json_fetcher(
            endpoints::list_groups(self.team_id().unwrap_or_default()),
            |rows: Vec<Group>| rows,
        );
        self.groups.fetch(key.as_ref(), fetcher).await
    }

    fn notify(&self, text: &str, variant: Variant) {
        self.notifier.enqueue_message(text, variant);
    }

    /// Evaluate `gate`; notify and log on denial.
    fn check_gate(&self, action: &'static str, gate: Gate<'_>) -> bool {
        if gate.allows(&self.user) {
            trace_phase(action, Phase::PermissionChecked);
            return true;
        }
        trace_phase(action, Phase::Denied);
        warn!(action, user = %self.user.email, "permission denied");
        self.notify(PERMISSION_DENIED_MESSAGE, Variant::Error);
        false
    }

    fn invalid(&self, action: &'static str, err: AppError) -> MutationOutcome {
        let message = match err {
            AppError::Validation(message) => message,
            other => other.to_string(),
        };
        warn!(action, reason = %message, "rejected before request");
        self.notify(&message, Variant::Error);
        MutationOutcome::Invalid(message)
    }

    /// Team id for a scoped action, or the `Invalid` outcome to return.
    fn require_team(&self, action: &'static str) -> Result<String, MutationOutcome> {
        self.team_id()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(action, AppError::MissingTeam))
    }

    async fn lock(&self, touched: &[Touched]) -> MutationGuard {
        self.locks
            .lock_all(touched.iter().map(|entry| entry.key().as_str()))
            .await
    }

    /// Send `request` and require `expected`.
    async fn request(
        &self,
        action: &'static str,
        request: Result<ApiRequest, ApiError>,
        expected: u16,
    ) -> Result<ApiResponse, ApiError> {
        trace_phase(action, Phase::Requesting);
        let request = request?;
        debug!(action, request = %request, "sending");
        let response = send_with_timeout(self.api.as_ref(), request, self.settings.request_timeout).await?;
        response.expect_status(expected)
    }

    /// Reload every touched key.
    async fn refresh(&self, touched: &[Touched]) {
        for entry in touched {
            match entry {
                Touched::Documents(key) => {
                    self.documents.invalidate(key).await;
                }
                Touched::Members(key) => {
                    self.members.invalidate(key).await;
                }
                Touched::Groups(key) => {
                    self.groups.invalidate(key).await;
                }
            }
        }
    }

    async fn succeed(&self, action: &'static str, message: &str, touched: &[Touched]) -> MutationOutcome {
        trace_phase(action, Phase::Succeeded);
        info!(action, "mutation succeeded");
        self.notify(message, Variant::Success);
        self.refresh(touched).await;
        MutationOutcome::Succeeded
    }

    async fn fail(
        &self,
        action: &'static str,
        message: &str,
        err: &ApiError,
        touched: &[Touched],
    ) -> MutationOutcome {
        trace_phase(action, Phase::Failed);
        match err {
            ApiError::UnexpectedStatus { status, .. } => {
                error!(action, status, error = %err, "mutation failed")
            }
            _ => error!(action, error = %err, "mutation failed"),
        }
        self.notify(message, Variant::Error);
        if self.settings.revalidate_on_failure {
            self.refresh(touched).await;
        }
        MutationOutcome::Failed(err.to_string())
    }

    /// Map a request result to the success or failure path.
    async fn finish(
        &self,
        action: &'static str,
        result: Result<ApiResponse, ApiError>,
        success: &str,
        failure: &str,
        touched: &[Touched],
    ) -> MutationOutcome {
        match result {
            Ok(_) => self.succeed(action, success, touched).await,
            Err(err) => self.fail(action, failure, &err, touched).await,
        }
    }
}

async fn send_with_timeout(
    api: &dyn RestApi,
    request: ApiRequest,
    timeout: Duration,
) -> Result<ApiResponse, ApiError> {
    match tokio::time::timeout(timeout, api.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Prune `removed` from the selection and move the page back if the removal
/// emptied it. `rows` is the collection as it was before the removal.
fn settle_removal<R: Filterable>(view: Option<TableView<'_>>, rows: &[R], removed: &[String]) {
    let Some(TableView { table, criteria }) = view else {
        return;
    };
    let filtered = apply_filter(
        Some(rows),
        get_comparator::<R>(table.order(), table.order_by()),
        criteria,
    );
    let page_len = table.page_slice(&filtered.rows).len();
    let removed_in_view = filtered
        .rows
        .iter()
        .filter(|row| removed.iter().any(|id| id == row.record_id()))
        .count();
    table.prune_selection(removed);
    table.recompute_page_after_removal(
        removed_in_view,
        page_len,
        filtered.len(),
        filtered.len() - removed_in_view,
    );
}

/// Remove rows whose id is in `removed`.
fn retain_unremoved<R: Filterable>(rows: &mut Vec<R>, removed: &[String]) {
    rows.retain(|row| !removed.iter().any(|id| id == row.record_id()));
}
