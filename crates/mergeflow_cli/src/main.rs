//! Command-line client for the Mergeflow team documents API.

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::builder::PossibleValuesParser;
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use mergeflow_client::{
    FetchState, HttpApi, MutationOutcome, Notification, Orchestrator, OrchestratorSettings,
    RecordingNotifier, ShareTarget,
};
use mergeflow_core::constants::{FILE_TYPE_OPTIONS, ROLE_OPTIONS_GROUPS, ROLE_OPTIONS_MEMBERS};
use mergeflow_core::file_type::file_format;
use mergeflow_core::models::requests::NewFile;
use mergeflow_core::{
    apply_filter, get_comparator, Config, CurrentUser, Document, FilterCriteria, Filterable, Group,
    Member, Order, TableState,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mflow", about = "Mergeflow team documents CLI", version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for [`Config`]; each falls back to its environment variable.
#[derive(Args, Default)]
struct ConfigArgs {
    /// API base URL
    #[arg(short, long, env = "MERGEFLOW_API_URL", global = true)]
    server: Option<String>,

    /// Team id scoping every request
    #[arg(long, env = "MERGEFLOW_TEAM_ID", global = true)]
    team: Option<String>,

    /// E-mail of the acting user
    #[arg(long = "user", env = "MERGEFLOW_USER_EMAIL", global = true)]
    user_email: Option<String>,

    /// Permission class of the acting user (`admin` passes every gate)
    #[arg(long = "user-type", env = "MERGEFLOW_USER_TYPE", global = true)]
    user_type: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long = "timeout-ms", env = "MERGEFLOW_REQUEST_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,
}

impl ConfigArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(server) = non_blank(self.server) {
            config.api_base_url = server;
        }
        if let Some(team) = non_blank(self.team) {
            config.team_id = Some(team);
        }
        if let Some(email) = non_blank(self.user_email) {
            config.user_email = Some(email);
        }
        if let Some(user_type) = non_blank(self.user_type) {
            config.user_type = user_type;
        }
        if let Some(timeout_ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            config.request_timeout_ms = timeout_ms;
        }
        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Subcommand)]
enum Commands {
    /// Documents and folders
    Docs {
        #[command(subcommand)]
        command: DocsCommand,
    },
    /// Team members
    Members {
        #[command(subcommand)]
        command: MembersCommand,
    },
    /// Member groups
    Groups {
        #[command(subcommand)]
        command: GroupsCommand,
    },
    /// Invite someone to the team by e-mail
    Invite { email: String },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Sort and paging flags shared by the list commands.
#[derive(Args)]
struct PageArgs {
    /// Column to sort by
    #[arg(long, default_value = "name")]
    sort: String,

    /// Sort direction (asc or desc)
    #[arg(long, default_value = "asc")]
    order: Order,

    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Rows per page (defaults to MERGEFLOW_ROWS_PER_PAGE)
    #[arg(long)]
    rows: Option<usize>,
}

impl PageArgs {
    fn table(&self, default_rows: usize) -> TableState {
        let mut table = TableState::new(self.rows.unwrap_or(default_rows))
            .with_order(self.sort.clone(), self.order);
        table.set_page(self.page);
        table
    }
}

/// Exactly one of `--email` or `--group`.
#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["email", "group"])))]
struct TargetArgs {
    /// Member e-mail
    #[arg(long)]
    email: Option<String>,

    /// Group id
    #[arg(long)]
    group: Option<String>,
}

impl TargetArgs {
    fn into_target(self) -> anyhow::Result<ShareTarget> {
        match (self.email, self.group) {
            (Some(email), None) => Ok(ShareTarget::Email(email)),
            (None, Some(group)) => Ok(ShareTarget::Group(group)),
            _ => bail!("pass exactly one of --email or --group"),
        }
    }
}

#[derive(Subcommand)]
enum DocsCommand {
    /// List documents with filters, sort and paging
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        name: Option<String>,

        /// Type tag filter; repeat to allow several
        #[arg(long = "type", value_parser = PossibleValuesParser::new(FILE_TYPE_OPTIONS.iter().copied()))]
        types: Vec<String>,

        /// Created on or after this day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Created on or before this day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// List the files of this folder instead of the team root
        #[arg(long)]
        folder: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Delete one or more documents
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Folder holding the documents
        #[arg(long)]
        folder: Option<String>,
    },
    /// Toggle the favorite flag
    Favorite { id: String },
    /// Share a document with a member or a group
    Share {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Revoke a member's or a group's access
    Revoke {
        id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Replace a document's tags
    Tags { id: String, tags: Vec<String> },
    /// Create a folder, uploading local files into it
    NewFolder {
        name: String,

        /// Local file to upload into the folder; repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MembersCommand {
    /// List team members
    List {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = PossibleValuesParser::new(ROLE_OPTIONS_MEMBERS.iter().copied()))]
        role: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },
    /// Delete one or more members
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Put a member into a group, optionally taking them out of another
    Move {
        id: String,

        /// Target group id
        #[arg(long)]
        to: String,

        /// Current group id
        #[arg(long)]
        from: Option<String>,
    },
}

#[derive(Subcommand)]
enum GroupsCommand {
    /// List groups
    List {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = PossibleValuesParser::new(ROLE_OPTIONS_GROUPS.iter().copied()))]
        role: Option<String>,

        #[command(flatten)]
        paging: PageArgs,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mergeflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn current_user(config: &Config) -> CurrentUser {
    let user = CurrentUser::new(
        config.user_email.clone().unwrap_or_default(),
        config.user_type.clone(),
    );
    match config.team_scope() {
        Some(team) => user.with_team(team),
        None => user,
    }
}

fn start_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0).map(|start| start.and_utc())
}

/// Last millisecond of `day`, so the upper bound includes the whole day.
fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_milli_opt(23, 59, 59, 999).map(|end| end.and_utc())
}

fn document_criteria(
    name: Option<String>,
    types: Vec<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> FilterCriteria {
    FilterCriteria::new()
        .with_name(name.unwrap_or_default())
        .with_types(types)
        .with_date_range(from.and_then(start_of_day), to.and_then(end_of_day))
}

fn role_criteria(name: Option<String>, role: Option<String>) -> FilterCriteria {
    let criteria = FilterCriteria::new().with_name(name.unwrap_or_default());
    match role {
        Some(role) => criteria.with_role(role),
        None => criteria,
    }
}

fn loaded<T>(state: FetchState<Vec<T>>, what: &str, config: &Config) -> anyhow::Result<Vec<T>> {
    if config.team_scope().is_none() {
        bail!("No team configured; pass --team or set MERGEFLOW_TEAM_ID");
    }
    match state.data {
        Some(rows) if !state.is_error => Ok(rows),
        _ => bail!("Failed to load {} from {}", what, config.api_base_url),
    }
}

fn document_line(doc: &Document) -> String {
    let created = doc
        .date_created
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let favorite = if doc.is_favorited { "*" } else { " " };
    format!(
        "{}{:<25} {:<32} {:<12} {}",
        favorite,
        doc.id,
        doc.name,
        file_format(&doc.doc_type),
        created
    )
}

fn member_line(member: &Member) -> String {
    format!(
        "{:<25} {:<24} {:<30} {}",
        member.id,
        member.name,
        member.email,
        member.role_tag().unwrap_or("-")
    )
}

fn group_line(group: &Group) -> String {
    format!("{:<25} {:<24} {}", group.id, group.name, group.member_summary())
}

/// Filter, sort and page `rows`, then render the visible page.
fn format_page<R, F>(
    rows: &[R],
    criteria: &FilterCriteria,
    table: &TableState,
    json: bool,
    line: F,
) -> Result<String, String>
where
    R: Filterable + Serialize,
    F: Fn(&R) -> String,
{
    let view = apply_filter(
        Some(rows),
        get_comparator::<R>(table.order(), table.order_by()),
        criteria,
    );
    let visible = table.page_slice(&view.rows);
    if json {
        return serde_json::to_string_pretty(&json!({
            "rows": visible,
            "total": view.len(),
            "page": table.page(),
            "pages": table.page_count(view.len()),
            "isNotFound": view.is_not_found,
        }))
        .map_err(|err| format!("response encoding error: {}", err));
    }
    if view.is_not_found {
        return Ok("No rows match the current filters.".to_string());
    }
    let mut lines: Vec<String> = visible.iter().map(|row| line(*row)).collect();
    lines.push(format!(
        "page {}/{} ({} rows)",
        table.page() + 1,
        table.page_count(view.len()),
        view.len()
    ));
    Ok(lines.join("\n"))
}

fn outcome_label(outcome: &MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Succeeded => "succeeded".to_string(),
        MutationOutcome::Unchanged => "unchanged".to_string(),
        MutationOutcome::Denied => "denied".to_string(),
        MutationOutcome::Invalid(message) => format!("invalid: {}", message),
        MutationOutcome::Failed(message) => format!("failed: {}", message),
        MutationOutcome::PartiallyApplied { completed, failed } => format!(
            "partially applied: completed [{}]; failed {}",
            completed.join(", "),
            failed
        ),
    }
}

/// Render an outcome and the notifications it produced.
fn format_outcome(
    outcome: &MutationOutcome,
    notifications: &[Notification],
    json: bool,
) -> Result<String, String> {
    if json {
        let notes: Vec<Value> = notifications
            .iter()
            .map(|note| json!({ "text": note.text, "variant": note.variant.as_str() }))
            .collect();
        return serde_json::to_string_pretty(&json!({
            "outcome": outcome_label(outcome),
            "success": outcome.is_success(),
            "notifications": notes,
        }))
        .map_err(|err| format!("response encoding error: {}", err));
    }
    let mut lines: Vec<String> = notifications
        .iter()
        .map(|note| format!("[{}] {}", note.variant, note.text))
        .collect();
    if notifications.is_empty() || !outcome.is_success() {
        lines.push(outcome_label(outcome));
    }
    Ok(lines.join("\n"))
}

fn describe_upload(path: &Path) -> anyhow::Result<NewFile> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' has no usable file name", path.display()))?;
    let size = std::fs::metadata(path)
        .with_context(|| format!("reading '{}'", path.display()))?
        .len();
    let mut file = NewFile::from_name(name, size);
    file.path = Some(path.display().to_string());
    Ok(file)
}

struct Session {
    orchestrator: Orchestrator,
    notifier: Arc<RecordingNotifier>,
    config: Config,
    json: bool,
}

impl Session {
    fn new(config: Config, json: bool) -> anyhow::Result<Self> {
        let api = HttpApi::from_config(&config).context("building API client")?;
        debug!(api = %api.base_url(), team = ?config.team_scope(), "session ready");
        let notifier = Arc::new(RecordingNotifier::new());
        let orchestrator = Orchestrator::new(
            Arc::new(api),
            current_user(&config),
            OrchestratorSettings::from_config(&config),
        )
        .with_notifier(notifier.clone());
        Ok(Self {
            orchestrator,
            notifier,
            config,
            json,
        })
    }

    fn scoped(&self, folder: Option<String>) -> Orchestrator {
        match folder {
            Some(folder) => self.orchestrator.in_folder(folder),
            None => self.orchestrator.clone(),
        }
    }

    /// Print the outcome; returns the process exit code.
    fn report(&self, outcome: &MutationOutcome) -> anyhow::Result<i32> {
        let output = format_outcome(outcome, &self.notifier.drain(), self.json)
            .map_err(anyhow::Error::msg)?;
        println!("{}", output);
        Ok(if outcome.is_success() { 0 } else { 1 })
    }

    fn print(&self, output: Result<String, String>) -> anyhow::Result<i32> {
        let output = output.map_err(anyhow::Error::msg)?;
        if !output.is_empty() {
            println!("{}", output);
        }
        Ok(0)
    }

    async fn documents(&self, orchestrator: &Orchestrator) -> anyhow::Result<Vec<Document>> {
        loaded(orchestrator.load_documents().await, "documents", &self.config)
    }

    async fn docs(&self, command: DocsCommand) -> anyhow::Result<i32> {
        match command {
            DocsCommand::List {
                name,
                types,
                from,
                to,
                folder,
                paging,
            } => {
                let docs = self.documents(&self.scoped(folder)).await?;
                let criteria = document_criteria(name, types, from, to);
                let table = paging.table(self.config.rows_per_page);
                self.print(format_page(&docs, &criteria, &table, self.json, document_line))
            }
            DocsCommand::Delete { ids, folder } => {
                let orchestrator = self.scoped(folder);
                self.documents(&orchestrator).await?;
                let outcome = match ids.as_slice() {
                    [id] => orchestrator.delete_document(id, None).await,
                    _ => orchestrator.delete_documents(&ids, None).await,
                };
                self.report(&outcome)
            }
            DocsCommand::Favorite { id } => {
                self.documents(&self.orchestrator).await?;
                let outcome = self.orchestrator.toggle_favorite(&id).await;
                self.report(&outcome)
            }
            DocsCommand::Share { id, target } => {
                self.documents(&self.orchestrator).await?;
                let outcome = self
                    .orchestrator
                    .share_document(&id, &target.into_target()?)
                    .await;
                self.report(&outcome)
            }
            DocsCommand::Revoke { id, target } => {
                self.documents(&self.orchestrator).await?;
                let outcome = self
                    .orchestrator
                    .revoke_share(&id, &target.into_target()?)
                    .await;
                self.report(&outcome)
            }
            DocsCommand::Tags { id, tags } => {
                self.documents(&self.orchestrator).await?;
                let outcome = self.orchestrator.update_tags(&id, tags).await;
                self.report(&outcome)
            }
            DocsCommand::NewFolder { name, files } => {
                let files = files
                    .iter()
                    .map(|path| describe_upload(path))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                self.documents(&self.orchestrator).await?;
                let outcome = self.orchestrator.create_folder_with_files(&name, files).await;
                self.report(&outcome)
            }
        }
    }

    async fn team_rows(&self) -> anyhow::Result<(Vec<Member>, Vec<Group>)> {
        let members = loaded(self.orchestrator.load_members().await, "members", &self.config)?;
        let groups = loaded(self.orchestrator.load_groups().await, "groups", &self.config)?;
        Ok((members, groups))
    }

    async fn members(&self, command: MembersCommand) -> anyhow::Result<i32> {
        match command {
            MembersCommand::List { name, role, paging } => {
                let (members, _) = self.team_rows().await?;
                let criteria = role_criteria(name, role);
                let table = paging.table(self.config.rows_per_page);
                self.print(format_page(&members, &criteria, &table, self.json, member_line))
            }
            MembersCommand::Delete { ids } => {
                self.team_rows().await?;
                let outcome = self.orchestrator.delete_members(&ids, None).await;
                self.report(&outcome)
            }
            MembersCommand::Move { id, to, from } => {
                self.team_rows().await?;
                let outcome = match from {
                    Some(from) => self.orchestrator.move_between_groups(&id, &from, &to).await,
                    None => self.orchestrator.move_to_group(&id, &to).await,
                };
                self.report(&outcome)
            }
        }
    }

    async fn groups(&self, command: GroupsCommand) -> anyhow::Result<i32> {
        match command {
            GroupsCommand::List { name, role, paging } => {
                let (_, groups) = self.team_rows().await?;
                let criteria = role_criteria(name, role);
                let table = paging.table(self.config.rows_per_page);
                self.print(format_page(&groups, &criteria, &table, self.json, group_line))
            }
        }
    }

    async fn invite(&self, email: &str) -> anyhow::Result<i32> {
        self.team_rows().await?;
        let outcome = self.orchestrator.invite_member(email).await;
        self.report(&outcome)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let Cli {
        config,
        json,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let session = Session::new(config.apply(Config::from_env()), json)?;
    let code = match command {
        Commands::Completions { .. } => 0,
        Commands::Docs { command } => session.docs(command).await?,
        Commands::Members { command } => session.members(command).await?,
        Commands::Groups { command } => session.groups(command).await?,
        Commands::Invite { email } => session.invite(&email).await?,
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
