use clap::{Parser, Subcommand};

/// A local task manager with quick capture, natural-language dates and a
/// background reminder daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Full-text search over open tasks
    Search(SearchCommand),
    /// Edit a task
    Edit(EditCommand),
    /// Mark a task as completed
    Do(IdCommand),
    /// Reopen a completed task
    Undo(IdCommand),
    /// Mark a task as in progress
    Start(IdCommand),
    /// Cancel a task
    Cancel(IdCommand),
    /// Delete a task
    Delete(DeleteCommand),
    /// Quick-capture inbox
    Inbox(InboxCommand),
    /// Scheduled reminders
    Remind(RemindCommand),
    /// Reminder daemon control
    Daemon(DaemonCommand),
    /// Notification system health
    Health(HealthCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[clap(short, long)]
    pub description: Option<String>,
    /// Due date ("tomorrow at 9am", "next friday", "2025-12-25", ...)
    #[clap(long)]
    pub due: Option<String>,
    /// Remind this long before the due date ("30m", "1h", "2d"), or at an
    /// absolute time when no due date is set
    #[clap(long)]
    pub remind: Option<String>,
    /// The priority of the task (urgent, normal, low)
    #[clap(short, long)]
    pub priority: Option<String>,
    /// Comma-separated tags
    #[clap(short, long)]
    pub tags: Option<String>,
    /// Context bucket (e.g. home, work)
    #[clap(short, long)]
    pub context: Option<String>,
    /// Recurrence kind (daily, weekly, monthly, custom)
    #[clap(long)]
    pub every: Option<String>,
    /// Raw RFC 5545 rule, used with --every custom
    #[clap(long)]
    pub rule: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Show only today's tasks
    #[clap(long, conflicts_with_all = ["overdue", "upcoming"])]
    pub today: bool,
    /// Show only overdue tasks
    #[clap(long, conflicts_with = "upcoming")]
    pub overdue: bool,
    /// Show tasks due within N days
    #[clap(long)]
    pub upcoming: Option<u32>,
    /// Filter by context
    #[clap(short, long)]
    pub context: Option<String>,
    /// Include completed and cancelled tasks
    #[clap(short, long)]
    pub all: bool,
    /// Maximum number of rows
    #[clap(long)]
    pub limit: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// Search terms
    pub query: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique prefix) of the task to edit
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, conflicts_with = "description")]
    pub description_clear: bool,

    /// New due date, natural language accepted
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, conflicts_with = "due")]
    pub due_clear: bool,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub context: Option<String>,
    #[arg(long, conflicts_with = "context")]
    pub context_clear: bool,

    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct IdCommand {
    /// The ID (or unique prefix) of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique prefix) of the task to delete
    pub id: String,
    /// Force deletion without confirmation
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct InboxCommand {
    #[command(subcommand)]
    pub command: InboxSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum InboxSubcommand {
    /// Capture a note
    Add(InboxAddCommand),
    /// List unprocessed notes
    List,
    /// Promote a note into a task
    Promote(InboxPromoteCommand),
    /// Delete a note
    Delete(InboxIdCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct InboxAddCommand {
    /// The note content
    pub content: String,
}

#[derive(Parser, Debug, Clone)]
pub struct InboxPromoteCommand {
    /// The inbox item ID
    pub id: String,
    /// Title for the new task; defaults to the note content
    #[clap(long)]
    pub title: Option<String>,
    /// Due date for the new task
    #[clap(long)]
    pub due: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct InboxIdCommand {
    /// The inbox item ID
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RemindCommand {
    #[command(subcommand)]
    pub command: RemindSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RemindSubcommand {
    /// Schedule a reminder for a task
    Add(RemindAddCommand),
    /// Schedule a free-standing reminder
    Custom(RemindCustomCommand),
    /// List pending reminders
    List,
    /// Push a reminder to a later time
    Snooze(RemindSnoozeCommand),
    /// Dismiss a delivered reminder
    Ack(RemindIdCommand),
    /// Cancel a reminder outright
    Cancel(RemindIdCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct RemindAddCommand {
    /// The task ID (or unique prefix)
    pub id: String,
    /// When to fire: natural language ("tomorrow at 9am") or a delay ("30m")
    pub when: String,
    /// Delivery method (auto, native, desktop, terminal, sound, log)
    #[clap(long, default_value = "auto")]
    pub method: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RemindCustomCommand {
    /// The reminder title
    pub title: String,
    /// When to fire
    pub when: String,
    /// The reminder body
    #[clap(long, default_value = "")]
    pub body: String,
    /// Delivery method (auto, native, desktop, terminal, sound, log)
    #[clap(long, default_value = "auto")]
    pub method: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RemindSnoozeCommand {
    /// The reminder ID
    pub id: String,
    /// New fire time: natural language or a delay ("15m")
    pub when: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RemindIdCommand {
    /// The reminder ID
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DaemonCommand {
    #[command(subcommand)]
    pub command: DaemonSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DaemonSubcommand {
    /// Run the daemon in the foreground (what the supervisor invokes)
    Run,
    /// Start the daemon as a detached background process
    Start,
    /// Stop a running daemon
    Stop,
    /// Restart the daemon
    Restart,
    /// Show whether the daemon is running
    Status,
    /// Register the daemon with the OS service supervisor
    Install,
    /// Remove the daemon from the OS service supervisor
    Uninstall,
}

#[derive(Parser, Debug, Clone)]
pub struct HealthCommand {
    /// Emit the snapshot as JSON
    #[clap(long)]
    pub json: bool,
}
