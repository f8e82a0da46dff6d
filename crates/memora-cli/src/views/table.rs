use chrono::{Local, NaiveDateTime, TimeZone};
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use memora_core::health::HealthSnapshot;
use memora_core::models::{
    InboxItem, ScheduledNotification, Task, TaskPriority, TaskStatus,
};

fn humanize(t: NaiveDateTime) -> String {
    match Local.from_local_datetime(&t).earliest() {
        Some(local) => local.humanize(),
        None => t.format("%Y-%m-%d %H:%M").to_string(),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

pub fn display_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let now = Local::now().naive_local();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Status", "Priority", "Due", "Context", "Tags"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let mut title_cell = Cell::new(&task.title);
        if task.priority == TaskPriority::Urgent {
            title_cell = title_cell.add_attribute(Attribute::Bold);
        }
        if task.status.is_terminal() {
            title_cell = title_cell.add_attribute(Attribute::Dim);
        }
        row.add_cell(title_cell);

        let status_cell = match task.status {
            TaskStatus::Pending => Cell::new("pending"),
            TaskStatus::InProgress => Cell::new("in progress").fg(Color::Cyan),
            TaskStatus::Completed => Cell::new("completed").fg(Color::Green),
            TaskStatus::Cancelled => Cell::new("cancelled").fg(Color::DarkGrey),
        };
        row.add_cell(status_cell);

        let priority_cell = match task.priority {
            TaskPriority::Urgent => Cell::new("urgent").fg(Color::Red),
            TaskPriority::Normal => Cell::new("normal"),
            TaskPriority::Low => Cell::new("low").fg(Color::DarkGrey),
        };
        row.add_cell(priority_cell);

        let due_cell = match task.due_date {
            Some(due) if due < now && !task.status.is_terminal() => {
                Cell::new(humanize(due)).fg(Color::Red)
            }
            Some(due) => Cell::new(humanize(due)),
            None => Cell::new(""),
        };
        row.add_cell(due_cell);

        row.add_cell(Cell::new(task.context.as_deref().unwrap_or("")));
        row.add_cell(Cell::new(task.tags.as_deref().unwrap_or("")));

        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_inbox(items: &[InboxItem]) {
    if items.is_empty() {
        println!("Inbox is empty.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Content", "Captured", "Source"]);
    for item in items {
        table.add_row(vec![
            Cell::new(short_id(&item.id)),
            Cell::new(&item.content),
            Cell::new(humanize(item.captured_at)),
            Cell::new(&item.source),
        ]);
    }
    println!("{table}");
}

pub fn display_notifications(notifications: &[ScheduledNotification]) {
    if notifications.is_empty() {
        println!("No pending reminders.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Fires", "Status", "Method", "Retries", "Title"]);
    for n in notifications {
        table.add_row(vec![
            Cell::new(short_id(&n.id)),
            Cell::new(humanize(n.scheduled_at)),
            Cell::new(n.status.to_string()),
            Cell::new(n.method.to_string()),
            Cell::new(format!("{}/{}", n.retry_count, n.max_retries)),
            Cell::new(n.title.as_deref().unwrap_or("(task)")),
        ]);
    }
    println!("{table}");
}

pub fn display_health(health: &HealthSnapshot) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    let daemon_cell = if health.daemon_running {
        Cell::new("running").fg(Color::Green)
    } else {
        Cell::new("stopped").fg(Color::Red)
    };
    table.add_row(vec![Cell::new("Daemon"), daemon_cell]);

    if let Some(pid) = health.daemon_pid {
        table.add_row(vec![Cell::new("PID"), Cell::new(pid)]);
    }
    if let Some(uptime) = health.uptime_seconds {
        table.add_row(vec![
            Cell::new("Uptime"),
            Cell::new(format!("{}h {}m", uptime / 3600, (uptime % 3600) / 60)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Active method"),
        Cell::new(health.active_method.to_string()),
    ]);
    table.add_row(vec![Cell::new("Pending"), Cell::new(health.pending)]);
    table.add_row(vec![Cell::new("Snoozed"), Cell::new(health.snoozed)]);
    table.add_row(vec![Cell::new("Sent (24h)"), Cell::new(health.sent_last_24h)]);
    table.add_row(vec![
        Cell::new("Failed (24h)"),
        Cell::new(health.failed_last_24h),
    ]);
    if let Some(error) = &health.last_error {
        table.add_row(vec![Cell::new("Last error"), Cell::new(error).fg(Color::Red)]);
    }
    if let Some(bytes) = health.memory_bytes {
        table.add_row(vec![
            Cell::new("Memory"),
            Cell::new(format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))),
        ]);
    }

    println!("{table}");
}
