use crate::cli::AddCommand;
use crate::util::{parse_reminder, parse_when};
use anyhow::{anyhow, Result};
use memora_core::models::{NewTaskData, NotifyMethod, Recurrence, TaskPriority};
use memora_core::recurrence::RecurrenceExpander;
use memora_core::store::{NotificationQueue, SqliteStore, TaskStore};
use memora_core::temporal::format_date;
use owo_colors::OwoColorize;

pub async fn add_task(store: &SqliteStore, command: AddCommand) -> Result<()> {
    let due_date = command.due.as_deref().map(parse_when).transpose()?;
    let reminder_at = command
        .remind
        .as_deref()
        .map(|r| parse_reminder(r, due_date))
        .transpose()?;

    let priority = match command.priority.as_deref() {
        Some(p) => Some(p.parse::<TaskPriority>().map_err(|e| anyhow!(e))?),
        None => None,
    };
    let recurrence = match command.every.as_deref() {
        Some(r) => Some(r.parse::<Recurrence>().map_err(|e| anyhow!(e))?),
        None => None,
    };
    if recurrence == Some(Recurrence::Custom) {
        let rule = command
            .rule
            .as_deref()
            .ok_or_else(|| anyhow!("--every custom requires --rule"))?;
        RecurrenceExpander::validate_rule(rule)?;
    }

    let task = store
        .add_task(NewTaskData {
            title: command.title,
            description: command.description,
            priority,
            due_date,
            reminder_at,
            recurrence,
            recurrence_rule: command.rule,
            tags: command.tags,
            context: command.context,
            ..Default::default()
        })
        .await?;

    // a reminder on the task gets a matching queue entry straight away
    if let Some(fire_at) = task.reminder_at {
        store.schedule(task.id, fire_at, NotifyMethod::Auto).await?;
    }

    println!(
        "{} Created task: {}",
        "✓".green().bold(),
        task.title.bold()
    );
    println!("  ID: {}", task.id.to_string().yellow());
    if let Some(due) = task.due_date {
        println!("  Due: {}", format_date(due));
    }
    if let Some(reminder) = task.reminder_at {
        println!("  Reminder: {}", format_date(reminder));
    }
    Ok(())
}
