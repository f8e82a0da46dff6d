use crate::cli::{DeleteCommand, IdCommand};
use crate::util::resolve_task_id;
use anyhow::Result;
use dialoguer::Confirm;
use memora_core::models::NotifyMethod;
use memora_core::recurrence::RecurrenceExpander;
use memora_core::store::{NotificationQueue, SqliteStore, TaskStore};
use memora_core::temporal::format_date;
use owo_colors::OwoColorize;

pub async fn complete_task(store: &SqliteStore, command: IdCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;
    let task = store.complete_task(id).await?;
    println!("{} Completed: {}", "✓".green().bold(), task.title.bold());

    // recurring tasks spawn their next instance on completion
    let expander = RecurrenceExpander::new();
    if let Some(next) = expander.next_instance(&task)? {
        let created = store.add_task(next).await?;
        if let Some(fire_at) = created.reminder_at {
            store
                .schedule(created.id, fire_at, NotifyMethod::Auto)
                .await?;
        }
        let due = created
            .due_date
            .map(format_date)
            .unwrap_or_else(|| "unscheduled".to_string());
        println!(
            "  {} Next occurrence created, due {}",
            "↻".blue(),
            due.yellow()
        );
    }
    Ok(())
}

pub async fn uncomplete_task(store: &SqliteStore, command: IdCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;
    let task = store.uncomplete_task(id).await?;
    println!("{} Reopened: {}", "✓".green().bold(), task.title.bold());
    Ok(())
}

pub async fn start_task(store: &SqliteStore, command: IdCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;
    let task = store.start_task(id).await?;
    println!("{} Started: {}", "▶".cyan(), task.title.bold());
    Ok(())
}

pub async fn cancel_task(store: &SqliteStore, command: IdCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;
    let task = store.cancel_task(id).await?;
    println!("{} Cancelled: {}", "✗".red(), task.title.bold());
    Ok(())
}

pub async fn delete_task(store: &SqliteStore, command: DeleteCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;
    let Some(task) = store.find_task_by_id(id).await? else {
        println!("Task not found.");
        return Ok(());
    };

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete task '{}'?",
                task.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete_task(id).await?;
    println!("{} Deleted: {}", "✗".red(), task.title.bold());
    Ok(())
}
