use crate::cli::EditCommand;
use crate::util::{parse_when, resolve_task_id};
use anyhow::{anyhow, Result};
use memora_core::models::{TaskPriority, UpdateTaskData};
use memora_core::store::{SqliteStore, TaskStore};
use owo_colors::OwoColorize;

pub async fn edit_task(store: &SqliteStore, command: EditCommand) -> Result<()> {
    let id = resolve_task_id(store, &command.id).await?;

    let due_date = if command.due_clear {
        Some(None)
    } else {
        match command.due.as_deref() {
            Some(due) => Some(Some(parse_when(due)?)),
            None => None,
        }
    };
    let priority = match command.priority.as_deref() {
        Some(p) => Some(p.parse::<TaskPriority>().map_err(|e| anyhow!(e))?),
        None => None,
    };

    let data = UpdateTaskData {
        title: command.title,
        description: if command.description_clear {
            Some(None)
        } else {
            command.description.map(Some)
        },
        priority,
        due_date,
        context: if command.context_clear {
            Some(None)
        } else {
            command.context.map(Some)
        },
        tags: command.tags.map(Some),
        ..Default::default()
    };

    let task = store.update_task(id, data).await?;
    println!("{} Updated task: {}", "✓".green().bold(), task.title.bold());
    Ok(())
}
