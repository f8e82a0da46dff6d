use crate::cli::{InboxAddCommand, InboxIdCommand, InboxPromoteCommand};
use crate::util::parse_when;
use crate::views::table::display_inbox;
use anyhow::{anyhow, Result};
use memora_core::models::{InboxItem, NewTaskData};
use memora_core::store::{InboxStore, SqliteStore, TaskStore};
use owo_colors::OwoColorize;
use uuid::Uuid;

/// Inbox ids are resolved against the unprocessed listing, by full UUID or
/// hex prefix.
async fn resolve_inbox_item(store: &SqliteStore, id: &str) -> Result<InboxItem> {
    let items = store.list_unprocessed().await?;

    if let Ok(full) = id.parse::<Uuid>() {
        return items
            .into_iter()
            .find(|i| i.id == full)
            .ok_or_else(|| anyhow!("No unprocessed inbox item with ID '{id}'"));
    }

    let prefix = id.replace('-', "").to_lowercase();
    let mut matches: Vec<InboxItem> = items
        .into_iter()
        .filter(|i| i.id.simple().to_string().starts_with(&prefix))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(anyhow!("No unprocessed inbox item with ID prefix '{id}'")),
        _ => Err(anyhow!("Ambiguous inbox ID prefix '{id}'")),
    }
}

pub async fn capture(store: &SqliteStore, command: InboxAddCommand) -> Result<()> {
    let item = store.capture(&command.content, "cli").await?;
    println!(
        "{} Captured: {} ({})",
        "✓".green().bold(),
        item.content,
        (&item.id.simple().to_string()[..8]).yellow()
    );
    Ok(())
}

pub async fn list(store: &SqliteStore) -> Result<()> {
    let items = store.list_unprocessed().await?;
    display_inbox(&items);
    Ok(())
}

/// Turn a captured note into a real task and mark the note processed.
pub async fn promote(store: &SqliteStore, command: InboxPromoteCommand) -> Result<()> {
    let item = resolve_inbox_item(store, &command.id).await?;
    let due_date = command.due.as_deref().map(parse_when).transpose()?;

    let task = store
        .add_task(NewTaskData {
            title: command.title.unwrap_or_else(|| item.content.clone()),
            due_date,
            source: Some("inbox".to_string()),
            ..Default::default()
        })
        .await?;
    store.process_item(item.id, task.id).await?;

    println!(
        "{} Promoted to task: {} ({})",
        "✓".green().bold(),
        task.title.bold(),
        (&task.id.simple().to_string()[..8]).yellow()
    );
    Ok(())
}

pub async fn delete(store: &SqliteStore, command: InboxIdCommand) -> Result<()> {
    let item = resolve_inbox_item(store, &command.id).await?;
    store.delete_item(item.id).await?;
    println!("{} Deleted inbox item.", "✗".red());
    Ok(())
}
