use crate::cli::{RemindAddCommand, RemindCustomCommand, RemindIdCommand, RemindSnoozeCommand};
use crate::util::{parse_when, resolve_task_id};
use crate::views::table::display_notifications;
use anyhow::{anyhow, Result};
use memora_core::models::NotifyMethod;
use memora_core::store::{NotificationQueue, SqliteStore};
use memora_core::temporal::format_date;
use owo_colors::OwoColorize;
use uuid::Uuid;

/// Reminder ids accept a full UUID anywhere; hex prefixes are resolved
/// against the pending listing.
async fn resolve_notification_id(store: &SqliteStore, id: &str) -> Result<Uuid> {
    if let Ok(full) = id.parse::<Uuid>() {
        return Ok(full);
    }

    let prefix = id.replace('-', "").to_lowercase();
    let matches: Vec<Uuid> = store
        .list_pending()
        .await?
        .into_iter()
        .map(|n| n.id)
        .filter(|n| n.simple().to_string().starts_with(&prefix))
        .collect();
    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(anyhow!(
            "No pending reminder with ID prefix '{id}' (delivered reminders need the full ID)"
        )),
        _ => Err(anyhow!("Ambiguous reminder ID prefix '{id}'")),
    }
}

fn parse_method(method: &str) -> Result<NotifyMethod> {
    method.parse::<NotifyMethod>().map_err(|e| anyhow!(e))
}

pub async fn add(store: &SqliteStore, command: RemindAddCommand) -> Result<()> {
    let task_id = resolve_task_id(store, &command.id).await?;
    let fire_at = parse_when(&command.when)?;
    let method = parse_method(&command.method)?;

    let notification = store.schedule(task_id, fire_at, method).await?;
    println!(
        "{} Reminder scheduled for {} ({})",
        "✓".green().bold(),
        format_date(notification.scheduled_at).yellow(),
        notification.id.simple().to_string()[..8].to_string()
    );
    Ok(())
}

pub async fn custom(store: &SqliteStore, command: RemindCustomCommand) -> Result<()> {
    let fire_at = parse_when(&command.when)?;
    let method = parse_method(&command.method)?;

    let notification = store
        .schedule_custom(&command.title, &command.body, fire_at, method)
        .await?;
    println!(
        "{} Reminder '{}' scheduled for {}",
        "✓".green().bold(),
        command.title.bold(),
        format_date(notification.scheduled_at).yellow()
    );
    Ok(())
}

pub async fn list(store: &SqliteStore) -> Result<()> {
    let notifications = store.list_pending().await?;
    display_notifications(&notifications);
    Ok(())
}

pub async fn snooze(store: &SqliteStore, command: RemindSnoozeCommand) -> Result<()> {
    let id = resolve_notification_id(store, &command.id).await?;
    let new_time = parse_when(&command.when)?;
    store.snooze(id, new_time).await?;
    println!(
        "{} Snoozed until {}",
        "✓".green().bold(),
        format_date(new_time).yellow()
    );
    Ok(())
}

pub async fn acknowledge(store: &SqliteStore, command: RemindIdCommand) -> Result<()> {
    let id = resolve_notification_id(store, &command.id).await?;
    store.acknowledge(id).await?;
    println!("{} Acknowledged.", "✓".green().bold());
    Ok(())
}

pub async fn cancel(store: &SqliteStore, command: RemindIdCommand) -> Result<()> {
    let id = resolve_notification_id(store, &command.id).await?;
    store.cancel(id).await?;
    println!("{} Reminder cancelled.", "✗".red());
    Ok(())
}
