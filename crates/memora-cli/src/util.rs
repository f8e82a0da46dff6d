use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDateTime};
use memora_core::error::CoreError;
use memora_core::store::{SqliteStore, TaskStore};
use memora_core::temporal;
use uuid::Uuid;

/// Resolve a task id from a full UUID or a unique hex prefix.
pub async fn resolve_task_id(store: &SqliteStore, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = short_id.parse::<Uuid>() {
        return Ok(id);
    }
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::Validation(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }

    let tasks = store.find_tasks_by_id_prefix(short_id).await?;
    if tasks.len() == 1 {
        Ok(tasks[0].id)
    } else if tasks.is_empty() {
        Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        ))))
    } else {
        let task_info: Vec<(String, String)> = tasks
            .into_iter()
            .map(|t| (t.id.to_string(), t.title))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(task_info)))
    }
}

/// Parse a "when" argument: a natural-language date first, then a bare
/// delay like "30m" relative to now.
pub fn parse_when(input: &str) -> Result<NaiveDateTime> {
    let now = Local::now().naive_local();
    if let Some(parsed) = temporal::parse_date(input, now) {
        return Ok(parsed);
    }
    if let Some(seconds) = temporal::parse_duration(input) {
        return Ok(now + Duration::seconds(seconds));
    }
    Err(anyhow!(
        "could not parse '{input}' as a date or delay (try 'tomorrow at 9am' or '30m')"
    ))
}

/// Reminder time for a task: with a due date, `--remind` is a lead time
/// before it; without one, it is an absolute expression.
pub fn parse_reminder(input: &str, due: Option<NaiveDateTime>) -> Result<NaiveDateTime> {
    match due {
        Some(due) => {
            let seconds = temporal::parse_duration(input).ok_or_else(|| {
                anyhow!("could not parse '{input}' as a lead time (try '30m' or '1h')")
            })?;
            Ok(due - Duration::seconds(seconds))
        }
        None => parse_when(input),
    }
}
