use crate::cli::{ListCommand, SearchCommand};
use crate::views::table::display_tasks;
use anyhow::Result;
use memora_core::models::TaskFilter;
use memora_core::store::{SqliteStore, TaskStore};

pub async fn list_tasks(store: &SqliteStore, command: ListCommand) -> Result<()> {
    let tasks = if command.today {
        store.list_today().await?
    } else if command.overdue {
        store.list_overdue().await?
    } else if let Some(days) = command.upcoming {
        store.list_upcoming(days).await?
    } else {
        store
            .find_tasks(&TaskFilter {
                include_completed: command.all,
                include_cancelled: command.all,
                context: command.context.clone(),
                limit: command.limit,
                ..Default::default()
            })
            .await?
    };

    display_tasks(&tasks);
    Ok(())
}

pub async fn search_tasks(store: &SqliteStore, command: SearchCommand) -> Result<()> {
    let tasks = store.search(&command.query).await?;
    display_tasks(&tasks);
    Ok(())
}
