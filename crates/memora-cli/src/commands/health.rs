use crate::cli::HealthCommand;
use crate::views::table::display_health;
use anyhow::Result;
use memora_core::daemon::Daemon;
use memora_core::health::HealthMonitor;
use memora_core::notify::DeliveryChain;
use memora_core::store::SqliteStore;
use std::sync::Arc;

pub async fn show(store: Arc<SqliteStore>, command: HealthCommand) -> Result<()> {
    let chain = Arc::new(DeliveryChain::detect());
    let daemon = Daemon::new(Arc::clone(&store), Arc::clone(&chain));
    let monitor = HealthMonitor::new(store, chain);

    let snapshot = monitor.snapshot(&daemon.status().await).await?;
    if command.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        display_health(&snapshot);
    }
    Ok(())
}
