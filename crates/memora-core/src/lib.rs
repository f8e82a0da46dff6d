//! # Memora Core Library
//!
//! A local task-and-reminder engine: durable task storage with full-text
//! search, a quick-capture inbox, a deterministic natural-language temporal
//! parser, and a background notification scheduler that delivers reminders
//! through a degrading chain of transports.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`store`]: Data access layer (tasks, inbox, notification queue)
//! - [`temporal`]: Natural-language date and duration parsing
//! - [`recurrence`]: Next-instance expansion for recurring tasks
//! - [`notify`]: Delivery transports and the fallback chain
//! - [`daemon`]: Adaptive polling scheduler and lifecycle control
//! - [`health`]: Read-only health aggregation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use memora_core::{
//!     db,
//!     models::NewTaskData,
//!     store::{SqliteStore, TaskStore},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), memora_core::error::CoreError> {
//!     let pool = db::establish_connection("memora.db").await?;
//!     let store = SqliteStore::new(pool);
//!
//!     let task = store
//!         .add_task(NewTaskData {
//!             title: "Water the plants".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Created task: {}", task.title);
//!
//!     Ok(())
//! }
//! ```

pub mod daemon;
pub mod db;
pub mod error;
pub mod health;
pub mod models;
pub mod notify;
pub mod recurrence;
pub mod store;
pub mod temporal;
