//! Task records and their persistence.
//!
//! # Example
//!
//! ```no_run
//! use task_reminders::tasks::{NewTask, SqliteTaskStore, TaskStore};
//!
//! let store = SqliteTaskStore::new("/tmp/tasks.db").unwrap();
//!
//! let id = store
//!     .insert(&NewTask {
//!         title: "Renew passport".to_string(),
//!         description: String::new(),
//!         scheduled_time: None,
//!     })
//!     .unwrap();
//!
//! let pending = store.get_pending().unwrap();
//! assert_eq!(pending[0].id, id);
//! ```

pub mod models;
pub mod store;

pub use models::{NewTask, Reminder, Task, TaskFilter, TaskId, TaskState};
pub use store::{SqliteTaskStore, TaskStore};
