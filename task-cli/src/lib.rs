//! Core of a single-user task list: a JSON file backed task repository with
//! validated updates, and the service the `task-cli` binary drives.

pub mod clock;
pub mod config;
pub mod error;
pub mod repository;
pub mod service;
pub mod task;
pub mod validation;

pub use clock::{Clock, SystemClock};
pub use error::{Error, ValidationError};
pub use repository::{FileTaskRepository, TaskRepository};
pub use service::TaskService;
pub use task::{NewTask, Priority, Status, Task, TaskUpdate};
