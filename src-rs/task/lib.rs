pub mod scheduler;
pub mod store;
pub mod types;

pub use scheduler::BackgroundScheduler;
pub use store::{next_id, TaskError, TaskStore};
pub use types::{Task, TaskCounts, TaskStatus, TaskUpdate};
