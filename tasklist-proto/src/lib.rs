//! Shared task record schema and persisted-state codec for `Tasklist`.

pub mod codec;
pub mod filter;
pub mod task;

pub use filter::{FilterCounts, FilterMode, filter_tasks};
pub use task::{Priority, Task, TaskId};
