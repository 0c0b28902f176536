//! Domain records: boards, columns, tasks and their typed patches.
//!
//! Entities here are pure values. They never touch storage; the
//! [`crate::coordinator`] module sequences their mutations with the
//! persistence gateway.

pub mod board;
mod ids;
pub mod patch;
pub mod status;
pub mod task;

pub use board::{Board, BoardTemplate, Column, ColumnPatch};
pub use ids::generate_id;
pub use patch::{BoardPatch, TaskPatch};
pub use status::{Priority, TaskStatus};
pub use task::{Attachment, Comment, NewTask, Subtask, Task};
