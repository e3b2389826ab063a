//! Domain module for task management.
//!
//! This module contains the task entity and its value objects.

pub mod task;

pub use task::{
    DueDate, NewTask, ParseTaskError, Priority, Task, TaskId, TaskPatch, TaskStatus, Timestamp,
};
