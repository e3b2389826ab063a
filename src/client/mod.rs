//! Client side of the task service.
//!
//! A typed HTTP client, a local cache of the task collection, derived
//! filter/sort views, the create/edit forms and the board controller that
//! ties them together. Nothing here renders; UI layers drive these types.

pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod error;
pub mod form;
#[cfg(test)]
pub(crate) mod testing;
pub mod view;

pub use api::{ApiFuture, HttpTaskApi, TaskApi};
pub use board::{Notice, NoticeKind, PendingDelete, TaskBoard};
pub use cache::{LoadState, TaskCache};
pub use config::{ClientConfig, ClientConfigError};
pub use error::ClientError;
pub use form::{EditDraft, FormError, TaskDraft, TaskForm, local_today};
pub use view::{
    EmptyState, MemoizedView, PriorityFilter, SortKey, StatusCounts, StatusFilter, ViewQuery,
    ViewSummary, derive_view,
};
