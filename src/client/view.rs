//! Filter+Sort View.
//!
//! [`derive_view`] is a pure function from the collection and the three
//! view controls to the displayed sequence. [`MemoizedView`] keeps its last
//! result until the collection revision or the controls change.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::domain::{ParseTaskError, Priority, Task, TaskStatus};

// =============================================================================
// Controls
// =============================================================================

/// Status control. The empty string means "all statuses".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusFilter(Option<TaskStatus>);

impl StatusFilter {
    pub const ALL: Self = Self(None);

    #[must_use]
    pub const fn only(status: TaskStatus) -> Self {
        Self(Some(status))
    }

    #[must_use]
    pub const fn status(self) -> Option<TaskStatus> {
        self.0
    }

    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        self.0.is_none_or(|status| task.status == status)
    }
}

impl FromStr for StatusFilter {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            Ok(Self::ALL)
        } else {
            value.parse().map(Self::only)
        }
    }
}

/// Priority control. The empty string means "all priorities".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PriorityFilter(Option<Priority>);

impl PriorityFilter {
    pub const ALL: Self = Self(None);

    #[must_use]
    pub const fn only(priority: Priority) -> Self {
        Self(Some(priority))
    }

    #[must_use]
    pub const fn priority(self) -> Option<Priority> {
        self.0
    }

    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        self.0.is_none_or(|priority| task.priority == priority)
    }
}

impl FromStr for PriorityFilter {
    type Err = ParseTaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            Ok(Self::ALL)
        } else {
            value.parse().map(Self::only)
        }
    }
}

/// The active sort key. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Earliest first, undated last.
    DueDate,
    /// `high` first.
    Priority,
    /// Workflow order, `todo` first.
    Status,
}

impl SortKey {
    pub const ALL: [Self; 4] = [Self::CreatedAt, Self::DueDate, Self::Priority, Self::Status];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }

    /// Compares two tasks under this key. Equal tasks keep their order.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            Self::CreatedAt => right.created_at.cmp(&left.created_at),
            Self::DueDate => match (left.due_date, right.due_date) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Priority => right.priority.severity().cmp(&left.priority.severity()),
            Self::Status => left.status.stage().cmp(&right.status.stage()),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned for an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort key: '{0}'. Expected 'createdAt', 'dueDate', 'priority' or 'status'")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| ParseSortKeyError(value.to_string()))
    }
}

/// The three view controls together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewQuery {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    pub sort: SortKey,
}

impl ViewQuery {
    #[must_use]
    pub const fn with_status(self, status: StatusFilter) -> Self {
        Self { status, ..self }
    }

    #[must_use]
    pub const fn with_priority(self, priority: PriorityFilter) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub const fn with_sort(self, sort: SortKey) -> Self {
        Self { sort, ..self }
    }

    /// Returns `true` if the task passes every active filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task) && self.priority.matches(task)
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// Filters and sorts a copy of `tasks`.
///
/// The input is never reordered. The sort is stable, so ties keep the
/// collection order.
#[must_use]
pub fn derive_view(tasks: &[Task], query: &ViewQuery) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks
        .iter()
        .filter(|task| query.matches(task))
        .cloned()
        .collect();
    visible.sort_by(|left, right| query.sort.compare(left, right));
    visible
}

/// Last derived view, keyed by collection revision and query.
#[derive(Debug, Clone, Default)]
pub struct MemoizedView {
    key: Option<(u64, ViewQuery)>,
    tasks: Vec<Task>,
    computations: u64,
}

impl MemoizedView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view for `(revision, query)`, recomputing only if either
    /// differs from the previous call.
    ///
    /// `revision` must change whenever `tasks` does.
    pub fn view(&mut self, revision: u64, tasks: &[Task], query: &ViewQuery) -> &[Task] {
        let key = (revision, *query);
        if self.key != Some(key) {
            self.tasks = derive_view(tasks, query);
            self.key = Some(key);
            self.computations += 1;
        }
        &self.tasks
    }

    /// Number of times the view was actually derived.
    #[must_use]
    pub const fn computations(&self) -> u64 {
        self.computations
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Per-status totals over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |counts, task| match task.status {
            TaskStatus::Todo => Self {
                todo: counts.todo + 1,
                ..counts
            },
            TaskStatus::InProgress => Self {
                in_progress: counts.in_progress + 1,
                ..counts
            },
            TaskStatus::Completed => Self {
                completed: counts.completed + 1,
                ..counts
            },
        })
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.todo + self.in_progress + self.completed
    }
}

/// Why nothing is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The collection itself is empty.
    NoTasks,
    /// The filters exclude every task.
    NoResults,
}

impl EmptyState {
    /// Returns the empty state for the given sizes, if any.
    #[must_use]
    pub const fn of(total: usize, visible: usize) -> Option<Self> {
        if total == 0 {
            Some(Self::NoTasks)
        } else if visible == 0 {
            Some(Self::NoResults)
        } else {
            None
        }
    }
}

/// "Showing N of M tasks".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    pub visible: usize,
    pub total: usize,
}

impl std::fmt::Display for ViewSummary {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "Showing {} of {} tasks", self.visible, self.total)
    }
}

// =============================================================================
// Tests
// =============================================================================
