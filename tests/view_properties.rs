//! Property tests for the filter/sort view.

use chrono::{DateTime, Duration, NaiveDate};
use proptest::prelude::*;

use task_master::client::{PriorityFilter, SortKey, StatusFilter, ViewQuery, derive_view};
use task_master::domain::{DueDate, NewTask, Priority, Task, TaskId, TaskStatus, Timestamp};

// =============================================================================
// Strategies
// =============================================================================

fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(vec![Priority::Low, Priority::Medium, Priority::High])
}

fn due_date_strategy() -> impl Strategy<Value = Option<DueDate>> {
    prop::option::of((0_i64..730).prop_map(|offset| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DueDate::from_date(base + Duration::days(offset))
    }))
}

fn task_strategy() -> impl Strategy<Value = Task> {
    (
        status_strategy(),
        priority_strategy(),
        due_date_strategy(),
        0_i64..1_000_000,
    )
        .prop_map(|(status, priority, due_date, seconds)| {
            let draft = NewTask::new("task")
                .with_status(status)
                .with_priority(priority);
            let draft = match due_date {
                Some(due_date) => draft.with_due_date(due_date),
                None => draft,
            };
            let created_at = DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap();
            Task::create(TaskId::generate(), draft, Timestamp::from_datetime(created_at))
        })
}

fn tasks_strategy() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(task_strategy(), 0..40)
}

fn query_strategy() -> impl Strategy<Value = ViewQuery> {
    (
        prop::option::of(status_strategy()),
        prop::option::of(priority_strategy()),
        prop::sample::select(SortKey::ALL.to_vec()),
    )
        .prop_map(|(status, priority, sort)| ViewQuery {
            status: status.map_or(StatusFilter::ALL, StatusFilter::only),
            priority: priority.map_or(PriorityFilter::ALL, PriorityFilter::only),
            sort,
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Law: the view holds exactly the matching tasks, each once.
    #[test]
    fn filter_keeps_exactly_matching_tasks(tasks in tasks_strategy(), query in query_strategy()) {
        let view = derive_view(&tasks, &query);

        prop_assert!(view.len() <= tasks.len());
        for task in &view {
            prop_assert!(query.status.status().is_none_or(|status| task.status == status));
            prop_assert!(query.priority.priority().is_none_or(|priority| task.priority == priority));
        }

        let expected = tasks.iter().filter(|task| query.matches(task)).count();
        prop_assert_eq!(view.len(), expected);
        for task in tasks.iter().filter(|task| query.matches(task)) {
            prop_assert!(view.iter().any(|visible| visible.id == task.id));
        }
    }

    /// Law: dated tasks come first, in ascending date order.
    #[test]
    fn due_date_sort_puts_undated_last(tasks in tasks_strategy()) {
        let view = derive_view(&tasks, &ViewQuery::default().with_sort(SortKey::DueDate));

        for pair in view.windows(2) {
            match (pair[0].due_date, pair[1].due_date) {
                (Some(left), Some(right)) => prop_assert!(left <= right),
                (None, Some(_)) => prop_assert!(false, "undated task before a dated one"),
                _ => {}
            }
        }
    }

    /// Law: high before medium before low.
    #[test]
    fn priority_sort_is_descending(tasks in tasks_strategy()) {
        let view = derive_view(&tasks, &ViewQuery::default().with_sort(SortKey::Priority));

        for pair in view.windows(2) {
            prop_assert!(pair[0].priority.severity() >= pair[1].priority.severity());
        }
    }

    /// Law: deriving a view never changes the input collection.
    #[test]
    fn derive_view_leaves_input_untouched(tasks in tasks_strategy(), query in query_strategy()) {
        let before = tasks.clone();
        let _ = derive_view(&tasks, &query);
        prop_assert_eq!(tasks, before);
    }
}

#[test]
fn due_date_sort_example() {
    let dated = |date: &str| {
        Task::create(
            TaskId::generate(),
            NewTask::new(date).with_due_date(date.parse().unwrap()),
            Timestamp::now(),
        )
    };
    let tasks = vec![
        Task::create(TaskId::generate(), NewTask::new("none"), Timestamp::now()),
        dated("2024-03-01"),
        dated("2024-01-01"),
    ];

    let view = derive_view(&tasks, &ViewQuery::default().with_sort(SortKey::DueDate));

    let titles: Vec<_> = view.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, ["2024-01-01", "2024-03-01", "none"]);
}
