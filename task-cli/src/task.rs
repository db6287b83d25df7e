use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A single persisted to-do record.
///
/// Tasks are only ever created and mutated through a
/// [`TaskRepository`](crate::repository::TaskRepository); callers receive
/// owned copies.
#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct Task {
    id: u32,
    title: String,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Default, Eq, PartialEq, Serialize, Deserialize, Clone, Copy, Hash)]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown status '{0}', expected one of: pending, inprogress, completed")]
pub struct ParseStatusError(String);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown priority '{0}', expected one of: low, medium, high")]
pub struct ParsePriorityError(String);

impl Task {
    /// Creates an unsaved task. The id stays `0` until the repository assigns one.
    pub fn new(title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: None,
            created_at,
            due_date: None,
            completed_at: None,
            priority: None,
            status: Status::Pending,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub(crate) fn assign_id(&mut self, id: u32) {
        self.id = id;
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    pub(crate) fn set_priority(&mut self, priority: Option<Priority>) {
        self.priority = priority;
    }

    /// Moves the task to `status`, keeping `completed_at` in step with it.
    ///
    /// Returns `true` if the status actually changed.
    pub(crate) fn set_status(&mut self, status: Status, now: DateTime<Utc>) -> bool {
        let changed = self.status != status;
        match status {
            Status::Completed if changed || self.completed_at.is_none() => {
                self.completed_at = Some(now)
            }
            Status::Completed => {}
            _ => self.completed_at = None,
        }
        self.status = status;
        changed
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}. {}", self.status.symbol(), self.id, self.title)?;
        match self.priority {
            Some(priority) => write!(f, " ({} priority)", priority)?,
            None => write!(f, " (no priority)")?,
        }
        if let Some(due_date) = self.due_date {
            write!(f, " due {}", due_date)?;
        }
        Ok(())
    }
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Pending => "[ ]",
            Status::InProgress => "[~]",
            Status::Completed => "[✓]",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::InProgress => "in progress",
            Status::Completed => "completed",
        };
        f.write_str(name)
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "inprogress" | "in-progress" | "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// The caller's draft of a task that does not exist yet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub(crate) fn into_task(self, created_at: DateTime<Utc>) -> Task {
        Task::new(self.title, created_at)
            .with_description(self.description)
            .with_priority(self.priority)
            .with_due_date(self.due_date)
    }
}

/// A partial update to an existing task.
///
/// `None` on any field means "leave unchanged". For the clearable fields the
/// inner `Option` is the new value, so `Some(None)` removes it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub due_date: Option<Option<NaiveDate>>,
    pub description: Option<Option<String>>,
    pub priority: Option<Option<Priority>>,
}

impl TaskUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn new_task_is_pending_and_unassigned() {
        let task = Task::new("Write report", at(9));

        assert_eq!(task.id(), 0);
        assert_eq!(task.status(), Status::Pending);
        assert_eq!(task.completed_at(), None);
        assert_eq!(task.priority(), None);
    }

    mod status_transition_tests {
        use super::*;

        #[test]
        fn completing_sets_completed_at() {
            // Arrange
            let mut task = Task::new("Write report", at(9));

            // Act
            let changed = task.set_status(Status::Completed, at(10));

            // Assert
            assert!(changed);
            assert!(task.is_completed());
            assert_eq!(task.completed_at(), Some(at(10)));
        }

        #[test]
        fn completing_twice_keeps_first_timestamp() {
            let mut task = Task::new("Write report", at(9));
            task.set_status(Status::Completed, at(10));

            let changed = task.set_status(Status::Completed, at(11));

            assert!(!changed);
            assert_eq!(task.completed_at(), Some(at(10)));
        }

        #[test]
        fn leaving_completed_clears_completed_at() {
            let mut task = Task::new("Write report", at(9));
            task.set_status(Status::Completed, at(10));

            task.set_status(Status::InProgress, at(11));

            assert_eq!(task.status(), Status::InProgress);
            assert_eq!(task.completed_at(), None);
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn status_parses_case_insensitively() {
            assert_eq!("Pending".parse(), Ok(Status::Pending));
            assert_eq!("INPROGRESS".parse(), Ok(Status::InProgress));
            assert_eq!("in-progress".parse(), Ok(Status::InProgress));
            assert_eq!("completed".parse(), Ok(Status::Completed));
        }

        #[test]
        fn unknown_status_is_rejected() {
            let result = "done".parse::<Status>();

            assert_eq!(result, Err(ParseStatusError("done".to_string())));
        }

        #[test]
        fn priority_parses_case_insensitively() {
            assert_eq!("HIGH".parse(), Ok(Priority::High));
            assert_eq!("medium".parse(), Ok(Priority::Medium));
            assert!("urgent".parse::<Priority>().is_err());
        }
    }

    #[test]
    fn display_shows_symbol_priority_and_due_date() {
        let mut task = Task::new("Buy milk", at(9))
            .with_priority(Some(Priority::High))
            .with_due_date(NaiveDate::from_ymd_opt(2026, 3, 5));
        task.assign_id(7);

        assert_eq!(task.to_string(), "[ ] 7. Buy milk (High priority) due 2026-03-05");
    }

    #[test]
    fn deserializes_with_missing_optional_fields() {
        // Arrange
        let json = r#"
        {
            "id": 3,
            "title": "Old record",
            "created_at": "2023-01-01T00:00:00Z",
            "status": "InProgress"
        }
        "#;

        // Act
        let task: Task = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(task.id(), 3);
        assert_eq!(task.status(), Status::InProgress);
        assert_eq!(task.description(), None);
        assert_eq!(task.due_date(), None);
    }

    #[test]
    fn update_constructors() {
        assert!(TaskUpdate::default().is_empty());

        let update = TaskUpdate::status(Status::Completed);

        assert!(!update.is_empty());
        assert_eq!(update.status, Some(Status::Completed));
        assert_eq!(update.title, None);
    }
}
