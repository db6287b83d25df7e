use crate::clock::Clock;
use crate::error::{Error, ValidationError};
use crate::repository::TaskRepository;
use crate::task::{NewTask, Status, Task, TaskUpdate};
use tracing::{info, warn};

/// Validating façade over a [`TaskRepository`].
///
/// Rejects blank titles before the repository is touched and adds the
/// read-side conveniences the CLI needs.
pub struct TaskService<'a, REPO: TaskRepository, CLOCK: Clock> {
    repository: &'a REPO,
    clock: &'a CLOCK,
}

impl<'a, REPO: TaskRepository, CLOCK: Clock> TaskService<'a, REPO, CLOCK> {
    pub fn new(repository: &'a REPO, clock: &'a CLOCK) -> Self {
        Self { repository, clock }
    }

    /// Creates a pending task with only a title.
    pub fn add(&self, title: &str) -> Result<Task, Error> {
        self.add_task(NewTask::new(title))
    }

    #[tracing::instrument(skip(self, new_task), fields(title = %new_task.title))]
    pub fn add_task(&self, new_task: NewTask) -> Result<Task, Error> {
        if new_task.title.trim().is_empty() {
            warn!("Attempted to add a task with an empty title");
            return Err(ValidationError::TitleRequired.into());
        }

        let task = self
            .repository
            .add(new_task.into_task(self.clock.now()))?;
        info!(id = task.id(), "Added task");
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub fn update(&self, id: u32, update: TaskUpdate) -> Result<Task, Error> {
        if update
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            warn!("Attempted to update a task with an empty title");
            return Err(ValidationError::TitleRequired.into());
        }

        let task = self.repository.update(id, update)?;
        info!(
            title = task.title(),
            status = %task.status(),
            due = ?task.due_date(),
            "Updated task"
        );
        Ok(task)
    }

    /// Moves a task to `status`, leaving every other field as it is.
    pub fn set_status(&self, id: u32, status: Status) -> Result<Task, Error> {
        self.update(id, TaskUpdate::status(status))
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: u32) -> Result<Task, Error> {
        let deleted = self.repository.delete(id).inspect_err(|e| {
            warn!(error = %e, "Delete failed");
        })?;
        info!(title = deleted.title(), "Deleted task");
        Ok(deleted)
    }

    pub fn get_all(&self) -> Vec<Task> {
        self.repository.load_all()
    }

    pub fn get_by_status(&self, status: Status) -> Vec<Task> {
        self.get_all()
            .into_iter()
            .filter(|task| task.status() == status)
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub fn get_by_id(&self, id: u32) -> Option<Task> {
        let task = self.repository.get_by_id(id);
        info!(found = task.is_some(), "Fetched task");
        task
    }

    pub fn clear_all(&self) -> Result<(), Error> {
        self.repository.clear_all()
    }

    pub fn mark_all_completed(&self) -> Result<usize, Error> {
        self.repository.mark_all_completed()
    }
}
