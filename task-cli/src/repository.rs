use crate::clock::{Clock, SystemClock};
use crate::error::{Error, ValidationError};
use crate::task::{Status, Task, TaskUpdate};
use crate::validation::validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Durable storage of the task collection.
///
/// Every mutating operation is a full read-modify-write cycle against the
/// backing store.
#[cfg_attr(test, mockall::automock)]
pub trait TaskRepository {
    /// Reads every task. A missing, empty or unreadable store yields an empty collection.
    fn load_all(&self) -> Vec<Task>;
    /// Replaces the stored collection, keeping the given order.
    fn save_all(&self, tasks: &[Task]) -> Result<(), Error>;
    /// Assigns the next id to `candidate`, validates it and appends it.
    fn add(&self, candidate: Task) -> Result<Task, Error>;
    /// Merges `update` over the task with `id`, all or nothing.
    fn update(&self, id: u32, update: TaskUpdate) -> Result<Task, Error>;
    /// Removes the task with `id`, returning it.
    fn delete(&self, id: u32) -> Result<Task, Error>;
    fn exists(&self, id: u32) -> bool;
    fn get_by_id(&self, id: u32) -> Option<Task>;
    fn get_completed(&self) -> Vec<Task>;
    /// Rewrites the store as an empty collection.
    fn clear_all(&self) -> Result<(), Error>;
    /// Completes every task that is not completed yet, returning how many changed.
    fn mark_all_completed(&self) -> Result<usize, Error>;
}

/// On-disk layout of the store.
///
/// `next_id` is the smallest id never handed out, so ids of deleted tasks are
/// not reused.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct TaskDocument {
    #[serde(default)]
    next_id: u32,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Anything the store may contain: the current document, or a bare list of tasks.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTasks {
    Document(TaskDocument),
    List(Vec<Task>),
}

impl From<StoredTasks> for TaskDocument {
    fn from(stored: StoredTasks) -> Self {
        match stored {
            StoredTasks::Document(document) => document,
            StoredTasks::List(tasks) => TaskDocument { next_id: 0, tasks },
        }
    }
}

impl TaskDocument {
    fn empty_after(previous: &TaskDocument) -> Self {
        Self {
            next_id: previous.high_water_mark(),
            tasks: Vec::new(),
        }
    }

    /// [`Self::next_id`], saturating at `u32::MAX` once ids run out so that
    /// a later `add` still reports [`Error::IdsExhausted`].
    fn high_water_mark(&self) -> u32 {
        self.next_id().unwrap_or(u32::MAX)
    }

    /// The id the next added task receives.
    fn next_id(&self) -> Result<u32, Error> {
        let after_max = match self.tasks.iter().map(Task::id).max() {
            Some(max) => max.checked_add(1).ok_or(Error::IdsExhausted)?,
            None => 1,
        };
        Ok(self.next_id.max(after_max))
    }

    /// Hands out [`Self::next_id`] and moves the high-water mark past it.
    fn claim_id(&mut self) -> Result<u32, Error> {
        let id = self.next_id()?;
        self.next_id = id.checked_add(1).ok_or(Error::IdsExhausted)?;
        Ok(id)
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == id)
    }
}

/// A [`TaskRepository`] backed by a single pretty-printed JSON file.
///
/// Writes go to a temporary file next to the store which then replaces it,
/// so an interrupted write never leaves a truncated store behind.
#[derive(Debug, Clone)]
pub struct FileTaskRepository<C: Clock = SystemClock> {
    path: PathBuf,
    clock: C,
}

impl FileTaskRepository<SystemClock> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> FileTaskRepository<C> {
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> TaskDocument {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Task store not found, starting empty");
                return TaskDocument::default();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot read task store, continuing with an empty collection"
                );
                return TaskDocument::default();
            }
        };

        if contents.trim().is_empty() {
            debug!(path = %self.path.display(), "Task store is empty");
            return TaskDocument::default();
        }

        match serde_json::from_str::<StoredTasks>(&contents) {
            Ok(stored) => {
                let document = TaskDocument::from(stored);
                debug!(count = document.tasks.len(), "Loaded tasks");
                document
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Task store is malformed, continuing with an empty collection"
                );
                TaskDocument::default()
            }
        }
    }

    fn save_document(&self, document: &TaskDocument) -> Result<(), Error> {
        self.write_document(document).inspect_err(|e| {
            error!(path = %self.path.display(), error = %e, "Failed to save tasks");
        })?;
        debug!(
            path = %self.path.display(),
            count = document.tasks.len(),
            "Saved tasks"
        );
        Ok(())
    }

    fn write_document(&self, document: &TaskDocument) -> Result<(), Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        serde_json::to_writer_pretty(&mut file, document)?;
        file.write_all(b"\n")
            .and_then(|_| file.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;
        file.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> Error {
        Error::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl<C: Clock> TaskRepository for FileTaskRepository<C> {
    fn load_all(&self) -> Vec<Task> {
        let tasks = self.load_document().tasks;
        let completed = tasks.iter().filter(|task| task.is_completed()).count();
        info!(
            total = tasks.len(),
            completed,
            open = tasks.len() - completed,
            "Retrieved tasks"
        );
        tasks
    }

    fn save_all(&self, tasks: &[Task]) -> Result<(), Error> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in tasks {
            if task.title().trim().is_empty() {
                warn!(id = task.id(), "Refusing to save a task without a title");
                return Err(ValidationError::TitleRequired.into());
            }
            if !seen.insert(task.id()) {
                warn!(id = task.id(), "Refusing to save duplicate task id");
                return Err(Error::DuplicateId(task.id()));
            }
        }

        let current = self.load_document();
        let mut document = TaskDocument {
            next_id: current.high_water_mark(),
            tasks: tasks.to_vec(),
        };
        document.next_id = document.high_water_mark();
        self.save_document(&document)
    }

    fn add(&self, mut candidate: Task) -> Result<Task, Error> {
        if let Err(reason) = validate(candidate.title(), candidate.due_date(), self.clock.today())
        {
            warn!(title = candidate.title(), %reason, "Rejected new task");
            return Err(reason.into());
        }

        let mut document = self.load_document();
        let id = document.claim_id().inspect_err(|e| {
            warn!(title = candidate.title(), error = %e, "Rejected new task");
        })?;
        candidate.assign_id(id);
        let status = candidate.status();
        candidate.set_status(status, self.clock.now());

        document.tasks.push(candidate.clone());
        self.save_document(&document)?;

        info!(id, title = candidate.title(), "Added task");
        Ok(candidate)
    }

    fn update(&self, id: u32, update: TaskUpdate) -> Result<Task, Error> {
        let today = self.clock.today();
        let now = self.clock.now();
        let mut document = self.load_document();
        let Some(task) = document.find_mut(id) else {
            warn!(id, "No task found, update skipped");
            return Err(Error::NotFound(id));
        };

        let title = update.title.as_deref().unwrap_or(task.title());
        let due_date = update.due_date.unwrap_or(task.due_date());
        // An unchanged due date was accepted when it was written.
        let due_to_check = due_date.filter(|_| due_date != task.due_date());
        if let Err(reason) = validate(title, due_to_check, today) {
            warn!(id, %reason, "Rejected task update");
            return Err(reason.into());
        }

        let before = task.clone();
        if let Some(title) = update.title {
            task.set_title(title);
        }
        if let Some(due_date) = update.due_date {
            task.set_due_date(due_date);
        }
        if let Some(description) = update.description {
            task.set_description(description);
        }
        if let Some(priority) = update.priority {
            task.set_priority(priority);
        }
        if let Some(status) = update.status {
            task.set_status(status, now);
        }
        let updated = task.clone();

        self.save_document(&document)?;
        info!(
            id,
            title.old = before.title(),
            title.new = updated.title(),
            due.old = ?before.due_date(),
            due.new = ?updated.due_date(),
            status.old = %before.status(),
            status.new = %updated.status(),
            "Updated task"
        );
        Ok(updated)
    }

    fn delete(&self, id: u32) -> Result<Task, Error> {
        let mut document = self.load_document();
        let Some(position) = document.tasks.iter().position(|task| task.id() == id) else {
            warn!(id, "No task found, deletion skipped");
            return Err(Error::NotFound(id));
        };

        let removed = document.tasks.remove(position);
        self.save_document(&document)?;
        info!(id, title = removed.title(), "Deleted task");
        Ok(removed)
    }

    fn exists(&self, id: u32) -> bool {
        self.load_document().tasks.iter().any(|task| task.id() == id)
    }

    fn get_by_id(&self, id: u32) -> Option<Task> {
        let task = self
            .load_document()
            .tasks
            .into_iter()
            .find(|task| task.id() == id);
        if task.is_none() {
            debug!(id, "Task not found");
        }
        task
    }

    fn get_completed(&self) -> Vec<Task> {
        self.load_document()
            .tasks
            .into_iter()
            .filter(Task::is_completed)
            .collect()
    }

    fn clear_all(&self) -> Result<(), Error> {
        let previous = self.load_document();
        self.save_document(&TaskDocument::empty_after(&previous))?;
        info!(removed = previous.tasks.len(), "Cleared all tasks");
        Ok(())
    }

    fn mark_all_completed(&self) -> Result<usize, Error> {
        let now = self.clock.now();
        let mut document = self.load_document();
        let mut changed = 0;
        for task in document
            .tasks
            .iter_mut()
            .filter(|task| task.status() != Status::Completed)
        {
            task.set_status(Status::Completed, now);
            debug!(id = task.id(), title = task.title(), "Marked task as completed");
            changed += 1;
        }

        self.save_document(&document)?;
        info!(count = changed, "Marked all tasks as completed");
        Ok(changed)
    }
}
