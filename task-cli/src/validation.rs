use crate::error::ValidationError;
use chrono::NaiveDate;

/// Checks a title and optional due date against the rules every persisted task obeys.
///
/// Callers pass the *effective* values, i.e. after any update has been merged
/// over the stored record. Only the calendar date of `due_date` is compared
/// with `today`, so a task due today is accepted.
pub fn validate(
    title: &str,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if due_date.is_some_and(|due| due < today) {
        return Err(ValidationError::DueDateInPast);
    }
    Ok(())
}
