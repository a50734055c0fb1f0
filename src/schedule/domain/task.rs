//! Task entity and the validated scalars it is built from.

use super::{EmployeeId, EntityKind, ProjectId, ScheduleDomainError, TaskId};
use chrono::NaiveDate;
use std::fmt;

/// Presentation colors assigned to tasks on creation.
pub const TASK_PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#14b8a6", "#f97316", "#6366f1",
];

/// Completion percentage in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Progress(u8);

impl Progress {
    /// Zero percent complete.
    pub const NONE: Self = Self(0);

    /// Creates a validated progress value.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::ProgressOutOfRange`] when the value is
    /// negative or above 100.
    pub fn new(value: i64) -> Result<Self, ScheduleDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|percent| *percent <= 100)
            .map(Self)
            .ok_or(ScheduleDomainError::ProgressOutOfRange(value))
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Inclusive calendar range covered by a task. The end never precedes the
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Creates a validated date span.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EndBeforeStart`] when `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScheduleDomainError> {
        if end < start {
            return Err(ScheduleDomainError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the first day of the span.
    #[must_use]
    pub const fn start(self) -> NaiveDate {
        self.start
    }

    /// Returns the last day of the span.
    #[must_use]
    pub const fn end(self) -> NaiveDate {
        self.end
    }

    /// Returns a span with either bound replaced, revalidated.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EndBeforeStart`] when the resulting span
    /// would be inverted.
    pub fn with_bounds(
        self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, ScheduleDomainError> {
        Self::new(start.unwrap_or(self.start), end.unwrap_or(self.end))
    }
}

/// Presentation color token. Assigned when a task is created and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorToken(String);

impl ColorToken {
    /// Creates a color token from a stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyColor`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ScheduleDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScheduleDomainError::EmptyColor);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Picks the palette entry for a freshly created task.
    #[must_use]
    pub fn for_task(id: &TaskId) -> Self {
        let checksum = id
            .as_str()
            .bytes()
            .fold(0_usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(usize::from(byte)));
        let color = TASK_PALETTE
            .get(checksum.rem_euclid(TASK_PALETTE.len()))
            .copied()
            .unwrap_or("#3b82f6");
        Self(color.to_owned())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns the trimmed name, or an error naming the entity when blank.
pub(crate) fn validated_name(
    kind: EntityKind,
    value: impl Into<String>,
) -> Result<String, ScheduleDomainError> {
    let raw = value.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScheduleDomainError::EmptyName(kind));
    }
    Ok(trimmed.to_owned())
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    employee_id: EmployeeId,
    progress: Progress,
    description: Option<String>,
}

impl NewTask {
    /// Creates a request with the required task fields. Progress starts at
    /// zero.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            employee_id,
            progress: Progress::NONE,
            description: None,
        }
    }

    /// Sets the initial progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial task update. Fields left as `None` are not touched.
///
/// An empty description is a value: `with_description("")` clears the text
/// but still persists an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement display name.
    pub name: Option<String>,
    /// Replacement start date.
    pub start_date: Option<NaiveDate>,
    /// Replacement end date.
    pub end_date: Option<NaiveDate>,
    /// Replacement assignee.
    pub employee_id: Option<EmployeeId>,
    /// Replacement progress.
    pub progress: Option<Progress>,
    /// Replacement description, possibly empty.
    pub description: Option<String>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the start date.
    #[must_use]
    pub const fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Sets the end date.
    #[must_use]
    pub const fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub fn with_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    /// Sets the progress.
    #[must_use]
    pub const fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.employee_id.is_none()
            && self.progress.is_none()
            && self.description.is_none()
    }

    /// Returns the trimmed replacement name, if one was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyName`] when the supplied name is
    /// blank.
    pub fn validated_name(&self) -> Result<Option<String>, ScheduleDomainError> {
        self.name
            .as_ref()
            .map(|name| validated_name(EntityKind::Task, name.as_str()))
            .transpose()
    }
}

/// Parameter object for reconstructing a stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Stored task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Stored display name.
    pub name: String,
    /// Stored date range.
    pub span: DateSpan,
    /// Stored assignee.
    pub employee_id: EmployeeId,
    /// Stored progress.
    pub progress: Progress,
    /// Stored presentation color.
    pub color: ColorToken,
    /// Stored description.
    pub description: Option<String>,
}

/// A time-boxed unit of work owned by a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    name: String,
    span: DateSpan,
    employee_id: EmployeeId,
    progress: Progress,
    color: ColorToken,
    description: Option<String>,
}

impl Task {
    /// Creates a task from a request, assigning its color from the palette.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError`] when the name is blank or the dates
    /// are inverted.
    pub fn create(
        id: TaskId,
        project_id: ProjectId,
        request: NewTask,
    ) -> Result<Self, ScheduleDomainError> {
        let NewTask {
            name,
            start_date,
            end_date,
            employee_id,
            progress,
            description,
        } = request;
        let color = ColorToken::for_task(&id);
        Ok(Self {
            name: validated_name(EntityKind::Task, name)?,
            span: DateSpan::new(start_date, end_date)?,
            id,
            project_id,
            employee_id,
            progress,
            color,
            description,
        })
    }

    /// Reconstructs a task from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            name: data.name,
            span: data.span,
            employee_id: data.employee_id,
            progress: data.progress,
            color: data.color,
            description: data.description,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the date range.
    #[must_use]
    pub const fn span(&self) -> DateSpan {
        self.span
    }

    /// Returns the first scheduled day.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.span.start()
    }

    /// Returns the last scheduled day.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.span.end()
    }

    /// Returns the assignee. The employee may since have been deleted.
    #[must_use]
    pub const fn employee_id(&self) -> &EmployeeId {
        &self.employee_id
    }

    /// Returns the completion percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the presentation color.
    #[must_use]
    pub const fn color(&self) -> &ColorToken {
        &self.color
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Applies a partial update. Nothing changes when validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError`] when the new name is blank or the
    /// resulting dates are inverted.
    pub fn apply(&mut self, patch: &TaskPatch) -> Result<(), ScheduleDomainError> {
        let name = patch.validated_name()?;
        let span = self.span.with_bounds(patch.start_date, patch.end_date)?;

        if let Some(new_name) = name {
            self.name = new_name;
        }
        self.span = span;
        if let Some(employee_id) = &patch.employee_id {
            self.employee_id = employee_id.clone();
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        Ok(())
    }
}
