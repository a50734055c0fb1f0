//! Row-level protocol spoken to the remote relational backend.
//!
//! Rows mirror the remote tables column for column (snake_case, nullable
//! where the schema allows it). Turning them into domain values is the
//! remote store's job, so every field a careless schema could leave empty
//! is an `Option` here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for remote client operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by the remote backend.
///
/// `code` carries the backend's structured error code when one is
/// available (for example `42703` for an undefined column); `message` is
/// the human-readable text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    code: Option<String>,
    message: String,
    driver: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Creates an error with a message and no structured code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            driver: None,
        }
    }

    /// Creates an error carrying a structured code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            driver: None,
        }
    }

    /// Wraps a transport or driver error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            code: None,
            message: err.to_string(),
            driver: Some(Arc::new(err)),
        }
    }

    /// Attaches the driver error this failure was derived from.
    #[must_use]
    pub fn caused_by(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.driver = Some(Arc::new(err));
        self
    }

    /// Returns the structured code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the wrapped driver error, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        self.driver.as_deref()
    }
}

/// Connection settings for the remote backend.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    url: String,
    key: String,
}

impl RemoteConfig {
    /// Creates a configuration, or `None` when either part is blank.
    #[must_use]
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let url_value = url.into().trim().to_owned();
        let key_value = key.into().trim().to_owned();
        if url_value.is_empty() || key_value.is_empty() {
            return None;
        }
        Some(Self {
            url: url_value,
            key: key_value,
        })
    }

    /// Returns the backend address.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the access credential.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Ordering requested for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// By the optional `position` column, then the stable secondary key.
    Position,
    /// By the stable secondary key only: `created_at` for projects, `id`
    /// for tasks. Used when the `position` column is missing.
    Fallback,
}

/// Tables carrying an explicit `position` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionedTable {
    /// The `projects` table.
    Projects,
    /// The `tasks` table.
    Tasks,
}

impl PositionedTable {
    /// Returns the table name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
        }
    }
}

/// Row of the `projects` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Insertion timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Explicit display position, absent before migration.
    pub position: Option<i32>,
}

/// Values inserted into the `projects` table. `created_at` defaults on the
/// backend; `position` stays unset so new projects sort last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Row of the `tasks` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRow {
    /// Primary key.
    pub id: String,
    /// Owning project.
    pub project_id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// First day as `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Last day as `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Presentation color.
    pub color: Option<String>,
    /// Assignee.
    pub employee_id: Option<String>,
    /// Completion percentage.
    pub progress: Option<i32>,
    /// Free-text description.
    pub description: Option<String>,
    /// Explicit display position, absent before migration.
    pub position: Option<i32>,
}

/// Partial update of a `tasks` row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// New display name.
    pub name: Option<String>,
    /// New first day.
    pub start_date: Option<String>,
    /// New last day.
    pub end_date: Option<String>,
    /// New assignee.
    pub employee_id: Option<String>,
    /// New completion percentage.
    pub progress: Option<i32>,
    /// New description; an empty string is a value.
    pub description: Option<String>,
}

impl TaskChanges {
    /// Returns `true` when no column would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.employee_id.is_none()
            && self.progress.is_none()
            && self.description.is_none()
    }
}

/// Partial update of a row whose only mutable column is `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedChanges {
    /// New display name.
    pub name: Option<String>,
}

/// Row of the `departments` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
}

/// Row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Owning department.
    pub department_id: Option<String>,
}

/// Callback fired for every remote change. It carries no payload: treat it
/// as "something changed, read again".
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle on one open push-change channel.
///
/// Closing the handle, explicitly or by dropping it, releases the channel
/// on the remote client.
pub struct ChangeChannel {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ChangeChannel {
    /// Wraps the action that tears the channel down.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Releases the channel.
    pub fn close(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ChangeChannel {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("open", &self.release.is_some())
            .finish()
    }
}

/// Row-level client for the remote relational backend.
///
/// Every call is one round trip. Implementations report failures
/// unchanged; interpreting them (schema drift, missing tables) belongs to
/// the remote store.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Selects every project row.
    async fn select_projects(&self, order: RowOrder) -> BackendResult<Vec<ProjectRow>>;

    /// Selects every task row.
    async fn select_tasks(&self, order: RowOrder) -> BackendResult<Vec<TaskRow>>;

    /// Selects one task row without touching the `position` column.
    async fn select_task(&self, id: &str) -> BackendResult<Option<TaskRow>>;

    /// Selects every department row.
    async fn select_departments(&self) -> BackendResult<Vec<DepartmentRow>>;

    /// Selects every employee row.
    async fn select_employees(&self) -> BackendResult<Vec<EmployeeRow>>;

    /// Inserts a project and returns the stored row.
    async fn insert_project(&self, row: NewProjectRow) -> BackendResult<ProjectRow>;

    /// Updates a project; returns the number of rows changed.
    async fn update_project(&self, id: &str, changes: NamedChanges) -> BackendResult<u64>;

    /// Deletes a project; returns the number of rows removed.
    async fn delete_project(&self, id: &str) -> BackendResult<u64>;

    /// Inserts a task. The `position` field is ignored.
    async fn insert_task(&self, row: TaskRow) -> BackendResult<()>;

    /// Updates a task; returns the number of rows changed.
    async fn update_task(&self, id: &str, changes: TaskChanges) -> BackendResult<u64>;

    /// Deletes a task; returns the number of rows removed.
    async fn delete_task(&self, id: &str) -> BackendResult<u64>;

    /// Deletes every task of a project; returns the number of rows removed.
    async fn delete_tasks_of_project(&self, project_id: &str) -> BackendResult<u64>;

    /// Inserts a department.
    async fn insert_department(&self, row: DepartmentRow) -> BackendResult<()>;

    /// Updates a department; returns the number of rows changed.
    async fn update_department(&self, id: &str, changes: NamedChanges) -> BackendResult<u64>;

    /// Deletes a department; returns the number of rows removed.
    async fn delete_department(&self, id: &str) -> BackendResult<u64>;

    /// Inserts an employee.
    async fn insert_employee(&self, row: EmployeeRow) -> BackendResult<()>;

    /// Deletes an employee; returns the number of rows removed.
    async fn delete_employee(&self, id: &str) -> BackendResult<u64>;

    /// Deletes every employee of a department; returns the number of rows
    /// removed.
    async fn delete_employees_of_department(&self, department_id: &str) -> BackendResult<u64>;

    /// Upserts `(id, position)` pairs into a positioned table as one batch.
    async fn upsert_positions(
        &self,
        table: PositionedTable,
        positions: Vec<(String, i32)>,
    ) -> BackendResult<()>;

    /// Reads a `system_settings` value.
    async fn select_setting(&self, key: &str) -> BackendResult<Option<Value>>;

    /// Upserts a `system_settings` value.
    async fn upsert_setting(&self, key: &str, value: Value) -> BackendResult<()>;

    /// Opens one push-change channel covering inserts, updates and deletes
    /// on every board table. Each call opens a new channel.
    async fn subscribe(&self, listener: ChangeListener) -> BackendResult<ChangeChannel>;
}

/// Builds remote clients from connection settings.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    /// Constructs a client, failing when the backend cannot be reached or
    /// the settings are unusable.
    async fn connect(&self, config: &RemoteConfig) -> BackendResult<Arc<dyn RemoteClient>>;
}
