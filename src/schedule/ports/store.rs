//! Uniform asynchronous CRUD contract shared by every storage backend.

use super::BackendError;
use crate::schedule::domain::{
    Department, DepartmentId, DepartmentPatch, EmployeeId, Employee, EntityKind, NewEmployee,
    NewTask, Project, ProjectId, ProjectPatch, ScheduleDomainError, Task, TaskId, TaskPatch,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for projects, tasks, departments, employees and shared
/// settings. Callers never need to know which backend answers.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Returns every project with its tasks, both in display order.
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Returns every department with its derived member list.
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;

    /// Returns every employee.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Creates an empty project at the end of the display order.
    async fn add_project(&self, name: &str) -> StoreResult<Project>;

    /// Applies a partial project update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the project does not exist.
    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> StoreResult<()>;

    /// Deletes a project together with every task it owns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the project does not exist.
    async fn delete_project(&self, id: &ProjectId) -> StoreResult<()>;

    /// Creates a task at the end of a project's task list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the local backend has no such
    /// project.
    async fn add_task(&self, project_id: &ProjectId, task: NewTask) -> StoreResult<Task>;

    /// Applies a partial task update; fields absent from the patch keep
    /// their values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the task does not exist.
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<()>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the task does not exist.
    async fn delete_task(&self, id: &TaskId) -> StoreResult<()>;

    /// Creates a department without members.
    async fn add_department(&self, name: &str) -> StoreResult<Department>;

    /// Applies a partial department update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the department does not exist.
    async fn update_department(
        &self,
        id: &DepartmentId,
        patch: &DepartmentPatch,
    ) -> StoreResult<()>;

    /// Deletes a department and every employee in it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the department does not exist.
    async fn delete_department(&self, id: &DepartmentId) -> StoreResult<()>;

    /// Creates an employee.
    async fn add_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;

    /// Deletes an employee. Tasks assigned to it keep the dangling
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the employee does not exist.
    async fn delete_employee(&self, id: &EmployeeId) -> StoreResult<()>;

    /// Persists a new project display order.
    async fn reorder_projects(&self, order: &[ProjectId]) -> StoreResult<()>;

    /// Persists a new task display order within one project.
    async fn reorder_tasks(&self, project_id: &ProjectId, order: &[TaskId]) -> StoreResult<()>;

    /// Returns a shared setting value.
    async fn get_setting(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Stores a shared setting value.
    async fn put_setting(&self, key: &str, value: &Value) -> StoreResult<()>;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The update or delete target does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of the missing entity.
        entity: EntityKind,
        /// Identifier that was looked up.
        id: String,
    },

    /// A required remote table is missing; the backend must be provisioned
    /// before it can be used.
    #[error("remote table '{table}' is not provisioned")]
    NotProvisioned {
        /// Name of the missing table.
        table: String,
    },

    /// A remote row could not be mapped onto a domain value.
    #[error("malformed {table} row '{id}': {reason}")]
    MalformedRow {
        /// Table the row came from.
        table: &'static str,
        /// Identifier of the offending row.
        id: String,
        /// Description of the mismatch.
        reason: String,
    },

    /// The remote backend rejected the operation.
    #[error(transparent)]
    Backend(BackendError),

    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] ScheduleDomainError),

    /// Local storage could not be written.
    #[error("storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Builds a not-found error for an entity identifier.
    pub fn not_found(entity: EntityKind, id: impl AsRef<str>) -> Self {
        Self::NotFound {
            entity,
            id: id.as_ref().to_owned(),
        }
    }

    /// Wraps a local storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }

    /// Returns `true` when the backend tables are missing.
    #[must_use]
    pub const fn is_not_provisioned(&self) -> bool {
        matches!(self, Self::NotProvisioned { .. })
    }
}
