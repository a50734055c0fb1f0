//! Remote store: the uniform store contract over the row-level client.

use super::{
    drift::{POSITION_COLUMN, escalate, is_missing_column},
    mapping::{
        self, DEPARTMENTS_TABLE, EMPLOYEES_TABLE, PROJECTS_TABLE, SETTINGS_TABLE, TASKS_TABLE,
    },
};
use crate::schedule::{
    domain::{
        DateSpan, Department, DepartmentId, DepartmentPatch, Employee, EmployeeId, EntityKind,
        NewEmployee, NewTask, Project, ProjectId, ProjectPatch, Task, TaskId, TaskPatch,
    },
    ports::{
        BackendResult, DepartmentRow, EmployeeRow, NamedChanges, NewProjectRow, PositionedTable,
        RemoteClient, RowOrder, ScheduleStore, StoreError, StoreResult,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Foreign-key violation reported when a referenced row is absent.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Store backed by a remote relational backend.
///
/// Reads are two queries joined client-side. Deletes remove dependants
/// before their owner, so a partially failed cascade can leave the remote
/// state inconsistent.
pub struct RemoteStore<R, C>
where
    R: RemoteClient + ?Sized,
    C: Clock + Send + Sync,
{
    client: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RemoteStore<R, C>
where
    R: RemoteClient + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a store over a connected client.
    #[must_use]
    pub const fn new(client: Arc<R>, clock: Arc<C>) -> Self {
        Self { client, clock }
    }

    async fn persist_positions(
        &self,
        table: PositionedTable,
        positions: Vec<(String, i32)>,
    ) -> StoreResult<()> {
        if positions.is_empty() {
            return Ok(());
        }
        match self.client.upsert_positions(table, positions).await {
            Ok(()) => Ok(()),
            Err(err) if is_missing_column(&err, POSITION_COLUMN) => {
                warn!(
                    table = table.as_str(),
                    error = %err,
                    "position column missing, ordering not persisted"
                );
                Ok(())
            }
            Err(err) => Err(escalate(err, table.as_str())),
        }
    }

    async fn ensure_project(&self, id: &ProjectId) -> StoreResult<()> {
        let rows = self
            .client
            .select_projects(RowOrder::Fallback)
            .await
            .map_err(|err| escalate(err, PROJECTS_TABLE))?;
        if rows.iter().any(|row| row.id == id.as_str()) {
            Ok(())
        } else {
            Err(StoreError::not_found(EntityKind::Project, id))
        }
    }

    async fn ensure_department(&self, id: &DepartmentId) -> StoreResult<()> {
        let rows = self
            .client
            .select_departments()
            .await
            .map_err(|err| escalate(err, DEPARTMENTS_TABLE))?;
        if rows.iter().any(|row| row.id == id.as_str()) {
            Ok(())
        } else {
            Err(StoreError::not_found(EntityKind::Department, id))
        }
    }

    async fn stored_task(&self, id: &TaskId) -> StoreResult<Task> {
        let row = self
            .client
            .select_task(id.as_str())
            .await
            .map_err(|err| escalate(err, TASKS_TABLE))?
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))?;
        mapping::task_from_row(&row)
    }

    /// Checks the date range a patch would produce. A patch moving a single
    /// bound needs the stored row to compare against.
    async fn check_patched_span(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<()> {
        match (patch.start_date, patch.end_date) {
            (Some(start), Some(end)) => {
                DateSpan::new(start, end)?;
            }
            (None, None) => {}
            (start, end) => {
                let stored = self.stored_task(id).await?;
                stored.span().with_bounds(start, end)?;
            }
        }
        Ok(())
    }
}

/// Runs an ordered listing, retrying by the fallback key when the
/// `position` column is missing.
async fn with_order_fallback<T, F, Fut>(table: PositionedTable, query: F) -> StoreResult<Vec<T>>
where
    F: Fn(RowOrder) -> Fut,
    Fut: Future<Output = BackendResult<Vec<T>>>,
{
    match query(RowOrder::Position).await {
        Ok(rows) => Ok(rows),
        Err(err) if is_missing_column(&err, POSITION_COLUMN) => {
            debug!(
                table = table.as_str(),
                "position column missing, ordering by fallback key"
            );
            query(RowOrder::Fallback)
                .await
                .map_err(|retry_err| escalate(retry_err, table.as_str()))
        }
        Err(err) => Err(escalate(err, table.as_str())),
    }
}

fn positions<K: AsRef<str>>(order: &[K]) -> Vec<(String, i32)> {
    order
        .iter()
        .enumerate()
        .map(|(index, id)| {
            (
                id.as_ref().to_owned(),
                i32::try_from(index).unwrap_or(i32::MAX),
            )
        })
        .collect()
}

fn require_affected(affected: u64, entity: EntityKind, id: impl AsRef<str>) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::not_found(entity, id));
    }
    Ok(())
}

#[async_trait]
impl<R, C> ScheduleStore for RemoteStore<R, C>
where
    R: RemoteClient + ?Sized,
    C: Clock + Send + Sync,
{
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let project_rows = with_order_fallback(PositionedTable::Projects, |order| {
            self.client.select_projects(order)
        })
        .await?;
        let task_rows = with_order_fallback(PositionedTable::Tasks, |order| {
            self.client.select_tasks(order)
        })
        .await?;
        mapping::assemble_projects(project_rows, task_rows)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let department_rows = self
            .client
            .select_departments()
            .await
            .map_err(|err| escalate(err, DEPARTMENTS_TABLE))?;
        let employees = self.list_employees().await?;
        mapping::assemble_departments(department_rows, &employees)
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.client
            .select_employees()
            .await
            .map_err(|err| escalate(err, EMPLOYEES_TABLE))?
            .iter()
            .map(mapping::employee_from_row)
            .collect()
    }

    async fn add_project(&self, name: &str) -> StoreResult<Project> {
        let project = Project::create(ProjectId::generate(&*self.clock), name)?;
        let row = self
            .client
            .insert_project(NewProjectRow {
                id: project.id().to_string(),
                name: project.name().to_owned(),
            })
            .await
            .map_err(|err| escalate(err, PROJECTS_TABLE))?;
        mapping::project_from_row(row, Vec::new())
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> StoreResult<()> {
        let Some(name) = patch.validated_name()? else {
            return self.ensure_project(id).await;
        };
        let affected = self
            .client
            .update_project(id.as_str(), NamedChanges { name: Some(name) })
            .await
            .map_err(|err| escalate(err, PROJECTS_TABLE))?;
        require_affected(affected, EntityKind::Project, id)
    }

    async fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        self.client
            .delete_tasks_of_project(id.as_str())
            .await
            .map_err(|err| escalate(err, TASKS_TABLE))?;
        let affected = self
            .client
            .delete_project(id.as_str())
            .await
            .map_err(|err| escalate(err, PROJECTS_TABLE))?;
        require_affected(affected, EntityKind::Project, id)
    }

    async fn add_task(&self, project_id: &ProjectId, task: NewTask) -> StoreResult<Task> {
        let created = Task::create(TaskId::generate(&*self.clock), project_id.clone(), task)?;
        match self.client.insert_task(mapping::task_row(&created)).await {
            Ok(()) => Ok(created),
            Err(err) if err.code() == Some(FOREIGN_KEY_VIOLATION) => {
                Err(StoreError::not_found(EntityKind::Project, project_id))
            }
            Err(err) => Err(escalate(err, TASKS_TABLE)),
        }
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<()> {
        let changes = mapping::task_changes(patch)?;
        self.check_patched_span(id, patch).await?;
        if changes.is_empty() {
            return self.stored_task(id).await.map(|_| ());
        }
        let affected = self
            .client
            .update_task(id.as_str(), changes)
            .await
            .map_err(|err| escalate(err, TASKS_TABLE))?;
        require_affected(affected, EntityKind::Task, id)
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        let affected = self
            .client
            .delete_task(id.as_str())
            .await
            .map_err(|err| escalate(err, TASKS_TABLE))?;
        require_affected(affected, EntityKind::Task, id)
    }

    async fn add_department(&self, name: &str) -> StoreResult<Department> {
        let department = Department::create(DepartmentId::generate(&*self.clock), name)?;
        self.client
            .insert_department(DepartmentRow {
                id: department.id().to_string(),
                name: Some(department.name().to_owned()),
            })
            .await
            .map_err(|err| escalate(err, DEPARTMENTS_TABLE))?;
        Ok(department)
    }

    async fn update_department(
        &self,
        id: &DepartmentId,
        patch: &DepartmentPatch,
    ) -> StoreResult<()> {
        let Some(name) = patch.validated_name()? else {
            return self.ensure_department(id).await;
        };
        let affected = self
            .client
            .update_department(id.as_str(), NamedChanges { name: Some(name) })
            .await
            .map_err(|err| escalate(err, DEPARTMENTS_TABLE))?;
        require_affected(affected, EntityKind::Department, id)
    }

    async fn delete_department(&self, id: &DepartmentId) -> StoreResult<()> {
        self.client
            .delete_employees_of_department(id.as_str())
            .await
            .map_err(|err| escalate(err, EMPLOYEES_TABLE))?;
        let affected = self
            .client
            .delete_department(id.as_str())
            .await
            .map_err(|err| escalate(err, DEPARTMENTS_TABLE))?;
        require_affected(affected, EntityKind::Department, id)
    }

    async fn add_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        let NewEmployee {
            name,
            department_id,
        } = employee;
        let created = Employee::create(EmployeeId::generate(&*self.clock), name, department_id)?;
        self.ensure_department(created.department_id()).await?;
        let row = EmployeeRow {
            id: created.id().to_string(),
            name: Some(created.name().to_owned()),
            department_id: Some(created.department_id().to_string()),
        };
        match self.client.insert_employee(row).await {
            Ok(()) => Ok(created),
            Err(err) if err.code() == Some(FOREIGN_KEY_VIOLATION) => Err(StoreError::not_found(
                EntityKind::Department,
                created.department_id(),
            )),
            Err(err) => Err(escalate(err, EMPLOYEES_TABLE)),
        }
    }

    async fn delete_employee(&self, id: &EmployeeId) -> StoreResult<()> {
        let affected = self
            .client
            .delete_employee(id.as_str())
            .await
            .map_err(|err| escalate(err, EMPLOYEES_TABLE))?;
        require_affected(affected, EntityKind::Employee, id)
    }

    async fn reorder_projects(&self, order: &[ProjectId]) -> StoreResult<()> {
        self.persist_positions(PositionedTable::Projects, positions(order))
            .await
    }

    async fn reorder_tasks(&self, _project_id: &ProjectId, order: &[TaskId]) -> StoreResult<()> {
        self.persist_positions(PositionedTable::Tasks, positions(order))
            .await
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<Value>> {
        self.client
            .select_setting(key)
            .await
            .map_err(|err| escalate(err, SETTINGS_TABLE))
    }

    async fn put_setting(&self, key: &str, value: &Value) -> StoreResult<()> {
        self.client
            .upsert_setting(key, value.clone())
            .await
            .map_err(|err| escalate(err, SETTINGS_TABLE))
    }
}
