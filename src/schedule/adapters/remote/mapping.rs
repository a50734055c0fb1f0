//! Validated conversion between remote rows and domain values.
//!
//! Every column a domain value needs is checked explicitly; a row that
//! cannot be mapped yields [`StoreError::MalformedRow`] naming the table,
//! the row and the offending column.

use crate::schedule::{
    domain::{
        ColorToken, DateSpan, Department, DepartmentId, Employee, EmployeeId, PersistedTaskData,
        Progress, Project, ProjectId, ScheduleDomainError, Task, TaskId, TaskPatch,
        format_calendar_date, parse_calendar_date,
    },
    ports::{DepartmentRow, EmployeeRow, ProjectRow, StoreError, StoreResult, TaskChanges, TaskRow},
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt::Display;

pub(crate) const PROJECTS_TABLE: &str = "projects";
pub(crate) const TASKS_TABLE: &str = "tasks";
pub(crate) const DEPARTMENTS_TABLE: &str = "departments";
pub(crate) const EMPLOYEES_TABLE: &str = "employees";
pub(crate) const SETTINGS_TABLE: &str = "system_settings";

/// Joins project rows with task rows client-side.
///
/// Projects keep the order of `project_rows`; each project's tasks keep the
/// order of `task_rows`. Tasks whose project is not listed are dropped.
pub(super) fn assemble_projects(
    project_rows: Vec<ProjectRow>,
    task_rows: Vec<TaskRow>,
) -> StoreResult<Vec<Project>> {
    let mut tasks_by_project: HashMap<ProjectId, Vec<Task>> = HashMap::new();
    for row in &task_rows {
        let task = task_from_row(row)?;
        tasks_by_project
            .entry(task.project_id().clone())
            .or_default()
            .push(task);
    }

    project_rows
        .into_iter()
        .map(|row| {
            let id = project_id(&row)?;
            let tasks = tasks_by_project.remove(&id).unwrap_or_default();
            project_from_row(row, tasks)
        })
        .collect()
}

/// Joins department rows with the already mapped employees.
pub(super) fn assemble_departments(
    department_rows: Vec<DepartmentRow>,
    employees: &[Employee],
) -> StoreResult<Vec<Department>> {
    department_rows
        .into_iter()
        .map(|row| {
            let id = DepartmentId::new(row.id.as_str())
                .map_err(|err| malformed(DEPARTMENTS_TABLE, &row.id, err))?;
            let name = required(row.name, DEPARTMENTS_TABLE, &row.id, "name")?;
            Ok(Department::with_members(id, name, employees))
        })
        .collect()
}

pub(super) fn project_from_row(row: ProjectRow, tasks: Vec<Task>) -> StoreResult<Project> {
    let id = project_id(&row)?;
    let name = required(row.name, PROJECTS_TABLE, &row.id, "name")?;
    Ok(Project::from_persisted(id, name, tasks))
}

pub(super) fn task_from_row(row: &TaskRow) -> StoreResult<Task> {
    let row_id = row.id.as_str();
    let invalid = |err: ScheduleDomainError| malformed(TASKS_TABLE, row_id, err);

    let id = TaskId::new(row_id).map_err(invalid)?;
    let project_id = ProjectId::new(required(
        row.project_id.clone(),
        TASKS_TABLE,
        row_id,
        "project_id",
    )?)
    .map_err(invalid)?;
    let name = required(row.name.clone(), TASKS_TABLE, row_id, "name")?;
    let start = date_column(row.start_date.clone(), row_id, "start_date")?;
    let end = date_column(row.end_date.clone(), row_id, "end_date")?;
    let span = DateSpan::new(start, end).map_err(invalid)?;
    let employee_id = EmployeeId::new(required(
        row.employee_id.clone(),
        TASKS_TABLE,
        row_id,
        "employee_id",
    )?)
    .map_err(invalid)?;
    let progress = Progress::new(i64::from(row.progress.unwrap_or_default())).map_err(invalid)?;
    let color = row
        .color
        .clone()
        .map_or_else(|| Ok(ColorToken::for_task(&id)), ColorToken::new)
        .map_err(invalid)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id,
        project_id,
        name,
        span,
        employee_id,
        progress,
        color,
        description: row.description.clone(),
    }))
}

pub(super) fn employee_from_row(row: &EmployeeRow) -> StoreResult<Employee> {
    let row_id = row.id.as_str();
    let invalid = |err: ScheduleDomainError| malformed(EMPLOYEES_TABLE, row_id, err);

    let id = EmployeeId::new(row_id).map_err(invalid)?;
    let name = required(row.name.clone(), EMPLOYEES_TABLE, row_id, "name")?;
    let department_id = DepartmentId::new(required(
        row.department_id.clone(),
        EMPLOYEES_TABLE,
        row_id,
        "department_id",
    )?)
    .map_err(invalid)?;
    Employee::create(id, name, department_id).map_err(invalid)
}

/// Row inserted for a freshly created task. `position` stays unset.
pub(super) fn task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().to_string(),
        project_id: Some(task.project_id().to_string()),
        name: Some(task.name().to_owned()),
        start_date: Some(format_calendar_date(task.start_date())),
        end_date: Some(format_calendar_date(task.end_date())),
        color: Some(task.color().to_string()),
        employee_id: Some(task.employee_id().to_string()),
        progress: Some(i32::from(task.progress().value())),
        description: task.description().map(str::to_owned),
        position: None,
    }
}

/// Column changes for a task patch. Only supplied fields are present; an
/// empty description is kept as a value.
pub(super) fn task_changes(patch: &TaskPatch) -> StoreResult<TaskChanges> {
    Ok(TaskChanges {
        name: patch.validated_name()?,
        start_date: patch.start_date.map(format_calendar_date),
        end_date: patch.end_date.map(format_calendar_date),
        employee_id: patch.employee_id.as_ref().map(ToString::to_string),
        progress: patch.progress.map(|progress| i32::from(progress.value())),
        description: patch.description.clone(),
    })
}

fn project_id(row: &ProjectRow) -> StoreResult<ProjectId> {
    ProjectId::new(row.id.as_str()).map_err(|err| malformed(PROJECTS_TABLE, &row.id, err))
}

fn date_column(value: Option<String>, row_id: &str, column: &str) -> StoreResult<NaiveDate> {
    let text = required(value, TASKS_TABLE, row_id, column)?;
    parse_calendar_date(&text).map_err(|err| malformed(TASKS_TABLE, row_id, err))
}

fn required(
    value: Option<String>,
    table: &'static str,
    row_id: &str,
    column: &str,
) -> StoreResult<String> {
    value.ok_or_else(|| malformed(table, row_id, format!("column '{column}' is null")))
}

fn malformed(table: &'static str, row_id: &str, reason: impl Display) -> StoreError {
    StoreError::MalformedRow {
        table,
        id: row_id.to_owned(),
        reason: reason.to_string(),
    }
}
