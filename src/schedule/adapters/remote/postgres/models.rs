//! Diesel row models for the board tables.

use super::schema::{departments, employees, projects, tasks};
use crate::schedule::ports::{
    DepartmentRow, EmployeeRow, NamedChanges, NewProjectRow, ProjectRow, TaskChanges, TaskRow,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Int4, Nullable, Text, Timestamptz};

/// Query result row for `projects` listings.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct ProjectRecord {
    #[diesel(sql_type = Text)]
    pub id: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub name: Option<String>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    pub created_at: Option<DateTime<Utc>>,
    #[diesel(sql_type = Nullable<Int4>)]
    pub position: Option<i32>,
}

impl From<ProjectRecord> for ProjectRow {
    fn from(record: ProjectRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            position: record.position,
        }
    }
}

/// Query result row for `tasks` listings.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct TaskRecord {
    #[diesel(sql_type = Text)]
    pub id: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub project_id: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub start_date: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub end_date: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub color: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub employee_id: Option<String>,
    #[diesel(sql_type = Nullable<Int4>)]
    pub progress: Option<i32>,
    #[diesel(sql_type = Nullable<Text>)]
    pub description: Option<String>,
    #[diesel(sql_type = Nullable<Int4>)]
    pub position: Option<i32>,
}

impl From<TaskRecord> for TaskRow {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            project_id: record.project_id,
            name: record.name,
            start_date: record.start_date,
            end_date: record.end_date,
            color: record.color,
            employee_id: record.employee_id,
            progress: record.progress,
            description: record.description,
            position: record.position,
        }
    }
}

/// Insert model for `projects`; the stored row is read back with
/// `RETURNING`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub(super) struct NewProjectModel {
    pub id: String,
    pub name: Option<String>,
}

impl From<NewProjectRow> for NewProjectModel {
    fn from(row: NewProjectRow) -> Self {
        Self {
            id: row.id,
            name: Some(row.name),
        }
    }
}

/// Insert model for `tasks`. Leaves `position` to its default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub(super) struct NewTaskModel {
    pub id: String,
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub color: Option<String>,
    pub employee_id: Option<String>,
    pub progress: Option<i32>,
    pub description: Option<String>,
}

impl From<TaskRow> for NewTaskModel {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            color: row.color,
            employee_id: row.employee_id,
            progress: row.progress,
            description: row.description,
        }
    }
}

/// Partial update of a `tasks` row; `None` columns are skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub(super) struct TaskChangeset {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub employee_id: Option<String>,
    pub progress: Option<i32>,
    pub description: Option<String>,
}

impl From<TaskChanges> for TaskChangeset {
    fn from(changes: TaskChanges) -> Self {
        Self {
            name: changes.name,
            start_date: changes.start_date,
            end_date: changes.end_date,
            employee_id: changes.employee_id,
            progress: changes.progress,
            description: changes.description,
        }
    }
}

/// Rename of a `projects` row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
pub(super) struct ProjectChangeset {
    pub name: Option<String>,
}

impl From<NamedChanges> for ProjectChangeset {
    fn from(changes: NamedChanges) -> Self {
        Self { name: changes.name }
    }
}

/// Rename of a `departments` row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = departments)]
pub(super) struct DepartmentChangeset {
    pub name: Option<String>,
}

impl From<NamedChanges> for DepartmentChangeset {
    fn from(changes: NamedChanges) -> Self {
        Self { name: changes.name }
    }
}

/// Row of `departments`, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct DepartmentModel {
    pub id: String,
    pub name: Option<String>,
}

impl From<DepartmentModel> for DepartmentRow {
    fn from(model: DepartmentModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<DepartmentRow> for DepartmentModel {
    fn from(row: DepartmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Row of `employees`, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = employees)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct EmployeeModel {
    pub id: String,
    pub name: Option<String>,
    pub department_id: Option<String>,
}

impl From<EmployeeModel> for EmployeeRow {
    fn from(model: EmployeeModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            department_id: model.department_id,
        }
    }
}

impl From<EmployeeRow> for EmployeeModel {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            department_id: row.department_id,
        }
    }
}
