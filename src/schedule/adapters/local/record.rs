//! Serialized shape of the local dataset record.
//!
//! ```json
//! { "projects": [{ "id", "name", "tasks": [{ "id", "name", "startDate",
//!   "endDate", "color", "employeeId", "progress", "description"? }] }],
//!   "departments": [{ "id", "name", "employees": [...] }],
//!   "employees": [{ "id", "name", "departmentId" }] }
//! ```
//!
//! Only the record's structure is all-or-nothing: text that is not JSON, or
//! lacks a `projects` array, is rejected. Entities inside a well-formed
//! record are decoded one by one; an invalid entity is normalised where a
//! safe value exists and skipped otherwise, so one bad row never costs the
//! rest of the board.

use crate::schedule::domain::{
    ColorToken, DateSpan, Dataset, Department, DepartmentId, Employee, EmployeeId,
    PersistedTaskData, Progress, Project, ProjectId, ScheduleDomainError, Task, TaskId,
    format_timestamp_date, parse_calendar_date,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Number, Value};
use tracing::warn;

/// Root of the record as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DatasetRecord {
    projects: Vec<ProjectRecord>,
    departments: Vec<DepartmentRecord>,
    employees: Vec<EmployeeRecord>,
}

/// Root of the record as read back. Entities stay untyped until each is
/// decoded on its own.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct StoredRecord {
    projects: Vec<Value>,
    #[serde(default)]
    departments: Option<Value>,
    #[serde(default)]
    employees: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    id: String,
    name: String,
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoredProject {
    id: String,
    name: String,
    #[serde(default)]
    tasks: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: String,
    name: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    color: Option<String>,
    employee_id: String,
    #[serde(default, deserialize_with = "lenient_progress")]
    progress: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DepartmentRecord {
    id: String,
    name: String,
    employees: Vec<EmployeeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoredDepartment {
    id: String,
    name: String,
    #[serde(default)]
    employees: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeRecord {
    id: String,
    name: String,
    department_id: String,
}

/// Accepts any JSON number (or null) as a progress value; fractions round
/// to the nearest integer.
fn lenient_progress<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number.map_or(0, |value| {
        value
            .as_i64()
            .or_else(|| value.as_u64().map(|_| i64::MAX))
            .or_else(|| {
                value
                    .as_f64()
                    .and_then(|fraction| format!("{fraction:.0}").parse().ok())
            })
            .unwrap_or(0)
    }))
}

/// Elements of an optional JSON array. Anything other than an array reads
/// as empty.
fn elements(value: Option<Value>, what: &str) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            warn!(what, "ignoring non-array entry in local dataset record");
            Vec::new()
        }
    }
}

/// Decodes one entity, logging and dropping it when it cannot be used.
fn decode_entity<R, T>(
    value: Value,
    what: &'static str,
    build: impl FnOnce(R) -> Result<T, ScheduleDomainError>,
) -> Option<T>
where
    R: DeserializeOwned,
{
    let record = serde_json::from_value::<R>(value)
        .map_err(|err| err.to_string())
        .and_then(|record| build(record).map_err(|err| err.to_string()));
    record
        .inspect_err(|reason| warn!(what, %reason, "skipping invalid entry in local dataset"))
        .ok()
}

impl DatasetRecord {
    /// Serializable form of a dataset; member lists are written out so the
    /// record stays readable by older clients.
    pub(super) fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            projects: dataset.projects().iter().map(ProjectRecord::from).collect(),
            departments: dataset
                .departments()
                .iter()
                .map(DepartmentRecord::from)
                .collect(),
            employees: dataset.employees().iter().map(EmployeeRecord::from).collect(),
        }
    }
}

impl StoredRecord {
    /// Rebuilds the dataset, recomputing department membership.
    ///
    /// Records written before the top-level `employees` array existed are
    /// read from the nested member lists instead.
    pub(super) fn into_dataset(self) -> Dataset {
        let Self {
            projects: project_values,
            departments: department_value,
            employees: employee_value,
        } = self;

        let department_entries: Vec<StoredDepartment> = elements(department_value, "departments")
            .into_iter()
            .filter_map(|value| decode_entity(value, "department", Ok))
            .collect();

        let employee_values = match employee_value {
            Some(Value::Null) | None => department_entries
                .iter()
                .flat_map(|department| elements(department.employees.clone(), "members"))
                .collect(),
            listed => elements(listed, "employees"),
        };
        let employees: Vec<Employee> = employee_values
            .into_iter()
            .filter_map(|value| decode_entity(value, "employee", EmployeeRecord::into_employee))
            .collect();

        let departments = department_entries
            .into_iter()
            .filter_map(|entry| {
                let id = DepartmentId::new(entry.id)
                    .inspect_err(|err| warn!(reason = %err, "skipping department without id"))
                    .ok()?;
                Some(Department::with_members(id, entry.name, &employees))
            })
            .collect();

        let projects = project_values
            .into_iter()
            .filter_map(|value| decode_entity(value, "project", StoredProject::into_project))
            .collect();

        Dataset::new(projects, departments, employees)
    }
}

impl From<&Project> for ProjectRecord {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id().to_string(),
            name: project.name().to_owned(),
            tasks: project.tasks().iter().map(TaskRecord::from).collect(),
        }
    }
}

impl StoredProject {
    fn into_project(self) -> Result<Project, ScheduleDomainError> {
        let id = ProjectId::new(self.id)?;
        let tasks = elements(self.tasks, "tasks")
            .into_iter()
            .filter_map(|value| decode_entity(value, "task", |task: TaskRecord| task.into_task(&id)))
            .collect();
        Ok(Project::from_persisted(id, self.name, tasks))
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            name: task.name().to_owned(),
            start_date: format_timestamp_date(task.start_date()),
            end_date: format_timestamp_date(task.end_date()),
            color: Some(task.color().to_string()),
            employee_id: task.employee_id().to_string(),
            progress: i64::from(task.progress().value()),
            description: task.description().map(str::to_owned),
        }
    }
}

impl TaskRecord {
    /// Out-of-range progress is clamped and an inverted span collapses to
    /// its start day; other invalid fields reject the task.
    fn into_task(self, project_id: &ProjectId) -> Result<Task, ScheduleDomainError> {
        let id = TaskId::new(self.id)?;
        let start = parse_calendar_date(&self.start_date)?;
        let end = parse_calendar_date(&self.end_date)?;
        if end < start {
            warn!(task = %id, "collapsing inverted task span to its start date");
        }
        let span = DateSpan::new(start, end.max(start))?;
        let clamped = self.progress.clamp(0, 100);
        if clamped != self.progress {
            warn!(task = %id, progress = self.progress, "clamping stored task progress");
        }
        let color = self
            .color
            .map_or_else(|| Ok(ColorToken::for_task(&id)), ColorToken::new)?;
        Ok(Task::from_persisted(PersistedTaskData {
            project_id: project_id.clone(),
            name: self.name,
            span,
            employee_id: EmployeeId::new(self.employee_id)?,
            progress: Progress::new(clamped)?,
            color,
            description: self.description,
            id,
        }))
    }
}

impl From<&Department> for DepartmentRecord {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id().to_string(),
            name: department.name().to_owned(),
            employees: department
                .employees()
                .iter()
                .map(EmployeeRecord::from)
                .collect(),
        }
    }
}

impl From<&Employee> for EmployeeRecord {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id().to_string(),
            name: employee.name().to_owned(),
            department_id: employee.department_id().to_string(),
        }
    }
}

impl EmployeeRecord {
    fn into_employee(self) -> Result<Employee, ScheduleDomainError> {
        Employee::create(
            EmployeeId::new(self.id)?,
            self.name,
            DepartmentId::new(self.department_id)?,
        )
    }
}
