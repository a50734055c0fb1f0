//! In-memory simulation of the remote relational backend.
//!
//! Rows live in shared tables behind a lock; clones of an
//! [`InMemoryBackend`] see the same data, like two clients of one database.
//! The simulation can drop the optional `position` columns, drop whole
//! tables and inject failures so the remote store's fallback paths can be
//! exercised without a database server.

use crate::schedule::ports::{
    BackendError, BackendResult, ChangeChannel, ChangeListener, DepartmentRow, EmployeeRow,
    NamedChanges, NewProjectRow, PositionedTable, ProjectRow, RemoteClient, RemoteConfig,
    RemoteConnector, RowOrder, TaskChanges, TaskRow,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, RwLock};
use tracing::debug;

const UNDEFINED_COLUMN: &str = "42703";
const UNDEFINED_TABLE: &str = "42P01";
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Thread-safe in-memory remote backend.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<BackendState>>,
}

struct BackendState {
    projects: Vec<ProjectRow>,
    tasks: Vec<TaskRow>,
    departments: Vec<DepartmentRow>,
    employees: Vec<EmployeeRow>,
    settings: BTreeMap<String, Value>,
    position_columns: bool,
    missing_tables: BTreeSet<String>,
    queued_failures: VecDeque<BackendError>,
    listeners: BTreeMap<u64, ChangeListener>,
    next_listener: u64,
    inserted_projects: i64,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            tasks: Vec::new(),
            departments: Vec::new(),
            employees: Vec::new(),
            settings: BTreeMap::new(),
            position_columns: true,
            missing_tables: BTreeSet::new(),
            queued_failures: VecDeque::new(),
            listeners: BTreeMap::new(),
            next_listener: 0,
            inserted_projects: 0,
        }
    }
}

impl BackendState {
    fn check_table(&self, table: &str) -> BackendResult<()> {
        if self.missing_tables.contains(table) {
            return Err(BackendError::with_code(
                UNDEFINED_TABLE,
                format!("relation \"{table}\" does not exist"),
            ));
        }
        Ok(())
    }

    fn check_position(&self, table: &str) -> BackendResult<()> {
        if self.position_columns {
            return Ok(());
        }
        Err(BackendError::with_code(
            UNDEFINED_COLUMN,
            format!("column {table}.position does not exist"),
        ))
    }

    fn next_created_at(&mut self) -> DateTime<Utc> {
        self.inserted_projects += 1;
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(self.inserted_projects)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with every table and column provisioned.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BackendState::default())),
        }
    }

    /// Creates a backend whose `projects` and `tasks` tables predate the
    /// `position` column.
    #[must_use]
    pub fn without_position_columns() -> Self {
        let backend = Self::new();
        if let Ok(mut state) = backend.state.write() {
            state.position_columns = false;
        }
        backend
    }

    /// Adds the `position` columns, as the migration script would.
    pub fn add_position_columns(&self) {
        if let Ok(mut state) = self.state.write() {
            state.position_columns = true;
        }
    }

    /// Drops a table: every later call touching it fails with
    /// `undefined_table`.
    pub fn drop_table(&self, table: &str) {
        if let Ok(mut state) = self.state.write() {
            state.missing_tables.insert(table.to_owned());
        }
    }

    /// Makes the next call fail with `err`, whatever it is.
    pub fn fail_next(&self, err: BackendError) {
        if let Ok(mut state) = self.state.write() {
            state.queued_failures.push_back(err);
        }
    }

    /// Inserts a raw project row, bypassing validation. A missing
    /// `created_at` is filled in.
    pub fn seed_project(&self, mut row: ProjectRow) {
        if let Ok(mut state) = self.state.write() {
            if row.created_at.is_none() {
                row.created_at = Some(state.next_created_at());
            }
            state.projects.push(row);
        }
    }

    /// Inserts a raw task row, bypassing validation.
    pub fn seed_task(&self, row: TaskRow) {
        if let Ok(mut state) = self.state.write() {
            state.tasks.push(row);
        }
    }

    /// Inserts a raw employee row, bypassing validation.
    pub fn seed_employee(&self, row: EmployeeRow) {
        if let Ok(mut state) = self.state.write() {
            state.employees.push(row);
        }
    }

    /// Returns a snapshot of the `projects` table in insertion order.
    #[must_use]
    pub fn project_rows(&self) -> Vec<ProjectRow> {
        self.state
            .read()
            .map(|state| state.projects.clone())
            .unwrap_or_default()
    }

    /// Returns a snapshot of the `tasks` table in insertion order.
    #[must_use]
    pub fn task_rows(&self) -> Vec<TaskRow> {
        self.state
            .read()
            .map(|state| state.tasks.clone())
            .unwrap_or_default()
    }

    /// Returns a snapshot of the `employees` table in insertion order.
    #[must_use]
    pub fn employee_rows(&self) -> Vec<EmployeeRow> {
        self.state
            .read()
            .map(|state| state.employees.clone())
            .unwrap_or_default()
    }

    /// Returns the number of open change channels.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.listeners.len())
            .unwrap_or_default()
    }

    fn read<T>(
        &self,
        table: &str,
        query: impl FnOnce(&BackendState) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if let Some(err) = state.queued_failures.pop_front() {
            return Err(err);
        }
        state.check_table(table)?;
        query(&state)
    }

    fn write<T>(
        &self,
        table: &str,
        change: impl FnOnce(&mut BackendState) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let (outcome, listeners) = {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            if let Some(err) = state.queued_failures.pop_front() {
                return Err(err);
            }
            state.check_table(table)?;
            let outcome = change(&mut state)?;
            let listeners: Vec<ChangeListener> = state.listeners.values().cloned().collect();
            (outcome, listeners)
        };
        debug!(table, listeners = listeners.len(), "broadcasting row change");
        for listener in listeners {
            listener();
        }
        Ok(outcome)
    }
}

fn poisoned() -> BackendError {
    BackendError::new("in-memory backend lock poisoned")
}

fn duplicate_key(table: &str, id: &str) -> BackendError {
    BackendError::with_code(
        UNIQUE_VIOLATION,
        format!("duplicate key value violates unique constraint \"{table}_pkey\" (id)=({id})"),
    )
}

fn count(removed: usize) -> u64 {
    u64::try_from(removed).unwrap_or(u64::MAX)
}

fn position_sort_key(position: Option<i32>) -> (bool, i32) {
    (position.is_none(), position.unwrap_or_default())
}

fn created_sort_key(created_at: Option<DateTime<Utc>>) -> (bool, Option<DateTime<Utc>>) {
    (created_at.is_none(), created_at)
}

fn apply_task_changes(row: &mut TaskRow, changes: &TaskChanges) {
    if let Some(name) = &changes.name {
        row.name = Some(name.clone());
    }
    if let Some(start_date) = &changes.start_date {
        row.start_date = Some(start_date.clone());
    }
    if let Some(end_date) = &changes.end_date {
        row.end_date = Some(end_date.clone());
    }
    if let Some(employee_id) = &changes.employee_id {
        row.employee_id = Some(employee_id.clone());
    }
    if let Some(progress) = changes.progress {
        row.progress = Some(progress);
    }
    if let Some(description) = &changes.description {
        row.description = Some(description.clone());
    }
}

#[async_trait]
impl RemoteClient for InMemoryBackend {
    async fn select_projects(&self, order: RowOrder) -> BackendResult<Vec<ProjectRow>> {
        self.read("projects", |state| {
            let mut rows = state.projects.clone();
            match order {
                RowOrder::Position => {
                    state.check_position("projects")?;
                    rows.sort_by_key(|row| {
                        (position_sort_key(row.position), created_sort_key(row.created_at))
                    });
                }
                RowOrder::Fallback => {
                    rows.sort_by_key(|row| created_sort_key(row.created_at));
                    for row in &mut rows {
                        row.position = None;
                    }
                }
            }
            Ok(rows)
        })
    }

    async fn select_tasks(&self, order: RowOrder) -> BackendResult<Vec<TaskRow>> {
        self.read("tasks", |state| {
            let mut rows = state.tasks.clone();
            match order {
                RowOrder::Position => {
                    state.check_position("tasks")?;
                    rows.sort_by(|left, right| {
                        position_sort_key(left.position)
                            .cmp(&position_sort_key(right.position))
                            .then_with(|| left.id.cmp(&right.id))
                    });
                }
                RowOrder::Fallback => {
                    rows.sort_by(|left, right| left.id.cmp(&right.id));
                    for row in &mut rows {
                        row.position = None;
                    }
                }
            }
            Ok(rows)
        })
    }

    async fn select_task(&self, id: &str) -> BackendResult<Option<TaskRow>> {
        self.read("tasks", |state| {
            Ok(state.tasks.iter().find(|row| row.id == id).map(|row| TaskRow {
                position: None,
                ..row.clone()
            }))
        })
    }

    async fn select_departments(&self) -> BackendResult<Vec<DepartmentRow>> {
        self.read("departments", |state| Ok(state.departments.clone()))
    }

    async fn select_employees(&self) -> BackendResult<Vec<EmployeeRow>> {
        self.read("employees", |state| Ok(state.employees.clone()))
    }

    async fn insert_project(&self, row: NewProjectRow) -> BackendResult<ProjectRow> {
        self.write("projects", |state| {
            if state.projects.iter().any(|existing| existing.id == row.id) {
                return Err(duplicate_key("projects", &row.id));
            }
            let stored = ProjectRow {
                id: row.id,
                name: Some(row.name),
                created_at: Some(state.next_created_at()),
                position: None,
            };
            state.projects.push(stored.clone());
            Ok(stored)
        })
    }

    async fn update_project(&self, id: &str, changes: NamedChanges) -> BackendResult<u64> {
        self.write("projects", |state| {
            let Some(row) = state.projects.iter_mut().find(|row| row.id == id) else {
                return Ok(0);
            };
            if let Some(name) = changes.name {
                row.name = Some(name);
            }
            Ok(1)
        })
    }

    async fn delete_project(&self, id: &str) -> BackendResult<u64> {
        self.write("projects", |state| {
            let before = state.projects.len();
            state.projects.retain(|row| row.id != id);
            Ok(count(before - state.projects.len()))
        })
    }

    async fn insert_task(&self, row: TaskRow) -> BackendResult<()> {
        self.write("tasks", |state| {
            let project_exists = row.project_id.as_deref().is_some_and(|project_id| {
                state.projects.iter().any(|project| project.id == project_id)
            });
            if !project_exists {
                return Err(BackendError::with_code(
                    FOREIGN_KEY_VIOLATION,
                    "insert or update on table \"tasks\" violates foreign key constraint \
                     \"tasks_project_id_fkey\"",
                ));
            }
            if state.tasks.iter().any(|existing| existing.id == row.id) {
                return Err(duplicate_key("tasks", &row.id));
            }
            state.tasks.push(TaskRow {
                position: None,
                ..row
            });
            Ok(())
        })
    }

    async fn update_task(&self, id: &str, changes: TaskChanges) -> BackendResult<u64> {
        self.write("tasks", |state| {
            let Some(row) = state.tasks.iter_mut().find(|row| row.id == id) else {
                return Ok(0);
            };
            apply_task_changes(row, &changes);
            Ok(1)
        })
    }

    async fn delete_task(&self, id: &str) -> BackendResult<u64> {
        self.write("tasks", |state| {
            let before = state.tasks.len();
            state.tasks.retain(|row| row.id != id);
            Ok(count(before - state.tasks.len()))
        })
    }

    async fn delete_tasks_of_project(&self, project_id: &str) -> BackendResult<u64> {
        self.write("tasks", |state| {
            let before = state.tasks.len();
            state
                .tasks
                .retain(|row| row.project_id.as_deref() != Some(project_id));
            Ok(count(before - state.tasks.len()))
        })
    }

    async fn insert_department(&self, row: DepartmentRow) -> BackendResult<()> {
        self.write("departments", |state| {
            if state.departments.iter().any(|existing| existing.id == row.id) {
                return Err(duplicate_key("departments", &row.id));
            }
            state.departments.push(row);
            Ok(())
        })
    }

    async fn update_department(&self, id: &str, changes: NamedChanges) -> BackendResult<u64> {
        self.write("departments", |state| {
            let Some(row) = state.departments.iter_mut().find(|row| row.id == id) else {
                return Ok(0);
            };
            if let Some(name) = changes.name {
                row.name = Some(name);
            }
            Ok(1)
        })
    }

    async fn delete_department(&self, id: &str) -> BackendResult<u64> {
        self.write("departments", |state| {
            let before = state.departments.len();
            state.departments.retain(|row| row.id != id);
            Ok(count(before - state.departments.len()))
        })
    }

    async fn insert_employee(&self, row: EmployeeRow) -> BackendResult<()> {
        self.write("employees", |state| {
            if state.employees.iter().any(|existing| existing.id == row.id) {
                return Err(duplicate_key("employees", &row.id));
            }
            state.employees.push(row);
            Ok(())
        })
    }

    async fn delete_employee(&self, id: &str) -> BackendResult<u64> {
        self.write("employees", |state| {
            let before = state.employees.len();
            state.employees.retain(|row| row.id != id);
            Ok(count(before - state.employees.len()))
        })
    }

    async fn delete_employees_of_department(&self, department_id: &str) -> BackendResult<u64> {
        self.write("employees", |state| {
            let before = state.employees.len();
            state
                .employees
                .retain(|row| row.department_id.as_deref() != Some(department_id));
            Ok(count(before - state.employees.len()))
        })
    }

    async fn upsert_positions(
        &self,
        table: PositionedTable,
        positions: Vec<(String, i32)>,
    ) -> BackendResult<()> {
        self.write(table.as_str(), |state| {
            state.check_position(table.as_str())?;
            for (id, position) in positions {
                match table {
                    PositionedTable::Projects => {
                        if let Some(row) = state.projects.iter_mut().find(|row| row.id == id) {
                            row.position = Some(position);
                        }
                    }
                    PositionedTable::Tasks => {
                        if let Some(row) = state.tasks.iter_mut().find(|row| row.id == id) {
                            row.position = Some(position);
                        }
                    }
                }
            }
            Ok(())
        })
    }

    async fn select_setting(&self, key: &str) -> BackendResult<Option<Value>> {
        self.read("system_settings", |state| Ok(state.settings.get(key).cloned()))
    }

    async fn upsert_setting(&self, key: &str, value: Value) -> BackendResult<()> {
        self.write("system_settings", |state| {
            state.settings.insert(key.to_owned(), value);
            Ok(())
        })
    }

    async fn subscribe(&self, listener: ChangeListener) -> BackendResult<ChangeChannel> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if let Some(err) = state.queued_failures.pop_front() {
            return Err(err);
        }
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id, listener);
        drop(state);

        let shared = Arc::clone(&self.state);
        Ok(ChangeChannel::new(move || {
            if let Ok(mut locked) = shared.write() {
                locked.listeners.remove(&id);
            }
        }))
    }
}

/// Connector handing out clients of one shared [`InMemoryBackend`].
pub struct InMemoryConnector {
    backend: InMemoryBackend,
    refusal: RwLock<Option<BackendError>>,
    attempts: RwLock<Vec<RemoteConfig>>,
}

impl InMemoryConnector {
    /// Creates a connector that accepts every configuration.
    #[must_use]
    pub fn new(backend: InMemoryBackend) -> Self {
        Self {
            backend,
            refusal: RwLock::new(None),
            attempts: RwLock::new(Vec::new()),
        }
    }

    /// Makes every later connection attempt fail with `err`.
    pub fn refuse_with(&self, err: BackendError) {
        if let Ok(mut refusal) = self.refusal.write() {
            *refusal = Some(err);
        }
    }

    /// Accepts connection attempts again.
    pub fn accept(&self) {
        if let Ok(mut refusal) = self.refusal.write() {
            *refusal = None;
        }
    }

    /// Returns every configuration a connection was attempted with.
    #[must_use]
    pub fn attempts(&self) -> Vec<RemoteConfig> {
        self.attempts
            .read()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }

    /// Returns the shared backend.
    #[must_use]
    pub const fn backend(&self) -> &InMemoryBackend {
        &self.backend
    }
}

#[async_trait]
impl RemoteConnector for InMemoryConnector {
    async fn connect(&self, config: &RemoteConfig) -> BackendResult<Arc<dyn RemoteClient>> {
        if let Ok(mut attempts) = self.attempts.write() {
            attempts.push(config.clone());
        }
        let refusal = self.refusal.read().map_err(|_| poisoned())?.clone();
        if let Some(err) = refusal {
            return Err(err);
        }
        Ok(Arc::new(self.backend.clone()))
    }
}
