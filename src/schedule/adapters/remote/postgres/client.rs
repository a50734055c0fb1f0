//! `PostgreSQL` implementation of the row-level remote client.

use super::{
    listener::ChangeListenerTask,
    models::{
        DepartmentChangeset, DepartmentModel, EmployeeModel, NewProjectModel, NewTaskModel,
        ProjectChangeset, ProjectRecord, TaskChangeset, TaskRecord,
    },
    schema::{departments, employees, projects, system_settings, tasks},
};
use crate::schedule::ports::{
    BackendError, BackendResult, ChangeChannel, ChangeListener, DepartmentRow, EmployeeRow,
    NamedChanges, NewProjectRow, PositionedTable, ProjectRow, RemoteClient, RemoteConfig,
    RemoteConnector, RowOrder, TaskChanges, TaskRow,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// `PostgreSQL` connection pool type used by the remote client.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// Default number of pooled connections per client.
const DEFAULT_POOL_SIZE: u32 = 4;

const TASK_COLUMNS: &str =
    "id, project_id, name, start_date, end_date, color, employee_id, progress, description";

/// Remote client speaking to `PostgreSQL` through a Diesel pool.
#[derive(Clone)]
pub struct PostgresClient {
    pool: BoardPgPool,
    database_url: String,
}

impl PostgresClient {
    /// Creates a client from a pool and the address used for the dedicated
    /// change-listener connection.
    #[must_use]
    pub const fn new(pool: BoardPgPool, database_url: String) -> Self {
        Self { pool, database_url }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BackendResult<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, DieselError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BackendError::transport)?;
            f(&mut connection).map_err(backend_error)
        })
        .await
        .map_err(BackendError::transport)?
    }
}

/// Converts a Diesel failure into a backend error, keeping the server's
/// message text so schema drift stays recognizable.
pub(super) fn backend_error(err: DieselError) -> BackendError {
    let described = match &err {
        DieselError::DatabaseError(kind, info) => Some(sqlstate(kind).map_or_else(
            || BackendError::new(info.message()),
            |code| BackendError::with_code(code, info.message()),
        )),
        _ => None,
    };
    match described {
        Some(database_error) => database_error.caused_by(err),
        None => BackendError::transport(err),
    }
}

const fn sqlstate(kind: &DatabaseErrorKind) -> Option<&'static str> {
    match kind {
        DatabaseErrorKind::UniqueViolation => Some("23505"),
        DatabaseErrorKind::ForeignKeyViolation => Some("23503"),
        DatabaseErrorKind::NotNullViolation => Some("23502"),
        DatabaseErrorKind::CheckViolation => Some("23514"),
        _ => None,
    }
}

fn projects_query(order: RowOrder) -> &'static str {
    match order {
        RowOrder::Position => concat!(
            "SELECT id, name, created_at, position FROM projects ",
            "ORDER BY position ASC NULLS LAST, created_at ASC NULLS LAST, id ASC",
        ),
        RowOrder::Fallback => concat!(
            "SELECT id, name, created_at, NULL::int4 AS position FROM projects ",
            "ORDER BY created_at ASC NULLS LAST, id ASC",
        ),
    }
}

fn tasks_query(order: RowOrder) -> String {
    match order {
        RowOrder::Position => format!(
            "SELECT {TASK_COLUMNS}, position FROM tasks ORDER BY position ASC NULLS LAST, id ASC"
        ),
        RowOrder::Fallback => {
            format!("SELECT {TASK_COLUMNS}, NULL::int4 AS position FROM tasks ORDER BY id ASC")
        }
    }
}

fn count(affected: usize) -> u64 {
    u64::try_from(affected).unwrap_or(u64::MAX)
}

#[async_trait]
impl RemoteClient for PostgresClient {
    async fn select_projects(&self, order: RowOrder) -> BackendResult<Vec<ProjectRow>> {
        self.run_blocking(move |connection| {
            diesel::sql_query(projects_query(order)).load::<ProjectRecord>(connection)
        })
        .await
        .map(|records| records.into_iter().map(ProjectRow::from).collect())
    }

    async fn select_tasks(&self, order: RowOrder) -> BackendResult<Vec<TaskRow>> {
        let query = tasks_query(order);
        self.run_blocking(move |connection| {
            diesel::sql_query(query).load::<TaskRecord>(connection)
        })
        .await
        .map(|records| records.into_iter().map(TaskRow::from).collect())
    }

    async fn select_task(&self, id: &str) -> BackendResult<Option<TaskRow>> {
        let query = format!("SELECT {TASK_COLUMNS}, NULL::int4 AS position FROM tasks WHERE id = $1");
        let task_id = id.to_owned();
        self.run_blocking(move |connection| {
            diesel::sql_query(query)
                .bind::<diesel::sql_types::Text, _>(task_id)
                .get_result::<TaskRecord>(connection)
                .optional()
        })
        .await
        .map(|record| record.map(TaskRow::from))
    }

    async fn select_departments(&self) -> BackendResult<Vec<DepartmentRow>> {
        self.run_blocking(|connection| {
            departments::table
                .select(DepartmentModel::as_select())
                .order(departments::id.asc())
                .load(connection)
        })
        .await
        .map(|models| models.into_iter().map(DepartmentRow::from).collect())
    }

    async fn select_employees(&self) -> BackendResult<Vec<EmployeeRow>> {
        self.run_blocking(|connection| {
            employees::table
                .select(EmployeeModel::as_select())
                .order(employees::id.asc())
                .load(connection)
        })
        .await
        .map(|models| models.into_iter().map(EmployeeRow::from).collect())
    }

    async fn insert_project(&self, row: NewProjectRow) -> BackendResult<ProjectRow> {
        let model = NewProjectModel::from(row);
        let (id, name, created_at) = self
            .run_blocking(move |connection| {
                diesel::insert_into(projects::table)
                    .values(&model)
                    .returning((projects::id, projects::name, projects::created_at))
                    .get_result::<(String, Option<String>, Option<DateTime<Utc>>)>(connection)
            })
            .await?;
        Ok(ProjectRow {
            id,
            name,
            created_at,
            position: None,
        })
    }

    async fn update_project(&self, id: &str, changes: NamedChanges) -> BackendResult<u64> {
        let project_id = id.to_owned();
        let changeset = ProjectChangeset::from(changes);
        self.run_blocking(move |connection| {
            diesel::update(projects::table.filter(projects::id.eq(project_id)))
                .set(&changeset)
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn delete_project(&self, id: &str) -> BackendResult<u64> {
        let project_id = id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(projects::table.filter(projects::id.eq(project_id))).execute(connection)
        })
        .await
        .map(count)
    }

    async fn insert_task(&self, row: TaskRow) -> BackendResult<()> {
        let model = NewTaskModel::from(row);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&model)
                .execute(connection)
        })
        .await
        .map(|_| ())
    }

    async fn update_task(&self, id: &str, changes: TaskChanges) -> BackendResult<u64> {
        let task_id = id.to_owned();
        let changeset = TaskChangeset::from(changes);
        self.run_blocking(move |connection| {
            diesel::update(tasks::table.filter(tasks::id.eq(task_id)))
                .set(&changeset)
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn delete_task(&self, id: &str) -> BackendResult<u64> {
        let task_id = id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(tasks::table.filter(tasks::id.eq(task_id))).execute(connection)
        })
        .await
        .map(count)
    }

    async fn delete_tasks_of_project(&self, project_id: &str) -> BackendResult<u64> {
        let owner = project_id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(tasks::table.filter(tasks::project_id.eq(owner))).execute(connection)
        })
        .await
        .map(count)
    }

    async fn insert_department(&self, row: DepartmentRow) -> BackendResult<()> {
        let model = DepartmentModel::from(row);
        self.run_blocking(move |connection| {
            diesel::insert_into(departments::table)
                .values(&model)
                .execute(connection)
        })
        .await
        .map(|_| ())
    }

    async fn update_department(&self, id: &str, changes: NamedChanges) -> BackendResult<u64> {
        let department_id = id.to_owned();
        let changeset = DepartmentChangeset::from(changes);
        self.run_blocking(move |connection| {
            diesel::update(departments::table.filter(departments::id.eq(department_id)))
                .set(&changeset)
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn delete_department(&self, id: &str) -> BackendResult<u64> {
        let department_id = id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(departments::table.filter(departments::id.eq(department_id)))
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn insert_employee(&self, row: EmployeeRow) -> BackendResult<()> {
        let model = EmployeeModel::from(row);
        self.run_blocking(move |connection| {
            diesel::insert_into(employees::table)
                .values(&model)
                .execute(connection)
        })
        .await
        .map(|_| ())
    }

    async fn delete_employee(&self, id: &str) -> BackendResult<u64> {
        let employee_id = id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(employees::table.filter(employees::id.eq(employee_id)))
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn delete_employees_of_department(&self, department_id: &str) -> BackendResult<u64> {
        let owner = department_id.to_owned();
        self.run_blocking(move |connection| {
            diesel::delete(employees::table.filter(employees::department_id.eq(owner)))
                .execute(connection)
        })
        .await
        .map(count)
    }

    async fn upsert_positions(
        &self,
        table: PositionedTable,
        positions: Vec<(String, i32)>,
    ) -> BackendResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, DieselError, _>(|transaction| {
                for (id, position) in positions {
                    match table {
                        PositionedTable::Projects => {
                            diesel::update(projects::table.filter(projects::id.eq(id)))
                                .set(projects::position.eq(Some(position)))
                                .execute(transaction)?;
                        }
                        PositionedTable::Tasks => {
                            diesel::update(tasks::table.filter(tasks::id.eq(id)))
                                .set(tasks::position.eq(Some(position)))
                                .execute(transaction)?;
                        }
                    }
                }
                Ok(())
            })
        })
        .await
    }

    async fn select_setting(&self, key: &str) -> BackendResult<Option<Value>> {
        let setting_key = key.to_owned();
        self.run_blocking(move |connection| {
            system_settings::table
                .filter(system_settings::key.eq(setting_key))
                .select(system_settings::value)
                .first::<Option<Value>>(connection)
                .optional()
        })
        .await
        .map(Option::flatten)
    }

    async fn upsert_setting(&self, key: &str, value: Value) -> BackendResult<()> {
        let setting_key = key.to_owned();
        self.run_blocking(move |connection| {
            diesel::insert_into(system_settings::table)
                .values((
                    system_settings::key.eq(setting_key),
                    system_settings::value.eq(Some(value)),
                ))
                .on_conflict(system_settings::key)
                .do_update()
                .set(system_settings::value.eq(excluded(system_settings::value)))
                .execute(connection)
        })
        .await
        .map(|_| ())
    }

    async fn subscribe(&self, listener: ChangeListener) -> BackendResult<ChangeChannel> {
        let task = ChangeListenerTask::start(self.database_url.clone(), listener).await?;
        Ok(ChangeChannel::new(move || task.stop()))
    }
}

/// Connector opening a pooled `PostgreSQL` client.
///
/// The configuration's address is a `postgres://` URL; its key is applied
/// as the connection password.
#[derive(Debug, Clone, Copy)]
pub struct PostgresConnector {
    pool_size: u32,
}

impl Default for PostgresConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl PostgresConnector {
    /// Creates a connector with the default pool size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Overrides the number of pooled connections.
    #[must_use]
    pub const fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }
}

/// Builds the connection URL, applying the key as the password.
///
/// # Errors
///
/// Returns [`BackendError`] when the address is not a URL or cannot carry
/// a password.
pub fn connection_url(config: &RemoteConfig) -> BackendResult<String> {
    let mut address = Url::parse(config.url()).map_err(BackendError::transport)?;
    address
        .set_password(Some(config.key()))
        .map_err(|()| BackendError::new("remote address cannot carry a credential"))?;
    Ok(address.into())
}

#[async_trait]
impl RemoteConnector for PostgresConnector {
    async fn connect(&self, config: &RemoteConfig) -> BackendResult<Arc<dyn RemoteClient>> {
        let database_url = connection_url(config)?;
        let pool_size = self.pool_size;
        let manager_url = database_url.clone();
        let pool = tokio::task::spawn_blocking(move || {
            Pool::builder()
                .max_size(pool_size)
                .build(ConnectionManager::<PgConnection>::new(manager_url))
        })
        .await
        .map_err(BackendError::transport)?
        .map_err(BackendError::transport)?;
        Ok(Arc::new(PostgresClient::new(pool, database_url)))
    }
}
