//! Mode selector: one store contract over the local and remote backends.

use super::{
    notifications::Subscription,
    preferences::{DISPLAY_PREFERENCES_KEY, DisplayPreferences},
};
use crate::connection::{
    ConfigOrigin, ConnectionError, ConnectionResult,
    persisted::{clear_remote_config, save_remote_config},
};
use crate::schedule::{
    adapters::{local::LocalStore, remote::RemoteStore},
    domain::{
        Department, DepartmentId, DepartmentPatch, Employee, EmployeeId, NewEmployee, NewTask,
        Project, ProjectId, ProjectPatch, Task, TaskId, TaskPatch,
    },
    ports::{
        KeyValueStorage, RemoteClient, RemoteConfig, RemoteConnector, ScheduleStore, StoreError,
        StoreResult,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::fmt;
use std::io;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Which backend currently answers store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// The local key-value record.
    Local,
    /// The remote relational backend.
    Remote,
}

impl StorageMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
struct RemoteSession {
    client: Arc<dyn RemoteClient>,
    store: Arc<dyn ScheduleStore>,
    config: RemoteConfig,
    origin: ConfigOrigin,
}

/// Remote mode and its client change together as one value.
#[derive(Clone)]
enum Connection {
    Local,
    Remote(RemoteSession),
}

/// Store facade dispatching every call to the active backend.
///
/// The facade starts in local mode. [`activate`](Self::activate) and
/// [`init_remote`](Self::init_remote) switch it to remote mode; the switch
/// replaces the backend in one step, so no call observes a half-applied
/// reconfiguration.
pub struct ScheduleFacade<S, C>
where
    S: KeyValueStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    local: Arc<LocalStore<S, C>>,
    storage: Arc<S>,
    clock: Arc<C>,
    connector: Arc<dyn RemoteConnector>,
    connection: RwLock<Connection>,
    pinned: RwLock<Option<(RemoteConfig, ConfigOrigin)>>,
    reconfigure: Mutex<()>,
}

impl<S, C> ScheduleFacade<S, C>
where
    S: KeyValueStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a facade in local mode.
    #[must_use]
    pub fn new(storage: Arc<S>, clock: Arc<C>, connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            local: Arc::new(LocalStore::new(Arc::clone(&storage), Arc::clone(&clock))),
            storage,
            clock,
            connector,
            connection: RwLock::new(Connection::Local),
            pinned: RwLock::new(None),
            reconfigure: Mutex::new(()),
        }
    }

    /// Returns the local store, which keeps serving in every mode.
    #[must_use]
    pub const fn local_store(&self) -> &Arc<LocalStore<S, C>> {
        &self.local
    }

    /// Returns the active storage mode.
    #[must_use]
    pub fn mode(&self) -> StorageMode {
        match self.current() {
            Ok(Connection::Remote(_)) => StorageMode::Remote,
            Ok(Connection::Local) | Err(_) => StorageMode::Local,
        }
    }

    /// Returns where the active remote configuration came from.
    #[must_use]
    pub fn remote_origin(&self) -> Option<ConfigOrigin> {
        self.session().map(|session| session.origin)
    }

    /// Returns the active remote configuration.
    #[must_use]
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        self.session().map(|session| session.config)
    }

    /// Returns `true` when the remote configuration is fixed by a
    /// build-time or environment value.
    #[must_use]
    pub fn is_config_locked(&self) -> bool {
        self.pinned().is_some()
    }

    /// Connects with a resolved configuration and enters remote mode.
    ///
    /// Configuration from a fixed source is pinned even when the connection
    /// fails. A successful connection from a persistable source is saved.
    /// On failure the current mode is kept and nothing is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Connect`] when no client can be built, or
    /// [`ConnectionError::Storage`] when the configuration cannot be saved.
    pub async fn activate(&self, config: RemoteConfig, origin: ConfigOrigin) -> ConnectionResult<()> {
        let _reconfiguring = self.reconfigure.lock().await;
        if origin.is_locked() {
            let mut pinned = self.pinned.write().map_err(|_| connection_poisoned())?;
            *pinned = Some((config.clone(), origin));
        }
        self.connect(config, origin).await
    }

    /// Reconfigures the remote backend from user input.
    ///
    /// Blank input returns to local mode and forgets the saved
    /// configuration. A connection failure does the same and reports the
    /// error. Fixed configuration is never forgotten and cannot be replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConfigLocked`] when a fixed configuration
    /// would be replaced, [`ConnectionError::Connect`] when no client can
    /// be built, or [`ConnectionError::Storage`] when the saved
    /// configuration cannot be updated.
    pub async fn init_remote(&self, url: &str, key: &str) -> ConnectionResult<StorageMode> {
        let _reconfiguring = self.reconfigure.lock().await;
        let pinned = self.pinned();

        let Some(config) = RemoteConfig::new(url, key) else {
            self.switch_to_local()?;
            self.forget_unless_pinned(pinned.as_ref())?;
            return Ok(StorageMode::Local);
        };

        let origin = match pinned {
            Some((fixed, fixed_origin)) if fixed != config => {
                return Err(ConnectionError::ConfigLocked {
                    origin: fixed_origin,
                });
            }
            Some((_, fixed_origin)) => fixed_origin,
            None => ConfigOrigin::Interactive,
        };

        match self.connect(config, origin).await {
            Ok(()) => Ok(StorageMode::Remote),
            Err(err) => {
                self.switch_to_local()?;
                if !origin.is_locked() {
                    clear_remote_config(&*self.storage)?;
                }
                Err(err)
            }
        }
    }

    /// Returns to local mode without touching saved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Storage`] when the connection state is
    /// unusable.
    pub async fn deactivate(&self) -> ConnectionResult<()> {
        let _reconfiguring = self.reconfigure.lock().await;
        self.switch_to_local()
    }

    /// Subscribes to remote changes. In local mode the subscription is
    /// inert. Each call opens a new channel.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the remote channel cannot be
    /// opened.
    pub async fn subscribe(
        &self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> StoreResult<Subscription> {
        let Some(session) = self.session() else {
            return Ok(Subscription::inactive());
        };
        let channel = session
            .client
            .subscribe(Arc::new(move || {
                debug!("remote change notification");
                callback();
            }))
            .await
            .map_err(StoreError::Backend)?;
        Ok(Subscription::remote(channel))
    }

    /// Reads the shared display preferences. A missing or malformed value
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// Propagates failures of the active backend.
    pub async fn display_preferences(&self) -> StoreResult<DisplayPreferences> {
        let Some(value) = self.get_setting(DISPLAY_PREFERENCES_KEY).await? else {
            return Ok(DisplayPreferences::default());
        };
        Ok(serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring malformed display preferences");
            DisplayPreferences::default()
        }))
    }

    /// Stores the shared display preferences.
    ///
    /// # Errors
    ///
    /// Propagates failures of the active backend.
    pub async fn set_display_preferences(&self, preferences: DisplayPreferences) -> StoreResult<()> {
        let value = serde_json::to_value(preferences).map_err(StoreError::storage)?;
        self.put_setting(DISPLAY_PREFERENCES_KEY, &value).await
    }

    async fn connect(&self, config: RemoteConfig, origin: ConfigOrigin) -> ConnectionResult<()> {
        let client = self
            .connector
            .connect(&config)
            .await
            .map_err(ConnectionError::Connect)?;
        let store: Arc<dyn ScheduleStore> = Arc::new(RemoteStore::new(
            Arc::clone(&client),
            Arc::clone(&self.clock),
        ));
        if origin.is_persistable() {
            save_remote_config(&*self.storage, &config)?;
        }
        info!(url = config.url(), %origin, "remote mode active");

        let mut connection = self.connection.write().map_err(|_| connection_poisoned())?;
        *connection = Connection::Remote(RemoteSession {
            client,
            store,
            config,
            origin,
        });
        Ok(())
    }

    fn switch_to_local(&self) -> ConnectionResult<()> {
        let mut connection = self.connection.write().map_err(|_| connection_poisoned())?;
        if matches!(*connection, Connection::Remote(_)) {
            info!("remote mode inactive, using local storage");
        }
        *connection = Connection::Local;
        Ok(())
    }

    fn forget_unless_pinned(
        &self,
        pinned: Option<&(RemoteConfig, ConfigOrigin)>,
    ) -> ConnectionResult<()> {
        if pinned.is_some() {
            return Ok(());
        }
        clear_remote_config(&*self.storage)
    }

    fn pinned(&self) -> Option<(RemoteConfig, ConfigOrigin)> {
        self.pinned.read().ok().and_then(|pinned| pinned.clone())
    }

    fn current(&self) -> StoreResult<Connection> {
        self.connection
            .read()
            .map(|connection| connection.clone())
            .map_err(|_| store_poisoned())
    }

    fn session(&self) -> Option<RemoteSession> {
        match self.current() {
            Ok(Connection::Remote(session)) => Some(session),
            Ok(Connection::Local) | Err(_) => None,
        }
    }

    fn active(&self) -> StoreResult<Arc<dyn ScheduleStore>> {
        Ok(match self.current()? {
            Connection::Local => Arc::clone(&self.local) as Arc<dyn ScheduleStore>,
            Connection::Remote(session) => session.store,
        })
    }
}

fn connection_poisoned() -> ConnectionError {
    ConnectionError::storage(io::Error::other("connection state lock poisoned"))
}

fn store_poisoned() -> StoreError {
    StoreError::storage(io::Error::other("connection state lock poisoned"))
}

#[async_trait]
impl<S, C> ScheduleStore for ScheduleFacade<S, C>
where
    S: KeyValueStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.active()?.list_projects().await
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        self.active()?.list_departments().await
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.active()?.list_employees().await
    }

    async fn add_project(&self, name: &str) -> StoreResult<Project> {
        self.active()?.add_project(name).await
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> StoreResult<()> {
        self.active()?.update_project(id, patch).await
    }

    async fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        self.active()?.delete_project(id).await
    }

    async fn add_task(&self, project_id: &ProjectId, task: NewTask) -> StoreResult<Task> {
        self.active()?.add_task(project_id, task).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> StoreResult<()> {
        self.active()?.update_task(id, patch).await
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        self.active()?.delete_task(id).await
    }

    async fn add_department(&self, name: &str) -> StoreResult<Department> {
        self.active()?.add_department(name).await
    }

    async fn update_department(
        &self,
        id: &DepartmentId,
        patch: &DepartmentPatch,
    ) -> StoreResult<()> {
        self.active()?.update_department(id, patch).await
    }

    async fn delete_department(&self, id: &DepartmentId) -> StoreResult<()> {
        self.active()?.delete_department(id).await
    }

    async fn add_employee(&self, employee: NewEmployee) -> StoreResult<Employee> {
        self.active()?.add_employee(employee).await
    }

    async fn delete_employee(&self, id: &EmployeeId) -> StoreResult<()> {
        self.active()?.delete_employee(id).await
    }

    async fn reorder_projects(&self, order: &[ProjectId]) -> StoreResult<()> {
        self.active()?.reorder_projects(order).await
    }

    async fn reorder_tasks(&self, project_id: &ProjectId, order: &[TaskId]) -> StoreResult<()> {
        self.active()?.reorder_tasks(project_id, order).await
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<Value>> {
        self.active()?.get_setting(key).await
    }

    async fn put_setting(&self, key: &str, value: &Value) -> StoreResult<()> {
        self.active()?.put_setting(key, value).await
    }
}
