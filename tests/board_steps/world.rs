//! Shared world state for board persistence BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use planboard::connection::ConnectionResult;
use planboard::schedule::{
    adapters::{
        local::{LocalStore, MemoryStorage},
        remote::{InMemoryBackend, InMemoryConnector},
    },
    domain::{Dataset, ProjectId},
    ports::RemoteConnector,
    services::{ScheduleFacade, StorageMode},
};
use rstest::fixture;

/// Facade type used by the BDD world.
pub type TestFacade = ScheduleFacade<MemoryStorage, DefaultClock>;

/// Address the scenarios connect to.
pub const REMOTE_URL: &str = "postgres://board.example/planboard";

/// Credential the scenarios connect with.
pub const REMOTE_KEY: &str = "service-key";

/// Scenario world for board persistence behaviour tests.
pub struct BoardWorld {
    /// The facade under test.
    pub facade: TestFacade,
    /// Local storage behind the facade.
    pub storage: MemoryStorage,
    /// Connector the facade connects through.
    pub connector: Arc<InMemoryConnector>,
    /// Remote backend behind the connector.
    pub backend: InMemoryBackend,
    /// Identifiers of the projects created so far, by name.
    pub projects: HashMap<String, ProjectId>,
    /// Outcome of the last connection attempt.
    pub last_connect: Option<ConnectionResult<StorageMode>>,
}

impl BoardWorld {
    /// Creates a world with an empty local board and an idle remote backend.
    #[must_use]
    pub fn new() -> Self {
        let storage = MemoryStorage::new();
        let backend = InMemoryBackend::new();
        let connector = Arc::new(InMemoryConnector::new(backend.clone()));
        let facade = ScheduleFacade::new(
            Arc::new(storage.clone()),
            Arc::new(DefaultClock),
            Arc::clone(&connector) as Arc<dyn RemoteConnector>,
        );
        Self {
            facade,
            storage,
            connector,
            backend,
            projects: HashMap::new(),
            last_connect: None,
        }
    }

    /// Writes an empty dataset so the board starts without seed content.
    pub fn clear_local(&self) -> Result<(), eyre::Report> {
        LocalStore::new(Arc::new(self.storage.clone()), Arc::new(DefaultClock))
            .write(&Dataset::default())
            .map_err(|err| eyre::eyre!("writing empty dataset failed: {err}"))
    }

    /// Looks up a project created earlier in the scenario.
    pub fn project_id(&self, name: &str) -> Result<ProjectId, eyre::Report> {
        self.projects
            .get(name)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no project named '{name}' in scenario world"))
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Splits a comma-separated list of names.
pub fn names(list: &str) -> Vec<String> {
    list.split(',').map(|name| name.trim().to_owned()).collect()
}
