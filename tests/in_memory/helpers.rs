//! Shared fixtures for in-memory facade integration tests.

use chrono::NaiveDate;
use mockable::DefaultClock;
use planboard::schedule::{
    adapters::{
        local::{LocalStore, MemoryStorage},
        remote::{InMemoryBackend, InMemoryConnector},
    },
    domain::{Dataset, EmployeeId, NewTask},
    ports::RemoteConnector,
    services::ScheduleFacade,
};
use rstest::fixture;
use std::sync::Arc;

/// Facade type used by the integration tests.
pub type TestFacade = ScheduleFacade<MemoryStorage, DefaultClock>;

/// Address accepted by the in-memory connector.
pub const REMOTE_URL: &str = "postgres://board.example/planboard";

/// Credential accepted by the in-memory connector.
pub const REMOTE_KEY: &str = "service-key";

/// A facade together with the storage and remote backend behind it.
pub struct Harness {
    /// The facade under test.
    pub facade: TestFacade,
    /// Local storage shared with the facade.
    pub storage: MemoryStorage,
    /// Connector handing out clients of `backend`.
    pub connector: Arc<InMemoryConnector>,
    /// Remote backend reachable through `connector`.
    pub backend: InMemoryBackend,
}

impl Harness {
    /// Builds a harness over the given local storage and remote backend.
    #[must_use]
    pub fn over(storage: MemoryStorage, backend: InMemoryBackend) -> Self {
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
        }
    }
}

/// Provides a harness whose local store holds an empty dataset and whose
/// remote backend is empty.
#[fixture]
pub fn harness() -> Harness {
    let storage = MemoryStorage::new();
    LocalStore::new(Arc::new(storage.clone()), Arc::new(DefaultClock))
        .write(&Dataset::default())
        .expect("empty dataset written");
    Harness::over(storage, InMemoryBackend::new())
}

/// Builds a calendar date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Request for a five-day task assigned to `e1`.
#[must_use]
pub fn design_task() -> NewTask {
    NewTask::new(
        "Design",
        date(2024, 1, 1),
        date(2024, 1, 5),
        EmployeeId::new("e1").expect("valid employee id"),
    )
}
