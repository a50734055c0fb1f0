//! Port contracts for the scheduling board.
//!
//! Ports define infrastructure-agnostic interfaces: the uniform store
//! contract every backend satisfies, the key-value storage underneath the
//! local backend, and the row-level protocol spoken to the remote backend.

pub mod remote;
pub mod storage;
pub mod store;

pub use remote::{
    BackendError, BackendResult, ChangeChannel, ChangeListener, DepartmentRow, EmployeeRow,
    NamedChanges, NewProjectRow, PositionedTable, ProjectRow, RemoteClient, RemoteConfig,
    RemoteConnector, RowOrder, TaskChanges, TaskRow,
};
pub use storage::KeyValueStorage;
pub use store::{ScheduleStore, StoreError, StoreResult};
