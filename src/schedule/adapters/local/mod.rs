//! Local backend: the whole dataset as one JSON record in key-value
//! storage.

mod record;
mod storage;
mod store;

pub use storage::{DirectoryStorage, MemoryStorage};
pub use store::{DATASET_KEY, LocalStore, SETTINGS_KEY};
