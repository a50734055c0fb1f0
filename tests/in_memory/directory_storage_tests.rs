//! File-backed local storage.

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use planboard::schedule::{
    adapters::local::{DATASET_KEY, DirectoryStorage, LocalStore},
    domain::Dataset,
    ports::{KeyValueStorage, ScheduleStore},
};
use rstest::{fixture, rstest};
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("board"))
        .expect("temporary path is UTF-8");
    Workspace { _dir: dir, path }
}

#[rstest]
fn values_survive_reopening(workspace: Workspace) {
    let first = DirectoryStorage::open(&workspace.path).expect("storage opened");
    first.save("planboard.settings", "{\"a\":1}").expect("value saved");
    drop(first);

    let reopened = DirectoryStorage::open(&workspace.path).expect("storage reopened");

    assert_eq!(
        reopened.load("planboard.settings").expect("value loaded"),
        Some("{\"a\":1}".to_owned())
    );
}

#[rstest]
fn removing_an_absent_key_succeeds(workspace: Workspace) {
    let storage = DirectoryStorage::open(&workspace.path).expect("storage opened");

    storage.remove("never-written").expect("absent key removed");

    assert_eq!(storage.load("never-written").expect("load succeeds"), None);
}

#[rstest]
fn saving_replaces_the_previous_value(workspace: Workspace) {
    let storage = DirectoryStorage::open(&workspace.path).expect("storage opened");

    storage.save("key", "first").expect("value saved");
    storage.save("key", "second").expect("value replaced");

    assert_eq!(storage.load("key").expect("value loaded"), Some("second".to_owned()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn local_store_persists_through_the_directory(workspace: Workspace) {
    let storage = Arc::new(DirectoryStorage::open(&workspace.path).expect("storage opened"));
    let store = LocalStore::new(Arc::clone(&storage), Arc::new(DefaultClock));
    store.write(&Dataset::default()).expect("empty dataset written");

    let project = store.add_project("On disk").await.expect("project created");

    let reopened = Arc::new(DirectoryStorage::open(&workspace.path).expect("storage reopened"));
    let projects = LocalStore::new(reopened, Arc::new(DefaultClock)).read();
    assert_eq!(projects.projects().len(), 1);
    assert_eq!(
        projects.projects().first().map(|stored| stored.id()),
        Some(project.id())
    );
    assert!(
        storage
            .load(DATASET_KEY)
            .expect("dataset readable")
            .is_some_and(|raw| raw.contains("On disk"))
    );
}
