//! Facade dispatch and mode toggling over in-memory backends.

use super::helpers::{Harness, REMOTE_KEY, REMOTE_URL, design_task, harness};
use planboard::connection::{
    ConfigOrigin, ConnectionError,
    persisted::{load_remote_config, save_remote_config},
};
use planboard::schedule::{
    domain::{Progress, TaskPatch},
    ports::{BackendError, RemoteConfig, ScheduleStore},
    services::StorageMode,
};
use rstest::rstest;

fn remote_config() -> RemoteConfig {
    RemoteConfig::new(REMOTE_URL, REMOTE_KEY).expect("complete configuration")
}

async fn connect(harness: &Harness) {
    let mode = harness
        .facade
        .init_remote(REMOTE_URL, REMOTE_KEY)
        .await
        .expect("remote mode activated");
    assert_eq!(mode, StorageMode::Remote);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn facade_starts_in_local_mode(harness: Harness) {
    assert_eq!(harness.facade.mode(), StorageMode::Local);
    assert_eq!(harness.facade.remote_origin(), None);

    harness
        .facade
        .add_project("Offline")
        .await
        .expect("project created");

    let projects = harness.facade.list_projects().await.expect("projects listed");
    assert_eq!(projects.len(), 1);
    assert!(harness.backend.project_rows().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_init_remote_routes_writes_and_persists_config(harness: Harness) {
    connect(&harness).await;

    harness
        .facade
        .add_project("Shared")
        .await
        .expect("project created");

    assert_eq!(harness.facade.remote_origin(), Some(ConfigOrigin::Interactive));
    assert_eq!(harness.facade.remote_config(), Some(remote_config()));
    assert_eq!(harness.backend.project_rows().len(), 1);
    assert!(harness.facade.local_store().read().projects().is_empty());
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        Some(remote_config())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_init_remote_returns_to_local_contents(harness: Harness) {
    harness
        .facade
        .add_project("Local only")
        .await
        .expect("local project created");
    connect(&harness).await;
    harness
        .facade
        .add_project("Remote only")
        .await
        .expect("remote project created");

    let mode = harness
        .facade
        .init_remote("", "")
        .await
        .expect("deactivation succeeds");

    assert_eq!(mode, StorageMode::Local);
    assert_eq!(harness.facade.mode(), StorageMode::Local);
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        None
    );
    let projects = harness.facade.list_projects().await.expect("projects listed");
    let names: Vec<&str> = projects.iter().map(|project| project.name()).collect();
    assert_eq!(names, vec!["Local only"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_init_remote_falls_back_and_forgets_config(harness: Harness) {
    save_remote_config(&harness.storage, &remote_config()).expect("config saved");
    harness
        .connector
        .refuse_with(BackendError::new("connection refused"));

    let result = harness.facade.init_remote(REMOTE_URL, "wrong-key").await;

    assert!(matches!(result, Err(ConnectionError::Connect(_))));
    assert_eq!(harness.facade.mode(), StorageMode::Local);
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        None
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn environment_configuration_is_locked(harness: Harness) {
    harness
        .facade
        .activate(remote_config(), ConfigOrigin::Environment)
        .await
        .expect("environment configuration connects");
    let other = harness.facade.init_remote("postgres://elsewhere/db", "k").await;

    assert!(matches!(
        other,
        Err(ConnectionError::ConfigLocked {
            origin: ConfigOrigin::Environment
        })
    ));
    assert!(harness.facade.is_config_locked());
    assert_eq!(harness.facade.mode(), StorageMode::Remote);
    assert_eq!(harness.connector.attempts().len(), 1);
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        None
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_input_does_not_forget_saved_config_when_locked(harness: Harness) {
    let saved = RemoteConfig::new("postgres://saved/db", "saved-key").expect("complete config");
    save_remote_config(&harness.storage, &saved).expect("config saved");
    harness
        .facade
        .activate(remote_config(), ConfigOrigin::Compiled)
        .await
        .expect("compiled configuration connects");

    harness
        .facade
        .init_remote("", "")
        .await
        .expect("deactivation succeeds");

    assert_eq!(harness.facade.mode(), StorageMode::Local);
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        Some(saved)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn locked_configuration_can_be_retried(harness: Harness) {
    harness
        .connector
        .refuse_with(BackendError::new("backend starting up"));
    let first = harness
        .facade
        .activate(remote_config(), ConfigOrigin::Environment)
        .await;
    harness.connector.accept();

    let retried = harness.facade.init_remote(REMOTE_URL, REMOTE_KEY).await;

    assert!(first.is_err());
    assert_eq!(retried.expect("same configuration reconnects"), StorageMode::Remote);
    assert_eq!(harness.facade.remote_origin(), Some(ConfigOrigin::Environment));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deactivate_keeps_saved_config(harness: Harness) {
    connect(&harness).await;

    harness.facade.deactivate().await.expect("deactivated");

    assert_eq!(harness.facade.mode(), StorageMode::Local);
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        Some(remote_config())
    );
}

#[rstest]
#[case::local(false)]
#[case::remote(true)]
#[tokio::test(flavor = "multi_thread")]
async fn add_then_read_back_in_either_mode(harness: Harness, #[case] remote: bool) {
    if remote {
        connect(&harness).await;
    }

    let project = harness
        .facade
        .add_project("Launch")
        .await
        .expect("project created");
    harness
        .facade
        .add_task(project.id(), design_task())
        .await
        .expect("task created");

    let projects = harness.facade.list_projects().await.expect("projects listed");
    let stored = projects
        .iter()
        .find(|candidate| candidate.id() == project.id())
        .expect("project listed");
    assert_eq!(stored.tasks().len(), 1);
    let task = stored.tasks().first().expect("task listed");
    assert_eq!(task.progress(), Progress::NONE);
    assert!(!task.color().as_str().is_empty());
    assert!(task.end_date() >= task.start_date());
}

#[rstest]
#[case::local(false)]
#[case::remote(true)]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_project_removes_its_tasks_in_either_mode(
    harness: Harness,
    #[case] remote: bool,
) {
    if remote {
        connect(&harness).await;
    }
    let doomed = harness.facade.add_project("Doomed").await.expect("project created");
    let kept = harness.facade.add_project("Kept").await.expect("project created");
    let doomed_task = harness
        .facade
        .add_task(doomed.id(), design_task())
        .await
        .expect("task created");
    harness
        .facade
        .add_task(kept.id(), design_task())
        .await
        .expect("task created");

    harness
        .facade
        .delete_project(doomed.id())
        .await
        .expect("project deleted");

    let projects = harness.facade.list_projects().await.expect("projects listed");
    assert_eq!(projects.len(), 1);
    assert!(
        projects
            .iter()
            .flat_map(|project| project.tasks())
            .all(|task| task.id() != doomed_task.id())
    );
    if remote {
        assert_eq!(harness.backend.task_rows().len(), 1);
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_update_through_the_facade_touches_one_field(harness: Harness) {
    connect(&harness).await;
    let project = harness.facade.add_project("Launch").await.expect("project created");
    let task = harness
        .facade
        .add_task(project.id(), design_task().with_description("Brief"))
        .await
        .expect("task created");

    harness
        .facade
        .update_task(
            task.id(),
            &TaskPatch::new().with_progress(Progress::new(42).expect("valid progress")),
        )
        .await
        .expect("task updated");

    let projects = harness.facade.list_projects().await.expect("projects listed");
    let stored = projects
        .first()
        .and_then(|candidate| candidate.task(task.id()))
        .expect("task listed");
    assert_eq!(stored.progress().value(), 42);
    assert_eq!(stored.name(), task.name());
    assert_eq!(stored.span(), task.span());
    assert_eq!(stored.employee_id(), task.employee_id());
    assert_eq!(stored.description(), Some("Brief"));
}
