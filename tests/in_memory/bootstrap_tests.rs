//! Startup resolution of the remote backend.

use super::helpers::{Harness, REMOTE_KEY, REMOTE_URL, harness};
use crate::test_helpers::EnvVarGuard;
use planboard::connection::{
    ConfigOrigin, ConnectionError, ConnectionSources, KEY_VARIABLES, LaunchParameters,
    SourceValues, URL_VARIABLES, bootstrap, parse_launch_address,
    persisted::{load_remote_config, save_remote_config},
};
use planboard::schedule::{
    ports::{BackendError, RemoteConfig},
    services::StorageMode,
};
use rstest::rstest;
use std::ffi::OsString;

fn launch_address() -> String {
    format!("https://board.example/app?view=week&sbUrl={REMOTE_URL}&sbKey={REMOTE_KEY}")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn launch_parameters_connect_persist_and_are_stripped(harness: Harness) {
    let mut address = parse_launch_address(&launch_address()).expect("valid address");
    let sources = ConnectionSources {
        launch: LaunchParameters::from_address(&address),
        ..ConnectionSources::default()
    };

    let report = bootstrap(&harness.facade, &sources, Some(&mut address)).await;

    assert_eq!(report.mode, StorageMode::Remote);
    assert_eq!(report.origin, Some(ConfigOrigin::LaunchParameters));
    assert!(report.error.is_none());
    assert_eq!(address.query(), Some("view=week"));
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        RemoteConfig::new(REMOTE_URL, REMOTE_KEY)
    );
    assert!(!harness.facade.is_config_locked());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn persisted_configuration_reconnects_on_startup(harness: Harness) {
    let saved = RemoteConfig::new(REMOTE_URL, REMOTE_KEY).expect("complete config");
    save_remote_config(&harness.storage, &saved).expect("config saved");
    let sources = ConnectionSources {
        persisted: SourceValues {
            url: Some(REMOTE_URL.to_owned()),
            key: Some(REMOTE_KEY.to_owned()),
            admin_password: None,
        },
        ..ConnectionSources::default()
    };

    let report = bootstrap(&harness.facade, &sources, None).await;

    assert_eq!(report.mode, StorageMode::Remote);
    assert_eq!(report.origin, Some(ConfigOrigin::Persisted));
    assert_eq!(harness.facade.remote_config(), Some(saved));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn environment_configuration_is_gathered_and_locked(harness: Harness) {
    let [url_plain, url_prefixed] = URL_VARIABLES;
    let [key_plain, key_prefixed] = KEY_VARIABLES;
    let changes: Vec<(OsString, Option<OsString>)> = vec![
        (url_plain.into(), Some(REMOTE_URL.into())),
        (url_prefixed.into(), None),
        (key_plain.into(), None),
        (key_prefixed.into(), Some(REMOTE_KEY.into())),
    ];
    let _env = EnvVarGuard::set_many(&changes);

    let sources = ConnectionSources::gather(&harness.storage, None).expect("sources gathered");
    let report = bootstrap(&harness.facade, &sources, None).await;

    assert_eq!(report.mode, StorageMode::Remote);
    assert_eq!(report.origin, Some(ConfigOrigin::Environment));
    assert!(harness.facade.is_config_locked());
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        None
    );
    let replaced = harness.facade.init_remote("postgres://elsewhere/db", "k").await;
    assert!(matches!(replaced, Err(ConnectionError::ConfigLocked { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_keeps_local_mode_and_saved_config(harness: Harness) {
    let saved = RemoteConfig::new(REMOTE_URL, REMOTE_KEY).expect("complete config");
    save_remote_config(&harness.storage, &saved).expect("config saved");
    harness
        .connector
        .refuse_with(BackendError::new("connection refused"));
    let sources = ConnectionSources {
        persisted: SourceValues {
            url: Some(REMOTE_URL.to_owned()),
            key: Some(REMOTE_KEY.to_owned()),
            admin_password: None,
        },
        ..ConnectionSources::default()
    };

    let report = bootstrap(&harness.facade, &sources, None).await;

    assert_eq!(report.mode, StorageMode::Local);
    assert!(matches!(report.error, Some(ConnectionError::Connect(_))));
    assert_eq!(
        load_remote_config(&harness.storage).expect("storage readable"),
        Some(saved)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_configuration_stays_local(harness: Harness) {
    let mut address =
        parse_launch_address("https://board.example/app?view=month").expect("valid address");

    let report = bootstrap(&harness.facade, &ConnectionSources::default(), Some(&mut address)).await;

    assert_eq!(report.mode, StorageMode::Local);
    assert_eq!(report.origin, None);
    assert!(report.error.is_none());
    assert!(harness.connector.attempts().is_empty());
    assert_eq!(address.query(), Some("view=month"));
}
