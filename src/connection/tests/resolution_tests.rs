//! Tests for source precedence, launch parameters and persisted settings.

use crate::connection::{
    ConfigOrigin, ConnectionError, ConnectionSources, LaunchParameters, Resolved, SourceValues,
    parse_launch_address,
    persisted::{REMOTE_CONFIG_KEY, clear_remote_config, load_remote_config, save_remote_config},
    strip_launch_parameters,
};
use crate::schedule::{
    adapters::local::MemoryStorage,
    ports::{KeyValueStorage, RemoteConfig},
};
use rstest::rstest;
use std::collections::HashMap;

fn values(url: Option<&str>, key: Option<&str>, password: Option<&str>) -> SourceValues {
    SourceValues {
        url: url.map(str::to_owned),
        key: key.map(str::to_owned),
        admin_password: password.map(str::to_owned),
    }
}

fn resolved(value: &str, origin: ConfigOrigin) -> Option<Resolved<String>> {
    Some(Resolved {
        value: value.to_owned(),
        origin,
    })
}

#[rstest]
#[case(ConfigOrigin::Compiled, true, false)]
#[case(ConfigOrigin::Environment, true, false)]
#[case(ConfigOrigin::LaunchParameters, false, true)]
#[case(ConfigOrigin::Persisted, false, true)]
#[case(ConfigOrigin::Interactive, false, true)]
fn origins_are_locked_or_persistable(
    #[case] origin: ConfigOrigin,
    #[case] locked: bool,
    #[case] persistable: bool,
) {
    assert_eq!(origin.is_locked(), locked);
    assert_eq!(origin.is_persistable(), persistable);
}

#[rstest]
fn plain_variable_names_win_over_prefixed_ones() {
    let variables = HashMap::from([
        ("SUPABASE_URL", "postgres://plain"),
        ("VITE_SUPABASE_URL", "postgres://prefixed"),
        ("VITE_SUPABASE_KEY", "prefixed-key"),
        ("ADMIN_PASSWORD", "   "),
        ("VITE_ADMIN_PASSWORD", "hunter2"),
    ]);

    let found = SourceValues::from_lookup(|name| variables.get(name).map(|value| (*value).to_owned()));

    assert_eq!(
        found,
        values(
            Some("postgres://plain"),
            Some("prefixed-key"),
            Some("hunter2")
        )
    );
}

#[rstest]
fn source_values_debug_redacts_secrets() {
    let rendered = format!(
        "{:?}",
        values(Some("postgres://db"), Some("secret-key"), Some("hunter2"))
    );

    assert!(rendered.contains("postgres://db"));
    assert!(!rendered.contains("secret-key"));
    assert!(!rendered.contains("hunter2"));
}

#[rstest]
fn each_field_resolves_from_the_first_non_empty_source() {
    let sources = ConnectionSources {
        compiled: values(None, None, None),
        environment: values(Some("postgres://env"), None, None),
        launch: LaunchParameters {
            url: Some("postgres://launch".to_owned()),
            key: Some("launch-key".to_owned()),
        },
        persisted: values(Some("postgres://saved"), Some("saved-key"), Some("saved-pass")),
    };

    let outcome = sources.resolve();

    assert_eq!(outcome.url, resolved("postgres://env", ConfigOrigin::Environment));
    assert_eq!(outcome.key, resolved("launch-key", ConfigOrigin::LaunchParameters));
    assert_eq!(
        outcome.admin_password,
        resolved("saved-pass", ConfigOrigin::Persisted)
    );
    let remote = outcome.remote().expect("complete configuration");
    assert_eq!(remote.origin, ConfigOrigin::Environment);
    assert_eq!(remote.value.url(), "postgres://env");
    assert_eq!(remote.value.key(), "launch-key");
}

#[rstest]
fn compiled_values_take_precedence_over_everything() {
    let sources = ConnectionSources {
        compiled: values(Some("postgres://built"), Some("built-key"), Some("built-pass")),
        environment: values(Some("postgres://env"), Some("env-key"), Some("env-pass")),
        launch: LaunchParameters::default(),
        persisted: SourceValues::default(),
    };

    let outcome = sources.resolve();

    assert_eq!(outcome.url, resolved("postgres://built", ConfigOrigin::Compiled));
    assert_eq!(
        outcome.admin_password,
        resolved("built-pass", ConfigOrigin::Compiled)
    );
}

#[rstest]
fn incomplete_configuration_yields_no_remote() {
    let sources = ConnectionSources {
        persisted: values(Some("postgres://saved"), None, None),
        ..ConnectionSources::default()
    };

    assert!(sources.resolve().remote().is_none());
}

#[rstest]
fn launch_parameters_are_read_and_stripped() {
    let mut address = parse_launch_address(
        "https://board.example/?view=week&sbUrl=postgres%3A%2F%2Fshared&sbKey=k1",
    )
    .expect("valid launch address");

    let parameters = LaunchParameters::from_address(&address);
    strip_launch_parameters(&mut address);

    assert_eq!(parameters.url.as_deref(), Some("postgres://shared"));
    assert_eq!(parameters.key.as_deref(), Some("k1"));
    assert_eq!(address.as_str(), "https://board.example/?view=week");
}

#[rstest]
fn stripping_the_only_parameters_removes_the_query() {
    let mut address = parse_launch_address("https://board.example/?sbUrl=x&sbKey=y")
        .expect("valid launch address");

    strip_launch_parameters(&mut address);

    assert_eq!(address.query(), None);
    assert!(LaunchParameters::from_address(&address).is_empty());
}

#[rstest]
fn invalid_launch_address_is_rejected() {
    assert!(matches!(
        parse_launch_address("not an address"),
        Err(ConnectionError::InvalidAddress(_))
    ));
}

#[rstest]
fn persisted_configuration_round_trips_and_clears() {
    let storage = MemoryStorage::new();
    let config = RemoteConfig::new("postgres://saved", "saved-key").expect("complete config");

    save_remote_config(&storage, &config).expect("config saved");
    let loaded = load_remote_config(&storage).expect("storage readable");
    clear_remote_config(&storage).expect("config cleared");

    assert_eq!(loaded, Some(config));
    assert_eq!(load_remote_config(&storage).expect("storage readable"), None);
}

#[rstest]
#[case("{broken")]
#[case(r#"{"url": "postgres://saved", "key": "  "}"#)]
fn malformed_persisted_configuration_is_ignored(#[case] stored: &str) {
    let storage = MemoryStorage::new();
    storage
        .save(REMOTE_CONFIG_KEY, stored)
        .expect("storage writable");

    assert_eq!(load_remote_config(&storage).expect("storage readable"), None);
}

#[rstest]
fn gather_reads_persisted_values_and_launch_address() {
    let storage = MemoryStorage::new();
    let config = RemoteConfig::new("postgres://saved", "saved-key").expect("complete config");
    save_remote_config(&storage, &config).expect("config saved");
    let address = parse_launch_address("https://board.example/?sbKey=launch-key")
        .expect("valid launch address");

    let sources = ConnectionSources::gather(&storage, Some(&address)).expect("sources gathered");

    assert_eq!(sources.persisted.url.as_deref(), Some("postgres://saved"));
    assert_eq!(sources.launch.key.as_deref(), Some("launch-key"));
    assert_eq!(sources.launch.url, None);
}
