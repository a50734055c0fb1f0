//! Shared display preferences in both modes.

use super::helpers::{Harness, REMOTE_KEY, REMOTE_URL, harness};
use planboard::schedule::{
    ports::ScheduleStore,
    services::{DISPLAY_PREFERENCES_KEY, DisplayPreferences},
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_preferences_yield_defaults(harness: Harness) {
    let preferences = harness
        .facade
        .display_preferences()
        .await
        .expect("preferences read");

    assert_eq!(preferences, DisplayPreferences::default());
    assert_eq!(preferences.column_width, 40);
}

#[rstest]
#[case::local(false)]
#[case::remote(true)]
#[tokio::test(flavor = "multi_thread")]
async fn stored_preferences_read_back(harness: Harness, #[case] remote: bool) {
    if remote {
        harness
            .facade
            .init_remote(REMOTE_URL, REMOTE_KEY)
            .await
            .expect("remote mode activated");
    }
    let wide = DisplayPreferences {
        column_width: 64,
        font_size: 12,
    };

    harness
        .facade
        .set_display_preferences(wide)
        .await
        .expect("preferences stored");

    assert_eq!(
        harness.facade.display_preferences().await.expect("preferences read"),
        wide
    );
    let raw = harness
        .facade
        .get_setting(DISPLAY_PREFERENCES_KEY)
        .await
        .expect("setting read");
    assert_eq!(raw, Some(json!({ "columnWidth": 64, "fontSize": 12 })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_preferences_fill_in_defaults(harness: Harness) {
    harness
        .facade
        .put_setting(DISPLAY_PREFERENCES_KEY, &json!({ "fontSize": 18 }))
        .await
        .expect("setting stored");

    let preferences = harness
        .facade
        .display_preferences()
        .await
        .expect("preferences read");

    assert_eq!(preferences.font_size, 18);
    assert_eq!(preferences.column_width, 40);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_preferences_yield_defaults(harness: Harness) {
    harness
        .facade
        .put_setting(DISPLAY_PREFERENCES_KEY, &json!("wide please"))
        .await
        .expect("setting stored");

    let preferences = harness
        .facade
        .display_preferences()
        .await
        .expect("preferences read");

    assert_eq!(preferences, DisplayPreferences::default());
}
