//! Change notification bridge behaviour.

use super::helpers::{Harness, REMOTE_KEY, REMOTE_URL, harness};
use planboard::schedule::ports::ScheduleStore;
use rstest::rstest;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn local_subscription_never_fires(harness: Harness) {
    let (count, callback) = counter();

    let subscription = harness.facade.subscribe(callback).await.expect("subscribed");
    harness
        .facade
        .add_project("Quiet")
        .await
        .expect("project created");

    assert!(!subscription.is_active());
    assert_eq!(count.load(Ordering::SeqCst), 0);
    subscription.unsubscribe();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remote_writes_notify_subscribers(harness: Harness) {
    harness
        .facade
        .init_remote(REMOTE_URL, REMOTE_KEY)
        .await
        .expect("remote mode activated");
    let (count, callback) = counter();

    let subscription = harness.facade.subscribe(callback).await.expect("subscribed");
    harness
        .facade
        .add_project("Shared")
        .await
        .expect("project created");

    assert!(subscription.is_active());
    assert!(count.load(Ordering::SeqCst) >= 1);
    subscription.unsubscribe();
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_releases_the_channel(harness: Harness) {
    harness
        .facade
        .init_remote(REMOTE_URL, REMOTE_KEY)
        .await
        .expect("remote mode activated");
    let (count, callback) = counter();
    let subscription = harness.facade.subscribe(callback).await.expect("subscribed");
    assert_eq!(harness.backend.listener_count(), 1);

    subscription.unsubscribe();
    harness
        .facade
        .add_project("Unheard")
        .await
        .expect("project created");

    assert_eq!(harness.backend.listener_count(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_subscription_opens_its_own_channel(harness: Harness) {
    harness
        .facade
        .init_remote(REMOTE_URL, REMOTE_KEY)
        .await
        .expect("remote mode activated");
    let (first_count, first_callback) = counter();
    let (second_count, second_callback) = counter();

    let first = harness.facade.subscribe(first_callback).await.expect("subscribed");
    let second = harness.facade.subscribe(second_callback).await.expect("subscribed");
    assert_eq!(harness.backend.listener_count(), 2);

    first.unsubscribe();
    harness
        .facade
        .add_project("Shared")
        .await
        .expect("project created");

    assert_eq!(first_count.load(Ordering::SeqCst), 0);
    assert!(second_count.load(Ordering::SeqCst) >= 1);
    drop(second);
    assert_eq!(harness.backend.listener_count(), 0);
}
