//! Push-change channel over `LISTEN`/`NOTIFY`.
//!
//! Each subscription owns a dedicated connection outside the pool. The
//! provisioning triggers publish the changed table's name on
//! [`CHANGE_CHANNEL`]; the payload is logged and otherwise ignored.

use super::client::backend_error;
use crate::schedule::{
    adapters::remote::provisioning::CHANGE_CHANNEL,
    ports::{BackendError, BackendResult, ChangeListener},
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::interval;
use tracing::{debug, warn};

/// How often the dedicated connection is checked for notifications.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Background task relaying notifications to one listener.
pub(super) struct ChangeListenerTask {
    shutdown: oneshot::Sender<()>,
}

impl ChangeListenerTask {
    /// Opens the dedicated connection, issues `LISTEN` and starts polling.
    pub(super) async fn start(database_url: String, listener: ChangeListener) -> BackendResult<Self> {
        let connection = tokio::task::spawn_blocking(move || open_listener(&database_url))
            .await
            .map_err(BackendError::transport)??;
        let (shutdown, stopped) = oneshot::channel();
        tokio::spawn(relay_notifications(
            connection,
            listener,
            stopped,
            drain_notifications,
            unlisten,
        ));
        Ok(Self { shutdown })
    }

    /// Stops polling; the task issues `UNLISTEN` and closes its connection.
    pub(super) fn stop(self) {
        if self.shutdown.send(()).is_err() {
            debug!("change listener already stopped");
        }
    }
}

fn open_listener(database_url: &str) -> BackendResult<PgConnection> {
    let mut connection =
        PgConnection::establish(database_url).map_err(BackendError::transport)?;
    diesel::sql_query(format!("LISTEN {CHANGE_CHANNEL}"))
        .execute(&mut connection)
        .map_err(backend_error)?;
    Ok(connection)
}

/// Polls `source` on the blocking pool until `stopped` fires or a poll
/// fails, then closes it on the blocking pool too.
async fn relay_notifications<T, E, P, Q>(
    source: T,
    listener: ChangeListener,
    mut stopped: oneshot::Receiver<()>,
    poll: P,
    close: Q,
) where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
    P: Fn(T, &ChangeListener) -> (T, Result<(), E>) + Clone + Send + 'static,
    Q: FnOnce(T) + Send + 'static,
{
    let mut ticker = interval(POLL_INTERVAL);
    let mut idle = Some(source);
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = ticker.tick() => {
                let Some(polled) = idle.take() else { break };
                let poll_once = poll.clone();
                let poll_listener = Arc::clone(&listener);
                let outcome =
                    tokio::task::spawn_blocking(move || poll_once(polled, &poll_listener)).await;
                match outcome {
                    Ok((returned, Ok(()))) => idle = Some(returned),
                    Ok((_, Err(err))) => {
                        warn!(error = %err, "change listener connection failed");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "change listener poll aborted");
                        break;
                    }
                }
            }
        }
    }

    let Some(open) = idle else { return };
    if let Err(err) = tokio::task::spawn_blocking(move || close(open)).await {
        debug!(error = %err, "change listener shutdown aborted");
    }
}

/// Delivers every pending notification, handing the connection back for
/// the next poll.
fn drain_notifications(
    mut connection: PgConnection,
    listener: &ChangeListener,
) -> (PgConnection, QueryResult<()>) {
    let mut outcome = Ok(());
    for received in connection.notifications_iter() {
        match received {
            Ok(notification) => {
                debug!(table = %notification.payload, "remote change notified");
                listener();
            }
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }
    (connection, outcome)
}

fn unlisten(mut connection: PgConnection) {
    if let Err(err) =
        diesel::sql_query(format!("UNLISTEN {CHANGE_CHANNEL}")).execute(&mut connection)
    {
        debug!(error = %err, "UNLISTEN failed while closing change listener");
    }
}
