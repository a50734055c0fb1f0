//! Change notification bridge.

use crate::schedule::ports::ChangeChannel;

/// Handle on one change subscription.
///
/// In local mode the subscription is inert: its callback never fires.
/// Unsubscribing, or dropping the handle, releases the remote channel.
#[derive(Debug)]
#[must_use = "dropping a subscription releases its channel"]
pub struct Subscription {
    channel: Option<ChangeChannel>,
}

impl Subscription {
    /// Returns a subscription that never fires.
    pub const fn inactive() -> Self {
        Self { channel: None }
    }

    pub(crate) const fn remote(channel: ChangeChannel) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// Returns `true` when a remote channel is open.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.channel.is_some()
    }

    /// Releases the channel.
    pub fn unsubscribe(self) {
        if let Some(channel) = self.channel {
            channel.close();
        }
    }
}
