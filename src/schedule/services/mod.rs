//! Services composing the backends: the mode-selecting facade and the
//! change notification bridge.

mod facade;
mod notifications;
mod preferences;

pub use facade::{ScheduleFacade, StorageMode};
pub use notifications::Subscription;
pub use preferences::{DISPLAY_PREFERENCES_KEY, DisplayPreferences};
