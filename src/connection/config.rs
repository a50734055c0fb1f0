//! Configuration sources and their precedence.

use std::fmt;

/// Variables naming the remote backend address, in precedence order.
pub const URL_VARIABLES: [&str; 2] = ["SUPABASE_URL", "VITE_SUPABASE_URL"];

/// Variables naming the remote access credential, in precedence order.
pub const KEY_VARIABLES: [&str; 2] = ["SUPABASE_KEY", "VITE_SUPABASE_KEY"];

/// Variables naming the admin gate password, in precedence order.
pub const ADMIN_PASSWORD_VARIABLES: [&str; 2] = ["ADMIN_PASSWORD", "VITE_ADMIN_PASSWORD"];

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigOrigin {
    /// Captured at build time.
    Compiled,
    /// Read from the process environment.
    Environment,
    /// Consumed from the launch address.
    LaunchParameters,
    /// Saved by an earlier session.
    Persisted,
    /// Entered through [`ScheduleFacade::init_remote`].
    ///
    /// [`ScheduleFacade::init_remote`]: crate::schedule::services::ScheduleFacade::init_remote
    Interactive,
}

impl ConfigOrigin {
    /// Returns `true` for sources users cannot override or clear.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Compiled | Self::Environment)
    }

    /// Returns `true` when a successful connection from this source should
    /// be saved for later sessions.
    #[must_use]
    pub const fn is_persistable(self) -> bool {
        matches!(
            self,
            Self::LaunchParameters | Self::Persisted | Self::Interactive
        )
    }

    /// Returns a short label for logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compiled => "compiled-in",
            Self::Environment => "environment",
            Self::LaunchParameters => "launch parameter",
            Self::Persisted => "persisted",
            Self::Interactive => "interactive",
        }
    }
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values offered by one fixed source. Blank values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SourceValues {
    /// Remote backend address.
    pub url: Option<String>,
    /// Remote access credential.
    pub key: Option<String>,
    /// Admin gate password.
    pub admin_password: Option<String>,
}

impl SourceValues {
    /// Values captured when the crate was built.
    #[must_use]
    pub fn compiled() -> Self {
        Self {
            url: first_present([option_env!("SUPABASE_URL"), option_env!("VITE_SUPABASE_URL")]),
            key: first_present([option_env!("SUPABASE_KEY"), option_env!("VITE_SUPABASE_KEY")]),
            admin_password: first_present([
                option_env!("ADMIN_PASSWORD"),
                option_env!("VITE_ADMIN_PASSWORD"),
            ]),
        }
    }

    /// Values from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Values from an arbitrary variable lookup. The plain name wins over
    /// the `VITE_`-prefixed one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let resolve = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|name| lookup(name).and_then(non_blank))
        };
        Self {
            url: resolve(URL_VARIABLES),
            key: resolve(KEY_VARIABLES),
            admin_password: resolve(ADMIN_PASSWORD_VARIABLES),
        }
    }

    /// Returns `true` when no value is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.url.is_none() && self.key.is_none() && self.admin_password.is_none()
    }
}

impl fmt::Debug for SourceValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceValues")
            .field("url", &self.url)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn first_present(values: [Option<&str>; 2]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .find_map(|value| non_blank(value.to_owned()))
}

/// Returns the trimmed value, or `None` when it is blank.
pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
