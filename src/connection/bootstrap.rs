//! Startup resolution of the remote connection.

use super::{
    ConfigOrigin, ConnectionError, ConnectionResult, SourceValues,
    config::non_blank,
    persisted::{load_admin_password, load_remote_config},
};
use crate::schedule::{
    ports::{KeyValueStorage, RemoteConfig},
    services::{ScheduleFacade, StorageMode},
};
use mockable::Clock;
use tracing::{info, warn};
use url::Url;

/// Launch query parameter carrying the remote backend address.
pub const LAUNCH_URL_PARAM: &str = "sbUrl";

/// Launch query parameter carrying the remote access credential.
pub const LAUNCH_KEY_PARAM: &str = "sbKey";

/// A value together with the source that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value.
    pub value: T,
    /// Where it came from.
    pub origin: ConfigOrigin,
}

impl<T> Resolved<T> {
    const fn new(value: T, origin: ConfigOrigin) -> Self {
        Self { value, origin }
    }
}

/// Remote settings carried by a launch address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParameters {
    /// Value of the `sbUrl` parameter.
    pub url: Option<String>,
    /// Value of the `sbKey` parameter.
    pub key: Option<String>,
}

impl LaunchParameters {
    /// Reads the launch parameters from an address without changing it.
    #[must_use]
    pub fn from_address(address: &Url) -> Self {
        let mut parameters = Self::default();
        for (name, value) in address.query_pairs() {
            let slot = match &*name {
                LAUNCH_URL_PARAM => &mut parameters.url,
                LAUNCH_KEY_PARAM => &mut parameters.key,
                _ => continue,
            };
            if slot.is_none() {
                *slot = non_blank(value.into_owned());
            }
        }
        parameters
    }

    /// Returns `true` when neither parameter is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.url.is_none() && self.key.is_none()
    }
}

/// Parses a launch address.
///
/// # Errors
///
/// Returns [`ConnectionError::InvalidAddress`] when `address` is not a
/// valid absolute URL.
pub fn parse_launch_address(address: &str) -> ConnectionResult<Url> {
    Url::parse(address).map_err(|err| ConnectionError::InvalidAddress(err.to_string()))
}

/// Removes the launch parameters from an address, keeping every other
/// query pair.
pub fn strip_launch_parameters(address: &mut Url) {
    let kept: Vec<(String, String)> = address
        .query_pairs()
        .filter(|(name, _)| name != LAUNCH_URL_PARAM && name != LAUNCH_KEY_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        address.set_query(None);
    } else {
        address.query_pairs_mut().clear().extend_pairs(kept);
    }
}

/// Every configuration source consulted at startup.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSources {
    /// Values captured at build time.
    pub compiled: SourceValues,
    /// Values from the process environment.
    pub environment: SourceValues,
    /// Values from the launch address.
    pub launch: LaunchParameters,
    /// Values saved by an earlier session.
    pub persisted: SourceValues,
}

impl ConnectionSources {
    /// Gathers every source: build-time values, the process environment,
    /// the launch address (if any) and local storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Storage`] when storage cannot be read.
    pub fn gather(
        storage: &impl KeyValueStorage,
        address: Option<&Url>,
    ) -> ConnectionResult<Self> {
        Ok(Self {
            compiled: SourceValues::compiled(),
            environment: SourceValues::from_env(),
            launch: address.map(LaunchParameters::from_address).unwrap_or_default(),
            persisted: persisted_values(storage)?,
        })
    }

    /// Resolves each field independently; the first non-empty source wins.
    #[must_use]
    pub fn resolve(&self) -> ResolvedConnection {
        let url = first_resolved([
            (self.compiled.url.as_ref(), ConfigOrigin::Compiled),
            (self.environment.url.as_ref(), ConfigOrigin::Environment),
            (self.launch.url.as_ref(), ConfigOrigin::LaunchParameters),
            (self.persisted.url.as_ref(), ConfigOrigin::Persisted),
        ]);
        let key = first_resolved([
            (self.compiled.key.as_ref(), ConfigOrigin::Compiled),
            (self.environment.key.as_ref(), ConfigOrigin::Environment),
            (self.launch.key.as_ref(), ConfigOrigin::LaunchParameters),
            (self.persisted.key.as_ref(), ConfigOrigin::Persisted),
        ]);
        let admin_password = first_resolved([
            (self.compiled.admin_password.as_ref(), ConfigOrigin::Compiled),
            (
                self.environment.admin_password.as_ref(),
                ConfigOrigin::Environment,
            ),
            (self.persisted.admin_password.as_ref(), ConfigOrigin::Persisted),
        ]);
        ResolvedConnection {
            url,
            key,
            admin_password,
        }
    }
}

/// Outcome of per-field resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConnection {
    /// Remote backend address.
    pub url: Option<Resolved<String>>,
    /// Remote access credential.
    pub key: Option<Resolved<String>>,
    /// Admin gate password.
    pub admin_password: Option<Resolved<String>>,
}

impl ResolvedConnection {
    /// Combines address and credential into a remote configuration. The
    /// address decides the origin of the pair.
    #[must_use]
    pub fn remote(&self) -> Option<Resolved<RemoteConfig>> {
        let (Some(url), Some(key)) = (&self.url, &self.key) else {
            return None;
        };
        RemoteConfig::new(url.value.as_str(), key.value.as_str())
            .map(|config| Resolved::new(config, url.origin))
    }
}

/// What startup resolution did.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Storage mode after startup.
    pub mode: StorageMode,
    /// Origin of the remote configuration that was tried, if any.
    pub origin: Option<ConfigOrigin>,
    /// Connection failure, if the remote backend could not be reached.
    pub error: Option<ConnectionError>,
    /// Everything resolution produced, for the admin gate and the UI.
    pub resolved: ResolvedConnection,
}

/// Resolves the startup configuration and activates remote mode when a
/// complete configuration is found.
///
/// A failed connection leaves the facade in local mode and is reported,
/// not returned. Launch parameters are stripped from `address` after the
/// attempt; a successful launch-parameter connection is persisted first.
pub async fn bootstrap<S, C>(
    facade: &ScheduleFacade<S, C>,
    sources: &ConnectionSources,
    address: Option<&mut Url>,
) -> BootstrapReport
where
    S: KeyValueStorage + 'static,
    C: Clock + Send + Sync + 'static,
{
    let resolved = sources.resolve();
    let remote = resolved.remote();
    let origin = remote.as_ref().map(|config| config.origin);

    let error = match remote {
        Some(Resolved {
            value: config,
            origin: source,
        }) => facade.activate(config, source).await.err().inspect(|err| {
            warn!(error = %err, origin = %source, "remote backend unavailable at startup, staying local");
        }),
        None => {
            info!("no remote configuration found, using local storage");
            None
        }
    };

    if let Some(launch_address) = address {
        strip_launch_parameters(launch_address);
    }

    BootstrapReport {
        mode: facade.mode(),
        origin,
        error,
        resolved,
    }
}

fn persisted_values(storage: &impl KeyValueStorage) -> ConnectionResult<SourceValues> {
    let remote = load_remote_config(storage)?;
    Ok(SourceValues {
        url: remote.as_ref().map(|config| config.url().to_owned()),
        key: remote.map(|config| config.key().to_owned()),
        admin_password: load_admin_password(storage)?,
    })
}

fn first_resolved<const N: usize>(
    candidates: [(Option<&String>, ConfigOrigin); N],
) -> Option<Resolved<String>> {
    candidates.into_iter().find_map(|(value, origin)| {
        value
            .filter(|text| !text.trim().is_empty())
            .map(|text| Resolved::new(text.clone(), origin))
    })
}
