use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use got_domain::{load_registrations, RemoteConfig, REGISTRATION_VERSION};
use tracing::debug;

use super::cache::LocalCache;
use super::caching::CachingStore;
use super::transport::{connect_transport, TransportOptions};
use crate::errors::GotError;

pub(crate) const NOT_INITIALIZED: &str = "Got not initialized";

/// Every configured store of one repository; the default comes first.
#[derive(Debug)]
pub struct Registry {
    stores: Vec<CachingStore>,
}

impl Registry {
    /// Reads `.got/` under `root` and builds a store per registration.
    pub fn load(
        root: &Path,
        cache: Option<&LocalCache>,
        options: &TransportOptions,
    ) -> Result<Self> {
        let configs = load_registrations(root)?;
        Ok(Self::from_configs(configs, cache, options)?)
    }

    pub fn from_configs(
        configs: Vec<RemoteConfig>,
        cache: Option<&LocalCache>,
        options: &TransportOptions,
    ) -> Result<Self, GotError> {
        let mut seen = HashSet::new();
        for config in &configs {
            if !seen.insert(config.name.as_str()) {
                return Err(GotError::configuration(format!(
                    "Duplicate remote name '{}'",
                    config.name
                )));
            }
        }
        match configs.iter().filter(|config| config.is_default).count() {
            0 => return Err(GotError::configuration(NOT_INITIALIZED)),
            1 => {}
            _ => {
                return Err(GotError::configuration(
                    "More than one remote is marked as default",
                ))
            }
        }

        let mut stores = Vec::with_capacity(configs.len());
        for config in configs {
            debug!(name = %config.name, remote_type = %config.remote_type, "registering remote");
            let transport = connect_transport(&config, options)?;
            stores.push(CachingStore::new(config, transport, cache.cloned()));
        }
        stores.sort_by_key(|store| !store.config().is_default);
        Ok(Self { stores })
    }

    pub fn default_store(&self) -> &CachingStore {
        &self.stores[0]
    }

    pub fn get(&self, name: &str) -> Option<&CachingStore> {
        self.stores.iter().find(|store| store.name() == name)
    }

    /// Named store, or the default when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<&CachingStore, GotError> {
        match name {
            None => Ok(self.default_store()),
            Some(name) => self.get(name).ok_or_else(|| {
                GotError::configuration(format!("Remote named '{name}' does not exist"))
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachingStore> {
        self.stores.iter()
    }
}

/// Registrations written by another schema version must be upgraded first.
pub fn ensure_supported_versions(configs: &[RemoteConfig]) -> Result<(), GotError> {
    match configs
        .iter()
        .find(|config| config.version != REGISTRATION_VERSION)
    {
        Some(config) => Err(GotError::VersionMismatch {
            name: config.name.clone(),
            found: config.version,
            supported: REGISTRATION_VERSION,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use got_domain::RemoteType;

    fn remote(name: &str, is_default: bool) -> RemoteConfig {
        RemoteConfig::new(name, RemoteType::File, format!("file:///srv/{name}"), is_default)
    }

    #[test]
    fn default_store_comes_first_and_names_resolve() -> Result<()> {
        let registry = Registry::from_configs(
            vec![remote("backup", false), remote("origin", true)],
            None,
            &TransportOptions::default(),
        )?;
        assert_eq!(registry.default_store().name(), "origin");
        assert_eq!(registry.resolve(None)?.name(), "origin");
        assert_eq!(registry.resolve(Some("backup"))?.name(), "backup");
        let err = registry.resolve(Some("missing")).unwrap_err();
        assert_eq!(err.to_string(), "Remote named 'missing' does not exist");
        Ok(())
    }

    #[test]
    fn exactly_one_default_is_required() {
        let options = TransportOptions::default();
        let none = Registry::from_configs(vec![remote("a", false)], None, &options).unwrap_err();
        assert_eq!(none.to_string(), NOT_INITIALIZED);
        let two = vec![remote("a", true), remote("b", true)];
        assert!(Registry::from_configs(two, None, &options).is_err());
        let dup = vec![remote("a", true), remote("a", false)];
        let err = Registry::from_configs(dup, None, &options).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn scheme_mismatch_is_a_configuration_error() {
        let bad = RemoteConfig::new("origin", RemoteType::Srr, "ftp://host/dir", true);
        let err = Registry::from_configs(vec![bad], None, &TransportOptions::default())
            .unwrap_err();
        assert_eq!(err.reason(), "configuration");
    }

    #[test]
    fn other_versions_need_an_upgrade() {
        let mut old = remote("origin", true);
        assert!(ensure_supported_versions(std::slice::from_ref(&old)).is_ok());
        old.version = 0;
        let err = ensure_supported_versions(&[old]).unwrap_err();
        assert_eq!(err.reason(), "version_mismatch");
    }
}
