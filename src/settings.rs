//! Manager connection settings persisted across sessions.
//!
//! Three string preferences (host, port, path prefix) live in the platform's
//! durable key-value storage: a settings file on native builds, origin-scoped
//! localStorage on the web. Missing keys resolve to documented defaults, so
//! loading never fails. Saving strips all whitespace from host and prefix but
//! writes the port verbatim; no well-formedness validation happens here —
//! validation, if any, is the consumer's job at the point of use.

use crate::constants;

/// The persisted manager connection triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Manager host name or address.
    pub host: String,
    /// Manager port, kept as the string the user typed.
    pub port: String,
    /// URL path prefix under which the manager is mounted.
    pub prefix: String,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_MANAGER_HOST.to_owned(),
            port: constants::DEFAULT_MANAGER_PORT.to_owned(),
            prefix: constants::DEFAULT_MANAGER_PREFIX.to_owned(),
        }
    }
}

impl ManagerSettings {
    /// Reads the three settings keys, substituting the default for each key
    /// that was never saved.
    pub fn load(storage: &dyn eframe::Storage) -> Self {
        let read = |key: &str, default: &str| {
            storage
                .get_string(key)
                .unwrap_or_else(|| default.to_owned())
        };
        Self {
            host: read(constants::STORAGE_KEY_HOST, constants::DEFAULT_MANAGER_HOST),
            port: read(constants::STORAGE_KEY_PORT, constants::DEFAULT_MANAGER_PORT),
            prefix: read(
                constants::STORAGE_KEY_PREFIX,
                constants::DEFAULT_MANAGER_PREFIX,
            ),
        }
    }

    /// Writes all three values, overwriting unconditionally. Host and prefix
    /// are stripped of all whitespace first; the port is stored verbatim.
    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        let host = strip_whitespace(&self.host);
        let prefix = strip_whitespace(&self.prefix);
        log::info!("host set to '{}'", host);
        log::info!("port set to '{}'", self.port);
        storage.set_string(constants::STORAGE_KEY_HOST, host);
        storage.set_string(constants::STORAGE_KEY_PORT, self.port.clone());
        storage.set_string(constants::STORAGE_KEY_PREFIX, prefix);
        storage.flush();
    }

    /// Base URL of the manager built from the stored triple,
    /// e.g. `http://localhost:8001` or `http://host:port/prefix`.
    pub fn manager_url(&self) -> String {
        let mut url = format!("http://{}:{}", self.host, self.port);
        let prefix = self.prefix.trim_matches('/');
        if !prefix.is_empty() {
            url.push('/');
            url.push_str(prefix);
        }
        url
    }
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory stand-in for the platform key-value storage.
    #[derive(Default)]
    struct MemStorage(HashMap<String, String>);

    impl eframe::Storage for MemStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_owned(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn load_returns_defaults_when_nothing_was_ever_saved() {
        let storage = MemStorage::default();
        let settings = ManagerSettings::load(&storage);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, "8001");
        assert_eq!(settings.prefix, "");
    }

    #[test]
    fn load_fills_only_the_missing_keys_with_defaults() {
        let mut storage = MemStorage::default();
        storage
            .0
            .insert("manager_host".to_owned(), "cluster17".to_owned());
        let settings = ManagerSettings::load(&storage);
        assert_eq!(settings.host, "cluster17");
        assert_eq!(settings.port, "8001");
        assert_eq!(settings.prefix, "");
    }

    #[test]
    fn save_strips_whitespace_from_host_and_prefix_but_not_port() {
        let mut storage = MemStorage::default();
        ManagerSettings {
            host: "  my host ".to_owned(),
            port: " 9000 ".to_owned(),
            prefix: " pre ".to_owned(),
        }
        .save(&mut storage);

        let settings = ManagerSettings::load(&storage);
        assert_eq!(settings.host, "myhost");
        assert_eq!(settings.port, " 9000 ");
        assert_eq!(settings.prefix, "pre");
    }

    #[test]
    fn save_overwrites_previous_values_unconditionally() {
        let mut storage = MemStorage::default();
        ManagerSettings {
            host: "first".to_owned(),
            port: "1".to_owned(),
            prefix: "a".to_owned(),
        }
        .save(&mut storage);
        ManagerSettings {
            host: "second".to_owned(),
            port: "2".to_owned(),
            prefix: "".to_owned(),
        }
        .save(&mut storage);

        let settings = ManagerSettings::load(&storage);
        assert_eq!(settings.host, "second");
        assert_eq!(settings.port, "2");
        assert_eq!(settings.prefix, "");
    }

    #[test]
    fn manager_url_joins_host_port_and_optional_prefix() {
        let mut settings = ManagerSettings::default();
        assert_eq!(settings.manager_url(), "http://localhost:8001");

        settings.prefix = "/dlg/mgr/".to_owned();
        assert_eq!(settings.manager_url(), "http://localhost:8001/dlg/mgr");
    }
}
