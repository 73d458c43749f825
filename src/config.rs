//! Database connection settings.
//!
//! Credentials are sourced from the environment (merged with a `.env` file by
//! the CLI before this module is consulted) and collected into an explicit
//! [`DbConfig`] struct once at startup. Nothing else in the crate reads the
//! environment — the connection layer receives plain values.
//!
//! ## Variables
//!
//! | Variable | Default |
//! |---|---|
//! | `DB_HOST` | `localhost` |
//! | `DB_PORT` | `3306` |
//! | `DB_USERNAME` | `user` |
//! | `DB_PASSWORD` | `password` |
//! | `DB_PREFIX` | *(empty — unprefixed Magento tables)* |
//!
//! The database *name* is not an environment variable; it is a required CLI
//! argument, since one set of credentials commonly serves several project
//! databases.

/// MySQL connection settings, minus the database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Table-name prefix configured at Magento install time (often empty).
    pub prefix: String,
}

impl DbConfig {
    /// Build the configuration from process environment variables, falling
    /// back to the documented default for each variable independently.
    ///
    /// An unparsable `DB_PORT` falls back to the default port rather than
    /// aborting; a wrong port surfaces immediately as a connection error.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: lookup("DB_PORT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(3306),
            username: lookup("DB_USERNAME").unwrap_or_else(|| "user".into()),
            password: lookup("DB_PASSWORD").unwrap_or_else(|| "password".into()),
            prefix: lookup("DB_PREFIX").unwrap_or_default(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = DbConfig::default();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3306);
        assert_eq!(config.username, "user");
        assert_eq!(config.password, "password");
        assert_eq!(config.prefix, "");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "33060"),
            ("DB_USERNAME", "magento"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_PREFIX", "mg_"),
        ]));

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 33060);
        assert_eq!(config.username, "magento");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.prefix, "mg_");
    }

    #[test]
    fn each_variable_falls_back_independently() {
        let config = DbConfig::from_lookup(lookup_from(&[("DB_HOST", "db.internal")]));

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.username, "user");
    }

    #[test]
    fn unparsable_port_falls_back_to_default() {
        let config = DbConfig::from_lookup(lookup_from(&[("DB_PORT", "not-a-port")]));
        assert_eq!(config.port, 3306);
    }
}
