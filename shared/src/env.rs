//! Point-in-time snapshot of the process environment.

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;

use crate::error::ConfigurationError;

/// Environment variables captured once at cold start.
///
/// Resolution reads only from a snapshot, never from the live process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
    /// Variables whose value is not valid UTF-8.
    non_utf8: BTreeSet<String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Never panics on non-UTF-8 data: entries with such names are skipped,
    /// and such values are remembered so [`EnvSnapshot::require_utf8`] can
    /// report them.
    pub fn capture() -> Self {
        Self::from_os_pairs(std::env::vars_os())
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            non_utf8: BTreeSet::new(),
        }
    }

    /// Build a snapshot from raw OS strings.
    pub fn from_os_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut snapshot = Self::default();
        for (name, value) in pairs {
            let Ok(name) = name.into_string() else {
                continue;
            };
            match value.into_string() {
                Ok(value) => {
                    snapshot.vars.insert(name, value);
                }
                Err(_) => {
                    snapshot.non_utf8.insert(name);
                }
            }
        }
        snapshot
    }

    /// Look up a variable. Empty and whitespace-only values count as unset,
    /// as do values that are not valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Whether a variable is set to a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fail on the first of `names` whose value is not valid UTF-8.
    pub fn require_utf8(&self, names: &[&'static str]) -> Result<(), ConfigurationError> {
        match names.iter().find(|name| self.non_utf8.contains(**name)) {
            Some(name) => Err(ConfigurationError::InvalidValue {
                variable: *name,
                value: "<non-UTF-8 bytes>".to_string(),
                reason: "value is not valid UTF-8".to_string(),
            }),
            None => Ok(()),
        }
    }
}
