//! `SentinelRegistry` — canonical error instances keyed by `(type_name, message)`.

use std::collections::HashMap;
use std::io;

use errwire_core::{ConfigError, Sentinel};

/// Origin type name the standard I/O sentinels are registered under.
pub const IO_ERROR_TYPE: &str = "std::io::Error";
/// Origin type name of the standard formatting sentinel.
pub const FMT_ERROR_TYPE: &str = "std::fmt::Error";

/// Lookup table from `(origin type name, message)` to a registered sentinel.
#[derive(Debug, Clone, Default)]
pub struct SentinelRegistry {
    /// type name → message → sentinel
    entries: HashMap<String, HashMap<String, Sentinel>>,
}

impl SentinelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting two sentinels with the same
    /// `(type_name, message)` pair.
    pub fn from_sentinels(sentinels: impl IntoIterator<Item = Sentinel>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for sentinel in sentinels {
            registry.insert(sentinel)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, sentinel: Sentinel) -> Result<(), ConfigError> {
        let message = sentinel.message();
        let by_message = self
            .entries
            .entry(sentinel.type_name().to_string())
            .or_default();
        if by_message.contains_key(&message) {
            return Err(ConfigError::DuplicateSentinel {
                type_name: sentinel.type_name().to_string(),
                message,
            });
        }
        by_message.insert(message, sentinel);
        Ok(())
    }

    /// Look up the sentinel registered for `(type_name, message)`.
    pub fn get(&self, type_name: &str, message: &str) -> Option<&Sentinel> {
        self.entries.get(type_name)?.get(message)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The standard library's canonical error instances.
///
/// Each call builds fresh instances. Build them once, register the result and
/// keep a clone of the `Vec` to compare identities against.
pub fn standard_sentinels() -> Vec<Sentinel> {
    let io_kinds = [
        io::ErrorKind::UnexpectedEof,
        io::ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied,
        io::ErrorKind::BrokenPipe,
        io::ErrorKind::TimedOut,
        io::ErrorKind::Interrupted,
        io::ErrorKind::WouldBlock,
        io::ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionRefused,
        io::ErrorKind::AlreadyExists,
    ];

    let mut out: Vec<Sentinel> = io_kinds
        .into_iter()
        .map(|kind| Sentinel::named(IO_ERROR_TYPE, io::Error::from(kind)))
        .collect();
    out.push(Sentinel::named(FMT_ERROR_TYPE, std::fmt::Error));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused by peer")]
    struct Refused;

    #[test]
    fn lookup_by_type_and_message() {
        let refused = Sentinel::new(Refused);
        let registry = SentinelRegistry::from_sentinels([refused.clone()]).unwrap();

        let found = registry.get(refused.type_name(), "connection refused by peer").unwrap();
        assert!(found.ptr_eq(&refused));
        assert!(registry.get(refused.type_name(), "other").is_none());
        assert!(registry.get("other::Type", "connection refused by peer").is_none());
    }

    #[test]
    fn duplicate_pair_is_config_error() {
        let err = SentinelRegistry::from_sentinels([Sentinel::new(Refused), Sentinel::new(Refused)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSentinel { ref message, .. }
            if message == "connection refused by peer"));
    }

    #[test]
    fn standard_set_has_distinct_keys() {
        let standard = standard_sentinels();
        let registry = SentinelRegistry::from_sentinels(standard.clone()).unwrap();
        assert_eq!(registry.len(), standard.len());

        let eof = &standard[0];
        assert_eq!(eof.type_name(), IO_ERROR_TYPE);
        assert!(registry.get(IO_ERROR_TYPE, &eof.message()).unwrap().ptr_eq(eof));
        assert!(registry.get(FMT_ERROR_TYPE, &std::fmt::Error.to_string()).is_some());
    }
}
