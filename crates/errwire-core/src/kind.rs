//! `Kind` — the stable symbolic identifier of an error schema.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Opaque symbolic name of a [`Definition`](crate::Definition), e.g.
/// `"payments.card_declined"`.
///
/// Kinds are compared by string value. They are what travels on the wire and
/// what the [`Resolver`](crate::Resolver) keys its registry on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(Cow<'static, str>);

impl Kind {
    /// Create a kind from a static string. Usable in `const` contexts.
    pub const fn from_static(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }

    /// Create a kind from any owned or borrowed string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(Cow::Owned(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Kind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Kind {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for Kind {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for Kind {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Kind {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_and_owned_compare_equal() {
        const DECLINED: Kind = Kind::from_static("payments.declined");
        assert_eq!(DECLINED, Kind::new(String::from("payments.declined")));
        assert_eq!(DECLINED, "payments.declined");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Kind::from_static("io.timeout")).unwrap();
        assert_eq!(json, "\"io.timeout\"");
        let back: Kind = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), "io.timeout");
    }
}
