use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Generate a fresh correlation id (ULID string).
///
/// The dispatcher never interprets correlation ids; this is a convenience for
/// callers starting a new business chain.
#[must_use]
pub fn generate_correlation_id() -> String {
    CorrelationId::new().to_string()
}

/// ULID-backed correlation identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct CorrelationId(pub ulid::Ulid);

impl CorrelationId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Parse an incoming id; if absent or not a ULID, generate a new one.
    #[must_use]
    pub fn parse_or_new(value: Option<&str>) -> Self {
        value
            .and_then(|s| s.parse::<CorrelationId>().ok())
            .unwrap_or_default()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(CorrelationId(id))
    }
}

impl Serialize for CorrelationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CorrelationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<CorrelationId>()
            .map_err(|_| serde::de::Error::custom("invalid correlation id"))
    }
}
