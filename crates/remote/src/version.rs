use serde::{Deserialize, Serialize};
use std::fmt;

/// Oldest protocol version the client still talks to.
pub const MINIMUM_SUPPORTED: (u32, u32) = (10, 0);

/// A server-reported protocol version.
///
/// Parsing is total: an empty or unparseable string yields a "hidden"
/// version (the operator deliberately conceals it), never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVersion {
    major: u32,
    minor: u32,
    micro: u32,
    raw: String,
    hidden: bool,
}

impl ServerVersion {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.trim().split('.');
        let major = parts.next().and_then(|p| p.parse::<u32>().ok());
        let minor = parts.next().and_then(|p| p.parse::<u32>().ok());
        let micro = parts.next().and_then(|p| p.parse::<u32>().ok());
        match major {
            Some(major) => Self {
                major,
                minor: minor.unwrap_or(0),
                micro: micro.unwrap_or(0),
                raw: raw.trim().to_string(),
                hidden: false,
            },
            None => Self::hidden(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            major: 0,
            minor: 0,
            micro: 0,
            raw: String::new(),
            hidden: true,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether this version meets the supported floor. A hidden version is
    /// supported-but-unverified: rejecting it outright is the caller's
    /// decision, not this policy's.
    pub fn is_supported(&self) -> bool {
        if self.hidden {
            return true;
        }
        (self.major, self.minor) >= MINIMUM_SUPPORTED
    }
}

impl From<&str> for ServerVersion {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hidden {
            write!(f, "hidden")
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_version() {
        let v = ServerVersion::parse("10.3.2");
        assert!(!v.is_hidden());
        assert!(v.is_supported());
        assert_eq!(v.to_string(), "10.3.2");
    }

    #[test]
    fn four_part_version_keeps_raw_string() {
        let v = ServerVersion::parse("10.3.2.1");
        assert!(v.is_supported());
        assert_eq!(v.to_string(), "10.3.2.1");
    }

    #[test]
    fn below_floor_is_unsupported() {
        assert!(!ServerVersion::parse("9.0.0").is_supported());
        assert!(!ServerVersion::parse("9.8.15").is_supported());
    }

    #[test]
    fn floor_itself_is_supported() {
        assert!(ServerVersion::parse("10.0.0").is_supported());
    }

    #[test]
    fn empty_string_is_hidden_and_supported() {
        let v = ServerVersion::parse("");
        assert!(v.is_hidden());
        assert!(v.is_supported());
        assert_eq!(v.to_string(), "hidden");
    }

    #[test]
    fn garbage_is_hidden_not_an_error() {
        assert!(ServerVersion::parse("not-a-version").is_hidden());
        assert!(ServerVersion::parse("..").is_hidden());
    }

    #[test]
    fn missing_minor_defaults_to_zero() {
        let v = ServerVersion::parse("11");
        assert!(!v.is_hidden());
        assert!(v.is_supported());
    }
}
