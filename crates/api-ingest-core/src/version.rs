//! Dotted version strings.
//!
//! Accepted forms are `MAJOR`, `MAJOR.MINOR` and `MAJOR.MINOR.PATCH`, each
//! optionally prefixed by a single `v` or `V`. Missing components default
//! to `0`. There is no pre-release or build-metadata concept.
//!
//! ```rust
//! use api_ingest_core::version::Version;
//!
//! let v = Version::parse("v1.2").unwrap();
//! assert_eq!(v, Version::new(1, 2, 0));
//! assert_eq!(v.to_string(), "1.2.0");
//! assert!(Version::new(1, 9, 0) < Version::new(2, 0, 0));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IngestError, Result};

/// Immutable `(major, minor, patch)` triple.
///
/// Field order matters: the derived `Ord` compares lexicographically on
/// `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?$").expect("version regex is valid")
    })
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// [`IngestError::InvalidVersion`] when the input is blank, has more
    /// than three components, contains anything but ASCII digits and dots
    /// (after the optional `v`), or a component does not fit in `u64`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IngestError::InvalidVersion(
                "version string cannot be empty".to_string(),
            ));
        }

        let body = match trimmed.as_bytes()[0] {
            b'v' | b'V' => &trimmed[1..],
            _ => trimmed,
        };

        let caps = version_pattern()
            .captures(body)
            .ok_or_else(|| IngestError::InvalidVersion(body.to_string()))?;

        let component = |idx: usize| -> Result<u64> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| IngestError::InvalidVersion(body.to_string())),
                None => Ok(0),
            }
        };

        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }

    pub fn as_tuple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    pub fn increment_major(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    pub fn increment_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn increment_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl Default for Version {
    /// `1.0.0`, the version assumed when a source declares none.
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_partial_forms() {
        assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("v1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(Version::parse("V7").unwrap(), Version::new(7, 0, 0));
        assert_eq!(Version::parse("1").unwrap(), Version::new(1, 0, 0));
        assert_eq!(Version::parse("  2.0.1 ").unwrap(), Version::new(2, 0, 1));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "v", "1.2.3.4", "1.x", "1..2", "vv1", "1.2-beta", ".1", "1."] {
            assert!(
                matches!(Version::parse(bad), Err(IngestError::InvalidVersion(_))),
                "expected {:?} to fail",
                bad
            );
        }
    }

    #[test]
    fn rejects_overflowing_component() {
        assert!(Version::parse("99999999999999999999999").is_err());
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(Version::new(1, 9, 0) < Version::new(2, 0, 0));
        assert!(Version::new(1, 2, 10) > Version::new(1, 2, 9));
        assert!(Version::new(0, 10, 0) > Version::new(0, 9, 99));
    }

    #[test]
    fn increments_reset_lower_components() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.increment_major(), Version::new(2, 0, 0));
        assert_eq!(v.increment_minor(), Version::new(1, 3, 0));
        assert_eq!(v.increment_patch(), Version::new(1, 2, 4));
        assert_eq!(v, Version::new(1, 2, 3));
    }

    #[test]
    fn serializes_as_canonical_string() {
        let json = serde_json::to_string(&Version::parse("v3").unwrap()).unwrap();
        assert_eq!(json, "\"3.0.0\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Version::new(3, 0, 0));
    }
}
