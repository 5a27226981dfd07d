use crate::error::VersionParseError;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;
use serde::{Serialize, Serializer};

/// Dotted numeric migration version.
///
/// Segments compare numerically, so `1.10` sorts after `1.2`. Trailing zero
/// segments carry no weight: `1`, `1.0` and `1.0.0` are the same version.
/// `_` is accepted as a separator so file names can avoid dots.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    segments: Vec<u64>,
}

impl Version {
    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        if raw.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut segments = Vec::new();
        for segment in raw.split(['.', '_']) {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
                return Err(VersionParseError::InvalidSegment {
                    version: raw.to_string(),
                    segment: segment.to_string(),
                });
            }

            let value: u64 = segment.parse().map_err(|_| VersionParseError::SegmentOverflow {
                version: raw.to_string(),
                segment: segment.to_string(),
            })?;
            segments.push(value);
        }

        while segments.last() == Some(&0) {
            segments.pop();
        }

        Ok(Self {
            text: raw.replace('_', "."),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec<u64> ordering is lexicographic over numbers, and a shorter
        // prefix sorts first, which is what trailing-zero stripping relies on.
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::Version;
    use crate::error::VersionParseError;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn compares_segments_numerically() {
        assert!(v("1.10") > v("1.2"));
        assert!(v("2") > v("1.99.99"));
        assert!(v("1.2.1") > v("1.2"));
        assert!(v("10") > v("9"));
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(v("1.0.0"), v("1"));
        assert_ne!(v("1.0.1"), v("1"));
    }

    #[test]
    fn underscores_become_dots() {
        let version = v("1_2_3");
        assert_eq!(version.as_str(), "1.2.3");
        assert_eq!(version, v("1.2.3"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(Version::parse(""), Err(VersionParseError::Empty));
        assert!(matches!(
            Version::parse("1..2"),
            Err(VersionParseError::InvalidSegment { .. })
        ));
        assert!(matches!(
            Version::parse("1.a"),
            Err(VersionParseError::InvalidSegment { .. })
        ));
        assert!(matches!(
            Version::parse("99999999999999999999999"),
            Err(VersionParseError::SegmentOverflow { .. })
        ));
    }
}
