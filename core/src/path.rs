//! Document and collection addressing.
//!
//! Paths alternate collection names and document ids:
//! `events/2025-06-10/slots/09:00/seats/{seatId}`.
//!
//! - A [`CollectionPath`] has an odd number of segments.
//! - A [`DocPath`] has an even number of segments.
//!
//! Segments are non-empty and never contain `/`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for path parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid path '{path}': {reason}")]
pub struct ParsePathError {
    path: String,
    reason: &'static str,
}

impl ParsePathError {
    const fn new(path: String, reason: &'static str) -> Self {
        Self { path, reason }
    }
}

fn validate(path: &str, want_even: bool) -> Result<(), ParsePathError> {
    if path.is_empty() {
        return Err(ParsePathError::new(path.to_string(), "path cannot be empty"));
    }
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ParsePathError::new(
            path.to_string(),
            "path segments cannot be empty",
        ));
    }
    if (segments.len() % 2 == 0) != want_even {
        return Err(ParsePathError::new(
            path.to_string(),
            if want_even {
                "document paths need an even number of segments"
            } else {
                "collection paths need an odd number of segments"
            },
        ));
    }
    Ok(())
}

/// Returns `true` if `id` can be used as a single path segment.
#[must_use]
pub fn is_valid_segment(id: &str) -> bool {
    !id.is_empty() && !id.contains('/')
}

/// Path of a collection of documents.
///
/// # Examples
///
/// ```
/// use courtside_core::path::CollectionPath;
///
/// let slots = CollectionPath::root("events").doc("2025-06-10").collection("slots");
/// assert_eq!(slots.as_str(), "events/2025-06-10/slots");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Top-level collection.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Document with the given id inside this collection.
    #[must_use]
    pub fn doc(&self, id: impl AsRef<str>) -> DocPath {
        DocPath(format!("{}/{}", self.0, id.as_ref()))
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `doc` is a direct child of this collection.
    #[must_use]
    pub fn contains(&self, doc: &DocPath) -> bool {
        doc.parent().0 == self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CollectionPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s, false)?;
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for CollectionPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Path of a single document.
///
/// # Examples
///
/// ```
/// use courtside_core::path::{CollectionPath, DocPath};
///
/// let doc: DocPath = "reservations/2025-06-10/slots/09:00".parse().unwrap();
/// assert_eq!(doc.id(), "09:00");
/// assert_eq!(doc.parent().as_str(), "reservations/2025-06-10/slots");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocPath(String);

impl DocPath {
    /// The document id (last segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, id)| id)
    }

    /// The collection this document lives in.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        CollectionPath(
            self.0
                .rsplit_once('/')
                .map_or_else(String::new, |(parent, _)| parent.to_string()),
        )
    }

    /// Sub-collection nested under this document.
    #[must_use]
    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{name}", self.0))
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s, true)?;
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for DocPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_paths() {
        let seats = CollectionPath::root("events")
            .doc("2025-06-10")
            .collection("slots")
            .doc("18:00")
            .collection("seats");
        let seat = seats.doc("abc");

        assert_eq!(seat.as_str(), "events/2025-06-10/slots/18:00/seats/abc");
        assert_eq!(seat.id(), "abc");
        assert_eq!(seat.parent(), seats);
        assert!(seats.contains(&seat));
    }

    #[test]
    fn contains_only_direct_children() {
        let slots = CollectionPath::root("events").doc("2025-06-10").collection("slots");
        let nested = slots.doc("18:00").collection("seats").doc("abc");
        assert!(!slots.contains(&nested));
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!("".parse::<DocPath>().is_err());
        assert!("events".parse::<DocPath>().is_err());
        assert!("events//slots".parse::<CollectionPath>().is_err());
        assert!("events/2025-06-10".parse::<CollectionPath>().is_err());
        assert!("events/2025-06-10".parse::<DocPath>().is_ok());
    }

    #[test]
    fn segment_validation() {
        assert!(is_valid_segment("uid-123"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment("a/b"));
    }

    proptest::proptest! {
        #[test]
        fn built_paths_parse_back(
            segments in proptest::collection::vec("[a-z0-9:-]{1,12}", 1..4),
            id in "[A-Za-z0-9-]{1,20}",
        ) {
            let mut collection = CollectionPath::root(segments[0].clone());
            for (i, segment) in segments.iter().enumerate().skip(1) {
                collection = collection.doc(format!("d{i}")).collection(segment);
            }
            let doc = collection.doc(&id);

            proptest::prop_assert_eq!(doc.as_str().parse::<DocPath>().unwrap(), doc.clone());
            proptest::prop_assert_eq!(doc.id(), id.as_str());
            proptest::prop_assert_eq!(doc.parent(), collection.clone());
            proptest::prop_assert!(collection.as_str().parse::<CollectionPath>().is_ok());
        }
    }
}
