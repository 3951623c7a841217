#![forbid(unsafe_code)]

//! Section descriptors and the ordered, immutable registry.
//!
//! # Invariants
//!
//! 1. A registry holds at least one section.
//! 2. Ids are unique, non-empty, and contain no whitespace or `#`.
//! 3. Order is fixed at construction and never changes.
//!
//! # Failure Modes
//!
//! Construction fails with [`RegistryError`]; every lookup is infallible and
//! returns `Option` for unknown ids.

use std::borrow::Borrow;
use std::fmt;

use ahash::AHashMap;

/// Stable key shared by a section element and its tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SectionId(String);

impl SectionId {
    /// Wrap a raw id. Validation happens when the id enters a registry.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for SectionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SectionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One navigable section: its id and the key its tab label resolves from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionDescriptor {
    pub id: SectionId,
    #[cfg_attr(feature = "serde", serde(alias = "labelKey", alias = "label_key"))]
    pub label: String,
}

impl SectionDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(id: impl Into<SectionId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No sections were supplied.
    Empty,
    /// An id was the empty string.
    EmptyId { index: usize },
    /// An id contains whitespace or `#` and cannot round-trip through a fragment.
    InvalidId(String),
    /// The same id appears twice.
    Duplicate(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "section registry must contain at least one section"),
            Self::EmptyId { index } => write!(f, "section at index {index} has an empty id"),
            Self::InvalidId(id) => write!(f, "section id {id:?} is not a valid fragment"),
            Self::Duplicate(id) => write!(f, "duplicate section id: {id}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Canonical, immutable ordering of sections.
#[derive(Debug, Clone)]
pub struct SectionRegistry {
    sections: Vec<SectionDescriptor>,
    index: AHashMap<SectionId, usize>,
}

impl SectionRegistry {
    /// Build a registry, validating ids.
    pub fn new(sections: Vec<SectionDescriptor>) -> Result<Self, RegistryError> {
        if sections.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut index = AHashMap::with_capacity(sections.len());
        for (i, section) in sections.iter().enumerate() {
            let id = section.id.as_str();
            if id.is_empty() {
                return Err(RegistryError::EmptyId { index: i });
            }
            if id.chars().any(|c| c.is_whitespace() || c == '#') {
                return Err(RegistryError::InvalidId(id.to_owned()));
            }
            if index.insert(section.id.clone(), i).is_some() {
                return Err(RegistryError::Duplicate(id.to_owned()));
            }
        }
        Ok(Self { sections, index })
    }

    /// Convenience constructor from `(id, label)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, RegistryError> {
        Self::new(
            pairs
                .into_iter()
                .map(|(id, label)| SectionDescriptor::new(id, label))
                .collect(),
        )
    }

    /// Number of sections (always ≥ 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Always `false`; present for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SectionDescriptor> {
        self.index_of(id).map(|i| &self.sections[i])
    }

    /// Descriptor at a position in canonical order.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&SectionDescriptor> {
        self.sections.get(index)
    }

    #[must_use]
    pub fn first(&self) -> &SectionDescriptor {
        &self.sections[0]
    }

    #[must_use]
    pub fn last(&self) -> &SectionDescriptor {
        &self.sections[self.sections.len() - 1]
    }

    /// The section after `id`, or `None` at the end or for unknown ids.
    #[must_use]
    pub fn next_of(&self, id: &str) -> Option<&SectionDescriptor> {
        self.index_of(id).and_then(|i| self.sections.get(i + 1))
    }

    /// The section before `id`, or `None` at the start or for unknown ids.
    #[must_use]
    pub fn previous_of(&self, id: &str) -> Option<&SectionDescriptor> {
        self.index_of(id)
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.sections.get(i))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SectionDescriptor> + '_ {
        self.sections.iter()
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = &SectionId> + '_ {
        self.sections.iter().map(|s| &s.id)
    }

    /// Section a page load should start on: the fragment's section when the
    /// fragment names a registered id, otherwise the first section.
    #[must_use]
    pub fn initial_section(&self, fragment: Option<&str>) -> &SectionDescriptor {
        fragment
            .map(|f| f.strip_prefix('#').unwrap_or(f))
            .and_then(|f| self.get(f))
            .unwrap_or_else(|| self.first())
    }
}
