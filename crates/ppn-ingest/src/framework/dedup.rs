//! In-run deduplication by entity key

use std::collections::HashSet;

/// Identity of an entity within one run
///
/// Pair keys are symmetric: `(A, B)` and `(B, A)` compare equal because the
/// halves are normalized and stored in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A single external identifier, e.g. an NCT number
    Identifier(String),
    /// An unordered pair of names, lowercased and trimmed
    Pair(String, String),
    /// Several fields that together identify a row
    Composite(Vec<String>),
}

impl EntityKey {
    pub fn identifier(id: impl Into<String>) -> Self {
        Self::Identifier(id.into())
    }

    pub fn pair(a: &str, b: &str) -> Self {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        if a <= b {
            Self::Pair(a, b)
        } else {
            Self::Pair(b, a)
        }
    }

    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Composite(parts.into_iter().map(Into::into).collect())
    }
}

/// First-occurrence-wins filter over entity keys
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<EntityKey>,
    dropped: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a key is offered, `false` afterwards
    pub fn admit(&mut self, key: EntityKey) -> bool {
        let fresh = self.seen.insert(key);
        if !fresh {
            self.dropped += 1;
        }
        fresh
    }

    /// Rows refused as duplicates so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
