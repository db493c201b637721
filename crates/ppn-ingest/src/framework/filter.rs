//! Reference filter against names already known to the portal

use std::collections::HashSet;

/// A table/column whose values feed the [`KnownNameSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSource {
    pub table: &'static str,
    pub column: &'static str,
    /// A missing table counts as empty instead of aborting the run
    pub optional: bool,
}

impl NameSource {
    pub const fn required(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column,
            optional: false,
        }
    }

    pub const fn optional(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column,
            optional: true,
        }
    }
}

/// Case-insensitive set of canonical names
///
/// An empty set filters nothing: every row is kept.
#[derive(Debug, Clone, Default)]
pub struct KnownNameSet {
    names: HashSet<String>,
}

impl KnownNameSet {
    /// A set that admits everything
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(names);
        set
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names.extend(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty()),
        );
    }

    pub fn merge(mut self, other: KnownNameSet) -> Self {
        self.names.extend(other.names);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether a row carrying `names` passes the filter
    ///
    /// At least one name must be known. Rows without any names pass only
    /// when the set is empty.
    pub fn admits<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.is_empty() || names.iter().any(|n| self.contains(n.as_ref()))
    }
}
