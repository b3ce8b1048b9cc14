//! Set differences between declared and observed state

use serde::Serialize;
use std::collections::BTreeSet;

/// What must be added and removed to turn `current` into `desired`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetDiff {
    /// In desired, absent from current
    pub missing: BTreeSet<String>,
    /// In current, absent from desired
    pub extra: BTreeSet<String>,
}

impl SetDiff {
    /// Compare two sets of names
    pub fn between(desired: &BTreeSet<String>, current: &BTreeSet<String>) -> Self {
        Self {
            missing: desired.difference(current).cloned().collect(),
            extra: current.difference(desired).cloned().collect(),
        }
    }

    /// Whether nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// Number of names that would change
    pub fn len(&self) -> usize {
        self.missing.len() + self.extra.len()
    }
}

/// Collect any iterator of string-likes into an ordered set
pub fn name_set<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}
