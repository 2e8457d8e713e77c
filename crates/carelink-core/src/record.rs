//! The contract a record type must satisfy to be held by a synchronized
//! collection: a stable id plus the pure predicates the visible projection
//! is built from.

use std::cmp::Ordering;
use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait Record: Clone + PartialEq + Debug + DeserializeOwned + Send + Sync + 'static {
    /// Workflow status, used by the status filter and status updates.
    type Status: Copy + Eq + Debug + Serialize + Send + Sync + 'static;
    /// Named quick filters offered by the screen ("high priority", ...).
    type Preset: Copy + Eq + Default + Debug + Send + Sync + 'static;
    /// Fields the user can sort by.
    type SortField: Copy + Eq + Default + Debug + Send + Sync + 'static;

    fn id(&self) -> &str;

    fn status(&self) -> Self::Status;

    /// Values matched case-insensitively against the search text.
    fn search_fields(&self) -> Vec<&str>;

    fn matches_preset(&self, preset: Self::Preset) -> bool;

    /// Ascending comparison on a single field; ties are `Equal`.
    fn compare_by(&self, other: &Self, field: Self::SortField) -> Ordering;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Case-insensitive comparison used by name sorts.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
