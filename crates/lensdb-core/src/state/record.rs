use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// LifecycleState
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum LifecycleState {
    Detached,
    ManagedFull,
    ManagedPartial,
    New,
    Removed,
}

impl LifecycleState {
    #[must_use]
    pub const fn is_managed(self) -> bool {
        matches!(self, Self::ManagedFull | Self::ManagedPartial)
    }
}

///
/// RemoveMode
///
/// Soft removal sets the marker and keeps the record queryable; hard removal
/// evicts the record (storage deletion is the collaborator's job).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum RemoveMode {
    Hard,
    Soft,
}

///
/// LoadRecord
/// Per-instance load state: lifecycle stage plus the attributes known to be
/// populated.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoadRecord {
    pub state: LifecycleState,
    pub loaded: BTreeSet<String>,
}

impl LoadRecord {
    pub(crate) const fn new(state: LifecycleState) -> Self {
        Self {
            state,
            loaded: BTreeSet::new(),
        }
    }

    /// True iff the attribute is safe to read without a fallback fetch.
    #[must_use]
    pub fn is_loaded(&self, attribute: &str) -> bool {
        match self.state {
            LifecycleState::New | LifecycleState::ManagedFull => true,
            _ => self.loaded.contains(attribute),
        }
    }
}
