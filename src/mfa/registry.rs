//! Provider registry and ranking.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use thiserror::Error;

use super::provider::MultifactorProvider;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RegistryError {
    #[error("duplicate provider id: {0}")]
    DuplicateProviderId(String),
}

/// All known multifactor providers of one execution plan.
///
/// Keyed by provider id in a `BTreeMap`, so iteration order and ranking
/// tie-breaks are lexicographic by construction, independent of
/// registration order. Scoped to one plan instance; nothing here survives a
/// reload.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<MultifactorProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateProviderId`] when the id is taken.
    pub fn register(&mut self, provider: Arc<MultifactorProvider>) -> Result<(), RegistryError> {
        match self.providers.entry(provider.id().to_string()) {
            Entry::Occupied(taken) => {
                Err(RegistryError::DuplicateProviderId(taken.key().clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(provider);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<MultifactorProvider>> {
        self.providers.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MultifactorProvider>> {
        self.providers.values()
    }

    /// Resolve the provider that must run next: lowest rank among candidates
    /// not already satisfied, ties by ascending id. Unknown candidate ids
    /// are ignored.
    #[must_use]
    pub fn resolve(
        &self,
        candidates: &BTreeSet<String>,
        already_satisfied: &BTreeSet<String>,
    ) -> Option<&Arc<MultifactorProvider>> {
        candidates
            .iter()
            .filter(|id| !already_satisfied.contains(*id))
            .filter_map(|id| self.providers.get(id))
            .min_by_key(|provider| (provider.rank(), provider.id()))
    }
}
