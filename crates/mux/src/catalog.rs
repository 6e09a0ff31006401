//! State catalog.
//!
//! The catalog is filled once at attach and never changes afterwards, so it
//! is shared without synchronisation. States are kept in discovery order for
//! listing; a name-sorted index of positions gives `O(log n)` lookup.

use heapless::{String, Vec};
use platform::config::MAX_STATE_NAME_LEN;

use crate::error::InitError;

/// One named, selectable hardware configuration.
///
/// Owns its configuration tree for the lifetime of the catalog; the tree is
/// released when the catalog is dropped.
pub struct ConfigurationState<T> {
    name: String<MAX_STATE_NAME_LEN>,
    tree: T,
}

impl<T> ConfigurationState<T> {
    /// Logical state name (without the description prefix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration tree applied when this state is selected.
    pub fn tree(&self) -> &T {
        &self.tree
    }
}

/// Why a state could not be added to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// A state with the same name is already present.
    Duplicate,
    /// The catalog holds `N` states already.
    Full,
    /// The name exceeds [`MAX_STATE_NAME_LEN`] bytes.
    NameTooLong,
}

/// Ordered collection of [`ConfigurationState`]s keyed by unique name.
pub struct StateCatalog<T, const N: usize> {
    states: Vec<ConfigurationState<T>, N>,
    // Positions into `states`, sorted by state name
    by_name: Vec<usize, N>,
}

impl<T, const N: usize> StateCatalog<T, N> {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            states: Vec::new(),
            by_name: Vec::new(),
        }
    }

    /// Append a state, returning its position in discovery order.
    ///
    /// On error the catalog is unchanged and `tree` is dropped.
    pub fn insert(&mut self, name: &str, tree: T) -> Result<usize, CatalogError> {
        let slot = match self.search(name) {
            Ok(_) => return Err(CatalogError::Duplicate),
            Err(slot) => slot,
        };
        let name = String::try_from(name).map_err(|_| CatalogError::NameTooLong)?;
        if self.states.is_full() {
            return Err(CatalogError::Full);
        }

        let position = self.states.len();
        self.states
            .push(ConfigurationState { name, tree })
            .map_err(|_| CatalogError::Full)?;
        self.by_name
            .insert(slot, position)
            .map_err(|_| CatalogError::Full)?;
        Ok(position)
    }

    /// Find a state by name.
    pub fn lookup(&self, name: &str) -> Option<&ConfigurationState<T>> {
        self.position(name).and_then(|position| self.get(position))
    }

    /// Discovery-order position of the state called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        let slot = self.search(name).ok()?;
        self.by_name.get(slot).copied()
    }

    /// State at a discovery-order position.
    pub fn get(&self, position: usize) -> Option<&ConfigurationState<T>> {
        self.states.get(position)
    }

    /// The state called `preferred` if present, otherwise the first one
    /// discovered.
    ///
    /// # Errors
    ///
    /// [`InitError::EmptyCatalog`] when the catalog holds no states.
    pub fn default_or_first(
        &self,
        preferred: Option<&str>,
    ) -> Result<&ConfigurationState<T>, InitError> {
        preferred
            .and_then(|name| self.lookup(name))
            .or_else(|| self.states.first())
            .ok_or(InitError::EmptyCatalog)
    }

    /// State names in discovery order. Stable across calls.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.states.iter().map(ConfigurationState::name)
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no states were discovered.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn search(&self, name: &str) -> Result<usize, usize> {
        self.by_name.binary_search_by(|&position| {
            self.states
                .get(position)
                .map_or("", ConfigurationState::name)
                .cmp(name)
        })
    }
}

impl<T, const N: usize> Default for StateCatalog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
