//! Global bindings supplied by an external catalog.
//!
//! The scope resolution pass looks up names it cannot bind locally or lexically
//! through the [`GlobalBindings`] trait. Any catalog can back it; [`MapBindings`]
//! is an in-memory implementation used by tests and embedders without a catalog.

use std::collections::HashMap;

use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::expression::{CaseSensitivity, eq_ignore_case};
use crate::semantic::types::StaticType;

/// Result type for catalog lookups that may fail.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error type for catalog lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A case-insensitive lookup matched more than one global.
    #[error("global name '{name}' is ambiguous; it matches {candidates:?}")]
    Ambiguous {
        name: SmolStr,
        candidates: Vec<SmolStr>,
    },

    /// The catalog is unavailable or not configured.
    #[error("catalog is not available")]
    CatalogUnavailable,
}

/// How a global name is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingCase {
    Sensitive,
    Insensitive,
}

impl From<CaseSensitivity> for BindingCase {
    fn from(case: CaseSensitivity) -> Self {
        match case {
            CaseSensitivity::Sensitive => BindingCase::Sensitive,
            CaseSensitivity::Insensitive => BindingCase::Insensitive,
        }
    }
}

/// A name looked up in the global scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingName {
    pub name: SmolStr,
    pub case: BindingCase,
}

impl BindingName {
    /// Creates a lookup key.
    pub fn new(name: impl Into<SmolStr>, case: BindingCase) -> Self {
        Self {
            name: name.into(),
            case,
        }
    }

    /// Returns true if `candidate` is matched by this name.
    pub fn matches(&self, candidate: &str) -> bool {
        match self.case {
            BindingCase::Sensitive => self.name == candidate,
            BindingCase::Insensitive => eq_ignore_case(&self.name, candidate),
        }
    }
}

/// Trait for global binding access.
///
/// Implement this trait to expose catalog entries (tables, named values) to the
/// scope resolution pass. A lookup returns the global's static type, `None` when
/// no global matches, or an error when the lookup cannot be answered.
pub trait GlobalBindings {
    fn lookup_binding(&self, name: &BindingName) -> CatalogResult<Option<StaticType>>;
}

impl<T: GlobalBindings + ?Sized> GlobalBindings for &T {
    fn lookup_binding(&self, name: &BindingName) -> CatalogResult<Option<StaticType>> {
        (**self).lookup_binding(name)
    }
}

/// In-memory global bindings.
#[derive(Debug, Clone, Default)]
pub struct MapBindings {
    bindings: HashMap<SmolStr, StaticType>,
}

impl MapBindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a global.
    pub fn with_binding(mut self, name: impl Into<SmolStr>, ty: StaticType) -> Self {
        self.insert(name, ty);
        self
    }

    /// Adds or replaces a binding.
    pub fn insert(&mut self, name: impl Into<SmolStr>, ty: StaticType) {
        self.bindings.insert(name.into(), ty);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl GlobalBindings for MapBindings {
    fn lookup_binding(&self, name: &BindingName) -> CatalogResult<Option<StaticType>> {
        if name.case == BindingCase::Sensitive {
            return Ok(self.bindings.get(&name.name).cloned());
        }

        let mut matches: Vec<(&SmolStr, &StaticType)> = self
            .bindings
            .iter()
            .filter(|(candidate, _)| name.matches(candidate))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop().map(|(_, ty)| ty.clone())),
            _ => {
                let mut candidates: Vec<SmolStr> =
                    matches.into_iter().map(|(candidate, _)| candidate.clone()).collect();
                candidates.sort();
                Err(CatalogError::Ambiguous {
                    name: name.name.clone(),
                    candidates,
                })
            }
        }
    }
}
