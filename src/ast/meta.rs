//! Side-channel annotations attached to tree nodes.
//!
//! Every [`Expr`](crate::ast::Expr) and [`SymbolicName`](crate::ast::SymbolicName)
//! carries a [`MetaContainer`]. The set of metadata kinds is closed: each kind has a
//! dedicated slot and a typed accessor, so no runtime type tests are needed to read
//! an annotation back.
//!
//! Node equality ignores metadata entirely. Two nodes that differ only in their
//! annotations (for example their source location) compare equal and hash the same.

use smol_str::SmolStr;

use crate::ast::{Expr, SourceLocation};
use crate::semantic::types::StaticType;

/// Tag identifying one metadata slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaKind {
    /// Parse-time location of the node.
    SourceLocation,
    /// The alias was synthesized by a pass, not written by the user.
    IsSyntheticName,
    /// Collision-free name assigned to a GROUP BY key.
    UniqueName,
    /// Type inferred for a variable reference.
    StaticType,
    /// Dense register index of one aggregate call-site.
    AggregateRegisterId,
    /// Ordered aggregate call-sites of one SELECT.
    AggregateCallSiteList,
}

impl MetaKind {
    /// Every metadata kind, in slot order.
    pub const ALL: [MetaKind; 6] = [
        MetaKind::SourceLocation,
        MetaKind::IsSyntheticName,
        MetaKind::UniqueName,
        MetaKind::StaticType,
        MetaKind::AggregateRegisterId,
        MetaKind::AggregateCallSiteList,
    ];

    /// Returns a human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::SourceLocation => "SourceLocation",
            Self::IsSyntheticName => "IsSyntheticName",
            Self::UniqueName => "UniqueName",
            Self::StaticType => "StaticType",
            Self::AggregateRegisterId => "AggregateRegisterId",
            Self::AggregateCallSiteList => "AggregateCallSiteList",
        }
    }
}

/// One metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    SourceLocation(SourceLocation),
    IsSyntheticName,
    UniqueName(SmolStr),
    StaticType(StaticType),
    AggregateRegisterId(usize),
    AggregateCallSiteList(Vec<Expr>),
}

impl Meta {
    /// Returns the slot this value occupies.
    pub fn kind(&self) -> MetaKind {
        match self {
            Meta::SourceLocation(_) => MetaKind::SourceLocation,
            Meta::IsSyntheticName => MetaKind::IsSyntheticName,
            Meta::UniqueName(_) => MetaKind::UniqueName,
            Meta::StaticType(_) => MetaKind::StaticType,
            Meta::AggregateRegisterId(_) => MetaKind::AggregateRegisterId,
            Meta::AggregateCallSiteList(_) => MetaKind::AggregateCallSiteList,
        }
    }
}

/// Keyed bag of annotations, at most one value per [`MetaKind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaContainer {
    source_location: Option<SourceLocation>,
    is_synthetic_name: bool,
    unique_name: Option<SmolStr>,
    static_type: Option<StaticType>,
    aggregate_register_id: Option<usize>,
    aggregate_call_sites: Option<Vec<Expr>>,
}

impl MetaContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container holding only a source location.
    pub fn located(location: SourceLocation) -> Self {
        Self::new().with(Meta::SourceLocation(location))
    }

    /// Returns this container with `meta` inserted, replacing any value of the same kind.
    pub fn with(mut self, meta: Meta) -> Self {
        self.insert(meta);
        self
    }

    /// Inserts `meta`, replacing any value of the same kind.
    pub fn insert(&mut self, meta: Meta) {
        match meta {
            Meta::SourceLocation(location) => self.source_location = Some(location),
            Meta::IsSyntheticName => self.is_synthetic_name = true,
            Meta::UniqueName(name) => self.unique_name = Some(name),
            Meta::StaticType(ty) => self.static_type = Some(ty),
            Meta::AggregateRegisterId(id) => self.aggregate_register_id = Some(id),
            Meta::AggregateCallSiteList(sites) => self.aggregate_call_sites = Some(sites),
        }
    }

    /// Removes the value of `kind`, returning it if present.
    pub fn remove(&mut self, kind: MetaKind) -> Option<Meta> {
        let removed = self.get(kind);
        match kind {
            MetaKind::SourceLocation => self.source_location = None,
            MetaKind::IsSyntheticName => self.is_synthetic_name = false,
            MetaKind::UniqueName => self.unique_name = None,
            MetaKind::StaticType => self.static_type = None,
            MetaKind::AggregateRegisterId => self.aggregate_register_id = None,
            MetaKind::AggregateCallSiteList => self.aggregate_call_sites = None,
        }
        removed
    }

    /// Returns a copy of this container without the value of `kind`.
    pub fn without(&self, kind: MetaKind) -> Self {
        let mut copy = self.clone();
        copy.remove(kind);
        copy
    }

    /// Returns a copy of the value stored for `kind`.
    pub fn get(&self, kind: MetaKind) -> Option<Meta> {
        match kind {
            MetaKind::SourceLocation => self.source_location.map(Meta::SourceLocation),
            MetaKind::IsSyntheticName => self.is_synthetic_name.then_some(Meta::IsSyntheticName),
            MetaKind::UniqueName => self.unique_name.clone().map(Meta::UniqueName),
            MetaKind::StaticType => self.static_type.clone().map(Meta::StaticType),
            MetaKind::AggregateRegisterId => {
                self.aggregate_register_id.map(Meta::AggregateRegisterId)
            }
            MetaKind::AggregateCallSiteList => self
                .aggregate_call_sites
                .clone()
                .map(Meta::AggregateCallSiteList),
        }
    }

    /// Returns true if a value of `kind` is present.
    pub fn contains(&self, kind: MetaKind) -> bool {
        match kind {
            MetaKind::SourceLocation => self.source_location.is_some(),
            MetaKind::IsSyntheticName => self.is_synthetic_name,
            MetaKind::UniqueName => self.unique_name.is_some(),
            MetaKind::StaticType => self.static_type.is_some(),
            MetaKind::AggregateRegisterId => self.aggregate_register_id.is_some(),
            MetaKind::AggregateCallSiteList => self.aggregate_call_sites.is_some(),
        }
    }

    /// Iterates over the kinds present in this container.
    pub fn kinds(&self) -> impl Iterator<Item = MetaKind> + '_ {
        MetaKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.kinds().count()
    }

    /// Returns true if no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overlays `other` on top of this container: keys present in `other` win.
    pub fn merge(&self, other: &MetaContainer) -> Self {
        let mut merged = self.clone();
        for kind in other.kinds() {
            if let Some(meta) = other.get(kind) {
                merged.insert(meta);
            }
        }
        merged
    }

    /// Returns a container holding only this container's source location, if any.
    pub fn location_only(&self) -> Self {
        Self {
            source_location: self.source_location,
            ..Self::default()
        }
    }

    /// Where the node was written, if known.
    pub fn source_location(&self) -> Option<SourceLocation> {
        self.source_location
    }

    /// True when a pass synthesized the name this node carries.
    pub fn is_synthetic_name(&self) -> bool {
        self.is_synthetic_name
    }

    /// The query-unique name of a GROUP BY key alias.
    pub fn unique_name(&self) -> Option<&SmolStr> {
        self.unique_name.as_ref()
    }

    /// Type assigned by scope resolution.
    pub fn static_type(&self) -> Option<&StaticType> {
        self.static_type.as_ref()
    }

    /// Index of an aggregate call in its SELECT's call-site list.
    pub fn aggregate_register_id(&self) -> Option<usize> {
        self.aggregate_register_id
    }

    /// Aggregate calls registered for a SELECT, in id order.
    pub fn aggregate_call_sites(&self) -> Option<&[Expr]> {
        self.aggregate_call_sites.as_deref()
    }
}
