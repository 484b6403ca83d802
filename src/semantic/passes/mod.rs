//! Tree-to-tree rewrite passes.
//!
//! Each pass is a [`Rewriter`](crate::ast::Rewriter) that assumes the passes
//! before it in [`PipelineStage::ORDER`](crate::semantic::pipeline::PipelineStage::ORDER)
//! have already run. Passes never mutate their input.

mod alias_support;
pub mod aggregate_support;
pub mod from_source_alias;
pub mod group_by_alias;
pub mod group_by_path;
pub mod select_list_alias;
pub mod select_star;
pub mod static_type;
pub mod substitution;

pub use aggregate_support::AggregateRegistrar;
pub use alias_support::extract_column_alias;
pub use from_source_alias::FromSourceAliasRewriter;
pub use group_by_alias::{GroupByAliasRewriter, group_key_unique_name};
pub use group_by_path::GroupByPathRewriter;
pub use select_list_alias::SelectListAliasRewriter;
pub use select_star::SelectStarRewriter;
pub use static_type::{ResolvedBinding, ScopeSearchOrder, StaticTypeContext, StaticTypeRewriter};
pub use substitution::{
    Substituting, SubstitutionMap, SubstitutionPair, SubstitutionRewriter, walk_substituted,
};
