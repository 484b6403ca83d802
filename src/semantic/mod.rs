//! Semantic analysis for SQL++ statements.
//!
//! Analysis is a fixed sequence of tree rewrites. Each pass reads the metadata
//! left by the passes before it and attaches its own:
//!
//! 1. **Select-list aliases** - every projected expression gets a name
//! 2. **FROM source aliases** - every scanned source gets an `AS` variable
//! 3. **GROUP BY aliases** - every key gets a visible and a unique name
//! 4. **Aggregate registration** - aggregate calls are numbered per query
//! 5. **GROUP BY path substitution** - key paths become group variables
//! 6. **SELECT \* expansion** - `*` becomes an explicit projection
//! 7. **Scope resolution** (optional, catalog-dependent) - every variable is
//!    resolved to a lexical or global binding and given a static type
//!
//! # Example
//!
//! ```
//! use sqlpp_rewrite::ast::build;
//! use sqlpp_rewrite::semantic::{MapBindings, SemanticAnalyzer, StaticType};
//!
//! let catalog = MapBindings::new().with_binding("orders", StaticType::any_bag());
//! let query = build::select(vec![build::item(build::id("total"))])
//!     .with_from(build::table("orders"))
//!     .into_expr();
//!
//! let analyzed = SemanticAnalyzer::new()
//!     .with_catalog(&catalog)
//!     .analyze(&query)
//!     .expect("analysis succeeds");
//! assert!(analyzed.as_select().is_some());
//! ```

pub mod catalog;
pub mod diag;
pub mod error;
pub mod passes;
pub mod pipeline;
pub mod types;

pub use catalog::{BindingCase, BindingName, CatalogError, GlobalBindings, MapBindings};
pub use error::{ErrorCode, SemanticError, SemanticResult};
pub use pipeline::{
    PipelineStage, RewritePipeline, ScopingConfig, ScopingConstraint, SemanticAnalyzer,
};
pub use types::StaticType;
