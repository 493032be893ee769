//! # SEP Criteria
//!
//! Compiles structured search criteria into SPARQL filter fragments.
//!
//! A search request is a tree of AND/OR junctions over leaf criteria
//! (`field operator values`). The compiler walks the tree, resolves each
//! leaf to an operator translator, and emits a single `FILTER` clause that
//! the host splices into its query next to the pattern binding `?instance`.
//!
//! ## Architecture
//!
//! 1. **tree**: the criteria model, deserializable from the search UI's JSON
//! 2. **validate**: shape checks (empty junctions, depth limit)
//! 3. **catalog**: ordered registry of [`OperatorTranslator`]s
//! 4. **translators**: built-in operator families (comparison, relation, existence, text)
//! 5. **fragment**: shared rendering primitives and escaping
//! 6. **compiler**: ties the passes together
//!
//! ## Usage
//!
//! ```rust
//! use sep_criteria::{Compiler, Criterion, CriteriaNode, Junction, ValueType};
//!
//! let tree: CriteriaNode = Junction::and([
//!     Criterion::new("title", "contains").with_value("report").into(),
//!     Criterion::new("amount", "does_not_equal")
//!         .with_type(ValueType::Numeric)
//!         .with_value("0")
//!         .into(),
//! ])
//! .into();
//!
//! let fragment = Compiler::new().compile(&tree).unwrap();
//! assert!(fragment.starts_with("FILTER ( EXISTS {"));
//! ```

pub mod catalog;
pub mod compiler;
pub mod config;
mod error;
pub mod fragment;
pub mod translators;
pub mod tree;
pub mod validate;

// Re-export the compile entry point
pub use compiler::Compiler;

// Re-export the criteria model
pub use tree::{CriteriaNode, Criterion, Junction, JunctionKind, ValueType};

// Re-export the extension seam
pub use catalog::{
    default_catalog, Arity, FnTranslator, OperationCatalog, OperationCatalogBuilder,
    OperatorTranslator,
};
pub use fragment::{escape_literal, FragmentSink, ANY_FIELD, OPEN_BOUND};

pub use config::CompilerConfig;
pub use error::{ConfigError, CriteriaError, CriteriaResult};
