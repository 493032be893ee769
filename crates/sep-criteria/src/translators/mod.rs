//! Built-in operator translators.
//!
//! One translator instance per operator token and value-type family:
//!
//! - Comparisons (priority 10): numeric and date operators, gated on `ValueType`
//! - Relations (priority 20): IRI-valued references compared as terms
//! - Existence (priority 30): `empty` / `not_empty` for any value type
//! - Text (priority 50): string and literal matching, positive and negated
//!
//! Value-type gated translators sit at a lower priority than the text
//! families so that `equals` on a numeric field never falls through to a
//! string comparison.

mod comparison;
mod existence;
mod relation;
mod text;

pub use comparison::{ComparisonKind, ComparisonTranslator};
pub use existence::ExistenceTranslator;
pub use relation::RelationTranslator;
pub use text::TextMatchTranslator;

use crate::catalog::OperatorTranslator;
use std::sync::Arc;

/// Every built-in translator, in registration order.
pub fn standard_translators() -> Vec<Arc<dyn OperatorTranslator>> {
    let mut translators: Vec<Arc<dyn OperatorTranslator>> = Vec::new();
    translators.extend(
        ComparisonTranslator::numeric_family()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn OperatorTranslator>),
    );
    translators.extend(
        ComparisonTranslator::date_family()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn OperatorTranslator>),
    );
    translators.extend(
        RelationTranslator::family()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn OperatorTranslator>),
    );
    translators.extend(
        ExistenceTranslator::family()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn OperatorTranslator>),
    );
    translators.extend(
        TextMatchTranslator::family()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn OperatorTranslator>),
    );
    translators
}
