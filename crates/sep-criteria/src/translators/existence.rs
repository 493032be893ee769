//! Existence checks: `empty` and `not_empty`.

use crate::catalog::{Arity, OperatorTranslator};
use crate::error::CriteriaResult;
use crate::fragment::{emit_existence, FragmentSink};
use crate::tree::Criterion;

const EXISTENCE_PRIORITY: u8 = 30;

/// Matches any value type; takes no values.
#[derive(Debug, Clone)]
pub struct ExistenceTranslator {
    name: String,
    operator: &'static str,
    negate: bool,
}

impl ExistenceTranslator {
    pub fn new(operator: &'static str, negate: bool) -> Self {
        Self {
            name: format!("existence:{}", operator),
            operator,
            negate,
        }
    }

    /// `not_empty` is the positive form, `empty` the negated one
    pub fn family() -> Vec<Self> {
        vec![Self::new("not_empty", false), Self::new("empty", true)]
    }
}

impl OperatorTranslator for ExistenceTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &Criterion) -> bool {
        criterion.operator == self.operator
    }

    fn priority(&self) -> u8 {
        EXISTENCE_PRIORITY
    }

    fn arity(&self) -> Arity {
        Arity::None
    }

    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()> {
        emit_existence(sink, &criterion.field, self.negate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::tree::ValueType;

    #[test]
    fn test_empty_is_negated_not_empty() {
        let config = CompilerConfig::default();
        let family = ExistenceTranslator::family();

        let mut positive = FragmentSink::new(&config);
        family[0]
            .render(&Criterion::new("owner", "not_empty"), &mut positive)
            .unwrap();

        let mut negative = FragmentSink::new(&config);
        family[1]
            .render(&Criterion::new("owner", "empty"), &mut negative)
            .unwrap();

        assert_eq!(positive.as_str(), "EXISTS { ?instance emf:owner ?v0 . }");
        assert_eq!(negative.as_str(), format!("NOT {}", positive.as_str()));
    }

    #[test]
    fn test_matches_any_value_type() {
        let translator = ExistenceTranslator::new("empty", true);
        for value_type in [
            ValueType::String,
            ValueType::Literal,
            ValueType::Numeric,
            ValueType::Date,
            ValueType::Iri,
        ] {
            let criterion = Criterion::new("x", "empty").with_type(value_type);
            assert!(translator.matches(&criterion));
        }
        assert_eq!(translator.arity(), Arity::None);
    }
}
