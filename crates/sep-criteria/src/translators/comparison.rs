//! Numeric and date comparisons.

use crate::catalog::{Arity, OperatorTranslator};
use crate::error::CriteriaResult;
use crate::fragment::{
    emit_date_comparison, emit_numeric_comparison, FragmentSink, DATE_OPERATORS,
    NUMERIC_OPERATORS,
};
use crate::tree::{Criterion, ValueType};

const COMPARISON_PRIORITY: u8 = 10;

/// Which value type a comparison translator handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    Numeric,
    Date,
}

impl ComparisonKind {
    fn value_type(self) -> ValueType {
        match self {
            ComparisonKind::Numeric => ValueType::Numeric,
            ComparisonKind::Date => ValueType::Date,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ComparisonKind::Numeric => "numeric",
            ComparisonKind::Date => "date",
        }
    }
}

/// One comparison operator for numeric or date values.
#[derive(Debug, Clone)]
pub struct ComparisonTranslator {
    name: String,
    operator: &'static str,
    kind: ComparisonKind,
}

impl ComparisonTranslator {
    pub fn new(kind: ComparisonKind, operator: &'static str) -> Self {
        Self {
            name: format!("{}:{}", kind.label(), operator),
            operator,
            kind,
        }
    }

    pub fn numeric_family() -> Vec<Self> {
        NUMERIC_OPERATORS
            .iter()
            .map(|&op| Self::new(ComparisonKind::Numeric, op))
            .collect()
    }

    pub fn date_family() -> Vec<Self> {
        DATE_OPERATORS
            .iter()
            .map(|&op| Self::new(ComparisonKind::Date, op))
            .collect()
    }
}

impl OperatorTranslator for ComparisonTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &Criterion) -> bool {
        criterion.value_type == self.kind.value_type() && criterion.operator == self.operator
    }

    fn priority(&self) -> u8 {
        COMPARISON_PRIORITY
    }

    fn arity(&self) -> Arity {
        if self.operator == "between" {
            Arity::Exactly(2)
        } else {
            Arity::Exactly(1)
        }
    }

    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()> {
        match self.kind {
            ComparisonKind::Numeric => {
                emit_numeric_comparison(sink, &criterion.field, self.operator, &criterion.values)
            }
            ComparisonKind::Date => {
                emit_date_comparison(sink, &criterion.field, self.operator, &criterion.values)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::error::CriteriaError;
    use test_case::test_case;

    fn render(translator: &ComparisonTranslator, criterion: &Criterion) -> CriteriaResult<String> {
        let config = CompilerConfig::default();
        let mut sink = FragmentSink::new(&config);
        translator.render(criterion, &mut sink)?;
        Ok(sink.into_string())
    }

    #[test_case("equals", "=" ; "equals")]
    #[test_case("does_not_equal", "!=" ; "does not equal")]
    #[test_case("greater_than", ">" ; "greater than")]
    #[test_case("greater_or_equal", ">=" ; "greater or equal")]
    #[test_case("less_than", "<" ; "less than")]
    #[test_case("less_or_equal", "<=" ; "less or equal")]
    fn test_numeric_symbols(operator: &'static str, symbol: &str) {
        let translator = ComparisonTranslator::new(ComparisonKind::Numeric, operator);
        let criterion = Criterion::new("amount", operator)
            .with_type(ValueType::Numeric)
            .with_value("42");

        let fragment = render(&translator, &criterion).unwrap();
        assert!(fragment.contains(&format!("FILTER ( ?v0 {} 42 )", symbol)));
    }

    #[test]
    fn test_matches_requires_value_type() {
        let translator = ComparisonTranslator::new(ComparisonKind::Numeric, "equals");
        let numeric = Criterion::new("amount", "equals")
            .with_type(ValueType::Numeric)
            .with_value("1");
        let string = Criterion::new("amount", "equals").with_value("1");

        assert!(translator.matches(&numeric));
        assert!(!translator.matches(&string));
    }

    #[test]
    fn test_between_arity() {
        assert_eq!(
            ComparisonTranslator::new(ComparisonKind::Date, "between").arity(),
            Arity::Exactly(2)
        );
        assert_eq!(
            ComparisonTranslator::new(ComparisonKind::Date, "before").arity(),
            Arity::Exactly(1)
        );
    }

    #[test]
    fn test_date_between() {
        let translator = ComparisonTranslator::new(ComparisonKind::Date, "between");
        let criterion = Criterion::new("createdOn", "between")
            .with_type(ValueType::Date)
            .with_values(["2024-01-01", "2024-12-31T23:59:59Z"]);

        assert_eq!(
            render(&translator, &criterion).unwrap(),
            "EXISTS { ?instance emf:createdOn ?v0 . \
             FILTER ( ?v0 >= \"2024-01-01T00:00:00Z\"^^xsd:dateTime \
             && ?v0 <= \"2024-12-31T23:59:59Z\"^^xsd:dateTime ) }"
        );
    }

    #[test_case("*", "2024-06-30", "( ?v0 < \"2024-07-01T00:00:00Z\"" ; "open lower")]
    #[test_case("2024-06-30", "*", "( ?v0 >= \"2024-06-30T00:00:00Z\"" ; "open upper")]
    fn test_date_between_open_side(lower: &str, upper: &str, expected: &str) {
        let translator = ComparisonTranslator::new(ComparisonKind::Date, "between");
        let criterion = Criterion::new("createdOn", "between")
            .with_type(ValueType::Date)
            .with_values([lower, upper]);

        assert!(render(&translator, &criterion).unwrap().contains(expected));
    }

    #[test]
    fn test_malformed_number_is_validation_error() {
        let translator = ComparisonTranslator::new(ComparisonKind::Numeric, "less_than");
        let criterion = Criterion::new("amount", "less_than")
            .with_type(ValueType::Numeric)
            .with_value("12abc");

        assert!(matches!(
            render(&translator, &criterion),
            Err(CriteriaError::Validation { .. })
        ));
    }
}
