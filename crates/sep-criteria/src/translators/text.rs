//! String and literal matching.
//!
//! Each `does_not_*` / `not_*` operator is the same translator as its
//! positive counterpart with `negate` set; both call
//! [`emit_string_match`](crate::fragment::emit_string_match).

use crate::catalog::{Arity, OperatorTranslator};
use crate::error::CriteriaResult;
use crate::fragment::{emit_string_match, FragmentSink, StringMatch};
use crate::tree::Criterion;

const TEXT_PRIORITY: u8 = 50;

/// (positive operator, negative operator, match mode)
const TEXT_FAMILIES: &[(&str, &str, StringMatch)] = &[
    ("equals", "does_not_equal", StringMatch::Equals),
    ("contains", "does_not_contain", StringMatch::Contains),
    ("starts_with", "does_not_start_with", StringMatch::StartsWith),
    ("ends_with", "does_not_end_with", StringMatch::EndsWith),
    ("in", "not_in", StringMatch::In),
];

/// Textual operator over string or literal values.
#[derive(Debug, Clone)]
pub struct TextMatchTranslator {
    name: String,
    operator: &'static str,
    mode: StringMatch,
    negate: bool,
}

impl TextMatchTranslator {
    pub fn new(operator: &'static str, mode: StringMatch, negate: bool) -> Self {
        Self {
            name: format!("text:{}", operator),
            operator,
            mode,
            negate,
        }
    }

    /// Positive and negated translators for every textual family
    pub fn family() -> Vec<Self> {
        TEXT_FAMILIES
            .iter()
            .flat_map(|&(positive, negative, mode)| {
                [Self::new(positive, mode, false), Self::new(negative, mode, true)]
            })
            .collect()
    }

    pub fn operator(&self) -> &str {
        self.operator
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }
}

impl OperatorTranslator for TextMatchTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &Criterion) -> bool {
        criterion.operator == self.operator && criterion.value_type.is_textual()
    }

    fn priority(&self) -> u8 {
        TEXT_PRIORITY
    }

    fn arity(&self) -> Arity {
        Arity::AtLeastOne
    }

    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()> {
        emit_string_match(
            sink,
            &criterion.field,
            &criterion.values,
            self.mode,
            criterion.value_type,
            criterion.case_sensitive,
            self.negate,
        )
    }
}
