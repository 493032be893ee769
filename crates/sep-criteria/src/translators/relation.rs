//! Object references: relations compared as RDF terms.
//!
//! `set_to` and `not_set_to` share [`emit_term_match`]; the negated operator
//! only flips `negate`. `set_to_some_but_not_to` requires the field to be set
//! to at least one value outside the given set.

use crate::catalog::{Arity, OperatorTranslator};
use crate::error::CriteriaResult;
use crate::fragment::{emit_term_exclusion, emit_term_match, FragmentSink};
use crate::tree::{Criterion, ValueType};

const RELATION_PRIORITY: u8 = 20;

/// (positive operator, negative operator)
const RELATION_FAMILIES: &[(&str, &str)] = &[
    ("set_to", "not_set_to"),
    ("in", "not_in"),
    ("equals", "does_not_equal"),
];

const EXCLUSION_OPERATOR: &str = "set_to_some_but_not_to";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationMode {
    Match { negate: bool },
    Exclusion,
}

/// Operator over IRI-valued fields.
#[derive(Debug, Clone)]
pub struct RelationTranslator {
    name: String,
    operator: &'static str,
    mode: RelationMode,
}

impl RelationTranslator {
    fn new(operator: &'static str, mode: RelationMode) -> Self {
        Self {
            name: format!("relation:{}", operator),
            operator,
            mode,
        }
    }

    pub fn matching(operator: &'static str, negate: bool) -> Self {
        Self::new(operator, RelationMode::Match { negate })
    }

    pub fn exclusion() -> Self {
        Self::new(EXCLUSION_OPERATOR, RelationMode::Exclusion)
    }

    /// Positive and negated term matches, then the exclusion operator
    pub fn family() -> Vec<Self> {
        let mut family: Vec<Self> = RELATION_FAMILIES
            .iter()
            .flat_map(|&(positive, negative)| {
                [Self::matching(positive, false), Self::matching(negative, true)]
            })
            .collect();
        family.push(Self::exclusion());
        family
    }

    pub fn operator(&self) -> &str {
        self.operator
    }
}

impl OperatorTranslator for RelationTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &Criterion) -> bool {
        criterion.value_type == ValueType::Iri && criterion.operator == self.operator
    }

    fn priority(&self) -> u8 {
        RELATION_PRIORITY
    }

    fn arity(&self) -> Arity {
        Arity::AtLeastOne
    }

    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()> {
        match self.mode {
            RelationMode::Match { negate } => {
                emit_term_match(sink, &criterion.field, &criterion.values, negate)
            }
            RelationMode::Exclusion => {
                emit_term_exclusion(sink, &criterion.field, &criterion.values)
            }
        }
    }
}
