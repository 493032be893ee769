//! Criteria tree model.
//!
//! A search request arrives as a tree of AND/OR junctions over leaf
//! criteria. The compiler only reads it; construction belongs to the caller.
//!
//! The serde shape matches what the search UI sends:
//!
//! ```json
//! {
//!   "condition": "AND",
//!   "rules": [
//!     { "field": "title", "operator": "contains", "type": "string", "value": ["report"] },
//!     { "field": "amount", "operator": "does_not_equal", "type": "numeric", "value": ["0"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the values of a criterion are formatted and escaped.
///
/// Every consumer matches on this exhaustively, so a new variant has to be
/// handled everywhere before the crate compiles again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Compared against the string form of any term (literal or IRI)
    #[default]
    String,
    /// Compared against literal terms only
    Literal,
    /// xsd numeric lexical form
    Numeric,
    /// `YYYY-MM-DD` day or RFC 3339 date-time, compared as `xsd:dateTime`
    Date,
    /// Object reference: absolute IRI or prefixed name, matched as a term
    #[serde(alias = "uri")]
    Iri,
}

impl ValueType {
    /// String and literal values share the textual rendering primitives.
    pub fn is_textual(self) -> bool {
        match self {
            ValueType::String | ValueType::Literal => true,
            ValueType::Numeric | ValueType::Date | ValueType::Iri => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Literal => "literal",
            ValueType::Numeric => "numeric",
            ValueType::Date => "date",
            ValueType::Iri => "iri",
        };
        f.write_str(name)
    }
}

/// Leaf comparison: `field operator values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub field: String,
    pub operator: String,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    #[serde(rename = "value", default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Criterion {
    /// Start a string criterion with no values
    pub fn new(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value_type: ValueType::String,
            values: Vec::new(),
            case_sensitive: false,
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Boolean connective of a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JunctionKind {
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl JunctionKind {
    /// SPARQL boolean operator joining the children
    pub fn connective(self) -> &'static str {
        match self {
            JunctionKind::And => "&&",
            JunctionKind::Or => "||",
        }
    }
}

impl fmt::Display for JunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JunctionKind::And => f.write_str("AND"),
            JunctionKind::Or => f.write_str("OR"),
        }
    }
}

/// Internal AND/OR node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Junction {
    #[serde(rename = "condition")]
    pub kind: JunctionKind,
    #[serde(rename = "rules")]
    pub children: Vec<CriteriaNode>,
}

impl Junction {
    pub fn new(kind: JunctionKind, children: Vec<CriteriaNode>) -> Self {
        Self { kind, children }
    }

    pub fn and(children: impl IntoIterator<Item = CriteriaNode>) -> Self {
        Self::new(JunctionKind::And, children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = CriteriaNode>) -> Self {
        Self::new(JunctionKind::Or, children.into_iter().collect())
    }
}

/// A node of the criteria tree.
///
/// Untagged: a JSON object with `condition`/`rules` is a junction, anything
/// else is tried as a criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaNode {
    Junction(Junction),
    Criterion(Criterion),
}

impl CriteriaNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, CriteriaNode::Criterion(_))
    }

    /// Children of a junction; empty for a leaf.
    pub fn children(&self) -> &[CriteriaNode] {
        match self {
            CriteriaNode::Junction(junction) => &junction.children,
            CriteriaNode::Criterion(_) => &[],
        }
    }

    pub fn as_criterion(&self) -> Option<&Criterion> {
        match self {
            CriteriaNode::Criterion(criterion) => Some(criterion),
            CriteriaNode::Junction(_) => None,
        }
    }

    pub fn as_junction(&self) -> Option<&Junction> {
        match self {
            CriteriaNode::Junction(junction) => Some(junction),
            CriteriaNode::Criterion(_) => None,
        }
    }

    /// Depth of the tree; a lone criterion has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(CriteriaNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Leaf criteria in left-to-right order.
    pub fn criteria(&self) -> Vec<&Criterion> {
        let mut out = Vec::new();
        self.collect_criteria(&mut out);
        out
    }

    fn collect_criteria<'a>(&'a self, out: &mut Vec<&'a Criterion>) {
        match self {
            CriteriaNode::Criterion(criterion) => out.push(criterion),
            CriteriaNode::Junction(junction) => {
                for child in &junction.children {
                    child.collect_criteria(out);
                }
            }
        }
    }
}

impl From<Criterion> for CriteriaNode {
    fn from(criterion: Criterion) -> Self {
        CriteriaNode::Criterion(criterion)
    }
}

impl From<Junction> for CriteriaNode {
    fn from(junction: Junction) -> Self {
        CriteriaNode::Junction(junction)
    }
}
