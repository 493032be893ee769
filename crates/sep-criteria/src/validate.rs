//! Tree shape validation.
//!
//! Runs before anything is rendered so that a malformed tree fails fast
//! instead of being discovered halfway through a fragment.

use crate::error::{CriteriaError, CriteriaResult};
use crate::tree::CriteriaNode;
use tracing::warn;

/// Checks the structural invariants of a criteria tree.
///
/// - every junction has at least one child
/// - every criterion has a non-blank field and operator
/// - nesting stays within `max_depth`
pub struct TreeValidator {
    max_depth: usize,
}

impl TreeValidator {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Walks the tree iteratively, so arbitrarily deep input cannot overflow the stack.
    pub fn validate(&self, tree: &CriteriaNode) -> CriteriaResult<()> {
        let mut stack: Vec<(&CriteriaNode, usize)> = vec![(tree, 1)];

        while let Some((node, depth)) = stack.pop() {
            if depth > self.max_depth {
                return Err(self.reject(format!(
                    "criteria tree is deeper than the maximum of {}",
                    self.max_depth
                )));
            }
            match node {
                CriteriaNode::Junction(junction) => {
                    if junction.children.is_empty() {
                        return Err(
                            self.reject(format!("{} junction has no children", junction.kind))
                        );
                    }
                    stack.extend(junction.children.iter().rev().map(|child| (child, depth + 1)));
                }
                CriteriaNode::Criterion(criterion) => {
                    if criterion.field.trim().is_empty() {
                        return Err(self.reject(format!(
                            "criterion with operator '{}' has an empty field",
                            criterion.operator
                        )));
                    }
                    if criterion.operator.trim().is_empty() {
                        return Err(self.reject(format!(
                            "criterion on field '{}' has an empty operator",
                            criterion.field
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn reject(&self, message: String) -> CriteriaError {
        warn!(reason = %message, "Rejected criteria tree");
        CriteriaError::validation(message)
    }
}
