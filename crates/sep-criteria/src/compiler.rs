//! Criteria compiler.
//!
//! Compilation runs in three passes over the read-only tree:
//!
//! 1. shape validation ([`TreeValidator`])
//! 2. planning: every leaf is resolved against the catalog and its value
//!    count checked against the translator's arity
//! 3. rendering into a fresh [`FragmentSink`]
//!
//! Any failure aborts the whole call; there is never a partial fragment.

use crate::catalog::{default_catalog, OperationCatalog, OperatorTranslator};
use crate::config::CompilerConfig;
use crate::error::{CriteriaError, CriteriaResult};
use crate::fragment::FragmentSink;
use crate::tree::{CriteriaNode, Criterion};
use crate::validate::TreeValidator;
use std::slice;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Turns criteria trees into SPARQL filter fragments.
///
/// Holds no per-call state, so one compiler can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Compiler {
    catalog: Arc<OperationCatalog>,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Standard catalog, default config
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    /// Standard catalog, custom config
    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            catalog: default_catalog(),
            config,
        }
    }

    /// Custom catalog and config
    pub fn with_catalog(catalog: Arc<OperationCatalog>, config: CompilerConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a tree into `FILTER <expr>`.
    pub fn compile(&self, tree: &CriteriaNode) -> CriteriaResult<String> {
        TreeValidator::new(self.config.max_depth).validate(tree)?;

        let plan = self.plan(tree)?;
        debug!(
            criteria = plan.len(),
            depth = tree.depth(),
            "Compiling criteria tree"
        );

        let mut sink = FragmentSink::new(&self.config);
        sink.push_str("FILTER ");
        let mut steps = plan.iter();
        self.render_node(tree, &mut steps, &mut sink)?;

        if steps.next().is_some() {
            return Err(CriteriaError::Internal {
                translator: "compiler".to_string(),
                message: "resolved translators left over after rendering".to_string(),
            });
        }

        debug!(
            length = sink.as_str().len(),
            variables = sink.variables_used(),
            "Compiled criteria fragment"
        );
        Ok(sink.into_string())
    }

    /// Resolve every leaf up front and check value counts.
    fn plan<'c>(&'c self, tree: &CriteriaNode) -> CriteriaResult<Vec<&'c dyn OperatorTranslator>> {
        tree.criteria()
            .into_iter()
            .map(|criterion| {
                let translator = self.catalog.resolve(criterion)?;
                let arity = translator.arity();
                if !arity.accepts(criterion.values.len()) {
                    warn!(
                        translator = translator.name(),
                        field = %criterion.field,
                        values = criterion.values.len(),
                        "Criterion has the wrong number of values"
                    );
                    return Err(CriteriaError::validation(format!(
                        "operator '{}' on field '{}' takes {}, got {}",
                        criterion.operator,
                        criterion.field,
                        arity,
                        criterion.values.len()
                    )));
                }
                Ok(translator)
            })
            .collect()
    }

    fn render_node(
        &self,
        node: &CriteriaNode,
        steps: &mut slice::Iter<'_, &dyn OperatorTranslator>,
        sink: &mut FragmentSink<'_>,
    ) -> CriteriaResult<()> {
        match node {
            CriteriaNode::Criterion(criterion) => {
                let translator = steps.next().ok_or_else(|| CriteriaError::Internal {
                    translator: "compiler".to_string(),
                    message: format!("no resolved translator for field '{}'", criterion.field),
                })?;
                self.render_criterion(*translator, criterion, sink)
            }
            CriteriaNode::Junction(junction) => {
                let connective = format!(" {} ", junction.kind.connective());
                sink.push_str("( ");
                for (i, child) in junction.children.iter().enumerate() {
                    if i > 0 {
                        sink.push_str(&connective);
                    }
                    self.render_node(child, steps, sink)?;
                }
                sink.push_str(" )");
                Ok(())
            }
        }
    }

    fn render_criterion(
        &self,
        translator: &dyn OperatorTranslator,
        criterion: &Criterion,
        sink: &mut FragmentSink<'_>,
    ) -> CriteriaResult<()> {
        match translator.render(criterion, sink) {
            Ok(()) => Ok(()),
            Err(CriteriaError::UnsupportedOperator { operator, field }) => {
                // matches() accepted this criterion, so refusing it now is a translator bug
                error!(
                    translator = translator.name(),
                    operator = %operator,
                    field = %field,
                    "Translator rejected a criterion it matched"
                );
                Err(CriteriaError::Internal {
                    translator: translator.name().to_string(),
                    message: format!(
                        "matched operator '{}' on field '{}' but could not render it",
                        operator, field
                    ),
                })
            }
            Err(CriteriaError::Internal { translator: name, message }) => {
                error!(translator = %name, message = %message, "Internal translator error");
                Err(CriteriaError::Internal {
                    translator: name,
                    message,
                })
            }
            Err(err) => {
                warn!(
                    translator = translator.name(),
                    field = %criterion.field,
                    error = %err,
                    "Criterion failed to render"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperationCatalogBuilder;
    use crate::fragment::emit_numeric_comparison;
    use crate::tree::{Junction, ValueType};

    #[test]
    fn test_single_criterion() {
        let tree: CriteriaNode = Criterion::new("title", "equals").with_value("Report").into();
        let fragment = Compiler::new().compile(&tree).unwrap();

        assert_eq!(
            fragment,
            "FILTER EXISTS { ?instance emf:title ?v0 . FILTER ( LCASE(STR(?v0)) = \"report\" ) }"
        );
    }

    #[test]
    fn test_or_junction_uses_disjunction() {
        let tree: CriteriaNode = Junction::or([
            Criterion::new("a", "not_empty").into(),
            Criterion::new("b", "empty").into(),
        ])
        .into();
        let fragment = Compiler::new().compile(&tree).unwrap();

        assert_eq!(
            fragment,
            "FILTER ( EXISTS { ?instance emf:a ?v0 . } || NOT EXISTS { ?instance emf:b ?v1 . } )"
        );
    }

    #[test]
    fn test_single_child_junction_is_parenthesized() {
        let tree: CriteriaNode = Junction::and([Criterion::new("a", "not_empty").into()]).into();
        let fragment = Compiler::new().compile(&tree).unwrap();
        assert_eq!(fragment, "FILTER ( EXISTS { ?instance emf:a ?v0 . } )");
    }

    #[test]
    fn test_arity_checked_before_rendering() {
        let tree: CriteriaNode = Junction::and([
            Criterion::new("title", "contains").with_value("x").into(),
            Criterion::new("amount", "between")
                .with_type(ValueType::Numeric)
                .with_value("1")
                .into(),
        ])
        .into();

        let result = Compiler::new().compile(&tree);
        assert!(matches!(result, Err(CriteriaError::Validation { .. })));
    }

    #[test]
    fn test_existence_rejects_values() {
        let tree: CriteriaNode = Criterion::new("title", "empty").with_value("x").into();
        assert!(matches!(
            Compiler::new().compile(&tree),
            Err(CriteriaError::Validation { .. })
        ));
    }

    #[test]
    fn test_contract_violation_is_internal() {
        // Claims every operator, but the numeric primitive only knows numeric tokens
        let catalog = OperationCatalogBuilder::new()
            .with_fn(
                "greedy",
                1,
                |_| true,
                |criterion, sink| {
                    emit_numeric_comparison(
                        sink,
                        &criterion.field,
                        &criterion.operator,
                        &criterion.values,
                    )
                },
            )
            .build();
        let compiler = Compiler::with_catalog(Arc::new(catalog), CompilerConfig::default());
        let tree: CriteriaNode = Criterion::new("title", "contains").with_value("x").into();

        let err = compiler.compile(&tree).unwrap_err();
        assert!(err.is_internal());
        assert!(matches!(
            err,
            CriteriaError::Internal { ref translator, .. } if translator == "greedy"
        ));
    }

    #[test]
    fn test_custom_config_changes_names() {
        let config = CompilerConfig {
            subject_variable: "doc".to_string(),
            variable_prefix: "x".to_string(),
            default_prefix: "ptop".to_string(),
            ..CompilerConfig::default()
        };
        let tree: CriteriaNode = Criterion::new("owner", "not_empty").into();
        let fragment = Compiler::with_config(config).compile(&tree).unwrap();

        assert_eq!(fragment, "FILTER EXISTS { ?doc ptop:owner ?x0 . }");
    }
}
