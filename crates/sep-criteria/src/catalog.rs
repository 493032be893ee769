//! Operation catalog and operator resolution.
//!
//! The catalog owns the ordered list of operator translators and answers
//! "who handles this criterion?". It is built once at startup through
//! [`OperationCatalogBuilder`] and shared read-only afterwards.
//!
//! Resolution is first match in ascending priority order. Registration
//! order breaks ties, so narrower translators registered for the same
//! operator name fire before generic fallbacks.

use crate::error::{CriteriaError, CriteriaResult};
use crate::fragment::FragmentSink;
use crate::translators::standard_translators;
use crate::tree::Criterion;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Default translator priority
pub const DEFAULT_PRIORITY: u8 = 50;

/// Number of values a translator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Existence checks take no values
    None,
    Exactly(usize),
    AtLeastOne,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::None => count == 0,
            Arity::Exactly(n) => count == n,
            Arity::AtLeastOne => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::None => f.write_str("no values"),
            Arity::Exactly(1) => f.write_str("exactly 1 value"),
            Arity::Exactly(n) => write!(f, "exactly {} values", n),
            Arity::AtLeastOne => f.write_str("at least 1 value"),
        }
    }
}

/// Renders one operator family into query text.
///
/// - `matches()` decides applicability
/// - `priority()` orders the catalog (lower = tried first)
/// - `render()` is only called on criteria `matches()` accepted
pub trait OperatorTranslator: Send + Sync {
    /// Unique name for diagnostics
    fn name(&self) -> &str;

    /// Whether this translator handles the criterion
    fn matches(&self, criterion: &Criterion) -> bool;

    /// Priority (lower = tried first). Default: 50
    fn priority(&self) -> u8 {
        DEFAULT_PRIORITY
    }

    /// Accepted number of values, checked before rendering
    fn arity(&self) -> Arity {
        Arity::AtLeastOne
    }

    /// Append the fragment for `criterion` to `sink`.
    ///
    /// May fail with `Validation` for malformed values. Reporting the
    /// criterion as unsupported after `matches()` accepted it is a defect.
    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()>;
}

type MatchFn = dyn Fn(&Criterion) -> bool + Send + Sync;
type RenderFn = dyn Fn(&Criterion, &mut FragmentSink<'_>) -> CriteriaResult<()> + Send + Sync;

/// Translator assembled from closures, for operators added by the host.
pub struct FnTranslator {
    name: String,
    priority: u8,
    arity: Arity,
    matches: Box<MatchFn>,
    render: Box<RenderFn>,
}

impl FnTranslator {
    pub fn new<M, R>(name: impl Into<String>, priority: u8, matches: M, render: R) -> Self
    where
        M: Fn(&Criterion) -> bool + Send + Sync + 'static,
        R: Fn(&Criterion, &mut FragmentSink<'_>) -> CriteriaResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            arity: Arity::AtLeastOne,
            matches: Box::new(matches),
            render: Box::new(render),
        }
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }
}

impl OperatorTranslator for FnTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, criterion: &Criterion) -> bool {
        (self.matches)(criterion)
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn render(&self, criterion: &Criterion, sink: &mut FragmentSink<'_>) -> CriteriaResult<()> {
        (self.render)(criterion, sink)
    }
}

/// Registry of translators (sorted by priority ascending, stable).
pub struct OperationCatalog {
    translators: Vec<Arc<dyn OperatorTranslator>>,
}

impl Default for OperationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationCatalog")
            .field("translators", &self.translator_names())
            .finish()
    }
}

impl OperationCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            translators: Vec::new(),
        }
    }

    /// Catalog with every built-in operator family
    pub fn standard() -> Self {
        OperationCatalogBuilder::new()
            .with_standard_translators()
            .build()
    }

    /// Register a translator (re-sorts by priority, keeping registration order on ties)
    pub fn register(&mut self, translator: Arc<dyn OperatorTranslator>) {
        debug!(
            translator = translator.name(),
            priority = translator.priority(),
            "Registering operator translator"
        );
        self.translators.push(translator);
        self.translators.sort_by_key(|t| t.priority());
    }

    /// Register a closure-based translator
    pub fn register_translator<M, R>(
        &mut self,
        name: impl Into<String>,
        priority: u8,
        matches: M,
        render: R,
    ) where
        M: Fn(&Criterion) -> bool + Send + Sync + 'static,
        R: Fn(&Criterion, &mut FragmentSink<'_>) -> CriteriaResult<()> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTranslator::new(name, priority, matches, render)));
    }

    /// First translator whose `matches()` accepts the criterion
    pub fn resolve(&self, criterion: &Criterion) -> CriteriaResult<&dyn OperatorTranslator> {
        for translator in &self.translators {
            if translator.matches(criterion) {
                trace!(
                    translator = translator.name(),
                    field = %criterion.field,
                    operator = %criterion.operator,
                    "Resolved operator translator"
                );
                return Ok(translator.as_ref());
            }
        }
        warn!(
            field = %criterion.field,
            operator = %criterion.operator,
            value_type = %criterion.value_type,
            "No translator matches criterion"
        );
        Err(CriteriaError::unsupported(
            criterion.operator.clone(),
            criterion.field.clone(),
        ))
    }

    /// Registered translator names in resolution order
    pub fn translator_names(&self) -> Vec<&str> {
        self.translators.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

/// Builder for ergonomic catalog construction
pub struct OperationCatalogBuilder {
    translators: Vec<Arc<dyn OperatorTranslator>>,
}

impl Default for OperationCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationCatalogBuilder {
    pub fn new() -> Self {
        Self {
            translators: Vec::new(),
        }
    }

    /// Add a translator to the catalog
    pub fn with_translator(mut self, translator: impl OperatorTranslator + 'static) -> Self {
        self.translators.push(Arc::new(translator));
        self
    }

    /// Add a closure-based translator
    pub fn with_fn<M, R>(self, name: impl Into<String>, priority: u8, matches: M, render: R) -> Self
    where
        M: Fn(&Criterion) -> bool + Send + Sync + 'static,
        R: Fn(&Criterion, &mut FragmentSink<'_>) -> CriteriaResult<()> + Send + Sync + 'static,
    {
        self.with_translator(FnTranslator::new(name, priority, matches, render))
    }

    /// Add every built-in operator family
    pub fn with_standard_translators(mut self) -> Self {
        self.translators.extend(standard_translators());
        self
    }

    /// Build the catalog
    pub fn build(self) -> OperationCatalog {
        let mut catalog = OperationCatalog::new();
        for translator in self.translators {
            catalog.register(translator);
        }
        catalog
    }
}

static DEFAULT_CATALOG: Lazy<Arc<OperationCatalog>> =
    Lazy::new(|| Arc::new(OperationCatalog::standard()));

/// Process-wide standard catalog, built on first use
pub fn default_catalog() -> Arc<OperationCatalog> {
    Arc::clone(&DEFAULT_CATALOG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    struct MockTranslator {
        name: &'static str,
        priority: u8,
        operator: &'static str,
    }

    impl OperatorTranslator for MockTranslator {
        fn name(&self) -> &str {
            self.name
        }

        fn matches(&self, criterion: &Criterion) -> bool {
            criterion.operator == self.operator
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn render(
            &self,
            _criterion: &Criterion,
            sink: &mut FragmentSink<'_>,
        ) -> CriteriaResult<()> {
            sink.push_str(self.name);
            Ok(())
        }
    }

    fn mock(name: &'static str, priority: u8, operator: &'static str) -> MockTranslator {
        MockTranslator {
            name,
            priority,
            operator,
        }
    }

    #[test]
    fn test_catalog_priority_order() {
        let catalog = OperationCatalogBuilder::new()
            .with_translator(mock("high", 90, "equals"))
            .with_translator(mock("low", 10, "equals"))
            .with_translator(mock("medium", 50, "equals"))
            .build();

        // Should be sorted low -> medium -> high
        assert_eq!(catalog.translator_names(), vec!["low", "medium", "high"]);
    }

    #[test]
    fn test_lowest_priority_match_wins() {
        let catalog = OperationCatalogBuilder::new()
            .with_translator(mock("generic", 90, "equals"))
            .with_translator(mock("specific", 10, "equals"))
            .build();

        let criterion = Criterion::new("title", "equals").with_value("x");
        assert_eq!(catalog.resolve(&criterion).unwrap().name(), "specific");
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let catalog = OperationCatalogBuilder::new()
            .with_translator(mock("first", 50, "equals"))
            .with_translator(mock("second", 50, "equals"))
            .build();

        let criterion = Criterion::new("title", "equals").with_value("x");
        for _ in 0..10 {
            assert_eq!(catalog.resolve(&criterion).unwrap().name(), "first");
        }
    }

    #[test]
    fn test_non_matching_skipped() {
        let catalog = OperationCatalogBuilder::new()
            .with_translator(mock("contains", 10, "contains"))
            .with_translator(mock("equals", 50, "equals"))
            .build();

        let criterion = Criterion::new("title", "equals").with_value("x");
        assert_eq!(catalog.resolve(&criterion).unwrap().name(), "equals");
    }

    #[test]
    fn test_no_match_is_unsupported() {
        let catalog = OperationCatalogBuilder::new()
            .with_translator(mock("equals", 50, "equals"))
            .build();

        let criterion = Criterion::new("title", "bogus_op").with_value("x");
        let result = catalog.resolve(&criterion);
        assert!(matches!(
            result,
            Err(CriteriaError::UnsupportedOperator { ref operator, ref field })
                if operator == "bogus_op" && field == "title"
        ));
    }

    #[test]
    fn test_register_translator_closure() {
        let mut catalog = OperationCatalog::new();
        catalog.register_translator(
            "similar_to",
            20,
            |c| c.operator == "similar_to",
            |_, sink| {
                sink.push_str("similar");
                Ok(())
            },
        );

        let config = CompilerConfig::default();
        let mut sink = FragmentSink::new(&config);
        let criterion = Criterion::new("title", "similar_to").with_value("x");
        let translator = catalog.resolve(&criterion).unwrap();
        translator.render(&criterion, &mut sink).unwrap();

        assert_eq!(translator.name(), "similar_to");
        assert_eq!(translator.priority(), 20);
        assert_eq!(sink.as_str(), "similar");
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::None.accepts(0));
        assert!(!Arity::None.accepts(1));
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::AtLeastOne.accepts(4));
        assert!(!Arity::AtLeastOne.accepts(0));
    }

    #[test]
    fn test_default_catalog_is_shared() {
        let a = default_catalog();
        let b = default_catalog();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.is_empty());
    }
}
