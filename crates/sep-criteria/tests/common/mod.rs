//! Shared helpers for tests that evaluate compiled fragments
//!
//! Builds an in-memory SPARQL store from Turtle and runs a compiled
//! `FILTER` against it, returning the local names of the matching
//! instances. Every instance is typed `emf:Instance`, so rows without a
//! value for the filtered field still reach the filter.

use oxigraph::io::RdfFormat;
use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use sep_criteria::{Compiler, CriteriaNode};
use std::collections::BTreeSet;

pub const EMF: &str = "http://example.com/emf#";

const PREFIXES: &str = "@prefix emf: <http://example.com/emf#> .\n\
                        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n";

/// Store loaded from Turtle statements written against the `emf:` prefix
pub fn store_from_turtle(statements: &str) -> Store {
    let store = Store::new().expect("Failed to create store");
    let data = format!("{}{}", PREFIXES, statements);
    store
        .load_from_reader(RdfFormat::Turtle, data.as_bytes())
        .expect("Failed to load test data");
    store
}

/// Local names of the instances `fragment` keeps
pub fn run_fragment(store: &Store, fragment: &str) -> BTreeSet<String> {
    let query = format!(
        "PREFIX emf: <{}>\n\
         PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>\n\
         SELECT DISTINCT ?instance WHERE {{ ?instance a emf:Instance . {} }}",
        EMF, fragment
    );
    let results = store
        .query(query.as_str())
        .unwrap_or_else(|e| panic!("Query failed: {}\n{}", e, query));

    let QueryResults::Solutions(solutions) = results else {
        panic!("Expected solutions for {}", query);
    };
    solutions
        .map(|solution| {
            let solution = solution.expect("Failed to read solution");
            match solution.get("instance") {
                Some(Term::NamedNode(node)) => node
                    .as_str()
                    .strip_prefix(EMF)
                    .unwrap_or(node.as_str())
                    .to_string(),
                other => panic!("Unexpected binding {:?}", other),
            }
        })
        .collect()
}

/// Compile `tree` with the default compiler and run it against `store`
pub fn matching(store: &Store, tree: &CriteriaNode) -> BTreeSet<String> {
    let fragment = Compiler::new().compile(tree).expect("Failed to compile");
    run_fragment(store, &fragment)
}

/// Set of local names, for comparing against [`matching`]
pub fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
