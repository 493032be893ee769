//! Fragment builder.
//!
//! Shared rendering primitives used by every translator so that triple
//! patterns, filters, escaping and negation come out in one shape:
//!
//! ```text
//! EXISTS { ?instance emf:title ?v0 . FILTER ( CONTAINS(LCASE(STR(?v0)), "report") ) }
//! NOT EXISTS { ?instance emf:title ?v0 . FILTER ( CONTAINS(LCASE(STR(?v0)), "report") ) }
//! ```
//!
//! Negation is always the `NOT ` marker in front of the positive block.
//! The matching expression itself is never inverted.

use crate::config::CompilerConfig;
use crate::error::{CriteriaError, CriteriaResult};
use crate::tree::ValueType;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const STATEMENT_SEPARATOR: &str = " .";
const NEGATION_MARKER: &str = "NOT ";

/// Field name that matches a value under any predicate
pub const ANY_FIELD: &str = "*";

/// Range operand that leaves that side of a `between` open
pub const OPEN_BOUND: &str = "*";

static VARIABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]([A-Za-z0-9_.-]*[A-Za-z0-9_-])?$").unwrap());

static LOCAL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]([A-Za-z0-9_.-]*[A-Za-z0-9_-])?$").unwrap());

static IRI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(https?://|urn:)[^\s<>"{}|^`\\]+$"#).unwrap());

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+|\d*\.\d+|(\d+\.\d*|\.\d+|\d+)[eE][+-]?\d+)$").unwrap()
});

// ============================================================================
// Output sink
// ============================================================================

/// Write-only accumulator for one compilation.
///
/// Each compile call owns its sink, so concurrent compilations never share
/// a buffer. The sink also hands out fresh variable names in emission order.
#[derive(Debug)]
pub struct FragmentSink<'a> {
    buf: String,
    next_var: usize,
    config: &'a CompilerConfig,
}

impl<'a> FragmentSink<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self {
            buf: String::with_capacity(256),
            next_var: 0,
            config,
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub fn config(&self) -> &CompilerConfig {
        self.config
    }

    /// `?instance` (or the configured subject)
    pub fn subject(&self) -> String {
        format!("?{}", self.config.subject_variable)
    }

    /// Next unused value variable: `?v0`, `?v1`, ...
    pub fn fresh_var(&mut self) -> String {
        let var = format!("?{}{}", self.config.variable_prefix, self.next_var);
        self.next_var += 1;
        var
    }

    /// Number of variables handed out so far
    pub fn variables_used(&self) -> usize {
        self.next_var
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

// ============================================================================
// Names and predicates
// ============================================================================

/// SPARQL variable name without the leading `?`
pub fn is_valid_variable_name(name: &str) -> bool {
    VARIABLE_NAME_RE.is_match(name)
}

/// Namespace prefix such as `emf` or `dcterms`
pub fn is_valid_prefix(prefix: &str) -> bool {
    PREFIX_RE.is_match(prefix)
}

/// Absolute IRI without angle brackets
pub fn is_absolute_iri(value: &str) -> bool {
    IRI_RE.is_match(value)
}

/// `prefix:local`, with an optional empty prefix
pub fn is_prefixed_name(value: &str) -> bool {
    match value.split_once(':') {
        Some((prefix, local)) => {
            (prefix.is_empty() || is_valid_prefix(prefix)) && LOCAL_NAME_RE.is_match(local)
        }
        None => false,
    }
}

/// A term usable in predicate position: `<iri>`, a bare absolute IRI or a prefixed name
pub fn is_valid_predicate(value: &str) -> bool {
    if let Some(inner) = value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
        return is_absolute_iri(inner);
    }
    is_absolute_iri(value) || is_prefixed_name(value)
}

fn render_iri(value: &str) -> String {
    if is_absolute_iri(value) {
        format!("<{}>", value)
    } else {
        value.to_string()
    }
}

/// Predicate position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// A fixed predicate term such as `emf:title` or `<http://...>`
    Term(String),
    /// Any predicate; bound to a fresh variable when emitted
    AnyField,
}

/// Turn a criterion field into a predicate.
///
/// [`ANY_FIELD`] first, then an explicit mapping, absolute IRI, prefixed
/// name, and finally a bare local name qualified with the default prefix.
pub fn resolve_predicate(field: &str, config: &CompilerConfig) -> CriteriaResult<Predicate> {
    if field == ANY_FIELD {
        return Ok(Predicate::AnyField);
    }
    if let Some(mapped) = config.field_predicates.get(field) {
        return Ok(Predicate::Term(render_iri(mapped)));
    }
    if is_valid_predicate(field) {
        return Ok(Predicate::Term(render_iri(field)));
    }
    if LOCAL_NAME_RE.is_match(field) && !field.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(Predicate::Term(format!("{}:{}", config.default_prefix, field)));
    }
    Err(CriteriaError::validation(format!(
        "field '{}' is not a valid predicate, prefixed name or local name",
        field
    )))
}

// ============================================================================
// Escaping
// ============================================================================

/// Escape a string for a double-quoted SPARQL literal (without the quotes).
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    let mut after_backslash = false;
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            // `\u` and `\U` sequences are decoded before the query is parsed
            'u' if after_backslash => out.push_str("\\u0075"),
            'U' if after_backslash => out.push_str("\\u0055"),
            c => out.push(c),
        }
        after_backslash = ch == '\\';
    }
    out
}

/// Render one value as a SPARQL term according to its type.
///
/// Strings and literals are quoted and escaped. Numbers, dates and IRIs
/// are checked against their lexical form and passed through unescaped;
/// a malformed value is a validation error, never coerced. A day renders
/// as its first instant, midnight UTC.
pub fn escape_literal(value: &str, value_type: ValueType) -> CriteriaResult<String> {
    match value_type {
        ValueType::String | ValueType::Literal => Ok(format!("\"{}\"", escape_string(value))),
        ValueType::Numeric => {
            if NUMERIC_RE.is_match(value) {
                Ok(value.to_string())
            } else {
                Err(CriteriaError::validation(format!(
                    "'{}' is not a numeric literal",
                    value
                )))
            }
        }
        ValueType::Date => Ok(DateValue::parse(value)?.start()),
        ValueType::Iri => {
            if is_valid_predicate(value) {
                Ok(render_iri(value))
            } else {
                Err(CriteriaError::validation(format!(
                    "'{}' is neither an IRI nor a prefixed name",
                    value
                )))
            }
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Operand of a date comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DateValue {
    /// A whole day, midnight UTC to the following midnight
    Day(NaiveDate),
    /// An RFC 3339 date-time, kept as written
    Instant(String),
}

impl DateValue {
    fn parse(value: &str) -> CriteriaResult<Self> {
        // xsd:dateTime only allows the uppercase 'T' separator
        let has_time_separator = value.as_bytes().get(10) == Some(&b'T');
        if has_time_separator && DateTime::parse_from_rfc3339(value).is_ok() {
            return Ok(DateValue::Instant(value.to_string()));
        }
        if value.len() == 10 {
            if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                return Ok(DateValue::Day(day));
            }
        }
        Err(CriteriaError::validation(format!(
            "'{}' is not a date (YYYY-MM-DD) or RFC 3339 date-time",
            value
        )))
    }

    /// First instant covered by the value
    fn start(&self) -> String {
        match self {
            DateValue::Day(day) => midnight(*day),
            DateValue::Instant(text) => date_time_literal(text),
        }
    }
}

fn date_time_literal(text: &str) -> String {
    format!("\"{}\"^^xsd:dateTime", text)
}

fn midnight(day: NaiveDate) -> String {
    date_time_literal(&format!("{}T00:00:00Z", day.format("%Y-%m-%d")))
}

/// Midnight at the end of `day`
fn next_midnight(day: NaiveDate) -> CriteriaResult<String> {
    day.succ_opt()
        .map(midnight)
        .ok_or_else(|| CriteriaError::validation(format!("no day follows {}", day)))
}

// ============================================================================
// Triples and filters
// ============================================================================

/// Textual match modes shared by the string operator families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

/// `?instance <predicate> ?vN .`
///
/// For [`ANY_FIELD`] the predicate is itself a fresh variable.
pub fn emit_string_triple(
    sink: &mut FragmentSink<'_>,
    field: &str,
    bound_var: &str,
) -> CriteriaResult<()> {
    let predicate = match resolve_predicate(field, sink.config())? {
        Predicate::Term(term) => term,
        Predicate::AnyField => sink.fresh_var(),
    };
    let triple = format!(
        "{} {} {}{}",
        sink.subject(),
        predicate,
        bound_var,
        STATEMENT_SEPARATOR
    );
    sink.push_str(&triple);
    Ok(())
}

fn match_expression(mode: StringMatch, target: &str, term: &str) -> String {
    match mode {
        StringMatch::Equals => format!("{} = {}", target, term),
        StringMatch::Contains => format!("CONTAINS({}, {})", target, term),
        StringMatch::StartsWith => format!("STRSTARTS({}, {})", target, term),
        StringMatch::EndsWith => format!("STRENDS({}, {})", target, term),
        StringMatch::In => format!("{} IN ({})", target, term),
    }
}

/// `FILTER ( <match over bound_var> )`
pub fn emit_string_filter(
    sink: &mut FragmentSink<'_>,
    bound_var: &str,
    values: &[String],
    mode: StringMatch,
    value_type: ValueType,
    case_sensitive: bool,
) -> CriteriaResult<()> {
    if values.is_empty() {
        return Err(CriteriaError::validation("string filter needs at least one value"));
    }

    let target = if case_sensitive {
        format!("STR({})", bound_var)
    } else {
        format!("LCASE(STR({}))", bound_var)
    };

    let terms = values
        .iter()
        .map(|value| {
            if case_sensitive {
                escape_literal(value, value_type)
            } else {
                escape_literal(&value.to_lowercase(), value_type)
            }
        })
        .collect::<CriteriaResult<Vec<_>>>()?;

    let expression = match mode {
        StringMatch::In => match_expression(mode, &target, &terms.join(", ")),
        _ => {
            let parts: Vec<String> = terms
                .iter()
                .map(|term| match_expression(mode, &target, term))
                .collect();
            if parts.len() == 1 {
                parts.join("")
            } else {
                format!("( {} )", parts.join(" || "))
            }
        }
    };

    let guarded = match value_type {
        ValueType::Literal => format!("isLiteral({}) && {}", bound_var, expression),
        ValueType::String => expression,
        ValueType::Numeric | ValueType::Date | ValueType::Iri => {
            return Err(CriteriaError::validation(format!(
                "{} values cannot be matched as text",
                value_type
            )))
        }
    };

    sink.push_str(&format!("FILTER ( {} )", guarded));
    Ok(())
}

/// `EXISTS { body }`, or `NOT EXISTS { body }` when `negate` is set.
///
/// The body is written exactly once, so both forms are byte-identical apart
/// from the marker.
pub fn emit_exists<F>(sink: &mut FragmentSink<'_>, negate: bool, body: F) -> CriteriaResult<()>
where
    F: FnOnce(&mut FragmentSink<'_>) -> CriteriaResult<()>,
{
    if negate {
        sink.push_str(NEGATION_MARKER);
    }
    sink.push_str("EXISTS { ");
    body(sink)?;
    sink.push_str(" }");
    Ok(())
}

/// Shared primitive for every textual operator family.
///
/// Positive and negative operators both call this; they differ only in
/// `negate`.
pub fn emit_string_match(
    sink: &mut FragmentSink<'_>,
    field: &str,
    values: &[String],
    mode: StringMatch,
    value_type: ValueType,
    case_sensitive: bool,
    negate: bool,
) -> CriteriaResult<()> {
    emit_exists(sink, negate, |sink| {
        let var = sink.fresh_var();
        emit_string_triple(sink, field, &var)?;
        sink.push_str(" ");
        emit_string_filter(sink, &var, values, mode, value_type, case_sensitive)
    })
}

/// `[NOT ]EXISTS { ?instance <predicate> ?vN . }`
pub fn emit_existence(
    sink: &mut FragmentSink<'_>,
    field: &str,
    negate: bool,
) -> CriteriaResult<()> {
    emit_exists(sink, negate, |sink| {
        let var = sink.fresh_var();
        emit_string_triple(sink, field, &var)
    })
}

/// `[NOT ]EXISTS { ?instance <predicate> ?vN . FILTER ( ?vN IN (<a>, <b>) ) }`
///
/// Shared primitive for the object reference families. Values are compared
/// as RDF terms, never through their string form.
pub fn emit_term_match(
    sink: &mut FragmentSink<'_>,
    field: &str,
    values: &[String],
    negate: bool,
) -> CriteriaResult<()> {
    if values.is_empty() {
        return Err(CriteriaError::validation("term match needs at least one value"));
    }
    let terms = values
        .iter()
        .map(|value| escape_literal(value, ValueType::Iri))
        .collect::<CriteriaResult<Vec<_>>>()?;

    emit_exists(sink, negate, |sink| {
        let var = sink.fresh_var();
        emit_string_triple(sink, field, &var)?;
        sink.push_str(&format!(" FILTER ( {} IN ({}) )", var, terms.join(", ")));
        Ok(())
    })
}

/// `( EXISTS { .. } && NOT EXISTS { .. IN (..) } )`: the field is set, but to
/// none of `values`.
pub fn emit_term_exclusion(
    sink: &mut FragmentSink<'_>,
    field: &str,
    values: &[String],
) -> CriteriaResult<()> {
    sink.push_str("( ");
    emit_existence(sink, field, false)?;
    sink.push_str(" && ");
    emit_term_match(sink, field, values, true)?;
    sink.push_str(" )");
    Ok(())
}

// ============================================================================
// Comparisons
// ============================================================================

/// One-sided comparison against a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Equals,
    NotEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Bound {
    fn symbol(self) -> &'static str {
        match self {
            Bound::Equals => "=",
            Bound::NotEquals => "!=",
            Bound::Greater => ">",
            Bound::GreaterOrEqual => ">=",
            Bound::Less => "<",
            Bound::LessOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Single(Bound),
    /// Inclusive range; either side may be [`OPEN_BOUND`]
    Between,
}

impl Comparison {
    fn arity(self) -> usize {
        match self {
            Comparison::Single(_) => 1,
            Comparison::Between => 2,
        }
    }
}

fn numeric_comparison(operator: &str) -> Option<Comparison> {
    match operator {
        "equals" => Some(Comparison::Single(Bound::Equals)),
        "does_not_equal" => Some(Comparison::Single(Bound::NotEquals)),
        "greater_than" => Some(Comparison::Single(Bound::Greater)),
        "greater_or_equal" => Some(Comparison::Single(Bound::GreaterOrEqual)),
        "less_than" => Some(Comparison::Single(Bound::Less)),
        "less_or_equal" => Some(Comparison::Single(Bound::LessOrEqual)),
        "between" => Some(Comparison::Between),
        _ => None,
    }
}

fn date_comparison(operator: &str) -> Option<Comparison> {
    match operator {
        "equals" => Some(Comparison::Single(Bound::Equals)),
        "does_not_equal" => Some(Comparison::Single(Bound::NotEquals)),
        "after" => Some(Comparison::Single(Bound::Greater)),
        "before" => Some(Comparison::Single(Bound::Less)),
        "between" => Some(Comparison::Between),
        _ => None,
    }
}

/// Operator tokens understood by [`emit_numeric_comparison`]
pub const NUMERIC_OPERATORS: &[&str] = &[
    "equals",
    "does_not_equal",
    "greater_than",
    "greater_or_equal",
    "less_than",
    "less_or_equal",
    "between",
];

/// Operator tokens understood by [`emit_date_comparison`]
pub const DATE_OPERATORS: &[&str] = &["equals", "does_not_equal", "after", "before", "between"];

fn numeric_bound(var: &str, bound: Bound, value: &str) -> CriteriaResult<String> {
    let term = escape_literal(value, ValueType::Numeric)?;
    Ok(format!("{} {} {}", var, bound.symbol(), term))
}

/// Date-times compare directly. A day covers midnight to midnight, so
/// `equals` becomes a half-open range and `after` starts at the next day.
fn date_bound(var: &str, bound: Bound, value: &str) -> CriteriaResult<String> {
    let day = match DateValue::parse(value)? {
        DateValue::Instant(text) => {
            return Ok(format!("{} {} {}", var, bound.symbol(), date_time_literal(&text)))
        }
        DateValue::Day(day) => day,
    };
    let start = midnight(day);
    Ok(match bound {
        Bound::Equals => format!("{} >= {} && {} < {}", var, start, var, next_midnight(day)?),
        Bound::NotEquals => {
            format!("( {} < {} || {} >= {} )", var, start, var, next_midnight(day)?)
        }
        Bound::Greater => format!("{} >= {}", var, next_midnight(day)?),
        Bound::GreaterOrEqual => format!("{} >= {}", var, start),
        Bound::Less => format!("{} < {}", var, start),
        Bound::LessOrEqual => format!("{} < {}", var, next_midnight(day)?),
    })
}

fn range_expression<F>(var: &str, lower: &str, upper: &str, bound: F) -> CriteriaResult<String>
where
    F: Fn(&str, Bound, &str) -> CriteriaResult<String>,
{
    let lower = match lower {
        OPEN_BOUND => None,
        value => Some(bound(var, Bound::GreaterOrEqual, value)?),
    };
    let upper = match upper {
        OPEN_BOUND => None,
        value => Some(bound(var, Bound::LessOrEqual, value)?),
    };
    match (lower, upper) {
        (Some(lower), Some(upper)) => Ok(format!("{} && {}", lower, upper)),
        (Some(one), None) | (None, Some(one)) => Ok(one),
        (None, None) => Err(CriteriaError::validation(
            "between needs at least one bound that is not open",
        )),
    }
}

fn emit_comparison<F>(
    sink: &mut FragmentSink<'_>,
    field: &str,
    operator: &str,
    comparison: Comparison,
    values: &[String],
    bound: F,
) -> CriteriaResult<()>
where
    F: Fn(&str, Bound, &str) -> CriteriaResult<String>,
{
    let expected = comparison.arity();
    if values.len() != expected {
        return Err(CriteriaError::validation(format!(
            "operator '{}' on field '{}' takes {} value(s), got {}",
            operator,
            field,
            expected,
            values.len()
        )));
    }

    emit_exists(sink, false, |sink| {
        let var = sink.fresh_var();
        emit_string_triple(sink, field, &var)?;
        let expression = match comparison {
            Comparison::Single(single) => bound(&var, single, &values[0])?,
            Comparison::Between => range_expression(&var, &values[0], &values[1], &bound)?,
        };
        sink.push_str(&format!(" FILTER ( {} )", expression));
        Ok(())
    })
}

/// Numeric comparison; `does_not_equal` renders as `!=`.
///
/// Unknown operator tokens fail with `UnsupportedOperator`.
pub fn emit_numeric_comparison(
    sink: &mut FragmentSink<'_>,
    field: &str,
    operator: &str,
    values: &[String],
) -> CriteriaResult<()> {
    let comparison =
        numeric_comparison(operator).ok_or_else(|| CriteriaError::unsupported(operator, field))?;
    emit_comparison(sink, field, operator, comparison, values, numeric_bound)
}

/// Date comparison against `xsd:dateTime` literals.
pub fn emit_date_comparison(
    sink: &mut FragmentSink<'_>,
    field: &str,
    operator: &str,
    values: &[String],
) -> CriteriaResult<()> {
    let comparison =
        date_comparison(operator).ok_or_else(|| CriteriaError::unsupported(operator, field))?;
    emit_comparison(sink, field, operator, comparison, values, date_bound)
}
