//! Intermediate element tree for the Elasticsearch translator
//!
//! The translator first lowers the query tree into these elements (pass A),
//! then each element emits its JSON form (pass B). Keys are emitted through
//! `serde_json::Map`, which keeps them sorted, so translation output is
//! deterministic.

use serde_json::{Map, Value};

use super::translator::EsQueryOptions;
use crate::utils;

/// `zero_terms_query` behavior of a `match` query: terms that analyze to
/// nothing match everything inside a must, nothing elsewhere
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZeroTerms {
    All,
    #[default]
    None,
}

impl ZeroTerms {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroTerms::All => "all",
            ZeroTerms::None => "none",
        }
    }
}

/// Bool clause kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EClause {
    Must,
    Should,
    MustNot,
}

/// A single word query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EWord {
    pub field: String,
    pub value: String,
    pub zero_terms: ZeroTerms,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A phrase query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EPhrase {
    pub field: String,
    /// Phrase content without the quotes, whitespace runs collapsed
    pub value: String,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A phrase query with slop
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EProximity {
    pub field: String,
    pub value: String,
    pub slop: u32,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A fuzzy term query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EFuzzy {
    pub field: String,
    pub value: String,
    pub fuzziness: f64,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A regexp query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ERegex {
    pub field: String,
    /// Pattern without the surrounding slashes
    pub value: String,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A range query; `None` bounds are open and omitted from the output
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ERange {
    pub field: String,
    pub gt: Option<String>,
    pub gte: Option<String>,
    pub lt: Option<String>,
    pub lte: Option<String>,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// An exists query, from `field:*`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EExists {
    pub field: String,
    pub boost: Option<f64>,
    pub name: Option<String>,
}

/// A bool query with its three clause lists
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EBool {
    pub must: Vec<EElement>,
    pub should: Vec<EElement>,
    pub must_not: Vec<EElement>,
}

/// A nested query wrapper
#[derive(Clone, Debug, PartialEq)]
pub struct ENested {
    pub path: String,
    pub query: Box<EElement>,
}

/// Boost on a compound query, emitted as a `function_score` wrapper
#[derive(Clone, Debug, PartialEq)]
pub struct EBoost {
    pub query: Box<EElement>,
    pub force: f64,
}

/// An element of the intermediate tree
#[derive(Clone, Debug, PartialEq)]
pub enum EElement {
    Word(EWord),
    Phrase(EPhrase),
    Proximity(EProximity),
    Fuzzy(EFuzzy),
    Regex(ERegex),
    Range(ERange),
    Exists(EExists),
    Bool(EBool),
    Nested(ENested),
    Boost(EBoost),
}

impl EElement {
    /// The targeted field, for leaf elements
    pub fn field(&self) -> Option<&str> {
        match self {
            EElement::Word(e) => Some(&e.field),
            EElement::Phrase(e) => Some(&e.field),
            EElement::Proximity(e) => Some(&e.field),
            EElement::Fuzzy(e) => Some(&e.field),
            EElement::Regex(e) => Some(&e.field),
            EElement::Range(e) => Some(&e.field),
            EElement::Exists(e) => Some(&e.field),
            EElement::Bool(_) | EElement::Nested(_) | EElement::Boost(_) => None,
        }
    }

    /// Attach a boost: leaf queries carry it inline, compound queries get a
    /// `function_score` wrapper
    pub fn boosted(self, force: f64) -> EElement {
        match self {
            EElement::Word(mut e) => {
                e.boost = Some(force);
                EElement::Word(e)
            }
            EElement::Phrase(mut e) => {
                e.boost = Some(force);
                EElement::Phrase(e)
            }
            EElement::Proximity(mut e) => {
                e.boost = Some(force);
                EElement::Proximity(e)
            }
            EElement::Fuzzy(mut e) => {
                e.boost = Some(force);
                EElement::Fuzzy(e)
            }
            EElement::Regex(mut e) => {
                e.boost = Some(force);
                EElement::Regex(e)
            }
            EElement::Range(mut e) => {
                e.boost = Some(force);
                EElement::Range(e)
            }
            EElement::Exists(mut e) => {
                e.boost = Some(force);
                EElement::Exists(e)
            }
            compound => EElement::Boost(EBoost {
                query: Box::new(compound),
                force,
            }),
        }
    }

    /// Set `zero_terms_query` placement; only word queries are affected
    pub fn set_zero_terms(&mut self, zero_terms: ZeroTerms) {
        if let EElement::Word(e) = self {
            e.zero_terms = zero_terms;
        }
    }

    /// Emit the Elasticsearch JSON form of this element
    pub fn to_json(&self, options: &EsQueryOptions) -> Value {
        match self {
            EElement::Word(e) => e.to_json(options),
            EElement::Phrase(e) => {
                let mut inner = base_inner(&e.field, options);
                inner.insert("query".into(), Value::String(e.value.clone()));
                finish_leaf(&mut inner, &e.boost, &e.name);
                field_query("match_phrase", &e.field, inner)
            }
            EElement::Proximity(e) => {
                let mut inner = base_inner(&e.field, options);
                inner.insert("query".into(), Value::String(e.value.clone()));
                inner.insert("slop".into(), Value::from(e.slop));
                finish_leaf(&mut inner, &e.boost, &e.name);
                field_query("match_phrase", &e.field, inner)
            }
            EElement::Fuzzy(e) => {
                let mut inner = base_inner(&e.field, options);
                inner.insert("value".into(), Value::String(e.value.clone()));
                inner.insert("fuzziness".into(), Value::from(e.fuzziness));
                finish_leaf(&mut inner, &e.boost, &e.name);
                field_query("fuzzy", &e.field, inner)
            }
            EElement::Regex(e) => {
                let mut inner = base_inner(&e.field, options);
                inner.insert("value".into(), Value::String(e.value.clone()));
                finish_leaf(&mut inner, &e.boost, &e.name);
                field_query("regexp", &e.field, inner)
            }
            EElement::Range(e) => {
                let mut inner = base_inner(&e.field, options);
                for (key, bound) in [
                    ("gt", &e.gt),
                    ("gte", &e.gte),
                    ("lt", &e.lt),
                    ("lte", &e.lte),
                ] {
                    if let Some(bound) = bound {
                        inner.insert(key.into(), Value::String(bound.clone()));
                    }
                }
                finish_leaf(&mut inner, &e.boost, &e.name);
                field_query("range", &e.field, inner)
            }
            EElement::Exists(e) => {
                let mut inner = Map::new();
                inner.insert("field".into(), Value::String(e.field.clone()));
                finish_leaf(&mut inner, &e.boost, &e.name);
                wrap_object("exists", Value::Object(inner))
            }
            EElement::Bool(e) => e.to_json(options),
            EElement::Nested(e) => {
                let mut inner = Map::new();
                inner.insert("path".into(), Value::String(e.path.clone()));
                inner.insert("query".into(), e.query.to_json(options));
                wrap_object("nested", Value::Object(inner))
            }
            EElement::Boost(e) => {
                let mut inner = Map::new();
                inner.insert("query".into(), e.query.to_json(options));
                inner.insert("boost".into(), Value::from(e.force));
                wrap_object("function_score", Value::Object(inner))
            }
        }
    }
}

impl EWord {
    fn to_json(&self, options: &EsQueryOptions) -> Value {
        let analyzed = !options.not_analyzed_fields.contains(&self.field);
        let wildcarded = utils::has_wildcard(&self.value);

        if !analyzed {
            let method = if wildcarded { "wildcard" } else { "term" };
            let mut inner = base_inner(&self.field, options);
            inner.insert("value".into(), Value::String(self.value.clone()));
            finish_leaf(&mut inner, &self.boost, &self.name);
            return field_query(method, &self.field, inner);
        }

        if wildcarded {
            // wildcards on analyzed fields go through the query_string syntax
            let mut inner = base_inner(&self.field, options);
            inner.insert("query".into(), Value::String(self.value.clone()));
            inner.insert(
                "default_field".into(),
                Value::String(self.field.clone()),
            );
            inner
                .entry("analyze_wildcard")
                .or_insert(Value::Bool(true));
            inner
                .entry("allow_leading_wildcard")
                .or_insert(Value::Bool(true));
            finish_leaf(&mut inner, &self.boost, &self.name);
            return wrap_object("query_string", Value::Object(inner));
        }

        let configured = options
            .field_options
            .get(&self.field)
            .and_then(|opts| opts.get("match_type"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let method = configured.unwrap_or_else(|| {
            if options.match_word_as_phrase {
                "match_phrase".to_string()
            } else {
                "match".to_string()
            }
        });

        let mut inner = base_inner(&self.field, options);
        inner.insert("query".into(), Value::String(self.value.clone()));
        if method == "match" {
            inner.insert(
                "zero_terms_query".into(),
                Value::String(self.zero_terms.as_str().to_string()),
            );
        }
        finish_leaf(&mut inner, &self.boost, &self.name);
        if method == "multi_match" {
            wrap_object("multi_match", Value::Object(inner))
        } else {
            field_query(&method, &self.field, inner)
        }
    }
}

impl EBool {
    fn to_json(&self, options: &EsQueryOptions) -> Value {
        // a bool holding a single must or should entry is that entry
        if self.must.len() == 1 && self.should.is_empty() && self.must_not.is_empty() {
            return self.must[0].to_json(options);
        }
        if self.should.len() == 1 && self.must.is_empty() && self.must_not.is_empty() {
            return self.should[0].to_json(options);
        }

        let mut clauses = Map::new();
        for (key, items) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            if !items.is_empty() {
                clauses.insert(
                    key.into(),
                    Value::Array(items.iter().map(|i| i.to_json(options)).collect()),
                );
            }
        }
        wrap_object("bool", Value::Object(clauses))
    }
}

/// Per-field options from the configuration, minus the `match_type` marker
fn base_inner(field: &str, options: &EsQueryOptions) -> Map<String, Value> {
    let mut inner = options
        .field_options
        .get(field)
        .cloned()
        .unwrap_or_default();
    inner.remove("match_type");
    inner
}

fn finish_leaf(inner: &mut Map<String, Value>, boost: &Option<f64>, name: &Option<String>) {
    if let Some(boost) = boost {
        inner.insert("boost".into(), Value::from(*boost));
    }
    if let Some(name) = name {
        inner.insert("_name".into(), Value::String(name.clone()));
    }
}

fn field_query(method: &str, field: &str, inner: Map<String, Value>) -> Value {
    let mut per_field = Map::new();
    per_field.insert(field.to_string(), Value::Object(inner));
    wrap_object(method, Value::Object(per_field))
}

fn wrap_object(key: &str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), value);
    Value::Object(object)
}
