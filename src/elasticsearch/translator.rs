//! Lowering of query trees into the Elasticsearch query DSL
//!
//! Translation runs in two passes. Pass A walks the query tree and builds an
//! [`EElement`] tree, threading an explicit field context so that every leaf
//! knows its dotted field. A wrapping pass then inserts `nested` wrappers
//! where a field lies under a declared nested path, grouping siblings that
//! share a path inside the same bool clause. Pass B, in
//! [`super::tree`], emits the JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tree::{
    EBool, EClause, EElement, EExists, EFuzzy, ENested, EPhrase, EProximity, ERange, ERegex,
    EWord, ZeroTerms,
};
use crate::check::NestedFieldsChecker;
use crate::error::{LuceqError, Result};
use crate::tree::{BoolOperator, Node, NodeKind};

/// Configuration of the Elasticsearch translator
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EsQueryOptions {
    /// Field used when a term appears without `field:`
    pub default_field: Option<String>,
    /// Resolution of unknown operations; without it they are rejected
    pub default_operator: Option<BoolOperator>,
    /// Fields queried with `term`/`range`/`wildcard` rather than `match`
    pub not_analyzed_fields: BTreeSet<String>,
    /// Dotted nested path to the names of its direct sub-fields
    pub nested_fields: BTreeMap<String, BTreeSet<String>>,
    /// Dotted leaf paths living inside plain object mappings
    pub object_fields: Option<BTreeSet<String>>,
    /// `parent.sub` multi-fields to their type
    pub sub_fields: Option<BTreeMap<String, String>>,
    /// Per-field overrides merged into the emitted query; the `match_type`
    /// key selects `match`, `match_phrase` or `multi_match`
    pub field_options: BTreeMap<String, Map<String, Value>>,
    /// Emit `match_phrase` instead of `match` for single words
    pub match_word_as_phrase: bool,
}

impl EsQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn with_default_operator(mut self, operator: BoolOperator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    pub fn with_not_analyzed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_analyzed_fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_nested_field<I, S>(mut self, path: impl Into<String>, sub_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nested_fields.insert(
            path.into(),
            sub_fields.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_object_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_field_options(
        mut self,
        field: impl Into<String>,
        options: Map<String, Value>,
    ) -> Self {
        self.field_options.insert(field.into(), options);
        self
    }

    pub fn with_match_word_as_phrase(mut self, enabled: bool) -> Self {
        self.match_word_as_phrase = enabled;
        self
    }
}

/// Translate a query tree into the Elasticsearch query DSL
pub fn translate(tree: &Node, options: &EsQueryOptions) -> Result<Value> {
    ElasticsearchQueryBuilder::new(options).build(tree)
}

/// Explicit state threaded through pass A: the stack of field names pushed
/// by the search fields crossed on the way down
#[derive(Debug, Default)]
struct FieldContext {
    fields: Vec<String>,
}

impl FieldContext {
    fn push(&mut self, name: &str) {
        self.fields.push(name.to_string());
    }

    fn pop(&mut self) {
        self.fields.pop();
    }

    fn current(&self) -> Option<String> {
        if self.fields.is_empty() {
            None
        } else {
            Some(self.fields.join("."))
        }
    }
}

/// Query builder converting a tree into the Elasticsearch query DSL
pub struct ElasticsearchQueryBuilder<'a> {
    options: &'a EsQueryOptions,
}

impl<'a> ElasticsearchQueryBuilder<'a> {
    pub fn new(options: &'a EsQueryOptions) -> Self {
        Self { options }
    }

    /// Check the tree against the declared mappings, lower it and emit JSON
    pub fn build(&self, tree: &Node) -> Result<Value> {
        tracing::debug!(query = %tree, "translating query tree");
        let sub_field_names: Option<BTreeSet<String>> = self
            .options
            .sub_fields
            .as_ref()
            .map(|subs| subs.keys().cloned().collect());
        NestedFieldsChecker::new(
            &self.options.nested_fields,
            self.options.object_fields.as_ref(),
            sub_field_names.as_ref(),
        )
        .check(tree)?;

        let mut context = FieldContext::default();
        let element = self.element(tree, &mut context)?;
        let mut ancestors = BTreeSet::new();
        let element = self.wrap_element(element, &mut ancestors);
        Ok(element.to_json(self.options))
    }

    fn resolve_field(&self, ctx: &FieldContext) -> Result<String> {
        ctx.current()
            .or_else(|| self.options.default_field.clone())
            .ok_or_else(|| {
                LuceqError::InconsistentQuery(
                    "no field is given and no default_field is configured".to_string(),
                )
            })
    }

    /// Pass A: lower a node to its element
    fn element(&self, node: &Node, ctx: &mut FieldContext) -> Result<EElement> {
        match &node.kind {
            NodeKind::None => Err(LuceqError::InconsistentQuery(
                "placeholder node in tree".to_string(),
            )),
            NodeKind::Word { value } => {
                let field = self.resolve_field(ctx)?;
                if node.is_star() {
                    Ok(EElement::Exists(EExists {
                        field,
                        boost: None,
                        name: node.name.clone(),
                    }))
                } else {
                    Ok(EElement::Word(EWord {
                        field,
                        value: value.clone(),
                        zero_terms: ZeroTerms::None,
                        boost: None,
                        name: node.name.clone(),
                    }))
                }
            }
            NodeKind::Phrase { value } => Ok(EElement::Phrase(EPhrase {
                field: self.resolve_field(ctx)?,
                value: clean_phrase(value),
                boost: None,
                name: node.name.clone(),
            })),
            NodeKind::Regex { value } => Ok(EElement::Regex(ERegex {
                field: self.resolve_field(ctx)?,
                value: value[1..value.len() - 1].to_string(),
                boost: None,
                name: node.name.clone(),
            })),
            NodeKind::SearchField { name, expr } => {
                ctx.push(name);
                let element = self.element(expr, ctx);
                ctx.pop();
                element
            }
            NodeKind::Group { expr } | NodeKind::FieldGroup { expr } => self.element(expr, ctx),
            NodeKind::Range {
                low,
                high,
                include_low,
                include_high,
            } => {
                let mut range = ERange {
                    field: self.resolve_field(ctx)?,
                    name: node.name.clone(),
                    ..Default::default()
                };
                if !low.is_star() {
                    let low_value = low.value().unwrap_or_default().to_string();
                    if *include_low {
                        range.gte = Some(low_value);
                    } else {
                        range.gt = Some(low_value);
                    }
                }
                if !high.is_star() {
                    let high_value = high.value().unwrap_or_default().to_string();
                    if *include_high {
                        range.lte = Some(high_value);
                    } else {
                        range.lt = Some(high_value);
                    }
                }
                Ok(EElement::Range(range))
            }
            NodeKind::Fuzzy { term, degree } => {
                let value = term.value().ok_or_else(|| {
                    LuceqError::InconsistentQuery("fuzziness applies to a word".to_string())
                })?;
                Ok(EElement::Fuzzy(EFuzzy {
                    field: self.resolve_field(ctx)?,
                    value: value.to_string(),
                    fuzziness: degree.unwrap_or(0.5),
                    boost: None,
                    name: node.name.clone(),
                }))
            }
            NodeKind::Proximity { term, degree } => {
                let value = term.value().ok_or_else(|| {
                    LuceqError::InconsistentQuery("proximity applies to a phrase".to_string())
                })?;
                Ok(EElement::Proximity(EProximity {
                    field: self.resolve_field(ctx)?,
                    value: clean_phrase(value),
                    slop: degree.unwrap_or(1),
                    boost: None,
                    name: node.name.clone(),
                }))
            }
            NodeKind::Boost { expr, force } => {
                Ok(self.element(expr, ctx)?.boosted(*force))
            }
            NodeKind::Not { expr } | NodeKind::Prohibit { expr } => {
                let mut item = self.element(expr, ctx)?;
                item.set_zero_terms(ZeroTerms::None);
                Ok(EElement::Bool(EBool {
                    must_not: vec![item],
                    ..Default::default()
                }))
            }
            NodeKind::Plus { expr } => {
                let mut item = self.element(expr, ctx)?;
                item.set_zero_terms(ZeroTerms::All);
                Ok(EElement::Bool(EBool {
                    must: vec![item],
                    ..Default::default()
                }))
            }
            NodeKind::And { .. } => self.bool_operation(node, EClause::Must, ctx),
            NodeKind::Or { .. } => self.bool_operation(node, EClause::Should, ctx),
            NodeKind::Unknown { .. } => match self.options.default_operator {
                Some(BoolOperator::And) => self.bool_operation(node, EClause::Must, ctx),
                Some(BoolOperator::Or) => self.bool_operation(node, EClause::Should, ctx),
                None => Err(LuceqError::UnknownOperationUnresolved),
            },
        }
    }

    fn bool_operation(
        &self,
        node: &Node,
        clause: EClause,
        ctx: &mut FieldContext,
    ) -> Result<EElement> {
        let operands = flatten_same(node);
        for child in &operands {
            self.check_same_level(node, child)?;
        }
        let mut items = Vec::with_capacity(operands.len());
        for child in operands {
            items.push(self.element(child, ctx)?);
        }
        if clause == EClause::Must {
            for item in &mut items {
                item.set_zero_terms(ZeroTerms::All);
            }
        }
        Ok(EElement::Bool(match clause {
            EClause::Must => EBool {
                must: items,
                ..Default::default()
            },
            EClause::Should => EBool {
                should: items,
                ..Default::default()
            },
            EClause::MustNot => EBool {
                must_not: items,
                ..Default::default()
            },
        }))
    }

    fn is_must_operation(&self, node: &Node) -> bool {
        match node.kind {
            NodeKind::And { .. } => true,
            NodeKind::Unknown { .. } => {
                self.options.default_operator == Some(BoolOperator::And)
            }
            _ => false,
        }
    }

    fn is_should_operation(&self, node: &Node) -> bool {
        match node.kind {
            NodeKind::Or { .. } => true,
            NodeKind::Unknown { .. } => self.options.default_operator == Some(BoolOperator::Or),
            _ => false,
        }
    }

    /// Mixing AND and OR on the same level without parenthesis gives
    /// unpredictable results, refuse it
    fn check_same_level(&self, parent: &Node, child: &Node) -> Result<()> {
        let conflict = (self.is_must_operation(parent) && self.is_should_operation(child))
            || (self.is_should_operation(parent) && self.is_must_operation(child));
        if conflict {
            return Err(LuceqError::OrAndAndOnSameLevel(
                child.to_string().trim().to_string(),
            ));
        }
        Ok(())
    }

    /// First nested path still to wrap for `field`, shortest first
    fn first_needed_path(&self, field: &str, ancestors: &BTreeSet<String>) -> Option<String> {
        self.options
            .nested_fields
            .keys()
            .filter(|path| field.starts_with(&format!("{}.", path)))
            .filter(|path| !ancestors.contains(*path))
            .min_by_key(|path| path.len())
            .cloned()
    }

    /// Nested path needed by every leaf of `element`, if they agree
    fn common_needed_path(
        &self,
        element: &EElement,
        ancestors: &BTreeSet<String>,
    ) -> Option<String> {
        match element {
            EElement::Bool(b) => {
                // a nested wrapper around a must_not changes its meaning
                // from document level to inner object level, wrap those
                // items one by one instead
                if !b.must_not.is_empty() {
                    return None;
                }
                let mut paths = b
                    .must
                    .iter()
                    .chain(b.should.iter())
                    .map(|item| self.common_needed_path(item, ancestors));
                let first = paths.next()??;
                for path in paths {
                    if path.as_deref() != Some(first.as_str()) {
                        return None;
                    }
                }
                Some(first)
            }
            EElement::Boost(b) => self.common_needed_path(&b.query, ancestors),
            EElement::Nested(_) => None,
            leaf => leaf
                .field()
                .and_then(|field| self.first_needed_path(field, ancestors)),
        }
    }

    /// Insert the `nested` wrappers an element requires
    fn wrap_element(&self, element: EElement, ancestors: &mut BTreeSet<String>) -> EElement {
        if let Some(path) = self.common_needed_path(&element, ancestors) {
            ancestors.insert(path.clone());
            let inner = self.wrap_element(element, ancestors);
            ancestors.remove(&path);
            return EElement::Nested(ENested {
                path,
                query: Box::new(inner),
            });
        }
        match element {
            EElement::Bool(b) => {
                let must = self.wrap_clause(b.must, EClause::Must, ancestors);
                let should = self.wrap_clause(b.should, EClause::Should, ancestors);
                let must_not = self.wrap_clause(b.must_not, EClause::MustNot, ancestors);
                EElement::Bool(EBool {
                    must,
                    should,
                    must_not,
                })
            }
            EElement::Nested(mut nested) => {
                let inserted = ancestors.insert(nested.path.clone());
                nested.query = Box::new(self.wrap_element(*nested.query, ancestors));
                if inserted {
                    ancestors.remove(&nested.path);
                }
                EElement::Nested(nested)
            }
            EElement::Boost(mut boost) => {
                boost.query = Box::new(self.wrap_element(*boost.query, ancestors));
                EElement::Boost(boost)
            }
            leaf => leaf,
        }
    }

    /// Wrap the items of one bool clause, grouping siblings that share a
    /// nested path under a single wrapper. Grouping inside `must_not` would
    /// change its semantics, so those items are wrapped one by one.
    fn wrap_clause(
        &self,
        items: Vec<EElement>,
        clause: EClause,
        ancestors: &mut BTreeSet<String>,
    ) -> Vec<EElement> {
        enum Slot {
            Plain(EElement),
            Group(String, Vec<EElement>),
        }

        let group_allowed = clause != EClause::MustNot;
        let mut slots: Vec<Slot> = Vec::new();
        let mut group_index: BTreeMap<String, usize> = BTreeMap::new();
        for item in items {
            match self.common_needed_path(&item, ancestors) {
                Some(path) if group_allowed => {
                    if let Some(&i) = group_index.get(&path) {
                        if let Slot::Group(_, members) = &mut slots[i] {
                            members.push(item);
                        }
                    } else {
                        group_index.insert(path.clone(), slots.len());
                        slots.push(Slot::Group(path, vec![item]));
                    }
                }
                _ => slots.push(Slot::Plain(self.wrap_element(item, ancestors))),
            }
        }

        let mut wrapped = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Plain(element) => wrapped.push(element),
                Slot::Group(path, members) => {
                    ancestors.insert(path.clone());
                    let mut inner = Vec::with_capacity(members.len());
                    for member in members {
                        inner.push(self.wrap_element(member, ancestors));
                    }
                    let query = if inner.len() == 1 {
                        inner.pop().expect("one member")
                    } else {
                        EElement::Bool(match clause {
                            EClause::Must => EBool {
                                must: inner,
                                ..Default::default()
                            },
                            _ => EBool {
                                should: inner,
                                ..Default::default()
                            },
                        })
                    };
                    ancestors.remove(&path);
                    wrapped.push(EElement::Nested(ENested {
                        path,
                        query: Box::new(query),
                    }));
                }
            }
        }
        wrapped
    }
}

/// Flatten nestings of the same operation, built programmatically, into a
/// single operand list; the parser already produces flat operations
fn flatten_same<'n>(node: &'n Node) -> Vec<&'n Node> {
    let mut operands = Vec::new();
    for child in node.children() {
        if child.is_operation()
            && std::mem::discriminant(&child.kind) == std::mem::discriminant(&node.kind)
        {
            operands.extend(flatten_same(child));
        } else {
            operands.push(child);
        }
    }
    operands
}

/// Phrase content: quotes removed, whitespace runs collapsed to one space
fn clean_phrase(value: &str) -> String {
    let content: &str = &value[1..value.len() - 1];
    let mut out = String::with_capacity(content.len());
    let mut in_whitespace = false;
    for ch in content.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use serde_json::json;

    fn text_options() -> EsQueryOptions {
        EsQueryOptions::new().with_default_field("text")
    }

    fn translated(query: &str, options: &EsQueryOptions) -> Value {
        translate(&parse(query).unwrap(), options).unwrap()
    }

    #[test]
    fn test_single_word_uses_default_field() {
        assert_eq!(
            translated("spam", &text_options()),
            json!({"match": {"text": {"query": "spam", "zero_terms_query": "none"}}})
        );
    }

    #[test]
    fn test_missing_default_field_is_an_error() {
        let err = translate(&parse("spam").unwrap(), &EsQueryOptions::new()).unwrap_err();
        assert!(matches!(err, LuceqError::InconsistentQuery(_)));
    }

    #[test]
    fn test_search_field_overrides_default() {
        assert_eq!(
            translated("title:spam", &text_options()),
            json!({"match": {"title": {"query": "spam", "zero_terms_query": "none"}}})
        );
    }

    #[test]
    fn test_field_context_propagates_through_groups() {
        assert_eq!(
            translated("author:(first:John AND last:Doe)", &text_options()),
            json!({"bool": {"must": [
                {"match": {"author.first": {"query": "John", "zero_terms_query": "all"}}},
                {"match": {"author.last": {"query": "Doe", "zero_terms_query": "all"}}},
            ]}})
        );
    }

    #[test]
    fn test_and_or_and_zero_terms() {
        assert_eq!(
            translated("a AND b", &text_options()),
            json!({"bool": {"must": [
                {"match": {"text": {"query": "a", "zero_terms_query": "all"}}},
                {"match": {"text": {"query": "b", "zero_terms_query": "all"}}},
            ]}})
        );
        assert_eq!(
            translated("a OR b", &text_options()),
            json!({"bool": {"should": [
                {"match": {"text": {"query": "a", "zero_terms_query": "none"}}},
                {"match": {"text": {"query": "b", "zero_terms_query": "none"}}},
            ]}})
        );
    }

    #[test]
    fn test_not_and_prohibit() {
        let expected = json!({"bool": {"must_not": [
            {"match": {"text": {"query": "spam", "zero_terms_query": "none"}}}
        ]}});
        assert_eq!(translated("NOT spam", &text_options()), expected);
        assert_eq!(translated("-spam", &text_options()), expected);
    }

    #[test]
    fn test_plus_collapses_to_its_operand() {
        assert_eq!(
            translated("+spam", &text_options()),
            json!({"match": {"text": {"query": "spam", "zero_terms_query": "all"}}})
        );
    }

    #[test]
    fn test_unknown_operation_requires_default_operator() {
        let err = translate(&parse("a b").unwrap(), &text_options()).unwrap_err();
        assert_eq!(err, LuceqError::UnknownOperationUnresolved);

        let options = text_options().with_default_operator(BoolOperator::And);
        assert_eq!(
            translated("a b", &options),
            json!({"bool": {"must": [
                {"match": {"text": {"query": "a", "zero_terms_query": "all"}}},
                {"match": {"text": {"query": "b", "zero_terms_query": "all"}}},
            ]}})
        );
    }

    #[test]
    fn test_or_and_and_on_same_level() {
        // grammar-level: the AND binds tighter, ending up under the OR
        let err = translate(&parse("a OR b AND c").unwrap(), &text_options()).unwrap_err();
        assert_eq!(err, LuceqError::OrAndAndOnSameLevel("b AND c".to_string()));

        // parenthesized mixing is fine
        assert!(translate(&parse("a OR (b AND c)").unwrap(), &text_options()).is_ok());
    }

    #[test]
    fn test_programmatic_same_operation_flattens() {
        use crate::tree::Node;
        let tree = Node::and_operation(vec![
            Node::and_operation(vec![Node::word("a"), Node::word("b")]),
            Node::word("c"),
        ]);
        let json = translate(&tree, &text_options()).unwrap();
        assert_eq!(json["bool"]["must"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_star_becomes_exists() {
        assert_eq!(
            translated("title:*", &text_options()),
            json!({"exists": {"field": "title"}})
        );
    }

    #[test]
    fn test_fuzzy_and_proximity() {
        assert_eq!(
            translated("title:spam~2", &text_options()),
            json!({"fuzzy": {"title": {"fuzziness": 2.0, "value": "spam"}}})
        );
        assert_eq!(
            translated("title:spam~", &text_options()),
            json!({"fuzzy": {"title": {"fuzziness": 0.5, "value": "spam"}}})
        );
        assert_eq!(
            translated("title:\"quick  fox\"~2", &text_options()),
            json!({"match_phrase": {"title": {"query": "quick fox", "slop": 2}}})
        );
    }

    #[test]
    fn test_regex_translation() {
        assert_eq!(
            translated("name:/joh?n/", &text_options()),
            json!({"regexp": {"name": {"value": "joh?n"}}})
        );
    }

    #[test]
    fn test_boost_translation() {
        assert_eq!(
            translated("title:spam^2", &text_options()),
            json!({"match": {"title": {"boost": 2.0, "query": "spam", "zero_terms_query": "none"}}})
        );
        let json = translated("(a OR b)^3", &text_options());
        assert_eq!(json["function_score"]["boost"], json!(3.0));
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(
            translated("field:[a TO *}", &text_options()),
            json!({"range": {"field": {"gte": "a"}}})
        );
        assert_eq!(
            translated("field:{1 TO 10]", &text_options()),
            json!({"range": {"field": {"gt": "1", "lte": "10"}}})
        );
    }

    #[test]
    fn test_nested_wrapping_of_single_field() {
        let options = text_options().with_nested_field("authors", ["name", "city"]);
        assert_eq!(
            translated("authors.name:London", &options),
            json!({"nested": {
                "path": "authors",
                "query": {"match": {"authors.name": {"query": "London", "zero_terms_query": "none"}}},
            }})
        );
    }

    #[test]
    fn test_nested_siblings_share_one_wrapper() {
        let options = text_options().with_nested_field("authors", ["first", "last"]);
        assert_eq!(
            translated("authors.first:John AND authors.last:Doe", &options),
            json!({"nested": {
                "path": "authors",
                "query": {"bool": {"must": [
                    {"match": {"authors.first": {"query": "John", "zero_terms_query": "all"}}},
                    {"match": {"authors.last": {"query": "Doe", "zero_terms_query": "all"}}},
                ]}},
            }})
        );
    }

    #[test]
    fn test_nested_in_nested() {
        let options = text_options()
            .with_nested_field("a", ["b"])
            .with_nested_field("a.b", ["c"]);
        let json = translated("a.b.c:x", &options);
        assert_eq!(json["nested"]["path"], json!("a"));
        assert_eq!(json["nested"]["query"]["nested"]["path"], json!("a.b"));
    }

    #[test]
    fn test_nested_under_must_not_wraps_individually() {
        let options = text_options().with_nested_field("authors", ["name"]);
        let json = translated("NOT authors.name:London", &options);
        assert_eq!(
            json,
            json!({"bool": {"must_not": [
                {"nested": {
                    "path": "authors",
                    "query": {"match": {"authors.name": {"query": "London", "zero_terms_query": "none"}}},
                }}
            ]}})
        );
    }

    #[test]
    fn test_nested_misuse_is_rejected() {
        let options = text_options().with_nested_field("authors", ["name"]);
        let err = translate(&parse("authors:London").unwrap(), &options).unwrap_err();
        assert!(matches!(err, LuceqError::NestedSearchField { .. }));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let options = text_options()
            .with_not_analyzed_fields(["tag"])
            .with_nested_field("authors", ["first", "last"]);
        let tree =
            parse("(authors.first:John AND tag:fable AND title:\"quick fox\"~2) OR x:[1 TO 3]")
                .unwrap();
        let once = serde_json::to_string(&translate(&tree, &options).unwrap()).unwrap();
        let twice = serde_json::to_string(&translate(&tree, &options).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
