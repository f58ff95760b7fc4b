//! Query consistency checking
//!
//! [`QueryChecker`] lints a tree for structural problems that the tolerant
//! parser or a programmatic build may let through. [`NestedFieldsChecker`]
//! validates field paths against declared nested and object mappings; the
//! Elasticsearch translator runs it before lowering a tree.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LuceqError, Result};
use crate::tree::{Node, NodeKind};
use crate::visitor::{Visitor, VisitContext};

/// Structural linter with a configurable zeal level.
///
/// With `zeal > 0`, extra checks flag query patterns that are legal but
/// usually unintended, like a negation directly under an OR.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryChecker {
    zeal: u32,
}

impl QueryChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zeal(zeal: u32) -> Self {
        Self { zeal }
    }

    /// List every problem found in `tree`
    pub fn errors(&self, tree: &Node) -> Vec<String> {
        let mut visitor = CheckVisitor {
            zeal: self.zeal,
            errors: Vec::new(),
        };
        visitor.visit_tree(tree);
        visitor.errors
    }

    /// True only when no problem was found
    pub fn check(&self, tree: &Node) -> bool {
        self.errors(tree).is_empty()
    }
}

fn valid_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

struct CheckVisitor {
    zeal: u32,
    errors: Vec<String>,
}

impl CheckVisitor {
    fn check_negation(&mut self, ctx: &VisitContext) {
        if self.zeal > 0 {
            if let Some(parent) = ctx.parent() {
                if matches!(parent.kind, NodeKind::Or { .. }) {
                    self.errors.push(format!(
                        "Prohibit or Not really means 'AND NOT' which is inconsistent \
                         with the OR operation in {}",
                        parent.to_string().trim()
                    ));
                }
            }
        }
    }
}

impl<'a> Visitor<'a> for CheckVisitor {
    fn visit_search_field(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        if let NodeKind::SearchField { name, expr } = &node.kind {
            if !valid_field_name(name) {
                self.errors.push(format!("{} is not a valid field name", name));
            }
            let body_ok = matches!(
                expr.kind,
                NodeKind::Word { .. }
                    | NodeKind::Phrase { .. }
                    | NodeKind::Regex { .. }
                    | NodeKind::Fuzzy { .. }
                    | NodeKind::Proximity { .. }
                    | NodeKind::Boost { .. }
                    | NodeKind::FieldGroup { .. }
                    | NodeKind::Range { .. }
            );
            if !body_ok {
                self.errors.push(format!(
                    "field expression is not valid: {}",
                    node.to_string().trim()
                ));
            }
        }
        self.generic_visit(node, ctx)
    }

    fn visit_group(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        if let Some(parent) = ctx.parent() {
            if matches!(parent.kind, NodeKind::SearchField { .. }) {
                self.errors.push(format!(
                    "Group misuse, after a search field you should use a field group: {}",
                    parent.to_string().trim()
                ));
            }
        }
        self.generic_visit(node, ctx)
    }

    fn visit_field_group(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        let under_search_field = ctx
            .parent()
            .map(|p| matches!(p.kind, NodeKind::SearchField { .. }))
            .unwrap_or(false);
        if !under_search_field {
            self.errors.push(format!(
                "FieldGroup misuse, it must be used after a search field: {}",
                node.to_string().trim()
            ));
        }
        self.generic_visit(node, ctx)
    }

    fn visit_word(&mut self, node: &'a Node, _ctx: &VisitContext<'a>) {
        if let Some(value) = node.value() {
            if value.chars().any(|c| c.is_whitespace())
                && !value.contains('\\')
            {
                self.errors
                    .push(format!("A single term value can't hold a space: {}", value));
            }
        }
    }

    fn visit_fuzzy(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        if let NodeKind::Fuzzy { term, degree } = &node.kind {
            if let Some(degree) = degree {
                if degree.is_sign_negative() {
                    self.errors.push(format!(
                        "invalid degree {}, it must be positive",
                        degree
                    ));
                }
            }
            if !matches!(term.kind, NodeKind::Word { .. }) {
                self.errors.push(format!(
                    "Fuzzy should be on a single word in {}",
                    node.to_string().trim()
                ));
            }
        }
        self.generic_visit(node, ctx)
    }

    fn visit_proximity(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        if let NodeKind::Proximity { term, .. } = &node.kind {
            if !matches!(term.kind, NodeKind::Phrase { .. }) {
                self.errors.push(format!(
                    "Proximity can only be on a phrase in {}",
                    node.to_string().trim()
                ));
            }
        }
        self.generic_visit(node, ctx)
    }

    fn visit_not(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.check_negation(ctx);
        self.generic_visit(node, ctx)
    }

    fn visit_prohibit(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.check_negation(ctx);
        self.generic_visit(node, ctx)
    }
}

/// Validates field paths against nested and object mapping declarations.
///
/// `nested_fields` maps each dotted nested path to its direct sub-field
/// names. `object_fields` and `sub_fields`, when given, restrict dotted
/// paths to the declared ones; when `None`, unknown dotted paths are
/// accepted.
pub struct NestedFieldsChecker {
    nested_leaves: BTreeSet<String>,
    nested_prefixes: BTreeSet<String>,
    object_fields: Option<BTreeSet<String>>,
    object_prefixes: BTreeSet<String>,
    sub_fields: Option<BTreeSet<String>>,
}

impl NestedFieldsChecker {
    pub fn new(
        nested_fields: &BTreeMap<String, BTreeSet<String>>,
        object_fields: Option<&BTreeSet<String>>,
        sub_fields: Option<&BTreeSet<String>>,
    ) -> Self {
        let mut nested_leaves = BTreeSet::new();
        for (parent, subs) in nested_fields {
            for sub in subs {
                nested_leaves.insert(format!("{}.{}", parent, sub));
            }
        }
        let object_prefixes = object_fields
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.rsplit_once('.').map(|(prefix, _)| prefix.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            nested_leaves,
            nested_prefixes: nested_fields.keys().cloned().collect(),
            object_fields: object_fields.cloned(),
            object_prefixes,
            sub_fields: sub_fields.cloned(),
        }
    }

    /// Walk the tree and fail on the first field path violation
    pub fn check(&self, tree: &Node) -> Result<()> {
        let mut prefix = Vec::new();
        self.walk(tree, &mut prefix)
    }

    fn walk(&self, node: &Node, prefix: &mut Vec<String>) -> Result<()> {
        match &node.kind {
            NodeKind::SearchField { name, expr } => {
                let parts = name.split('.').count();
                prefix.extend(name.split('.').map(|p| p.to_string()));
                self.walk(expr, prefix)?;
                prefix.truncate(prefix.len() - parts);
                Ok(())
            }
            NodeKind::Word { .. } | NodeKind::Phrase { .. } | NodeKind::Regex { .. } => {
                self.check_final(node, prefix)
            }
            _ => {
                for child in node.children() {
                    self.walk(child, prefix)?;
                }
                Ok(())
            }
        }
    }

    fn check_final(&self, node: &Node, prefix: &[String]) -> Result<()> {
        if prefix.is_empty() {
            return Ok(());
        }
        let fullname = prefix.join(".");
        let expr = node.to_string().trim().to_string();
        if self.nested_prefixes.contains(&fullname) {
            return Err(LuceqError::NestedSearchField {
                expr,
                field: fullname,
            });
        }
        if self.object_prefixes.contains(&fullname) {
            return Err(LuceqError::ObjectSearchField {
                expr,
                field: fullname,
            });
        }
        // sub fields can carry a whole expression, so only fully declared
        // configurations can rule a dotted path out
        if prefix.len() > 1 {
            if let (Some(sub_fields), Some(object_fields)) =
                (&self.sub_fields, &self.object_fields)
            {
                let known = sub_fields.contains(&fullname)
                    || object_fields.contains(&fullname)
                    || self.nested_leaves.contains(&fullname);
                if !known {
                    return Err(LuceqError::ObjectSearchField {
                        expr,
                        field: fullname,
                    });
                }
            }
        }
        Ok(())
    }
}
