//! Visitor and transformer protocols over query trees
//!
//! [`Visitor`] walks a tree in pre-order, dispatching on node kind, with a
//! context carrying the path from the root and the chain of parents.
//! [`Transformer`] produces an edited copy: each visit returns zero or more
//! replacement nodes; zero removes the node from its parent, one replaces it,
//! several splice in place. The input tree is never mutated.

use crate::error::{LuceqError, Result};
use crate::tree::{Node, NodeKind};

/// Traversal context: path from the root and parent chain
#[derive(Clone, Debug, Default)]
pub struct VisitContext<'a> {
    /// Sequence of child indices leading from the root to the current node
    pub path: Vec<usize>,
    /// Ancestors of the current node, outermost first
    pub parents: Vec<&'a Node>,
}

impl<'a> VisitContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for the child of `parent` at `position`
    pub fn child(&self, parent: &'a Node, position: usize) -> Self {
        let mut path = self.path.clone();
        path.push(position);
        let mut parents = self.parents.clone();
        parents.push(parent);
        VisitContext { path, parents }
    }

    /// Direct parent of the current node, if any
    pub fn parent(&self) -> Option<&'a Node> {
        self.parents.last().copied()
    }
}

/// Read-only pre-order traversal, dispatched by node kind.
///
/// Implementors override the `visit_*` methods they care about; the default
/// for every kind is [`Visitor::generic_visit`], which recurses into
/// children in order.
pub trait Visitor<'a> {
    /// Walk a whole tree from the root
    fn visit_tree(&mut self, tree: &'a Node) {
        self.visit(tree, &VisitContext::new());
    }

    /// Dispatch on the node kind
    fn visit(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        match &node.kind {
            NodeKind::None => self.generic_visit(node, ctx),
            NodeKind::Word { .. } => self.visit_word(node, ctx),
            NodeKind::Phrase { .. } => self.visit_phrase(node, ctx),
            NodeKind::Regex { .. } => self.visit_regex(node, ctx),
            NodeKind::SearchField { .. } => self.visit_search_field(node, ctx),
            NodeKind::Group { .. } => self.visit_group(node, ctx),
            NodeKind::FieldGroup { .. } => self.visit_field_group(node, ctx),
            NodeKind::Range { .. } => self.visit_range(node, ctx),
            NodeKind::Fuzzy { .. } => self.visit_fuzzy(node, ctx),
            NodeKind::Proximity { .. } => self.visit_proximity(node, ctx),
            NodeKind::Boost { .. } => self.visit_boost(node, ctx),
            NodeKind::Not { .. } => self.visit_not(node, ctx),
            NodeKind::Plus { .. } => self.visit_plus(node, ctx),
            NodeKind::Prohibit { .. } => self.visit_prohibit(node, ctx),
            NodeKind::And { .. } => self.visit_and(node, ctx),
            NodeKind::Or { .. } => self.visit_or(node, ctx),
            NodeKind::Unknown { .. } => self.visit_unknown(node, ctx),
        }
    }

    fn visit_word(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_phrase(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_regex(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_search_field(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_group(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_field_group(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_range(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_fuzzy(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_proximity(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_boost(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_not(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_plus(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_prohibit(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_and(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_or(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }
    fn visit_unknown(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        self.generic_visit(node, ctx)
    }

    /// Default behavior: recurse into children, in order
    fn generic_visit(&mut self, node: &'a Node, ctx: &VisitContext<'a>) {
        for (i, child) in node.children().into_iter().enumerate() {
            let child_ctx = ctx.child(node, i);
            self.visit(child, &child_ctx);
        }
    }
}

/// Copy-building rewrite of a tree, dispatched by node kind.
///
/// Each `transform_*` method returns the replacement nodes for the visited
/// node. The default, [`Transformer::generic_transform`], transforms the
/// children and rebuilds the node around the result. Removing an operand
/// from an n-ary operation downgrades a one-operand operation to its sole
/// operand and drops an emptied operation entirely; any other arity
/// mismatch is an error.
pub trait Transformer<'a> {
    /// Transform a whole tree, expecting exactly one resulting root
    fn transform_tree(&mut self, tree: &'a Node) -> Result<Node> {
        let mut nodes = self.transform(tree, &VisitContext::new())?;
        if nodes.len() != 1 {
            return Err(LuceqError::Transform(format!(
                "the transform of the tree should have produced exactly one element, got {}",
                nodes.len()
            )));
        }
        Ok(nodes.pop().expect("one element"))
    }

    /// Dispatch on the node kind
    fn transform(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        match &node.kind {
            NodeKind::None => self.generic_transform(node, ctx),
            NodeKind::Word { .. } => self.transform_word(node, ctx),
            NodeKind::Phrase { .. } => self.transform_phrase(node, ctx),
            NodeKind::Regex { .. } => self.transform_regex(node, ctx),
            NodeKind::SearchField { .. } => self.transform_search_field(node, ctx),
            NodeKind::Group { .. } => self.transform_group(node, ctx),
            NodeKind::FieldGroup { .. } => self.transform_field_group(node, ctx),
            NodeKind::Range { .. } => self.transform_range(node, ctx),
            NodeKind::Fuzzy { .. } => self.transform_fuzzy(node, ctx),
            NodeKind::Proximity { .. } => self.transform_proximity(node, ctx),
            NodeKind::Boost { .. } => self.transform_boost(node, ctx),
            NodeKind::Not { .. } => self.transform_not(node, ctx),
            NodeKind::Plus { .. } => self.transform_plus(node, ctx),
            NodeKind::Prohibit { .. } => self.transform_prohibit(node, ctx),
            NodeKind::And { .. } => self.transform_and(node, ctx),
            NodeKind::Or { .. } => self.transform_or(node, ctx),
            NodeKind::Unknown { .. } => self.transform_unknown(node, ctx),
        }
    }

    fn transform_word(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_phrase(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_regex(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_search_field(
        &mut self,
        node: &'a Node,
        ctx: &VisitContext<'a>,
    ) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_group(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_field_group(
        &mut self,
        node: &'a Node,
        ctx: &VisitContext<'a>,
    ) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_range(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_fuzzy(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_proximity(
        &mut self,
        node: &'a Node,
        ctx: &VisitContext<'a>,
    ) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_boost(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_not(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_plus(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_prohibit(
        &mut self,
        node: &'a Node,
        ctx: &VisitContext<'a>,
    ) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_and(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_or(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }
    fn transform_unknown(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.generic_transform(node, ctx)
    }

    /// Default behavior: transform children and rebuild the node around them
    fn generic_transform(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let mut new_children = Vec::new();
        for (i, child) in node.children().into_iter().enumerate() {
            let child_ctx = ctx.child(node, i);
            new_children.extend(self.transform(child, &child_ctx)?);
        }
        rebuild_with_children(node, new_children)
    }
}

/// Rebuild `node` around transformed children, handling operand removal.
///
/// An n-ary operation left with a single operand is downgraded to that
/// operand, which absorbs the operation's trivia; an emptied operation
/// disappears. Fixed-arity nodes reject any other child count.
pub fn rebuild_with_children(node: &Node, children: Vec<Node>) -> Result<Vec<Node>> {
    if node.is_operation() {
        match children.len() {
            0 => return Ok(vec![]),
            1 => {
                let mut sole = children.into_iter().next().expect("one operand");
                sole.head = format!("{}{}", node.head, sole.head);
                sole.tail = format!("{}{}", sole.tail, node.tail);
                return Ok(vec![sole]);
            }
            _ => {}
        }
    }
    Ok(vec![node.with_children(children)?])
}
