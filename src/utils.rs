//! Tree utilities: implicit-operator resolution, trivia auto-fill and
//! wildcard handling for term values.

use crate::error::Result;
use crate::tree::{BoolOperator, Node, NodeKind};
use crate::visitor::{Transformer, VisitContext};

/// Characters carrying a meaning in the Lucene syntax, escapable with `\`
pub const SPECIAL_CHARS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
];

/// Remove `\` escapes of special characters from a term value
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some(&next) if SPECIAL_CHARS.contains(&next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Unescaped wildcard characters in `value`, as `(char position, wildcard)`
pub fn iter_wildcards(value: &str) -> Vec<(usize, char)> {
    let mut found = Vec::new();
    let mut escaped = false;
    for (i, ch) in value.chars().enumerate() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '*' || ch == '?' {
            found.push((i, ch));
        }
    }
    found
}

/// True if `value` contains an unescaped `*` or `?`
pub fn has_wildcard(value: &str) -> bool {
    !iter_wildcards(value).is_empty()
}

/// Split `value` on its unescaped wildcards, keeping the plain segments
pub fn split_wildcards(value: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == '*' || ch == '?' {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    segments.push(current);
    segments
}

fn ensure_head(node: &mut Node) {
    if node.head.is_empty() {
        node.head.push(' ');
    }
}

fn ensure_tail(node: &mut Node) {
    if node.tail.is_empty() {
        node.tail.push(' ');
    }
}

/// Replace every [`NodeKind::Unknown`] operation with an explicit one.
///
/// The target operator is, in order: the configured `resolve_to`, the
/// nearest enclosing explicit operation, or AND. Operand trivia is adjusted
/// so that the resolved tree reprints with the keyword properly separated.
pub struct UnknownOperationResolver {
    resolve_to: Option<BoolOperator>,
}

impl UnknownOperationResolver {
    pub fn new(resolve_to: Option<BoolOperator>) -> Self {
        Self { resolve_to }
    }

    /// Resolve all unknown operations of `tree` into a new tree
    pub fn resolve(&mut self, tree: &Node) -> Result<Node> {
        self.transform_tree(tree)
    }

    fn operator_for(&self, ctx: &VisitContext) -> BoolOperator {
        if let Some(op) = self.resolve_to {
            return op;
        }
        for parent in ctx.parents.iter().rev() {
            match parent.kind {
                NodeKind::And { .. } => return BoolOperator::And,
                NodeKind::Or { .. } => return BoolOperator::Or,
                _ => {}
            }
        }
        BoolOperator::And
    }
}

impl<'a> Transformer<'a> for UnknownOperationResolver {
    fn transform_unknown(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let op = self.operator_for(ctx);
        let mut operands = Vec::new();
        for (i, child) in node.children().into_iter().enumerate() {
            let child_ctx = ctx.child(node, i);
            operands.extend(self.transform(child, &child_ctx)?);
        }
        match operands.len() {
            0 => return Ok(vec![]),
            1 => return Ok(operands),
            _ => {}
        }
        let last = operands.len() - 1;
        for (i, operand) in operands.iter_mut().enumerate() {
            if i > 0 {
                ensure_head(operand);
            }
            if i < last {
                ensure_tail(operand);
            }
        }
        let mut resolved = Node::operation(op, operands)
            .with_head(node.head.clone())
            .with_tail(node.tail.clone());
        resolved.span = node.span;
        resolved.name = node.name.clone();
        Ok(vec![resolved])
    }
}

/// Inject the minimal trivia a programmatically built tree needs to reprint
/// as a syntactically valid expression.
///
/// Keyword operators get a single space around them, implicit operations a
/// single separating space, `NOT` a space before its operand, range bounds a
/// space around `TO`. Existing trivia is left untouched.
pub struct AutoHeadTail;

impl AutoHeadTail {
    fn adjust_operation(node: &mut Node, keyword: bool) {
        let mut children = node.children_mut();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.iter_mut().enumerate() {
            if keyword && i > 0 {
                ensure_head(child);
            }
            if i < last {
                ensure_tail(child);
            }
        }
    }
}

impl<'a> Transformer<'a> for AutoHeadTail {
    fn transform_and(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let mut nodes = self.generic_transform(node, ctx)?;
        for n in nodes.iter_mut().filter(|n| n.is_operation()) {
            Self::adjust_operation(n, true);
        }
        Ok(nodes)
    }

    fn transform_or(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        self.transform_and(node, ctx)
    }

    fn transform_unknown(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let mut nodes = self.generic_transform(node, ctx)?;
        for n in nodes.iter_mut().filter(|n| n.is_operation()) {
            Self::adjust_operation(n, false);
        }
        Ok(nodes)
    }

    fn transform_not(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let mut nodes = self.generic_transform(node, ctx)?;
        for n in &mut nodes {
            if let NodeKind::Not { expr } = &mut n.kind {
                ensure_head(expr);
            }
        }
        Ok(nodes)
    }

    fn transform_range(&mut self, node: &'a Node, ctx: &VisitContext<'a>) -> Result<Vec<Node>> {
        let mut nodes = self.generic_transform(node, ctx)?;
        for n in &mut nodes {
            if let NodeKind::Range { low, high, .. } = &mut n.kind {
                ensure_tail(low);
                ensure_head(high);
            }
        }
        Ok(nodes)
    }
}

/// Auto-fill head and tail trivia so a hand-built tree is printable
pub fn auto_head_tail(tree: &Node) -> Result<Node> {
    AutoHeadTail.transform_tree(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"spam\:egg"), "spam:egg");
        assert_eq!(unescape(r"a\*b\\c"), r"a*b\c");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn test_iter_wildcards_honors_escaping() {
        assert_eq!(iter_wildcards("fo*o?"), vec![(2, '*'), (4, '?')]);
        assert_eq!(iter_wildcards(r"fo\*o?"), vec![(5, '?')]);
        assert!(iter_wildcards(r"\*\?").is_empty());
    }

    #[test]
    fn test_split_wildcards() {
        assert_eq!(split_wildcards("fo*o?"), vec!["fo", "o", ""]);
        assert_eq!(split_wildcards("plain"), vec!["plain"]);
        assert_eq!(split_wildcards("*x"), vec!["", "x"]);
    }

    #[test]
    fn test_resolver_uses_default() {
        let tree = parse("foo bar").unwrap();
        let resolved = UnknownOperationResolver::new(Some(BoolOperator::And))
            .resolve(&tree)
            .unwrap();
        assert_eq!(resolved.to_string(), "foo AND bar");
    }

    #[test]
    fn test_resolver_follows_enclosing_operation() {
        let tree = parse("a OR (b c)").unwrap();
        let resolved = UnknownOperationResolver::new(None).resolve(&tree).unwrap();
        assert_eq!(resolved.to_string(), "a OR (b OR c)");

        let tree = parse("a AND (b c)").unwrap();
        let resolved = UnknownOperationResolver::new(None).resolve(&tree).unwrap();
        assert_eq!(resolved.to_string(), "a AND (b AND c)");
    }

    #[test]
    fn test_resolver_defaults_to_and_without_context() {
        let tree = parse("foo bar baz").unwrap();
        let resolved = UnknownOperationResolver::new(None).resolve(&tree).unwrap();
        assert_eq!(resolved.to_string(), "foo AND bar AND baz");
    }

    #[test]
    fn test_resolver_keeps_existing_spacing() {
        let tree = parse("foo  bar").unwrap();
        let resolved = UnknownOperationResolver::new(Some(BoolOperator::Or))
            .resolve(&tree)
            .unwrap();
        assert_eq!(resolved.to_string(), "foo OR  bar");
    }

    #[test]
    fn test_auto_head_tail_keyword_operation() {
        let tree = Node::and_operation(vec![Node::word("a"), Node::word("b"), Node::word("c")]);
        let printable = auto_head_tail(&tree).unwrap();
        assert_eq!(printable.to_string(), "a AND b AND c");
    }

    #[test]
    fn test_auto_head_tail_unknown_operation() {
        let tree = Node::unknown_operation(vec![Node::word("foo"), Node::word("bar")]);
        let printable = auto_head_tail(&tree).unwrap();
        assert_eq!(printable.to_string(), "foo bar");
    }

    #[test]
    fn test_auto_head_tail_not_and_range() {
        let tree = Node::not(Node::word("a"));
        assert_eq!(auto_head_tail(&tree).unwrap().to_string(), "NOT a");

        let tree = Node::search_field(
            "f",
            Node::range(Node::word("1"), Node::word("10"), true, true),
        );
        assert_eq!(auto_head_tail(&tree).unwrap().to_string(), "f:[1 TO 10]");
    }

    #[test]
    fn test_auto_head_tail_is_a_fixpoint_on_parsed_trees() {
        let source = "a AND (b OR title:\"c d\") AND NOT e";
        let tree = parse(source).unwrap();
        let adjusted = auto_head_tail(&tree).unwrap();
        assert_eq!(adjusted.to_string(), source);
    }

    #[test]
    fn test_auto_head_tail_nested_build() {
        let tree = Node::or_operation(vec![
            Node::group(Node::unknown_operation(vec![
                Node::word("x"),
                Node::word("y"),
            ])),
            Node::prohibit(Node::word("z")),
        ]);
        assert_eq!(auto_head_tail(&tree).unwrap().to_string(), "(x y) OR -z");
    }
}
