//! Abstract syntax tree for Lucene query expressions
//!
//! Nodes form the parse tree of a query. They can be built by the parser or
//! programmatically, compared structurally, cloned, reprinted (via `Display`)
//! and rewritten through the transformer framework in [`crate::visitor`].
//!
//! Every node carries two trivia strings, `head` and `tail`, holding the
//! non-meaningful text (whitespace) surrounding it in the original input.
//! Reprinting an unmodified parsed tree reproduces the input byte for byte.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LuceqError, Result};
use crate::utils;

/// Position of a node in the original text, not accounting for trivia
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    /// Character offset of the first meaningful character
    pub pos: usize,
    /// Number of characters, including inner children trivia
    pub size: usize,
}

/// Explicit boolean operator kind, used to resolve implicit operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoolOperator {
    And,
    Or,
}

/// A node of the query parse tree
#[derive(Clone, Debug, Default)]
pub struct Node {
    /// Non-meaningful text before this element
    pub head: String,
    /// Non-meaningful text after this element
    pub tail: String,
    /// Source span, present on parsed trees
    pub span: Option<Span>,
    /// Stable name assigned by [`crate::naming::auto_name`]
    pub name: Option<String>,
    /// What this node is
    pub kind: NodeKind,
}

/// The kind of a [`Node`], with its own payload and children
#[derive(Clone, Debug, PartialEq, Default)]
pub enum NodeKind {
    /// Placeholder for a node with no content yet
    #[default]
    None,
    /// An unquoted term; may contain Lucene escapes and `*`/`?` wildcards
    Word { value: String },
    /// A quoted term; `value` includes the surrounding double quotes
    Phrase { value: String },
    /// A `/…/`-delimited regular expression term; `value` includes the slashes
    Regex { value: String },
    /// Binds a field name to a sub-expression, eg. `title:fox`
    SearchField { name: String, expr: Box<Node> },
    /// Explicit parenthesization
    Group { expr: Box<Node> },
    /// Parenthesization appearing as the body of a search field
    FieldGroup { expr: Box<Node> },
    /// `[a TO b]` / `{a TO b}`; bounds are words, `*` marks an open bound
    Range {
        low: Box<Node>,
        high: Box<Node>,
        include_low: bool,
        include_high: bool,
    },
    /// Fuzzy match on a word, `term~degree`; `None` degree means implicit
    Fuzzy { term: Box<Node>, degree: Option<f64> },
    /// Proximity match on a phrase, `phrase~degree`
    Proximity { term: Box<Node>, degree: Option<u32> },
    /// `expr^force`
    Boost { expr: Box<Node>, force: f64 },
    /// `NOT expr`
    Not { expr: Box<Node> },
    /// `+expr`
    Plus { expr: Box<Node> },
    /// `-expr`
    Prohibit { expr: Box<Node> },
    /// Explicit n-ary AND
    And { operands: Vec<Node> },
    /// Explicit n-ary OR
    Or { operands: Vec<Node> },
    /// Implicit n-ary operation whose operator is unknown at parse time
    Unknown { operands: Vec<Node> },
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            head: String::new(),
            tail: String::new(),
            span: None,
            name: None,
            kind,
        }
    }

    pub fn word(value: impl Into<String>) -> Self {
        Node::new(NodeKind::Word {
            value: value.into(),
        })
    }

    /// Build a phrase node; `value` must include the surrounding quotes
    pub fn phrase(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(
            value.starts_with('"') && value.ends_with('"') && value.len() >= 2,
            "Phrase value must contain the quotes"
        );
        Node::new(NodeKind::Phrase { value })
    }

    /// Build a regex node; `value` must include the surrounding slashes
    pub fn regex(value: impl Into<String>) -> Self {
        let value = value.into();
        debug_assert!(
            value.starts_with('/') && value.ends_with('/') && value.len() >= 2,
            "Regex value must contain the slashes"
        );
        Node::new(NodeKind::Regex { value })
    }

    pub fn search_field(name: impl Into<String>, expr: Node) -> Self {
        Node::new(NodeKind::SearchField {
            name: name.into(),
            expr: Box::new(expr),
        })
    }

    pub fn group(expr: Node) -> Self {
        Node::new(NodeKind::Group {
            expr: Box::new(expr),
        })
    }

    pub fn field_group(expr: Node) -> Self {
        Node::new(NodeKind::FieldGroup {
            expr: Box::new(expr),
        })
    }

    pub fn range(low: Node, high: Node, include_low: bool, include_high: bool) -> Self {
        Node::new(NodeKind::Range {
            low: Box::new(low),
            high: Box::new(high),
            include_low,
            include_high,
        })
    }

    pub fn fuzzy(term: Node, degree: Option<f64>) -> Self {
        Node::new(NodeKind::Fuzzy {
            term: Box::new(term),
            degree,
        })
    }

    pub fn proximity(term: Node, degree: Option<u32>) -> Self {
        Node::new(NodeKind::Proximity {
            term: Box::new(term),
            degree,
        })
    }

    pub fn boost(expr: Node, force: f64) -> Self {
        Node::new(NodeKind::Boost {
            expr: Box::new(expr),
            force,
        })
    }

    pub fn not(expr: Node) -> Self {
        Node::new(NodeKind::Not {
            expr: Box::new(expr),
        })
    }

    pub fn plus(expr: Node) -> Self {
        Node::new(NodeKind::Plus {
            expr: Box::new(expr),
        })
    }

    pub fn prohibit(expr: Node) -> Self {
        Node::new(NodeKind::Prohibit {
            expr: Box::new(expr),
        })
    }

    pub fn and_operation(operands: Vec<Node>) -> Self {
        Node::new(NodeKind::And { operands })
    }

    pub fn or_operation(operands: Vec<Node>) -> Self {
        Node::new(NodeKind::Or { operands })
    }

    pub fn unknown_operation(operands: Vec<Node>) -> Self {
        Node::new(NodeKind::Unknown { operands })
    }

    pub fn operation(op: BoolOperator, operands: Vec<Node>) -> Self {
        match op {
            BoolOperator::And => Node::and_operation(operands),
            BoolOperator::Or => Node::or_operation(operands),
        }
    }

    /// Set the leading trivia
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = head.into();
        self
    }

    /// Set the trailing trivia
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    pub fn with_span(mut self, pos: usize, size: usize) -> Self {
        self.span = Some(Span { pos, size });
        self
    }

    /// Node kind name, for diagnostics and dispatch
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::None => "none",
            NodeKind::Word { .. } => "word",
            NodeKind::Phrase { .. } => "phrase",
            NodeKind::Regex { .. } => "regex",
            NodeKind::SearchField { .. } => "search_field",
            NodeKind::Group { .. } => "group",
            NodeKind::FieldGroup { .. } => "field_group",
            NodeKind::Range { .. } => "range",
            NodeKind::Fuzzy { .. } => "fuzzy",
            NodeKind::Proximity { .. } => "proximity",
            NodeKind::Boost { .. } => "boost",
            NodeKind::Not { .. } => "not",
            NodeKind::Plus { .. } => "plus",
            NodeKind::Prohibit { .. } => "prohibit",
            NodeKind::And { .. } => "and",
            NodeKind::Or { .. } => "or",
            NodeKind::Unknown { .. } => "unknown",
        }
    }

    /// Ordered children of this node
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::None
            | NodeKind::Word { .. }
            | NodeKind::Phrase { .. }
            | NodeKind::Regex { .. } => vec![],
            NodeKind::SearchField { expr, .. }
            | NodeKind::Group { expr }
            | NodeKind::FieldGroup { expr }
            | NodeKind::Boost { expr, .. }
            | NodeKind::Not { expr }
            | NodeKind::Plus { expr }
            | NodeKind::Prohibit { expr } => vec![expr],
            NodeKind::Fuzzy { term, .. } | NodeKind::Proximity { term, .. } => vec![term],
            NodeKind::Range { low, high, .. } => vec![low, high],
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => operands.iter().collect(),
        }
    }

    /// Ordered mutable children of this node
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.kind {
            NodeKind::None
            | NodeKind::Word { .. }
            | NodeKind::Phrase { .. }
            | NodeKind::Regex { .. } => vec![],
            NodeKind::SearchField { expr, .. }
            | NodeKind::Group { expr }
            | NodeKind::FieldGroup { expr }
            | NodeKind::Boost { expr, .. }
            | NodeKind::Not { expr }
            | NodeKind::Plus { expr }
            | NodeKind::Prohibit { expr } => vec![expr],
            NodeKind::Fuzzy { term, .. } | NodeKind::Proximity { term, .. } => vec![term],
            NodeKind::Range { low, high, .. } => vec![low, high],
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => operands.iter_mut().collect(),
        }
    }

    /// Rebuild this node with new children, keeping trivia and attributes.
    ///
    /// The child count must match the node's arity; n-ary operations accept
    /// two or more. Used by the transformer framework to produce edited
    /// copies without mutating the source tree.
    pub fn with_children(&self, mut children: Vec<Node>) -> Result<Node> {
        let arity_error = |expected: &str, got: usize| {
            LuceqError::Transform(format!(
                "a {} node accepts {} children, got {}",
                self.kind_name(),
                expected,
                got
            ))
        };
        let pop_one = |children: &mut Vec<Node>| -> Result<Box<Node>> {
            if children.len() != 1 {
                return Err(arity_error("exactly 1", children.len()));
            }
            Ok(Box::new(children.pop().expect("one child")))
        };
        let kind = match &self.kind {
            NodeKind::None
            | NodeKind::Word { .. }
            | NodeKind::Phrase { .. }
            | NodeKind::Regex { .. } => {
                if !children.is_empty() {
                    return Err(arity_error("no", children.len()));
                }
                self.kind.clone()
            }
            NodeKind::SearchField { name, .. } => NodeKind::SearchField {
                name: name.clone(),
                expr: pop_one(&mut children)?,
            },
            NodeKind::Group { .. } => NodeKind::Group {
                expr: pop_one(&mut children)?,
            },
            NodeKind::FieldGroup { .. } => NodeKind::FieldGroup {
                expr: pop_one(&mut children)?,
            },
            NodeKind::Range {
                include_low,
                include_high,
                ..
            } => {
                if children.len() != 2 {
                    return Err(arity_error("exactly 2", children.len()));
                }
                let high = children.pop().expect("high bound");
                let low = children.pop().expect("low bound");
                NodeKind::Range {
                    low: Box::new(low),
                    high: Box::new(high),
                    include_low: *include_low,
                    include_high: *include_high,
                }
            }
            NodeKind::Fuzzy { degree, .. } => NodeKind::Fuzzy {
                term: pop_one(&mut children)?,
                degree: *degree,
            },
            NodeKind::Proximity { degree, .. } => NodeKind::Proximity {
                term: pop_one(&mut children)?,
                degree: *degree,
            },
            NodeKind::Boost { force, .. } => NodeKind::Boost {
                expr: pop_one(&mut children)?,
                force: *force,
            },
            NodeKind::Not { .. } => NodeKind::Not {
                expr: pop_one(&mut children)?,
            },
            NodeKind::Plus { .. } => NodeKind::Plus {
                expr: pop_one(&mut children)?,
            },
            NodeKind::Prohibit { .. } => NodeKind::Prohibit {
                expr: pop_one(&mut children)?,
            },
            NodeKind::And { .. } => {
                if children.len() < 2 {
                    return Err(arity_error("2 or more", children.len()));
                }
                NodeKind::And { operands: children }
            }
            NodeKind::Or { .. } => {
                if children.len() < 2 {
                    return Err(arity_error("2 or more", children.len()));
                }
                NodeKind::Or { operands: children }
            }
            NodeKind::Unknown { .. } => {
                if children.len() < 2 {
                    return Err(arity_error("2 or more", children.len()));
                }
                NodeKind::Unknown { operands: children }
            }
        };
        Ok(Node {
            head: self.head.clone(),
            tail: self.tail.clone(),
            span: self.span,
            name: self.name.clone(),
            kind,
        })
    }

    /// Whether this node is an n-ary boolean operation
    pub fn is_operation(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::And { .. } | NodeKind::Or { .. } | NodeKind::Unknown { .. }
        )
    }

    /// Term value of a word, phrase or regex node
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Word { value }
            | NodeKind::Phrase { value }
            | NodeKind::Regex { value } => Some(value),
            _ => None,
        }
    }

    /// Term value with Lucene `\` escapes removed
    pub fn unescaped_value(&self) -> Option<String> {
        self.value().map(utils::unescape)
    }

    /// True for a word holding just the `*` wildcard
    pub fn is_star(&self) -> bool {
        matches!(&self.kind, NodeKind::Word { value } if value == "*")
    }

    /// True if the term value contains an unescaped `*` or `?`
    pub fn has_wildcard(&self) -> bool {
        self.value().map(utils::has_wildcard).unwrap_or(false)
    }

    /// Unescaped wildcard positions inside the term value
    pub fn iter_wildcards(&self) -> Vec<(usize, char)> {
        self.value().map(utils::iter_wildcards).unwrap_or_default()
    }

    /// Term value split on unescaped wildcards
    pub fn split_wildcards(&self) -> Vec<String> {
        self.value().map(utils::split_wildcards).unwrap_or_default()
    }

    /// `(start, end)` position of this element in the source expression
    pub fn source_span(&self, with_trivia: bool) -> Option<(usize, usize)> {
        self.span.map(|Span { pos, size }| {
            if with_trivia {
                (
                    pos.saturating_sub(self.head.chars().count()),
                    pos + size + self.tail.chars().count(),
                )
            } else {
                (pos, pos + size)
            }
        })
    }

    /// Structural equality that also compares trivia, recursively
    pub fn eq_with_trivia(&self, other: &Node) -> bool {
        self == other && trivia_eq(self, other)
    }
}

fn trivia_eq(a: &Node, b: &Node) -> bool {
    a.head == b.head
        && a.tail == b.tail
        && a.children()
            .iter()
            .zip(b.children().iter())
            .all(|(c, d)| trivia_eq(c, d))
}

/// Structural equality: kind, own attributes and children, trivia excluded.
///
/// Recursion goes through `NodeKind`'s derived `PartialEq`, whose nested
/// nodes compare through this impl again, so trivia is excluded at every
/// level.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        self.write_surface(f)?;
        f.write_str(&self.tail)
    }
}

/// Characters the lexer would glue onto an adjacent keyword, making a
/// reprint lex differently than the tree it came from
fn glues_to_keyword(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '*' | '?' | '\\')
}

impl Node {
    /// Operator keyword interposed between operands when printing
    pub fn operator_glyph(&self) -> &'static str {
        match &self.kind {
            NodeKind::And { .. } => "AND",
            NodeKind::Or { .. } => "OR",
            _ => "",
        }
    }

    /// First character this node prints, trivia included
    fn first_printed_char(&self) -> Option<char> {
        if let Some(c) = self.head.chars().next() {
            return Some(c);
        }
        let surface = match &self.kind {
            NodeKind::None => None,
            NodeKind::Word { value }
            | NodeKind::Phrase { value }
            | NodeKind::Regex { value } => value.chars().next(),
            NodeKind::SearchField { name, .. } => name.chars().next().or(Some(':')),
            NodeKind::Group { .. } | NodeKind::FieldGroup { .. } => Some('('),
            NodeKind::Range { include_low, .. } => {
                Some(if *include_low { '[' } else { '{' })
            }
            NodeKind::Fuzzy { term, .. } | NodeKind::Proximity { term, .. } => {
                term.first_printed_char().or(Some('~'))
            }
            NodeKind::Boost { expr, .. } => expr.first_printed_char().or(Some('^')),
            NodeKind::Not { .. } => Some('N'),
            NodeKind::Plus { .. } => Some('+'),
            NodeKind::Prohibit { .. } => Some('-'),
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => {
                operands.first().and_then(|o| o.first_printed_char())
            }
        };
        surface.or_else(|| self.tail.chars().next())
    }

    /// Last character this node prints, trivia included
    fn last_printed_char(&self) -> Option<char> {
        if let Some(c) = self.tail.chars().last() {
            return Some(c);
        }
        let surface = match &self.kind {
            NodeKind::None => None,
            NodeKind::Word { value }
            | NodeKind::Phrase { value }
            | NodeKind::Regex { value } => value.chars().last(),
            NodeKind::SearchField { expr, .. } => expr.last_printed_char().or(Some(':')),
            NodeKind::Group { .. } | NodeKind::FieldGroup { .. } => Some(')'),
            NodeKind::Range { include_high, .. } => {
                Some(if *include_high { ']' } else { '}' })
            }
            NodeKind::Fuzzy { degree, .. } => match degree {
                Some(d) => d.to_string().chars().last(),
                None => Some('~'),
            },
            NodeKind::Proximity { degree, .. } => match degree {
                Some(d) => d.to_string().chars().last(),
                None => Some('~'),
            },
            NodeKind::Boost { force, .. } => force.to_string().chars().last(),
            NodeKind::Not { expr }
            | NodeKind::Plus { expr }
            | NodeKind::Prohibit { expr } => expr.last_printed_char(),
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => {
                operands.last().and_then(|o| o.last_printed_char())
            }
        };
        surface.or_else(|| self.head.chars().last())
    }

    /// True when this node prints a word-like character next to the given
    /// boundary, so a bare keyword beside it would not lex back as one
    fn opens_with_word(&self) -> bool {
        self.first_printed_char().map(glues_to_keyword).unwrap_or(false)
    }

    fn closes_with_word(&self) -> bool {
        self.last_printed_char().map(glues_to_keyword).unwrap_or(false)
    }

    fn write_surface(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::None => Ok(()),
            NodeKind::Word { value }
            | NodeKind::Phrase { value }
            | NodeKind::Regex { value } => f.write_str(value),
            NodeKind::SearchField { name, expr } => write!(f, "{}:{}", name, expr),
            NodeKind::Group { expr } | NodeKind::FieldGroup { expr } => {
                write!(f, "({})", expr)
            }
            NodeKind::Range {
                low,
                high,
                include_low,
                include_high,
            } => {
                write!(f, "{}{}", if *include_low { '[' } else { '{' }, low)?;
                if low.closes_with_word() {
                    f.write_str(" ")?;
                }
                f.write_str("TO")?;
                if high.opens_with_word() {
                    f.write_str(" ")?;
                }
                write!(f, "{}{}", high, if *include_high { ']' } else { '}' })
            }
            NodeKind::Fuzzy { term, degree } => {
                write!(f, "{}~", term)?;
                match degree {
                    Some(d) => write!(f, "{}", d),
                    None => Ok(()),
                }
            }
            NodeKind::Proximity { term, degree } => {
                write!(f, "{}~", term)?;
                match degree {
                    Some(d) => write!(f, "{}", d),
                    None => Ok(()),
                }
            }
            NodeKind::Boost { expr, force } => write!(f, "{}^{}", expr, force),
            NodeKind::Not { expr } => {
                f.write_str("NOT")?;
                if expr.opens_with_word() {
                    f.write_str(" ")?;
                }
                write!(f, "{}", expr)
            }
            NodeKind::Plus { expr } => write!(f, "+{}", expr),
            NodeKind::Prohibit { expr } => write!(f, "-{}", expr),
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => {
                let glyph = self.operator_glyph();
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        // a keyword canonicalized from an alias like `&&` or
                        // `!` may sit against a word with no trivia; keep the
                        // reprint lexing to the same shape
                        let left_word = operands[i - 1].closes_with_word();
                        if glyph.is_empty() {
                            if left_word && operand.opens_with_word() {
                                f.write_str(" ")?;
                            }
                        } else {
                            if left_word {
                                f.write_str(" ")?;
                            }
                            f.write_str(glyph)?;
                            if operand.opens_with_word() {
                                f.write_str(" ")?;
                            }
                        }
                    }
                    write!(f, "{}", operand)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaced(node: Node) -> Node {
        node.with_head(" ")
    }

    #[test]
    fn test_display_word() {
        assert_eq!(Node::word("foo").to_string(), "foo");
        assert_eq!(
            Node::word("foo").with_head("  ").with_tail(" ").to_string(),
            "  foo "
        );
    }

    #[test]
    fn test_display_search_field() {
        let node = Node::search_field("title", Node::word("fox"));
        assert_eq!(node.to_string(), "title:fox");
    }

    #[test]
    fn test_display_operation() {
        let node = Node::and_operation(vec![
            Node::word("a").with_tail(" "),
            spaced(Node::word("b")).with_tail(" "),
            spaced(Node::word("c")),
        ]);
        assert_eq!(node.to_string(), "a AND b AND c");
    }

    #[test]
    fn test_display_unknown_operation() {
        let node = Node::unknown_operation(vec![
            Node::word("foo").with_tail(" "),
            Node::word("bar"),
        ]);
        assert_eq!(node.to_string(), "foo bar");
    }

    #[test]
    fn test_display_range() {
        let node = Node::range(
            Node::word("1").with_tail(" "),
            spaced(Node::word("10")),
            true,
            false,
        );
        assert_eq!(node.to_string(), "[1 TO 10}");
    }

    #[test]
    fn test_display_fuzzy_and_proximity() {
        assert_eq!(Node::fuzzy(Node::word("foo"), Some(2.0)).to_string(), "foo~2");
        assert_eq!(Node::fuzzy(Node::word("foo"), Some(0.5)).to_string(), "foo~0.5");
        assert_eq!(Node::fuzzy(Node::word("foo"), None).to_string(), "foo~");
        assert_eq!(
            Node::proximity(Node::phrase("\"foo bar\""), Some(3)).to_string(),
            "\"foo bar\"~3"
        );
    }

    #[test]
    fn test_display_boost_and_unary() {
        assert_eq!(Node::boost(Node::word("baz"), 2.0).to_string(), "baz^2");
        assert_eq!(Node::boost(Node::word("baz"), 1.5).to_string(), "baz^1.5");
        assert_eq!(Node::not(spaced(Node::word("a"))).to_string(), "NOT a");
        assert_eq!(Node::plus(Node::word("a")).to_string(), "+a");
        assert_eq!(Node::prohibit(Node::word("a")).to_string(), "-a");
    }

    #[test]
    fn test_display_separates_keywords_at_word_boundaries() {
        // no trivia at all: keyword glyphs still reprint lexably
        assert_eq!(Node::not(Node::word("a")).to_string(), "NOT a");
        assert_eq!(Node::not(Node::group(Node::word("a"))).to_string(), "NOT(a)");
        assert_eq!(
            Node::and_operation(vec![Node::word("a"), Node::word("b")]).to_string(),
            "a AND b"
        );
        assert_eq!(
            Node::or_operation(vec![Node::group(Node::word("a")), Node::word("b")])
                .to_string(),
            "(a)OR b"
        );
        assert_eq!(
            Node::range(Node::word("1"), Node::word("2"), true, true).to_string(),
            "[1 TO 2]"
        );
    }

    #[test]
    fn test_equality_ignores_trivia() {
        let a = Node::word("foo").with_head("  ").with_tail(" ");
        let b = Node::word("foo");
        assert_eq!(a, b);
        assert!(!a.eq_with_trivia(&b));
        assert!(a.eq_with_trivia(&a.clone()));
    }

    #[test]
    fn test_equality_compares_attributes() {
        let a = Node::range(Node::word("1"), Node::word("2"), true, true);
        let b = Node::range(Node::word("1"), Node::word("2"), true, false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_recurses_children() {
        let a = Node::group(Node::word("foo").with_head(" "));
        let b = Node::group(Node::word("foo"));
        let c = Node::group(Node::word("bar"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_clone_is_deep_and_equal() {
        let tree = Node::or_operation(vec![
            Node::search_field("f", Node::word("a")).with_tail(" "),
            spaced(Node::word("b")),
        ]);
        let copy = tree.clone();
        assert_eq!(tree, copy);
        assert!(tree.eq_with_trivia(&copy));
    }

    #[test]
    fn test_children_order() {
        let tree = Node::range(Node::word("lo"), Node::word("hi"), true, true);
        let children: Vec<_> = tree.children().iter().map(|c| c.to_string()).collect();
        assert_eq!(children, vec!["lo", "hi"]);
    }

    #[test]
    fn test_with_children_replaces() {
        let tree = Node::group(Node::word("a"));
        let rebuilt = tree.with_children(vec![Node::word("b")]).unwrap();
        assert_eq!(rebuilt, Node::group(Node::word("b")));
    }

    #[test]
    fn test_with_children_arity_errors() {
        let group = Node::group(Node::word("a"));
        assert!(group.with_children(vec![]).is_err());
        let word = Node::word("a");
        assert!(word.with_children(vec![Node::word("b")]).is_err());
        let op = Node::and_operation(vec![Node::word("a"), Node::word("b")]);
        assert!(op.with_children(vec![Node::word("a")]).is_err());
    }

    #[test]
    fn test_wildcard_helpers() {
        let word = Node::word("fo*o?");
        assert!(word.has_wildcard());
        assert_eq!(word.iter_wildcards(), vec![(2, '*'), (4, '?')]);
        let escaped = Node::word(r"fo\*o");
        assert!(!escaped.has_wildcard());
    }

    #[test]
    fn test_unescaped_value() {
        let word = Node::word(r"spam\:egg");
        assert_eq!(word.unescaped_value().unwrap(), "spam:egg");
    }

    #[test]
    fn test_source_span() {
        let node = Node::word("foo").with_head(" ").with_span(1, 3);
        assert_eq!(node.source_span(false), Some((1, 4)));
        assert_eq!(node.source_span(true), Some((0, 4)));
    }
}
