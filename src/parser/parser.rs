//! Recursive descent parser for the Lucene query syntax
//!
//! Builds a [`Node`] tree out of the token stream, weaving whitespace trivia
//! into node heads and tails so that reprinting the tree reproduces the
//! input exactly.
//!
//! Operator precedence, loosest to tightest: `OR`, `AND`, implicit
//! operation, unary prefix (`NOT`, `+`, `-`), `field:`, postfix (`~`, `^`).
//! Chains of the same binary operator are flattened into one n-ary node.

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{LuceqError, Result};
use crate::tree::{Node, NodeKind, Span};

/// Expected-token set reported when an atom was required
const ATOM_EXPECTED: &[&str] = &["a term", "a phrase", "a regex", "'('", "'['", "'{'"];

/// Parser for Lucene query strings
pub struct QueryParser {
    input: String,
    tokens: Vec<Token>,
    index: usize,
    /// Character offset just after the last consumed token
    last_end: usize,
}

impl QueryParser {
    /// Create a parser for the given query string, tokenizing it upfront
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Lexer::tokenize(input)?;
        Ok(Self {
            input: input.to_string(),
            tokens,
            index: 0,
            last_end: 0,
        })
    }

    /// Parse the query string into a tree
    pub fn parse(&mut self) -> Result<Node> {
        let mut root = self.parse_expr()?;

        if self.current().kind != TokenKind::Eof {
            return Err(self.expected_here(vec!["an operator", "end of input"]));
        }
        // trailing whitespace belongs to the root's tail
        let eof = self.advance();
        root.tail.push_str(&eof.head);
        Ok(root)
    }

    /// `expr ← and_expr ( OR and_expr )*`
    fn parse_expr(&mut self) -> Result<Node> {
        let start = self.current().pos;
        let mut operands = vec![self.parse_and_level()?];
        while self.current().kind == TokenKind::Or {
            let op = self.advance();
            if let Some(prev) = operands.last_mut() {
                prev.tail.push_str(&op.head);
            }
            operands.push(self.parse_and_level()?);
        }
        Ok(self.finish_operation(operands, start, Node::or_operation))
    }

    /// `and_expr ← impl_expr ( AND impl_expr )*`
    fn parse_and_level(&mut self) -> Result<Node> {
        let start = self.current().pos;
        let mut operands = vec![self.parse_implicit()?];
        while self.current().kind == TokenKind::And {
            let op = self.advance();
            if let Some(prev) = operands.last_mut() {
                prev.tail.push_str(&op.head);
            }
            operands.push(self.parse_implicit()?);
        }
        Ok(self.finish_operation(operands, start, Node::and_operation))
    }

    /// `impl_expr ← unary ( unary )*`; two or more operands make an
    /// unknown operation, never merged with explicit AND/OR
    fn parse_implicit(&mut self) -> Result<Node> {
        let start = self.current().pos;
        let mut operands = vec![self.parse_unary()?];
        while self.starts_operand() {
            operands.push(self.parse_unary()?);
        }
        Ok(self.finish_operation(operands, start, Node::unknown_operation))
    }

    /// `unary ← NOT unary | PLUS unary | MINUS unary | postfix`
    fn parse_unary(&mut self) -> Result<Node> {
        let build = match self.current().kind {
            TokenKind::Not => Node::not as fn(Node) -> Node,
            TokenKind::Plus => Node::plus,
            TokenKind::Minus => Node::prohibit,
            _ => return self.parse_postfixed_atom(),
        };
        let tok = self.advance();
        let expr = self.parse_unary()?;
        let node = build(expr).with_head(tok.head.clone());
        Ok(self.close_span(node, tok.pos))
    }

    /// `postfix ← atom ( TILDE num? | CARET num )*`
    fn parse_postfixed_atom(&mut self) -> Result<Node> {
        let atom = self.parse_atom()?;
        self.apply_postfix(atom)
    }

    /// `atom ← TERM COLON atom_body | atom_body`; the colon must directly
    /// follow the field name
    fn parse_atom(&mut self) -> Result<Node> {
        if self.current().kind == TokenKind::Term && self.next_is_adjacent_colon() {
            let name = self.advance();
            self.advance(); // the colon
            let body = self.parse_field_body()?;
            let node = Node::search_field(name.lexeme.clone(), body).with_head(name.head.clone());
            return Ok(self.close_span(node, name.pos));
        }
        self.parse_atom_body(false)
    }

    /// Body of a `field:`; postfix operators bind inside the field
    fn parse_field_body(&mut self) -> Result<Node> {
        let body = self.parse_atom_body(true)?;
        self.apply_postfix(body)
    }

    fn parse_atom_body(&mut self, in_field: bool) -> Result<Node> {
        match self.current().kind {
            TokenKind::LParen => {
                let open = self.advance();
                let mut expr = self.parse_expr()?;
                if self.current().kind != TokenKind::RParen {
                    return Err(self.expected_here(vec!["')'"]));
                }
                let close = self.advance();
                expr.tail.push_str(&close.head);
                let node = if in_field {
                    Node::field_group(expr)
                } else {
                    Node::group(expr)
                };
                Ok(self.close_span(node.with_head(open.head.clone()), open.pos))
            }
            TokenKind::LBracket | TokenKind::LBrace => self.parse_range(),
            TokenKind::Phrase => {
                let tok = self.advance();
                let node = Node::phrase(tok.lexeme.clone()).with_head(tok.head.clone());
                Ok(self.close_span(node, tok.pos))
            }
            TokenKind::Regex => {
                let tok = self.advance();
                let node = Node::regex(tok.lexeme.clone()).with_head(tok.head.clone());
                Ok(self.close_span(node, tok.pos))
            }
            TokenKind::Term => {
                let tok = self.advance();
                let value = if in_field {
                    // permit colons in a field value, eg. timestamps
                    self.merge_adjacent(tok.lexeme.clone())
                } else {
                    tok.lexeme.clone()
                };
                let node = Node::word(value).with_head(tok.head.clone());
                Ok(self.close_span(node, tok.pos))
            }
            TokenKind::Star => {
                let tok = self.advance();
                let node = Node::word("*").with_head(tok.head.clone());
                Ok(self.close_span(node, tok.pos))
            }
            // TO is only reserved inside ranges
            TokenKind::To => {
                let tok = self.advance();
                let node = Node::word("TO").with_head(tok.head.clone());
                Ok(self.close_span(node, tok.pos))
            }
            _ => Err(self.expected_here(ATOM_EXPECTED.to_vec())),
        }
    }

    /// `LBRACKET range_bound TO range_bound RBRACKET`, brackets or braces
    /// on either side
    fn parse_range(&mut self) -> Result<Node> {
        let open = self.advance();
        let include_low = open.kind == TokenKind::LBracket;

        let mut low = self.parse_range_bound()?;
        if self.current().kind != TokenKind::To {
            return Err(self.expected_here(vec!["'TO'"]));
        }
        let to = self.advance();
        low.tail.push_str(&to.head);

        let mut high = self.parse_range_bound()?;
        let include_high = match self.current().kind {
            TokenKind::RBracket => true,
            TokenKind::RBrace => false,
            _ => return Err(self.expected_here(vec!["']'", "'}'"])),
        };
        let close = self.advance();
        high.tail.push_str(&close.head);

        let node =
            Node::range(low, high, include_low, include_high).with_head(open.head.clone());
        Ok(self.close_span(node, open.pos))
    }

    /// A range bound: a word or `*`; adjacent colons and dashes are merged
    /// so that timestamps and negative numbers stay a single bound
    fn parse_range_bound(&mut self) -> Result<Node> {
        match self.current().kind {
            TokenKind::Term | TokenKind::Star | TokenKind::Minus => {}
            _ => return Err(self.expected_here(vec!["a range bound"])),
        }
        let first = self.advance();
        let value = self.merge_adjacent(first.lexeme.clone());
        let node = Node::word(value).with_head(first.head.clone());
        Ok(self.close_span(node, first.pos))
    }

    /// Wrap `atom` with fuzziness, proximity and boost postfix operators
    fn apply_postfix(&mut self, mut atom: Node) -> Result<Node> {
        loop {
            match self.current().kind.clone() {
                TokenKind::Approx(degree) => {
                    let tok = self.advance();
                    atom.tail.push_str(&tok.head);
                    let start = atom.span.map(|s| s.pos).unwrap_or(tok.pos);
                    atom = match atom.kind {
                        NodeKind::Word { .. } => {
                            self.close_span(Node::fuzzy(atom, degree), start)
                        }
                        NodeKind::Phrase { .. } => self.close_span(
                            Node::proximity(atom, degree.map(|d| d as u32)),
                            start,
                        ),
                        _ => {
                            return Err(LuceqError::Syntax {
                                pos: tok.pos,
                                excerpt: self.excerpt(tok.pos),
                                expected: vec!["a word or phrase before '~'"],
                            })
                        }
                    };
                }
                TokenKind::Caret(force) => {
                    let tok = self.advance();
                    let Some(force) = force else {
                        return Err(LuceqError::Syntax {
                            pos: tok.pos,
                            excerpt: self.excerpt(tok.pos),
                            expected: vec!["a number after '^'"],
                        });
                    };
                    atom.tail.push_str(&tok.head);
                    let start = atom.span.map(|s| s.pos).unwrap_or(tok.pos);
                    atom = self.close_span(Node::boost(atom, force), start);
                }
                _ => return Ok(atom),
            }
        }
    }

    /// Concatenate directly adjacent term, colon and dash tokens onto
    /// `lexeme`, stopping at the first whitespace or other token kind
    fn merge_adjacent(&mut self, mut lexeme: String) -> String {
        loop {
            let tok = self.current();
            if !tok.head.is_empty() {
                return lexeme;
            }
            match tok.kind {
                TokenKind::Term | TokenKind::Colon | TokenKind::Minus => {
                    let tok = self.advance();
                    lexeme.push_str(&tok.lexeme);
                }
                _ => return lexeme,
            }
        }
    }

    fn finish_operation(
        &self,
        mut operands: Vec<Node>,
        start: usize,
        build: fn(Vec<Node>) -> Node,
    ) -> Node {
        if operands.len() == 1 {
            operands.pop().expect("one operand")
        } else {
            self.close_span(build(operands), start)
        }
    }

    fn close_span(&self, mut node: Node, start: usize) -> Node {
        node.span = Some(Span {
            pos: start,
            size: self.last_end.saturating_sub(start),
        });
        node
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn next_is_adjacent_colon(&self) -> bool {
        self.tokens
            .get(self.index + 1)
            .map(|t| t.kind == TokenKind::Colon && t.head.is_empty())
            .unwrap_or(false)
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Term
                | TokenKind::Phrase
                | TokenKind::Regex
                | TokenKind::Star
                | TokenKind::To
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Not
                | TokenKind::Plus
                | TokenKind::Minus
        )
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        self.last_end = token.end();
        token
    }

    fn expected_here(&self, expected: Vec<&'static str>) -> LuceqError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            LuceqError::SyntaxAtEof {
                pos: token.pos,
                expected,
            }
        } else {
            LuceqError::Syntax {
                pos: token.pos,
                excerpt: self.excerpt(token.pos),
                expected,
            }
        }
    }

    /// One-line excerpt of the input around `pos`, for error messages
    fn excerpt(&self, pos: usize) -> String {
        let chars: Vec<char> = self.input.chars().collect();
        let pos = pos.min(chars.len());
        let line_start = chars[..pos]
            .iter()
            .rposition(|&c| c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = chars[pos..]
            .iter()
            .position(|&c| c == '\n')
            .map(|i| pos + i)
            .unwrap_or(chars.len());
        let start = line_start.max(pos.saturating_sub(20));
        let end = line_end.min(pos + 20);
        chars[start..end].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::tree::Node;

    fn roundtrip(input: &str) {
        let tree = parse(input).unwrap();
        assert_eq!(tree.to_string(), input, "roundtrip failed for {:?}", input);
    }

    #[test]
    fn test_single_word() {
        let tree = parse("foo").unwrap();
        assert_eq!(tree, Node::word("foo"));
    }

    #[test]
    fn test_lone_star_is_a_word() {
        let tree = parse("*").unwrap();
        assert_eq!(tree, Node::word("*"));
    }

    #[test]
    fn test_to_outside_range_is_a_word() {
        let tree = parse("a TO b").unwrap();
        assert_eq!(
            tree,
            Node::unknown_operation(vec![
                Node::word("a"),
                Node::word("TO"),
                Node::word("b")
            ])
        );
    }

    #[test]
    fn test_search_field() {
        let tree = parse("title:fox").unwrap();
        assert_eq!(tree, Node::search_field("title", Node::word("fox")));
    }

    #[test]
    fn test_dotted_field_name() {
        let tree = parse("author.last_name:Smith").unwrap();
        assert_eq!(
            tree,
            Node::search_field("author.last_name", Node::word("Smith"))
        );
    }

    #[test]
    fn test_field_group_not_group() {
        let tree = parse("field:(a)").unwrap();
        assert_eq!(
            tree,
            Node::search_field("field", Node::field_group(Node::word("a")))
        );
        let tree = parse("(a)").unwrap();
        assert_eq!(tree, Node::group(Node::word("a")));
    }

    #[test]
    fn test_spaced_colon_is_not_a_field() {
        assert!(parse("field :a").is_err());
    }

    #[test]
    fn test_operator_chains_flatten() {
        let tree = parse("a AND b AND c").unwrap();
        assert_eq!(
            tree,
            Node::and_operation(vec![
                Node::word("a"),
                Node::word("b"),
                Node::word("c")
            ])
        );
        assert_eq!(tree.children().len(), 3);
    }

    #[test]
    fn test_or_loosest_precedence() {
        let tree = parse("a OR b AND c").unwrap();
        assert_eq!(
            tree,
            Node::or_operation(vec![
                Node::word("a"),
                Node::and_operation(vec![Node::word("b"), Node::word("c")]),
            ])
        );
    }

    #[test]
    fn test_implicit_operation() {
        let tree = parse("foo bar").unwrap();
        assert_eq!(
            tree,
            Node::unknown_operation(vec![Node::word("foo"), Node::word("bar")])
        );
    }

    #[test]
    fn test_implicit_binds_tighter_than_and() {
        let tree = parse("a b AND c").unwrap();
        assert_eq!(
            tree,
            Node::and_operation(vec![
                Node::unknown_operation(vec![Node::word("a"), Node::word("b")]),
                Node::word("c"),
            ])
        );
    }

    #[test]
    fn test_implicit_never_merges_with_explicit() {
        let tree = parse("a b OR c").unwrap();
        assert_eq!(
            tree,
            Node::or_operation(vec![
                Node::unknown_operation(vec![Node::word("a"), Node::word("b")]),
                Node::word("c"),
            ])
        );
    }

    #[test]
    fn test_unary_operators() {
        let tree = parse("NOT a -b +c").unwrap();
        assert_eq!(
            tree,
            Node::unknown_operation(vec![
                Node::not(Node::word("a")),
                Node::prohibit(Node::word("b")),
                Node::plus(Node::word("c")),
            ])
        );
    }

    #[test]
    fn test_fuzzy_and_proximity() {
        assert_eq!(
            parse("foo~2").unwrap(),
            Node::fuzzy(Node::word("foo"), Some(2.0))
        );
        assert_eq!(parse("foo~").unwrap(), Node::fuzzy(Node::word("foo"), None));
        assert_eq!(
            parse("\"a b\"~3").unwrap(),
            Node::proximity(Node::phrase("\"a b\""), Some(3))
        );
    }

    #[test]
    fn test_fuzzy_inside_search_field() {
        let tree = parse("title:foo~2").unwrap();
        assert_eq!(
            tree,
            Node::search_field("title", Node::fuzzy(Node::word("foo"), Some(2.0)))
        );
    }

    #[test]
    fn test_boost() {
        assert_eq!(
            parse("foo^2").unwrap(),
            Node::boost(Node::word("foo"), 2.0)
        );
        assert_eq!(
            parse("(a AND b)^1.5").unwrap(),
            Node::boost(
                Node::group(Node::and_operation(vec![
                    Node::word("a"),
                    Node::word("b")
                ])),
                1.5
            )
        );
        assert_eq!(
            parse("foo~2^3").unwrap(),
            Node::boost(Node::fuzzy(Node::word("foo"), Some(2.0)), 3.0)
        );
    }

    #[test]
    fn test_boost_requires_a_number() {
        let err = parse("foo^").unwrap_err();
        assert!(err.to_string().contains("a number after '^'"));
    }

    #[test]
    fn test_approx_needs_word_or_phrase() {
        assert!(parse("(a b)~2").is_err());
    }

    #[test]
    fn test_range() {
        let tree = parse("field:[a TO *}").unwrap();
        assert_eq!(
            tree,
            Node::search_field(
                "field",
                Node::range(Node::word("a"), Node::word("*"), true, false)
            )
        );
    }

    #[test]
    fn test_range_with_timestamp_bound() {
        let tree = parse("published:[* TO 1990-01-01T00:00:00.000Z]").unwrap();
        assert_eq!(
            tree,
            Node::search_field(
                "published",
                Node::range(
                    Node::word("*"),
                    Node::word("1990-01-01T00:00:00.000Z"),
                    true,
                    true
                )
            )
        );
    }

    #[test]
    fn test_range_with_negative_bounds() {
        let tree = parse("price:[-5 TO 5]").unwrap();
        assert_eq!(
            tree,
            Node::search_field(
                "price",
                Node::range(Node::word("-5"), Node::word("5"), true, true)
            )
        );
    }

    #[test]
    fn test_timestamp_as_field_value() {
        let tree = parse("created:2020-01-01T00:00:00Z").unwrap();
        assert_eq!(
            tree,
            Node::search_field("created", Node::word("2020-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_empty_input_fails_at_position_zero() {
        let err = parse("").unwrap_err();
        assert!(err.is_parse_error());
        assert_eq!(err.position(), Some(0));
    }

    #[test]
    fn test_unmatched_paren() {
        let err = parse("(rust AND python").unwrap_err();
        assert!(matches!(err, LuceqError::SyntaxAtEof { .. }));
    }

    #[test]
    fn test_stray_closing_paren() {
        let err = parse("rust)").unwrap_err();
        assert!(err.to_string().contains("position 4"));
    }

    #[test]
    fn test_scenario_tree_shape() {
        let tree = parse("(title:\"foo bar\" AND body:\"quick fox\") OR title:fox").unwrap();
        assert_eq!(
            tree,
            Node::or_operation(vec![
                Node::group(Node::and_operation(vec![
                    Node::search_field("title", Node::phrase("\"foo bar\"")),
                    Node::search_field("body", Node::phrase("\"quick fox\"")),
                ])),
                Node::search_field("title", Node::word("fox")),
            ])
        );
    }

    #[test]
    fn test_roundtrip() {
        for input in [
            "foo",
            "  foo  ",
            "foo bar",
            "foo  bar\tbaz",
            "foo AND bar",
            "a AND b AND c",
            "a OR b AND c",
            "NOT a AND -b AND +c",
            "title:fox",
            "title: fox",
            "field:(a)",
            "field:( a OR b )",
            "(title:\"foo bar\" AND body:\"quick fox\") OR title:fox",
            "field:[a TO *}",
            "f:{1 TO 10]",
            "price:[-5 TO 5]",
            "published:[* TO 1990-01-01T00:00:00.000Z]",
            "foo~2 OR (bar AND baz)",
            "foo~ bar~0.5",
            "\"a b\"~3",
            "title:\"quick\"^2",
            "(a AND b)^1.5",
            "/fo.*o/ AND f:/bar/",
            r"spam\:egg",
            "a TO b",
            "*",
            "f:*",
        ] {
            roundtrip(input);
        }
    }

    #[test]
    fn test_parse_is_idempotent_over_reprint() {
        for input in [
            "a AND (b OR c)",
            "foo bar baz",
            "f:[1 TO 2]^3",
            "NOT (a OR -b)",
        ] {
            let once = parse(input).unwrap();
            let twice = parse(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_aliases_canonicalize() {
        let tree = parse("a && b || !c").unwrap();
        assert_eq!(
            tree,
            Node::or_operation(vec![
                Node::and_operation(vec![Node::word("a"), Node::word("b")]),
                Node::not(Node::word("c")),
            ])
        );
        assert_eq!(tree.to_string(), "a AND b OR NOT c");
    }

    #[test]
    fn test_spaceless_aliases_reprint_with_separators() {
        assert_eq!(parse("a&&b").unwrap().to_string(), "a AND b");
        assert_eq!(parse("a||b").unwrap().to_string(), "a OR b");
        assert_eq!(parse("!c").unwrap().to_string(), "NOT c");
        assert_eq!(parse("a!b").unwrap().to_string(), "a NOT b");
        // non-word boundaries need no separator
        assert_eq!(parse("(a)&&(b)").unwrap().to_string(), "(a)AND(b)");
        assert_eq!(parse("!(c)").unwrap().to_string(), "NOT(c)");

        for input in ["a&&b", "a||b", "!c", "a!b", "a&&!c||b"] {
            let once = parse(input).unwrap();
            let twice = parse(&once.to_string()).unwrap();
            assert_eq!(once, twice, "alias reprint changed shape of {:?}", input);
        }
    }

    #[test]
    fn test_spans() {
        let tree = parse("  title:fox  ").unwrap();
        assert_eq!(tree.source_span(false), Some((2, 11)));
        assert_eq!(tree.source_span(true), Some((0, 13)));
        let tree = parse("a AND bc").unwrap();
        let span = tree.children()[1].span.unwrap();
        assert_eq!((span.pos, span.size), (6, 2));
    }
}
