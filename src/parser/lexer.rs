//! Lexer for the Lucene query syntax
//!
//! Tokenizes a query string into a stream of tokens. Each token carries the
//! exact source text of its lexeme, its character position, and the
//! whitespace run preceding it (`head` trivia), so that the parser can
//! rebuild the input byte for byte.

use crate::error::{LuceqError, Result};

/// Token kinds of the query grammar
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An unquoted term; may contain Lucene escapes and `*`/`?` wildcards
    Term,
    /// A quoted phrase, quotes included in the lexeme
    Phrase,
    /// A `/…/` regular expression, slashes included in the lexeme
    Regex,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// The `TO` range keyword
    To,
    /// `AND` or `&&`
    And,
    /// `OR` or `||`
    Or,
    /// `NOT` or `!`
    Not,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `~` with an optional degree, eg. `~2` or `~0.5`
    Approx(Option<f64>),
    /// `^` with its boosting force, eg. `^2`; the force is checked by the parser
    Caret(Option<f64>),
    /// A standalone `*` wildcard
    Star,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Short description used in expected-token sets of syntax errors
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Term => "a term",
            TokenKind::Phrase => "a phrase",
            TokenKind::Regex => "a regex",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::To => "'TO'",
            TokenKind::And => "'AND'",
            TokenKind::Or => "'OR'",
            TokenKind::Not => "'NOT'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Approx(_) => "'~'",
            TokenKind::Caret(_) => "'^'",
            TokenKind::Star => "'*'",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A lexed token with its exact source text and position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text of the token
    pub lexeme: String,
    /// Character offset of the lexeme, not accounting for `head`
    pub pos: usize,
    /// Whitespace run immediately before the lexeme
    pub head: String,
}

impl Token {
    /// Character offset just after the lexeme
    pub fn end(&self) -> usize {
        self.pos + self.lexeme.chars().count()
    }
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token that carries any
    /// trailing whitespace as its head
    pub fn tokenize(input: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        let head = self.take_whitespace();
        let pos = self.position;

        if self.position >= self.input.len() {
            return Ok(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                pos,
                head,
            });
        }

        let ch = self.current_char();
        fn single(kind: TokenKind, ch: char, pos: usize, head: String) -> Token {
            Token {
                kind,
                lexeme: ch.to_string(),
                pos,
                head,
            }
        }

        match ch {
            '(' => {
                self.advance();
                Ok(single(TokenKind::LParen, ch, pos, head))
            }
            ')' => {
                self.advance();
                Ok(single(TokenKind::RParen, ch, pos, head))
            }
            '[' => {
                self.advance();
                Ok(single(TokenKind::LBracket, ch, pos, head))
            }
            ']' => {
                self.advance();
                Ok(single(TokenKind::RBracket, ch, pos, head))
            }
            '{' => {
                self.advance();
                Ok(single(TokenKind::LBrace, ch, pos, head))
            }
            '}' => {
                self.advance();
                Ok(single(TokenKind::RBrace, ch, pos, head))
            }
            ':' => {
                self.advance();
                Ok(single(TokenKind::Colon, ch, pos, head))
            }
            '+' => {
                self.advance();
                Ok(single(TokenKind::Plus, ch, pos, head))
            }
            '-' => {
                self.advance();
                Ok(single(TokenKind::Minus, ch, pos, head))
            }
            '!' => {
                self.advance();
                Ok(single(TokenKind::Not, ch, pos, head))
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    self.advance();
                    Ok(Token {
                        kind: TokenKind::And,
                        lexeme: "&&".to_string(),
                        pos,
                        head,
                    })
                } else {
                    Err(LuceqError::IllegalCharacter {
                        pos,
                        character: '&',
                    })
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    self.advance();
                    Ok(Token {
                        kind: TokenKind::Or,
                        lexeme: "||".to_string(),
                        pos,
                        head,
                    })
                } else {
                    Err(LuceqError::IllegalCharacter {
                        pos,
                        character: '|',
                    })
                }
            }
            '~' => {
                self.advance();
                let (degree, number) = self.read_number()?;
                Ok(Token {
                    kind: TokenKind::Approx(degree),
                    lexeme: format!("~{}", number),
                    pos,
                    head,
                })
            }
            '^' => {
                self.advance();
                let (force, number) = self.read_number()?;
                Ok(Token {
                    kind: TokenKind::Caret(force),
                    lexeme: format!("^{}", number),
                    pos,
                    head,
                })
            }
            '"' => self.read_phrase(pos, head),
            '/' => self.read_regex(pos, head),
            _ if Self::is_term_start(ch) => Ok(self.read_term(pos, head)),
            _ => Err(LuceqError::IllegalCharacter { pos, character: ch }),
        }
    }

    fn read_term(&mut self, pos: usize, head: String) -> Token {
        let mut lexeme = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '\\' && self.peek().is_some() {
                lexeme.push(ch);
                self.advance();
                lexeme.push(self.current_char());
                self.advance();
            } else if Self::is_term_char(ch) {
                lexeme.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // reserved words are case sensitive: "and" is an ordinary term
        let kind = match lexeme.as_str() {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            "TO" => TokenKind::To,
            "*" => TokenKind::Star,
            _ => TokenKind::Term,
        };
        Token {
            kind,
            lexeme,
            pos,
            head,
        }
    }

    fn read_phrase(&mut self, pos: usize, head: String) -> Result<Token> {
        let mut lexeme = String::from('"');
        self.advance();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '"' {
                lexeme.push(ch);
                self.advance();
                return Ok(Token {
                    kind: TokenKind::Phrase,
                    lexeme,
                    pos,
                    head,
                });
            }
            if ch == '\\' && self.peek().is_some() {
                lexeme.push(ch);
                self.advance();
            }
            lexeme.push(self.current_char());
            self.advance();
        }

        Err(LuceqError::Syntax {
            pos,
            excerpt: lexeme.chars().take(20).collect(),
            expected: vec!["a closing '\"'"],
        })
    }

    fn read_regex(&mut self, pos: usize, head: String) -> Result<Token> {
        let mut lexeme = String::from('/');
        self.advance();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '/' {
                lexeme.push(ch);
                self.advance();
                return Ok(Token {
                    kind: TokenKind::Regex,
                    lexeme,
                    pos,
                    head,
                });
            }
            if ch == '\\' && self.peek().is_some() {
                lexeme.push(ch);
                self.advance();
            }
            lexeme.push(self.current_char());
            self.advance();
        }

        Err(LuceqError::Syntax {
            pos,
            excerpt: lexeme.chars().take(20).collect(),
            expected: vec!["a closing '/'"],
        })
    }

    /// Read an optional non-negative decimal, returning its value and text
    fn read_number(&mut self) -> Result<(Option<f64>, String)> {
        let start = self.position;
        let mut text = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() || ch == '.' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if text.is_empty() {
            return Ok((None, text));
        }
        match text.parse::<f64>() {
            Ok(value) => Ok((Some(value), text)),
            Err(_) => Err(LuceqError::Syntax {
                pos: start,
                excerpt: text.clone(),
                expected: vec!["a number"],
            }),
        }
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn take_whitespace(&mut self) -> String {
        let mut ws = String::new();
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            ws.push(self.current_char());
            self.advance();
        }
        ws
    }

    /// Check if a character can start a term
    fn is_term_start(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '.' | '*' | '?' | '\\')
    }

    /// Check if a character can be part of a term; `-` continues a term but
    /// cannot start one, where it is the prohibit operator
    fn is_term_char(ch: char) -> bool {
        Self::is_term_start(ch) || ch == '-'
    }
}
