use thiserror::Error;

/// Main error type for luceq operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuceqError {
    #[error("Illegal character '{character}' at position {pos}")]
    IllegalCharacter { pos: usize, character: char },

    #[error("Syntax error at position {pos} near \"{excerpt}\": expected {}", .expected.join(", "))]
    Syntax {
        pos: usize,
        excerpt: String,
        expected: Vec<&'static str>,
    },

    #[error("Syntax error at end of input: expected {}", .expected.join(", "))]
    SyntaxAtEof { pos: usize, expected: Vec<&'static str> },

    #[error("Inconsistent query: {0}")]
    InconsistentQuery(String),

    #[error("\"{expr}\" can't be directly attributed to \"{field}\" as it is a nested field")]
    NestedSearchField { expr: String, field: String },

    #[error("\"{expr}\" attributed to unknown nested or object field \"{field}\"")]
    ObjectSearchField { expr: String, field: String },

    #[error("Explicit OR and AND mixed on the same level near \"{0}\", use parenthesis to group them")]
    OrAndAndOnSameLevel(String),

    #[error("Found an unresolved unknown operation and no default operator is configured")]
    UnknownOperationUnresolved,

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("No name \"{0}\" in the name index")]
    UnknownName(String),

    #[error("No element at path {0:?}")]
    InvalidPath(Vec<usize>),
}

/// Result type alias for luceq operations
pub type Result<T> = std::result::Result<T, LuceqError>;

impl LuceqError {
    /// Check if this error was produced while parsing, as opposed to
    /// transforming or translating a tree.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            LuceqError::IllegalCharacter { .. }
                | LuceqError::Syntax { .. }
                | LuceqError::SyntaxAtEof { .. }
        )
    }

    /// Position of the error in the source text, when it applies to one
    pub fn position(&self) -> Option<usize> {
        match self {
            LuceqError::IllegalCharacter { pos, .. }
            | LuceqError::Syntax { pos, .. }
            | LuceqError::SyntaxAtEof { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LuceqError::IllegalCharacter {
            pos: 4,
            character: '&',
        };
        assert_eq!(err.to_string(), "Illegal character '&' at position 4");
    }

    #[test]
    fn test_syntax_error_display() {
        let err = LuceqError::Syntax {
            pos: 7,
            excerpt: "foo AND )".to_string(),
            expected: vec!["a term", "'('"],
        };
        assert!(err.to_string().contains("position 7"));
        assert!(err.to_string().contains("a term, '('"));
    }

    #[test]
    fn test_parse_error_classification() {
        assert!(LuceqError::SyntaxAtEof {
            pos: 3,
            expected: vec!["a term"]
        }
        .is_parse_error());
        assert!(!LuceqError::UnknownOperationUnresolved.is_parse_error());
    }

    #[test]
    fn test_position() {
        let err = LuceqError::IllegalCharacter {
            pos: 2,
            character: '|',
        };
        assert_eq!(err.position(), Some(2));
        assert_eq!(LuceqError::UnknownName("a".into()).position(), None);
    }
}
