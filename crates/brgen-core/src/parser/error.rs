//! Parser error types for the brgen language

use crate::ast::BinaryOp;
use crate::lexer::{Loc, Tag};
use thiserror::Error;

/// A parser error with location information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error
    pub kind: ParseErrorKind,
    /// Source location where the error occurred
    pub loc: Loc,
    /// Optional hint for fixing the error
    pub hint: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    #[must_use]
    pub fn new(kind: ParseErrorKind, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            hint: None,
        }
    }

    /// Add a hint to this error
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Errors tolerant mode may record instead of aborting
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, .. } => matches!(
                expected,
                Expected::Token(":") | Expected::Tag(Tag::Line)
            ),
            ParseErrorKind::InvalidAssignmentTarget { .. } => true,
            _ => false,
        }
    }

    /// Second location the error refers to, with its note
    #[must_use]
    pub fn related(&self) -> Option<(Loc, &'static str)> {
        match &self.kind {
            ParseErrorKind::DuplicateDefinition { previous, .. }
            | ParseErrorKind::DuplicateUnionField { previous, .. } => {
                Some((*previous, "previous definition is here"))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.loc)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// The kind of parse error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expect {expected} but found {found}")]
    UnexpectedToken { expected: Expected, found: String },

    #[error("expect larger indent than {current} but found {found}")]
    IndentError { current: usize, found: usize },

    #[error("indent of {found} does not match the block indent {expected}")]
    IndentMismatch { expected: usize, found: usize },

    #[error("duplicate definition of `{name}`")]
    DuplicateDefinition { name: String, previous: Loc },

    #[error("{}", assignment_target_message(.op))]
    InvalidAssignmentTarget { op: BinaryOp },

    #[error("duplicate field name `{name}` in one branch")]
    DuplicateUnionField { name: String, previous: Loc },

    #[error("range operator cannot follow another range")]
    InvalidRangeChain,

    #[error("invalid literal {literal}: {reason}")]
    InvalidLiteral { literal: String, reason: &'static str },

    #[error("invalid enum member: {0}")]
    InvalidEnumMember(&'static str),

    #[error("unexpected character `{0}`")]
    Lexical(String),

    #[error("identifier `{0}` is already resolved")]
    AlreadyResolved(String),
}

fn assignment_target_message(op: &BinaryOp) -> String {
    if op.is_defining_assign() {
        "left of `:=`, `::=`, or `in` must be ident".to_string()
    } else {
        format!("left of `{op}` must be ident, member access, indexed or input/output/config")
    }
}

/// What the parser was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// Exact token text
    Token(&'static str),
    /// Any token of the tag
    Tag(Tag),
    Description(&'static str),
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(text) => write!(f, "token `{text}`"),
            Expected::Tag(tag) => write!(f, "{tag}"),
            Expected::Description(desc) => f.write_str(desc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Token("("),
                found: ")".to_string(),
            },
            Loc::default(),
        )
        .with_hint("missing opening `(`?");
        let text = err.to_string();
        assert!(text.starts_with("expect token `(` but found )"));
        assert!(text.ends_with("(hint: missing opening `(`?)"));
    }

    #[test]
    fn recoverable_kinds() {
        let colon = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Token(":"),
                found: "x".to_string(),
            },
            Loc::default(),
        );
        assert!(colon.is_recoverable());
        let indent = ParseError::new(
            ParseErrorKind::IndentError {
                current: 2,
                found: 2,
            },
            Loc::default(),
        );
        assert!(!indent.is_recoverable());
    }

    #[test]
    fn assignment_messages() {
        let define = ParseErrorKind::InvalidAssignmentTarget {
            op: BinaryOp::DefineAssign,
        };
        assert_eq!(define.to_string(), "left of `:=`, `::=`, or `in` must be ident");
        let assign = ParseErrorKind::InvalidAssignmentTarget {
            op: BinaryOp::Assign,
        };
        assert!(assign.to_string().starts_with("left of `=` must be"));
    }
}
