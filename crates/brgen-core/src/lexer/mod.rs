//! Lexer for the brgen binary format language
//!
//! The lexer converts source code into a stream of tagged tokens, handling:
//! - Indentation (leading whitespace of non-blank lines becomes an indent token)
//! - Keywords, identifiers and punctuation
//! - Integer, bool, string and char literals
//! - `#` line comments
//! - Source location tracking
//!
//! Whitespace and comments are kept as tokens; the parser decides where they matter.

#![allow(clippy::cast_possible_truncation)] // We intentionally use u32 for spans; files > 4GB are unsupported

mod span;
mod token;

pub use span::{FileId, LineIndex, Loc, Location, Span};
pub use token::{Tag, Token, KEYWORDS};

use logos::Logos;
use token::RawKind;

/// The brgen lexer
///
/// Yields every token of the source followed by a single [`Tag::End`] token.
pub struct Lexer<'source> {
    source: &'source str,
    file: FileId,
    inner: logos::Lexer<'source, RawKind>,
    index: LineIndex,
    at_line_start: bool,
    finished: bool,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source code
    #[must_use]
    pub fn new(source: &'source str) -> Self {
        Self::with_file(source, 0)
    }

    /// Create a lexer whose locations carry `file`
    #[must_use]
    pub fn with_file(source: &'source str, file: FileId) -> Self {
        Self {
            source,
            file,
            inner: RawKind::lexer(source),
            index: LineIndex::new(source),
            at_line_start: true,
            finished: false,
        }
    }

    /// Tokenize the entire source, end token included
    #[must_use]
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn loc(&self, range: std::ops::Range<usize>) -> Loc {
        let location = self.index.location(self.source, range.start as u32);
        Loc::new(self.file, location, Span::from_range(range))
    }

    /// Whether the token after the current one carries content
    fn content_follows(&self) -> bool {
        let mut peek = self.inner.clone();
        !matches!(
            peek.next(),
            None | Some(Ok(RawKind::Comment | RawKind::Line))
        )
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let Some(result) = self.inner.next() else {
            self.finished = true;
            let end = self.source.len();
            return Some(Token::new(Tag::End, "", self.loc(end..end)));
        };
        let range = self.inner.span();
        let text = self.inner.slice();
        let line_start = std::mem::replace(&mut self.at_line_start, false);
        let tag = match result {
            Ok(RawKind::Line) => {
                self.at_line_start = true;
                Tag::Line
            }
            Ok(RawKind::Space) if line_start && self.content_follows() => Tag::Indent,
            Ok(kind) => kind.tag(text),
            Err(()) => Tag::Error,
        };
        if tag == Tag::Error {
            log::trace!("unexpected character {:?} at {}", text, range.start);
        }
        Some(Token::new(tag, text, self.loc(range)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(source: &str) -> Vec<Tag> {
        Lexer::tokenize(source).into_iter().map(|t| t.tag).collect()
    }

    #[test]
    fn indent_only_before_content() {
        let tokens = Lexer::tokenize("format A:\n  x :u8\n");
        let indent = tokens.iter().find(|t| t.tag == Tag::Indent).unwrap();
        assert_eq!(indent.text, "  ");
        assert_eq!(indent.loc.line, 2);
        assert_eq!(indent.loc.column, 1);
    }

    #[test]
    fn blank_and_comment_lines_have_no_indent() {
        let tags = tags("a\n   \n  # note\nb");
        assert!(!tags.contains(&Tag::Indent));
        assert!(tags.contains(&Tag::Comment));
    }

    #[test]
    fn keywords_literals_and_end() {
        let tokens = Lexer::tokenize("if x == 0x10: 'a' \"s\" true");
        let tags: Vec<_> = tokens
            .iter()
            .filter(|t| t.tag != Tag::Space)
            .map(|t| t.tag)
            .collect();
        assert_eq!(
            tags,
            vec![
                Tag::Keyword,
                Tag::Ident,
                Tag::Punct,
                Tag::IntLiteral,
                Tag::Punct,
                Tag::CharLiteral,
                Tag::StrLiteral,
                Tag::BoolLiteral,
                Tag::End,
            ]
        );
    }

    #[test]
    fn unknown_character_is_error_token() {
        let tokens = Lexer::tokenize("x @ y");
        let error = tokens.iter().find(|t| t.tag == Tag::Error).unwrap();
        assert_eq!(error.text, "@");
        assert_eq!(error.loc.column, 3);
    }

    #[test]
    fn file_id_is_recorded() {
        let token = Lexer::with_file("x", 7).next().unwrap();
        assert_eq!(token.loc.file, 7);
    }
}
