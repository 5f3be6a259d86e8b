//! Token cursor with checkpoints
//!
//! The stream pulls tokens lazily from a [`TokenSource`] and keeps everything
//! it has read, so the parser can step back to any earlier [`Checkpoint`].

use super::error::{Expected, ParseError, ParseErrorKind};
use super::ParseResult;
use crate::lexer::{Loc, Span, Tag, Token};

/// Anything that hands out tokens one at a time
pub trait TokenSource {
    /// Next token, `None` once the source is exhausted
    fn next_token(&mut self) -> Option<Token>;
}

impl<I> TokenSource for I
where
    I: Iterator<Item = Token>,
{
    fn next_token(&mut self) -> Option<Token> {
        self.next()
    }
}

/// Saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

pub struct TokenStream<S> {
    source: S,
    tokens: Vec<Token>,
    pos: usize,
    exhausted: bool,
    end_loc: Loc,
    lex_error: Option<ParseError>,
    collect_comments: bool,
    /// Comments seen while skipping, not yet attached
    comments: Vec<Token>,
    /// Index past the last comment already buffered
    comment_mark: usize,
}

impl<S: TokenSource> TokenStream<S> {
    pub fn new(source: S, collect_comments: bool) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            pos: 0,
            exhausted: false,
            end_loc: Loc::default(),
            lex_error: None,
            collect_comments,
            comments: Vec::new(),
            comment_mark: 0,
        }
    }

    fn fill(&mut self) {
        while !self.exhausted && self.pos >= self.tokens.len() {
            match self.source.next_token() {
                None => {
                    self.exhausted = true;
                    if let Some(last) = self.tokens.last() {
                        let end = last.loc.span.end;
                        self.end_loc = Loc {
                            span: Span::new(end, end),
                            ..last.loc
                        };
                    }
                }
                Some(token) if token.tag == Tag::End => {
                    self.exhausted = true;
                    self.end_loc = token.loc;
                }
                Some(token) if token.tag == Tag::Error => {
                    // Everything after a lexical error is unreliable
                    self.exhausted = true;
                    self.end_loc = token.loc;
                    self.lex_error = Some(ParseError::new(
                        ParseErrorKind::Lexical(token.text),
                        token.loc,
                    ));
                }
                Some(token) => self.tokens.push(token),
            }
        }
    }

    /// Lexical error that cut the stream short, if any
    pub fn take_lex_error(&mut self) -> Option<ParseError> {
        self.lex_error.take()
    }

    pub fn eos(&mut self) -> bool {
        self.fill();
        self.pos >= self.tokens.len()
    }

    #[must_use]
    pub fn peek(&mut self) -> Option<&Token> {
        self.fill();
        self.tokens.get(self.pos)
    }

    /// Location of the current token, or of the end of input
    pub fn loc(&mut self) -> Loc {
        let loc = self.peek().map(|t| t.loc);
        loc.unwrap_or(self.end_loc)
    }

    pub fn expect_tag(&mut self, tag: Tag) -> bool {
        self.peek().is_some_and(|t| t.tag == tag)
    }

    pub fn expect_text(&mut self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is(text))
    }

    /// Current token if it has `tag`, without consuming it
    pub fn peek_tag(&mut self, tag: Tag) -> Option<Token> {
        self.peek().filter(|t| t.tag == tag).cloned()
    }

    /// Consume the current token whatever it is
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn consume_tag(&mut self, tag: Tag) -> Option<Token> {
        if self.expect_tag(tag) {
            self.advance()
        } else {
            None
        }
    }

    pub fn consume_text(&mut self, text: &str) -> Option<Token> {
        if self.expect_text(text) {
            self.advance()
        } else {
            None
        }
    }

    pub fn must_consume_tag(&mut self, tag: Tag) -> ParseResult<Token> {
        match self.consume_tag(tag) {
            Some(token) => Ok(token),
            None => Err(self.token_error(Expected::Tag(tag))),
        }
    }

    pub fn must_consume_text(&mut self, text: &'static str) -> ParseResult<Token> {
        match self.consume_text(text) {
            Some(token) => Ok(token),
            None => Err(self.token_error(Expected::Token(text))),
        }
    }

    /// `UnexpectedToken` at the current position
    pub fn token_error(&mut self, expected: Expected) -> ParseError {
        let loc = self.loc();
        let found = self
            .peek()
            .map_or_else(|| "<EOF>".to_string(), ToString::to_string);
        let hint = match found.as_str() {
            ")" => Some("missing opening `(`?"),
            "]" => Some("missing opening `[`?"),
            ">" => Some("missing opening `<`?"),
            _ => None,
        };
        let err = ParseError::new(ParseErrorKind::UnexpectedToken { expected, found }, loc);
        match hint {
            Some(hint) => err.with_hint(hint),
            None => err,
        }
    }

    fn skip_while(&mut self, skip: impl Fn(Tag) -> bool) {
        while let Some(tag) = self.peek().map(|t| t.tag) {
            if !skip(tag) {
                break;
            }
            if tag == Tag::Comment && self.collect_comments && self.pos >= self.comment_mark {
                self.comments.push(self.tokens[self.pos].clone());
                self.comment_mark = self.pos + 1;
            }
            self.pos += 1;
        }
    }

    /// Skip spaces and comments
    pub fn skip_space(&mut self) {
        self.skip_while(|tag| matches!(tag, Tag::Space | Tag::Comment));
    }

    /// Skip spaces, comments and line breaks
    pub fn skip_line(&mut self) {
        self.skip_while(|tag| matches!(tag, Tag::Space | Tag::Comment | Tag::Line));
    }

    /// Skip spaces, comments, line breaks and indents
    pub fn skip_white(&mut self) {
        self.skip_while(|tag| matches!(tag, Tag::Space | Tag::Comment | Tag::Line | Tag::Indent));
    }

    /// Comments buffered since the last call
    pub fn take_comments(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.comments)
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Unconsume the most recent token
    pub fn backward(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn stream(source: &str) -> TokenStream<Lexer<'_>> {
        TokenStream::new(Lexer::new(source), true)
    }

    #[test]
    fn consume_and_expect() {
        let mut s = stream("a := 1");
        assert!(s.consume_tag(Tag::Ident).is_some());
        s.skip_space();
        assert!(s.expect_text(":="));
        assert!(s.consume_text("=").is_none());
        assert!(s.must_consume_text(":=").is_ok());
        s.skip_space();
        assert_eq!(s.must_consume_tag(Tag::IntLiteral).unwrap().text, "1");
        assert!(s.eos());
    }

    #[test]
    fn error_reports_eof() {
        let mut s = stream("a");
        s.consume_tag(Tag::Ident);
        let err = s.must_consume_text(":").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Token(":"),
                found: "<EOF>".to_string(),
            }
        );
        assert_eq!(err.loc.span.start, 1);
    }

    #[test]
    fn unmatched_closer_gets_hint() {
        let mut s = stream(")");
        let err = s.must_consume_tag(Tag::Ident).unwrap_err();
        assert_eq!(err.hint.as_deref(), Some("missing opening `(`?"));
    }

    #[test]
    fn rollback_restores_position() {
        let mut s = stream("a b c");
        let start = s.checkpoint();
        s.consume_tag(Tag::Ident);
        s.skip_space();
        s.consume_tag(Tag::Ident);
        s.rollback(start);
        assert_eq!(s.peek().unwrap().text, "a");
        s.consume_tag(Tag::Ident);
        s.backward();
        assert_eq!(s.peek().unwrap().text, "a");
    }

    #[test]
    fn comments_are_buffered_once() {
        let mut s = stream("# one\nx");
        let start = s.checkpoint();
        s.skip_line();
        s.rollback(start);
        s.skip_line();
        let comments = s.take_comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "# one");
    }

    #[test]
    fn lexical_error_ends_stream() {
        let mut s = stream("a @ b");
        s.consume_tag(Tag::Ident);
        s.skip_space();
        assert!(s.eos());
        let err = s.take_lex_error().unwrap();
        assert_eq!(err.kind, ParseErrorKind::Lexical("@".to_string()));
    }
}
