//! Token types for the brgen lexer

use logos::Logos;

use super::Loc;

/// Lexical category of a token as seen by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Leading whitespace of a non-blank line
    Indent,
    Space,
    Line,
    Punct,
    IntLiteral,
    BoolLiteral,
    StrLiteral,
    RegexLiteral,
    CharLiteral,
    Keyword,
    Ident,
    Comment,
    Error,
    End,
}

impl Tag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tag::Indent => "indent",
            Tag::Space => "space",
            Tag::Line => "line",
            Tag::Punct => "punct",
            Tag::IntLiteral => "int literal",
            Tag::BoolLiteral => "bool literal",
            Tag::StrLiteral => "str literal",
            Tag::RegexLiteral => "regex literal",
            Tag::CharLiteral => "char literal",
            Tag::Keyword => "keyword",
            Tag::Ident => "identifier",
            Tag::Comment => "comment",
            Tag::Error => "error",
            Tag::End => "end of input",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Words that lex as [`Tag::Keyword`] instead of [`Tag::Ident`]
pub const KEYWORDS: &[&str] = &[
    "format", "if", "elif", "else", "match", "fn", "for", "enum", "input", "output", "config",
    "return", "break", "continue", "state",
];

/// A token with its tag, source text and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tag: Tag,
    /// Exact source text, quotes included for literals
    pub text: String,
    pub loc: Loc,
}

impl Token {
    #[must_use]
    pub fn new(tag: Tag, text: impl Into<String>, loc: Loc) -> Self {
        Self {
            tag,
            text: text.into(),
            loc,
        }
    }

    /// Returns true for a punctuation, keyword or identifier token spelled `text`
    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        self.text == text && matches!(self.tag, Tag::Punct | Tag::Keyword | Tag::Ident)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag {
            Tag::Line => f.write_str("<line>"),
            Tag::Indent => write!(f, "<indent {}>", self.text.chars().count()),
            Tag::End => f.write_str("<EOF>"),
            _ => f.write_str(&self.text),
        }
    }
}

/// Raw scanner classes, refined into [`Tag`]s by the lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawKind {
    #[regex(r"[ \t]+")]
    Space,

    #[regex(r"\r\n|\n|\r")]
    Line,

    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"[0-9]+")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"0[oO][0-7]+")]
    #[regex(r"0[bB][01]+")]
    Int,

    #[regex(r#""([^"\\\r\n]|\\.)*""#)]
    Str,

    #[regex(r"'([^'\\\r\n]|\\.)*'")]
    Char,

    #[token("true")]
    #[token("false")]
    Bool,

    /// Keyword or identifier, told apart by [`KEYWORDS`]
    #[regex(r"[_\p{XID_Start}][\p{XID_Continue}]*")]
    Word,

    #[token("::=")]
    #[token(":=")]
    #[token(":")]
    #[token(";")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    #[token("=>")]
    #[token("==")]
    #[token("=")]
    #[token("..=")]
    #[token("..")]
    #[token(".")]
    #[token("->")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<<=")]
    #[token(">>>=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("<<<")]
    #[token(">>>")]
    #[token("<<")]
    #[token(">>")]
    #[token("~")]
    #[token("&&")]
    #[token("||")]
    #[token("&")]
    #[token("|")]
    #[token("!=")]
    #[token("!")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("^")]
    #[token("<=")]
    #[token(">=")]
    #[token("<")]
    #[token(">")]
    #[token("?")]
    #[token(",")]
    #[token("$")]
    Punct,
}

impl RawKind {
    pub(crate) fn tag(self, text: &str) -> Tag {
        match self {
            RawKind::Space => Tag::Space,
            RawKind::Line => Tag::Line,
            RawKind::Comment => Tag::Comment,
            RawKind::Int => Tag::IntLiteral,
            RawKind::Str => Tag::StrLiteral,
            RawKind::Char => Tag::CharLiteral,
            RawKind::Bool => Tag::BoolLiteral,
            RawKind::Word if KEYWORDS.contains(&text) => Tag::Keyword,
            RawKind::Word => Tag::Ident,
            RawKind::Punct => Tag::Punct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(source: &str) -> Vec<(RawKind, &str)> {
        let mut lexer = RawKind::lexer(source);
        let mut out = Vec::new();
        while let Some(kind) = lexer.next() {
            out.push((kind.expect("valid token"), lexer.slice()));
        }
        out
    }

    #[test]
    fn longest_punct_wins() {
        let tokens = raw("::= >>>= ..=");
        assert_eq!(tokens[0], (RawKind::Punct, "::="));
        assert_eq!(tokens[2], (RawKind::Punct, ">>>="));
        assert_eq!(tokens[4], (RawKind::Punct, "..="));
    }

    #[test]
    fn bool_is_not_word() {
        assert_eq!(raw("true")[0].0, RawKind::Bool);
        assert_eq!(raw("trueish")[0].0, RawKind::Word);
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(RawKind::Word.tag("format"), Tag::Keyword);
        assert_eq!(RawKind::Word.tag("formats"), Tag::Ident);
        assert_eq!(RawKind::Word.tag("u8"), Tag::Ident);
    }

    #[test]
    fn hex_literal_is_single_token() {
        assert_eq!(raw("0x1F"), vec![(RawKind::Int, "0x1F")]);
    }
}
