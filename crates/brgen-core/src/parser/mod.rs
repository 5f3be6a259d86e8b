//! Parser for the brgen format language
//!
//! Statements are line oriented and blocks are introduced by `:` followed
//! by a deeper indent. Expressions use precedence climbing over the table in
//! [`layers`]. While parsing, identifiers are placed in a [`ScopeTree`] and
//! every `if`/`match` exports a union of the fields its branches declare.
//!
//! # Example
//!
//! ```
//! use brgen_core::{parse_source, ParseOptions};
//!
//! let source = "format Header:\n  magic :u32\n  len :u16\n";
//! let tree = parse_source(source, &ParseOptions::default()).unwrap();
//! assert_eq!(tree.program().unwrap().elements.len(), 1);
//! ```

mod branch;
mod decl;
mod error;
mod expr;
mod layers;
mod stream;
mod types;

pub use error::{Expected, ParseError, ParseErrorKind};
pub use stream::{Checkpoint, TokenSource, TokenStream};

use crate::ast::{
    Ast, Comment, CommentGroup, IndentBlock, LoopControl, NodeId, NodeKind, Program, StructType,
};
use crate::config::ParseOptions;
use crate::diagnostic::{Diagnostic, Reporter};
use crate::lexer::{Lexer, Loc, Tag, Token};
use crate::scope::ScopeTree;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// A finished parse
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub ast: Ast,
    pub scopes: ScopeTree,
    /// The [`Program`] node
    pub root: NodeId,
    /// Errors recorded in tolerant mode
    pub diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    #[must_use]
    pub fn program(&self) -> Option<&Program> {
        match self.ast.kind(self.root) {
            NodeKind::Program(program) => Some(program),
            _ => None,
        }
    }
}

/// What kind of declaration a [`MemberFrame`] stands for
///
/// Needed because the node itself stays reserved until its body is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Format,
    State,
    Enum,
    Function,
}

/// Declaration currently being parsed and the types it refers to
struct MemberFrame {
    id: NodeId,
    kind: MemberKind,
    depends: Vec<NodeId>,
}

/// The brgen parser
pub struct Parser<S> {
    s: TokenStream<S>,
    ast: Ast,
    scopes: ScopeTree,
    reporter: Reporter,
    /// Indent width of the innermost open block
    indent: usize,
    members: Vec<MemberFrame>,
    /// Loops whose bodies are being parsed
    loops: Vec<NodeId>,
    /// Struct that receives new fields and declarations
    current_struct: Option<NodeId>,
    /// Whether the last statement consumed its line break
    line_skipped: bool,
}

impl<'source> Parser<Lexer<'source>> {
    /// Create a parser over source text
    #[must_use]
    pub fn from_source(source: &'source str, options: &ParseOptions) -> Self {
        Parser::new(Lexer::new(source), options)
    }
}

impl<S: TokenSource> Parser<S> {
    #[must_use]
    pub fn new(source: S, options: &ParseOptions) -> Self {
        Self {
            s: TokenStream::new(source, options.collect_comments),
            ast: Ast::new(),
            scopes: ScopeTree::new(),
            reporter: Reporter::new(options.error_tolerant),
            indent: 0,
            members: Vec::new(),
            loops: Vec::new(),
            current_struct: None,
            line_skipped: false,
        }
    }

    /// Parse the whole input
    ///
    /// A lexical error takes precedence over any error it caused.
    pub fn parse(mut self) -> ParseResult<SyntaxTree> {
        let result = self.program();
        if let Some(err) = self.s.take_lex_error() {
            return Err(err);
        }
        let root = result?;
        log::debug!(
            "parsed {} nodes, {} scopes, {} diagnostics",
            self.ast.len(),
            self.scopes.len(),
            self.reporter.diagnostics().len()
        );
        Ok(SyntaxTree {
            ast: self.ast,
            scopes: self.scopes,
            root,
            diagnostics: self.reporter.into_diagnostics(),
        })
    }

    // ==================== Parser State ====================

    fn alloc(&mut self, loc: Loc, kind: NodeKind) -> NodeId {
        self.ast.alloc(loc, kind)
    }

    fn current_member(&self) -> Option<NodeId> {
        self.members.last().map(|frame| frame.id)
    }

    fn current_member_kind(&self) -> Option<MemberKind> {
        self.members.last().map(|frame| frame.kind)
    }

    fn enter_member(&mut self, id: NodeId, kind: MemberKind) {
        log::debug!("enter {kind:?} {id} at depth {}", self.members.len());
        self.members.push(MemberFrame {
            id,
            kind,
            depends: Vec::new(),
        });
    }

    /// Close the innermost declaration, returning the types it referenced
    fn leave_member(&mut self) -> Vec<NodeId> {
        self.members.pop().map(|frame| frame.depends).unwrap_or_default()
    }

    fn add_dependency(&mut self, ident_type: NodeId) {
        let Some(frame) = self.members.last_mut() else {
            return;
        };
        if frame.kind == MemberKind::Format {
            frame.depends.push(ident_type);
        }
    }

    /// Require a block deeper than the enclosing one; returns the old width
    fn enter_indent(&mut self, width: usize, loc: Loc) -> ParseResult<usize> {
        if width <= self.indent {
            return Err(ParseError::new(
                ParseErrorKind::IndentError {
                    current: self.indent,
                    found: width,
                },
                loc,
            ));
        }
        Ok(std::mem::replace(&mut self.indent, width))
    }

    /// Attach a declaration to the struct being built
    fn add_to_struct(&mut self, member: NodeId) {
        let Some(st) = self.current_struct else {
            return;
        };
        if let Some(m) = self.ast.get_mut(member).kind.member_mut() {
            m.belong_struct = Some(st);
        }
        if matches!(self.ast.kind(member), NodeKind::Field(_)) {
            let prev = self.ast.struct_type(st).and_then(|s| {
                s.fields
                    .iter()
                    .rev()
                    .copied()
                    .find(|&f| matches!(self.ast.kind(f), NodeKind::Field(_)))
            });
            if let Some(NodeKind::Field(field)) = prev.map(|p| &mut self.ast.get_mut(p).kind) {
                field.next = Some(member);
            }
        }
        if let Some(s) = self.ast.struct_type_mut(st) {
            s.fields.push(member);
        }
    }

    fn new_struct(&mut self, loc: Loc, base: NodeId) -> NodeId {
        self.alloc(
            loc,
            NodeKind::StructType(StructType {
                fields: Vec::new(),
                base: Some(base),
            }),
        )
    }

    /// Gather buffered comments into a group node
    fn comment_group(&mut self) -> Option<NodeId> {
        let comments = self.s.take_comments();
        let first = comments.first()?.loc;
        let comments = comments
            .into_iter()
            .map(|token| self.alloc(token.loc, NodeKind::Comment(Comment { text: token.text })))
            .collect();
        Some(self.alloc(first, NodeKind::CommentGroup(CommentGroup { comments })))
    }

    /// Record a statement that consumed nothing and step over one token
    fn ensure_progress(&mut self, before: Checkpoint) -> ParseResult<()> {
        if self.s.checkpoint() != before {
            return Ok(());
        }
        let err = self.s.token_error(Expected::Description("statement"));
        if !self.reporter.is_tolerant() {
            return Err(err);
        }
        self.reporter.record(&err);
        self.s.advance();
        Ok(())
    }

    // ==================== Program & Blocks ====================

    fn program(&mut self) -> ParseResult<NodeId> {
        let loc = self.s.loc();
        let program = self.ast.reserve(loc);
        let global_scope = self.scopes.root();
        self.scopes.set_owner(global_scope, program);
        let struct_type = self.new_struct(loc, program);
        self.current_struct = Some(struct_type);

        let mut elements = Vec::new();
        self.s.skip_white();
        while !self.s.eos() {
            elements.extend(self.comment_group());
            let before = self.s.checkpoint();
            let (stmt, _) = self.statement()?;
            elements.push(stmt);
            self.ensure_progress(before)?;
            self.s.skip_white();
        }
        elements.extend(self.comment_group());

        self.ast.fill(
            program,
            NodeKind::Program(Program {
                elements,
                global_scope,
                struct_type,
            }),
        );
        Ok(program)
    }

    /// Consume `:` and the line break that open a block
    fn indent_sign(&mut self) -> ParseResult<()> {
        let header_end = self.s.checkpoint();
        self.s.skip_white();
        if self.s.consume_text(":").is_some() {
            self.s.skip_space();
            if self.s.consume_tag(Tag::Line).is_some() {
                self.s.skip_line();
                return Ok(());
            }
            let err = self.s.token_error(Expected::Tag(Tag::Line));
            self.reporter.recover(err)?;
            self.skip_rest_of_line();
            return Ok(());
        }
        // point at the end of the header, not at the block below it
        self.s.rollback(header_end);
        let err = self.s.token_error(Expected::Token(":"));
        self.reporter.recover(err)?;
        self.skip_rest_of_line();
        Ok(())
    }

    fn skip_rest_of_line(&mut self) {
        while !self.s.eos() && !self.s.expect_tag(Tag::Line) {
            self.s.advance();
        }
        if self.s.consume_tag(Tag::Line).is_some() {
            self.s.skip_line();
        }
    }

    /// Parse `:` and an indented block owned by `owner`
    ///
    /// `params` are declared in the block's scope before its first line.
    fn indent_block(&mut self, owner: NodeId, params: &[NodeId]) -> ParseResult<NodeId> {
        self.indent_sign()?;
        let base = self.s.must_consume_tag(Tag::Indent)?;
        let width = indent_width(&base);
        let block = self.ast.reserve(base.loc);
        let struct_type = self.new_struct(base.loc, owner);
        let outer_indent = self.enter_indent(width, base.loc)?;

        let guard = self.scopes.enter_branch();
        let scope = guard.scope();
        self.scopes.set_owner(scope, owner);
        for &param in params {
            if let Some(ident) = self.ast.member_ident(param) {
                self.scopes.push_to(scope, ident);
                if let Some(ident) = self.ast.ident_mut(ident) {
                    ident.set_scope(scope);
                }
            }
        }
        let outer_struct = self.current_struct.replace(struct_type);

        let mut elements = Vec::new();
        self.block_line(&mut elements)?;
        while let Some(token) = self.s.peek_tag(Tag::Indent) {
            if indent_width(&token) != width {
                break;
            }
            self.s.advance();
            self.block_line(&mut elements)?;
        }

        self.current_struct = outer_struct;
        self.scopes.leave_branch(guard);
        self.indent = outer_indent;
        self.ast.fill(
            block,
            NodeKind::IndentBlock(IndentBlock {
                elements,
                scope,
                struct_type,
            }),
        );
        Ok(block)
    }

    /// Statements up to the end of the current line
    fn block_line(&mut self, elements: &mut Vec<NodeId>) -> ParseResult<()> {
        elements.extend(self.comment_group());
        loop {
            let before = self.s.checkpoint();
            let (stmt, skipped) = self.statement()?;
            elements.push(stmt);
            self.ensure_progress(before)?;
            if skipped || self.s.eos() || self.s.expect_tag(Tag::Indent) {
                return Ok(());
            }
        }
    }

    // ==================== Statements ====================

    /// Parse one statement; the flag tells whether its line was consumed
    fn statement(&mut self) -> ParseResult<(NodeId, bool)> {
        self.line_skipped = false;
        let stmt = if let Some(token) = self.s.consume_text("for") {
            let node = self.for_loop(token)?;
            self.line_skipped = true;
            node
        } else if let Some(token) = self.s.consume_text("format") {
            let node = self.format(token)?;
            self.line_skipped = true;
            node
        } else if let Some(token) = self.s.consume_text("state") {
            let node = self.state(token)?;
            self.line_skipped = true;
            node
        } else if let Some(token) = self.s.consume_text("enum") {
            let node = self.enum_decl(token)?;
            self.line_skipped = true;
            node
        } else if let Some(token) = self.s.consume_text("fn") {
            let node = self.function(token)?;
            self.line_skipped = true;
            node
        } else if let Some(token) = self.s.consume_text("return") {
            let node = self.return_stmt(token)?;
            self.skip_last();
            node
        } else if let Some(token) = self.s.consume_text("break") {
            let related_loop = self.enclosing_loop();
            self.skip_last();
            self.alloc(token.loc, NodeKind::Break(LoopControl { related_loop }))
        } else if let Some(token) = self.s.consume_text("continue") {
            let related_loop = self.enclosing_loop();
            self.skip_last();
            self.alloc(token.loc, NodeKind::Continue(LoopControl { related_loop }))
        } else if self.s.expect_text(":") {
            let node = self.field(None, false)?;
            self.skip_last();
            node
        } else {
            let expr = self.expr()?;
            let node = self.field(Some(expr), false)?;
            self.skip_last();
            node
        };
        Ok((stmt, self.line_skipped))
    }

    /// Consume trailing spaces and the line break that ends a statement
    fn skip_last(&mut self) {
        self.s.skip_space();
        if self.s.consume_tag(Tag::Line).is_some() {
            self.s.skip_line();
            self.line_skipped = true;
        }
    }
}

/// Width in characters of an indent token
fn indent_width(token: &Token) -> usize {
    token.text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseResult<SyntaxTree> {
        Parser::from_source(source, &ParseOptions::default()).parse()
    }

    #[test]
    fn empty_program() {
        let tree = parse("").unwrap();
        let program = tree.program().unwrap();
        assert!(program.elements.is_empty());
        assert_eq!(program.global_scope, tree.scopes.root());
    }

    #[test]
    fn block_requires_deeper_indent() {
        let err = parse("format A:\n  format B:\n  x :u8\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::IndentError { current: 2, found: 2 }));
    }

    #[test]
    fn block_stops_at_dedent() {
        let tree = parse("format A:\n  x :u8\n  y :u8\nz :u8\n").unwrap();
        let program = tree.program().unwrap();
        assert_eq!(program.elements.len(), 2);
        let NodeKind::Format(format) = tree.ast.kind(program.elements[0]) else {
            panic!("expected format");
        };
        let NodeKind::IndentBlock(block) = tree.ast.kind(format.body) else {
            panic!("expected block");
        };
        assert_eq!(block.elements.len(), 2);
    }

    #[test]
    fn missing_colon_is_fatal_when_strict() {
        let err = parse("format A\n  x :u8\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: Expected::Token(":"),
                ..
            }
        ));
    }

    #[test]
    fn missing_colon_is_recorded_when_tolerant() {
        let tree = Parser::from_source("format A\n  x :u8\n", &ParseOptions::tolerant())
            .parse()
            .unwrap();
        assert_eq!(tree.diagnostics.len(), 1);
    }

    #[test]
    fn lexical_error_wins() {
        let err = parse("x := 1 @ 2\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Lexical("@".to_string()));
    }

    #[test]
    fn comments_are_grouped() {
        let options = ParseOptions {
            collect_comments: true,
            ..ParseOptions::default()
        };
        let tree = Parser::from_source("# header\n# more\nx :u8\n", &options)
            .parse()
            .unwrap();
        let program = tree.program().unwrap();
        let NodeKind::CommentGroup(group) = tree.ast.kind(program.elements[0]) else {
            panic!("expected comment group");
        };
        assert_eq!(group.comments.len(), 2);
    }
}
