//! Expression parsing
//!
//! Binary operators are parsed by climbing [`BIN_LAYERS`] with an explicit
//! `depth` and a stack of half-built nodes, each tagged with the layer that
//! will complete it. Ordinary layers are left associative and finish their
//! node on the next visit to the layer. `?:` and the assignments stay on the
//! stack until the layer is left, so they nest to the right. Ranges finish
//! like ordinary layers but may lack either operand.

use super::layers::{
    ASSIGN_LAYER, BIN_LAYERS, COMMA_LAYER, COMPARE_LAYER, COND_LAYER, RANGE_LAYER, UNARY_OPS,
};
use super::{Expected, ParseError, ParseErrorKind, ParseResult, Parser, TokenSource};
use crate::ast::{
    Binary, BinaryOp, Call, Cast, CharLiteral, Cond, Ident, IdentUsage, Index, IntLiteral,
    MemberAccess, NodeId, NodeKind, Paren, Range, ResolveError, SpecialLiteralKind, StrLiteral,
    TypeLiteral, Unary,
};
use crate::lexer::{Loc, Tag, Token};

/// Operator node still waiting for its right operand
#[derive(Debug)]
enum OpFrame {
    Binary {
        loc: Loc,
        op: BinaryOp,
        left: NodeId,
    },
    /// `?` seen; `then` is set once the `:` has been consumed
    Cond {
        loc: Loc,
        cond: NodeId,
        then: Option<(NodeId, Loc)>,
    },
    Range {
        loc: Loc,
        op: BinaryOp,
        start: Option<NodeId>,
    },
    Assign {
        loc: Loc,
        op: BinaryOp,
        left: NodeId,
    },
}

/// State of one expression climb
#[derive(Debug, Default)]
struct Climb {
    depth: usize,
    /// Operand built so far; `None` only before a leading `..`
    expr: Option<NodeId>,
    stack: Vec<(usize, OpFrame)>,
}

impl Climb {
    fn push(&mut self, frame: OpFrame) {
        self.stack.push((self.depth, frame));
    }

    fn pop_on_depth(&mut self) -> Option<OpFrame> {
        match self.stack.last() {
            Some(&(depth, _)) if depth == self.depth => self.stack.pop().map(|(_, frame)| frame),
            _ => None,
        }
    }
}

impl<S: TokenSource> Parser<S> {
    /// Parse a full expression, commas included
    pub(super) fn expr(&mut self) -> ParseResult<NodeId> {
        self.line_skipped = false;
        let mut climb = Climb::default();
        if !self.s.expect_text("..") && !self.s.expect_text("..=") {
            climb.expr = Some(self.unary()?);
        }
        while climb.depth <= COMMA_LAYER {
            if self.resume_frame(&mut climb)? || self.push_operator(&mut climb)? {
                continue;
            }
            self.close_layer(&mut climb)?;
            climb.depth += 1;
        }
        match climb.expr {
            Some(expr) => Ok(expr),
            None => Err(self.s.token_error(Expected::Description("expression"))),
        }
    }

    /// Start a fresh operand at the tightest layer
    fn climb_low(&mut self, climb: &mut Climb) -> ParseResult<()> {
        climb.expr = Some(self.unary()?);
        climb.depth = 0;
        Ok(())
    }

    fn take_operand(&mut self, climb: &mut Climb) -> ParseResult<NodeId> {
        match climb.expr.take() {
            Some(expr) => Ok(expr),
            None => Err(self.s.token_error(Expected::Description("expression"))),
        }
    }

    /// Pick up the frame left on the current layer
    ///
    /// Returns `true` when the `else` operand of a conditional was started.
    fn resume_frame(&mut self, climb: &mut Climb) -> ParseResult<bool> {
        let Some(frame) = climb.pop_on_depth() else {
            return Ok(false);
        };
        match frame {
            OpFrame::Cond {
                loc,
                cond,
                then: None,
            } => {
                let then = self.take_operand(climb)?;
                self.s.skip_white();
                let colon = self.s.must_consume_text(":")?;
                climb.push(OpFrame::Cond {
                    loc,
                    cond,
                    then: Some((then, colon.loc)),
                });
                self.s.skip_white();
                self.climb_low(climb)?;
                Ok(true)
            }
            // finished when the layer is left
            frame @ (OpFrame::Cond { .. } | OpFrame::Assign { .. }) => {
                climb.push(frame);
                Ok(false)
            }
            frame => {
                let right = self.take_operand(climb)?;
                climb.expr = Some(self.complete(frame, right)?);
                Ok(false)
            }
        }
    }

    /// Consume an operator of the current layer and push its frame
    fn push_operator(&mut self, climb: &mut Climb) -> ParseResult<bool> {
        let Some((token, op)) = self.binary_op(climb.depth) else {
            return Ok(false);
        };
        match climb.depth {
            COND_LAYER => {
                let cond = self.take_operand(climb)?;
                climb.push(OpFrame::Cond {
                    loc: token.loc,
                    cond,
                    then: None,
                });
            }
            RANGE_LAYER => return self.push_range(climb, &token, op).map(|()| true),
            ASSIGN_LAYER => {
                let left = self.take_operand(climb)?;
                climb.push(OpFrame::Assign {
                    loc: token.loc,
                    op,
                    left,
                });
            }
            0 => {
                let left = self.take_operand(climb)?;
                self.s.skip_white();
                let right = self.unary()?;
                climb.expr = Some(self.binary(&token, op, left, right));
                return Ok(true);
            }
            depth => {
                let left = self.take_operand(climb)?;
                if depth == COMPARE_LAYER && self.is_comparison(left) {
                    let err = ParseError::new(
                        ParseErrorKind::UnexpectedToken {
                            expected: Expected::Description("end of comparison"),
                            found: token.text.clone(),
                        },
                        token.loc,
                    );
                    return Err(err.with_hint("comparisons do not chain; combine them with `&&`"));
                }
                climb.push(OpFrame::Binary {
                    loc: token.loc,
                    op,
                    left,
                });
            }
        }
        self.s.skip_white();
        self.climb_low(climb)?;
        Ok(true)
    }

    fn push_range(&mut self, climb: &mut Climb, token: &Token, op: BinaryOp) -> ParseResult<()> {
        if climb
            .expr
            .is_some_and(|e| matches!(self.ast.kind(e), NodeKind::Range(_)))
        {
            return Err(ParseError::new(ParseErrorKind::InvalidRangeChain, token.loc));
        }
        let start = climb.expr.take();
        // a line break ends an open range
        self.s.skip_space();
        if self.range_end_follows() {
            self.s.skip_white();
            climb.push(OpFrame::Range {
                loc: token.loc,
                op,
                start,
            });
            return self.climb_low(climb);
        }
        let range = self.alloc(
            token.loc,
            NodeKind::Range(Range {
                op,
                start,
                end: None,
            }),
        );
        climb.expr = Some(range);
        Ok(())
    }

    /// Finish every right-nesting frame of the layer being left
    fn close_layer(&mut self, climb: &mut Climb) -> ParseResult<()> {
        if climb.depth != COND_LAYER && climb.depth != ASSIGN_LAYER {
            return Ok(());
        }
        while let Some(frame) = climb.pop_on_depth() {
            let right = self.take_operand(climb)?;
            climb.expr = Some(self.complete(frame, right)?);
        }
        Ok(())
    }

    /// Build the node of `frame` with `right` as its last operand
    fn complete(&mut self, frame: OpFrame, right: NodeId) -> ParseResult<NodeId> {
        match frame {
            OpFrame::Binary { loc, op, left } => {
                Ok(self.alloc(loc, NodeKind::Binary(Binary { op, left, right })))
            }
            OpFrame::Range { loc, op, start } => Ok(self.alloc(
                loc,
                NodeKind::Range(Range {
                    op,
                    start,
                    end: Some(right),
                }),
            )),
            OpFrame::Cond {
                loc,
                cond,
                then: Some((then, els_loc)),
            } => Ok(self.alloc(
                loc,
                NodeKind::Cond(Cond {
                    cond,
                    then,
                    els_loc,
                    els: right,
                }),
            )),
            OpFrame::Cond { then: None, .. } => Err(self.s.token_error(Expected::Token(":"))),
            OpFrame::Assign { loc, op, left } => {
                let assign = self.alloc(loc, NodeKind::Binary(Binary { op, left, right }));
                self.check_assignment(assign)?;
                Ok(assign)
            }
        }
    }

    /// Operator of `layer` at the cursor, consumed
    ///
    /// Nothing continues an expression once a block has ended its line.
    fn binary_op(&mut self, layer: usize) -> Option<(Token, BinaryOp)> {
        if self.line_skipped {
            return None;
        }
        self.s.skip_space();
        BIN_LAYERS[layer]
            .iter()
            .find_map(|&(text, op)| self.s.consume_text(text).map(|token| (token, op)))
    }

    fn binary(&mut self, token: &Token, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(token.loc, NodeKind::Binary(Binary { op, left, right }))
    }

    fn range_end_follows(&mut self) -> bool {
        let Some(token) = self.s.peek() else {
            return false;
        };
        match token.tag {
            Tag::Ident | Tag::BoolLiteral | Tag::IntLiteral | Tag::StrLiteral | Tag::CharLiteral => {
                true
            }
            _ => ["!", "-", "(", "input", "output", "config", "if", "match"]
                .iter()
                .any(|text| token.is(text)),
        }
    }

    fn is_comparison(&self, id: NodeId) -> bool {
        matches!(self.ast.kind(id), NodeKind::Binary(b) if b.op.is_comparison())
    }

    fn unary(&mut self) -> ParseResult<NodeId> {
        self.s.skip_space();
        let mut ops = Vec::new();
        while let Some((token, op)) = UNARY_OPS
            .iter()
            .find_map(|&(text, op)| self.s.consume_text(text).map(|token| (token, op)))
        {
            ops.push((token.loc, op));
            self.s.skip_white();
        }
        let mut target = self.post()?;
        while let Some((loc, op)) = ops.pop() {
            target = self.alloc(loc, NodeKind::Unary(Unary { op, expr: target }));
        }
        Ok(target)
    }

    // ==================== Postfix & Primary ====================

    fn post(&mut self) -> ParseResult<NodeId> {
        let mut target = self.prim()?;
        while !self.line_skipped {
            self.s.skip_space();
            target = if let Some(open) = self.s.consume_text("(") {
                self.call_or_cast(&open, target)?
            } else if let Some(dot) = self.s.consume_text(".") {
                self.member_access(&dot, target)?
            } else if let Some(open) = self.s.consume_text("[") {
                self.index(&open, target)?
            } else {
                break;
            };
        }
        Ok(target)
    }

    /// A call on a type literal converts its arguments to that type
    fn call_or_cast(&mut self, open: &Token, callee: NodeId) -> ParseResult<NodeId> {
        let call = self.call(open, callee)?;
        let NodeKind::TypeLiteral(ty) = self.ast.kind(callee) else {
            return Ok(call);
        };
        let to = ty.type_literal;
        let arguments = match self.ast.kind(call) {
            NodeKind::Call(c) => c.arguments.clone(),
            _ => Vec::new(),
        };
        Ok(self.alloc(
            open.loc,
            NodeKind::Cast(Cast {
                call,
                to,
                arguments,
            }),
        ))
    }

    fn call(&mut self, open: &Token, callee: NodeId) -> ParseResult<NodeId> {
        self.s.skip_white();
        let (raw_arguments, arguments) = if self.s.expect_text(")") {
            (None, Vec::new())
        } else {
            let raw = self.expr()?;
            (Some(raw), self.collect_args(raw))
        };
        self.s.skip_white();
        let close = self.s.must_consume_text(")")?;
        Ok(self.alloc(
            open.loc,
            NodeKind::Call(Call {
                callee,
                raw_arguments,
                arguments,
                end_loc: close.loc,
            }),
        ))
    }

    /// Flatten a comma tree into its operands, left to right
    pub(super) fn collect_args(&self, raw: NodeId) -> Vec<NodeId> {
        let mut args = Vec::new();
        let mut pending = vec![raw];
        while let Some(id) = pending.pop() {
            match self.ast.kind(id) {
                NodeKind::Binary(b) if b.op == BinaryOp::Comma => {
                    pending.push(b.right);
                    pending.push(b.left);
                }
                _ => args.push(id),
            }
        }
        args
    }

    pub(super) fn member_access(&mut self, dot: &Token, target: NodeId) -> ParseResult<NodeId> {
        self.s.skip_white();
        let is_name = self
            .s
            .peek()
            .is_some_and(|t| matches!(t.tag, Tag::Ident | Tag::Keyword));
        let name = match self.s.advance() {
            Some(name) if is_name => name,
            _ => {
                self.s.backward();
                return Err(self.s.token_error(Expected::Tag(Tag::Ident)));
            }
        };
        let access = self.ast.reserve(dot.loc);
        let member = self.alloc(
            name.loc,
            NodeKind::Ident(Ident::resolved(
                name.text,
                self.scopes.current(),
                IdentUsage::ReferenceMember,
                Some(access),
            )),
        );
        self.ast
            .fill(access, NodeKind::MemberAccess(MemberAccess { target, member }));
        Ok(access)
    }

    fn index(&mut self, open: &Token, expr: NodeId) -> ParseResult<NodeId> {
        self.s.skip_white();
        let index = self.expr()?;
        self.s.skip_white();
        let close = self.s.must_consume_text("]")?;
        Ok(self.alloc(
            open.loc,
            NodeKind::Index(Index {
                expr,
                index,
                end_loc: close.loc,
            }),
        ))
    }

    fn prim(&mut self) -> ParseResult<NodeId> {
        if let Some(token) = self.s.consume_tag(Tag::IntLiteral) {
            return Ok(self.alloc(
                token.loc,
                NodeKind::IntLiteral(IntLiteral { value: token.text }),
            ));
        }
        if let Some(token) = self.s.consume_tag(Tag::BoolLiteral) {
            let value = token.text == "true";
            return Ok(self.alloc(token.loc, NodeKind::BoolLiteral(value)));
        }
        if let Some(token) = self.s.consume_tag(Tag::StrLiteral) {
            return self.str_literal(token);
        }
        if let Some(token) = self.s.consume_tag(Tag::RegexLiteral) {
            return Ok(self.alloc(token.loc, NodeKind::RegexLiteral(token.text)));
        }
        if let Some(token) = self.s.consume_tag(Tag::CharLiteral) {
            return self.char_literal(token);
        }
        let special = self
            .s
            .peek()
            .filter(|t| t.tag == Tag::Keyword)
            .and_then(|t| SpecialLiteralKind::from_keyword(&t.text));
        if let Some(kind) = special {
            let loc = self.s.loc();
            self.s.advance();
            return Ok(self.alloc(loc, NodeKind::SpecialLiteral(kind)));
        }
        if let Some(open) = self.s.consume_text("(") {
            return self.paren(&open);
        }
        if let Some(token) = self.s.consume_text("if") {
            let node = self.if_expr(&token)?;
            self.line_skipped = true;
            return Ok(node);
        }
        if let Some(token) = self.s.consume_text("match") {
            let node = self.match_expr(&token)?;
            self.line_skipped = true;
            return Ok(node);
        }
        if let Some(open) = self.s.consume_text("<") {
            return self.type_literal(&open);
        }
        if let Some(token) = self.s.peek_tag(Tag::Ident) {
            if let Some(ty) = self.primitive_type(&token) {
                self.s.advance();
                return Ok(self.alloc(
                    token.loc,
                    NodeKind::TypeLiteral(TypeLiteral {
                        type_literal: ty,
                        end_loc: token.loc,
                    }),
                ));
            }
            return self.ident();
        }
        if self.reporter.is_tolerant() {
            return Ok(self.bad_expr());
        }
        Err(self.s.token_error(Expected::Tag(Tag::Ident)))
    }

    /// Record a missing operand and stand in a placeholder for it
    fn bad_expr(&mut self) -> NodeId {
        let err = self.s.token_error(Expected::Tag(Tag::Ident));
        self.reporter.record(&err);
        let at_boundary = self.s.eos()
            || self.s.expect_tag(Tag::Line)
            || self.s.expect_tag(Tag::Indent)
            || self.s.expect_text(":");
        if !at_boundary {
            self.s.advance();
        }
        self.alloc(err.loc, NodeKind::BadExpr(err.kind.to_string()))
    }

    fn paren(&mut self, open: &Token) -> ParseResult<NodeId> {
        self.s.skip_white();
        let expr = self.expr()?;
        self.s.skip_white();
        let close = self.s.must_consume_text(")")?;
        // a block inside the parens does not end the outer line
        self.line_skipped = false;
        Ok(self.alloc(
            open.loc,
            NodeKind::Paren(Paren {
                expr,
                end_loc: close.loc,
            }),
        ))
    }

    fn type_literal(&mut self, open: &Token) -> ParseResult<NodeId> {
        self.s.skip_line();
        let type_literal = self.parse_type(false)?;
        self.s.skip_line();
        let close = self.s.must_consume_text(">")?;
        Ok(self.alloc(
            open.loc,
            NodeKind::TypeLiteral(TypeLiteral {
                type_literal,
                end_loc: close.loc,
            }),
        ))
    }

    pub(super) fn str_literal(&mut self, token: Token) -> ParseResult<NodeId> {
        let Some(content) = unescape(&token.text) else {
            return Err(invalid_literal(token, "bad escape sequence"));
        };
        let length = content.len();
        Ok(self.alloc(
            token.loc,
            NodeKind::StrLiteral(StrLiteral {
                value: token.text,
                length,
            }),
        ))
    }

    fn char_literal(&mut self, token: Token) -> ParseResult<NodeId> {
        let Some(content) = unescape(&token.text) else {
            return Err(invalid_literal(token, "bad escape sequence"));
        };
        let code = match content.as_slice() {
            [byte] => Some(u32::from(*byte)),
            bytes => std::str::from_utf8(bytes).ok().and_then(|text| {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(u32::from(c)),
                    _ => None,
                }
            }),
        };
        let Some(code) = code else {
            return Err(invalid_literal(token, "expect exactly one character"));
        };
        Ok(self.alloc(
            token.loc,
            NodeKind::CharLiteral(CharLiteral {
                value: token.text,
                code,
            }),
        ))
    }

    // ==================== Identifiers ====================

    /// Parse an identifier and declare it in the current scope
    pub(super) fn ident(&mut self) -> ParseResult<NodeId> {
        let id = self.ident_no_scope()?;
        self.scopes.push(id);
        Ok(id)
    }

    /// Parse an identifier without declaring it anywhere
    pub(super) fn ident_no_scope(&mut self) -> ParseResult<NodeId> {
        let token = self.s.must_consume_tag(Tag::Ident)?;
        let scope = self.scopes.current();
        Ok(self.alloc(token.loc, NodeKind::Ident(Ident::new(token.text, scope))))
    }

    pub(super) fn resolve(
        &mut self,
        ident: NodeId,
        usage: IdentUsage,
        definition: Option<NodeId>,
    ) -> ParseResult<()> {
        let loc = self.ast.loc(ident);
        let Some(target) = self.ast.ident_mut(ident) else {
            return Ok(());
        };
        target
            .resolve(usage, definition)
            .map_err(|err| match err {
                ResolveError::AlreadyResolved(name) => {
                    ParseError::new(ParseErrorKind::AlreadyResolved(name), loc)
                }
            })
    }

    /// Move `ident` from the scope it was parsed in to the current one
    fn rebind_scope(&mut self, ident: NodeId) {
        let Some(old) = self.ast.ident(ident).map(Ident::scope) else {
            return;
        };
        self.scopes.remove(old, ident);
        let scope = self.scopes.push(ident);
        if let Some(target) = self.ast.ident_mut(ident) {
            target.set_scope(scope);
        }
    }

    /// Fail if a definition with the same name is already visible
    pub(super) fn check_duplicated_def(&self, ident: NodeId) -> ParseResult<()> {
        let Some(target) = self.ast.ident(ident) else {
            return Ok(());
        };
        let name = target.name();
        let scope = target.scope();
        let same_name = |id: NodeId| {
            self.ast
                .ident(id)
                .is_some_and(|i| i.usage() != IdentUsage::Unknown && i.name() == name)
        };
        let found = if self.scopes.get(scope).is_global {
            self.scopes.lookup_global(Some(ident), same_name)
        } else {
            self.scopes.lookup_local(scope, Some(ident), same_name)
        };
        match found {
            Some(previous) => Err(ParseError::new(
                ParseErrorKind::DuplicateDefinition {
                    name: name.to_string(),
                    previous: self.ast.loc(previous),
                },
                self.ast.loc(ident),
            )),
            None => Ok(()),
        }
    }

    /// Classify the target of an assignment
    pub(super) fn check_assignment(&mut self, assign: NodeId) -> ParseResult<()> {
        let (op, left) = match self.ast.kind(assign) {
            NodeKind::Binary(b) => (b.op, b.left),
            _ => return Ok(()),
        };
        let invalid = ParseError::new(
            ParseErrorKind::InvalidAssignmentTarget { op },
            self.ast.loc(left),
        );
        if op.is_defining_assign() {
            if self.ast.ident(left).is_none() {
                return self.reporter.recover(invalid);
            }
            self.rebind_scope(left);
            let usage = if op == BinaryOp::ConstAssign {
                IdentUsage::DefineConst
            } else {
                IdentUsage::DefineVariable
            };
            self.resolve(left, usage, Some(assign))?;
            return self.check_duplicated_def(left);
        }
        match self.assignment_root(left) {
            Some(Some(ident)) => {
                self.rebind_scope(ident);
                Ok(())
            }
            Some(None) => Ok(()),
            None => self.reporter.recover(invalid),
        }
    }

    /// Identifier an assignment target is rooted at; `Some(None)` for
    /// `input`, `output` and `config`
    fn assignment_root(&self, mut target: NodeId) -> Option<Option<NodeId>> {
        loop {
            match self.ast.kind(target) {
                NodeKind::Ident(_) => return Some(Some(target)),
                NodeKind::Index(index) => target = index.expr,
                NodeKind::MemberAccess(access) => target = access.target,
                NodeKind::SpecialLiteral(_) => return Some(None),
                _ => return None,
            }
        }
    }
}

fn invalid_literal(token: Token, reason: &'static str) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral {
            literal: token.text,
            reason,
        },
        token.loc,
    )
}

/// Bytes of a quoted literal with escapes resolved
///
/// `\xNN` yields the raw byte; other characters and `\u{..}` are UTF-8 encoded.
fn unescape(quoted: &str) -> Option<Vec<u8>> {
    let inner = quoted.get(1..quoted.len().saturating_sub(1))?;
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    let mut utf8 = [0; 4];
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() != 2 {
                    return None;
                }
                out.push(u8::from_str_radix(&hex, 16).ok()?);
                continue;
            }
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        digit => hex.push(digit),
                    }
                }
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            _ => return None,
        };
        out.extend_from_slice(escaped.encode_utf8(&mut utf8).as_bytes());
    }
    Some(out)
}
