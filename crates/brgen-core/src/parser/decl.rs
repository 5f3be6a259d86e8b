//! Declarations and the statements that open their own block

use super::{
    indent_width, Expected, MemberKind, ParseError, ParseErrorKind, ParseResult, Parser,
    TokenSource,
};
use crate::ast::{
    Binary, BinaryOp, Enum, EnumMember, EnumType, Field, FieldArgument, FloatType, Format,
    Function, FunctionType, IdentUsage, IntLiteral, IntType, Loop, Member, NodeId, NodeKind,
    Return, State,
};
use crate::lexer::{Loc, Tag, Token};

/// Running state for implicit enum values
#[derive(Default)]
struct EnumCounter {
    /// Value of the last member given one explicitly (or the first member)
    base: Option<NodeId>,
    /// Members since `base`
    offset: u64,
}

impl<S: TokenSource> Parser<S> {
    // ==================== Fields ====================

    /// Parse `name :T(args)` or `:T`
    ///
    /// Given an expression that is not a lone identifier followed by `:`,
    /// hands the expression back unchanged.
    pub(super) fn field(
        &mut self,
        expr: Option<NodeId>,
        as_argument: bool,
    ) -> ParseResult<NodeId> {
        let (ident, colon) = match expr {
            Some(expr) => {
                if self.ast.ident(expr).is_none() {
                    return Ok(expr);
                }
                self.s.skip_space();
                let Some(colon) = self.s.consume_text(":") else {
                    return Ok(expr);
                };
                (Some(expr), colon)
            }
            None => (None, self.s.must_consume_text(":")?),
        };
        let loc = ident.map_or(colon.loc, |i| self.ast.loc(i));
        let field = self.ast.reserve(loc);
        self.s.skip_space();
        let field_type = self.parse_type(as_argument)?;

        if let Some(ident) = ident {
            if as_argument {
                self.resolve(ident, IdentUsage::DefineArg, Some(field))?;
            } else {
                self.resolve(ident, IdentUsage::DefineField, Some(field))?;
                self.check_duplicated_def(ident)?;
            }
        }

        let belong = self.current_member();
        let arguments = match self.s.consume_text("(") {
            Some(open) => Some(self.field_argument(&open)?),
            None => None,
        };
        self.ast.fill(
            field,
            NodeKind::Field(Field {
                member: Member {
                    ident,
                    belong,
                    belong_struct: None,
                },
                colon_loc: colon.loc,
                field_type,
                arguments,
                next: None,
            }),
        );
        if !as_argument {
            self.add_to_struct(field);
        }
        Ok(field)
    }

    fn field_argument(&mut self, open: &Token) -> ParseResult<NodeId> {
        self.s.skip_white();
        let raw_arguments = if self.s.expect_text(")") {
            None
        } else {
            let raw = self.expr()?;
            self.s.skip_white();
            Some(raw)
        };
        let arguments = raw_arguments
            .map(|raw| self.collect_args(raw))
            .unwrap_or_default();
        let close = self.s.must_consume_text(")")?;
        Ok(self.alloc(
            open.loc,
            NodeKind::FieldArgument(FieldArgument {
                raw_arguments,
                arguments,
                end_loc: close.loc,
            }),
        ))
    }

    // ==================== Format & State ====================

    pub(super) fn format(&mut self, token: Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        self.s.skip_white();
        let ident = self.ident()?;
        self.resolve(ident, IdentUsage::DefineFormat, Some(id))?;
        self.check_duplicated_def(ident)?;
        let belong = self.current_member();

        self.enter_member(id, MemberKind::Format);
        let body = self.indent_block(id, &[])?;
        let depends = self.leave_member();

        let functions = self.block_functions(body);
        let by_name = |name: &str| {
            functions
                .iter()
                .copied()
                .find(|&f| self.ast.member_name(f) == Some(name))
        };
        let encode_fn = by_name("encode");
        let decode_fn = by_name("decode");
        let cast_fns = functions
            .iter()
            .copied()
            .filter(|&f| matches!(self.ast.kind(f), NodeKind::Function(func) if func.is_cast))
            .collect();
        log::debug!("format {id} depends on {} types", depends.len());

        self.ast.fill(
            id,
            NodeKind::Format(Format {
                member: Member {
                    ident: Some(ident),
                    belong,
                    belong_struct: None,
                },
                body,
                encode_fn,
                decode_fn,
                cast_fns,
                depends,
            }),
        );
        self.add_to_struct(id);
        Ok(id)
    }

    /// Functions declared directly in a block
    fn block_functions(&self, block: NodeId) -> Vec<NodeId> {
        let NodeKind::IndentBlock(block) = self.ast.kind(block) else {
            return Vec::new();
        };
        self.ast
            .struct_type(block.struct_type)
            .map(|st| {
                st.fields
                    .iter()
                    .copied()
                    .filter(|&f| matches!(self.ast.kind(f), NodeKind::Function(_)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(super) fn state(&mut self, token: Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        self.s.skip_white();
        let ident = self.ident()?;
        self.resolve(ident, IdentUsage::DefineState, Some(id))?;
        self.check_duplicated_def(ident)?;
        let belong = self.current_member();

        self.enter_member(id, MemberKind::State);
        let body = self.indent_block(id, &[])?;
        self.leave_member();

        self.ast.fill(
            id,
            NodeKind::State(State {
                member: Member {
                    ident: Some(ident),
                    belong,
                    belong_struct: None,
                },
                body,
            }),
        );
        self.add_to_struct(id);
        Ok(id)
    }

    // ==================== Enum ====================

    pub(super) fn enum_decl(&mut self, token: Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        self.s.skip_white();
        let ident = self.ident()?;
        self.resolve(ident, IdentUsage::DefineEnum, Some(id))?;
        self.check_duplicated_def(ident)?;
        let belong = self.current_member();
        let enum_type = self.alloc(token.loc, NodeKind::EnumType(EnumType { base: id }));

        self.indent_sign()?;
        let base = self.s.must_consume_tag(Tag::Indent)?;
        let width = indent_width(&base);
        let outer_indent = self.enter_indent(width, base.loc)?;
        self.enter_member(id, MemberKind::Enum);
        let guard = self.scopes.enter_branch();
        let scope = guard.scope();
        self.scopes.set_owner(scope, id);

        let base_type = if self.s.consume_text(":").is_some() {
            Some(self.enum_base_type(width)?)
        } else {
            None
        };

        let mut counter = EnumCounter::default();
        let mut members = vec![self.enum_member(id, &mut counter)?];
        while let Some(indent) = self.s.peek_tag(Tag::Indent) {
            if indent_width(&indent) != width {
                break;
            }
            self.s.advance();
            members.push(self.enum_member(id, &mut counter)?);
        }

        self.scopes.leave_branch(guard);
        self.leave_member();
        self.indent = outer_indent;
        self.ast.fill(
            id,
            NodeKind::Enum(Enum {
                member: Member {
                    ident: Some(ident),
                    belong,
                    belong_struct: None,
                },
                scope,
                base_type,
                members,
                enum_type,
            }),
        );
        self.add_to_struct(id);
        Ok(id)
    }

    /// `:T` on the first line of an enum body
    fn enum_base_type(&mut self, width: usize) -> ParseResult<NodeId> {
        self.s.skip_white();
        let base_type = self.parse_type(false)?;
        self.s.skip_space();
        self.s.must_consume_tag(Tag::Line)?;
        self.s.skip_line();
        let indent = self.s.must_consume_tag(Tag::Indent)?;
        let found = indent_width(&indent);
        if found != width {
            return Err(ParseError::new(
                ParseErrorKind::IndentMismatch {
                    expected: width,
                    found,
                },
                indent.loc,
            ));
        }
        Ok(base_type)
    }

    fn enum_member(&mut self, belong: NodeId, counter: &mut EnumCounter) -> ParseResult<NodeId> {
        let ident = self.ident()?;
        let loc = self.ast.loc(ident);
        let id = self.ast.reserve(loc);
        self.resolve(ident, IdentUsage::DefineEnumMember, Some(id))?;
        self.check_duplicated_def(ident)?;

        let mut raw_expr = None;
        let mut value = None;
        let mut str_literal = None;
        self.s.skip_space();
        if self.s.consume_text("=").is_some() {
            self.s.skip_white();
            let raw = self.expr()?;
            let parts = self.collect_args(raw);
            if parts.len() > 2 {
                return Err(invalid_enum_member(
                    self.ast.loc(raw),
                    "value takes at most an expression and a string",
                ));
            }
            for part in parts {
                if matches!(self.ast.kind(part), NodeKind::StrLiteral(_)) {
                    if str_literal.replace(part).is_some() {
                        return Err(invalid_enum_member(
                            self.ast.loc(part),
                            "string already specified",
                        ));
                    }
                } else if value.replace(part).is_some() {
                    return Err(invalid_enum_member(
                        self.ast.loc(part),
                        "value already specified",
                    ));
                }
            }
            raw_expr = Some(raw);
        }
        let value = match value {
            Some(explicit) => {
                counter.base = Some(explicit);
                counter.offset = 0;
                explicit
            }
            None => self.implicit_enum_value(loc, counter),
        };
        counter.offset += 1;

        self.s.skip_space();
        let comment = self.comment_group();
        self.s.skip_line();
        self.ast.fill(
            id,
            NodeKind::EnumMember(EnumMember {
                ident,
                raw_expr,
                value: Some(value),
                str_literal,
                belong,
                comment,
            }),
        );
        Ok(id)
    }

    /// `0` for the first member, otherwise the last explicit value plus the
    /// distance to it
    fn implicit_enum_value(&mut self, loc: Loc, counter: &mut EnumCounter) -> NodeId {
        let Some(base) = counter.base else {
            let zero = self.int_literal(loc, 0);
            counter.base = Some(zero);
            return zero;
        };
        let offset = self.int_literal(loc, counter.offset);
        let base_is_zero =
            matches!(self.ast.kind(base), NodeKind::IntLiteral(lit) if lit.value == "0");
        if base_is_zero {
            return offset;
        }
        self.alloc(
            loc,
            NodeKind::Binary(Binary {
                op: BinaryOp::Add,
                left: base,
                right: offset,
            }),
        )
    }

    fn int_literal(&mut self, loc: Loc, value: u64) -> NodeId {
        self.alloc(
            loc,
            NodeKind::IntLiteral(IntLiteral {
                value: value.to_string(),
            }),
        )
    }

    // ==================== Functions ====================

    pub(super) fn function(&mut self, token: Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        self.s.skip_white();
        let ident = self.ident()?;
        self.check_duplicated_def(ident)?;
        let belong = self.current_member();
        let in_format = self.current_member_kind() == Some(MemberKind::Format);

        self.enter_member(id, MemberKind::Function);
        self.s.skip_white();
        self.s.must_consume_text("(")?;
        let (parameters, end_loc) = self.parameters()?;
        self.s.skip_white();
        let return_type = if self.s.consume_text("->").is_some() {
            self.s.skip_white();
            self.parse_type(false)?
        } else {
            self.alloc(end_loc, NodeKind::VoidType)
        };
        let param_types = parameters
            .iter()
            .filter_map(|&p| self.ast.field(p).map(|f| f.field_type))
            .collect();
        let func_type = self.alloc(
            token.loc,
            NodeKind::FunctionType(FunctionType {
                parameters: param_types,
                return_type: Some(return_type),
            }),
        );

        let is_cast =
            in_format && parameters.is_empty() && self.is_cast_signature(ident, return_type);
        let usage = if is_cast {
            IdentUsage::DefineCastFn
        } else {
            IdentUsage::DefineFn
        };
        self.resolve(ident, usage, Some(id))?;

        let body = self.indent_block(id, &parameters)?;
        self.leave_member();

        self.ast.fill(
            id,
            NodeKind::Function(Function {
                member: Member {
                    ident: Some(ident),
                    belong,
                    belong_struct: None,
                },
                parameters,
                return_type,
                body,
                func_type,
                is_cast,
            }),
        );
        self.add_to_struct(id);
        Ok(id)
    }

    /// Parameter list after `(`, returning the fields and the `)` location
    fn parameters(&mut self) -> ParseResult<(Vec<NodeId>, Loc)> {
        let mut parameters: Vec<NodeId> = Vec::new();
        loop {
            self.s.skip_white();
            if let Some(close) = self.s.consume_text(")") {
                return Ok((parameters, close.loc));
            }
            let name = if self.s.expect_text(":") {
                None
            } else {
                let name = self.ident_no_scope()?;
                self.s.skip_white();
                self.check_duplicated_param(name, &parameters)?;
                Some(name)
            };
            if !self.s.expect_text(":") {
                return Err(self.s.token_error(Expected::Token(":")));
            }
            parameters.push(self.field(name, true)?);
            self.s.skip_white();
            if !self.s.expect_text(")") {
                self.s.must_consume_text(",")?;
            }
        }
    }

    fn check_duplicated_param(&self, name: NodeId, parameters: &[NodeId]) -> ParseResult<()> {
        let Some(text) = self.ast.ident(name).map(|i| i.name()) else {
            return Ok(());
        };
        let previous = parameters.iter().find_map(|&p| {
            let ident = self.ast.member_ident(p)?;
            (self.ast.ident(ident)?.name() == text).then(|| self.ast.loc(ident))
        });
        match previous {
            Some(previous) => Err(ParseError::new(
                ParseErrorKind::DuplicateDefinition {
                    name: text.to_string(),
                    previous,
                },
                self.ast.loc(name),
            )),
            None => Ok(()),
        }
    }

    /// `fn u8() -> u8` style conversions: the name is a primitive type and
    /// the return type matches it
    fn is_cast_signature(&self, ident: NodeId, return_type: NodeId) -> bool {
        let Some(name) = self.ast.ident(ident).map(|i| i.name()) else {
            return false;
        };
        match self.ast.kind(return_type) {
            NodeKind::IntType(ret) => IntType::from_name(name)
                .is_some_and(|t| t.is_signed == ret.is_signed && t.bit_size == ret.bit_size),
            NodeKind::FloatType(ret) => {
                FloatType::from_name(name).is_some_and(|t| t.bit_size == ret.bit_size)
            }
            NodeKind::BoolType => name == "bool",
            _ => false,
        }
    }

    // ==================== Control Flow ====================

    /// `for:`, `for cond:`, `for x in expr:` or `for init; cond; step:`
    pub(super) fn for_loop(&mut self, token: Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        let guard = self.scopes.enter_branch();
        let cond_scope = guard.scope();
        self.scopes.set_owner(cond_scope, id);
        self.loops.push(id);

        let mut init = None;
        let mut cond = None;
        let mut step = None;
        self.s.skip_white();
        if !self.s.expect_text(":") {
            let first = if self.s.expect_text(";") {
                None
            } else {
                Some(self.expr()?)
            };
            self.s.skip_space();
            match first {
                Some(target) if self.s.expect_text("in") => {
                    init = Some(self.in_clause(target)?);
                }
                Some(only) if self.s.expect_text(":") => cond = Some(only),
                first => {
                    init = first;
                    self.loop_clauses(&mut cond, &mut step)?;
                }
            }
        }
        let body = self.indent_block(id, &[])?;

        self.loops.pop();
        self.scopes.leave_branch(guard);
        self.ast.fill(
            id,
            NodeKind::Loop(Loop {
                init,
                cond,
                step,
                body,
                cond_scope,
            }),
        );
        Ok(id)
    }

    /// `target in expr`, parsed as a defining assignment
    fn in_clause(&mut self, target: NodeId) -> ParseResult<NodeId> {
        let in_token = self.s.must_consume_text("in")?;
        self.s.skip_white();
        let range = self.expr()?;
        let clause = self.alloc(
            in_token.loc,
            NodeKind::Binary(Binary {
                op: BinaryOp::InAssign,
                left: target,
                right: range,
            }),
        );
        self.check_assignment(clause)?;
        Ok(clause)
    }

    /// `; cond; step` after the init clause
    fn loop_clauses(
        &mut self,
        cond: &mut Option<NodeId>,
        step: &mut Option<NodeId>,
    ) -> ParseResult<()> {
        self.s.must_consume_text(";")?;
        self.s.skip_white();
        if !self.s.expect_text(";") && !self.s.expect_text(":") {
            *cond = Some(self.expr()?);
            self.s.skip_white();
        }
        if self.s.expect_text(":") {
            return Ok(());
        }
        self.s.must_consume_text(";")?;
        self.s.skip_white();
        if !self.s.expect_text(":") {
            *step = Some(self.expr()?);
            self.s.skip_white();
        }
        Ok(())
    }

    pub(super) fn return_stmt(&mut self, token: Token) -> ParseResult<NodeId> {
        self.s.skip_space();
        let ends_here =
            self.s.eos() || self.s.expect_tag(Tag::Line) || self.s.expect_tag(Tag::Indent);
        let expr = if ends_here { None } else { Some(self.expr()?) };
        let related_function = self.enclosing(|p, owner| {
            p.members
                .iter()
                .any(|f| f.id == owner && f.kind == MemberKind::Function)
        });
        Ok(self.alloc(
            token.loc,
            NodeKind::Return(Return {
                expr,
                related_function,
            }),
        ))
    }

    pub(super) fn enclosing_loop(&self) -> Option<NodeId> {
        self.enclosing(|p, owner| p.loops.contains(&owner))
    }

    /// Nearest owner of the current scope chain accepted by `pred`
    fn enclosing(&self, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.scopes
            .find_owner(self.scopes.current(), |owner| pred(self, owner))
    }
}

fn invalid_enum_member(loc: Loc, reason: &'static str) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidEnumMember(reason), loc)
}

#[cfg(test)]
mod tests {
    use crate::ast::{expr_to_string, IdentUsage, NodeId, NodeKind};
    use crate::config::ParseOptions;
    use crate::parser::{ParseErrorKind, ParseResult, Parser, SyntaxTree};

    fn try_parse(source: &str) -> ParseResult<SyntaxTree> {
        Parser::from_source(source, &ParseOptions::default()).parse()
    }

    fn parse(source: &str) -> SyntaxTree {
        try_parse(source).unwrap()
    }

    fn top(tree: &SyntaxTree, index: usize) -> NodeId {
        tree.program().unwrap().elements[index]
    }

    fn block_elements(tree: &SyntaxTree, block: NodeId) -> Vec<NodeId> {
        let NodeKind::IndentBlock(block) = tree.ast.kind(block) else {
            panic!("expected block");
        };
        block.elements.clone()
    }

    #[test]
    fn field_links_to_next_field() {
        let tree = parse("a :u8\nb :u16\n");
        let a = tree.ast.field(top(&tree, 0)).unwrap();
        assert_eq!(a.next, Some(top(&tree, 1)));
        let ident = a.member.ident.unwrap();
        let ident = tree.ast.ident(ident).unwrap();
        assert_eq!(ident.usage(), IdentUsage::DefineField);
        assert_eq!(ident.definition(), Some(top(&tree, 0)));
    }

    #[test]
    fn anonymous_field_with_arguments() {
        let tree = parse(":[4]u8(fixed, 2)\n");
        let field = tree.ast.field(top(&tree, 0)).unwrap();
        assert!(field.member.ident.is_none());
        let NodeKind::FieldArgument(args) = tree.ast.kind(field.arguments.unwrap()) else {
            panic!("expected field argument");
        };
        assert_eq!(args.arguments.len(), 2);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let err = try_parse("format A:\n  x :u8\n  x :u16\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::DuplicateDefinition { ref name, .. } if name == "x"));
    }

    #[test]
    fn format_finds_coder_and_cast_functions() {
        let tree = parse(
            "format A:\n  v :u8\n  fn encode() -> void:\n    return\n  fn u8() -> u8:\n    return v\n",
        );
        let NodeKind::Format(format) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected format");
        };
        assert!(format.encode_fn.is_some());
        assert!(format.decode_fn.is_none());
        assert_eq!(format.cast_fns.len(), 1);
        let cast = format.cast_fns[0];
        let ident = tree.ast.member_ident(cast).unwrap();
        assert_eq!(tree.ast.ident(ident).unwrap().usage(), IdentUsage::DefineCastFn);
    }

    #[test]
    fn cast_needs_matching_return_type() {
        let tree = parse("format A:\n  fn u8() -> u16:\n    return 0\n");
        let NodeKind::Format(format) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected format");
        };
        assert!(format.cast_fns.is_empty());
    }

    #[test]
    fn function_parameters_live_in_body_scope() {
        let tree = parse("fn add(a :u8, b :u8) -> u8:\n  return a + b\n");
        let NodeKind::Function(func) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected function");
        };
        assert_eq!(func.parameters.len(), 2);
        let NodeKind::IndentBlock(body) = tree.ast.kind(func.body) else {
            panic!("expected block");
        };
        let param = tree.ast.member_ident(func.parameters[0]).unwrap();
        let param = tree.ast.ident(param).unwrap();
        assert_eq!(param.usage(), IdentUsage::DefineArg);
        assert_eq!(param.scope(), body.scope);
        assert_eq!(tree.ast.field(func.parameters[0]).unwrap().member.belong, Some(top(&tree, 0)));
    }

    #[test]
    fn missing_return_type_is_void() {
        let tree = parse("fn f():\n  return\n");
        let NodeKind::Function(func) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected function");
        };
        assert!(matches!(tree.ast.kind(func.return_type), NodeKind::VoidType));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let err = try_parse("fn f(a :u8, a :u8):\n  return\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::DuplicateDefinition { ref name, .. } if name == "a"));
    }

    #[test]
    fn enum_values_count_from_last_explicit() {
        let tree = parse("enum E:\n  :u8\n  A\n  B\n  C = 5\n  D\n");
        let NodeKind::Enum(e) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected enum");
        };
        assert!(e.base_type.is_some());
        let values: Vec<String> = e
            .members
            .iter()
            .map(|&m| {
                let NodeKind::EnumMember(member) = tree.ast.kind(m) else {
                    panic!("expected enum member");
                };
                expr_to_string(&tree.ast, member.value.unwrap())
            })
            .collect();
        assert_eq!(values, vec!["0", "1", "5", "(+ 5 1)"]);
    }

    #[test]
    fn enum_member_with_display_string() {
        let tree = parse("enum E:\n  A = 1, \"first\"\n");
        let NodeKind::Enum(e) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected enum");
        };
        let NodeKind::EnumMember(member) = tree.ast.kind(e.members[0]) else {
            panic!("expected enum member");
        };
        assert!(member.str_literal.is_some());
        assert!(member.raw_expr.is_some());
    }

    #[test]
    fn enum_member_rejects_two_values() {
        let err = try_parse("enum E:\n  A = 1, 2\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidEnumMember(_)));
    }

    #[test]
    fn enum_base_type_needs_same_indent() {
        let err = try_parse("enum E:\n  :u8\n    A\n").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::IndentMismatch {
                expected: 2,
                found: 4
            }
        ));
    }

    #[test]
    fn loop_forms() {
        let tree = parse("for:\n  break\nfor x in 0..4:\n  continue\nfor i := 0; i < 3; i += 1:\n  x :u8\n");
        let NodeKind::Loop(infinite) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected loop");
        };
        assert!(infinite.init.is_none() && infinite.cond.is_none());
        let brk = block_elements(&tree, infinite.body)[0];
        assert!(matches!(tree.ast.kind(brk), NodeKind::Break(c) if c.related_loop == Some(top(&tree, 0))));

        let NodeKind::Loop(each) = tree.ast.kind(top(&tree, 1)) else {
            panic!("expected loop");
        };
        assert_eq!(expr_to_string(&tree.ast, each.init.unwrap()), "(in x (.. 0 4))");

        let NodeKind::Loop(counted) = tree.ast.kind(top(&tree, 2)) else {
            panic!("expected loop");
        };
        assert!(counted.init.is_some() && counted.cond.is_some() && counted.step.is_some());
    }

    #[test]
    fn return_finds_enclosing_function() {
        let tree = parse("fn f() -> u8:\n  for:\n    return 1\n");
        let NodeKind::Function(func) = tree.ast.kind(top(&tree, 0)) else {
            panic!("expected function");
        };
        let NodeKind::Loop(lp) = tree.ast.kind(block_elements(&tree, func.body)[0]) else {
            panic!("expected loop");
        };
        let ret = block_elements(&tree, lp.body)[0];
        assert!(matches!(tree.ast.kind(ret), NodeKind::Return(r) if r.related_function == Some(top(&tree, 0))));
    }

    #[test]
    fn break_outside_loop_has_no_target() {
        let tree = parse("break\n");
        assert!(matches!(tree.ast.kind(top(&tree, 0)), NodeKind::Break(c) if c.related_loop.is_none()));
    }
}
