//! `if`/`match` and the unions their branches export
//!
//! Every branch builds its own struct. Once the statement is complete, a
//! [`StructUnionType`] gathers those structs, and each field name declared in
//! any branch becomes one synthesized field of a [`UnionType`] whose
//! candidates line up with the branch conditions.

use std::collections::BTreeMap;

use super::{indent_width, ParseError, ParseErrorKind, ParseResult, Parser, TokenSource};
use crate::ast::{
    BinaryOp, BranchUnion, Field, Ident, IdentUsage, If, Match, MatchBranch, Member, NodeId,
    NodeKind, OrCond, Range, ScopedStatement, StructUnionType, UnionCandidate, UnionType,
};
use crate::lexer::{Loc, Tag, Token};

/// Branch conditions and structs collected while an `if`/`match` is parsed
#[derive(Default)]
struct Branches {
    conds: Vec<NodeId>,
    structs: Vec<NodeId>,
    exhaustive: bool,
}

impl<S: TokenSource> Parser<S> {
    // ==================== If ====================

    /// `if c: ... elif c: ... else: ...`, starting after `if`
    pub(super) fn if_expr(&mut self, token: &Token) -> ParseResult<NodeId> {
        let head = self.ast.reserve(token.loc);
        let guard = self.scopes.enter_branch();
        let cond_scope = guard.scope();
        self.scopes.set_owner(cond_scope, head);
        let struct_union_type = self.ast.reserve(token.loc);

        let mut branches = Branches::default();
        self.s.skip_white();
        let cond = self.expr()?;
        let then = self.branch_block(head, cond, &mut branches)?;

        // Each arm is stored as (node, cond, then); the `els` links are set
        // once the arm that follows is known.
        let mut arms = vec![(head, cond, then)];
        while let Some(elif) = self.chain_keyword("elif") {
            let arm = self.ast.reserve(elif.loc);
            self.s.skip_white();
            let cond = self.expr()?;
            let then = self.branch_block(arm, cond, &mut branches)?;
            arms.push((arm, cond, then));
        }
        let mut else_cond = None;
        let mut tail = None;
        if let Some(els) = self.chain_keyword("else") {
            let any = self.alloc(
                els.loc,
                NodeKind::Range(Range {
                    op: BinaryOp::RangeExclusive,
                    start: None,
                    end: None,
                }),
            );
            let owner = arms.last().map_or(head, |&(arm, _, _)| arm);
            tail = Some(self.branch_block(owner, any, &mut branches)?);
            branches.exhaustive = true;
            else_cond = Some(any);
        }

        let field = self.union_field(token.loc, struct_union_type);
        self.scopes.leave_branch(guard);
        self.export_union(struct_union_type, head, None, branches)?;

        let mut els = tail;
        for (arm, cond, then) in arms.into_iter().rev() {
            let union = (arm == head).then_some(BranchUnion {
                field,
                struct_union_type,
                else_cond,
            });
            self.ast.fill(
                arm,
                NodeKind::If(If {
                    cond,
                    then,
                    els,
                    cond_scope,
                    union,
                }),
            );
            els = Some(arm);
        }
        Ok(head)
    }

    /// Consume `keyword` when it continues the chain at the current indent
    fn chain_keyword(&mut self, keyword: &str) -> Option<Token> {
        let start = self.s.checkpoint();
        if self.indent != 0 {
            let indent = self.s.peek_tag(Tag::Indent)?;
            if indent_width(&indent) != self.indent {
                return None;
            }
            self.s.advance();
        }
        let found = self.s.consume_text(keyword);
        if found.is_none() {
            self.s.rollback(start);
        }
        found
    }

    /// Indented block of one branch, registered under `cond`
    fn branch_block(
        &mut self,
        owner: NodeId,
        cond: NodeId,
        branches: &mut Branches,
    ) -> ParseResult<NodeId> {
        let block = self.indent_block(owner, &[])?;
        if let NodeKind::IndentBlock(b) = self.ast.kind(block) {
            branches.structs.push(b.struct_type);
        }
        branches.conds.push(cond);
        Ok(block)
    }

    // ==================== Match ====================

    /// `match subject?:` followed by arms at one indent, starting after `match`
    pub(super) fn match_expr(&mut self, token: &Token) -> ParseResult<NodeId> {
        let id = self.ast.reserve(token.loc);
        let guard = self.scopes.enter_branch();
        let cond_scope = guard.scope();
        self.scopes.set_owner(cond_scope, id);
        let struct_union_type = self.ast.reserve(token.loc);

        self.s.skip_white();
        let cond = if self.s.expect_text(":") {
            None
        } else {
            Some(self.expr()?)
        };
        self.indent_sign()?;
        let base = self.s.must_consume_tag(Tag::Indent)?;
        let width = indent_width(&base);
        let outer_indent = self.enter_indent(width, base.loc)?;

        let mut branches = Branches::default();
        let mut arms = vec![self.match_branch(id, &mut branches)?];
        while let Some(indent) = self.s.peek_tag(Tag::Indent) {
            if indent_width(&indent) != width {
                break;
            }
            self.s.advance();
            arms.push(self.match_branch(id, &mut branches)?);
        }
        self.indent = outer_indent;

        let field = self.union_field(token.loc, struct_union_type);
        self.scopes.leave_branch(guard);
        self.export_union(struct_union_type, id, cond, branches)?;
        self.ast.fill(
            id,
            NodeKind::Match(Match {
                cond,
                branches: arms,
                cond_scope,
                union: BranchUnion {
                    field,
                    struct_union_type,
                    else_cond: None,
                },
            }),
        );
        Ok(id)
    }

    /// `cond => statement` or `cond:` with a block
    fn match_branch(&mut self, belong: NodeId, branches: &mut Branches) -> ParseResult<NodeId> {
        let raw = self.expr()?;
        let comment = self.comment_group();
        let is_alternatives =
            matches!(self.ast.kind(raw), NodeKind::Binary(b) if b.op == BinaryOp::Comma);
        let cond = if is_alternatives {
            let conds = self.collect_args(raw);
            let or_loc = self.ast.loc(raw);
            self.alloc(or_loc, NodeKind::OrCond(OrCond { base: raw, conds }))
        } else {
            raw
        };
        if self.is_catch_all(cond) {
            branches.exhaustive = true;
        }
        let loc = self.ast.loc(raw);
        let id = self.ast.reserve(loc);

        self.s.skip_white();
        let (sym_loc, then) = match self.s.consume_text("=>") {
            Some(arrow) => {
                self.s.skip_white();
                let (stmt, struct_type) = self.scoped_statement(arrow.loc, id)?;
                branches.structs.push(struct_type);
                branches.conds.push(cond);
                (arrow.loc, stmt)
            }
            None => {
                let colon = self.s.loc();
                (colon, self.branch_block(id, cond, branches)?)
            }
        };
        self.ast.fill(
            id,
            NodeKind::MatchBranch(MatchBranch {
                belong,
                cond,
                sym_loc,
                then,
                comment,
            }),
        );
        Ok(id)
    }

    /// Single statement after `=>`, given its own scope and struct
    fn scoped_statement(&mut self, loc: Loc, branch: NodeId) -> ParseResult<(NodeId, NodeId)> {
        let id = self.ast.reserve(loc);
        let struct_type = self.new_struct(loc, branch);
        let outer_struct = self.current_struct.replace(struct_type);
        let guard = self.scopes.enter_branch();
        let scope = guard.scope();
        self.scopes.set_owner(scope, branch);

        let result = self.statement();

        self.scopes.leave_branch(guard);
        self.current_struct = outer_struct;
        let (statement, _) = result?;
        self.ast.fill(
            id,
            NodeKind::ScopedStatement(ScopedStatement {
                statement,
                scope,
                struct_type,
            }),
        );
        Ok((id, struct_type))
    }

    /// `..` or `_`, alone or among comma alternatives
    fn is_catch_all(&self, cond: NodeId) -> bool {
        match self.ast.kind(cond) {
            NodeKind::Range(range) => range.is_any(),
            NodeKind::Ident(ident) => ident.name() == "_",
            NodeKind::OrCond(or) => or.conds.iter().any(|&c| self.is_catch_all(c)),
            _ => false,
        }
    }

    // ==================== Union Export ====================

    /// Anonymous field carrying the struct union in the enclosing struct
    fn union_field(&mut self, loc: Loc, struct_union_type: NodeId) -> NodeId {
        let belong = self.current_member();
        let field = self.alloc(
            loc,
            NodeKind::Field(Field {
                member: Member {
                    ident: None,
                    belong,
                    belong_struct: None,
                },
                colon_loc: loc,
                field_type: struct_union_type,
                arguments: None,
                next: None,
            }),
        );
        self.add_to_struct(field);
        field
    }

    /// Merge same-named fields across branches into union fields
    ///
    /// Branches that lack a name get a shared absent candidate, so every
    /// candidate list has one entry per branch, in branch order.
    fn export_union(
        &mut self,
        id: NodeId,
        base: NodeId,
        cond: Option<NodeId>,
        branches: Branches,
    ) -> ParseResult<()> {
        let Branches {
            conds,
            structs,
            exhaustive,
        } = branches;

        let mut by_name: BTreeMap<String, Vec<(usize, NodeId)>> = BTreeMap::new();
        for (index, &st) in structs.iter().enumerate() {
            let fields = self
                .ast
                .struct_type(st)
                .map(|s| s.fields.clone())
                .unwrap_or_default();
            for field in fields {
                if !matches!(self.ast.kind(field), NodeKind::Field(_)) {
                    continue;
                }
                let Some(name) = self.ast.member_name(field).map(str::to_string) else {
                    continue;
                };
                let seen = by_name.entry(name.clone()).or_default();
                // fields parsed from source already failed `check_duplicated_def`
                if let Some(&(_, previous)) = seen.iter().find(|(i, _)| *i == index) {
                    return Err(ParseError::new(
                        ParseErrorKind::DuplicateUnionField {
                            name,
                            previous: self.ast.loc(previous),
                        },
                        self.ast.loc(field),
                    ));
                }
                seen.push((index, field));
            }
        }

        let loc = self.ast.loc(id);
        let mut candidate_pool = Vec::new();
        let mut absent: Vec<Option<NodeId>> = vec![None; conds.len()];
        let mut union_fields = Vec::with_capacity(by_name.len());
        for (name, present) in by_name {
            let mut candidates = Vec::with_capacity(conds.len());
            let mut present = present.into_iter().peekable();
            for (index, &branch_cond) in conds.iter().enumerate() {
                let candidate = match present.next_if(|&(i, _)| i == index) {
                    Some((_, field)) => {
                        let field_loc = self.ast.loc(field);
                        let candidate = self.alloc(
                            field_loc,
                            NodeKind::UnionCandidate(UnionCandidate {
                                cond: branch_cond,
                                field: Some(field),
                            }),
                        );
                        candidate_pool.push(candidate);
                        candidate
                    }
                    None => match absent[index] {
                        Some(shared) => shared,
                        None => {
                            let candidate = self.alloc(
                                loc,
                                NodeKind::UnionCandidate(UnionCandidate {
                                    cond: branch_cond,
                                    field: None,
                                }),
                            );
                            candidate_pool.push(candidate);
                            absent[index] = Some(candidate);
                            candidate
                        }
                    },
                };
                candidates.push(candidate);
            }
            let field_loc = candidates
                .iter()
                .find_map(|&c| self.ast.union_candidate(c).and_then(|c| c.field))
                .map_or(loc, |f| self.ast.loc(f));
            union_fields.push(self.union_member(name, field_loc, id, cond, candidates));
        }
        log::debug!(
            "exported {} union fields over {} branches (exhaustive: {exhaustive})",
            union_fields.len(),
            conds.len()
        );

        self.ast.fill(
            id,
            NodeKind::StructUnionType(StructUnionType {
                cond,
                conds,
                structs,
                union_fields,
                candidate_pool,
                exhaustive,
                base,
            }),
        );
        Ok(())
    }

    /// Synthesized field `name` typed by a union of `candidates`
    fn union_member(
        &mut self,
        name: String,
        loc: Loc,
        base_type: NodeId,
        cond: Option<NodeId>,
        candidates: Vec<NodeId>,
    ) -> NodeId {
        let field = self.ast.reserve(loc);
        let scope = self.scopes.current();
        let ident = self.alloc(
            loc,
            NodeKind::Ident(Ident::resolved(
                name,
                scope,
                IdentUsage::DefineField,
                Some(field),
            )),
        );
        self.scopes.push(ident);
        let belong = self.current_member();
        let union_type = self.alloc(
            loc,
            NodeKind::UnionType(UnionType {
                cond,
                candidates,
                base_type,
            }),
        );
        self.ast.fill(
            field,
            NodeKind::Field(Field {
                member: Member {
                    ident: Some(ident),
                    belong,
                    belong_struct: None,
                },
                colon_loc: loc,
                field_type: union_type,
                arguments: None,
                next: None,
            }),
        );
        self.add_to_struct(field);
        field
    }
}

#[cfg(test)]
mod tests {
    use super::Branches;
    use crate::ast::{
        expr_to_string, Field, Ident, IdentUsage, Member, NodeId, NodeKind, StructType,
        StructUnionType,
    };
    use crate::config::ParseOptions;
    use crate::lexer::{Lexer, Loc};
    use crate::parser::{ParseErrorKind, ParseResult, Parser, SyntaxTree};

    fn try_parse(source: &str) -> ParseResult<SyntaxTree> {
        Parser::from_source(source, &ParseOptions::default()).parse()
    }

    fn parse(source: &str) -> SyntaxTree {
        try_parse(source).unwrap()
    }

    fn struct_union(tree: &SyntaxTree, node: NodeId) -> &StructUnionType {
        let union = match tree.ast.kind(node) {
            NodeKind::If(i) => i.union.as_ref().unwrap().struct_union_type,
            NodeKind::Match(m) => m.union.struct_union_type,
            other => panic!("expected if or match, got {}", other.name()),
        };
        tree.ast.struct_union_type(union).unwrap()
    }

    /// Names of the top-level struct's fields, `_` for anonymous ones
    fn top_fields(tree: &SyntaxTree) -> Vec<String> {
        let st = tree.ast.struct_type(tree.program().unwrap().struct_type).unwrap();
        st.fields
            .iter()
            .map(|&f| tree.ast.member_name(f).unwrap_or("_").to_string())
            .collect()
    }

    #[test]
    fn if_else_exports_one_union_per_name() {
        let tree = parse("if a:\n  x :u8\n  y :u8\nelse:\n  x :u16\n");
        let su = struct_union(&tree, tree.program().unwrap().elements[0]);
        assert_eq!(su.structs.len(), 2);
        assert_eq!(su.conds.len(), 2);
        assert!(su.exhaustive);
        assert_eq!(top_fields(&tree), vec!["_", "x", "y"]);

        let y = tree.ast.field(su.union_fields[1]).unwrap();
        let y = tree.ast.union_type(y.field_type).unwrap();
        assert_eq!(y.candidates.len(), 2);
        let absent = tree.ast.union_candidate(y.candidates[1]).unwrap();
        assert!(absent.field.is_none());
        assert_eq!(expr_to_string(&tree.ast, absent.cond), "(.. _ _)");
    }

    #[test]
    fn elif_chain_links_through_els() {
        let tree = parse("if a:\n  x :u8\nelif b:\n  x :u16\nelif c:\n  z :u8\n");
        let head = tree.program().unwrap().elements[0];
        let NodeKind::If(first) = tree.ast.kind(head) else {
            panic!("expected if");
        };
        let NodeKind::If(second) = tree.ast.kind(first.els.unwrap()) else {
            panic!("expected elif");
        };
        assert!(second.union.is_none());
        assert_eq!(second.cond_scope, first.cond_scope);
        let NodeKind::If(third) = tree.ast.kind(second.els.unwrap()) else {
            panic!("expected elif");
        };
        assert!(third.els.is_none());

        let su = struct_union(&tree, head);
        assert!(!su.exhaustive);
        assert_eq!(su.conds.len(), 3);
        let x = tree.ast.field(su.union_fields[0]).unwrap();
        let x = tree.ast.union_type(x.field_type).unwrap();
        let present: Vec<bool> = x
            .candidates
            .iter()
            .map(|&c| tree.ast.union_candidate(c).unwrap().field.is_some())
            .collect();
        assert_eq!(present, vec![true, true, false]);
    }

    #[test]
    fn absent_candidates_are_shared_per_branch() {
        let tree = parse("if a:\n  x :u8\nelse:\n  y :u8\n  z :u8\n");
        let su = struct_union(&tree, tree.program().unwrap().elements[0]);
        let first_candidate = |field: NodeId| {
            let field = tree.ast.field(field).unwrap();
            tree.ast.union_type(field.field_type).unwrap().candidates[0]
        };
        // y and z are both missing from the first branch
        assert_eq!(
            first_candidate(su.union_fields[1]),
            first_candidate(su.union_fields[2])
        );
    }

    #[test]
    fn union_field_is_declared_after_branch_scope() {
        let tree = parse("if a:\n  x :u8\nelse:\n  x :u16\n");
        let su = struct_union(&tree, tree.program().unwrap().elements[0]);
        let field = tree.ast.field(su.union_fields[0]).unwrap();
        let ident = tree.ast.ident(field.member.ident.unwrap()).unwrap();
        assert_eq!(ident.usage(), IdentUsage::DefineField);
        assert_eq!(ident.definition(), Some(su.union_fields[0]));
        assert!(tree.scopes.get(ident.scope()).is_global);
    }

    #[test]
    fn redefinition_within_branch_is_rejected() {
        let err = try_parse("if a:\n  x :u8\n  x :u16\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::DuplicateDefinition { ref name, .. } if name == "x"));
    }

    #[test]
    fn branch_sees_names_exported_before_it() {
        let err = try_parse("if a:\n  if b:\n    x :u8\n  if c:\n    x :u16\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::DuplicateDefinition { .. }));
    }

    #[test]
    fn nested_if_inside_format() {
        let tree = parse("format A:\n  t :u8\n  if t == 1:\n    v :u16\n  elif t == 2:\n    v :u32\n  n :u8\n");
        let NodeKind::Format(format) = tree.ast.kind(tree.program().unwrap().elements[0]) else {
            panic!("expected format");
        };
        let NodeKind::IndentBlock(body) = tree.ast.kind(format.body) else {
            panic!("expected block");
        };
        assert_eq!(body.elements.len(), 3);
        let names: Vec<_> = tree
            .ast
            .struct_type(body.struct_type)
            .unwrap()
            .fields
            .iter()
            .map(|&f| tree.ast.member_name(f).unwrap_or("_"))
            .collect();
        assert_eq!(names, vec!["t", "_", "v", "n"]);
    }

    #[test]
    fn match_arms_with_arrows_and_blocks() {
        let tree = parse("match t:\n  1 => a :u8\n  2, 3:\n    b :u16\n  .. => c :u32\n");
        let id = tree.program().unwrap().elements[0];
        let NodeKind::Match(m) = tree.ast.kind(id) else {
            panic!("expected match");
        };
        assert!(m.cond.is_some());
        assert_eq!(m.branches.len(), 3);
        let NodeKind::MatchBranch(second) = tree.ast.kind(m.branches[1]) else {
            panic!("expected branch");
        };
        assert!(matches!(tree.ast.kind(second.cond), NodeKind::OrCond(or) if or.conds.len() == 2));
        let NodeKind::MatchBranch(first) = tree.ast.kind(m.branches[0]) else {
            panic!("expected branch");
        };
        assert!(matches!(tree.ast.kind(first.then), NodeKind::ScopedStatement(_)));

        let su = struct_union(&tree, id);
        assert!(su.exhaustive);
        assert_eq!(su.cond, m.cond);
        assert_eq!(su.conds.len(), 3);
        assert_eq!(su.union_fields.len(), 3);
    }

    #[test]
    fn match_without_catch_all_is_not_exhaustive() {
        let tree = parse("match:\n  a == 1 => x :u8\n  a == 2 => x :u16\n");
        let id = tree.program().unwrap().elements[0];
        let su = struct_union(&tree, id);
        assert!(su.cond.is_none());
        assert!(!su.exhaustive);
        assert_eq!(su.union_fields.len(), 1);
    }

    #[test]
    fn wildcard_arm_is_exhaustive() {
        let tree = parse("match t:\n  1 => x :u8\n  _ => x :u16\n");
        let su = struct_union(&tree, tree.program().unwrap().elements[0]);
        assert!(su.exhaustive);
    }

    #[test]
    fn statement_after_arrow_does_not_leak_scope() {
        let tree = parse("match t:\n  1 => a :u8\n  2 => a :u16\n");
        let NodeKind::Match(m) = tree.ast.kind(tree.program().unwrap().elements[0]) else {
            panic!("expected match");
        };
        let scopes: Vec<_> = m
            .branches
            .iter()
            .map(|&b| {
                let NodeKind::MatchBranch(b) = tree.ast.kind(b) else {
                    panic!("expected branch");
                };
                let NodeKind::ScopedStatement(s) = tree.ast.kind(b.then) else {
                    panic!("expected scoped statement");
                };
                s.scope
            })
            .collect();
        assert_ne!(scopes[0], scopes[1]);
    }

    fn named_field(parser: &mut Parser<Lexer<'_>>, name: &str, loc: Loc) -> NodeId {
        let field = parser.ast.reserve(loc);
        let scope = parser.scopes.current();
        let ident = parser.alloc(
            loc,
            NodeKind::Ident(Ident::resolved(name, scope, IdentUsage::DefineField, Some(field))),
        );
        let field_type = parser.alloc(loc, NodeKind::BoolType);
        parser.ast.fill(
            field,
            NodeKind::Field(Field {
                member: Member {
                    ident: Some(ident),
                    belong: None,
                    belong_struct: None,
                },
                colon_loc: loc,
                field_type,
                arguments: None,
                next: None,
            }),
        );
        field
    }

    #[test]
    fn export_rejects_repeated_name_in_one_struct() {
        let mut parser = Parser::from_source("", &ParseOptions::default());
        let first_loc = Loc {
            line: 1,
            ..Loc::default()
        };
        let second_loc = Loc {
            line: 2,
            ..Loc::default()
        };
        let first = named_field(&mut parser, "v", first_loc);
        let second = named_field(&mut parser, "v", second_loc);
        let st = parser.alloc(
            first_loc,
            NodeKind::StructType(StructType {
                fields: vec![first, second],
                base: None,
            }),
        );
        let cond = parser.alloc(first_loc, NodeKind::BoolLiteral(true));
        let su = parser.ast.reserve(first_loc);
        let branches = Branches {
            conds: vec![cond],
            structs: vec![st],
            exhaustive: false,
        };

        let err = parser.export_union(su, cond, None, branches).unwrap_err();
        let ParseErrorKind::DuplicateUnionField { name, previous } = err.kind else {
            panic!("expected duplicate union field");
        };
        assert_eq!(name, "v");
        assert_eq!(previous.line, 1);
        assert_eq!(err.loc.line, 2);
    }
}
