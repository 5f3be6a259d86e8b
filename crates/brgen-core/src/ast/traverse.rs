//! Generic traversal over owned children

use super::{Ast, NodeId, NodeKind};

impl NodeKind {
    /// Owned children in source order
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Reserved
            | NodeKind::Comment(_)
            | NodeKind::IntLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StrLiteral(_)
            | NodeKind::CharLiteral(_)
            | NodeKind::RegexLiteral(_)
            | NodeKind::SpecialLiteral(_)
            | NodeKind::Ident(_)
            | NodeKind::BadExpr(_)
            | NodeKind::Break(_)
            | NodeKind::Continue(_)
            | NodeKind::IntType(_)
            | NodeKind::FloatType(_)
            | NodeKind::VoidType
            | NodeKind::BoolType
            | NodeKind::StructType(_)
            | NodeKind::UnionCandidate(_)
            | NodeKind::EnumType(_) => {}
            NodeKind::Program(p) => {
                out.extend(&p.elements);
                out.push(p.struct_type);
            }
            NodeKind::CommentGroup(g) => out.extend(&g.comments),
            NodeKind::TypeLiteral(t) => out.push(t.type_literal),
            NodeKind::Binary(b) => out.extend([b.left, b.right]),
            NodeKind::Unary(u) => out.push(u.expr),
            NodeKind::Cond(c) => out.extend([c.cond, c.then, c.els]),
            NodeKind::Call(c) => {
                out.push(c.callee);
                out.extend(c.raw_arguments);
            }
            NodeKind::Cast(c) => out.push(c.call),
            NodeKind::MemberAccess(m) => out.extend([m.target, m.member]),
            NodeKind::Paren(p) => out.push(p.expr),
            NodeKind::Index(i) => out.extend([i.expr, i.index]),
            NodeKind::Range(r) => out.extend(r.start.into_iter().chain(r.end)),
            NodeKind::OrCond(o) => out.push(o.base),
            NodeKind::If(i) => {
                out.extend([i.cond, i.then]);
                out.extend(i.els);
                if let Some(union) = &i.union {
                    out.push(union.field);
                    out.extend(union.else_cond);
                }
            }
            NodeKind::Match(m) => {
                out.extend(m.cond);
                out.extend(&m.branches);
                out.push(m.union.field);
            }
            NodeKind::MatchBranch(b) => {
                out.extend(b.comment);
                out.extend([b.cond, b.then]);
            }
            NodeKind::Loop(l) => {
                out.extend(l.init.into_iter().chain(l.cond).chain(l.step));
                out.push(l.body);
            }
            NodeKind::IndentBlock(b) => {
                out.extend(&b.elements);
                out.push(b.struct_type);
            }
            NodeKind::ScopedStatement(s) => out.extend([s.statement, s.struct_type]),
            NodeKind::Field(f) => {
                out.extend(f.member.ident);
                out.push(f.field_type);
                out.extend(f.arguments);
            }
            NodeKind::FieldArgument(a) => out.extend(a.raw_arguments),
            NodeKind::Format(f) => {
                out.extend(f.member.ident);
                out.push(f.body);
            }
            NodeKind::State(s) => {
                out.extend(s.member.ident);
                out.push(s.body);
            }
            NodeKind::Enum(e) => {
                out.extend(e.member.ident);
                out.extend(e.base_type);
                out.extend(&e.members);
                out.push(e.enum_type);
            }
            NodeKind::EnumMember(m) => {
                out.extend(m.comment);
                out.push(m.ident);
                out.extend(m.raw_expr);
            }
            NodeKind::Function(f) => {
                out.extend(f.member.ident);
                out.extend(&f.parameters);
                out.push(f.return_type);
                out.push(f.body);
            }
            NodeKind::Return(r) => out.extend(r.expr),
            NodeKind::IdentType(t) => out.push(t.import_ref.unwrap_or(t.ident)),
            NodeKind::ArrayType(a) => {
                out.extend(a.length);
                out.push(a.element_type);
            }
            NodeKind::StrLiteralType(lit) | NodeKind::RegexLiteralType(lit) => out.push(*lit),
            NodeKind::FunctionType(f) => {
                out.extend(&f.parameters);
                out.extend(f.return_type);
            }
            NodeKind::StructUnionType(s) => {
                out.extend(&s.union_fields);
                out.extend(&s.candidate_pool);
            }
            NodeKind::UnionType(_) => {}
        }
        out
    }
}

/// Visit `root` and its owned descendants in pre-order
///
/// The callback receives each node with its depth below `root`.
pub fn walk(ast: &Ast, root: NodeId, mut visit: impl FnMut(NodeId, usize)) {
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        visit(id, depth);
        let children = ast.kind(id).children();
        stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Binary, BinaryOp, IntLiteral};
    use crate::lexer::Loc;

    #[test]
    fn walk_is_preorder() {
        let mut ast = Ast::new();
        let lit = |ast: &mut Ast, v: &str| {
            ast.alloc(
                Loc::default(),
                NodeKind::IntLiteral(IntLiteral {
                    value: v.to_string(),
                }),
            )
        };
        let a = lit(&mut ast, "1");
        let b = lit(&mut ast, "2");
        let sum = ast.alloc(
            Loc::default(),
            NodeKind::Binary(Binary {
                op: BinaryOp::Add,
                left: a,
                right: b,
            }),
        );
        let mut seen = Vec::new();
        walk(&ast, sum, |id, depth| seen.push((id, depth)));
        assert_eq!(seen, vec![(sum, 0), (a, 1), (b, 1)]);
    }
}
