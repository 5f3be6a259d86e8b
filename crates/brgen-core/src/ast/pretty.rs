//! Textual renderings of the AST
//!
//! [`expr_to_string`] prints an expression as an s-expression with explicit
//! grouping; [`dump_tree`] prints a whole subtree, one node per line.

use std::fmt::Write;

use super::{walk, Ast, NodeId, NodeKind};

/// Render an expression with every operator parenthesized
#[must_use]
pub fn expr_to_string(ast: &Ast, id: NodeId) -> String {
    let mut out = String::new();
    write_expr(ast, id, &mut out);
    out
}

fn write_expr(ast: &Ast, id: NodeId, out: &mut String) {
    let opt = |out: &mut String, id: Option<NodeId>| match id {
        Some(id) => write_expr(ast, id, out),
        None => out.push('_'),
    };
    match ast.kind(id) {
        NodeKind::IntLiteral(lit) => out.push_str(&lit.value),
        NodeKind::BoolLiteral(b) => out.push_str(if *b { "true" } else { "false" }),
        NodeKind::StrLiteral(lit) => out.push_str(&lit.value),
        NodeKind::CharLiteral(lit) => out.push_str(&lit.value),
        NodeKind::RegexLiteral(lit) => out.push_str(lit),
        NodeKind::SpecialLiteral(kind) => out.push_str(kind.as_str()),
        NodeKind::Ident(ident) => out.push_str(ident.name()),
        NodeKind::BadExpr(text) => {
            let _ = write!(out, "<bad {text}>");
        }
        NodeKind::TypeLiteral(t) => {
            out.push('<');
            out.push_str(&type_label(ast, t.type_literal));
            out.push('>');
        }
        NodeKind::Binary(b) => {
            let _ = write!(out, "({} ", b.op);
            write_expr(ast, b.left, out);
            out.push(' ');
            write_expr(ast, b.right, out);
            out.push(')');
        }
        NodeKind::Unary(u) => {
            let _ = write!(out, "({} ", u.op.as_str());
            write_expr(ast, u.expr, out);
            out.push(')');
        }
        NodeKind::Cond(c) => {
            out.push_str("(? ");
            write_expr(ast, c.cond, out);
            out.push(' ');
            write_expr(ast, c.then, out);
            out.push(' ');
            write_expr(ast, c.els, out);
            out.push(')');
        }
        NodeKind::Range(r) => {
            let _ = write!(out, "({} ", r.op);
            opt(out, r.start);
            out.push(' ');
            opt(out, r.end);
            out.push(')');
        }
        NodeKind::Call(c) => {
            out.push_str("(call ");
            write_expr(ast, c.callee, out);
            for arg in &c.arguments {
                out.push(' ');
                write_expr(ast, *arg, out);
            }
            out.push(')');
        }
        NodeKind::Cast(c) => {
            let _ = write!(out, "(cast <{}>", type_label(ast, c.to));
            for arg in &c.arguments {
                out.push(' ');
                write_expr(ast, *arg, out);
            }
            out.push(')');
        }
        NodeKind::MemberAccess(m) => {
            out.push_str("(. ");
            write_expr(ast, m.target, out);
            out.push(' ');
            write_expr(ast, m.member, out);
            out.push(')');
        }
        NodeKind::Index(i) => {
            out.push_str("([] ");
            write_expr(ast, i.expr, out);
            out.push(' ');
            write_expr(ast, i.index, out);
            out.push(')');
        }
        NodeKind::Paren(p) => {
            out.push_str("(paren ");
            write_expr(ast, p.expr, out);
            out.push(')');
        }
        NodeKind::OrCond(o) => {
            out.push_str("(or");
            for cond in &o.conds {
                out.push(' ');
                write_expr(ast, *cond, out);
            }
            out.push(')');
        }
        other => out.push_str(other.name()),
    }
}

/// Short description of a type node
fn type_label(ast: &Ast, id: NodeId) -> String {
    match ast.kind(id) {
        NodeKind::IntType(t) => format!("{}{}", if t.is_signed { 's' } else { 'u' }, t.bit_size),
        NodeKind::FloatType(t) => format!("f{}", t.bit_size),
        NodeKind::VoidType => "void".to_string(),
        NodeKind::BoolType => "bool".to_string(),
        NodeKind::IdentType(t) => ast
            .ident(t.ident)
            .map_or_else(|| "?".to_string(), |i| i.name().to_string()),
        NodeKind::ArrayType(a) => {
            let len = a.length.map(|l| expr_to_string(ast, l)).unwrap_or_default();
            format!("[{len}]{}", type_label(ast, a.element_type))
        }
        NodeKind::StrLiteralType(lit) => expr_to_string(ast, *lit),
        NodeKind::UnionType(u) => format!("union[{}]", u.candidates.len()),
        NodeKind::StructUnionType(s) => format!("struct_union[{}]", s.structs.len()),
        other => other.name().to_string(),
    }
}

fn label(ast: &Ast, id: NodeId) -> String {
    let name_of = |ident: Option<NodeId>| {
        ident
            .and_then(|i| ast.ident(i))
            .map_or("_", |i| i.name())
            .to_string()
    };
    match ast.kind(id) {
        NodeKind::Ident(ident) => format!("ident {} ({})", ident.name(), ident.usage()),
        NodeKind::Format(f) => format!("format {}", name_of(f.member.ident)),
        NodeKind::State(s) => format!("state {}", name_of(s.member.ident)),
        NodeKind::Enum(e) => format!("enum {}", name_of(e.member.ident)),
        NodeKind::Function(f) => format!("fn {}", name_of(f.member.ident)),
        NodeKind::Field(f) => format!(
            "field {} :{}",
            name_of(f.member.ident),
            type_label(ast, f.field_type)
        ),
        NodeKind::Binary(b) => format!("binary {}", b.op),
        NodeKind::Unary(u) => format!("unary {}", u.op.as_str()),
        NodeKind::Range(r) => format!("range {}", r.op),
        NodeKind::Cast(c) => format!("cast {}", type_label(ast, c.to)),
        NodeKind::IntLiteral(lit) => format!("int {}", lit.value),
        NodeKind::StrLiteral(lit) => format!("str {}", lit.value),
        NodeKind::Comment(c) => format!("comment {}", c.text),
        NodeKind::StructUnionType(s) => format!(
            "struct_union_type branches={} exhaustive={}",
            s.structs.len(),
            s.exhaustive
        ),
        NodeKind::UnionCandidate(c) => match c.field {
            Some(field) => format!("union_candidate {}", label(ast, field)),
            None => "union_candidate <absent>".to_string(),
        },
        kind if is_type(kind) => format!("type {}", type_label(ast, id)),
        other => other.name().to_string(),
    }
}

fn is_type(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::IntType(_)
            | NodeKind::FloatType(_)
            | NodeKind::IdentType(_)
            | NodeKind::ArrayType(_)
            | NodeKind::StrLiteralType(_)
            | NodeKind::VoidType
            | NodeKind::BoolType
            | NodeKind::UnionType(_)
    )
}

/// Indented tree of `root` and its owned descendants
#[must_use]
pub fn dump_tree(ast: &Ast, root: NodeId) -> String {
    let mut out = String::new();
    walk(ast, root, |id, depth| {
        let loc = ast.loc(id);
        let _ = writeln!(
            out,
            "{:indent$}{} @{}",
            "",
            label(ast, id),
            loc,
            indent = depth * 2
        );
    });
    out
}
