//! Type expressions

use super::{ParseResult, Parser, TokenSource};
use crate::ast::{
    ArrayType, FloatType, FunctionType, Ident, IdentType, IdentUsage, IntType, NodeId, NodeKind,
};
use crate::lexer::{Tag, Token};

impl<S: TokenSource> Parser<S> {
    /// Node for a built-in type name, if `token` is one
    pub(super) fn primitive_type(&mut self, token: &Token) -> Option<NodeId> {
        let kind = if let Some(int) = IntType::from_name(&token.text) {
            NodeKind::IntType(int)
        } else if let Some(float) = FloatType::from_name(&token.text) {
            NodeKind::FloatType(float)
        } else {
            match token.text.as_str() {
                "void" => NodeKind::VoidType,
                "bool" => NodeKind::BoolType,
                _ => return None,
            }
        };
        Some(self.alloc(token.loc, kind))
    }

    /// Parse a type
    ///
    /// Named types met outside parameter lists are recorded as dependencies
    /// of the enclosing format.
    pub(super) fn parse_type(&mut self, as_argument: bool) -> ParseResult<NodeId> {
        if let Some(open) = self.s.consume_text("[") {
            self.s.skip_white();
            let length = if self.s.expect_text("]") {
                None
            } else {
                let length = self.expr()?;
                self.s.skip_white();
                Some(length)
            };
            let close = self.s.must_consume_text("]")?;
            self.s.skip_space();
            let element_type = self.parse_type(as_argument)?;
            return Ok(self.alloc(
                open.loc,
                NodeKind::ArrayType(ArrayType {
                    length,
                    end_loc: close.loc,
                    element_type,
                }),
            ));
        }
        if let Some(lit) = self.s.consume_tag(Tag::StrLiteral) {
            let loc = lit.loc;
            let literal = self.str_literal(lit)?;
            return Ok(self.alloc(loc, NodeKind::StrLiteralType(literal)));
        }
        if let Some(lit) = self.s.consume_tag(Tag::RegexLiteral) {
            let literal = self.alloc(lit.loc, NodeKind::RegexLiteral(lit.text));
            return Ok(self.alloc(lit.loc, NodeKind::RegexLiteralType(literal)));
        }
        if let Some(token) = self.s.consume_text("fn") {
            return self.function_type(&token);
        }

        let token = self.s.must_consume_tag(Tag::Ident)?;
        if let Some(ty) = self.primitive_type(&token) {
            return Ok(ty);
        }
        let scope = self.scopes.current();
        let mut ident = self.alloc(
            token.loc,
            NodeKind::Ident(Ident::resolved(
                token.text,
                scope,
                IdentUsage::MaybeType,
                None,
            )),
        );
        self.s.skip_space();
        // `module.Type` names a type from an imported file
        let import_ref = match self.s.consume_text(".") {
            Some(dot) => {
                let access = self.member_access(&dot, ident)?;
                if let NodeKind::MemberAccess(m) = self.ast.kind(access) {
                    ident = m.member;
                }
                Some(access)
            }
            None => None,
        };
        let id = self.alloc(token.loc, NodeKind::IdentType(IdentType { ident, import_ref }));
        if !as_argument {
            self.add_dependency(id);
        }
        Ok(id)
    }

    /// `fn(<param>, ...) -> <type>` where a parameter is `name :T`, `:T` or `T`
    fn function_type(&mut self, fn_token: &Token) -> ParseResult<NodeId> {
        self.s.skip_white();
        self.s.must_consume_text("(")?;
        self.s.skip_white();
        let mut parameters = Vec::new();
        while !self.s.expect_text(")") {
            if !parameters.is_empty() {
                self.s.must_consume_text(",")?;
                self.s.skip_white();
            }
            let start = self.s.checkpoint();
            if self.s.consume_tag(Tag::Ident).is_some() {
                self.s.skip_white();
                if !self.s.expect_text(":") {
                    self.s.rollback(start);
                }
            }
            if self.s.consume_text(":").is_some() {
                self.s.skip_white();
            }
            parameters.push(self.parse_type(true)?);
            self.s.skip_white();
        }
        self.s.must_consume_text(")")?;
        self.s.skip_space();
        let return_type = if self.s.consume_text("->").is_some() {
            self.s.skip_white();
            Some(self.parse_type(true)?)
        } else {
            None
        };
        Ok(self.alloc(
            fn_token.loc,
            NodeKind::FunctionType(FunctionType {
                parameters,
                return_type,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Endian, IdentUsage, NodeId, NodeKind};
    use crate::config::ParseOptions;
    use crate::parser::{Parser, SyntaxTree};

    fn parse(source: &str) -> SyntaxTree {
        Parser::from_source(source, &ParseOptions::default())
            .parse()
            .unwrap()
    }

    /// Type of the first top-level field
    fn first_type(tree: &SyntaxTree) -> NodeId {
        let program = tree.program().unwrap();
        tree.ast.field(program.elements[0]).unwrap().field_type
    }

    #[test]
    fn endian_int_types() {
        let tree = parse("x :ub32\n");
        let NodeKind::IntType(int) = tree.ast.kind(first_type(&tree)) else {
            panic!("expected int type");
        };
        assert_eq!(int.bit_size, 32);
        assert_eq!(int.endian, Endian::Big);
        assert!(!int.is_signed);
    }

    #[test]
    fn array_types() {
        let tree = parse("x :[4][]u8\n");
        let NodeKind::ArrayType(outer) = tree.ast.kind(first_type(&tree)) else {
            panic!("expected array type");
        };
        assert!(outer.length.is_some());
        let NodeKind::ArrayType(inner) = tree.ast.kind(outer.element_type) else {
            panic!("expected nested array type");
        };
        assert!(inner.length.is_none());
        assert!(matches!(tree.ast.kind(inner.element_type), NodeKind::IntType(_)));
    }

    #[test]
    fn function_types() {
        let tree = parse("f :fn(u8, n :u16) -> bool\n");
        let NodeKind::FunctionType(func) = tree.ast.kind(first_type(&tree)) else {
            panic!("expected function type");
        };
        assert_eq!(func.parameters.len(), 2);
        assert!(matches!(
            func.return_type.map(|r| tree.ast.kind(r)),
            Some(NodeKind::BoolType)
        ));
    }

    #[test]
    fn str_literal_type() {
        let tree = parse("magic :\"PNG\"\n");
        let NodeKind::StrLiteralType(lit) = tree.ast.kind(first_type(&tree)) else {
            panic!("expected str literal type");
        };
        assert!(matches!(tree.ast.kind(*lit), NodeKind::StrLiteral(s) if s.length == 3));
    }

    #[test]
    fn named_and_imported_types() {
        let tree = parse("h :Header\nc :png.Chunk\n");
        let program = tree.program().unwrap();
        let NodeKind::IdentType(named) = tree.ast.kind(first_type(&tree)) else {
            panic!("expected ident type");
        };
        assert!(named.import_ref.is_none());
        assert_eq!(tree.ast.ident(named.ident).unwrap().usage(), IdentUsage::MaybeType);

        let imported = tree.ast.field(program.elements[1]).unwrap().field_type;
        let NodeKind::IdentType(imported) = tree.ast.kind(imported) else {
            panic!("expected ident type");
        };
        assert!(imported.import_ref.is_some());
        assert_eq!(tree.ast.ident(imported.ident).unwrap().name(), "Chunk");
    }

    #[test]
    fn format_records_dependencies() {
        let tree = parse("format A:\n  h :Header\n  b :[2]Body\n  fn f(x :Arg) -> void:\n    return\n");
        let program = tree.program().unwrap();
        let NodeKind::Format(format) = tree.ast.kind(program.elements[0]) else {
            panic!("expected format");
        };
        let names: Vec<_> = format
            .depends
            .iter()
            .filter_map(|&d| match tree.ast.kind(d) {
                NodeKind::IdentType(t) => tree.ast.ident(t.ident).map(|i| i.name().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Header", "Body"]);
    }
}
