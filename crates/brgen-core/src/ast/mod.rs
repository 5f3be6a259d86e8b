//! Abstract Syntax Tree for the brgen language
//!
//! Nodes live in an [`Ast`] arena and refer to each other by [`NodeId`].
//! A node's owned children are listed by [`NodeKind::children`]; every other
//! id stored in a node (definitions, `belong`, struct field lists, union
//! candidate fields) is a back reference.

mod expr;
mod ident;
mod pretty;
mod stmt;
mod traverse;
mod types;

pub use expr::*;
pub use ident::*;
pub use pretty::{dump_tree, expr_to_string};
pub use stmt::*;
pub use traverse::walk;
pub use types::*;

use crate::lexer::Loc;

/// Stable index of a node in its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub loc: Loc,
    pub kind: NodeKind,
}

/// Every kind of node the parser produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Allocated but not yet filled in
    Reserved,

    Program(Program),
    Comment(Comment),
    CommentGroup(CommentGroup),

    // ==================== Expressions ====================
    IntLiteral(IntLiteral),
    BoolLiteral(bool),
    StrLiteral(StrLiteral),
    CharLiteral(CharLiteral),
    RegexLiteral(String),
    TypeLiteral(TypeLiteral),
    SpecialLiteral(SpecialLiteralKind),
    Ident(Ident),
    Binary(Binary),
    Unary(Unary),
    Cond(Cond),
    Call(Call),
    Cast(Cast),
    MemberAccess(MemberAccess),
    Paren(Paren),
    Index(Index),
    Range(Range),
    OrCond(OrCond),
    /// Placeholder for an expression that failed to parse in tolerant mode
    BadExpr(String),
    If(If),
    Match(Match),

    // ==================== Statements ====================
    MatchBranch(MatchBranch),
    Loop(Loop),
    IndentBlock(IndentBlock),
    ScopedStatement(ScopedStatement),
    Field(Field),
    FieldArgument(FieldArgument),
    Format(Format),
    State(State),
    Enum(Enum),
    EnumMember(EnumMember),
    Function(Function),
    Return(Return),
    Break(LoopControl),
    Continue(LoopControl),

    // ==================== Types ====================
    IntType(IntType),
    FloatType(FloatType),
    IdentType(IdentType),
    ArrayType(ArrayType),
    StrLiteralType(NodeId),
    RegexLiteralType(NodeId),
    FunctionType(FunctionType),
    VoidType,
    BoolType,
    StructType(StructType),
    StructUnionType(StructUnionType),
    UnionType(UnionType),
    UnionCandidate(UnionCandidate),
    EnumType(EnumType),
}

impl NodeKind {
    /// Short lowercase name of the variant
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Reserved => "reserved",
            NodeKind::Program(_) => "program",
            NodeKind::Comment(_) => "comment",
            NodeKind::CommentGroup(_) => "comment_group",
            NodeKind::IntLiteral(_) => "int_literal",
            NodeKind::BoolLiteral(_) => "bool_literal",
            NodeKind::StrLiteral(_) => "str_literal",
            NodeKind::CharLiteral(_) => "char_literal",
            NodeKind::RegexLiteral(_) => "regex_literal",
            NodeKind::TypeLiteral(_) => "type_literal",
            NodeKind::SpecialLiteral(_) => "special_literal",
            NodeKind::Ident(_) => "ident",
            NodeKind::Binary(_) => "binary",
            NodeKind::Unary(_) => "unary",
            NodeKind::Cond(_) => "cond",
            NodeKind::Call(_) => "call",
            NodeKind::Cast(_) => "cast",
            NodeKind::MemberAccess(_) => "member_access",
            NodeKind::Paren(_) => "paren",
            NodeKind::Index(_) => "index",
            NodeKind::Range(_) => "range",
            NodeKind::OrCond(_) => "or_cond",
            NodeKind::BadExpr(_) => "bad_expr",
            NodeKind::If(_) => "if",
            NodeKind::Match(_) => "match",
            NodeKind::MatchBranch(_) => "match_branch",
            NodeKind::Loop(_) => "loop",
            NodeKind::IndentBlock(_) => "indent_block",
            NodeKind::ScopedStatement(_) => "scoped_statement",
            NodeKind::Field(_) => "field",
            NodeKind::FieldArgument(_) => "field_argument",
            NodeKind::Format(_) => "format",
            NodeKind::State(_) => "state",
            NodeKind::Enum(_) => "enum",
            NodeKind::EnumMember(_) => "enum_member",
            NodeKind::Function(_) => "function",
            NodeKind::Return(_) => "return",
            NodeKind::Break(_) => "break",
            NodeKind::Continue(_) => "continue",
            NodeKind::IntType(_) => "int_type",
            NodeKind::FloatType(_) => "float_type",
            NodeKind::IdentType(_) => "ident_type",
            NodeKind::ArrayType(_) => "array_type",
            NodeKind::StrLiteralType(_) => "str_literal_type",
            NodeKind::RegexLiteralType(_) => "regex_literal_type",
            NodeKind::FunctionType(_) => "function_type",
            NodeKind::VoidType => "void_type",
            NodeKind::BoolType => "bool_type",
            NodeKind::StructType(_) => "struct_type",
            NodeKind::StructUnionType(_) => "struct_union_type",
            NodeKind::UnionType(_) => "union_type",
            NodeKind::UnionCandidate(_) => "union_candidate",
            NodeKind::EnumType(_) => "enum_type",
        }
    }

    /// Shared declaration data of formats, states, enums, functions and fields
    #[must_use]
    pub fn member(&self) -> Option<&Member> {
        match self {
            NodeKind::Format(f) => Some(&f.member),
            NodeKind::State(s) => Some(&s.member),
            NodeKind::Enum(e) => Some(&e.member),
            NodeKind::Function(f) => Some(&f.member),
            NodeKind::Field(f) => Some(&f.member),
            _ => None,
        }
    }

    pub fn member_mut(&mut self) -> Option<&mut Member> {
        match self {
            NodeKind::Format(f) => Some(&mut f.member),
            NodeKind::State(s) => Some(&mut s.member),
            NodeKind::Enum(e) => Some(&mut e.member),
            NodeKind::Function(f) => Some(&mut f.member),
            NodeKind::Field(f) => Some(&mut f.member),
            _ => None,
        }
    }
}

/// Arena owning every node of one parse
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn alloc(&mut self, loc: Loc, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { loc, kind });
        id
    }

    /// Allocate an id whose content is supplied later with [`Ast::fill`]
    pub fn reserve(&mut self, loc: Loc) -> NodeId {
        self.alloc(loc, NodeKind::Reserved)
    }

    pub fn fill(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.index()].kind = kind;
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    #[must_use]
    pub fn loc(&self, id: NodeId) -> Loc {
        self.get(id).loc
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    #[must_use]
    pub fn ident(&self, id: NodeId) -> Option<&Ident> {
        match self.kind(id) {
            NodeKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn ident_mut(&mut self, id: NodeId) -> Option<&mut Ident> {
        match &mut self.get_mut(id).kind {
            NodeKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Identifier node a declaration was given
    #[must_use]
    pub fn member_ident(&self, id: NodeId) -> Option<NodeId> {
        self.kind(id).member()?.ident
    }

    /// Name of the identifier a declaration was given
    #[must_use]
    pub fn member_name(&self, id: NodeId) -> Option<&str> {
        let ident = self.kind(id).member()?.ident?;
        self.ident(ident).map(Ident::name)
    }

    #[must_use]
    pub fn field(&self, id: NodeId) -> Option<&Field> {
        match self.kind(id) {
            NodeKind::Field(field) => Some(field),
            _ => None,
        }
    }

    #[must_use]
    pub fn struct_type(&self, id: NodeId) -> Option<&StructType> {
        match self.kind(id) {
            NodeKind::StructType(st) => Some(st),
            _ => None,
        }
    }

    pub fn struct_type_mut(&mut self, id: NodeId) -> Option<&mut StructType> {
        match &mut self.get_mut(id).kind {
            NodeKind::StructType(st) => Some(st),
            _ => None,
        }
    }

    #[must_use]
    pub fn struct_union_type(&self, id: NodeId) -> Option<&StructUnionType> {
        match self.kind(id) {
            NodeKind::StructUnionType(su) => Some(su),
            _ => None,
        }
    }

    #[must_use]
    pub fn union_type(&self, id: NodeId) -> Option<&UnionType> {
        match self.kind(id) {
            NodeKind::UnionType(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn union_candidate(&self, id: NodeId) -> Option<&UnionCandidate> {
        match self.kind(id) {
            NodeKind::UnionCandidate(c) => Some(c),
            _ => None,
        }
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_then_fill() {
        let mut ast = Ast::new();
        let id = ast.reserve(Loc::default());
        assert_eq!(ast.kind(id), &NodeKind::Reserved);
        let child = ast.alloc(Loc::default(), NodeKind::BoolLiteral(true));
        ast.fill(
            id,
            NodeKind::Unary(Unary {
                op: UnaryOp::Not,
                expr: child,
            }),
        );
        assert_eq!(ast.kind(id).name(), "unary");
        assert_eq!(ast.len(), 2);
    }

    #[test]
    fn member_access_on_declarations() {
        let mut ast = Ast::new();
        let ty = ast.alloc(Loc::default(), NodeKind::BoolType);
        let field = ast.alloc(
            Loc::default(),
            NodeKind::Field(Field {
                member: Member::default(),
                colon_loc: Loc::default(),
                field_type: ty,
                arguments: None,
                next: None,
            }),
        );
        assert!(ast.kind(field).member().is_some());
        assert!(ast.kind(ty).member().is_none());
        assert_eq!(ast.member_name(field), None);
    }
}
