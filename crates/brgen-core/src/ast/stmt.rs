//! Statement, declaration and control-flow nodes

use super::NodeId;
use crate::lexer::Loc;
use crate::scope::ScopeId;

/// Root of a parsed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub elements: Vec<NodeId>,
    pub global_scope: ScopeId,
    /// Struct holding the top-level members
    pub struct_type: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

/// Comments collected before an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<NodeId>,
}

/// Placement shared by every declaration kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    pub ident: Option<NodeId>,
    /// Enclosing format, state, enum or function
    pub belong: Option<NodeId>,
    /// Struct the member was appended to
    pub belong_struct: Option<NodeId>,
}

/// Bookkeeping an `if`/`match` head keeps for its synthesized union
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchUnion {
    /// Anonymous field whose type is the struct union
    pub field: NodeId,
    pub struct_union_type: NodeId,
    /// Synthetic "any" condition standing for `else`
    pub else_cond: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub cond: NodeId,
    pub then: NodeId,
    /// The following `elif` (another `If`) or the `else` block
    pub els: Option<NodeId>,
    /// Scope shared by every arm of the chain
    pub cond_scope: ScopeId,
    /// Set on the head of an `if`/`elif`/`else` chain only
    pub union: Option<BranchUnion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub cond: Option<NodeId>,
    pub branches: Vec<NodeId>,
    pub cond_scope: ScopeId,
    pub union: BranchUnion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBranch {
    pub belong: NodeId,
    pub cond: NodeId,
    /// Location of `=>` or `:`
    pub sym_loc: Loc,
    /// A `ScopedStatement` or an `IndentBlock`
    pub then: NodeId,
    pub comment: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub init: Option<NodeId>,
    pub cond: Option<NodeId>,
    pub step: Option<NodeId>,
    pub body: NodeId,
    pub cond_scope: ScopeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentBlock {
    pub elements: Vec<NodeId>,
    pub scope: ScopeId,
    pub struct_type: NodeId,
}

/// Single statement following `=>` in a match arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedStatement {
    pub statement: NodeId,
    pub scope: ScopeId,
    pub struct_type: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub member: Member,
    pub colon_loc: Loc,
    pub field_type: NodeId,
    pub arguments: Option<NodeId>,
    /// Next plain field of the same struct
    pub next: Option<NodeId>,
}

/// `(args)` after a field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArgument {
    pub raw_arguments: Option<NodeId>,
    pub arguments: Vec<NodeId>,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub member: Member,
    pub body: NodeId,
    pub encode_fn: Option<NodeId>,
    pub decode_fn: Option<NodeId>,
    pub cast_fns: Vec<NodeId>,
    /// Ident types named by fields of this format
    pub depends: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub member: Member,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub member: Member,
    pub scope: ScopeId,
    pub base_type: Option<NodeId>,
    pub members: Vec<NodeId>,
    pub enum_type: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub ident: NodeId,
    /// Expression as written after `=`
    pub raw_expr: Option<NodeId>,
    /// Explicit or derived value; derived values may reuse the previous member's value node
    pub value: Option<NodeId>,
    pub str_literal: Option<NodeId>,
    pub belong: NodeId,
    pub comment: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub member: Member,
    pub parameters: Vec<NodeId>,
    pub return_type: NodeId,
    pub body: NodeId,
    /// Signature summary sharing the parameter and return type nodes
    pub func_type: NodeId,
    pub is_cast: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub expr: Option<NodeId>,
    pub related_function: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopControl {
    pub related_loop: Option<NodeId>,
}
