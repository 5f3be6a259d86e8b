//! Expression AST nodes

use super::NodeId;
use crate::lexer::Loc;

/// Binary operators, including assignment and range forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    LeftArithmeticShift,
    RightArithmeticShift,
    LeftLogicalShift,
    RightLogicalShift,
    BitAnd,
    Add,
    Sub,
    BitOr,
    BitXor,
    Equal,
    NotEqual,
    Less,
    LessOrEq,
    Greater,
    GreaterOrEq,
    LogicalAnd,
    LogicalOr,
    /// The `?` half of `? :`
    CondOp1,
    /// The `:` half of `? :`
    CondOp2,
    RangeExclusive,
    RangeInclusive,
    Assign,
    DefineAssign,
    ConstAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    LeftLogicalShiftAssign,
    RightLogicalShiftAssign,
    LeftArithmeticShiftAssign,
    RightArithmeticShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    Comma,
    /// Loop binding `x in range`
    InAssign,
}

impl BinaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::LeftArithmeticShift => "<<<",
            BinaryOp::RightArithmeticShift => ">>>",
            BinaryOp::LeftLogicalShift => "<<",
            BinaryOp::RightLogicalShift => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEq => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::CondOp1 => "?",
            BinaryOp::CondOp2 => ":",
            BinaryOp::RangeExclusive => "..",
            BinaryOp::RangeInclusive => "..=",
            BinaryOp::Assign => "=",
            BinaryOp::DefineAssign => ":=",
            BinaryOp::ConstAssign => "::=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::LeftLogicalShiftAssign => "<<=",
            BinaryOp::RightLogicalShiftAssign => ">>=",
            BinaryOp::LeftArithmeticShiftAssign => "<<<=",
            BinaryOp::RightArithmeticShiftAssign => ">>>=",
            BinaryOp::BitAndAssign => "&=",
            BinaryOp::BitOrAssign => "|=",
            BinaryOp::BitXorAssign => "^=",
            BinaryOp::Comma => ",",
            BinaryOp::InAssign => "in",
        }
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessOrEq
                | BinaryOp::Greater
                | BinaryOp::GreaterOrEq
        )
    }

    /// `:=`, `::=` and `in` introduce a new name on their left
    #[must_use]
    pub const fn is_defining_assign(self) -> bool {
        matches!(
            self,
            BinaryOp::DefineAssign | BinaryOp::ConstAssign | BinaryOp::InAssign
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    MinusSign,
}

impl UnaryOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::MinusSign => "-",
        }
    }
}

/// `input`, `output` and `config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialLiteralKind {
    Input,
    Output,
    Config,
}

impl SpecialLiteralKind {
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text {
            "input" => Some(SpecialLiteralKind::Input),
            "output" => Some(SpecialLiteralKind::Output),
            "config" => Some(SpecialLiteralKind::Config),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SpecialLiteralKind::Input => "input",
            SpecialLiteralKind::Output => "output",
            SpecialLiteralKind::Config => "config",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntLiteral {
    /// Source spelling, radix prefix included
    pub value: String,
}

impl IntLiteral {
    /// Numeric value, if it fits in 64 bits
    #[must_use]
    pub fn parse_u64(&self) -> Option<u64> {
        let text = self.value.as_str();
        let (digits, radix) = match text.get(..2) {
            Some("0x" | "0X") => (&text[2..], 16),
            Some("0o" | "0O") => (&text[2..], 8),
            Some("0b" | "0B") => (&text[2..], 2),
            _ => (text, 10),
        };
        u64::from_str_radix(digits, radix).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLiteral {
    /// Source spelling with quotes
    pub value: String,
    /// Byte length after unescaping
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharLiteral {
    pub value: String,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: NodeId,
    pub right: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unary {
    pub op: UnaryOp,
    pub expr: NodeId,
}

/// `cond ? then : els`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub cond: NodeId,
    pub then: NodeId,
    pub els_loc: Loc,
    pub els: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: NodeId,
    /// Argument expression as written (comma tree)
    pub raw_arguments: Option<NodeId>,
    /// Flattened view of `raw_arguments`
    pub arguments: Vec<NodeId>,
    pub end_loc: Loc,
}

/// Call whose callee is a type literal, as in `u8(x)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cast {
    /// The call as written; owns the callee and arguments
    pub call: NodeId,
    /// Target type, owned by the callee's type literal
    pub to: NodeId,
    pub arguments: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub target: NodeId,
    /// Ident node with usage `reference_member`
    pub member: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paren {
    pub expr: NodeId,
    pub end_loc: Loc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub expr: NodeId,
    pub index: NodeId,
    pub end_loc: Loc,
}

/// Range with optional bounds, `..` alone covers everything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub op: BinaryOp,
    pub start: Option<NodeId>,
    pub end: Option<NodeId>,
}

impl Range {
    /// Unbounded on both sides
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Comma-separated alternatives in a match arm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrCond {
    /// The comma expression the alternatives came from
    pub base: NodeId,
    pub conds: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLiteral {
    pub type_literal: NodeId,
    pub end_loc: Loc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal_radix() {
        let lit = |v: &str| IntLiteral {
            value: v.to_string(),
        };
        assert_eq!(lit("42").parse_u64(), Some(42));
        assert_eq!(lit("0x1F").parse_u64(), Some(31));
        assert_eq!(lit("0b101").parse_u64(), Some(5));
        assert_eq!(lit("0o17").parse_u64(), Some(15));
    }

    #[test]
    fn operator_classes() {
        assert!(BinaryOp::LessOrEq.is_comparison());
        assert!(!BinaryOp::LogicalAnd.is_comparison());
        assert!(BinaryOp::InAssign.is_defining_assign());
        assert!(!BinaryOp::Assign.is_defining_assign());
    }
}
