//! Operator precedence layers, tightest first

use crate::ast::{BinaryOp, UnaryOp};

pub const UNARY_OPS: &[(&str, UnaryOp)] = &[("!", UnaryOp::Not), ("-", UnaryOp::MinusSign)];

/// Layer whose operators never chain (`a == b == c` is rejected)
pub const COMPARE_LAYER: usize = 2;
pub const COND_LAYER: usize = 5;
pub const RANGE_LAYER: usize = 6;
pub const ASSIGN_LAYER: usize = 7;
pub const COMMA_LAYER: usize = 8;

pub const BIN_LAYERS: [&[(&str, BinaryOp)]; 9] = [
    &[
        ("*", BinaryOp::Mul),
        ("/", BinaryOp::Div),
        ("%", BinaryOp::Mod),
        ("<<<", BinaryOp::LeftArithmeticShift),
        (">>>", BinaryOp::RightArithmeticShift),
        ("<<", BinaryOp::LeftLogicalShift),
        (">>", BinaryOp::RightLogicalShift),
        ("&", BinaryOp::BitAnd),
    ],
    &[
        ("+", BinaryOp::Add),
        ("-", BinaryOp::Sub),
        ("|", BinaryOp::BitOr),
        ("^", BinaryOp::BitXor),
    ],
    &[
        ("==", BinaryOp::Equal),
        ("!=", BinaryOp::NotEqual),
        ("<", BinaryOp::Less),
        ("<=", BinaryOp::LessOrEq),
        (">", BinaryOp::Greater),
        (">=", BinaryOp::GreaterOrEq),
    ],
    &[("&&", BinaryOp::LogicalAnd)],
    &[("||", BinaryOp::LogicalOr)],
    &[("?", BinaryOp::CondOp1)],
    &[
        ("..", BinaryOp::RangeExclusive),
        ("..=", BinaryOp::RangeInclusive),
    ],
    &[
        ("=", BinaryOp::Assign),
        (":=", BinaryOp::DefineAssign),
        ("::=", BinaryOp::ConstAssign),
        ("+=", BinaryOp::AddAssign),
        ("-=", BinaryOp::SubAssign),
        ("*=", BinaryOp::MulAssign),
        ("/=", BinaryOp::DivAssign),
        ("%=", BinaryOp::ModAssign),
        ("<<=", BinaryOp::LeftLogicalShiftAssign),
        (">>=", BinaryOp::RightLogicalShiftAssign),
        ("<<<=", BinaryOp::LeftArithmeticShiftAssign),
        (">>>=", BinaryOp::RightArithmeticShiftAssign),
        ("&=", BinaryOp::BitAndAssign),
        ("|=", BinaryOp::BitOrAssign),
        ("^=", BinaryOp::BitXorAssign),
    ],
    &[(",", BinaryOp::Comma)],
];

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_of(op: BinaryOp) -> Option<usize> {
        BIN_LAYERS
            .iter()
            .position(|layer| layer.iter().any(|&(_, o)| o == op))
    }

    #[test]
    fn special_layers_hold_their_operators() {
        assert_eq!(layer_of(BinaryOp::CondOp1), Some(COND_LAYER));
        assert_eq!(layer_of(BinaryOp::RangeInclusive), Some(RANGE_LAYER));
        assert_eq!(layer_of(BinaryOp::ConstAssign), Some(ASSIGN_LAYER));
        assert_eq!(layer_of(BinaryOp::Comma), Some(COMMA_LAYER));
        assert_eq!(layer_of(BinaryOp::Equal), Some(COMPARE_LAYER));
        assert_eq!(layer_of(BinaryOp::InAssign), None);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert!(layer_of(BinaryOp::Mul) < layer_of(BinaryOp::Add));
        assert!(layer_of(BinaryOp::LogicalAnd) < layer_of(BinaryOp::LogicalOr));
    }

    #[test]
    fn spellings_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for layer in BIN_LAYERS {
            for (text, _) in layer {
                assert!(seen.insert(*text), "duplicate operator {text}");
            }
        }
    }
}
