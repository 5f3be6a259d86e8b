//! Type nodes, including the union types synthesized from branches

use super::NodeId;
use crate::lexer::Loc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    #[default]
    Unspec,
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntType {
    pub bit_size: u8,
    pub endian: Endian,
    pub is_signed: bool,
}

impl IntType {
    /// Decode names such as `u8`, `s16`, `ub32`, `sl64` and `b3`
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let (rest, is_signed, endian) = if let Some(r) = name.strip_prefix("ub") {
            (r, false, Endian::Big)
        } else if let Some(r) = name.strip_prefix("ul") {
            (r, false, Endian::Little)
        } else if let Some(r) = name.strip_prefix("sb") {
            (r, true, Endian::Big)
        } else if let Some(r) = name.strip_prefix("sl") {
            (r, true, Endian::Little)
        } else if let Some(r) = name.strip_prefix('u') {
            (r, false, Endian::Unspec)
        } else if let Some(r) = name.strip_prefix('s') {
            (r, true, Endian::Unspec)
        } else if let Some(r) = name.strip_prefix('b') {
            (r, false, Endian::Unspec)
        } else {
            return None;
        };
        let bit_size = parse_bit_size(rest)?;
        (1..=64).contains(&bit_size).then_some(Self {
            bit_size,
            endian,
            is_signed,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatType {
    pub bit_size: u8,
    pub endian: Endian,
}

impl FloatType {
    /// Decode `f16`, `f32`, `f64` and their `fb`/`fl` forms
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let (rest, endian) = if let Some(r) = name.strip_prefix("fb") {
            (r, Endian::Big)
        } else if let Some(r) = name.strip_prefix("fl") {
            (r, Endian::Little)
        } else {
            (name.strip_prefix('f')?, Endian::Unspec)
        };
        let bit_size = parse_bit_size(rest)?;
        matches!(bit_size, 16 | 32 | 64).then_some(Self { bit_size, endian })
    }
}

fn parse_bit_size(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Names that denote a built-in type when used as an identifier
#[must_use]
pub fn is_primitive_type_name(name: &str) -> bool {
    name == "void"
        || name == "bool"
        || IntType::from_name(name).is_some()
        || FloatType::from_name(name).is_some()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentType {
    /// Type name; the member of `import_ref` when that is present
    pub ident: NodeId,
    /// `module.Type` access when the type comes from an import
    pub import_ref: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub length: Option<NodeId>,
    pub end_loc: Loc,
    pub element_type: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub parameters: Vec<NodeId>,
    pub return_type: Option<NodeId>,
}

/// Ordered field list of a format, block, program or match arm
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructType {
    /// Members in declaration order; not owned
    pub fields: Vec<NodeId>,
    /// Node owning the block this struct describes
    pub base: Option<NodeId>,
}

/// One struct per mutually exclusive branch of an `if` or `match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructUnionType {
    /// Match subject, absent for `if` chains
    pub cond: Option<NodeId>,
    /// Branch conditions, parallel to `structs`
    pub conds: Vec<NodeId>,
    pub structs: Vec<NodeId>,
    /// Synthesized fields, one per field name seen in any branch
    pub union_fields: Vec<NodeId>,
    /// Every candidate allocated for `union_fields`, absent placeholders included
    pub candidate_pool: Vec<NodeId>,
    pub exhaustive: bool,
    pub base: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub cond: Option<NodeId>,
    /// Aligned with the owning struct union's `conds`; owned by its `candidate_pool`
    pub candidates: Vec<NodeId>,
    pub base_type: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCandidate {
    pub cond: NodeId,
    /// `None` when the field does not exist under `cond`
    pub field: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub base: NodeId,
}
