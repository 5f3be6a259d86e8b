//! Identifiers and their two-phase resolution

use thiserror::Error;

use super::NodeId;
use crate::scope::ScopeId;

/// What an identifier occurrence means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentUsage {
    Unknown,
    BadIdent,
    Reference,
    DefineVariable,
    DefineConst,
    DefineField,
    DefineFormat,
    DefineState,
    DefineEnum,
    DefineEnumMember,
    DefineFn,
    DefineCastFn,
    DefineArg,
    ReferenceType,
    ReferenceMember,
    ReferenceMemberType,
    /// Named in type position; the type checker decides what it is
    MaybeType,
    ReferenceBuiltinFn,
}

impl IdentUsage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            IdentUsage::Unknown => "unknown",
            IdentUsage::BadIdent => "bad_ident",
            IdentUsage::Reference => "reference",
            IdentUsage::DefineVariable => "define_variable",
            IdentUsage::DefineConst => "define_const",
            IdentUsage::DefineField => "define_field",
            IdentUsage::DefineFormat => "define_format",
            IdentUsage::DefineState => "define_state",
            IdentUsage::DefineEnum => "define_enum",
            IdentUsage::DefineEnumMember => "define_enum_member",
            IdentUsage::DefineFn => "define_fn",
            IdentUsage::DefineCastFn => "define_cast_fn",
            IdentUsage::DefineArg => "define_arg",
            IdentUsage::ReferenceType => "reference_type",
            IdentUsage::ReferenceMember => "reference_member",
            IdentUsage::ReferenceMemberType => "reference_member_type",
            IdentUsage::MaybeType => "maybe_type",
            IdentUsage::ReferenceBuiltinFn => "reference_builtin_fn",
        }
    }

    /// Returns true for usages that introduce a name
    #[must_use]
    pub const fn is_definition(self) -> bool {
        matches!(
            self,
            IdentUsage::DefineVariable
                | IdentUsage::DefineConst
                | IdentUsage::DefineField
                | IdentUsage::DefineFormat
                | IdentUsage::DefineState
                | IdentUsage::DefineEnum
                | IdentUsage::DefineEnumMember
                | IdentUsage::DefineFn
                | IdentUsage::DefineCastFn
                | IdentUsage::DefineArg
        )
    }
}

impl std::fmt::Display for IdentUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("identifier `{0}` is already resolved")]
    AlreadyResolved(String),
}

/// An identifier occurrence
///
/// Starts out `Unresolved` and moves to `Resolved` at most once, when a
/// declaration or assignment classifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    Unresolved {
        name: String,
        scope: ScopeId,
    },
    Resolved {
        name: String,
        scope: ScopeId,
        usage: IdentUsage,
        /// Defining node (field, format, assignment, ...)
        definition: Option<NodeId>,
    },
}

impl Ident {
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ScopeId) -> Self {
        Ident::Unresolved {
            name: name.into(),
            scope,
        }
    }

    /// Create an identifier whose meaning is known at construction
    #[must_use]
    pub fn resolved(
        name: impl Into<String>,
        scope: ScopeId,
        usage: IdentUsage,
        definition: Option<NodeId>,
    ) -> Self {
        Ident::Resolved {
            name: name.into(),
            scope,
            usage,
            definition,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Ident::Unresolved { name, .. } | Ident::Resolved { name, .. } => name,
        }
    }

    #[must_use]
    pub fn scope(&self) -> ScopeId {
        match self {
            Ident::Unresolved { scope, .. } | Ident::Resolved { scope, .. } => *scope,
        }
    }

    #[must_use]
    pub fn usage(&self) -> IdentUsage {
        match self {
            Ident::Unresolved { .. } => IdentUsage::Unknown,
            Ident::Resolved { usage, .. } => *usage,
        }
    }

    #[must_use]
    pub fn definition(&self) -> Option<NodeId> {
        match self {
            Ident::Unresolved { .. } => None,
            Ident::Resolved { definition, .. } => *definition,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Ident::Resolved { .. })
    }

    /// Record the scope this identifier is declared in
    pub fn set_scope(&mut self, new_scope: ScopeId) {
        match self {
            Ident::Unresolved { scope, .. } | Ident::Resolved { scope, .. } => *scope = new_scope,
        }
    }

    /// Classify the identifier; fails if it was already classified
    pub fn resolve(
        &mut self,
        usage: IdentUsage,
        definition: Option<NodeId>,
    ) -> Result<(), ResolveError> {
        match self {
            Ident::Unresolved { name, scope } => {
                *self = Ident::Resolved {
                    name: std::mem::take(name),
                    scope: *scope,
                    usage,
                    definition,
                };
                Ok(())
            }
            Ident::Resolved { name, .. } => Err(ResolveError::AlreadyResolved(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_once() {
        let scope = ScopeId::ROOT;
        let mut ident = Ident::new("x", scope);
        assert_eq!(ident.usage(), IdentUsage::Unknown);
        ident.resolve(IdentUsage::DefineField, None).unwrap();
        assert_eq!(ident.name(), "x");
        assert_eq!(ident.usage(), IdentUsage::DefineField);
        assert_eq!(
            ident.resolve(IdentUsage::DefineConst, None),
            Err(ResolveError::AlreadyResolved("x".to_string()))
        );
        assert_eq!(ident.usage(), IdentUsage::DefineField);
    }

    #[test]
    fn definition_usages() {
        assert!(IdentUsage::DefineArg.is_definition());
        assert!(!IdentUsage::MaybeType.is_definition());
        assert!(!IdentUsage::Unknown.is_definition());
    }
}
