//! Branching scope tree
//!
//! Scopes are linked three ways:
//! - `prev`: the lexically enclosing scope, followed by local lookups
//! - `branch`: the first scope opened for a conditional split
//! - `next`: where declarations continue once that branch has closed
//!
//! Declarations made after a branch therefore land in a fresh `next` scope
//! and stay invisible to lookups that start inside the earlier branch, and
//! sibling branches never see each other's declarations.

use crate::ast::NodeId;

/// Stable index of a scope in its [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The global root scope
    pub const ROOT: ScopeId = ScopeId(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// Identifier nodes in declaration order
    pub idents: Vec<NodeId>,
    pub prev: Option<ScopeId>,
    pub branch: Option<ScopeId>,
    pub next: Option<ScopeId>,
    pub is_global: bool,
    /// Node the scope was opened for (format, if, loop, ...)
    pub owner: Option<NodeId>,
}

/// Token returned by [`ScopeTree::enter_branch`]
///
/// Hand it back to [`ScopeTree::leave_branch`] to close the branch.
#[must_use = "a branch must be closed with ScopeTree::leave_branch"]
#[derive(Debug)]
pub struct BranchGuard {
    restore: ScopeId,
    entered: ScopeId,
}

impl BranchGuard {
    /// The scope the branch opened
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.entered
    }
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Tree holding only the global root
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                is_global: true,
                ..Scope::default()
            }],
            current: ScopeId::ROOT,
        }
    }

    #[must_use]
    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    #[must_use]
    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scope receiving declarations right now
    #[must_use]
    pub fn current(&self) -> ScopeId {
        self.current
    }

    #[allow(clippy::cast_possible_truncation)]
    fn alloc(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    /// Move past a closed branch into the scope that follows it
    fn advance(&mut self) {
        let cur = self.current;
        let Scope {
            branch,
            next,
            is_global,
            ..
        } = *self.get(cur);
        if branch.is_some() && next.is_none() {
            let next = self.alloc(Scope {
                prev: Some(cur),
                is_global,
                ..Scope::default()
            });
            self.scopes[cur.index()].next = Some(next);
            self.current = next;
        }
    }

    /// Open a branch of the current scope and make it current
    pub fn enter_branch(&mut self) -> BranchGuard {
        self.advance();
        let parent = self.current;
        let entered = self.alloc(Scope {
            prev: Some(parent),
            ..Scope::default()
        });
        self.scopes[parent.index()].branch = Some(entered);
        self.current = entered;
        log::trace!("enter {entered} from {parent}");
        BranchGuard {
            restore: parent,
            entered,
        }
    }

    /// Close a branch; later declarations go to the parent's `next` scope
    pub fn leave_branch(&mut self, guard: BranchGuard) {
        log::trace!("leave {}", guard.entered);
        self.current = guard.restore;
        self.advance();
    }

    pub fn set_owner(&mut self, scope: ScopeId, owner: NodeId) {
        self.scopes[scope.index()].owner = Some(owner);
    }

    /// Declare `ident` in the current scope
    pub fn push(&mut self, ident: NodeId) -> ScopeId {
        let cur = self.current;
        self.push_to(cur, ident);
        cur
    }

    pub fn push_to(&mut self, scope: ScopeId, ident: NodeId) {
        self.scopes[scope.index()].idents.push(ident);
    }

    pub fn remove(&mut self, scope: ScopeId, ident: NodeId) {
        self.scopes[scope.index()].idents.retain(|&i| i != ident);
    }

    /// Search `from` newest-first, then its `prev` chain up to and including
    /// the first global scope
    pub fn lookup_local(
        &self,
        from: ScopeId,
        exclude: Option<NodeId>,
        mut matches: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.get(id);
            let found = scope
                .idents
                .iter()
                .rev()
                .copied()
                .filter(|&i| Some(i) != exclude)
                .find(|&i| matches(i));
            if found.is_some() {
                return found;
            }
            if scope.is_global {
                break;
            }
            cursor = scope.prev;
        }
        None
    }

    /// Search the global chain from the root along `next` links
    pub fn lookup_global(
        &self,
        exclude: Option<NodeId>,
        mut matches: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut cursor = Some(self.root());
        while let Some(id) = cursor {
            let scope = self.get(id);
            if let Some(found) = scope
                .idents
                .iter()
                .copied()
                .filter(|&i| Some(i) != exclude)
                .find(|&i| matches(i))
            {
                return Some(found);
            }
            cursor = scope.next;
        }
        None
    }

    /// Nearest owner on the `prev` chain from `from` accepted by `pred`
    pub fn find_owner(
        &self,
        from: ScopeId,
        mut pred: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.get(id);
            if let Some(owner) = scope.owner.filter(|&o| pred(o)) {
                return Some(owner);
            }
            cursor = scope.prev;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, NodeKind};
    use crate::lexer::Loc;

    fn node(ast: &mut Ast) -> NodeId {
        ast.alloc(Loc::default(), NodeKind::VoidType)
    }

    #[test]
    fn root_is_global_without_prev() {
        let tree = ScopeTree::new();
        let root = tree.get(tree.root());
        assert!(root.is_global);
        assert!(root.prev.is_none());
    }

    #[test]
    fn sibling_branches_are_isolated() {
        let mut ast = Ast::new();
        let mut tree = ScopeTree::new();
        let outer = node(&mut ast);
        tree.push(outer);

        let first = tree.enter_branch();
        let first_scope = first.scope();
        let a = node(&mut ast);
        tree.push(a);
        tree.leave_branch(first);

        let second = tree.enter_branch();
        let second_scope = second.scope();
        tree.leave_branch(second);

        assert_eq!(tree.lookup_local(second_scope, None, |i| i == a), None);
        assert_eq!(tree.lookup_local(second_scope, None, |i| i == outer), Some(outer));
        assert_eq!(tree.lookup_local(first_scope, None, |i| i == a), Some(a));
    }

    #[test]
    fn later_declarations_invisible_to_earlier_branch() {
        let mut ast = Ast::new();
        let mut tree = ScopeTree::new();
        let guard = tree.enter_branch();
        let branch = guard.scope();
        tree.leave_branch(guard);

        let later = node(&mut ast);
        let landed = tree.push(later);
        assert_ne!(landed, tree.root());
        assert_eq!(tree.get(tree.root()).next, Some(landed));
        assert_eq!(tree.lookup_local(branch, None, |i| i == later), None);
        // forward lookups across the global chain still see it
        assert_eq!(tree.lookup_global(None, |i| i == later), Some(later));
    }

    #[test]
    fn branch_and_next_are_set_together_after_close() {
        let mut tree = ScopeTree::new();
        let guard = tree.enter_branch();
        tree.leave_branch(guard);
        let root = tree.get(tree.root());
        assert!(root.branch.is_some());
        assert!(root.next.is_some());
        assert!(tree.get(root.next.unwrap()).is_global);
    }

    #[test]
    fn local_lookup_stops_at_global_scope() {
        let mut ast = Ast::new();
        let mut tree = ScopeTree::new();
        let early = node(&mut ast);
        tree.push(early);
        let guard = tree.enter_branch();
        tree.leave_branch(guard);
        // now in the root's `next`, itself global
        let guard = tree.enter_branch();
        let inner = guard.scope();
        assert_eq!(tree.lookup_local(inner, None, |i| i == early), None);
        tree.leave_branch(guard);
    }

    #[test]
    fn exclude_skips_self() {
        let mut ast = Ast::new();
        let mut tree = ScopeTree::new();
        let x = node(&mut ast);
        tree.push(x);
        assert_eq!(tree.lookup_local(tree.root(), Some(x), |_| true), None);
    }
}
