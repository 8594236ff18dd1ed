//! Lexical scopes
//!
//! Scopes are not materialized. A lookup walks the parent links from the
//! use site and asks every scope-introducing ancestor for a declaration of
//! the name. Block locals are visible only after their declaring statement.

use rc_intern::Symbol;
use rc_tree::{Decl, NodeId, NodeKind, Stmt, Tree};

/// Kind of scope a node introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Globals of every loaded module
    Program,
    /// Globals of one module
    Module,
    /// Function parameters
    Function,
    /// Locals of a block
    Block,
    /// Loop variable of a `for`
    For,
}

impl ScopeKind {
    /// Scope introduced by a node, if any
    #[must_use]
    pub const fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Decl(Decl::Program { .. }) => Some(Self::Program),
            NodeKind::Decl(Decl::Module { .. }) => Some(Self::Module),
            NodeKind::Decl(Decl::Function(_)) => Some(Self::Function),
            NodeKind::Stmt(Stmt::Block { .. }) => Some(Self::Block),
            NodeKind::Stmt(Stmt::For { .. }) => Some(Self::For),
            _ => None,
        }
    }
}

/// Nearest declaration of `name` visible from `site`
#[must_use]
pub fn lookup(tree: &Tree, site: NodeId, name: Symbol) -> Option<NodeId> {
    let mut child = site;
    let mut current = tree[site].parent;
    while let Some(scope) = current {
        if let Some(kind) = ScopeKind::of(&tree[scope].kind) {
            if let Some(found) = find_in(tree, scope, kind, child, name) {
                return Some(found);
            }
        }
        child = scope;
        current = tree[scope].parent;
    }
    None
}

/// Earlier declaration of the same local in the block declaring `var`
#[must_use]
pub fn redeclared(tree: &Tree, var: NodeId) -> Option<NodeId> {
    let block = tree[var].parent?;
    if ScopeKind::of(&tree[block].kind) != Some(ScopeKind::Block) {
        return None;
    }
    find_in(tree, block, ScopeKind::Block, var, tree[var].token.name)
}

fn find_in(
    tree: &Tree,
    scope: NodeId,
    kind: ScopeKind,
    child: NodeId,
    name: Symbol,
) -> Option<NodeId> {
    let is_var = |id: NodeId| {
        tree[id].token.name == name && matches!(tree[id].kind, NodeKind::Decl(Decl::Var(_)))
    };
    match (kind, &tree[scope].kind) {
        (ScopeKind::Block, NodeKind::Stmt(Stmt::Block { stmts })) => stmts
            .iter()
            .copied()
            .take_while(|&stmt| stmt != child)
            .filter(|&stmt| is_var(stmt))
            .last(),
        (ScopeKind::For, NodeKind::Stmt(Stmt::For { init, .. })) => init.filter(|&init| is_var(init)),
        (ScopeKind::Function, NodeKind::Decl(Decl::Function(func))) => func
            .params
            .iter()
            .copied()
            .find(|&param| tree[param].token.name == name),
        (ScopeKind::Module, NodeKind::Decl(Decl::Module { children, .. })) => {
            children.iter().copied().find(|&item| is_var(item))
        }
        (ScopeKind::Program, NodeKind::Decl(Decl::Program { children })) => {
            children.iter().copied().find_map(|item| match &tree[item].kind {
                NodeKind::Decl(Decl::Module { children, .. }) => {
                    children.iter().copied().find(|&global| is_var(global))
                }
                _ => is_var(item).then_some(item),
            })
        }
        _ => None,
    }
}
