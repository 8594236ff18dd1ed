//! State threaded through the compiler phases

use crate::node::{ClassId, NodeId, Token};
use crate::tree::Tree;
use rc_diagnostics::{Diagnostics, ErrorKind};

/// Everything a compilation mutates: the tree, the diagnostics sink and
/// the identity counters
///
/// Phases take `&mut CompilationContext` instead of reaching for globals,
/// so independent compilations never share counters.
#[derive(Debug)]
pub struct CompilationContext {
    /// Tree being compiled
    pub tree: Tree,
    /// Collected errors
    pub diagnostics: Diagnostics,
    /// Next class identity to hand out
    next_class_id: u32,
}

impl CompilationContext {
    /// Wrap a freshly parsed tree
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            diagnostics: Diagnostics::new(),
            next_class_id: 0,
        }
    }

    /// Allocate the next class identity
    pub fn alloc_class_id(&mut self) -> ClassId {
        let id = ClassId(self.next_class_id);
        self.next_class_id += 1;
        id
    }

    /// Number of identities handed out so far
    #[must_use]
    pub const fn class_count(&self) -> u32 {
        self.next_class_id
    }

    /// Report `kind` at a token
    pub fn error_at(&mut self, token: Token, kind: ErrorKind) {
        let name = self.tree.text(token.name).to_string();
        self.diagnostics.add_named_error(token.span, name, kind);
    }

    /// Report `kind` at a node's token
    pub fn error(&mut self, node: NodeId, kind: ErrorKind) {
        let token = self.tree[node].token;
        self.error_at(token, kind);
    }

    /// Whether any phase reported an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}
