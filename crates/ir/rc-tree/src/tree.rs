//! Arena-backed tree with parent links

use crate::node::{
    BinaryOp, ClassDecl, Decl, EnumDecl, Expr, FunctionDecl, Node, NodeId, NodeKind, Stmt, Token,
    Ty,
};
use rc_arena::Arena;
use rc_intern::{Interner, Symbol};
use rc_span::{FileId, FileSpan, Span};
use std::ops::{Index, IndexMut};

/// A compilation unit
///
/// Nodes are never freed: lowering replaces subtrees by re-pointing the
/// parent's child slot, leaving the old nodes unreachable from [`Tree::root`].
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Arena<Node>,
    /// Program node
    pub root: NodeId,
    interner: Interner,
    /// File new builder tokens are attributed to
    file: FileId,
    /// Next builder token offset
    cursor: u32,
}

impl Tree {
    /// Create a tree holding an empty program
    #[must_use]
    pub fn new(interner: Interner) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node {
            kind: NodeKind::Decl(Decl::Program {
                children: Vec::new(),
            }),
            token: Token {
                name: interner.intern("program"),
                span: FileSpan::SYNTHETIC,
            },
            parent: None,
            ty: None,
            real: String::new(),
            validated: false,
        });
        Self {
            nodes,
            root,
            interner,
            file: FileId::new(0),
            cursor: 0,
        }
    }

    /// String interner shared with the rest of the pipeline
    #[must_use]
    pub const fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Intern `text`
    pub fn sym(&self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    /// Text of a symbol
    pub fn text(&self, sym: Symbol) -> &str {
        self.interner.resolve(&sym)
    }

    /// Name of a node
    pub fn name(&self, id: NodeId) -> &str {
        self.interner.resolve(&self.nodes[id].token.name)
    }

    /// Number of allocated nodes, unreachable ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Switch the file subsequent builder tokens belong to
    pub fn set_file(&mut self, file: FileId) {
        self.file = file;
        self.cursor = 0;
    }

    /// Token for `text` at the next free position of the current file
    pub fn token(&mut self, text: &str) -> Token {
        let len = text.len() as u32;
        let span = FileSpan::new(self.file, Span::new(self.cursor, self.cursor + len));
        self.cursor += len + 1;
        Token {
            name: self.interner.intern(text),
            span,
        }
    }

    /// Token for compiler-generated nodes
    pub fn synthetic_token(&self, text: &str) -> Token {
        Token {
            name: self.interner.intern(text),
            span: FileSpan::SYNTHETIC,
        }
    }

    /// Allocate a node
    pub fn alloc(&mut self, kind: NodeKind, token: Token, parent: Option<NodeId>) -> NodeId {
        self.nodes.alloc(Node {
            kind,
            token,
            parent,
            ty: None,
            real: String::new(),
            validated: false,
        })
    }

    /// Set the parent link of `child`
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child].parent = Some(parent);
    }

    /// Resolved type of a node
    #[must_use]
    pub fn ty(&self, id: NodeId) -> Option<Ty> {
        self.nodes[id].ty
    }

    /// Class payload, if `id` is a class
    #[must_use]
    pub fn class(&self, id: NodeId) -> Option<&ClassDecl> {
        match &self.nodes[id].kind {
            NodeKind::Decl(Decl::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Mutable class payload, if `id` is a class
    pub fn class_mut(&mut self, id: NodeId) -> Option<&mut ClassDecl> {
        match &mut self.nodes[id].kind {
            NodeKind::Decl(Decl::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Enum payload, if `id` is an enum
    #[must_use]
    pub fn enumeration(&self, id: NodeId) -> Option<&EnumDecl> {
        match &self.nodes[id].kind {
            NodeKind::Decl(Decl::Enum(decl)) => Some(decl),
            _ => None,
        }
    }

    /// Function payload, if `id` is a function
    #[must_use]
    pub fn function(&self, id: NodeId) -> Option<&FunctionDecl> {
        match &self.nodes[id].kind {
            NodeKind::Decl(Decl::Function(func)) => Some(func),
            _ => None,
        }
    }

    /// Mutable function payload, if `id` is a function
    pub fn function_mut(&mut self, id: NodeId) -> Option<&mut FunctionDecl> {
        match &mut self.nodes[id].kind {
            NodeKind::Decl(Decl::Function(func)) => Some(func),
            _ => None,
        }
    }

    /// Expression payload, if `id` is an expression
    #[must_use]
    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        match &self.nodes[id].kind {
            NodeKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    /// Nearest strict ancestor matching `pred`
    pub fn find_parent(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut current = self.nodes[id].parent;
        while let Some(node) = current {
            if pred(&self.nodes[node].kind) {
                return Some(node);
            }
            current = self.nodes[node].parent;
        }
        None
    }

    /// Nearest enclosing class
    #[must_use]
    pub fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        self.find_parent(id, |kind| matches!(kind, NodeKind::Decl(Decl::Class(_))))
    }

    /// Nearest enclosing function
    #[must_use]
    pub fn enclosing_function(&self, id: NodeId) -> Option<NodeId> {
        self.find_parent(id, |kind| matches!(kind, NodeKind::Decl(Decl::Function(_))))
    }

    /// `class` followed by its base classes, nearest first
    ///
    /// Stops at the first repeated class, so a cyclic base chain still
    /// terminates.
    #[must_use]
    pub fn class_chain(&self, class: NodeId) -> Vec<NodeId> {
        let mut chain = vec![class];
        let mut current = self.class(class).and_then(|decl| decl.base);
        while let Some(base) = current {
            if chain.contains(&base) {
                break;
            }
            chain.push(base);
            current = self.class(base).and_then(|decl| decl.base);
        }
        chain
    }

    /// First member named `name` matching `pred`, searching `class` then its
    /// bases
    pub fn find_member(
        &self,
        class: NodeId,
        name: Symbol,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        self.class_chain(class).into_iter().find_map(|owner| {
            self.class(owner)?.members.iter().copied().find(|&member| {
                self.nodes[member].token.name == name && pred(&self.nodes[member].kind)
            })
        })
    }

    /// Assignment writing to `id`, with the number of levels between them
    ///
    /// `id` is written when it is the left operand of an assignment (depth
    /// 1), or the member side of a member access that is (depth 2).
    #[must_use]
    pub fn assignment_target(&self, id: NodeId) -> Option<(NodeId, u8)> {
        let parent = self.nodes[id].parent?;
        if self.is_assignment_to(parent, id) {
            return Some((parent, 1));
        }
        match &self.nodes[parent].kind {
            NodeKind::Expr(Expr::MemberAccess { member, .. }) if *member == id => {
                let assign = self.nodes[parent].parent?;
                self.is_assignment_to(assign, parent).then_some((assign, 2))
            }
            _ => None,
        }
    }

    /// Whether `id` sits in a getter or setter owned by `owner`
    ///
    /// Inside its own accessors a property name denotes the storage.
    #[must_use]
    pub fn within_accessor(&self, id: NodeId, owner: NodeId) -> bool {
        self.enclosing_function(id)
            .is_some_and(|func| self.nodes[func].parent == Some(owner))
    }

    fn is_assignment_to(&self, assign: NodeId, target: NodeId) -> bool {
        matches!(
            &self.nodes[assign].kind,
            NodeKind::Expr(Expr::Binary { op: BinaryOp::Assign, lhs, .. }) if *lhs == target
        )
    }

    /// Append `child` to the member or statement list of `parent`
    ///
    /// Returns `false` when `parent` holds no such list.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        let list = match &mut self.nodes[parent].kind {
            NodeKind::Decl(
                Decl::Program { children } | Decl::Module { children, .. },
            ) => children,
            NodeKind::Decl(Decl::Class(class)) => &mut class.members,
            NodeKind::Decl(Decl::Enum(decl)) => &mut decl.members,
            NodeKind::Decl(Decl::Extension { members }) => members,
            NodeKind::Stmt(Stmt::Block { stmts }) => stmts,
            _ => {
                tracing::warn!(?parent, "node cannot own declarations");
                return false;
            }
        };
        list.push(child);
        self.nodes[child].parent = Some(parent);
        true
    }

    /// Children in source order
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut push = |slot: Option<&NodeId>| out.extend(slot.copied());
        match &self.nodes[id].kind {
            NodeKind::Decl(decl) => match decl {
                Decl::Program { children } | Decl::Module { children, .. } => {
                    children.iter().for_each(|child| push(Some(child)));
                }
                Decl::Using { .. } => {}
                Decl::Class(class) => class.members.iter().for_each(|child| push(Some(child))),
                Decl::Enum(decl) => decl.members.iter().for_each(|child| push(Some(child))),
                Decl::EnumMember { value } => push(value.as_ref()),
                Decl::Function(func) => {
                    func.params.iter().for_each(|child| push(Some(child)));
                    push(func.body.as_ref());
                }
                Decl::Parameter(_) => {}
                Decl::Var(var) => push(var.init.as_ref()),
                Decl::Property(prop) => {
                    push(prop.init.as_ref());
                    push(prop.get_fn.as_ref());
                    push(prop.set_fn.as_ref());
                }
                Decl::Indexer(indexer) => {
                    push(Some(&indexer.param));
                    push(indexer.get_fn.as_ref());
                    push(indexer.set_fn.as_ref());
                }
                Decl::Extension { members } => members.iter().for_each(|child| push(Some(child))),
            },
            NodeKind::Stmt(stmt) => match stmt {
                Stmt::Block { stmts } => stmts.iter().for_each(|child| push(Some(child))),
                Stmt::Return { value } => push(value.as_ref()),
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    push(Some(cond));
                    push(Some(then_branch));
                    push(else_branch.as_ref());
                }
                Stmt::While { cond, body } => {
                    push(Some(cond));
                    push(Some(body));
                }
                Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                } => {
                    push(init.as_ref());
                    push(cond.as_ref());
                    push(step.as_ref());
                    push(Some(body));
                }
                Stmt::Switch {
                    scrutinee,
                    cases,
                    default,
                    ..
                } => {
                    push(Some(scrutinee));
                    cases.iter().for_each(|child| push(Some(child)));
                    push(default.as_ref());
                }
                Stmt::Case { values, body, .. } => {
                    values.iter().for_each(|child| push(Some(child)));
                    push(Some(body));
                }
                Stmt::Default { body, .. } => push(Some(body)),
                Stmt::Delete { targets } => targets.iter().for_each(|child| push(Some(child))),
                Stmt::Break | Stmt::Continue | Stmt::Label | Stmt::Goto => {}
            },
            NodeKind::Expr(expr) => match expr {
                Expr::Literal(_)
                | Expr::Identifier { .. }
                | Expr::SizeOf { .. }
                | Expr::TypeName
                | Expr::Base => {}
                Expr::MemberAccess { object, member } => {
                    push(Some(object));
                    push(Some(member));
                }
                Expr::Call { args, receiver, .. } => {
                    push(receiver.as_ref());
                    args.iter().for_each(|child| push(Some(child)));
                }
                Expr::Binary { lhs, rhs, .. } => {
                    push(Some(lhs));
                    push(Some(rhs));
                }
                Expr::Unary { operand, .. } => push(Some(operand)),
                Expr::Ternary {
                    cond,
                    then_expr,
                    else_expr,
                } => {
                    push(Some(cond));
                    push(Some(then_expr));
                    push(Some(else_expr));
                }
                Expr::Cast { expr, .. }
                | Expr::As { expr, .. }
                | Expr::TypeOf { expr }
                | Expr::Ref { expr }
                | Expr::Paren { expr } => push(Some(expr)),
                Expr::New { call } => push(Some(call)),
                Expr::Index { target, index, .. } => {
                    push(Some(target));
                    push(Some(index));
                }
            },
        }
        out
    }

    /// Re-point every child slot of `parent` holding `old` to `new`
    ///
    /// The caller is responsible for the parent link of `new`.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let swap = |slot: &mut NodeId| {
            if *slot == old {
                *slot = new;
            }
        };
        let swap_opt = |slot: &mut Option<NodeId>| {
            if *slot == Some(old) {
                *slot = Some(new);
            }
        };
        match &mut self.nodes[parent].kind {
            NodeKind::Decl(decl) => match decl {
                Decl::Program { children } | Decl::Module { children, .. } => {
                    children.iter_mut().for_each(swap);
                }
                Decl::Using { .. } | Decl::Parameter(_) => {}
                Decl::Class(class) => class.members.iter_mut().for_each(swap),
                Decl::Enum(decl) => decl.members.iter_mut().for_each(swap),
                Decl::EnumMember { value } => swap_opt(value),
                Decl::Function(func) => {
                    func.params.iter_mut().for_each(swap);
                    swap_opt(&mut func.body);
                }
                Decl::Var(var) => swap_opt(&mut var.init),
                Decl::Property(prop) => swap_opt(&mut prop.init),
                Decl::Indexer(_) => {}
                Decl::Extension { members } => members.iter_mut().for_each(swap),
            },
            NodeKind::Stmt(stmt) => match stmt {
                Stmt::Block { stmts } => stmts.iter_mut().for_each(swap),
                Stmt::Return { value } => swap_opt(value),
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    swap(cond);
                    swap(then_branch);
                    swap_opt(else_branch);
                }
                Stmt::While { cond, body } => {
                    swap(cond);
                    swap(body);
                }
                Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                } => {
                    swap_opt(init);
                    swap_opt(cond);
                    swap_opt(step);
                    swap(body);
                }
                Stmt::Switch {
                    scrutinee,
                    cases,
                    default,
                    ..
                } => {
                    swap(scrutinee);
                    cases.iter_mut().for_each(swap);
                    swap_opt(default);
                }
                Stmt::Case { values, body, .. } => {
                    values.iter_mut().for_each(swap);
                    swap(body);
                }
                Stmt::Default { body, .. } => swap(body),
                Stmt::Delete { targets } => targets.iter_mut().for_each(swap),
                Stmt::Break | Stmt::Continue | Stmt::Label | Stmt::Goto => {}
            },
            NodeKind::Expr(expr) => match expr {
                Expr::Literal(_)
                | Expr::Identifier { .. }
                | Expr::SizeOf { .. }
                | Expr::TypeName
                | Expr::Base => {}
                Expr::MemberAccess { object, member } => {
                    swap(object);
                    swap(member);
                }
                Expr::Call { args, receiver, .. } => {
                    swap_opt(receiver);
                    args.iter_mut().for_each(swap);
                }
                Expr::Binary { lhs, rhs, .. } => {
                    swap(lhs);
                    swap(rhs);
                }
                Expr::Unary { operand, .. } => swap(operand),
                Expr::Ternary {
                    cond,
                    then_expr,
                    else_expr,
                } => {
                    swap(cond);
                    swap(then_expr);
                    swap(else_expr);
                }
                Expr::Cast { expr, .. }
                | Expr::As { expr, .. }
                | Expr::TypeOf { expr }
                | Expr::Ref { expr }
                | Expr::Paren { expr } => swap(expr),
                Expr::New { call } => swap(call),
                Expr::Index { target, index, .. } => {
                    swap(target);
                    swap(index);
                }
            },
        }
    }

    /// All nodes reachable from `id`, pre-order, `id` first
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// Reachable nodes whose payload matches `pred`, in source order
    pub fn find_all(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| pred(&self.nodes[id].kind))
            .collect()
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }
}
