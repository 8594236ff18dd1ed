//! Resolver state, dispatch and declaration checks

use crate::compat::{are_compatible, flags};
use crate::scope;
use rc_diagnostics::ErrorKind;
use rc_registry::Registry;
use rc_tree::{
    CompilationContext, Decl, EnumDecl, IndexerDecl, NodeId, NodeKind, ParamDecl, PropertyDecl,
    Stmt, Token, Ty, VarDecl,
};

/// Walks the tree once, filling types and resolved-to links
///
/// Every node is checked at most once: [`TypeResolver::check`] sets the
/// node's `validated` flag before looking at it, so declarations can be
/// checked on demand from their first use and cycles terminate.
pub struct TypeResolver<'a> {
    pub(crate) ctx: &'a mut CompilationContext,
    pub(crate) registry: &'a Registry,
}

impl<'a> TypeResolver<'a> {
    /// Resolver over a registered tree
    pub fn new(ctx: &'a mut CompilationContext, registry: &'a Registry) -> Self {
        Self { ctx, registry }
    }

    /// Check the whole program
    pub fn run(&mut self) {
        let root = self.ctx.tree.root;
        self.check(root);
        tracing::debug!(
            errors = self.ctx.diagnostics.len(),
            "type resolution finished"
        );
    }

    /// Check one node and, through it, its subtree
    pub fn check(&mut self, id: NodeId) {
        if self.ctx.tree[id].validated {
            return;
        }
        self.ctx.tree[id].validated = true;
        let kind = self.ctx.tree[id].kind.clone();
        match kind {
            NodeKind::Decl(decl) => self.check_decl(id, decl),
            NodeKind::Stmt(stmt) => self.check_stmt(id, stmt),
            NodeKind::Expr(expr) => self.check_expr(id, expr),
        }
    }

    pub(crate) fn check_all(&mut self, ids: &[NodeId]) {
        for &id in ids {
            self.check(id);
        }
    }

    // Type helpers

    pub(crate) fn type_named(&self, token: Token) -> Option<Ty> {
        self.registry.find(token.name).map(Ty::Class)
    }

    pub(crate) fn compatible(&self, a: Ty, b: Ty) -> bool {
        are_compatible(&self.ctx.tree, a, b)
    }

    pub(crate) fn is_bool(&self, ty: Ty) -> bool {
        self.registry.builtins.boolean.map(Ty::Class) == Some(ty)
    }

    pub(crate) fn is_number(&self, ty: Ty) -> bool {
        ty.class()
            .is_some_and(|class| flags(&self.ctx.tree, class).is_number)
    }

    /// Give `id` a builtin type, or report that builtins are missing
    pub(crate) fn set_builtin(&mut self, id: NodeId, class: Option<NodeId>) {
        match class {
            Some(class) => self.ctx.tree[id].ty = Some(Ty::Class(class)),
            None => self.ctx.error(id, ErrorKind::UnknownType),
        }
    }

    // Declarations

    fn check_decl(&mut self, id: NodeId, decl: Decl) {
        match decl {
            Decl::Program { children } | Decl::Module { children, .. } => self.check_all(&children),
            Decl::Using { .. } => {}
            Decl::Class(class) => {
                // duplicates were rejected at registration
                if class.id.is_some() {
                    self.check_all(&class.members);
                }
            }
            Decl::Enum(decl) => self.check_enum(id, &decl),
            Decl::EnumMember { .. } => {
                if let Some(enumeration) = self.ctx.tree[id].parent {
                    self.check(enumeration);
                }
            }
            Decl::Function(func) => {
                self.check_all(&func.params);
                if let Some(body) = func.body {
                    self.check(body);
                    if func.is_arrow {
                        self.check_arrow(id, body);
                    }
                }
            }
            Decl::Parameter(param) => self.check_param(id, &param),
            Decl::Var(var) => self.check_var(id, &var),
            Decl::Property(prop) => self.check_property(id, &prop),
            Decl::Indexer(indexer) => self.check_indexer(id, &indexer),
            Decl::Extension { members } => self.check_all(&members),
        }
    }

    /// The expression of an arrow body must fit the declared return type
    fn check_arrow(&mut self, func: NodeId, body: NodeId) {
        let tree = &self.ctx.tree;
        let Some(expected) = tree.ty(func) else {
            return;
        };
        let value = match &tree[body].kind {
            NodeKind::Stmt(Stmt::Block { stmts }) => stmts
                .iter()
                .copied()
                .find(|&stmt| matches!(tree[stmt].kind, NodeKind::Expr(_))),
            _ => None,
        };
        let Some(found) = value.and_then(|value| tree.ty(value)) else {
            return;
        };
        if !self.compatible(expected, found) {
            self.ctx.error(func, ErrorKind::IncompatibleType);
        }
    }

    fn check_param(&mut self, id: NodeId, param: &ParamDecl) {
        if self.ctx.tree[id].ty.is_some() || param.is_variadic {
            return;
        }
        let Some(token) = param.type_ref else {
            self.ctx.error(id, ErrorKind::UndefinedType);
            return;
        };
        match self.type_named(token) {
            Some(ty) => self.ctx.tree[id].ty = Some(ty),
            None => self.ctx.error_at(token, ErrorKind::UnknownType),
        }
    }

    fn check_var(&mut self, id: NodeId, var: &VarDecl) {
        if scope::redeclared(&self.ctx.tree, id).is_some() {
            self.ctx.error(id, ErrorKind::NameAlreadyExists);
            return;
        }
        let declared = match var.type_ref {
            Some(token) => {
                let Some(ty) = self.type_named(token) else {
                    self.ctx.error_at(token, ErrorKind::UnknownType);
                    return;
                };
                self.ctx.tree[id].ty = Some(ty);
                Some(ty)
            }
            None => None,
        };
        let Some(init) = var.init else {
            if declared.is_none() {
                self.ctx.error(id, ErrorKind::UndefinedType);
            }
            return;
        };

        self.check(init);
        let Some(found) = self.ctx.tree.ty(init) else {
            return;
        };
        match declared {
            Some(declared) => {
                if !self.compatible(declared, found) {
                    self.ctx.error(init, ErrorKind::IncompatibleType);
                }
            }
            // `var x = null` names no type
            None if found == Ty::Null => self.ctx.error(id, ErrorKind::UndefinedType),
            None => self.ctx.tree[id].ty = Some(found),
        }
    }

    fn check_property(&mut self, id: NodeId, prop: &PropertyDecl) {
        let Some(ty) = self.type_named(prop.type_ref) else {
            self.ctx.error_at(prop.type_ref, ErrorKind::UnknownType);
            return;
        };
        self.ctx.tree[id].ty = Some(ty);
        if let Some(init) = prop.init {
            self.check(init);
            if let Some(found) = self.ctx.tree.ty(init) {
                if !self.compatible(ty, found) {
                    self.ctx.error(init, ErrorKind::IncompatibleType);
                }
            }
        }
        for func in prop.get_fn.into_iter().chain(prop.set_fn) {
            self.check(func);
        }
    }

    fn check_indexer(&mut self, id: NodeId, indexer: &IndexerDecl) {
        let Some(ty) = self.type_named(indexer.type_ref) else {
            self.ctx.error_at(indexer.type_ref, ErrorKind::UnknownType);
            return;
        };
        self.ctx.tree[id].ty = Some(ty);
        self.check(indexer.param);
        for func in indexer.get_fn.into_iter().chain(indexer.set_fn) {
            self.check(func);
        }
    }

    /// Settle the value type of an enum
    ///
    /// Members without a value count as `i32`. Only `i32` and `string`
    /// values are allowed and the first member decides; every disagreeing
    /// member is reported. The backing class then stands for the chosen
    /// primitive.
    fn check_enum(&mut self, id: NodeId, decl: &EnumDecl) {
        let i32 = self.registry.builtins.i32;
        let string = self.registry.builtins.string;
        let mut underlying: Option<NodeId> = None;

        for &member in &decl.members {
            self.ctx.tree[member].validated = true;
            let value = match &self.ctx.tree[member].kind {
                NodeKind::Decl(Decl::EnumMember { value }) => *value,
                _ => None,
            };
            let found = match value {
                Some(value) => {
                    self.check(value);
                    self.ctx.tree.ty(value).and_then(Ty::class)
                }
                None => i32,
            };
            let Some(found) = found else {
                continue;
            };
            if Some(found) != i32 && Some(found) != string {
                self.ctx.error(member, ErrorKind::IncompatibleType);
                continue;
            }
            match underlying {
                None => underlying = Some(found),
                Some(first) if first != found => self.ctx.error(member, ErrorKind::IncompatibleType),
                Some(_) => {}
            }
        }

        let Some(backing) = decl.backing else {
            return;
        };
        if let Some(underlying) = underlying {
            let real = self.ctx.tree[underlying].real.clone();
            let primitive = flags(&self.ctx.tree, underlying);
            self.ctx.tree[backing].real = real;
            if let Some(class) = self.ctx.tree.class_mut(backing) {
                class.flags.is_primitive = primitive.is_primitive;
                class.flags.is_number = primitive.is_number;
            }
        }
        if let NodeKind::Decl(Decl::Enum(decl)) = &mut self.ctx.tree[id].kind {
            decl.underlying = underlying;
        }
        for &member in &decl.members {
            self.ctx.tree[member].ty = Some(Ty::Class(backing));
        }
        tracing::trace!(name = self.ctx.tree.name(id), ?underlying, "enum settled");
    }
}
