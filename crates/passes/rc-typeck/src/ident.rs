//! Identifier resolution

use crate::{TypeResolver, scope};
use rc_diagnostics::ErrorKind;
use rc_intern::Symbol;
use rc_tree::{Decl, Expr, NodeId, NodeKind, Ty};

fn is_value(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Decl(Decl::Var(_) | Decl::Property(_)))
}

impl TypeResolver<'_> {
    /// Resolve a name reference, first match wins:
    ///
    /// 1. `this`, the enclosing class
    /// 2. the member side of a member access, a member of the object's type
    /// 3. a member of the enclosing class or its bases
    /// 4. a local, parameter or global in lexical scope
    /// 5. a class or enum name
    pub(crate) fn resolve_identifier(&mut self, id: NodeId, from: Option<NodeId>) {
        if let Some(decl) = from {
            self.bind(id, decl);
            return;
        }
        let name = self.ctx.tree[id].token.name;

        if self.ctx.tree.text(name) == "this" {
            match self.ctx.tree.enclosing_class(id) {
                Some(class) => {
                    self.ctx.tree[id].ty = Some(Ty::Class(class));
                    self.set_from(id, class);
                }
                None => self.ctx.error(id, ErrorKind::UnknownName),
            }
            return;
        }

        if let Some(object) = self.member_object(id) {
            let Some(Ty::Class(class)) = self.ctx.tree.ty(object) else {
                return;
            };
            match self.type_member(class, name) {
                Some(decl) => self.bind_checked(id, decl),
                None => self.ctx.error(id, ErrorKind::UnknownName),
            }
            return;
        }

        let member = self
            .ctx
            .tree
            .enclosing_class(id)
            .and_then(|class| self.ctx.tree.find_member(class, name, is_value));
        if let Some(decl) = member.or_else(|| scope::lookup(&self.ctx.tree, id, name)) {
            self.bind_checked(id, decl);
            return;
        }

        if let Some(class) = self.registry.find(name) {
            self.ctx.tree[id].ty = Some(Ty::Class(class));
            return;
        }
        self.ctx.error(id, ErrorKind::UnknownName);
    }

    /// Object of the member access whose member side is `id`
    fn member_object(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.ctx.tree[id].parent?;
        match &self.ctx.tree[parent].kind {
            NodeKind::Expr(Expr::MemberAccess { object, member }) if *member == id => Some(*object),
            _ => None,
        }
    }

    /// Field, property or enum member named `name` of a class
    fn type_member(&self, class: NodeId, name: Symbol) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        let is_enum = tree.class(class).is_some_and(|decl| decl.flags.is_enum);
        if !is_enum {
            return tree.find_member(class, name, is_value);
        }
        let enumeration = tree[class].parent?;
        tree.enumeration(enumeration)?
            .members
            .iter()
            .copied()
            .find(|&member| tree[member].token.name == name)
    }

    /// Bind `id` to `decl` and check accessor availability of properties
    fn bind_checked(&mut self, id: NodeId, decl: NodeId) {
        self.bind(id, decl);
        let NodeKind::Decl(Decl::Property(prop)) = &self.ctx.tree[decl].kind else {
            return;
        };
        if prop.is_trivial() || self.ctx.tree.within_accessor(id, decl) {
            return;
        }
        let writes = self.ctx.tree.assignment_target(id).is_some();
        let missing = if writes {
            !prop.setter.is_declared()
        } else {
            !prop.getter.is_declared()
        };
        if missing {
            self.ctx.error(id, ErrorKind::InvalidExpression);
        }
    }

    /// Take the type of `decl`, checking it first
    fn bind(&mut self, id: NodeId, decl: NodeId) {
        self.check(decl);
        self.ctx.tree[id].ty = self.ctx.tree.ty(decl);
        if !self.ctx.tree[decl].real.is_empty() {
            self.ctx.tree[id].real = self.ctx.tree[decl].real.clone();
        }
        self.set_from(id, decl);
    }

    fn set_from(&mut self, id: NodeId, decl: NodeId) {
        if let NodeKind::Expr(Expr::Identifier { from, .. }) = &mut self.ctx.tree[id].kind {
            *from = Some(decl);
        }
    }
}
