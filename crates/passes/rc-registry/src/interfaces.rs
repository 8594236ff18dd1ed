//! Interface implementation checks

use crate::Registry;
use rc_diagnostics::ErrorKind;
use rc_tree::{CompilationContext, Decl, NodeId, NodeKind};

impl Registry {
    /// Check that every class implements the members of its interfaces
    ///
    /// A function member must be declared by the class itself under the
    /// mangled name it would have there; a method inherited from a base
    /// carries the base's name and does not count. A property is found by
    /// name on the class or any of its bases.
    pub fn validate_interfaces(&mut self, ctx: &mut CompilationContext) {
        let registered: Vec<NodeId> = self.classes.values().copied().collect();
        for class in registered {
            let interfaces = match ctx.tree.class(class) {
                Some(decl) if !decl.interfaces.is_empty() => decl.interfaces.clone(),
                _ => continue,
            };
            for interface in interfaces {
                let members = ctx
                    .tree
                    .class(interface)
                    .map(|decl| decl.members.clone())
                    .unwrap_or_default();
                for member in members {
                    self.check_interface_member(ctx, class, member);
                }
            }
        }
    }

    fn check_interface_member(&self, ctx: &mut CompilationContext, class: NodeId, member: NodeId) {
        let name = ctx.tree[member].token.name;
        let is_function = ctx.tree.function(member).is_some();
        let is_property = matches!(ctx.tree[member].kind, NodeKind::Decl(Decl::Property(_)));
        if is_function {
            let Some(suffix) = self.parameter_suffix(ctx, member) else {
                return;
            };
            let expected = format!("{}_{}{suffix}", ctx.tree.name(class), ctx.tree.text(name));
            let found = ctx.tree.class(class).is_some_and(|decl| {
                decl.members.iter().any(|&candidate| {
                    ctx.tree.function(candidate).is_some() && ctx.tree[candidate].real == expected
                })
            });
            if !found {
                let span = ctx.tree[class].token.span;
                ctx.diagnostics
                    .add_named_error(span, expected, ErrorKind::InterfaceMemberNotFound);
            }
        } else if is_property {
            let found = ctx.tree.find_member(class, name, |kind| {
                matches!(kind, NodeKind::Decl(Decl::Property(_)))
            });
            if found.is_none() {
                let span = ctx.tree[class].token.span;
                let text = ctx.tree.text(name).to_string();
                ctx.diagnostics
                    .add_named_error(span, text, ErrorKind::InterfaceMemberNotFound);
            }
        }
    }
}
