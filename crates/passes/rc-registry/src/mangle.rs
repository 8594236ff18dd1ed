//! Mangled names
//!
//! A mangled name encodes the owner and, for functions, the parameter type
//! sequence: `Point_this_i32_i32` is the `Point` constructor taking two
//! `i32`. Overload resolution looks functions up by these names.

use crate::Registry;
use rc_diagnostics::ErrorKind;
use rc_tree::{CompilationContext, Decl, FunctionKind, NodeId, NodeKind, Ty};

/// Suffix marking a variadic parameter
pub const VARIADIC_SUFFIX: &str = "_variadic";

impl Registry {
    /// Compute the mangled name of `node` once
    ///
    /// Returns `false` if the name could not be computed; a diagnostic has
    /// been reported and `real` stays empty.
    pub fn set_real_name(&self, ctx: &mut CompilationContext, node: NodeId) -> bool {
        if !ctx.tree[node].real.is_empty() {
            return true;
        }
        let tree = &ctx.tree;
        let function_kind = tree.function(node).map(|func| func.kind);
        let is_function = function_kind.is_some();
        let is_class = tree.class(node).is_some();

        let owner = if is_function {
            None
        } else {
            tree.enclosing_function(node)
        }
        .or_else(|| if is_class { None } else { tree.enclosing_class(node) });

        let mut real = String::new();
        if let Some(owner) = owner {
            real.push_str(tree.name(owner));
            real.push('_');
        }
        match function_kind {
            Some(FunctionKind::Operator(op)) => {
                real.push_str("_operator_");
                real.push_str(op.token_kind());
            }
            _ => real.push_str(tree.name(node)),
        }

        if is_function {
            let Some(suffix) = self.parameter_suffix(ctx, node) else {
                return false;
            };
            real.push_str(&suffix);
        }
        tracing::trace!(%real, "mangled");
        ctx.tree[node].real = real;
        true
    }

    /// `_<Type>` per parameter of `func`, in order
    ///
    /// Member-shorthand parameters take the type of the class field they
    /// bind to. Resolvable parameter types are stored on the parameter.
    pub(crate) fn parameter_suffix(
        &self,
        ctx: &mut CompilationContext,
        func: NodeId,
    ) -> Option<String> {
        let params = ctx.tree.function(func)?.params.clone();
        let class = ctx.tree.enclosing_class(func);
        let mut suffix = String::new();

        for param in params {
            let NodeKind::Decl(Decl::Parameter(decl)) = &ctx.tree[param].kind else {
                continue;
            };
            let mut decl = decl.clone();

            if decl.is_member && ctx.tree[param].ty.is_none() {
                let Some(class) = class else {
                    ctx.error(func, ErrorKind::OnlyInClassScope);
                    return None;
                };
                let name = ctx.tree[param].token.name;
                let field = ctx.tree.find_member(class, name, |kind| {
                    matches!(kind, NodeKind::Decl(Decl::Var(_) | Decl::Property(_)))
                });
                let Some(field) = field else {
                    ctx.error(param, ErrorKind::UnknownName);
                    return None;
                };
                let type_ref = match &ctx.tree[field].kind {
                    NodeKind::Decl(Decl::Var(var)) => var.type_ref,
                    NodeKind::Decl(Decl::Property(prop)) => Some(prop.type_ref),
                    _ => None,
                };
                let Some(type_ref) = type_ref else {
                    ctx.error(param, ErrorKind::UndefinedType);
                    return None;
                };
                decl.type_ref = Some(type_ref);
                if let Some(slot) = ctx.tree.param_mut(param) {
                    slot.type_ref = Some(type_ref);
                }
            } else {
                for constraint in &decl.constraints {
                    suffix.push('_');
                    suffix.push_str(ctx.tree.text(constraint.name));
                }
            }

            if decl.is_variadic {
                suffix.push_str(VARIADIC_SUFFIX);
            } else if let Some(type_ref) = decl.type_ref {
                if let Some(class) = self.find(type_ref.name) {
                    ctx.tree[param].ty = Some(Ty::Class(class));
                }
                suffix.push('_');
                suffix.push_str(ctx.tree.text(type_ref.name));
            }
        }
        Some(suffix)
    }
}
