//! Call resolution
//!
//! A call is first looked up by its mangled name in the function table.
//! When that misses, candidates are gathered in tiers and the first one
//! whose parameters accept the argument types wins:
//!
//! 1. variadic functions whose fixed prefix matches
//! 2. for a method call, methods of the receiver's class and its bases
//! 3. methods of the enclosing class and its bases
//! 4. constructors of the class being instantiated
//! 5. free functions of the same name

use crate::TypeResolver;
use crate::compat::are_compatible;
use rc_diagnostics::ErrorKind;
use rc_registry::VARIADIC_SUFFIX;
use rc_tree::{Decl, Expr, FunctionKind, NodeId, NodeKind, Tree, Ty};

impl TypeResolver<'_> {
    pub(crate) fn check_call(&mut self, call: NodeId, args: &[NodeId]) {
        self.check_all(args);
        let mut arg_types = Vec::with_capacity(args.len());
        for &arg in args {
            let Some(ty) = self.ctx.tree.ty(arg) else {
                self.ctx.error(arg, ErrorKind::UnknownType);
                return;
            };
            arg_types.push(ty);
        }

        let Some(func) = self.find_function(call, &arg_types) else {
            self.ctx
                .error(call, ErrorKind::UnknownFunctionNameOrWrongParameters);
            return;
        };
        self.ctx.tree[call].ty = self.ctx.tree.ty(func);
        self.ctx.tree[call].real = self.ctx.tree[func].real.clone();
        if let NodeKind::Expr(Expr::Call { function, .. }) = &mut self.ctx.tree[call].kind {
            *function = Some(func);
        }
    }

    fn find_function(&self, call: NodeId, args: &[Ty]) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        let mangled = self.mangled_call(call, args);
        if let Some(func) = self.registry.function(&mangled) {
            tracing::trace!(%mangled, "exact match");
            return Some(func);
        }

        let variadic = self.registry.functions.iter().find_map(|(real, &func)| {
            let stem = real.strip_suffix(VARIADIC_SUFFIX)?;
            (is_prefix(stem, &mangled) || is_prefix(&mangled, stem))
                .then_some(func)
                .filter(|&func| accepts(tree, func, args))
        });
        if variadic.is_some() {
            tracing::trace!(%mangled, "variadic match");
            return variadic;
        }

        let name = tree[call].token.name;
        let named = |func: NodeId| {
            tree.function(func).is_some() && tree[func].token.name == name
        };
        let in_classes = |class: NodeId| {
            tree.class_chain(class).into_iter().find_map(|owner| {
                tree.class(owner)?
                    .members
                    .iter()
                    .copied()
                    .find(|&member| named(member) && accepts(tree, member, args))
            })
        };

        let candidate = self
            .receiver_class(call)
            .and_then(&in_classes)
            .or_else(|| tree.enclosing_class(call).and_then(&in_classes))
            .or_else(|| self.constructor(call, args))
            .or_else(|| {
                self.registry.functions.values().copied().find(|&func| {
                    tree.enclosing_class(func).is_none() && named(func) && accepts(tree, func, args)
                })
            });
        if candidate.is_none() {
            tracing::trace!(%mangled, "no candidate");
        }
        candidate
    }

    /// Constructor of the class a `new` expression instantiates
    fn constructor(&self, call: NodeId, args: &[Ty]) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        let new = tree[call]
            .parent
            .filter(|&parent| matches!(tree[parent].kind, NodeKind::Expr(Expr::New { .. })))?;
        let class = self.registry.find(tree[new].token.name)?;
        tree.class(class)?.members.iter().copied().find(|&member| {
            tree.function(member)
                .is_some_and(|func| func.kind == FunctionKind::Constructor)
                && accepts(tree, member, args)
        })
    }

    /// Name the call would have if an exact overload existed
    fn mangled_call(&self, call: NodeId, args: &[Ty]) -> String {
        let tree = &self.ctx.tree;
        let mut mangled = String::new();
        if let Some(class) = self.receiver_class(call) {
            mangled.push_str(tree.name(class));
            mangled.push('_');
        }
        mangled.push_str(tree.name(call));
        let is_new = tree[call]
            .parent
            .is_some_and(|parent| matches!(tree[parent].kind, NodeKind::Expr(Expr::New { .. })));
        if is_new {
            mangled.push_str("_this");
        }
        for arg in args {
            mangled.push('_');
            match arg {
                Ty::Null => mangled.push_str("null"),
                Ty::Class(class) => mangled.push_str(tree.name(*class)),
            }
        }
        mangled
    }

    /// Class of the object a method call is made on
    fn receiver_class(&self, call: NodeId) -> Option<NodeId> {
        let tree = &self.ctx.tree;
        let parent = tree[call].parent?;
        match &tree[parent].kind {
            NodeKind::Expr(Expr::MemberAccess { object, member }) if *member == call => {
                tree.ty(*object)?.class()
            }
            _ => None,
        }
    }
}

/// `prefix` starts `name` and ends at a `_` boundary of it
fn is_prefix(prefix: &str, name: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
}

/// Whether `func` can be called with arguments of types `args`
///
/// A trailing variadic parameter takes any number of arguments, none
/// included.
fn accepts(tree: &Tree, func: NodeId, args: &[Ty]) -> bool {
    let Some(decl) = tree.function(func) else {
        return false;
    };
    let variadic = decl.params.last().is_some_and(|&param| {
        matches!(&tree[param].kind, NodeKind::Decl(Decl::Parameter(param)) if param.is_variadic)
    });
    let fixed = if variadic {
        &decl.params[..decl.params.len() - 1]
    } else {
        &decl.params[..]
    };
    if args.len() < fixed.len() || (!variadic && args.len() != fixed.len()) {
        return false;
    }
    fixed.iter().zip(args).all(|(&param, &arg)| {
        tree.ty(param)
            .is_some_and(|expected| are_compatible(tree, expected, arg))
    })
}
