//! Type compatibility

use rc_tree::{ClassFlags, NodeId, Tree, Ty};

/// Whether values of types `a` and `b` may stand for each other
///
/// Classes match when they are the same node, when either is `any`, when
/// both are numeric, when they share a declared name, or when both are
/// native or both are not. `string` only takes part in that last rule with
/// itself. `null` matches `null` and every non-primitive class. The
/// relation is symmetric.
#[must_use]
pub fn are_compatible(tree: &Tree, a: Ty, b: Ty) -> bool {
    match (a, b) {
        (Ty::Null, Ty::Null) => true,
        (Ty::Null, Ty::Class(class)) | (Ty::Class(class), Ty::Null) => {
            !flags(tree, class).is_primitive
        }
        (Ty::Class(a), Ty::Class(b)) => {
            if a == b {
                return true;
            }
            let (left, right) = (flags(tree, a), flags(tree, b));
            left.is_any
                || right.is_any
                || (left.is_number && right.is_number)
                || tree[a].token.name == tree[b].token.name
                || (left.is_native == right.is_native
                    && !is_string(tree, a)
                    && !is_string(tree, b))
        }
    }
}

fn is_string(tree: &Tree, class: NodeId) -> bool {
    tree.name(class) == "string"
}

pub(crate) fn flags(tree: &Tree, class: NodeId) -> ClassFlags {
    tree.class(class).map(|decl| decl.flags).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_intern::Interner;
    use rc_registry::Registry;
    use rc_tree::CompilationContext;

    fn universe() -> (CompilationContext, Vec<Ty>) {
        let mut tree = Tree::new(Interner::new());
        let module = tree.add_module("main.run");
        tree.add_class(module, "Point");
        tree.add_class(module, "Line");
        tree.add_interface(module, "Shape");
        let color = tree.add_enum(module, "Color");
        tree.add_enum_member(color, "Red", None);
        let mut ctx = CompilationContext::new(tree);
        let registry = Registry::build(&mut ctx, true);
        let mut types: Vec<Ty> = registry.classes.values().copied().map(Ty::Class).collect();
        types.extend(registry.find(ctx.tree.sym("Color")).map(Ty::Class));
        types.push(Ty::Null);
        (ctx, types)
    }

    #[test]
    fn test_symmetric_over_all_pairs() {
        let (ctx, types) = universe();
        for &a in &types {
            for &b in &types {
                assert_eq!(
                    are_compatible(&ctx.tree, a, b),
                    are_compatible(&ctx.tree, b, a),
                    "{a:?} / {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_reflexive() {
        let (ctx, types) = universe();
        for &ty in &types {
            assert!(are_compatible(&ctx.tree, ty, ty));
        }
    }

    #[test]
    fn test_null_only_matches_non_primitive() {
        let (ctx, types) = universe();
        for &ty in &types {
            let expected = match ty {
                Ty::Null => true,
                Ty::Class(class) => !flags(&ctx.tree, class).is_primitive,
            };
            assert_eq!(are_compatible(&ctx.tree, Ty::Null, ty), expected);
        }
    }

    #[test]
    fn test_nominal_rules() {
        let mut tree = Tree::new(Interner::new());
        let module = tree.add_module("main.run");
        let point = tree.add_class(module, "Point");
        let line = tree.add_class(module, "Line");
        let mut ctx = CompilationContext::new(tree);
        let registry = Registry::build(&mut ctx, true);
        let class = |slot: Option<NodeId>| Ty::Class(slot.unwrap());
        let b = &registry.builtins;

        assert!(are_compatible(&ctx.tree, class(b.i32), class(b.f64)));
        assert!(are_compatible(&ctx.tree, class(b.byte), class(b.u32)));
        assert!(!are_compatible(&ctx.tree, class(b.i32), class(b.string)));
        assert!(are_compatible(&ctx.tree, class(b.boolean), class(b.i32)));
        assert!(are_compatible(&ctx.tree, class(b.pointer), class(b.character)));
        assert!(!are_compatible(&ctx.tree, class(b.string), class(b.pointer)));
        assert!(are_compatible(&ctx.tree, Ty::Class(point), Ty::Class(line)));
        assert!(!are_compatible(&ctx.tree, class(b.string), Ty::Class(point)));
        assert!(!are_compatible(&ctx.tree, class(b.i32), Ty::Class(point)));
        assert!(are_compatible(&ctx.tree, class(b.any), Ty::Class(point)));
        assert!(are_compatible(&ctx.tree, class(b.any), class(b.i32)));
        assert!(!are_compatible(&ctx.tree, Ty::Null, class(b.i32)));
        assert!(are_compatible(&ctx.tree, Ty::Null, class(b.string)));
    }
}
