//! Symbol registration
//!
//! Builds the global class, enum and function tables from a parsed tree
//! before any type resolution runs.
//!
//! # Architecture
//!
//! Registration happens in a fixed order, each step error tolerant:
//!
//! 1. [`Registry::register_builtin_types`] prepends a module holding the
//!    primitive classes
//! 2. [`Registry::register_classes`] inserts `any`, then every class in
//!    source order, assigns identities, synthesizes default constructors and
//!    links bases and interfaces
//! 3. [`Registry::register_classes_arrays`] resolves array element types
//! 4. [`Registry::register_enums`] fills the enum table
//! 5. [`Registry::register_functions`] mangles and inserts every function,
//!    including property and indexer accessors
//! 6. [`Registry::validate_interfaces`] checks implementations
//!
//! A failing step reports one diagnostic and moves on to the next
//! declaration.

mod builtins;
mod classes;
mod functions;
mod interfaces;
mod mangle;

pub use builtins::{BUILTIN_TYPES, Builtins};
pub use mangle::VARIADIC_SUFFIX;

use indexmap::IndexMap;
use rc_intern::Symbol;
use rc_tree::{CompilationContext, NodeId};
use rustc_hash::FxHashMap;

/// Global symbol tables
///
/// Tables keep insertion order so the code generator emits declarations
/// deterministically.
#[derive(Debug, Default)]
pub struct Registry {
    /// Class name to class node
    pub classes: IndexMap<Symbol, NodeId>,
    /// Enum name to enum node
    pub enums: IndexMap<Symbol, NodeId>,
    /// Mangled name to function node
    pub functions: IndexMap<String, NodeId>,
    /// Well-known primitive classes
    pub builtins: Builtins,
    /// Enum name to its backing class
    enum_classes: FxHashMap<Symbol, NodeId>,
}

impl Registry {
    /// Create empty tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registration step over `ctx.tree`
    pub fn build(ctx: &mut CompilationContext, include_builtins: bool) -> Self {
        let mut registry = Self::new();
        if include_builtins {
            registry.register_builtin_types(ctx);
        }
        registry.register_classes(ctx);
        registry.register_classes_arrays(ctx);
        registry.register_enums(ctx);
        registry.register_functions(ctx);
        registry.validate_interfaces(ctx);
        tracing::debug!(
            classes = registry.classes.len(),
            enums = registry.enums.len(),
            functions = registry.functions.len(),
            "registry built"
        );
        registry
    }

    /// Class denoted by a type name: a class, else the backing class of an
    /// enum
    #[must_use]
    pub fn find(&self, name: Symbol) -> Option<NodeId> {
        self.classes
            .get(&name)
            .or_else(|| self.enum_classes.get(&name))
            .copied()
    }

    /// Function by mangled name
    #[must_use]
    pub fn function(&self, real: &str) -> Option<NodeId> {
        self.functions.get(real).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_diagnostics::ErrorKind;
    use rc_intern::Interner;
    use rc_tree::{Accessor, BinaryOp, ClassId, Decl, NodeKind, Tree, Ty};

    fn setup() -> (Tree, NodeId) {
        let mut tree = Tree::new(Interner::new());
        let module = tree.add_module("main.run");
        (tree, module)
    }

    fn build(tree: Tree) -> (CompilationContext, Registry) {
        let mut ctx = CompilationContext::new(tree);
        let registry = Registry::build(&mut ctx, true);
        (ctx, registry)
    }

    fn class_id(ctx: &CompilationContext, class: NodeId) -> u32 {
        ctx.tree
            .class(class)
            .and_then(|decl| decl.id)
            .map(|id| id.0)
            .unwrap_or(u32::MAX)
    }

    #[test]
    fn test_any_and_builtins_come_first() {
        let (tree, _) = setup();
        let (ctx, registry) = build(tree);

        let any = registry.builtins.any.unwrap();
        assert_eq!(ctx.tree.class(any).unwrap().id, Some(ClassId(0)));
        assert_eq!(ctx.tree[any].real, "void");
        for (name, native, ..) in BUILTIN_TYPES {
            let class = registry.find(ctx.tree.sym(name)).unwrap();
            assert_eq!(ctx.tree[class].real, native);
        }
        let string = registry.builtins.string.unwrap();
        assert!(!ctx.tree.class(string).unwrap().flags.is_primitive);
        let i32 = registry.builtins.i32.unwrap();
        assert!(ctx.tree.class(i32).unwrap().flags.is_number);
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_builtins_can_be_skipped() {
        let (mut tree, module) = setup();
        tree.add_class(module, "Foo");
        let mut ctx = CompilationContext::new(tree);
        let registry = Registry::build(&mut ctx, false);
        assert!(registry.builtins.i32.is_none());
        // any and Foo
        assert_eq!(registry.classes.len(), 2);
    }

    #[test]
    fn test_duplicate_class_keeps_first() {
        let (mut tree, module) = setup();
        let first = tree.add_class(module, "Foo");
        let second = tree.add_class(module, "Foo");
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.diagnostics.count(&ErrorKind::NameAlreadyExists), 1);
        assert_eq!(registry.find(ctx.tree.sym("Foo")), Some(first));
        assert!(ctx.tree.class(second).unwrap().id.is_none());
    }

    #[test]
    fn test_user_class_ids_follow_builtins() {
        let (mut tree, module) = setup();
        let point = tree.add_class(module, "Point");
        let line = tree.add_class(module, "Line");
        let (ctx, registry) = build(tree);

        let builtin_max = BUILTIN_TYPES
            .iter()
            .filter_map(|(name, ..)| registry.find(ctx.tree.sym(name)))
            .map(|class| class_id(&ctx, class))
            .max()
            .unwrap();
        assert!(class_id(&ctx, point) > builtin_max);
        assert_eq!(class_id(&ctx, line), class_id(&ctx, point) + 1);
    }

    #[test]
    fn test_constructor_mangling() {
        let (mut tree, module) = setup();
        let point = tree.add_class(module, "Point");
        tree.add_field(point, "x", Some("i32"), None);
        tree.add_field(point, "y", Some("i32"), None);
        let ctor = tree.add_constructor(point);
        tree.add_param(ctor, "x", Some("i32"));
        tree.add_param(ctor, "y", Some("i32"));
        let body = tree.block(Vec::new());
        tree.set_body(ctor, body);
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.tree[ctor].real, "Point_this_i32_i32");
        assert_eq!(registry.function("Point_this_i32_i32"), Some(ctor));
        assert_eq!(ctx.tree[ctor].ty, Some(Ty::Class(point)));
        assert!(ctx.tree.class(point).unwrap().default_ctor.is_none());
    }

    #[test]
    fn test_default_constructor() {
        let (mut tree, module) = setup();
        let foo = tree.add_class(module, "Foo");
        let shape = tree.add_interface(module, "Shape");
        let (ctx, _) = build(tree);

        let ctor = ctx.tree.class(foo).unwrap().default_ctor.unwrap();
        assert_eq!(ctx.tree[ctor].real, "Foo_this");
        assert_eq!(ctx.tree.name(ctor), "this");
        assert_eq!(ctx.tree[ctor].ty, Some(Ty::Class(foo)));
        assert_eq!(ctx.tree.enclosing_class(ctor), Some(foo));
        assert!(ctx.tree.class(shape).unwrap().default_ctor.is_none());
    }

    #[test]
    fn test_real_name_is_computed_once() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "Vec");
        let func = tree.add_function(class, "dot", Some("f64"));
        tree.add_param(func, "other", Some("Vec"));
        let (mut ctx, registry) = build(tree);

        assert_eq!(ctx.tree[func].real, "Vec_dot_Vec");
        assert!(registry.set_real_name(&mut ctx, func));
        assert_eq!(ctx.tree[func].real, "Vec_dot_Vec");
        assert_eq!(registry.function("Vec_dot_Vec"), Some(func));
    }

    #[test]
    fn test_operator_and_variadic_mangling() {
        let (mut tree, module) = setup();
        let vec = tree.add_class(module, "Vec");
        let op = tree.add_operator(vec, BinaryOp::Add, "Vec");
        tree.add_param(op, "other", Some("Vec"));
        let print = tree.add_native_function(module, "print", None, "printf");
        tree.add_param(print, "format", Some("string"));
        let rest = tree.add_param(print, "args", None);
        tree.param_mut(rest).unwrap().is_variadic = true;
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.tree[op].real, "Vec__operator_PLUS_Vec");
        assert_eq!(ctx.tree[print].real, "print_string_variadic");
        assert!(registry.function("print_string_variadic").is_some());
    }

    #[test]
    fn test_member_shorthand_parameter() {
        let (mut tree, module) = setup();
        let point = tree.add_class(module, "Point");
        tree.add_field(point, "x", Some("i32"), None);
        let ctor = tree.add_constructor(point);
        let param = tree.add_param(ctor, "x", None);
        tree.param_mut(param).unwrap().is_member = true;

        let free = tree.add_function(module, "set", None);
        let stray = tree.add_param(free, "x", None);
        tree.param_mut(stray).unwrap().is_member = true;
        let (ctx, _) = build(tree);

        assert_eq!(ctx.tree[ctor].real, "Point_this_i32");
        assert!(ctx.tree[param].ty.is_some());
        assert_eq!(ctx.diagnostics.count(&ErrorKind::OnlyInClassScope), 1);
    }

    #[test]
    fn test_unknown_base_and_return_type() {
        let (mut tree, module) = setup();
        let child = tree.add_class(module, "Child");
        tree.set_base(child, "Missing");
        let func = tree.add_function(module, "make", Some("Nope"));
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.diagnostics.count(&ErrorKind::UnknownType), 2);
        assert!(ctx.tree.class(child).unwrap().base.is_none());
        assert!(ctx.tree[func].real.is_empty());
        assert!(registry.function("make").is_none());
    }

    #[test]
    fn test_duplicate_function() {
        let (mut tree, module) = setup();
        tree.add_function(module, "run", None);
        tree.add_function(module, "run", None);
        let (ctx, registry) = build(tree);
        assert_eq!(ctx.diagnostics.count(&ErrorKind::NameAlreadyExists), 1);
        assert!(registry.function("run").is_some());
    }

    #[test]
    fn test_enum_registration() {
        let (mut tree, module) = setup();
        let color = tree.add_enum(module, "Color");
        let red = tree.add_enum_member(color, "Red", None);
        tree.add_class(module, "Shade");
        tree.add_enum(module, "Shade");
        let (ctx, registry) = build(tree);

        let backing = registry.find(ctx.tree.sym("Color")).unwrap();
        assert!(ctx.tree.class(backing).unwrap().flags.is_enum);
        assert_eq!(ctx.tree[backing].parent, Some(color));
        assert_eq!(ctx.tree[red].real, "Color_Red");
        assert_eq!(ctx.diagnostics.count(&ErrorKind::NameAlreadyExists), 1);
        assert!(!registry.enums.contains_key(&ctx.tree.sym("Shade")));
    }

    #[test]
    fn test_array_element_resolution() {
        let (mut tree, module) = setup();
        let ints = tree.add_class(module, "Ints");
        tree.set_array_of(ints, "i32");
        let bad = tree.add_class(module, "Bad");
        tree.set_array_of(bad, "Nope");
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.tree.class(ints).unwrap().element, registry.builtins.i32);
        assert_eq!(ctx.diagnostics.count(&ErrorKind::UnknownType), 1);
    }

    #[test]
    fn test_property_accessors() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "Box");
        let field = tree.ident("P");
        let ret = tree.ret(Some(field));
        let body = tree.block(vec![ret]);
        let prop = tree.add_property(class, "P", "i32", Accessor::Custom(body), Accessor::Default);
        tree.add_property(class, "Q", "i32", Accessor::Default, Accessor::Default);
        let (ctx, registry) = build(tree);

        let NodeKind::Decl(Decl::Property(decl)) = &ctx.tree[prop].kind else {
            panic!("not a property");
        };
        let get_fn = decl.get_fn.unwrap();
        let set_fn = decl.set_fn.unwrap();
        assert_eq!(ctx.tree[get_fn].real, "Box_P_get");
        assert_eq!(ctx.tree[set_fn].real, "Box_P_set_i32");
        assert_eq!(ctx.tree[get_fn].ty, registry.builtins.i32.map(Ty::Class));
        assert_eq!(ctx.tree.enclosing_class(set_fn), Some(class));
        assert!(registry.function("Box_Q_get").is_none());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_indexer_accessors() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "List");
        let value = tree.int(0);
        let ret = tree.ret(Some(value));
        let getter = tree.block(vec![ret]);
        let setter = tree.block(Vec::new());
        tree.add_indexer(
            class,
            ("i", "i32"),
            "f64",
            Accessor::Custom(getter),
            Accessor::Custom(setter),
        );
        let (ctx, registry) = build(tree);

        assert!(registry.function("List_this_get_i32").is_some());
        assert!(registry.function("List_this_set_i32_f64").is_some());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_extension_members_move() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "Text");
        let extension = tree.add_extension(module, "Text");
        let func = tree.add_function(extension, "shout", None);
        let orphan = tree.add_extension(module, "Missing");
        tree.add_function(orphan, "nothing", None);
        let (ctx, registry) = build(tree);

        assert_eq!(ctx.tree[func].parent, Some(class));
        assert_eq!(registry.function("Text_shout"), Some(func));
        assert_eq!(ctx.diagnostics.count(&ErrorKind::UnknownType), 1);
    }

    #[test]
    fn test_interface_members() {
        let (mut tree, module) = setup();
        let shape = tree.add_interface(module, "Shape");
        tree.add_function(shape, "area", Some("f64"));
        let square = tree.add_class(module, "Square");
        tree.add_implements(square, "Shape");
        tree.add_function(square, "area", Some("f64"));
        let circle = tree.add_class(module, "Circle");
        tree.add_implements(circle, "Shape");
        let (ctx, _) = build(tree);

        assert_eq!(ctx.tree.class(square).unwrap().interfaces, vec![shape]);
        assert_eq!(ctx.diagnostics.count(&ErrorKind::InterfaceMemberNotFound), 1);
        let diag = &ctx.diagnostics.errors()[0];
        assert_eq!(diag.name.as_deref(), Some("Circle_area"));
    }

    #[test]
    fn test_interface_property_found_on_base() {
        let (mut tree, module) = setup();
        let named = tree.add_interface(module, "Named");
        tree.add_property(named, "Name", "string", Accessor::Default, Accessor::Absent);
        let base = tree.add_class(module, "Base");
        tree.add_property(base, "Name", "string", Accessor::Default, Accessor::Default);
        let derived = tree.add_class(module, "Derived");
        tree.set_base(derived, "Base");
        tree.add_implements(derived, "Named");
        let (ctx, _) = build(tree);

        assert_eq!(ctx.tree.class(derived).unwrap().base, Some(base));
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_interface_method_not_inherited() {
        let (mut tree, module) = setup();
        let shape = tree.add_interface(module, "Shape");
        tree.add_function(shape, "area", Some("f64"));
        let base = tree.add_class(module, "Base");
        let inherited = tree.add_function(base, "area", Some("f64"));
        let derived = tree.add_class(module, "Derived");
        tree.set_base(derived, "Base");
        tree.add_implements(derived, "Shape");
        let (ctx, _) = build(tree);

        assert_eq!(ctx.tree[inherited].real, "Base_area");
        assert_eq!(ctx.diagnostics.count(&ErrorKind::InterfaceMemberNotFound), 1);
        let diag = &ctx.diagnostics.errors()[0];
        assert_eq!(diag.name.as_deref(), Some("Derived_area"));
    }
}
