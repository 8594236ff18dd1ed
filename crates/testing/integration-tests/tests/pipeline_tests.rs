//! Whole-pipeline tests over single-module programs

use expect_test::expect;
use integration_tests::{calls, class_named, main_body, messages};
use rc_diagnostics::ErrorKind;
use rc_driver::{Compilation, Pipeline};
use rc_intern::Interner;
use rc_registry::BUILTIN_TYPES;
use rc_tree::{Accessor, BinaryOp, Decl, Expr, NodeId, NodeKind, Tree, Ty};

fn setup() -> (Tree, NodeId) {
    let mut tree = Tree::new(Interner::new());
    let module = tree.add_module("main.run");
    (tree, module)
}

fn compile(tree: Tree) -> Compilation {
    Pipeline::default().compile_tree(tree)
}

fn class_id(compilation: &Compilation, class: NodeId) -> u32 {
    compilation
        .ctx
        .tree
        .class(class)
        .and_then(|decl| decl.id)
        .map_or(u32::MAX, |id| id.0)
}

#[test]
fn test_point_construction() {
    let (mut tree, module) = setup();
    let point = tree.add_class(module, "Point");
    tree.add_field(point, "x", Some("i32"), None);
    tree.add_field(point, "y", Some("i32"), None);
    let ctor = tree.add_constructor(point);
    tree.add_param(ctor, "x", Some("i32"));
    tree.add_param(ctor, "y", Some("i32"));
    let body = tree.block(Vec::new());
    tree.set_body(ctor, body);

    let one = tree.int(1);
    let two = tree.int(2);
    let new = tree.new_object("Point", vec![one, two]);
    let p = tree.local("p", None, Some(new));
    main_body(&mut tree, module, vec![p]);
    let compilation = compile(tree);

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    let NodeKind::Expr(Expr::New { call }) = compilation.ctx.tree[new].kind else {
        panic!("not a new expression");
    };
    assert_eq!(compilation.ctx.tree[call].real, "Point_this_i32_i32");
    assert_eq!(compilation.ctx.tree.ty(p), Some(Ty::Class(point)));

    let point_id = class_id(&compilation, point);
    for (name, ..) in BUILTIN_TYPES {
        let builtin = class_named(&compilation, name).unwrap();
        assert!(point_id > class_id(&compilation, builtin), "{name}");
    }
}

#[test]
fn test_duplicate_class_reported_once() {
    let (mut tree, module) = setup();
    let first = tree.add_class(module, "Foo");
    tree.add_class(module, "Foo");
    let compilation = compile(tree);

    assert!(!compilation.can_emit());
    assert_eq!(
        compilation.ctx.diagnostics.count(&ErrorKind::NameAlreadyExists),
        1
    );
    assert_eq!(class_named(&compilation, "Foo"), Some(first));
    expect![[r#"
        name already exists: `Foo`
    "#]]
    .assert_eq(&messages(&compilation));
}

#[test]
fn test_enum_mixing_value_kinds() {
    let (mut tree, module) = setup();
    let color = tree.add_enum(module, "Color");
    let one = tree.int(1);
    tree.add_enum_member(color, "Red", Some(one));
    let word = tree.string("green");
    tree.add_enum_member(color, "Green", Some(word));
    tree.add_enum_member(color, "Blue", None);
    let compilation = compile(tree);

    assert_eq!(
        compilation.ctx.diagnostics.count(&ErrorKind::IncompatibleType),
        1
    );
    let NodeKind::Decl(Decl::Enum(decl)) = &compilation.ctx.tree[color].kind else {
        panic!("not an enum");
    };
    assert_eq!(decl.underlying, compilation.registry.builtins.i32);
}

#[test]
fn test_property_round_trip() {
    let (mut tree, module) = setup();
    let class = tree.add_class(module, "Box");
    let five = tree.int(5);
    let ret = tree.ret(Some(five));
    let getter = tree.block(vec![ret]);
    tree.add_property(class, "P", "i32", Accessor::Custom(getter), Accessor::Default);

    let method = tree.add_function(class, "touch", None);
    let read = tree.ident("P");
    let a = tree.local("a", None, Some(read));
    let this = tree.this();
    let target = tree.ident("P");
    let access = tree.member(this, target);
    let seven = tree.int(7);
    let write = tree.assign(access, seven);
    let body = tree.block(vec![a, write]);
    tree.set_body(method, body);
    let compilation = compile(tree);

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    assert_eq!(compilation.rewrites, 2);
    assert_eq!(calls(&compilation.ctx), ["Box_P_get", "Box_P_set_i32"]);
}

#[test]
fn test_operator_overload_lowered() {
    let (mut tree, module) = setup();
    let vec = tree.add_class(module, "Vec");
    let op = tree.add_operator(vec, BinaryOp::Add, "Vec");
    tree.add_param(op, "other", Some("Vec"));
    let new = tree.new_object("Vec", Vec::new());
    let a = tree.local("a", None, Some(new));
    let lhs = tree.ident("a");
    let rhs = tree.ident("a");
    let sum = tree.binary(BinaryOp::Add, lhs, rhs);
    let b = tree.local("b", None, Some(sum));
    main_body(&mut tree, module, vec![a, b]);
    let compilation = compile(tree);

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    assert_eq!(calls(&compilation.ctx), ["Vec_this", "Vec__operator_PLUS_Vec"]);
    assert_eq!(compilation.ctx.tree.ty(b), Some(Ty::Class(vec)));
}

#[test]
fn test_exact_overload_preferred() {
    let (mut tree, module) = setup();
    for ty in ["f64", "i32"] {
        let func = tree.add_function(module, "show", None);
        tree.add_param(func, "value", Some(ty));
    }
    let int = tree.int(3);
    let call = tree.call("show", vec![int]);
    main_body(&mut tree, module, vec![call]);
    let compilation = compile(tree);

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    assert_eq!(compilation.ctx.tree[call].real, "show_i32");
}

#[test]
fn test_compatibility_is_symmetric() {
    let (mut tree, module) = setup();
    tree.add_class(module, "Point");
    tree.add_class(module, "Line");
    let compilation = compile(tree);
    let tree = &compilation.ctx.tree;

    let mut universe: Vec<Ty> = compilation
        .registry
        .classes
        .values()
        .copied()
        .map(Ty::Class)
        .collect();
    universe.push(Ty::Null);
    for &a in &universe {
        for &b in &universe {
            assert_eq!(
                rc_typeck::are_compatible(tree, a, b),
                rc_typeck::are_compatible(tree, b, a),
                "{a:?} {b:?}"
            );
        }
        if let Ty::Class(class) = a {
            let primitive = tree.class(class).unwrap().flags.is_primitive;
            assert_eq!(rc_typeck::are_compatible(tree, Ty::Null, a), !primitive);
        }
    }
}

#[test]
fn test_errors_do_not_stop_checking() {
    let (mut tree, module) = setup();
    let missing = tree.ident("missing");
    let first = tree.local("a", None, Some(missing));
    let word = tree.string("x");
    let second = tree.local("b", Some("i32"), Some(word));
    let call = tree.call("nowhere", Vec::new());
    main_body(&mut tree, module, vec![first, second, call]);
    let compilation = compile(tree);

    expect![[r#"
        unknown name: `missing`
        incompatible types: `x`
        unknown function name or wrong parameters: `nowhere`
    "#]]
    .assert_eq(&messages(&compilation));
}

#[test]
fn test_builtins_disabled() {
    let (mut tree, module) = setup();
    tree.add_class(module, "Foo");
    let options = rc_driver::CompileOptions {
        include_builtins: false,
        ..rc_driver::CompileOptions::default()
    };
    let compilation = Pipeline::new(options).compile_tree(tree);

    assert!(compilation.can_emit());
    assert!(class_named(&compilation, "i32").is_none());
    assert!(class_named(&compilation, "Foo").is_some());
}
