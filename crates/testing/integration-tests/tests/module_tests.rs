//! Multi-file tests
//!
//! Projects are written to a temporary directory and loaded through the
//! driver, following `using` imports from the entry file.

use expect_test::expect;
use integration_tests::{Project, class_named, main_body, messages};
use rc_diagnostics::ErrorKind;
use rc_driver::CompileOptions;
use rc_tree::{NodeId, Tree, Ty};

/// `class Point { i32 x; i32 y; }`
fn shapes(tree: &mut Tree, module: NodeId) {
    let point = tree.add_class(module, "Point");
    tree.add_field(point, "x", Some("i32"), None);
    tree.add_field(point, "y", Some("i32"), None);
}

/// `using shapes; main() { var p = new Point(); var x = p.x; }`
fn uses_shapes(tree: &mut Tree, module: NodeId) {
    tree.add_using(module, "shapes");
    let new = tree.new_object("Point", Vec::new());
    let p = tree.local("p", None, Some(new));
    let object = tree.ident("p");
    let member = tree.ident("x");
    let access = tree.member(object, member);
    let x = tree.local("x", None, Some(access));
    main_body(tree, module, vec![p, x]);
}

fn module_names(compilation: &rc_driver::Compilation) -> Vec<String> {
    let tree = &compilation.ctx.tree;
    tree.children(tree.root)
        .into_iter()
        .map(|module| tree.name(module).to_string())
        .collect()
}

#[test]
fn test_imported_class_resolves() {
    let project = Project::new()
        .unwrap()
        .file("shapes.run", shapes)
        .unwrap()
        .file("main.run", uses_shapes)
        .unwrap();
    let compilation = project.compile("main.run").unwrap();

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    assert_eq!(compilation.files.len(), 2);
    let names = module_names(&compilation);
    let shapes_at = names.iter().position(|name| name == "shapes").unwrap();
    let main_at = names.iter().position(|name| name == "main").unwrap();
    assert!(shapes_at < main_at, "{names:?}");
    assert!(class_named(&compilation, "Point").is_some());
}

#[test]
fn test_shared_import_loaded_once() {
    fn left(tree: &mut Tree, module: NodeId) {
        tree.add_using(module, "Shapes");
        tree.add_class(module, "Left");
    }
    fn right(tree: &mut Tree, module: NodeId) {
        tree.add_using(module, "shapes");
        tree.add_class(module, "Right");
    }
    fn main(tree: &mut Tree, module: NodeId) {
        tree.add_using(module, "left");
        tree.add_using(module, "right");
        tree.add_using(module, "main");
    }
    let project = Project::new()
        .unwrap()
        .file("shapes.run", shapes)
        .unwrap()
        .file("left.run", left)
        .unwrap()
        .file("right.run", right)
        .unwrap()
        .file("main.run", main)
        .unwrap();
    let compilation = project.compile("main.run").unwrap();

    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
    assert_eq!(compilation.files.len(), 4);
    let copies = module_names(&compilation)
        .into_iter()
        .filter(|name| name == "shapes")
        .count();
    assert_eq!(copies, 1);
}

#[test]
fn test_missing_import_is_local() {
    fn main(tree: &mut Tree, module: NodeId) {
        tree.add_using(module, "nope");
        uses_shapes(tree, module);
    }
    let project = Project::new()
        .unwrap()
        .file("shapes.run", shapes)
        .unwrap()
        .file("main.run", main)
        .unwrap();
    let compilation = project.compile("main.run").unwrap();

    assert!(!compilation.can_emit());
    expect![[r#"
        path not found: 'nope.run': `nope`
    "#]]
    .assert_eq(&messages(&compilation));
    assert!(class_named(&compilation, "Point").is_some());
}

#[test]
fn test_duplicate_across_modules() {
    fn main(tree: &mut Tree, module: NodeId) {
        tree.add_using(module, "shapes");
        tree.add_class(module, "Point");
    }
    let project = Project::new()
        .unwrap()
        .file("shapes.run", shapes)
        .unwrap()
        .file("main.run", main)
        .unwrap();
    let compilation = project.compile("main.run").unwrap();

    assert_eq!(
        compilation.ctx.diagnostics.count(&ErrorKind::NameAlreadyExists),
        1
    );
    // the imported module registers first
    let point = class_named(&compilation, "Point").unwrap();
    let tree = &compilation.ctx.tree;
    let owner = tree[point].parent.unwrap();
    assert_eq!(tree.name(owner), "shapes");
}

#[test]
fn test_search_path() {
    let project = Project::new()
        .unwrap()
        .file("lib/shapes.run", shapes)
        .unwrap()
        .file("main.run", uses_shapes)
        .unwrap();

    let compilation = project.compile("main.run").unwrap();
    assert_eq!(
        compilation.ctx.diagnostics.count(&ErrorKind::PathNotFound {
            path: "shapes.run".to_string()
        }),
        1
    );

    let options = CompileOptions {
        search_paths: vec![project.path("lib")],
        ..CompileOptions::default()
    };
    let compilation = project.compile_with("main.run", options).unwrap();
    assert!(compilation.can_emit(), "{}", compilation.render_diagnostics());
}

#[test]
fn test_imported_field_type() {
    let project = Project::new()
        .unwrap()
        .file("shapes.run", shapes)
        .unwrap()
        .file("main.run", uses_shapes)
        .unwrap();
    let compilation = project.compile("main.run").unwrap();

    let tree = &compilation.ctx.tree;
    let x = tree
        .find_all(|_| true)
        .into_iter()
        .rev()
        .find(|&id| tree.name(id) == "x")
        .unwrap();
    assert_eq!(
        tree.ty(x),
        compilation.registry.builtins.i32.map(Ty::Class)
    );
}

#[test]
fn test_host_errors() {
    let project = Project::new()
        .unwrap()
        .file("main.run", uses_shapes)
        .unwrap();
    let err = project.compile("other.run").unwrap_err();
    assert!(err.to_string().contains("other.run"), "{err}");

    std::fs::write(project.path("shapes.run"), "").unwrap();
    let err = project.compile("main.run").unwrap_err();
    assert!(
        format!("{err:#}").contains("no builder for module `shapes`"),
        "{err:#}"
    );
}
