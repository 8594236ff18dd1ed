//! Lowering of resolved sugar into plain calls
//!
//! Runs after type resolution and rewrites, in place:
//!
//! - reads of a property with accessors into a getter call on `this` or on
//!   the object left of the member access
//! - assignments to such a property into a setter call taking the assigned
//!   value
//! - indexer reads and assignments into getter and setter calls taking the
//!   index first
//! - binaries bound to an operator overload into a call of the operator
//!   with both operands
//!
//! Replaced nodes stay in the arena but are no longer reachable from the
//! root. Lowering reports nothing: nodes the resolver left untyped, and
//! sugar whose accessor is missing, are left as they are.

use rc_tree::{Decl, Expr, NodeId, NodeKind, Token, Tree, Ty};

/// Lower every reachable node of `tree`, returning the number of rewrites
///
/// Lowering an already lowered tree rewrites nothing.
pub fn lower(tree: &mut Tree) -> usize {
    let mut replacer = Replacer::new(tree);
    replacer.run();
    replacer.rewrites
}

/// In-place rewriter over one tree
pub struct Replacer<'a> {
    tree: &'a mut Tree,
    rewrites: usize,
}

impl<'a> Replacer<'a> {
    /// Rewriter over a resolved tree
    pub fn new(tree: &'a mut Tree) -> Self {
        Self { tree, rewrites: 0 }
    }

    /// Rewrite the whole tree
    ///
    /// Nodes are visited children first, so an operand is already lowered
    /// when the expression holding it is rewritten.
    pub fn run(&mut self) {
        let root = self.tree.root;
        let mut nodes = self.tree.descendants(root);
        nodes.reverse();
        for id in nodes {
            self.lower_node(id);
        }
        tracing::debug!(rewrites = self.rewrites, "lowering finished");
    }

    fn lower_node(&mut self, id: NodeId) {
        match self.tree[id].kind {
            NodeKind::Expr(Expr::Identifier {
                from: Some(decl),
                raw: false,
            }) => self.lower_property(id, decl),
            NodeKind::Expr(Expr::Binary {
                lhs,
                rhs,
                overload: Some(operator),
                ..
            }) => {
                let token = self.tree[id].token;
                let call = self.call(token, operator, None, vec![lhs, rhs]);
                self.replace(id, call);
            }
            NodeKind::Expr(Expr::Index {
                target,
                index,
                indexer: Some(indexer),
            }) => self.lower_index(id, target, index, indexer),
            _ => {}
        }
    }

    fn lower_property(&mut self, id: NodeId, decl: NodeId) {
        let NodeKind::Decl(Decl::Property(prop)) = &self.tree[decl].kind else {
            return;
        };
        if prop.is_trivial() || self.tree.within_accessor(id, decl) || self.tree.ty(id).is_none() {
            return;
        }
        let (get_fn, set_fn) = (prop.get_fn, prop.set_fn);
        let token = self.tree[id].token;
        let access = self.tree[id].parent.filter(|&parent| {
            matches!(
                self.tree[parent].kind,
                NodeKind::Expr(Expr::MemberAccess { member, .. }) if member == id
            )
        });
        let object = access.and_then(|access| match self.tree[access].kind {
            NodeKind::Expr(Expr::MemberAccess { object, .. }) => Some(object),
            _ => None,
        });

        if let Some((assign, _)) = self.tree.assignment_target(id) {
            let Some(setter) = set_fn else {
                tracing::warn!(property = self.tree.name(decl), "property has no setter");
                return;
            };
            let Some(value) = self.assigned_value(assign) else {
                return;
            };
            let Some(receiver) = object.or_else(|| self.this_for(id)) else {
                return;
            };
            let call = self.call(token, setter, Some(receiver), vec![value]);
            self.replace(assign, call);
            return;
        }

        let Some(getter) = get_fn else {
            tracing::warn!(property = self.tree.name(decl), "property has no getter");
            return;
        };
        let (receiver, replaced) = match (object, access) {
            (Some(object), Some(access)) => (object, access),
            _ => match self.this_for(id) {
                Some(this) => (this, id),
                None => return,
            },
        };
        let call = self.call(token, getter, Some(receiver), Vec::new());
        self.replace(replaced, call);
    }

    fn lower_index(&mut self, id: NodeId, target: NodeId, index: NodeId, indexer: NodeId) {
        let NodeKind::Decl(Decl::Indexer(decl)) = &self.tree[indexer].kind else {
            return;
        };
        if self.tree.ty(id).is_none() {
            return;
        }
        let (get_fn, set_fn) = (decl.get_fn, decl.set_fn);
        let token = self.tree[id].token;

        if let Some((assign, _)) = self.tree.assignment_target(id) {
            let (Some(setter), Some(value)) = (set_fn, self.assigned_value(assign)) else {
                tracing::warn!(?id, "indexer assignment left in place");
                return;
            };
            let call = self.call(token, setter, Some(target), vec![index, value]);
            self.replace(assign, call);
            return;
        }
        let Some(getter) = get_fn else {
            tracing::warn!(?id, "indexer has no getter");
            return;
        };
        let call = self.call(token, getter, Some(target), vec![index]);
        self.replace(id, call);
    }

    /// Right side of a typed assignment
    fn assigned_value(&self, assign: NodeId) -> Option<NodeId> {
        self.tree.ty(assign)?;
        match self.tree[assign].kind {
            NodeKind::Expr(Expr::Binary { rhs, .. }) => Some(rhs),
            _ => None,
        }
    }

    /// Fresh resolved `this` for a member used without an object
    fn this_for(&mut self, id: NodeId) -> Option<NodeId> {
        let Some(class) = self.tree.enclosing_class(id) else {
            tracing::warn!(?id, "member used outside of a class");
            return None;
        };
        let token = Token {
            span: self.tree[id].token.span,
            ..self.tree.synthetic_token("this")
        };
        let this = self.tree.alloc(
            NodeKind::Expr(Expr::Identifier {
                from: Some(class),
                raw: false,
            }),
            token,
            None,
        );
        self.tree[this].ty = Some(Ty::Class(class));
        self.tree[this].validated = true;
        Some(this)
    }

    /// Resolved call of `function`, adopting its receiver and arguments
    fn call(
        &mut self,
        token: Token,
        function: NodeId,
        receiver: Option<NodeId>,
        args: Vec<NodeId>,
    ) -> NodeId {
        let children: Vec<NodeId> = receiver.iter().chain(&args).copied().collect();
        let call = self.tree.alloc(
            NodeKind::Expr(Expr::Call {
                args,
                receiver,
                function: Some(function),
            }),
            token,
            None,
        );
        for child in children {
            self.tree.set_parent(child, call);
        }
        self.tree[call].ty = self.tree.ty(function);
        self.tree[call].real = self.tree[function].real.clone();
        self.tree[call].validated = true;
        call
    }

    /// Put `new` where `old` was
    fn replace(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.tree[old].parent else {
            tracing::warn!(?old, "replaced node has no parent");
            return;
        };
        self.tree.replace_child(parent, old, new);
        self.tree.set_parent(new, parent);
        self.rewrites += 1;
        tracing::debug!(call = %self.tree[new].real, "lowered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{Expect, expect};
    use rc_intern::Interner;
    use rc_registry::Registry;
    use rc_tree::{Accessor, BinaryOp, CompilationContext, Stmt};

    fn setup() -> (Tree, NodeId) {
        let mut tree = Tree::new(Interner::new());
        let module = tree.add_module("main.run");
        (tree, module)
    }

    fn resolve(tree: Tree) -> CompilationContext {
        let mut ctx = CompilationContext::new(tree);
        let registry = Registry::build(&mut ctx, true);
        rc_typeck::resolve(&mut ctx, &registry);
        ctx
    }

    fn body_of(tree: &Tree, func: NodeId) -> NodeId {
        tree.function(func).and_then(|func| func.body).unwrap()
    }

    /// One line per statement, calls spelled by their mangled name
    fn render(tree: &Tree, id: NodeId) -> String {
        match &tree[id].kind {
            NodeKind::Stmt(Stmt::Block { stmts }) => {
                let mut out = String::new();
                for &stmt in stmts {
                    out.push_str(&render(tree, stmt));
                    out.push('\n');
                }
                out
            }
            NodeKind::Stmt(Stmt::Return { value }) => match value {
                Some(value) => format!("return {}", render(tree, *value)),
                None => "return".to_string(),
            },
            NodeKind::Decl(Decl::Var(var)) => match var.init {
                Some(init) => format!("var {} = {}", tree.name(id), render(tree, init)),
                None => format!("var {}", tree.name(id)),
            },
            NodeKind::Expr(Expr::Call { args, receiver, .. }) => {
                let args: Vec<String> = receiver
                    .iter()
                    .chain(args)
                    .map(|&arg| render(tree, arg))
                    .collect();
                format!("{}({})", tree[id].real, args.join(", "))
            }
            NodeKind::Expr(Expr::Binary { op, lhs, rhs, .. }) => format!(
                "({} {} {})",
                render(tree, *lhs),
                op.symbol(),
                render(tree, *rhs)
            ),
            NodeKind::Expr(Expr::MemberAccess { object, member }) => {
                format!("{}.{}", render(tree, *object), render(tree, *member))
            }
            NodeKind::Expr(Expr::New { call }) => format!("new {}", render(tree, *call)),
            _ => tree.name(id).to_string(),
        }
    }

    fn check_lowered(ctx: &mut CompilationContext, func: NodeId, expect: &Expect) {
        lower(&mut ctx.tree);
        expect.assert_eq(&render(&ctx.tree, body_of(&ctx.tree, func)));
    }

    /// `class Box { i32 P { get { return 1; } set; } }`
    fn boxed(tree: &mut Tree, module: NodeId, setter: Accessor) -> NodeId {
        let class = tree.add_class(module, "Box");
        let one = tree.int(1);
        let ret = tree.ret(Some(one));
        let getter = tree.block(vec![ret]);
        tree.add_property(class, "P", "i32", Accessor::Custom(getter), setter);
        class
    }

    #[test]
    fn test_property_inside_class() {
        let (mut tree, module) = setup();
        let class = boxed(&mut tree, module, Accessor::Default);
        let method = tree.add_function(class, "touch", None);
        let read = tree.ident("P");
        let a = tree.local("a", None, Some(read));
        let this = tree.this();
        let target = tree.ident("P");
        let access = tree.member(this, target);
        let seven = tree.int(7);
        let write = tree.assign(access, seven);
        let target = tree.ident("P");
        let value = tree.ident("a");
        let bare_write = tree.assign(target, value);
        let body = tree.block(vec![a, write, bare_write]);
        tree.set_body(method, body);
        let mut ctx = resolve(tree);
        assert!(!ctx.has_errors(), "{}", ctx.diagnostics.render());

        check_lowered(
            &mut ctx,
            method,
            &expect![[r#"
                var a = Box_P_get(this)
                Box_P_set_i32(this, 7)
                Box_P_set_i32(this, a)
            "#]],
        );
    }

    #[test]
    fn test_property_through_object() {
        let (mut tree, module) = setup();
        boxed(&mut tree, module, Accessor::Default);
        let main = tree.add_function(module, "main", None);
        let new = tree.new_object("Box", Vec::new());
        let b = tree.local("b", None, Some(new));
        let object = tree.ident("b");
        let member = tree.ident("P");
        let read = tree.member(object, member);
        let v = tree.local("v", None, Some(read));
        let object = tree.ident("b");
        let member = tree.ident("P");
        let access = tree.member(object, member);
        let value = tree.ident("v");
        let write = tree.assign(access, value);
        let body = tree.block(vec![b, v, write]);
        tree.set_body(main, body);
        let mut ctx = resolve(tree);
        assert!(!ctx.has_errors(), "{}", ctx.diagnostics.render());

        check_lowered(
            &mut ctx,
            main,
            &expect![[r#"
                var b = new Box_this()
                var v = Box_P_get(b)
                Box_P_set_i32(b, v)
            "#]],
        );
    }

    #[test]
    fn test_operator_becomes_call() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "Vec");
        let op = tree.add_operator(class, BinaryOp::Add, "Vec");
        tree.add_param(op, "other", Some("Vec"));
        let main = tree.add_function(module, "main", None);
        let new = tree.new_object("Vec", Vec::new());
        let a = tree.local("a", None, Some(new));
        let lhs = tree.ident("a");
        let rhs = tree.ident("a");
        let sum = tree.binary(BinaryOp::Add, lhs, rhs);
        let c = tree.local("c", None, Some(sum));
        let body = tree.block(vec![a, c]);
        tree.set_body(main, body);
        let mut ctx = resolve(tree);
        assert!(!ctx.has_errors(), "{}", ctx.diagnostics.render());

        check_lowered(
            &mut ctx,
            main,
            &expect![[r#"
                var a = new Vec_this()
                var c = Vec__operator_PLUS_Vec(a, a)
            "#]],
        );
        assert_eq!(ctx.tree.ty(c), Some(Ty::Class(class)));
    }

    #[test]
    fn test_indexer_calls() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "List");
        let zero = tree.int(0);
        let ret = tree.ret(Some(zero));
        let getter = tree.block(vec![ret]);
        let setter = tree.block(Vec::new());
        tree.add_indexer(
            class,
            ("i", "i32"),
            "i32",
            Accessor::Custom(getter),
            Accessor::Custom(setter),
        );
        let main = tree.add_function(module, "main", None);
        let new = tree.new_object("List", Vec::new());
        let l = tree.local("l", None, Some(new));
        let target = tree.ident("l");
        let one = tree.int(1);
        let item = tree.index(target, one);
        let x = tree.local("x", None, Some(item));
        let target = tree.ident("l");
        let two = tree.int(2);
        let slot = tree.index(target, two);
        let value = tree.ident("x");
        let write = tree.assign(slot, value);
        let body = tree.block(vec![l, x, write]);
        tree.set_body(main, body);
        let mut ctx = resolve(tree);
        assert!(!ctx.has_errors(), "{}", ctx.diagnostics.render());

        check_lowered(
            &mut ctx,
            main,
            &expect![[r#"
                var l = new List_this()
                var x = List_this_get_i32(l, 1)
                List_this_set_i32_i32(l, 2, x)
            "#]],
        );
    }

    #[test]
    fn test_accessor_keeps_storage_access() {
        let (mut tree, module) = setup();
        let class = tree.add_class(module, "Counter");
        let own = tree.ident("N");
        let ret = tree.ret(Some(own));
        let getter = tree.block(vec![ret]);
        let prop = tree.add_property(class, "N", "i32", Accessor::Custom(getter), Accessor::Absent);
        let mut ctx = resolve(tree);
        assert!(!ctx.has_errors(), "{}", ctx.diagnostics.render());

        let get_fn = match &ctx.tree[prop].kind {
            NodeKind::Decl(Decl::Property(decl)) => decl.get_fn.unwrap(),
            _ => panic!("not a property"),
        };
        check_lowered(
            &mut ctx,
            get_fn,
            &expect![[r#"
                return N
            "#]],
        );
    }

    #[test]
    fn test_missing_setter_left_in_place() {
        let (mut tree, module) = setup();
        let class = boxed(&mut tree, module, Accessor::Absent);
        let method = tree.add_function(class, "touch", None);
        let this = tree.this();
        let target = tree.ident("P");
        let access = tree.member(this, target);
        let seven = tree.int(7);
        let write = tree.assign(access, seven);
        let body = tree.block(vec![write]);
        tree.set_body(method, body);
        let mut ctx = resolve(tree);
        assert!(ctx.has_errors());

        check_lowered(
            &mut ctx,
            method,
            &expect![[r#"
                (this.P = 7)
            "#]],
        );
    }

    #[test]
    fn test_lowering_is_idempotent() {
        let (mut tree, module) = setup();
        let class = boxed(&mut tree, module, Accessor::Default);
        let method = tree.add_function(class, "touch", None);
        let read = tree.ident("P");
        let one = tree.int(1);
        let sum = tree.binary(BinaryOp::Add, read, one);
        let target = tree.ident("P");
        let write = tree.assign(target, sum);
        let body = tree.block(vec![write]);
        tree.set_body(method, body);
        let mut ctx = resolve(tree);

        let first = lower(&mut ctx.tree);
        let once = render(&ctx.tree, body_of(&ctx.tree, method));
        assert_eq!(lower(&mut ctx.tree), 0);
        assert!(first >= 2);
        assert_eq!(render(&ctx.tree, body_of(&ctx.tree, method)), once);
        expect![[r#"
            Box_P_set_i32(this, (Box_P_get(this) + 1))
        "#]]
        .assert_eq(&once);
    }
}
