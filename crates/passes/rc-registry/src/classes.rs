//! Class, array and enum registration

use crate::Registry;
use rc_diagnostics::ErrorKind;
use rc_tree::{
    ClassDecl, ClassKind, CompilationContext, Decl, FunctionDecl, FunctionKind, NodeId, NodeKind,
    Ty,
};

fn is_class(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Decl(Decl::Class(_)))
}

impl Registry {
    /// Insert `any`, then every class in source order
    ///
    /// A second pass links base classes and interfaces once every name is
    /// known.
    pub fn register_classes(&mut self, ctx: &mut CompilationContext) {
        let any = self.register_any(ctx);
        tracing::debug!(?any, "registered any");

        for class in ctx.tree.find_all(is_class) {
            let name = ctx.tree[class].token.name;
            if self.classes.contains_key(&name) {
                ctx.error(class, ErrorKind::NameAlreadyExists);
                continue;
            }
            self.classes.insert(name, class);

            let id = ctx.alloc_class_id();
            if let Some(decl) = ctx.tree.class_mut(class) {
                decl.id = Some(id);
            }
            ctx.tree[class].ty = Some(Ty::Class(class));
            self.set_real_name(ctx, class);
            self.builtins.capture(ctx.tree.text(name), class);
            self.add_default_constructor(ctx, class);
            tracing::debug!(class = ctx.tree.text(name), id = id.0, "registered class");
        }

        let registered: Vec<NodeId> = self.classes.values().copied().collect();
        for class in registered {
            self.link_base(ctx, class);
            self.link_interfaces(ctx, class);
        }
    }

    fn register_any(&mut self, ctx: &mut CompilationContext) -> NodeId {
        let mut decl = ClassDecl::new(ClassKind::Class);
        decl.flags.is_native = true;
        decl.flags.is_any = true;
        decl.native_name = Some("void".to_string());
        decl.id = Some(ctx.alloc_class_id());

        let token = ctx.tree.synthetic_token("any");
        let root = ctx.tree.root;
        // Owned by the program but not listed among its children, so source
        // order traversals never see it.
        let any = ctx
            .tree
            .alloc(NodeKind::Decl(Decl::Class(decl)), token, Some(root));
        ctx.tree[any].ty = Some(Ty::Class(any));
        ctx.tree[any].real = "void".to_string();
        self.classes.insert(token.name, any);
        self.builtins.any = Some(any);
        any
    }

    /// Give a class without constructors a no-argument one
    fn add_default_constructor(&mut self, ctx: &mut CompilationContext, class: NodeId) {
        let Some(decl) = ctx.tree.class(class) else {
            return;
        };
        if decl.is_interface() {
            return;
        }
        let has_constructor = decl.members.iter().any(|&member| {
            ctx.tree
                .function(member)
                .is_some_and(|func| func.kind == FunctionKind::Constructor)
        });
        if has_constructor {
            return;
        }

        let token = ctx.tree.synthetic_token("this");
        let ctor = ctx.tree.alloc(
            NodeKind::Decl(Decl::Function(FunctionDecl::new(FunctionKind::Constructor))),
            token,
            None,
        );
        let body = ctx.tree.block(Vec::new());
        ctx.tree.set_body(ctor, body);
        ctx.tree.attach(class, ctor);
        ctx.tree[ctor].ty = Some(Ty::Class(class));
        ctx.tree[ctor].real = format!("{}_this", ctx.tree.name(class));
        if let Some(decl) = ctx.tree.class_mut(class) {
            decl.default_ctor = Some(ctor);
        }
    }

    fn link_base(&mut self, ctx: &mut CompilationContext, class: NodeId) {
        let Some(decl) = ctx.tree.class(class) else {
            return;
        };
        let Some(token) = decl.base_token else {
            return;
        };
        if decl.base.is_some() {
            return;
        }
        let Some(&base) = self.classes.get(&token.name) else {
            ctx.error_at(token, ErrorKind::UnknownType);
            return;
        };
        if let Some(decl) = ctx.tree.class_mut(class) {
            decl.base = Some(base);
        }
    }

    fn link_interfaces(&mut self, ctx: &mut CompilationContext, class: NodeId) {
        let Some(decl) = ctx.tree.class(class) else {
            return;
        };
        if !decl.interfaces.is_empty() {
            return;
        }
        let tokens = decl.interface_tokens.clone();
        let mut resolved = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.classes.get(&token.name) {
                Some(&interface) => resolved.push(interface),
                None => ctx.error_at(token, ErrorKind::UnknownType),
            }
        }
        if let Some(decl) = ctx.tree.class_mut(class) {
            decl.interfaces = resolved;
        }
    }

    /// Resolve the element type of every array-of class
    pub fn register_classes_arrays(&mut self, ctx: &mut CompilationContext) {
        let registered: Vec<NodeId> = self.classes.values().copied().collect();
        for class in registered {
            let Some(token) = ctx.tree.class(class).and_then(|decl| decl.array_of) else {
                continue;
            };
            match self.find(token.name) {
                Some(element) => {
                    if let Some(decl) = ctx.tree.class_mut(class) {
                        decl.element = Some(element);
                    }
                }
                None => ctx.error_at(token, ErrorKind::UnknownType),
            }
        }
    }

    /// Insert every enum and give it a backing class
    ///
    /// Enum names share one namespace with classes.
    pub fn register_enums(&mut self, ctx: &mut CompilationContext) {
        let enums = ctx
            .tree
            .find_all(|kind| matches!(kind, NodeKind::Decl(Decl::Enum(_))));
        for enumeration in enums {
            let token = ctx.tree[enumeration].token;
            if self.classes.contains_key(&token.name) || self.enums.contains_key(&token.name) {
                ctx.error(enumeration, ErrorKind::NameAlreadyExists);
                continue;
            }
            self.enums.insert(token.name, enumeration);
            self.set_real_name(ctx, enumeration);

            let mut decl = ClassDecl::new(ClassKind::Class);
            decl.flags.is_enum = true;
            decl.id = Some(ctx.alloc_class_id());
            let backing = ctx.tree.alloc(
                NodeKind::Decl(Decl::Class(decl)),
                token,
                Some(enumeration),
            );
            ctx.tree[backing].ty = Some(Ty::Class(backing));
            ctx.tree[backing].real = ctx.tree[enumeration].real.clone();
            ctx.tree[enumeration].ty = Some(Ty::Class(backing));
            self.enum_classes.insert(token.name, backing);

            let members = match &mut ctx.tree[enumeration].kind {
                NodeKind::Decl(Decl::Enum(decl)) => {
                    decl.backing = Some(backing);
                    decl.members.clone()
                }
                _ => Vec::new(),
            };
            let prefix = ctx.tree[enumeration].real.clone();
            for member in members {
                ctx.tree[member].real = format!("{prefix}_{}", ctx.tree.name(member));
            }
            tracing::debug!(name = ctx.tree.text(token.name), "registered enum");
        }
    }
}
