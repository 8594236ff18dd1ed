//! Function registration, accessor synthesis and extensions

use crate::Registry;
use rc_diagnostics::ErrorKind;
use rc_span::FileSpan;
use rc_tree::{
    Accessor, CompilationContext, Decl, Expr, FunctionDecl, FunctionKind, NodeId, NodeKind,
    ParamDecl, Token, Ty,
};

impl Registry {
    /// Register extensions, every function, then property and indexer
    /// accessors
    pub fn register_functions(&mut self, ctx: &mut CompilationContext) {
        self.register_extensions(ctx);

        let functions = ctx
            .tree
            .find_all(|kind| matches!(kind, NodeKind::Decl(Decl::Function(_))));
        for func in functions {
            self.register_function(ctx, func);
        }

        let properties = ctx
            .tree
            .find_all(|kind| matches!(kind, NodeKind::Decl(Decl::Property(_))));
        for property in properties {
            self.register_property(ctx, property);
        }

        let indexers = ctx
            .tree
            .find_all(|kind| matches!(kind, NodeKind::Decl(Decl::Indexer(_))));
        for indexer in indexers {
            self.register_indexer(ctx, indexer);
        }
    }

    /// Resolve the return type, mangle and insert one function
    fn register_function(&mut self, ctx: &mut CompilationContext, func: NodeId) {
        let Some((kind, return_type)) = ctx
            .tree
            .function(func)
            .map(|decl| (decl.kind, decl.return_type))
        else {
            return;
        };
        if kind == FunctionKind::Constructor {
            let class = ctx.tree.enclosing_class(func);
            ctx.tree[func].ty = class.map(Ty::Class);
        } else if let Some(token) = return_type {
            let Some(class) = self.find(token.name) else {
                ctx.error_at(token, ErrorKind::UnknownType);
                return;
            };
            ctx.tree[func].ty = Some(Ty::Class(class));
        }

        if !self.set_real_name(ctx, func) {
            return;
        }
        let real = ctx.tree[func].real.clone();
        if self.functions.contains_key(&real) {
            ctx.error(func, ErrorKind::NameAlreadyExists);
            return;
        }
        tracing::debug!(%real, "registered function");
        self.functions.insert(real, func);
    }

    /// Move extension members onto the class they extend
    fn register_extensions(&mut self, ctx: &mut CompilationContext) {
        let extensions = ctx
            .tree
            .find_all(|kind| matches!(kind, NodeKind::Decl(Decl::Extension { .. })));
        for extension in extensions {
            let name = ctx.tree[extension].token.name;
            let Some(&class) = self.classes.get(&name) else {
                ctx.error(extension, ErrorKind::UnknownType);
                continue;
            };
            let members = match &mut ctx.tree[extension].kind {
                NodeKind::Decl(Decl::Extension { members }) => std::mem::take(members),
                _ => Vec::new(),
            };
            for member in members {
                ctx.tree.attach(class, member);
            }
        }
    }

    /// Synthesize and register the accessors of a non-trivial property
    ///
    /// A declared accessor without a body gets a default one working on the
    /// raw field: the getter returns it, the setter assigns `value` to it.
    fn register_property(&mut self, ctx: &mut CompilationContext, property: NodeId) {
        let NodeKind::Decl(Decl::Property(decl)) = &ctx.tree[property].kind else {
            return;
        };
        if decl.is_trivial() || decl.get_fn.is_some() || decl.set_fn.is_some() {
            return;
        }
        let decl = decl.clone();
        let name = ctx.tree.name(property).to_string();
        let span = ctx.tree[property].token.span;

        let getter = match decl.getter {
            Accessor::Absent => None,
            Accessor::Default => {
                let field = raw_field(ctx, property);
                let ret = ctx.tree.ret(Some(field));
                Some(ctx.tree.block(vec![ret]))
            }
            Accessor::Custom(body) => Some(body),
        };
        let setter = match decl.setter {
            Accessor::Absent => None,
            Accessor::Default => {
                let field = raw_field(ctx, property);
                let value = ctx.tree.synthetic_token("value");
                let value = ctx.tree.alloc(
                    NodeKind::Expr(Expr::Identifier {
                        from: None,
                        raw: false,
                    }),
                    value,
                    None,
                );
                let assign = ctx.tree.assign(field, value);
                Some(ctx.tree.block(vec![assign]))
            }
            Accessor::Custom(body) => Some(body),
        };

        let get_fn = getter.map(|body| {
            let token = Token {
                name: ctx.tree.sym(&format!("{name}_get")),
                span,
            };
            accessor(ctx, property, token, FunctionKind::Getter, Some(decl.type_ref), Vec::new(), body)
        });
        let set_fn = setter.map(|body| {
            let token = Token {
                name: ctx.tree.sym(&format!("{name}_set")),
                span,
            };
            let value = ctx.tree.synthetic_token("value");
            let params = vec![(value, decl.type_ref)];
            accessor(ctx, property, token, FunctionKind::Setter, None, params, body)
        });

        if let NodeKind::Decl(Decl::Property(decl)) = &mut ctx.tree[property].kind {
            decl.get_fn = get_fn;
            decl.set_fn = set_fn;
        }
        for func in get_fn.into_iter().chain(set_fn) {
            self.register_function(ctx, func);
        }
    }

    /// Synthesize and register the accessors of an indexer
    ///
    /// Only accessors with a body are backed: an indexer has no field a
    /// default accessor could work on.
    fn register_indexer(&mut self, ctx: &mut CompilationContext, indexer: NodeId) {
        let NodeKind::Decl(Decl::Indexer(decl)) = &ctx.tree[indexer].kind else {
            return;
        };
        if decl.get_fn.is_some() || decl.set_fn.is_some() {
            return;
        }
        let decl = decl.clone();
        let span = ctx.tree[indexer].token.span;
        let index_name = ctx.tree[decl.param].token;
        let Some(index_type) = (match &ctx.tree[decl.param].kind {
            NodeKind::Decl(Decl::Parameter(param)) => param.type_ref,
            _ => None,
        }) else {
            ctx.error(decl.param, ErrorKind::UndefinedType);
            return;
        };

        let get_fn = match decl.getter {
            Accessor::Custom(body) => {
                let token = Token {
                    name: ctx.tree.sym("this_get"),
                    span,
                };
                let params = vec![(index_name, index_type)];
                Some(accessor(ctx, indexer, token, FunctionKind::Getter, Some(decl.type_ref), params, body))
            }
            Accessor::Absent | Accessor::Default => None,
        };
        let set_fn = match decl.setter {
            Accessor::Custom(body) => {
                let token = Token {
                    name: ctx.tree.sym("this_set"),
                    span,
                };
                let value = ctx.tree.synthetic_token("value");
                let params = vec![(index_name, index_type), (value, decl.type_ref)];
                Some(accessor(ctx, indexer, token, FunctionKind::Setter, None, params, body))
            }
            Accessor::Absent | Accessor::Default => None,
        };

        if let NodeKind::Decl(Decl::Indexer(decl)) = &mut ctx.tree[indexer].kind {
            decl.get_fn = get_fn;
            decl.set_fn = set_fn;
        }
        for func in get_fn.into_iter().chain(set_fn) {
            self.register_function(ctx, func);
        }
    }
}

/// Identifier reading the storage behind `property` directly
fn raw_field(ctx: &mut CompilationContext, property: NodeId) -> NodeId {
    let token = ctx.tree[property].token;
    let token = Token {
        span: FileSpan::SYNTHETIC,
        ..token
    };
    ctx.tree.alloc(
        NodeKind::Expr(Expr::Identifier {
            from: Some(property),
            raw: true,
        }),
        token,
        None,
    )
}

/// Accessor function owned by a property or indexer
fn accessor(
    ctx: &mut CompilationContext,
    owner: NodeId,
    token: Token,
    kind: FunctionKind,
    return_type: Option<Token>,
    params: Vec<(Token, Token)>,
    body: NodeId,
) -> NodeId {
    let mut decl = FunctionDecl::new(kind);
    decl.return_type = return_type;
    let func = ctx
        .tree
        .alloc(NodeKind::Decl(Decl::Function(decl)), token, Some(owner));
    for (name, type_ref) in params {
        let param = ctx.tree.alloc(
            NodeKind::Decl(Decl::Parameter(ParamDecl {
                type_ref: Some(type_ref),
                ..ParamDecl::default()
            })),
            name,
            Some(func),
        );
        if let Some(decl) = ctx.tree.function_mut(func) {
            decl.params.push(param);
        }
    }
    ctx.tree.set_body(func, body);
    func
}
