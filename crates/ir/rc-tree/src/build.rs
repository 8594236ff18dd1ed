//! Construction API used by the parser and by tests
//!
//! Declarations are built top-down: each `add_*` call takes the owning node
//! and attaches the new declaration to it. Statements and expressions are
//! built bottom-up: their constructors take finished children and adopt
//! them. Tokens get consecutive positions in the current file.

use crate::node::{
    Accessor, BinaryOp, ClassDecl, ClassKind, Decl, EnumDecl, Expr, FunctionDecl, FunctionKind,
    IndexerDecl, LiteralKind, NodeId, NodeKind, ParamDecl, PropertyDecl, Stmt, Token, UnaryOp,
    VarDecl,
};
use crate::tree::Tree;
use std::path::PathBuf;

impl Tree {
    fn add_decl(&mut self, parent: NodeId, name: &str, decl: Decl) -> NodeId {
        let token = self.token(name);
        let id = self.alloc(NodeKind::Decl(decl), token, Some(parent));
        self.attach(parent, id);
        id
    }

    fn adopt(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.set_parent(child, parent);
        }
    }

    fn expr_node(&mut self, token: Token, expr: Expr) -> NodeId {
        let children = match &expr {
            Expr::Literal(_)
            | Expr::Identifier { .. }
            | Expr::SizeOf { .. }
            | Expr::TypeName
            | Expr::Base => Vec::new(),
            Expr::MemberAccess { object, member } => vec![*object, *member],
            Expr::Call { args, receiver, .. } => receiver.iter().chain(args).copied().collect(),
            Expr::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Expr::Unary { operand, .. } => vec![*operand],
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => vec![*cond, *then_expr, *else_expr],
            Expr::Cast { expr, .. }
            | Expr::As { expr, .. }
            | Expr::TypeOf { expr }
            | Expr::Ref { expr }
            | Expr::Paren { expr } => vec![*expr],
            Expr::New { call } => vec![*call],
            Expr::Index { target, index, .. } => vec![*target, *index],
        };
        let id = self.alloc(NodeKind::Expr(expr), token, None);
        self.adopt(id, children);
        id
    }

    fn stmt_node(&mut self, name: &str, stmt: Stmt, children: Vec<NodeId>) -> NodeId {
        let token = self.token(name);
        let id = self.alloc(NodeKind::Stmt(stmt), token, None);
        self.adopt(id, children);
        id
    }

    // Declarations

    /// Add a module to the end of the program
    pub fn add_module(&mut self, path: impl Into<PathBuf>) -> NodeId {
        let path = path.into();
        let name = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        let root = self.root;
        self.add_decl(
            root,
            &name,
            Decl::Module {
                path,
                children: Vec::new(),
            },
        )
    }

    /// Add a module in front of every other program child
    ///
    /// Imported modules go first so their declarations register before the
    /// code that uses them.
    pub fn insert_module_front(&mut self, path: impl Into<PathBuf>, token: Token) -> NodeId {
        let root = self.root;
        let id = self.alloc(
            NodeKind::Decl(Decl::Module {
                path: path.into(),
                children: Vec::new(),
            }),
            token,
            Some(root),
        );
        if let NodeKind::Decl(Decl::Program { children }) = &mut self[root].kind {
            children.insert(0, id);
        }
        id
    }

    /// `using "path"`
    pub fn add_using(&mut self, parent: NodeId, path: &str) -> NodeId {
        self.add_decl(
            parent,
            path,
            Decl::Using {
                path: path.to_string(),
                module: None,
            },
        )
    }

    /// `class Name`
    pub fn add_class(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.add_decl(parent, name, Decl::Class(ClassDecl::new(ClassKind::Class)))
    }

    /// `interface Name`
    pub fn add_interface(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.add_decl(parent, name, Decl::Class(ClassDecl::new(ClassKind::Interface)))
    }

    /// Declare the base class of `class`
    pub fn set_base(&mut self, class: NodeId, base: &str) {
        let token = self.token(base);
        if let Some(decl) = self.class_mut(class) {
            decl.base_token = Some(token);
        }
    }

    /// Declare an implemented interface of `class`
    pub fn add_implements(&mut self, class: NodeId, interface: &str) {
        let token = self.token(interface);
        if let Some(decl) = self.class_mut(class) {
            decl.interface_tokens.push(token);
        }
    }

    /// Make `class` an array of `element`
    pub fn set_array_of(&mut self, class: NodeId, element: &str) {
        let token = self.token(element);
        if let Some(decl) = self.class_mut(class) {
            decl.array_of = Some(token);
        }
    }

    /// `enum Name`
    pub fn add_enum(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.add_decl(parent, name, Decl::Enum(EnumDecl::default()))
    }

    /// Enum member with an optional value expression
    pub fn add_enum_member(&mut self, parent: NodeId, name: &str, value: Option<NodeId>) -> NodeId {
        let id = self.add_decl(parent, name, Decl::EnumMember { value });
        self.adopt(id, value);
        id
    }

    /// Function or method returning `return_type`
    pub fn add_function(&mut self, parent: NodeId, name: &str, return_type: Option<&str>) -> NodeId {
        let mut func = FunctionDecl::new(FunctionKind::Plain);
        func.return_type = return_type.map(|ty| self.token(ty));
        self.add_decl(parent, name, Decl::Function(func))
    }

    /// Constructor of `class`
    pub fn add_constructor(&mut self, class: NodeId) -> NodeId {
        self.add_decl(class, "this", Decl::Function(FunctionDecl::new(FunctionKind::Constructor)))
    }

    /// Operator overload of `class`
    pub fn add_operator(&mut self, class: NodeId, op: BinaryOp, return_type: &str) -> NodeId {
        let mut func = FunctionDecl::new(FunctionKind::Operator(op));
        func.return_type = Some(self.token(return_type));
        self.add_decl(class, op.symbol(), Decl::Function(func))
    }

    /// Native function bound to `symbol`
    pub fn add_native_function(
        &mut self,
        parent: NodeId,
        name: &str,
        return_type: Option<&str>,
        symbol: &str,
    ) -> NodeId {
        let id = self.add_function(parent, name, return_type);
        if let Some(func) = self.function_mut(id) {
            func.is_native = true;
            func.binding = Some(crate::node::NativeBinding {
                symbol: symbol.to_string(),
                template: None,
            });
        }
        id
    }

    /// Append a parameter to `func`
    pub fn add_param(&mut self, func: NodeId, name: &str, type_name: Option<&str>) -> NodeId {
        let type_ref = type_name.map(|ty| self.token(ty));
        let token = self.token(name);
        let id = self.alloc(
            NodeKind::Decl(Decl::Parameter(ParamDecl {
                type_ref,
                ..ParamDecl::default()
            })),
            token,
            Some(func),
        );
        if let Some(decl) = self.function_mut(func) {
            decl.params.push(id);
        }
        id
    }

    /// Mutable parameter payload
    pub fn param_mut(&mut self, param: NodeId) -> Option<&mut ParamDecl> {
        match &mut self[param].kind {
            NodeKind::Decl(Decl::Parameter(decl)) => Some(decl),
            _ => None,
        }
    }

    /// Attach `body` to `func`
    pub fn set_body(&mut self, func: NodeId, body: NodeId) {
        self.set_parent(body, func);
        if let Some(decl) = self.function_mut(func) {
            decl.body = Some(body);
        }
    }

    /// Make `func` an arrow function evaluating `expr`
    pub fn set_arrow_body(&mut self, func: NodeId, expr: NodeId) {
        let body = self.block(vec![expr]);
        self.set_body(func, body);
        if let Some(decl) = self.function_mut(func) {
            decl.is_arrow = true;
        }
    }

    /// Field or global variable
    pub fn add_field(
        &mut self,
        parent: NodeId,
        name: &str,
        type_name: Option<&str>,
        init: Option<NodeId>,
    ) -> NodeId {
        let type_ref = type_name.map(|ty| self.token(ty));
        let id = self.add_decl(
            parent,
            name,
            Decl::Var(VarDecl {
                type_ref,
                init,
                is_const: false,
            }),
        );
        self.adopt(id, init);
        id
    }

    /// Property with the given accessors; custom accessor bodies are
    /// adopted by the property
    pub fn add_property(
        &mut self,
        class: NodeId,
        name: &str,
        type_name: &str,
        getter: Accessor,
        setter: Accessor,
    ) -> NodeId {
        let type_ref = self.token(type_name);
        let id = self.add_decl(
            class,
            name,
            Decl::Property(PropertyDecl {
                type_ref,
                getter,
                setter,
                init: None,
                get_fn: None,
                set_fn: None,
            }),
        );
        for accessor in [getter, setter] {
            if let Accessor::Custom(body) = accessor {
                self.set_parent(body, id);
            }
        }
        id
    }

    /// Indexer `this[param: param_type]` yielding `type_name`
    pub fn add_indexer(
        &mut self,
        class: NodeId,
        param: (&str, &str),
        type_name: &str,
        getter: Accessor,
        setter: Accessor,
    ) -> NodeId {
        let type_ref = self.token(type_name);
        let param_type = self.token(param.1);
        let param_token = self.token(param.0);
        let token = self.token("this");
        let param_id = self.alloc(
            NodeKind::Decl(Decl::Parameter(ParamDecl {
                type_ref: Some(param_type),
                ..ParamDecl::default()
            })),
            param_token,
            None,
        );
        let id = self.alloc(
            NodeKind::Decl(Decl::Indexer(IndexerDecl {
                param: param_id,
                type_ref,
                getter,
                setter,
                get_fn: None,
                set_fn: None,
            })),
            token,
            Some(class),
        );
        self.set_parent(param_id, id);
        self.attach(class, id);
        for accessor in [getter, setter] {
            if let Accessor::Custom(body) = accessor {
                self.set_parent(body, id);
            }
        }
        id
    }

    /// `extension Class { ... }`
    pub fn add_extension(&mut self, parent: NodeId, class_name: &str) -> NodeId {
        self.add_decl(
            parent,
            class_name,
            Decl::Extension {
                members: Vec::new(),
            },
        )
    }

    // Statements

    /// Local variable declaration, used as a statement
    pub fn local(&mut self, name: &str, type_name: Option<&str>, init: Option<NodeId>) -> NodeId {
        let type_ref = type_name.map(|ty| self.token(ty));
        let token = self.token(name);
        let id = self.alloc(
            NodeKind::Decl(Decl::Var(VarDecl {
                type_ref,
                init,
                is_const: false,
            })),
            token,
            None,
        );
        self.adopt(id, init);
        id
    }

    /// `{ stmts }`
    pub fn block(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.stmt_node("{", Stmt::Block { stmts: stmts.clone() }, stmts)
    }

    /// `return value`
    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.stmt_node("return", Stmt::Return { value }, value.into_iter().collect())
    }

    /// `if cond then else`
    pub fn if_stmt(&mut self, cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId>) -> NodeId {
        let mut children = vec![cond, then_branch];
        children.extend(else_branch);
        self.stmt_node(
            "if",
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            },
            children,
        )
    }

    /// `while cond body`
    pub fn while_stmt(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.stmt_node("while", Stmt::While { cond, body }, vec![cond, body])
    }

    /// `for init; cond; step body`
    pub fn for_stmt(
        &mut self,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let children = init.into_iter().chain(cond).chain(step).chain([body]).collect();
        self.stmt_node(
            "for",
            Stmt::For {
                init,
                cond,
                step,
                body,
            },
            children,
        )
    }

    /// `switch scrutinee { cases default }`
    pub fn switch(&mut self, scrutinee: NodeId, cases: Vec<NodeId>, default: Option<NodeId>) -> NodeId {
        let children = [scrutinee]
            .into_iter()
            .chain(cases.iter().copied())
            .chain(default)
            .collect();
        self.stmt_node(
            "switch",
            Stmt::Switch {
                scrutinee,
                cases,
                default,
                same_type: true,
            },
            children,
        )
    }

    /// `case values: body`
    pub fn case(&mut self, values: Vec<NodeId>, body: NodeId) -> NodeId {
        let mut children = values.clone();
        children.push(body);
        self.stmt_node(
            "case",
            Stmt::Case {
                values,
                body,
                same_type: true,
            },
            children,
        )
    }

    /// `default: body`
    pub fn default_case(&mut self, body: NodeId) -> NodeId {
        self.stmt_node(
            "default",
            Stmt::Default {
                body,
                same_type: true,
            },
            vec![body],
        )
    }

    /// `delete targets`
    pub fn delete(&mut self, targets: Vec<NodeId>) -> NodeId {
        self.stmt_node("delete", Stmt::Delete { targets: targets.clone() }, targets)
    }

    /// `break`
    pub fn break_stmt(&mut self) -> NodeId {
        self.stmt_node("break", Stmt::Break, Vec::new())
    }

    /// `continue`
    pub fn continue_stmt(&mut self) -> NodeId {
        self.stmt_node("continue", Stmt::Continue, Vec::new())
    }

    /// `name:`
    pub fn label(&mut self, name: &str) -> NodeId {
        self.stmt_node(name, Stmt::Label, Vec::new())
    }

    /// `goto name`
    pub fn goto(&mut self, name: &str) -> NodeId {
        self.stmt_node(name, Stmt::Goto, Vec::new())
    }

    // Expressions

    /// Literal of `kind` spelled `text`
    pub fn literal(&mut self, kind: LiteralKind, text: &str) -> NodeId {
        let token = self.token(text);
        self.expr_node(token, Expr::Literal(kind))
    }

    /// Integer literal
    pub fn int(&mut self, value: i64) -> NodeId {
        self.literal(LiteralKind::Int, &value.to_string())
    }

    /// String literal
    pub fn string(&mut self, text: &str) -> NodeId {
        self.literal(LiteralKind::Str, text)
    }

    /// `null`
    pub fn null(&mut self) -> NodeId {
        self.literal(LiteralKind::Null, "null")
    }

    /// `true` or `false`
    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.literal(LiteralKind::Bool, if value { "true" } else { "false" })
    }

    /// Name reference
    pub fn ident(&mut self, name: &str) -> NodeId {
        let token = self.token(name);
        self.expr_node(
            token,
            Expr::Identifier {
                from: None,
                raw: false,
            },
        )
    }

    /// `this`
    pub fn this(&mut self) -> NodeId {
        self.ident("this")
    }

    /// `object.member`
    pub fn member(&mut self, object: NodeId, member: NodeId) -> NodeId {
        let token = self.token(".");
        self.expr_node(token, Expr::MemberAccess { object, member })
    }

    /// `name(args)`
    pub fn call(&mut self, name: &str, args: Vec<NodeId>) -> NodeId {
        let token = self.token(name);
        self.expr_node(
            token,
            Expr::Call {
                args,
                receiver: None,
                function: None,
            },
        )
    }

    /// `object.name(args)`
    pub fn method_call(&mut self, object: NodeId, name: &str, args: Vec<NodeId>) -> NodeId {
        let call = self.call(name, args);
        self.member(object, call)
    }

    /// `lhs op rhs`
    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        let token = self.token(op.symbol());
        self.expr_node(
            token,
            Expr::Binary {
                op,
                lhs,
                rhs,
                overload: None,
            },
        )
    }

    /// `lhs = rhs`
    pub fn assign(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.binary(BinaryOp::Assign, lhs, rhs)
    }

    /// `op operand`
    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        let spelling = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        };
        let token = self.token(spelling);
        self.expr_node(token, Expr::Unary { op, operand })
    }

    /// `cond ? then_expr : else_expr`
    pub fn ternary(&mut self, cond: NodeId, then_expr: NodeId, else_expr: NodeId) -> NodeId {
        let token = self.token("?");
        self.expr_node(
            token,
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            },
        )
    }

    /// `(Type) expr`
    pub fn cast(&mut self, type_name: &str, expr: NodeId) -> NodeId {
        let target = self.token(type_name);
        self.expr_node(target, Expr::Cast { target, expr })
    }

    /// `expr as Type`
    pub fn as_type(&mut self, expr: NodeId, type_name: &str) -> NodeId {
        let target = self.token(type_name);
        self.expr_node(target, Expr::As { target, expr })
    }

    /// `base`
    pub fn base(&mut self) -> NodeId {
        let token = self.token("base");
        self.expr_node(token, Expr::Base)
    }

    /// `new Class(args)`
    pub fn new_object(&mut self, class: &str, args: Vec<NodeId>) -> NodeId {
        let token = self.token("new");
        let call = self.call(class, args);
        let name = self[call].token;
        let id = self.expr_node(token, Expr::New { call });
        self[id].token.name = name.name;
        id
    }

    /// `sizeof(Type)`
    pub fn size_of(&mut self, type_name: &str) -> NodeId {
        let target = self.token(type_name);
        self.expr_node(target, Expr::SizeOf { target })
    }

    /// `typeof(expr)`
    pub fn type_of(&mut self, expr: NodeId) -> NodeId {
        let token = self.token("typeof");
        self.expr_node(token, Expr::TypeOf { expr })
    }

    /// `ref expr`
    pub fn reference(&mut self, expr: NodeId) -> NodeId {
        let token = self.token("ref");
        self.expr_node(token, Expr::Ref { expr })
    }

    /// `target[index]`
    pub fn index(&mut self, target: NodeId, index: NodeId) -> NodeId {
        let token = self.token("[");
        self.expr_node(
            token,
            Expr::Index {
                target,
                index,
                indexer: None,
            },
        )
    }

    /// `(expr)`
    pub fn paren(&mut self, expr: NodeId) -> NodeId {
        let token = self.token("(");
        self.expr_node(token, Expr::Paren { expr })
    }

    /// Type name used as a value
    pub fn type_name(&mut self, name: &str) -> NodeId {
        let token = self.token(name);
        self.expr_node(token, Expr::TypeName)
    }
}
