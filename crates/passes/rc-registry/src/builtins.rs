//! Primitive classes every program can use

use crate::Registry;
use rc_tree::{ClassDecl, ClassKind, CompilationContext, Decl, NodeId, NodeKind, Token};

/// Builtin classes: name, C representation, primitive, numeric
pub const BUILTIN_TYPES: [(&str, &str, bool, bool); 10] = [
    ("bool", "bool", true, false),
    ("byte", "unsigned char", true, true),
    ("char", "char", true, false),
    ("f32", "float", true, true),
    ("f64", "double", true, true),
    ("i8", "signed char", true, true),
    ("i32", "int", true, true),
    ("u32", "unsigned int", true, true),
    ("string", "char*", false, false),
    ("pointer", "void*", false, false),
];

/// Classes the resolver needs by role rather than by name
#[derive(Debug, Default, Clone, Copy)]
pub struct Builtins {
    /// `any`
    pub any: Option<NodeId>,
    /// `bool`
    pub boolean: Option<NodeId>,
    /// `byte`
    pub byte: Option<NodeId>,
    /// `char`
    pub character: Option<NodeId>,
    /// `f32`
    pub f32: Option<NodeId>,
    /// `f64`
    pub f64: Option<NodeId>,
    /// `i8`
    pub i8: Option<NodeId>,
    /// `i32`
    pub i32: Option<NodeId>,
    /// `u32`
    pub u32: Option<NodeId>,
    /// `string`
    pub string: Option<NodeId>,
    /// `pointer`
    pub pointer: Option<NodeId>,
}

impl Builtins {
    /// Remember `class` if `name` is one of the well-known primitives
    pub(crate) fn capture(&mut self, name: &str, class: NodeId) {
        let slot = match name {
            "bool" => &mut self.boolean,
            "byte" => &mut self.byte,
            "char" => &mut self.character,
            "f32" => &mut self.f32,
            "f64" => &mut self.f64,
            "i8" => &mut self.i8,
            "i32" => &mut self.i32,
            "u32" => &mut self.u32,
            "string" => &mut self.string,
            "pointer" => &mut self.pointer,
            _ => return,
        };
        *slot = Some(class);
    }
}

impl Registry {
    /// Prepend a `builtin` module declaring the primitive classes
    ///
    /// The classes are ordinary class nodes, so they take identities in
    /// `register_classes` ahead of every user class.
    pub fn register_builtin_types(&mut self, ctx: &mut CompilationContext) {
        let token = ctx.tree.synthetic_token("builtin");
        let module = ctx.tree.insert_module_front("builtin", token);
        for (name, native, primitive, number) in BUILTIN_TYPES {
            let mut decl = ClassDecl::new(ClassKind::Class);
            decl.flags.is_native = true;
            decl.flags.is_primitive = primitive;
            decl.flags.is_number = number;
            decl.native_name = Some(native.to_string());
            let token: Token = ctx.tree.synthetic_token(name);
            let class = ctx
                .tree
                .alloc(NodeKind::Decl(Decl::Class(decl)), token, Some(module));
            ctx.tree[class].real = native.to_string();
            ctx.tree.attach(module, class);
        }
    }
}
