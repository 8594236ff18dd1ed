//! Node taxonomy
//!
//! One closed sum per category: [`Decl`], [`Stmt`] and [`Expr`]. Every
//! phase matches them exhaustively, so a new variant fails to compile until
//! each phase handles it.

use rc_arena::Idx;
use rc_intern::Symbol;
use rc_span::FileSpan;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Handle of a node in the tree arena
pub type NodeId = Idx<Node>;

/// Run-time identity of a registered class
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Name and source position of a node
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Token {
    /// Interned text
    pub name: Symbol,
    /// Source location span
    pub span: FileSpan,
}

/// Resolved type of a node
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Ty {
    /// Type of the `null` literal
    Null,
    /// A registered class (enums resolve to their backing class)
    Class(NodeId),
}

impl Ty {
    /// Class node, unless this is the null type
    #[must_use]
    pub const fn class(self) -> Option<NodeId> {
        match self {
            Self::Class(class) => Some(class),
            Self::Null => None,
        }
    }
}

/// A tree node
#[derive(Clone, Debug)]
pub struct Node {
    /// Variant payload
    pub kind: NodeKind,
    /// Name and position
    pub token: Token,
    /// Owning node, `None` only for the program root
    pub parent: Option<NodeId>,
    /// Resolved type, `None` while unresolved or after a failed check
    pub ty: Option<Ty>,
    /// Mangled emission name, empty until computed
    pub real: String,
    /// Set once type resolution visited the node
    pub validated: bool,
}

/// Node payload
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Declarations
    Decl(Decl),
    /// Statements
    Stmt(Stmt),
    /// Expressions
    Expr(Expr),
}

/// Declarations
#[derive(Clone, Debug)]
pub enum Decl {
    /// Root of a compilation unit
    Program {
        /// Modules and top-level declarations in source order
        children: Vec<NodeId>,
    },
    /// An imported source file
    Module {
        /// Location the module was loaded from
        path: PathBuf,
        /// Top-level declarations in source order
        children: Vec<NodeId>,
    },
    /// `using "path"` import
    Using {
        /// Import path as written
        path: String,
        /// Module the import resolved to
        module: Option<NodeId>,
    },
    /// Class or interface
    Class(ClassDecl),
    /// Enumeration
    Enum(EnumDecl),
    /// Enumeration member
    EnumMember {
        /// Explicit value, if any
        value: Option<NodeId>,
    },
    /// Function, method, constructor, operator or accessor
    Function(FunctionDecl),
    /// Function parameter
    Parameter(ParamDecl),
    /// Field, global or local variable
    Var(VarDecl),
    /// Property with accessors
    Property(PropertyDecl),
    /// Indexer (`this[index]`) with accessors
    Indexer(IndexerDecl),
    /// Members added to an existing class from outside its body
    Extension {
        /// Functions to move onto the target class
        members: Vec<NodeId>,
    },
}

/// Class or interface
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ClassKind {
    /// Regular class
    Class,
    /// Interface, has no constructors
    Interface,
}

/// Boolean class attributes
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct ClassFlags {
    /// Bound to an existing C type
    pub is_native: bool,
    /// Value type, never `null`
    pub is_primitive: bool,
    /// Synthetic backing class of an enum
    pub is_enum: bool,
    /// The `any` wildcard
    pub is_any: bool,
    /// Takes part in implicit numeric promotion
    pub is_number: bool,
}

/// Class payload
#[derive(Clone, Debug)]
pub struct ClassDecl {
    /// Class or interface
    pub kind: ClassKind,
    /// Identity, assigned at registration
    pub id: Option<ClassId>,
    /// Base class name as written
    pub base_token: Option<Token>,
    /// Resolved base class
    pub base: Option<NodeId>,
    /// Implemented interface names as written
    pub interface_tokens: Vec<Token>,
    /// Resolved interfaces
    pub interfaces: Vec<NodeId>,
    /// Members in source order
    pub members: Vec<NodeId>,
    /// Attributes
    pub flags: ClassFlags,
    /// C type for native classes
    pub native_name: Option<String>,
    /// Element type name for array-of classes
    pub array_of: Option<Token>,
    /// Resolved element class
    pub element: Option<NodeId>,
    /// Synthesized constructor, if the class declared none
    pub default_ctor: Option<NodeId>,
}

impl ClassDecl {
    /// Empty class of the given kind
    #[must_use]
    pub const fn new(kind: ClassKind) -> Self {
        Self {
            kind,
            id: None,
            base_token: None,
            base: None,
            interface_tokens: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
            flags: ClassFlags {
                is_native: false,
                is_primitive: false,
                is_enum: false,
                is_any: false,
                is_number: false,
            },
            native_name: None,
            array_of: None,
            element: None,
            default_ctor: None,
        }
    }

    /// Whether this is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }
}

/// Enum payload
#[derive(Clone, Debug, Default)]
pub struct EnumDecl {
    /// Members in source order
    pub members: Vec<NodeId>,
    /// Synthetic class standing for the enum in types
    pub backing: Option<NodeId>,
    /// Primitive class of the member values (`i32` or `string`)
    pub underlying: Option<NodeId>,
}

/// What kind of callable a function is
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum FunctionKind {
    /// Free function or method
    Plain,
    /// Constructor, named `this`
    Constructor,
    /// Operator overload
    Operator(BinaryOp),
    /// Property or indexer getter
    Getter,
    /// Property or indexer setter
    Setter,
}

/// Foreign symbol a native function is bound to
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct NativeBinding {
    /// C symbol name
    pub symbol: String,
    /// Call template, `$0`.. stand for the arguments
    pub template: Option<String>,
}

/// Function payload
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    /// Callable kind
    pub kind: FunctionKind,
    /// Parameters in order
    pub params: Vec<NodeId>,
    /// Return type name as written
    pub return_type: Option<Token>,
    /// Body block, `None` for natives and interface members
    pub body: Option<NodeId>,
    /// Bound to a foreign symbol
    pub is_native: bool,
    /// Foreign symbol and call template
    pub binding: Option<NativeBinding>,
    /// Declared `=> expr`; the body block holds the expression
    pub is_arrow: bool,
}

impl FunctionDecl {
    /// Function of the given kind with no parameters
    #[must_use]
    pub const fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            return_type: None,
            body: None,
            is_native: false,
            binding: None,
            is_arrow: false,
        }
    }
}

/// Parameter payload
#[derive(Clone, Debug, Default)]
pub struct ParamDecl {
    /// Type name as written
    pub type_ref: Option<Token>,
    /// Binds straight to the class field of the same name
    pub is_member: bool,
    /// Accepts any number of trailing arguments
    pub is_variadic: bool,
    /// Generic-style constraints, encoded into the mangled name
    pub constraints: Vec<Token>,
}

/// Variable payload
#[derive(Clone, Debug, Default)]
pub struct VarDecl {
    /// Type name as written
    pub type_ref: Option<Token>,
    /// Initializer expression
    pub init: Option<NodeId>,
    /// Declared `const`
    pub is_const: bool,
}

/// How an accessor was declared
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Accessor {
    /// Not declared
    #[default]
    Absent,
    /// Declared without a body
    Default,
    /// Declared with a body block
    Custom(NodeId),
}

impl Accessor {
    /// Whether the accessor has a body
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Whether the accessor exists at all
    #[must_use]
    pub const fn is_declared(self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// Property payload
#[derive(Clone, Debug)]
pub struct PropertyDecl {
    /// Type name as written
    pub type_ref: Token,
    /// Getter declaration
    pub getter: Accessor,
    /// Setter declaration
    pub setter: Accessor,
    /// Initial value
    pub init: Option<NodeId>,
    /// Synthesized getter function
    pub get_fn: Option<NodeId>,
    /// Synthesized setter function
    pub set_fn: Option<NodeId>,
}

impl PropertyDecl {
    /// A property is trivial when no accessor has a body; it is then a
    /// plain field and gets no backing functions
    #[must_use]
    pub const fn is_trivial(&self) -> bool {
        !self.getter.is_custom() && !self.setter.is_custom()
    }
}

/// Indexer payload
#[derive(Clone, Debug)]
pub struct IndexerDecl {
    /// Index parameter
    pub param: NodeId,
    /// Element type name as written
    pub type_ref: Token,
    /// Getter declaration
    pub getter: Accessor,
    /// Setter declaration
    pub setter: Accessor,
    /// Synthesized getter function
    pub get_fn: Option<NodeId>,
    /// Synthesized setter function
    pub set_fn: Option<NodeId>,
}

/// Statements
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `{ ... }`
    Block {
        /// Statements, local declarations included
        stmts: Vec<NodeId>,
    },
    /// `return value`
    Return {
        /// Returned value
        value: Option<NodeId>,
    },
    /// `if cond then else`
    If {
        /// Condition
        cond: NodeId,
        /// Taken branch
        then_branch: NodeId,
        /// Alternative
        else_branch: Option<NodeId>,
    },
    /// `while cond body`
    While {
        /// Condition
        cond: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `for init; cond; step body`
    For {
        /// Initializer, usually a local declaration
        init: Option<NodeId>,
        /// Condition
        cond: Option<NodeId>,
        /// Step expression
        step: Option<NodeId>,
        /// Loop body
        body: NodeId,
    },
    /// `switch scrutinee { cases }`
    Switch {
        /// Value being switched on
        scrutinee: NodeId,
        /// Case arms in order
        cases: Vec<NodeId>,
        /// Default arm
        default: Option<NodeId>,
        /// All cases have the same type; cleared when they differ so the
        /// emitter falls back to an if/else chain
        same_type: bool,
    },
    /// `case values: body`
    Case {
        /// Matched values
        values: Vec<NodeId>,
        /// Arm body
        body: NodeId,
        /// Copy of the owning switch's flag
        same_type: bool,
    },
    /// `default: body`
    Default {
        /// Arm body
        body: NodeId,
        /// Copy of the owning switch's flag
        same_type: bool,
    },
    /// `delete a, b`
    Delete {
        /// Released values
        targets: Vec<NodeId>,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `name:`, the token holds the label
    Label,
    /// `goto name`, the token holds the target label
    Goto,
}

/// Literal categories
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum LiteralKind {
    /// Decimal integer
    Int,
    /// Hexadecimal integer
    Hex,
    /// Double precision real
    Real,
    /// Single precision real (`1.5f`)
    Float,
    /// Quoted string
    Str,
    /// Character
    Char,
    /// `true` or `false`
    Bool,
    /// `null`
    Null,
}

/// Binary operators
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum BinaryOp {
    /// `=`
    Assign,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

impl BinaryOp {
    /// Token kind name used in operator mangled names
    #[must_use]
    pub const fn token_kind(self) -> &'static str {
        match self {
            Self::Assign => "ASSIGN",
            Self::Add => "PLUS",
            Self::Sub => "MINUS",
            Self::Mul => "MULTIPLY",
            Self::Div => "DIVIDE",
            Self::Rem => "MOD",
            Self::Eq => "EQUAL",
            Self::Ne => "NOT_EQUAL",
            Self::Lt => "LESS",
            Self::Le => "LESS_EQUAL",
            Self::Gt => "GREATER",
            Self::Ge => "GREATER_EQUAL",
            Self::And => "AND",
            Self::Or => "OR",
            Self::BitAnd => "BITWISE_AND",
            Self::BitOr => "BITWISE_OR",
            Self::BitXor => "BITWISE_XOR",
            Self::Shl => "SHIFT_LEFT",
            Self::Shr => "SHIFT_RIGHT",
        }
    }

    /// Source spelling
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }

    /// Comparison and logical operators produce `bool`
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::And | Self::Or
        )
    }
}

/// Unary operators
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `++`
    Inc,
    /// `--`
    Dec,
}

/// Expressions
#[derive(Clone, Debug)]
pub enum Expr {
    /// Literal, the token holds its text
    Literal(LiteralKind),
    /// Name reference
    Identifier {
        /// Declaration the name resolved to
        from: Option<NodeId>,
        /// Direct field access inside a synthesized accessor; never
        /// rewritten into an accessor call
        raw: bool,
    },
    /// `object.member`
    MemberAccess {
        /// Left side
        object: NodeId,
        /// Right side, an identifier or call
        member: NodeId,
    },
    /// `name(args)`
    Call {
        /// Arguments in order
        args: Vec<NodeId>,
        /// Bound receiver, set by lowering
        receiver: Option<NodeId>,
        /// Function the call resolved to
        function: Option<NodeId>,
    },
    /// `lhs op rhs`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: NodeId,
        /// Right operand
        rhs: NodeId,
        /// Operator function declared by the right operand's type
        overload: Option<NodeId>,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: NodeId,
    },
    /// `cond ? then_expr : else_expr`
    Ternary {
        /// Condition
        cond: NodeId,
        /// Value when true
        then_expr: NodeId,
        /// Value when false
        else_expr: NodeId,
    },
    /// `(Type) expr`
    Cast {
        /// Target type name
        target: Token,
        /// Converted value
        expr: NodeId,
    },
    /// `expr as Type`
    As {
        /// Target type name
        target: Token,
        /// Converted value
        expr: NodeId,
    },
    /// `base`, the enclosing class viewed as its base class
    Base,
    /// `new Class(args)`, the token names the class
    New {
        /// Constructor call, its token also names the class
        call: NodeId,
    },
    /// `sizeof(Type)`
    SizeOf {
        /// Measured type name
        target: Token,
    },
    /// `typeof(expr)`
    TypeOf {
        /// Inspected value
        expr: NodeId,
    },
    /// `ref expr`
    Ref {
        /// Referenced value
        expr: NodeId,
    },
    /// `target[index]`
    Index {
        /// Indexed value
        target: NodeId,
        /// Index value
        index: NodeId,
        /// Indexer declaration the access resolved to
        indexer: Option<NodeId>,
    },
    /// `(expr)`
    Paren {
        /// Inner value
        expr: NodeId,
    },
    /// A type name used as a value, the token holds the name
    TypeName,
}
