//! Tree model shared by every compiler phase
//!
//! The parser produces a [`Tree`]: one arena of [`Node`]s, each with a
//! token, a parent link, a `ty` slot, a mangled name and a `validated`
//! flag. The registry stamps identities and mangled names on declarations,
//! the resolver fills types and resolved-to links, and lowering re-points
//! child slots to replace sugar with calls.
//!
//! # Usage
//!
//! ```
//! use rc_intern::Interner;
//! use rc_tree::Tree;
//!
//! let mut tree = Tree::new(Interner::new());
//! let module = tree.add_module("main.run");
//! let point = tree.add_class(module, "Point");
//! tree.add_field(point, "x", Some("i32"), None);
//! assert_eq!(tree.name(point), "Point");
//! assert_eq!(tree.enclosing_class(tree.children(point)[0]), Some(point));
//! ```

mod build;
mod context;
mod node;
mod tree;

pub use context::CompilationContext;
pub use node::*;
pub use tree::Tree;
