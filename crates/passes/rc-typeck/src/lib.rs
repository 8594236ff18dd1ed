//! Type resolution
//!
//! Assigns a type to every expression and declaration of a registered tree,
//! links names and calls to the declarations they resolve to, and reports
//! what does not type-check.
//!
//! Resolution is demand driven: declarations are checked at their first
//! use, so a method may call another declared further down its class.
//! Errors are collected and checking continues with the next statement.

mod compat;
mod expr;
mod ident;
mod overload;
mod resolver;
pub mod scope;
mod stmt;

pub use compat::are_compatible;
pub use resolver::TypeResolver;

use rc_registry::Registry;
use rc_tree::CompilationContext;

/// Resolve every node of `ctx.tree`
pub fn resolve(ctx: &mut CompilationContext, registry: &Registry) {
    TypeResolver::new(ctx, registry).run();
}
