//! Index arena backing the syntax tree
//!
//! Every node of a compilation unit lives in one `Arena`. Parent links and
//! resolved-to links are plain `Idx` handles, so lowering can replace
//! subtrees without fighting the borrow checker. Replaced nodes simply
//! become unreachable from the root.

pub use la_arena::{Arena, ArenaMap, Idx, RawIdx};
