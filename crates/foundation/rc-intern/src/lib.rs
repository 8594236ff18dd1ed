//! String interning for identifiers and type names

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Shared string interner
///
/// Cloning is cheap and every clone sees the same symbols, so the tree and
/// the registry can hold the interner independently.
#[derive(Clone)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern `text`, returning its symbol
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Symbol for `text` if it was interned before
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Text of an interned symbol
    pub fn resolve(&self, sym: &Symbol) -> &str {
        self.inner.resolve(sym)
    }

    /// Text of a symbol, or `None` if it belongs to another interner
    pub fn try_resolve(&self, sym: &Symbol) -> Option<&str> {
        self.inner.try_resolve(sym)
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("symbols", &self.inner.len())
            .finish()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
