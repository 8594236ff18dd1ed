//! Compilation driver
//!
//! Runs the semantic phases in order over one program:
//!
//! 1. module loading, following `using` imports from the entry file
//! 2. registration of classes, enums and functions
//! 3. type resolution
//! 4. lowering of properties, indexers and operators into calls
//!
//! Phase errors land in the context's diagnostics; the pipeline only
//! fails outright on host problems such as an unreadable file.

mod config;
mod modules;

pub use config::CompileOptions;
pub use modules::{ModuleLoader, ModuleParser};

use anyhow::Result;
use rc_intern::Interner;
use rc_registry::Registry;
use rc_tree::{CompilationContext, Tree};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host failures of the driver
#[derive(Debug, Error)]
pub enum DriverError {
    /// The entry file does not exist
    #[error("entry module `{}` does not exist", path.display())]
    MissingEntry {
        /// Path as given
        path: PathBuf,
    },
    /// A located module could not be read
    #[error("cannot read module `{}`", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },
}

/// Result of running the pipeline
#[derive(Debug)]
pub struct Compilation {
    /// Tree and diagnostics after every phase
    pub ctx: CompilationContext,
    /// Registered names and functions
    pub registry: Registry,
    /// Source files, indexed by `FileId`
    pub files: Vec<PathBuf>,
    /// Nodes rewritten by lowering
    pub rewrites: usize,
}

impl Compilation {
    /// Whether the program may be handed to code generation
    #[must_use]
    pub fn can_emit(&self) -> bool {
        !self.ctx.has_errors()
    }

    /// Every error, one per line
    #[must_use]
    pub fn render_diagnostics(&self) -> String {
        self.ctx.diagnostics.render()
    }
}

/// Phase sequence configured by [`CompileOptions`]
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: CompileOptions,
}

impl Pipeline {
    /// Pipeline with the given options
    #[must_use]
    pub const fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Pipeline configured from an options file
    pub fn from_config(path: &Path) -> Result<Self> {
        CompileOptions::from_file(path).map(Self::new)
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Load `entry` and its imports, then run every phase
    pub fn compile(&self, entry: &Path, parser: &mut dyn ModuleParser) -> Result<Compilation> {
        let mut ctx = CompilationContext::new(Tree::new(Interner::new()));
        let files = {
            let _span = tracing::info_span!("load", entry = %entry.display()).entered();
            let mut loader = ModuleLoader::new(&self.options);
            loader.load_entry(&mut ctx, entry, parser)?;
            let imported = loader.load_all(&mut ctx, parser)?;
            tracing::info!(imported, "modules loaded");
            loader.into_files()
        };
        Ok(self.run(ctx, files))
    }

    /// Run every phase after loading over an already built tree
    #[must_use]
    pub fn compile_tree(&self, tree: Tree) -> Compilation {
        self.run(CompilationContext::new(tree), Vec::new())
    }

    fn run(&self, mut ctx: CompilationContext, files: Vec<PathBuf>) -> Compilation {
        let registry = {
            let _span = tracing::info_span!("register").entered();
            Registry::build(&mut ctx, self.options.include_builtins)
        };
        {
            let _span = tracing::info_span!("resolve").entered();
            rc_typeck::resolve(&mut ctx, &registry);
        }
        let rewrites = {
            let _span = tracing::info_span!("lower").entered();
            rc_lower::lower(&mut ctx.tree)
        };
        tracing::info!(
            errors = ctx.diagnostics.len(),
            rewrites,
            "compilation finished"
        );
        Compilation {
            ctx,
            registry,
            files,
            rewrites,
        }
    }
}
