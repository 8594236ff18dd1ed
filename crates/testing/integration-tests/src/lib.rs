//! Integration test utilities for the Run middle-end
//!
//! A [`Project`] is a temporary directory of module files. Parsing is
//! outside this workspace, so every file is paired with a builder that
//! fills its module through the tree builder API; the driver still finds,
//! orders and loads the files from disk.

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use rc_driver::{CompileOptions, Compilation, Pipeline};
use rc_tree::{CompilationContext, Expr, NodeId, NodeKind, Tree};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Fills one module
pub type Builder = fn(&mut Tree, NodeId);

/// Test project on disk
pub struct Project {
    dir: TempDir,
    /// Lower-cased module name to builder
    builders: IndexMap<String, Builder>,
}

impl Project {
    /// Creates an empty project
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create project directory")?,
            builders: IndexMap::new(),
        })
    }

    /// Adds a module file built by `builder`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn file(mut self, name: &str, builder: Builder) -> Result<Self> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, format!("// {name}\n"))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.builders.insert(stem, builder);
        Ok(self)
    }

    /// Location of a project file
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Compiles starting at `entry` with default options
    ///
    /// # Errors
    ///
    /// Returns an error on host failures; language errors are in the
    /// returned diagnostics
    pub fn compile(&self, entry: &str) -> Result<Compilation> {
        self.compile_with(entry, CompileOptions::default())
    }

    /// Compiles starting at `entry`
    ///
    /// # Errors
    ///
    /// Returns an error on host failures or when a loaded file has no
    /// builder
    pub fn compile_with(&self, entry: &str, options: CompileOptions) -> Result<Compilation> {
        let mut parser = |tree: &mut Tree, module: NodeId, _source: &str| -> Result<()> {
            let name = tree.name(module).to_lowercase();
            let builder = self
                .builders
                .get(&name)
                .ok_or_else(|| anyhow!("no builder for module `{name}`"))?;
            builder(tree, module);
            Ok(())
        };
        Pipeline::new(options).compile(&self.path(entry), &mut parser)
    }
}

/// Puts `stmts` in the body of a free function `main`
pub fn main_body(tree: &mut Tree, module: NodeId, stmts: Vec<NodeId>) -> NodeId {
    let main = tree.add_function(module, "main", None);
    let body = tree.block(stmts);
    tree.set_body(main, body);
    main
}

/// Mangled names of the calls reachable from the root, in source order
#[must_use]
pub fn calls(ctx: &CompilationContext) -> Vec<String> {
    ctx.tree
        .descendants(ctx.tree.root)
        .into_iter()
        .filter(|&id| matches!(ctx.tree[id].kind, NodeKind::Expr(Expr::Call { .. })))
        .map(|id| ctx.tree[id].real.clone())
        .collect()
}

/// Diagnostic messages one per line, without locations
#[must_use]
pub fn messages(compilation: &Compilation) -> String {
    let mut out = String::new();
    for diag in compilation.ctx.diagnostics.errors() {
        out.push_str(&diag.message());
        out.push('\n');
    }
    out
}

/// Class registered under `name`
#[must_use]
pub fn class_named(compilation: &Compilation, name: &str) -> Option<NodeId> {
    let sym = compilation.ctx.tree.sym(name);
    compilation.registry.find(sym)
}
