//! Loading of imported modules
//!
//! Every `using` names a source file. The loader resolves it against the
//! working directory, the importing file's directory and the configured
//! search paths, parses it into a new module at the front of the program,
//! and repeats for the imports the new module brings in. A file is loaded
//! once no matter how many modules import it; file names compare without
//! regard to case.

use crate::config::CompileOptions;
use crate::DriverError;
use anyhow::{Context, Result};
use rc_diagnostics::ErrorKind;
use rc_span::{FileId, FileSpan};
use rc_tree::{CompilationContext, Decl, NodeId, NodeKind, Token, Tree};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

/// Fills a module from source text
///
/// The module is empty and already attached to the program. The tree's
/// current file is the module's, so builder tokens land in it.
pub trait ModuleParser {
    /// Parse `source` into `module`
    fn parse(&mut self, tree: &mut Tree, module: NodeId, source: &str) -> Result<()>;
}

impl<F> ModuleParser for F
where
    F: FnMut(&mut Tree, NodeId, &str) -> Result<()>,
{
    fn parse(&mut self, tree: &mut Tree, module: NodeId, source: &str) -> Result<()> {
        self(tree, module, source)
    }
}

/// Resolves and loads `using` imports
pub struct ModuleLoader<'a> {
    options: &'a CompileOptions,
    /// Lower-cased file name to loaded module
    loaded: FxHashMap<String, NodeId>,
    /// Imports already handled
    visited: FxHashSet<NodeId>,
    /// Loaded files, indexed by [`FileId`]
    files: Vec<PathBuf>,
}

impl<'a> ModuleLoader<'a> {
    /// Loader with nothing loaded yet
    #[must_use]
    pub fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            loaded: FxHashMap::default(),
            visited: FxHashSet::default(),
            files: Vec::new(),
        }
    }

    /// Files loaded so far, indexed by [`FileId`]
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Consume the loader, keeping the file table
    #[must_use]
    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }

    /// `path` with the module extension when it has none
    #[must_use]
    pub fn with_extension(&self, path: &str) -> PathBuf {
        let mut path = PathBuf::from(path);
        if path.extension().is_none() {
            path.set_extension(&self.options.module_extension);
        }
        path
    }

    /// First existing file an import of `path` can mean
    ///
    /// Candidates are the path itself, the path under the working
    /// directory, under the importer's directory, then under each search
    /// path in order.
    #[must_use]
    pub fn locate(&self, path: &str, importer: Option<&Path>) -> Option<PathBuf> {
        let path = self.with_extension(path);
        let mut candidates = vec![path.clone()];
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(&path));
        }
        if let Some(dir) = importer.and_then(Path::parent) {
            candidates.push(dir.join(&path));
        }
        candidates.extend(self.options.search_paths.iter().map(|dir| dir.join(&path)));
        candidates.into_iter().find(|candidate| candidate.is_file())
    }

    /// Load the entry file as the program's first module
    pub fn load_entry(
        &mut self,
        ctx: &mut CompilationContext,
        path: &Path,
        parser: &mut dyn ModuleParser,
    ) -> Result<NodeId> {
        if !path.is_file() {
            return Err(DriverError::MissingEntry {
                path: path.to_path_buf(),
            }
            .into());
        }
        self.parse_module(ctx, path, parser)
    }

    /// Load every import reachable from the tree, returning how many files
    /// were read
    pub fn load_all(
        &mut self,
        ctx: &mut CompilationContext,
        parser: &mut dyn ModuleParser,
    ) -> Result<usize> {
        let mut count = 0;
        loop {
            let pending: Vec<NodeId> = ctx
                .tree
                .find_all(|kind| {
                    matches!(kind, NodeKind::Decl(Decl::Using { module: None, .. }))
                })
                .into_iter()
                .filter(|&using| self.visited.insert(using))
                .collect();
            if pending.is_empty() {
                return Ok(count);
            }
            for using in pending {
                if self.load(ctx, using, parser)? {
                    count += 1;
                }
            }
        }
    }

    /// Handle one import, returning whether a file was read
    fn load(
        &mut self,
        ctx: &mut CompilationContext,
        using: NodeId,
        parser: &mut dyn ModuleParser,
    ) -> Result<bool> {
        let NodeKind::Decl(Decl::Using { path, .. }) = &ctx.tree[using].kind else {
            return Ok(false);
        };
        let path = path.clone();
        let requested = self.with_extension(&path);
        let importer = ctx
            .tree
            .find_parent(using, |kind| matches!(kind, NodeKind::Decl(Decl::Module { .. })))
            .and_then(|module| match &ctx.tree[module].kind {
                NodeKind::Decl(Decl::Module { path, .. }) => Some(path.clone()),
                _ => None,
            });

        if importer
            .as_deref()
            .is_some_and(|importer| file_key(importer) == file_key(&requested))
        {
            tracing::debug!(path, "module imports itself");
            return Ok(false);
        }
        if let Some(&module) = self.loaded.get(&file_key(&requested)) {
            link(&mut ctx.tree, using, module);
            return Ok(false);
        }

        let Some(found) = self.locate(&path, importer.as_deref()) else {
            ctx.error(
                using,
                ErrorKind::PathNotFound {
                    path: requested.display().to_string(),
                },
            );
            return Ok(false);
        };
        let module = self.parse_module(ctx, &found, parser)?;
        link(&mut ctx.tree, using, module);
        Ok(true)
    }

    /// Read and parse one file into a new front module
    fn parse_module(
        &mut self,
        ctx: &mut CompilationContext,
        path: &Path,
        parser: &mut dyn ModuleParser,
    ) -> Result<NodeId> {
        let source = std::fs::read_to_string(path).map_err(|source| DriverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        let token = Token {
            name: ctx.tree.sym(&stem),
            span: FileSpan::SYNTHETIC,
        };
        let module = ctx.tree.insert_module_front(path, token);

        let file = FileId::new(u32::try_from(self.files.len()).context("Too many modules")?);
        self.files.push(path.to_path_buf());
        self.loaded.insert(file_key(path), module);
        ctx.tree.set_file(file);
        parser
            .parse(&mut ctx.tree, module, &source)
            .with_context(|| format!("Failed to parse module: {}", path.display()))?;

        tracing::info!(path = %path.display(), ?file, "loaded module");
        Ok(module)
    }
}

/// Case-insensitive identity of a module file
fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn link(tree: &mut Tree, using: NodeId, loaded: NodeId) {
    if let NodeKind::Decl(Decl::Using { module, .. }) = &mut tree[using].kind {
        *module = Some(loaded);
    }
}
