//! Diagnostics shared by every compiler phase
//!
//! Registration, type resolution and lowering never fail with `Err`: each
//! check that fails appends a [`Diagnostic`] to the [`Diagnostics`] sink and
//! returns from that step only, so one run reports as many independent
//! problems as possible. The host renders the collected diagnostics through
//! `codespan-reporting` and must not emit code while [`Diagnostics::has_errors`]
//! is true.

use miette::Diagnostic as MietteDiagnostic;
use rc_span::FileSpan;
use std::fmt;
use thiserror::Error;

// Re-export codespan types for hosts that render diagnostics
pub use codespan_reporting;

/// Kinds of semantic errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, MietteDiagnostic)]
pub enum ErrorKind {
    /// A type name does not denote a registered class or enum
    #[error("unknown type")]
    #[diagnostic(code(semantic::unknown_type))]
    UnknownType,

    /// An identifier resolves to nothing
    #[error("unknown name")]
    #[diagnostic(code(semantic::unknown_name))]
    UnknownName,

    /// A class, enum or mangled function name is registered twice
    #[error("name already exists")]
    #[diagnostic(code(semantic::name_already_exists))]
    NameAlreadyExists,

    /// Two types that must agree do not
    #[error("incompatible types")]
    #[diagnostic(code(semantic::incompatible_type))]
    IncompatibleType,

    /// No function matches the call name and argument types
    #[error("unknown function name or wrong parameters")]
    #[diagnostic(code(semantic::unknown_function))]
    UnknownFunctionNameOrWrongParameters,

    /// A class does not implement a member of one of its interfaces
    #[error("interface member not found")]
    #[diagnostic(code(semantic::interface_member_not_found))]
    InterfaceMemberNotFound,

    /// A member-shorthand parameter outside of a class
    #[error("only allowed inside of class scope")]
    #[diagnostic(code(semantic::only_in_class_scope))]
    OnlyInClassScope,

    /// An operator declared with other than one parameter
    #[error("only one parameter allowed in operator")]
    #[diagnostic(code(semantic::operator_arity))]
    OnlyOneParameterAllowedInOperator,

    /// A declaration whose type cannot be determined
    #[error("undefined type")]
    #[diagnostic(code(semantic::undefined_type))]
    UndefinedType,

    /// An expression that is not valid in its position
    #[error("invalid expression")]
    #[diagnostic(code(semantic::invalid_expression))]
    InvalidExpression,

    /// An imported module could not be located
    #[error("path not found: '{path}'")]
    #[diagnostic(code(semantic::path_not_found))]
    PathNotFound {
        /// Import path as written, after extension defaulting
        path: String,
    },
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it went wrong
    pub span: FileSpan,
    /// Offending name, if the failing node had one
    pub name: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic without a name
    #[must_use]
    pub const fn new(kind: ErrorKind, span: FileSpan) -> Self {
        Self {
            kind,
            span,
            name: None,
        }
    }

    /// Attach the offending name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Convert to codespan diagnostic for rustc-style output
    ///
    /// Compiler-generated locations get no label since there is no source
    /// text to point at.
    #[must_use]
    pub fn to_codespan_diagnostic(&self) -> codespan_reporting::diagnostic::Diagnostic<usize> {
        use codespan_reporting::diagnostic::{Diagnostic, Label};

        let message = self.message();
        let diagnostic = Diagnostic::error()
            .with_message(message.clone())
            .with_code(self.kind.code_name());
        if self.span.is_synthetic() {
            return diagnostic;
        }
        diagnostic.with_labels(vec![
            Label::primary(self.span.file.index(), self.span.range()).with_message(message),
        ])
    }

    /// Message text including the offending name
    #[must_use]
    pub fn message(&self) -> String {
        match &self.name {
            Some(name) => format!("{}: `{name}`", self.kind),
            None => self.kind.to_string(),
        }
    }
}

impl ErrorKind {
    /// Short stable code for the kind
    #[must_use]
    pub const fn code_name(&self) -> &'static str {
        match self {
            Self::UnknownType => "E0001",
            Self::UnknownName => "E0002",
            Self::NameAlreadyExists => "E0003",
            Self::IncompatibleType => "E0004",
            Self::UnknownFunctionNameOrWrongParameters => "E0005",
            Self::InterfaceMemberNotFound => "E0006",
            Self::OnlyInClassScope => "E0007",
            Self::OnlyOneParameterAllowedInOperator => "E0008",
            Self::UndefinedType => "E0009",
            Self::InvalidExpression => "E0010",
            Self::PathNotFound { .. } => "E0011",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.kind.code_name(), self.message())?;
        if !self.span.is_synthetic() {
            write!(
                f,
                " at {}:{}..{}",
                self.span.file.0, self.span.span.start, self.span.span.end
            )?;
        }
        Ok(())
    }
}

/// Append-only diagnostics sink shared by all phases
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    ///
    /// A diagnostic identical to the previous one is dropped; several
    /// checks on the same node can otherwise report the same failure twice.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.errors.last() == Some(&diagnostic) {
            return;
        }
        tracing::debug!(%diagnostic, "diagnostic");
        self.errors.push(diagnostic);
    }

    /// Record an error of `kind` at `span`
    pub fn add_error(&mut self, span: FileSpan, kind: ErrorKind) {
        self.push(Diagnostic::new(kind, span));
    }

    /// Record an error of `kind` at `span`, naming the offending symbol
    pub fn add_named_error(&mut self, span: FileSpan, name: impl Into<String>, kind: ErrorKind) {
        self.push(Diagnostic::new(kind, span).with_name(name));
    }

    /// Whether any error was reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All reported errors in report order
    #[must_use]
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Number of reported errors
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors of a given kind
    #[must_use]
    pub fn count(&self, kind: &ErrorKind) -> usize {
        self.errors.iter().filter(|diag| &diag.kind == kind).count()
    }

    /// Convert every error for `codespan-reporting`
    #[must_use]
    pub fn to_codespan(&self) -> Vec<codespan_reporting::diagnostic::Diagnostic<usize>> {
        self.errors
            .iter()
            .map(Diagnostic::to_codespan_diagnostic)
            .collect()
    }

    /// One line per error, in report order
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for diag in &self.errors {
            out.push_str(&diag.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use rc_span::{FileId, Span};

    fn at(start: u32, end: u32) -> FileSpan {
        FileSpan::new(FileId::new(0), Span::new(start, end))
    }

    #[test]
    fn test_repeated_error_is_dropped() {
        let mut diags = Diagnostics::new();
        diags.add_error(at(1, 4), ErrorKind::UnknownType);
        diags.add_error(at(1, 4), ErrorKind::UnknownType);
        diags.add_error(at(6, 9), ErrorKind::UnknownType);
        assert_eq!(diags.count(&ErrorKind::UnknownType), 2);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_render() {
        let mut diags = Diagnostics::new();
        diags.add_named_error(at(6, 9), "Foo", ErrorKind::NameAlreadyExists);
        diags.add_error(
            FileSpan::SYNTHETIC,
            ErrorKind::PathNotFound {
                path: "util.run".to_string(),
            },
        );
        expect![[r#"
            error[E0003]: name already exists: `Foo` at 0:6..9
            error[E0011]: path not found: 'util.run'
        "#]]
        .assert_eq(&diags.render());
    }

    #[test]
    fn test_codespan_label_skipped_for_synthetic() {
        let diag = Diagnostic::new(ErrorKind::UnknownName, FileSpan::SYNTHETIC);
        assert!(diag.to_codespan_diagnostic().labels.is_empty());
        let diag = Diagnostic::new(ErrorKind::UnknownName, at(2, 3));
        assert_eq!(diag.to_codespan_diagnostic().labels.len(), 1);
    }
}
