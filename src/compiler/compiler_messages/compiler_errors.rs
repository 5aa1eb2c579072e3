//! Unified diagnostic types for the transpiler.
//!
//! Every phase reports through [`CompilerError`] / `CompilerWarning`, which
//! carry an owned location (no interner access needed to display them), a
//! machine-stable [`DiagnosticCode`], and optional structured metadata for
//! richer suggestions.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::compiler::compiler_messages::compiler_warnings::CompilerWarning;

/// The final set of errors and warnings emitted from a compilation.
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn absorb(&mut self, mut other: CompilerMessages) {
        self.errors.append(&mut other.errors);
        self.warnings.append(&mut other.warnings);
    }

    /// Re-files every collected warning as an error. Applied at the end of
    /// validation when `--warnings-as-errors` is set.
    pub fn promote_warnings(&mut self) {
        for warning in self.warnings.drain(..) {
            self.errors.push(warning.into_error());
        }
    }

    /// The most severe error category collected, used by the driver to pick
    /// an exit code.
    pub fn worst_error_type(&self) -> Option<ErrorType> {
        self.errors
            .iter()
            .map(|error| error.error_type)
            .max_by_key(|error_type| error_type.exit_priority())
    }
}

/// Short machine-stable identifiers, one per condition in the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    // Lexical
    UnterminatedComment,
    UnterminatedString,
    UnterminatedStringAtEol,
    UnknownCharacter,
    MalformedNumber,

    // Syntax
    UnexpectedToken,
    MissingDelimiter,
    MalformedExpression,
    InvalidAssignment,

    // Semantic
    UndeclaredIdentifier,
    RedeclaredIdentifier,
    ArityMismatch,
    KindMismatch,
    LengthMismatch,
    NotAnArray,
    DirectRecursion,
    CyclicInclude,
    DuplicateInclude,
    DuplicateMain,
    ShadowedIdentifier,

    // I/O
    MissingFile,
    UnreadableSource,
    UnwritableOutput,
    MemoryLimit,

    // Internal
    Internal,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedComment => "unterminated-comment",
            DiagnosticCode::UnterminatedString => "unterminated-string",
            DiagnosticCode::UnterminatedStringAtEol => "unterminated-string-eol",
            DiagnosticCode::UnknownCharacter => "unknown-character",
            DiagnosticCode::MalformedNumber => "malformed-number",
            DiagnosticCode::UnexpectedToken => "unexpected-token",
            DiagnosticCode::MissingDelimiter => "missing-delimiter",
            DiagnosticCode::MalformedExpression => "malformed-expression",
            DiagnosticCode::InvalidAssignment => "invalid-assignment",
            DiagnosticCode::UndeclaredIdentifier => "undeclared-identifier",
            DiagnosticCode::RedeclaredIdentifier => "redeclared-identifier",
            DiagnosticCode::ArityMismatch => "arity-mismatch",
            DiagnosticCode::KindMismatch => "kind-mismatch",
            DiagnosticCode::LengthMismatch => "length-mismatch",
            DiagnosticCode::NotAnArray => "not-an-array",
            DiagnosticCode::DirectRecursion => "direct-recursion",
            DiagnosticCode::CyclicInclude => "cyclic-include",
            DiagnosticCode::DuplicateInclude => "duplicate-include",
            DiagnosticCode::DuplicateMain => "duplicate-main",
            DiagnosticCode::ShadowedIdentifier => "shadowed-identifier",
            DiagnosticCode::MissingFile => "missing-file",
            DiagnosticCode::UnreadableSource => "unreadable-source",
            DiagnosticCode::UnwritableOutput => "unwritable-output",
            DiagnosticCode::MemoryLimit => "memory-limit",
            DiagnosticCode::Internal => "internal",
        }
    }
}

/// Broad failure categories. These pick the exit code and the display
/// heading; the fine-grained condition lives in [`DiagnosticCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Malformed lexemes surfaced from undefined tokens.
    Lexical,
    /// The token stream does not match the grammar.
    Syntax,
    /// Scoping, kind, arity or include-graph violations.
    Semantic,
    /// Missing or unreadable source, unwritable output.
    File,
    /// Bad command line or project configuration.
    Config,
    /// Invariant violation inside the compiler itself.
    Internal,
}

impl ErrorType {
    pub fn heading(self) -> &'static str {
        match self {
            ErrorType::Lexical => "Lexical Error",
            ErrorType::Syntax => "Syntax Error",
            ErrorType::Semantic => "Semantic Error",
            ErrorType::File => "File Error",
            ErrorType::Config => "Configuration Error",
            ErrorType::Internal => "Internal Compiler Error",
        }
    }

    /// Higher wins when several categories are present at exit.
    pub fn exit_priority(self) -> u8 {
        match self {
            ErrorType::Config => 1,
            ErrorType::Lexical | ErrorType::Syntax => 2,
            ErrorType::Semantic => 3,
            ErrorType::File => 4,
            ErrorType::Internal => 5,
        }
    }
}

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub enum ErrorMetaDataKey {
    CompilationStage,

    PrimarySuggestion,
    SuggestedInsertion,
    SuggestedReplacement,

    ExpectedKind,
    FoundKind,
}

/// A fully owned source location: canonical file path plus 1-based
/// (row, column). Owned so diagnostics can outlive the registry and the
/// string table.
#[derive(Debug, Clone, Default)]
pub struct ErrorLocation {
    pub path: PathBuf,
    pub row: u32,
    pub column: u32,
}

impl ErrorLocation {
    pub fn new(path: PathBuf, row: u32, column: u32) -> ErrorLocation {
        ErrorLocation { path, row, column }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,
    pub code: DiagnosticCode,

    // Structured hints for tooling; values are static so errors stay cheap
    // to construct on the hot parse path.
    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl CompilerError {
    pub fn new(
        code: DiagnosticCode,
        msg: impl Into<String>,
        location: ErrorLocation,
        error_type: ErrorType,
    ) -> CompilerError {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            code,
            metadata: HashMap::new(),
        }
    }

    pub fn with_file_path(mut self, file_path: PathBuf) -> Self {
        self.location.path = file_path;
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }
}

/// Build a syntax error and return it from the current function.
#[macro_export]
macro_rules! return_syntax_error {
    ($code:ident, $msg:expr, $location:expr $(,)?) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::$code,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Syntax,
        ))
    };
    ($code:ident, $msg:expr, $location:expr, { $($key:ident => $value:expr),* $(,)? }) => {{
        let mut error = $crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::$code,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Syntax,
        );
        $(error.new_metadata_entry(
            $crate::compiler::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
            $value,
        );)*
        return Err(error);
    }};
}

/// Build a semantic (scoping / kind / arity) error and return it.
#[macro_export]
macro_rules! return_semantic_error {
    ($code:ident, $msg:expr, $location:expr $(,)?) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::$code,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Semantic,
        ))
    };
    ($code:ident, $msg:expr, $location:expr, { $($key:ident => $value:expr),* $(,)? }) => {{
        let mut error = $crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::$code,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Semantic,
        );
        $(error.new_metadata_entry(
            $crate::compiler::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
            $value,
        );)*
        return Err(error);
    }};
}

/// Build a file/IO error and return it.
#[macro_export]
macro_rules! return_file_error {
    ($code:ident, $msg:expr, $location:expr $(,)?) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::$code,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::File,
        ))
    };
}

/// Invariant violations: not the user's fault.
#[macro_export]
macro_rules! return_internal_error {
    ($msg:expr, $location:expr $(,)?) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompilerError::new(
            $crate::compiler::compiler_messages::compiler_errors::DiagnosticCode::Internal,
            $msg,
            $location,
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Internal,
        ))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(DiagnosticCode::CyclicInclude.as_str(), "cyclic-include");
        assert_eq!(DiagnosticCode::DirectRecursion.as_str(), "direct-recursion");
        assert_eq!(
            DiagnosticCode::UndeclaredIdentifier.as_str(),
            "undeclared-identifier"
        );
    }

    #[test]
    fn worst_error_type_prefers_internal() {
        let mut messages = CompilerMessages::new();
        messages.errors.push(CompilerError::new(
            DiagnosticCode::UnexpectedToken,
            "unexpected",
            ErrorLocation::default(),
            ErrorType::Syntax,
        ));
        messages.errors.push(CompilerError::new(
            DiagnosticCode::Internal,
            "invariant",
            ErrorLocation::default(),
            ErrorType::Internal,
        ));
        assert_eq!(messages.worst_error_type(), Some(ErrorType::Internal));
    }
}
