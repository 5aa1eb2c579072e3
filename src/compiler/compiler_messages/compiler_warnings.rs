use crate::compiler::compiler_messages::compiler_errors::{
    CompilerError, DiagnosticCode, ErrorLocation, ErrorType,
};

#[derive(Debug, Clone)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: ErrorLocation,
    pub kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, location: ErrorLocation, kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location,
            kind,
        }
    }

    /// Under `--warnings-as-errors` every warning is re-filed as a semantic
    /// error carrying the same code.
    pub fn into_error(self) -> CompilerError {
        CompilerError::new(self.kind.code(), self.msg, self.location, ErrorType::Semantic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DuplicateInclude,
    ShadowedIdentifier,
    DuplicateMain,
}

impl WarningKind {
    pub fn code(self) -> DiagnosticCode {
        match self {
            WarningKind::DuplicateInclude => DiagnosticCode::DuplicateInclude,
            WarningKind::ShadowedIdentifier => DiagnosticCode::ShadowedIdentifier,
            WarningKind::DuplicateMain => DiagnosticCode::DuplicateMain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promoted_warnings_keep_their_code() {
        let warning = CompilerWarning::new(
            "file already included",
            ErrorLocation::default(),
            WarningKind::DuplicateInclude,
        );
        let error = warning.into_error();
        assert_eq!(error.code, DiagnosticCode::DuplicateInclude);
        assert_eq!(error.error_type, ErrorType::Semantic);
    }
}
