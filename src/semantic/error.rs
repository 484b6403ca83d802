//! Errors raised by the rewrite passes.

use std::fmt;

use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::SourceLocation;
use crate::diag::Diag;
use crate::semantic::diag::{SemanticDiagBuilder, SemanticDiagKind};

/// Result type for every semantic pass.
pub type SemanticResult<T> = Result<T, SemanticError>;

/// Stable error codes handed to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AmbiguousBinding,
    UnboundBinding,
    IllegalGlobalVariableAccess,
    MalformedProjection,
    Interrupted,
    InternalError,
}

impl ErrorCode {
    /// The stable string form, e.g. `semantic::unbound_binding`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AmbiguousBinding => "semantic::ambiguous_binding",
            ErrorCode::UnboundBinding => "semantic::unbound_binding",
            ErrorCode::IllegalGlobalVariableAccess => "semantic::illegal_global_variable_access",
            ErrorCode::MalformedProjection => "semantic::malformed_projection",
            ErrorCode::Interrupted => "compile::interrupted",
            ErrorCode::InternalError => "internal::precondition_violated",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that aborts compilation of the whole statement.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SemanticError {
    #[error("a variable named '{name}' was already defined in this scope")]
    #[diagnostic(
        code(semantic::ambiguous_binding),
        help("bound names are compared case-insensitively; rename one of them")
    )]
    AmbiguousBinding {
        name: SmolStr,
        location: Option<SourceLocation>,
    },

    #[error("no such variable named '{name}'")]
    #[diagnostic(code(semantic::unbound_binding))]
    UnboundBinding {
        name: SmolStr,
        location: Option<SourceLocation>,
    },

    #[error("global variable '{name}' cannot be accessed in this context")]
    #[diagnostic(code(semantic::illegal_global_variable_access))]
    IllegalGlobalAccess {
        name: SmolStr,
        location: Option<SourceLocation>,
    },

    #[error("{message}")]
    #[diagnostic(
        code(semantic::malformed_projection),
        help("`*` cannot be combined with other projection items")
    )]
    MalformedProjection {
        message: String,
        location: Option<SourceLocation>,
    },

    #[error("compilation was interrupted")]
    #[diagnostic(code(compile::interrupted))]
    Interrupted,

    /// A pass ran before the pass that establishes its precondition.
    #[error("internal error: {message}")]
    #[diagnostic(code(internal::precondition_violated))]
    Internal { message: String },
}

impl SemanticError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        SemanticError::Internal {
            message: message.into(),
        }
    }

    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SemanticError::AmbiguousBinding { .. } => ErrorCode::AmbiguousBinding,
            SemanticError::UnboundBinding { .. } => ErrorCode::UnboundBinding,
            SemanticError::IllegalGlobalAccess { .. } => ErrorCode::IllegalGlobalVariableAccess,
            SemanticError::MalformedProjection { .. } => ErrorCode::MalformedProjection,
            SemanticError::Interrupted => ErrorCode::Interrupted,
            SemanticError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// The offending binding name, for binding errors.
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            SemanticError::AmbiguousBinding { name, .. }
            | SemanticError::UnboundBinding { name, .. }
            | SemanticError::IllegalGlobalAccess { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Where the error was detected, if known.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            SemanticError::AmbiguousBinding { location, .. }
            | SemanticError::UnboundBinding { location, .. }
            | SemanticError::IllegalGlobalAccess { location, .. }
            | SemanticError::MalformedProjection { location, .. } => *location,
            SemanticError::Interrupted | SemanticError::Internal { .. } => None,
        }
    }

    /// Returns true for errors that indicate misuse of the pass pipeline rather
    /// than a problem with the user's query.
    pub fn is_internal(&self) -> bool {
        matches!(self, SemanticError::Internal { .. })
    }

    /// Converts this error into a renderable diagnostic.
    pub fn to_diag(&self) -> Diag {
        let kind = match self {
            SemanticError::AmbiguousBinding { .. } => SemanticDiagKind::AmbiguousBinding,
            SemanticError::UnboundBinding { .. } => SemanticDiagKind::UnboundBinding,
            SemanticError::IllegalGlobalAccess { .. } => SemanticDiagKind::IllegalGlobalAccess,
            SemanticError::MalformedProjection { .. } => SemanticDiagKind::MalformedProjection,
            SemanticError::Interrupted => SemanticDiagKind::Interrupted,
            SemanticError::Internal { .. } => SemanticDiagKind::InternalConsistency,
        };

        let mut builder = SemanticDiagBuilder::new(kind, self.to_string()).with_code(self.code());
        if let Some(location) = self.location() {
            let label = match self.binding_name() {
                Some(name) => format!("'{name}' referenced here"),
                None => "here".to_string(),
            };
            builder = builder.with_primary_label(location, label);
        }
        if let Some(help) = self.help() {
            builder = builder.with_note(help.to_string());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::LabelRole;

    #[test]
    fn binding_errors_expose_name_code_and_location() {
        let error = SemanticError::UnboundBinding {
            name: "foo".into(),
            location: Some(SourceLocation::new(1, 8, 3)),
        };
        assert_eq!(error.code(), ErrorCode::UnboundBinding);
        assert_eq!(error.binding_name(), Some("foo"));
        assert_eq!(error.location(), Some(SourceLocation::new(1, 8, 3)));
        assert_eq!(error.to_string(), "no such variable named 'foo'");
    }

    #[test]
    fn diagnostic_code_matches_error_code() {
        let error = SemanticError::IllegalGlobalAccess {
            name: "g".into(),
            location: None,
        };
        let code = error.code().to_string();
        let diagnostic_code = Diagnostic::code(&error).map(|c| c.to_string());
        assert_eq!(diagnostic_code.as_deref(), Some(code.as_str()));
    }

    #[test]
    fn to_diag_carries_label_and_code() {
        let error = SemanticError::AmbiguousBinding {
            name: "a".into(),
            location: Some(SourceLocation::new(2, 3, 1)),
        };
        let diag = error.to_diag();
        assert_eq!(diag.code.as_deref(), Some("semantic::ambiguous_binding"));
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.labels[0].role, LabelRole::Primary);
        assert_eq!(diag.labels[0].location, SourceLocation::new(2, 3, 1));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn internal_errors_have_no_location() {
        let error = SemanticError::internal("GROUP BY item has no alias");
        assert!(error.is_internal());
        assert_eq!(error.location(), None);
        assert!(error.to_diag().labels.is_empty());
    }
}
