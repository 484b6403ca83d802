//! Semantic diagnostics extending the base diagnostic system.
//!
//! This module provides specialized diagnostic kinds and a builder for errors
//! raised while rewriting a query tree.

use crate::ast::SourceLocation;
use crate::diag::{Diag, DiagLabel, DiagSeverity};
use crate::semantic::error::ErrorCode;

/// Categories of semantic diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticDiagKind {
    /// A name is already bound in the same scope.
    AmbiguousBinding,

    /// No binding and no implicit qualification applies.
    UnboundBinding,

    /// A global was resolved where scoping constraints forbid it.
    IllegalGlobalAccess,

    /// Wildcard combined with other projection items.
    MalformedProjection,

    /// The compile was cancelled.
    Interrupted,

    /// A pass was invoked out of pipeline order.
    InternalConsistency,
}

impl SemanticDiagKind {
    /// Returns a human-readable name for this diagnostic kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::AmbiguousBinding => "AmbiguousBinding",
            Self::UnboundBinding => "UnboundBinding",
            Self::IllegalGlobalAccess => "IllegalGlobalAccess",
            Self::MalformedProjection => "MalformedProjection",
            Self::Interrupted => "Interrupted",
            Self::InternalConsistency => "InternalConsistency",
        }
    }
}

/// Builder for semantic diagnostics.
pub struct SemanticDiagBuilder {
    kind: SemanticDiagKind,
    message: String,
    code: Option<ErrorCode>,
    labels: Vec<DiagLabel>,
    notes: Vec<String>,
    severity: DiagSeverity,
}

impl SemanticDiagBuilder {
    /// Creates a new semantic diagnostic builder.
    pub fn new(kind: SemanticDiagKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            labels: Vec::new(),
            notes: Vec::new(),
            severity: DiagSeverity::Error,
        }
    }

    /// The diagnostic kind this builder produces.
    pub fn kind(&self) -> SemanticDiagKind {
        self.kind
    }

    /// Sets the error code rendered with the diagnostic.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds a primary label at the given location.
    pub fn with_primary_label(
        mut self,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(DiagLabel::primary(location, message));
        self
    }

    /// Adds a secondary label at the given location.
    pub fn with_secondary_label(
        mut self,
        location: SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(DiagLabel::secondary(location, message));
        self
    }

    /// Adds a note to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Sets the diagnostic severity.
    pub fn with_severity(mut self, severity: DiagSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Builds the diagnostic.
    pub fn build(self) -> Diag {
        let mut diag = Diag::new(self.severity, self.message);
        if let Some(code) = self.code {
            diag = diag.with_code(code.as_str());
        }
        for label in self.labels {
            diag = diag.with_label(label);
        }
        for note in self.notes {
            diag = diag.with_note(note);
        }
        diag
    }
}
