use std::fmt;

use thiserror::Error;

use surveyforge_core::Error as CoreError;

/// Codes emitted by the plan validator itself.
///
/// Semantic failures carry the code of the core error instead
/// (`invalid_parameter`, `not_positive_semi_definite`, ...), see
/// [`ValidationIssue::from_error`].
pub mod codes {
    pub const SCHEMA_VIOLATION: &str = "schema_violation";
    pub const SCHEMA_UNAVAILABLE: &str = "schema_validation_error";
    pub const INVALID_PLAN_JSON: &str = "invalid_plan_json";
    pub const SMALL_SAMPLE: &str = "small_sample";
    pub const LATENT_WITHOUT_VARIABLES: &str = "latent_without_variables";
    pub const DEPENDENT_MEAN_IGNORED: &str = "dependent_mean_ignored";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

impl IssueSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        }
    }
}

/// One problem found in a plan, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    pub fn error(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(
        code: &str,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Error issue for a failed semantic check, keyed by the core error code.
    ///
    /// Duplicate column names have no parameter of their own and are
    /// reported at the plan root.
    pub fn from_error(err: &CoreError) -> Self {
        Self::error(err.code(), err.parameter().unwrap_or("/"), err.to_string())
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.severity.as_str(),
            self.code,
            self.path,
            self.message
        )?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Errors and warnings of one validation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Report that rejects the plan with a single issue.
    pub fn rejected(issue: ValidationIssue) -> Self {
        let mut report = Self::default();
        report.push(issue);
        report
    }

    /// Report for a plan that passed with warnings.
    pub fn with_warnings(warnings: Vec<ValidationIssue>) -> Self {
        Self {
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// File the issue under errors or warnings by its severity.
    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.is_error() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    /// Errors first, then warnings.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(&self.warnings)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.issues().map(|issue| issue.code.as_str()).collect()
    }
}

/// Plan errors that are not semantic configuration issues.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for plan operations.
pub type Result<T> = std::result::Result<T, PlanError>;
