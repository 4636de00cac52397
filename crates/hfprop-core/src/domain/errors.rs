use super::EngineDiagnostics;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PredictResult<T> = Result<T, PredictError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    InvalidRequest,
    EngineMissing,
    EngineTimeout,
    EngineNonZeroExit,
    ReportMissing,
    ParseDegraded,
    IoSystem,
    Internal,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::EngineMissing => "EngineMissing",
            Self::EngineTimeout => "EngineTimeout",
            Self::EngineNonZeroExit => "EngineNonZeroExit",
            Self::ReportMissing => "ReportMissing",
            Self::ParseDegraded => "ParseDegraded",
            Self::IoSystem => "IoSystem",
            Self::Internal => "Internal",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InvalidRequest => 2,
            Self::IoSystem => 3,
            Self::EngineMissing
            | Self::EngineTimeout
            | Self::EngineNonZeroExit
            | Self::ReportMissing
            | Self::ParseDegraded => 4,
            Self::Internal => 5,
        }
    }

    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            _ => 500,
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictError {
    category: ErrorCategory,
    code: &'static str,
    message: String,
    diagnostics: Option<Box<EngineDiagnostics>>,
}

impl PredictError {
    pub fn new(category: ErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
            diagnostics: None,
        }
    }

    pub fn invalid_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InvalidRequest, code, message)
    }

    pub fn engine_missing(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::EngineMissing, code, message)
    }

    pub fn engine_timeout(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::EngineTimeout, code, message)
    }

    pub fn engine_non_zero_exit(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::EngineNonZeroExit, code, message)
    }

    pub fn report_missing(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ReportMissing, code, message)
    }

    pub fn parse_degraded(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ParseDegraded, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::IoSystem, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, code, message)
    }

    pub fn with_diagnostics(mut self, diagnostics: EngineDiagnostics) -> Self {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    /// Attaches the generated engine input unless diagnostics already carry one.
    pub fn with_input(mut self, input: &str) -> Self {
        let diagnostics = self.diagnostics.get_or_insert_with(Default::default);
        if diagnostics.input.is_empty() {
            diagnostics.input = input.to_string();
        }
        self
    }

    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn diagnostics(&self) -> Option<&EngineDiagnostics> {
        self.diagnostics.as_deref()
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub const fn http_status(&self) -> u16 {
        self.category.http_status()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error: self.message.clone(),
            code: self.code.to_string(),
            category: self.category,
            diagnostics: self.diagnostics.as_deref().cloned(),
        }
    }
}

impl Display for PredictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.code, self.message)
    }
}

impl Error for PredictError {}

/// Structured body returned to callers when a prediction fails outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: String,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<EngineDiagnostics>,
}
