// ABOUTME: Error types for the popup pipeline including the ErrorCode enum and ParseError struct.
// ABOUTME: Timeout errors carry the configured wait budget and the diagnostics captured on failure.

use std::fmt;
use std::time::Duration;

use crate::fetch::diagnostics::DiagnosticBundle;

/// Error codes representing the categories of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The popup fragment never rendered within the wait budget.
    Timeout,
    /// Expected popup or content containers are absent from the markup.
    StructureNotFound,
    /// An image URL does not follow the expected naming convention.
    FormatMismatch,
    /// A template or input file is missing.
    FileNotFound,
    /// Browser launch, navigation or page control failed.
    Browser,
    /// An HTTP resource fetch failed.
    Fetch,
    Io,
    InvalidInput,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Timeout => "timeout",
            ErrorCode::StructureNotFound => "structure not found",
            ErrorCode::FormatMismatch => "format mismatch",
            ErrorCode::FileNotFound => "file not found",
            ErrorCode::Browser => "browser error",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Io => "io error",
            ErrorCode::InvalidInput => "invalid input",
        };
        write!(f, "{}", s)
    }
}

/// The error type for every pipeline operation.
///
/// `target` is the URL, file path or fragment the failure concerns.
#[derive(Debug, thiserror::Error)]
pub struct ParseError {
    pub code: ErrorCode,
    pub target: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
    pub timeout: Option<Duration>,
    pub diagnostics: Option<DiagnosticBundle>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "popup: {} {}: {}", self.op, self.target, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        if let Some(ref bundle) = self.diagnostics {
            write!(f, " (diagnostics: {})", bundle.file_names().join(" / "))?;
        }
        Ok(())
    }
}

impl ParseError {
    fn new(
        code: ErrorCode,
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            target: target.into(),
            op: op.into(),
            source,
            timeout: None,
            diagnostics: None,
        }
    }

    /// Create a Timeout error for a fragment that never appeared.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        timeout: Duration,
        diagnostics: Option<DiagnosticBundle>,
    ) -> Self {
        let mut err = Self::new(
            ErrorCode::Timeout,
            url,
            op,
            Some(anyhow::anyhow!("waited {}ms", timeout.as_millis())),
        );
        err.timeout = Some(timeout);
        err.diagnostics = diagnostics;
        err
    }

    /// Create a StructureNotFound error.
    pub fn structure_not_found(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::StructureNotFound, target, op, source)
    }

    /// Create a FormatMismatch error.
    pub fn format_mismatch(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::FormatMismatch, target, op, source)
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(target: impl Into<String>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::FileNotFound, target, op, None)
    }

    /// Create a Browser error.
    pub fn browser(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Browser, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create an Io error, mapping `NotFound` to FileNotFound.
    pub fn io(target: impl Into<String>, op: impl Into<String>, err: std::io::Error) -> Self {
        let code = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorCode::FileNotFound
        } else {
            ErrorCode::Io
        };
        Self::new(code, target, op, Some(err.into()))
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidInput, target, op, source)
    }

    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    pub fn is_structure_not_found(&self) -> bool {
        self.code == ErrorCode::StructureNotFound
    }

    pub fn is_format_mismatch(&self) -> bool {
        self.code == ErrorCode::FormatMismatch
    }

    pub fn is_file_not_found(&self) -> bool {
        self.code == ErrorCode::FileNotFound
    }

    pub fn is_browser(&self) -> bool {
        self.code == ErrorCode::Browser
    }

    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }
}
