use crate::structured::{ValidationError, ValidationResult};
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "endpoint.base_url", "tools[1].name")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., HTTP body excerpt, expected type)
    pub details: Option<String>,
    /// Source of the error (e.g., "generation", "transcription", "config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat classification of [`Error`], handy for matching in caller retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Timeout,
    Parse,
    SchemaValidation,
    Engine,
    InvalidRequest,
    Configuration,
}

/// Unified error type for the service clients.
///
/// Every terminal failure of a call maps to exactly one variant; the clients
/// never retry or recover on the caller's behalf.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection refused, DNS failure, or a non-2xx status.
    #[error("Transport failure{}: {message}{}", format_status(.status), format_context(.context))]
    Transport {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("Timed out after {timeout_ms} ms{}", format_context(.context))]
    Timeout { timeout_ms: u64, context: ErrorContext },

    /// The response body could not be decoded in the expected format.
    #[error("Parse failure: {message}{}", format_context(.context))]
    Parse { message: String, context: ErrorContext },

    /// The response decoded but violates the requested schema.
    #[error("Schema validation failed for field(s): {}", .fields.join(", "))]
    SchemaValidation {
        fields: Vec<String>,
        errors: Vec<ValidationError>,
    },

    #[error("Transcription engine failure: {cause}{}", format_context(.context))]
    Engine { cause: String, context: ErrorContext },

    /// Caller-supplied input violated a precondition; raised before any I/O.
    #[error("Invalid request: {message}{}", format_context(.context))]
    InvalidRequest { message: String, context: ErrorContext },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration { message: String, context: ErrorContext },
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn transport_with_context(
        msg: impl Into<String>,
        status: Option<u16>,
        context: ErrorContext,
    ) -> Self {
        Error::Transport {
            message: msg.into(),
            status,
            context,
        }
    }

    pub fn parse_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: msg.into(),
            context,
        }
    }

    pub fn engine_with_context(cause: impl Into<String>, context: ErrorContext) -> Self {
        Error::Engine {
            cause: cause.into(),
            context,
        }
    }

    pub fn invalid_request_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::InvalidRequest {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::invalid_request_with_context(msg, ErrorContext::new())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    pub fn engine(cause: impl Into<String>) -> Self {
        Self::engine_with_context(cause, ErrorContext::new())
    }

    /// Build a schema failure from validator output, collecting the offending field paths.
    pub fn schema_validation(errors: Vec<ValidationError>) -> Self {
        let result = ValidationResult::failure(errors);
        Error::SchemaValidation {
            fields: result.fields(),
            errors: result.errors,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::SchemaValidation { .. } => ErrorKind::SchemaValidation,
            Error::Engine { .. } => ErrorKind::Engine,
            Error::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Error::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether a caller-side retry can succeed. Only transport and timeout failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Timeout)
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Transport { context, .. }
            | Error::Timeout { context, .. }
            | Error::Parse { context, .. }
            | Error::Engine { context, .. }
            | Error::InvalidRequest { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            Error::SchemaValidation { .. } => None,
        }
    }

    /// Attach (or replace) the `source` of the context.
    pub(crate) fn with_source(mut self, source: &str) -> Self {
        match &mut self {
            Error::Transport { context, .. }
            | Error::Timeout { context, .. }
            | Error::Parse { context, .. }
            | Error::Engine { context, .. }
            | Error::InvalidRequest { context, .. }
            | Error::Configuration { context, .. } => {
                context.source = Some(source.to_string());
            }
            Error::SchemaValidation { .. } => {}
        }
        self
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout } => Error::Timeout {
                timeout_ms: timeout.as_millis() as u64,
                context: ErrorContext::new(),
            },
            TransportError::Connect(msg) => {
                Error::transport_with_context(msg, None, ErrorContext::new())
            }
            TransportError::Status { status, body } => Error::transport_with_context(
                format!("remote returned HTTP {}", status),
                Some(status),
                ErrorContext::new().with_details(truncate(&body, 200)),
            ),
            TransportError::Other(msg) => {
                Error::transport_with_context(msg, None, ErrorContext::new())
            }
        }
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}
