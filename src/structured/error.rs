//! Error types for structured output validation.

use serde_json::Value;
use std::fmt;

/// What kind of contract violation a [`ValidationError`] describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A property listed in `required` is absent.
    MissingRequired,
    /// The value has the wrong JSON type.
    TypeMismatch { expected: String, actual: String },
    /// Length, range, pattern or item-count constraint failed.
    Constraint,
    /// Value is not one of the allowed enum members.
    NotInEnum,
    /// Property not declared while additional properties are disallowed.
    UnexpectedProperty,
}

/// Validation error with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    /// Dotted path to the offending location (e.g. `temperature`, `items[0].price`).
    /// `None` means the document root.
    pub path: Option<String>,
    pub value: Option<Value>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>, path: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            path: if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            },
            value: None,
        }
    }

    pub fn with_value(mut self, value: &Value) -> Self {
        self.value = Some(value.clone());
        self
    }

    /// Constraint error at `path`.
    pub fn with_path(message: impl Into<String>, path: String) -> Self {
        Self::new(ValidationErrorKind::Constraint, message, &path)
    }

    pub fn missing(path: &str, name: &str) -> Self {
        Self::new(
            ValidationErrorKind::MissingRequired,
            format!("Missing required property: {}", name),
            path,
        )
    }

    pub fn is_missing(&self) -> bool {
        self.kind == ValidationErrorKind::MissingRequired
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Paths of the offending fields, deduplicated, in discovery order.
    pub fn fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for e in &self.errors {
            let p = e.path.clone().unwrap_or_else(|| "$".to_string());
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out
    }

    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}
