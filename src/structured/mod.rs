//! Structured output: typed response schemas, validation, and content decoding.
//!
//! - [`ResponseSchema`]: recursive schema type sent as the `format` of a chat call
//! - [`OutputValidator`]: checks decoded data against a schema
//! - [`parse_json_content`]: decodes model content, tolerating a Markdown fence
//!
//! # Examples
//!
//! ```
//! use ai_services_client::structured::{OutputValidator, ResponseSchema, SchemaGenerator};
//! use serde_json::json;
//!
//! let schema = SchemaGenerator::new()
//!     .add_required("name", ResponseSchema::string())
//!     .add_property("age", ResponseSchema::integer())
//!     .build();
//!
//! let result = OutputValidator::lenient(&schema).validate(&json!({"name": "Alice", "age": 30}));
//! assert!(result.is_valid());
//! ```

pub mod error;
pub mod parse;
pub mod schema;
pub mod validator;

pub use error::{ValidationError, ValidationErrorKind, ValidationResult};
pub use parse::parse_json_content;
pub use schema::{Property, ResponseSchema, SchemaGenerator};
pub use validator::OutputValidator;
