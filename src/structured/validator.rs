//! Output validator for structured responses.
//!
//! Walks a [`ResponseSchema`] alongside the decoded data and reports every
//! violation it finds:
//! - Type checks (string, integer, number, boolean, array, object)
//! - Field constraints (minLength, maxLength, minimum, maximum, pattern, enum)
//! - Array constraints (minItems, maxItems, items schema)
//! - Required and additional properties on objects

use crate::structured::error::{ValidationError, ValidationErrorKind, ValidationResult};
use crate::structured::schema::{Property, ResponseSchema};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Validator for structured output.
///
/// `pattern` constraints are compiled once, when the validator is built.
pub struct OutputValidator<'s> {
    schema: &'s ResponseSchema,
    /// Disallow undeclared properties when the schema does not say.
    strict: bool,
    /// Invalid patterns map to `None` and are not enforced.
    patterns: HashMap<&'s str, Option<Regex>>,
}

impl<'s> OutputValidator<'s> {
    pub fn new(schema: &'s ResponseSchema, strict: bool) -> Self {
        let mut patterns = HashMap::new();
        compile_patterns(schema, &mut patterns);
        Self {
            schema,
            strict,
            patterns,
        }
    }

    pub fn strict(schema: &'s ResponseSchema) -> Self {
        Self::new(schema, true)
    }

    /// Undeclared properties are allowed (and preserved) unless the schema forbids them.
    pub fn lenient(schema: &'s ResponseSchema) -> Self {
        Self::new(schema, false)
    }

    pub fn validate(&self, data: &Value) -> ValidationResult {
        let mut errors = Vec::new();
        self.check(data, self.schema, "", &mut errors);
        ValidationResult::failure(errors)
    }

    fn check(&self, data: &Value, schema: &ResponseSchema, path: &str, errors: &mut Vec<ValidationError>) {
        match schema {
            ResponseSchema::Any => {}
            ResponseSchema::Nullable(inner) => {
                if !data.is_null() {
                    self.check(data, inner, path, errors);
                }
            }
            ResponseSchema::Enum(values) => {
                if !values.contains(data) {
                    let allowed: Vec<String> = values
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => format!("\"{}\"", s),
                            _ => v.to_string(),
                        })
                        .collect();
                    errors.push(
                        ValidationError::new(
                            ValidationErrorKind::NotInEnum,
                            format!("Value not in allowed enum values: {}", allowed.join(", ")),
                            path,
                        )
                        .with_value(data),
                    );
                }
            }
            ResponseSchema::Boolean => {
                if !data.is_boolean() {
                    errors.push(type_mismatch(data, "boolean", path));
                }
            }
            ResponseSchema::String {
                min_length,
                max_length,
                pattern,
            } => match data.as_str() {
                Some(s) => self.check_string(s, *min_length, *max_length, pattern.as_deref(), path, errors),
                None => errors.push(type_mismatch(data, "string", path)),
            },
            ResponseSchema::Number { minimum, maximum } => match data.as_f64() {
                Some(n) if data.is_number() => self.check_range(n, *minimum, *maximum, path, errors),
                _ => errors.push(type_mismatch(data, "number", path)),
            },
            ResponseSchema::Integer { minimum, maximum } => {
                if data.is_i64() || data.is_u64() {
                    if let Some(n) = data.as_f64() {
                        self.check_range(n, *minimum, *maximum, path, errors);
                    }
                } else {
                    errors.push(type_mismatch(data, "integer", path));
                }
            }
            ResponseSchema::Array {
                items,
                min_items,
                max_items,
            } => match data.as_array() {
                Some(arr) => {
                    if let Some(min) = min_items {
                        if (arr.len() as u64) < *min {
                            errors.push(ValidationError::with_path(
                                format!("Array too short (minimum {} items)", min),
                                path.to_string(),
                            ));
                        }
                    }
                    if let Some(max) = max_items {
                        if (arr.len() as u64) > *max {
                            errors.push(ValidationError::with_path(
                                format!("Array too long (maximum {} items)", max),
                                path.to_string(),
                            ));
                        }
                    }
                    if let Some(items) = items {
                        for (i, item) in arr.iter().enumerate() {
                            self.check(item, items, &format!("{}[{}]", path, i), errors);
                        }
                    }
                }
                None => errors.push(type_mismatch(data, "array", path)),
            },
            ResponseSchema::Object {
                properties,
                required,
                additional_properties,
            } => match data.as_object() {
                Some(obj) => {
                    for name in required {
                        if !obj.contains_key(name) {
                            errors.push(ValidationError::missing(&join(path, name), name));
                        }
                    }
                    for Property { name, schema } in properties {
                        if let Some(value) = obj.get(name) {
                            self.check(value, schema, &join(path, name), errors);
                        }
                    }
                    let allow_extra = additional_properties.unwrap_or(!self.strict);
                    if !allow_extra {
                        for key in obj.keys() {
                            if !properties.iter().any(|p| &p.name == key) {
                                errors.push(ValidationError::new(
                                    ValidationErrorKind::UnexpectedProperty,
                                    format!("Additional property not allowed: {}", key),
                                    &join(path, key),
                                ));
                            }
                        }
                    }
                }
                None => errors.push(type_mismatch(data, "object", path)),
            },
        }
    }

    fn check_string(
        &self,
        s: &str,
        min_length: Option<u64>,
        max_length: Option<u64>,
        pattern: Option<&str>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let len = s.chars().count() as u64;
        if let Some(min) = min_length {
            if len < min {
                errors.push(ValidationError::with_path(
                    format!("String too short (minimum {} characters)", min),
                    path.to_string(),
                ));
            }
        }
        if let Some(max) = max_length {
            if len > max {
                errors.push(ValidationError::with_path(
                    format!("String too long (maximum {} characters)", max),
                    path.to_string(),
                ));
            }
        }
        if let Some(Some(re)) = pattern.and_then(|p| self.patterns.get(p)) {
            if !re.is_match(s) {
                errors.push(ValidationError::with_path(
                    "String does not match required pattern".to_string(),
                    path.to_string(),
                ));
            }
        }
    }

    fn check_range(
        &self,
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(min) = minimum {
            if value < min {
                errors.push(ValidationError::with_path(
                    format!("Value below minimum ({})", min),
                    path.to_string(),
                ));
            }
        }
        if let Some(max) = maximum {
            if value > max {
                errors.push(ValidationError::with_path(
                    format!("Value above maximum ({})", max),
                    path.to_string(),
                ));
            }
        }
    }
}

fn compile_patterns<'s>(schema: &'s ResponseSchema, out: &mut HashMap<&'s str, Option<Regex>>) {
    match schema {
        ResponseSchema::String {
            pattern: Some(pattern),
            ..
        } => {
            out.entry(pattern.as_str()).or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(%pattern, error = %e, "ignoring invalid schema pattern");
                    None
                }
            });
        }
        ResponseSchema::Object { properties, .. } => {
            for p in properties {
                compile_patterns(&p.schema, out);
            }
        }
        ResponseSchema::Array { items: Some(items), .. } => compile_patterns(items, out),
        ResponseSchema::Nullable(inner) => compile_patterns(inner, out),
        _ => {}
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn json_type_name(data: &Value) -> &'static str {
    match data {
        Value::String(_) => "string",
        Value::Number(_) => {
            if data.is_i64() || data.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn type_mismatch(data: &Value, expected: &str, path: &str) -> ValidationError {
    let actual = json_type_name(data);
    ValidationError::new(
        ValidationErrorKind::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        },
        format!("Expected type '{}', got '{}'", expected, actual),
        path,
    )
    .with_value(data)
}
