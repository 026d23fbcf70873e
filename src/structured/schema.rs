//! Typed response schemas.
//!
//! [`ResponseSchema`] is a closed, recursive description of the JSON shape a
//! caller expects back. It converts to a JSON-Schema document for the wire
//! (`format` / tool `parameters`) and can be read back from one, including the
//! output of `schemars` for a Rust type.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

const MAX_DEPTH: usize = 32;

/// A named property of an object schema. Declaration order is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub schema: ResponseSchema,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSchema {
    Object {
        properties: Vec<Property>,
        required: Vec<String>,
        /// `None` defers to the validator's strictness.
        additional_properties: Option<bool>,
    },
    Array {
        items: Option<Box<ResponseSchema>>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    String {
        min_length: Option<u64>,
        max_length: Option<u64>,
        pattern: Option<String>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Integer {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Enum(Vec<Value>),
    /// The inner shape, or `null`.
    Nullable(Box<ResponseSchema>),
    /// Any JSON value.
    Any,
}

impl ResponseSchema {
    pub fn string() -> Self {
        ResponseSchema::String {
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn number() -> Self {
        ResponseSchema::Number {
            minimum: None,
            maximum: None,
        }
    }

    pub fn integer() -> Self {
        ResponseSchema::Integer {
            minimum: None,
            maximum: None,
        }
    }

    pub fn boolean() -> Self {
        ResponseSchema::Boolean
    }

    pub fn array_of(items: ResponseSchema) -> Self {
        ResponseSchema::Array {
            items: Some(Box::new(items)),
            min_items: None,
            max_items: None,
        }
    }

    pub fn one_of_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        ResponseSchema::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn nullable(self) -> Self {
        match self {
            ResponseSchema::Nullable(_) => self,
            other => ResponseSchema::Nullable(Box::new(other)),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ResponseSchema::Object { .. })
    }

    /// Names in the object's `required` list; empty for non-object schemas.
    pub fn required(&self) -> &[String] {
        match self {
            ResponseSchema::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Derive a schema from a Rust type via `schemars`.
    pub fn for_type<T: schemars::JsonSchema>() -> Result<Self> {
        let root = schemars::schema_for!(T);
        let value = serde_json::to_value(&root).map_err(|e| {
            Error::invalid_request(format!("cannot serialize generated schema: {}", e))
        })?;
        Self::from_json(&value)
    }

    /// Render as a JSON-Schema document.
    pub fn to_json(&self) -> Value {
        match self {
            ResponseSchema::Object {
                properties,
                required,
                additional_properties,
            } => {
                let mut map = Map::new();
                map.insert("type".into(), json!("object"));
                let mut props = Map::new();
                for p in properties {
                    props.insert(p.name.clone(), p.schema.to_json());
                }
                map.insert("properties".into(), props.into());
                if !required.is_empty() {
                    map.insert("required".into(), json!(required));
                }
                if let Some(additional) = additional_properties {
                    map.insert("additionalProperties".into(), json!(additional));
                }
                map.into()
            }
            ResponseSchema::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut map = Map::new();
                map.insert("type".into(), json!("array"));
                if let Some(items) = items {
                    map.insert("items".into(), items.to_json());
                }
                insert_opt(&mut map, "minItems", *min_items);
                insert_opt(&mut map, "maxItems", *max_items);
                map.into()
            }
            ResponseSchema::String {
                min_length,
                max_length,
                pattern,
            } => {
                let mut map = Map::new();
                map.insert("type".into(), json!("string"));
                insert_opt(&mut map, "minLength", *min_length);
                insert_opt(&mut map, "maxLength", *max_length);
                if let Some(pattern) = pattern {
                    map.insert("pattern".into(), json!(pattern));
                }
                map.into()
            }
            ResponseSchema::Number { minimum, maximum } => {
                numeric_json("number", *minimum, *maximum)
            }
            ResponseSchema::Integer { minimum, maximum } => {
                numeric_json("integer", *minimum, *maximum)
            }
            ResponseSchema::Boolean => json!({"type": "boolean"}),
            ResponseSchema::Enum(values) => {
                if !values.is_empty() && values.iter().all(Value::is_string) {
                    json!({"type": "string", "enum": values})
                } else {
                    json!({ "enum": values })
                }
            }
            ResponseSchema::Nullable(inner) => {
                let mut rendered = inner.to_json();
                match rendered.get("type").and_then(Value::as_str).map(str::to_string) {
                    Some(t) if !matches!(**inner, ResponseSchema::Enum(_)) => {
                        rendered["type"] = json!([t, "null"]);
                        rendered
                    }
                    _ => json!({"anyOf": [rendered, {"type": "null"}]}),
                }
            }
            ResponseSchema::Any => json!({}),
        }
    }

    /// Read a JSON-Schema document.
    ///
    /// Local `$ref`s into `definitions`/`$defs` are resolved; nullable unions
    /// (`type: [T, "null"]`, `anyOf: [X, {type: null}]`) become
    /// [`ResponseSchema::Nullable`]. Anything else outside the supported
    /// subset is rejected with [`Error::InvalidRequest`].
    pub fn from_json(value: &Value) -> Result<Self> {
        Reader { root: value }.node(value, "$", 0)
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, v: Option<u64>) {
    if let Some(v) = v {
        map.insert(key.into(), json!(v));
    }
}

fn numeric_json(type_name: &str, minimum: Option<f64>, maximum: Option<f64>) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), json!(type_name));
    if let Some(m) = minimum {
        map.insert("minimum".into(), json!(m));
    }
    if let Some(m) = maximum {
        map.insert("maximum".into(), json!(m));
    }
    map.into()
}

struct Reader<'a> {
    root: &'a Value,
}

impl<'a> Reader<'a> {
    fn unsupported(&self, path: &str, what: impl Into<String>) -> Error {
        Error::invalid_request_with_context(
            format!("unsupported response schema: {}", what.into()),
            ErrorContext::new().with_field_path(path),
        )
    }

    fn node(&self, v: &'a Value, path: &str, depth: usize) -> Result<ResponseSchema> {
        if depth > MAX_DEPTH {
            return Err(self.unsupported(path, "nesting too deep (recursive $ref?)"));
        }
        let obj = match v {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(ResponseSchema::Any),
            other => return Err(self.unsupported(path, format!("expected an object, got {}", other))),
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            let target = self.resolve(reference, path)?;
            return self.node(target, path, depth + 1);
        }

        if let Some(values) = obj.get("enum").and_then(Value::as_array) {
            let schema = ResponseSchema::Enum(values.clone());
            return Ok(if type_names(obj).iter().any(|t| t == "null") {
                schema.nullable()
            } else {
                schema
            });
        }

        if let Some(variants) = obj
            .get("anyOf")
            .or_else(|| obj.get("oneOf"))
            .and_then(Value::as_array)
        {
            let has_null = variants.iter().any(is_null_schema);
            let rest: Vec<&Value> = variants.iter().filter(|v| !is_null_schema(v)).collect();
            return match (rest.as_slice(), has_null) {
                ([only], true) => Ok(self.node(only, path, depth + 1)?.nullable()),
                ([only], false) => self.node(only, path, depth + 1),
                _ => Err(self.unsupported(path, "anyOf/oneOf with more than one non-null branch")),
            };
        }

        if let Some(all) = obj.get("allOf").and_then(Value::as_array) {
            return match all.as_slice() {
                [only] => self.node(only, path, depth + 1),
                _ => Err(self.unsupported(path, "allOf with more than one branch")),
            };
        }

        let types = type_names(obj);
        let nullable = types.iter().any(|t| t == "null");
        let concrete: Vec<&String> = types.iter().filter(|t| *t != "null").collect();
        let schema = match concrete.as_slice() {
            [] if obj.contains_key("properties") => self.object(obj, path, depth)?,
            [] if nullable => return Err(self.unsupported(path, "bare null type")),
            [] => ResponseSchema::Any,
            [t] => match t.as_str() {
                "object" => self.object(obj, path, depth)?,
                "array" => ResponseSchema::Array {
                    items: match obj.get("items") {
                        Some(items) => {
                            Some(Box::new(self.node(items, &format!("{}[]", path), depth + 1)?))
                        }
                        None => None,
                    },
                    min_items: obj.get("minItems").and_then(Value::as_u64),
                    max_items: obj.get("maxItems").and_then(Value::as_u64),
                },
                "string" => ResponseSchema::String {
                    min_length: obj.get("minLength").and_then(Value::as_u64),
                    max_length: obj.get("maxLength").and_then(Value::as_u64),
                    pattern: obj
                        .get("pattern")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
                "number" => ResponseSchema::Number {
                    minimum: obj.get("minimum").and_then(Value::as_f64),
                    maximum: obj.get("maximum").and_then(Value::as_f64),
                },
                "integer" => ResponseSchema::Integer {
                    minimum: obj.get("minimum").and_then(Value::as_f64),
                    maximum: obj.get("maximum").and_then(Value::as_f64),
                },
                "boolean" => ResponseSchema::Boolean,
                other => return Err(self.unsupported(path, format!("type '{}'", other))),
            },
            _ => return Err(self.unsupported(path, "multiple non-null types")),
        };

        Ok(if nullable { schema.nullable() } else { schema })
    }

    fn object(&self, obj: &'a Map<String, Value>, path: &str, depth: usize) -> Result<ResponseSchema> {
        let mut properties = Vec::new();
        if let Some(props) = obj.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| self.unsupported(path, "'properties' must be an object"))?;
            for (name, schema) in props {
                properties.push(Property {
                    name: name.clone(),
                    schema: self.node(schema, &format!("{}.{}", path, name), depth + 1)?,
                });
            }
        }
        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ResponseSchema::Object {
            properties,
            required,
            // Schema-valued additionalProperties (maps) are accepted without enforcement.
            additional_properties: obj.get("additionalProperties").and_then(Value::as_bool),
        })
    }

    fn resolve(&self, reference: &str, path: &str) -> Result<&'a Value> {
        let target = reference
            .strip_prefix("#/definitions/")
            .map(|name| ("definitions", name))
            .or_else(|| reference.strip_prefix("#/$defs/").map(|name| ("$defs", name)));
        match target {
            Some((section, name)) => self
                .root
                .get(section)
                .and_then(|defs| defs.get(name))
                .ok_or_else(|| self.unsupported(path, format!("dangling $ref '{}'", reference))),
            None => Err(self.unsupported(path, format!("non-local $ref '{}'", reference))),
        }
    }
}

fn type_names(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn is_null_schema(v: &Value) -> bool {
    v.get("type").and_then(Value::as_str) == Some("null")
}

impl Serialize for ResponseSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponseSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ResponseSchema::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Builder for object schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    properties: Vec<Property>,
    required: Vec<String>,
    additional_properties: Option<bool>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property(mut self, name: impl Into<String>, schema: ResponseSchema) -> Self {
        self.properties.push(Property {
            name: name.into(),
            schema,
        });
        self
    }

    /// Add a property and mark it required.
    pub fn add_required(mut self, name: impl Into<String>, schema: ResponseSchema) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.add_property(name, schema)
    }

    pub fn set_required(mut self, required: &[&str]) -> Self {
        self.required = required.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_additional_properties(mut self, additional: bool) -> Self {
        self.additional_properties = Some(additional);
        self
    }

    pub fn build(self) -> ResponseSchema {
        ResponseSchema::Object {
            properties: self.properties,
            required: self.required,
            additional_properties: self.additional_properties,
        }
    }
}
