//! Tool calling types

use crate::structured::ResponseSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A capability the model may propose to invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameter_schema: ResponseSchema,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: ResponseSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
        }
    }

    /// Wire form: `{"type": "function", "function": {name, description, parameters}}`.
    pub fn to_wire(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameter_schema.to_json(),
            }
        })
    }
}

/// A tool invocation proposed by the model, returned for the caller to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}

/// Ordered tool invocations; empty when the model chose not to call a tool.
pub type FunctionCallResult = Vec<ToolInvocation>;
