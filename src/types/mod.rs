//! Core request/response types shared by the clients.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatMessage`] | Message in a `/api/chat` exchange |
//! | [`ToolSpec`] | Tool definition offered to the model |
//! | [`ToolInvocation`] | Tool call proposed by the model |

pub mod message;
pub mod tool;

pub use message::{ChatMessage, MessageRole};
pub use tool::{FunctionCallResult, ToolInvocation, ToolSpec};
