//! Minimal prelude for application code.

pub use crate::client::{
    FunctionCallRequest, GenerationClient, GenerationOptions, ServiceEndpoint,
    StructuredGenerationRequest, StructuredGenerationResult,
};
pub use crate::config::ServicesConfig;
pub use crate::facade::{AssistantConfig, AssistantReply, ServiceFacade, ServiceStatus};
pub use crate::resilience::{ReadinessGate, RetryPolicy};
pub use crate::structured::{ResponseSchema, SchemaGenerator};
pub use crate::transcription::{AudioSource, TranscriptionClient, WhisperModelSize};
pub use crate::types::{ToolInvocation, ToolSpec};
pub use crate::{Error, ErrorKind, Result};
