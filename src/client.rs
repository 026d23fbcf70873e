//! Generation client for an Ollama-compatible language-model server.
//!
//! Implementation is split into submodules under `src/client/`.

pub mod builder;
pub mod endpoint;
pub mod generation;
pub mod types;

pub use builder::GenerationClientBuilder;
pub use endpoint::ServiceEndpoint;
pub use generation::{GenerationClient, HEALTH_TIMEOUT};
pub use types::{
    FunctionCallRequest, GenerationOptions, ModelDescriptor, StructuredGenerationRequest,
    StructuredGenerationResult,
};
