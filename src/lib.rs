//! # ai-services-client
//!
//! Async clients for self-hosted AI services: an Ollama-compatible
//! language-model server and a Whisper-family speech-to-text engine.
//!
//! ## Overview
//!
//! Each client follows the same contract: build a request, send it, parse and
//! validate the response, and hand back either a typed result or a typed
//! [`Error`]. Nothing retries implicitly; a [`resilience::ReadinessGate`]
//! absorbs start-up latency before first use, and [`resilience::RetryPolicy`]
//! is available for callers that want retries.
//!
//! ## Key Features
//!
//! - **Generation**: free-form text, schema-constrained JSON, tool-call proposals,
//!   health probe and model listing via [`GenerationClient`]
//! - **Structured output**: a typed recursive [`structured::ResponseSchema`],
//!   convertible to and from JSON Schema and derivable with `schemars`
//! - **Transcription**: lazily loaded engine behind [`TranscriptionClient`],
//!   with an HTTP engine for OpenAI-compatible transcription servers
//! - **Assistant pipeline**: [`facade::ServiceFacade`] chains both clients
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_services_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ai_services_client::Result<()> {
//!     let client = GenerationClient::builder().model("phi3").build()?;
//!     if !ReadinessGate::default().wait(&client).await.ready {
//!         eprintln!("model server is not up");
//!         return Ok(());
//!     }
//!
//!     let schema = SchemaGenerator::new()
//!         .add_required("location", ResponseSchema::string())
//!         .add_required("temperature", ResponseSchema::number())
//!         .add_required("condition", ResponseSchema::string())
//!         .build();
//!     let weather = client
//!         .generate_structured(&StructuredGenerationRequest::new(
//!             "What's the weather like in Paris?",
//!             schema,
//!         ))
//!         .await?;
//!     println!("{:?}", weather.get("temperature"));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Generation client, endpoint and request types |
//! | [`transcription`] | Transcription client, engine seam, audio helpers |
//! | [`structured`] | Response schemas, validation, JSON extraction |
//! | [`resilience`] | Readiness polling and opt-in retry |
//! | [`transport`] | HTTP seam used by the generation client |
//! | [`config`] | YAML + env configuration |
//! | [`facade`] | Voice-assistant pipeline and status roll-up |
//! | [`types`] | Chat wire format and tool types |

pub mod client;
pub mod config;
pub mod facade;
pub mod resilience;
pub mod structured;
pub mod transcription;
pub mod transport;
pub mod types;

pub use client::{GenerationClient, GenerationClientBuilder, ServiceEndpoint};
pub use facade::prelude;
pub use resilience::{HealthProbe, HealthStatus, ReadinessGate};
pub use transcription::{TranscriptionClient, TranscriptionResult};
pub use types::{ToolInvocation, ToolSpec};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
