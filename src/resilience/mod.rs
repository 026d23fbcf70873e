//! # Resilience
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`readiness`] | Poll a health probe until the service answers |
//! | [`retry`] | Opt-in caller-side retry with exponential backoff |
//!
//! ```rust,no_run
//! use ai_services_client::resilience::ReadinessGate;
//! use ai_services_client::GenerationClient;
//!
//! # async fn demo() -> ai_services_client::Result<()> {
//! let client = GenerationClient::builder().build()?;
//! let status = ReadinessGate::from_env().wait(&client).await;
//! if !status.ready {
//!     eprintln!("gave up after {} attempts", status.attempts);
//! }
//! # Ok(())
//! # }
//! ```

pub mod readiness;
pub mod retry;

pub use readiness::{wait_until_ready, FnProbe, HealthProbe, HealthStatus, ReadinessGate};
pub use retry::RetryPolicy;
