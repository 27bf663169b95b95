//! Text-generation backends for EcoPulse.
//!
//! All backends implement the `ecopulse_core::Provider` trait.
//! [`router::build_from_config`] selects and wraps the configured one.

pub mod gemini;
pub mod router;
pub mod timeout;

pub use gemini::{GeminiProvider, GeminiSession};
pub use router::{build_from_config, resolve_base_url};
pub use timeout::TimeoutProvider;
