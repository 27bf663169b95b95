//! # EcoPulse Core
//!
//! Domain types, traits, and error definitions for the EcoPulse energy
//! intelligence system. This crate has **no framework dependencies**; it
//! defines the domain model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The text-generation backend is defined as a trait here. Implementations
//! live in `ecopulse-providers`. This enables:
//! - Swapping backends via configuration
//! - Testing the analysis pipeline with scripted providers
//! - A clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod insight;
pub mod message;
pub mod provider;
pub mod telemetry;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use insight::{AnalysisMode, BatteryProjection, HoursRemaining, InsightRecord, NOT_AVAILABLE};
pub use message::{ChatMessage, ChatRole, Transcript};
pub use provider::{GenerationRequest, GenerationResponse, Provider, RemoteSession, Usage};
pub use telemetry::{EnergyPoint, SensorState, SensorStatus, TelemetrySnapshot, VersionedSnapshot};
