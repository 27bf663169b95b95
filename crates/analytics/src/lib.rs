//! Local analytics for EcoPulse.
//!
//! Everything in this crate is pure and synchronous: it never suspends and
//! never talks to the generation backend.
//!
//! - [`metrics`] — battery-depletion projection
//! - [`prompt`] — analysis prompt and chat system instruction
//! - [`extract`] — labeled-section parser for generated text

pub mod extract;
pub mod metrics;
pub mod prompt;

pub use extract::{SectionMap, SectionTag, extract_section};
pub use metrics::{BATTERY_CAPACITY_KWH, project};
pub use prompt::{build_chat_instruction, build_prompt};
