//! # Aerogate Types
//!
//! Shared protocol types for the Aerogate gateway: the two client wire
//! protocols (OpenAI chat completions, Anthropic messages) and the
//! provider-native Gemini shapes they are translated to and from.

pub mod protocol;

pub use protocol::{claude, gemini, openai};
