//! LLM Provider implementations for prbot.
//!
//! All providers implement the `prbot_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
