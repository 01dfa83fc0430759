// Chat-completion client for the external data assistant.

pub mod client;
pub mod protocol;

pub use client::{Assistant, ChatClient, LlmClient};
pub use protocol::LlmEvent;
