// Events emitted by the assistant client while a response streams in.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmEvent {
    /// A chunk of response text.
    Token { text: String },
    /// The response finished; `full_text` is every token concatenated.
    Complete { full_text: String },
    /// Transport or service failure, already rendered for display.
    Error { message: String },
}

impl LlmEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LlmEvent::Token { .. })
    }
}
