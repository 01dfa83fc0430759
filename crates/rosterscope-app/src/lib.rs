// Session layer: owns the shared table, the assistant client and the
// conversation history, and runs caller requests against them.

pub mod conversation;
pub mod session;

pub use conversation::{Conversation, Exchange};
pub use session::Session;
