pub mod conversation;
pub mod registry;

pub use conversation::{ChunkOutcome, Conversation, PendingReply};
pub use registry::SessionRegistry;
