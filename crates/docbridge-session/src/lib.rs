//! Conversation session storage.
//!
//! Maps an opaque conversation id to an ordered history of
//! question/answer [`Turn`](docbridge_core::Turn)s: create-on-first-use,
//! append, retrieve, clear.

pub mod conversation;
pub mod store;

pub use conversation::Conversation;
pub use store::ConversationStore;
