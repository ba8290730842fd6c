//! Web chat endpoint
//!
//! A small HTTP service that answers navigation, announcement, and event
//! questions for the building. Replies come from a hosted model via the
//! [`ChatProvider`] trait; recent scrape runs are folded into the system
//! prompt so answers reflect what was last extracted.

pub mod provider;
pub mod server;

pub use provider::{ChatProvider, OpenAiChatProvider};
pub use server::{build_router, serve, AppState};

/// Base system prompt for the navigation assistant.
///
/// Run context (latest announcements and events) is appended at request
/// time by the server.
pub const NAVIGATION_SYSTEM_PROMPT: &str = "You are a campus navigation assistant for a \
college building. Answer questions about finding rooms, offices, and corridors, and about \
course announcements and campus events. Be concise and concrete. When you reference a \
location, name the floor and the nearest corridor or landmark. If you do not know, say so \
rather than guessing.";
