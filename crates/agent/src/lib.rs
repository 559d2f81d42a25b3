//! The Corretor turn pipeline.
//!
//! A turn answers one user question, possibly with two LLM requests:
//!
//! 1. **Stream** the first answer through a [`SentinelFilter`] in detect mode
//! 2. **If the model opens with the marker**: abandon the stream, fetch the
//!    listings table once, and replace the last message with the question
//!    plus the data
//! 3. **Stream** the second answer with the marker suppressed
//! 4. **Return** the trimmed, marker-free answer
//!
//! [`ChatSession`] adds bounded history on top for interactive use.

pub mod fetch;
pub mod history;
pub mod marker;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod stream_event;
pub mod stream_filter;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use fetch::{Prefetch, fetch_data};
pub use history::{ConversationHistory, build_messages};
pub use marker::{MarkerMatcher, NEED_DATA_MARKER};
pub use orchestrator::{TurnOrchestrator, TurnReport};
pub use prompt::{SYSTEM_PROMPT, system_prompt};
pub use session::ChatSession;
pub use stream_event::TurnEvent;
pub use stream_filter::{FilterMode, FilterStep, SentinelFilter, StreamOutcome, drive};
