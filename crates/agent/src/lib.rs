//! The TrendPost agent.
//!
//! A turn runs the oracle in a loop:
//!
//! 1. **Append** the user message to the session's conversation
//! 2. **Consult** the oracle with the system prompt, tool catalog and conversation
//! 3. **If tool calls**: execute all of them, append calls and results as one pair, go to 2
//! 4. **If text**: append it and return it as the answer
//!
//! A round ceiling bounds step 3; hitting it ends the turn with a fallback
//! answer instead of an error.

pub mod loop_runner;
pub mod prompts;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, NO_ANSWER_PLACEHOLDER, ROUND_LIMIT_ERROR, TurnOutcome};
pub use prompts::system_prompt;
pub use session::{AgentSession, SessionStore, SharedSession};
