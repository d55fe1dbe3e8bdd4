// Chat-backed guidance: free-form coaching chat, resume review, skill-gap analysis.
// All completions go through providers::chat.

pub mod analysis;
pub mod handlers;
pub mod prompts;
