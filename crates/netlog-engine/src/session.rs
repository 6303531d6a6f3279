// Conversation session and the prompts sent within it

use std::fmt;

use uuid::Uuid;

/// Correlates the context message and the question of one interaction.
/// A new one is created for every question; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
}

impl Session {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

const ASSISTANT_ROLE: &str =
    "You are a helpful assistant trained to understand network logs. The following is an extract from a log file.";

/// First message of a socket conversation: hand over the excerpt, ask for an acknowledgement only
pub fn context_prompt(excerpt: &str) -> String {
    format!(
        "{} I will refer to it in the next question. Please acknowledge receipt, but do not analyse until I provide a question.\n\nLog Extract:{}",
        ASSISTANT_ROLE, excerpt
    )
}

/// Follow-up that refers back to the excerpt sent earlier in the session
pub fn question_prompt(question: &str) -> String {
    format!("Given the previous log extract: {}", question)
}

/// Single message carrying both the excerpt and the question
pub fn combined_prompt(excerpt: &str, question: &str) -> String {
    format!(
        "{}\n\nLog Extract:{}\n\n\nGiven that context: {}",
        ASSISTANT_ROLE, excerpt, question
    )
}
