use crate::models::{ChatEntry, ChatMode};
use chrono::Utc;

/// Per-session mutable state: the current mode and the ordered
/// transcript. Mode switches clear nothing; only [`SessionState::reset`]
/// discards the transcript.
#[derive(Debug)]
pub struct SessionState {
    mode: ChatMode,
    transcript: Vec<ChatEntry>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            // The source UI preselects its "Chat With PDFs" entry.
            mode: ChatMode::ChatWithPdfs,
            transcript: Vec::new(),
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn record(&mut self, query: impl Into<String>, response: impl Into<String>) -> &ChatEntry {
        self.transcript.push(ChatEntry {
            query: query.into(),
            response: response.into(),
            asked_at: Utc::now(),
        });
        let last = self.transcript.len() - 1;
        &self.transcript[last]
    }

    pub fn reset(&mut self) {
        self.transcript.clear();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
