//! Prompt Building
//!
//! Assembles the message list sent to the completion model: the persona
//! prompt (with whatever is known about the learner appended), then history.

use tutor_core::{GenerateRequest, Message, MessageLog, UserInfo};

/// Builder for completion prompts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_prompt: String,
    context_lines: Vec<String>,
    messages: Vec<Message>,
}

impl PromptBuilder {
    /// Start from the persona prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }

    /// Append a `Label: value` line to the system message
    pub fn with_context(mut self, label: &str, value: impl AsRef<str>) -> Self {
        self.context_lines
            .push(format!("{}: {}", label, value.as_ref()));
        self
    }

    /// Append the learner's name and proficiency, when known
    pub fn with_user_info(mut self, user: &UserInfo) -> Self {
        if let Some(name) = user.name() {
            self = self.with_context("User's name", name);
        }
        if let Some(level) = user.proficiency() {
            self = self.with_context("Proficiency level", level);
        }
        self
    }

    /// Append every message of the log, in order
    pub fn with_history(mut self, log: &MessageLog) -> Self {
        self.messages.extend(log.to_llm_messages());
        self
    }

    /// Append one assistant message
    pub fn with_assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Append one user message
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// The system message text
    pub fn system_message(&self) -> String {
        let mut system = self.system_prompt.clone();
        for line in &self.context_lines {
            system.push('\n');
            system.push_str(line);
        }
        system
    }

    /// Build the message list
    pub fn build(self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(Message::system(self.system_message()));
        messages.extend(self.messages);
        messages
    }

    /// Build a request for `LanguageModel::generate`
    pub fn build_request(self) -> GenerateRequest {
        GenerateRequest::from_messages(self.build())
    }
}
