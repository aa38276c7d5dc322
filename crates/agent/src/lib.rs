//! Conversational tutor agent
//!
//! Features:
//! - Onboarding state machine (name, then proficiency, then free chat)
//! - Per-session conversation state: message log, learner info, audio assets
//! - Dialogue orchestration over a `LanguageModel` and a `SpeechRenderer`

pub mod conversation;
pub mod orchestrator;
pub mod stage;

pub use conversation::{ConversationState, OnboardingOutcome, TranscriptEntry};
pub use orchestrator::{AssistantReply, DialogueOrchestrator, TurnOutcome};
pub use stage::{OnboardingStage, StageManager, StageTransition, TransitionReason};

use thiserror::Error;
use tutor_core::MessageId;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: OnboardingStage,
        to: OnboardingStage,
    },

    #[error("No message with id {0}")]
    UnknownMessage(MessageId),

    #[error("Message {0} is not an assistant message")]
    NotAssistant(MessageId),

    #[error("Message {0} already has audio")]
    DuplicateAudio(MessageId),
}

impl From<AgentError> for tutor_core::Error {
    fn from(err: AgentError) -> Self {
        tutor_core::Error::Conversation(err.to_string())
    }
}
