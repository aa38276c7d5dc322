//! Per-session conversation state
//!
//! Holds everything one learner's session accumulates: the onboarding stage,
//! what is known about the learner, the message log and the audio rendered
//! for assistant messages. Nothing here is shared between sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use tutor_core::{AudioAsset, ChatMessage, MessageId, MessageLog, TurnRole, UserInfo};

use crate::stage::{OnboardingStage, StageManager, StageTransition, TransitionReason};
use crate::AgentError;

/// What a user message did to the onboarding state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingOutcome {
    /// Message stored as the learner's name
    NameCaptured,
    /// Message stored as the proficiency level
    ProficiencyCaptured,
    /// Regular chat turn
    Chatting,
}

/// One record for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub id: MessageId,
    pub role: TurnRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_html: Option<String>,
}

/// State of one tutoring session
#[derive(Debug, Clone)]
pub struct ConversationState {
    id: String,
    created_at: DateTime<Utc>,
    stages: StageManager,
    user: UserInfo,
    log: MessageLog,
    audio: BTreeMap<MessageId, AudioAsset>,
}

impl ConversationState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            stages: StageManager::new(),
            user: UserInfo::new(),
            log: MessageLog::new(),
            audio: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn stage(&self) -> OnboardingStage {
        self.stages.current()
    }

    pub fn stage_history(&self) -> &[StageTransition] {
        self.stages.history()
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn audio(&self, id: MessageId) -> Option<&AudioAsset> {
        self.audio.get(&id)
    }

    pub fn audio_count(&self) -> usize {
        self.audio.len()
    }

    /// User messages recorded so far
    pub fn turn_count(&self) -> usize {
        self.log.user_turns()
    }

    /// User messages recorded while in `stage`
    pub fn turns_in(&self, stage: OnboardingStage) -> usize {
        self.stages.turns_in(stage)
    }

    /// Append a user message and advance onboarding
    ///
    /// The first message becomes the name, the second the proficiency
    /// (lower-cased). Blank messages are rejected without touching the log.
    pub fn record_user_message(
        &mut self,
        content: &str,
    ) -> Result<(MessageId, OnboardingOutcome), AgentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AgentError::EmptyMessage);
        }

        let stage = self.stages.current();
        self.stages.record_turn();
        let id = self.log.push(TurnRole::User, content);

        let outcome = match stage {
            OnboardingStage::AwaitingName => {
                self.user.set_name(content);
                self.stages
                    .transition(stage.next(), TransitionReason::NameCaptured)?;
                OnboardingOutcome::NameCaptured
            }
            OnboardingStage::AwaitingProficiency => {
                self.user.set_proficiency(content);
                self.stages
                    .transition(stage.next(), TransitionReason::ProficiencyCaptured)?;
                OnboardingOutcome::ProficiencyCaptured
            }
            OnboardingStage::Chatting => OnboardingOutcome::Chatting,
        };

        tracing::debug!(
            session_id = %self.id,
            message_id = id,
            stage = self.stages.current().as_str(),
            "Recorded user message"
        );

        Ok((id, outcome))
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.log.push(TurnRole::Assistant, content)
    }

    /// Attach the audio for an assistant message
    ///
    /// Each assistant message gets at most one asset, and assets never change.
    pub fn attach_audio(&mut self, asset: AudioAsset) -> Result<(), AgentError> {
        let id = asset.message_id;
        match self.log.get(id) {
            None => return Err(AgentError::UnknownMessage(id)),
            Some(message) if message.role != TurnRole::Assistant => {
                return Err(AgentError::NotAssistant(id))
            }
            Some(_) => {}
        }

        if self.audio.contains_key(&id) {
            return Err(AgentError::DuplicateAudio(id));
        }

        self.audio.insert(id, asset);
        Ok(())
    }

    /// All messages in order, with embeddable audio where present
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.log.iter().map(|m| self.entry(m)).collect()
    }

    fn entry(&self, message: &ChatMessage) -> TranscriptEntry {
        TranscriptEntry {
            id: message.id,
            role: message.role,
            content: message.content.clone(),
            audio_html: self.audio.get(&message.id).map(AudioAsset::to_html),
        }
    }
}
