//! Dialogue orchestration
//!
//! Runs one learner turn end to end: update the conversation state, ask the
//! completion model for a reply, append it, and render its speakable span.
//! A failed completion leaves the session usable and is reported inline.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use tutor_config::{CompletionConfig, PersonaConfig};
use tutor_core::{AudioAsset, FinishReason, GenerateRequest, LanguageModel, MessageId};
use tutor_llm::PromptBuilder;
use tutor_pipeline::SpeechRenderer;
use tutor_text_processing::primary_section;

use crate::conversation::{ConversationState, OnboardingOutcome};
use crate::stage::OnboardingStage;
use crate::AgentError;

/// Assistant message produced by a turn
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub message_id: MessageId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioAsset>,
}

/// Result of one user turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub user_message_id: MessageId,
    /// Stage after the turn
    pub stage: OnboardingStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<AssistantReply>,
    /// Inline notice when no reply could be generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Composes prompts, calls the model and renders replies
pub struct DialogueOrchestrator {
    llm: Arc<dyn LanguageModel>,
    renderer: Arc<SpeechRenderer>,
    persona: PersonaConfig,
    completion: CompletionConfig,
}

impl DialogueOrchestrator {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        renderer: Arc<SpeechRenderer>,
        persona: PersonaConfig,
    ) -> Self {
        Self {
            llm,
            renderer,
            persona,
            completion: CompletionConfig::default(),
        }
    }

    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn llm(&self) -> &Arc<dyn LanguageModel> {
        &self.llm
    }

    /// Start a session with the greeting and its audio
    pub async fn open_session(&self, id: impl Into<String>) -> ConversationState {
        let mut state = ConversationState::new(id);
        let greeting_id = state.push_assistant(self.persona.greeting.clone());

        if let Some(asset) = self
            .renderer
            .render_text(greeting_id, &self.persona.greeting_speech, None)
            .await
        {
            self.attach(&mut state, asset);
        }

        tracing::info!(session_id = %state.id(), "Opened session");
        state
    }

    /// Handle one user message
    pub async fn handle_turn(
        &self,
        state: &mut ConversationState,
        input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let stage_before = state.stage();
        let (user_message_id, outcome) = state.record_user_message(input)?;

        metrics::counter!("tutor_turns_total", "stage" => stage_before.as_str()).increment(1);

        let request = match outcome {
            OnboardingOutcome::NameCaptured => self.name_ack_request(state),
            OnboardingOutcome::ProficiencyCaptured | OnboardingOutcome::Chatting => {
                self.chat_request(state)
            }
        };

        let start = Instant::now();
        let response = match self.llm.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("tutor_completion_failures_total").increment(1);
                tracing::warn!(
                    session_id = %state.id(),
                    stage = state.stage().as_str(),
                    error = %e,
                    "Completion failed"
                );
                return Ok(TurnOutcome {
                    user_message_id,
                    stage: state.stage(),
                    reply: None,
                    error: Some(self.persona.reply_failure_notice(&e.to_string())),
                });
            }
        };
        metrics::histogram!("tutor_completion_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        if response.finish_reason == FinishReason::Length {
            tracing::warn!(session_id = %state.id(), "Reply truncated at max_tokens");
        }

        let content = response.text;
        let message_id = state.push_assistant(content.clone());
        let name = state.user().name().map(str::to_string);

        let speech_source = match outcome {
            OnboardingOutcome::NameCaptured => self.persona.name_followup_speech.as_str(),
            _ => primary_section(&content),
        };

        let audio = self
            .renderer
            .render_text(message_id, speech_source, name.as_deref())
            .await;
        if let Some(asset) = &audio {
            self.attach(state, asset.clone());
        }

        tracing::info!(
            session_id = %state.id(),
            message_id,
            stage = state.stage().as_str(),
            has_audio = audio.is_some(),
            "Turn complete"
        );

        Ok(TurnOutcome {
            user_message_id,
            stage: state.stage(),
            reply: Some(AssistantReply {
                message_id,
                content,
                audio,
            }),
            error: None,
        })
    }

    /// Persona prompt followed by the fixed name follow-up
    fn name_ack_request(&self, state: &ConversationState) -> GenerateRequest {
        let name = state.user().name().unwrap_or_default();
        let request = PromptBuilder::new(self.persona.system_prompt.clone())
            .with_assistant(self.persona.name_followup(name))
            .build_request();
        self.with_parameters(request)
    }

    /// Persona prompt with learner details, then the whole log
    fn chat_request(&self, state: &ConversationState) -> GenerateRequest {
        let request = PromptBuilder::new(self.persona.system_prompt.clone())
            .with_user_info(state.user())
            .with_history(state.log())
            .build_request();
        self.with_parameters(request)
    }

    fn with_parameters(&self, mut request: GenerateRequest) -> GenerateRequest {
        if let Some(max_tokens) = self.completion.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.completion.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    fn attach(&self, state: &mut ConversationState, asset: AudioAsset) {
        let message_id = asset.message_id;
        if let Err(e) = state.attach_audio(asset) {
            tracing::error!(session_id = %state.id(), message_id, error = %e, "Audio not attached");
        }
    }
}
