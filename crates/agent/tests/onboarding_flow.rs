//! Integration tests for a full tutoring session
//!
//! Drives the orchestrator through real HTTP backends pointed at a mock
//! OpenAI-compatible server: greeting, name, proficiency, then free chat.

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tutor_agent::{DialogueOrchestrator, OnboardingStage};
use tutor_config::Settings;
use tutor_core::{AudioPayload, LanguageModel, TextToSpeech, TurnRole};
use tutor_llm::{LanguageModelAdapter, OpenAIBackend, OpenAIConfig};
use tutor_pipeline::{OpenAiTts, OpenAiTtsConfig, SpeechRenderer};

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

async fn mount_completions(server: &MockServer) {
    // Name acknowledgement carries the fixed follow-up
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("What would you like to drink today?"))
        .respond_with(completion(
            "你好，Alex！(nǐ hǎo, Alex!) ✨\n你的中文水平怎么样？(How is your Chinese?)\n---\nWord Breakdown: 水平 - level",
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Proficiency level: basic"))
        .respond_with(completion(
            "亲爱的，能帮我点咖啡吗？(Darling, can you help me order coffee?) ☕️\n---\nWord Breakdown:\n亲爱的 (qīn ài de) - darling",
        ))
        .mount(server)
        .await;
}

fn orchestrator_for(server: &MockServer) -> DialogueOrchestrator {
    let mut settings = Settings::default();
    settings.openai.endpoint = format!("{}/v1", server.uri());
    settings.openai.api_key = Some("test-key".to_string());

    let backend = OpenAIBackend::new(OpenAIConfig::from_settings(&settings)).unwrap();
    let llm: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));

    let tts: Arc<dyn TextToSpeech> =
        Arc::new(OpenAiTts::new(OpenAiTtsConfig::from_settings(&settings)).unwrap());
    let renderer = Arc::new(SpeechRenderer::from_settings(tts, &settings));

    DialogueOrchestrator::new(llm, renderer, settings.persona.clone())
        .with_completion(settings.completion.clone())
}

#[tokio::test]
async fn test_full_onboarding_flow() {
    let server = MockServer::start().await;
    mount_completions(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x49, 0x44, 0x33]))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let mut state = orchestrator.open_session("flow").await;
    assert_eq!(state.stage(), OnboardingStage::AwaitingName);
    assert!(state.audio(0).is_some_and(|a| a.is_playable()));

    let name_turn = orchestrator.handle_turn(&mut state, "Alex").await.unwrap();
    assert_eq!(name_turn.stage, OnboardingStage::AwaitingProficiency);
    assert!(name_turn.error.is_none());
    assert_eq!(state.user().name(), Some("Alex"));

    let level_turn = orchestrator.handle_turn(&mut state, "Basic").await.unwrap();
    assert_eq!(level_turn.stage, OnboardingStage::Chatting);
    assert_eq!(state.user().proficiency(), Some("basic"));

    let reply = level_turn.reply.unwrap();
    assert!(reply.content.starts_with("亲爱的"));
    match reply.audio.unwrap().payload {
        AudioPayload::Playable { data_uri, .. } => {
            assert_eq!(data_uri, "data:audio/mp3;base64,SUQz");
        }
        other => panic!("expected playable audio, got {:?}", other),
    }

    let transcript = state.transcript();
    let roles: Vec<TurnRole> = transcript.iter().map(|e| e.role).collect();
    assert_eq!(
        roles,
        vec![
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Assistant,
        ]
    );
    for (index, entry) in transcript.iter().enumerate() {
        assert_eq!(entry.id, index);
        assert_eq!(entry.audio_html.is_some(), entry.role == TurnRole::Assistant);
    }
}

#[tokio::test]
async fn test_synthesis_failure_keeps_conversation_going() {
    let server = MockServer::start().await;
    mount_completions(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(500).set_body_string("tts down"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let mut state = orchestrator.open_session("tts-down").await;

    let outcome = orchestrator.handle_turn(&mut state, "Alex").await.unwrap();
    assert!(outcome.error.is_none());

    let audio = outcome.reply.unwrap().audio.unwrap();
    assert!(!audio.is_playable());
    assert!(audio.to_html().starts_with("Error generating audio: "));
    assert!(audio.to_html().contains("tts down"));
    assert_eq!(state.stage(), OnboardingStage::AwaitingProficiency);
}

#[tokio::test]
async fn test_unreachable_completion_reports_inline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let orchestrator = orchestrator_for(&server);
    let mut state = orchestrator.open_session("llm-down").await;

    let outcome = orchestrator.handle_turn(&mut state, "Alex").await.unwrap();
    assert!(outcome.reply.is_none());
    let error = outcome.error.unwrap();
    assert!(error.starts_with("⚠️ Serena couldn't reply: "));
    assert!(error.contains("503"));

    // Name is stored even though no acknowledgement arrived
    assert_eq!(state.user().name(), Some("Alex"));
    assert_eq!(state.stage(), OnboardingStage::AwaitingProficiency);
    assert_eq!(state.log().len(), 2);
}
