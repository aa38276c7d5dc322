//! Stage-Based Dialog Management
//!
//! Onboarding collects the learner's name, then their proficiency, and then
//! the conversation stays in free chat for the rest of the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::AgentError;

/// Onboarding stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    /// No name stored yet
    #[default]
    AwaitingName,
    /// Name stored, proficiency not yet
    AwaitingProficiency,
    /// Free conversation
    Chatting,
}

impl OnboardingStage {
    /// Every stage, in onboarding order
    pub const ALL: [OnboardingStage; 3] = [
        OnboardingStage::AwaitingName,
        OnboardingStage::AwaitingProficiency,
        OnboardingStage::Chatting,
    ];

    /// Get stage display name
    pub fn display_name(&self) -> &'static str {
        match self {
            OnboardingStage::AwaitingName => "Awaiting Name",
            OnboardingStage::AwaitingProficiency => "Awaiting Proficiency",
            OnboardingStage::Chatting => "Chatting",
        }
    }

    /// Stable identifier for logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStage::AwaitingName => "awaiting_name",
            OnboardingStage::AwaitingProficiency => "awaiting_proficiency",
            OnboardingStage::Chatting => "chatting",
        }
    }

    pub fn valid_transitions(&self) -> Vec<OnboardingStage> {
        match self {
            OnboardingStage::AwaitingName => vec![OnboardingStage::AwaitingProficiency],
            OnboardingStage::AwaitingProficiency => vec![OnboardingStage::Chatting],
            OnboardingStage::Chatting => vec![],
        }
    }

    /// Stage reached after the next user message
    pub fn next(&self) -> OnboardingStage {
        match self {
            OnboardingStage::AwaitingName => OnboardingStage::AwaitingProficiency,
            OnboardingStage::AwaitingProficiency | OnboardingStage::Chatting => {
                OnboardingStage::Chatting
            }
        }
    }
}

impl std::fmt::Display for OnboardingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTransition {
    pub from: OnboardingStage,
    pub to: OnboardingStage,
    pub reason: TransitionReason,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    NameCaptured,
    ProficiencyCaptured,
}

/// Tracks the current stage and how it was reached
#[derive(Debug, Clone, Default)]
pub struct StageManager {
    current: OnboardingStage,
    history: Vec<StageTransition>,
    stage_turns: HashMap<OnboardingStage, usize>,
}

impl StageManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> OnboardingStage {
        self.current
    }

    /// Count a user turn against the current stage
    pub fn record_turn(&mut self) {
        *self.stage_turns.entry(self.current).or_insert(0) += 1;
    }

    pub fn turns_in(&self, stage: OnboardingStage) -> usize {
        self.stage_turns.get(&stage).copied().unwrap_or(0)
    }

    pub fn transition(
        &mut self,
        to: OnboardingStage,
        reason: TransitionReason,
    ) -> Result<StageTransition, AgentError> {
        let from = self.current;

        if !from.valid_transitions().contains(&to) {
            return Err(AgentError::InvalidTransition { from, to });
        }

        let transition = StageTransition {
            from,
            to,
            reason,
            at: Utc::now(),
        };

        tracing::debug!(from = from.as_str(), to = to.as_str(), "Stage transition");

        self.current = to;
        self.history.push(transition.clone());

        Ok(transition)
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions() {
        let mut manager = StageManager::new();
        assert_eq!(manager.current(), OnboardingStage::AwaitingName);

        manager
            .transition(OnboardingStage::AwaitingProficiency, TransitionReason::NameCaptured)
            .unwrap();
        manager
            .transition(OnboardingStage::Chatting, TransitionReason::ProficiencyCaptured)
            .unwrap();

        assert_eq!(manager.current(), OnboardingStage::Chatting);
        assert_eq!(manager.history().len(), 2);
        assert_eq!(manager.history()[0].from, OnboardingStage::AwaitingName);
        assert_eq!(manager.history()[1].reason, TransitionReason::ProficiencyCaptured);
    }

    #[test]
    fn test_invalid_transition() {
        let mut manager = StageManager::new();
        let result = manager.transition(OnboardingStage::Chatting, TransitionReason::NameCaptured);
        assert!(matches!(
            result,
            Err(AgentError::InvalidTransition {
                from: OnboardingStage::AwaitingName,
                to: OnboardingStage::Chatting
            })
        ));
        assert_eq!(manager.current(), OnboardingStage::AwaitingName);
    }

    #[test]
    fn test_chatting_is_absorbing() {
        assert_eq!(OnboardingStage::Chatting.next(), OnboardingStage::Chatting);
        assert!(OnboardingStage::Chatting.valid_transitions().is_empty());
        assert_eq!(
            OnboardingStage::AwaitingName.next(),
            OnboardingStage::AwaitingProficiency
        );
    }

    #[test]
    fn test_turn_counts() {
        let mut manager = StageManager::new();
        manager.record_turn();
        manager
            .transition(OnboardingStage::AwaitingProficiency, TransitionReason::NameCaptured)
            .unwrap();
        manager.record_turn();
        manager.record_turn();

        assert_eq!(manager.turns_in(OnboardingStage::AwaitingName), 1);
        assert_eq!(manager.turns_in(OnboardingStage::AwaitingProficiency), 2);
        assert_eq!(manager.turns_in(OnboardingStage::Chatting), 0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OnboardingStage::AwaitingProficiency).unwrap();
        assert_eq!(json, "\"awaiting_proficiency\"");
        assert_eq!(OnboardingStage::Chatting.to_string(), "Chatting");
    }
}
