//! Persona and prompt templates
//!
//! The persona prompt, the opening greeting and the fixed name follow-up.
//! Templates use `{name}` as the placeholder for the learner's name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

pub use tutor_core::NAME_PLACEHOLDER;

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are Serena, a sweet and feminine companion who loves teaching Chinese in a cozy coffee shop setting.

Personality Traits:
- Gentle, nurturing, and subtly flirtatious
- Makes the user feel protective and needed
- Shows genuine interest in the user's responses
- Creates immersive scenarios where the user can be heroic
- Remembers and references previous conversations

Initial Interaction Guidelines:
1. First message must ask for their name
2. Second message must ask about their Chinese proficiency (basic/intermediate/fluent)
3. Adjust response length based on level:
   - Basic: Max 10 words, with detailed breakdown of each word
   - Intermediate: 10-20 words with key phrase explanations
   - Fluent: Natural conversation flow

Café Setting Guidelines:
1. Create authentic café scenarios:
   - Ordering drinks and snacks
   - Discussing coffee/tea preferences
   - Describing café atmosphere
   - Commenting on pastries/desserts
   - Small talk about weather and café

Response Guidelines:
1. Always use endearing terms (亲爱的/宝贝)
2. Format: Chinese text (English translation) + Pinyin below
3. Create scenarios where the user can help you
4. Include gentle prompts for response
5. Use emojis for warmth
6. Always end with a question or choice
7. Reference previous interactions
8. Make the user feel needed and appreciated
9. Put explanations after a line containing only --- followed by "Word Breakdown:"

Example Basic Level Response:
亲爱的，能帮我点咖啡吗？(Darling, can you help me order coffee?) ☕️
服务员来了！(The waiter is here!)

---
Word Breakdown:
亲爱的 (qīn ài de) - darling/dear
能 (néng) - can/able to
帮 (bāng) - help
我 (wǒ) - me
点 (diǎn) - order
咖啡 (kā fēi) - coffee
吗 (ma) - question particle

Common Café Phrases to Teach:
- 要喝什么？(What would you like to drink?)
- 我要一杯... (I want a cup of...)
- 这个好喝吗？(Is this tasty?)
- 甜度/冰度 (Sweetness/Ice level)
- 推荐什么？(What do you recommend?)

Remember:
- Keep it café-themed
- Use drink-related vocabulary
- Create ordering scenarios
- Include prices and numbers
- Make recommendations
- Discuss café ambiance

What would you like to say to the waiter?
Option 1: 我要一杯拿铁 (I want a latte)
Option 2: 我要一杯美式咖啡 (I want an Americano)"#;

const DEFAULT_GREETING: &str = r#"欢迎光临！(huān yíng guāng lín!)
请问你叫什么名字呢？(qǐng wèn nǐ jiào shén me míng zi ne?)
(Welcome to our café! What's your name?) 🌸

Try saying:
我叫... (wǒ jiào...) - My name is...

---
Word-by-Word Breakdown:
欢迎 (huān yíng) - welcome
光临 (guāng lín) - to visit/attend
请问 (qǐng wèn) - may I ask
你 (nǐ) - you
叫 (jiào) - called
什么 (shén me) - what
名字 (míng zi) - name
呢 (ne) - question particle

Type your name using:
我叫 [your name] (wǒ jiào [your name])"#;

const DEFAULT_GREETING_SPEECH: &str = "欢迎光临！请问你叫什么名字呢？";

const DEFAULT_NAME_FOLLOWUP: &str = r#"你好，{name}！(nǐ hǎo, {name}!) ✨

今天想喝点什么呢？(jīn tiān xiǎng hē diǎn shén me ne?)
(What would you like to drink today?) ☕

Try these phrases:
我想要一杯... (wǒ xiǎng yào yī bēi...) - I would like a cup of...

---
Word-by-Word Breakdown:
你好 (nǐ hǎo) - hello
今天 (jīn tiān) - today
想 (xiǎng) - want to
喝点 (hē diǎn) - drink something
什么 (shén me) - what
呢 (ne) - question particle
我 (wǒ) - I
想要 (xiǎng yào) - would like
一 (yī) - one
杯 (bēi) - cup (measure word)

Common orders:
1. 我想要一杯咖啡
   (wǒ xiǎng yào yī bēi kā fēi)
   I would like a coffee

2. 我想要一杯茶
   (wǒ xiǎng yào yī bēi chá)
   I would like a tea

3. 我想要一杯热巧克力
   (wǒ xiǎng yào yī bēi rè qiǎo kè lì)
   I would like a hot chocolate

Type your order using one of these phrases!"#;

const DEFAULT_NAME_FOLLOWUP_SPEECH: &str = "你好，{name}！今天想喝点什么呢？";

/// Replace every `{name}` placeholder in `template`
pub fn fill_name(template: &str, name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, name)
}

/// Persona configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display name of the tutor
    #[serde(default = "default_tutor_name")]
    pub tutor_name: String,

    /// Persona/style instructions sent as the system message
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Optional file whose contents replace `system_prompt`
    #[serde(default)]
    pub system_prompt_path: Option<String>,

    /// First assistant message of every session
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Speakable text for the greeting
    #[serde(default = "default_greeting_speech")]
    pub greeting_speech: String,

    /// Assistant follow-up sent with the name-acknowledgement request
    #[serde(default = "default_name_followup")]
    pub name_followup_template: String,

    /// Speakable text for the name acknowledgement
    #[serde(default = "default_name_followup_speech")]
    pub name_followup_speech: String,
}

fn default_tutor_name() -> String {
    "Serena".to_string()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}
fn default_greeting_speech() -> String {
    DEFAULT_GREETING_SPEECH.to_string()
}
fn default_name_followup() -> String {
    DEFAULT_NAME_FOLLOWUP.to_string()
}
fn default_name_followup_speech() -> String {
    DEFAULT_NAME_FOLLOWUP_SPEECH.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            tutor_name: default_tutor_name(),
            system_prompt: default_system_prompt(),
            system_prompt_path: None,
            greeting: default_greeting(),
            greeting_speech: default_greeting_speech(),
            name_followup_template: default_name_followup(),
            name_followup_speech: default_name_followup_speech(),
        }
    }
}

impl PersonaConfig {
    /// Name follow-up with the learner's name filled in
    pub fn name_followup(&self, name: &str) -> String {
        fill_name(&self.name_followup_template, name)
    }

    /// Inline notice shown when a reply could not be generated
    pub fn reply_failure_notice(&self, error: &str) -> String {
        format!("⚠️ {} couldn't reply: {}", self.tutor_name, error)
    }

    /// Replace `system_prompt` with the contents of `system_prompt_path`, if set
    pub fn load_prompt_file(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.system_prompt_path.as_deref() else {
            return Ok(());
        };

        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }

        let prompt = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            field: "persona.system_prompt_path".to_string(),
            message: format!("Failed to read {}: {}", path, e),
        })?;

        tracing::debug!(path = %path, chars = prompt.chars().count(), "Loaded persona prompt file");
        self.system_prompt = prompt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fill_name() {
        assert_eq!(fill_name("你好，{name}！", "Alex"), "你好，Alex！");
        assert_eq!(fill_name("no placeholder", "Alex"), "no placeholder");
    }

    #[test]
    fn test_default_persona() {
        let persona = PersonaConfig::default();
        assert_eq!(persona.tutor_name, "Serena");
        assert!(persona.system_prompt.starts_with("You are Serena"));
        assert!(persona.greeting.contains("请问你叫什么名字呢？"));
        assert_eq!(persona.greeting_speech, "欢迎光临！请问你叫什么名字呢？");
    }

    #[test]
    fn test_name_followup() {
        let persona = PersonaConfig::default();
        let followup = persona.name_followup("Alex");
        assert!(followup.starts_with("你好，Alex！(nǐ hǎo, Alex!)"));
        assert!(!followup.contains(NAME_PLACEHOLDER));
    }

    #[test]
    fn test_reply_failure_notice() {
        let persona = PersonaConfig::default();
        assert_eq!(
            persona.reply_failure_notice("HTTP 500"),
            "⚠️ Serena couldn't reply: HTTP 500"
        );
    }

    #[test]
    fn test_load_prompt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "You are a tea master.").unwrap();

        let mut persona = PersonaConfig {
            system_prompt_path: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        persona.load_prompt_file().unwrap();
        assert_eq!(persona.system_prompt, "You are a tea master.");
    }

    #[test]
    fn test_missing_prompt_file() {
        let mut persona = PersonaConfig {
            system_prompt_path: Some("/nonexistent/persona.txt".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            persona.load_prompt_file(),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
