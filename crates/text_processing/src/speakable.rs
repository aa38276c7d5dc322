//! Speakable text extraction
//!
//! Reduces a tutor reply to what should be read aloud: tokens carrying
//! target-script characters (stripped down to those characters plus a small
//! punctuation whitelist) and the learner's own name. Lines containing a skip
//! marker are explanations and are dropped entirely.

use regex::{Regex, RegexBuilder};

use tutor_core::{Script, NAME_PLACEHOLDER, TARGET_PUNCTUATION};

use crate::{Result, TextProcessingError};

/// Substrings marking explanation lines (matched case-insensitively)
pub const DEFAULT_SKIP_MARKERS: [&str; 5] = ["breakdown:", "option", "---", "try", "type"];

/// Extracts speakable content from mixed-language text
#[derive(Debug, Clone)]
pub struct SpeakableFilter {
    /// Lower-cased skip markers
    skip_markers: Vec<String>,
    script: Script,
    punctuation: Vec<char>,
}

impl Default for SpeakableFilter {
    fn default() -> Self {
        Self {
            skip_markers: DEFAULT_SKIP_MARKERS.iter().map(|m| m.to_string()).collect(),
            script: Script::Han,
            punctuation: TARGET_PUNCTUATION.to_vec(),
        }
    }
}

impl SpeakableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the skip markers
    pub fn with_skip_markers<I, S>(mut self, markers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for marker in markers {
            let marker = marker.as_ref();
            if marker.trim().is_empty() {
                return Err(TextProcessingError::InvalidMarker(format!(
                    "'{}' would match every line",
                    marker
                )));
            }
            normalized.push(marker.to_lowercase());
        }
        self.skip_markers = normalized;
        Ok(self)
    }

    /// Replace the punctuation kept next to target-script characters
    pub fn with_punctuation(mut self, punctuation: impl IntoIterator<Item = char>) -> Self {
        self.punctuation = punctuation.into_iter().collect();
        self
    }

    pub fn skip_markers(&self) -> &[String] {
        &self.skip_markers
    }

    /// Extract the speakable span of `text`
    ///
    /// `None` means there is nothing to speak; callers treat it as a no-op.
    /// A blank `user_name` is treated as unknown.
    pub fn extract(&self, text: &str, user_name: Option<&str>) -> Option<String> {
        let name = user_name.map(str::trim).filter(|n| !n.is_empty());

        let matcher = match name.map(name_matcher).transpose() {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring learner name in speech filter");
                None
            }
        };

        let text = match name {
            Some(name) => text.replace(NAME_PLACEHOLDER, name),
            None => text.to_string(),
        };

        let mut kept: Vec<String> = Vec::new();
        for line in text.lines() {
            if self.is_skipped(line) {
                continue;
            }

            for token in line.split_whitespace() {
                let piece = match (&matcher, name) {
                    (Some(matcher), Some(name)) if matcher.is_match(token) => {
                        self.name_token(token, matcher, name)
                    }
                    _ if self.script.appears_in(token) => self.keep_speakable(token),
                    _ => continue,
                };

                if !piece.is_empty() {
                    kept.push(piece);
                }
            }
        }

        let speakable = kept.join(" ").trim().to_string();
        if speakable.is_empty() {
            None
        } else {
            Some(speakable)
        }
    }

    /// Whether `line` contains a skip marker
    pub fn is_skipped(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.skip_markers
            .iter()
            .any(|marker| lower.contains(marker.as_str()))
    }

    fn is_speakable_char(&self, c: char) -> bool {
        self.script.contains_char(c) || self.punctuation.contains(&c)
    }

    /// Target-script characters and whitelisted punctuation of `token`
    fn keep_speakable(&self, token: &str) -> String {
        token.chars().filter(|&c| self.is_speakable_char(c)).collect()
    }

    /// Stored name for each match, speakable characters for the rest
    fn name_token(&self, token: &str, matcher: &Regex, name: &str) -> String {
        let mut out = String::new();
        let mut last = 0;
        for found in matcher.find_iter(token) {
            out.push_str(&self.keep_speakable(&token[last..found.start()]));
            out.push_str(name);
            last = found.end();
        }
        out.push_str(&self.keep_speakable(&token[last..]));
        out
    }
}

fn name_matcher(name: &str) -> Result<Regex> {
    RegexBuilder::new(&regex::escape(name))
        .case_insensitive(true)
        .build()
        .map_err(|e| TextProcessingError::InvalidPattern(e.to_string()))
}
