//! Script definitions
//!
//! The tutor only speaks Chinese, so `Han` is the only target script.

use serde::{Deserialize, Serialize};

/// Punctuation spoken along with target-script text
pub const TARGET_PUNCTUATION: [char; 4] = ['，', '。', '！', '？'];

/// Script systems found in tutor output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    /// CJK Unified Ideographs
    Han,
}

impl Script {
    /// Get Unicode range for this script (first block only)
    pub fn unicode_range(&self) -> (u32, u32) {
        match self {
            Self::Han => (0x4E00, 0x9FFF),
        }
    }

    /// Check if a character belongs to this script
    pub fn contains_char(&self, c: char) -> bool {
        let code = c as u32;
        let (start, end) = self.unicode_range();
        code >= start && code <= end
    }

    /// Check if any character of `text` belongs to this script
    pub fn appears_in(&self, text: &str) -> bool {
        text.chars().any(|c| self.contains_char(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_han_range() {
        assert!(Script::Han.contains_char('一'));
        assert!(Script::Han.contains_char('鿿'));
        assert!(!Script::Han.contains_char('，'));
        assert!(!Script::Han.contains_char('a'));
    }

    #[test]
    fn test_appears_in() {
        assert!(Script::Han.appears_in("你好!"));
        assert!(!Script::Han.appears_in("nǐ hǎo"));
    }
}
