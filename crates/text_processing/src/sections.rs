//! Reply sections

/// Line separating dialogue from explanations in tutor replies
pub const SECTION_DELIMITER: &str = "---";

/// Text before the first delimiter, trimmed
///
/// Replies without a delimiter are returned whole.
pub fn primary_section(text: &str) -> &str {
    text.split_once(SECTION_DELIMITER)
        .map_or(text, |(head, _)| head)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_section() {
        let reply = "亲爱的，你好！\n(Hello, dear!)\n\n---\nWord Breakdown:\n亲爱的 - dear";
        assert_eq!(primary_section(reply), "亲爱的，你好！\n(Hello, dear!)");
    }

    #[test]
    fn test_no_delimiter() {
        assert_eq!(primary_section("  你好！ "), "你好！");
    }

    #[test]
    fn test_only_first_delimiter_counts() {
        assert_eq!(primary_section("a --- b --- c"), "a");
        assert_eq!(primary_section("---\nbreakdown"), "");
    }
}
