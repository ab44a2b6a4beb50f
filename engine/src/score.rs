//! Health score extraction
//!
//! Recovers the `Health Score: NN/100` line the report contract asks for.

use regex::Regex;
use std::sync::OnceLock;

/// "Health Score", up to 40 non-digit characters, 1-3 digits, "/100"
static SCORE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn score_pattern() -> &'static Regex {
    SCORE_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)health\s*score[^0-9]{0,40}([0-9]{1,3})\s*/\s*100\b")
            .expect("Invalid health score pattern")
    })
}

/// Extract the health score from report text, clamped to `0..=100`.
///
/// The first match wins. Returns `None` when the text carries no score.
pub fn extract_score(text: &str) -> Option<u8> {
    let captures = score_pattern().captures(text)?;
    let value: u16 = captures.get(1)?.as_str().parse().ok()?;
    Some(value.min(100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_score() {
        assert_eq!(extract_score("Health Score: 97/100"), Some(97));
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(extract_score("Health Score: 150/100"), Some(100));
        assert_eq!(extract_score("Health Score: 999/100"), Some(100));
    }

    #[test]
    fn test_case_and_decoration_insensitive() {
        assert_eq!(extract_score("## HEALTH SCORE — **64 / 100**"), Some(64));
        assert_eq!(extract_score("health score = 0/100"), Some(0));
        assert_eq!(extract_score("HealthScore:5/100"), Some(5));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Health Score: 40/100\n...\nPrevious Health Score: 90/100";
        assert_eq!(extract_score(text), Some(40));
    }

    #[test]
    fn test_no_score() {
        assert_eq!(extract_score(""), None);
        assert_eq!(extract_score("The repository looks fine."), None);
        assert_eq!(extract_score("Health Score: unknown"), None);
        assert_eq!(extract_score("Health Score: 97"), None);
        assert_eq!(extract_score("Health Score: 1234/100"), None);
        assert_eq!(extract_score("Health Score: 97/1000"), None);
    }

    #[test]
    fn test_label_window_is_short() {
        let far = format!("Health Score{}42/100", " ".repeat(41));
        assert_eq!(extract_score(&far), None);
    }

    #[test]
    fn test_label_with_words_before_value() {
        assert_eq!(extract_score("Health Score for acme/widgets: 72/100"), Some(72));
        assert_eq!(
            extract_score("**Overall Health Score (out of one hundred):** 58/100"),
            Some(58)
        );
    }
}
