//! Language-Score Normalizer — parses free-text language-test expressions
//! into a (test type, score) pair.
//!
//! Unlike the GPA normalizer, an out-of-range score is discarded rather than
//! clamped: a value above the test ceiling indicates a parsing error, not a
//! boundary value.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::case::LanguageTest;

/// Synonym table scanned in fixed order; first match wins.
const SYNONYMS: [(LanguageTest, [&str; 3]); 3] = [
    (LanguageTest::Ielts, ["雅思", "IELTS", "ielts"]),
    (LanguageTest::Toefl, ["托福", "TOEFL", "toefl"]),
    (LanguageTest::Duolingo, ["多邻国", "Duolingo", "duolingo"]),
];

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Parses a raw language-score string.
///
/// The test type comes from keyword matching; the score is the first numeric
/// token. A score above the test's plausibility ceiling resolves to absent
/// while the detected test type is kept.
pub fn parse_language_score(raw: &str) -> (Option<LanguageTest>, Option<f64>) {
    let raw = raw.trim();
    if raw.is_empty() {
        return (None, None);
    }

    let test = SYNONYMS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| raw.contains(kw)))
        .map(|(test, _)| *test);

    let score = SCORE_RE
        .find(raw)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|score| match test {
            Some(test) => *score <= test.ceiling(),
            None => true,
        });

    (test, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ielts_chinese_keyword() {
        assert_eq!(
            parse_language_score("雅思7.5"),
            (Some(LanguageTest::Ielts), Some(7.5))
        );
    }

    #[test]
    fn test_toefl_english_keyword() {
        assert_eq!(
            parse_language_score("TOEFL 105"),
            (Some(LanguageTest::Toefl), Some(105.0))
        );
    }

    #[test]
    fn test_duolingo() {
        assert_eq!(
            parse_language_score("多邻国 125"),
            (Some(LanguageTest::Duolingo), Some(125.0))
        );
    }

    #[test]
    fn test_ielts_score_above_ceiling_discarded() {
        // 95 > 9 — almost certainly a mislabelled TOEFL score; drop it.
        assert_eq!(parse_language_score("雅思 95"), (Some(LanguageTest::Ielts), None));
    }

    #[test]
    fn test_toefl_score_above_ceiling_discarded() {
        assert_eq!(
            parse_language_score("托福 650"),
            (Some(LanguageTest::Toefl), None)
        );
    }

    #[test]
    fn test_score_without_test_type() {
        assert_eq!(parse_language_score("7.0"), (None, Some(7.0)));
    }

    #[test]
    fn test_type_without_numeric_token() {
        assert_eq!(parse_language_score("雅思待考"), (Some(LanguageTest::Ielts), None));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_language_score(""), (None, None));
        assert_eq!(parse_language_score("  "), (None, None));
    }

    #[test]
    fn test_first_synonym_table_match_wins() {
        // Both 雅思 and 托福 present: IELTS is scanned first.
        assert_eq!(
            parse_language_score("雅思6.5 托福90"),
            (Some(LanguageTest::Ielts), Some(6.5))
        );
    }
}
