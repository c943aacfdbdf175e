//! String similarity scores on a 0-100 scale
//!
//! Scores are normalized Levenshtein similarity. `token_sort_ratio` sorts
//! the words of both sides first, so "lamp kitchen" and "kitchen lamp" score
//! 100.

/// Similarity score, 0 (nothing in common) to 100 (identical)
pub type Score = u8;

/// Lower-case and replace everything but letters and digits with spaces
fn preprocess(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn sorted_tokens(s: &str) -> String {
    let processed = preprocess(s);
    let mut tokens: Vec<&str> = processed.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn similarity(a: &str, b: &str) -> Score {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as Score
}

/// Order-sensitive similarity of two strings as given
pub fn ratio(a: &str, b: &str) -> Score {
    similarity(a, b)
}

/// Word-order-insensitive similarity
pub fn token_sort_ratio(a: &str, b: &str) -> Score {
    similarity(&sorted_tokens(a), &sorted_tokens(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_sort_ratio_ignores_order_and_case() {
        assert_eq!(token_sort_ratio("lamp kitchen", "Kitchen Lamp"), 100);
        assert_eq!(token_sort_ratio("kitchen, lamp!", "lamp kitchen"), 100);
    }

    #[test]
    fn test_token_sort_ratio_is_symmetric() {
        let pairs = [
            ("living room lamp", "lamp kitchen"),
            ("ceiling light", "light"),
            ("heater", "bath heater valve"),
        ];
        for (a, b) in pairs {
            assert_eq!(token_sort_ratio(a, b), token_sort_ratio(b, a));
        }
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(token_sort_ratio("", "lamp"), 0);
        assert_eq!(token_sort_ratio("lamp", "  "), 0);
        assert_eq!(ratio("", ""), 0);
    }

    #[test]
    fn test_ratio_is_order_sensitive() {
        assert_eq!(ratio("anna", "anna"), 100);
        assert!(ratio("anna maria", "maria anna") < 100);
        assert!(ratio("anna", "hanna") > 66);
        assert!(ratio("anna", "bob") < 50);
    }

    #[test]
    fn test_near_miss_scores_high() {
        assert!(token_sort_ratio("kitchen lamp", "kitchen lamps") > 90);
        assert!(token_sort_ratio("kitchen lamp", "garage door") < 50);
    }
}
