//! Deterministic cleaning of raw item names.
//!
//! Both training and inference run every item name through [`normalize`]
//! before feature extraction, so the two phases always agree on tokens.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").expect("digit pattern is valid");
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("punctuation pattern is valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Lower-cases, strips digits and punctuation, and collapses whitespace.
///
/// Periods become spaces before punctuation is removed so that `"1.5l.milk"`
/// yields `"l milk"` rather than `"lmilk"`. The function is total and
/// idempotent.
///
/// ```
/// use shelfsort::normalize;
///
/// assert_eq!(normalize("Coca-Cola 1.5L  Bottle!"), "cocacola l bottle");
/// assert_eq!(normalize("123-456!!"), "");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_digits = DIGITS.replace_all(&lowered, "");
    let spaced = no_digits.replace('.', " ");
    let no_punct = NON_WORD.replace_all(&spaced, "");
    let collapsed = WHITESPACE.replace_all(&no_punct, " ");
    collapsed.trim().to_string()
}

/// Normalizes an optional item name; a missing name is treated as empty.
pub fn normalize_opt(text: Option<&str>) -> String {
    normalize(text.unwrap_or_default())
}

/// Splits normalized text into whitespace-separated tokens.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Milk 3% 1L",
        "Coca-Cola 1.5L  Bottle!",
        "Dr. Pepper",
        "שוקולד מריר 70%",
        "Café  au\tlait\n(200g)",
        "A.B.C.",
        "123-456!!",
        "  Tomatoes,  cherry -- 250 g  ",
        "snake_case_name",
    ];

    #[test]
    fn test_known_outputs() {
        assert_eq!(normalize("Milk 3% 1L"), "milk l");
        assert_eq!(normalize("Dr. Pepper"), "dr pepper");
        assert_eq!(normalize("A.B.C."), "a b c");
        assert_eq!(normalize("  Tomatoes,  cherry -- 250 g  "), "tomatoes cherry g");
        assert_eq!(normalize("Café  au\tlait\n(200g)"), "café au lait g");
        assert_eq!(normalize("שוקולד מריר 70%"), "שוקולד מריר");
    }

    #[test]
    fn test_digits_and_punctuation_only_become_empty() {
        assert_eq!(normalize("123-456!!"), "");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_output_is_clean() {
        for sample in SAMPLES {
            let out = normalize(sample);
            assert!(!out.chars().any(|c| c.is_numeric()), "digits in {:?}", out);
            assert!(
                !out.chars().any(|c| c.is_ascii_punctuation() && c != '_'),
                "punctuation in {:?}",
                out
            );
            assert!(!out.contains("  "));
            assert_eq!(out.trim(), out);
        }
    }

    /// Mixes arbitrary Unicode scalars with characters the pipeline treats specially.
    fn random_text(rng: &mut StdRng) -> String {
        const SPECIAL: &[char] = &[
            'a', 'Z', '7', '.', ' ', '\t', '\n', '-', '!', '_', '%', 'é', 'İ', '٣', '\u{a0}', '\u{2003}', '|',
        ];
        let len = rng.random_range(0..32);
        (0..len)
            .map(|_| {
                if rng.random_bool(0.5) {
                    SPECIAL[rng.random_range(0..SPECIAL.len())]
                } else {
                    rng.random::<char>()
                }
            })
            .collect()
    }

    #[test]
    fn test_random_inputs_are_idempotent_and_clean() {
        let digit = Regex::new(r"\d").unwrap();
        let punctuation = Regex::new(r"[^\w\s]").unwrap();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..5_000 {
            let input = random_text(&mut rng);
            let once = normalize(&input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
            assert!(!digit.is_match(&once), "digits in {:?}", once);
            assert!(!punctuation.is_match(&once), "punctuation in {:?}", once);
            assert!(
                once.chars().all(|c| c == ' ' || !c.is_whitespace()),
                "stray whitespace in {:?}",
                once
            );
            assert!(!once.contains("  "));
            assert_eq!(once.trim(), once);
        }
    }

    #[test]
    fn test_missing_name_is_empty() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("Bread")), "bread");
    }
}
