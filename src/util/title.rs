use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// French function words dropped before comparing titles.
pub const STOPWORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "à", "de", "en", "au", "aux", "est", "sur", "dans", "alors",
    "quand", "et", "par", "avec", "du", "des", "ce", "cet", "cette", "qui", "pour", "se", "sa",
    "son", "leur", "l", "d", "s", "ne", "pas", "plus", "moins", "comme", "ici", "selon", "dit",
];

const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

// Stopwords are matched after accent folding, so "à" also removes the bare "a".
fn is_stopword(token: &str) -> bool {
    STOPWORDS.iter().any(|word| {
        word.nfd()
            .filter(|ch| !COMBINING_DIACRITICS.contains(ch))
            .eq(token.chars())
    })
}

/// Normalize a title for story comparison: lowercase, strip accents, drop everything that is
/// not an ASCII letter, digit or whitespace, then remove stopwords.
///
/// Apostrophes are removed rather than replaced, so "l'école" becomes "lecole".
pub fn normalize_title(title: Option<&str>) -> String {
    let Some(title) = title else {
        return String::new();
    };
    if title.is_empty() {
        return String::new();
    }

    let mut cleaned = String::with_capacity(title.len());
    for ch in title.to_lowercase().nfd() {
        if COMBINING_DIACRITICS.contains(&ch) {
            continue;
        }
        if ch.is_ascii_alphanumeric() || ch.is_whitespace() {
            cleaned.push(ch);
        }
    }

    cleaned
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unique tokens of an already normalized title.
pub fn title_tokens(normalized: &str) -> BTreeSet<String> {
    normalized
        .split_whitespace()
        .map(|token| token.to_string())
        .collect()
}

/// Overlap coefficient `|A ∩ B| / min(|A|, |B|)`.
///
/// A short headline contained in a longer one scores 1.0, which Jaccard would penalize.
pub fn overlap_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let smallest = a.len().min(b.len());
    if smallest == 0 {
        return 0.0;
    }

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = short.iter().filter(|token| long.contains(*token)).count();

    intersection as f64 / smallest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tokens(title: &str) -> BTreeSet<String> {
        title_tokens(&normalize_title(Some(title)))
    }

    #[test]
    fn strips_accents_punctuation_and_stopwords() {
        assert_eq!(
            normalize_title(Some("Incendie à Montréal : l'enquête se poursuit!")),
            "incendie montreal lenquete poursuit"
        );
        assert_eq!(normalize_title(Some("Élection à Québec")), "election quebec");
    }

    #[test]
    fn absent_or_empty_is_empty() {
        assert_eq!(normalize_title(None), "");
        assert_eq!(normalize_title(Some("")), "");
        assert_eq!(normalize_title(Some("  ... !! ")), "");
        assert_eq!(normalize_title(Some("Le la les")), "");
        assert_eq!(normalize_title(Some("À")), "");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_title(Some("  Hausse \t des   taux\n")), "hausse taux");
    }

    #[test]
    fn non_latin_letters_are_dropped() {
        assert_eq!(normalize_title(Some("Œuvre 2024 ß")), "uvre 2024");
    }

    #[test]
    fn subset_title_scores_one() {
        let a = tokens("Le chat mange");
        let b = tokens("Chat mange la souris");
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 3);
        assert_eq!(overlap_similarity(&a, &b), 1.0);
    }

    #[test]
    fn disjoint_titles_score_zero() {
        let a = tokens("Incendie à Montréal");
        let b = tokens("Élection à Québec");
        assert_eq!(overlap_similarity(&a, &b), 0.0);
    }

    #[test]
    fn empty_titles_are_dissimilar() {
        let empty = BTreeSet::new();
        assert_eq!(overlap_similarity(&empty, &empty), 0.0);
        assert_eq!(overlap_similarity(&empty, &tokens("Chat")), 0.0);
    }

    #[test]
    fn duplicate_words_collapse() {
        let a = tokens("chat chat chat");
        let b = tokens("chat chien");
        assert_eq!(a.len(), 1);
        assert_eq!(overlap_similarity(&a, &b), 1.0);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(text in "\\PC{0,60}") {
            let once = normalize_title(Some(&text));
            prop_assert_eq!(normalize_title(Some(&once)), once.clone());
        }

        #[test]
        fn similarity_is_symmetric_and_bounded(
            a in "[a-zA-Zéèàç' ]{0,40}",
            b in "[a-zA-Zéèàç' ]{0,40}",
        ) {
            let ta = tokens(&a);
            let tb = tokens(&b);
            let ab = overlap_similarity(&ta, &tb);
            let ba = overlap_similarity(&tb, &ta);
            prop_assert_eq!(ab.to_bits(), ba.to_bits());
            prop_assert!((0.0..=1.0).contains(&ab));
            if ta.is_empty() || tb.is_empty() {
                prop_assert_eq!(ab, 0.0);
            }
        }
    }
}
