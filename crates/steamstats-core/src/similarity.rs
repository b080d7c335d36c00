//! Fuzzy title comparison for name-keyed sources

use std::collections::HashMap;

/// Lowercase alphanumerics, everything else collapsed to single spaces.
/// Trademark signs and punctuation differences between stores disappear.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for word in title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// Sørensen–Dice coefficient over character bigrams of the normalized
/// titles, in `0.0..=1.0`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize_title(a), normalize_title(b));
    if a == b {
        return 1.0;
    }
    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }
    let (ba, bb) = (bigrams(&a), bigrams(&b));
    let total: usize = ba.values().sum::<usize>() + bb.values().sum::<usize>();
    let shared: usize = ba
        .iter()
        .map(|(pair, n)| (*n).min(bb.get(pair).copied().unwrap_or(0)))
        .sum();
    2.0 * shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_symbols() {
        assert_eq!(normalize_title("  DOOM™ Eternal: Deluxe "), "doom eternal deluxe");
    }

    #[test]
    fn identical_after_normalizing() {
        assert_eq!(name_similarity("Half-Life 2", "half life 2"), 1.0);
    }

    #[test]
    fn close_titles_score_high() {
        assert!(name_similarity("The Witcher 3: Wild Hunt", "The Witcher 3 Wild Hunt GOTY") > 0.7);
    }

    #[test]
    fn unrelated_titles_score_low() {
        assert!(name_similarity("Portal", "Stardew Valley") < 0.3);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(name_similarity("", "Portal"), 0.0);
    }
}
