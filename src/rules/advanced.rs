//! Combination, duplication and hybrid-suffix rules

use super::{capitalize, Rule, Variants};
use crate::error::Result;
use std::collections::BTreeSet;

/// Combines each seed with numeric tokens extracted from the source list.
///
/// `axido` + `2025` -> `axido2025`, `Axido*2025`, `@Axi*2025!`, `2025_axido`, ...
///
/// Tokens are injected up front and iterated in sorted order so output is
/// reproducible.
#[derive(Debug, Clone, Default)]
pub struct CombinationRule {
    numbers: BTreeSet<String>,
}

impl CombinationRule {
    /// Rule with no tokens; yields nothing until tokens are set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numbers<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numbers: numbers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn set_numbers(&mut self, numbers: BTreeSet<String>) {
        self.numbers = numbers;
    }

    pub fn numbers(&self) -> &BTreeSet<String> {
        &self.numbers
    }
}

impl Rule for CombinationRule {
    fn name(&self) -> &str {
        "combination"
    }

    fn description(&self) -> &str {
        "Combine passwords with numbers from the source (axido + 2025 -> Axido*2025)"
    }

    fn default_priority(&self) -> u8 {
        5
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let seed = seed.to_string();
        let cap = capitalize(&seed);
        let short = (seed.chars().count() >= 3)
            .then(|| capitalize(&seed.chars().take(3).collect::<String>()));

        Ok(Box::new(self.numbers.iter().flat_map(move |num| {
            let mut out = vec![
                format!("{seed}{num}"),
                format!("{seed}*{num}"),
                format!("{seed}_{num}"),
                format!("{seed}.{num}"),
            ];
            if cap != seed {
                out.push(format!("{cap}{num}"));
                out.push(format!("{cap}*{num}"));
            }
            if let Some(short) = &short {
                out.push(format!("@{short}*{num}"));
                out.push(format!("@{short}*{num}!"));
                out.push(format!("@{short}*{num}!@"));
            }
            out.push(format!("{num}{seed}"));
            out.push(format!("{num}_{seed}"));
            out
        })))
    }

    fn estimate_factor(&self) -> u64 {
        if self.numbers.is_empty() {
            1
        } else {
            1 + self.numbers.len() as u64 * 10
        }
    }
}

/// Doubles the seed: `motmot`, `mot*mot`, `Motmot`, `Mot*mot`
#[derive(Debug, Clone, Default)]
pub struct DuplicationRule;

impl DuplicationRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for DuplicationRule {
    fn name(&self) -> &str {
        "duplication"
    }

    fn description(&self) -> &str {
        "Duplication (axido -> axidoaxido, Axido*axido)"
    }

    fn default_priority(&self) -> u8 {
        8
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let lower = seed.to_lowercase();
        let cap = capitalize(&lower);
        Ok(Box::new(["", "*"].into_iter().flat_map(move |sep| {
            [format!("{lower}{sep}{lower}"), format!("{cap}{sep}{lower}")]
        })))
    }

    fn estimate_factor(&self) -> u64 {
        5
    }
}

/// Last-letter replacements for the hybrid rule
static LAST_LETTER_REPLACEMENTS: [(char, &[&str]); 5] = [
    ('a', &["@", "4"]),
    ('e', &["3"]),
    ('i', &["1", "!"]),
    ('o', &["0"]),
    ('s', &["$", "5"]),
];

static SHORT_NUMBERS: [&str; 6] = ["1", "2", "12", "123", "1!", "!1"];

/// Replaces a substitutable last letter and appends a short number:
/// `campiglia` -> `campigli@1`, `Campigli@123`
#[derive(Debug, Clone, Default)]
pub struct HybridSuffixRule;

impl HybridSuffixRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for HybridSuffixRule {
    fn name(&self) -> &str {
        "hybrid_suffix"
    }

    fn description(&self) -> &str {
        "Hybrid suffixes (Campigli@1, campigli@123)"
    }

    // Runs after numeric_suffix so a seed never gets two stacked suffixes from both
    fn default_priority(&self) -> u8 {
        35
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let Some(last) = seed.chars().last() else {
            return Ok(Box::new(std::iter::empty()));
        };
        if seed.chars().count() < 2 {
            return Ok(Box::new(std::iter::empty()));
        }

        let lower = last.to_ascii_lowercase();
        let Some((_, replacements)) = LAST_LETTER_REPLACEMENTS.iter().find(|(c, _)| *c == lower) else {
            return Ok(Box::new(std::iter::empty()));
        };

        let base = seed[..seed.len() - last.len_utf8()].to_string();
        let cap_base = capitalize(&base);
        Ok(Box::new(replacements.iter().flat_map(move |rep| {
            let plain = SHORT_NUMBERS.iter().map(|num| format!("{base}{rep}{num}"));
            let capped = SHORT_NUMBERS.iter().map(|num| format!("{cap_base}{rep}{num}"));
            plain.chain(capped).collect::<Vec<_>>()
        })))
    }

    fn estimate_factor(&self) -> u64 {
        12
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::apply;

    #[test]
    fn test_combination_without_numbers_is_empty() {
        let rule = CombinationRule::new();
        assert_eq!(apply(&rule, "axido").unwrap().count(), 0);
        assert_eq!(rule.estimate_factor(), 1);
    }

    #[test]
    fn test_combination_patterns() {
        let rule = CombinationRule::with_numbers(["2025"]);
        let variants: Vec<_> = apply(&rule, "axido").unwrap().collect();

        assert_eq!(
            variants,
            vec![
                "axido2025", "axido*2025", "axido_2025", "axido.2025", "Axido2025", "Axido*2025",
                "@Axi*2025", "@Axi*2025!", "@Axi*2025!@", "2025axido", "2025_axido",
            ]
        );
        assert_eq!(rule.estimate_factor(), 11);
    }

    #[test]
    fn test_combination_tokens_sorted() {
        let mut rule = CombinationRule::new();
        rule.set_numbers(["99", "123"].iter().map(|s| s.to_string()).collect());
        let first: Vec<_> = apply(&rule, "ab").unwrap().take(1).collect();
        assert_eq!(first, vec!["ab123"]);
    }

    #[test]
    fn test_duplication() {
        let variants: Vec<_> = apply(&DuplicationRule::new(), "Test").unwrap().collect();
        assert_eq!(variants, vec!["testtest", "Testtest", "test*test", "Test*test"]);
    }

    #[test]
    fn test_hybrid_suffix() {
        let variants: Vec<_> = apply(&HybridSuffixRule::new(), "campiglia").unwrap().collect();
        assert_eq!(variants.len(), 24);
        assert_eq!(variants[0], "campigli@1");
        assert_eq!(variants[6], "Campigli@1");
        assert_eq!(variants[12], "campigli41");
    }

    #[test]
    fn test_hybrid_suffix_skips_unmapped_and_short() {
        assert_eq!(apply(&HybridSuffixRule::new(), "admin").unwrap().count(), 0);
        assert_eq!(apply(&HybridSuffixRule::new(), "a").unwrap().count(), 0);
    }
}
