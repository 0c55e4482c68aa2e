//! Case variations

use super::{capitalize, Rule, Variants};
use crate::error::Result;

/// Capitalized, upper, lower, first+last upper and alternating case
#[derive(Debug, Clone, Default)]
pub struct CaseVariationRule;

impl CaseVariationRule {
    pub fn new() -> Self {
        Self
    }

    fn case_variants(seed: &str) -> Vec<String> {
        let capitalized = capitalize(seed);
        let upper = seed.to_uppercase();
        let lower = seed.to_lowercase();

        let mut out = Vec::with_capacity(5);
        for variant in [&capitalized, &upper, &lower] {
            if variant != seed {
                out.push(variant.clone());
            }
        }

        let common = [capitalized.as_str(), upper.as_str(), lower.as_str()];
        let chars: Vec<char> = seed.chars().collect();

        if chars.len() >= 2 {
            let last = chars.len() - 1;
            let first_last: String = chars[0]
                .to_uppercase()
                .chain(chars[1..last].iter().flat_map(|c| c.to_lowercase()))
                .chain(chars[last].to_uppercase())
                .collect();
            if first_last != seed && !common.contains(&first_last.as_str()) {
                out.push(first_last);
            }
        }

        let alternating: String = chars
            .iter()
            .enumerate()
            .flat_map(|(i, c)| -> Box<dyn Iterator<Item = char>> {
                if i % 2 == 0 {
                    Box::new(c.to_lowercase())
                } else {
                    Box::new(c.to_uppercase())
                }
            })
            .collect();
        if alternating != seed && !common.contains(&alternating.as_str()) {
            out.push(alternating);
        }

        out
    }
}

impl Rule for CaseVariationRule {
    fn name(&self) -> &str {
        "case_variation"
    }

    fn description(&self) -> &str {
        "Case variations (Password, PASSWORD, password, PassworD, pAsSwOrD)"
    }

    fn default_priority(&self) -> u8 {
        20
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        // At most five short strings; building them eagerly is cheaper than chaining
        Ok(Box::new(Self::case_variants(seed).into_iter()))
    }

    fn estimate_factor(&self) -> u64 {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::apply;

    fn run(seed: &str) -> Vec<String> {
        apply(&CaseVariationRule::new(), seed).unwrap().collect()
    }

    #[test]
    fn test_lowercase_seed() {
        assert_eq!(run("password"), vec!["Password", "PASSWORD", "PassworD", "pAsSwOrD"]);
    }

    #[test]
    fn test_mixed_seed() {
        assert_eq!(
            run("Admin"),
            vec!["ADMIN", "admin", "AdmiN", "aDmIn"]
        );
    }

    #[test]
    fn test_single_char() {
        assert_eq!(run("a"), vec!["A"]);
        assert!(run("").is_empty());
    }

    #[test]
    fn test_digits_only_has_no_variants() {
        assert!(run("1234").is_empty());
    }
}
