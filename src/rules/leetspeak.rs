//! Leetspeak substitutions (a->4, e->3, ...)

use super::{Rule, Variants};
use crate::error::Result;

/// Substitution table, most common replacement first
pub(crate) static SUBSTITUTIONS: [(char, &[&str]); 8] = [
    ('a', &["4", "@"]),
    ('e', &["3"]),
    ('i', &["1", "!"]),
    ('o', &["0"]),
    ('s', &["$", "5"]),
    ('t', &["7"]),
    ('l', &["1"]),
    ('b', &["8"]),
];

fn first_substitute(c: char) -> Option<&'static str> {
    let lower = c.to_ascii_lowercase();
    SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, subs)| subs[0])
}

/// Full-leet variant followed by every single-position substitution.
///
/// Only the first substitute of each letter is used, which keeps the output
/// linear in the seed length instead of exponential.
#[derive(Debug, Clone, Default)]
pub struct LeetspeakRule;

impl LeetspeakRule {
    pub fn new() -> Self {
        Self
    }

    fn full_leet(seed: &str) -> String {
        seed.chars()
            .map(|c| match first_substitute(c) {
                Some(sub) => sub.to_string(),
                None => c.to_string(),
            })
            .collect()
    }
}

impl Rule for LeetspeakRule {
    fn name(&self) -> &str {
        "leetspeak"
    }

    fn description(&self) -> &str {
        "Leetspeak substitutions (a->4, e->3, i->1, o->0, s->$)"
    }

    fn default_priority(&self) -> u8 {
        10
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let seed = seed.to_string();
        let full = Self::full_leet(&seed);
        let head = if full != seed { Some(full.clone()) } else { None };

        let positions: Vec<(usize, char)> = seed.char_indices().collect();
        let singles = positions.into_iter().filter_map(move |(i, c)| {
            let sub = first_substitute(c)?;
            let variant = format!("{}{}{}", &seed[..i], sub, &seed[i + c.len_utf8()..]);
            (variant != seed && variant != full).then_some(variant)
        });

        Ok(Box::new(head.into_iter().chain(singles)))
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
        apply(&LeetspeakRule::new(), seed).unwrap().collect()
    }

    #[test]
    fn test_full_then_singles() {
        assert_eq!(run("pass"), vec!["p4$$", "p4ss", "pa$s", "pas$"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(run("Tea"), vec!["734", "7ea", "T3a", "Te4"]);
    }

    #[test]
    fn test_single_substitutable_char_only_full() {
        // the lone single-position variant equals the full variant
        assert_eq!(run("xyzo"), vec!["xyz0"]);
    }

    #[test]
    fn test_nothing_to_substitute() {
        assert!(run("xyz").is_empty());
        assert!(run("").is_empty());
    }
}
