//! Default passwords, generated once and appended to the output

use super::suffix::short_year;
use super::{Composition, Rule, Variants};
use crate::error::Result;

/// Constant input the additive rule is applied to
pub const ADDITIVE_SEED: &str = "dummy";

/// Worldwide top passwords plus the usual admin defaults
static DEFAULT_PASSWORDS: [&str; 12] = [
    "123456", "12345678", "123456789", "12345", "1234", // numeric
    "password", "Password", "qwerty", "azerty", // words
    "root", "admin", "Admin", // admin
];

static MINIMAL_SUFFIXES: [&str; 3] = ["!", "1", "123"];

/// Default passwords with a minimal set of variations (current/previous year, `!`, `1`, `123`).
///
/// This rule is additive: it ignores its input, is excluded from the per-seed
/// expansion, and its output is appended once after the main run.
#[derive(Debug, Clone)]
pub struct DefaultPasswordsRule {
    years: [String; 3],
}

impl DefaultPasswordsRule {
    pub fn new(reference_year: i32) -> Self {
        Self {
            years: [
                reference_year.to_string(),
                (reference_year - 1).to_string(),
                short_year(reference_year),
            ],
        }
    }

    fn per_default(&self) -> usize {
        1 + self.years.len() + MINIMAL_SUFFIXES.len()
    }
}

impl Rule for DefaultPasswordsRule {
    fn name(&self) -> &str {
        "default_passwords"
    }

    fn description(&self) -> &str {
        "Default passwords (root, admin, password) with minimal variations"
    }

    fn default_priority(&self) -> u8 {
        1
    }

    fn composition(&self) -> Composition {
        Composition::Additive
    }

    fn variants<'r>(&'r self, _seed: &str) -> Result<Variants<'r>> {
        Ok(Box::new(DEFAULT_PASSWORDS.iter().flat_map(move |pwd| {
            std::iter::once(pwd.to_string())
                .chain(self.years.iter().map(move |year| format!("{pwd}{year}")))
                .chain(MINIMAL_SUFFIXES.iter().map(move |suffix| format!("{pwd}{suffix}")))
        })))
    }

    /// Raw number of lines produced by the single additive call
    fn estimate_factor(&self) -> u64 {
        (DEFAULT_PASSWORDS.len() * self.per_default()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::apply;

    #[test]
    fn test_defaults_ignore_input() {
        let rule = DefaultPasswordsRule::new(2025);
        let a: Vec<_> = apply(&rule, ADDITIVE_SEED).unwrap().collect();
        let b: Vec<_> = apply(&rule, "anything").unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults_content() {
        let rule = DefaultPasswordsRule::new(2025);
        let variants: Vec<_> = apply(&rule, ADDITIVE_SEED).unwrap().collect();

        assert_eq!(&variants[..7], &["123456", "1234562025", "1234562024", "12345625", "123456!", "1234561", "123456123"]);
        assert!(variants.contains(&"admin2025".to_string()));
        assert!(variants.contains(&"Password!".to_string()));
        assert_eq!(variants.len(), 84);
        assert_eq!(rule.estimate_factor(), 84);
        assert_eq!(rule.composition(), Composition::Additive);
    }
}
