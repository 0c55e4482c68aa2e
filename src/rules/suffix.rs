//! Suffix rules: numeric, special-character and year suffixes

use super::{Rule, Variants};
use crate::error::Result;

/// Separators placed between a seed and a numeric/year suffix
pub static SEPARATORS: [&str; 6] = ["", "*", "!", "@", ".", "-"];

/// Most common numeric suffixes (sequences, popular numbers, days)
const NUMERIC_SUFFIXES: [&str; 10] = ["1", "2", "12", "123", "1234", "69", "99", "007", "01", "07"];

static SPECIAL_SUFFIXES: [&str; 15] = [
    "!", "@", "#", "$", "*", ".", // single
    "!!", "!@", "!#", "**", // double
    "1!", "!1", "123!", "!123", // mixed with digits
    "!@#",
];

/// `seed + separator + suffix` for every suffix, separators varying fastest
fn suffixed<'r>(seed: &str, suffixes: &'r [String]) -> Variants<'r> {
    let seed = seed.to_string();
    Box::new(suffixes.iter().flat_map(move |suffix| {
        let seed = seed.clone();
        SEPARATORS.iter().map(move |sep| format!("{seed}{sep}{suffix}"))
    }))
}

/// Appends common numeric suffixes with a separator
#[derive(Debug, Clone)]
pub struct NumericSuffixRule {
    suffixes: Vec<String>,
}

impl NumericSuffixRule {
    pub fn new() -> Self {
        Self {
            suffixes: NUMERIC_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for NumericSuffixRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NumericSuffixRule {
    fn name(&self) -> &str {
        "numeric_suffix"
    }

    fn description(&self) -> &str {
        "Common numeric suffixes (1, 123, 007...) with separators"
    }

    fn default_priority(&self) -> u8 {
        30
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        Ok(suffixed(seed, &self.suffixes))
    }

    fn estimate_factor(&self) -> u64 {
        1 + (self.suffixes.len() * SEPARATORS.len()) as u64
    }
}

/// Appends special-character suffixes (no separator)
#[derive(Debug, Clone, Default)]
pub struct SpecialSuffixRule;

impl SpecialSuffixRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for SpecialSuffixRule {
    fn name(&self) -> &str {
        "special_suffix"
    }

    fn description(&self) -> &str {
        "Special-character suffixes (!, @, #, !@#...)"
    }

    fn default_priority(&self) -> u8 {
        40
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let seed = seed.to_string();
        Ok(Box::new(SPECIAL_SUFFIXES.iter().map(move |suffix| format!("{seed}{suffix}"))))
    }

    fn estimate_factor(&self) -> u64 {
        1 + SPECIAL_SUFFIXES.len() as u64
    }
}

/// Appends the last three years, long and two-digit forms, with separators
#[derive(Debug, Clone)]
pub struct YearSuffixRule {
    suffixes: Vec<String>,
}

impl YearSuffixRule {
    pub fn new(reference_year: i32) -> Self {
        let years = [reference_year, reference_year - 1, reference_year - 2];
        let mut suffixes: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        suffixes.extend(years.iter().map(|y| short_year(*y)));
        Self { suffixes }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

/// Last two digits of a year ("2025" -> "25", "2000" -> "00")
pub(crate) fn short_year(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}

impl Rule for YearSuffixRule {
    fn name(&self) -> &str {
        "year_suffix"
    }

    fn description(&self) -> &str {
        "Recent years (2025, 2024, 25...) with separators"
    }

    fn default_priority(&self) -> u8 {
        50
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        Ok(suffixed(seed, &self.suffixes))
    }

    fn estimate_factor(&self) -> u64 {
        1 + (self.suffixes.len() * SEPARATORS.len()) as u64
    }
}
