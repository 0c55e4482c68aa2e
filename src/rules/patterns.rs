//! Templated "common patterns" rule

use super::{capitalize, Rule, Variants};
use crate::error::Result;

static YEARS_SHORT: [&str; 20] = [
    "20", "21", "22", "23", "24", "25", "26", "93", "94", "95", "96", "97", "98", "99", "00", "01",
    "02", "03", "04", "05",
];

static COMMON_NUMS: [&str; 8] = ["1", "7", "13", "17", "21", "69", "77", "99"];

static SPECIAL_ENDINGS: [&str; 6] = ["!", "@", "#", "!@", "@!", "!!"];

/// Lazy cartesian product of two static tables, left-major
fn product(
    left: &'static [&'static str],
    right: &'static [&'static str],
) -> impl Iterator<Item = (&'static str, &'static str)> {
    left.iter().flat_map(move |l| right.iter().map(move |r| (*l, *r)))
}

/// Most used human password shapes:
///
/// - `password*25@`  word + short year + special
/// - `PassworD17@`   last letter upper + number + special
/// - `Password@2025` capitalized + special + full year
/// - `PASSWORD1!`    upper + number + special
/// - `password_25`   underscore + short year
/// - `Password!25`   special between word and short year
#[derive(Debug, Clone)]
pub struct CommonPatternsRule {
    reference_year: i32,
}

impl CommonPatternsRule {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }
}

impl Rule for CommonPatternsRule {
    fn name(&self) -> &str {
        "common_patterns"
    }

    fn description(&self) -> &str {
        "Common patterns (Password*25@, PassworD17@, Password@2025)"
    }

    fn default_priority(&self) -> u8 {
        45
    }

    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>> {
        let chars: Vec<char> = seed.chars().collect();
        if chars.len() < 2 {
            return Ok(Box::new(std::iter::empty()));
        }

        let seed = seed.to_string();
        let cap = capitalize(&seed);
        let upper = seed.to_uppercase();
        let last = chars[chars.len() - 1];
        let last_upper: String = chars[..chars.len() - 1]
            .iter()
            .copied()
            .chain(last.to_uppercase())
            .collect();

        let word_year_special = {
            let (seed, cap) = (seed.clone(), cap.clone());
            product(&YEARS_SHORT, &SPECIAL_ENDINGS)
                .flat_map(move |(yy, sp)| [format!("{seed}*{yy}{sp}"), format!("{cap}*{yy}{sp}")])
        };

        let last_upper_suffixes = (last_upper != seed)
            .then(|| {
                let with_nums = {
                    let last_upper = last_upper.clone();
                    product(&COMMON_NUMS, &SPECIAL_ENDINGS)
                        .map(move |(num, sp)| format!("{last_upper}{num}{sp}"))
                };
                let with_years = product(&YEARS_SHORT, &["!", "@"])
                    .map(move |(yy, sp)| format!("{last_upper}{yy}{sp}"));
                with_nums.chain(with_years)
            })
            .into_iter()
            .flatten();

        let full_years = {
            let cap = cap.clone();
            (self.reference_year - 5..=self.reference_year)
                .flat_map(move |year| ["@", "#", "*"].map(|sp| format!("{cap}{sp}{year}")))
        };

        let upper_num_special = product(&["1", "12", "123"], &SPECIAL_ENDINGS)
            .map(move |(num, sp)| format!("{upper}{num}{sp}"));

        let underscore_year = {
            let (seed, cap) = (seed.clone(), cap.clone());
            YEARS_SHORT
                .iter()
                .flat_map(move |yy| [format!("{seed}_{yy}"), format!("{cap}_{yy}")])
        };

        let special_year = product(&YEARS_SHORT, &["!", "@", "#"])
            .map(move |(yy, sp)| format!("{cap}{sp}{yy}"));

        Ok(Box::new(
            word_year_special
                .chain(last_upper_suffixes)
                .chain(full_years)
                .chain(upper_num_special)
                .chain(underscore_year)
                .chain(special_year),
        ))
    }

    fn estimate_factor(&self) -> u64 {
        150
    }
}
