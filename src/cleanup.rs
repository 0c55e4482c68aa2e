//! Cleanup filters
//!
//! Predicates that reject statistically implausible candidates. A chain
//! evaluates enabled filters in registration order and stops at the first
//! rejection. Filters are pure functions of one string; lengths count chars.

use crate::config::CleanupConfig;
use crate::error::{PwgenError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Characters counted as "special"
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;':\",./<>?`~";

#[inline]
fn is_special(c: char) -> bool {
    SPECIAL_CHARS.contains(c)
}

#[inline]
fn leading_run(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.chars().take_while(|&c| pred(c)).count()
}

#[inline]
fn trailing_run(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.chars().rev().take_while(|&c| pred(c)).count()
}

/// A named predicate over one candidate
pub trait CleanupFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// True if the candidate should be kept
    fn is_valid(&self, candidate: &str) -> bool;
}

/// Rejects runs of special characters at the start, the end or in the middle.
///
/// The middle scan starts at index 1 and only fires before the last char; a
/// run touching the end is left to `max_end`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoConsecutiveSpecialFilter {
    pub max_start: usize,
    pub max_end: usize,
    pub max_middle: usize,
}

impl Default for NoConsecutiveSpecialFilter {
    fn default() -> Self {
        Self {
            max_start: 2,
            max_end: 2,
            max_middle: 2,
        }
    }
}

impl CleanupFilter for NoConsecutiveSpecialFilter {
    fn name(&self) -> &'static str {
        "no_consecutive_special"
    }

    fn description(&self) -> &'static str {
        "Reject 3+ consecutive special characters"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        if leading_run(candidate, is_special) > self.max_start {
            return false;
        }
        if trailing_run(candidate, is_special) > self.max_end {
            return false;
        }

        let last = candidate.chars().count() - 1;
        let mut consecutive = 0;
        for (i, c) in candidate.chars().enumerate().skip(1) {
            if is_special(c) {
                consecutive += 1;
                if consecutive > self.max_middle && i < last {
                    return false;
                }
            } else {
                consecutive = 0;
            }
        }
        true
    }
}

/// Rejects long runs of one repeated character (`passssword`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoRepeatingCharsFilter {
    pub max_repeat: usize,
}

impl Default for NoRepeatingCharsFilter {
    fn default() -> Self {
        Self { max_repeat: 4 }
    }
}

impl CleanupFilter for NoRepeatingCharsFilter {
    fn name(&self) -> &'static str {
        "no_repeating_chars"
    }

    fn description(&self) -> &'static str {
        "Reject 5+ identical consecutive characters"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        let mut prev = None;
        let mut count = 0;
        for c in candidate.chars() {
            if prev == Some(c) {
                count += 1;
                if count > self.max_repeat {
                    return false;
                }
            } else {
                prev = Some(c);
                count = 1;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinLengthFilter {
    pub min_length: usize,
}

impl MinLengthFilter {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Default for MinLengthFilter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CleanupFilter for MinLengthFilter {
    fn name(&self) -> &'static str {
        "min_length"
    }

    fn description(&self) -> &'static str {
        "Reject candidates shorter than min_length"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        candidate.chars().count() >= self.min_length
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaxLengthFilter {
    pub max_length: usize,
}

impl MaxLengthFilter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Default for MaxLengthFilter {
    fn default() -> Self {
        Self::new(12)
    }
}

impl CleanupFilter for MaxLengthFilter {
    fn name(&self) -> &'static str {
        "max_length"
    }

    fn description(&self) -> &'static str {
        "Reject candidates longer than max_length"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        candidate.chars().count() <= self.max_length
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoOnlySpecialFilter;

impl CleanupFilter for NoOnlySpecialFilter {
    fn name(&self) -> &'static str {
        "no_only_special"
    }

    fn description(&self) -> &'static str {
        "Reject candidates with no letter or digit"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        candidate.chars().any(char::is_alphanumeric)
    }
}

/// Rejects long all-digit strings and heavy letter/special alternation (`a!b@c#`)
#[derive(Debug, Clone, Default)]
pub struct NoImprobablePatternFilter;

impl CleanupFilter for NoImprobablePatternFilter {
    fn name(&self) -> &'static str {
        "no_improbable_pattern"
    }

    fn description(&self) -> &'static str {
        "Reject statistically improbable patterns"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        let len = candidate.chars().count();
        if len > 10 && candidate.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        let mut alternations = 0usize;
        let mut chars = candidate.chars().map(is_special);
        if let Some(mut prev) = chars.next() {
            for curr in chars {
                if prev != curr {
                    alternations += 1;
                }
                prev = curr;
            }
        }

        alternations as f64 <= len as f64 * 0.6
    }
}

/// Rejects candidates starting with digits or ending with too many
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaxNumericFilter {
    pub max_start: usize,
    pub max_end: usize,
}

impl Default for MaxNumericFilter {
    fn default() -> Self {
        Self {
            max_start: 0,
            max_end: 4,
        }
    }
}

impl CleanupFilter for MaxNumericFilter {
    fn name(&self) -> &'static str {
        "max_numeric"
    }

    fn description(&self) -> &'static str {
        "Reject leading digits or more than 4 trailing digits"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let is_digit = |c: char| c.is_ascii_digit();
        leading_run(candidate, is_digit) <= self.max_start
            && trailing_run(candidate, is_digit) <= self.max_end
    }
}

/// Four-digit suffixes that are kept even though they are not years
pub const YEAR_WHITELIST: [&str; 11] = [
    "1234", "0000", "1111", "2222", "3333", "4444", "5555", "6666", "7777", "8888", "9999",
];

/// A four-digit suffix must look like a year (`password1990`), not noise (`password8392`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealisticYearFilter {
    pub min_year: u32,
    pub max_year: u32,
}

impl Default for RealisticYearFilter {
    fn default() -> Self {
        Self {
            min_year: 1900,
            max_year: 2030,
        }
    }
}

impl CleanupFilter for RealisticYearFilter {
    fn name(&self) -> &'static str {
        "realistic_year"
    }

    fn description(&self) -> &'static str {
        "Four trailing digits must be a year (1900-2030) or a common sequence"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        let chars: Vec<char> = candidate.chars().collect();
        if chars.len() < 5 {
            return true;
        }

        let suffix: String = chars[chars.len() - 4..].iter().collect();
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return true;
        }
        if YEAR_WHITELIST.contains(&suffix.as_str()) {
            return true;
        }

        match suffix.parse::<u32>() {
            Ok(year) => (self.min_year..=self.max_year).contains(&year),
            Err(_) => true,
        }
    }
}

/// Purely alphabetic candidates need a vowel to be pronounceable
#[derive(Debug, Clone, Default)]
pub struct ReadableEntropyFilter;

impl CleanupFilter for ReadableEntropyFilter {
    fn name(&self) -> &'static str {
        "readable_entropy"
    }

    fn description(&self) -> &'static str {
        "Reject unpronounceable consonant-only words"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        if candidate.chars().count() < 4 || !candidate.chars().all(char::is_alphabetic) {
            return true;
        }
        candidate.chars().any(|c| "aeiouyAEIOUY".contains(c))
    }
}

/// Short candidates starting lowercase are too weak to be worth a guess
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeakShortFilter {
    pub threshold: usize,
}

impl WeakShortFilter {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for WeakShortFilter {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CleanupFilter for WeakShortFilter {
    fn name(&self) -> &'static str {
        "weak_short"
    }

    fn description(&self) -> &'static str {
        "Reject candidates under 6 chars starting with a lowercase letter"
    }

    fn is_valid(&self, candidate: &str) -> bool {
        let Some(first) = candidate.chars().next() else {
            return false;
        };
        !(candidate.chars().count() < self.threshold && first.is_lowercase())
    }
}

/// Built-in filter names in default registration order
pub const DEFAULT_FILTERS: [&str; 10] = [
    "no_consecutive_special",
    "no_repeating_chars",
    "min_length",
    "max_length",
    "no_only_special",
    "no_improbable_pattern",
    "max_numeric",
    "weak_short",
    "realistic_year",
    "readable_entropy",
];

fn params<T: DeserializeOwned>(name: &str, value: &serde_json::Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| PwgenError::config(name, e.to_string()))
}

/// Build a built-in filter by name, reading parameters from `value` when given
pub fn build_filter(name: &str, value: Option<&serde_json::Value>) -> Result<Box<dyn CleanupFilter>> {
    let empty = serde_json::Value::Object(Default::default());
    let value = value.unwrap_or(&empty);
    let filter: Box<dyn CleanupFilter> = match name {
        "no_consecutive_special" => Box::new(params::<NoConsecutiveSpecialFilter>(name, value)?),
        "no_repeating_chars" => Box::new(params::<NoRepeatingCharsFilter>(name, value)?),
        "min_length" => Box::new(params::<MinLengthFilter>(name, value)?),
        "max_length" => Box::new(params::<MaxLengthFilter>(name, value)?),
        "no_only_special" => Box::new(NoOnlySpecialFilter),
        "no_improbable_pattern" => Box::new(NoImprobablePatternFilter),
        "max_numeric" => Box::new(params::<MaxNumericFilter>(name, value)?),
        "weak_short" => Box::new(params::<WeakShortFilter>(name, value)?),
        "realistic_year" => Box::new(params::<RealisticYearFilter>(name, value)?),
        "readable_entropy" => Box::new(ReadableEntropyFilter),
        other => return Err(PwgenError::config(other, "unknown cleanup filter")),
    };
    Ok(filter)
}

struct FilterSlot {
    filter: Box<dyn CleanupFilter>,
    enabled: bool,
}

/// Ordered, short-circuiting conjunction of cleanup filters
#[derive(Default)]
pub struct CleanupChain {
    filters: Vec<FilterSlot>,
}

impl CleanupChain {
    /// Empty chain (accepts everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain with every built-in filter at its default parameters
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        for name in DEFAULT_FILTERS {
            if let Ok(filter) = build_filter(name, None) {
                chain.add(filter);
            }
        }
        chain
    }

    /// Default chain adjusted by the config file.
    ///
    /// Malformed entries are logged and leave that filter at its defaults.
    pub fn from_config(config: &CleanupConfig) -> Self {
        let mut chain = Self::with_defaults();

        for (name, value) in &config.filters {
            let Some(index) = chain.position(name) else {
                log::warn!("Ignoring config for unknown cleanup filter '{}'", name);
                continue;
            };

            if !value.is_object() {
                log::warn!(
                    "Cleanup filter '{}': expected an object like {{\"enabled\": false}}, got {}; keeping defaults",
                    name,
                    value
                );
                continue;
            }

            match build_filter(name, Some(value)) {
                Ok(filter) => chain.filters[index].filter = filter,
                Err(e) => log::warn!("{}; keeping defaults", e),
            }

            match value.get("enabled").map(serde_json::Value::as_bool) {
                Some(Some(enabled)) => chain.filters[index].enabled = enabled,
                Some(None) => log::warn!("Cleanup filter '{}': 'enabled' must be a boolean", name),
                None => {}
            }
        }

        chain
    }

    /// Append a filter, enabled
    pub fn add(&mut self, filter: Box<dyn CleanupFilter>) {
        self.filters.push(FilterSlot { filter, enabled: true });
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.filters.iter().position(|slot| slot.filter.name() == name)
    }

    /// Toggle a filter by name. Returns false if no such filter is registered.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position(name) {
            Some(index) => {
                self.filters[index].enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// True if every enabled filter accepts the candidate
    #[inline]
    pub fn is_valid(&self, candidate: &str) -> bool {
        self.filters
            .iter()
            .filter(|slot| slot.enabled)
            .all(|slot| slot.filter.is_valid(candidate))
    }

    /// First enabled filter rejecting the candidate, if any
    pub fn rejected_by(&self, candidate: &str) -> Option<&'static str> {
        self.filters
            .iter()
            .filter(|slot| slot.enabled)
            .find(|slot| !slot.filter.is_valid(candidate))
            .map(|slot| slot.filter.name())
    }

    /// (name, description, enabled) for every registered filter
    pub fn filters(&self) -> impl Iterator<Item = (&'static str, &'static str, bool)> + '_ {
        self.filters
            .iter()
            .map(|slot| (slot.filter.name(), slot.filter.description(), slot.enabled))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.filters.iter().filter(|slot| slot.enabled).count()
    }
}

impl std::fmt::Debug for CleanupChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|s| (s.filter.name(), s.enabled)))
            .finish()
    }
}
