//! Mutation rules
//!
//! A rule turns one string into a small, finite set of variants. Rules are
//! registered by name in a [`RuleRegistry`], which carries the mutable
//! `enabled`/`priority` state and builds the priority-ordered [`RuleSet`]
//! consumed by the engine and the estimator.
//!
//! Adding a rule:
//! 1. Implement [`Rule`] for a new type
//! 2. Register it with [`RuleRegistry::register`]
//! 3. Optionally enable/prioritize it from the config file

mod advanced;
mod case;
mod defaults;
mod leetspeak;
mod patterns;
mod suffix;

pub use advanced::{CombinationRule, DuplicationRule, HybridSuffixRule};
pub use case::CaseVariationRule;
pub use defaults::{DefaultPasswordsRule, ADDITIVE_SEED};
pub use leetspeak::LeetspeakRule;
pub use patterns::CommonPatternsRule;
pub use suffix::{NumericSuffixRule, SpecialSuffixRule, YearSuffixRule, SEPARATORS};

use crate::config::RuleOverride;
use crate::error::Result;
use ahash::RandomState;
use hashbrown::HashSet;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Highest priority value a rule may carry
pub const MAX_PRIORITY: u8 = 100;

/// Raw variant stream produced by a rule
pub type Variants<'r> = Box<dyn Iterator<Item = String> + 'r>;

/// How a rule's output combines with the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composition {
    /// Takes part in the per-seed expansion tree
    Multiplicative,
    /// Generated once from a constant input and appended to the output
    Additive,
}

/// A named transformation from one string to a set of other strings.
///
/// Implementations must be pure: no I/O, no clock, no shared mutable state.
/// Configuration (numeric tokens, reference year) is fixed at construction.
pub trait Rule: Send + Sync {
    /// Unique registry key
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Priority used when the config does not override it (0-100, lower runs first)
    fn default_priority(&self) -> u8;

    fn composition(&self) -> Composition {
        Composition::Multiplicative
    }

    /// Produce the raw variants for `seed`. The stream may contain the seed or
    /// repeats; [`apply`] strips both.
    fn variants<'r>(&'r self, seed: &str) -> Result<Variants<'r>>;

    /// Approximate output multiplier including the seed itself (always >= 1).
    /// Used for planning only.
    fn estimate_factor(&self) -> u64;
}

impl fmt::Debug for dyn Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name())
            .field("default_priority", &self.default_priority())
            .finish()
    }
}

/// Apply a rule, yielding each distinct variant once and never the seed itself.
pub fn apply<'r>(rule: &'r dyn Rule, seed: &str) -> Result<Mutations<'r>> {
    let inner = rule.variants(seed)?;
    Ok(Mutations {
        inner,
        seed: seed.to_string(),
        seen: HashSet::with_hasher(RandomState::new()),
    })
}

/// Lazy, distinct, seed-excluding view over a rule's variants
pub struct Mutations<'r> {
    inner: Variants<'r>,
    seed: String,
    seen: HashSet<String, RandomState>,
}

impl Iterator for Mutations<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let variant = self.inner.next()?;
            if variant == self.seed {
                continue;
            }
            if self.seen.insert(variant.clone()) {
                return Some(variant);
            }
        }
    }
}

/// Upper-case the first char and lower-case the rest
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Registry entry: a shared rule plus its run configuration
#[derive(Clone)]
pub struct RuleEntry {
    pub rule: Arc<dyn Rule>,
    pub priority: u8,
    pub enabled: bool,
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("name", &self.rule.name())
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Central name -> rule map.
///
/// `enabled`/`priority` are only touched between runs; a built [`RuleSet`]
/// holds its own snapshot.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    entries: BTreeMap<String, RuleEntry>,
}

impl RuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in catalogue, all enabled.
    ///
    /// `reference_year` feeds the year-based rules.
    pub fn with_builtin(reference_year: i32) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LeetspeakRule::new()));
        registry.register(Arc::new(CaseVariationRule::new()));
        registry.register(Arc::new(NumericSuffixRule::new()));
        registry.register(Arc::new(SpecialSuffixRule::new()));
        registry.register(Arc::new(YearSuffixRule::new(reference_year)));
        registry.register(Arc::new(CombinationRule::new()));
        registry.register(Arc::new(DuplicationRule::new()));
        registry.register(Arc::new(HybridSuffixRule::new()));
        registry.register(Arc::new(CommonPatternsRule::new(reference_year)));
        registry.register(Arc::new(DefaultPasswordsRule::new(reference_year)));
        registry
    }

    /// Register a rule. Replacing an existing name keeps its enabled/priority state.
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        let name = rule.name().to_string();
        let (priority, enabled) = match self.entries.get(&name) {
            Some(existing) => (existing.priority, existing.enabled),
            None => (rule.default_priority().min(MAX_PRIORITY), true),
        };
        log::debug!("Registered rule '{}' (priority {}, enabled {})", name, priority, enabled);
        self.entries.insert(name, RuleEntry { rule, priority, enabled });
    }

    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enable a rule. Returns false if the name is unknown.
    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable a rule. Returns false if the name is unknown.
    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Set a rule's priority. Returns false if the name is unknown.
    pub fn set_priority(&mut self, name: &str, priority: u8) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.priority = priority.min(MAX_PRIORITY);
                true
            }
            None => false,
        }
    }

    /// Apply per-rule overrides. Unknown names are ignored; unspecified fields
    /// keep their current value.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (&'a String, &'a RuleOverride)>,
    {
        for (name, over) in overrides {
            let Some(entry) = self.entries.get_mut(name) else {
                log::debug!("Ignoring config for unknown rule '{}'", name);
                continue;
            };
            if let Some(enabled) = over.enabled {
                entry.enabled = enabled;
            }
            if let Some(priority) = over.priority {
                entry.priority = priority;
            }
        }
    }

    /// Every entry, ordered by (priority, name)
    pub fn entries(&self) -> Vec<&RuleEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| (a.priority, a.rule.name()).cmp(&(b.priority, b.rule.name())));
        entries
    }

    /// Enabled multiplicative rules as an ordered [`RuleSet`]
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(
            self.entries
                .values()
                .filter(|e| e.enabled && e.rule.composition() == Composition::Multiplicative)
                .map(|e| (Arc::clone(&e.rule), e.priority)),
        )
    }

    /// Enabled additive rules, ordered by (priority, name)
    pub fn additive_rules(&self) -> Vec<Arc<dyn Rule>> {
        self.entries()
            .into_iter()
            .filter(|e| e.enabled && e.rule.composition() == Composition::Additive)
            .map(|e| Arc::clone(&e.rule))
            .collect()
    }
}

/// Enabled rules sorted ascending by priority; ties are broken by name
/// (byte order) so the expansion order never depends on registration order.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Arc<dyn Rule>, u8)>,
    {
        let mut rules: Vec<_> = rules.into_iter().collect();
        rules.sort_by(|(a, pa), (b, pb)| (pa, a.name()).cmp(&(pb, b.name())));
        Self {
            rules: rules.into_iter().map(|(rule, _)| rule).collect(),
        }
    }

    /// Build from rules using their default priorities
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Rule>>,
    {
        Self::new(rules.into_iter().map(|r| {
            let priority = r.default_priority();
            (r, priority)
        }))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Rule> {
        self.rules.get(index).map(|r| r.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|r| r.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|r| r.name()).collect()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2025;

    fn all_rules() -> Vec<Arc<dyn Rule>> {
        let registry = RuleRegistry::with_builtin(YEAR);
        let mut rules: Vec<_> = registry.entries().into_iter().map(|e| Arc::clone(&e.rule)).collect();
        rules.push(Arc::new(CombinationRule::with_numbers(["2025", "123"])));
        rules
    }

    #[test]
    fn test_no_rule_yields_its_seed() {
        let seeds = ["password", "Admin", "test", "a", "ab", "x1", "", "éléphant", "Passw0rd!"];
        for rule in all_rules() {
            for seed in seeds {
                let variants: Vec<_> = apply(rule.as_ref(), seed).unwrap().collect();
                assert!(
                    !variants.iter().any(|v| v == seed),
                    "rule {} yielded its seed {:?}",
                    rule.name(),
                    seed
                );
            }
        }
    }

    #[test]
    fn test_variants_are_distinct() {
        for rule in all_rules() {
            for seed in ["password", "AAAA", "a1"] {
                let variants: Vec<_> = apply(rule.as_ref(), seed).unwrap().collect();
                let unique: std::collections::HashSet<_> = variants.iter().collect();
                assert_eq!(unique.len(), variants.len(), "rule {} repeated a variant", rule.name());
            }
        }
    }

    #[test]
    fn test_estimate_factor_at_least_one() {
        for rule in all_rules() {
            assert!(rule.estimate_factor() >= 1, "rule {}", rule.name());
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pASSWORD"), "Password");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("1abc"), "1abc");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn test_registry_builtin_catalogue() {
        let registry = RuleRegistry::with_builtin(YEAR);
        assert_eq!(registry.len(), 10);
        assert!(registry.contains("default_passwords"));

        let set = registry.rule_set();
        assert_eq!(set.len(), 9);
        assert!(!set.contains("default_passwords"));
        assert_eq!(
            set.names(),
            vec![
                "combination",
                "duplication",
                "leetspeak",
                "case_variation",
                "numeric_suffix",
                "hybrid_suffix",
                "special_suffix",
                "common_patterns",
                "year_suffix",
            ]
        );

        let additive = registry.additive_rules();
        assert_eq!(additive.len(), 1);
        assert_eq!(additive[0].name(), "default_passwords");
    }

    #[test]
    fn test_rule_set_ties_break_by_name() {
        let set = RuleSet::new(vec![
            (Arc::new(SpecialSuffixRule::new()) as Arc<dyn Rule>, 10),
            (Arc::new(NumericSuffixRule::new()) as Arc<dyn Rule>, 10),
            (Arc::new(CaseVariationRule::new()) as Arc<dyn Rule>, 50),
        ]);
        assert_eq!(set.names(), vec!["numeric_suffix", "special_suffix", "case_variation"]);
    }

    #[test]
    fn test_enable_disable_and_priority() {
        let mut registry = RuleRegistry::with_builtin(YEAR);
        assert!(registry.disable("leetspeak"));
        assert!(!registry.disable("nope"));
        assert!(registry.set_priority("year_suffix", 200));
        assert_eq!(registry.get("year_suffix").unwrap().priority, MAX_PRIORITY);

        let set = registry.rule_set();
        assert!(!set.contains("leetspeak"));
        assert_eq!(set.names().last(), Some(&"year_suffix"));
    }

    #[test]
    fn test_overrides_ignore_unknown_and_keep_unspecified() {
        let mut registry = RuleRegistry::with_builtin(YEAR);
        let mut overrides = BTreeMap::new();
        overrides.insert("case_variation".to_string(), RuleOverride { enabled: Some(false), priority: None });
        overrides.insert("numeric_suffix".to_string(), RuleOverride { enabled: None, priority: Some(1) });
        overrides.insert("does_not_exist".to_string(), RuleOverride { enabled: Some(true), priority: Some(3) });
        registry.apply_overrides(&overrides);

        let case = registry.get("case_variation").unwrap();
        assert!(!case.enabled);
        assert_eq!(case.priority, 20);

        let numeric = registry.get("numeric_suffix").unwrap();
        assert!(numeric.enabled);
        assert_eq!(numeric.priority, 1);
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn test_replacing_rule_keeps_state() {
        let mut registry = RuleRegistry::with_builtin(YEAR);
        registry.set_priority("combination", 70);
        registry.disable("combination");
        registry.register(Arc::new(CombinationRule::with_numbers(["1990"])));

        let entry = registry.get("combination").unwrap();
        assert_eq!(entry.priority, 70);
        assert!(!entry.enabled);
        assert_eq!(entry.rule.estimate_factor(), 11);
    }
}
