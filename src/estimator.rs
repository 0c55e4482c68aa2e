//! Output volume and disk usage estimation
//!
//! Projections are a product of per-rule factors, so they are upper bounds:
//! cleanup and dedup only ever remove candidates.

use crate::rules::RuleSet;

/// Name of the rule whose output mostly fails `max_length`
const DUPLICATION_RULE: &str = "duplication";

/// Bytes added to the average seed length per candidate (suffix + newline)
const PER_CANDIDATE_OVERHEAD: u64 = 3;

/// Warning and hard-limit thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeasibilityLimits {
    pub warn_count: u64,
    pub warn_disk: u64,
    pub max_count: u64,
    pub max_disk: u64,
}

impl Default for FeasibilityLimits {
    fn default() -> Self {
        Self {
            warn_count: 1_000_000,
            warn_disk: 1 << 30,
            max_count: 10_000_000,
            max_disk: 5 << 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Printed, the run proceeds
    Soft,
    /// Aborts the run unless forced
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeasibilityWarning {
    pub severity: Severity,
    pub message: String,
}

impl FeasibilityWarning {
    fn soft(message: String) -> Self {
        Self {
            severity: Severity::Soft,
            message,
        }
    }

    fn hard(message: String) -> Self {
        Self {
            severity: Severity::Hard,
            message: format!("LIMIT EXCEEDED: {message}"),
        }
    }

    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }
}

impl std::fmt::Display for FeasibilityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything the estimator knows about a planned run
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    pub seed_count: u64,
    pub average_length: f64,
    pub total_factor: u64,
    pub total_count: u64,
    pub realistic_count: u64,
    pub disk_bytes: u64,
    pub warnings: Vec<FeasibilityWarning>,
    pub feasible: bool,
}

/// Projects a run from the seed list and the active rule set
#[derive(Debug, Clone)]
pub struct Estimator {
    seed_count: u64,
    total_chars: u64,
    average_length: f64,
    factors: Vec<(String, u64)>,
    duplication_active: bool,
    limits: FeasibilityLimits,
}

impl Estimator {
    pub fn new<S: AsRef<str>>(seeds: &[S], rules: &RuleSet, limits: FeasibilityLimits) -> Self {
        let total_chars: usize = seeds.iter().map(|s| s.as_ref().chars().count()).sum();
        let average_length = if seeds.is_empty() {
            0.0
        } else {
            total_chars as f64 / seeds.len() as f64
        };

        Self {
            seed_count: seeds.len() as u64,
            total_chars: total_chars as u64,
            average_length,
            factors: rules
                .iter()
                .map(|r| (r.name().to_string(), r.estimate_factor().max(1)))
                .collect(),
            duplication_active: rules.contains(DUPLICATION_RULE),
            limits,
        }
    }

    pub fn limits(&self) -> &FeasibilityLimits {
        &self.limits
    }

    /// (rule name, factor) in application order
    pub fn rule_factors(&self) -> &[(String, u64)] {
        &self.factors
    }

    /// Product of every rule factor (saturating)
    pub fn total_factor(&self) -> u64 {
        self.factors
            .iter()
            .fold(1u64, |acc, (_, f)| acc.saturating_mul(*f))
    }

    pub fn average_length(&self) -> f64 {
        self.average_length
    }

    /// Seeds times the product of rule factors
    pub fn estimate_total_passwords(&self) -> u64 {
        self.seed_count.saturating_mul(self.total_factor())
    }

    /// Expected count after cleanup: 1% when duplication is active, 80% otherwise
    pub fn estimate_realistic_count(&self) -> u64 {
        let total = self.estimate_total_passwords() as u128;
        let kept = if self.duplication_active {
            total / 100
        } else {
            total * 80 / 100
        };
        kept as u64
    }

    /// Projected output size in bytes: total x (average length + overhead),
    /// computed exactly as total x (chars + overhead x seeds) / seeds
    pub fn estimate_disk_size(&self) -> u64 {
        if self.seed_count == 0 {
            return 0;
        }
        let per_seed_bytes = self.total_chars as u128
            + PER_CANDIDATE_OVERHEAD as u128 * self.seed_count as u128;
        match (self.estimate_total_passwords() as u128).checked_mul(per_seed_bytes) {
            Some(bytes) => u64::try_from(bytes / self.seed_count as u128).unwrap_or(u64::MAX),
            None => u64::MAX,
        }
    }

    /// Ordered warnings: soft count, soft disk, hard count, hard disk
    pub fn check_feasibility(&self) -> Vec<FeasibilityWarning> {
        let count = self.estimate_total_passwords();
        let disk = self.estimate_disk_size();
        let gib = |bytes: u64| bytes as f64 / (1u64 << 30) as f64;
        let mut warnings = Vec::new();

        if count > self.limits.warn_count {
            warnings.push(FeasibilityWarning::soft(format!(
                "High candidate count ({count}). Generation may take a while."
            )));
        }

        if disk > self.limits.warn_disk {
            warnings.push(FeasibilityWarning::soft(format!(
                "High estimated disk usage (~{:.2} GB). Check available space.",
                gib(disk)
            )));
        }

        if count > self.limits.max_count {
            warnings.push(FeasibilityWarning::hard(format!(
                "{count} > {} candidates. Reduce the rules or the source list.",
                self.limits.max_count
            )));
        }

        if disk > self.limits.max_disk {
            warnings.push(FeasibilityWarning::hard(format!(
                "~{:.2} GB > {:.2} GB. Reduce the rules or the source list.",
                gib(disk),
                gib(self.limits.max_disk)
            )));
        }

        warnings
    }

    /// True when neither hard limit is exceeded
    pub fn is_feasible(&self) -> bool {
        self.estimate_total_passwords() <= self.limits.max_count
            && self.estimate_disk_size() <= self.limits.max_disk
    }

    pub fn estimate(&self) -> EstimationResult {
        EstimationResult {
            seed_count: self.seed_count,
            average_length: self.average_length,
            total_factor: self.total_factor(),
            total_count: self.estimate_total_passwords(),
            realistic_count: self.estimate_realistic_count(),
            disk_bytes: self.estimate_disk_size(),
            warnings: self.check_feasibility(),
            feasible: self.is_feasible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CaseVariationRule, DuplicationRule, Rule};
    use std::sync::Arc;

    fn seeds(n: usize, len: usize) -> Vec<String> {
        (0..n).map(|_| "x".repeat(len)).collect()
    }

    fn case_only() -> RuleSet {
        RuleSet::from_rules([Arc::new(CaseVariationRule::new()) as Arc<dyn Rule>])
    }

    #[test]
    fn test_total_and_disk() {
        let est = Estimator::new(&seeds(100, 8), &case_only(), FeasibilityLimits::default());
        assert_eq!(est.estimate_total_passwords(), 400);
        assert_eq!(est.estimate_disk_size(), 4400);
        assert_eq!(est.estimate_realistic_count(), 320);
        assert!(est.check_feasibility().is_empty());
        assert!(est.is_feasible());
    }

    #[test]
    fn test_realistic_with_duplication() {
        let rules = RuleSet::from_rules([
            Arc::new(CaseVariationRule::new()) as Arc<dyn Rule>,
            Arc::new(DuplicationRule::new()),
        ]);
        let est = Estimator::new(&seeds(100, 8), &rules, FeasibilityLimits::default());
        assert_eq!(est.estimate_total_passwords(), 2000);
        assert_eq!(est.estimate_realistic_count(), 20);
    }

    #[test]
    fn test_empty_rule_set() {
        let est = Estimator::new(&seeds(3, 4), &RuleSet::empty(), FeasibilityLimits::default());
        assert_eq!(est.total_factor(), 1);
        assert_eq!(est.estimate_total_passwords(), 3);
        assert_eq!(est.estimate_disk_size(), 21);
    }

    #[test]
    fn test_no_seeds() {
        let est = Estimator::new::<String>(&[], &case_only(), FeasibilityLimits::default());
        assert_eq!(est.estimate_total_passwords(), 0);
        assert_eq!(est.estimate_disk_size(), 0);
    }

    #[test]
    fn test_warning_order_and_severity() {
        let limits = FeasibilityLimits {
            warn_count: 10,
            warn_disk: 100,
            max_count: 100,
            max_disk: 1000,
        };
        // 400 candidates, 4400 bytes: every threshold exceeded
        let est = Estimator::new(&seeds(100, 8), &case_only(), limits);
        let warnings = est.check_feasibility();

        let severities: Vec<_> = warnings.iter().map(|w| w.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Soft, Severity::Soft, Severity::Hard, Severity::Hard]
        );
        assert!(warnings[0].message.contains("count"));
        assert!(warnings[1].message.contains("disk"));
        assert!(warnings[2].message.starts_with("LIMIT EXCEEDED"));
        assert!(!est.is_feasible());
        assert!(!est.estimate().feasible);
    }

    #[test]
    fn test_threshold_is_strict() {
        let limits = FeasibilityLimits {
            warn_count: 400,
            warn_disk: 4400,
            max_count: 400,
            max_disk: 4400,
        };
        let est = Estimator::new(&seeds(100, 8), &case_only(), limits);
        assert!(est.check_feasibility().is_empty());
        assert!(est.is_feasible());
    }

    #[test]
    fn test_disk_size_is_exact_for_large_counts() {
        // 3 seeds of lengths 1, 2, 2: average 5/3, so 14/3 bytes per candidate
        let input = vec!["a".to_string(), "bb".to_string(), "cc".to_string()];
        let rules = RuleSet::from_rules(
            (0..26).map(|_| Arc::new(CaseVariationRule::new()) as Arc<dyn Rule>),
        );
        let est = Estimator::new(&input, &rules, FeasibilityLimits::default());

        // 3 * 4^26 = 3 * 2^52
        let total = est.estimate_total_passwords();
        assert_eq!(total, 3 << 52);
        assert_eq!(est.estimate_disk_size(), 14 << 52);
    }

    #[test]
    fn test_saturates() {
        let rules = RuleSet::from_rules(
            (0..40).map(|_| Arc::new(CaseVariationRule::new()) as Arc<dyn Rule>),
        );
        let est = Estimator::new(&seeds(10, 8), &rules, FeasibilityLimits::default());
        assert_eq!(est.estimate_total_passwords(), u64::MAX);
        assert_eq!(est.estimate_disk_size(), u64::MAX);
        assert!(!est.is_feasible());
    }
}
