//! # pwgen
//!
//! Rule-based password candidate generator for penetration testing.
//!
//! ## Features
//!
//! - **Mutation rules**: leetspeak, case variations, numeric/special/year suffixes,
//!   combinations with numbers found in the source, duplication, hybrid suffixes,
//!   common patterns and default passwords
//! - **Lazy expansion**: candidates are produced depth-first, one at a time, in a
//!   deterministic order
//! - **Cleanup**: a chain of filters drops improbable candidates
//! - **Estimation**: projected count and disk usage, with hard limits checked
//!   before anything is written
//! - **Deduplication**: bounded cache that is cleared when it overflows
//! - **Batched output**: candidates reach the file in batches; stdout streaming
//!   for piping into a cracker
//!
//! ## Usage
//!
//! ```bash
//! # Generate with every built-in rule
//! pwgen -i passwords.txt
//!
//! # Estimate only
//! pwgen -i passwords.txt --dry-run
//!
//! # Pipe into hashcat
//! pwgen -i passwords.txt --stdout | hashcat -m 1000 hashes.txt
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pwgen::rules::RuleRegistry;
//! use pwgen::MutationEngine;
//!
//! let mut registry = RuleRegistry::with_builtin(2025);
//! for name in ["leetspeak", "case_variation", "combination", "duplication",
//!              "hybrid_suffix", "common_patterns", "year_suffix", "special_suffix"] {
//!     registry.disable(name);
//! }
//!
//! let engine = MutationEngine::new(registry.rule_set());
//! let candidates: Vec<String> = engine.generate("admin").collect();
//! assert_eq!(candidates[0], "admin");
//! assert!(candidates.contains(&"admin123".to_string()));
//! ```

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod loader;
pub mod output;
pub mod processor;
pub mod progress;
pub mod rules;

pub use cleanup::{CleanupChain, CleanupFilter};
pub use cli::Args;
pub use config::PwgenConfig;
pub use engine::{GenerationSummary, MutationEngine, WriteOptions};
pub use error::{PwgenError, Result};
pub use estimator::{EstimationResult, Estimator, FeasibilityLimits};
pub use processor::{Processor, ProcessorConfig, RunOutcome};
pub use rules::{Rule, RuleRegistry, RuleSet};
