//! Run orchestration
//!
//! Load seeds, apply the config file, estimate, gate on the hard limits,
//! then generate to a file (or stdout) and append the default passwords.

use crate::cleanup::CleanupChain;
use crate::cli::Args;
use crate::config::{load_config, PwgenConfig};
use crate::engine::{GenerationSummary, MutationEngine, WriteOptions};
use crate::error::PwgenError;
use crate::estimator::{EstimationResult, Estimator};
use crate::loader::{extract_numbers, load_seeds_from, LoadOptions};
use crate::output::WriteMode;
use crate::progress::{
    create_progress_bar, format_duration, format_number, print_bullet, print_header, print_info,
    print_success, print_warning,
};
use crate::rules::{CombinationRule, Rule, RuleRegistry};

use anyhow::Context;
use bytesize::ByteSize;
use colored::*;
use indicatif::ProgressBar;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub config_path: PathBuf,
    pub reference_year: i32,
    pub list_rules: bool,
    pub dry_run: bool,
    pub yes: bool,
    pub no_cleanup: bool,
    pub stdout: bool,
    pub force: bool,
    pub batch_size: usize,
    pub cache_size: usize,
    pub no_dedup: bool,
    pub parallel: Option<usize>,
    pub quiet: bool,
    pub verbose: bool,
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        args.validate()?;
        Ok(Self {
            inputs: args.input.clone(),
            output: args.output.clone(),
            config_path: args.config.clone(),
            reference_year: args.reference_year(),
            list_rules: args.list_rules,
            dry_run: args.dry_run,
            yes: args.yes,
            no_cleanup: args.no_cleanup,
            stdout: args.stdout,
            force: args.force,
            batch_size: args.batch_size,
            cache_size: args.cache_size,
            no_dedup: args.no_dedup,
            parallel: args.parallel_threads(),
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    ListedRules,
    DryRun(EstimationResult),
    /// Candidates written to stdout
    Streamed(u64),
    /// The user answered no at the prompt
    Declined,
    Generated(RunReport),
}

/// Final figures of a file run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: PathBuf,
    pub summary: GenerationSummary,
    /// Lines appended by additive rules
    pub additive: u64,
    /// Cleanup rejections, main run and additive rules together
    pub rejected: u64,
    pub file_size: u64,
}

impl RunReport {
    pub fn total_written(&self) -> u64 {
        self.summary.emitted + self.additive
    }
}

/// Everything resolved before generation starts
struct Plan {
    seeds: Vec<String>,
    engine: MutationEngine,
    additive: Vec<Arc<dyn Rule>>,
    estimate: EstimationResult,
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    cancel: Arc<AtomicBool>,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops generation before the next candidate when raised
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Status output goes to stdout, so it is muted when candidates do too
    fn loud(&self) -> bool {
        !self.config.quiet && !self.config.stdout
    }

    pub fn run(&self) -> anyhow::Result<RunOutcome> {
        let file_config = self.load_file_config();

        if self.config.list_rules {
            let registry = self.build_registry(&file_config, None);
            print_rules(&registry);
            return Ok(RunOutcome::ListedRules);
        }

        let plan = self.plan(&file_config)?;

        if self.config.dry_run {
            if self.loud() {
                print_suggestions();
                print_success("Dry run complete. No file written.");
            }
            return Ok(RunOutcome::DryRun(plan.estimate));
        }

        self.gate(&plan.estimate)?;

        if self.config.stdout {
            return self.stream(&plan);
        }

        if !self.config.yes && !confirm()? {
            print_warning("Generation cancelled.");
            return Ok(RunOutcome::Declined);
        }

        self.generate(&plan).map(RunOutcome::Generated)
    }

    fn load_file_config(&self) -> PwgenConfig {
        match load_config(&self.config.config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using built-in defaults", e);
                PwgenConfig::default()
            }
        }
    }

    fn build_registry(&self, file_config: &PwgenConfig, numbers: Option<CombinationRule>) -> RuleRegistry {
        let mut registry = RuleRegistry::with_builtin(self.config.reference_year);
        registry.apply_overrides(&file_config.rule_overrides());
        if let Some(combination) = numbers {
            registry.register(Arc::new(combination));
        }
        registry
    }

    fn plan(&self, file_config: &PwgenConfig) -> anyhow::Result<Plan> {
        if self.loud() {
            print_header("Loading source passwords...");
        }

        let seeds = load_seeds_from(&self.config.inputs, &LoadOptions::default())?;
        if seeds.is_empty() {
            anyhow::bail!("No source passwords found in {:?}", self.config.inputs);
        }

        let numbers = extract_numbers(&seeds)?;
        if self.loud() {
            print_success(&format!("{} source passwords loaded", format_number(seeds.len() as u64)));
            if !numbers.is_empty() {
                print_success(&format!("{} numbers extracted for combinations", numbers.len()));
            }
        }

        let combination = (!numbers.is_empty()).then(|| CombinationRule::with_numbers(numbers));
        let registry = self.build_registry(file_config, combination);
        let rule_set = registry.rule_set();
        let additive = registry.additive_rules();

        let cleanup = if self.config.no_cleanup || !file_config.cleanup.enabled {
            None
        } else {
            Some(CleanupChain::from_config(&file_config.cleanup))
        };

        if self.loud() {
            for rule in &additive {
                print_success(&format!("Rule '{}' isolated (appended at the end)", rule.name()));
            }
            print_success(&format!("{} mutation rules active", rule_set.len()));
            if let Some(chain) = &cleanup {
                print_success(&format!("Cleanup enabled ({} filters)", chain.enabled_count()));
            }
        }

        let estimator = Estimator::new(&seeds, &rule_set, file_config.output.limits());
        let estimate = estimator.estimate();
        if self.loud() {
            print_estimate(&estimator, &estimate, &additive, cleanup.is_some());
        }

        let mut engine = MutationEngine::new(rule_set).with_dedup(!self.config.no_dedup);
        if let Some(chain) = cleanup {
            engine = engine.with_cleanup(chain);
        }

        Ok(Plan {
            seeds,
            engine,
            additive,
            estimate,
        })
    }

    fn gate(&self, estimate: &EstimationResult) -> anyhow::Result<()> {
        if estimate.feasible {
            return Ok(());
        }
        let hard: Vec<String> = estimate
            .warnings
            .iter()
            .filter(|w| w.is_hard())
            .map(|w| w.message.clone())
            .collect();

        if self.config.force {
            log::warn!("Hard limits exceeded, continuing because of --force");
            if self.loud() {
                print_warning("Hard limits exceeded, continuing (--force)");
            }
            return Ok(());
        }
        if self.loud() {
            print_warning("Use --force to run anyway");
        }
        Err(PwgenError::HardLimitExceeded(hard).into())
    }

    fn stream(&self, plan: &Plan) -> anyhow::Result<RunOutcome> {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        let streamed = plan
            .engine
            .stream_to(&mut out, &plan.seeds, self.config.cache_size, Some(&self.cancel));
        match streamed {
            Ok(count) => Ok(RunOutcome::Streamed(count)),
            // the consumer (head, hashcat) went away
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("stdout closed early");
                Ok(RunOutcome::Streamed(0))
            }
            Err(e) => Err(e).context("failed to write candidates to stdout"),
        }
    }

    fn generate(&self, plan: &Plan) -> anyhow::Result<RunReport> {
        let output = &self.config.output;
        if self.loud() {
            print_header("Generating...");
        }

        let start = Instant::now();
        let progress = if self.loud() {
            create_progress_bar(plan.seeds.len() as u64, "starting")
        } else {
            ProgressBar::hidden()
        };

        let options = WriteOptions {
            batch_size: self.config.batch_size,
            mode: WriteMode::Truncate,
            cache_capacity: self.config.cache_size,
            parallel: self.config.parallel,
            cancel: Some(self.cancel_handle()),
        };
        let summary = plan
            .engine
            .generate_to_file(&plan.seeds, output, &options, &progress)?;

        let mut additive = 0;
        if !summary.cancelled {
            for rule in &plan.additive {
                if self.loud() {
                    print_info(&format!(
                        "Appending '{}' (~{} candidates)",
                        rule.name(),
                        rule.estimate_factor()
                    ));
                }
                additive += plan
                    .engine
                    .append_additive(rule.as_ref(), output, self.config.batch_size)?;
            }
        }

        let file_size = std::fs::metadata(output)
            .with_context(|| format!("failed to stat output {:?}", output))?
            .len();

        let report = RunReport {
            output: output.clone(),
            rejected: plan.engine.rejected_count(),
            summary,
            additive,
            file_size,
        };

        if !self.config.quiet {
            print_report(&report, start.elapsed());
        }
        Ok(report)
    }
}

/// Print every registered rule with its status
fn print_rules(registry: &RuleRegistry) {
    print_header("Available rules");
    for entry in registry.entries() {
        let status = if entry.enabled { "✔".green() } else { "✖".red() };
        println!("  {} {}", status, entry.rule.name().bold());
        println!("     └─ {}", entry.rule.description());
        println!(
            "        Priority: {}, Factor: ×{}",
            entry.priority,
            entry.rule.estimate_factor()
        );
        println!();
    }
}

fn print_estimate(
    estimator: &Estimator,
    estimate: &EstimationResult,
    additive: &[Arc<dyn Rule>],
    cleanup: bool,
) {
    let additive_count: u64 = additive.iter().map(|r| r.estimate_factor()).sum();

    print_header("Estimate");
    print_bullet(&format!("Source passwords: {}", format_number(estimate.seed_count)));
    print_bullet(&format!("Average length:   {:.1} chars", estimate.average_length));
    print_bullet(&format!("Active rules:     {}", estimator.rule_factors().len()));

    if !estimator.rule_factors().is_empty() {
        println!("\n  Multiplicative factors:");
        for (name, factor) in estimator.rule_factors() {
            println!("     └─ {}: ×{}", name, factor);
        }
    }

    println!();
    print_info(&format!(
        "Estimated total (raw):      {}",
        format_number(estimate.total_count.saturating_add(additive_count))
    ));
    print_info(&format!(
        "Realistic total (filtered): ~{}",
        format_number(estimate.realistic_count.saturating_add(additive_count))
    ));
    print_info(&format!("Estimated disk usage:       ~{}", ByteSize(estimate.disk_bytes)));
    if cleanup {
        print_info("Cleanup active (improbable candidates are dropped)");
    }

    if !estimate.warnings.is_empty() {
        println!();
        for warning in &estimate.warnings {
            print_warning(&warning.message);
        }
    }
}

fn print_suggestions() {
    print_header("Base word suggestions");
    print_bullet("System:       admin, adm, root, user, usr, sys, config, default");
    print_bullet("Personal:     first/last names (martin, mrt), cities (paris, prs)");
    print_bullet("Professional: company names, projects, departments");
    print_bullet("Common:       password, pass, pwd, welcome, secret");
    print_bullet("Dates:        2020, 2024, 123, 1234");
    print_info("Think of abbreviations: admin -> adm, martin -> mrt, password -> pwd");
    print_info("With \"mrt\" you get mrt2020, mrt*2020, Mrt2020!, ...");
}

fn print_report(report: &RunReport, elapsed: std::time::Duration) {
    println!();
    println!("{}", "═".repeat(60).green());
    if report.summary.cancelled {
        println!("{}", "                   GENERATION CANCELLED".yellow().bold());
    } else {
        println!("{}", "                   GENERATION COMPLETE".green().bold());
    }
    println!("{}", "═".repeat(60).green());
    println!();

    println!("  {} {}", "File:           ".green(), report.output.display());
    println!(
        "  {} {}",
        "Generated:      ".green().bold(),
        format_number(report.total_written()).green().bold()
    );
    println!("  {} {}", "File size:      ".green(), ByteSize(report.file_size));
    if report.rejected > 0 {
        println!("  {} {}", "Filtered out:   ".yellow(), format_number(report.rejected));
    }
    if report.summary.dedup.duplicates > 0 {
        println!(
            "  {} {}",
            "Duplicates:     ".yellow(),
            format_number(report.summary.dedup.duplicates)
        );
    }
    if report.summary.rule_failures > 0 {
        println!(
            "  {} {}",
            "Rule failures:  ".red(),
            format_number(report.summary.rule_failures).red()
        );
    }
    println!("  {} {}", "Duration:       ".green(), format_duration(elapsed));
    println!();
    println!("{}", "═".repeat(60).green());
}

/// Ask before writing; empty answer means yes
fn confirm() -> anyhow::Result<bool> {
    print!("\n  {} Start generation? [Y/n] ", "?".cyan());
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes"))
}

/// Print a hashcat cheat sheet
pub fn print_hashcat_help() {
    let help = r#"
PWGEN + HASHCAT - QUICK REFERENCE
════════════════════════════════════════════════════════════════════════

STANDARD USE (with a file)
────────────────────────────────────────────────────────────────────────
  1. Generate the wordlist:
     pwgen -i my_passwords.txt -o wordlist.txt -y

  2. Run hashcat:
     hashcat -m <TYPE> -a 0 hashes.txt wordlist.txt

DIRECT USE (pipe, no intermediate file)
────────────────────────────────────────────────────────────────────────
  pwgen -i my_passwords.txt --stdout | hashcat -m <TYPE> hashes.txt

COMMON HASH TYPES (-m)
────────────────────────────────────────────────────────────────────────
  0      MD5                    │    1000   NTLM (Windows)
  100    SHA1                   │    1800   sha512crypt ($6$, Linux)
  500    md5crypt ($1$)         │    3200   bcrypt
  1400   SHA256                 │    5600   NetNTLMv2
  1700   SHA512                 │    13100  Kerberos TGS-REP

EXAMPLES
────────────────────────────────────────────────────────────────────────
  # MD5 hashes
  pwgen -i pw.txt --stdout | hashcat -m 0 hashes.txt

  # NetNTLMv2 (captured with Responder)
  pwgen -i pw.txt --stdout | hashcat -m 5600 hashes.txt

  # sha512crypt (Linux /etc/shadow)
  pwgen -i pw.txt --stdout | hashcat -m 1800 hashes.txt

  # Show cracked results
  hashcat -m 0 hashes.txt --show

NTLM VERSIONS (Windows)
────────────────────────────────────────────────────────────────────────
  1000   NTLM (local hash, SAM/NTDS)
  5500   NetNTLMv1 (legacy, network capture)
  5600   NetNTLMv2 (current, network capture)
"#;
    println!("{}", help);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, seeds: &str) -> ProcessorConfig {
        let input = dir.path().join("seeds.txt");
        std::fs::write(&input, seeds).unwrap();
        ProcessorConfig {
            inputs: vec![input],
            output: dir.path().join("out").join("candidates.txt"),
            config_path: dir.path().join("pwgen.json"),
            reference_year: 2025,
            list_rules: false,
            dry_run: false,
            yes: true,
            no_cleanup: false,
            stdout: false,
            force: false,
            batch_size: 1000,
            cache_size: 1_000_000,
            no_dedup: false,
            parallel: None,
            quiet: true,
            verbose: false,
        }
    }

    /// Config enabling only the cheap suffix rules and the defaults
    fn write_small_rule_config(dir: &TempDir) {
        let json = r#"{
            "rules": {
                "combination": { "enabled": false },
                "duplication": { "enabled": false },
                "leetspeak": { "enabled": false },
                "case_variation": { "enabled": false },
                "hybrid_suffix": { "enabled": false },
                "common_patterns": { "enabled": false },
                "year_suffix": { "enabled": false }
            }
        }"#;
        std::fs::write(dir.path().join("pwgen.json"), json).unwrap();
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, "password\nadmin\n");
        config.dry_run = true;

        let outcome = Processor::new(config.clone()).run().unwrap();
        let RunOutcome::DryRun(estimate) = outcome else {
            panic!("expected a dry run");
        };
        assert_eq!(estimate.seed_count, 2);
        assert!(!config.output.exists());
    }

    #[test]
    fn test_full_run_appends_defaults() {
        let dir = TempDir::new().unwrap();
        write_small_rule_config(&dir);
        let config = config_for(&dir, "Password\n");

        let outcome = Processor::new(config.clone()).run().unwrap();
        let RunOutcome::Generated(report) = outcome else {
            panic!("expected a generated file");
        };

        let content = std::fs::read_to_string(&config.output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Password");
        assert!(lines.contains(&"Password123"));
        assert!(lines.contains(&"admin2025"));
        assert_eq!(lines.len() as u64, report.total_written());
        assert!(report.additive > 0);
        assert_eq!(report.file_size, content.len() as u64);
    }

    #[test]
    fn test_hard_limit_aborts_without_force() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pwgen.json"),
            r#"{ "output": { "max_count": 10 } }"#,
        )
        .unwrap();
        let config = config_for(&dir, "password\n");

        let err = Processor::new(config.clone()).run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PwgenError>(),
            Some(PwgenError::HardLimitExceeded(_))
        ));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_force_overrides_hard_limit() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pwgen.json"),
            r#"{ "rules": { "common_patterns": { "enabled": false },
                            "year_suffix": { "enabled": false },
                            "hybrid_suffix": { "enabled": false },
                            "leetspeak": { "enabled": false } },
                 "output": { "max_count": 10 } }"#,
        )
        .unwrap();
        let mut config = config_for(&dir, "admin\n");
        config.force = true;

        let outcome = Processor::new(config.clone()).run().unwrap();
        assert!(matches!(outcome, RunOutcome::Generated(_)));
        assert!(config.output.exists());
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, "");
        config.inputs = vec![dir.path().join("missing.txt")];

        let err = Processor::new(config).run().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PwgenError>(),
            Some(PwgenError::SourceLoad { .. })
        ));
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir, "\n  \n");
        assert!(Processor::new(config).run().is_err());
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pwgen.json"), "{ not json").unwrap();
        let mut config = config_for(&dir, "password\n");
        config.dry_run = true;

        let RunOutcome::DryRun(estimate) = Processor::new(config).run().unwrap() else {
            panic!("expected a dry run");
        };
        // every built-in multiplicative rule is active by default
        assert!(estimate.total_factor > 1_000_000);
    }

    #[test]
    fn test_stdout_mode_honors_cancel_handle() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, "password\nadmin\n");
        config.stdout = true;
        config.force = true;

        let processor = Processor::new(config.clone());
        processor
            .cancel_handle()
            .store(true, std::sync::atomic::Ordering::Relaxed);

        let outcome = processor.run().unwrap();
        assert!(matches!(outcome, RunOutcome::Streamed(0)));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_list_rules() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir, "x\n");
        config.list_rules = true;
        assert!(matches!(
            Processor::new(config).run().unwrap(),
            RunOutcome::ListedRules
        ));
    }
}
