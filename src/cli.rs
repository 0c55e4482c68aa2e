//! Command-line interface definition for pwgen
//!
//! Provides argument parsing and validation for the generator.

use crate::engine::DEFAULT_CACHE_CAPACITY;
use crate::output::DEFAULT_BATCH_SIZE;
use clap::Parser;
use std::path::PathBuf;

/// Rule-based password candidate generator for penetration testing
///
/// Mutate seed passwords through prioritized rules, prune implausible
/// candidates and estimate the output before writing it.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pwgen",
    author = "m0h1nd4",
    version,
    about = "Rule-based password candidate generator for penetration testing",
    long_about = r#"
╔══════════════════════════════════════════════════════════════════╗
║                          PWGEN v1.0.0                            ║
║              Rule-Based Password Candidate Generator             ║
║                     For Penetration Testing                      ║
╚══════════════════════════════════════════════════════════════════╝

Expand a list of known passwords into plausible variants (leetspeak,
case changes, suffixes, years, common patterns), drop improbable ones
and estimate the volume before anything is written.

EXAMPLES:
    # Generate with every built-in rule
    pwgen -i passwords.txt

    # Only show the estimate
    pwgen -i passwords.txt --dry-run

    # Custom output and config, no confirmation prompt
    pwgen -i passwords.txt -o out/candidates.txt -c pwgen.json -y

    # Pipe straight into a cracker
    pwgen -i passwords.txt --stdout | hashcat -m 1000 hashes.txt

    # List the available rules
    pwgen --list-rules

CONFIG FILE (JSON, every section optional):
    {
      "rules":   { "leetspeak": { "enabled": false }, "year_suffix": { "priority": 12 } },
      "cleanup": { "enabled": true, "filters": { "max_length": { "max_length": 14 } } },
      "output":  { "warn_count": 1000000, "warn_disk": "1GB",
                   "max_count": 10000000, "max_disk": "5GB" }
    }
"#,
    after_help = "For more information, visit: https://github.com/m0h1nd4/pwgen"
)]
pub struct Args {
    /// Source password file(s), one password per line
    #[arg(short, long, value_name = "PATH", num_args = 1.., required_unless_present_any = ["list_rules", "hashcat_help"])]
    pub input: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE", default_value = "output/generated_passwords.txt")]
    pub output: PathBuf,

    /// JSON configuration file (missing file = built-in defaults)
    #[arg(short, long, value_name = "FILE", default_value = "pwgen.json")]
    pub config: PathBuf,

    /// Estimate only, write nothing
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,

    /// List the available rules and exit
    #[arg(long, default_value_t = false)]
    pub list_rules: bool,

    /// Print a hashcat cheat sheet and exit
    #[arg(long, default_value_t = false)]
    pub hashcat_help: bool,

    /// Disable the cleanup filters
    #[arg(long, default_value_t = false)]
    pub no_cleanup: bool,

    /// Stream candidates to stdout instead of a file
    #[arg(long, default_value_t = false)]
    pub stdout: bool,

    /// Run even when the estimate exceeds the hard limits
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Reference year for year-based rules (default: current year)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Candidates per write batch
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Dedup cache bound; the cache is cleared when it grows past this
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_size: usize,

    /// Disable deduplication (faster but may contain duplicates)
    #[arg(long, default_value_t = false)]
    pub no_dedup: bool,

    /// Expand seeds in parallel (same output, more memory)
    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    /// Number of threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Reference year, reading the clock only when `--year` is absent
    pub fn reference_year(&self) -> i32 {
        use chrono::Datelike;
        self.year.unwrap_or_else(|| chrono::Local::now().year())
    }

    /// Worker count for parallel mode, `None` when sequential
    pub fn parallel_threads(&self) -> Option<usize> {
        self.parallel.then(|| self.threads.unwrap_or_else(num_cpus::get))
    }

    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("--batch-size must be at least 1");
        }
        if self.cache_size == 0 {
            anyhow::bail!("--cache-size must be at least 1");
        }
        if self.threads == Some(0) {
            anyhow::bail!("--threads must be at least 1");
        }
        if let Some(year) = self.year {
            if !(1000..=9999).contains(&year) {
                anyhow::bail!("Invalid year: {} (expected four digits)", year);
            }
        }
        for input in &self.input {
            if !input.exists() {
                anyhow::bail!("Input path does not exist: {:?}", input);
            }
        }
        Ok(())
    }
}
