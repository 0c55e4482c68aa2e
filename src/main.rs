//! pwgen - Rule-based password candidate generator for penetration testing
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::process;

use pwgen::cli::Args;
use pwgen::processor::{print_hashcat_help, Processor, ProcessorConfig, RunOutcome};
use pwgen::progress::{print_banner, print_error, print_header, print_info};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    // Configure thread pool
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    // Run the application
    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if args.hashcat_help {
        print_hashcat_help();
        return Ok(());
    }

    // Candidates on stdout must not be mixed with status output
    let loud = !args.quiet && !args.stdout;
    if loud {
        print_banner();
    }

    let config = ProcessorConfig::from_args(&args)?;

    if loud && args.verbose {
        print_config(&args, &config);
    }

    let processor = Processor::new(config);
    match processor.run()? {
        RunOutcome::Streamed(count) => log::info!("{} candidates written to stdout", count),
        RunOutcome::Declined => log::info!("Nothing written"),
        _ => {}
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &ProcessorConfig) {
    print_header("Configuration");

    print_info(&format!("Input:        {:?}", config.inputs));
    print_info(&format!("Output:       {:?}", config.output));
    print_info(&format!("Config:       {:?}", config.config_path));
    print_info(&format!("Year:         {}", config.reference_year));
    print_info(&format!("Cleanup:      {}", !config.no_cleanup));
    print_info(&format!("Dedup:        {}", !config.no_dedup));
    print_info(&format!("Batch size:   {}", config.batch_size));
    print_info(&format!("Cache size:   {}", config.cache_size));
    match config.parallel {
        Some(threads) => print_info(&format!("Parallel:     {} threads", threads)),
        None => print_info(&format!(
            "Threads:      {}",
            args.threads.unwrap_or_else(num_cpus::get)
        )),
    }
}
