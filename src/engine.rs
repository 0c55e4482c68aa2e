//! Mutation engine
//!
//! Expands every seed into the tree of rule applications. For a held string
//! `s` and rule index `i` the engine first follows the branch that skips rule
//! `i`, then every variant of rule `i` applied to `s`; a string is emitted
//! once it has passed the last rule. The seed itself is therefore always the
//! first candidate.
//!
//! The tree is walked with an explicit stack of lazy per-rule iterators, so
//! memory grows with the number of rules, never with the number of candidates.

use crate::cleanup::CleanupChain;
use crate::dedup::{create_deduplicator, DedupStats, Deduplicator};
use crate::error::{PwgenError, Result};
use crate::output::{BatchWriter, WriteMode, DEFAULT_BATCH_SIZE};
use crate::progress::{Progress, ProgressSink};
use crate::rules::{apply, Mutations, Rule, RuleSet, ADDITIVE_SEED};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Default bound of the dedup cache
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000_000;

/// Seeds expanded concurrently per worker thread in parallel mode
const SEEDS_PER_THREAD: usize = 4;

/// Candidates a parallel worker may queue ahead of the writer, per seed
pub const PARALLEL_QUEUE_CAPACITY: usize = 1024;

/// Options for [`MutationEngine::generate_to_file`]
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub batch_size: usize,
    pub mode: WriteMode,
    pub cache_capacity: usize,
    /// Expand seeds concurrently with this many threads (0 = all cores)
    pub parallel: Option<usize>,
    /// Checked before every candidate; when set, the pending batch is dropped
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mode: WriteMode::Truncate,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            parallel: None,
            cancel: None,
        }
    }
}

/// Outcome of one [`MutationEngine::generate_to_file`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Candidates that reached the destination
    pub emitted: u64,
    pub bytes_written: u64,
    pub rejected: u64,
    pub rule_failures: u64,
    pub seeds_done: u64,
    pub dedup: DedupStats,
    pub cancelled: bool,
}

/// Applies a [`RuleSet`] to seeds, filters through cleanup and deduplicates
pub struct MutationEngine {
    rules: RuleSet,
    cleanup: Option<CleanupChain>,
    dedup: bool,
    rejected: AtomicU64,
    rule_failures: AtomicU64,
    /// Per rule index: a failure has already been logged at warn level
    failure_warned: Vec<AtomicBool>,
}

impl MutationEngine {
    /// Engine without cleanup, with dedup
    pub fn new(rules: RuleSet) -> Self {
        Self {
            failure_warned: (0..rules.len()).map(|_| AtomicBool::new(false)).collect(),
            rules,
            cleanup: None,
            dedup: true,
            rejected: AtomicU64::new(0),
            rule_failures: AtomicU64::new(0),
        }
    }

    pub fn with_cleanup(mut self, cleanup: CleanupChain) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn with_dedup(mut self, enabled: bool) -> Self {
        self.dedup = enabled;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Candidates rejected by cleanup since the last reset
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Rule applications that failed and were skipped since the last reset
    pub fn rule_failures(&self) -> u64 {
        self.rule_failures.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.rejected.store(0, Ordering::Relaxed);
        self.rule_failures.store(0, Ordering::Relaxed);
        for flag in &self.failure_warned {
            flag.store(false, Ordering::Relaxed);
        }
    }

    /// Count a failed rule application. Only the first failure of each rule
    /// per run is logged at warn level; the summary carries the total.
    fn record_failure(&self, index: usize, err: &PwgenError) {
        self.rule_failures.fetch_add(1, Ordering::Relaxed);
        let already = self
            .failure_warned
            .get(index)
            .map_or(true, |flag| flag.swap(true, Ordering::Relaxed));
        if already {
            log::debug!("{}; skipping its variants", err);
        } else {
            log::warn!("{}; skipping its variants (further failures of this rule logged at debug)", err);
        }
    }

    fn accepts(&self, candidate: &str) -> bool {
        match &self.cleanup {
            Some(chain) if !chain.is_valid(candidate) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                false
            }
            _ => true,
        }
    }

    /// Every filtered candidate for one seed, lazily, seed first
    pub fn generate(&self, seed: &str) -> Expansion<'_> {
        let mut expansion = Expansion {
            engine: self,
            stack: Vec::with_capacity(self.rules.len()),
            ready: None,
        };
        expansion.descend(seed.to_string(), 0);
        expansion
    }

    /// Candidates for every seed in order, deduplicated across seeds
    pub fn generate_all<'e, S: AsRef<str>>(
        &'e self,
        seeds: &'e [S],
        cache_capacity: usize,
    ) -> GenerateAll<'e, S> {
        GenerateAll {
            engine: self,
            seeds,
            next_seed: 0,
            current: None,
            dedup: create_deduplicator(self.dedup, cache_capacity),
            seeds_consumed: 0,
        }
    }

    /// Write every candidate to `dest` in batches
    pub fn generate_to_file<S: AsRef<str> + Sync>(
        &self,
        seeds: &[S],
        dest: &Path,
        options: &WriteOptions,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationSummary> {
        self.reset_counters();
        let mut run = FileRun {
            writer: BatchWriter::new(dest, options.mode, options.batch_size)?,
            cancel: options.cancel.as_deref(),
            progress,
            seeds_total: seeds.len() as u64,
            seeds_done: 0,
            cancelled: false,
        };

        log::info!(
            "Generating {} seeds x {} rules into {:?}",
            seeds.len(),
            self.rules.len(),
            dest
        );

        let dedup = match options.parallel {
            Some(threads) => self.write_parallel(seeds, threads, options.cache_capacity, &mut run)?,
            None => self.write_sequential(seeds, options.cache_capacity, &mut run)?,
        };

        if run.cancelled {
            let dropped = run.writer.discard();
            log::warn!("Generation cancelled; {} unflushed candidates dropped", dropped);
        } else {
            run.writer.flush()?;
        }

        let snapshot = run.snapshot(self);
        progress.finish(&snapshot);

        Ok(GenerationSummary {
            emitted: run.writer.lines_written(),
            bytes_written: run.writer.bytes_written(),
            rejected: self.rejected_count(),
            rule_failures: self.rule_failures(),
            seeds_done: run.seeds_done,
            dedup,
            cancelled: run.cancelled,
        })
    }

    fn write_sequential<S: AsRef<str>>(
        &self,
        seeds: &[S],
        cache_capacity: usize,
        run: &mut FileRun<'_>,
    ) -> Result<DedupStats> {
        let mut stream = self.generate_all(seeds, cache_capacity);
        loop {
            if run.is_cancelled() {
                break;
            }
            let Some(candidate) = stream.next() else {
                break;
            };
            run.seeds_done = stream.seeds_consumed() as u64;
            run.push(self, candidate)?;
        }
        run.seeds_done = stream.seeds_consumed() as u64;
        Ok(stream.dedup_stats())
    }

    /// Expand windows of seeds concurrently. Each seed streams into its own
    /// bounded queue; the queues are drained in seed order through one dedup
    /// cache, so output matches the sequential path and workers never run
    /// more than [`PARALLEL_QUEUE_CAPACITY`] candidates ahead.
    fn write_parallel<S: AsRef<str> + Sync>(
        &self,
        seeds: &[S],
        threads: usize,
        cache_capacity: usize,
        run: &mut FileRun<'_>,
    ) -> Result<DedupStats> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        let window = threads.max(1) * SEEDS_PER_THREAD;
        let mut dedup = create_deduplicator(self.dedup, cache_capacity);
        let cancel = run.cancel;
        log::debug!("Parallel expansion: {} threads, window of {} seeds", threads, window);

        for chunk in seeds.chunks(window) {
            let stop = AtomicBool::new(false);

            // FIFO spawning starts seeds in order, so the queue being drained
            // always belongs to a running or finished worker
            let stopped = rayon::in_place_scope_fifo(|scope| {
                let mut queues = Vec::with_capacity(chunk.len());
                for seed in chunk {
                    let (tx, rx) = bounded(PARALLEL_QUEUE_CAPACITY);
                    queues.push(rx);
                    let stop = &stop;
                    scope.spawn_fifo(move |_| self.expand_into(seed.as_ref(), &tx, stop, cancel));
                }

                let drained = self.drain_in_order(&queues, dedup.as_mut(), run);
                stop.store(true, Ordering::Relaxed);
                // wakes workers blocked on a full queue
                drop(queues);
                drained
            })?;

            if stopped {
                break;
            }
        }

        Ok(dedup.stats())
    }

    /// Worker side of the parallel path
    fn expand_into(
        &self,
        seed: &str,
        tx: &Sender<String>,
        stop: &AtomicBool,
        cancel: Option<&AtomicBool>,
    ) {
        let halted = || {
            stop.load(Ordering::Relaxed) || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
        };

        let mut expansion = self.generate(seed);
        while !halted() {
            let Some(candidate) = expansion.next() else {
                break;
            };
            if tx.send(candidate).is_err() {
                break;
            }
        }
    }

    /// Consumer side of the parallel path. Returns true if the run was cancelled.
    fn drain_in_order(
        &self,
        queues: &[Receiver<String>],
        dedup: &mut dyn Deduplicator,
        run: &mut FileRun<'_>,
    ) -> Result<bool> {
        for rx in queues {
            loop {
                if run.is_cancelled() {
                    return Ok(true);
                }
                let Ok(candidate) = rx.recv() else {
                    break;
                };
                if dedup.insert(&candidate) {
                    run.push(self, candidate)?;
                }
            }
            run.seeds_done += 1;
        }
        Ok(false)
    }

    /// Apply an additive rule once to the constant seed and append its
    /// filtered output to `dest`. Returns the number of lines appended.
    pub fn append_additive(&self, rule: &dyn Rule, dest: &Path, batch_size: usize) -> Result<u64> {
        let mut writer = BatchWriter::new(dest, WriteMode::Append, batch_size)?;

        let variants = match apply(rule, ADDITIVE_SEED) {
            Ok(variants) => variants,
            Err(e) => {
                log::warn!("{}; skipping additive rule", e);
                self.rule_failures.fetch_add(1, Ordering::Relaxed);
                return Ok(0);
            }
        };

        for candidate in variants {
            if self.accepts(&candidate) {
                writer.push(candidate)?;
            }
        }
        writer.flush()?;

        log::info!("Appended {} '{}' candidates", writer.lines_written(), rule.name());
        Ok(writer.lines_written())
    }

    /// Write deduplicated candidates to `out`, one per line, until the
    /// seeds run out or `cancel` is raised
    pub fn stream_to<W: Write, S: AsRef<str>>(
        &self,
        out: &mut W,
        seeds: &[S],
        cache_capacity: usize,
        cancel: Option<&AtomicBool>,
    ) -> std::io::Result<u64> {
        let mut count = 0;
        let mut stream = self.generate_all(seeds, cache_capacity);
        loop {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                log::warn!("Streaming cancelled after {} candidates", count);
                break;
            }
            let Some(candidate) = stream.next() else {
                break;
            };
            out.write_all(candidate.as_bytes())?;
            out.write_all(b"\n")?;
            count += 1;
        }
        out.flush()?;
        Ok(count)
    }
}

/// Mutable state of one file-writing run
struct FileRun<'a> {
    writer: BatchWriter,
    cancel: Option<&'a AtomicBool>,
    progress: &'a dyn ProgressSink,
    seeds_total: u64,
    seeds_done: u64,
    cancelled: bool,
}

impl FileRun<'_> {
    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));
        }
        self.cancelled
    }

    fn snapshot(&self, engine: &MutationEngine) -> Progress {
        Progress {
            seeds_done: self.seeds_done,
            seeds_total: self.seeds_total,
            emitted: self.writer.lines_written(),
            rejected: engine.rejected_count(),
        }
    }

    fn push(&mut self, engine: &MutationEngine, candidate: String) -> Result<()> {
        if self.writer.push(candidate)? {
            self.progress.report(&self.snapshot(engine));
        }
        Ok(())
    }
}

struct Frame<'e> {
    index: usize,
    variants: Mutations<'e>,
}

/// Lazy candidate stream for one seed, see [`MutationEngine::generate`]
pub struct Expansion<'e> {
    engine: &'e MutationEngine,
    stack: Vec<Frame<'e>>,
    ready: Option<String>,
}

impl<'e> Expansion<'e> {
    /// Push one frame per remaining rule (deepest rule on top) and hold `s`
    /// as the candidate reached by skipping all of them.
    fn descend(&mut self, s: String, from: usize) {
        let engine = self.engine;
        for index in from..engine.rules.len() {
            let Some(rule) = engine.rules.get(index) else {
                break;
            };
            match apply(rule, &s) {
                Ok(variants) => self.stack.push(Frame { index, variants }),
                Err(e) => engine.record_failure(index, &e),
            }
        }
        self.ready = Some(s);
    }
}

impl Iterator for Expansion<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(candidate) = self.ready.take() {
                if self.engine.accepts(&candidate) {
                    return Some(candidate);
                }
                continue;
            }

            let frame = self.stack.last_mut()?;
            let index = frame.index;
            match frame.variants.next() {
                Some(variant) => self.descend(variant, index + 1),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Cross-seed deduplicated stream, see [`MutationEngine::generate_all`]
pub struct GenerateAll<'e, S> {
    engine: &'e MutationEngine,
    seeds: &'e [S],
    next_seed: usize,
    current: Option<Expansion<'e>>,
    dedup: Box<dyn Deduplicator>,
    seeds_consumed: usize,
}

impl<S> GenerateAll<'_, S> {
    /// Seeds whose candidates have all been pulled
    pub fn seeds_consumed(&self) -> usize {
        self.seeds_consumed
    }

    pub fn dedup_stats(&self) -> DedupStats {
        self.dedup.stats()
    }
}

impl<S: AsRef<str>> Iterator for GenerateAll<'_, S> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(expansion) = &mut self.current {
                match expansion.next() {
                    Some(candidate) => {
                        if self.dedup.insert(&candidate) {
                            return Some(candidate);
                        }
                        continue;
                    }
                    None => {
                        self.current = None;
                        self.seeds_consumed += 1;
                    }
                }
            }

            let seed = self.seeds.get(self.next_seed)?;
            self.next_seed += 1;
            self.current = Some(self.engine.generate(seed.as_ref()));
        }
    }
}
