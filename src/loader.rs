//! Source list loading
//!
//! Reads seed files through a memory map, detects the encoding (BOM, valid
//! UTF-8, else a chardetng guess), decodes to UTF-8 and returns trimmed,
//! order-preserving unique lines.

use crate::error::{PwgenError, Result};
use ahash::RandomState;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use hashbrown::HashSet;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::sync::OnceLock;

/// Loader settings
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Lines shorter than this (in chars, after trimming) are dropped
    pub min_length: usize,
    /// Keep only the first occurrence of each line
    pub remove_duplicates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            min_length: 1,
            remove_duplicates: true,
        }
    }
}

/// Result of encoding detection
#[derive(Debug, Clone, Copy)]
pub struct EncodingInfo {
    pub encoding: &'static Encoding,
    /// Length of the byte order mark to skip
    pub bom_len: usize,
}

/// Detect the encoding of raw file content
pub fn detect_encoding(content: &[u8]) -> EncodingInfo {
    if let Some((encoding, bom_len)) = Encoding::for_bom(content) {
        return EncodingInfo { encoding, bom_len };
    }

    if std::str::from_utf8(content).is_ok() {
        return EncodingInfo {
            encoding: encoding_rs::UTF_8,
            bom_len: 0,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(content, true);
    EncodingInfo {
        encoding: detector.guess(None, true),
        bom_len: 0,
    }
}

/// Decode content to trimmed lines
pub fn decode_lines(content: &[u8]) -> Vec<String> {
    let info = detect_encoding(content);
    let (text, had_errors) = info
        .encoding
        .decode_without_bom_handling(&content[info.bom_len..]);
    if had_errors {
        log::warn!("Malformed {} sequences replaced while decoding", info.encoding.name());
    }
    log::debug!("Decoding source as {}", info.encoding.name());

    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    for end in memchr::memchr_iter(b'\n', bytes).chain(std::iter::once(bytes.len())) {
        if start > bytes.len() {
            break;
        }
        // '\n' never occurs inside a multi-byte UTF-8 sequence
        let line = text[start..end].trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
        start = end + 1;
    }
    lines
}

/// Load seeds from one file
pub fn load_seeds(path: &Path, options: &LoadOptions) -> Result<Vec<String>> {
    load_seeds_from(&[path], options)
}

/// Load seeds from several files; duplicates are removed across files
pub fn load_seeds_from<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<Vec<String>> {
    let mut seen: HashSet<String, RandomState> = HashSet::with_hasher(RandomState::new());
    let mut seeds = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let mut kept = 0usize;
        for line in read_lines(path)? {
            if line.chars().count() < options.min_length {
                continue;
            }
            if options.remove_duplicates && !seen.insert(line.clone()) {
                continue;
            }
            seeds.push(line);
            kept += 1;
        }
        log::info!("Loaded {} seeds from {:?}", kept, path);
    }

    Ok(seeds)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let load_err = |reason: String| PwgenError::SourceLoad {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    let len = file.metadata().map_err(|e| load_err(e.to_string()))?.len();
    if len == 0 {
        return Ok(Vec::new());
    }

    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| load_err(e.to_string()))?;
    Ok(decode_lines(&mmap))
}

/// Runs of 3+ ASCII digits, compiled once per process
fn digit_runs() -> Result<&'static Regex> {
    static DIGIT_RUNS: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = DIGIT_RUNS.get() {
        return Ok(regex);
    }
    let regex =
        Regex::new(r"[0-9]{3,}").map_err(|e| PwgenError::config("numeric tokens", e.to_string()))?;
    Ok(DIGIT_RUNS.get_or_init(|| regex))
}

/// Numeric tokens for the combination rule.
///
/// An all-digit seed of 3+ digits is taken whole, plus its last 4 and last 2
/// digits when it has 4+. Every run of 3+ ASCII digits inside any seed is
/// taken as well.
pub fn extract_numbers<S: AsRef<str>>(seeds: &[S]) -> Result<BTreeSet<String>> {
    let digit_runs = digit_runs()?;
    let mut numbers = BTreeSet::new();

    for seed in seeds {
        let seed = seed.as_ref();
        let len = seed.len();

        if len >= 3 && seed.bytes().all(|b| b.is_ascii_digit()) {
            numbers.insert(seed.to_string());
            if len >= 4 {
                numbers.insert(seed[len - 4..].to_string());
                numbers.insert(seed[len - 2..].to_string());
            }
        }

        for m in digit_runs.find_iter(seed) {
            numbers.insert(m.as_str().to_string());
        }
    }

    Ok(numbers)
}
