//! evotrace-bench-harness
//!
//! Run small end-to-end benchmarks (synthesize -> encode -> analyse) and
//! append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p evotrace-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run -p evotrace-bench-harness -- --profile benchmarks/profiles/medium.toml --mode full

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use evotrace_core::RecordLayout;
use evotrace_stats::{AnalysisConfig, Pipeline};
use evotrace_trace::generator::SynthParams;
use evotrace_trace::io::{open_trace, write_synthetic_trace};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Bytes per program
    program_length: usize,
    /// Records in the synthetic trace
    generations: u64,
    /// Point mutations between records
    mutations_per_generation: usize,
    /// Record layout to write and read back
    layout: RecordLayout,
    /// Repetitions of the whole pipeline
    repeats: u32,
    /// RNG seed
    #[serde(default)]
    seed: u64,
}

#[derive(Clone, Copy, Debug)]
enum Mode {
    /// Metrics only
    Metrics,
    /// Metrics plus disassembly and repeat search
    Full,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));
    let mode_str = parse_flag("mode", "metrics");
    let mode = match mode_str.as_str() {
        "metrics" => Mode::Metrics,
        "full" => Mode::Full,
        other => anyhow::bail!("unknown --mode {other} (use metrics|full)"),
    };

    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    println!(
        "Profile: program_length={}, generations={}, mutations={}, layout={}, repeats={}, mode={mode_str}",
        profile.program_length,
        profile.generations,
        profile.mutations_per_generation,
        profile.layout,
        profile.repeats
    );

    fs::create_dir_all("benchmarks/reports").context("create benchmarks/reports")?;

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs();
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .with_context(|| format!("open {}", csv_path.display()))?;
    writeln!(
        csv,
        "timestamp,mode,layout,program_length,generations,repeat,stage,ms,extra"
    )?;

    let params = SynthParams {
        program_length: profile.program_length,
        generations: profile.generations,
        mutations_per_generation: profile.mutations_per_generation,
        seed: profile.seed,
    };
    let cfg = AnalysisConfig {
        layout: profile.layout,
        disassemble: matches!(mode, Mode::Full),
        repeats: matches!(mode, Mode::Full),
        ..AnalysisConfig::default()
    };
    let prefix = format!(
        "{ts},{mode_str},{},{},{}",
        profile.layout, profile.program_length, profile.generations
    );

    for rep in 0..profile.repeats {
        let trace_path = PathBuf::from(format!("benchmarks/tmp-trace-{ts}-{rep}.log"));

        // 1) synthesize + encode
        let t0 = Instant::now();
        let n = write_synthetic_trace(&trace_path, params, profile.layout)?;
        let t_synth = t0.elapsed();
        let bytes = fs::metadata(&trace_path).map(|m| m.len()).unwrap_or(0);
        writeln!(
            csv,
            "{prefix},{rep},synth,{},records={n};bytes={bytes}",
            dur_ms(t_synth)
        )?;

        // 2) decode only
        let t0 = Instant::now();
        let mut decoded = 0u64;
        for rec in open_trace(&trace_path, profile.layout)? {
            rec.context("decode record")?;
            decoded += 1;
        }
        let t_decode = t0.elapsed();
        writeln!(
            csv,
            "{prefix},{rep},decode,{},records={decoded}",
            dur_ms(t_decode)
        )?;

        // 3) analyse
        let t0 = Instant::now();
        let mut last_repeat = String::new();
        let summary = Pipeline::new(open_trace(&trace_path, profile.layout)?, cfg).run(|row| {
            if let Some(r) = row.repeat {
                last_repeat = hex::encode(&r.substring[..r.length.min(8)]);
            }
            Ok(())
        })?;
        let t_analyse = t0.elapsed();
        writeln!(
            csv,
            "{prefix},{rep},analyse,{},settled_at={};repeat_head={last_repeat}",
            dur_ms(t_analyse),
            summary
                .settled_at
                .map_or_else(|| "-".to_string(), |g| g.to_string())
        )?;

        // cleanup temp files to avoid disk bloat
        let _ = fs::remove_file(&trace_path);
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
