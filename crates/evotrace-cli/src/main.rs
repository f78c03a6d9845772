// crates/evotrace-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evotrace_core::isa::{decode_packed, disassemble_text, render_glyphs};
use evotrace_core::{GenerationRecord, RecordLayout};
use evotrace_stats::ngram::top_ngrams;
use evotrace_stats::repeat::nested_repeats;
use evotrace_stats::sink::{create_sink, sink_for, RowFormat, RowSink};
use evotrace_stats::{AnalysisConfig, Pipeline};
use evotrace_trace::generator::SynthParams;
use evotrace_trace::io::{open_trace, write_synthetic_trace};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Glyphs per line when printing a program snapshot.
const SHOW_WIDTH: usize = 128;

#[derive(Parser, Debug)]
#[command(
    name = "evotrace",
    about = "Decode and analyse evolved-program trace logs",
    long_about = "Decode and analyse evolved-program trace logs.\n\nThe record layout is not stored in the log; pass --layout (or set it in --config) to match the runner that wrote it.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    /// Analysis config (TOML). Command-line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the 40-byte header of a trace log
    Header {
        /// Trace log
        trace: PathBuf,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Per-generation metrics (entropy, compression ratio, op rate, changes)
    /// If --out is omitted, CSV goes to stdout.
    Stats {
        /// Trace log
        trace: PathBuf,

        /// Record layout of the log
        #[arg(long, value_enum)]
        layout: Option<LayoutOpt>,

        /// Output path; format by extension (.csv, .jsonl, .ndjson, .cbor)
        #[arg(long)]
        out: Option<PathBuf>,

        /// zlib level for the compression ratio (0-9)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: Option<u32>,

        /// Attach the disassembly to each row (.jsonl/.cbor only)
        #[arg(long, default_value_t = false)]
        disassemble: bool,

        /// Attach the longest repeated substring to each row (.jsonl/.cbor only)
        #[arg(long, default_value_t = false)]
        repeats: bool,
    },

    /// Disassemble programs from a trace, or a character-ISA string
    Disas {
        /// Trace log (packed ISA)
        #[arg(required_unless_present = "text")]
        trace: Option<PathBuf>,

        /// Decode this text with the character ISA instead of reading a trace
        #[arg(long, conflicts_with = "trace")]
        text: Option<String>,

        /// Skip records whose generation is below this value
        #[arg(long, default_value_t = 0)]
        from_generation: u64,

        /// Stop after this many programs
        #[arg(long)]
        count: Option<usize>,

        /// Record layout of the log
        #[arg(long, value_enum)]
        layout: Option<LayoutOpt>,
    },

    /// Longest repeated substring of each program, hex-encoded
    Repeats {
        /// Trace log
        trace: PathBuf,

        /// Re-apply the search to its own result up to this many times
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,

        /// Record layout of the log
        #[arg(long, value_enum)]
        layout: Option<LayoutOpt>,
    },

    /// Most frequent instruction n-grams of one program snapshot
    Ngrams {
        /// Trace log
        trace: PathBuf,

        /// Use the first record at or after this generation (default: last record)
        #[arg(long)]
        generation: Option<u64>,

        /// Smallest n
        #[arg(long, default_value_t = 2)]
        min_n: usize,

        /// Largest n
        #[arg(long, default_value_t = 15)]
        max_n: usize,

        /// Entries per n
        #[arg(long, default_value_t = evotrace_stats::ngram::DEFAULT_LIMIT)]
        limit: usize,

        /// Also print the program as glyphs
        #[arg(long, default_value_t = false)]
        show: bool,

        /// Record layout of the log
        #[arg(long, value_enum)]
        layout: Option<LayoutOpt>,
    },

    /// Write a deterministic synthetic trace log
    Synth {
        /// Output path
        #[arg(long, default_value = "trace.log")]
        out: PathBuf,

        /// Bytes per program (>0)
        #[arg(long, default_value_t = 4096, value_parser = clap::value_parser!(u64).range(1..))]
        program_length: u64,

        /// Records to emit
        #[arg(long, default_value_t = 64)]
        generations: u64,

        /// Point mutations between records
        #[arg(long, default_value_t = 16)]
        mutations: usize,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Record layout to write
        #[arg(long, value_enum)]
        layout: Option<LayoutOpt>,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum LayoutOpt {
    /// generation | program
    Plain,
    /// generation | op_count | program
    Counted,
}

impl From<LayoutOpt> for RecordLayout {
    fn from(x: LayoutOpt) -> Self {
        match x {
            LayoutOpt::Plain => Self::Plain,
            LayoutOpt::Counted => Self::Counted,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Cmd::Header { trace, json } => header(&trace, json),

        Cmd::Stats {
            trace,
            layout,
            out,
            level,
            disassemble,
            repeats,
        } => {
            apply_layout(&mut cfg, layout);
            if let Some(level) = level {
                cfg.compression_level = level;
            }
            cfg.disassemble |= disassemble;
            cfg.repeats |= repeats;
            stats(cfg, &trace, out.as_deref())
        }

        Cmd::Disas {
            trace,
            text,
            from_generation,
            count,
            layout,
        } => {
            apply_layout(&mut cfg, layout);
            match (trace, text) {
                (_, Some(text)) => disas_text(&text),
                (Some(trace), None) => disas_trace(&trace, cfg.layout, from_generation, count),
                (None, None) => bail!("either a trace path or --text is required"),
            }
        }

        Cmd::Repeats {
            trace,
            depth,
            layout,
        } => {
            apply_layout(&mut cfg, layout);
            repeats(&trace, cfg.layout, depth as usize)
        }

        Cmd::Ngrams {
            trace,
            generation,
            min_n,
            max_n,
            limit,
            show,
            layout,
        } => {
            apply_layout(&mut cfg, layout);
            if min_n == 0 || min_n > max_n {
                bail!("invalid n range {min_n}..={max_n} (need 1 <= min_n <= max_n)");
            }
            ngrams(&trace, cfg.layout, generation, min_n..=max_n, limit, show)
        }

        Cmd::Synth {
            out,
            program_length,
            generations,
            mutations,
            seed,
            layout,
        } => {
            apply_layout(&mut cfg, layout);
            let params = SynthParams {
                program_length: usize::try_from(program_length)
                    .context("program length does not fit in memory")?,
                generations,
                mutations_per_generation: mutations,
                seed,
            };
            synth(&out, params, cfg.layout)
        }
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    path.map_or_else(|| Ok(AnalysisConfig::default()), AnalysisConfig::load)
}

fn apply_layout(cfg: &mut AnalysisConfig, layout: Option<LayoutOpt>) {
    if let Some(l) = layout {
        cfg.layout = l.into();
    }
}

fn header(trace: &Path, json: bool) -> Result<()> {
    // Layout is irrelevant for the preamble.
    let rdr = open_trace(trace, RecordLayout::default())?;
    let h = rdr.header();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(h).context("serialize header to json")?
        );
    } else {
        println!("program_length  {}", h.program_length);
        println!("segment_length  {}", h.segment_length);
        println!("iteration_limit {}", h.iteration_limit);
        println!("mutation_rate   {}", h.mutation_rate);
        println!("runner_count    {}", h.runner_count);
    }
    Ok(())
}

/// CSV rows carry metrics only, so per-row extras need a structured sink.
fn check_row_extras(cfg: &AnalysisConfig, format: RowFormat) -> Result<()> {
    if format == RowFormat::Csv && (cfg.disassemble || cfg.repeats) {
        bail!(
            "--disassemble/--repeats need a .jsonl, .ndjson or .cbor --out; CSV rows carry metrics only"
        );
    }
    Ok(())
}

fn stats(cfg: AnalysisConfig, trace: &Path, out: Option<&Path>) -> Result<()> {
    info!(trace=%trace.display(), layout=%cfg.layout, out=?out, "analysing");
    let format = out.map_or(Ok(RowFormat::Csv), RowFormat::from_path)?;
    check_row_extras(&cfg, format)?;
    let rdr = open_trace(trace, cfg.layout)?;
    let mut sink: Box<dyn RowSink> = match out {
        Some(p) => create_sink(p)?,
        None => sink_for(BufWriter::new(io::stdout().lock()), RowFormat::Csv),
    };

    // Rows emitted before a failure are still flushed.
    let res = Pipeline::new(rdr, cfg).run(|row| sink.write_row(&row));
    sink.finish()?;
    let summary = res.with_context(|| format!("analysing {}", trace.display()))?;

    info!(
        records = summary.records,
        settled_at = ?summary.settled_at,
        "done"
    );
    if let Some(p) = out {
        println!("Analysed {} records → {}", summary.records, p.display());
    }
    Ok(())
}

fn disas_text(text: &str) -> Result<()> {
    let mut w = BufWriter::new(io::stdout().lock());
    for ins in disassemble_text(text) {
        writeln!(w, "{ins}")?;
    }
    w.flush()?;
    Ok(())
}

fn disas_trace(
    trace: &Path,
    layout: RecordLayout,
    from_generation: u64,
    count: Option<usize>,
) -> Result<()> {
    let mut rdr = open_trace(trace, layout)?;
    let mut w = BufWriter::new(io::stdout().lock());
    let mut rec = GenerationRecord::default();
    let mut printed = 0usize;
    while rdr
        .next_into(&mut rec)
        .with_context(|| format!("reading {}", trace.display()))?
    {
        if rec.generation < from_generation {
            continue;
        }
        if count.is_some_and(|c| printed >= c) {
            break;
        }
        writeln!(w, "# generation {}", rec.generation)?;
        for (off, ins) in decode_packed(&rec.program).enumerate() {
            writeln!(w, "{off:>8}  {ins}")?;
        }
        printed += 1;
    }
    w.flush()?;
    Ok(())
}

fn repeats(trace: &Path, layout: RecordLayout, depth: usize) -> Result<()> {
    let mut rdr = open_trace(trace, layout)?;
    let mut w = BufWriter::new(io::stdout().lock());
    let mut rec = GenerationRecord::default();
    while rdr
        .next_into(&mut rec)
        .with_context(|| format!("reading {}", trace.display()))?
    {
        // Generation 0 is the unmutated seed program.
        if rec.generation == 0 {
            continue;
        }
        write!(w, "{}", rec.generation)?;
        for level in nested_repeats(&rec.program, depth) {
            write!(w, " {}", hex::encode(&level.substring))?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

fn ngrams(
    trace: &Path,
    layout: RecordLayout,
    generation: Option<u64>,
    ns: std::ops::RangeInclusive<usize>,
    limit: usize,
    show: bool,
) -> Result<()> {
    let mut rdr = open_trace(trace, layout)?;
    let mut rec = GenerationRecord::default();
    let mut chosen: Option<GenerationRecord> = None;
    while rdr
        .next_into(&mut rec)
        .with_context(|| format!("reading {}", trace.display()))?
    {
        match generation {
            Some(g) if rec.generation >= g => {
                chosen = Some(std::mem::take(&mut rec));
                break;
            }
            Some(_) => {}
            None => {
                let slot = chosen.get_or_insert_with(GenerationRecord::default);
                std::mem::swap(slot, &mut rec);
            }
        }
    }
    let Some(snapshot) = chosen else {
        bail!("no matching record in {}", trace.display());
    };

    let mut w = BufWriter::new(io::stdout().lock());
    writeln!(w, "# generation {}", snapshot.generation)?;
    if show {
        let glyphs: Vec<char> = render_glyphs(&snapshot.program).chars().collect();
        for line in glyphs.chunks(SHOW_WIDTH) {
            writeln!(w, "{}", line.iter().collect::<String>())?;
        }
    }
    for n in ns {
        write!(w, "{n:>2}:")?;
        for (gram, count) in top_ngrams(&snapshot.program, n, limit) {
            write!(w, " {gram:>15}{count:>5}")?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

fn synth(out: &Path, params: SynthParams, layout: RecordLayout) -> Result<()> {
    info!(out=%out.display(), ?params, %layout, "generating synthetic trace");
    let n = write_synthetic_trace(out, params, layout)?;
    println!(
        "Synthesized {n} generations of {} bytes ({layout}) → {}",
        params.program_length,
        out.display()
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn csv_rows_refuse_extras() {
        let mut cfg = AnalysisConfig::default();
        check_row_extras(&cfg, RowFormat::Csv).unwrap();

        cfg.repeats = true;
        assert!(check_row_extras(&cfg, RowFormat::Csv).is_err());
        check_row_extras(&cfg, RowFormat::Jsonl).unwrap();

        cfg.repeats = false;
        cfg.disassemble = true;
        assert!(check_row_extras(&cfg, RowFormat::Csv).is_err());
        check_row_extras(&cfg, RowFormat::Cbor).unwrap();
    }

    #[test]
    fn stats_rejects_extras_before_opening_the_trace() {
        let cfg = AnalysisConfig {
            repeats: true,
            ..AnalysisConfig::default()
        };
        let err = stats(cfg, Path::new("missing.bin"), Some(Path::new("rows.csv"))).unwrap_err();
        assert!(err.to_string().contains("CSV rows carry metrics only"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn layout_flag_parses() {
        let cli = Cli::try_parse_from(["evotrace", "stats", "t.log", "--layout", "plain"]).unwrap();
        match cli.cmd {
            Cmd::Stats { layout, .. } => assert_eq!(layout, Some(LayoutOpt::Plain)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn disas_needs_trace_or_text() {
        assert!(Cli::try_parse_from(["evotrace", "disas"]).is_err());
        assert!(Cli::try_parse_from(["evotrace", "disas", "--text", "AB=^"]).is_ok());
        assert!(Cli::try_parse_from(["evotrace", "disas", "t.log", "--text", "A"]).is_err());
    }

    #[test]
    fn depth_must_be_positive() {
        assert!(Cli::try_parse_from(["evotrace", "repeats", "t.log", "--depth", "0"]).is_err());
    }

    #[test]
    fn flags_override_config_layout() {
        let mut cfg = AnalysisConfig::from_toml_str("layout = \"plain\"").unwrap();
        apply_layout(&mut cfg, None);
        assert_eq!(cfg.layout, RecordLayout::Plain);
        apply_layout(&mut cfg, Some(LayoutOpt::Counted));
        assert_eq!(cfg.layout, RecordLayout::Counted);
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["evotrace", "header", "t.log", "--config", "a.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("a.toml")));
    }
}
