// crates/evotrace-trace/src/generator.rs

//! Tiny toy runner used by tests, benches and the CLI `synth` subcommand.
//!
//! Produces a lazy stream of generations: the program starts as all-NOP
//! filler, each generation applies a few point mutations drawn from the
//! operation range, and the generation/op counters advance monotonically.

use evotrace_core::isa::{MAX_OP, NOP_FILL};
use evotrace_core::{GenerationRecord, RecordLayout, TraceHeader};
use rand::{rngs::StdRng, Rng as _, SeedableRng};
use serde::Deserialize;

/// Knobs for the synthetic runner.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SynthParams {
    /// Bytes per program.
    pub program_length: usize,
    /// Number of records to emit.
    pub generations: u64,
    /// Point mutations applied between consecutive records.
    pub mutations_per_generation: usize,
    /// RNG seed (identical seeds give identical traces).
    pub seed: u64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            program_length: 4096,
            generations: 64,
            mutations_per_generation: 16,
            seed: 42,
        }
    }
}

impl SynthParams {
    /// Header matching these params, with the runner's usual constants.
    #[must_use]
    pub fn header(&self) -> TraceHeader {
        TraceHeader {
            program_length: self.program_length as u64,
            segment_length: 1024,
            iteration_limit: 1000,
            mutation_rate: 500_000,
            runner_count: 8,
        }
    }
}

/// Lazy synthetic generation stream.
#[derive(Debug)]
pub struct SynthTrace {
    rng: StdRng,
    params: SynthParams,
    layout: RecordLayout,
    program: Vec<u8>,
    generation: u64,
    op_count: u64,
    emitted: u64,
}

/// Start a synthetic trace; records carry `op_count` iff `layout` does.
#[must_use]
pub fn generate_trace(params: SynthParams, layout: RecordLayout) -> SynthTrace {
    SynthTrace {
        rng: StdRng::seed_from_u64(params.seed),
        params,
        layout,
        program: vec![NOP_FILL; params.program_length],
        generation: 0,
        op_count: 0,
        emitted: 0,
    }
}

impl SynthTrace {
    fn mutate(&mut self) {
        if self.program.is_empty() {
            return;
        }
        for _ in 0..self.params.mutations_per_generation {
            let at = self.rng.random_range(0..self.program.len());
            self.program[at] = self.rng.random_range(0..=MAX_OP);
        }
    }
}

impl Iterator for SynthTrace {
    type Item = GenerationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.params.generations {
            return None;
        }
        if self.emitted > 0 {
            self.mutate();
            self.generation += self.rng.random_range(1..=64);
            self.op_count += self.rng.random_range(1_000..=64_000);
        }
        self.emitted += 1;

        let op_count = self.layout.has_op_count().then_some(self.op_count);
        Some(GenerationRecord {
            generation: self.generation,
            op_count,
            program: self.program.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.params.generations - self.emitted).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}
