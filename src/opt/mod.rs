//! Optimization passes over the chunk table.
//!
//! Passes run in registration order and rewrite the chunk list in place.
//! They must be deterministic and must preserve the chunk count: chunk
//! indices are dispatch targets, so no pass may add, remove, or reorder
//! chunks. A pass that cannot improve a chunk leaves it unchanged; there
//! is no failure mode.

pub mod chunk_opt;
pub mod fuse;
pub mod simulator;
pub mod stack_value;

pub use chunk_opt::{optimize_chunk, ChunkOptPass};
pub use fuse::FusePass;

use crate::xrf::Chunk;
use crate::OptLevel;

/// A compiler pass over the program's chunk table.
pub trait ChunkPass {
    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Runs the pass, rewriting `chunks` in place.
    fn run(&mut self, chunks: &mut Vec<Chunk>);
}

/// Manages and executes an ordered sequence of chunk passes.
pub struct PassManager {
    passes: Vec<Box<dyn ChunkPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// The standard pipeline for an optimization level.
    pub fn for_level(level: OptLevel) -> Self {
        let mut pm = Self::new();
        match level {
            OptLevel::None => {}
            OptLevel::Chunk => pm.add_pass(ChunkOptPass),
            OptLevel::Full => {
                pm.add_pass(ChunkOptPass);
                pm.add_pass(FusePass);
            }
        }
        pm
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl ChunkPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Runs all passes in registration order on `chunks`.
    pub fn run(&mut self, chunks: &mut Vec<Chunk>) {
        for pass in &mut self.passes {
            pass.run(chunks);
        }
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
