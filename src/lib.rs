//! xrfc: an ahead-of-time compiler for the XRF esoteric stack language.
//!
//! Compiler pipeline:
//!
//! ```text
//! source (.xrf) → parser → [Chunk] → PassManager → codegen → LLIR text
//! ```
//!
//! Passes (in order, gated by [`OptLevel`]):
//! 1. `chunk-opt` — per-chunk symbolic stack simulation: pins statically
//!    known dispatch successors and condenses chunk bodies into extended
//!    opcodes where the whole effect is expressible.
//! 2. `fuse`      — fuses chains of pure top/second-slot chunks so each
//!    entry point dispatches straight to the chain's tail.
//!
//! Codegen is total: every valid chunk list lowers to a module with one
//! basic block per chunk plus a shared computed-goto dispatch block.

pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod opt;
pub mod parser;
pub mod xrf;


pub use error::Error;

/// How much of the optimizer pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    /// `-O0`: no optimization.
    None,
    /// `-O1`: chunk-level optimization only.
    Chunk,
    /// `-O2` and above: chunk-level optimization plus program-level fusion.
    Full,
}

impl OptLevel {
    /// Maps the numeric `-O` argument onto a level.
    pub fn from_arg(n: u32) -> OptLevel {
        match n {
            0 => OptLevel::None,
            1 => OptLevel::Chunk,
            _ => OptLevel::Full,
        }
    }
}

/// Compiles XRF source text through the full pipeline.
///
/// Returns the textual LLIR module, or an [`Error`] carrying every parse
/// diagnostic. The pipeline never runs past a failed parse; optimization
/// and codegen cannot fail on a valid chunk list.
pub fn compile(source: &str, opt_level: OptLevel) -> Result<String, Error> {
    let mut chunks = parser::parse_source(source)?;

    opt::PassManager::for_level(opt_level).run(&mut chunks);

    let module = codegen::lower_program(&chunks);
    Ok(codegen::emit_llir_text(&module)?)
}
