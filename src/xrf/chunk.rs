use crate::xrf::command::Opcode;

/// The number of commands in every source-level chunk.
pub const COMMANDS_PER_CHUNK: usize = 5;

/// A dispatch unit of XRF code.
///
/// Invariants:
/// - As produced by the parser: exactly [`COMMANDS_PER_CHUNK`] commands,
///   all primitive, `next` unset.
/// - After optimization: any length, extended opcodes allowed; `next`, if
///   set, names the chunk the program dispatches to when this one falls
///   off its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub commands: Vec<Opcode>,
    /// Source line/column of the chunk's first command (1-based).
    pub line: u32,
    pub col: u32,
    /// Statically-known successor chunk index.
    pub next: Option<u32>,
}

impl Chunk {
    pub fn new(line: u32, col: u32) -> Self {
        Self {
            commands: Vec::new(),
            line,
            col,
            next: None,
        }
    }

    /// Returns `true` if any command is `IgnoreFirst` or `IgnoreVisited`,
    /// in which case lowering allocates a visited flag for the chunk.
    pub fn has_predicate(&self) -> bool {
        self.commands.iter().any(Opcode::is_predicate)
    }
}
