use crate::ir::instr::Instr;

/// An opaque index identifying a basic block within a `Function`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

/// A basic block.
///
/// Invariants enforced by `FunctionBuilder::build()`:
/// 1. `instrs` ends with exactly one terminator.
/// 2. No instruction appears after the terminator.
/// 3. `label` is unique within the function; the emitter prints it as-is.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub label: String,
    /// Instructions in program order. Terminator is last.
    pub instrs: Vec<Instr>,
}

impl Block {
    pub fn new(id: BlockId, label: String) -> Self {
        Self {
            id,
            label,
            instrs: Vec::new(),
        }
    }

    /// Returns the terminator instruction if the block is sealed.
    pub fn terminator(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    /// A block is sealed once it ends with a terminator.
    pub fn is_sealed(&self) -> bool {
        self.terminator().is_some()
    }
}
