//! Per-chunk symbolic optimization.
//!
//! Each chunk is simulated independently on a [`StackSimulator`]. A
//! successful run can pin the chunk's dispatch successor and, when the
//! whole effect fits the extended opcodes, replace the command list with a
//! condensed equivalent. Chunks the simulator cannot express pass through
//! untouched; that is not an error.

use crate::opt::simulator::StackSimulator;
use crate::opt::ChunkPass;
use crate::xrf::{Chunk, Opcode};

/// The chunk-level optimization pass (`-O1` and above).
pub struct ChunkOptPass;

impl ChunkPass for ChunkOptPass {
    fn name(&self) -> &'static str {
        "chunk-opt"
    }

    fn run(&mut self, chunks: &mut Vec<Chunk>) {
        for (index, chunk) in chunks.iter_mut().enumerate() {
            *chunk = optimize_chunk(chunk, index as u32);
        }
    }
}

/// Simulates one chunk and returns its optimized form.
///
/// `index` is the chunk's position in the program, which by the XRF
/// dispatch invariant is also the value on top of the stack at entry.
pub fn optimize_chunk(chunk: &Chunk, index: u32) -> Chunk {
    let mut sim = StackSimulator::new(index);
    let mut optimized = chunk.clone();
    let mut can_optimize = true;

    for cmd in &chunk.commands {
        let mut break_out = false;

        match cmd {
            Opcode::Add => sim.add(),
            Opcode::Bottom => sim.bottom(),
            Opcode::Output => sim.output(),
            Opcode::Pop => sim.pop(),
            Opcode::Dec => sim.dec(),
            Opcode::Dup => sim.dup(),
            Opcode::Inc => sim.inc(),
            Opcode::Input => sim.input(),
            Opcode::Sub => sim.sub(),
            Opcode::Swap => sim.swap(),

            // The chunk ends here at runtime; whatever is on the abstract
            // stack now is what dispatch sees.
            Opcode::Jump => break_out = true,

            Opcode::Nop => {}

            // Predicates, halting, and the reserved scramble are outside
            // the simulator's domain.
            Opcode::Exit
            | Opcode::Randomize
            | Opcode::IgnoreFirst
            | Opcode::IgnoreVisited => can_optimize = false,

            // Extended opcodes only exist in already-optimized chunks;
            // leave such a chunk as it is.
            Opcode::AddToSecond(_)
            | Opcode::MultiplySecond(_)
            | Opcode::PopSecondValue
            | Opcode::PushSecondValue(_)
            | Opcode::PushValueToBottom(_)
            | Opcode::SetSecondValue(_)
            | Opcode::SetTop(_) => can_optimize = false,
        }

        if break_out || !can_optimize {
            break;
        }
    }

    if can_optimize {
        if let Some(top) = sim.stack_top() {
            optimized.next = Some(top);
        }
        if let Some(commands) = sim.optimized_commands() {
            optimized.commands = commands;
        }
    }

    optimized
}

#[cfg(test)]
mod tests {
    use super::optimize_chunk;
    use crate::xrf::{Chunk, Opcode};

    fn chunk(commands: Vec<Opcode>) -> Chunk {
        Chunk {
            commands,
            line: 1,
            col: 1,
            next: None,
        }
    }

    #[test]
    fn double_dec_pins_successor() {
        let c = chunk(vec![
            Opcode::Dec,
            Opcode::Dec,
            Opcode::Nop,
            Opcode::Nop,
            Opcode::Nop,
        ]);
        let opt = optimize_chunk(&c, 2);
        assert_eq!(opt.next, Some(0));
        assert_eq!(opt.commands, vec![Opcode::SetTop(0)]);
    }

    #[test]
    fn self_add_folds_to_double() {
        let c = chunk(vec![
            Opcode::Dup,
            Opcode::Add,
            Opcode::Nop,
            Opcode::Nop,
            Opcode::Nop,
        ]);
        let opt = optimize_chunk(&c, 3);
        assert_eq!(opt.next, Some(6));
        assert_eq!(opt.commands, vec![Opcode::SetTop(6)]);
    }

    #[test]
    fn predicate_aborts_optimization() {
        let commands = vec![
            Opcode::Inc,
            Opcode::IgnoreFirst,
            Opcode::Dec,
            Opcode::Nop,
            Opcode::Nop,
        ];
        let c = chunk(commands.clone());
        let opt = optimize_chunk(&c, 5);
        assert_eq!(opt.commands, commands);
        assert_eq!(opt.next, None);
    }

    #[test]
    fn jump_cuts_off_the_rest_of_the_chunk() {
        // Inc, Inc, Jump: dispatch happens at the Jump, so the trailing
        // Exit never runs and the chunk condenses cleanly.
        let c = chunk(vec![
            Opcode::Inc,
            Opcode::Inc,
            Opcode::Jump,
            Opcode::Exit,
            Opcode::Exit,
        ]);
        let opt = optimize_chunk(&c, 0);
        assert_eq!(opt.next, Some(2));
        assert_eq!(opt.commands, vec![Opcode::SetTop(2)]);
    }

    #[test]
    fn io_keeps_commands_but_can_pin_successor() {
        // Output pops the known top; the exposed second is unknown, so no
        // successor, and I/O forbids synthesis.
        let c = chunk(vec![
            Opcode::Output,
            Opcode::Nop,
            Opcode::Nop,
            Opcode::Nop,
            Opcode::Nop,
        ]);
        let opt = optimize_chunk(&c, 1);
        assert_eq!(opt.commands, c.commands);
        assert_eq!(opt.next, None);

        // Dup first: the known index survives under the output.
        let c = chunk(vec![
            Opcode::Dup,
            Opcode::Output,
            Opcode::Nop,
            Opcode::Nop,
            Opcode::Nop,
        ]);
        let opt = optimize_chunk(&c, 1);
        assert_eq!(opt.commands, c.commands);
        assert_eq!(opt.next, Some(1));
    }

    #[test]
    fn nop_chunk_condenses_to_nothing() {
        let c = chunk(vec![Opcode::Nop; 5]);
        let opt = optimize_chunk(&c, 9);
        assert_eq!(opt.next, Some(9));
        assert_eq!(opt.commands, Vec::new());
    }

    #[test]
    fn swap_inc_tracks_the_second_slot() {
        // Swap, Inc, Swap: the original second gains one and the top is
        // back to the chunk index.
        let c = chunk(vec![
            Opcode::Swap,
            Opcode::Inc,
            Opcode::Swap,
            Opcode::Nop,
            Opcode::Nop,
        ]);
        let opt = optimize_chunk(&c, 4);
        assert_eq!(opt.next, Some(4));
        assert_eq!(opt.commands, vec![Opcode::AddToSecond(1)]);
    }

    #[test]
    fn source_position_survives_optimization() {
        let mut c = chunk(vec![Opcode::Nop; 5]);
        c.line = 7;
        c.col = 13;
        let opt = optimize_chunk(&c, 0);
        assert_eq!((opt.line, opt.col), (7, 13));
    }
}
