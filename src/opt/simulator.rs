//! The abstract stack machine behind chunk optimization.
//!
//! Runs a chunk's effect over [`StackValue`]s instead of concrete cells.
//! Two questions come out the other side: is the post-chunk top statically
//! known (then the dispatch target is known), and can the whole surviving
//! effect be replayed by a short sequence of extended opcodes (then the
//! chunk's command list is replaced).

use crate::opt::stack_value::StackValue;
use crate::xrf::Opcode;

pub struct StackSimulator {
    /// The chunk's own index, which is also the value on top at entry.
    orig_index: u32,
    /// Deepest index below the entry top that a pop has reached.
    max_popped: u32,
    /// Whether an input or output command ran.
    had_io: bool,
    /// Values sent below the stack bottom, in order.
    bottom: Vec<StackValue>,
    /// The abstract stack; last element is the top.
    values: Vec<StackValue>,
}

impl StackSimulator {
    /// Seeds the stack with the chunk's index on top: XRF guarantees that
    /// at chunk entry the top of stack equals the current chunk index.
    pub fn new(index: u32) -> Self {
        Self {
            orig_index: index,
            max_popped: 0,
            had_io: false,
            bottom: Vec::new(),
            values: vec![StackValue::seeded(0, index)],
        }
    }

    pub fn add(&mut self) {
        let mut val1 = self.pop_value();
        let val2 = self.pop_value();
        val1.add(&val2);
        self.push_value(val1);
    }

    pub fn bottom(&mut self) {
        let val = self.pop_value();
        self.bottom.push(val);
    }

    pub fn dec(&mut self) {
        let mut val = self.pop_value();
        val.dec();
        self.push_value(val);
    }

    pub fn dup(&mut self) {
        let val = self.pop_value();
        self.push_value(val);
        self.push_value(val);
    }

    pub fn inc(&mut self) {
        let mut val = self.pop_value();
        val.add(&StackValue::from_value(1));
        self.push_value(val);
    }

    pub fn input(&mut self) {
        self.push_value(StackValue::opaque());
        self.had_io = true;
    }

    pub fn output(&mut self) {
        self.pop_value();
        self.had_io = true;
    }

    pub fn pop(&mut self) {
        self.pop_value();
    }

    pub fn sub(&mut self) {
        let mut val1 = self.pop_value();
        let val2 = self.pop_value();
        val1.sub(&val2);
        self.push_value(val1);
    }

    pub fn swap(&mut self) {
        let val1 = self.pop_value();
        let val2 = self.pop_value();
        self.push_value(val1);
        self.push_value(val2);
    }

    /// The post-chunk top of stack, if statically known.
    pub fn stack_top(&self) -> Option<u32> {
        self.values.last().and_then(StackValue::known_value)
    }

    /// Tries to replay the simulated effect as extended opcodes.
    ///
    /// Returns `None` when the effect escapes what the extended opcodes can
    /// express: any I/O, pops more than one slot below entry, an unknown
    /// bottom-queued value, more than two surviving slots, an unknown top,
    /// or a second slot that is neither known nor the untouched-or-linearly
    /// transformed original second value.
    pub fn optimized_commands(&self) -> Option<Vec<Opcode>> {
        if !self.can_optimize() {
            return None;
        }

        let mut commands = Vec::new();
        for bottom_val in &self.bottom {
            commands.push(Opcode::PushValueToBottom(
                bottom_val.known_value().expect("checked by can_optimize"),
            ));
        }

        let top = self
            .values
            .last()
            .and_then(StackValue::known_value)
            .expect("checked by can_optimize");
        if top != self.orig_index {
            commands.push(Opcode::SetTop(top));
        }

        if self.values.len() > 1 {
            let second = &self.values[0];
            if let Some(v) = second.known_value() {
                if self.max_popped == 0 {
                    commands.push(Opcode::PushSecondValue(v));
                } else {
                    commands.push(Opcode::SetSecondValue(v));
                }
            } else if second.multiple() > 1 {
                // The slot holds multiple·original + change; the multiply
                // must land before the shift.
                commands.push(Opcode::MultiplySecond(second.multiple()));
                if second.change() != 0 {
                    commands.push(Opcode::AddToSecond(second.change()));
                }
            } else if second.change() != 0 {
                commands.push(Opcode::AddToSecond(second.change()));
            }
        } else if self.max_popped == 1 {
            commands.push(Opcode::PopSecondValue);
        }

        Some(commands)
    }

    fn can_optimize(&self) -> bool {
        !self.had_io
            && self.max_popped < 2
            && self.bottom.iter().all(|v| v.known_value().is_some())
            && !self.values.is_empty()
            && self.values.len() <= 2
            && self.values.last().unwrap().known_value().is_some()
            && (self.values.len() == 1
                || self.values[0].known_value().is_some()
                || self.values[0].index() == Some(1))
    }

    fn push_value(&mut self, value: StackValue) {
        self.values.push(value);
    }

    /// Popping past the simulated values reaches into the caller's stack:
    /// the k-th pop below entry yields the Indexed value k and raises the
    /// high-water mark.
    fn pop_value(&mut self) -> StackValue {
        if let Some(value) = self.values.pop() {
            return value;
        }
        self.max_popped += 1;
        StackValue::from_index(self.max_popped)
    }
}

#[cfg(test)]
mod tests {
    use super::StackSimulator;
    use crate::xrf::Opcode;

    #[test]
    fn untouched_chunk_synthesizes_nothing() {
        let sim = StackSimulator::new(4);
        assert_eq!(sim.stack_top(), Some(4));
        // Top equals the chunk's own index, one slot, nothing popped.
        assert_eq!(sim.optimized_commands(), Some(vec![]));
    }

    #[test]
    fn io_blocks_synthesis_but_not_successor() {
        let mut sim = StackSimulator::new(2);
        sim.output();
        sim.input();
        assert_eq!(sim.optimized_commands(), None);
    }

    #[test]
    fn deep_pops_block_synthesis() {
        let mut sim = StackSimulator::new(0);
        sim.pop();
        sim.pop();
        sim.pop();
        assert_eq!(sim.optimized_commands(), None);
    }

    #[test]
    fn single_underflow_pop_becomes_pop_second() {
        // Swap then pop discards the original second value while keeping
        // the known top: exactly `PopSecondValue`.
        let mut sim = StackSimulator::new(3);
        sim.swap();
        sim.pop();
        assert_eq!(sim.stack_top(), Some(3));
        assert_eq!(sim.optimized_commands(), Some(vec![Opcode::PopSecondValue]));

        // Pop alone exposes the unknown original second as the new top.
        let mut sim = StackSimulator::new(3);
        sim.pop();
        assert_eq!(sim.stack_top(), None);
        assert_eq!(sim.optimized_commands(), None);
    }

    #[test]
    fn dup_after_pop_keeps_original_second_identity() {
        // Pop the seed, dup the (unknown) exposed second: values are
        // [idx1, idx1], top unknown, nothing to synthesize.
        let mut sim = StackSimulator::new(1);
        sim.pop();
        sim.dup();
        assert_eq!(sim.stack_top(), None);
        assert_eq!(sim.optimized_commands(), None);
    }

    #[test]
    fn bottom_of_known_value_synthesizes_push_to_bottom() {
        // Dup then Bottom sends a copy of the known index downward,
        // leaving the top untouched.
        let mut sim = StackSimulator::new(7);
        sim.dup();
        sim.bottom();
        assert_eq!(sim.stack_top(), Some(7));
        assert_eq!(
            sim.optimized_commands(),
            Some(vec![Opcode::PushValueToBottom(7)])
        );
    }

    #[test]
    fn doubled_and_shifted_second_emits_multiply_then_add() {
        // Swap, Inc, Dup, Add, Swap leaves the second slot holding
        // 2·original + 2 under the untouched top.
        let mut sim = StackSimulator::new(5);
        sim.swap();
        sim.inc();
        sim.dup();
        sim.add();
        sim.swap();
        assert_eq!(sim.stack_top(), Some(5));
        assert_eq!(
            sim.optimized_commands(),
            Some(vec![Opcode::MultiplySecond(2), Opcode::AddToSecond(2)])
        );
    }

    #[test]
    fn bottom_of_unknown_value_blocks_synthesis() {
        let mut sim = StackSimulator::new(7);
        sim.pop();
        sim.bottom();
        assert_eq!(sim.optimized_commands(), None);
    }
}
