//! Lowering of the chunk table to an LLIR control-flow graph.
//!
//! The emitted program is a single `main` function:
//!
//! ```text
//! start:        allocate stack_top / stack_bottom / top_value, br chunk0
//! chunk{i}:     straight-line code for chunk i's commands
//! stack_jump:   switch on top_value over all chunk indices
//! stack_error:  unreachable (dispatch on an unknown index is UB)
//! ```
//!
//! The stack is a ring of [`STACK_SIZE`] i32 cells in a private global;
//! `stack_top` and `stack_bottom` are 64-bit indices into it and every
//! index computation is masked with [`STACK_MASK`] before use, so
//! underflow and overflow wrap silently. The logical top of stack lives in
//! the `top_value` scalar, not in the array: a push spills the old top into
//! `stack[stack_top]` before replacing the scalar, and a pop refills the
//! scalar from `stack[stack_top - 1]`. Reading the top therefore never
//! touches memory the backend cannot keep in a register.
//!
//! Chunks containing `IgnoreFirst`/`IgnoreVisited` get a private `i1`
//! visited flag; the predicate splits the rest of the chunk into two
//! freshly-materialized blocks, and the path taken only on the first visit
//! stores 1 into the flag just before leaving the chunk.

use crate::ir::{
    BlockId, FunctionBuilder, GlobalInit, IcmpCond, Instr, Module, Operand, Ty, ValueId,
};
use crate::xrf::{Chunk, Opcode};

/// Number of i32 cells in the ring stack.
pub const STACK_SIZE: u32 = 65536;

/// Mask applied to every ring index after arithmetic.
pub const STACK_MASK: i64 = (STACK_SIZE - 1) as i64;

/// Name of the ring-stack array global.
const STACK_GLOBAL: &str = "stack";

fn visited_flag_name(chunk_index: usize) -> String {
    format!("visited_{}", chunk_index)
}

/// Lowers a whole program. Total: every valid chunk list yields a module.
pub fn lower_program(chunks: &[Chunk]) -> Module {
    let mut module = Module::new("xrf");

    module.add_global(STACK_GLOBAL, GlobalInit::UndefArray { len: STACK_SIZE });
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.has_predicate() {
            module.add_global(visited_flag_name(i), GlobalInit::Bool(false));
        }
    }

    module.add_extern_fn("getchar", vec![], Ty::I32);
    module.add_extern_fn("putchar", vec![Ty::I32], Ty::I32);

    let mut b = FunctionBuilder::new("main", Ty::I32);
    let start = b.create_block("start");
    b.set_current_block(start);

    let stack_top = b.fresh_value();
    b.push_instr(Instr::Alloca {
        result: stack_top,
        ty: Ty::I64,
    });
    let stack_bottom = b.fresh_value();
    b.push_instr(Instr::Alloca {
        result: stack_bottom,
        ty: Ty::I64,
    });
    let top_value = b.fresh_value();
    b.push_instr(Instr::Alloca {
        result: top_value,
        ty: Ty::I32,
    });

    b.push_instr(Instr::Store {
        ty: Ty::I64,
        value: Operand::Const(0),
        ptr: stack_top.into(),
    });
    b.push_instr(Instr::Store {
        ty: Ty::I64,
        value: Operand::Const((STACK_SIZE - 1) as i64),
        ptr: stack_bottom.into(),
    });
    b.push_instr(Instr::Store {
        ty: Ty::I32,
        value: Operand::Const(0),
        ptr: top_value.into(),
    });

    if chunks.is_empty() {
        b.push_instr(Instr::Ret {
            ty: Ty::I32,
            value: Operand::Const(0),
        });
        module.add_function(b.build());
        return module;
    }

    let chunk_blocks: Vec<BlockId> = (0..chunks.len())
        .map(|i| b.create_block(format!("chunk{}", i)))
        .collect();
    let dispatch = b.create_block("stack_jump");
    let error = b.create_block("stack_error");

    // start falls through to chunk 0.
    b.push_instr(Instr::Br {
        target: chunk_blocks[0],
    });

    // Dispatch: switch on the hoisted top over every chunk index.
    b.set_current_block(dispatch);
    let top = b.fresh_value();
    b.push_instr(Instr::Load {
        result: top,
        ty: Ty::I32,
        ptr: top_value.into(),
    });
    let cases = (0..chunks.len())
        .map(|i| (i as i64, chunk_blocks[i]))
        .collect();
    b.push_instr(Instr::Switch {
        ty: Ty::I32,
        value: top.into(),
        default: error,
        cases,
    });

    b.set_current_block(error);
    b.push_instr(Instr::Unreachable);

    let slots = FrameSlots {
        stack_top,
        stack_bottom,
        top_value,
    };
    for (i, chunk) in chunks.iter().enumerate() {
        let mut lowerer = ChunkLowerer {
            chunks,
            chunk_blocks: &chunk_blocks,
            dispatch,
            slots,
            chunk_index: i,
            sub_blocks: 0,
        };
        b.set_current_block(chunk_blocks[i]);
        lowerer.lower_commands(&mut b, &chunk.commands, false);
    }

    module.add_function(b.build());
    module
}

/// The three frame scalars every opcode operates on.
#[derive(Clone, Copy)]
struct FrameSlots {
    /// i64 ring index one past the in-array top.
    stack_top: ValueId,
    /// i64 ring index of the next free bottom cell.
    stack_bottom: ValueId,
    /// i32 hoisted top of stack.
    top_value: ValueId,
}

struct ChunkLowerer<'a> {
    chunks: &'a [Chunk],
    chunk_blocks: &'a [BlockId],
    dispatch: BlockId,
    slots: FrameSlots,
    chunk_index: usize,
    /// Counter for predicate suffix blocks within this chunk.
    sub_blocks: u32,
}

impl<'a> ChunkLowerer<'a> {
    /// Lowers a command suffix into the current block.
    ///
    /// `set_visited` marks a first-visit path: its terminator stores 1 into
    /// the chunk's visited flag before leaving.
    fn lower_commands(&mut self, b: &mut FunctionBuilder, commands: &[Opcode], set_visited: bool) {
        for (i, cmd) in commands.iter().enumerate() {
            match cmd {
                Opcode::Exit => {
                    b.push_instr(Instr::Ret {
                        ty: Ty::I32,
                        value: Operand::Const(0),
                    });
                    return;
                }
                Opcode::Jump => {
                    self.emit_chunk_end(b, set_visited);
                    return;
                }
                Opcode::IgnoreFirst | Opcode::IgnoreVisited => {
                    if i + 1 < commands.len() {
                        self.lower_predicate(b, *cmd, &commands[i + 1..], set_visited);
                        return;
                    }
                    // A predicate in the final slot has nothing to skip.
                }
                _ => self.emit_opcode(b, *cmd),
            }
        }
        self.emit_chunk_end(b, set_visited);
    }

    /// Splits the chunk at a predicate: `suffix` is everything after the
    /// predicate opcode. Both continuations are lowered into fresh blocks;
    /// exactly one of them is the first-visit path.
    fn lower_predicate(
        &mut self,
        b: &mut FunctionBuilder,
        op: Opcode,
        suffix: &[Opcode],
        _set_visited: bool,
    ) {
        let seen = b.fresh_value();
        b.push_instr(Instr::Load {
            result: seen,
            ty: Ty::I1,
            ptr: Operand::Global(visited_flag_name(self.chunk_index)),
        });

        let n = self.sub_blocks;
        self.sub_blocks += 1;
        let first_block = b.create_block(format!("chunk{}_first{}", self.chunk_index, n));
        let again_block = b.create_block(format!("chunk{}_again{}", self.chunk_index, n));
        b.push_instr(Instr::CondBr {
            cond: seen.into(),
            then_block: again_block,
            else_block: first_block,
        });

        let next_sub = suffix;
        let skip_sub = &suffix[1..];

        // IgnoreFirst skips its successor on the first visit;
        // IgnoreVisited skips it on every later visit.
        let (first_cmds, again_cmds) = match op {
            Opcode::IgnoreFirst => (skip_sub, next_sub),
            Opcode::IgnoreVisited => (next_sub, skip_sub),
            _ => unreachable!("lower_predicate on non-predicate opcode"),
        };

        b.set_current_block(first_block);
        self.lower_commands(b, first_cmds, true);

        b.set_current_block(again_block);
        self.lower_commands(b, again_cmds, false);
    }

    /// Ends the chunk: marks the visited flag if this is a first-visit
    /// path, then branches to the known successor or to dispatch. An
    /// out-of-range successor also goes through dispatch, whose default is
    /// unreachable.
    fn emit_chunk_end(&mut self, b: &mut FunctionBuilder, set_visited: bool) {
        if set_visited {
            b.push_instr(Instr::Store {
                ty: Ty::I1,
                value: Operand::Const(1),
                ptr: Operand::Global(visited_flag_name(self.chunk_index)),
            });
        }
        let target = match self.chunks[self.chunk_index].next {
            Some(next) if (next as usize) < self.chunk_blocks.len() => {
                self.chunk_blocks[next as usize]
            }
            _ => self.dispatch,
        };
        b.push_instr(Instr::Br { target });
    }

    /// Emits the straight-line effect of one non-control opcode.
    fn emit_opcode(&mut self, b: &mut FunctionBuilder, op: Opcode) {
        match op {
            Opcode::Input => {
                let c = b.fresh_value();
                b.push_instr(Instr::Call {
                    result: Some(c),
                    ret: Ty::I32,
                    callee: "getchar".into(),
                    args: vec![],
                });
                let is_eof = b.fresh_value();
                b.push_instr(Instr::Icmp {
                    result: is_eof,
                    cond: IcmpCond::Eq,
                    ty: Ty::I32,
                    lhs: c.into(),
                    rhs: Operand::Const(-1),
                });
                let byte = b.fresh_value();
                b.push_instr(Instr::Select {
                    result: byte,
                    ty: Ty::I32,
                    cond: is_eof.into(),
                    if_true: Operand::Const(0),
                    if_false: c.into(),
                });
                self.emit_push(b, byte.into());
            }

            Opcode::Output => {
                let top = self.load_top_value(b);
                b.push_instr(Instr::Call {
                    result: None,
                    ret: Ty::I32,
                    callee: "putchar".into(),
                    args: vec![(Ty::I32, top.into())],
                });
                self.emit_pop(b);
            }

            Opcode::Pop => self.emit_pop(b),

            Opcode::Dup => {
                let top = self.load_top_value(b);
                self.emit_push(b, top.into());
            }

            Opcode::Swap => {
                let second_ptr = self.second_slot_addr(b);
                let second = b.fresh_value();
                b.push_instr(Instr::Load {
                    result: second,
                    ty: Ty::I32,
                    ptr: second_ptr.into(),
                });
                let top = self.load_top_value(b);
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: top.into(),
                    ptr: second_ptr.into(),
                });
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: second.into(),
                    ptr: self.slots.top_value.into(),
                });
            }

            Opcode::Inc => self.emit_add_constant(b, 1),
            Opcode::Dec => self.emit_add_constant(b, -1),

            Opcode::Add => {
                let a = self.load_top_value(b);
                self.emit_pop(b);
                let b2 = self.load_top_value(b);
                let sum = b.fresh_value();
                b.push_instr(Instr::Add {
                    result: sum,
                    ty: Ty::I32,
                    lhs: a.into(),
                    rhs: b2.into(),
                });
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: sum.into(),
                    ptr: self.slots.top_value.into(),
                });
            }

            Opcode::Sub => {
                let a = self.load_top_value(b);
                self.emit_pop(b);
                let b2 = self.load_top_value(b);
                let d1 = b.fresh_value();
                b.push_instr(Instr::Sub {
                    result: d1,
                    ty: Ty::I32,
                    lhs: a.into(),
                    rhs: b2.into(),
                });
                let d2 = b.fresh_value();
                b.push_instr(Instr::Sub {
                    result: d2,
                    ty: Ty::I32,
                    lhs: b2.into(),
                    rhs: a.into(),
                });
                let a_greater = b.fresh_value();
                b.push_instr(Instr::Icmp {
                    result: a_greater,
                    cond: IcmpCond::Ugt,
                    ty: Ty::I32,
                    lhs: a.into(),
                    rhs: b2.into(),
                });
                let diff = b.fresh_value();
                b.push_instr(Instr::Select {
                    result: diff,
                    ty: Ty::I32,
                    cond: a_greater.into(),
                    if_true: d1.into(),
                    if_false: d2.into(),
                });
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: diff.into(),
                    ptr: self.slots.top_value.into(),
                });
            }

            Opcode::Bottom => {
                let top = self.load_top_value(b);
                self.emit_pop(b);
                let bottom = self.load_index(b, self.slots.stack_bottom);
                let cell = self.stack_cell_addr(b, bottom.into());
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: top.into(),
                    ptr: cell.into(),
                });
                let new_bottom = self.masked_offset(b, bottom, -1);
                b.push_instr(Instr::Store {
                    ty: Ty::I64,
                    value: new_bottom.into(),
                    ptr: self.slots.stack_bottom.into(),
                });
            }

            // Randomize is a reserved slot with no defined lowering.
            Opcode::Nop | Opcode::Randomize => {}

            Opcode::Jump | Opcode::Exit | Opcode::IgnoreFirst | Opcode::IgnoreVisited => {
                unreachable!("control opcodes are handled by lower_commands")
            }

            Opcode::AddToSecond(k) => {
                let cell = self.second_slot_addr(b);
                let v = b.fresh_value();
                b.push_instr(Instr::Load {
                    result: v,
                    ty: Ty::I32,
                    ptr: cell.into(),
                });
                let r = b.fresh_value();
                b.push_instr(Instr::Add {
                    result: r,
                    ty: Ty::I32,
                    lhs: v.into(),
                    rhs: Operand::Const(k as i64),
                });
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: r.into(),
                    ptr: cell.into(),
                });
            }

            Opcode::MultiplySecond(m) => {
                let cell = self.second_slot_addr(b);
                let v = b.fresh_value();
                b.push_instr(Instr::Load {
                    result: v,
                    ty: Ty::I32,
                    ptr: cell.into(),
                });
                let r = b.fresh_value();
                b.push_instr(Instr::Mul {
                    result: r,
                    ty: Ty::I32,
                    lhs: v.into(),
                    rhs: Operand::Const(m as i64),
                });
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: r.into(),
                    ptr: cell.into(),
                });
            }

            Opcode::PopSecondValue => {
                let st = self.load_index(b, self.slots.stack_top);
                let new_top = self.masked_offset(b, st, -1);
                b.push_instr(Instr::Store {
                    ty: Ty::I64,
                    value: new_top.into(),
                    ptr: self.slots.stack_top.into(),
                });
            }

            Opcode::PushSecondValue(v) => {
                // The hoisted top stays put; the new value lands in the
                // array cell right below it.
                let st = self.load_index(b, self.slots.stack_top);
                let cell = self.stack_cell_addr(b, st.into());
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: Operand::Const(v as i64),
                    ptr: cell.into(),
                });
                let new_top = self.masked_offset(b, st, 1);
                b.push_instr(Instr::Store {
                    ty: Ty::I64,
                    value: new_top.into(),
                    ptr: self.slots.stack_top.into(),
                });
            }

            Opcode::PushValueToBottom(v) => {
                let bottom = self.load_index(b, self.slots.stack_bottom);
                let cell = self.stack_cell_addr(b, bottom.into());
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: Operand::Const(v as i64),
                    ptr: cell.into(),
                });
                let new_bottom = self.masked_offset(b, bottom, -1);
                b.push_instr(Instr::Store {
                    ty: Ty::I64,
                    value: new_bottom.into(),
                    ptr: self.slots.stack_bottom.into(),
                });
            }

            Opcode::SetSecondValue(v) => {
                let cell = self.second_slot_addr(b);
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: Operand::Const(v as i64),
                    ptr: cell.into(),
                });
            }

            Opcode::SetTop(v) => {
                b.push_instr(Instr::Store {
                    ty: Ty::I32,
                    value: Operand::Const(v as i64),
                    ptr: self.slots.top_value.into(),
                });
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    fn load_top_value(&self, b: &mut FunctionBuilder) -> ValueId {
        let v = b.fresh_value();
        b.push_instr(Instr::Load {
            result: v,
            ty: Ty::I32,
            ptr: self.slots.top_value.into(),
        });
        v
    }

    fn load_index(&self, b: &mut FunctionBuilder, slot: ValueId) -> ValueId {
        let v = b.fresh_value();
        b.push_instr(Instr::Load {
            result: v,
            ty: Ty::I64,
            ptr: slot.into(),
        });
        v
    }

    /// `(base + delta) & STACK_MASK`. Every ring index goes through here
    /// so over- and underflow wrap instead of escaping the array.
    fn masked_offset(&self, b: &mut FunctionBuilder, base: ValueId, delta: i64) -> ValueId {
        let shifted = b.fresh_value();
        if delta >= 0 {
            b.push_instr(Instr::Add {
                result: shifted,
                ty: Ty::I64,
                lhs: base.into(),
                rhs: Operand::Const(delta),
            });
        } else {
            b.push_instr(Instr::Sub {
                result: shifted,
                ty: Ty::I64,
                lhs: base.into(),
                rhs: Operand::Const(-delta),
            });
        }
        let masked = b.fresh_value();
        b.push_instr(Instr::And {
            result: masked,
            ty: Ty::I64,
            lhs: shifted.into(),
            rhs: Operand::Const(STACK_MASK),
        });
        masked
    }

    fn stack_cell_addr(&self, b: &mut FunctionBuilder, index: Operand) -> ValueId {
        let p = b.fresh_value();
        b.push_instr(Instr::Gep {
            result: p,
            array_len: STACK_SIZE,
            base: STACK_GLOBAL.into(),
            index,
        });
        p
    }

    /// Address of the cell holding the in-array second value,
    /// `stack[(stack_top - 1) & STACK_MASK]`.
    fn second_slot_addr(&self, b: &mut FunctionBuilder) -> ValueId {
        let st = self.load_index(b, self.slots.stack_top);
        let idx = self.masked_offset(b, st, -1);
        self.stack_cell_addr(b, idx.into())
    }

    /// Spills the hoisted top into `stack[stack_top]`, installs `value` as
    /// the new top, and bumps the masked index.
    fn emit_push(&self, b: &mut FunctionBuilder, value: Operand) {
        let old_top = self.load_top_value(b);
        let st = self.load_index(b, self.slots.stack_top);
        let cell = self.stack_cell_addr(b, st.into());
        b.push_instr(Instr::Store {
            ty: Ty::I32,
            value: old_top.into(),
            ptr: cell.into(),
        });
        b.push_instr(Instr::Store {
            ty: Ty::I32,
            value,
            ptr: self.slots.top_value.into(),
        });
        let new_top = self.masked_offset(b, st, 1);
        b.push_instr(Instr::Store {
            ty: Ty::I64,
            value: new_top.into(),
            ptr: self.slots.stack_top.into(),
        });
    }

    /// Refills the hoisted top from `stack[(stack_top - 1) & MASK]` and
    /// drops the masked index.
    fn emit_pop(&self, b: &mut FunctionBuilder) {
        let st = self.load_index(b, self.slots.stack_top);
        let idx = self.masked_offset(b, st, -1);
        let cell = self.stack_cell_addr(b, idx.into());
        let v = b.fresh_value();
        b.push_instr(Instr::Load {
            result: v,
            ty: Ty::I32,
            ptr: cell.into(),
        });
        b.push_instr(Instr::Store {
            ty: Ty::I32,
            value: v.into(),
            ptr: self.slots.top_value.into(),
        });
        b.push_instr(Instr::Store {
            ty: Ty::I64,
            value: idx.into(),
            ptr: self.slots.stack_top.into(),
        });
    }

    fn emit_add_constant(&self, b: &mut FunctionBuilder, k: i64) {
        let top = self.load_top_value(b);
        let r = b.fresh_value();
        b.push_instr(Instr::Add {
            result: r,
            ty: Ty::I32,
            lhs: top.into(),
            rhs: Operand::Const(k),
        });
        b.push_instr(Instr::Store {
            ty: Ty::I32,
            value: r.into(),
            ptr: self.slots.top_value.into(),
        });
    }
}
