//! Program-level chunk fusion.
//!
//! A chunk whose entire body is top/second-slot bookkeeping with a known
//! successor can be glued onto whatever it dispatches to. Walking such
//! chains from every chunk and concatenating their commands makes each
//! entry point jump straight to the chain's tail; a visited set breaks
//! cycles of pure bookkeeping that would otherwise never terminate.
//!
//! The chunk count never changes: every source chunk keeps its index and
//! remains a dispatch target.

use std::collections::HashSet;

use crate::opt::ChunkPass;
use crate::xrf::{Chunk, Opcode};

/// The chunk-fusion pass (`-O2` and above).
pub struct FusePass;

impl ChunkPass for FusePass {
    fn name(&self) -> &'static str {
        "fuse"
    }

    fn run(&mut self, chunks: &mut Vec<Chunk>) {
        let fused: Vec<Chunk> = (0..chunks.len()).map(|i| fuse_chain(chunks, i)).collect();
        *chunks = fused;
    }
}

/// A chunk is fusable when every command only rewrites the top or second
/// stack slot and the successor is known. Anything touching deeper stack
/// state, the bottom queue, I/O, or control flow ends a chain.
fn is_fusable(chunk: &Chunk) -> bool {
    chunk.next.is_some()
        && chunk.commands.iter().all(|cmd| {
            matches!(
                cmd,
                Opcode::AddToSecond(_)
                    | Opcode::MultiplySecond(_)
                    | Opcode::PushSecondValue(_)
                    | Opcode::SetSecondValue(_)
                    | Opcode::SetTop(_)
            )
        })
}

/// Builds the fused replacement for chunk `start`.
fn fuse_chain(chunks: &[Chunk], start: usize) -> Chunk {
    let original = &chunks[start];
    let mut out = Chunk::new(original.line, original.col);
    let mut visited: HashSet<usize> = HashSet::new();
    let mut cursor = start;

    while cursor < chunks.len() && is_fusable(&chunks[cursor]) {
        if visited.contains(&cursor) {
            // A cycle of pure bookkeeping chunks never reaches a tail;
            // leave the entry chunk alone.
            return original.clone();
        }
        visited.insert(cursor);

        out.commands.extend_from_slice(&chunks[cursor].commands);
        out.next = chunks[cursor].next;
        cursor = chunks[cursor].next.expect("fusable chunks have a successor") as usize;
    }

    if out.commands.is_empty() {
        return original.clone();
    }

    condense_set_tops(&mut out.commands);
    out
}

/// Deletes every `SetTop` but the last: only the final one decides the
/// dispatch target, and none of the other commands read the top.
fn condense_set_tops(commands: &mut Vec<Opcode>) {
    let mut found = false;
    for i in (0..commands.len()).rev() {
        if matches!(commands[i], Opcode::SetTop(_)) {
            if found {
                commands.remove(i);
            } else {
                found = true;
            }
        }
    }
}
