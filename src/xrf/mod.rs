pub mod chunk;
pub mod command;

pub use chunk::{Chunk, COMMANDS_PER_CHUNK};
pub use command::Opcode;
