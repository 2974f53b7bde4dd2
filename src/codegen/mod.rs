pub mod lower;
pub mod printer;

pub use lower::{lower_program, STACK_MASK, STACK_SIZE};
pub use printer::emit_llir_text;
