pub mod block;
pub mod function;
pub mod instr;
pub mod module;
pub mod types;
pub mod value;

pub use block::{Block, BlockId};
pub use function::Function;
pub use instr::{IcmpCond, Instr};
pub use module::{ExternFn, FunctionBuilder, Global, GlobalInit, Module};
pub use types::Ty;
pub use value::{Operand, ValueId};
