/// Scalar LLIR types.
///
/// The generated program only ever needs a boolean flag, the 32-bit stack
/// cell, and the 64-bit ring index; pointers appear solely as instruction
/// operands and are always spelled `ptr` by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    I1,
    I32,
    I64,
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::I1 => f.write_str("i1"),
            Ty::I32 => f.write_str("i32"),
            Ty::I64 => f.write_str("i64"),
        }
    }
}
