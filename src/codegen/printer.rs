//! Textual emission of an LLIR module.
//!
//! Emits LLVM-compatible IR text. Output is deterministic: globals,
//! declarations, and functions print in insertion order, blocks in
//! creation order, instructions in program order.

use std::fmt::Write;

use crate::error::CodegenError;
use crate::ir::{Block, BlockId, Function, GlobalInit, Instr, Module};

/// Emits the full text of the module.
pub fn emit_llir_text(module: &Module) -> Result<String, CodegenError> {
    let mut out = String::new();
    writeln!(out, "; XRF module '{}'", module.name)?;
    writeln!(
        out,
        "; computed-goto dispatch over a ring stack with a hoisted top\n"
    )?;

    for global in module.globals() {
        match &global.init {
            GlobalInit::UndefArray { len } => {
                writeln!(out, "@{} = private global [{} x i32] undef", global.name, len)?;
            }
            GlobalInit::Bool(v) => {
                writeln!(
                    out,
                    "@{} = private global i1 {}",
                    global.name,
                    if *v { "true" } else { "false" }
                )?;
            }
        }
    }
    if !module.globals().is_empty() {
        writeln!(out)?;
    }

    for ext in module.extern_fns() {
        let params: Vec<String> = ext.params.iter().map(|t| t.to_string()).collect();
        writeln!(out, "declare {} @{}({})", ext.ret, ext.name, params.join(", "))?;
    }
    if !module.extern_fns().is_empty() {
        writeln!(out)?;
    }

    for func in module.functions() {
        writeln!(out, "define {} @{}() {{", func.ret, func.name)?;
        for (i, block) in func.blocks().iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            writeln!(out, "{}:", block.label)?;
            for instr in &block.instrs {
                emit_instr(&mut out, instr, func)?;
            }
        }
        writeln!(out, "}}")?;
    }

    Ok(out)
}

fn emit_instr(out: &mut String, instr: &Instr, func: &Function) -> Result<(), CodegenError> {
    match instr {
        Instr::Alloca { result, ty } => {
            writeln!(out, "  {} = alloca {}", result, ty)?;
        }

        Instr::Load { result, ty, ptr } => {
            writeln!(out, "  {} = load {}, ptr {}", result, ty, ptr)?;
        }

        Instr::Store { ty, value, ptr } => {
            writeln!(out, "  store {} {}, ptr {}", ty, value, ptr)?;
        }

        Instr::Gep {
            result,
            array_len,
            base,
            index,
        } => {
            writeln!(
                out,
                "  {} = getelementptr inbounds [{} x i32], ptr @{}, i64 0, i64 {}",
                result, array_len, base, index
            )?;
        }

        Instr::Add { result, ty, lhs, rhs } => {
            writeln!(out, "  {} = add {} {}, {}", result, ty, lhs, rhs)?;
        }

        Instr::Sub { result, ty, lhs, rhs } => {
            writeln!(out, "  {} = sub {} {}, {}", result, ty, lhs, rhs)?;
        }

        Instr::Mul { result, ty, lhs, rhs } => {
            writeln!(out, "  {} = mul {} {}, {}", result, ty, lhs, rhs)?;
        }

        Instr::And { result, ty, lhs, rhs } => {
            writeln!(out, "  {} = and {} {}, {}", result, ty, lhs, rhs)?;
        }

        Instr::Icmp {
            result,
            cond,
            ty,
            lhs,
            rhs,
        } => {
            writeln!(out, "  {} = icmp {} {} {}, {}", result, cond, ty, lhs, rhs)?;
        }

        Instr::Select {
            result,
            ty,
            cond,
            if_true,
            if_false,
        } => {
            writeln!(
                out,
                "  {} = select i1 {}, {} {}, {} {}",
                result, cond, ty, if_true, ty, if_false
            )?;
        }

        Instr::Call {
            result,
            ret,
            callee,
            args,
        } => {
            let args_str: Vec<String> =
                args.iter().map(|(ty, op)| format!("{} {}", ty, op)).collect();
            match result {
                Some(r) => writeln!(
                    out,
                    "  {} = call {} @{}({})",
                    r,
                    ret,
                    callee,
                    args_str.join(", ")
                )?,
                None => writeln!(out, "  call {} @{}({})", ret, callee, args_str.join(", "))?,
            }
        }

        Instr::Br { target } => {
            writeln!(out, "  br label %{}", block_label(func, *target)?)?;
        }

        Instr::CondBr {
            cond,
            then_block,
            else_block,
        } => {
            writeln!(
                out,
                "  br i1 {}, label %{}, label %{}",
                cond,
                block_label(func, *then_block)?,
                block_label(func, *else_block)?
            )?;
        }

        Instr::Switch {
            ty,
            value,
            default,
            cases,
        } => {
            writeln!(
                out,
                "  switch {} {}, label %{} [",
                ty,
                value,
                block_label(func, *default)?
            )?;
            for (case, target) in cases {
                writeln!(
                    out,
                    "    {} {}, label %{}",
                    ty,
                    case,
                    block_label(func, *target)?
                )?;
            }
            writeln!(out, "  ]")?;
        }

        Instr::Ret { ty, value } => {
            writeln!(out, "  ret {} {}", ty, value)?;
        }

        Instr::Unreachable => {
            writeln!(out, "  unreachable")?;
        }
    }
    Ok(())
}

fn block_label(func: &Function, id: BlockId) -> Result<&str, CodegenError> {
    func.block(id)
        .map(|b: &Block| b.label.as_str())
        .ok_or_else(|| CodegenError::Unsupported {
            detail: format!("branch to unknown block id {}", id.0),
        })
}
