//! End-to-end pipeline tests through `compile()`.

use xrfc::{compile, Error, OptLevel};

#[test]
fn compiles_a_small_program_at_every_level() {
    let source = "66FFF AFFFF BFFFF";
    for level in [OptLevel::None, OptLevel::Chunk, OptLevel::Full] {
        let text = compile(source, level).expect("pipeline is total on valid input");
        assert!(text.contains("define i32 @main() {"));
        assert!(text.contains("chunk2:"));
    }
}

#[test]
fn optimization_levels_change_the_emitted_control_flow() {
    // Chunk 1 is Dec,Nop...: at -O0 it pops through the generic dispatch,
    // at -O1 the successor (0) is known and branched to directly.
    let source = "FFFFF 6FFFF";

    let unopt = compile(source, OptLevel::None).unwrap();
    let opt = compile(source, OptLevel::Chunk).unwrap();

    // Unoptimized: chunk1 still does real top_value arithmetic.
    assert!(unopt.contains("chunk1:\n  %v"));
    // Optimized: chunk1 is a bare SetTop plus a direct branch to chunk0.
    assert!(opt.contains("chunk1:\n  store i32 0, ptr %v2\n  br label %chunk0"));
}

#[test]
fn parse_failures_stop_the_pipeline() {
    match compile("0000", OptLevel::Full) {
        Err(Error::Parse(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].to_string().starts_with("Error on line 1, column 1:"));
        }
        other => panic!("expected parse failure, got {:?}", other.map(|_| "module text")),
    }
}

#[test]
fn empty_source_compiles_to_an_immediate_return() {
    let text = compile("", OptLevel::Full).unwrap();
    assert!(text.contains("ret i32 0"));
    assert!(!text.contains("chunk0"));
}

#[test]
fn fused_programs_skip_intermediate_chunks() {
    // Chunk 1 (Inc) dispatches to chunk 2 (Dec, Dec), which dispatches to
    // chunk 0. At -O2 chunk 1 fuses the whole chain and jumps straight to
    // chunk 0 with a single condensed SetTop.
    let source = "01234 5FFFF 66FFF";

    let chunk_only = compile(source, OptLevel::Chunk).unwrap();
    let full = compile(source, OptLevel::Full).unwrap();

    assert!(chunk_only.contains("chunk1:\n  store i32 2, ptr %v2\n  br label %chunk2"));
    assert!(full.contains("chunk1:\n  store i32 0, ptr %v2\n  br label %chunk0"));
}
