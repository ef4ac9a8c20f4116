//! Integration tests for [`stackwasm::parse_expr`] against whole function
//! bodies, exercising structured control flow end to end.

use stackwasm::{opcode, parse_expr, ParserErrorKind, ResultType};

struct AllGlobalsMutable;

impl stackwasm::ModuleResources for AllGlobalsMutable {
    fn is_global_mutable(&self, _global_index: u32) -> bool {
        true
    }
}

struct NoMutableGlobals;

impl stackwasm::ModuleResources for NoMutableGlobals {
    fn is_global_mutable(&self, _global_index: u32) -> bool {
        false
    }
}

fn parse(bytes: &[u8]) -> Result<(stackwasm::Code, usize), stackwasm::ParserError> {
    parse_expr(bytes, &AllGlobalsMutable, 8, ResultType::Empty)
}

#[test]
fn empty_function_body_is_just_end() {
    let (code, consumed) = parse(&[opcode::END]).unwrap();
    assert_eq!(code.instructions, [opcode::END]);
    assert_eq!(consumed, 1);
    assert_eq!(code.max_stack_height, 0);
}

#[test]
fn straight_line_arithmetic_tracks_height() {
    // i32.const 1; i32.const 2; i32.add; end
    let bytes = [
        opcode::I32_CONST,
        0x01,
        opcode::I32_CONST,
        0x02,
        0x6a, // i32.add
        opcode::END,
    ];
    let (code, _) = parse(&bytes).unwrap();
    assert_eq!(code.max_stack_height, 2);
}

#[test]
fn nested_blocks_close_in_order() {
    // block; block; nop; end; end; end
    let bytes = [
        opcode::BLOCK,
        0x40,
        opcode::BLOCK,
        0x40,
        opcode::NOP,
        opcode::END,
        opcode::END,
        opcode::END,
    ];
    let (code, consumed) = parse(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(
        code.instructions,
        [
            opcode::BLOCK,
            opcode::BLOCK,
            opcode::NOP,
            opcode::END,
            opcode::END,
            opcode::END,
        ]
    );
}

#[test]
fn branch_out_of_nested_block_resolves_label_depth() {
    // block; block; br 1; end; end; end -- br targets the outer block
    let bytes = [
        opcode::BLOCK,
        0x40,
        opcode::BLOCK,
        0x40,
        opcode::BR,
        0x01,
        opcode::END,
        opcode::END,
        opcode::END,
    ];
    let (code, _) = parse(&bytes).unwrap();
    assert!(code.instructions.contains(&opcode::BR));
}

#[test]
fn br_table_with_multiple_targets_parses() {
    // block(0); block(1); block(2, innermost); i32.const 0; br_table 0 1 2; end; end; end; end
    let bytes = [
        opcode::BLOCK,
        0x40,
        opcode::BLOCK,
        0x40,
        opcode::BLOCK,
        0x40,
        opcode::I32_CONST,
        0x00,
        opcode::BR_TABLE,
        0x02, // vector length (input-only, not part of the immediates layout)
        0x00, 0x01, // targets
        0x02, // default
        opcode::END,
        opcode::END,
        opcode::END,
        opcode::END,
    ];
    let (code, consumed) = parse(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert!(code.instructions.contains(&opcode::BR_TABLE));

    // Each of the three open blocks reserves 9 bytes (arity:u8, end_pc:u32,
    // else_pc:u32) at offsets 0, 9, 18; i32.const reserves 4 bytes at 27.
    // The br_table immediate starts at 31: one arity byte, then a
    // (target_pc:u32, target_stack_height:u32) pair per arm -- label 0
    // (innermost block, closes at instr 5), label 1 (closes at instr 6),
    // then the default, label 2 (closes at instr 7) -- with no `vec_len`
    // field anywhere in this layout.
    assert_eq!(code.immediates.len(), 56);
    assert_eq!(code.immediates[31], 0, "br_table's single leading arity byte");

    let read_u32 = |offset: usize| u32::from_le_bytes(code.immediates[offset..offset + 4].try_into().unwrap());

    assert_eq!(read_u32(32), 5, "arm 0 target_pc (innermost block's end)");
    assert_eq!(read_u32(36), 0, "arm 0 target_stack_height");
    assert_eq!(read_u32(40), 6, "arm 1 target_pc (middle block's end)");
    assert_eq!(read_u32(44), 0, "arm 1 target_stack_height");
    assert_eq!(read_u32(48), 7, "default arm target_pc (outer block's end)");
    assert_eq!(read_u32(52), 0, "default arm target_stack_height");
}

#[test]
fn br_table_unknown_default_label_fails() {
    let bytes = [
        opcode::I32_CONST,
        0x00,
        opcode::BR_TABLE,
        0x00, // empty vector
        0x05, // default: no such depth
        opcode::END,
    ];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::UnknownLabel(5));
}

#[test]
fn call_indirect_rejects_nonzero_table_index() {
    // i32.const 0 (callee index); call_indirect type=0 table=1 (invalid); end
    let bytes = [opcode::I32_CONST, 0x00, opcode::CALL_INDIRECT, 0x00, 0x01, opcode::END];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::InvalidTableIdx(0x01));
}

#[test]
fn memory_grow_rejects_nonzero_reserved_byte() {
    // i32.const 1; memory.grow (reserved=1, invalid); end
    let bytes = [opcode::I32_CONST, 0x01, opcode::MEMORY_GROW, 0x01, opcode::END];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::InvalidMemIdx(0x01));
}

#[test]
fn global_set_to_immutable_global_fails() {
    let bytes = [opcode::I32_CONST, 0x00, opcode::GLOBAL_SET, 0x00, opcode::END];
    let (_, _) = parse_expr(&bytes, &AllGlobalsMutable, 4, ResultType::Empty).unwrap();

    let err = parse_expr(&bytes, &NoMutableGlobals, 4, ResultType::Empty).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::GlobalIsImmutable(0));
}

#[test]
fn unreachable_instruction_sequence_still_parses() {
    // unreachable; i32.add (would underflow if reachable); end
    let bytes = [opcode::UNREACHABLE, 0x6a, opcode::END];
    let (code, _) = parse(&bytes).unwrap();
    assert_eq!(code.max_stack_height, 0);
}

#[test]
fn truncated_input_reports_unexpected_eof() {
    // i32.const with no LEB byte following
    let bytes = [opcode::I32_CONST];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::UnexpectedEof);
}

#[test]
fn invalid_opcode_byte_is_rejected() {
    let bytes = [0xff, opcode::END];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::InvalidInstruction(0xff));
}

#[test]
fn function_result_type_requires_matching_arity() {
    // declared i32 result, but body produces nothing before the final end
    let bytes = [opcode::NOP, opcode::END];
    let err = parse_expr(&bytes, &AllGlobalsMutable, 0, ResultType::I32).unwrap_err();
    assert!(matches!(err.kind(), ParserErrorKind::TypeMismatch { .. }));
}

#[test]
fn loop_with_backward_branch_parses() {
    // loop; i32.const 0; br_if 0; end; end
    let bytes = [
        opcode::LOOP,
        0x40,
        opcode::I32_CONST,
        0x00,
        opcode::BR_IF,
        0x00,
        opcode::END,
        opcode::END,
    ];
    let (code, consumed) = parse(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(code.max_stack_height, 1);
}

fn read_u32(immediates: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(immediates[offset..offset + 4].try_into().unwrap())
}

#[test]
fn empty_void_block_pins_end_pc_and_else_pc() {
    // nop; nop; block void; end; end
    let bytes = [opcode::NOP, opcode::NOP, opcode::BLOCK, 0x40, opcode::END, opcode::END];
    let (code, consumed) = parse(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(
        code.instructions,
        [opcode::NOP, opcode::NOP, opcode::BLOCK, opcode::END, opcode::END]
    );
    // arity:u8, end_pc:u32, else_pc:u32
    assert_eq!(code.immediates[0], 0, "empty result type has arity 0");
    let end_pc = read_u32(&code.immediates, 1);
    let else_pc = read_u32(&code.immediates, 5);
    // The block opens at instruction index 2; the first matching `end` it
    // sees is instruction index 3 -- that is the `end_pc` invariant from
    // SPEC_FULL.md's §8 testable properties.
    assert_eq!(code.instructions[end_pc as usize], opcode::END);
    assert_eq!(end_pc, 3);
    // No `else` arm: `else_pc` falls back to `end_pc`.
    assert_eq!(else_pc, end_pc);
}

#[test]
fn i64_block_pins_arity_and_end_pc() {
    // block i64; i64.const 0; end; drop; end -- the block must actually
    // produce its declared i64 result, and the leftover value is dropped
    // before the function's own (empty) end so the whole body stays valid.
    let bytes = [
        opcode::BLOCK,
        0x7e,
        opcode::I64_CONST,
        0x00,
        opcode::END,
        opcode::DROP,
        opcode::END,
    ];
    let (code, consumed) = parse(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(
        code.instructions,
        [opcode::BLOCK, opcode::I64_CONST, opcode::END, opcode::DROP, opcode::END]
    );
    assert_eq!(code.immediates[0], 1, "i64 result type has arity 1");
    let end_pc = read_u32(&code.immediates, 1);
    let else_pc = read_u32(&code.immediates, 5);
    assert_eq!(code.instructions[end_pc as usize], opcode::END);
    assert_eq!(end_pc, 2);
    assert_eq!(else_pc, end_pc);
}

#[test]
fn block_with_invalid_blocktype_byte_fails() {
    // block with blocktype byte 0x00, which is none of 0x40/0x7f/0x7e/0x7d/0x7c
    let bytes = [opcode::BLOCK, 0x00, opcode::END, opcode::END];
    let err = parse(&bytes).unwrap_err();
    assert_eq!(*err.kind(), ParserErrorKind::InvalidValType(0));
}
