//! Named opcode constants and the static instruction metrics table.
//!
//! The table's contents are transcribed from the reference instruction set
//! this crate implements (the Wasm MVP): for every opcode byte it gives the
//! minimum number of operands that must already be on the stack
//! (`min_stack_inputs`) and the signed delta applied to the stack height
//! once the instruction executes (`stack_height_change`). Reserved/unused
//! opcodes carry [`InstrMetrics::INVALID`].

/// Named byte values for every opcode the parser gives special handling
/// (control flow, variables, memory, constants). Everything else (the bulk
/// of arithmetic, comparison and conversion opcodes) needs no dedicated
/// constant: the parser only consults the metrics table for them.
pub mod opcode {
    pub const UNREACHABLE: u8 = 0x00;
    pub const NOP: u8 = 0x01;
    pub const BLOCK: u8 = 0x02;
    pub const LOOP: u8 = 0x03;
    pub const IF: u8 = 0x04;
    pub const ELSE: u8 = 0x05;
    pub const END: u8 = 0x0b;
    pub const BR: u8 = 0x0c;
    pub const BR_IF: u8 = 0x0d;
    pub const BR_TABLE: u8 = 0x0e;
    pub const RETURN: u8 = 0x0f;
    pub const CALL: u8 = 0x10;
    pub const CALL_INDIRECT: u8 = 0x11;
    pub const DROP: u8 = 0x1a;
    pub const SELECT: u8 = 0x1b;
    pub const LOCAL_GET: u8 = 0x20;
    pub const LOCAL_SET: u8 = 0x21;
    pub const LOCAL_TEE: u8 = 0x22;
    pub const GLOBAL_GET: u8 = 0x23;
    pub const GLOBAL_SET: u8 = 0x24;
    /// First load opcode (`i32.load`); loads occupy `LOAD_FIRST..=STORE_FIRST - 1`.
    pub const LOAD_FIRST: u8 = 0x28;
    /// First store opcode (`i32.store`); stores occupy `STORE_FIRST..=STORE_LAST`.
    pub const STORE_FIRST: u8 = 0x36;
    pub const STORE_LAST: u8 = 0x3e;
    pub const MEMORY_SIZE: u8 = 0x3f;
    pub const MEMORY_GROW: u8 = 0x40;
    pub const I32_CONST: u8 = 0x41;
    pub const I64_CONST: u8 = 0x42;
    pub const F32_CONST: u8 = 0x43;
    pub const F64_CONST: u8 = 0x44;
}

/// Per-opcode operand-stack metrics used to track stack height during
/// parsing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InstrMetrics {
    /// How many operand slots must already be on the stack before this
    /// opcode executes.
    pub min_stack_inputs: u8,
    /// The signed delta applied to the operand-stack height once this
    /// opcode executes.
    pub stack_height_change: i8,
}

impl InstrMetrics {
    const fn new(min_stack_inputs: u8, stack_height_change: i8) -> Self {
        Self {
            min_stack_inputs,
            stack_height_change,
        }
    }

    /// The sentinel entry for reserved/unassigned opcode bytes.
    const INVALID: Self = Self::new(u8::MAX, 0);

    /// Whether this entry corresponds to an assigned opcode.
    pub const fn is_valid(self) -> bool {
        self.min_stack_inputs != u8::MAX
    }
}

/// Returns the metrics entry for `opcode`.
pub fn metrics_for(opcode: u8) -> InstrMetrics {
    INSTRUCTION_METRICS_TABLE[opcode as usize]
}

#[rustfmt::skip]
const INSTRUCTION_METRICS_TABLE: [InstrMetrics; 256] = {
    const INVALID: InstrMetrics = InstrMetrics::INVALID;
    const fn m(min_stack_inputs: u8, stack_height_change: i8) -> InstrMetrics {
        InstrMetrics::new(min_stack_inputs, stack_height_change)
    }
    [
        // 0x00 - 0x0b: control instructions
        /* unreachable   = 0x00 */ m(0, 0),
        /* nop            = 0x01 */ m(0, 0),
        /* block          = 0x02 */ m(0, 0),
        /* loop           = 0x03 */ m(0, 0),
        /* if             = 0x04 */ m(1, -1),
        /* else           = 0x05 */ m(0, 0),
        /*                  0x06 */ INVALID,
        /*                  0x07 */ INVALID,
        /*                  0x08 */ INVALID,
        /*                  0x09 */ INVALID,
        /*                  0x0a */ INVALID,
        /* end            = 0x0b */ m(0, 0),

        // `br`, `br_table`, `return`, `unreachable` are modeled as (0, 0):
        // what follows is unreachable code whose stack effect does not
        // matter until the next `end`/`else`.
        /* br             = 0x0c */ m(0, 0),
        /* br_if          = 0x0d */ m(1, -1),
        /* br_table       = 0x0e */ m(1, -1),
        /* return         = 0x0f */ m(0, 0),

        // `call` is modeled as (0, +1) and `call_indirect` as (1, 0); the
        // true arity depends on the target function's type and is applied
        // by the downstream execution engine, not by this parser.
        /* call           = 0x10 */ m(0, 1),
        /* call_indirect  = 0x11 */ m(1, 0),

        /*                  0x12 */ INVALID,
        /*                  0x13 */ INVALID,
        /*                  0x14 */ INVALID,
        /*                  0x15 */ INVALID,
        /*                  0x16 */ INVALID,
        /*                  0x17 */ INVALID,
        /*                  0x18 */ INVALID,
        /*                  0x19 */ INVALID,

        // 0x1a - 0x1b: parametric instructions
        /* drop           = 0x1a */ m(1, -1),
        /* select         = 0x1b */ m(3, -2),

        /*                  0x1c */ INVALID,
        /*                  0x1d */ INVALID,
        /*                  0x1e */ INVALID,
        /*                  0x1f */ INVALID,

        // 0x20 - 0x24: variable instructions
        /* local.get      = 0x20 */ m(0, 1),
        /* local.set      = 0x21 */ m(1, -1),
        /* local.tee      = 0x22 */ m(1, 0),
        /* global.get     = 0x23 */ m(0, 1),
        /* global.set     = 0x24 */ m(1, -1),

        /*                  0x25 */ INVALID,
        /*                  0x26 */ INVALID,
        /*                  0x27 */ INVALID,

        // 0x28 - 0x40: memory instructions
        /* i32.load       = 0x28 */ m(1, 0),
        /* i64.load       = 0x29 */ m(1, 0),
        /* f32.load       = 0x2a */ m(1, 0),
        /* f64.load       = 0x2b */ m(1, 0),
        /* i32.load8_s    = 0x2c */ m(1, 0),
        /* i32.load8_u    = 0x2d */ m(1, 0),
        /* i32.load16_s   = 0x2e */ m(1, 0),
        /* i32.load16_u   = 0x2f */ m(1, 0),
        /* i64.load8_s    = 0x30 */ m(1, 0),
        /* i64.load8_u    = 0x31 */ m(1, 0),
        /* i64.load16_s   = 0x32 */ m(1, 0),
        /* i64.load16_u   = 0x33 */ m(1, 0),
        /* i64.load32_s   = 0x34 */ m(1, 0),
        /* i64.load32_u   = 0x35 */ m(1, 0),
        /* i32.store      = 0x36 */ m(2, -2),
        /* i64.store      = 0x37 */ m(2, -2),
        /* f32.store      = 0x38 */ m(2, -2),
        /* f64.store      = 0x39 */ m(2, -2),
        /* i32.store8     = 0x3a */ m(2, -2),
        /* i32.store16    = 0x3b */ m(2, -2),
        /* i64.store8     = 0x3c */ m(2, -2),
        /* i64.store16    = 0x3d */ m(2, -2),
        /* i64.store32    = 0x3e */ m(2, -2),
        /* memory.size    = 0x3f */ m(0, 1),
        /* memory.grow    = 0x40 */ m(1, 0),

        // 0x41 - 0x44: numeric constants
        /* i32.const      = 0x41 */ m(0, 1),
        /* i64.const      = 0x42 */ m(0, 1),
        /* f32.const      = 0x43 */ m(0, 1),
        /* f64.const      = 0x44 */ m(0, 1),

        /* i32.eqz        = 0x45 */ m(1, 0),
        /* i32.eq         = 0x46 */ m(2, -1),
        /* i32.ne         = 0x47 */ m(2, -1),
        /* i32.lt_s       = 0x48 */ m(2, -1),
        /* i32.lt_u       = 0x49 */ m(2, -1),
        /* i32.gt_s       = 0x4a */ m(2, -1),
        /* i32.gt_u       = 0x4b */ m(2, -1),
        /* i32.le_s       = 0x4c */ m(2, -1),
        /* i32.le_u       = 0x4d */ m(2, -1),
        /* i32.ge_s       = 0x4e */ m(2, -1),
        /* i32.ge_u       = 0x4f */ m(2, -1),

        /* i64.eqz        = 0x50 */ m(1, 0),
        /* i64.eq         = 0x51 */ m(2, -1),
        /* i64.ne         = 0x52 */ m(2, -1),
        /* i64.lt_s       = 0x53 */ m(2, -1),
        /* i64.lt_u       = 0x54 */ m(2, -1),
        /* i64.gt_s       = 0x55 */ m(2, -1),
        /* i64.gt_u       = 0x56 */ m(2, -1),
        /* i64.le_s       = 0x57 */ m(2, -1),
        /* i64.le_u       = 0x58 */ m(2, -1),
        /* i64.ge_s       = 0x59 */ m(2, -1),
        /* i64.ge_u       = 0x5a */ m(2, -1),

        /* f32.eq         = 0x5b */ m(2, -1),
        /* f32.ne         = 0x5c */ m(2, -1),
        /* f32.lt         = 0x5d */ m(2, -1),
        /* f32.gt         = 0x5e */ m(2, -1),
        /* f32.le         = 0x5f */ m(2, -1),
        /* f32.ge         = 0x60 */ m(2, -1),

        /* f64.eq         = 0x61 */ m(2, -1),
        /* f64.ne         = 0x62 */ m(2, -1),
        /* f64.lt         = 0x63 */ m(2, -1),
        /* f64.gt         = 0x64 */ m(2, -1),
        /* f64.le         = 0x65 */ m(2, -1),
        /* f64.ge         = 0x66 */ m(2, -1),

        /* i32.clz        = 0x67 */ m(1, 0),
        /* i32.ctz        = 0x68 */ m(1, 0),
        /* i32.popcnt     = 0x69 */ m(1, 0),
        /* i32.add        = 0x6a */ m(2, -1),
        /* i32.sub        = 0x6b */ m(2, -1),
        /* i32.mul        = 0x6c */ m(2, -1),
        /* i32.div_s      = 0x6d */ m(2, -1),
        /* i32.div_u      = 0x6e */ m(2, -1),
        /* i32.rem_s      = 0x6f */ m(2, -1),
        /* i32.rem_u      = 0x70 */ m(2, -1),
        /* i32.and        = 0x71 */ m(2, -1),
        /* i32.or         = 0x72 */ m(2, -1),
        /* i32.xor        = 0x73 */ m(2, -1),
        /* i32.shl        = 0x74 */ m(2, -1),
        /* i32.shr_s      = 0x75 */ m(2, -1),
        /* i32.shr_u      = 0x76 */ m(2, -1),
        /* i32.rotl       = 0x77 */ m(2, -1),
        /* i32.rotr       = 0x78 */ m(2, -1),

        /* i64.clz        = 0x79 */ m(1, 0),
        /* i64.ctz        = 0x7a */ m(1, 0),
        /* i64.popcnt     = 0x7b */ m(1, 0),
        /* i64.add        = 0x7c */ m(2, -1),
        /* i64.sub        = 0x7d */ m(2, -1),
        /* i64.mul        = 0x7e */ m(2, -1),
        /* i64.div_s      = 0x7f */ m(2, -1),
        /* i64.div_u      = 0x80 */ m(2, -1),
        /* i64.rem_s      = 0x81 */ m(2, -1),
        /* i64.rem_u      = 0x82 */ m(2, -1),
        /* i64.and        = 0x83 */ m(2, -1),
        /* i64.or         = 0x84 */ m(2, -1),
        /* i64.xor        = 0x85 */ m(2, -1),
        /* i64.shl        = 0x86 */ m(2, -1),
        /* i64.shr_s      = 0x87 */ m(2, -1),
        /* i64.shr_u      = 0x88 */ m(2, -1),
        /* i64.rotl       = 0x89 */ m(2, -1),
        /* i64.rotr       = 0x8a */ m(2, -1),

        /* f32.abs        = 0x8b */ m(1, 0),
        /* f32.neg        = 0x8c */ m(1, 0),
        /* f32.ceil       = 0x8d */ m(1, 0),
        /* f32.floor      = 0x8e */ m(1, 0),
        /* f32.trunc      = 0x8f */ m(1, 0),
        /* f32.nearest    = 0x90 */ m(1, 0),
        /* f32.sqrt       = 0x91 */ m(1, 0),
        /* f32.add        = 0x92 */ m(2, -1),
        /* f32.sub        = 0x93 */ m(2, -1),
        /* f32.mul        = 0x94 */ m(2, -1),
        /* f32.div        = 0x95 */ m(2, -1),
        /* f32.min        = 0x96 */ m(2, -1),
        /* f32.max        = 0x97 */ m(2, -1),
        /* f32.copysign   = 0x98 */ m(2, -1),

        /* f64.abs        = 0x99 */ m(1, 0),
        /* f64.neg        = 0x9a */ m(1, 0),
        /* f64.ceil       = 0x9b */ m(1, 0),
        /* f64.floor      = 0x9c */ m(1, 0),
        /* f64.trunc      = 0x9d */ m(1, 0),
        /* f64.nearest    = 0x9e */ m(1, 0),
        /* f64.sqrt       = 0x9f */ m(1, 0),
        /* f64.add        = 0xa0 */ m(2, -1),
        /* f64.sub        = 0xa1 */ m(2, -1),
        /* f64.mul        = 0xa2 */ m(2, -1),
        /* f64.div        = 0xa3 */ m(2, -1),
        /* f64.min        = 0xa4 */ m(2, -1),
        /* f64.max        = 0xa5 */ m(2, -1),
        /* f64.copysign   = 0xa6 */ m(2, -1),

        /* i32.wrap_i64        = 0xa7 */ m(1, 0),
        /* i32.trunc_f32_s     = 0xa8 */ m(1, 0),
        /* i32.trunc_f32_u     = 0xa9 */ m(1, 0),
        /* i32.trunc_f64_s     = 0xaa */ m(1, 0),
        /* i32.trunc_f64_u     = 0xab */ m(1, 0),
        /* i64.extend_i32_s    = 0xac */ m(1, 0),
        /* i64.extend_i32_u    = 0xad */ m(1, 0),
        /* i64.trunc_f32_s     = 0xae */ m(1, 0),
        /* i64.trunc_f32_u     = 0xaf */ m(1, 0),
        /* i64.trunc_f64_s     = 0xb0 */ m(1, 0),
        /* i64.trunc_f64_u     = 0xb1 */ m(1, 0),
        /* f32.convert_i32_s   = 0xb2 */ m(1, 0),
        /* f32.convert_i32_u   = 0xb3 */ m(1, 0),
        /* f32.convert_i64_s   = 0xb4 */ m(1, 0),
        /* f32.convert_i64_u   = 0xb5 */ m(1, 0),
        /* f32.demote_f64      = 0xb6 */ m(1, 0),
        /* f64.convert_i32_s   = 0xb7 */ m(1, 0),
        /* f64.convert_i32_u   = 0xb8 */ m(1, 0),
        /* f64.convert_i64_s   = 0xb9 */ m(1, 0),
        /* f64.convert_i64_u   = 0xba */ m(1, 0),
        /* f64.promote_f32     = 0xbb */ m(1, 0),
        /* i32.reinterpret_f32 = 0xbc */ m(1, 0),
        /* i64.reinterpret_f64 = 0xbd */ m(1, 0),
        /* f32.reinterpret_i32 = 0xbe */ m(1, 0),
        /* f64.reinterpret_i64 = 0xbf */ m(1, 0),

        // 0xc0 - 0xff: unassigned in the Wasm MVP.
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
        INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID, INVALID,
    ]
};
