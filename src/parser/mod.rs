//! The single-pass expression parser: turns one function body's raw bytes
//! into a linearized [`Code`](crate::code::Code).

mod control_frame;

use crate::code::{Code, ResultType};
use crate::error::ParserError;
use crate::leb128::Cursor;
use crate::metrics::{metrics_for, opcode};
use crate::stack::Stack;

use control_frame::{ControlFrame, FrameKind};

/// Module-level facts the expression parser needs but cannot see from a
/// function body's bytes alone.
///
/// An embedder implements this over whatever module representation it
/// already has; the parser only ever asks it about global mutability.
pub trait ModuleResources {
    /// Whether the global at `global_index` was declared mutable.
    ///
    /// Called only for `global.set`; out-of-range indices are the caller's
    /// concern (this crate does not itself validate index existence).
    fn is_global_mutable(&self, global_index: u32) -> bool;
}

/// Parses one function body's expression bytes into linearized [`Code`].
///
/// `module` answers global-mutability questions for `global.set`.
/// `num_locals` is the function's declared local count (own parameters plus
/// local declarations); used only for a debug-mode bounds check on
/// `local.*` immediates. `return_type` is the function's declared result
/// type, used as the implicit outermost control frame's arity.
///
/// On success, returns the parsed [`Code`] together with the number of
/// input bytes consumed (the position just past the final `end`).
pub fn parse_expr(
    bytes: &[u8],
    module: &impl ModuleResources,
    num_locals: u32,
    return_type: ResultType,
) -> Result<(Code, usize), ParserError> {
    let mut parser = ExprParser::new(bytes, module, num_locals, return_type);
    parser.run()?;
    let consumed = parser.cursor.position();
    Ok((parser.code, consumed))
}

struct ExprParser<'a, 'm, M: ModuleResources> {
    cursor: Cursor<'a>,
    module: &'m M,
    num_locals: u32,
    code: Code,
    control_stack: Stack<ControlFrame>,
    current_stack_height: u32,
}

impl<'a, 'm, M: ModuleResources> ExprParser<'a, 'm, M> {
    fn new(bytes: &'a [u8], module: &'m M, num_locals: u32, return_type: ResultType) -> Self {
        let mut control_stack = Stack::new();
        control_stack.push(ControlFrame::new(FrameKind::Function, return_type, 0, 0));
        Self {
            cursor: Cursor::new(bytes),
            module,
            num_locals,
            code: Code::new(),
            control_stack,
            current_stack_height: 0,
        }
    }

    /// Drives the main parse loop until the implicit function frame closes.
    fn run(&mut self) -> Result<(), ParserError> {
        loop {
            let opcode = self.cursor.read_opcode()?;
            self.step(opcode)?;
            if self.control_stack.is_empty() {
                return Ok(());
            }
        }
    }

    fn top_unreachable(&self) -> bool {
        self.control_stack.top().unreachable
    }

    /// Applies `metrics`'s height delta, asserting it cannot underflow: the
    /// caller is expected to have already checked `min_stack_inputs`.
    fn apply_height_delta(&mut self, delta: i8) {
        let height = i64::from(self.current_stack_height) + i64::from(delta);
        debug_assert!(height >= 0, "stack height underflowed past the checked minimum");
        self.current_stack_height = height as u32;
        if self.current_stack_height > self.code.max_stack_height {
            self.code.max_stack_height = self.current_stack_height;
        }
    }

    fn step(&mut self, opcode: u8) -> Result<(), ParserError> {
        let metrics = metrics_for(opcode);
        if !metrics.is_valid() {
            return Err(ParserError::invalid_instruction(opcode));
        }

        let unreachable = self.top_unreachable();
        if !unreachable && self.current_stack_height < u32::from(metrics.min_stack_inputs) {
            return Err(ParserError::stack_underflow(
                metrics.min_stack_inputs,
                self.current_stack_height,
            ));
        }

        match opcode {
            opcode::BLOCK | opcode::LOOP | opcode::IF => {
                if !unreachable {
                    self.apply_height_delta(metrics.stack_height_change);
                }
                self.open_block_like(opcode)
            }
            opcode::ELSE => self.handle_else(),
            opcode::END => self.handle_end(),
            _ => {
                if !unreachable {
                    self.apply_height_delta(metrics.stack_height_change);
                }
                self.code.push_instr(opcode);
                self.decode_immediates(opcode)?;
                if matches!(
                    opcode,
                    opcode::BR | opcode::BR_TABLE | opcode::RETURN | opcode::UNREACHABLE
                ) {
                    self.control_stack.top_mut().unreachable = true;
                }
                Ok(())
            }
        }
    }

    fn open_block_like(&mut self, opcode: u8) -> Result<(), ParserError> {
        let blocktype_byte = self.cursor.read_blocktype_byte()?;
        let result_type = ResultType::from_blocktype_byte(blocktype_byte)?;
        let kind = match opcode {
            opcode::BLOCK => FrameKind::Block,
            opcode::LOOP => FrameKind::Loop,
            opcode::IF => FrameKind::If,
            _ => unreachable!("caller only dispatches block/loop/if here"),
        };

        let instr_index = self.code.next_instr_index();
        self.code.push_instr(opcode);
        let immediate_offset = self.code.next_immediate_offset();
        self.code.push_u8(result_type.arity());
        let parent_height = self.current_stack_height;
        let frame = if kind == FrameKind::Loop {
            // A backward branch to a loop re-enters at the loop's own
            // instruction; there is nothing left to back-patch.
            self.code.push_u32(instr_index);
            ControlFrame::new_loop(result_type, parent_height, instr_index)
        } else {
            // end_pc, else_pc: reserved, back-patched at `else`/`end`.
            self.code.push_u32(0);
            self.code.push_u32(0);
            ControlFrame::new(kind, result_type, parent_height, immediate_offset)
        };
        #[cfg(feature = "trace-log")]
        log::trace!(
            "open {:?} frame at instr {instr_index}, parent_height={parent_height}",
            frame.kind
        );
        self.control_stack.push(frame);
        Ok(())
    }

    fn handle_else(&mut self) -> Result<(), ParserError> {
        let is_if = matches!(self.control_stack.top().kind, FrameKind::If);
        if !is_if {
            return Err(ParserError::unexpected_else_instruction());
        }
        let (unreachable, parent_stack_height, arity, immediate_offset) = {
            let frame = self.control_stack.top();
            (frame.unreachable, frame.parent_stack_height, frame.arity(), frame.immediate_offset)
        };
        if !unreachable {
            self.check_arity(parent_stack_height, arity)?;
        }

        let else_index = self.code.next_instr_index();
        self.code.push_instr(opcode::ELSE);
        // Layout: [arity: u8][end_pc: u32][else_pc: u32], reserved in
        // `open_block_like`.
        let else_pc_offset = immediate_offset + 1 + 4;
        self.code.patch_u32(else_pc_offset, else_index);

        let top = self.control_stack.top_mut();
        top.has_else = true;
        top.unreachable = false;
        self.current_stack_height = parent_stack_height;
        #[cfg(feature = "trace-log")]
        log::trace!("else at instr {else_index}, resetting height to {parent_stack_height}");
        Ok(())
    }

    fn handle_end(&mut self) -> Result<(), ParserError> {
        let frame = self.control_stack.pop();
        if !frame.unreachable {
            self.check_arity(frame.parent_stack_height, frame.arity())?;
        }

        let end_index = self.code.next_instr_index();
        self.code.push_instr(opcode::END);

        match frame.kind {
            FrameKind::Block | FrameKind::If => {
                let end_pc_offset = frame.immediate_offset + 1;
                self.code.patch_u32(end_pc_offset, end_index);
                // `else_pc` falls back to `end_pc` whenever no `else` arm
                // patched it already -- true for every plain `block`, and
                // for an `if` that never saw an `else`.
                if !frame.has_else {
                    let else_pc_offset = frame.immediate_offset + 1 + 4;
                    self.code.patch_u32(else_pc_offset, end_index);
                }
            }
            FrameKind::Loop | FrameKind::Function => {
                // A loop's branch target is its own entry, reserved up
                // front; the function frame is never itself a branch
                // target via its own `end_pc`/`else_pc` slots (it has
                // none) -- only via `pending_branch_patches` below.
            }
        }
        for offset in &frame.pending_branch_patches {
            self.code.patch_u32(*offset, end_index);
        }

        self.current_stack_height = frame.parent_stack_height + u32::from(frame.arity());
        if self.code.max_stack_height < self.current_stack_height {
            self.code.max_stack_height = self.current_stack_height;
        }
        #[cfg(feature = "trace-log")]
        log::trace!(
            "close {:?} frame at instr {end_index}, height={}",
            frame.kind,
            self.current_stack_height
        );
        Ok(())
    }

    /// Checks that the current arm produced exactly `arity` values above
    /// `parent_height`.
    fn check_arity(&self, parent_height: u32, arity: u8) -> Result<(), ParserError> {
        let produced = self.current_stack_height - parent_height;
        if produced != u32::from(arity) {
            return Err(ParserError::type_mismatch(arity, self.current_stack_height));
        }
        Ok(())
    }

    /// Looks up the control frame `depth` levels up from the innermost
    /// (`0` = innermost), for `br`/`br_if`/`br_table` label resolution.
    fn frame_at_depth(&self, depth: u32) -> Result<&ControlFrame, ParserError> {
        self.control_stack.get(depth).ok_or_else(|| ParserError::unknown_label(depth))
    }

    /// Appends a `(arity, target_pc, target_stack_height)` branch
    /// descriptor for the frame `depth` levels up, used by `br`/`br_if`
    /// where each branch carries its own arity byte.
    fn push_branch_target(&mut self, depth: u32) -> Result<(), ParserError> {
        let arity = self.frame_at_depth(depth)?.branch_arity();
        self.code.push_u8(arity);
        self.push_branch_target_pair(depth)
    }

    /// Appends just the `(target_pc, target_stack_height)` pair for the
    /// frame `depth` levels up, with no arity byte -- used by `br_table`,
    /// whose single leading arity byte is shared across all arms. For a
    /// forward branch (anything but a loop) `target_pc` is reserved as a
    /// placeholder and back-patched when that frame's `end` is reached.
    fn push_branch_target_pair(&mut self, depth: u32) -> Result<(), ParserError> {
        let (parent_height, is_loop, loop_entry_pc) = {
            let frame = self.frame_at_depth(depth)?;
            (frame.parent_stack_height, frame.is_loop(), frame.loop_entry_pc)
        };
        let target_offset = self.code.next_immediate_offset();
        if is_loop {
            self.code.push_u32(loop_entry_pc);
        } else {
            self.code.push_u32(0);
            let frame = self
                .control_stack
                .get_mut(depth)
                .expect("depth already validated by frame_at_depth above");
            frame.pending_branch_patches.push(target_offset);
        }
        self.code.push_u32(parent_height);
        Ok(())
    }

    fn decode_u32_immediate(&mut self) -> Result<u32, ParserError> {
        let value = self.cursor.decode_unsigned(32)?;
        Ok(value as u32)
    }

    fn decode_immediates(&mut self, opcode: u8) -> Result<(), ParserError> {
        match opcode {
            opcode::BR | opcode::BR_IF => {
                let depth = self.decode_u32_immediate()?;
                self.push_branch_target(depth)
            }
            opcode::BR_TABLE => self.decode_br_table(),
            opcode::CALL => {
                let index = self.decode_u32_immediate()?;
                self.code.push_u32(index);
                Ok(())
            }
            opcode::CALL_INDIRECT => {
                let type_index = self.decode_u32_immediate()?;
                let table_idx = self.cursor.read_reserved_byte()?;
                if table_idx != 0x00 {
                    return Err(ParserError::invalid_tableidx(table_idx));
                }
                self.code.push_u32(type_index);
                Ok(())
            }
            opcode::LOCAL_GET | opcode::LOCAL_SET | opcode::LOCAL_TEE => {
                let index = self.decode_u32_immediate()?;
                debug_assert!(index < self.num_locals, "local index out of bounds");
                self.code.push_u32(index);
                Ok(())
            }
            opcode::GLOBAL_GET => {
                let index = self.decode_u32_immediate()?;
                self.code.push_u32(index);
                Ok(())
            }
            opcode::GLOBAL_SET => {
                let index = self.decode_u32_immediate()?;
                if !self.module.is_global_mutable(index) {
                    return Err(ParserError::global_is_immutable(index));
                }
                self.code.push_u32(index);
                Ok(())
            }
            opcode::MEMORY_SIZE | opcode::MEMORY_GROW => {
                let reserved = self.cursor.read_reserved_byte()?;
                if reserved != 0x00 {
                    return Err(ParserError::invalid_memidx(reserved));
                }
                Ok(())
            }
            opcode::I32_CONST => {
                let value = self.cursor.decode_signed(32)? as i32;
                self.code.push_i32(value);
                Ok(())
            }
            opcode::I64_CONST => {
                let value = self.cursor.decode_signed(64)?;
                self.code.push_i64(value);
                Ok(())
            }
            opcode::F32_CONST => {
                let bits = self.cursor.read_f32_bits()?;
                self.code.push_bytes(bits);
                Ok(())
            }
            opcode::F64_CONST => {
                let bits = self.cursor.read_f64_bits()?;
                self.code.push_bytes(bits);
                Ok(())
            }
            _ if is_memory_access(opcode) => {
                let align = self.decode_u32_immediate()?;
                let offset = self.decode_u32_immediate()?;
                self.code.push_u32(align);
                self.code.push_u32(offset);
                Ok(())
            }
            // drop, select, and the bulk of arithmetic/comparison/
            // conversion opcodes carry no immediates.
            _ => Ok(()),
        }
    }

    fn decode_br_table(&mut self) -> Result<(), ParserError> {
        let vec_len = self.decode_u32_immediate()?;
        let mut targets = alloc::vec::Vec::with_capacity(vec_len as usize + 1);
        for _ in 0..vec_len {
            targets.push(self.decode_u32_immediate()?);
        }
        let default_target = self.decode_u32_immediate()?;

        // A uniform branch arity across all arms is required for `br_table`
        // to be well-formed; the default arm's frame sets the expectation.
        // `vec_len` itself has no slot in the immediates layout -- only a
        // single leading arity byte, then a (target_pc, target_stack_height)
        // pair per arm including the default.
        let arity = self.frame_at_depth(default_target)?.branch_arity();
        self.code.push_u8(arity);
        for depth in targets {
            self.push_branch_target_pair(depth)?;
        }
        self.push_branch_target_pair(default_target)?;
        Ok(())
    }
}

fn is_memory_access(opcode: u8) -> bool {
    (opcode::LOAD_FIRST..opcode::MEMORY_SIZE).contains(&opcode)
}
