#![cfg_attr(not(feature = "std"), no_std)]
#![warn(
    clippy::cast_lossless,
    clippy::missing_errors_doc,
    clippy::used_underscore_binding,
    clippy::redundant_closure_for_method_calls,
    clippy::type_repetition_in_bounds,
    clippy::inconsistent_struct_constructor,
    clippy::default_trait_access,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
//! A single-pass parser and runtime operand stack for a stack-based,
//! WebAssembly-MVP-shaped instruction set.
//!
//! [`parse_expr`] turns one function body's raw bytes into a flat
//! [`Code`] (an opcode sequence plus a side buffer of fixed-width
//! immediates) that an execution engine can walk without ever re-parsing
//! structured control flow: `block`/`loop`/`if` nesting is linearized into
//! branch offsets during parsing, and the peak operand-stack depth is
//! computed once and recorded on the [`Code`] itself.
//!
//! [`OperandStack`] is the runtime counterpart: a locals-plus-operands
//! buffer an engine allocates per call using the `max_stack_height` a
//! [`Code`] already carries, sized inline for the common case.
//!
//! This crate does not itself decode whole Wasm modules, validate types
//! beyond operand-stack arity, or execute anything; it is the parsing and
//! storage core an interpreter is built around.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

mod code;
mod error;
mod leb128;
mod metrics;
mod parser;
mod stack;

pub use crate::code::{Code, ResultType};
pub use crate::error::{ParserError, ParserErrorKind};
pub use crate::metrics::{metrics_for, opcode, InstrMetrics};
pub use crate::parser::{parse_expr, ModuleResources};
pub use crate::stack::OperandStack;
