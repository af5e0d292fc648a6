//! Trace alignment.
//!
//! - [`opcodes`]: bytecode operation names and the categories rules match on
//! - [`store`]: per-line trace storage with the source text
//! - [`aligner`]: matching of traces to AST nodes

pub mod aligner;
pub mod opcodes;
pub mod store;

pub use aligner::{
    AlignError, AlignResult, AlignedType, AlignedTypes, MatchRecord, TraceAligner,
    TraversalContext,
};
pub use opcodes::Opcode;
pub use store::{Symbol, Trace, TraceKey, TraceStore};
