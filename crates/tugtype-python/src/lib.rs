//! Python support for tugtype.
//!
//! This crate provides:
//! - An AST data model and a generic visitor
//! - Trace alignment: matching per-line bytecode traces to AST locations
//! - A symbol index interface and a call-graph builder over it
//!
//! # Example
//!
//! ```
//! use tugtype_core::config::AlignerConfig;
//! use tugtype_core::TypeNode;
//! use tugtype_python::ast::Node;
//! use tugtype_python::traces::{Opcode, Trace, TraceAligner, TraceStore};
//!
//! let store = TraceStore::from_traces(
//!     "x = 42\n",
//!     [(1, Trace::new(Opcode::StoreName, "x", vec![TypeNode::named("int")]))],
//! );
//! let module = Node::module(vec![Node::assign(
//!     vec![Node::store("x", 1, 0)],
//!     Node::constant(42, 1, 4),
//!     1,
//!     0,
//! )]);
//!
//! let types = TraceAligner::new(&store, AlignerConfig::default())
//!     .annotate(&module)
//!     .unwrap();
//! assert_eq!(types.types_at(1, 0), vec![&TypeNode::named("int")]);
//! ```

pub mod ast;
pub mod callgraph;
pub mod index;
pub mod traces;
pub mod visitor;

pub use callgraph::{collect_function_map, CallGraphBuilder, Function};
pub use index::SymbolIndex;
pub use traces::{AlignError, AlignResult, AlignedTypes, TraceAligner, TraceStore};
