//! Line-indexed trace storage.
//!
//! A [`TraceStore`] holds the source text of one module together with the
//! traces the interpreter recorded for each line, in execution order. The
//! store is filled once by its producer and never reordered; the aligner
//! only reads from it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tugtype_core::{Location, TypeNode};

use super::opcodes::Opcode;
use crate::ast::Literal;

/// The operand of a traced operation: a name (as a string) or a constant.
pub type Symbol = Literal;

/// One recorded bytecode operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub op: Opcode,
    pub symbol: Symbol,
    /// Type-data fragments, operands first and result last.
    #[serde(default)]
    pub types: Vec<TypeNode>,
}

impl Trace {
    pub fn new(op: Opcode, symbol: impl Into<Symbol>, types: Vec<TypeNode>) -> Self {
        Trace {
            op,
            symbol: symbol.into(),
            types,
        }
    }

    /// The operation's result type: the last fragment, or `Any` if none.
    pub fn result_type(&self) -> TypeNode {
        self.types.last().cloned().unwrap_or(TypeNode::Any)
    }
}

/// Position of a trace in the store: its line and its index on that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TraceKey {
    pub line: u32,
    pub index: usize,
}

impl TraceKey {
    pub fn new(line: u32, index: usize) -> Self {
        TraceKey { line, index }
    }
}

/// Source text plus per-line traces.
#[derive(Debug, Clone, Default)]
pub struct TraceStore {
    filename: Option<String>,
    lines: Vec<String>,
    traces: BTreeMap<u32, Vec<Trace>>,
}

impl TraceStore {
    pub fn new(source: &str) -> Self {
        TraceStore {
            filename: None,
            lines: source.lines().map(str::to_string).collect(),
            traces: BTreeMap::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Build a store from `(line, trace)` pairs given in execution order.
    pub fn from_traces(source: &str, traces: impl IntoIterator<Item = (u32, Trace)>) -> Self {
        let mut store = TraceStore::new(source);
        for (line, trace) in traces {
            store.push(line, trace);
        }
        store
    }

    /// Append a trace to a line.
    pub fn push(&mut self, line: u32, trace: Trace) {
        self.traces.entry(line).or_default().push(trace);
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Traces recorded on `line`, in execution order.
    pub fn traces(&self, line: u32) -> &[Trace] {
        self.traces.get(&line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, key: TraceKey) -> Option<&Trace> {
        self.traces(key.line).get(key.index)
    }

    /// Raw text of a 1-based line.
    pub fn line(&self, n: u32) -> Option<&str> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    /// Total number of traces.
    pub fn len(&self) -> usize {
        self.traces.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Location of the attribute `name` accessed by the node at `loc`.
    ///
    /// Searches the node's line from its column for `.` followed by optional
    /// whitespace and the whole word `name`, and returns the position of
    /// `name`. Falls back to `loc`.
    pub fn attr_location(&self, name: &str, loc: Location) -> Location {
        let Some(text) = self.line(loc.line) else {
            return loc;
        };
        let Ok(pattern) = Regex::new(&format!(r"\.\s*{}\b", regex::escape(name))) else {
            return loc;
        };
        let start = loc.col as usize;
        let Some(rest) = text.get(start..) else {
            return loc;
        };
        match pattern.find(rest) {
            Some(m) => loc.with_col((start + m.end() - name.len()) as u32),
            None => loc,
        }
    }

    /// Column of an imported name on `line`.
    ///
    /// Looks for `" " + name`, then `"," + name`, and returns the position
    /// just past the separator. This is a textual heuristic: a name that also
    /// appears earlier on the line (`from os import os`) resolves to the first
    /// occurrence.
    pub fn import_name_col(&self, line: u32, name: &str) -> Option<u32> {
        let text = self.line(line)?;
        let hit = text
            .find(&format!(" {}", name))
            .or_else(|| text.find(&format!(",{}", name)))?;
        Some(hit as u32 + 1)
    }

    /// Location of an imported name, falling back to the statement location.
    pub fn import_name_location(&self, name: &str, stmt: Location) -> Location {
        self.import_name_col(stmt.line, name)
            .map(|col| stmt.with_col(col))
            .unwrap_or(stmt)
    }

    /// Debug rendering of every line that carries traces.
    pub fn display_traces(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.filename {
            let _ = writeln!(out, "{}", name);
        }
        for (line, traces) in &self.traces {
            let text = self.line(*line).unwrap_or("");
            let _ = writeln!(out, "{:>4}: {}", line, text);
            for trace in traces {
                let types: Vec<String> = trace.types.iter().map(ToString::to_string).collect();
                let _ = writeln!(
                    out,
                    "      {} {} -> [{}]",
                    trace.op,
                    trace.symbol,
                    types.join(", ")
                );
            }
        }
        out
    }
}
