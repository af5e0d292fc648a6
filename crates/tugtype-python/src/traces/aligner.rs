//! Alignment of recorded traces with AST nodes.
//!
//! The interpreter records traces per line, without columns. The aligner
//! walks the AST in source order and, for each node kind that has a rule,
//! claims the traces on the node's line whose operation and symbol fit the
//! node. Every trace is claimed at most once per traversal, so two
//! `x.real` accesses on one line pick up two different `LOAD_ATTR` traces.
//!
//! All traversal state lives in a [`TraversalContext`]; a [`TraceAligner`]
//! itself is immutable and can serve any number of traversals.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, trace, warn};
use tugtype_core::config::AlignerConfig;
use tugtype_core::{Location, TypeNode};

use super::opcodes::{
    Opcode, ATTR_OPS, CALL_OPS, CONST_OPS, IMPORT_NAME_OPS, IMPORT_STORE_OPS, LOAD_OPS,
    LOAD_SUBSCR_METHODS, LOAD_SUBSCR_OPS, STORE_OPS,
};
use super::store::{Symbol, Trace, TraceKey, TraceStore};
use crate::ast::{Alias, ExprContext, Literal, Node, NodeKind};
use crate::visitor::{last_line, walk, VisitResult, Visitor};

// ============================================================================
// Error Types
// ============================================================================

/// Errors during trace alignment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    /// A node kind reached the matcher without an alignment rule.
    #[error("no alignment rule for {kind} node at {location}")]
    Coverage {
        kind: &'static str,
        location: Location,
    },
}

/// Result type for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

// ============================================================================
// Match output
// ============================================================================

/// A trace matched to a source location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchRecord<'s> {
    pub location: Location,
    pub key: TraceKey,
    pub trace: &'s Trace,
}

/// A matched trace and the type of its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedType<'s> {
    pub trace: &'s Trace,
    pub ty: TypeNode,
}

/// Matched traces grouped by source location.
#[derive(Debug, Clone, Default)]
pub struct AlignedTypes<'s> {
    by_location: BTreeMap<Location, Vec<AlignedType<'s>>>,
}

impl<'s> AlignedTypes<'s> {
    pub fn from_matches(matches: impl IntoIterator<Item = MatchRecord<'s>>) -> Self {
        let mut by_location: BTreeMap<Location, Vec<AlignedType<'s>>> = BTreeMap::new();
        for m in matches {
            by_location.entry(m.location).or_default().push(AlignedType {
                trace: m.trace,
                ty: m.trace.result_type(),
            });
        }
        AlignedTypes { by_location }
    }

    /// Entries at an exact `(line, col)`.
    pub fn get(&self, line: u32, col: u32) -> &[AlignedType<'s>] {
        self.at(Location::new(line, col))
    }

    pub fn at(&self, location: Location) -> &[AlignedType<'s>] {
        self.by_location
            .get(&location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Result types at an exact `(line, col)`.
    pub fn types_at(&self, line: u32, col: u32) -> Vec<&TypeNode> {
        self.get(line, col).iter().map(|a| &a.ty).collect()
    }

    /// Entries in location order.
    pub fn iter(&self) -> impl Iterator<Item = (&Location, &[AlignedType<'s>])> {
        self.by_location.iter().map(|(loc, v)| (loc, v.as_slice()))
    }

    /// Number of distinct locations.
    pub fn len(&self) -> usize {
        self.by_location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_location.is_empty()
    }
}

// ============================================================================
// Traversal context
// ============================================================================

/// Mutable state of one traversal.
#[derive(Debug, Default)]
pub struct TraversalContext {
    consumed: HashSet<TraceKey>,
    /// Last line of the value of the enclosing `Assign`, when line skew applies.
    assign_end_line: Option<u32>,
    in_assign_target: bool,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consumed(&self, key: TraceKey) -> bool {
        self.consumed.contains(&key)
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    fn name_line(&self, line: u32) -> u32 {
        if self.in_assign_target {
            self.assign_end_line.unwrap_or(line)
        } else {
            line
        }
    }
}

// ============================================================================
// Trace aligner
// ============================================================================

/// Matches the traces of one [`TraceStore`] against an AST.
#[derive(Debug, Clone)]
pub struct TraceAligner<'s> {
    store: &'s TraceStore,
    config: AlignerConfig,
}

impl<'s> TraceAligner<'s> {
    pub fn new(store: &'s TraceStore, config: AlignerConfig) -> Self {
        TraceAligner { store, config }
    }

    pub fn store(&self) -> &'s TraceStore {
        self.store
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Claim traces on `line` whose op is in `ops` and whose symbol equals
    /// one of `symbols`.
    ///
    /// Traces are scanned in recorded order and skipped if already consumed.
    /// Each hit is marked consumed before the next one is looked for. At most
    /// `limit` traces are returned; `None` means no limit.
    pub fn find_traces(
        &self,
        ctx: &mut TraversalContext,
        line: u32,
        ops: &[Opcode],
        symbols: &[Symbol],
        limit: Option<usize>,
    ) -> Vec<(TraceKey, &'s Trace)> {
        let mut found = Vec::new();
        for (index, tr) in self.store.traces(line).iter().enumerate() {
            if limit.is_some_and(|n| found.len() >= n) {
                break;
            }
            let key = TraceKey::new(line, index);
            if ctx.is_consumed(key) || !tr.op.is_in(ops) || !symbols.contains(&tr.symbol) {
                continue;
            }
            ctx.consumed.insert(key);
            trace!(line, index, op = %tr.op, symbol = %tr.symbol, "consumed trace");
            found.push((key, tr));
        }
        found
    }

    /// Match a single node.
    ///
    /// Returns [`AlignError::Coverage`] for node kinds without a rule.
    pub fn match_node(
        &self,
        ctx: &mut TraversalContext,
        node: &Node,
    ) -> AlignResult<Vec<MatchRecord<'s>>> {
        match &node.kind {
            NodeKind::Attribute { attr, .. } => Ok(self.match_attribute(ctx, node, attr)),
            NodeKind::Call { .. } => Ok(self.match_call(ctx, node)),
            NodeKind::Constant { value } => Ok(self.match_constant(ctx, node, value)),
            NodeKind::Name { id, ctx: expr_ctx } => Ok(self.match_name(ctx, node, id, *expr_ctx)),
            NodeKind::Subscript { .. } => Ok(self.match_subscript(ctx, node)),
            NodeKind::Import { names } => Ok(self.match_import(ctx, node, names, false)),
            NodeKind::ImportFrom { names, .. } => Ok(self.match_import(ctx, node, names, true)),
            NodeKind::Module { .. }
            | NodeKind::FunctionDef { .. }
            | NodeKind::ClassDef { .. }
            | NodeKind::Return { .. }
            | NodeKind::Assign { .. }
            | NodeKind::AugAssign { .. }
            | NodeKind::Expr { .. }
            | NodeKind::If { .. }
            | NodeKind::For { .. }
            | NodeKind::While { .. }
            | NodeKind::Global { .. }
            | NodeKind::Pass
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::BinOp { .. }
            | NodeKind::BoolOp { .. }
            | NodeKind::UnaryOp { .. }
            | NodeKind::Compare { .. }
            | NodeKind::IfExp { .. }
            | NodeKind::Lambda { .. }
            | NodeKind::Tuple { .. }
            | NodeKind::List { .. }
            | NodeKind::Dict { .. }
            | NodeKind::Slice { .. }
            | NodeKind::Starred { .. }
            | NodeKind::Arg { .. } => {
                let err = AlignError::Coverage {
                    kind: node.kind.name(),
                    location: node.location(),
                };
                warn!(kind = node.kind.name(), location = %node.location(), "no alignment rule");
                Err(err)
            }
        }
    }

    /// Match every node of `module` with a fresh traversal context.
    pub fn align(&self, module: &Node) -> AlignResult<Vec<MatchRecord<'s>>> {
        let _span = tracing::debug_span!(
            "align",
            file = self.store.filename().unwrap_or("<source>")
        )
        .entered();

        let mut visitor = AlignVisitor {
            aligner: self,
            ctx: TraversalContext::new(),
            matches: Vec::new(),
            error: None,
        };
        walk(&mut visitor, module);
        if let Some(err) = visitor.error {
            return Err(err);
        }

        debug!(
            matches = visitor.matches.len(),
            consumed = visitor.ctx.consumed_count(),
            traces = self.store.len(),
            "aligned traces"
        );
        Ok(visitor.matches)
    }

    /// Align `module` and group the result types by location.
    pub fn annotate(&self, module: &Node) -> AlignResult<AlignedTypes<'s>> {
        Ok(AlignedTypes::from_matches(self.align(module)?))
    }

    // ------------------------------------------------------------------------
    // Per-kind rules
    // ------------------------------------------------------------------------

    fn match_attribute(
        &self,
        ctx: &mut TraversalContext,
        node: &Node,
        attr: &str,
    ) -> Vec<MatchRecord<'s>> {
        let location = self.store.attr_location(attr, node.location());
        let found = self.find_traces(ctx, node.line, ATTR_OPS, &[Symbol::from(attr)], Some(1));
        records(location, found)
    }

    fn match_call(&self, ctx: &mut TraversalContext, node: &Node) -> Vec<MatchRecord<'s>> {
        let full = node_name(node);
        let name = full.rsplit('.').next().unwrap_or(&full);
        let found = self.find_traces(ctx, node.line, CALL_OPS, &[Symbol::from(name)], Some(1));
        records(node.location(), found)
    }

    fn match_constant(
        &self,
        ctx: &mut TraversalContext,
        node: &Node,
        value: &Literal,
    ) -> Vec<MatchRecord<'s>> {
        let found = self.find_traces(ctx, node.line, CONST_OPS, &[value.clone()], Some(1));
        for (_, tr) in &found {
            if tr.symbol.kind() != value.kind() {
                warn!(
                    location = %node.location(),
                    literal = %value,
                    symbol = %tr.symbol,
                    "constant matched a trace of a different literal kind"
                );
            }
        }
        records(node.location(), found)
    }

    fn match_name(
        &self,
        ctx: &mut TraversalContext,
        node: &Node,
        id: &str,
        expr_ctx: ExprContext,
    ) -> Vec<MatchRecord<'s>> {
        let ops = match expr_ctx {
            ExprContext::Load => LOAD_OPS,
            ExprContext::Store => STORE_OPS,
            ExprContext::Del | ExprContext::Param => return Vec::new(),
        };
        let line = ctx.name_line(node.line);
        let found = self.find_traces(ctx, line, ops, &[Symbol::from(id)], Some(1));
        records(node.location(), found)
    }

    fn match_subscript(&self, ctx: &mut TraversalContext, node: &Node) -> Vec<MatchRecord<'s>> {
        let methods: Vec<Symbol> = LOAD_SUBSCR_METHODS.iter().map(|m| Symbol::from(*m)).collect();
        let found = self.find_traces(ctx, node.line, LOAD_SUBSCR_OPS, &methods, Some(1));
        records(node.location(), found)
    }

    fn match_import(
        &self,
        ctx: &mut TraversalContext,
        node: &Node,
        names: &[Alias],
        is_from: bool,
    ) -> Vec<MatchRecord<'s>> {
        let mut out = Vec::new();
        for alias in names {
            let name = alias.bound_name();
            let ops = if alias.asname.is_some() || is_from {
                IMPORT_STORE_OPS
            } else {
                IMPORT_NAME_OPS
            };
            let found = self.find_traces(ctx, node.line, ops, &[Symbol::from(name)], Some(1));
            let location = self.store.import_name_location(name, node.location());
            out.extend(records(location, found));
        }
        out
    }

    fn enter_assign(&self, ctx: &mut TraversalContext, value: &Node) {
        if self.config.has_assign_line_skew() {
            ctx.assign_end_line = Some(last_line(value));
        }
    }
}

fn records<'s>(location: Location, found: Vec<(TraceKey, &'s Trace)>) -> Vec<MatchRecord<'s>> {
    found
        .into_iter()
        .map(|(key, trace)| MatchRecord {
            location,
            key,
            trace,
        })
        .collect()
}

/// Dotted name of a call target, e.g. `Foo.f` for `Foo.f(1)`.
fn node_name(node: &Node) -> String {
    match &node.kind {
        NodeKind::Attribute { value, attr, .. } => format!("{}.{}", node_name(value), attr),
        NodeKind::Call { func, .. } => node_name(func),
        NodeKind::Lambda { .. } => "<lambda>".to_string(),
        NodeKind::Name { id, .. } => id.clone(),
        other => other.name().to_string(),
    }
}

// ============================================================================
// Traversal
// ============================================================================

struct AlignVisitor<'a, 's> {
    aligner: &'a TraceAligner<'s>,
    ctx: TraversalContext,
    matches: Vec<MatchRecord<'s>>,
    error: Option<AlignError>,
}

impl Visitor for AlignVisitor<'_, '_> {
    fn visit_node(&mut self, node: &Node) -> VisitResult {
        if let NodeKind::Assign { value, .. } = &node.kind {
            self.aligner.enter_assign(&mut self.ctx, value);
        }
        if !node.kind.has_match_rule() {
            return VisitResult::Continue;
        }
        match self.aligner.match_node(&mut self.ctx, node) {
            Ok(found) => {
                self.matches.extend(found);
                VisitResult::Continue
            }
            Err(err) => {
                self.error = Some(err);
                VisitResult::Stop
            }
        }
    }

    fn leave_node(&mut self, node: &Node) {
        if matches!(node.kind, NodeKind::Assign { .. }) {
            self.ctx.assign_end_line = None;
        }
    }

    fn enter_assign_target(&mut self, _assign: &Node, _target: &Node) {
        self.ctx.in_assign_target = true;
    }

    fn leave_assign_target(&mut self, _assign: &Node, _target: &Node) {
        self.ctx.in_assign_target = false;
    }
}

// ============================================================================
// Tests
// ============================================================================
