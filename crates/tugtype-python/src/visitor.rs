//! Generic AST traversal.
//!
//! The traversal order follows Python's `ast.NodeVisitor`:
//!
//! - **Pre-order**: [`Visitor::visit_node`] is called before descending into children
//! - **Post-order**: [`Visitor::leave_node`] is called after all children have been visited
//! - **Source order**: children are visited in `ast` field order
//!
//! Assignment targets get an extra pair of hooks, [`Visitor::enter_assign_target`]
//! and [`Visitor::leave_assign_target`], around each target subtree. Targets
//! are walked before the assigned value.
//!
//! # Control Flow
//!
//! - `VisitResult::Continue` - traverse into children
//! - `VisitResult::SkipChildren` - skip children but still call `leave_node`
//! - `VisitResult::Stop` - halt traversal immediately (no `leave_node` called)

use crate::ast::{Node, NodeKind};

/// What the walk does after a `visit_node` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitResult {
    Continue,
    SkipChildren,
    Stop,
}

/// Callbacks invoked by [`walk`].
pub trait Visitor {
    fn visit_node(&mut self, _node: &Node) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_node(&mut self, _node: &Node) {}

    /// Called before walking one target of an `Assign`.
    fn enter_assign_target(&mut self, _assign: &Node, _target: &Node) {}

    /// Called after walking one target of an `Assign`.
    fn leave_assign_target(&mut self, _assign: &Node, _target: &Node) {}
}

/// Walk `node` and its subtree.
pub fn walk<V: Visitor>(visitor: &mut V, node: &Node) -> VisitResult {
    match visitor.visit_node(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if walk_children(visitor, node) == VisitResult::Stop {
                return VisitResult::Stop;
            }
        }
    }
    visitor.leave_node(node);
    VisitResult::Continue
}

fn walk_children<V: Visitor>(visitor: &mut V, node: &Node) -> VisitResult {
    if let NodeKind::Assign { targets, value } = &node.kind {
        for target in targets {
            visitor.enter_assign_target(node, target);
            let result = walk(visitor, target);
            if result == VisitResult::Stop {
                return VisitResult::Stop;
            }
            visitor.leave_assign_target(node, target);
        }
        return walk(visitor, value);
    }

    for child in node.children() {
        if walk(visitor, child) == VisitResult::Stop {
            return VisitResult::Stop;
        }
    }
    VisitResult::Continue
}

// ============================================================================
// Last line
// ============================================================================

struct LastLineVisitor {
    line: u32,
}

impl Visitor for LastLineVisitor {
    fn visit_node(&mut self, node: &Node) -> VisitResult {
        self.line = self.line.max(node.line);
        VisitResult::Continue
    }
}

/// The largest line number of any node in the subtree of `node`.
pub fn last_line(node: &Node) -> u32 {
    let mut visitor = LastLineVisitor { line: node.line };
    walk(&mut visitor, node);
    visitor.line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprContext;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        stop_at: Option<&'static str>,
    }

    impl Visitor for Recorder {
        fn visit_node(&mut self, node: &Node) -> VisitResult {
            let label = match &node.kind {
                NodeKind::Name { id, .. } => id.clone(),
                other => other.name().to_string(),
            };
            self.events.push(format!("visit {}", label));
            if self.stop_at == Some(node.kind.name()) {
                return VisitResult::Stop;
            }
            if matches!(node.kind, NodeKind::Lambda { .. }) {
                return VisitResult::SkipChildren;
            }
            VisitResult::Continue
        }

        fn leave_node(&mut self, node: &Node) {
            self.events.push(format!("leave {}", node.kind.name()));
        }

        fn enter_assign_target(&mut self, _assign: &Node, _target: &Node) {
            self.events.push("enter target".to_string());
        }

        fn leave_assign_target(&mut self, _assign: &Node, _target: &Node) {
            self.events.push("leave target".to_string());
        }
    }

    fn assign_x_eq_y() -> Node {
        Node::assign(
            vec![Node::store("x", 1, 0)],
            Node::load("y", 1, 4),
            1,
            0,
        )
    }

    #[test]
    fn targets_are_bracketed_by_hooks() {
        let mut rec = Recorder::default();
        walk(&mut rec, &assign_x_eq_y());
        assert_eq!(
            rec.events,
            vec![
                "visit Assign",
                "enter target",
                "visit x",
                "leave Name",
                "leave target",
                "visit y",
                "leave Name",
                "leave Assign",
            ]
        );
    }

    #[test]
    fn skip_children_still_leaves() {
        let lam = Node::lambda(vec![], Node::load("z", 1, 10), 1, 0);
        let mut rec = Recorder::default();
        walk(&mut rec, &lam);
        assert_eq!(rec.events, vec!["visit Lambda", "leave Lambda"]);
    }

    #[test]
    fn stop_halts_without_leave() {
        let module = Node::module(vec![Node::expr(Node::call(
            Node::load("f", 1, 0),
            vec![],
            1,
            0,
        ))]);
        let mut rec = Recorder {
            stop_at: Some("Call"),
            ..Default::default()
        };
        assert_eq!(walk(&mut rec, &module), VisitResult::Stop);
        assert_eq!(rec.events.last().map(String::as_str), Some("visit Call"));
        assert!(!rec.events.iter().any(|e| e.starts_with("leave")));
    }

    #[test]
    fn last_line_is_subtree_max() {
        // (1 +
        //  2)
        let value = Node::bin_op(Node::constant(1, 1, 5), "+", Node::constant(2, 2, 5), 1, 5);
        assert_eq!(last_line(&value), 2);
        let sub = Node::subscript(
            Node::load("c", 1, 0),
            Node::load("i", 1, 2),
            ExprContext::Store,
            1,
            0,
        );
        assert_eq!(last_line(&sub), 1);
    }
}
