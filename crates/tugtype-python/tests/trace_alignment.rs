//! End-to-end trace alignment over a small module.
//!
//! ```python
//! import os
//! x = os.path.join('a',
//!                  'b')
//! print(x.upper())
//! ```

use std::fs;

use tempfile::TempDir;
use tugtype_core::config::Config;
use tugtype_core::TypeNode;
use tugtype_python::ast::{Alias, ExprContext, Node};
use tugtype_python::traces::{Opcode, Trace, TraceAligner, TraceStore};

const SOURCE: &str = "import os\nx = os.path.join('a',\n                 'b')\nprint(x.upper())\n";

fn named(name: &str) -> TypeNode {
    TypeNode::named(name)
}

fn tr(op: Opcode, symbol: &str, types: Vec<TypeNode>) -> Trace {
    Trace::new(op, symbol, types)
}

/// Traces as a pre-3.7 interpreter records them: the store of `x` lands on
/// the last line of the assigned call.
fn store() -> TraceStore {
    let module = || named("module");
    let join = || TypeNode::callable(vec![named("str"), named("str")], named("str"));
    TraceStore::from_traces(
        SOURCE,
        [
            (1, tr(Opcode::ImportName, "os", vec![module()])),
            (1, tr(Opcode::StoreName, "os", vec![module()])),
            (2, tr(Opcode::LoadName, "os", vec![module()])),
            (2, tr(Opcode::LoadAttr, "path", vec![module(), module()])),
            (2, tr(Opcode::LoadAttr, "join", vec![module(), join()])),
            (2, tr(Opcode::LoadConst, "a", vec![named("str")])),
            (2, tr(Opcode::CallFunction, "join", vec![join(), named("str")])),
            (3, tr(Opcode::LoadConst, "b", vec![named("str")])),
            (3, tr(Opcode::StoreName, "x", vec![named("str")])),
            (
                4,
                tr(
                    Opcode::LoadName,
                    "print",
                    vec![TypeNode::callable(vec![TypeNode::Any], named("None"))],
                ),
            ),
            (4, tr(Opcode::LoadName, "x", vec![named("str")])),
            (
                4,
                tr(
                    Opcode::LoadAttr,
                    "upper",
                    vec![named("str"), TypeNode::callable(vec![], named("str"))],
                ),
            ),
            (4, tr(Opcode::CallFunction, "upper", vec![named("str")])),
            (4, tr(Opcode::CallFunction, "print", vec![named("None")])),
        ],
    )
    .with_filename("example.py")
}

fn module() -> Node {
    let os_path_join = Node::attribute(
        Node::attribute(Node::load("os", 2, 4), "path", ExprContext::Load, 2, 4),
        "join",
        ExprContext::Load,
        2,
        4,
    );
    let value = Node::call(
        os_path_join,
        vec![Node::constant("a", 2, 17), Node::constant("b", 3, 17)],
        2,
        4,
    );
    let upper = Node::call(
        Node::attribute(Node::load("x", 4, 6), "upper", ExprContext::Load, 4, 6),
        vec![],
        4,
        6,
    );
    Node::module(vec![
        Node::import(vec![Alias::new("os")], 1, 0),
        Node::assign(vec![Node::store("x", 2, 0)], value, 2, 0),
        Node::expr(Node::call(Node::load("print", 4, 0), vec![upper], 4, 0)),
    ])
}

fn load_config(text: &str) -> Config {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tugtype.toml");
    fs::write(&path, text).unwrap();
    Config::load(&path).unwrap()
}

#[test]
fn aligns_every_trace_but_the_import_store() {
    let config = load_config("[aligner]\npython_version = \"3.6\"\n");
    let store = store();
    let matches = TraceAligner::new(&store, config.aligner)
        .align(&module())
        .unwrap();
    assert_eq!(matches.len(), store.len() - 1);
    assert!(matches
        .iter()
        .all(|m| !(m.trace.op == Opcode::StoreName && m.location.line == 1)));
}

#[test]
fn annotate_places_types_at_columns() {
    let config = load_config("[aligner]\npython_version = \"3.6\"\n");
    let store = store();
    let types = TraceAligner::new(&store, config.aligner)
        .annotate(&module())
        .unwrap();

    assert_eq!(types.types_at(1, 7), vec![&named("module")]);
    assert_eq!(types.types_at(2, 0), vec![&named("str")]);
    // Call result first, then the `os` name.
    assert_eq!(types.types_at(2, 4), vec![&named("str"), &named("module")]);
    assert_eq!(types.types_at(2, 7), vec![&named("module")]);
    assert_eq!(types.get(2, 12).len(), 1);
    assert_eq!(types.types_at(2, 17), vec![&named("str")]);
    assert_eq!(types.types_at(3, 17), vec![&named("str")]);
    assert_eq!(types.get(4, 0).len(), 2);
    assert_eq!(types.types_at(4, 6), vec![&named("str"), &named("str")]);
    assert_eq!(
        types.get(4, 8)[0].ty.to_string(),
        "Callable[[], str]"
    );
}

#[test]
fn default_dialect_has_no_line_skew() {
    let config = load_config("");
    let store = store();
    let types = TraceAligner::new(&store, config.aligner)
        .annotate(&module())
        .unwrap();
    assert!(types.get(2, 0).is_empty());
}

#[test]
fn match_records_serialize() {
    let store = store();
    let matches = TraceAligner::new(&store, Config::default().aligner)
        .align(&module())
        .unwrap();
    let json = serde_json::to_value(matches[0]).unwrap();
    assert_eq!(json["location"]["line"], 1);
    assert_eq!(json["location"]["col"], 7);
    assert_eq!(json["trace"]["op"], "IMPORT_NAME");
    assert_eq!(json["trace"]["symbol"]["kind"], "str");
    assert_eq!(json["trace"]["symbol"]["value"], "os");
}

#[test]
fn display_traces_names_the_file() {
    let text = store().display_traces();
    assert!(text.starts_with("example.py\n"));
    assert!(text.contains("   4: print(x.upper())"));
    assert!(text.contains("LOAD_ATTR 'upper'"));
}
