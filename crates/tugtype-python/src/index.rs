//! Symbol index consumed by the call-graph builder.
//!
//! The index is produced elsewhere (by a reference/definition indexer run
//! over the traced module) and handed over as plain data. Everything here
//! is serde-serializable so producers in other processes can ship it as
//! JSON.
//!
//! Scope ids are dotted paths such as `module.Foo.bar`. A definition's id is
//! its scope id plus its name.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tugtype_core::type_node::ANY_TYPE_NAME;
use tugtype_core::{Location, TypeNode};

// ============================================================================
// Definitions and references
// ============================================================================

/// What kind of syntax introduced a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefKind {
    FunctionDef,
    ClassDef,
    /// A function parameter.
    Param,
    /// A name bound by assignment.
    Store,
    /// An attribute bound by assignment, e.g. `self.x = ...`.
    Attribute,
    Import,
    ImportFrom,
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefKind::FunctionDef => "FunctionDef",
            DefKind::ClassDef => "ClassDef",
            DefKind::Param => "Param",
            DefKind::Store => "Store",
            DefKind::Attribute => "Attribute",
            DefKind::Import => "Import",
            DefKind::ImportFrom => "ImportFrom",
        };
        f.write_str(s)
    }
}

/// What kind of syntax a reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    Name,
    Attribute,
    Import,
    ImportFrom,
}

/// A symbol definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefKind,
    pub scope: String,
    /// Type of the bound value, if the index resolved one.
    #[serde(default)]
    pub ty: Option<TypeNode>,
}

impl Definition {
    pub fn new(name: impl Into<String>, kind: DefKind, scope: impl Into<String>) -> Self {
        Definition {
            name: name.into(),
            kind,
            scope: scope.into(),
            ty: None,
        }
    }

    pub fn with_type(mut self, ty: TypeNode) -> Self {
        self.ty = Some(ty);
        self
    }

    /// `scope.name`
    pub fn id(&self) -> String {
        format!("{}.{}", self.scope, self.name)
    }

    /// Printed type, or `typing.Any` when unresolved.
    pub fn type_name(&self) -> String {
        self.ty
            .as_ref()
            .map(TypeNode::type_name)
            .unwrap_or_else(|| ANY_TYPE_NAME.to_string())
    }
}

/// One source location of a definition. Redefined names have several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefLocation {
    pub def_id: String,
    pub location: Location,
}

/// A use of a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub kind: RefKind,
    /// Scope the reference appears in.
    pub scope: String,
    /// Scope the referenced symbol lives in, when the indexer determined it.
    #[serde(default)]
    pub ref_scope: Option<String>,
    /// For attribute references, the name of the object the attribute is read from.
    #[serde(default)]
    pub target: Option<String>,
    pub location: Location,
    #[serde(default)]
    pub ty: Option<TypeNode>,
}

impl Reference {
    pub fn new(
        name: impl Into<String>,
        kind: RefKind,
        scope: impl Into<String>,
        location: Location,
    ) -> Self {
        let scope = scope.into();
        Reference {
            name: name.into(),
            kind,
            ref_scope: Some(scope.clone()),
            scope,
            target: None,
            location,
            ty: None,
        }
    }

    pub fn with_ref_scope(mut self, ref_scope: impl Into<String>) -> Self {
        self.ref_scope = Some(ref_scope.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_type(mut self, ty: TypeNode) -> Self {
        self.ty = Some(ty);
        self
    }

    /// `scope.name`
    pub fn id(&self) -> String {
        format!("{}.{}", self.scope, self.name)
    }
}

/// A call recorded by the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Funcall {
    /// Dotted name of the call target as written.
    pub name: String,
    /// Scope the call is made from.
    pub scope: String,
    /// Definition id of the callee.
    pub function_id: String,
    pub location: Location,
    /// Names of the variables passed as arguments.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub return_type: Option<TypeNode>,
}

/// Parameter types of one recorded call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<(String, TypeNode)>,
}

impl Signature {
    pub fn new<N: Into<String>>(params: impl IntoIterator<Item = (N, TypeNode)>) -> Self {
        Signature {
            params: params.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }
}

// ============================================================================
// Environments
// ============================================================================

/// The symbol table of one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Env {
    pub scope: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, Definition>,
    /// Return type, for function scopes.
    #[serde(default)]
    pub ret: Option<TypeNode>,
}

impl Env {
    pub fn new(scope: impl Into<String>) -> Self {
        Env {
            scope: scope.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_return(mut self, ret: TypeNode) -> Self {
        self.ret = Some(ret);
        self
    }

    /// Direct lookup, without consulting enclosing scopes.
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.env.get(name)
    }
}

// ============================================================================
// SymbolIndex
// ============================================================================

/// Definitions, references and calls of one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolIndex {
    #[serde(default)]
    pub envs: HashMap<String, Env>,
    #[serde(default)]
    pub defs: BTreeMap<String, Definition>,
    #[serde(default)]
    pub locs: HashMap<String, Vec<DefLocation>>,
    #[serde(default)]
    pub links: Vec<(Reference, Definition)>,
    #[serde(default)]
    pub calls: Vec<Funcall>,
    /// Recorded call signatures per function definition id.
    #[serde(default)]
    pub signatures: HashMap<String, Vec<Signature>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Register a scope. An existing scope of the same id is replaced.
    pub fn add_env(&mut self, env: Env) {
        self.envs.insert(env.scope.clone(), env);
    }

    /// Record a definition at `location` and bind it in its scope.
    ///
    /// The first definition of an id is kept in `defs`; later ones only add
    /// a location and rebind the name in the scope's environment.
    pub fn add_def(&mut self, def: Definition, location: Location) -> String {
        let id = def.id();
        self.defs.entry(id.clone()).or_insert_with(|| def.clone());
        self.locs.entry(id.clone()).or_default().push(DefLocation {
            def_id: id.clone(),
            location,
        });
        self.envs
            .entry(def.scope.clone())
            .or_insert_with(|| Env::new(def.scope.clone()))
            .env
            .insert(def.name.clone(), def);
        id
    }

    pub fn add_link(&mut self, reference: Reference, definition: Definition) {
        self.links.push((reference, definition));
    }

    pub fn add_call(&mut self, call: Funcall) {
        self.calls.push(call);
    }

    pub fn add_signature(&mut self, function_id: impl Into<String>, signature: Signature) {
        self.signatures
            .entry(function_id.into())
            .or_default()
            .push(signature);
    }

    /// Look `name` up in `scope` and then in its enclosing scopes.
    pub fn lookup(&self, scope: &str, name: &str) -> Option<(&Env, &Definition)> {
        let mut current = self.envs.get(scope);
        while let Some(env) = current {
            if let Some(def) = env.get(name) {
                return Some((env, def));
            }
            current = env.parent.as_deref().and_then(|p| self.envs.get(p));
        }
        None
    }

    /// Resolved type of a reference, `Any` when the index has none.
    pub fn type_of(&self, reference: &Reference) -> TypeNode {
        reference.ty.clone().unwrap_or(TypeNode::Any)
    }

    /// Function definitions in id order.
    pub fn functions(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.defs
            .iter()
            .filter(|(_, def)| def.kind == DefKind::FunctionDef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SymbolIndex {
        let mut index = SymbolIndex::new();
        index.add_env(Env::new("module"));
        index.add_env(Env::new("module.f").with_parent("module"));
        index.add_def(
            Definition::new("f", DefKind::FunctionDef, "module"),
            Location::new(1, 0),
        );
        index.add_def(
            Definition::new("x", DefKind::Param, "module.f"),
            Location::new(1, 6),
        );
        index
    }

    #[test]
    fn definition_ids_and_types() {
        let def = Definition::new("x", DefKind::Store, "module.f");
        assert_eq!(def.id(), "module.f.x");
        assert_eq!(def.type_name(), "typing.Any");
        let typed = def.with_type(TypeNode::named("int"));
        assert_eq!(typed.type_name(), "int");
        let unsolved = Definition::new("y", DefKind::Store, "module")
            .with_type(TypeNode::named("~unknown3"));
        assert_eq!(unsolved.type_name(), "typing.Any");
    }

    #[test]
    fn add_def_keeps_first_and_appends_locations() {
        let mut index = sample();
        let id = index.add_def(
            Definition::new("f", DefKind::FunctionDef, "module"),
            Location::new(9, 0),
        );
        assert_eq!(id, "module.f");
        assert_eq!(index.locs["module.f"].len(), 2);
        assert_eq!(index.locs["module.f"][1].location, Location::new(9, 0));
        assert_eq!(index.functions().count(), 1);
    }

    #[test]
    fn lookup_walks_parents() {
        let index = sample();
        let (env, def) = index.lookup("module.f", "f").unwrap();
        assert_eq!(env.scope, "module");
        assert_eq!(def.kind, DefKind::FunctionDef);
        assert!(index.envs["module.f"].get("f").is_none());
        assert!(index.lookup("module.f", "nope").is_none());
        assert!(index.lookup("missing", "f").is_none());
    }

    #[test]
    fn type_of_defaults_to_any() {
        let index = sample();
        let r = Reference::new("x", RefKind::Name, "module.f", Location::new(2, 4));
        assert_eq!(index.type_of(&r), TypeNode::Any);
        let r = r.with_type(TypeNode::named("str"));
        assert_eq!(index.type_of(&r), TypeNode::named("str"));
    }

    #[test]
    fn json_round_trip() {
        let index = sample();
        let text = serde_json::to_string(&index).unwrap();
        assert_eq!(SymbolIndex::from_json(&text).unwrap(), index);
        let minimal = SymbolIndex::from_json("{}").unwrap();
        assert!(minimal.defs.is_empty());
    }
}
