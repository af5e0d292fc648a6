//! Per-function call graph with parameter, return and attribute types.
//!
//! [`CallGraphBuilder`] folds a [`SymbolIndex`] into one [`Function`] per
//! function definition, plus a synthetic module-level function that collects
//! top-level calls.
//!
//! Parameter types come from two sources with different precedence:
//! the union of the types observed at call sites (recorded signatures), and
//! the type the index resolved for the parameter's definition. A concrete
//! call-site type is never replaced by the static one.
//!
//! Missing lookups never fail the build; they drop the affected record and
//! leave a `debug` event.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, trace};
use tugtype_core::config::CallGraphConfig;
use tugtype_core::type_node::ANY_TYPE_NAME;
use tugtype_core::{Location, TypeNode, TypeSlot};

use crate::index::{DefKind, Definition, Funcall, RefKind, Reference, Signature, SymbolIndex};

// ============================================================================
// Output types
// ============================================================================

/// An attribute read inside a function body, e.g. `x.foo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attr {
    /// Name of the object the attribute is read from.
    pub name: String,
    /// Kind of that object's definition.
    pub node_type: DefKind,
    /// Printed type of the attribute value.
    #[serde(rename = "type")]
    pub ty: String,
    /// The attribute name.
    pub attrib: String,
    pub location: Location,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type", serialize_with = "TypeSlot::serialize_as_name")]
    pub ty: TypeSlot,
}

/// A variable passed to a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    pub name: String,
    /// Kind of the variable's definition; `None` if it could not be resolved.
    pub node_type: Option<DefKind>,
    #[serde(rename = "type")]
    pub ty: String,
}

/// An outbound call edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    pub function_id: String,
    pub args: Vec<Arg>,
    pub location: Location,
}

/// Everything collected for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub id: String,
    pub params: Vec<Param>,
    pub param_attrs: Vec<Attr>,
    pub local_attrs: Vec<Attr>,
    pub calls: Vec<Call>,
    #[serde(serialize_with = "serialize_type_name")]
    pub ret: Option<TypeNode>,
    pub location: Option<Location>,
}

impl Function {
    pub fn new(id: impl Into<String>) -> Self {
        Function {
            id: id.into(),
            params: Vec::new(),
            param_attrs: Vec::new(),
            local_attrs: Vec::new(),
            calls: Vec::new(),
            ret: None,
            location: None,
        }
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

fn serialize_type_name<S: Serializer>(ty: &Option<TypeNode>, s: S) -> Result<S::Ok, S::Error> {
    match ty {
        Some(t) => s.serialize_some(&t.type_name()),
        None => s.serialize_none(),
    }
}

/// Parameter types from the recorded call signatures of one function.
///
/// Parameters keep first-seen order. Each type is the union of every
/// observed type that is not an unsolved placeholder.
pub fn function_params(signatures: &[Signature]) -> Vec<Param> {
    let mut order: Vec<&str> = Vec::new();
    let mut observed: BTreeMap<&str, Vec<TypeNode>> = BTreeMap::new();
    for sig in signatures {
        for (name, ty) in &sig.params {
            let seen = observed.entry(name.as_str()).or_insert_with(|| {
                order.push(name.as_str());
                Vec::new()
            });
            if !ty.is_placeholder() {
                seen.push(ty.clone());
            }
        }
    }
    order
        .into_iter()
        .map(|name| {
            let types = observed.remove(name).unwrap_or_default();
            Param {
                name: name.to_string(),
                ty: TypeSlot::from_type(TypeNode::join(types)),
            }
        })
        .collect()
}

// ============================================================================
// CallGraphBuilder
// ============================================================================

/// Folds a [`SymbolIndex`] into a function-id → [`Function`] map.
#[derive(Debug)]
pub struct CallGraphBuilder<'i> {
    index: &'i SymbolIndex,
    config: CallGraphConfig,
    functions: BTreeMap<String, Function>,
}

impl<'i> CallGraphBuilder<'i> {
    /// Create one `Function` per function definition of `index`, plus the
    /// module-level function.
    pub fn new(index: &'i SymbolIndex, config: CallGraphConfig) -> Self {
        let mut functions = BTreeMap::new();
        for (id, _) in index.functions() {
            let mut function = Function::new(id.clone());
            if let Some(sigs) = index.signatures.get(id) {
                function.params = function_params(sigs);
            }
            function.ret = index.envs.get(id).and_then(|env| env.ret.clone());
            function.location = index
                .locs
                .get(id)
                .and_then(|locs| locs.last())
                .map(|l| l.location);
            functions.insert(id.clone(), function);
        }
        functions.insert(
            config.module_id.clone(),
            Function::new(config.module_id.clone()),
        );
        CallGraphBuilder {
            index,
            config,
            functions,
        }
    }

    /// Fold every link and then every call of an index.
    pub fn build(index: &'i SymbolIndex, config: CallGraphConfig) -> Self {
        let _span = tracing::debug_span!("callgraph", module = %config.module_id).entered();
        let mut builder = CallGraphBuilder::new(index, config);
        for (reference, definition) in &index.links {
            builder.add_link(reference, definition);
        }
        for call in &index.calls {
            builder.add_call(call);
        }
        debug!(
            functions = builder.functions.len(),
            links = index.links.len(),
            calls = index.calls.len(),
            "collected function map"
        );
        builder
    }

    pub fn config(&self) -> &CallGraphConfig {
        &self.config
    }

    pub fn functions(&self) -> &BTreeMap<String, Function> {
        &self.functions
    }

    pub fn function(&self, id: &str) -> Option<&Function> {
        self.functions.get(id)
    }

    pub fn finish(self) -> BTreeMap<String, Function> {
        self.functions
    }

    /// Pretty-printed JSON of the function map.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.functions)
    }

    /// Fold one reference/definition link.
    ///
    /// Attribute references become attribute accesses of the referring
    /// function; links to parameter definitions refine the parameter's type.
    pub fn add_link(&mut self, reference: &Reference, definition: &Definition) {
        if reference.kind == RefKind::Attribute {
            self.add_attr(reference, definition);
        }
        if definition.kind == DefKind::Param {
            self.add_param_def(reference, definition);
        }
    }

    fn add_attr(&mut self, reference: &Reference, definition: &Definition) {
        let Some(scope) = reference.ref_scope.as_deref() else {
            debug!(attrib = %reference.name, "attribute reference without scope");
            return;
        };
        let target = reference
            .target
            .as_deref()
            .and_then(|t| self.index.envs.get(scope)?.get(t));
        let Some(target) = target else {
            debug!(
                attrib = %reference.name,
                scope,
                target = reference.target.as_deref().unwrap_or(""),
                "attribute target escaped tracking"
            );
            return;
        };
        let attr = Attr {
            name: target.name.clone(),
            node_type: target.kind,
            ty: definition.type_name(),
            attrib: reference.name.clone(),
            location: reference.location,
        };
        let Some(function) = self.functions.get_mut(scope) else {
            debug!(scope, attrib = %attr.attrib, "attribute access outside a function");
            return;
        };
        if attr.node_type == DefKind::Param {
            function.param_attrs.push(attr);
        } else {
            function.local_attrs.push(attr);
        }
    }

    fn add_param_def(&mut self, reference: &Reference, definition: &Definition) {
        let Some(scope) = reference.ref_scope.as_deref() else {
            return;
        };
        let ty = self.index.type_of(reference);
        let Some(function) = self.functions.get_mut(scope) else {
            debug!(scope, param = %definition.name, "parameter of an unknown function");
            return;
        };
        if let Some(param) = function.params.iter_mut().find(|p| p.name == definition.name) {
            if param.ty.refine(ty) {
                trace!(function = %function.id, param = %param.name, ty = %param.ty, "refined parameter type");
            }
        }
    }

    /// Fold one call into the calling function.
    pub fn add_call(&mut self, call: &Funcall) {
        let env = self.index.envs.get(&call.scope);
        let args = call
            .args
            .iter()
            .map(|name| match env.and_then(|e| e.get(name)) {
                Some(def) => Arg {
                    name: name.clone(),
                    node_type: Some(def.kind),
                    ty: def.type_name(),
                },
                None => Arg {
                    name: name.clone(),
                    node_type: None,
                    ty: ANY_TYPE_NAME.to_string(),
                },
            })
            .collect();
        let Some(function) = self.functions.get_mut(&call.scope) else {
            debug!(scope = %call.scope, callee = %call.function_id, "call from an unknown function");
            return;
        };
        function.calls.push(Call {
            function_id: call.function_id.clone(),
            args,
            location: call.location,
        });
    }
}

/// Collect the function map of `index` with the default configuration.
pub fn collect_function_map(index: &SymbolIndex) -> BTreeMap<String, Function> {
    CallGraphBuilder::build(index, CallGraphConfig::default()).finish()
}
