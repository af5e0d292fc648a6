//! Structural type values.
//!
//! `TypeNode` is the value handed to us by the inference engine for each
//! type-data fragment of a trace, and by the index for each resolved
//! definition. Beyond equality, printing and union it stays opaque: no
//! unification or simplification happens here.
//!
//! `TypeSlot` is the tri-state type used for function parameters, where a
//! call-site observation must win over a later static declaration.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Printed name of the universal type in call-graph output.
pub const ANY_TYPE_NAME: &str = "typing.Any";

/// Marker the inference engine puts in the names of unsolved types.
const UNKNOWN_MARKER: &str = "~unknown";

// ============================================================================
// TypeNode
// ============================================================================

/// A structural type.
///
/// # Examples
///
/// ```
/// use tugtype_core::TypeNode;
///
/// // Python: Union[int, str]
/// let t = TypeNode::join([TypeNode::named("int"), TypeNode::named("str")]);
/// assert_eq!(t.to_string(), "Union[int, str]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeNode {
    /// A named type (class or builtin), optionally parameterized.
    Named {
        /// The fully-qualified type name.
        name: String,
        /// Generic type arguments, if any.
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        args: Vec<TypeNode>,
    },
    /// A union of types.
    Union {
        /// The member types.
        members: Vec<TypeNode>,
    },
    /// A callable type.
    Callable {
        /// Parameter types.
        params: Vec<TypeNode>,
        /// Return type.
        returns: Box<TypeNode>,
    },
    /// A tuple type.
    Tuple {
        /// Element types.
        elements: Vec<TypeNode>,
    },
    /// The universal type.
    Any,
    /// The empty type (a union with no members).
    Nothing,
    /// A type the inference engine could not solve.
    Unknown,
}

impl TypeNode {
    /// Create a named type without arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeNode::Named {
            name: name.into(),
            args: vec![],
        }
    }

    /// Create a named type with arguments.
    pub fn named_with_args(name: impl Into<String>, args: Vec<TypeNode>) -> Self {
        TypeNode::Named {
            name: name.into(),
            args,
        }
    }

    /// Create a callable type.
    pub fn callable(params: Vec<TypeNode>, returns: TypeNode) -> Self {
        TypeNode::Callable {
            params,
            returns: Box::new(returns),
        }
    }

    /// Create a tuple type.
    pub fn tuple(elements: Vec<TypeNode>) -> Self {
        TypeNode::Tuple { elements }
    }

    /// Union a list of types.
    ///
    /// Nested unions are flattened and duplicates dropped (first occurrence
    /// wins). `Any` absorbs everything. No members gives `Nothing`; a single
    /// member is returned as-is.
    pub fn join(types: impl IntoIterator<Item = TypeNode>) -> Self {
        let mut members: Vec<TypeNode> = Vec::new();
        let mut stack: Vec<TypeNode> = types.into_iter().collect();
        stack.reverse();
        while let Some(t) = stack.pop() {
            match t {
                TypeNode::Any => return TypeNode::Any,
                TypeNode::Nothing => {}
                TypeNode::Union { members: inner } => {
                    stack.extend(inner.into_iter().rev());
                }
                other => {
                    if !members.contains(&other) {
                        members.push(other);
                    }
                }
            }
        }
        match members.len() {
            0 => TypeNode::Nothing,
            1 => members.pop().unwrap_or(TypeNode::Nothing),
            _ => TypeNode::Union { members },
        }
    }

    /// True for types that carry no information: `Nothing`, `Unknown`, and
    /// names produced for unsolved types.
    pub fn is_placeholder(&self) -> bool {
        match self {
            TypeNode::Nothing | TypeNode::Unknown => true,
            TypeNode::Named { name, .. } => name.contains(UNKNOWN_MARKER),
            _ => false,
        }
    }

    /// True for the universal type.
    pub fn is_any(&self) -> bool {
        matches!(self, TypeNode::Any)
    }

    /// Printed name for call-graph output.
    ///
    /// Top-level `Any` prints fully qualified, union members are unwrapped
    /// recursively, and anything mentioning an unsolved type collapses to
    /// `typing.Any`.
    pub fn type_name(&self) -> String {
        let name = match self {
            TypeNode::Named { name, args } if args.is_empty() => name.clone(),
            TypeNode::Union { members } => {
                let inner: Vec<String> = members.iter().map(TypeNode::type_name).collect();
                format!("Union[{}]", inner.join(", "))
            }
            TypeNode::Any | TypeNode::Unknown => ANY_TYPE_NAME.to_string(),
            other => other.to_string(),
        };
        unknown_to_any(name)
    }
}

/// Collapse any printed type mentioning an unsolved type to `typing.Any`.
pub fn unknown_to_any(type_name: String) -> String {
    if type_name.contains(UNKNOWN_MARKER) {
        ANY_TYPE_NAME.to_string()
    } else {
        type_name
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeNode]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("[")?;
                    write_list(f, args)?;
                    f.write_str("]")?;
                }
                Ok(())
            }
            TypeNode::Union { members } => {
                f.write_str("Union[")?;
                write_list(f, members)?;
                f.write_str("]")
            }
            TypeNode::Callable { params, returns } => {
                f.write_str("Callable[[")?;
                write_list(f, params)?;
                write!(f, "], {}]", returns)
            }
            TypeNode::Tuple { elements } => {
                if elements.is_empty() {
                    return f.write_str("Tuple[()]");
                }
                f.write_str("Tuple[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            TypeNode::Any => f.write_str("Any"),
            TypeNode::Nothing => f.write_str("nothing"),
            TypeNode::Unknown => f.write_str(UNKNOWN_MARKER),
        }
    }
}

// ============================================================================
// TypeSlot
// ============================================================================

/// Tri-state type for values whose type can be refined once.
///
/// Merge rules:
/// - `Unresolved` is always overridden.
/// - `InferredAny` is overridden only by `Concrete`.
/// - `Concrete` is never overridden.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "type", rename_all = "snake_case")]
pub enum TypeSlot {
    /// Nothing was observed.
    #[default]
    Unresolved,
    /// Only the universal type was observed.
    InferredAny,
    /// A concrete type.
    Concrete(TypeNode),
}

impl TypeSlot {
    /// Classify a type.
    pub fn from_type(ty: TypeNode) -> Self {
        if ty.is_placeholder() {
            TypeSlot::Unresolved
        } else if ty.is_any() {
            TypeSlot::InferredAny
        } else {
            TypeSlot::Concrete(ty)
        }
    }

    /// True while the slot may still be refined.
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, TypeSlot::Concrete(_))
    }

    /// The concrete type, if any.
    pub fn concrete(&self) -> Option<&TypeNode> {
        match self {
            TypeSlot::Concrete(t) => Some(t),
            _ => None,
        }
    }

    /// Merge another slot into this one following the override rules.
    ///
    /// Returns true if the slot changed.
    pub fn merge(&mut self, other: TypeSlot) -> bool {
        let replace = match (&*self, &other) {
            (TypeSlot::Concrete(_), _) => false,
            (TypeSlot::InferredAny, TypeSlot::Concrete(_)) => true,
            (TypeSlot::InferredAny, _) => false,
            (TypeSlot::Unresolved, TypeSlot::Unresolved) => false,
            (TypeSlot::Unresolved, _) => true,
        };
        if replace {
            *self = other;
        }
        replace
    }

    /// Refine the slot with a resolved type, only while it is a placeholder.
    ///
    /// Unlike [`TypeSlot::merge`], a placeholder `InferredAny` slot also
    /// accepts another `InferredAny`, which leaves it unchanged.
    pub fn refine(&mut self, ty: TypeNode) -> bool {
        if !self.is_placeholder() {
            return false;
        }
        self.merge(TypeSlot::from_type(ty))
    }

    /// Printed name for call-graph output; placeholders print as `typing.Any`.
    pub fn type_name(&self) -> String {
        match self {
            TypeSlot::Concrete(t) => t.type_name(),
            TypeSlot::Unresolved | TypeSlot::InferredAny => ANY_TYPE_NAME.to_string(),
        }
    }

    /// Serialize a slot as its printed name.
    pub fn serialize_as_name<S: Serializer>(slot: &TypeSlot, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&slot.type_name())
    }
}

impl fmt::Display for TypeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

// ============================================================================
// Tests
// ============================================================================
