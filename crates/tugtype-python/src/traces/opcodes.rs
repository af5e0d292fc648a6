//! Bytecode operation names recorded in traces.
//!
//! Only the operations the aligner dispatches on get their own variant;
//! everything else parses to [`Opcode::Other`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A bytecode operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    LoadAttr,
    StoreAttr,
    CallFunction,
    CallFunctionEx,
    CallFunctionKw,
    CallFunctionVar,
    CallFunctionVarKw,
    CallMethod,
    LoadDeref,
    LoadFast,
    LoadGlobal,
    LoadName,
    StoreDeref,
    StoreFast,
    StoreGlobal,
    StoreName,
    BinarySubscr,
    Slice0,
    Slice1,
    Slice2,
    Slice3,
    LoadConst,
    ImportName,
    LoadBuildClass,
    /// Any operation the aligner does not dispatch on.
    Other,
}

const NAMES: &[(Opcode, &str)] = &[
    (Opcode::LoadAttr, "LOAD_ATTR"),
    (Opcode::StoreAttr, "STORE_ATTR"),
    (Opcode::CallFunction, "CALL_FUNCTION"),
    (Opcode::CallFunctionEx, "CALL_FUNCTION_EX"),
    (Opcode::CallFunctionKw, "CALL_FUNCTION_KW"),
    (Opcode::CallFunctionVar, "CALL_FUNCTION_VAR"),
    (Opcode::CallFunctionVarKw, "CALL_FUNCTION_VAR_KW"),
    (Opcode::CallMethod, "CALL_METHOD"),
    (Opcode::LoadDeref, "LOAD_DEREF"),
    (Opcode::LoadFast, "LOAD_FAST"),
    (Opcode::LoadGlobal, "LOAD_GLOBAL"),
    (Opcode::LoadName, "LOAD_NAME"),
    (Opcode::StoreDeref, "STORE_DEREF"),
    (Opcode::StoreFast, "STORE_FAST"),
    (Opcode::StoreGlobal, "STORE_GLOBAL"),
    (Opcode::StoreName, "STORE_NAME"),
    (Opcode::BinarySubscr, "BINARY_SUBSCR"),
    (Opcode::Slice0, "SLICE_0"),
    (Opcode::Slice1, "SLICE_1"),
    (Opcode::Slice2, "SLICE_2"),
    (Opcode::Slice3, "SLICE_3"),
    (Opcode::LoadConst, "LOAD_CONST"),
    (Opcode::ImportName, "IMPORT_NAME"),
    (Opcode::LoadBuildClass, "LOAD_BUILD_CLASS"),
];

impl Opcode {
    /// The upper-snake operation name. `Other` prints as `OTHER`.
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, name)| *name)
            .unwrap_or("OTHER")
    }

    /// True if `self` is one of `ops`.
    pub fn is_in(self, ops: &[Opcode]) -> bool {
        ops.contains(&self)
    }
}

impl FromStr for Opcode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(op, _)| *op)
            .unwrap_or(Opcode::Other))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Opcode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Opcode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Operation categories
// ============================================================================

pub const ATTR_OPS: &[Opcode] = &[Opcode::LoadAttr, Opcode::StoreAttr];

pub const CALL_OPS: &[Opcode] = &[
    Opcode::CallFunction,
    Opcode::CallFunctionEx,
    Opcode::CallFunctionKw,
    Opcode::CallFunctionVar,
    Opcode::CallFunctionVarKw,
    Opcode::CallMethod,
];

pub const LOAD_OPS: &[Opcode] = &[
    Opcode::LoadDeref,
    Opcode::LoadFast,
    Opcode::LoadGlobal,
    Opcode::LoadName,
];

pub const STORE_OPS: &[Opcode] = &[
    Opcode::StoreDeref,
    Opcode::StoreFast,
    Opcode::StoreGlobal,
    Opcode::StoreName,
];

pub const LOAD_SUBSCR_OPS: &[Opcode] = &[
    Opcode::BinarySubscr,
    Opcode::Slice0,
    Opcode::Slice1,
    Opcode::Slice2,
    Opcode::Slice3,
];

pub const CONST_OPS: &[Opcode] = &[Opcode::LoadConst];

/// Plain `import x` binds through `IMPORT_NAME`.
pub const IMPORT_NAME_OPS: &[Opcode] = &[Opcode::ImportName];

/// Aliased and from-imports bind through `STORE_NAME`.
pub const IMPORT_STORE_OPS: &[Opcode] = &[Opcode::StoreName];

/// Dunder methods recorded as the symbol of a subscript load.
pub const LOAD_SUBSCR_METHODS: &[&str] = &["__getitem__", "__getslice__"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_names() {
        assert_eq!("LOAD_ATTR".parse::<Opcode>(), Ok(Opcode::LoadAttr));
        assert_eq!("SLICE_2".parse::<Opcode>(), Ok(Opcode::Slice2));
        assert_eq!(Opcode::CallFunctionVarKw.to_string(), "CALL_FUNCTION_VAR_KW");
    }

    #[test]
    fn unknown_names_are_other() {
        assert_eq!("ROT_TWO".parse::<Opcode>(), Ok(Opcode::Other));
        assert_eq!(Opcode::Other.as_str(), "OTHER");
    }

    #[test]
    fn categories_are_disjoint_where_expected() {
        for op in LOAD_OPS {
            assert!(!op.is_in(STORE_OPS));
        }
        assert!(Opcode::StoreName.is_in(STORE_OPS));
        assert!(Opcode::StoreName.is_in(IMPORT_STORE_OPS));
        assert!(!Opcode::LoadBuildClass.is_in(CALL_OPS));
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&Opcode::BinarySubscr).unwrap();
        assert_eq!(json, "\"BINARY_SUBSCR\"");
        let op: Opcode = serde_json::from_str("\"NOP\"").unwrap();
        assert_eq!(op, Opcode::Other);
    }
}
