//! IR [`Value`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::TempId;
use crate::types::Type;

/// An IR operand or destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    ConstInt { value: i64, ty: Type },
    ConstFloat { value: f64, ty: Type },
    /// SSA-style temporary, typed so the verifier can check it without a
    /// second lookup.
    Temp { id: TempId, ty: Type },
    /// A named local (an `alloca` slot's address, or the value loaded from
    /// one, depending on instruction context).
    Local { name: String, ty: Type },
    /// A module-level global: string literal or global variable.
    Global { name: String, ty: Type },
    /// A basic-block label, used as a branch operand.
    Label { name: String },
    /// A class name used where the IR needs to name a type (e.g. `sizeof`).
    TypeRef { class_name: String },
}

impl Value {
    /// The operand's `Type`, where one applies (labels and type references
    /// do not carry a `Type` of their own).
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Value::ConstInt { ty, .. }
            | Value::ConstFloat { ty, .. }
            | Value::Temp { ty, .. }
            | Value::Local { ty, .. }
            | Value::Global { ty, .. } => Some(ty),
            Value::Label { .. } | Value::TypeRef { .. } => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::ConstInt { .. } | Value::ConstFloat { .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt { value, .. } => write!(f, "{value}"),
            Value::ConstFloat { value, .. } => write!(f, "{value}"),
            Value::Temp { id, .. } => write!(f, "{id}"),
            Value::Local { name, .. } => write!(f, "%{name}"),
            Value::Global { name, .. } => write!(f, "@{name}"),
            Value::Label { name } => write!(f, "label {name}"),
            Value::TypeRef { class_name } => write!(f, "{class_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_textual_emitter_contract() {
        assert_eq!(format!("{}", Value::Temp { id: TempId(2), ty: Type::int() }), "%t2");
        assert_eq!(
            format!("{}", Value::Global { name: "str0".into(), ty: Type::string() }),
            "@str0"
        );
        assert_eq!(format!("{}", Value::Label { name: "merge".into() }), "label merge");
        assert_eq!(format!("{}", Value::ConstInt { value: 42, ty: Type::int() }), "42");
    }

    #[test]
    fn ty_returns_none_for_label_and_type_ref() {
        assert!(Value::Label { name: "end".into() }.ty().is_none());
        assert!(Value::TypeRef { class_name: "Animal".into() }.ty().is_none());
    }

    #[test]
    fn is_constant_only_for_const_variants() {
        assert!(Value::ConstInt { value: 1, ty: Type::int() }.is_constant());
        assert!(Value::ConstFloat { value: 1.0, ty: Type::double() }.is_constant());
        assert!(!Value::Temp { id: TempId(0), ty: Type::int() }.is_constant());
    }
}
