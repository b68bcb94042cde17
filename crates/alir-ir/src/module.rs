//! The IR [`Module`]: the complete output contract of IR
//! Generation and the sole input to IR Verification.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::function::Function;
use crate::types::Type;

/// One field in a flattened class layout.
///
/// `index` is dense and 0-based per struct (invariant 5); parent
/// fields occupy the low indices (invariant 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub index: u32,
}

/// A module-level global: an interned string literal or a `let`-style
/// global variable, each with a stable label used as its `Value::Global`
/// name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalVar {
    pub label: String,
    pub ty: Type,
    pub initial_value: Option<String>,
}

/// The flattened field layout of one class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassLayout {
    pub fields: Vec<Field>,
}

impl ClassLayout {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The whole-program IR module produced by IR Generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub functions: Vec<Function>,
    pub globals: Vec<GlobalVar>,
    pub structs: IndexMap<String, ClassLayout>,
    pub enums: IndexMap<String, Vec<(String, i64)>>,
}

impl Module {
    pub fn new() -> Self {
        Module::default()
    }

    pub fn function(&self, mangled_name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.mangled_name == mangled_name)
    }

    pub fn function_mut(&mut self, mangled_name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.mangled_name == mangled_name)
    }

    /// Interns a string literal, reusing an existing global if an identical
    /// literal was already interned under the given label prefix.
    pub fn intern_string(&mut self, value: &str, label_prefix: &str) -> String {
        if let Some(existing) = self
            .globals
            .iter()
            .find(|g| g.initial_value.as_deref() == Some(value))
        {
            return existing.label.clone();
        }
        let label = format!("{label_prefix}{}", self.globals.len());
        self.globals.push(GlobalVar {
            label: label.clone(),
            ty: Type::char().pointer_to(),
            initial_value: Some(value.to_string()),
        });
        label
    }

    pub fn enum_value(&self, enum_name: &str, member: &str) -> Option<i64> {
        self.enums
            .get(enum_name)?
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, v)| *v)
    }
}
