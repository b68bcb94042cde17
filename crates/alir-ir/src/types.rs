//! The Alir source-level type system.
//!
//! A [`Type`] composes a base [`TypeKind`] with pointer depth, array size,
//! signedness, and (for nominal types) a class/enum name: `int[4]*` is a
//! pointer to an array of four ints, read from the variable outward.

use serde::{Deserialize, Serialize};

/// Base kind of a [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Int,
    Short,
    Long,
    LongLong,
    Char,
    Bool,
    Float,
    Double,
    LongDouble,
    Void,
    String,
    Class,
    Enum,
    /// Placeholder for `let` declarations pending inference. Resolved by
    /// Semantic; no IR instruction may carry `Auto`.
    Auto,
    /// Poison value: propagates through any expression touching an error.
    Unknown,
}

/// A function-pointer designator: return type plus parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub return_type: Box<Type>,
    pub params: Vec<Type>,
}

/// A complete Alir type value.
///
/// Invariant: `class_name` is `Some` iff `kind` is `Class` or `Enum`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    pub pointer_depth: u32,
    pub array_size: u32,
    pub is_unsigned: bool,
    pub class_name: Option<String>,
    pub function_sig: Option<Box<FunctionSignature>>,
}

impl Type {
    fn scalar(kind: TypeKind) -> Self {
        Type {
            kind,
            pointer_depth: 0,
            array_size: 0,
            is_unsigned: false,
            class_name: None,
            function_sig: None,
        }
    }

    pub fn int() -> Self {
        Self::scalar(TypeKind::Int)
    }
    pub fn short() -> Self {
        Self::scalar(TypeKind::Short)
    }
    pub fn long() -> Self {
        Self::scalar(TypeKind::Long)
    }
    pub fn long_long() -> Self {
        Self::scalar(TypeKind::LongLong)
    }
    pub fn char() -> Self {
        Self::scalar(TypeKind::Char)
    }
    pub fn bool_() -> Self {
        Self::scalar(TypeKind::Bool)
    }
    pub fn float() -> Self {
        Self::scalar(TypeKind::Float)
    }
    pub fn double() -> Self {
        Self::scalar(TypeKind::Double)
    }
    pub fn long_double() -> Self {
        Self::scalar(TypeKind::LongDouble)
    }
    pub fn void() -> Self {
        Self::scalar(TypeKind::Void)
    }
    pub fn string() -> Self {
        Self::scalar(TypeKind::String)
    }
    pub fn auto() -> Self {
        Self::scalar(TypeKind::Auto)
    }
    pub fn unknown() -> Self {
        Self::scalar(TypeKind::Unknown)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Type {
            kind: TypeKind::Class,
            pointer_depth: 0,
            array_size: 0,
            is_unsigned: false,
            class_name: Some(name.into()),
            function_sig: None,
        }
    }

    pub fn enum_(name: impl Into<String>) -> Self {
        Type {
            kind: TypeKind::Enum,
            pointer_depth: 0,
            array_size: 0,
            is_unsigned: false,
            class_name: Some(name.into()),
            function_sig: None,
        }
    }

    pub fn function(return_type: Type, params: Vec<Type>) -> Self {
        Type {
            kind: TypeKind::Void,
            pointer_depth: 0,
            array_size: 0,
            is_unsigned: false,
            class_name: None,
            function_sig: Some(Box::new(FunctionSignature {
                return_type: Box::new(return_type),
                params,
            })),
        }
    }

    /// Returns the pointer-to-`self` type (one more level of indirection).
    pub fn pointer_to(&self) -> Self {
        let mut t = self.clone();
        t.pointer_depth += 1;
        t
    }

    /// Returns the pointee type (one fewer level of indirection).
    ///
    /// Panics if called on a non-pointer; callers must check [`Self::is_pointer`].
    pub fn dereferenced(&self) -> Self {
        assert!(self.pointer_depth > 0, "dereferenced() on a non-pointer type");
        let mut t = self.clone();
        t.pointer_depth -= 1;
        t
    }

    pub fn array_of(element: Type, size: u32) -> Self {
        let mut t = element;
        t.array_size = size;
        t
    }

    pub fn with_unsigned(mut self, is_unsigned: bool) -> Self {
        self.is_unsigned = is_unsigned;
        self
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    pub fn is_array(&self) -> bool {
        self.array_size > 0
    }

    pub fn is_integer(&self) -> bool {
        self.pointer_depth == 0
            && matches!(
                self.kind,
                TypeKind::Int
                    | TypeKind::Short
                    | TypeKind::Long
                    | TypeKind::LongLong
                    | TypeKind::Char
                    | TypeKind::Bool
            )
    }

    pub fn is_float(&self) -> bool {
        self.pointer_depth == 0
            && matches!(self.kind, TypeKind::Float | TypeKind::Double | TypeKind::LongDouble)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void && self.pointer_depth == 0
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == TypeKind::Unknown
    }

    pub fn is_auto(&self) -> bool {
        self.kind == TypeKind::Auto
    }

    pub fn is_string(&self) -> bool {
        self.kind == TypeKind::String && self.pointer_depth == 0
    }

    /// `char*` or `char[N]` — the C-string-compatible shapes.
    pub fn is_char_pointer_or_array(&self) -> bool {
        self.kind == TypeKind::Char && (self.pointer_depth == 1 || (self.pointer_depth == 0 && self.is_array()))
    }

    /// Numeric widening rank used to pick the widest operand type for
    /// arithmetic: LongDouble > Double >
    /// Float > Long > Int, extended with the remaining integer kinds in
    /// between Int and Long.
    pub fn numeric_rank(&self) -> u8 {
        match self.kind {
            TypeKind::Bool => 0,
            TypeKind::Char => 1,
            TypeKind::Short => 2,
            TypeKind::Int => 3,
            TypeKind::Long => 4,
            TypeKind::LongLong => 5,
            TypeKind::Float => 6,
            TypeKind::Double => 7,
            TypeKind::LongDouble => 8,
            _ => 0,
        }
    }

    /// Renders the type the way the textual IR emitter would (§6): base name
    /// with array/pointer modifiers composed outward, e.g. `int[4]*`.
    pub fn render(&self) -> String {
        let mut base = match self.kind {
            TypeKind::Int => "int".to_string(),
            TypeKind::Short => "short".to_string(),
            TypeKind::Long => "long".to_string(),
            TypeKind::LongLong => "longlong".to_string(),
            TypeKind::Char => "char".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::Double => "double".to_string(),
            TypeKind::LongDouble => "longdouble".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Class => self.class_name.clone().unwrap_or_else(|| "<class>".into()),
            TypeKind::Enum => self.class_name.clone().unwrap_or_else(|| "<enum>".into()),
            TypeKind::Auto => "auto".to_string(),
            TypeKind::Unknown => "unknown".to_string(),
        };
        if self.is_unsigned {
            base = format!("u{base}");
        }
        if self.array_size > 0 {
            base = format!("{base}[{}]", self.array_size);
        }
        for _ in 0..self.pointer_depth {
            base.push('*');
        }
        base
    }
}
