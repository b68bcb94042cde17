//! Type inference, compatibility, and expression typing.

use alir_ir::ast::BinOp;
use alir_ir::{Type, TypeKind};

/// If the declared type is `Auto`, infers it from the initializer's type.
/// Otherwise returns the declared type unchanged. `initializer` is `None`
/// when there is no initializer expression at all.
pub fn infer_let_type(declared: &Type, initializer: Option<&Type>) -> Result<Type, String> {
    if !declared.is_auto() {
        return Ok(declared.clone());
    }
    match initializer {
        None => Err("cannot infer type: declaration has no initializer".to_string()),
        Some(init_ty) if init_ty.is_void() => {
            Err("cannot infer type from a `void` initializer".to_string())
        }
        Some(init_ty) if init_ty.is_unknown() => {
            Err("cannot infer type: initializer type is unknown".to_string())
        }
        Some(init_ty) => Ok(init_ty.clone()),
    }
}

/// Whether a value of type `source` may be assigned/passed/returned where
/// `dest` is expected, per the six type-compatibility rules below.
pub fn is_assignable(source: &Type, dest: &Type) -> bool {
    if source == dest {
        return true;
    }
    if source.is_numeric() && dest.is_numeric() {
        return true;
    }
    if (source.is_enum() && dest.is_integer()) || (source.is_integer() && dest.is_enum()) {
        return true;
    }
    if (source.is_string() && dest.is_char_pointer_or_array())
        || (dest.is_string() && source.is_char_pointer_or_array())
    {
        return true;
    }
    if source.is_array() && dest.is_pointer() {
        let mut decayed = source.clone();
        decayed.array_size = 0;
        let decayed = decayed.pointer_to();
        if decayed.kind == dest.kind
            && decayed.pointer_depth == dest.pointer_depth
            && decayed.is_unsigned == dest.is_unsigned
            && decayed.class_name == dest.class_name
        {
            return true;
        }
    }
    if dest.kind == TypeKind::Void && dest.is_pointer() && source.is_pointer() {
        return true;
    }
    false
}

/// Describes the implicit conversion about to happen, when one is needed —
/// narrowing between numeric kinds, or `string` ⇄ `char*`/`char[]` — so
/// `Check` can emit an informational diagnostic about it. Returns `None`
/// when no note is warranted (exact match, or a widening numeric
/// conversion).
pub fn implicit_cast_note(source: &Type, dest: &Type) -> Option<String> {
    if source == dest {
        return None;
    }
    if source.is_numeric() && dest.is_numeric() {
        if dest.numeric_rank() < source.numeric_rank() {
            return Some(format!(
                "implicit narrowing conversion from `{}` to `{}`",
                source.render(),
                dest.render()
            ));
        }
        return None;
    }
    if source.is_string() && dest.is_char_pointer_or_array() {
        return Some(format!("implicit conversion from `string` to `{}`", dest.render()));
    }
    if dest.is_string() && source.is_char_pointer_or_array() {
        return Some(format!("implicit conversion from `{}` to `string`", source.render()));
    }
    None
}

/// The widest of two numeric types, per the ranking LongDouble > Double >
/// Float > Long > Int used for arithmetic-operand promotion.
pub fn widest_numeric(a: &Type, b: &Type) -> Type {
    if a.numeric_rank() >= b.numeric_rank() {
        a.clone()
    } else {
        b.clone()
    }
}

/// Types a binary operator application, given both operands' already-typed
/// operands. Callers substitute `Unknown`
/// before calling this if either operand is already poisoned; this function
/// only knows the arithmetic/comparison/pointer rules themselves.
pub fn binary_result_type(op: BinOp, left: &Type, right: &Type) -> Result<Type, String> {
    use BinOp::*;
    match op {
        Lt | Gt | Lte | Gte | Eq | Neq => Ok(Type::bool_()),
        And | Or => Ok(Type::bool_()),
        Add if left.is_string() && right.is_string() => Ok(Type::string()),
        Add if left.is_pointer() && right.is_integer() => Ok(left.clone()),
        Add if right.is_pointer() && left.is_integer() => Ok(right.clone()),
        Sub if left.is_pointer() && right.is_integer() => Ok(left.clone()),
        Add | Sub | Mul | Div | Mod if left.is_numeric() && right.is_numeric() => {
            Ok(widest_numeric(left, right))
        }
        BitAnd | BitOr | BitXor | Shl | Shr if left.is_integer() && right.is_integer() => {
            Ok(widest_numeric(left, right))
        }
        _ => Err(format!(
            "no binary operator {op:?} for operand types `{}` and `{}`",
            left.render(),
            right.render()
        )),
    }
}

/// Poison propagation: if either operand is `Unknown`, the result
/// is `Unknown` and nothing should be re-reported.
pub fn poisoned(types: &[&Type]) -> Option<Type> {
    if types.iter().any(|t| t.is_unknown()) {
        Some(Type::unknown())
    } else {
        None
    }
}
