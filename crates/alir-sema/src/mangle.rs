//! Function-overload mangling.
//!
//! `main` is never mangled. Everything else becomes `_Z<len><name>` plus one
//! sigil per parameter: `i d f b c v s` for the core scalar kinds,
//! `C<len><name>` for a class or enum, `P` per pointer level, and `A<N>_` for
//! a fixed-size array — composed outward exactly like
//! [`alir_ir::Type::render`]. `u` prefixes an unsigned integer sigil.
//!
//! Short/Long/LongLong/LongDouble get their own letters (`h l x e`) so
//! mangling stays total and injective over every `TypeKind`, avoiding a
//! collision with `s` (string).

use alir_ir::{Type, TypeKind};

pub fn mangle_function(name: &str, params: &[Type]) -> String {
    if name == "main" {
        return "main".to_string();
    }
    let mut out = format!("_Z{}{}", name.len(), name);
    if params.is_empty() {
        out.push('v');
    } else {
        for p in params {
            out.push_str(&mangle_type(p));
        }
    }
    out
}

fn mangle_type(ty: &Type) -> String {
    let mut out = String::new();
    for _ in 0..ty.pointer_depth {
        out.push('P');
    }
    if ty.array_size > 0 {
        out.push_str(&format!("A{}_", ty.array_size));
    }
    if ty.is_unsigned {
        out.push('u');
    }
    out.push_str(&base_sigil(ty));
    out
}

fn base_sigil(ty: &Type) -> String {
    match ty.kind {
        TypeKind::Int => "i".to_string(),
        TypeKind::Double => "d".to_string(),
        TypeKind::Float => "f".to_string(),
        TypeKind::Bool => "b".to_string(),
        TypeKind::Char => "c".to_string(),
        TypeKind::Void => "v".to_string(),
        TypeKind::String => "s".to_string(),
        TypeKind::Short => "h".to_string(),
        TypeKind::Long => "l".to_string(),
        TypeKind::LongLong => "x".to_string(),
        TypeKind::LongDouble => "e".to_string(),
        TypeKind::Class | TypeKind::Enum => {
            let name = ty.class_name.as_deref().unwrap_or("Unknown");
            format!("C{}{}", name.len(), name)
        }
        TypeKind::Auto => "a".to_string(),
        TypeKind::Unknown => "u_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_is_never_mangled() {
        assert_eq!(mangle_function("main", &[Type::int()]), "main");
    }

    #[test]
    fn scenario_s1_add_int_int() {
        assert_eq!(mangle_function("add", &[Type::int(), Type::int()]), "_Z3addii");
    }

    #[test]
    fn empty_params_mangle_to_trailing_v() {
        assert_eq!(mangle_function("tick", &[]), "_Z4tickv");
    }

    #[test]
    fn pointer_and_array_compose_outward() {
        let t = Type::array_of(Type::char(), 8).pointer_to();
        assert_eq!(mangle_function("f", &[t]), "_Z1fPA8_c");
    }

    #[test]
    fn class_param_uses_length_prefixed_name() {
        assert_eq!(mangle_function("f", &[Type::class("Animal")]), "_Z1fC6Animal");
    }

    #[test]
    fn overloads_differing_only_in_parameter_types_differ() {
        let a = mangle_function("f", &[Type::int()]);
        let b = mangle_function("f", &[Type::double()]);
        assert_ne!(a, b);
    }

    #[test]
    fn overloads_differing_in_pointer_depth_differ() {
        let a = mangle_function("f", &[Type::int()]);
        let b = mangle_function("f", &[Type::int().pointer_to()]);
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod injectivity {
    use super::*;
    use proptest::prelude::*;

    /// A fixed pool covering every `TypeKind` plus a few pointer/array/
    /// unsigned/class variations, indexed by `proptest` rather than derived
    /// via `Arbitrary` — simpler than teaching proptest to shrink a
    /// `Type`, and the mangling scheme only needs to stay injective over
    /// this pool's shapes to back the "non-`main` overloads differing only
    /// in parameter types mangle differently" guarantee.
    fn sample_types() -> Vec<Type> {
        vec![
            Type::int(),
            Type::double(),
            Type::float(),
            Type::bool_(),
            Type::char(),
            Type::void(),
            Type::string(),
            Type::short(),
            Type::long(),
            Type::long_long(),
            Type::long_double(),
            Type::int().pointer_to(),
            Type::int().pointer_to().pointer_to(),
            Type::int().with_unsigned(true),
            Type::array_of(Type::char(), 8),
            Type::class("Animal"),
            Type::class("Zoo"),
            Type::enum_("Color"),
        ]
    }

    proptest! {
        #[test]
        fn distinct_single_param_types_never_collide(i in 0usize..18, j in 0usize..18) {
            let types = sample_types();
            prop_assume!(types[i] != types[j]);
            let a = mangle_function("f", &[types[i].clone()]);
            let b = mangle_function("f", &[types[j].clone()]);
            prop_assert_ne!(a, b);
        }
    }
}
