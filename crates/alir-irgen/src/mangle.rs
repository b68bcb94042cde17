//! IR-level naming for methods and `flux` artifacts.
//!
//! Distinct from `alir_sema::mangle`'s overload-signature scheme: a method's
//! compiled name is `ClassName_method` regardless of its parameter types, and
//! call sites use the same scheme, so no lookup through the AST's
//! `mangled_name` field is needed for methods at all.

pub fn mangle_method(class_name: &str, method_name: &str) -> String {
    format!("{class_name}_{method_name}")
}

pub fn flux_struct_name(function_name: &str) -> String {
    format!("FluxCtx_{function_name}")
}

pub fn resume_function_name(function_name: &str) -> String {
    format!("{function_name}_Resume")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_mangling_joins_class_and_method_with_underscore() {
        assert_eq!(mangle_method("Animal", "speak"), "Animal_speak");
    }

    #[test]
    fn flux_struct_and_resume_names_derive_from_the_function_name() {
        assert_eq!(flux_struct_name("counter"), "FluxCtx_counter");
        assert_eq!(resume_function_name("counter"), "counter_Resume");
    }
}
