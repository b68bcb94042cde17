//! Class-layout pass: runs before any
//! function body is lowered. Also collects the enum-value table and the
//! free-function name→mangled-name map, since both are whole-program facts
//! IR Generation needs before it can lower a single call site.

use indexmap::IndexMap;

use alir_ir::ast::{Ast, AstKind};
use alir_ir::{AstId, ClassLayout, CoreError, DiagnosticSink, Field, Module, Type};

use crate::ctx::IrGenCtx;

struct ClassInfo {
    parent_name: Option<String>,
    fields: Vec<(String, Type)>,
    line: u32,
    col: u32,
}

/// Walks every top-level and namespace-nested declaration once, populating
/// `ctx.module.structs`, `ctx.module.enums`, and the function-name map.
pub fn collect_declarations<S: DiagnosticSink>(ctx: &mut IrGenCtx<S>) {
    let mut classes: IndexMap<String, ClassInfo> = IndexMap::new();
    let mut enums: IndexMap<String, Vec<(String, Option<i64>)>> = IndexMap::new();
    let ast = ctx.ast; // `&'a Ast` is `Copy`; decouples this borrow from `ctx`.
    let roots = ast.roots.clone();
    collect(ast, &roots, &mut classes, &mut enums, ctx);

    let names: Vec<String> = classes.keys().cloned().collect();
    for name in &names {
        if let Err(e) = layout_for(&classes, &mut ctx.module, name) {
            let (line, col) = classes.get(name).map(|c| (c.line, c.col)).unwrap_or((0, 0));
            ctx.error(line, col, e.to_string());
        }
    }

    for (name, entries) in enums {
        let mut next = 0i64;
        let mut values = Vec::with_capacity(entries.len());
        for (member, explicit) in entries {
            let v = explicit.unwrap_or(next);
            values.push((member, v));
            next = v + 1;
        }
        ctx.module.enums.insert(name, values);
    }
}

fn collect<S: DiagnosticSink>(
    ast: &Ast,
    ids: &[AstId],
    classes: &mut IndexMap<String, ClassInfo>,
    enums: &mut IndexMap<String, Vec<(String, Option<i64>)>>,
    ctx: &mut IrGenCtx<S>,
) {
    for &id in ids {
        let node = ast.get(id);
        let (line, col) = (node.line, node.col);
        match &node.kind {
            AstKind::Class { name, parent_name, members, .. } => {
                let mut fields = Vec::new();
                for &m in members {
                    if let AstKind::VarDecl { name: fname, var_type, .. } = &ast.get(m).kind {
                        fields.push((fname.clone(), var_type.clone()));
                    }
                }
                classes.insert(name.clone(), ClassInfo { parent_name: parent_name.clone(), fields, line, col });
            }
            AstKind::Enum { name, entries } => {
                enums.insert(name.clone(), entries.clone());
            }
            AstKind::Namespace { body, .. } => {
                collect(ast, body, classes, enums, ctx);
            }
            AstKind::FuncDef { name, class_name: None, mangled_name, .. } => {
                let mangled = mangled_name.clone().unwrap_or_else(|| name.clone());
                if let Err(e) = ctx.register_function(name.clone(), mangled) {
                    ctx.error(line, col, e.to_string());
                }
            }
            _ => {}
        }
    }
}

/// Flattens `name`'s own fields onto its parent's, parent fields first.
/// Returns [`CoreError::DuplicateField`] if a field name
/// collides with one inherited from a parent, and
/// [`CoreError::NonDenseFieldIndex`] if the resulting index sequence isn't
/// `0..len` — both would be bugs in this pass itself, not in the source
/// program, since Semantic already rejects a class redeclaring a parent's
/// field name.
fn layout_for(classes: &IndexMap<String, ClassInfo>, module: &mut Module, name: &str) -> Result<ClassLayout, CoreError> {
    if let Some(existing) = module.structs.get(name) {
        return Ok(existing.clone());
    }
    let Some(info) = classes.get(name) else {
        return Ok(ClassLayout::default());
    };
    let mut fields = Vec::new();
    if let Some(parent) = &info.parent_name {
        fields.extend(layout_for(classes, module, parent)?.fields);
    }
    let mut index = fields.len() as u32;
    for (fname, fty) in &info.fields {
        if fields.iter().any(|f: &Field| &f.name == fname) {
            return Err(CoreError::DuplicateField { class_name: name.to_string(), field: fname.clone() });
        }
        fields.push(Field { name: fname.clone(), ty: fty.clone(), index });
        index += 1;
    }
    for (i, f) in fields.iter().enumerate() {
        if f.index != i as u32 {
            return Err(CoreError::NonDenseFieldIndex { class_name: name.to_string(), index: f.index, expected: i as u32 });
        }
    }
    let layout = ClassLayout { fields };
    module.structs.insert(name.to_string(), layout.clone());
    Ok(layout)
}

/// Looks up a field's dense index for `get_ptr` lowering, reporting a
/// lowering-precondition error rather than panicking if a prior
/// stage's invariant was somehow violated.
pub fn field_index<S: DiagnosticSink>(
    ctx: &mut IrGenCtx<S>,
    class_name: &str,
    field_name: &str,
    line: u32,
    col: u32,
) -> u32 {
    match ctx.module.structs.get(class_name).and_then(|l| l.field(field_name)) {
        Some(f) => f.index,
        None => {
            ctx.error(line, col, format!("field `{field_name}` not found on class `{class_name}` during lowering"));
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alir_ir::{CollectingSink, NodeTypeTable};

    fn push_class(ast: &mut Ast, name: &str, parent: Option<&str>, fields: &[&str]) -> AstId {
        let members: Vec<AstId> = fields
            .iter()
            .map(|f| {
                ast.push(
                    1,
                    1,
                    AstKind::VarDecl {
                        name: (*f).into(),
                        var_type: Type::int(),
                        initializer: None,
                        is_mutable: true,
                        is_array: false,
                        array_size: None,
                    },
                )
            })
            .collect();
        ast.push(
            1,
            1,
            AstKind::Class { name: name.into(), parent_name: parent.map(String::from), members, traits: vec![] },
        )
    }

    #[test]
    fn scenario_s3_parent_fields_occupy_low_indices() {
        let mut ast = Ast::new();
        let a = push_class(&mut ast, "A", None, &["x"]);
        let b = push_class(&mut ast, "B", Some("A"), &["y"]);
        ast.add_root(a);
        ast.add_root(b);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        collect_declarations(&mut ctx);

        let layout_a = ctx.module.structs.get("A").unwrap();
        assert_eq!(layout_a.field("x").unwrap().index, 0);

        let layout_b = ctx.module.structs.get("B").unwrap();
        assert_eq!(layout_b.field("x").unwrap().index, 0);
        assert_eq!(layout_b.field("y").unwrap().index, 1);
    }

    #[test]
    fn enum_members_auto_increment_from_zero() {
        let mut ast = Ast::new();
        let e = ast.push(
            1,
            1,
            AstKind::Enum { name: "Color".into(), entries: vec![("Red".into(), None), ("Blue".into(), Some(5)), ("Green".into(), None)] },
        );
        ast.add_root(e);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        collect_declarations(&mut ctx);

        assert_eq!(ctx.module.enum_value("Color", "Red"), Some(0));
        assert_eq!(ctx.module.enum_value("Color", "Blue"), Some(5));
        assert_eq!(ctx.module.enum_value("Color", "Green"), Some(6));
    }

    #[test]
    fn free_functions_are_registered_by_mangled_name() {
        let mut ast = Ast::new();
        let f = ast.push(
            1,
            1,
            AstKind::FuncDef {
                name: "add".into(),
                ret_type: Type::int(),
                params: vec![],
                body: Some(vec![]),
                class_name: None,
                is_flux: false,
                is_varargs: false,
                mangled_name: Some("_Z3addii".into()),
            },
        );
        ast.add_root(f);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        collect_declarations(&mut ctx);

        assert_eq!(ctx.function_mangled_name("add"), Some("_Z3addii"));
    }

    #[test]
    fn namespace_nested_classes_are_discovered() {
        let mut ast = Ast::new();
        let a = push_class(&mut ast, "Inner", None, &["z"]);
        let ns = ast.push(1, 1, AstKind::Namespace { name: "geo".into(), body: vec![a] });
        ast.add_root(ns);

        let types = NodeTypeTable::new();
        let mut sink = CollectingSink::new();
        let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
        collect_declarations(&mut ctx);

        assert!(ctx.module.structs.contains_key("Inner"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use alir_ir::ast::Ast;
    use alir_ir::{CollectingSink, NodeTypeTable};
    use proptest::prelude::*;

    /// Builds a linear chain of `len` classes, each inheriting the one before
    /// it, with `fields_per_class` int fields named by chain position so
    /// field names never collide across classes.
    fn build_chain(ast: &mut Ast, len: usize, fields_per_class: usize) -> Vec<String> {
        let mut parent: Option<String> = None;
        let mut names = Vec::with_capacity(len);
        for i in 0..len {
            let name = format!("C{i}");
            let members: Vec<AstId> = (0..fields_per_class)
                .map(|f| {
                    ast.push(
                        1,
                        1,
                        AstKind::VarDecl {
                            name: format!("f{i}_{f}"),
                            var_type: Type::int(),
                            initializer: None,
                            is_mutable: true,
                            is_array: false,
                            array_size: None,
                        },
                    )
                })
                .collect();
            let id = ast.push(1, 1, AstKind::Class { name: name.clone(), parent_name: parent.clone(), members, traits: vec![] });
            ast.add_root(id);
            names.push(name.clone());
            parent = Some(name);
        }
        names
    }

    proptest! {
        /// Invariant: for every class, field indices form `[0, N)` with no
        /// gaps, regardless of inheritance chain length or field count.
        #[test]
        fn field_indices_are_dense(chain_len in 1usize..6, fields_per_class in 0usize..4) {
            let mut ast = Ast::new();
            let names = build_chain(&mut ast, chain_len, fields_per_class);
            let types = NodeTypeTable::new();
            let mut sink = CollectingSink::new();
            let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
            collect_declarations(&mut ctx);

            for name in &names {
                let layout = ctx.module.structs.get(name).unwrap();
                let mut indices: Vec<u32> = layout.fields.iter().map(|f| f.index).collect();
                indices.sort_unstable();
                let expected: Vec<u32> = (0..indices.len() as u32).collect();
                prop_assert_eq!(indices, expected);
            }
        }

        /// Invariant: a class with a `k`-field parent has that parent's
        /// fields occupying indices `[0, k)`, in the parent's own order.
        #[test]
        fn parent_fields_occupy_low_indices(chain_len in 2usize..6, fields_per_class in 1usize..4) {
            let mut ast = Ast::new();
            let names = build_chain(&mut ast, chain_len, fields_per_class);
            let types = NodeTypeTable::new();
            let mut sink = CollectingSink::new();
            let mut ctx = IrGenCtx::new(&ast, &types, "main.alir", &mut sink);
            collect_declarations(&mut ctx);

            for w in names.windows(2) {
                let (parent_name, child_name) = (&w[0], &w[1]);
                let parent_layout = ctx.module.structs.get(parent_name).unwrap().clone();
                let child_layout = ctx.module.structs.get(child_name).unwrap();
                let k = parent_layout.fields.len() as u32;
                for pf in &parent_layout.fields {
                    let cf = child_layout.field(&pf.name).unwrap();
                    prop_assert_eq!(cf.index, pf.index);
                    prop_assert!(cf.index < k);
                }
            }
        }
    }
}
