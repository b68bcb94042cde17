//! The AST input contract, as an arena instead of the original's
//! singly-linked-list-with-pointers shape (see Design Notes, "Pointer-heavy
//! AST graphs" and "Tagged-union AST nodes").
//!
//! `Ast` owns every [`AstNode`] and hands out opaque [`AstId`] handles;
//! `next`-sibling chains become plain `Vec<AstId>` bodies. The only mutation
//! allowed after construction is resolving an inferred `Auto` type or
//! recording a mangled function name, both through narrow setters rather
//! than open field access.

use serde::{Deserialize, Serialize};

use crate::id::AstId;
use crate::types::Type;

/// Binary operator spelled out in the AST, before Semantic picks a
/// widened/promoted operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Neq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Set,
    AddSet,
    SubSet,
    MulSet,
    DivSet,
}

/// A literal's own value, separate from its [`Type`] (which may be any of
/// the numeric kinds depending on suffix/context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
}

/// One AST node's payload. Variant names and fields mirror the source
/// language's node subtypes one-to-one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstKind {
    Literal {
        var_type: Type,
        value: LiteralValue,
    },
    VarRef {
        name: String,
        is_class_member: bool,
    },
    BinaryOp {
        op: BinOp,
        left: AstId,
        right: AstId,
    },
    UnaryOp {
        op: UnOp,
        operand: AstId,
    },
    Call {
        name: String,
        args: Vec<AstId>,
    },
    MethodCall {
        object: AstId,
        method_name: String,
        args: Vec<AstId>,
    },
    MemberAccess {
        object: AstId,
        member_name: String,
    },
    ArrayAccess {
        target: AstId,
        index: AstId,
    },
    Cast {
        var_type: Type,
        operand: AstId,
    },
    VarDecl {
        name: String,
        var_type: Type,
        initializer: Option<AstId>,
        is_mutable: bool,
        is_array: bool,
        array_size: Option<u32>,
    },
    Assign {
        name: Option<String>,
        target: Option<AstId>,
        value: AstId,
        op: AssignOp,
        index: Option<AstId>,
    },
    Return {
        value: Option<AstId>,
    },
    If {
        cond: AstId,
        then_body: Vec<AstId>,
        else_body: Option<Vec<AstId>>,
    },
    While {
        cond: AstId,
        body: Vec<AstId>,
        is_do_while: bool,
    },
    Loop {
        iterations: Option<AstId>,
        body: Vec<AstId>,
    },
    ForIn {
        var_name: String,
        iter_type: Type,
        collection: AstId,
        body: Vec<AstId>,
    },
    Switch {
        condition: AstId,
        cases: Vec<AstId>,
        default_case: Option<Vec<AstId>>,
    },
    Case {
        value: AstId,
        body: Vec<AstId>,
        is_leak: bool,
    },
    Break,
    Continue,
    Emit {
        value: AstId,
    },
    FuncDef {
        name: String,
        ret_type: Type,
        params: Vec<(String, Type)>,
        body: Option<Vec<AstId>>,
        class_name: Option<String>,
        is_flux: bool,
        is_varargs: bool,
        /// Written once, by [`Ast::set_mangled_name`], after Semantic runs.
        mangled_name: Option<String>,
    },
    Class {
        name: String,
        parent_name: Option<String>,
        members: Vec<AstId>,
        traits: Vec<String>,
    },
    Enum {
        name: String,
        entries: Vec<(String, Option<i64>)>,
    },
    Namespace {
        name: String,
        body: Vec<AstId>,
    },
    ArrayLit {
        elements: Vec<AstId>,
    },
    TraitAccess {
        object: AstId,
        trait_name: String,
    },
}

/// One arena-resident AST node: source span plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub line: u32,
    pub col: u32,
    pub kind: AstKind,
}

/// Owning arena for a whole parsed program.
///
/// `roots` lists the top-level declarations in source order — the order
/// Pass 1 of Semantic relies on for its name-resolution tie-break rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
    pub roots: Vec<AstId>,
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn push(&mut self, line: u32, col: u32, kind: AstKind) -> AstId {
        let id = AstId(self.nodes.len() as u32);
        self.nodes.push(AstNode { line, col, kind });
        id
    }

    pub fn add_root(&mut self, id: AstId) {
        self.roots.push(id);
    }

    pub fn get(&self, id: AstId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a `VarDecl`'s `Auto` placeholder to the type Semantic
    /// inferred for its initializer. Panics if `id` is not a `VarDecl` —
    /// callers only invoke this from the one site in Semantic that already
    /// matched on the node kind.
    pub fn resolve_auto(&mut self, id: AstId, resolved: Type) {
        match &mut self.nodes[id.0 as usize].kind {
            AstKind::VarDecl { var_type, .. } => {
                debug_assert!(var_type.is_auto(), "resolve_auto called on a non-Auto VarDecl");
                *var_type = resolved;
            }
            other => panic!("resolve_auto called on non-VarDecl node: {other:?}"),
        }
    }

    /// Records the mangled symbol name computed for a `FuncDef`. Panics if
    /// `id` is not a `FuncDef`, for the same reason as [`Self::resolve_auto`].
    pub fn set_mangled_name(&mut self, id: AstId, mangled: String) {
        match &mut self.nodes[id.0 as usize].kind {
            AstKind::FuncDef { mangled_name, .. } => {
                *mangled_name = Some(mangled);
            }
            other => panic!("set_mangled_name called on non-FuncDef node: {other:?}"),
        }
    }
}
