//! The node→type side table.
//!
//! The sole channel Semantic uses to hand per-node types to IR Gen. The AST
//! itself is not mutated to carry types (see Design Notes, "Node-type side
//! table") — only `Auto` resolution and mangled names are, via the narrow
//! setters on [`crate::ast::Ast`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::AstId;
use crate::types::Type;

/// Maps every expression node Semantic visited to its inferred [`Type`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTypeTable {
    entries: HashMap<AstId, Type>,
}

impl NodeTypeTable {
    pub fn new() -> Self {
        NodeTypeTable {
            entries: HashMap::new(),
        }
    }

    pub fn record(&mut self, node: AstId, ty: Type) {
        self.entries.insert(node, ty);
    }

    pub fn get(&self, node: AstId) -> Option<&Type> {
        self.entries.get(&node)
    }

    /// As IR Gen relies on: "read the type Semantic already computed,
    /// never re-derive it." Panics if Semantic never visited `node`, which
    /// would itself indicate a Semantic bug (invariant 2).
    pub fn expect(&self, node: AstId) -> &Type {
        self.entries
            .get(&node)
            .unwrap_or_else(|| panic!("node {node} missing from type table"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
