//! Stable handle newtypes used across the middle-end.
//!
//! Every handle is a distinct newtype over `u32` so that, for example, an
//! `AstId` can never be accidentally used where a `ScopeId` is expected.
//! All handles index into an owning arena (`Ast`, `ScopeTree`, a function's
//! temporary counter) and stay valid for the lifetime of that arena.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a node in an [`Ast`](crate::ast::Ast) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AstId(pub u32);

/// Handle to a [`Scope`](crate::symbol::Scope) in a [`ScopeTree`](crate::symbol::ScopeTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// Numeric id of an SSA-style temporary within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TempId(pub u32);

impl fmt::Display for AstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_same_repr() {
        let a = AstId(3);
        let s = ScopeId(3);
        let t = TempId(3);
        assert_eq!(a.0, s.0);
        assert_eq!(s.0, t.0);
    }

    #[test]
    fn temp_id_display_has_percent_t_prefix() {
        assert_eq!(format!("{}", TempId(7)), "%t7");
    }

    #[test]
    fn ast_and_scope_id_display_bare_number() {
        assert_eq!(format!("{}", AstId(5)), "5");
        assert_eq!(format!("{}", ScopeId(9)), "9");
    }

    #[test]
    fn serde_roundtrip() {
        let id = AstId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: AstId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
