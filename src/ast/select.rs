use serde::{Deserialize, Serialize};

use crate::ast::Param;
use crate::transpiler::ToQuery;

/// One node of a `select=` tree.
///
/// A resource carries params scoped to the embedded collection (order,
/// limit, filters). Those are hoisted into `resource.key=value` pairs when
/// the query is rendered. They must not contain another `Select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selectable {
    Attribute(String),
    Resource(String, Vec<Param>, Vec<Selectable>),
}

impl Selectable {
    /// Add a resource-scoped param. No effect on attributes.
    pub fn with_param(mut self, param: Param) -> Self {
        if let Selectable::Resource(_, params, _) = &mut self {
            params.push(param);
        }
        self
    }
}

impl std::fmt::Display for Selectable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query())
    }
}
