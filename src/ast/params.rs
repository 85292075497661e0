use serde::{Deserialize, Serialize};

use crate::ast::{ColumnOrder, Operator, Selectable};

/// A top-level query directive.
///
/// Each param renders to one `key=value` pair, except `Select`, which also
/// contributes one pair per resource-scoped param found in its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    /// `column=op.value`
    Filter(String, Operator),
    /// Directive aimed at an embedded resource, keyed `path.key`
    NestedFilter(String, Box<Param>),
    Select(Vec<Selectable>),
    Limit(i64),
    Offset(i64),
    Order(Vec<ColumnOrder>),
    /// `or=(…)`
    Or(Vec<Param>),
    /// `and=(…)`
    And(Vec<Param>),
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key(), self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn test_display_single_pair() {
        let param = Param::Filter("age".into(), Operator::Gte(Value::Int(18)));
        assert_eq!(param.to_string(), "age=gte.18");
    }

    #[test]
    fn test_json_shape() {
        let json = r#"[
            {"filter": ["status", {"eq": "active"}]},
            {"limit": 5},
            {"order": [{"desc": ["created_at", "nulls_last"]}]}
        ]"#;
        let params: Vec<Param> = serde_json::from_str(json).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params[1], Param::Limit(5));
        assert_eq!(params[0].to_string(), "status=eq.active");
        assert_eq!(params[2].to_string(), "order=created_at.desc.nullslast");
    }
}
