use serde::{Deserialize, Serialize};

use crate::ast::Value;
use crate::transpiler::ToQuery;

/// Column comparison operators.
///
/// Ordering comparisons take any [`Value`]; nothing here checks that the
/// value is numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `eq.`
    Eq(Value),
    /// `neq.`
    Neq(Value),
    /// `lt.`
    Lt(Value),
    /// `lte.`
    Lte(Value),
    /// `gt.`
    Gt(Value),
    /// `gte.`
    Gte(Value),
    /// `in.(…)`, always a list
    In(Vec<Value>),
    /// `like.`
    Like(String),
    /// `ilike.`
    Ilike(String),
    /// `is.null`
    Null,
    /// `is.true`
    True,
    /// `is.false`
    False,
    /// Full-text search, with optional language
    Fts(Option<String>, String),
    /// Plain-text full-text search
    Plfts(Option<String>, String),
    /// Phrase full-text search
    Phfts(Option<String>, String),
    /// `not.` prefix around another operator
    Not(Box<Operator>),
    /// Raw value, no operator prefix
    Value(Value),
}

impl Operator {
    /// Returns the wire prefix for this operator, without the trailing dot.
    pub fn prefix(&self) -> &'static str {
        match self {
            Operator::Eq(_) => "eq",
            Operator::Neq(_) => "neq",
            Operator::Lt(_) => "lt",
            Operator::Lte(_) => "lte",
            Operator::Gt(_) => "gt",
            Operator::Gte(_) => "gte",
            Operator::In(_) => "in",
            Operator::Like(_) => "like",
            Operator::Ilike(_) => "ilike",
            Operator::Null | Operator::True | Operator::False => "is",
            Operator::Fts(..) => "fts",
            Operator::Plfts(..) => "plfts",
            Operator::Phfts(..) => "phfts",
            Operator::Not(_) => "not",
            Operator::Value(_) => "",
        }
    }

    /// Returns true if the value is rendered inside double quotes.
    pub fn quotes_value(&self) -> bool {
        matches!(
            self,
            Operator::Lt(_)
                | Operator::Lte(_)
                | Operator::Gt(_)
                | Operator::Gte(_)
                | Operator::In(_)
                | Operator::Like(_)
                | Operator::Ilike(_)
        )
    }

    /// Wrap this operator in `not.`.
    pub fn negate(self) -> Self {
        Operator::Not(Box::new(self))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query())
    }
}
