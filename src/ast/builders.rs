//! Ergonomic builder functions for query params.
//!
//! Short helpers to construct AST nodes without spelling out the enums.
//!
//! # Example
//! ```
//! use postgrest_query::ast::builders::*;
//! use postgrest_query::to_query_string;
//!
//! let params = vec![
//!     select(vec![
//!         attribute("id"),
//!         resource("actors", all_attributes()).with_param(limit(10)),
//!     ]),
//!     param("age", gte(18)),
//!     order(vec![desc("created_at").nullslast()]),
//! ];
//!
//! assert_eq!(
//!     to_query_string(&params),
//!     "select=id,actors(*)&actors.limit=10&age=gte.18&order=created_at.desc.nullslast"
//! );
//! ```

use crate::ast::{ColumnOrder, Operator, Param, Selectable, Value};

// Values

pub fn string(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

pub fn int(n: i64) -> Value {
    Value::Int(n)
}

pub fn list(values: impl IntoIterator<Item = Value>) -> Value {
    Value::List(values.into_iter().collect())
}

// Operators

pub fn eq(value: impl Into<Value>) -> Operator {
    Operator::Eq(value.into())
}

pub fn neq(value: impl Into<Value>) -> Operator {
    Operator::Neq(value.into())
}

pub fn lt(value: impl Into<Value>) -> Operator {
    Operator::Lt(value.into())
}

pub fn lte(value: impl Into<Value>) -> Operator {
    Operator::Lte(value.into())
}

pub fn gt(value: impl Into<Value>) -> Operator {
    Operator::Gt(value.into())
}

pub fn gte(value: impl Into<Value>) -> Operator {
    Operator::Gte(value.into())
}

/// `in.(…)` over the given values.
pub fn in_(values: impl IntoIterator<Item = Value>) -> Operator {
    Operator::In(values.into_iter().collect())
}

pub fn like(pattern: impl Into<String>) -> Operator {
    Operator::Like(pattern.into())
}

pub fn ilike(pattern: impl Into<String>) -> Operator {
    Operator::Ilike(pattern.into())
}

pub fn null() -> Operator {
    Operator::Null
}

pub fn true_() -> Operator {
    Operator::True
}

pub fn false_() -> Operator {
    Operator::False
}

pub fn fts(text: impl Into<String>) -> Operator {
    Operator::Fts(None, text.into())
}

pub fn fts_with_language(language: impl Into<String>, text: impl Into<String>) -> Operator {
    Operator::Fts(Some(language.into()), text.into())
}

pub fn plfts(text: impl Into<String>) -> Operator {
    Operator::Plfts(None, text.into())
}

pub fn plfts_with_language(language: impl Into<String>, text: impl Into<String>) -> Operator {
    Operator::Plfts(Some(language.into()), text.into())
}

pub fn phfts(text: impl Into<String>) -> Operator {
    Operator::Phfts(None, text.into())
}

pub fn phfts_with_language(language: impl Into<String>, text: impl Into<String>) -> Operator {
    Operator::Phfts(Some(language.into()), text.into())
}

pub fn not(op: Operator) -> Operator {
    op.negate()
}

/// Raw value, rendered without any operator prefix.
pub fn raw(value: impl Into<Value>) -> Operator {
    Operator::Value(value.into())
}

// Ordering

pub fn asc(column: impl Into<String>) -> ColumnOrder {
    ColumnOrder::Asc(column.into(), None)
}

pub fn desc(column: impl Into<String>) -> ColumnOrder {
    ColumnOrder::Desc(column.into(), None)
}

pub fn nullsfirst(order: ColumnOrder) -> ColumnOrder {
    order.nullsfirst()
}

pub fn nullslast(order: ColumnOrder) -> ColumnOrder {
    order.nullslast()
}

// Selectables

pub fn attribute(name: impl Into<String>) -> Selectable {
    Selectable::Attribute(name.into())
}

pub fn attributes<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Vec<Selectable> {
    names.into_iter().map(attribute).collect()
}

/// `*`
pub fn all_attributes() -> Vec<Selectable> {
    vec![attribute("*")]
}

pub fn resource(name: impl Into<String>, children: Vec<Selectable>) -> Selectable {
    Selectable::Resource(name.into(), Vec::new(), children)
}

pub fn resource_with_params(
    name: impl Into<String>,
    params: Vec<Param>,
    children: Vec<Selectable>,
) -> Selectable {
    Selectable::Resource(name.into(), params, children)
}

// Params

/// `column=op`
pub fn param(column: impl Into<String>, op: Operator) -> Param {
    Param::Filter(column.into(), op)
}

/// Same as [`param`].
pub fn filter(column: impl Into<String>, op: Operator) -> Param {
    param(column, op)
}

pub fn nested_param(path: &[&str], inner: Param) -> Param {
    Param::NestedFilter(path.join("."), Box::new(inner))
}

pub fn select(selectables: Vec<Selectable>) -> Param {
    Param::Select(selectables)
}

pub fn limit(n: i64) -> Param {
    Param::Limit(n)
}

pub fn offset(n: i64) -> Param {
    Param::Offset(n)
}

pub fn order(orders: Vec<ColumnOrder>) -> Param {
    Param::Order(orders)
}

pub fn or(params: Vec<Param>) -> Param {
    Param::Or(params)
}

pub fn and(params: Vec<Param>) -> Param {
    Param::And(params)
}
