//! Query-string transpiler for the param AST.
//!
//! Converts params into `(key, value)` pairs and finally into the
//! `key=value&key=value` text that follows `?` in a PostgREST URL.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::ast::*;

/// Characters left alone by the URI component encoder.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encoded double quote used to delimit quoted values.
pub const QUOTE: &str = "%22";

/// Trait for converting AST nodes to their wire text.
pub trait ToQuery {
    /// Convert this node to query-string text.
    fn to_query(&self) -> String;
}

/// Percent-encode a string as a URI component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Render a value. Quoted strings are wrapped in `%22` after encoding.
pub fn stringify_value(value: &Value, quoted: bool) -> String {
    match value {
        Value::String(s) => {
            let encoded = encode_component(s);
            if quoted {
                format!("{QUOTE}{encoded}{QUOTE}")
            } else {
                encoded
            }
        }
        Value::Int(n) => n.to_string(),
        Value::List(values) => values
            .iter()
            .map(|v| stringify_value(v, quoted))
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn full_text_search(prefix: &str, language: &Option<String>, text: &str) -> String {
    match language {
        Some(lang) => format!("{prefix}({lang}).{}", encode_component(text)),
        None => format!("{prefix}.{}", encode_component(text)),
    }
}

impl ToQuery for Operator {
    fn to_query(&self) -> String {
        let quoted = self.quotes_value();
        match self {
            Operator::Eq(v)
            | Operator::Neq(v)
            | Operator::Lt(v)
            | Operator::Lte(v)
            | Operator::Gt(v)
            | Operator::Gte(v) => format!("{}.{}", self.prefix(), stringify_value(v, quoted)),
            Operator::In(values) => {
                let items: Vec<String> = values.iter().map(|v| stringify_value(v, quoted)).collect();
                format!("{}.({})", self.prefix(), items.join(","))
            }
            Operator::Like(pattern) | Operator::Ilike(pattern) => {
                let pattern = Value::String(pattern.clone());
                format!("{}.{}", self.prefix(), stringify_value(&pattern, quoted))
            }
            Operator::Null => format!("{}.null", self.prefix()),
            Operator::True => format!("{}.true", self.prefix()),
            Operator::False => format!("{}.false", self.prefix()),
            Operator::Fts(lang, text) | Operator::Plfts(lang, text) | Operator::Phfts(lang, text) => {
                full_text_search(self.prefix(), lang, text)
            }
            Operator::Not(inner) => format!("{}.{}", self.prefix(), inner.to_query()),
            Operator::Value(v) => stringify_value(v, quoted),
        }
    }
}

impl ToQuery for ColumnOrder {
    fn to_query(&self) -> String {
        let dir = match self {
            ColumnOrder::Asc(..) => "asc",
            ColumnOrder::Desc(..) => "desc",
        };
        match self.nulls() {
            Some(nulls) => format!("{}.{}.{}", self.column(), dir, nulls.as_str()),
            None => format!("{}.{}", self.column(), dir),
        }
    }
}

impl ToQuery for Selectable {
    fn to_query(&self) -> String {
        match self {
            Selectable::Attribute(name) => name.clone(),
            Selectable::Resource(name, _, children) if children.is_empty() => name.clone(),
            Selectable::Resource(name, _, children) => {
                format!("{}({})", name, join_selectables(children))
            }
        }
    }
}

fn join_selectables(selectables: &[Selectable]) -> String {
    selectables
        .iter()
        .map(|s| s.to_query())
        .collect::<Vec<_>>()
        .join(",")
}

impl Param {
    /// The query-string key for this param.
    pub fn key(&self) -> String {
        match self {
            Param::Filter(column, _) => column.clone(),
            Param::NestedFilter(path, inner) => format!("{}.{}", path, inner.key()),
            Param::Select(_) => "select".to_string(),
            Param::Limit(_) => "limit".to_string(),
            Param::Offset(_) => "offset".to_string(),
            Param::Order(_) => "order".to_string(),
            Param::Or(_) => "or".to_string(),
            Param::And(_) => "and".to_string(),
        }
    }

    /// The query-string value for this param. Hoisted resource params of a
    /// `Select` are not included; see [`normalize_params`].
    pub fn value(&self) -> String {
        match self {
            Param::Filter(_, op) => op.to_query(),
            Param::NestedFilter(_, inner) => inner.value(),
            Param::Select(selectables) => join_selectables(selectables),
            Param::Limit(n) | Param::Offset(n) => n.to_string(),
            Param::Order(orders) => orders
                .iter()
                .map(|o| o.to_query())
                .collect::<Vec<_>>()
                .join(","),
            Param::Or(params) | Param::And(params) => wrap_conditions(params),
        }
    }
}

impl ToQuery for Param {
    fn to_query(&self) -> String {
        self.value()
    }
}

/// Render one pair inside an `or=(…)`/`and=(…)` group.
///
/// Nested groups read `and(…)`, everything else `key.value`.
pub fn param_to_inner_string((key, value): &(String, String)) -> String {
    match key.as_str() {
        "and" | "or" => format!("{key}{value}"),
        _ => format!("{key}.{value}"),
    }
}

/// Render grouped conditions as `(cond,cond,…)`.
pub fn wrap_conditions(params: &[Param]) -> String {
    let inner: Vec<String> = normalize_params(params)
        .iter()
        .map(param_to_inner_string)
        .collect();
    format!("({})", inner.join(","))
}

/// Hoist resource-scoped params out of a select tree.
///
/// Walks depth-first; each scoped param becomes one pair keyed by the dotted
/// path of every ancestor resource plus its own key.
pub fn nested_params(selectables: &[Selectable]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut path = Vec::new();
    collect_nested(selectables, &mut path, &mut pairs);
    pairs
}

fn collect_nested<'a>(
    selectables: &'a [Selectable],
    path: &mut Vec<&'a str>,
    pairs: &mut Vec<(String, String)>,
) {
    for selectable in selectables {
        if let Selectable::Resource(name, params, children) = selectable {
            path.push(name);
            let prefix = path.join(".");
            for p in params {
                pairs.push((format!("{}.{}", prefix, p.key()), p.value()));
            }
            collect_nested(children, path, pairs);
            path.pop();
        }
    }
}

/// Flatten params into ordered `(key, value)` pairs.
pub fn normalize_params(params: &[Param]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for p in params {
        pairs.push((p.key(), p.value()));
        if let Param::Select(selectables) = p {
            pairs.extend(nested_params(selectables));
        }
    }
    tracing::trace!(params = params.len(), pairs = pairs.len(), "normalized params");
    pairs
}

/// Render params as `key=value&key=value`. No leading `?`.
pub fn to_query_string(params: &[Param]) -> String {
    normalize_params(params)
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stringify_string_unquoted() {
        assert_eq!(stringify_value(&string("a b&c"), false), "a%20b%26c");
    }

    #[test]
    fn test_stringify_string_quoted() {
        assert_eq!(stringify_value(&string("Chico"), true), "%22Chico%22");
    }

    #[test]
    fn test_stringify_int() {
        assert_eq!(stringify_value(&int(-42), true), "-42");
        assert_eq!(stringify_value(&int(7), false), "7");
    }

    #[test]
    fn test_stringify_nested_list() {
        let v = list(vec![int(1), list(vec![string("x"), int(2)])]);
        assert_eq!(stringify_value(&v, false), "1,x,2");
        assert_eq!(stringify_value(&v, true), "1,%22x%22,2");
    }

    #[test]
    fn test_comma_in_string_is_encoded() {
        assert_eq!(stringify_value(&string("a,b"), false), "a%2Cb");
    }

    #[test]
    fn test_unreserved_marks_pass_through() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn test_operators() {
        assert_eq!(eq("active").to_query(), "eq.active");
        assert_eq!(neq(3).to_query(), "neq.3");
        assert_eq!(lt(10).to_query(), "lt.10");
        assert_eq!(lte("b").to_query(), "lte.%22b%22");
        assert_eq!(gt("2020-01-01").to_query(), "gt.%222020-01-01%22");
        assert_eq!(gte(18).to_query(), "gte.18");
        assert_eq!(like("*rob*").to_query(), "like.%22*rob*%22");
        assert_eq!(ilike("Ann Lee").to_query(), "ilike.%22Ann%20Lee%22");
        assert_eq!(null().to_query(), "is.null");
        assert_eq!(true_().to_query(), "is.true");
        assert_eq!(false_().to_query(), "is.false");
    }

    #[test]
    fn test_rendered_quoting_follows_quotes_value() {
        for op in [
            eq("x"),
            neq("x"),
            lt("x"),
            lte("x"),
            gt("x"),
            gte("x"),
            in_(vec![string("x")]),
            like("x"),
            ilike("x"),
            fts("x"),
            raw("x"),
        ] {
            assert_eq!(op.to_query().contains(QUOTE), op.quotes_value(), "{op:?}");
        }
    }

    #[test]
    fn test_in_operator() {
        let op = in_(vec![string("Chico"), string("Harpo")]);
        assert_eq!(op.to_query(), "in.(%22Chico%22,%22Harpo%22)");
        assert_eq!(in_(vec![int(1), int(2)]).to_query(), "in.(1,2)");
        assert_eq!(in_(vec![]).to_query(), "in.()");
    }

    #[test]
    fn test_full_text_search() {
        assert_eq!(fts("cat dog").to_query(), "fts.cat%20dog");
        assert_eq!(
            plfts_with_language("english", "fat cats").to_query(),
            "plfts(english).fat%20cats"
        );
        assert_eq!(
            phfts_with_language("french", "le chat").to_query(),
            "phfts(french).le%20chat"
        );
    }

    #[test]
    fn test_not_and_raw() {
        assert_eq!(not(null()).to_query(), "not.is.null");
        assert_eq!(not(not(eq(1))).to_query(), "not.not.eq.1");
        assert_eq!(raw("eq.5").to_query(), "eq.5");
    }

    #[test]
    fn test_orders() {
        assert_eq!(asc("name").to_query(), "name.asc");
        assert_eq!(desc("age").nullsfirst().to_query(), "age.desc.nullsfirst");
        let p = order(vec![asc("a").nullslast(), desc("b")]);
        assert_eq!(p.value(), "a.asc.nullslast,b.desc");
    }

    #[test]
    fn test_selectables() {
        assert_eq!(attribute("id").to_query(), "id");
        assert_eq!(resource("actors", vec![]).to_query(), "actors");
        let tree = resource(
            "films",
            vec![attribute("title"), resource("actors", attributes(["name"]))],
        );
        assert_eq!(tree.to_query(), "films(title,actors(name))");
    }

    #[test]
    fn test_keys() {
        assert_eq!(param("age", gte(1)).key(), "age");
        assert_eq!(select(vec![]).key(), "select");
        assert_eq!(limit(1).key(), "limit");
        assert_eq!(offset(1).key(), "offset");
        assert_eq!(order(vec![]).key(), "order");
        assert_eq!(or(vec![]).key(), "or");
        assert_eq!(and(vec![]).key(), "and");
        assert_eq!(
            nested_param(&["actors"], nested_param(&["roles"], limit(2))).key(),
            "actors.roles.limit"
        );
    }

    #[test]
    fn test_nested_filter_value_drops_path() {
        let p = nested_param(&["actors"], param("name", eq("Bob")));
        assert_eq!(p.key(), "actors.name");
        assert_eq!(p.value(), "eq.Bob");
    }

    #[test]
    fn test_or_group() {
        let p = or(vec![param("age", gte(14)), param("age", lte(18))]);
        assert_eq!(p.value(), "(age.gte.14,age.lte.18)");
    }

    #[test]
    fn test_nested_groups_skip_dot() {
        let p = and(vec![
            param("grade", gte(90)),
            or(vec![param("age", eq(14)), param("age", eq(15))]),
        ]);
        assert_eq!(p.value(), "(grade.gte.90,or(age.eq.14,age.eq.15))");
    }

    #[test]
    fn test_param_to_inner_string() {
        let pair = ("and".to_string(), "(a.eq.1)".to_string());
        assert_eq!(param_to_inner_string(&pair), "and(a.eq.1)");
        let pair = ("android".to_string(), "eq.1".to_string());
        assert_eq!(param_to_inner_string(&pair), "android.eq.1");
    }

    #[test]
    fn test_hoisting_order_follows_tree() {
        let tree = vec![
            resource("a", vec![resource("b", vec![]).with_param(limit(1))]).with_param(offset(2)),
            resource("c", vec![]).with_param(order(vec![asc("x")])),
        ];
        assert_eq!(
            nested_params(&tree),
            vec![
                ("a.offset".to_string(), "2".to_string()),
                ("a.b.limit".to_string(), "1".to_string()),
                ("c.order".to_string(), "x.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_pair_comes_before_hoisted_pairs() {
        let params = vec![select(vec![
            attribute("id"),
            resource("actors", all_attributes()).with_param(limit(10)),
        ])];
        assert_eq!(to_query_string(&params), "select=id,actors(*)&actors.limit=10");
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(to_query_string(&[]), "");
    }
}
