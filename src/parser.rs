//! Query-string parser using nom.
//!
//! Reads the PostgREST wire dialect back into params. This is the inverse
//! of [`crate::transpiler`].
//!
//! # Syntax Overview
//!
//! ```text
//! select=id,actors(*)&actors.limit=10&age=gte.18&or=(a.eq.1,b.is.null)
//! ───────┬──────────  ──────┬───────  ────┬─────  ─────────┬──────────
//!        │                  │             │                │
//!        │                  │             │                └── Grouped conditions
//!        │                  │             └── Filter (column=operator.value)
//!        │                  └── Resource-scoped directive (path.key)
//!        └── Select tree
//! ```
//!
//! Values are parsed from the raw, still-encoded text: commas and
//! parentheses are structure, and only leaf tokens are percent-decoded.
//! Unquoted integer tokens come back as `Int`, everything else as `String`.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, opt, value},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, pair, preceded},
};
use percent_encoding::percent_decode_str;

use crate::ast::*;
use crate::error::{QueryError, QueryResult};
use crate::transpiler::QUOTE;

const OPERATORS: &[&str] = &[
    "eq", "neq", "lt", "lte", "gt", "gte", "in", "like", "ilike", "is", "fts", "plfts", "phfts",
    "not",
];

/// Where a value sits, which decides what ends a bare token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Right-hand side of a top-level `key=value` pair
    TopLevel,
    /// Inside `or=(…)`, `and=(…)` or `in.(…)`
    Grouped,
}

impl Context {
    fn stops(self) -> &'static [char] {
        match self {
            Context::TopLevel => &[','],
            Context::Grouped => &[',', ')'],
        }
    }
}

/// Parse a complete query string into params.
///
/// An optional leading `?` is ignored. Dotted keys become
/// [`Param::NestedFilter`] split at the last dot. Inside `or=(…)` and
/// `and=(…)` an unquoted value may contain parentheses only if they are
/// balanced.
pub fn parse(input: &str) -> QueryResult<Vec<Param>> {
    split_pairs(input)?
        .into_iter()
        .map(|(key, raw)| parse_param(key, raw))
        .collect()
}

/// Split a query string into percent-decoded `(key, value)` pairs.
///
/// The output is already decoded and must not be passed to [`raw_params`];
/// use [`parse_wire_pairs`] for that.
pub fn parse_pairs(input: &str) -> QueryResult<Vec<(String, String)>> {
    Ok(split_pairs(input)?
        .into_iter()
        .map(|(key, raw)| (decode(key), decode(raw)))
        .collect())
}

/// Split a query string into `(key, value)` pairs exactly as they appear on
/// the wire, without decoding.
pub fn parse_wire_pairs(input: &str) -> QueryResult<Vec<(String, String)>> {
    Ok(split_pairs(input)?
        .into_iter()
        .map(|(key, raw)| (key.to_string(), raw.to_string()))
        .collect())
}

/// Reinterpret wire pairs as raw filters, one per pair.
///
/// Takes still-encoded pairs, as produced by
/// [`crate::transpiler::normalize_params`] or [`parse_wire_pairs`]. Each
/// value is split on its raw commas and every segment decoded once, so
/// rendering the result reproduces the original pairs.
pub fn raw_params(pairs: &[(String, String)]) -> Vec<Param> {
    pairs
        .iter()
        .map(|(key, raw)| Param::Filter(key.clone(), Operator::Value(raw_value(raw))))
        .collect()
}

fn raw_value(raw: &str) -> Value {
    let mut segments: Vec<Value> = raw.split(',').map(|s| Value::String(decode(s))).collect();
    if segments.len() == 1 {
        segments.remove(0)
    } else {
        Value::List(segments)
    }
}

/// Parse the value half of a filter, e.g. `gte.18` or `not.in.(1,2)`.
pub fn parse_operator(raw: &str) -> QueryResult<Operator> {
    let prefix = raw.split(['.', '(']).next().unwrap_or("");
    if !OPERATORS.contains(&prefix) {
        return Err(QueryError::InvalidOperator(decode(prefix)));
    }
    complete(raw, |i: &str| operator(i, Context::TopLevel))
}

/// Parse a `select=` value.
pub fn parse_selectables(raw: &str) -> QueryResult<Vec<Selectable>> {
    complete(raw, selectables)
}

/// Parse an `order=` value.
pub fn parse_orders(raw: &str) -> QueryResult<Vec<ColumnOrder>> {
    complete(raw, orders)
}

fn parse_param(key: &str, raw: &str) -> QueryResult<Param> {
    let key = decode(key);
    match key.rsplit_once('.') {
        Some((path, last)) if !path.is_empty() && !last.is_empty() => Ok(Param::NestedFilter(
            path.to_string(),
            Box::new(parse_directive(last, raw)?),
        )),
        _ => parse_directive(&key, raw),
    }
}

fn parse_directive(key: &str, raw: &str) -> QueryResult<Param> {
    match key {
        "select" => parse_selectables(raw).map(Param::Select),
        "limit" => parse_count(raw).map(Param::Limit),
        "offset" => parse_count(raw).map(Param::Offset),
        "order" => parse_orders(raw).map(Param::Order),
        "or" => complete(raw, conditions).map(Param::Or),
        "and" => complete(raw, conditions).map(Param::And),
        column => Ok(Param::Filter(column.to_string(), parse_operator(raw)?)),
    }
}

fn parse_count(raw: &str) -> QueryResult<i64> {
    decode(raw)
        .parse()
        .map_err(|_| QueryError::InvalidValue(format!("expected an integer, got '{}'", raw)))
}

fn split_pairs(input: &str) -> QueryResult<Vec<(&str, &str)>> {
    let input = input.trim();
    let input = input.strip_prefix('?').unwrap_or(input);
    complete(input, separated_list0(char('&'), key_value))
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    pair(
        take_while1(|c: char| c != '=' && c != '&'),
        preceded(char('='), take_while(|c: char| c != '&')),
    )(input)
}

/// Run a parser over the whole input, mapping nom errors to positions.
fn complete<'a, T>(
    input: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> QueryResult<T> {
    match all_consuming(parser)(input) {
        Ok((_, out)) => Ok(out),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(QueryError::parse(
            input.len() - e.input.len(),
            format!("Unexpected input: '{}'", e.input),
        )),
        Err(nom::Err::Incomplete(_)) => Err(QueryError::parse(input.len(), "Incomplete input")),
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse an identifier (column or resource name).
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse an operator and its value.
fn operator(input: &str, ctx: Context) -> IResult<&str, Operator> {
    alt((
        map(preceded(tag("not."), |i| operator(i, ctx)), Operator::negate),
        preceded(
            tag("is."),
            alt((
                value(Operator::Null, tag("null")),
                value(Operator::True, tag("true")),
                value(Operator::False, tag("false")),
            )),
        ),
        map(preceded(tag("in."), in_list), Operator::In),
        map(preceded(tag("eq."), |i| values(i, false, ctx)), Operator::Eq),
        map(preceded(tag("neq."), |i| values(i, false, ctx)), Operator::Neq),
        map(preceded(tag("lt."), |i| values(i, true, ctx)), Operator::Lt),
        map(preceded(tag("lte."), |i| values(i, true, ctx)), Operator::Lte),
        map(preceded(tag("gt."), |i| values(i, true, ctx)), Operator::Gt),
        map(preceded(tag("gte."), |i| values(i, true, ctx)), Operator::Gte),
        map(preceded(tag("like."), |i| pattern(i, ctx)), Operator::Like),
        map(preceded(tag("ilike."), |i| pattern(i, ctx)), Operator::Ilike),
        map(|i| full_text(i, "fts", ctx), |(l, t)| Operator::Fts(l, t)),
        map(|i| full_text(i, "plfts", ctx), |(l, t)| Operator::Plfts(l, t)),
        map(|i| full_text(i, "phfts", ctx), |(l, t)| Operator::Phfts(l, t)),
    ))(input)
}

/// Parse `(a,b,…)` after `in.`.
fn in_list(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        char('('),
        separated_list0(char(','), |i| scalar(i, true, Context::Grouped)),
        char(')'),
    )(input)
}

/// Parse the value of `eq.`/`lt.`-style operators.
///
/// At the top level a comma-separated run becomes a `List`.
fn values(input: &str, quoted: bool, ctx: Context) -> IResult<&str, Value> {
    let (rest, mut items): (&str, Vec<Value>) = match ctx {
        Context::Grouped => map(opt(|i| scalar(i, quoted, ctx)), |v: Option<Value>| {
            v.into_iter().collect()
        })(input)?,
        Context::TopLevel => separated_list0(char(','), |i| scalar(i, quoted, ctx))(input)?,
    };
    let value = match items.len() {
        0 => Value::String(String::new()),
        1 => items.remove(0),
        _ => Value::List(items),
    };
    Ok((rest, value))
}

/// Parse one value token: a quoted string, an integer or bare text.
fn scalar(input: &str, quoted: bool, ctx: Context) -> IResult<&str, Value> {
    if quoted {
        if let Ok((rest, s)) = quoted_string(input, ctx) {
            return Ok((rest, Value::String(s)));
        }
    }
    map(|i| bare_token(i, ctx), |token: &str| match token.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::String(decode(token)),
    })(input)
}

/// Length of the unquoted token at the start of `input`. When grouped,
/// balanced parentheses belong to the token.
fn bare_len(input: &str, ctx: Context) -> usize {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            ',' if depth == 0 => return i,
            '(' if ctx == Context::Grouped => depth += 1,
            ')' if ctx == Context::Grouped => {
                if depth == 0 {
                    return i;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    input.len()
}

fn bare_token(input: &str, ctx: Context) -> IResult<&str, &str> {
    match bare_len(input, ctx) {
        0 => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        ))),
        len => Ok((&input[len..], &input[..len])),
    }
}

/// Unquoted text, possibly empty, decoded.
fn bare_text(input: &str, ctx: Context) -> IResult<&str, String> {
    let len = bare_len(input, ctx);
    Ok((&input[len..], decode(&input[..len])))
}

/// Parse `%22…%22`. The closing quote is the first one followed by a
/// delimiter or the end of input.
fn quoted_string(input: &str, ctx: Context) -> IResult<&str, String> {
    let (body, _) = tag(QUOTE)(input)?;
    let stops = ctx.stops();
    let mut search = 0;
    while let Some(found) = body[search..].find(QUOTE) {
        let end = search + found;
        let rest = &body[end + QUOTE.len()..];
        if rest.is_empty() || rest.starts_with(stops) {
            return Ok((rest, decode(&body[..end])));
        }
        search = end + QUOTE.len();
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

/// Parse a like pattern, quoted or bare.
fn pattern(input: &str, ctx: Context) -> IResult<&str, String> {
    if let Ok(found) = quoted_string(input, ctx) {
        return Ok(found);
    }
    bare_text(input, ctx)
}

/// Parse `fts.text`, `fts(lang).text` and the `plfts`/`phfts` variants.
fn full_text<'a>(
    input: &'a str,
    name: &'static str,
    ctx: Context,
) -> IResult<&'a str, (Option<String>, String)> {
    let (input, _) = tag(name)(input)?;
    let (input, language) = opt(delimited(char('('), identifier, char(')')))(input)?;
    let (input, _) = char('.')(input)?;
    let (input, text) = bare_text(input, ctx)?;
    Ok((input, (language.map(str::to_string), text)))
}

/// Parse `col.dir.nulls` entries separated by commas.
fn orders(input: &str) -> IResult<&str, Vec<ColumnOrder>> {
    separated_list1(char(','), column_order)(input)
}

/// Parse a single order entry. The direction defaults to ascending.
fn column_order(input: &str) -> IResult<&str, ColumnOrder> {
    let (input, column) = identifier(input)?;
    let (input, descending) = opt(preceded(
        char('.'),
        alt((value(false, tag("asc")), value(true, tag("desc")))),
    ))(input)?;
    let (input, nulls) = opt(preceded(
        char('.'),
        alt((
            value(NullOption::NullsFirst, tag("nullsfirst")),
            value(NullOption::NullsLast, tag("nullslast")),
        )),
    ))(input)?;

    let column = column.to_string();
    let order = if descending.unwrap_or(false) {
        ColumnOrder::Desc(column, nulls)
    } else {
        ColumnOrder::Asc(column, nulls)
    };
    Ok((input, order))
}

fn selectables(input: &str) -> IResult<&str, Vec<Selectable>> {
    separated_list1(char(','), selectable)(input)
}

/// Parse `name` or `name(children)`.
fn selectable(input: &str) -> IResult<&str, Selectable> {
    let (input, name) =
        take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '*' | ':' | '!' | '-'))(
            input,
        )?;
    let (input, children) = opt(delimited(
        char('('),
        separated_list0(char(','), selectable),
        char(')'),
    ))(input)?;

    let name = name.to_string();
    Ok((
        input,
        match children {
            Some(children) => Selectable::Resource(name, Vec::new(), children),
            None => Selectable::Attribute(name),
        },
    ))
}

/// Parse `(cond,cond,…)`.
fn conditions(input: &str) -> IResult<&str, Vec<Param>> {
    delimited(char('('), separated_list1(char(','), condition), char(')'))(input)
}

/// Parse one grouped condition: `or(…)`, `and(…)` or `col.op.value`.
fn condition(input: &str) -> IResult<&str, Param> {
    alt((
        map(preceded(tag("or"), conditions), Param::Or),
        map(preceded(tag("and"), conditions), Param::And),
        grouped_filter,
    ))(input)
}

/// Parse `col.op.value`, where `col` may be a dotted resource path.
fn grouped_filter(input: &str) -> IResult<&str, Param> {
    let (mut input, first) = identifier(input)?;
    let mut path = vec![first];
    loop {
        let (rest, _) = char('.')(input)?;
        if let Ok((rest, op)) = operator(rest, Context::Grouped) {
            let column = path.pop().unwrap_or_default().to_string();
            let filter = Param::Filter(column, op);
            let param = if path.is_empty() {
                filter
            } else {
                Param::NestedFilter(path.join("."), Box::new(filter))
            };
            return Ok((rest, param));
        }
        let (rest, segment) = identifier(rest)?;
        path.push(segment);
        input = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_filter() {
        let params = parse("age=gte.18").unwrap();
        assert_eq!(params, vec![param("age", gte(18))]);
    }

    #[test]
    fn test_leading_question_mark() {
        let params = parse("?limit=10&offset=20").unwrap();
        assert_eq!(params, vec![limit(10), offset(20)]);
    }

    #[test]
    fn test_empty_query() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("?").unwrap().is_empty());
    }

    #[test]
    fn test_in_list_quoted() {
        let params = parse("name=in.(%22Chico%22,%22Harpo%22)").unwrap();
        assert_eq!(
            params,
            vec![param("name", in_(vec![string("Chico"), string("Harpo")]))]
        );
    }

    #[test]
    fn test_quoted_with_parens_and_commas() {
        let op = parse_operator("in.(%22f(x)%22,%22a%2Cb%22)").unwrap();
        assert_eq!(op, in_(vec![string("f(x)"), string("a,b")]));
    }

    #[test]
    fn test_empty_in_list() {
        assert_eq!(parse_operator("in.()").unwrap(), in_(vec![]));
    }

    #[test]
    fn test_is_operators() {
        assert_eq!(parse_operator("is.null").unwrap(), null());
        assert_eq!(parse_operator("is.true").unwrap(), true_());
        assert_eq!(parse_operator("is.false").unwrap(), false_());
    }

    #[test]
    fn test_not_operator() {
        assert_eq!(parse_operator("not.is.null").unwrap(), not(null()));
        assert_eq!(parse_operator("not.eq.5").unwrap(), not(eq(5)));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(parse_operator("lt.10").unwrap(), lt(10));
        assert_eq!(parse_operator("lte.%22b%22").unwrap(), lte("b"));
        assert_eq!(parse_operator("gt.-3").unwrap(), gt(-3));
        assert_eq!(parse_operator("neq.Bob%20Lee").unwrap(), neq("Bob Lee"));
    }

    #[test]
    fn test_eq_list_at_top_level() {
        assert_eq!(
            parse_operator("eq.a,2").unwrap(),
            eq(list(vec![string("a"), int(2)]))
        );
        assert_eq!(parse_operator("eq.").unwrap(), eq(""));
    }

    #[test]
    fn test_like_patterns() {
        assert_eq!(parse_operator("like.%22*rob*%22").unwrap(), like("*rob*"));
        assert_eq!(parse_operator("ilike.*rob*").unwrap(), ilike("*rob*"));
    }

    #[test]
    fn test_full_text_search() {
        assert_eq!(parse_operator("fts.cat%20dog").unwrap(), fts("cat dog"));
        assert_eq!(
            parse_operator("plfts(english).fat%20cats").unwrap(),
            plfts_with_language("english", "fat cats")
        );
        assert_eq!(
            parse_operator("phfts(french).le%20chat").unwrap(),
            phfts_with_language("french", "le chat")
        );
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse_operator("between.1").unwrap_err();
        assert!(matches!(err, QueryError::InvalidOperator(op) if op == "between"));
    }

    #[test]
    fn test_bad_limit() {
        let err = parse("limit=ten").unwrap_err();
        assert!(matches!(err, QueryError::InvalidValue(_)));
    }

    #[test]
    fn test_orders() {
        let orders = parse_orders("name.asc,age.desc.nullsfirst,id,x.nullslast").unwrap();
        assert_eq!(
            orders,
            vec![
                asc("name"),
                desc("age").nullsfirst(),
                asc("id"),
                asc("x").nullslast(),
            ]
        );
    }

    #[test]
    fn test_select_tree() {
        let tree = parse_selectables("id,films(title,actors(*))").unwrap();
        assert_eq!(
            tree,
            vec![
                attribute("id"),
                resource(
                    "films",
                    vec![attribute("title"), resource("actors", all_attributes())]
                ),
            ]
        );
    }

    #[test]
    fn test_nested_keys() {
        let params = parse("actors.limit=10&films.actors.order=name.asc").unwrap();
        assert_eq!(
            params,
            vec![
                nested_param(&["actors"], limit(10)),
                nested_param(&["films", "actors"], order(vec![asc("name")])),
            ]
        );
    }

    #[test]
    fn test_or_group() {
        let params = parse("or=(age.gte.14,age.lte.18)").unwrap();
        assert_eq!(
            params,
            vec![or(vec![param("age", gte(14)), param("age", lte(18))])]
        );
    }

    #[test]
    fn test_nested_groups() {
        let params = parse("and=(grade.gte.90,or(age.eq.14,name.is.null))").unwrap();
        assert_eq!(
            params,
            vec![and(vec![
                param("grade", gte(90)),
                or(vec![param("age", eq(14)), param("name", null())]),
            ])]
        );
    }

    #[test]
    fn test_column_starting_with_group_keyword() {
        let params = parse("or=(order_id.eq.1,android.is.true)").unwrap();
        assert_eq!(
            params,
            vec![or(vec![param("order_id", eq(1)), param("android", true_())])]
        );
    }

    #[test]
    fn test_grouped_resource_path() {
        let params = parse("or=(actors.name.eq.Bob,id.eq.2)").unwrap();
        assert_eq!(
            params,
            vec![or(vec![
                nested_param(&["actors"], param("name", eq("Bob"))),
                param("id", eq(2)),
            ])]
        );
    }

    #[test]
    fn test_parse_pairs_decodes() {
        let pairs = parse_pairs("name=eq.Ann%20Lee&limit=1").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "eq.Ann Lee".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_wire_pairs_stay_encoded() {
        let pairs = parse_wire_pairs("note=eq.100%2525&or=(a.eq.1,b.eq.2)").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("note".to_string(), "eq.100%2525".to_string()),
                ("or".to_string(), "(a.eq.1,b.eq.2)".to_string()),
            ]
        );
    }

    #[test]
    fn test_raw_params_split_on_raw_commas() {
        let pairs = vec![
            ("select".to_string(), "id,title".to_string()),
            ("name".to_string(), "eq.a%2Cb".to_string()),
        ];
        assert_eq!(
            raw_params(&pairs),
            vec![
                param("select", raw(list(vec![string("id"), string("title")]))),
                param("name", raw("eq.a,b")),
            ]
        );
    }

    #[test]
    fn test_grouped_value_with_balanced_parens() {
        let params = parse("or=(name.eq.f(x),id.eq.1)").unwrap();
        assert_eq!(
            params,
            vec![or(vec![param("name", eq("f(x)")), param("id", eq(1))])]
        );
        assert_eq!(
            parse_operator("in.(g(h(1)),2)").unwrap(),
            in_(vec![string("g(h(1))"), int(2)])
        );
    }

    #[test]
    fn test_grouped_value_with_unbalanced_paren_is_error() {
        assert!(parse("or=(name.eq.f(x,id.eq.1)").is_err());
    }

    #[test]
    fn test_missing_equals_is_error() {
        let err = parse("limit").unwrap_err();
        assert!(matches!(err, QueryError::Parse { position: 0, .. }));
    }
}
