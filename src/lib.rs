//! # postgrest-query
//!
//! > **Build the query, not the string.**
//!
//! Typed parameters for the PostgREST query dialect: filters, column
//! selection with embedded resources, ordering, pagination and `or`/`and`
//! grouping, rendered into a wire-exact query string.
//!
//! ## Quick Example
//!
//! ```
//! use postgrest_query::prelude::*;
//!
//! let defaults = vec![select(all_attributes()), limit(25)];
//! let overrides = vec![
//!     limit(10),
//!     param("name", in_(vec![string("Chico"), string("Harpo")])),
//! ];
//!
//! let params = combine_params(&defaults, &overrides);
//! let query = to_query_string(&params);
//!
//! assert!(query.contains("name=in.(%22Chico%22,%22Harpo%22)"));
//! assert!(query.contains("limit=10"));
//! assert!(!query.contains("limit=25"));
//! ```
//!
//! ## Wire Dialect
//!
//! | Param                    | Renders as                      |
//! |--------------------------|---------------------------------|
//! | `Filter("age", Gte(18))` | `age=gte.18`                    |
//! | `Select([…])`            | `select=id,actors(*)`           |
//! | `Order([…])`             | `order=name.asc.nullslast`      |
//! | `Limit(10)` / `Offset(5)`| `limit=10` / `offset=5`         |
//! | `Or([…])` / `And([…])`   | `or=(age.gte.14,age.lte.18)`    |
//! | `NestedFilter("a", …)`   | `a.limit=10`                    |

pub mod ast;
pub mod config;
pub mod error;
pub mod merge;
pub mod parser;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::config::{QueryConfig, load_params};
    pub use crate::error::*;
    pub use crate::merge::{combine_params, combine_with_mandatory};
    pub use crate::parser::parse;
    pub use crate::transpiler::{ToQuery, normalize_params, to_query_string};
}

pub use merge::{combine_params, combine_with_mandatory};
pub use transpiler::{normalize_params, to_query_string};

/// Parse a query string into params.
///
/// # Example
///
/// ```
/// use postgrest_query::{parse, to_query_string};
///
/// let params = parse("age=gte.18&order=name.asc").unwrap();
/// assert_eq!(to_query_string(&params), "age=gte.18&order=name.asc");
/// ```
pub fn parse(input: &str) -> Result<Vec<ast::Param>, error::QueryError> {
    parser::parse(input)
}
