use serde::{Deserialize, Serialize};

use crate::transpiler::ToQuery;

/// Where NULLs sort relative to other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOption {
    NullsFirst,
    NullsLast,
}

impl NullOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullOption::NullsFirst => "nullsfirst",
            NullOption::NullsLast => "nullslast",
        }
    }
}

/// Sort direction for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrder {
    Asc(String, Option<NullOption>),
    Desc(String, Option<NullOption>),
}

impl ColumnOrder {
    /// The column this order applies to.
    pub fn column(&self) -> &str {
        match self {
            ColumnOrder::Asc(column, _) | ColumnOrder::Desc(column, _) => column,
        }
    }

    pub fn nulls(&self) -> Option<NullOption> {
        match self {
            ColumnOrder::Asc(_, nulls) | ColumnOrder::Desc(_, nulls) => *nulls,
        }
    }

    /// Same direction and column, NULLs first.
    pub fn nullsfirst(self) -> Self {
        self.with_nulls(NullOption::NullsFirst)
    }

    /// Same direction and column, NULLs last.
    pub fn nullslast(self) -> Self {
        self.with_nulls(NullOption::NullsLast)
    }

    fn with_nulls(self, nulls: NullOption) -> Self {
        match self {
            ColumnOrder::Asc(column, _) => ColumnOrder::Asc(column, Some(nulls)),
            ColumnOrder::Desc(column, _) => ColumnOrder::Desc(column, Some(nulls)),
        }
    }
}

impl std::fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query())
    }
}
