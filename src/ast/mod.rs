pub mod builders;
pub mod operators;
pub mod order;
pub mod params;
pub mod select;
pub mod values;

pub use self::operators::Operator;
pub use self::order::{ColumnOrder, NullOption};
pub use self::params::Param;
pub use self::select::Selectable;
pub use self::values::Value;
