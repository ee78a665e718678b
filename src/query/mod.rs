//! Query model: the executable query tree, its leaves and combinators, and
//! the text front-end that builds trees from query strings.

pub mod complex;
pub mod exact;
pub mod lexer;
pub mod parser;
#[allow(clippy::module_inception)]
pub mod query;

pub use self::complex::{ComplexQuery, Policy};
pub use self::exact::ExactQuery;
pub use self::lexer::{QueryFragment, split_query};
pub use self::parser::parse_query;
pub use self::query::{Match, Query};
