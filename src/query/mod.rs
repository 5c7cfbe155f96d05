pub use context::QueryContext;
pub use filter::{select, Attributes, FilterAttributes, Matcher};
pub use projection::{FlowCache, RATES, REFRESH, TOTALS};
pub use sort::{sort_by_name, SortAttributes, SortBy, SortField};

mod context;
mod filter;
mod projection;
mod sort;
