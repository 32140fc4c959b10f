//! Data module - loading, normalization, aggregation and selection

mod aggregator;
pub mod cache;
mod loader;
pub mod locale;
mod normalizer;
pub mod selection;
pub mod table;

pub use aggregator::Aggregator;
pub use loader::{DelimitedSource, DocumentSource, LoaderError, RowSource};
pub use normalizer::{columns, NormalizeError, Normalizer};
pub use selection::{Filtered, Selection};
