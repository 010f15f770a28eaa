pub mod use_cases;

pub use use_cases::catalog::CatalogService;
pub use use_cases::update_engine::{AttributeSelector, UpdateEngine, UpdateSpec};
