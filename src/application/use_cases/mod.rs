pub mod catalog;
pub mod column_filter;
pub mod header_locator;
pub mod tabular;
pub mod update_engine;
