pub mod registry;

pub use registry::YearRegistry;
