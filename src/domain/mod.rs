// ============================================================
// DOMAIN LAYER
// ============================================================
// Pure types and pure functions shared by every layer.
// No I/O, no async, no external services.

pub mod error;
pub mod grid;
pub mod outcome;
pub mod record;
pub mod year;

pub use error::{AppError, Result};
pub use grid::{Cell, CellGrid};
pub use outcome::UpdateOutcome;
pub use record::RowRecord;
