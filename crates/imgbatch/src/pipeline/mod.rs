//! Row Processor and Job Runner.

pub mod context;
pub mod error;
pub mod row;
pub mod runner;

pub use context::{FailureLog, FailureReason, FailureRecord, RunReport};
pub use error::RunError;
pub use row::{RowOutcome, RowProcessor};
pub use runner::JobRunner;
