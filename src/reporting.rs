//! Backend reporting of finished sessions.

pub mod backend_reporter;
pub mod types;

pub use backend_reporter::{BackendReporter, ReportSink};
pub use types::SessionSummary;
