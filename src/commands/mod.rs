pub mod analyze;
pub mod report;

// Re-export command functions for convenience
pub use analyze::{analyze, summarize, AnalysisSummary};
pub use report::{compute_report, run_report, FeedData, ReportOptions, ReportOutcome};
