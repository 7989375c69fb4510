pub mod deletion;
pub mod partition;
pub mod scanner;
pub mod session;

pub use deletion::DeletionEngine;
pub use scanner::ScannerService;
pub use session::{ArgumentOutcome, DedupeSession, RunSummary};
