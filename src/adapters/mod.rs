pub mod filesystem;
pub mod multi_hasher;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod store;

pub use filesystem::FileSystemAdapter;
pub use multi_hasher::MultiAlgorithmHasher;
pub use output::{ConsoleReportAdapter, CsvReportAdapter, JsonReportAdapter};
pub use progress::{ProgressBarAdapter, SilentProgress};
pub use prompt::{PresetAnswers, PromptAdapter};
pub use store::JsonStoreAdapter;
