use crate::adapters::PresetAnswers;
use crate::adapters::multi_hasher::{DEFAULT_CHUNK_SIZE, DEFAULT_MMAP_THRESHOLD};
use crate::adapters::store::DEFAULT_RESULTS_FILE;
use crate::domain::{HashAlgorithm, KeepPolicy, ScanConfig};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum HashAlgorithmChoice {
    #[value(help = "Legacy hash, compatible with older results files")]
    Md5,
    #[value(help = "Fast non-cryptographic hash")]
    Xxhash64,
    #[value(help = "xxHash variant, fast non-cryptographic hash")]
    Xxhash3,
    #[value(help = "Cryptographic hash")]
    Blake3,
    #[value(help = "Slow legacy hash")]
    Sha1,
    #[value(help = "Cryptographic hash")]
    Sha256,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KeepChoice {
    Newest,
    Oldest,
}

impl From<HashAlgorithmChoice> for HashAlgorithm {
    fn from(choice: HashAlgorithmChoice) -> Self {
        match choice {
            HashAlgorithmChoice::Md5 => HashAlgorithm::Md5,
            HashAlgorithmChoice::Xxhash64 => HashAlgorithm::XxHash64,
            HashAlgorithmChoice::Xxhash3 => HashAlgorithm::XxHash3,
            HashAlgorithmChoice::Blake3 => HashAlgorithm::Blake3,
            HashAlgorithmChoice::Sha1 => HashAlgorithm::Sha1,
            HashAlgorithmChoice::Sha256 => HashAlgorithm::Sha256,
        }
    }
}

impl From<KeepChoice> for KeepPolicy {
    fn from(choice: KeepChoice) -> Self {
        match choice {
            KeepChoice::Newest => KeepPolicy::Newest,
            KeepChoice::Oldest => KeepPolicy::Oldest,
        }
    }
}

fn parse_chunk_size(value: &str) -> Result<usize, String> {
    let size: usize = value.parse().map_err(|e| format!("{}", e))?;
    if size == 0 || !size.is_power_of_two() {
        return Err(format!("{} is not a power of two", size));
    }
    Ok(size)
}

#[derive(Parser)]
#[command(name = "dupcheck")]
#[command(about = "Find files with identical contents and remove redundant copies")]
#[command(version)]
pub struct Cli {
    #[arg(
        required = true,
        help = "Directories to scan, or .json results files saved by a previous run"
    )]
    pub paths: Vec<PathBuf>,

    #[arg(
        short = 'a',
        long = "algorithm",
        help = "Hash algorithm to use",
        value_enum,
        default_value = "md5"
    )]
    pub hash_algorithm: HashAlgorithmChoice,

    #[arg(
        long = "chunk-size",
        help = "Bytes read per chunk while hashing (power of two)",
        value_parser = parse_chunk_size,
        default_value_t = DEFAULT_CHUNK_SIZE
    )]
    pub chunk_size: usize,

    #[arg(
        long = "mmap-threshold",
        help = "File size threshold for using memory mapping (0 disables)",
        default_value_t = DEFAULT_MMAP_THRESHOLD
    )]
    pub mmap_threshold: u64,

    #[arg(
        short = 'j',
        long = "threads",
        env = "DUPCHECK_THREADS",
        help = "Number of threads to use for hashing"
    )]
    pub threads: Option<usize>,

    #[arg(
        short = 'd',
        long = "max-depth",
        help = "Maximum directory depth to scan"
    )]
    pub max_depth: Option<usize>,

    #[arg(
        short = 'e',
        long = "exclude",
        help = "Skip paths matching this glob",
        action = ArgAction::Append
    )]
    pub exclude_patterns: Vec<String>,

    #[arg(
        short = 'f',
        long = "format",
        help = "Report format",
        value_enum,
        default_value = "text"
    )]
    pub output_format: OutputFormat,

    #[arg(
        short = 'o',
        long = "output",
        help = "Report file path (stdout if not specified)"
    )]
    pub output_file: Option<PathBuf>,

    #[arg(
        long = "results-file",
        env = "DUPCHECK_RESULTS_FILE",
        help = "Where scan results are saved",
        default_value = DEFAULT_RESULTS_FILE
    )]
    pub results_file: PathBuf,

    #[arg(long = "rescan", overrides_with = "no_rescan", help = "Rescan directories of loaded results")]
    pub rescan: bool,

    #[arg(long = "no-rescan", help = "Use loaded results without rescanning")]
    pub no_rescan: bool,

    #[arg(long = "save", overrides_with = "no_save", help = "Save results without asking")]
    pub save: bool,

    #[arg(long = "no-save", help = "Do not save results")]
    pub no_save: bool,

    #[arg(long = "delete", overrides_with = "no_delete", help = "Start the deletion flow without asking")]
    pub delete: bool,

    #[arg(long = "no-delete", help = "Only report duplicates")]
    pub no_delete: bool,

    #[arg(long = "keep", value_enum, help = "Which copy to keep when deleting")]
    pub keep: Option<KeepChoice>,

    #[arg(long = "ignore-extension", help = "Treat copies with different extensions as interchangeable")]
    pub ignore_extension: bool,

    #[arg(long = "ignore-directory", help = "Treat copies in different directories as interchangeable")]
    pub ignore_directory: bool,

    #[arg(short = 'y', long = "yes", help = "Delete every redundant copy without per-file confirmation")]
    pub yes: bool,

    #[arg(long = "non-interactive", help = "Never prompt; unanswered questions take their defaults")]
    pub non_interactive: bool,

    #[arg(short = 'q', long = "quiet", help = "Suppress progress output and non-error logs")]
    pub quiet: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help = "Increase log verbosity (-v debug, -vv trace)")]
    pub verbose: u8,
}

fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// `Some(true)` when the flag is set, otherwise leave the question open.
fn opt_in(flag: bool) -> Option<bool> {
    flag.then_some(true)
}

impl Cli {
    pub fn to_scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new()
            .with_thread_count(self.threads)
            .with_exclude_patterns(self.exclude_patterns.clone());

        if let Some(max_depth) = self.max_depth {
            config = config.with_max_depth(max_depth);
        }

        config
    }

    pub fn preset_answers(&self) -> PresetAnswers {
        PresetAnswers {
            rescan: flag_pair(self.rescan, self.no_rescan),
            save: flag_pair(self.save, self.no_save),
            delete: flag_pair(self.delete, self.no_delete),
            keep: self.keep.map(KeepPolicy::from),
            ignore_extension_mismatch: opt_in(self.ignore_extension),
            ignore_directory_mismatch: opt_in(self.ignore_directory),
            blanket_confirm: opt_in(self.yes),
        }
    }
}
