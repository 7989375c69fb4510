use clap::Parser;
use dupcheck::adapters::{
    ConsoleReportAdapter, CsvReportAdapter, FileSystemAdapter, JsonReportAdapter, JsonStoreAdapter,
    MultiAlgorithmHasher, ProgressBarAdapter, PromptAdapter,
};
use dupcheck::cli::{Cli, OutputFormat};
use dupcheck::domain::HashAlgorithm;
use dupcheck::logging::init_logging;
use dupcheck::ports::ReportPort;
use dupcheck::services::DedupeSession;
use std::process;

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose, args.quiet);

    let algorithm: HashAlgorithm = args.hash_algorithm.clone().into();
    let hasher = MultiAlgorithmHasher::new(algorithm)
        .with_chunk_size(args.chunk_size)
        .with_mmap_threshold(args.mmap_threshold);
    let progress = ProgressBarAdapter::new().with_quiet(args.quiet);

    let reporter: Box<dyn ReportPort> = match (&args.output_format, &args.output_file) {
        (OutputFormat::Text, None) => Box::new(ConsoleReportAdapter::with_stdout()),
        (OutputFormat::Text, Some(path)) => Box::new(ConsoleReportAdapter::with_file(path)),
        (OutputFormat::Json, None) => Box::new(JsonReportAdapter::with_stdout()),
        (OutputFormat::Json, Some(path)) => Box::new(JsonReportAdapter::with_file(path)),
        (OutputFormat::Csv, None) => Box::new(CsvReportAdapter::with_stdout()),
        (OutputFormat::Csv, Some(path)) => Box::new(CsvReportAdapter::with_file(path)),
    };

    let preset = args.preset_answers();
    let prompts = if args.non_interactive {
        PromptAdapter::non_interactive(preset)
    } else {
        PromptAdapter::new(preset)
    };
    if prompts.is_interactive() {
        if let Err(e) = prompts.install_interrupt_handler() {
            log::warn!("{:#}", e);
        }
    }

    let session = DedupeSession::new(
        FileSystemAdapter::new(),
        hasher,
        progress,
        JsonStoreAdapter::new(args.results_file.clone()),
        reporter,
        Box::new(prompts),
    )
    .with_scan_config(args.to_scan_config())
    .with_algorithm(algorithm);

    let summary = session.run(&args.paths);
    if !summary.succeeded() {
        if !summary.failures.is_empty() {
            eprintln!(
                "{} of {} arguments failed",
                summary.failures.len(),
                args.paths.len()
            );
        }
        process::exit(1);
    }
}
