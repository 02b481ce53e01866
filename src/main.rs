//! The main entry point for the `mdfr` command-line application.
//!
//! Parses arguments, merges in an optional config file, loads the pattern
//! sequence, and hands the run to the file processor.

use mdfr::cli;
use mdfr::config::{Config, ConfigLoader, FileResolver};
use mdfr::errors::Result;
use mdfr::patterns::PatternLoader;
use mdfr::processor::FileProcessor;
use mdfr::report::{ChangeReporter, detect_color};
use std::io;

fn main() -> Result<()> {
    let args = cli::parse_args();

    let config = match &args.config {
        Some(path) => Config::merge(ConfigLoader::load(path)?, &args),
        None => Config::merge(Config::default(), &args),
    };

    let resolver = FileResolver::new(args.config.as_deref());
    let mut reporter = ChangeReporter::new(io::stdout().lock(), detect_color());
    let patterns = PatternLoader::new(&config, &resolver).load(&mut reporter)?;

    let mut processor = FileProcessor::new(config, reporter)?;
    processor.process_files(&patterns)
}
