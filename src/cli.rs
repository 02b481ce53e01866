use clap::Parser;
use std::path::PathBuf;

/// Structure-aware find and replace for Markdown documents.
///
/// `mdfr` applies ordered find/replace patterns to document files while
/// understanding frontmatter, fenced code blocks, and tables, so cleanup
/// patterns can skip the regions they must not touch.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Structure-aware find and replace for Markdown documents",
    long_about = "mdfr - Apply ordered find/replace patterns to Markdown files with \
structural awareness of frontmatter, fenced code blocks, and tables.

QUICK EXAMPLES:
  mdfr --path notes/ --pattern '*.md' --find foo --replace bar
  mdfr --path doc.md --patterns-file patterns.yaml --pattern-name remove_trailing_spaces
  mdfr --path notes/ --patterns-file patterns.yaml \\
       --pattern-list-file lists.yaml --pattern-list-name cleanup --dry-run

Pattern catalogs are YAML or JSON mappings:
  remove_trailing_spaces:
    find: ' +$'
    replace: ''
    skip_code_blocks: true"
)]
pub struct Args {
    /// File or directory path to process.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// File glob to match under a directory (e.g. "*.md").
    #[arg(long)]
    pub pattern: Option<String>,

    /// Find pattern (regex unless --no-regex).
    #[arg(long)]
    pub find: Option<String>,

    /// Replace pattern; supports $1, $2, ... backreferences.
    #[arg(long)]
    pub replace: Option<String>,

    /// Treat the find pattern as plain text.
    #[arg(long)]
    pub no_regex: bool,

    /// Disable recursive directory search.
    #[arg(long)]
    pub no_recursive: bool,

    /// Show changes without applying them.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the pattern catalog YAML/JSON file.
    #[arg(long)]
    pub patterns_file: Option<PathBuf>,

    /// Name of a single pattern to use from the catalog.
    #[arg(long)]
    pub pattern_name: Option<String>,

    /// Path to the pattern list YAML/JSON file.
    #[arg(long)]
    pub pattern_list_file: Option<PathBuf>,

    /// Name of the pattern list to use.
    #[arg(long)]
    pub pattern_list_name: Option<String>,

    /// End output files with exactly one trailing newline.
    #[arg(long)]
    pub ensure_new_line: bool,

    /// Path to a run configuration YAML/JSON file; CLI flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
