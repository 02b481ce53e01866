use crate::cli::Args;
use crate::errors::Result;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A run configuration, assembled from a YAML/JSON config file and/or CLI
/// flags. CLI values override file values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File or directory to process. Defaults to the current directory.
    pub path: Option<PathBuf>,
    /// Glob for matching files under a directory (e.g. `*.md`).
    pub pattern: Option<String>,
    /// Ad hoc find pattern, paired with `replace`.
    pub find: Option<String>,
    /// Ad hoc replacement, paired with `find`.
    pub replace: Option<String>,
    /// Whether the ad hoc pattern is a regex.
    pub is_regex: bool,
    /// Whether directory walks descend into subdirectories.
    pub recursive: bool,
    /// Compute and report changes without writing them.
    pub dry_run: bool,
    /// Path to the pattern catalog file.
    pub patterns_file: Option<PathBuf>,
    /// Name of a single catalog entry to apply.
    pub pattern_name: Option<String>,
    /// Path to the pattern list file.
    pub pattern_list_file: Option<PathBuf>,
    /// Name of the pattern list to apply.
    pub pattern_list_name: Option<String>,
    /// Force output files to end with exactly one newline.
    pub ensure_new_line: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            pattern: None,
            find: None,
            replace: None,
            is_regex: true,
            recursive: true,
            dry_run: false,
            patterns_file: None,
            pattern_name: None,
            pattern_list_file: None,
            pattern_list_name: None,
            ensure_new_line: false,
        }
    }
}

impl Config {
    /// Overlays CLI flags onto a base configuration.
    ///
    /// Options override only when given; the off-switches `--no-regex` and
    /// `--no-recursive` and the on-switches `--dry-run`/`--ensure-new-line`
    /// always win over file values when present.
    pub fn merge(mut base: Config, args: &Args) -> Config {
        if let Some(path) = &args.path {
            base.path = Some(path.clone());
        }
        if let Some(pattern) = &args.pattern {
            base.pattern = Some(pattern.clone());
        }
        if let Some(find) = &args.find {
            base.find = Some(find.clone());
        }
        if let Some(replace) = &args.replace {
            base.replace = Some(replace.clone());
        }
        if let Some(patterns_file) = &args.patterns_file {
            base.patterns_file = Some(patterns_file.clone());
        }
        if let Some(pattern_name) = &args.pattern_name {
            base.pattern_name = Some(pattern_name.clone());
        }
        if let Some(pattern_list_file) = &args.pattern_list_file {
            base.pattern_list_file = Some(pattern_list_file.clone());
        }
        if let Some(pattern_list_name) = &args.pattern_list_name {
            base.pattern_list_name = Some(pattern_list_name.clone());
        }
        if args.no_regex {
            base.is_regex = false;
        }
        if args.no_recursive {
            base.recursive = false;
        }
        if args.dry_run {
            base.dry_run = true;
        }
        if args.ensure_new_line {
            base.ensure_new_line = true;
        }
        base
    }
}

/// A utility for loading run configurations from YAML or JSON files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a `Config` from a YAML or JSON file, chosen by extension.
    pub fn load(path: &Path) -> Result<Config> {
        let file = File::open(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Ok(serde_yaml::from_reader(file)?)
        } else {
            Ok(serde_json::from_reader(file)?)
        }
    }
}

/// Resolves relative paths named inside a config file.
///
/// Absolute paths are returned as-is. A relative path is tried against the
/// directory containing the config file first, then returned as given so the
/// caller falls back to the current working directory.
pub struct FileResolver {
    config_dir: Option<PathBuf>,
}

impl FileResolver {
    pub fn new(config_file: Option<&Path>) -> Self {
        Self {
            config_dir: config_file.and_then(|path| path.parent().map(Path::to_path_buf)),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        if let Some(dir) = &self.config_dir {
            let candidate = dir.join(path);
            if candidate.exists() {
                return candidate;
            }
        }
        path.to_path_buf()
    }
}
