use crate::config::{Config, FileResolver};
use crate::errors::Result;
use crate::report::ChangeReporter;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A named find/replace rule, regex or literal, with per-pattern exclusion
/// flags. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pattern {
    /// The pattern's name; for catalog entries this is the catalog key.
    #[serde(default)]
    pub name: String,
    /// Regex pattern or literal substring to search for.
    pub find: String,
    /// Replacement template (`$1`, `$2`, ... backreferences) or literal text.
    pub replace: String,
    /// `false` switches to literal substring matching.
    #[serde(default = "default_true")]
    pub is_regex: bool,
    /// Skip code-block regions (frontmatter included) when applying.
    #[serde(default)]
    pub skip_code_blocks: bool,
    /// Skip table regions when applying.
    #[serde(default)]
    pub skip_tables: bool,
}

fn default_true() -> bool {
    true
}

/// A pattern catalog file: mapping from pattern name to its definition.
type Catalog = HashMap<String, Pattern>;

/// A pattern list file: mapping from list name to an ordered sequence of
/// catalog entry names.
type PatternLists = HashMap<String, Vec<String>>;

/// Resolves the run's ordered pattern sequence from the configured sources:
/// an ad hoc `find`/`replace` pair, a single named catalog entry, and a named
/// list of catalog entries, in that order.
pub struct PatternLoader<'a> {
    config: &'a Config,
    resolver: &'a FileResolver,
}

impl<'a> PatternLoader<'a> {
    pub fn new(config: &'a Config, resolver: &'a FileResolver) -> Self {
        Self { config, resolver }
    }

    /// Loads all configured patterns, writing diagnostics to the injected
    /// reporter. Failures to read a catalog or list file are reported and
    /// skipped; the returned sequence holds whatever could be resolved.
    pub fn load<W: Write>(&self, reporter: &mut ChangeReporter<W>) -> Result<Vec<Pattern>> {
        let mut patterns = Vec::new();

        if let (Some(find), Some(replace)) = (&self.config.find, &self.config.replace) {
            patterns.push(Pattern {
                name: "command_line".to_string(),
                find: find.clone(),
                replace: replace.clone(),
                is_regex: self.config.is_regex,
                skip_code_blocks: false,
                skip_tables: false,
            });
        }

        self.load_from_files(&mut patterns, reporter)?;
        Ok(patterns)
    }

    fn load_from_files<W: Write>(
        &self,
        patterns: &mut Vec<Pattern>,
        reporter: &mut ChangeReporter<W>,
    ) -> Result<()> {
        if let (Some(catalog_path), Some(name)) =
            (&self.config.patterns_file, &self.config.pattern_name)
        {
            match self.load_mapping::<Catalog>(catalog_path) {
                Ok(catalog) => {
                    // An unknown single name is skipped without a warning.
                    if let Some(pattern) = catalog.get(name) {
                        patterns.push(named(pattern.clone(), name));
                    }
                }
                Err(error) => reporter.error(&format!(
                    "Error loading patterns file {}: {error}",
                    catalog_path.display()
                ))?,
            }
        }

        if let (Some(list_path), Some(list_name)) =
            (&self.config.pattern_list_file, &self.config.pattern_list_name)
        {
            let Some(catalog_path) = &self.config.patterns_file else {
                reporter.error("Error: patterns file must be provided when using pattern lists")?;
                return Ok(());
            };

            let catalog: Catalog = match self.load_mapping(catalog_path) {
                Ok(catalog) => catalog,
                Err(error) => {
                    reporter.error(&format!(
                        "Error loading patterns file {}: {error}",
                        catalog_path.display()
                    ))?;
                    return Ok(());
                }
            };
            let lists: PatternLists = match self.load_mapping(list_path) {
                Ok(lists) => lists,
                Err(error) => {
                    reporter.error(&format!(
                        "Error loading pattern list file {}: {error}",
                        list_path.display()
                    ))?;
                    return Ok(());
                }
            };

            for pattern_name in lists.get(list_name).into_iter().flatten() {
                match catalog.get(pattern_name) {
                    Some(pattern) => patterns.push(named(pattern.clone(), pattern_name)),
                    None => reporter.warning(&format!(
                        "Warning: Pattern '{pattern_name}' not found in patterns file"
                    ))?,
                }
            }
        }
        Ok(())
    }

    /// Loads a YAML or JSON mapping, chosen by file extension, after resolving
    /// the path against the config file's directory.
    fn load_mapping<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let resolved = self.resolver.resolve(path);
        let file = File::open(&resolved)?;
        let is_yaml = matches!(
            resolved.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Ok(serde_yaml::from_reader(file)?)
        } else {
            Ok(serde_json::from_reader(file)?)
        }
    }
}

fn named(mut pattern: Pattern, name: &str) -> Pattern {
    if pattern.name.is_empty() {
        pattern.name = name.to_string();
    }
    pattern
}
