use crate::applier::{Change, PatternApplier};
use crate::config::Config;
use crate::errors::Result;
use crate::patterns::Pattern;
use crate::report::ChangeReporter;
use crate::splitter::SectionSplitter;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Orchestrates a run: discovers target files, splits each into sections,
/// applies the pattern sequence per section, reassembles, reports, and writes.
///
/// Files are processed strictly sequentially; one file's failure is reported
/// and does not abort the rest of the run.
pub struct FileProcessor<W: Write> {
    config: Config,
    splitter: SectionSplitter,
    applier: PatternApplier,
    reporter: ChangeReporter<W>,
}

impl<W: Write> FileProcessor<W> {
    pub fn new(config: Config, reporter: ChangeReporter<W>) -> Result<Self> {
        Ok(Self {
            splitter: SectionSplitter::new()?,
            applier: PatternApplier::new(),
            config,
            reporter,
        })
    }

    /// Processes every matched file with the given pattern sequence.
    pub fn process_files(&mut self, patterns: &[Pattern]) -> Result<()> {
        let patterns = self.validate_patterns(patterns)?;
        if patterns.is_empty() {
            self.reporter.error("No patterns to apply")?;
            return Ok(());
        }

        let files = self.collect_files()?;
        if files.is_empty() {
            self.reporter.warning("No files found matching pattern")?;
            return Ok(());
        }

        for file in files {
            if let Err(error) = self.process_file(&file, &patterns) {
                self.reporter
                    .error(&format!("Error processing {}: {error}", file.display()))?;
            }
        }
        Ok(())
    }

    /// Drops patterns whose regex does not compile, reporting each one, so a
    /// single bad catalog entry cannot take down the run.
    fn validate_patterns(&mut self, patterns: &[Pattern]) -> Result<Vec<Pattern>> {
        let mut valid = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if pattern.is_regex {
                if let Err(error) = self.applier.compile(&pattern.find) {
                    self.reporter
                        .error(&format!("Skipping pattern '{}': {error}", pattern.name))?;
                    continue;
                }
            }
            valid.push(pattern.clone());
        }
        Ok(valid)
    }

    /// Resolves the target file list: a single file as-is, or a directory walk
    /// filtered by the configured glob. Walk errors (a missing root, an
    /// unreadable subdirectory) are reported and skipped, never fatal.
    fn collect_files(&mut self) -> Result<Vec<PathBuf>> {
        let root = self
            .config
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        if root.is_file() {
            return Ok(vec![root]);
        }

        let glob = self.config.pattern.as_deref().unwrap_or("*");
        let mut overrides = OverrideBuilder::new(&root);
        overrides.add(glob)?;

        let mut walker = WalkBuilder::new(&root);
        walker.standard_filters(true).overrides(overrides.build()?);
        if !self.config.recursive {
            walker.max_depth(Some(1));
        }

        let mut files = Vec::new();
        for entry in walker.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    self.reporter
                        .error(&format!("Error searching files: {error}"))?;
                    continue;
                }
            };
            if entry.path().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    fn process_file(&mut self, path: &Path, patterns: &[Pattern]) -> Result<()> {
        let bytes = fs::read(path)?;
        let ends_with_newline = bytes.last() == Some(&b'\n');
        let content = String::from_utf8(bytes)?;

        let sections = self.splitter.split(&content);
        let mut parts: Vec<String> = Vec::with_capacity(sections.len());
        let mut all_changes: Vec<Change> = Vec::new();

        for section in &sections {
            let mut text = section.text.clone();
            for pattern in patterns {
                // Skip flags are evaluated against the section's original
                // classification, not its transformed text.
                if section.is_code_block && pattern.skip_code_blocks {
                    continue;
                }
                if section.is_table && pattern.skip_tables {
                    continue;
                }
                let (new_text, changes) = self.applier.apply(&text, pattern, section.start_line)?;
                text = new_text;
                all_changes.extend(changes);
            }
            parts.push(text);
        }

        let mut modified = parts.concat();
        if ends_with_newline && !modified.ends_with('\n') {
            modified.push('\n');
        } else if !ends_with_newline && modified.ends_with('\n') {
            modified.truncate(modified.trim_end_matches('\n').len());
        }
        if self.config.ensure_new_line {
            modified.truncate(modified.trim_end_matches('\n').len());
            modified.push('\n');
        }

        if !all_changes.is_empty() {
            self.reporter
                .report(path, &all_changes, self.config.dry_run)?;
        }

        if !self.config.dry_run && modified != content {
            self.write_atomic(path, &modified)?;
        }
        Ok(())
    }

    /// Writes the new content atomically via a sibling temp file, preserving
    /// the target's permissions.
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => {
                return Err(format!("Could not get parent directory for {}", path.display()).into());
            }
        };

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;

        let perms = fs::metadata(path)?.permissions();
        fs::set_permissions(temp_file.path(), perms)?;

        temp_file.persist(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pattern(find: &str, replace: &str, is_regex: bool) -> Pattern {
        Pattern {
            name: "test".to_string(),
            find: find.to_string(),
            replace: replace.to_string(),
            is_regex,
            skip_code_blocks: false,
            skip_tables: false,
        }
    }

    fn processor(config: Config) -> FileProcessor<Vec<u8>> {
        FileProcessor::new(config, ChangeReporter::new(Vec::new(), false)).unwrap()
    }

    fn run(
        dir: &TempDir,
        patterns: &[Pattern],
        configure: impl FnOnce(&mut Config),
    ) -> FileProcessor<Vec<u8>> {
        let mut config = Config {
            path: Some(dir.path().to_path_buf()),
            pattern: Some("*.md".to_string()),
            ..Config::default()
        };
        configure(&mut config);
        let mut processor = processor(config);
        processor.process_files(patterns).unwrap();
        processor
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn output(processor: &FileProcessor<Vec<u8>>) -> String {
        String::from_utf8(processor.reporter.get_ref().clone()).unwrap()
    }

    #[test]
    fn applies_literal_pattern_and_writes() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "content foo\n");

        let processor = run(&dir, &[pattern("foo", "bar", false)], |_| {});

        assert_eq!(fs::read_to_string(&target).unwrap(), "content bar\n");
        let report = output(&processor);
        assert!(report.contains(&format!("[CHANGED] {}:1", target.display())));
        assert!(report.contains("- content foo\n+ content bar\n"));
    }

    #[test]
    fn dry_run_never_modifies_the_file() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "content foo\n");

        let processor = run(&dir, &[pattern("foo", "bar", false)], |c| c.dry_run = true);

        assert_eq!(fs::read_to_string(&target).unwrap(), "content foo\n");
        assert!(output(&processor).contains("[WOULD CHANGE]"));
    }

    #[test]
    fn skip_code_blocks_leaves_fenced_content_untouched() {
        let dir = TempDir::new().unwrap();
        let target = write(
            &dir,
            "sample.md",
            "```\ncode   \n```\n\nline with trailing spaces   \n",
        );

        let trailing = Pattern {
            skip_code_blocks: true,
            ..pattern(r" +$", "", true)
        };
        run(&dir, &[trailing], |_| {});

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "```\ncode   \n```\n\nline with trailing spaces\n"
        );
    }

    #[test]
    fn skip_code_blocks_protects_frontmatter() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "---\ntitle: foo\n---\nbody foo\n");

        let swap = Pattern {
            skip_code_blocks: true,
            ..pattern("foo", "bar", false)
        };
        run(&dir, &[swap], |_| {});

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "---\ntitle: foo\n---\nbody bar\n"
        );
    }

    #[test]
    fn skip_tables_leaves_table_rows_untouched() {
        let dir = TempDir::new().unwrap();
        let target = write(
            &dir,
            "sample.md",
            "| foo | x |\n| --- | --- |\n| foo | y |\n\nplain foo\n",
        );

        let swap = Pattern {
            skip_tables: true,
            ..pattern("foo", "bar", false)
        };
        run(&dir, &[swap], |_| {});

        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "| foo | x |\n| --- | --- |\n| foo | y |\n\nplain bar\n"
        );
    }

    #[test]
    fn skip_flag_holds_even_after_earlier_pattern_edits() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "```\nfoo\n```\n");

        let first = pattern("foo", "baz", false);
        let second = Pattern {
            skip_code_blocks: true,
            ..pattern("baz", "qux", false)
        };
        run(&dir, &[first, second], |_| {});

        // The second pattern must not see the code block at all.
        assert_eq!(fs::read_to_string(&target).unwrap(), "```\nbaz\n```\n");
    }

    #[test]
    fn no_matching_pattern_leaves_file_byte_identical() {
        let dir = TempDir::new().unwrap();
        let content = "Paragraph.\n\n```\ncode\n```\n\n| a | b |\n| --- | --- |\n";
        let target = write(&dir, "sample.md", content);
        let before = fs::metadata(&target).unwrap().modified().unwrap();

        run(&dir, &[pattern("absent", "x", false)], |_| {});

        assert_eq!(fs::read_to_string(&target).unwrap(), content);
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn trailing_newline_state_is_preserved() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "no newline foo");

        run(&dir, &[pattern("foo", "bar", false)], |_| {});

        assert_eq!(fs::read_to_string(&target).unwrap(), "no newline bar");
    }

    #[test]
    fn ensure_new_line_forces_exactly_one() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "text foo\n\n\n");

        run(&dir, &[pattern("foo", "bar", false)], |c| {
            c.ensure_new_line = true;
        });

        assert_eq!(fs::read_to_string(&target).unwrap(), "text bar\n");
    }

    #[test]
    fn single_file_path_is_processed_directly() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "exact.txt", "foo\n");

        let mut processor = processor(Config {
            path: Some(target.clone()),
            ..Config::default()
        });
        processor
            .process_files(&[pattern("foo", "bar", false)])
            .unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "bar\n");
    }

    #[test]
    fn glob_filters_and_non_recursive_limits_depth() {
        let dir = TempDir::new().unwrap();
        let matched = write(&dir, "a.md", "foo\n");
        let unmatched = write(&dir, "b.txt", "foo\n");
        fs::create_dir(dir.path().join("sub")).unwrap();
        let nested = dir.path().join("sub").join("c.md");
        fs::write(&nested, "foo\n").unwrap();

        run(&dir, &[pattern("foo", "bar", false)], |c| c.recursive = false);

        assert_eq!(fs::read_to_string(&matched).unwrap(), "bar\n");
        assert_eq!(fs::read_to_string(&unmatched).unwrap(), "foo\n");
        assert_eq!(fs::read_to_string(&nested).unwrap(), "foo\n");
    }

    #[test]
    fn recursive_walk_reaches_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let nested = dir.path().join("sub").join("c.md");
        fs::write(&nested, "foo\n").unwrap();

        run(&dir, &[pattern("foo", "bar", false)], |_| {});

        assert_eq!(fs::read_to_string(&nested).unwrap(), "bar\n");
    }

    #[test]
    fn empty_pattern_list_is_a_reported_noop() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sample.md", "foo\n");

        let processor = run(&dir, &[], |_| {});

        assert!(output(&processor).contains("No patterns to apply"));
    }

    #[test]
    fn no_matched_files_is_a_reported_noop() {
        let dir = TempDir::new().unwrap();

        let processor = run(&dir, &[pattern("foo", "bar", false)], |_| {});

        assert!(output(&processor).contains("No files found matching pattern"));
    }

    #[test]
    fn nonexistent_path_is_a_reported_noop_not_an_error() {
        let mut processor = processor(Config {
            path: Some(PathBuf::from("/definitely/not/here")),
            ..Config::default()
        });

        processor
            .process_files(&[pattern("foo", "bar", false)])
            .unwrap();

        let report = output(&processor);
        assert!(report.contains("Error searching files"));
        assert!(report.contains("No files found matching pattern"));
    }

    #[test]
    fn invalid_regex_pattern_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "foo\n");

        let bad = pattern(r"(unclosed", "x", true);
        let good = pattern("foo", "bar", false);
        let processor = run(&dir, &[bad, good], |_| {});

        assert_eq!(fs::read_to_string(&target).unwrap(), "bar\n");
        assert!(output(&processor).contains("Skipping pattern"));
    }

    #[test]
    fn undecodable_file_is_skipped_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("a.md");
        fs::write(&binary, [0xff, 0xfe, b'\n']).unwrap();
        let target = write(&dir, "b.md", "foo\n");

        let processor = run(&dir, &[pattern("foo", "bar", false)], |_| {});

        assert_eq!(fs::read_to_string(&target).unwrap(), "bar\n");
        assert!(output(&processor).contains("Error processing"));
    }

    #[test]
    fn second_pass_of_cleanup_patterns_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "sample.md", "Word   word  here\ntrailing   \n");

        let cleanup = vec![
            pattern(r"([^ ]) {2,}([^ ])", "$1 $2", true),
            pattern(r" +$", "", true),
        ];
        run(&dir, &cleanup, |_| {});
        let first_pass = fs::read_to_string(&target).unwrap();

        run(&dir, &cleanup, |_| {});
        assert_eq!(fs::read_to_string(&target).unwrap(), first_pass);
    }
}
