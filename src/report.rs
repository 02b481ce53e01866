use crate::applier::Change;
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Auto-detect whether report output should use colors.
pub fn detect_color() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

/// Renders change reports and status messages into an injected sink.
///
/// Keeping the sink and the color switch explicit means the engine can be
/// exercised in tests against an in-memory buffer, with no terminal involved.
pub struct ChangeReporter<W: Write> {
    writer: W,
    use_color: bool,
}

impl<W: Write> ChangeReporter<W> {
    pub fn new(writer: W, use_color: bool) -> Self {
        Self { writer, use_color }
    }

    /// Gets a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Prints one file's changes in ascending line-number order.
    ///
    /// In dry-run mode line numbers refer to the original file. In applied
    /// mode a running offset (the net line-count delta of the changes already
    /// printed) is added so reported numbers track the post-edit file.
    pub fn report(&mut self, path: &Path, changes: &[Change], dry_run: bool) -> io::Result<()> {
        let mut ordered: Vec<&Change> = changes.iter().collect();
        ordered.sort_by_key(|change| change.line_number);

        let mut offset: i64 = 0;
        for change in ordered {
            let mut line = change.line_number as i64;
            if !dry_run {
                line += offset;
            }

            let status = if dry_run { "WOULD CHANGE" } else { "CHANGED" };
            let header = format!("[{status}] {}:{line}", path.display());
            let removed = render_block('-', &change.original);
            let added = render_block('+', &change.replacement);

            if self.use_color {
                let header = if dry_run { header.yellow() } else { header.green() };
                writeln!(self.writer, "{header}")?;
                writeln!(self.writer, "{}\n{}\n", removed.red(), added.green())?;
            } else {
                writeln!(self.writer, "{header}")?;
                writeln!(self.writer, "{removed}\n{added}\n")?;
            }

            offset += change.replacement.matches('\n').count() as i64
                - change.original.matches('\n').count() as i64;
        }
        Ok(())
    }

    /// Prints an error-level status line (red).
    pub fn error(&mut self, message: &str) -> io::Result<()> {
        if self.use_color {
            writeln!(self.writer, "{}", message.red())
        } else {
            writeln!(self.writer, "{message}")
        }
    }

    /// Prints a warning-level status line (yellow).
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        if self.use_color {
            writeln!(self.writer, "{}", message.yellow())
        } else {
            writeln!(self.writer, "{message}")
        }
    }
}

/// Renders one side of a change: a `- `/`+ ` prefixed representation of the
/// text with trailing whitespace stripped, plus one bare continuation marker
/// per embedded newline beyond the first.
fn render_block(marker: char, text: &str) -> String {
    let mut block = String::new();
    if !text.is_empty() {
        block.push(marker);
        block.push(' ');
        block.push_str(text.trim_end());
    }

    let trailing_newlines = text.len() - text.trim_end_matches('\n').len();
    for _ in 0..trailing_newlines.saturating_sub(1) {
        block.push('\n');
        block.push(marker);
    }
    block
}
