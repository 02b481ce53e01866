use crate::errors::Result;
use regex::Regex;

/// A contiguous span of a document, classified by structural role.
///
/// Sections are produced in document order; concatenating their `text` fields
/// reconstructs the original content, except that an unclosed frontmatter
/// block gains a synthetic closing `---` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based line number of the section's first line in the original file.
    pub start_line: usize,
    /// The raw text of the section, line endings included.
    pub text: String,
    /// `true` for fenced code blocks, yaml blocks, and frontmatter.
    pub is_code_block: bool,
    /// `true` for contiguous runs of table lines.
    pub is_table: bool,
}

/// Splits raw document text into an ordered sequence of typed [`Section`]s.
///
/// The splitter makes three passes: frontmatter extraction, a forward scan
/// toggling on `---`/```` ``` ```` fence lines, and table marking inside the
/// non-code sections.
pub struct SectionSplitter {
    table_separator: Regex,
}

impl SectionSplitter {
    /// Creates a splitter, compiling the table-separator pattern.
    pub fn new() -> Result<Self> {
        Ok(Self {
            table_separator: Regex::new(r"^\|?(\s*:?-{3,}:?\s*\|)+\s*:?-{3,}:?\s*\|?$")?,
        })
    }

    /// Partitions `content` into typed sections.
    pub fn split(&self, content: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut working = content;
        let mut line_number = 1usize;

        if content.starts_with("---\n") {
            if let Some((frontmatter, remaining)) = take_frontmatter(content) {
                line_number += frontmatter.matches('\n').count();
                sections.push(Section {
                    start_line: 1,
                    text: frontmatter,
                    is_code_block: true,
                    is_table: false,
                });
                working = remaining;
            }
        }

        if working.is_empty() {
            return sections;
        }

        let mut collected: Vec<&str> = Vec::new();
        let mut in_code_block = false;
        let mut in_yaml_block = false;

        for line in working.split_inclusive('\n') {
            let stripped = line.trim();
            let mut toggled = false;

            if stripped.starts_with("---") && !in_code_block {
                in_yaml_block = !in_yaml_block;
                toggled = true;
            }

            if stripped.starts_with("```") && !in_yaml_block {
                in_code_block = !in_code_block;
                toggled = true;
            }

            if toggled && !collected.is_empty() {
                sections.push(Section {
                    start_line: line_number - collected.len(),
                    text: collected.concat(),
                    // A closing toggle leaves both flags false, which marks the
                    // run just ended (fence content included) as a code block.
                    is_code_block: !in_code_block && !in_yaml_block,
                    is_table: false,
                });
                collected.clear();
            }

            collected.push(line);
            line_number += 1;
        }

        if !collected.is_empty() {
            sections.push(Section {
                start_line: line_number - collected.len(),
                text: collected.concat(),
                is_code_block: in_code_block,
                is_table: false,
            });
        }

        self.mark_table_sections(sections)
    }

    /// Re-scans non-code sections and splits out contiguous runs of table
    /// lines into their own sub-sections.
    fn mark_table_sections(&self, sections: Vec<Section>) -> Vec<Section> {
        let mut processed = Vec::new();

        for section in sections {
            if section.is_code_block {
                processed.push(section);
                continue;
            }

            let lines: Vec<&str> = section.text.split_inclusive('\n').collect();
            if lines.is_empty() {
                processed.push(section);
                continue;
            }

            let mut segment: Vec<&str> = Vec::new();
            let mut segment_start = section.start_line;
            let mut current_is_table: Option<bool> = None;

            for (offset, line) in lines.iter().enumerate() {
                let stripped = line.trim();
                // Blank lines never count as table lines.
                let is_table_line = !stripped.is_empty() && self.is_table_line(stripped);

                if !segment.is_empty() && current_is_table != Some(is_table_line) {
                    processed.push(Section {
                        start_line: segment_start,
                        text: segment.concat(),
                        is_code_block: false,
                        is_table: current_is_table.unwrap_or(false),
                    });
                    segment.clear();
                }

                if segment.is_empty() {
                    segment_start = section.start_line + offset;
                }

                segment.push(line);
                current_is_table = Some(is_table_line);
            }

            if !segment.is_empty() {
                processed.push(Section {
                    start_line: segment_start,
                    text: segment.concat(),
                    is_code_block: false,
                    is_table: current_is_table.unwrap_or(false),
                });
            }
        }

        processed
    }

    /// Heuristic table-line classification on a whitespace-trimmed line.
    ///
    /// The checks run in a fixed order; a line with zero or one pipe can only
    /// qualify through the `" | "` / `" |"` / `"| "` spacing forms or the
    /// separator pattern.
    fn is_table_line(&self, stripped: &str) -> bool {
        if !stripped.contains('|') {
            return false;
        }

        let pipe_count = stripped.matches('|').count();
        if stripped.starts_with('|') && pipe_count >= 2 {
            return true;
        }
        if stripped.ends_with('|') && pipe_count >= 2 {
            return true;
        }
        if self.table_separator.is_match(stripped) {
            return true;
        }
        if stripped.contains(" | ") {
            return true;
        }
        if pipe_count >= 2 {
            return true;
        }
        if stripped.contains(" |") || stripped.contains("| ") {
            return true;
        }
        false
    }
}

/// Extracts a leading frontmatter block, returning its normalized text and the
/// rest of the document. `None` means the leading `---` should be treated as
/// ordinary text.
///
/// When the closing delimiter is missing the block is still taken as
/// frontmatter (closed at end of input) unless
/// [`unclosed_frontmatter_is_plain_text`] says otherwise, and a synthetic
/// closing `---` line is appended to the stored text.
fn take_frontmatter(content: &str) -> Option<(String, &str)> {
    let rest = &content[4..];

    let (body, remaining) = match rest.split_once("\n---\n") {
        Some((body, remaining)) => (format!("{body}\n"), remaining),
        None => {
            if unclosed_frontmatter_is_plain_text(rest, content) {
                return None;
            }
            (format!("{rest}\n"), "")
        }
    };

    let mut text = format!("---\n{body}");
    if !body.trim_end().ends_with("---") {
        text.push_str("---\n");
    }
    Some((text, remaining))
}

/// Policy for a leading `---` block with no closing delimiter: treat it as
/// plain text when the block has non-blank content and the document does not
/// itself end with `---`.
///
/// This rule is a heuristic with a known ambiguity (a document consisting of a
/// `---` ruler followed by text that happens to end in `---` is still taken as
/// frontmatter). Kept as-is pending product-owner clarification.
fn unclosed_frontmatter_is_plain_text(rest: &str, content: &str) -> bool {
    !rest.trim().is_empty() && !content.trim().ends_with("---")
}
