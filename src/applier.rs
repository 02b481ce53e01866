use crate::errors::Result;
use crate::patterns::Pattern;
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;

/// One matched span whose replacement differs from the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// 1-based line number of the match in the original file.
    pub line_number: usize,
    /// The matched text (regex path) or the whole line (literal path).
    pub original: String,
    /// The text that replaces `original`.
    pub replacement: String,
}

/// Applies one [`Pattern`] to one section's text.
///
/// Compiled regexes are cached so a pattern reused across sections and files
/// is only compiled once.
pub struct PatternApplier {
    cache: HashMap<String, Regex>,
}

impl Default for PatternApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternApplier {
    /// Creates a new applier with an empty regex cache.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Compiles a find pattern in multiline mode, using the cache if available.
    ///
    /// Multiline mode makes `^`/`$` anchor at line boundaries, which the
    /// catalog's cleanup patterns rely on.
    pub fn compile(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.cache.contains_key(pattern) {
            let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
            self.cache.insert(pattern.to_string(), regex);
        }
        Ok(self.cache.get(pattern).unwrap())
    }

    /// Applies `pattern` to `text`, where `start_line` is the 1-based line
    /// number of the first line of `text` in the original file.
    ///
    /// Returns the rewritten text and the changes in ascending match order.
    pub fn apply(
        &mut self,
        text: &str,
        pattern: &Pattern,
        start_line: usize,
    ) -> Result<(String, Vec<Change>)> {
        if pattern.is_regex {
            self.apply_regex(text, pattern, start_line)
        } else {
            Ok(apply_literal(text, pattern, start_line))
        }
    }

    fn apply_regex(
        &mut self,
        text: &str,
        pattern: &Pattern,
        start_line: usize,
    ) -> Result<(String, Vec<Change>)> {
        let (template, groups) = translate_template(&pattern.replace);
        let regex = self.compile(&pattern.find)?;

        let mut matches: Vec<(usize, usize, Change)> = Vec::new();
        for caps in regex.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let line_number = start_line + text[..m.start()].matches('\n').count();
            let original = m.as_str().to_string();
            let replacement = expand_template(regex, &caps, &template, &groups, &pattern.replace);
            if original != replacement {
                matches.push((
                    m.start(),
                    m.end(),
                    Change {
                        line_number,
                        original,
                        replacement,
                    },
                ));
            }
        }

        if matches.is_empty() {
            return Ok((text.to_string(), Vec::new()));
        }

        // Rewrite from the highest offset to the lowest so earlier spans stay
        // valid after a replacement changes the text length.
        let mut new_text = text.to_string();
        for (start, end, change) in matches.iter().rev() {
            new_text.replace_range(*start..*end, &change.replacement);
        }

        let changes = matches.into_iter().map(|(_, _, change)| change).collect();
        Ok((new_text, changes))
    }
}

/// Literal substring path: replaces all occurrences line by line, recording a
/// change for each line that actually differs.
fn apply_literal(text: &str, pattern: &Pattern, start_line: usize) -> (String, Vec<Change>) {
    let mut changes = Vec::new();
    let mut out = String::with_capacity(text.len());

    for (index, line) in text.split_inclusive('\n').enumerate() {
        if line.contains(&pattern.find) {
            let new_line = line.replace(&pattern.find, &pattern.replace);
            if new_line != line {
                changes.push(Change {
                    line_number: start_line + index,
                    original: line.to_string(),
                    replacement: new_line.clone(),
                });
            }
            out.push_str(&new_line);
        } else {
            out.push_str(line);
        }
    }

    (out, changes)
}

/// Rewrites `$N` placeholders into the regex crate's `${N}` form so adjacent
/// text cannot extend the group reference, and escapes every other `$` so it
/// stays literal. Returns the rewritten template and the referenced group
/// numbers.
fn translate_template(replace: &str) -> (String, Vec<usize>) {
    let mut template = String::with_capacity(replace.len());
    let mut groups = Vec::new();
    let mut chars = replace.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            template.push(c);
            continue;
        }
        let mut digits = String::new();
        while let Some(d) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(*d);
                chars.next();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            template.push_str("$$");
        } else {
            // Group numbers in a hand-written template stay small; a parse
            // failure here just means the reference can never be satisfied.
            let group = digits.parse::<usize>().unwrap_or(usize::MAX);
            groups.push(group);
            template.push_str("${");
            template.push_str(&digits);
            template.push('}');
        }
    }

    (template, groups)
}

/// Expands the translated template against a match. A template referencing a
/// capture group the pattern does not have degrades to the literal template
/// text rather than failing.
fn expand_template(
    regex: &Regex,
    caps: &Captures,
    template: &str,
    groups: &[usize],
    literal: &str,
) -> String {
    if groups.iter().any(|&g| g >= regex.captures_len()) {
        return literal.to_string();
    }
    let mut expanded = String::new();
    caps.expand(template, &mut expanded);
    expanded
}
