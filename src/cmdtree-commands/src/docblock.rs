//! Annotation block parsing.
//!
//! A command's annotation block is free-form text: a short description, an
//! optional long description (usually `## OPTIONS` / `## EXAMPLES` sections)
//! and trailing `@tag value` lines. Parsing never fails; anything that does
//! not fit degrades to empty fields.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([A-Za-z0-9_-]+)(?:[ \t]+(.*?))?[ \t]*$").unwrap_or_else(|_| {
        panic!("tag regex failed to compile")
    })
});

/// Metadata extracted from one annotation block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocBlock {
    shortdesc: String,
    longdesc: String,
    tags: BTreeMap<String, String>,
}

impl DocBlock {
    /// Parse an annotation block, with or without comment decorations.
    pub fn parse(text: &str) -> Self {
        let text = remove_decorations(text);
        let lines: Vec<&str> = text.lines().collect();

        let mut tags = BTreeMap::new();
        for line in &lines {
            if let Some((name, value)) = parse_tag_line(line) {
                // First occurrence wins.
                tags.entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        let mut cursor = 0;
        while cursor < lines.len() && lines[cursor].trim().is_empty() {
            cursor += 1;
        }

        let mut short_lines = Vec::new();
        while cursor < lines.len() {
            let line = lines[cursor];
            if line.trim().is_empty() || is_tag_line(line) {
                break;
            }
            short_lines.push(line.trim());
            cursor += 1;
        }

        let long_end = lines[cursor..]
            .iter()
            .position(|line| is_tag_line(line))
            .map_or(lines.len(), |offset| cursor + offset);
        let longdesc = trim_blank_edges(&lines[cursor..long_end]).join("\n");

        Self {
            shortdesc: short_lines.join(" "),
            longdesc,
            tags,
        }
    }

    pub fn shortdesc(&self) -> &str {
        &self.shortdesc
    }

    pub fn longdesc(&self) -> &str {
        &self.longdesc
    }

    /// Value of the `@synopsis` tag, or an empty string.
    pub fn synopsis(&self) -> &str {
        self.get_tag("synopsis")
    }

    /// Value of the first `@name` tag, or an empty string when absent.
    pub fn get_tag(&self, name: &str) -> &str {
        self.tags.get(name).map_or("", String::as_str)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.shortdesc.is_empty() && self.longdesc.is_empty() && self.tags.is_empty()
    }

    /// Description of the positional `<name>` from the `## OPTIONS` section.
    pub fn arg_desc(&self, name: &str) -> Option<&str> {
        let entry = format!("<{name}>");
        self.option_desc(|line| line.starts_with(&entry))
    }

    /// Description of the associative `--key` from the `## OPTIONS` section.
    pub fn param_desc(&self, key: &str) -> Option<&str> {
        let entry = format!("--{key}");
        self.option_desc(|line| {
            line.strip_prefix(&entry)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['=', '[', ']']))
        })
    }

    fn option_desc(&self, is_entry: impl Fn(&str) -> bool) -> Option<&str> {
        let mut in_options = false;
        let mut lines = self.longdesc.lines().peekable();

        while let Some(line) = lines.next() {
            let trimmed = line.trim();
            if let Some(heading) = trimmed.strip_prefix("## ") {
                in_options = heading.trim() == "OPTIONS";
                continue;
            }
            if !in_options || !is_entry(trimmed.trim_start_matches('[')) {
                continue;
            }
            return lines
                .peek()
                .and_then(|next| next.trim().strip_prefix(':'))
                .map(str::trim)
                .filter(|desc| !desc.is_empty());
        }
        None
    }
}

/// Strip `/** ... */` or `///` comment decorations from an annotation block.
///
/// Text without decorations is returned unchanged.
pub fn remove_decorations(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("/**") {
        let body = rest.strip_suffix("*/").unwrap_or(rest);
        let lines: Vec<&str> = body
            .lines()
            .map(|line| {
                let line = line.trim_start();
                let line = line.strip_prefix('*').unwrap_or(line);
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect();
        return lines.join("\n").trim_matches('\n').to_string();
    }

    if !trimmed.is_empty() && trimmed.lines().all(|l| l.trim_start().starts_with("///")) {
        let lines: Vec<&str> = trimmed
            .lines()
            .map(|line| {
                let line = &line.trim_start()[3..];
                line.strip_prefix(' ').unwrap_or(line)
            })
            .collect();
        return lines.join("\n");
    }

    text.to_string()
}

fn is_tag_line(line: &str) -> bool {
    TAG_LINE.is_match(line.trim_start())
}

fn parse_tag_line(line: &str) -> Option<(&str, &str)> {
    let caps = TAG_LINE.captures(line.trim_start())?;
    let name = caps.get(1)?.as_str();
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((name, value))
}

fn trim_blank_edges<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].to_vec(),
        _ => Vec::new(),
    }
}
