//! Lightweight Markdown structure extraction
//!
//! Line-oriented, no full CommonMark parse: headings are ATX (`#`) lines
//! outside fenced blocks, fences open and close on ``` or ~~~ lines.

use std::path::Path;

use super::models::{CodeBlock, Section};

/// Upper bound on generated plain-text summaries
pub const SUMMARY_MAX_CHARS: usize = 300;

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn parse_heading(line: &str) -> Option<Section> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(' ') && !rest.starts_with('\t') {
        return None;
    }
    let title = rest.trim().trim_end_matches('#').trim().to_string();
    Some(Section {
        level: level as u8,
        title,
    })
}

/// Iterate lines tagged with whether they sit inside a fenced block.
/// Fence delimiter lines themselves are reported as fenced.
fn lines_with_fence_state(content: &str) -> impl Iterator<Item = (&str, bool)> {
    let mut open: Option<&'static str> = None;
    content.lines().map(move |line| match (open, fence_marker(line)) {
        (None, Some(marker)) => {
            open = Some(marker);
            (line, true)
        }
        (Some(current), Some(marker)) if current == marker => {
            open = None;
            (line, true)
        }
        (Some(_), _) => (line, true),
        (None, None) => (line, false),
    })
}

/// All headings outside code fences
pub fn sections(content: &str) -> Vec<Section> {
    lines_with_fence_state(content)
        .filter(|(_, fenced)| !fenced)
        .filter_map(|(line, _)| parse_heading(line))
        .collect()
}

pub fn heading_count(content: &str) -> usize {
    sections(content).len()
}

struct OpenFence<'a> {
    marker: &'static str,
    language: Option<String>,
    body: Vec<&'a str>,
}

impl OpenFence<'_> {
    fn close(self) -> CodeBlock {
        CodeBlock {
            language: self.language,
            code: self.body.join("\n"),
        }
    }
}

/// All fenced code blocks; an unterminated fence runs to end of file
pub fn code_blocks(content: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<OpenFence<'_>> = None;

    for line in content.lines() {
        let marker = fence_marker(line);
        match open.take() {
            None => {
                if let Some(marker) = marker {
                    let info = line.trim_start()[marker.len()..].trim();
                    open = Some(OpenFence {
                        marker,
                        language: info.split_whitespace().next().map(str::to_string),
                        body: Vec::new(),
                    });
                }
            }
            Some(fence) if marker == Some(fence.marker) => blocks.push(fence.close()),
            Some(mut fence) => {
                fence.body.push(line);
                open = Some(fence);
            }
        }
    }

    if let Some(fence) = open {
        blocks.push(fence.close());
    }

    blocks
}

pub fn code_block_count(content: &str) -> usize {
    code_blocks(content).len()
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// First level-1 heading, else the first heading, else the file stem
pub fn title(content: &str, path: &Path) -> String {
    let sections = sections(content);
    sections
        .iter()
        .find(|s| s.level == 1 && !s.title.is_empty())
        .or_else(|| sections.iter().find(|s| !s.title.is_empty()))
        .map(|s| s.title.clone())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

/// Strip inline Markdown decoration from a prose line
fn plain_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut prev = '\0';
    let mut in_link_target = false;

    while let Some(c) = chars.next() {
        if in_link_target {
            in_link_target = c != ')';
        } else {
            match c {
                '(' if prev == ']' => in_link_target = true,
                '!' if chars.peek() == Some(&'[') => {}
                '*' | '`' | '[' | ']' => {}
                _ => out.push(c),
            }
        }
        prev = c;
    }
    out
}

/// First prose paragraph as plain text, cut at a word boundary
pub fn summary(content: &str, max_chars: usize) -> String {
    let mut paragraph: Vec<String> = Vec::new();

    for (line, fenced) in lines_with_fence_state(content) {
        let trimmed = line.trim();
        let is_prose = !fenced
            && !trimmed.is_empty()
            && parse_heading(line).is_none()
            && !trimmed.starts_with('>')
            && !trimmed.starts_with('|')
            && !trimmed.starts_with("<")
            && !trimmed.starts_with("---")
            && !trimmed.starts_with("[![");

        if is_prose {
            let text = plain_text(trimmed.trim_start_matches(&['-', '*', '+'][..]).trim());
            if !text.is_empty() {
                paragraph.push(text);
            }
        } else if !paragraph.is_empty() {
            break;
        }
    }

    let joined = paragraph.join(" ");
    if joined.chars().count() <= max_chars {
        return joined;
    }

    let chars: Vec<char> = joined.chars().take(max_chars).collect();
    let boundary = chars
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&idx| idx > max_chars / 2)
        .unwrap_or(chars.len());
    let cut: String = chars[..boundary].iter().collect();
    format!("{}...", cut.trim_end())
}
