//! Fixed-width code excerpt renderer.
//!
//! Produces the familiar gutter-and-caret layout:
//!
//! ```text
//!   1 | import React from 'react';
//!   2 |
//! > 3 | export const App = () => oops();
//!     |                          ^
//!   4 |
//! ```

use owo_colors::OwoColorize;

/// Rendering options for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFrameOptions {
    /// Lines shown before the highlighted line.
    pub lines_above: usize,
    /// Lines shown after the highlighted line.
    pub lines_below: usize,
    /// Emit ANSI colors.
    pub highlight: bool,
}

impl Default for CodeFrameOptions {
    fn default() -> Self {
        Self {
            lines_above: 2,
            lines_below: 3,
            highlight: true,
        }
    }
}

/// Renders an excerpt of `source` centered on `line` (1-based) with a caret
/// under `column` (1-based).
///
/// Lines outside the source are clipped; a location past the end of the file
/// yields an excerpt without a highlighted line.
pub fn render(source: &str, line: u32, column: u32, options: &CodeFrameOptions) -> String {
    let lines: Vec<&str> = source.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let target = line as usize;

    let start = target.saturating_sub(options.lines_above).max(1);
    let end = target.saturating_add(options.lines_below).min(lines.len());
    let gutter_width = end.to_string().len();

    let mut out = Vec::new();
    for number in start..=end {
        let content = lines[number - 1];
        let is_target = number == target;
        let gutter = format!("{number:>gutter_width$} |");

        let prefix = if is_target { ">" } else { " " };
        let body = if content.is_empty() {
            String::new()
        } else {
            format!(" {content}")
        };

        if options.highlight {
            if is_target {
                out.push(format!(
                    "{} {}{}",
                    prefix.red().bold(),
                    gutter.dimmed(),
                    body
                ));
            } else {
                out.push(format!("{} {}{}", prefix, gutter.dimmed(), body));
            }
        } else {
            out.push(format!("{prefix} {gutter}{body}"));
        }

        if is_target {
            out.push(marker_line(content, column, gutter_width, options.highlight));
        }
    }

    out.join("\n")
}

/// Caret line, keeping tabs from the source line so the caret stays aligned.
fn marker_line(content: &str, column: u32, gutter_width: usize, highlight: bool) -> String {
    let padding: String = content
        .chars()
        .chain(std::iter::repeat(' '))
        .take(column.saturating_sub(1) as usize)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let gutter = format!("{:gutter_width$} |", "");

    if highlight {
        format!("  {} {}{}", gutter.dimmed(), padding, "^".red().bold())
    } else {
        format!("  {gutter} {padding}^")
    }
}
