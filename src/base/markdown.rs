//! Converts CommonMark (as written in GitHub release notes) into Slack `mrkdwn`.
//!
//! Slack's dialect differs from Markdown in a few ways:
//! - Bold is `*text*`, italics `_text_`, strikethrough `~text~`.
//! - Links are `<url|text>`, so `|` cannot appear raw in either part.
//! - There are no headings or list markup, so headings become bold lines and
//!   list items are rendered with explicit bullets.
//! - `&`, `<` and `>` must be escaped in text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

const BULLET: &str = "•";
const INDENT: &str = "    ";
const RULE: &str = "──────────";

/// Convert Markdown to Slack `mrkdwn`.
pub fn to_mrkdwn(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;

    let mut writer = MrkdwnWriter::default();

    for event in Parser::new_ext(markdown, options) {
        writer.handle(event);
    }

    writer.finish()
}

/// Escapes the characters Slack treats as control sequences.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// Writer.

#[derive(Default)]
struct MrkdwnWriter {
    out: String,
    /// Next number for each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// Destination and text start offset for each open link or image.
    links: Vec<(String, usize)>,
    /// Start offset and list indent of each open block quote.
    quotes: Vec<(usize, String)>,
    /// Set when a list item has been opened but nothing written to it yet.
    item_fresh: bool,
    in_code_block: bool,
    in_heading: bool,
    table_cell: usize,
}

impl MrkdwnWriter {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.out.push_str(&text);
                } else {
                    self.write(&escape(&text));
                }
            }
            Event::Code(code) => {
                self.write("`");
                self.out.push_str(&escape(&code));
                self.out.push('`');
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if !html.trim_start().starts_with("<!--") {
                    self.write(&escape(&html));
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                self.out.push('\n');
                self.push_indent();
            }
            Event::Rule => {
                self.block_break();
                self.out.push_str(RULE);
            }
            Event::TaskListMarker(checked) => self.write(if checked { "☒ " } else { "☐ " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_block(),
            Tag::Heading { .. } => {
                self.open_block();
                self.write("*");
                self.in_heading = true;
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.quotes.push((self.out.len(), self.indent()));
                // The quoted block continues the current line.
                self.item_fresh = true;
            }
            Tag::CodeBlock(_) => {
                self.open_block();
                self.write("```\n");
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.block_break();
                }
                self.lists.push(start);
            }
            Tag::Item => self.start_item(),
            Tag::Emphasis => self.write("_"),
            Tag::Strong if self.in_heading => {}
            Tag::Strong => self.write("*"),
            Tag::Strikethrough => self.write("~"),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.item_fresh = false;
                self.links.push((dest_url.to_string(), self.out.len()));
            }
            Tag::Table(_) => self.block_break(),
            Tag::TableCell => {
                if self.table_cell > 0 {
                    self.out.push_str(" | ");
                }
                self.table_cell += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.out.push('*');
                self.in_heading = false;
            }
            TagEnd::BlockQuote(_) => {
                if let Some((start, indent)) = self.quotes.pop() {
                    let quoted = self.out.split_off(start);
                    let quoted = quoted
                        .trim_end()
                        .lines()
                        .enumerate()
                        .map(|(i, line)| match i {
                            // The first line already sits after the indent or item marker.
                            0 => format!("> {line}"),
                            _ => format!("{indent}> {}", line.strip_prefix(indent.as_str()).unwrap_or(line)),
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.out.push_str(&quoted);
                }
            }
            TagEnd::CodeBlock => {
                if !self.out.ends_with('\n') {
                    self.out.push('\n');
                }
                self.out.push_str("```");
                self.in_code_block = false;
            }
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::Emphasis => self.out.push('_'),
            TagEnd::Strong if self.in_heading => {}
            TagEnd::Strong => self.out.push('*'),
            TagEnd::Strikethrough => self.out.push('~'),
            TagEnd::Link | TagEnd::Image => {
                if let Some((url, start)) = self.links.pop() {
                    let text = self.out.split_off(start);
                    let bare = text.is_empty() || text == url;
                    let url = url.replace('|', "%7C");
                    if bare {
                        self.out.push_str(&format!("<{url}>"));
                    } else {
                        self.out.push_str(&format!("<{url}|{}>", text.replace('|', "¦")));
                    }
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                self.out.push('\n');
                self.table_cell = 0;
            }
            _ => {}
        }
    }

    fn start_item(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }

        let depth = self.lists.len().saturating_sub(1);
        self.out.push_str(&INDENT.repeat(depth));

        let marker = match self.lists.last_mut() {
            Some(Some(number)) => {
                let marker = format!("{number}. ");
                *number += 1;
                marker
            }
            _ => format!("{BULLET} "),
        };

        self.out.push_str(&marker);
        self.item_fresh = true;
    }

    /// Starts a paragraph-like block, either on a fresh list item line or after a blank line.
    fn open_block(&mut self) {
        if self.lists.is_empty() {
            self.block_break();
        } else if !self.item_fresh {
            self.out.push('\n');
            self.push_indent();
        }
    }

    /// Ensures the output ends with exactly one blank line, unless nothing has been written
    /// since the start of the innermost block quote.
    fn block_break(&mut self) {
        let floor = self.quotes.last().map(|(start, _)| *start).unwrap_or(0);
        let trimmed = self.out.trim_end_matches([' ', '\n']).len().max(floor);
        self.out.truncate(trimmed);

        if self.out.len() > floor {
            self.out.push_str("\n\n");
        }
    }

    fn push_indent(&mut self) {
        let indent = self.indent();
        self.out.push_str(&indent);
    }

    /// Leading whitespace for continuation lines inside the open lists.
    fn indent(&self) -> String {
        INDENT.repeat(self.lists.len())
    }

    fn write(&mut self, text: &str) {
        self.item_fresh = false;
        self.out.push_str(text);
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_inline_styles() {
        assert_eq!(to_mrkdwn("**bold** and *em* and ~~gone~~"), "*bold* and _em_ and ~gone~");
    }

    #[test]
    fn converts_headings_to_bold_lines() {
        assert_eq!(to_mrkdwn("## What's Changed\n\nStuff"), "*What's Changed*\n\nStuff");
    }

    #[test]
    fn flattens_bold_inside_headings() {
        assert_eq!(to_mrkdwn("## **Breaking** changes\n\nx"), "*Breaking changes*\n\nx");
        assert_eq!(to_mrkdwn("# All **bold**"), "*All bold*");
        assert_eq!(to_mrkdwn("# Title\n\n**after**"), "*Title*\n\n*after*");
    }

    #[test]
    fn escapes_pipes_in_links() {
        assert_eq!(to_mrkdwn("[a|b](https://x/y?q=1|2)"), "<https://x/y?q=1%7C2|a¦b>");
        assert_eq!(to_mrkdwn("<https://x/y?q=1|2>"), "<https://x/y?q=1%7C2>");
    }

    #[test]
    fn converts_links() {
        assert_eq!(to_mrkdwn("See [the docs](https://example.com/docs)."), "See <https://example.com/docs|the docs>.");
        assert_eq!(to_mrkdwn("<https://example.com>"), "<https://example.com>");
    }

    #[test]
    fn converts_bullet_lists() {
        let markdown = "Changes:\n\n* one\n* two\n  * nested";

        assert_eq!(to_mrkdwn(markdown), "Changes:\n\n• one\n• two\n    • nested");
    }

    #[test]
    fn keeps_ordered_list_numbering() {
        assert_eq!(to_mrkdwn("3. three\n4. four"), "3. three\n4. four");
    }

    #[test]
    fn renders_task_lists() {
        assert_eq!(to_mrkdwn("- [x] done\n- [ ] todo"), "• ☒ done\n• ☐ todo");
    }

    #[test]
    fn keeps_code() {
        assert_eq!(to_mrkdwn("Run `cargo **x**`"), "Run `cargo **x**`");
        assert_eq!(to_mrkdwn("```rust\nlet a = 1;\n```"), "```\nlet a = 1;\n```");
    }

    #[test]
    fn quotes_block_quotes() {
        assert_eq!(to_mrkdwn("> careful\n> now"), "> careful\n> now");
        assert_eq!(to_mrkdwn("Intro\n\n> **Note**\n\nAfter"), "Intro\n\n> *Note*\n\nAfter");
    }

    #[test]
    fn quotes_inside_list_items() {
        assert_eq!(to_mrkdwn("- item\n\n  > quoted\n- next"), "• item\n    > quoted\n• next");
        assert_eq!(to_mrkdwn("- item\n\n  > one\n  > two"), "• item\n    > one\n    > two");
        assert_eq!(to_mrkdwn("- > quoted"), "• > quoted");
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(to_mrkdwn("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn drops_html_comments() {
        assert_eq!(to_mrkdwn("<!-- generated -->\n\nNotes"), "Notes");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(to_mrkdwn("Notes\n"), "Notes");
        assert_eq!(to_mrkdwn(""), "");
    }
}
