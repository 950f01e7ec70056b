//! Chat Renderer — turns display messages into styled terminal lines.
//!
//! Message bodies arrive as HTML or plain text. The terminal cannot show
//! HTML, so the body is parsed and flattened to text, and every `<a href>`
//! becomes a numbered link line that can be clicked.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use scraper::{ElementRef, Html, Node};
use unicode_width::UnicodeWidthChar;

use jide_core::{DisplayMessage, MessageCategory};

#[derive(Debug, Clone, Copy)]
pub struct TuiTheme {
    pub text_strong: Color,
    pub text_base: Color,
    pub text_muted: Color,
    pub text_dim: Color,
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub link: Color,
    pub user_accent: Color,
    pub assistant_accent: Color,
    pub border_normal: Color,
    pub border_active: Color,
}

impl TuiTheme {
    pub fn default_dark() -> Self {
        Self {
            text_strong: Color::White,
            text_base: Color::Gray,
            text_muted: Color::DarkGray,
            text_dim: Color::Rgb(100, 100, 100),
            primary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            link: Color::LightBlue,
            user_accent: Color::Blue,
            assistant_accent: Color::Cyan,
            border_normal: Color::DarkGray,
            border_active: Color::Cyan,
        }
    }

    pub fn accent(&self, category: MessageCategory) -> Color {
        match category {
            MessageCategory::User => self.user_accent,
            MessageCategory::Bot | MessageCategory::Markdown | MessageCategory::Html => {
                self.assistant_accent
            }
            MessageCategory::Error => self.danger,
            MessageCategory::Warning => self.warning,
            MessageCategory::Finished => self.success,
        }
    }
}

/// A numbered link extracted from an HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub index: usize,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlText {
    pub lines: Vec<String>,
    pub links: Vec<LinkRef>,
}

/// Elements that end with a blank line.
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "ul", "ol", "table", "blockquote", "hr",
];

/// Elements that only start a new line.
const LINE_TAGS: &[&str] = &["div", "li", "tr", "dt", "dd", "section", "article"];

#[derive(Default)]
struct TextBuilder {
    lines: Vec<String>,
    current: String,
    links: Vec<LinkRef>,
    pre_depth: usize,
}

impl TextBuilder {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(el) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    match el.name() {
                        "script" | "style" | "head" => {}
                        "br" => self.break_line(),
                        "a" => match el.attr("href") {
                            Some(href) => self.push_link(child, href),
                            None => self.walk(child),
                        },
                        name => self.walk_block(child, name),
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_block(&mut self, element: ElementRef<'_>, name: &str) {
        let paragraph = PARAGRAPH_TAGS.contains(&name);
        if paragraph || LINE_TAGS.contains(&name) {
            self.break_line();
        }
        if name == "li" {
            self.current.push_str("• ");
        }
        if name == "pre" {
            self.pre_depth += 1;
        }
        self.walk(element);
        if name == "pre" {
            self.pre_depth -= 1;
        }
        if paragraph {
            self.break_line();
            self.lines.push(String::new());
        } else if LINE_TAGS.contains(&name) {
            self.break_line();
        }
    }

    fn push_link(&mut self, element: ElementRef<'_>, href: &str) {
        let label = collapse_whitespace(&element.text().collect::<String>());
        let index = self.links.len() + 1;
        let label = if label.is_empty() {
            href.to_string()
        } else {
            label
        };
        self.push_text(&label);
        self.current.push_str(&format!("[{}]", index));
        self.links.push(LinkRef {
            index,
            label,
            href: href.to_string(),
        });
    }

    fn push_text(&mut self, text: &str) {
        if self.pre_depth > 0 {
            let mut segments = text.split('\n');
            if let Some(first) = segments.next() {
                self.current.push_str(first);
            }
            for segment in segments {
                let line = std::mem::take(&mut self.current);
                self.lines.push(line.trim_end().to_string());
                self.current.push_str(segment);
            }
            return;
        }
        for ch in text.chars() {
            if ch.is_whitespace() {
                if !self.current.is_empty() && !self.current.ends_with(' ') {
                    self.current.push(' ');
                }
            } else {
                self.current.push(ch);
            }
        }
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        let line = line.trim_end();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
    }

    fn finish(mut self) -> HtmlText {
        self.break_line();
        let mut lines: Vec<String> = Vec::new();
        for line in self.lines {
            let blank = line.trim().is_empty();
            if blank && lines.last().is_none_or(|l| l.is_empty()) {
                continue;
            }
            lines.push(if blank { String::new() } else { line });
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        HtmlText {
            lines,
            links: self.links,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flattens an HTML fragment into text lines plus its links.
pub fn html_to_text(html: &str) -> HtmlText {
    let fragment = Html::parse_fragment(html);
    let mut builder = TextBuilder::default();
    builder.walk(fragment.root_element());
    builder.finish()
}

/// A single structured entry in the conversation log.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub category: MessageCategory,
    pub time_label: Option<String>,
    pub lines: Vec<String>,
    pub links: Vec<LinkRef>,
}

impl ChatEntry {
    pub fn from_message(message: &DisplayMessage) -> Self {
        let HtmlText { lines, links } = if message.body.is_html() {
            html_to_text(message.body.as_str())
        } else {
            HtmlText {
                lines: message.body.as_str().lines().map(str::to_string).collect(),
                links: Vec::new(),
            }
        };
        Self {
            category: message.category,
            time_label: message.time_label(),
            lines,
            links,
        }
    }
}

pub const TUI_MAX_CHAT_ENTRIES: usize = 3000;

pub fn push_chat_entry(entries: &mut Vec<ChatEntry>, entry: ChatEntry) {
    entries.push(entry);
    if entries.len() > TUI_MAX_CHAT_ENTRIES {
        let overflow = entries.len() - TUI_MAX_CHAT_ENTRIES;
        entries.drain(0..overflow);
    }
}

/// One rendered row; rows carrying a link can be clicked.
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub line: Line<'static>,
    pub link: Option<String>,
}

impl TranscriptLine {
    fn plain(line: Line<'static>) -> Self {
        Self { line, link: None }
    }
}

/// Hard-wraps `text` to `width` terminal columns, keeping empty lines.
/// A wide character never straddles two rows.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if row_width + ch_width > width && !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        row.push(ch);
        row_width += ch_width;
    }
    rows.push(row);
    rows
}

pub fn header_label(category: MessageCategory) -> &'static str {
    match category {
        MessageCategory::User => "You",
        MessageCategory::Bot | MessageCategory::Markdown | MessageCategory::Html => "Assistant",
        MessageCategory::Error => "Error",
        MessageCategory::Warning => "Warning",
        MessageCategory::Finished => "Done",
    }
}

/// Render a single ChatEntry into rows no wider than `width`.
pub fn style_chat_entry(
    entry: &ChatEntry,
    theme: &TuiTheme,
    width: usize,
    out: &mut Vec<TranscriptLine>,
) {
    let accent = theme.accent(entry.category);
    let mut header = vec![
        Span::styled("▌ ", Style::default().fg(accent)),
        Span::styled(
            header_label(entry.category),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(time) = &entry.time_label {
        header.push(Span::styled(
            format!("  {}", time),
            Style::default().fg(theme.text_dim),
        ));
    }
    out.push(TranscriptLine::plain(Line::from(header)));

    let body_width = width.saturating_sub(2);
    let body_style = match entry.category {
        MessageCategory::Error => Style::default().fg(theme.danger),
        MessageCategory::Warning => Style::default().fg(theme.warning),
        MessageCategory::User => Style::default().fg(theme.text_strong),
        _ => Style::default().fg(theme.text_base),
    };
    for line in &entry.lines {
        for segment in wrap_text(line, body_width) {
            out.push(TranscriptLine::plain(Line::from(vec![
                Span::styled("│ ", Style::default().fg(theme.border_normal)),
                Span::styled(segment, body_style),
            ])));
        }
    }

    for link in &entry.links {
        let text = format!("[{}] {}", link.index, link.label);
        for segment in wrap_text(&text, body_width) {
            out.push(TranscriptLine {
                line: Line::from(vec![
                    Span::styled("│ ", Style::default().fg(theme.border_normal)),
                    Span::styled(
                        segment,
                        Style::default()
                            .fg(theme.link)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]),
                link: Some(link.href.clone()),
            });
        }
    }

    out.push(TranscriptLine::plain(Line::default()));
}

pub fn style_chat_entries(
    entries: &[ChatEntry],
    theme: &TuiTheme,
    width: usize,
) -> Vec<TranscriptLine> {
    let mut out = Vec::new();
    for entry in entries {
        style_chat_entry(entry, theme, width, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use jide_core::MessageBody;

    #[test]
    fn test_html_to_text_extracts_links() {
        let html = r##"<p>Edited <a href="#call:jide_open_file//src/main.rs">main.rs</a> and <a href='https://x.io'>docs</a></p>"##;
        let text = html_to_text(html);
        assert_eq!(text.lines, vec!["Edited main.rs[1] and docs[2]"]);
        assert_eq!(text.links.len(), 2);
        assert_eq!(text.links[0].href, "#call:jide_open_file//src/main.rs");
        assert_eq!(text.links[0].label, "main.rs");
        assert_eq!(text.links[1].index, 2);
    }

    #[test]
    fn test_html_to_text_decodes_entities_and_skips_styles() {
        let html = "<p>a &rarr; b &hellip; c &mdash; d &amp; &lt;e&gt;</p>\
                    <a href=#call:jide_open_file//x.rs>x.rs</a>\
                    <style>p{color:red}</style><script>alert(1)</script>";
        let text = html_to_text(html);
        assert_eq!(text.lines, vec!["a \u{2192} b \u{2026} c \u{2014} d & <e>", "", "x.rs[1]"]);
        assert_eq!(
            text.links,
            vec![LinkRef {
                index: 1,
                label: "x.rs".into(),
                href: "#call:jide_open_file//x.rs".into(),
            }]
        );
    }

    #[test]
    fn test_html_to_text_blocks_and_lists() {
        let html = "<h1>Title</h1>\n<ul>\n<li>one</li>\n<li>two <em>now</em></li>\n</ul>\n<pre><code>let x = 1;\nlet y = 2;\n</code></pre>\n<p>a<br>b</p>";
        let text = html_to_text(html);
        assert_eq!(
            text.lines,
            vec!["Title", "", "\u{2022} one", "\u{2022} two now", "", "let x = 1;", "let y = 2;", "", "a", "b"]
        );
    }

    #[test]
    fn test_link_without_text_uses_href_label() {
        let text = html_to_text(r#"<a href="https://x.io"></a>"#);
        assert_eq!(text.lines, vec!["https://x.io[1]"]);
        assert_eq!(text.links[0].label, "https://x.io");
    }

    #[test]
    fn test_user_pre_keeps_newlines() {
        let text = html_to_text("<pre>line one\nline &lt;two&gt;</pre>");
        assert_eq!(text.lines, vec!["line one", "line <two>"]);
    }

    #[test]
    fn test_entry_from_text_message() {
        let message = DisplayMessage {
            category: MessageCategory::Error,
            classes: vec!["message".into(), "error-message".into()],
            body: MessageBody::Text("<b>not html</b>".into()),
            timestamp: None,
        };
        let entry = ChatEntry::from_message(&message);
        assert_eq!(entry.lines, vec!["<b>not html</b>"]);
        assert!(entry.links.is_empty());
        assert!(entry.time_label.is_none());
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("", 4), vec![""]);
        assert_eq!(wrap_text("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_wrap_text_counts_wide_chars_as_two_columns() {
        let rows = wrap_text("\u{4e01}\u{620a}\u{5df1}\u{5e9a}\u{8f9b}", 4);
        assert_eq!(rows, vec!["\u{4e01}\u{620a}", "\u{5df1}\u{5e9a}", "\u{8f9b}"]);
        assert_eq!(wrap_text("a\u{4e01}b", 2), vec!["a", "\u{4e01}", "b"]);
    }

    #[test]
    fn test_link_rows_carry_href() {
        let entry = ChatEntry {
            category: MessageCategory::Html,
            time_label: Some("12:00:00".into()),
            lines: vec!["see a.rs[1]".into()],
            links: vec![LinkRef {
                index: 1,
                label: "a.rs".into(),
                href: "#call:jide_open_file//a.rs".into(),
            }],
        };
        let rows = style_chat_entries(&[entry], &TuiTheme::default_dark(), 80);
        let plain: Vec<String> = rows.iter().map(|r| line_plain(&r.line)).collect();
        assert_eq!(plain[0], "▌ Assistant  12:00:00");
        assert_eq!(plain[1], "│ see a.rs[1]");
        assert_eq!(plain[2], "│ [1] a.rs");
        assert_eq!(rows[2].link.as_deref(), Some("#call:jide_open_file//a.rs"));
        assert!(rows[1].link.is_none());
        assert_eq!(plain[3], "");
    }

    #[test]
    fn test_push_chat_entry_caps_history() {
        let mut entries = Vec::new();
        for _ in 0..TUI_MAX_CHAT_ENTRIES + 5 {
            push_chat_entry(
                &mut entries,
                ChatEntry {
                    category: MessageCategory::Bot,
                    time_label: None,
                    lines: vec![],
                    links: vec![],
                },
            );
        }
        assert_eq!(entries.len(), TUI_MAX_CHAT_ENTRIES);
    }
}
