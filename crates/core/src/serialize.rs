//! Stable markdown serialization of a transformed document.
//!
//! The renderer walks the document tree directly and emits markdown
//! text that parses back to the same tree: inline text is re-escaped
//! wherever the surrounding construct would misread it, and block
//! starters (`#`, `-`, ordered markers, ...) are escaped at the head of
//! paragraph lines.

use crate::ast::{AlignKind, Block, Document, Inline, ListItem, ReferenceKind, TableRow};
use crate::wikilink::DEFAULT_ALIAS_DIVIDER;

/// Serializer options.
#[derive(Clone, Copy, Debug)]
pub struct SerializeOptions {
    /// Bullet marker for unordered list items.
    pub bullet: char,
    /// Divider used when re-emitting an unresolved wiki link.
    pub alias_divider: char,
}

impl SerializeOptions {
    /// Defaults for published posts: `-` bullets, `|` alias divider.
    pub const fn posts() -> Self {
        Self {
            bullet: '-',
            alias_divider: DEFAULT_ALIAS_DIVIDER,
        }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self::posts()
    }
}

/// Render a [`Document`] back to markdown text.
///
/// The output is a deterministic function of the node sequence: one
/// bullet marker, frontmatter fenced with `---`, a blank line between
/// frontmatter and body, blocks separated by blank lines, and exactly
/// one trailing newline. A wiki link that survived the pipeline is
/// re-emitted in its raw `[[...]]` form with the brackets escaped, so
/// re-parsing recognizes the link again.
pub fn serialize_document(doc: &Document, options: &SerializeOptions) -> String {
    let renderer = Renderer { options };
    let frontmatter = doc.frontmatter_raw();
    let body = renderer.blocks(&doc.blocks[usize::from(frontmatter.is_some())..]);

    let mut out = String::new();
    if let Some(raw) = frontmatter {
        out.push_str("---\n");
        if !raw.is_empty() {
            out.push_str(raw);
            out.push('\n');
        }
        out.push_str("---\n");
        if !body.is_empty() {
            out.push('\n');
        }
    }
    out.push_str(&body);

    // Exactly one trailing newline, regardless of block structure.
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

struct Renderer<'a> {
    options: &'a SerializeOptions,
}

impl Renderer<'_> {
    fn blocks(&self, blocks: &[Block]) -> String {
        self.blocks_with(blocks, "\n\n")
    }

    fn blocks_with(&self, blocks: &[Block], separator: &str) -> String {
        blocks
            .iter()
            .map(|block| self.block(block))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn block(&self, block: &Block) -> String {
        match block {
            // Only reachable at the top of a document; rendered with its
            // fences wherever it sits so the output stays parseable.
            Block::Frontmatter { value } => format!("---\n{value}\n---"),
            Block::Paragraph { children } => {
                escape_block_starts(&self.inlines(children, false))
            }
            Block::Heading { depth, children } => {
                let content = self.inlines(children, false).replace('\n', " ");
                let hashes = "#".repeat(usize::from(*depth));
                if content.is_empty() {
                    hashes
                } else {
                    format!("{hashes} {content}")
                }
            }
            Block::Blockquote { children } => {
                let body = self.blocks(children);
                if body.is_empty() {
                    return ">".to_string();
                }
                body.lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::List {
                ordered,
                start,
                spread,
                items,
            } => self.list(*ordered, *start, *spread, items),
            Block::Table { align, rows } => self.table(align, rows),
            Block::Code { lang, meta, value } => code_fence(lang.as_deref(), meta.as_deref(), value),
            Block::ThematicBreak => "***".to_string(),
            Block::Definition {
                identifier,
                label,
                url,
                title,
            } => format!(
                "[{}]: {}{}",
                label.as_deref().unwrap_or(identifier),
                render_url(url),
                render_title(title.as_deref()),
            ),
            Block::FootnoteDefinition {
                identifier,
                label,
                children,
            } => {
                let body = self.blocks(children);
                let label = label.as_deref().unwrap_or(identifier);
                let mut lines = body.split('\n');
                let mut out = format!("[^{label}]: {}", lines.next().unwrap_or(""));
                for line in lines {
                    out.push('\n');
                    if !line.is_empty() {
                        out.push_str("    ");
                        out.push_str(line);
                    }
                }
                out
            }
        }
    }

    fn list(&self, ordered: bool, start: Option<u32>, spread: bool, items: &[ListItem]) -> String {
        let loose = spread || items.iter().any(|item| item.spread);
        let mut rendered = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let marker = if ordered {
                format!("{}. ", start.unwrap_or(1) + index as u32)
            } else {
                format!("{} ", self.options.bullet)
            };
            let separator = if item.spread { "\n\n" } else { "\n" };
            let mut body = self.blocks_with(&item.children, separator);
            if let Some(checked) = item.checked {
                body.insert_str(0, if checked { "[x] " } else { "[ ] " });
            }
            rendered.push(indent_item(&marker, &body));
        }
        rendered.join(if loose { "\n\n" } else { "\n" })
    }

    fn table(&self, align: &[AlignKind], rows: &[TableRow]) -> String {
        let columns = rows
            .iter()
            .map(|row| row.cells.len())
            .max()
            .unwrap_or(0)
            .max(align.len());
        if columns == 0 {
            return String::new();
        }
        let render_row = |row: &TableRow| {
            let mut line = String::from("|");
            for index in 0..columns {
                let cell = row
                    .cells
                    .get(index)
                    .map(|cell| self.inlines(cell, true))
                    .unwrap_or_default();
                line.push(' ');
                line.push_str(&cell);
                line.push_str(" |");
            }
            line
        };

        let mut rows = rows.iter();
        let mut lines = Vec::new();
        if let Some(header) = rows.next() {
            lines.push(render_row(header));
        }
        let mut delimiter = String::from("|");
        for index in 0..columns {
            let marker = match align.get(index).cloned().unwrap_or(AlignKind::None) {
                AlignKind::None => "---",
                AlignKind::Left => ":--",
                AlignKind::Right => "--:",
                AlignKind::Center => ":-:",
            };
            delimiter.push(' ');
            delimiter.push_str(marker);
            delimiter.push_str(" |");
        }
        lines.push(delimiter);
        lines.extend(rows.map(render_row));
        lines.join("\n")
    }

    fn inlines(&self, nodes: &[Inline], in_table: bool) -> String {
        let mut out = String::new();
        for (index, node) in nodes.iter().enumerate() {
            match node {
                Inline::Text(value) => {
                    out.push_str(&escape_text(value, in_table));
                    // A trailing `!` right before a link would read as an
                    // image opener.
                    let next_is_link = matches!(
                        nodes.get(index + 1),
                        Some(Inline::Link { .. } | Inline::LinkReference { .. })
                    );
                    if next_is_link && out.ends_with('!') {
                        out.pop();
                        out.push_str("\\!");
                    }
                }
                Inline::WikiLink(link) => {
                    let raw = link.to_raw(self.options.alias_divider);
                    out.push_str(&escape_text(&raw, in_table));
                }
                Inline::Link {
                    url,
                    title,
                    children,
                } => {
                    let text = self.inlines(children, in_table);
                    if title.is_none() && text == *url && url.contains("://") {
                        out.push('<');
                        out.push_str(url);
                        out.push('>');
                    } else {
                        out.push('[');
                        out.push_str(&text);
                        out.push_str("](");
                        out.push_str(&render_url(url));
                        out.push_str(&render_title(title.as_deref()));
                        out.push(')');
                    }
                }
                Inline::LinkReference {
                    identifier,
                    label,
                    reference_kind,
                    children,
                } => {
                    out.push('[');
                    out.push_str(&self.inlines(children, in_table));
                    out.push(']');
                    push_reference(&mut out, reference_kind, label.as_deref(), identifier);
                }
                Inline::Image { url, title, alt } => {
                    out.push_str("![");
                    out.push_str(&escape_text(alt, in_table));
                    out.push_str("](");
                    out.push_str(&render_url(url));
                    out.push_str(&render_title(title.as_deref()));
                    out.push(')');
                }
                Inline::ImageReference {
                    identifier,
                    label,
                    reference_kind,
                    alt,
                } => {
                    out.push_str("![");
                    out.push_str(&escape_text(alt, in_table));
                    out.push(']');
                    push_reference(&mut out, reference_kind, label.as_deref(), identifier);
                }
                Inline::Emphasis { children } => {
                    out.push('*');
                    out.push_str(&self.inlines(children, in_table));
                    out.push('*');
                }
                Inline::Strong { children } => {
                    out.push_str("**");
                    out.push_str(&self.inlines(children, in_table));
                    out.push_str("**");
                }
                Inline::Delete { children } => {
                    out.push_str("~~");
                    out.push_str(&self.inlines(children, in_table));
                    out.push_str("~~");
                }
                Inline::InlineCode(value) => out.push_str(&inline_code(value)),
                // Table rows are single lines; a break degrades to a space.
                Inline::Break => out.push_str(if in_table { " " } else { "\\\n" }),
                Inline::FootnoteReference { identifier, label } => {
                    out.push_str("[^");
                    out.push_str(label.as_deref().unwrap_or(identifier));
                    out.push(']');
                }
            }
        }
        out
    }
}

fn indent_item(marker: &str, body: &str) -> String {
    if body.is_empty() {
        return marker.trim_end().to_string();
    }
    let indent = " ".repeat(marker.chars().count());
    let mut out = String::new();
    for (index, line) in body.split('\n').enumerate() {
        if index == 0 {
            out.push_str(marker);
        } else {
            out.push('\n');
            if line.is_empty() {
                continue;
            }
            out.push_str(&indent);
        }
        out.push_str(line);
    }
    out
}

fn push_reference(out: &mut String, kind: &ReferenceKind, label: Option<&str>, identifier: &str) {
    match kind {
        ReferenceKind::Shortcut => {}
        ReferenceKind::Collapsed => out.push_str("[]"),
        ReferenceKind::Full => {
            out.push('[');
            out.push_str(label.unwrap_or(identifier));
            out.push(']');
        }
    }
}

/// Escape characters that would open an inline construct when the text
/// is parsed again. `@` and the `www.`/`http` heads of autolink
/// literals are neutralized too (letters cannot be backslash-escaped,
/// so the head letter becomes a character reference), keeping degraded
/// link text inert. Table cells additionally escape `|` and cannot
/// hold newlines.
fn escape_text(value: &str, in_table: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev: Option<char> = None;
    let mut iter = value.char_indices().peekable();
    while let Some((index, c)) = iter.next() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '~' | '@' => {
                out.push('\\');
                out.push(c);
            }
            '&' if iter
                .peek()
                .is_some_and(|(_, next)| next.is_ascii_alphanumeric() || *next == '#') =>
            {
                out.push_str("\\&");
            }
            '|' if in_table => out.push_str("\\|"),
            '\n' if in_table => out.push(' '),
            'w' | 'W' | 'h' | 'H'
                if at_word_boundary(prev) && starts_autolink_literal(&value[index..]) =>
            {
                out.push_str(&format!("&#x{:x};", c as u32));
            }
            c => out.push(c),
        }
        prev = Some(c);
    }
    out
}

fn at_word_boundary(prev: Option<char>) -> bool {
    !prev.is_some_and(|c| c.is_ascii_alphanumeric())
}

/// The `www.` and `http(s)://` heads promoted to links by the autolink
/// literal construct.
fn starts_autolink_literal(rest: &str) -> bool {
    let head: String = rest.chars().take(8).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("www.") || head.starts_with("http://") || head.starts_with("https://")
}

/// Escape the first character of each paragraph line where it would
/// start a block construct: headings, blockquotes, list markers,
/// thematic breaks and setext underlines.
fn escape_block_starts(text: &str) -> String {
    text.split('\n')
        .map(escape_line_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_line_start(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first @ ('#' | '>' | '+' | '-' | '=')) => {
            format!("\\{first}{}", &line[first.len_utf8()..])
        }
        Some(first) if first.is_ascii_digit() => {
            let digits = line.chars().take_while(char::is_ascii_digit).count();
            let rest = &line[digits..];
            let mut rest_chars = rest.chars();
            let marker = rest_chars.next();
            let after = rest_chars.next();
            match marker {
                // An ordered list marker needs a following space (or
                // nothing) to take effect.
                Some(marker @ ('.' | ')')) if matches!(after, None | Some(' ')) => {
                    format!("{}\\{marker}{}", &line[..digits], &rest[marker.len_utf8()..])
                }
                _ => line.to_string(),
            }
        }
        _ => line.to_string(),
    }
}

fn inline_code(value: &str) -> String {
    let longest = value
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let ticks = "`".repeat(longest + 1);
    let pad = value.starts_with(' ')
        || value.ends_with(' ')
        || value.starts_with('`')
        || value.ends_with('`');
    if pad {
        format!("{ticks} {value} {ticks}")
    } else {
        format!("{ticks}{value}{ticks}")
    }
}

fn code_fence(lang: Option<&str>, meta: Option<&str>, value: &str) -> String {
    let longest = value.split(|c: char| c != '`').map(str::len).max().unwrap_or(0);
    let fence = "`".repeat((longest + 1).max(3));
    let mut info = String::new();
    if let Some(lang) = lang {
        info.push_str(lang);
        if let Some(meta) = meta {
            info.push(' ');
            info.push_str(meta);
        }
    }
    if value.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{value}\n{fence}")
    }
}

fn render_url(url: &str) -> String {
    let needs_wrapping = url.is_empty()
        || url
            .chars()
            .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '<');
    if needs_wrapping {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

fn render_title(title: Option<&str>) -> String {
    match title {
        Some(title) => format!(
            " \"{}\"",
            title.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        None => String::new(),
    }
}
