//! Presentation Adapter
//!
//! Breaks markdown into display blocks. Pure, never fails: anything the
//! parser does not recognize ends up as plain paragraph text. All emitted text
//! has control characters stripped and raw HTML is kept as literal text, so
//! provider output cannot inject markup or terminal escape sequences.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

/// Inline run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Span {
    Text { text: String },
    Emphasis { text: String },
    Strong { text: String },
    Code { text: String },
    Link { text: String, url: String },
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Text { text }
            | Span::Emphasis { text }
            | Span::Strong { text }
            | Span::Code { text }
            | Span::Link { text, .. } => text,
        }
    }
}

/// A list entry. Nested lists are flattened with increasing `depth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub depth: u8,
    pub spans: Vec<Span>,
}

/// Block-level display element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        spans: Vec<Span>,
    },
    Paragraph {
        spans: Vec<Span>,
    },
    List {
        ordered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    Rule,
}

/// Structural breakdown of a markdown document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBlocks {
    pub blocks: Vec<Block>,
}

impl RenderedBlocks {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Text of every heading, in document order
    pub fn headings(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { spans, .. } => Some(join_spans(spans)),
                _ => None,
            })
            .collect()
    }
}

/// Concatenate the visible text of a span sequence
pub fn join_spans(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

/// Render markdown into display blocks.
pub fn render(content: &str) -> RenderedBlocks {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(content, Options::ENABLE_STRIKETHROUGH) {
        builder.push(event);
    }
    builder.finish()
}

/// Strip control characters other than newline and tab
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    match lower.split_once(':') {
        Some((scheme, _)) if !scheme.contains('/') => {
            matches!(scheme, "http" | "https" | "mailto")
        }
        _ => true,
    }
}

#[derive(Debug)]
struct ListFrame {
    ordered: bool,
    start: Option<u64>,
    items: Vec<ListItem>,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    strong: usize,
    emphasis: usize,
    link: Option<(String, String)>,
    heading: Option<u8>,
    code: Option<(Option<String>, String)>,
    lists: Vec<ListFrame>,
}

impl BlockBuilder {
    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.code_span(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.text("\n"),
            Event::Rule if !self.lists.is_empty() => self.separate(),
            Event::Rule => {
                self.flush_paragraph();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            // Inside a list item a heading is kept as bold item text
            Tag::Heading { .. } if !self.lists.is_empty() => {
                self.separate();
                self.strong += 1;
            }
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.heading = Some(level as u8);
            }
            Tag::CodeBlock(kind) => {
                if self.lists.is_empty() {
                    self.flush_paragraph();
                }
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(sanitize(lang.trim()))
                    }
                    _ => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.flush_paragraph();
                } else {
                    self.flush_item();
                }
                self.lists.push(ListFrame {
                    ordered: start.is_some(),
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Link { dest_url, .. } => {
                self.link = Some((dest_url.to_string(), String::new()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => match self.heading.take() {
                Some(level) => {
                    let spans = std::mem::take(&mut self.spans);
                    self.blocks.push(Block::Heading { level, spans });
                }
                None => {
                    self.strong = self.strong.saturating_sub(1);
                    self.separate();
                }
            },
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.flush_paragraph();
                } else {
                    // Loose list items keep their paragraphs inline
                    self.separate();
                }
            }
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code.take() {
                    if self.lists.is_empty() {
                        self.blocks.push(Block::CodeBlock { language, code });
                    } else {
                        // Code inside a list item stays with that item
                        self.separate();
                        self.push_span(Span::Code {
                            text: code.trim_end_matches('\n').to_string(),
                        });
                        self.separate();
                    }
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.flush_item();
                if let Some(frame) = self.lists.pop() {
                    match self.lists.last_mut() {
                        Some(parent) => parent.items.extend(frame.items),
                        None => self.blocks.push(Block::List {
                            ordered: frame.ordered,
                            start: frame.start,
                            items: frame.items,
                        }),
                    }
                }
            }
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Link => {
                if let Some((url, text)) = self.link.take() {
                    let span = if is_safe_url(&url) {
                        Span::Link {
                            text,
                            url: sanitize(&url),
                        }
                    } else {
                        Span::Text { text }
                    };
                    self.push_span(span);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let text = sanitize(text);
        if let Some((_, code)) = self.code.as_mut() {
            code.push_str(&text);
        } else if let Some((_, link_text)) = self.link.as_mut() {
            link_text.push_str(&text);
        } else {
            let span = if self.strong > 0 {
                Span::Strong { text }
            } else if self.emphasis > 0 {
                Span::Emphasis { text }
            } else {
                Span::Text { text }
            };
            self.push_span(span);
        }
    }

    fn code_span(&mut self, code: &str) {
        let code = sanitize(code);
        if let Some((_, link_text)) = self.link.as_mut() {
            link_text.push_str(&code);
        } else {
            self.push_span(Span::Code { text: code });
        }
    }

    /// Space between inline runs of one list item, never doubled or leading
    fn separate(&mut self) {
        let needed = match self.spans.last() {
            None => false,
            Some(Span::Text { text }) => !text.ends_with(char::is_whitespace),
            Some(_) => true,
        };
        if needed {
            self.push_span(Span::Text {
                text: " ".to_string(),
            });
        }
    }

    /// Append a span, merging it into the previous one when both are the same kind
    fn push_span(&mut self, span: Span) {
        if let Some(last) = self.spans.last_mut() {
            match (last, &span) {
                (Span::Text { text: prev }, Span::Text { text })
                | (Span::Strong { text: prev }, Span::Strong { text })
                | (Span::Emphasis { text: prev }, Span::Emphasis { text }) => {
                    prev.push_str(text);
                    return;
                }
                _ => {}
            }
        }
        self.spans.push(span);
    }

    fn take_spans(&mut self) -> Option<Vec<Span>> {
        let mut spans = std::mem::take(&mut self.spans);
        if let Some(Span::Text { text }) = spans.last_mut() {
            let trimmed = text.trim_end().len();
            text.truncate(trimmed);
            if text.is_empty() {
                spans.pop();
            }
        }
        if spans.is_empty() {
            None
        } else {
            Some(spans)
        }
    }

    fn flush_paragraph(&mut self) {
        if let Some(spans) = self.take_spans() {
            self.blocks.push(Block::Paragraph { spans });
        }
    }

    fn flush_item(&mut self) {
        let depth = self.lists.len().saturating_sub(1) as u8;
        if let Some(spans) = self.take_spans() {
            if let Some(frame) = self.lists.last_mut() {
                frame.items.push(ListItem { depth, spans });
            } else {
                self.blocks.push(Block::Paragraph { spans });
            }
        }
    }

    fn finish(mut self) -> RenderedBlocks {
        if let Some((language, code)) = self.code.take() {
            self.blocks.push(Block::CodeBlock { language, code });
        }
        if let Some((_, text)) = self.link.take() {
            self.push_span(Span::Text { text });
        }
        while !self.lists.is_empty() {
            self.end(TagEnd::List(false));
        }
        self.flush_paragraph();
        RenderedBlocks {
            blocks: self.blocks,
        }
    }
}
