//! Markdown rendering with cross-reference auto-linking.

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashMap;

use crate::config::ELLIPSIS;
use crate::item::{Item, ItemKind};

/// `query user`, `Mutation createUser`, ...
const PHRASE_PATTERN: &str = r"\b((?i:query|mutation|subscription))\s+([A-Za-z_]\w*)\b";
const WORD_PATTERN: &str = r"\b[A-Za-z_]\w*\b";
const SENTENCE_END_PATTERN: &str = r"\.(\s|$)";

/// Reference paths of every linkable item.
///
/// Bare-word lookups prefer the type when a type and a field share a name,
/// otherwise the first item registered under that name.
#[derive(Debug, Clone)]
pub struct LinkIndex {
    by_kind: HashMap<(ItemKind, String), String>,
    by_name: HashMap<String, ItemKind>,
    phrase: Option<Regex>,
    word: Option<Regex>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            by_name: HashMap::new(),
            phrase: Regex::new(PHRASE_PATTERN).ok(),
            word: Regex::new(WORD_PATTERN).ok(),
        }
    }

    pub fn insert(&mut self, item: &Item, href: impl Into<String>) {
        self.by_kind
            .insert((item.kind, item.name.clone()), href.into());
        let preferred = self.by_name.entry(item.name.clone()).or_insert(item.kind);
        if item.kind == ItemKind::Type {
            *preferred = ItemKind::Type;
        }
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Reference path of an item of a given kind.
    pub fn lookup(&self, kind: ItemKind, name: &str) -> Option<&str> {
        self.by_kind
            .get(&(kind, name.to_string()))
            .map(String::as_str)
    }

    /// Reference path of whichever item a bare word refers to.
    pub fn lookup_any(&self, name: &str) -> Option<(ItemKind, &str)> {
        let kind = *self.by_name.get(name)?;
        self.lookup(kind, name).map(|href| (kind, href))
    }

    fn target(&self, kind: ItemKind, name: &str, current: Option<&Item>) -> Option<String> {
        if current.is_some_and(|c| c.kind == kind && c.name == name) {
            return None;
        }
        self.lookup(kind, name).map(str::to_string)
    }

    fn target_any(&self, name: &str, current: Option<&Item>) -> Option<String> {
        let (kind, href) = self.lookup_any(name)?;
        if current.is_some_and(|c| c.kind == kind && c.name == name) {
            return None;
        }
        Some(href.to_string())
    }

    /// Replace a run of text with text and link events.
    fn link_text(&self, text: &str, current: Option<&Item>, out: &mut Vec<Event<'static>>) {
        let mut last = 0;
        if let Some(phrase) = &self.phrase {
            for caps in phrase.captures_iter(text) {
                let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
                else {
                    continue;
                };
                let href = ItemKind::parse(&kind.as_str().to_lowercase())
                    .and_then(|kind| self.target(kind, name.as_str(), current));
                if let Some(href) = href {
                    self.link_words(&text[last..whole.start()], current, out);
                    push_link(out, href, whole.as_str());
                    last = whole.end();
                }
            }
        }
        self.link_words(&text[last..], current, out);
    }

    fn link_words(&self, text: &str, current: Option<&Item>, out: &mut Vec<Event<'static>>) {
        let mut last = 0;
        if let Some(word) = &self.word {
            for m in word.find_iter(text) {
                if let Some(href) = self.target_any(m.as_str(), current) {
                    push_text(out, &text[last..m.start()]);
                    push_link(out, href, m.as_str());
                    last = m.end();
                }
            }
        }
        push_text(out, &text[last..]);
    }
}

impl Default for LinkIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn push_text(out: &mut Vec<Event<'static>>, text: &str) {
    if !text.is_empty() {
        out.push(Event::Text(CowStr::from(text.to_string())));
    }
}

fn push_link(out: &mut Vec<Event<'static>>, href: String, text: &str) {
    out.push(Event::Start(Tag::Link {
        link_type: LinkType::Inline,
        dest_url: CowStr::from(href),
        title: CowStr::from(""),
        id: CowStr::from(""),
    }));
    push_text(out, text);
    out.push(Event::End(TagEnd::Link));
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Auto-link plain text runs; code, code blocks and existing links are left
/// alone. Adjacent text events are merged first so phrases split by the
/// parser still link.
fn auto_link(events: Vec<Event<'_>>, links: &LinkIndex, current: Option<&Item>) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending = String::new();
    let mut link_depth = 0usize;
    let mut in_code_block = false;

    let flush = |pending: &mut String, out: &mut Vec<Event<'static>>, linkable: bool| {
        if pending.is_empty() {
            return;
        }
        let text = std::mem::take(pending);
        if linkable {
            links.link_text(&text, current, out);
        } else {
            out.push(Event::Text(CowStr::from(text)));
        }
    };

    for event in events {
        if let Event::Text(text) = &event {
            pending.push_str(text);
            continue;
        }
        flush(&mut pending, &mut out, link_depth == 0 && !in_code_block);

        match &event {
            Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => link_depth += 1,
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1)
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            _ => {}
        }
        out.push(event.into_static());
    }
    flush(&mut pending, &mut out, link_depth == 0 && !in_code_block);

    out
}

/// Render Markdown to HTML with auto-linking. `current` is never linked to
/// itself.
pub fn render_markdown(source: &str, links: &LinkIndex, current: Option<&Item>) -> String {
    let events: Vec<Event<'_>> = Parser::new_ext(source, options()).collect();
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, auto_link(events, links, current).into_iter());
    out
}

/// A module document after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Body HTML without the first-level heading.
    pub html: String,
    /// Text of the first first-level heading.
    pub heading: Option<String>,
    /// First sentence of the first paragraph, word-limited.
    pub short_description: Option<String>,
}

/// Render a module body, pulling out its heading and short description.
pub fn render_document(body: &str, links: &LinkIndex, max_words: usize) -> RenderedDocument {
    let events: Vec<Event<'_>> = Parser::new_ext(body, options()).collect();

    let mut heading = None;
    let mut heading_range = None;
    let mut paragraph = None;

    let mut i = 0;
    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if heading.is_none() => {
                let end = find_end(&events, i, |e| matches!(e, Event::End(TagEnd::Heading(HeadingLevel::H1))));
                heading = Some(plain_text(&events[i + 1..end]));
                heading_range = Some((i, end));
                i = end;
            }
            Event::Start(Tag::Paragraph) if paragraph.is_none() => {
                let end = find_end(&events, i, |e| matches!(e, Event::End(TagEnd::Paragraph)));
                paragraph = Some(plain_text(&events[i + 1..end]));
                i = end;
            }
            _ => {}
        }
        i += 1;
    }

    let kept: Vec<Event<'_>> = events
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !heading_range.is_some_and(|(start, end)| *i >= start && *i <= end))
        .map(|(_, e)| e)
        .collect();

    let mut html_out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut html_out, auto_link(kept, links, None).into_iter());

    RenderedDocument {
        html: html_out,
        heading: heading.filter(|h| !h.is_empty()),
        short_description: paragraph
            .map(|p| short_description(&p, max_words))
            .filter(|s| !s.is_empty()),
    }
}

fn find_end(events: &[Event<'_>], start: usize, is_end: impl Fn(&Event<'_>) -> bool) -> usize {
    events[start..]
        .iter()
        .position(is_end)
        .map(|p| start + p)
        .unwrap_or(events.len().saturating_sub(1))
}

fn plain_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}

/// First sentence, cut to `max_words` words with an ellipsis when longer.
pub fn short_description(paragraph: &str, max_words: usize) -> String {
    let sentence = match Regex::new(SENTENCE_END_PATTERN)
        .ok()
        .and_then(|re| re.find(paragraph))
    {
        Some(end) => &paragraph[..end.start() + 1],
        None => paragraph,
    };

    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}{}", words[..max_words].join(" "), ELLIPSIS)
    } else {
        words.join(" ")
    }
}
