//! Output events and the tag model used to build them.
//!
//! Handlers produce lazy sequences of [`OutputEvent`]s; [`HtmlTag::apply`]
//! wraps a sequence in open/close events and can suppress the tag when the
//! wrapped content turns out to be blank.

use std::collections::BTreeMap;

/// Lazily produced output of a handler
pub type Events<'a> = Box<dyn Iterator<Item = OutputEvent> + 'a>;

/// A single piece of output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// Literal text, escaped when serialized
    Text(String),
    /// Opening tag, or a complete void element
    Open(HtmlTag),
    /// Closing tag
    Close(&'static str),
}

impl OutputEvent {
    pub fn text(text: impl Into<String>) -> Self {
        OutputEvent::Text(text.into())
    }

    /// Whether this event counts as visible content.
    ///
    /// Tags only count when they allow whitespace (line breaks, images, tabs).
    pub fn is_blank(&self) -> bool {
        match self {
            OutputEvent::Text(text) => text.trim().is_empty(),
            OutputEvent::Open(tag) => !tag.allow_whitespace,
            OutputEvent::Close(_) => true,
        }
    }

    /// Appends the serialized event to `out`
    pub fn write_html(&self, out: &mut String) {
        match self {
            OutputEvent::Text(text) => out.push_str(&html_escape::encode_text(text)),
            OutputEvent::Open(tag) => tag.write_open(out),
            OutputEvent::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

/// An HTML element with sorted attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTag {
    pub name: &'static str,
    attributes: BTreeMap<&'static str, String>,
    /// Rendered as `<name />` with no closing event
    pub self_closing: bool,
    /// Counts as content even though it has no text
    pub allow_whitespace: bool,
}

impl HtmlTag {
    pub fn new(name: &'static str) -> Self {
        HtmlTag {
            name,
            attributes: BTreeMap::new(),
            self_closing: false,
            allow_whitespace: false,
        }
    }

    /// A void element such as `br`, `hr` or `img`
    pub fn void(name: &'static str) -> Self {
        HtmlTag {
            self_closing: true,
            allow_whitespace: true,
            ..HtmlTag::new(name)
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value.into());
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Sets the `style` attribute unless the declarations are empty
    pub fn style(self, declarations: &Declarations) -> Self {
        if declarations.is_empty() {
            return self;
        }
        self.attr("style", declarations.to_string())
    }

    pub fn allowing_whitespace(mut self) -> Self {
        self.allow_whitespace = true;
        self
    }

    pub fn open(&self) -> OutputEvent {
        OutputEvent::Open(self.clone())
    }

    pub fn close(&self) -> OutputEvent {
        OutputEvent::Close(self.name)
    }

    /// Wraps `events` in this tag.
    ///
    /// With `allow_empty` false, blank content produces nothing at all. A
    /// void element is emitted before the content instead of around it.
    pub fn apply<'a>(self, events: Events<'a>, allow_empty: bool) -> Events<'a> {
        if allow_empty {
            return self.wrap(events);
        }
        deferred(move || match non_blank(events) {
            Some(events) => self.wrap(events),
            None => nothing(),
        })
    }

    fn wrap<'a>(self, events: Events<'a>) -> Events<'a> {
        let open = std::iter::once(self.open());
        if self.self_closing {
            return Box::new(open.chain(events));
        }
        let close = std::iter::once(self.close());
        Box::new(open.chain(events).chain(close))
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push_str(if self.self_closing { " />" } else { ">" });
    }
}

/// CSS declarations, serialized sorted by property as `name:value;name:value`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(BTreeMap<&'static str, String>);

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: &'static str, value: impl Into<String>) {
        self.0.insert(property, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }
}

impl std::fmt::Display for Declarations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (property, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}:{}", property, value)?;
        }
        Ok(())
    }
}

pub fn nothing<'a>() -> Events<'a> {
    Box::new(std::iter::empty())
}

pub fn single<'a>(event: OutputEvent) -> Events<'a> {
    Box::new(std::iter::once(event))
}

/// Defers building a sequence until its first element is pulled
pub fn deferred<'a, F>(build: F) -> Events<'a>
where
    F: FnOnce() -> Events<'a> + 'a,
{
    Box::new(std::iter::once_with(build).flatten())
}

/// Pulls events until one is visible content.
///
/// Returns the full sequence, already pulled events first, together with
/// whether it has any visible content.
pub fn probe<'a>(mut events: Events<'a>) -> (Events<'a>, bool) {
    let mut pulled = Vec::new();
    while let Some(event) = events.next() {
        let blank = event.is_blank();
        pulled.push(event);
        if !blank {
            return (Box::new(pulled.into_iter().chain(events)), true);
        }
    }
    (Box::new(pulled.into_iter()), false)
}

/// The full sequence when it has visible content, `None` when it is empty
/// or only whitespace
pub fn non_blank<'a>(events: Events<'a>) -> Option<Events<'a>> {
    let (events, visible) = probe(events);
    visible.then_some(events)
}

/// Serializes a sequence of events
pub fn to_html<I: IntoIterator<Item = OutputEvent>>(events: I) -> String {
    let mut out = String::new();
    for event in events {
        event.write_html(&mut out);
    }
    out
}
