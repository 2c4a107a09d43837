//! Border and shading wrappers.
//!
//! Adjacent paragraphs (or runs) with identical border and shading
//! properties share one wrapper element: a `div` for paragraphs, a `span`
//! for runs. [`BorderTracker`] keeps the open wrapper of each channel and
//! decides when to open, continue or close it.

use log::trace;

use crate::dom::NodeId;
use crate::ooxml::{Border, NumberingProperties, ParagraphBorders, ParagraphProperties, RunProperties, Shading};

use super::event::{Declarations, HtmlTag, OutputEvent};

/// Which kind of node a wrapper belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderChannel {
    Paragraph,
    Run,
}

impl BorderChannel {
    fn tag(self) -> &'static str {
        match self {
            BorderChannel::Paragraph => "div",
            BorderChannel::Run => "span",
        }
    }

    fn index(self) -> usize {
        match self {
            BorderChannel::Paragraph => 0,
            BorderChannel::Run => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Borders {
    Paragraph(ParagraphBorders),
    Run(Border),
}

/// Border and shading of a paragraph or run.
///
/// Shading only counts when it yields a background color.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub borders: Option<Borders>,
    pub shading: Option<Shading>,
}

impl BoxStyle {
    pub fn of_paragraph(props: &ParagraphProperties) -> Option<Self> {
        let borders = props
            .borders
            .clone()
            .filter(|borders| !borders.is_empty())
            .map(Borders::Paragraph);
        Self::build(borders, props.shading.as_ref())
    }

    pub fn of_run(props: &RunProperties) -> Option<Self> {
        Self::build(props.border.clone().map(Borders::Run), props.shading.as_ref())
    }

    fn build(borders: Option<Borders>, shading: Option<&Shading>) -> Option<Self> {
        let shading = shading.filter(|shading| shading.background_color().is_some()).cloned();
        if borders.is_none() && shading.is_none() {
            return None;
        }
        Some(BoxStyle { borders, shading })
    }

    fn paragraph_borders(&self) -> Option<&ParagraphBorders> {
        match &self.borders {
            Some(Borders::Paragraph(borders)) => Some(borders),
            _ => None,
        }
    }

    /// Declarations of the wrapper element
    pub fn css(&self, reset_top: bool) -> Declarations {
        let mut css = Declarations::new();
        match &self.borders {
            Some(Borders::Paragraph(borders)) => {
                if borders.is_uniform() {
                    if let Some(top) = &borders.top {
                        css.set("border", border_value(top));
                    }
                } else {
                    for (side, border) in borders.sides() {
                        if let Some(border) = border {
                            css.set(side_property(side), border_value(border));
                        }
                    }
                }
                if reset_top {
                    css.set("border-top", "0");
                }
                let padding: Vec<u32> = borders
                    .sides()
                    .iter()
                    .map(|(_, border)| border.map_or(0, Border::spacing))
                    .collect();
                let padding = if padding.iter().all(|&space| space == padding[0]) {
                    format!("{}pt", padding[0])
                } else {
                    padding.iter().map(|space| format!("{}pt", space)).collect::<Vec<_>>().join(" ")
                };
                css.set("padding", padding);
                if let Some(top) = borders.top.as_ref().filter(|top| top.shadow) {
                    css.set("box-shadow", shadow_value(top));
                }
            }
            Some(Borders::Run(border)) => {
                css.set("border", border_value(border));
                if border.spacing() != 0 {
                    css.set("padding", format!("{}pt", border.spacing()));
                }
                if border.shadow {
                    css.set("box-shadow", shadow_value(border));
                }
            }
            None => {}
        }
        if let Some(color) = self.shading.as_ref().and_then(Shading::background_color) {
            css.set("background-color", format!("#{}", color));
        }
        css
    }

    /// Declarations of the empty element drawn between two paragraphs
    pub fn between_css(&self) -> Option<Declarations> {
        let borders = self.paragraph_borders()?;
        let between = borders.between.as_ref()?;
        let inset = |border: Option<&Border>| -i64::from(border.map_or(0, Border::spacing));
        let mut css = Declarations::new();
        css.set("border-top", border_value(between));
        css.set(
            "margin",
            format!(
                "{}pt {}pt {}pt {}pt",
                between.spacing(),
                inset(borders.right.as_ref()),
                between.spacing(),
                inset(borders.left.as_ref())
            ),
        );
        Some(css)
    }
}

fn border_value(border: &Border) -> String {
    format!("{}pt {} #{}", border.width_points(), border.css_style(), border.color())
}

fn shadow_value(border: &Border) -> String {
    format!("{0}pt {0}pt", border.width_points())
}

fn side_property(side: &str) -> &'static str {
    match side {
        "top" => "border-top",
        "right" => "border-right",
        "bottom" => "border-bottom",
        _ => "border-left",
    }
}

#[derive(Debug, Clone)]
struct OpenWrapper {
    parent: Option<NodeId>,
    style: BoxStyle,
}

/// The last paragraph that went through the tracker
#[derive(Debug, Clone)]
struct PreviousParagraph {
    numbering: Option<NumberingProperties>,
    borders: Option<ParagraphBorders>,
}

/// Wrapper state of both channels
#[derive(Debug, Default)]
pub struct BorderTracker {
    open: [Option<OpenWrapper>; 2],
    /// Style of a wrapper closed because the adjacent item differed
    handed_over: [Option<BoxStyle>; 2],
    previous_paragraph: Option<PreviousParagraph>,
}

impl BorderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted before an item's own content
    pub fn enter(
        &mut self,
        channel: BorderChannel,
        parent: Option<NodeId>,
        style: Option<&BoxStyle>,
        numbering: Option<&NumberingProperties>,
    ) -> Vec<OutputEvent> {
        let slot = channel.index();
        let handed_over = self.handed_over[slot].take();
        let mut events = Vec::new();

        let Some(style) = style else {
            events.extend(self.close(channel));
            return events;
        };

        let previous = self.open[slot]
            .as_ref()
            .map(|open| open.style.clone())
            .or(handed_over);

        let continues = self.open[slot].as_ref().is_some_and(|open| {
            open.style == *style && (channel == BorderChannel::Paragraph || open.parent == parent)
        });
        if !continues {
            events.extend(self.close(channel));
            let reset_top = channel == BorderChannel::Paragraph && self.resets_top(style, numbering);
            trace!("Opening {} wrapper (reset top: {})", channel.tag(), reset_top);
            events.push(HtmlTag::new(channel.tag()).style(&style.css(reset_top)).open());
            self.open[slot] = Some(OpenWrapper {
                parent,
                style: style.clone(),
            });
        }

        if let Some(previous) = previous.filter(|previous| previous.borders == style.borders) {
            if let Some(css) = style.between_css() {
                let between = style
                    .paragraph_borders()
                    .and_then(|borders| borders.between.as_ref());
                let add = match (&style.shading, between) {
                    (Some(shading), Some(between)) if previous.shading.as_ref() != Some(shading) => {
                        previous.paragraph_borders().and_then(|b| b.bottom.as_ref()) != Some(between)
                    }
                    _ => true,
                };
                if add {
                    let tag = HtmlTag::new(channel.tag()).style(&css);
                    events.push(tag.open());
                    events.push(tag.close());
                }
            }
        }
        events
    }

    /// Events emitted after an item's content.
    ///
    /// `next` is the style of the following sibling when that sibling belongs
    /// to the same channel; the wrapper stays open only if it is identical.
    pub fn leave(
        &mut self,
        channel: BorderChannel,
        style: Option<&BoxStyle>,
        next: Option<Option<&BoxStyle>>,
        paragraph: Option<&ParagraphProperties>,
    ) -> Vec<OutputEvent> {
        if channel == BorderChannel::Paragraph {
            self.previous_paragraph = paragraph.map(|props| PreviousParagraph {
                numbering: props.numbering.clone(),
                borders: props.borders.clone().filter(|borders| !borders.is_empty()),
            });
        }
        let Some(style) = style else {
            return Vec::new();
        };
        match next {
            Some(Some(next)) if next == style => Vec::new(),
            Some(_) => {
                self.handed_over[channel.index()] = Some(style.clone());
                self.close(channel)
            }
            None => self.close(channel),
        }
    }

    /// Closes the open wrapper of `channel`, if any
    pub fn close(&mut self, channel: BorderChannel) -> Vec<OutputEvent> {
        match self.open[channel.index()].take() {
            Some(_) => vec![OutputEvent::Close(channel.tag())],
            None => Vec::new(),
        }
    }

    /// Closes every open wrapper
    pub fn finish(&mut self) -> Vec<OutputEvent> {
        let mut events = self.close(BorderChannel::Run);
        events.extend(self.close(BorderChannel::Paragraph));
        self.handed_over = [None, None];
        events
    }

    /// Whether the top border of a new paragraph wrapper duplicates the
    /// bottom border of the paragraph just before it
    fn resets_top(&self, style: &BoxStyle, numbering: Option<&NumberingProperties>) -> bool {
        let Some(previous) = &self.previous_paragraph else {
            return false;
        };
        let (Some(current), Some(before)) = (style.paragraph_borders(), previous.borders.as_ref()) else {
            return false;
        };
        previous.numbering.as_ref() == numbering
            && current.is_uniform()
            && before.is_uniform()
            && current.top == before.bottom
    }
}
