//! Atom/OPDS serialization of output feeds.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::model::{Author, Entry, Feed, Link};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/terms/";
const OPDS_NS: &str = "http://opds-spec.org/2010/catalog";

/// Error returned when a feed cannot be serialized.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("XML write error: {0}")]
    Xml(String),
    #[error("Rendered document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn xml_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Xml(err.to_string())
}

/// Render `feed` as an Atom document.
///
/// Optional fields that are absent or empty are omitted.
pub fn render(feed: &Feed) -> Result<String, RenderError> {
    let mut doc = AtomWriter {
        writer: Writer::new_with_indent(Vec::new(), b' ', 2),
    };

    doc.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    doc.start(
        BytesStart::new("feed").with_attributes([
            ("xmlns", ATOM_NS),
            ("xmlns:dc", DC_NS),
            ("xmlns:opds", OPDS_NS),
        ]),
    )?;

    let common = &feed.common;
    doc.text_element("id", &common.id)?;
    doc.text_element("title", &common.title)?;
    doc.optional_element("updated", Some(common.updated.as_str()))?;
    if let Some(author) = &common.author {
        doc.author(author)?;
    }
    for link in &common.links {
        doc.link(link)?;
    }
    for entry in &feed.entries {
        doc.entry(entry)?;
    }

    doc.end("feed")?;
    Ok(String::from_utf8(doc.writer.into_inner())?)
}

struct AtomWriter {
    writer: Writer<Vec<u8>>,
}

impl AtomWriter {
    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn start(&mut self, start: BytesStart<'_>) -> Result<(), RenderError> {
        self.event(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), RenderError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), RenderError> {
        self.start(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn optional_element(&mut self, name: &str, text: Option<&str>) -> Result<(), RenderError> {
        match text {
            Some(text) if !text.is_empty() => self.text_element(name, text),
            _ => Ok(()),
        }
    }

    fn author(&mut self, author: &Author) -> Result<(), RenderError> {
        self.start(BytesStart::new("author"))?;
        self.text_element("name", &author.name)?;
        self.optional_element("uri", author.uri.as_deref())?;
        self.end("author")
    }

    fn link(&mut self, link: &Link) -> Result<(), RenderError> {
        let mut start = BytesStart::new("link");
        if !link.rel.is_empty() {
            start.push_attribute(("rel", link.rel.as_str()));
        }
        start.push_attribute(("href", link.href.as_str()));
        if !link.media_type.is_empty() {
            start.push_attribute(("type", link.media_type.as_str()));
        }

        if link.prices.is_empty() {
            return self.event(Event::Empty(start));
        }

        self.start(start)?;
        for price in &link.prices {
            self.start(
                BytesStart::new("opds:price").with_attributes([("currencycode", price.currency.as_str())]),
            )?;
            self.event(Event::Text(BytesText::new(&price.value)))?;
            self.end("opds:price")?;
        }
        self.end("link")
    }

    fn entry(&mut self, entry: &Entry) -> Result<(), RenderError> {
        let meta = &entry.meta;
        self.start(BytesStart::new("entry"))?;
        self.text_element("id", &entry.id)?;
        self.text_element("title", &meta.title)?;
        if let Some(author) = &meta.author {
            self.author(author)?;
        }
        self.optional_element("dc:publisher", meta.publisher.as_deref())?;
        self.optional_element("dc:issued", meta.issued.as_deref())?;
        self.optional_element("dc:language", meta.language.as_deref())?;
        self.optional_element("summary", meta.summary.as_deref())?;
        self.optional_element("rights", meta.rights.as_deref())?;
        self.optional_element("updated", Some(entry.updated.as_str()))?;
        if let Some(category) = entry.category.as_deref().filter(|c| !c.is_empty()) {
            self.event(Event::Empty(
                BytesStart::new("category").with_attributes([("term", category)]),
            ))?;
        }
        if let Some(content) = entry.content.as_ref().filter(|c| !c.text.is_empty()) {
            self.start(
                BytesStart::new("content").with_attributes([("type", content.media_type.as_str())]),
            )?;
            self.event(Event::Text(BytesText::new(&content.text)))?;
            self.end("content")?;
        }
        for link in &entry.links {
            self.link(link)?;
        }
        self.end("entry")
    }
}
