//! Extracting the title and author from a dcndl record.

use log::{info, trace};
use quick_xml::{
    events::Event,
    name::{Namespace, ResolveResult},
    reader::NsReader,
};
use serde::Serialize;

use crate::{Error, ErrorKind};

/// Prefixes used by NDL Search responses and the namespaces they are bound to.
pub const NAMESPACES: [(&str, &str); 6] = [
    ("srw", "http://www.loc.gov/zing/srw/"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("dcndl", "http://ndl.go.jp/dcndl/terms/"),
];

/// Looks up the namespace bound to `prefix` in [`NAMESPACES`].
#[must_use]
pub fn namespace(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

const TITLE_PATH: &[(&str, &str)] = &[("dc", "title"), ("rdf", "Description"), ("rdf", "value")];
const AUTHOR_PATH: &[(&str, &str)] = &[("dc", "creator")];

/// Title and author of a book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    /// Main title of the book.
    pub title: Option<String>,
    /// First listed creator.
    pub author: Option<String>,
}

/// Parses a raw record into a [`BookInfo`].
///
/// An absent or blank `doc` produces `Ok(None)` without parsing. Otherwise a [`BookInfo`] is
/// returned even when neither field could be found.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::XmlParse`] is returned when `doc` is not well formed XML.
pub fn parse(doc: Option<&str>) -> Result<Option<BookInfo>, Error> {
    let doc = match doc {
        Some(doc) if !doc.trim().is_empty() => doc,
        _ => {
            trace!("Record is empty - nothing to parse");
            return Ok(None);
        }
    };

    let mut title = Field::new(TITLE_PATH);
    let mut author = Field::new(AUTHOR_PATH);
    read_fields(doc, &mut [&mut title, &mut author])?;

    let title = title.into_text();
    if let Some(title) = &title {
        info!("タイトル: {title}");
    }

    let author = author.into_text();
    if let Some(author) = &author {
        info!("著者: {author}");
    }

    Ok(Some(BookInfo { title, author }))
}

#[derive(Debug)]
struct Element {
    namespace: Option<Vec<u8>>,
    local_name: Vec<u8>,
}

impl Element {
    fn is(&self, prefix: &str, local_name: &str) -> bool {
        let uri = namespace(prefix).map(str::as_bytes);
        self.namespace.as_deref() == uri && self.local_name == local_name.as_bytes()
    }
}

/// The text of the first element matching `path`, found anywhere below the root.
///
/// Only the text before the element's first child is kept.
struct Field {
    path: &'static [(&'static str, &'static str)],
    // depth of the element being captured
    capturing: Option<usize>,
    found: bool,
    text: String,
}

impl Field {
    const fn new(path: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            path,
            capturing: None,
            found: false,
            text: String::new(),
        }
    }

    fn matches(&self, stack: &[Element]) -> bool {
        stack.len() > self.path.len()
            && stack[stack.len() - self.path.len()..]
                .iter()
                .zip(self.path)
                .all(|(element, (prefix, local))| element.is(prefix, local))
    }

    fn start(&mut self, stack: &[Element]) {
        if self.capturing.is_some_and(|depth| stack.len() > depth) {
            self.capturing = None;
        } else if !self.found && self.matches(stack) {
            self.found = true;
            self.capturing = Some(stack.len());
        }
    }

    fn text(&mut self, depth: usize, text: &str) {
        if self.capturing == Some(depth) {
            self.text.push_str(text);
        }
    }

    fn end(&mut self, depth: usize) {
        if self.capturing == Some(depth) {
            self.capturing = None;
        }
    }

    fn into_text(self) -> Option<String> {
        let text = self.text.trim();
        (self.found && !text.is_empty()).then(|| text.to_owned())
    }
}

fn read_fields(doc: &str, fields: &mut [&mut Field]) -> Result<(), Error> {
    let mut reader = NsReader::from_str(doc);
    let mut stack: Vec<Element> = Vec::new();
    let mut seen_root = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::wrap(ErrorKind::XmlParse, e))?;

        match event {
            Event::Start(e) | Event::Empty(e) if seen_root && stack.is_empty() => {
                return Err(Error::new(
                    ErrorKind::XmlParse,
                    format!(
                        "unexpected second root element '{}'",
                        String::from_utf8_lossy(e.name().as_ref())
                    ),
                ));
            }
            Event::Start(e) => {
                seen_root = true;
                stack.push(element(&ns, e.local_name().as_ref()));
                fields.iter_mut().for_each(|f| f.start(&stack));
            }
            Event::Empty(e) => {
                seen_root = true;
                stack.push(element(&ns, e.local_name().as_ref()));
                fields.iter_mut().for_each(|f| f.start(&stack));
                fields.iter_mut().for_each(|f| f.end(stack.len()));
                stack.pop();
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::wrap(ErrorKind::XmlParse, e))?;
                if stack.is_empty() && !text.trim().is_empty() {
                    return Err(Error::new(
                        ErrorKind::XmlParse,
                        "text found outside of the root element",
                    ));
                }
                fields.iter_mut().for_each(|f| f.text(stack.len(), &text));
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c);
                fields.iter_mut().for_each(|f| f.text(stack.len(), &text));
            }
            Event::End(_) => {
                fields.iter_mut().for_each(|f| f.end(stack.len()));
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::new(
            ErrorKind::XmlParse,
            "document ended before all elements were closed",
        ));
    }

    if !seen_root {
        return Err(Error::new(ErrorKind::XmlParse, "document has no root element"));
    }

    Ok(())
}

fn element(ns: &ResolveResult<'_>, local_name: &[u8]) -> Element {
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(uri.to_vec()),
        _ => None,
    };
    Element {
        namespace,
        local_name: local_name.to_vec(),
    }
}
