//! Owned XML element tree
//!
//! A small mutable tree built from `quick-xml` events. It carries only what
//! the enhancer needs: namespace-resolved element names, attribute access,
//! child traversal, and serialization that keeps comments, processing
//! instructions, declarations and whitespace as they were read.

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::Writer;

/// The TEI namespace URI
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// Attribute name of the standard XML identifier
pub const XML_ID: &str = "xml:id";

/// Errors raised while reading or writing XML
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("XML write error: {0}")]
    Write(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("unbalanced end tag </{0}>")]
    UnbalancedEnd(String),

    #[error("invalid UTF-8 in XML output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A node in the tree
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Comments, processing instructions, declarations and doctypes, kept verbatim
    Other(Event<'static>),
}

/// An element with its qualified name as written in the source
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with a qualified name and resolved namespace
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element in the same namespace (and with the same prefix) as `self`
    pub fn sibling_kind(&self, local: &str) -> Element {
        let name = match self.prefix() {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        };
        Element::new(name, self.namespace.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True if this is the TEI element with the given local name
    pub fn is_tei(&self, local: &str) -> bool {
        self.local_name() == local && self.namespace() == Some(TEI_NS)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child TEI element with the given local name
    pub fn first_child(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is_tei(local))
    }

    pub fn first_child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.is_tei(local))
    }

    /// First child TEI element with the given local name, appended if absent
    pub fn child_or_insert(&mut self, local: &str) -> &mut Element {
        let pos = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.is_tei(local)));
        let pos = match pos {
            Some(pos) => pos,
            None => {
                let child = self.sibling_kind(local);
                self.children.push(Node::Element(child));
                self.children.len() - 1
            }
        };
        match &mut self.children[pos] {
            Node::Element(e) => e,
            _ => unreachable!("position matched an element node"),
        }
    }

    /// Follow a path of TEI local names, taking the first match at each step
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |current, step| current.first_child(step))
    }

    pub fn find_path_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for step in path {
            current = current.first_child_mut(step)?;
        }
        Some(current)
    }

    /// Append an element and return a handle to it
    pub fn push_element(&mut self, element: Element) -> &mut Element {
        self.children.push(Node::Element(element));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// Append a new child in this element's namespace holding `text`
    pub fn push_text_child(&mut self, local: &str, text: &str) -> &mut Element {
        let mut child = self.sibling_kind(local);
        if !text.is_empty() {
            child.children.push(Node::Text(text.to_string()));
        }
        self.push_element(child)
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated text of all descendant text and CDATA nodes
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                Node::Other(_) => {}
            }
        }
    }

    /// True if any descendant is a text or CDATA node
    pub fn has_text_nodes(&self) -> bool {
        self.children.iter().any(|node| match node {
            Node::Text(_) | Node::CData(_) => true,
            Node::Element(e) => e.has_text_nodes(),
            Node::Other(_) => false,
        })
    }

    /// Visit every descendant TEI element named `local` in document order.
    ///
    /// `self` is not visited. Elements nested inside a match are visited too.
    pub fn for_each_descendant_mut<F>(&mut self, local: &str, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in self.child_elements_mut() {
            if child.is_tei(local) {
                f(&mut *child);
            }
            child.for_each_descendant_mut(local, f);
        }
    }

    /// Visit this element and every descendant element in document order
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Element),
    {
        f(self);
        for child in self.child_elements() {
            child.walk(f);
        }
    }

    /// True if this element or any descendant carries `xml:id == id`
    pub fn has_xml_id(&self, id: &str) -> bool {
        self.attr(XML_ID) == Some(id) || self.child_elements().any(|e| e.has_xml_id(id))
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            return write_event(writer, Event::Empty(start));
        }
        write_event(writer, Event::Start(start))?;
        for node in &self.children {
            node.write(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

impl Node {
    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        match self {
            Node::Element(e) => e.write(writer),
            Node::Text(t) => write_event(writer, Event::Text(BytesText::new(t))),
            Node::CData(t) => write_event(writer, Event::CData(BytesCData::new(t.as_str()))),
            Node::Other(event) => write_event(writer, event.clone()),
        }
    }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

/// A parsed document: the root element plus whatever surrounds it
#[derive(Debug, Clone)]
pub struct XmlTree {
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl XmlTree {
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Parse a complete XML document
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(xml);
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| XmlError::Parse(e.to_string()))?;
            let node = match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&ns, &start)?);
                    continue;
                }
                Event::Empty(start) => Node::Element(element_from_start(&ns, &start)?),
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::UnbalancedEnd(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                    })?;
                    Node::Element(element)
                }
                Event::Text(text) => Node::Text(
                    text.unescape()
                        .map_err(|e| XmlError::Parse(e.to_string()))?
                        .into_owned(),
                ),
                Event::CData(data) => {
                    Node::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Eof => break,
                other => Node::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    Node::Element(element) if root.is_none() => root = Some(element),
                    other if root.is_none() => prolog.push(other),
                    other => epilog.push(other),
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError::Parse(format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or(XmlError::NoRoot)?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize the tree back to an XML string
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            node.write(&mut writer)?;
        }
        self.root.write(&mut writer)?;
        for node in &self.epilog {
            node.write(&mut writer)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

fn element_from_start(ns: &ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| XmlError::Parse(e.to_string()))?
        .to_string();
    let namespace = match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
        _ => None,
    };
    let mut element = Element::new(name, namespace);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Parse(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| XmlError::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Parse(e.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- leading comment -->
<TEI xmlns="http://www.tei-c.org/ns/1.0" xml:id="doc1">
  <text><body><p>Met <persName>Jane &amp; Co</persName> there.</p></body></text>
</TEI>
"#;

    #[test]
    fn test_parse_resolves_default_namespace() {
        let tree = XmlTree::parse(SAMPLE).unwrap();
        let root = tree.root();
        assert!(root.is_tei("TEI"));
        assert_eq!(root.attr(XML_ID), Some("doc1"));

        let p = root.find_path(&["text", "body", "p"]).unwrap();
        assert_eq!(p.text(), "Met Jane & Co there.");
    }

    #[test]
    fn test_prefixed_elements_resolve_to_tei() {
        let xml = r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0"><tei:teiHeader/></tei:TEI>"#;
        let mut tree = XmlTree::parse(xml).unwrap();
        assert!(tree.root().is_tei("TEI"));
        assert!(tree.root().first_child("teiHeader").is_some());

        let header = tree.root_mut().first_child_mut("teiHeader").unwrap();
        let created = header.child_or_insert("fileDesc");
        assert_eq!(created.name(), "tei:fileDesc");
        assert!(created.is_tei("fileDesc"));
    }

    #[test]
    fn test_elements_outside_namespace_do_not_match() {
        let xml = r#"<TEI><teiHeader/></TEI>"#;
        let tree = XmlTree::parse(xml).unwrap();
        assert!(!tree.root().is_tei("TEI"));
        assert!(tree.root().first_child("teiHeader").is_none());
    }

    #[test]
    fn test_round_trip_keeps_comments_and_escapes_text() {
        let tree = XmlTree::parse(SAMPLE).unwrap();
        let out = tree.to_xml_string().unwrap();
        assert!(out.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(out.contains("<!-- leading comment -->"));
        assert!(out.contains("<persName>Jane &amp; Co</persName>"));

        let again = XmlTree::parse(&out).unwrap();
        assert_eq!(again.root().text(), tree.root().text());
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut element = Element::new("persName", Some(TEI_NS.to_string()));
        element.set_attr("ref", "#a");
        element.set_attr("type", "x");
        element.set_attr("ref", "#b");
        let attrs: Vec<_> = element.attributes().collect();
        assert_eq!(attrs, vec![("ref", "#b"), ("type", "x")]);
        assert_eq!(element.remove_attr("type"), Some("x".to_string()));
        assert_eq!(element.attr("type"), None);
    }

    #[test]
    fn test_for_each_descendant_visits_in_document_order() {
        let xml = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><p><term>a</term><q><term>b</term></q></p><term>c</term></TEI>"#;
        let mut tree = XmlTree::parse(xml).unwrap();
        let mut seen = Vec::new();
        tree.root_mut()
            .for_each_descendant_mut("term", &mut |e: &mut Element| seen.push(e.text()));
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        assert!(XmlTree::parse(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><p>"#).is_err());
        assert!(matches!(XmlTree::parse("<!-- only -->"), Err(XmlError::NoRoot)));
    }
}
