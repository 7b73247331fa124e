//! Minimal XML element tree shared by the XML speaking providers.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// An XML element with its concatenated text and child elements.
///
/// Attributes are not kept; neither provider puts data into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first direct child with the given name, empty if absent
    pub fn child_text(&self, name: &str) -> String {
        self.child(name).map(|c| c.text.clone()).unwrap_or_default()
    }

    /// All elements with the given name anywhere below this one, in document order
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }
}

/// Parses an XML document into a tree.
///
/// The returned element is a synthetic document node whose children are
/// the document's top-level elements.
pub(super) fn parse_document(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::new(String::new())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push(Element::new(name));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Element::new(name));
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| format!("XML parse error: {}", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or("XML parse error: unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Err("XML parse error: unbalanced end tag".to_string()),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err("XML parse error: unexpected end of document".to_string());
    }

    stack
        .pop()
        .ok_or_else(|| "XML parse error: empty document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let doc = parse_document(
            "<?xml version=\"1.0\"?><root><a>one</a><b><a>two &amp; three</a></b><c/></root>",
        )
        .unwrap();

        let root = doc.child("root").unwrap();
        assert_eq!(root.child_text("a"), "one");
        assert_eq!(root.child_text("missing"), "");
        assert!(root.child("c").is_some());

        let all_a: Vec<&str> = root
            .descendants_named("a")
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(all_a, vec!["one", "two & three"]);
    }

    #[test]
    fn test_unclosed_document_is_an_error() {
        assert!(parse_document("<root><a>text</a>").is_err());
    }
}
