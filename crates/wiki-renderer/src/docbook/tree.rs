//! In-memory XML document tree produced by the Docbook renderer.

/// Node of an XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, escaped on output.
    Text(String),
    /// Character data emitted verbatim inside CDATA sections.
    CData(String),
}

impl XmlNode {
    /// The element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Self::Text(text) | Self::CData(text) => out.push_str(text),
        }
    }
}

impl From<XmlElement> for XmlNode {
    fn from(element: XmlElement) -> Self {
        Self::Element(element)
    }
}

/// XML element with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Element name, possibly prefixed (`xl:href` style names are allowed).
    pub name: String,
    /// Attributes in insertion order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<XmlNode>) -> Self {
        self.children = children;
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Append a child.
    pub fn push(&mut self, child: impl Into<XmlNode>) {
        self.children.push(child.into());
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements with the given name.
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter_map(XmlNode::as_element)
            .filter(move |element| element.name == name)
    }

    /// Concatenated character data of all descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_builder() {
        let element = XmlElement::new("emphasis")
            .with_attr("role", "bold")
            .with_text("hi");
        assert_eq!(element.attr("role"), Some("bold"));
        assert_eq!(element.attr("missing"), None);
        assert_eq!(element.text_content(), "hi");
    }

    #[test]
    fn test_elements_filters_by_name() {
        let mut section = XmlElement::new("section");
        section.push(XmlElement::new("para").with_text("a"));
        section.push(XmlNode::Text("loose".to_owned()));
        section.push(XmlElement::new("section"));
        section.push(XmlElement::new("para").with_text("b"));

        let paras: Vec<String> = section.elements("para").map(XmlElement::text_content).collect();
        assert_eq!(paras, vec!["a", "b"]);
        assert_eq!(section.elements("section").count(), 1);
    }

    #[test]
    fn test_text_content_includes_cdata() {
        let element = XmlElement::new("programlisting")
            .with_children(vec![XmlNode::CData("a < b".to_owned())])
            .with_text("!");
        assert_eq!(element.text_content(), "a < b!");
    }
}
