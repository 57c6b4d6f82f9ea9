//! XML serialization of document trees with `quick-xml`.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::tree::{XmlElement, XmlNode};
use crate::error::RenderError;

/// Serialize a document to a UTF-8 string with an XML declaration.
///
/// # Errors
///
/// Returns `RenderError::Xml` if the writer fails or produces invalid UTF-8.
pub fn to_xml_string(root: &XmlElement, indent: usize) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', indent);

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, root)?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| RenderError::Xml(e.to_string()))
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_event(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), RenderError> {
    writer
        .write_event(event)
        .map_err(|e| RenderError::Xml(e.to_string()))
}

fn write_element(writer: &mut XmlWriter, element: &XmlElement) -> Result<(), RenderError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => write_event(writer, Event::Text(BytesText::new(text)))?,
            XmlNode::CData(text) => {
                for section in cdata_sections(text) {
                    write_event(writer, Event::CData(BytesCData::new(section)))?;
                }
            }
        }
    }
    write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

/// Split text so no section contains the `]]>` terminator.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_declaration_and_empty_element() {
        let xml = to_xml_string(&XmlElement::new("sbr"), 2).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.ends_with("<sbr/>"));
    }

    #[test]
    fn test_text_is_escaped_and_attributes_written() {
        let element = XmlElement::new("link")
            .with_attr("xl:href", "/pages/A?x=1&y=2")
            .with_text("a < b");
        let xml = to_xml_string(&element, 0).unwrap();
        assert!(xml.contains(r#"<link xl:href="/pages/A?x=1&amp;y=2">a &lt; b</link>"#));
    }

    #[test]
    fn test_cdata_is_verbatim() {
        let element =
            XmlElement::new("programlisting").with_children(vec![XmlNode::CData("<b>&</b>".to_owned())]);
        let xml = to_xml_string(&element, 2).unwrap();
        assert!(xml.contains("<programlisting><![CDATA[<b>&</b>]]>"));
    }

    #[test]
    fn test_cdata_terminator_split() {
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
    }

    #[test]
    fn test_nested_elements_are_indented() {
        let mut article = XmlElement::new("article");
        article.push(XmlElement::new("section").with_children(vec![
            XmlElement::new("para").with_text("x").into(),
        ]));
        let xml = to_xml_string(&article, 2).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <article>\n  <section>\n    <para>x</para>\n  </section>\n</article>"
        );
    }
}
