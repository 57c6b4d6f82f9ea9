//! Flat-to-hierarchical section nesting.
//!
//! Block output arrives as a flat sequence in which headings mark the start
//! of a section. [`SectionBuilder`] keeps two parallel stacks, open sections
//! and their heading levels, and nests each section inside the closest open
//! section of a strictly lower level.

use super::tree::{XmlElement, XmlNode};

/// Level of the section opened for content preceding the first heading.
const IMPLICIT_LEVEL: u8 = 1;

#[derive(Debug, Default)]
pub(super) struct SectionBuilder {
    sections: Vec<XmlElement>,
    levels: Vec<u8>,
    closed: Vec<XmlNode>,
}

impl SectionBuilder {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Start a section for a heading, closing open sections of equal or deeper level.
    pub(super) fn open(&mut self, level: u8) {
        while self.levels.last().is_some_and(|&top| top >= level) {
            self.close_innermost();
        }
        self.push(level);
    }

    /// Append rendered output to the innermost open section.
    ///
    /// Content before any heading opens an implicit top-level section.
    pub(super) fn append(&mut self, nodes: Vec<XmlNode>) {
        if nodes.is_empty() {
            return;
        }
        if self.sections.is_empty() {
            self.push(IMPLICIT_LEVEL);
        }
        if let Some(section) = self.sections.last_mut() {
            section.children.extend(nodes);
        }
    }

    /// Close every open section and return the top-level ones.
    pub(super) fn finish(mut self) -> Vec<XmlNode> {
        while !self.sections.is_empty() {
            self.close_innermost();
        }
        self.closed
    }

    fn push(&mut self, level: u8) {
        self.sections.push(XmlElement::new("section"));
        self.levels.push(level);
    }

    fn close_innermost(&mut self) {
        let (Some(section), Some(_)) = (self.sections.pop(), self.levels.pop()) else {
            return;
        };
        match self.sections.last_mut() {
            Some(parent) => parent.push(section),
            None => self.closed.push(section.into()),
        }
    }
}
