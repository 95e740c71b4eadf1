//! Parsed HTML document exposing only the structural queries the checker needs.

use crate::core::error::HarnessError;
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// How an attribute value is compared in [`Document::exists_with_attribute`].
#[derive(Debug, Clone, Copy)]
pub enum AttrMatch<'a> {
    /// Attribute present, any value.
    Present,
    Exact(&'a str),
    /// ASCII case-insensitive comparison of the value.
    IgnoreAsciiCase(&'a str),
}

impl AttrMatch<'_> {
    fn matches(self, value: &str) -> bool {
        match self {
            AttrMatch::Present => true,
            AttrMatch::Exact(expected) => value == expected,
            AttrMatch::IgnoreAsciiCase(expected) => value.eq_ignore_ascii_case(expected),
        }
    }
}

/// Flattened, read-only element list in document order.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Document, HarnessError> {
        if text.trim().is_empty() {
            return Err(HarnessError::DocumentParse("Document is empty".to_string()));
        }
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(text);
        let mut elements = Vec::new();
        collect_elements(&dom.document, &mut elements);
        Ok(Document { elements })
    }

    /// Read the document text as UTF-8. Parsing is a separate step so a
    /// malformed document can still be reported as a failed check.
    pub fn read_text(path: &Path) -> Result<String, HarnessError> {
        fs::read_to_string(path).map_err(|e| HarnessError::DocumentRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn count_by_id(&self, id: &str) -> usize {
        self.elements
            .iter()
            .filter(|e| e.attr("id") == Some(id))
            .count()
    }

    pub fn exists(&self, element_name: &str) -> bool {
        self.elements.iter().any(|e| e.name == element_name)
    }

    /// True when some element (restricted to `element_name` if given) carries
    /// `attribute` with a value satisfying `value`.
    pub fn exists_with_attribute(
        &self,
        element_name: Option<&str>,
        attribute: &str,
        value: AttrMatch<'_>,
    ) -> bool {
        self.elements
            .iter()
            .filter(|e| element_name.is_none_or(|name| e.name == name))
            .any(|e| e.attr(attribute).is_some_and(|v| value.matches(v)))
    }

    #[cfg(test)]
    fn element_count(&self) -> usize {
        self.elements.len()
    }
}

/// Document-order walk with an explicit stack; nesting depth is unbounded in
/// generated markup. `<template>` contents count as ordinary descendants.
fn collect_elements(root: &Handle, out: &mut Vec<Element>) {
    let mut stack: Vec<Handle> = vec![root.clone()];
    while let Some(handle) = stack.pop() {
        stack.extend(handle.children.borrow().iter().rev().cloned());
        if let NodeData::Element {
            ref name,
            ref attrs,
            ref template_contents,
            ..
        } = handle.data
        {
            if let Some(contents) = template_contents.borrow().as_ref() {
                stack.push(contents.clone());
            }
            out.push(Element {
                name: name.local.to_string(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect(),
            });
        }
    }
}
