//! Structural HTML compliance.
//!
//! Evaluates the `html.requires` block of a contract against a parsed
//! document. Three independent groups run in a fixed order (ids, selectors,
//! data attributes); a failure in one group never suppresses the others, and
//! each group contributes at most one error line per failure kind.

use crate::core::document::{AttrMatch, Document};
use crate::core::report::CheckResult;
use crate::core::spec::{DataAttributeRequirement, Spec};
use serde_json::json;

/// The closed selector vocabulary. Anything else is reported as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Title,
    MetaCharset,
    MetaViewport,
}

impl SelectorKind {
    pub fn parse(selector: &str) -> Option<SelectorKind> {
        match selector.trim() {
            "title" => Some(SelectorKind::Title),
            "meta[charset]" => Some(SelectorKind::MetaCharset),
            "meta[name='viewport']" | "meta[name=\"viewport\"]" => Some(SelectorKind::MetaViewport),
            _ => None,
        }
    }

    /// Canonical spelling used in error lines.
    pub fn label(self) -> &'static str {
        match self {
            SelectorKind::Title => "title",
            SelectorKind::MetaCharset => "meta[charset]",
            SelectorKind::MetaViewport => "meta[name='viewport']",
        }
    }

    pub fn is_satisfied(self, doc: &Document) -> bool {
        match self {
            SelectorKind::Title => doc.exists("title"),
            SelectorKind::MetaCharset => {
                doc.exists_with_attribute(Some("meta"), "charset", AttrMatch::Present)
            }
            SelectorKind::MetaViewport => doc.exists_with_attribute(
                Some("meta"),
                "name",
                AttrMatch::IgnoreAsciiCase("viewport"),
            ),
        }
    }
}

/// A single entry of the `html.requires` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement<'a> {
    RequiredId(&'a str),
    /// `kind` is `None` for selectors outside the supported vocabulary.
    RequiredSelector {
        raw: &'a str,
        kind: Option<SelectorKind>,
    },
    RequiredDataAttribute {
        name: &'a str,
        value: &'a str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Satisfied,
    Missing,
    /// Id present more than once; carries the match count.
    Duplicated(usize),
    Unsupported,
}

impl Requirement<'_> {
    pub fn evaluate(self, doc: &Document) -> Outcome {
        match self {
            Requirement::RequiredId(id) => match doc.count_by_id(id) {
                0 => Outcome::Missing,
                1 => Outcome::Satisfied,
                n => Outcome::Duplicated(n),
            },
            Requirement::RequiredSelector { kind: None, .. } => Outcome::Unsupported,
            Requirement::RequiredSelector {
                kind: Some(kind), ..
            } => satisfied_if(kind.is_satisfied(doc)),
            Requirement::RequiredDataAttribute { name, value } => {
                satisfied_if(doc.exists_with_attribute(None, name, AttrMatch::Exact(value)))
            }
        }
    }
}

fn satisfied_if(present: bool) -> Outcome {
    if present {
        Outcome::Satisfied
    } else {
        Outcome::Missing
    }
}

/// Parse `html_text` and check it. A parse failure short-circuits into a
/// single-error result with empty details.
pub fn check_html_text(spec: &Spec, html_text: &str) -> CheckResult {
    match Document::parse(html_text) {
        Ok(doc) => check_html(spec, &doc),
        Err(e) => CheckResult::failed(e.to_string()),
    }
}

pub fn check_html(spec: &Spec, doc: &Document) -> CheckResult {
    let requires = spec.requires();
    let mut result = CheckResult::passed();

    check_required_ids(&requires.ids, doc, &mut result);
    check_required_selectors(&requires.selectors, doc, &mut result);
    check_data_attributes(&requires.data_attributes, doc, &mut result);

    result.ok = result.errors.is_empty();
    result
}

fn check_required_ids(ids: &[String], doc: &Document, result: &mut CheckResult) {
    let mut missing: Vec<&str> = Vec::new();
    let mut duplicates: Vec<(&str, usize)> = Vec::new();

    for id in ids {
        match Requirement::RequiredId(id.as_str()).evaluate(doc) {
            Outcome::Missing => missing.push(id.as_str()),
            Outcome::Duplicated(n) => duplicates.push((id.as_str(), n)),
            Outcome::Satisfied | Outcome::Unsupported => {}
        }
    }

    if !missing.is_empty() {
        result
            .errors
            .push(format!("Missing required id(s): {}", missing.join(", ")));
    }
    if !duplicates.is_empty() {
        let listed = duplicates
            .iter()
            .map(|(id, n)| format!("{} (count={})", id, n))
            .collect::<Vec<_>>()
            .join(", ");
        result
            .errors
            .push(format!("Duplicate id(s) found: {}", listed));
    }
    result.details.insert(
        "requiredIds".to_string(),
        json!({
            "count": ids.len(),
            "missing": missing,
            "duplicates": duplicates,
        }),
    );
}

fn check_required_selectors(selectors: &[String], doc: &Document, result: &mut CheckResult) {
    let mut missing: Vec<&'static str> = Vec::new();
    let mut unsupported: Vec<&str> = Vec::new();

    for selector in selectors {
        let raw = selector.trim();
        let kind = SelectorKind::parse(raw);
        match (Requirement::RequiredSelector { raw, kind }.evaluate(doc), kind) {
            (Outcome::Missing, Some(kind)) => missing.push(kind.label()),
            (Outcome::Unsupported, _) => unsupported.push(raw),
            _ => {}
        }
    }

    if !missing.is_empty() {
        result.errors.push(format!(
            "Missing required selector(s): {}",
            missing.join(", ")
        ));
    }
    result.details.insert(
        "requiredSelectors".to_string(),
        json!({
            "count": selectors.len(),
            "missing": missing,
            "unsupported": unsupported,
        }),
    );
}

fn check_data_attributes(
    requirements: &[DataAttributeRequirement],
    doc: &Document,
    result: &mut CheckResult,
) {
    let mut enforced: Vec<String> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for requirement in requirements {
        // Opt-in per value: no name or no values means nothing to enforce.
        let Some(name) = requirement.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        for value in &requirement.values {
            let pair = format!("{}={}", name, value);
            let requirement = Requirement::RequiredDataAttribute {
                name,
                value: value.as_str(),
            };
            match requirement.evaluate(doc) {
                Outcome::Satisfied => enforced.push(pair),
                _ => missing.push(pair),
            }
        }
    }

    if !missing.is_empty() {
        result.errors.push(format!(
            "Missing required data-attribute instance(s): {}",
            missing.join(", ")
        ));
    }
    result.details.insert(
        "dataAttributes".to_string(),
        json!({
            "enforced": enforced,
            "missing": missing,
        }),
    );
}
