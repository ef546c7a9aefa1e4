//! Turns one directory XML export into a person and its department chain.
//!
//! Expected layout:
//!
//! ```xml
//! <person>
//!   <firstName>John</firstName>
//!   <lastName>Smith</lastName>
//!   <title>Analyst</title>
//!   <departmentAcronym>DEPT-DEPT</departmentAcronym>
//!   <organizationAcronym>ORG-ORG</organizationAcronym>
//!   <orgStructure>
//!     <org>Canada</org>
//!     <org>Department of Example</org>
//!     <org>Example Division</org>
//!   </orgStructure>
//! </person>
//! ```

use crate::core::slug::{english_acronym, slugify};
use crate::domain::model::{Department, ParsedDocument, Person};
use crate::utils::error::{ImportError, Result};
use html_escape::decode_html_entities;
use roxmltree::{Document, Node};
use std::collections::HashMap;

pub const ROOT_ELEMENT: &str = "person";
const FIRST_NAME: &str = "firstName";
const LAST_NAME: &str = "lastName";
const TITLE: &str = "title";
const EMAIL: &str = "email";
const PHONE: &str = "phone";
const DEPARTMENT_ACRONYM: &str = "departmentAcronym";
const ORGANIZATION_ACRONYM: &str = "organizationAcronym";
const ORG_STRUCTURE: &str = "orgStructure";
const ORG_NODE: &str = "org";

pub fn parse_document(xml: &str) -> Result<ParsedDocument> {
    let doc = Document::parse(xml).map_err(|e| ImportError::parse(format!("Invalid XML: {}", e)))?;

    let root = doc.root_element();
    if !root.has_tag_name(ROOT_ELEMENT) {
        return Err(ImportError::parse(format!(
            "Invalid directory export: missing root element <{}> (found <{}>)",
            ROOT_ELEMENT,
            root.tag_name().name()
        )));
    }

    build_document(root)
}

/// 下載的原始內容，非 UTF-8 視為無效 XML
pub fn parse_document_bytes(bytes: &[u8]) -> Result<ParsedDocument> {
    let xml = std::str::from_utf8(bytes).map_err(|e| {
        ImportError::parse(format!("Invalid XML: document is not UTF-8 ({})", e))
    })?;
    parse_document(xml)
}

fn build_document(root: Node<'_, '_>) -> Result<ParsedDocument> {
    let first_name = field_text(root, FIRST_NAME).unwrap_or_default();
    let last_name = field_text(root, LAST_NAME).unwrap_or_default();
    let full_name = format!("{} {}", first_name, last_name).trim().to_string();
    if full_name.is_empty() {
        return Err(ImportError::parse("Person record must have a name"));
    }

    let department_acronym = english_acronym(field_text(root, DEPARTMENT_ACRONYM).as_deref());
    let organization_acronym = english_acronym(field_text(root, ORGANIZATION_ACRONYM).as_deref());

    // 第一個節點是國家層級 (Canada)，不建立部門
    let names: Vec<String> = child(root, ORG_STRUCTURE)
        .map(|structure| {
            structure
                .children()
                .filter(|n| n.has_tag_name(ORG_NODE))
                .skip(1)
                .map(node_text)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if names.is_empty() {
        return Err(ImportError::parse(
            "No departments found in organization structure",
        ));
    }

    let slugs = segment_slugs(&names, department_acronym, organization_acronym);

    let mut departments = Vec::with_capacity(names.len());
    let mut path = String::new();
    for name in &names {
        let segment = slugs
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| slugify(name));
        path.push('/');
        path.push_str(&segment);
        departments.push(Department::new(path.clone(), name.clone()));
    }

    let mut person = Person::new(format!("{}/{}", path, slugify(&full_name)), full_name);
    person.title = field_text(root, TITLE);
    person.email = field_text(root, EMAIL);
    person.phone = field_text(root, PHONE);

    tracing::debug!(
        "Parsed {} ({} departments) at {}",
        person.name,
        departments.len(),
        person.path
    );

    Ok(ParsedDocument {
        departments,
        people: vec![person],
    })
}

/// 依名稱決定路徑段：第一個部門用部門縮寫，最後一個用組織縮寫
///
/// With a single department both acronyms target the same name and the
/// organization acronym wins. Names without an acronym fall back to `slugify`.
fn segment_slugs<'a>(
    names: &'a [String],
    department_acronym: Option<String>,
    organization_acronym: Option<String>,
) -> HashMap<&'a str, String> {
    let mut slugs = HashMap::new();

    if let (Some(first), Some(acronym)) = (names.first(), department_acronym) {
        slugs.insert(first.as_str(), acronym);
    }
    if let (Some(last), Some(acronym)) = (names.last(), organization_acronym) {
        slugs.insert(last.as_str(), acronym);
    }

    slugs
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Trimmed, entity-decoded text of a direct child, `None` when absent or blank.
fn field_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .map(node_text)
        .filter(|text| !text.is_empty())
}

fn node_text(node: Node<'_, '_>) -> String {
    let raw: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    decode_html_entities(&raw).trim().to_string()
}
