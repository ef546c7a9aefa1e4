use crate::core::parser::parse_document_bytes;
use crate::domain::model::{
    Department, DocumentFailure, MergeReport, MergedDirectory, ParsedDocument,
};
use crate::utils::error::Result;
use std::collections::HashSet;

/// 解析並合併多份文件，任一份失敗就整批失敗
///
/// Documents are raw bytes or strings; invalid UTF-8 is a parse failure of that
/// document. The returned error is a `DocumentError` carrying the index of the
/// first document that failed; nothing from earlier documents is kept.
pub fn merge_documents<S: AsRef<[u8]>>(documents: &[S]) -> Result<MergedDirectory> {
    let parsed = documents
        .iter()
        .enumerate()
        .map(|(index, xml)| parse_document_bytes(xml.as_ref()).map_err(|e| e.in_document(index)))
        .collect::<Result<Vec<_>>>()?;

    Ok(merge_parsed(parsed))
}

/// 寬鬆模式：合併能解析的文件，並列出失敗的文件
pub fn merge_lenient<S: AsRef<[u8]>>(documents: &[S]) -> MergeReport {
    let mut parsed = Vec::with_capacity(documents.len());
    let mut failures = Vec::new();

    for (index, xml) in documents.iter().enumerate() {
        match parse_document_bytes(xml.as_ref()) {
            Ok(doc) => parsed.push(doc),
            Err(error) => {
                tracing::warn!("⚠️ Skipping document {}: {}", index, error);
                failures.push(DocumentFailure { index, error });
            }
        }
    }

    MergeReport {
        merged: merge_parsed(parsed),
        failures,
    }
}

/// Departments are deduplicated by path (first one wins) and sorted by depth then
/// path, so parents always come before their children. People are concatenated
/// as-is and sorted by path.
pub fn merge_parsed<I>(documents: I) -> MergedDirectory
where
    I: IntoIterator<Item = ParsedDocument>,
{
    let mut seen = HashSet::new();
    let mut departments: Vec<Department> = Vec::new();
    let mut people = Vec::new();

    for doc in documents {
        for dept in doc.departments {
            if seen.insert(dept.path.clone()) {
                departments.push(dept);
            }
        }
        people.extend(doc.people);
    }

    departments.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path.cmp(&b.path)));
    people.sort_by(|a, b| a.path.cmp(&b.path));

    MergedDirectory {
        departments,
        people,
    }
}
