use crate::utils::error::ImportError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Department,
    Person,
}

/// 部門，`path` 為以 `/` 分隔的 slug 路徑 (根節點不會出現)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Department {
    pub fn new(path: String, name: String) -> Self {
        Self {
            path,
            kind: EntryKind::Department,
            name,
            description: None,
        }
    }

    /// 路徑段數，`/a/b` 為 2
    pub fn depth(&self) -> usize {
        path_depth(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Person {
    pub fn new(path: String, name: String) -> Self {
        Self {
            path,
            kind: EntryKind::Person,
            name,
            title: None,
            email: None,
            phone: None,
        }
    }
}

/// 單一 XML 文件的解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub departments: Vec<Department>,
    pub people: Vec<Person>,
}

/// 多份文件合併後的結果：部門依路徑去重並排序，人員依路徑排序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDirectory {
    pub departments: Vec<Department>,
    pub people: Vec<Person>,
}

impl MergedDirectory {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.people.is_empty()
    }
}

#[derive(Debug)]
pub struct DocumentFailure {
    pub index: usize,
    pub error: ImportError,
}

/// Result of a lenient merge: the valid documents merged, plus every rejected one.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub merged: MergedDirectory,
    pub failures: Vec<DocumentFailure>,
}

impl MergeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub documents: usize,
    pub skipped_documents: usize,
    pub departments: usize,
    pub people: usize,
    pub output: String,
}

pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|segment| !segment.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_serializes_type_discriminator() {
        let dept = Department::new("/dept".to_string(), "Department of Example".to_string());
        let json = serde_json::to_value(&dept).unwrap();

        assert_eq!(json["type"], "department");
        assert_eq!(json["path"], "/dept");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_person_omits_absent_contact_fields() {
        let mut person = Person::new("/dept/john-smith".to_string(), "John Smith".to_string());
        person.email = Some("john.smith@example.gc.ca".to_string());
        let json = serde_json::to_value(&person).unwrap();

        assert_eq!(json["type"], "person");
        assert_eq!(json["email"], "john.smith@example.gc.ca");
        assert!(json.get("title").is_none());
        assert!(json.get("phone").is_none());
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth("/a"), 1);
        assert_eq!(path_depth("/a/b/c"), 3);
        assert_eq!(path_depth(""), 0);
    }
}
