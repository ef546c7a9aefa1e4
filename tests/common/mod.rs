#![allow(dead_code)]

pub mod raw_server;

use directory_import::{FetchConfig, UrlPolicy};
use std::time::Duration;

/// Fetch limits that let the fetcher talk to local test servers over plain HTTP.
pub fn local_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        policy: UrlPolicy {
            allowed_schemes: vec!["http".to_string()],
            allowed_domains: vec!["127.0.0.1".to_string(), "localhost".to_string()],
        },
        ..FetchConfig::default()
    }
}

/// 產生一份個人 XML 匯出
pub fn person_xml(
    first: &str,
    last: &str,
    department_acronym: &str,
    organization_acronym: &str,
    chain: &[&str],
) -> String {
    let orgs: String = chain
        .iter()
        .map(|name| format!("    <org>{}</org>\n", name))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<person>
  <firstName>{}</firstName>
  <lastName>{}</lastName>
  <title>Policy Analyst</title>
  <email>{}.{}@example.gc.ca</email>
  <departmentAcronym>{}</departmentAcronym>
  <organizationAcronym>{}</organizationAcronym>
  <orgStructure>
{}  </orgStructure>
</person>
"#,
        first,
        last,
        first.to_lowercase(),
        last.to_lowercase(),
        department_acronym,
        organization_acronym,
        orgs
    )
}

pub fn john_smith_xml() -> String {
    person_xml(
        "John",
        "Smith",
        "DEPT-DEPT",
        "ORG-ORG",
        &["Canada", "Department of Example", "Example Division"],
    )
}
