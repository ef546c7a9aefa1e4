//! Allow-list checks for directory export URLs, run before any network call.

use crate::utils::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// 個人檔案頁面的 `pgid` 值
pub const PROFILE_VIEW_PAGE_ID: &str = "015";
/// XML 匯出頁面的 `pgid` 值
pub const XML_EXPORT_PAGE_ID: &str = "026";
const PAGE_ID_PARAM: &str = "pgid";

pub const DEFAULT_ALLOWED_SCHEMES: &[&str] = &["https"];
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[".gc.ca", "canada.ca"];

/// 允許的協定與網域
///
/// A domain entry with a leading `.` matches any hostname ending with it.
/// An entry without one matches that exact hostname or any subdomain of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPolicy {
    pub allowed_schemes: Vec<String>,
    pub allowed_domains: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: DEFAULT_ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect(),
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UrlPolicy {
    pub fn validate(&self, url_str: &str) -> Result<Url> {
        let url = Url::parse(url_str).map_err(|e| {
            ImportError::invalid_url(url_str, format!("Invalid URL format: {}", e))
        })?;

        if !self
            .allowed_schemes
            .iter()
            .any(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
        {
            let schemes: Vec<String> = self
                .allowed_schemes
                .iter()
                .map(|s| s.to_ascii_uppercase())
                .collect();
            return Err(ImportError::invalid_url(
                url_str,
                format!(
                    "Only {} URLs are allowed, got '{}:'",
                    schemes.join(" or "),
                    url.scheme()
                ),
            ));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host.is_empty() || !self.allows_host(&host) {
            return Err(ImportError::invalid_url(
                url_str,
                format!(
                    "URL domain '{}' is not allowed, expected one of: {}",
                    host,
                    self.allowed_domains.join(", ")
                ),
            ));
        }

        Ok(url)
    }

    fn allows_host(&self, host: &str) -> bool {
        self.allowed_domains.iter().any(|entry| {
            let entry = entry.to_ascii_lowercase();
            if entry.starts_with('.') {
                host.ends_with(&entry)
            } else {
                host == entry || host.ends_with(&format!(".{}", entry))
            }
        })
    }
}

/// 把個人檔案連結改寫成 XML 匯出連結，其他查詢參數保持不變
///
/// Unparseable input is returned as-is; validation rejects it afterwards.
pub fn normalize_url(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(_) => return url_str.to_string(),
    };

    // 只替換原始查詢字串中的那一段，其餘參數的編碼保持原樣
    let profile_pair = format!("{}={}", PAGE_ID_PARAM, PROFILE_VIEW_PAGE_ID);
    let query = match url.query() {
        Some(query) if query.split('&').any(|pair| pair == profile_pair) => query,
        _ => return url_str.to_string(),
    };

    let export_pair = format!("{}={}", PAGE_ID_PARAM, XML_EXPORT_PAGE_ID);
    let rewritten = query
        .split('&')
        .map(|pair| if pair == profile_pair { export_pair.as_str() } else { pair })
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&rewritten));

    url.to_string()
}

/// 以預設政策 (HTTPS + 政府網域) 驗證
pub fn validate_url(url_str: &str) -> Result<()> {
    UrlPolicy::default().validate(url_str).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;

    fn reason(url: &str) -> String {
        match validate_url(url) {
            Err(ImportError::InvalidUrl { reason, .. }) => reason,
            other => panic!("expected InvalidUrl for {}, got {:?}", url, other),
        }
    }

    #[test]
    fn test_accepts_government_domains() {
        assert!(validate_url("https://geds-sage.gc.ca/en/GEDS?pgid=026&dn=abc").is_ok());
        assert!(validate_url("https://canada.ca/en/services").is_ok());
        assert!(validate_url("https://www.canada.ca/fr").is_ok());
        assert!(validate_url("https://GEDS-SAGE.GC.CA/en/GEDS?pgid=026").is_ok());
        assert!(validate_url("HTTPS://deep.sub.example.gc.ca/path?x=1#frag").is_ok());
    }

    #[test]
    fn test_rejects_plain_http() {
        assert!(reason("http://geds-sage.gc.ca/en/GEDS").contains("HTTPS"));
        assert!(reason("ftp://canada.ca/file.xml").contains("HTTPS"));
    }

    #[test]
    fn test_rejects_other_domains() {
        assert!(reason("https://example.com/geds").contains("domain"));
        assert!(reason("https://gc.ca.evil.com/").contains("domain"));
        assert!(reason("https://notcanada.ca/").contains("domain"));
    }

    #[test]
    fn test_rejects_malformed_urls() {
        assert!(reason("not-a-url").contains("format"));
        assert!(reason("").contains("format"));
        assert_eq!(
            validate_url("not-a-url").unwrap_err().kind(),
            ErrorKind::InvalidUrl
        );
    }

    #[test]
    fn test_normalize_rewrites_profile_view() {
        let normalized = normalize_url("https://geds-sage.gc.ca/en/GEDS?pgid=015&dn=CN%3Dsmith");
        assert_eq!(
            normalized,
            "https://geds-sage.gc.ca/en/GEDS?pgid=026&dn=CN%3Dsmith"
        );
    }

    #[test]
    fn test_normalize_keeps_other_parameters_encoded() {
        assert_eq!(
            normalize_url("https://geds-sage.gc.ca/en/GEDS?pgid=015&dn=a%20b"),
            "https://geds-sage.gc.ca/en/GEDS?pgid=026&dn=a%20b"
        );
        assert_eq!(
            normalize_url("https://geds-sage.gc.ca/en/GEDS?dn=x+y&pgid=015"),
            "https://geds-sage.gc.ca/en/GEDS?dn=x+y&pgid=026"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls_alone() {
        let xml = "https://geds-sage.gc.ca/en/GEDS?pgid=026&dn=abc";
        assert_eq!(normalize_url(xml), xml);
        assert_eq!(normalize_url("not-a-url"), "not-a-url");
        assert_eq!(
            normalize_url("https://canada.ca/en?page=015"),
            "https://canada.ca/en?page=015"
        );
    }

    #[test]
    fn test_custom_policy_for_local_servers() {
        let policy = UrlPolicy {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            allowed_domains: vec!["127.0.0.1".to_string()],
        };

        assert!(policy.validate("http://127.0.0.1:8080/export.xml").is_ok());
        assert!(policy.validate("http://localhost:8080/export.xml").is_err());
    }
}
