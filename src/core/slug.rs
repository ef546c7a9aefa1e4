use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("static regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// 把顯示名稱轉成路徑用的 slug
///
/// Diacritics are stripped after NFD decomposition, `&` becomes `and`, anything
/// outside `[a-z0-9\s-]` is dropped and whitespace runs become a single `-`.
/// Hyphens already in the name are kept as they are.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .replace('&', "and");

    let cleaned = disallowed_chars().replace_all(&folded, "");
    let hyphenated = whitespace_runs().replace_all(cleaned.trim(), "-");

    hyphenated.trim_matches('-').to_string()
}

/// `"ENGLISH-FRENCH"` 欄位取英文縮寫，小寫
///
/// Returns `None` for an absent or blank field.
pub fn english_acronym(field: Option<&str>) -> Option<String> {
    let english = field?.split('-').next()?.trim();
    if english.is_empty() {
        None
    } else {
        Some(english.to_lowercase())
    }
}
