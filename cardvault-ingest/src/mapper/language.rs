//! External language names to internal language codes
//!
//! The table is injective: no two language names share a code, so translations
//! keyed by code never collide.

const LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("German", "de"),
    ("French", "fr"),
    ("Italian", "it"),
    ("Spanish", "es"),
    ("Portuguese (Brazil)", "pt"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Russian", "ru"),
    ("Chinese Simplified", "zhs"),
    ("Chinese Traditional", "zht"),
    ("Hebrew", "he"),
    ("Latin", "la"),
    ("Ancient Greek", "grc"),
    ("Arabic", "ar"),
    ("Sanskrit", "sa"),
    ("Phyrexian", "ph"),
];

/// Internal code for an external language name (case-insensitive, trimmed)
pub fn language_code(name: &str) -> Option<&'static str> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .find(|(external, _)| external.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}
